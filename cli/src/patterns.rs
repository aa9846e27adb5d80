//! Filename-pattern construction for the pipeline stages.
//!
//! Two pattern families live here: the `filepattern`-syntax strings handed
//! to the plugin containers (variables like `{r:d}` or `{y:dd}` are expanded
//! by the tools themselves), and compiled [`Regex`] matchers used by the
//! orchestrator's file-count skip checks.

use regex::Regex;

use stitch_kit_common::{GridDims, TileNaming};

/// All patterns for one pipeline run
#[derive(Debug, Clone)]
pub struct DatasetPatterns {
    naming: TileNaming,

    /// Original pre-stitched images, e.g. `R{r:d}C{c:d+}.tif`
    pub original: String,
    /// Converted originals
    pub original_ome: String,
    /// CZI archives, one per replicate
    pub czi: String,
    /// Extracted tile images across all replicates/channels
    pub fovs: String,
    /// Grouping variables for flatfield estimation
    pub ff_group_by: String,
    /// Estimated flatfield components
    pub flatfield: String,
    /// Estimated darkfield components
    pub darkfield: String,
    /// Stitched composite images
    pub stitched: String,
    /// Row/column tile pattern for the MIST grid solver
    pub mist: String,

    /// Matcher for converted originals
    pub original_ome_re: Regex,
    /// Matcher for original pyramids carrying the `.ome.zarr` extension
    pub pyramid_zarr_re: Regex,
    /// Matcher for original pyramid stems, extension present or not
    pub pyramid_stem_re: Regex,
    /// Matcher for extracted/corrected tile images
    pub fov_re: Regex,
    /// Matcher for flatfield components
    pub flatfield_re: Regex,
    /// Matcher for recycled stitching vectors
    pub recycled_re: Regex,
    /// Matcher for stitched composite images
    pub stitched_re: Regex,
    /// Matcher for stitched pyramid stems, extension present or not
    pub stitched_pyramid_stem_re: Regex,
}

impl DatasetPatterns {
    pub fn new(
        naming: &TileNaming,
        dims: GridDims,
        single_replicate: bool,
    ) -> Result<Self, regex::Error> {
        // Variable stem for the filepattern strings: a literal "R1" in
        // single-replicate mode, a replicate variable otherwise.
        let stem = if single_replicate {
            naming.stem(1)
        } else {
            format!(
                "{}_R{{r:d}}_{}_{}",
                naming.slide, naming.channel_group, naming.acquisition
            )
        };
        let original_replicate = if single_replicate { "1" } else { "{r:d}" };
        let replicate_digit = if single_replicate { "1" } else { r"\d" };
        let span = format!(
            r"_y0\({}\)_x0\({}\)",
            dims.y_span(),
            dims.x_span()
        );

        // Regex stem matching the same names the filepattern stem does
        let stem_re = format!(
            "{}_R{}_{}_{}",
            regex::escape(&naming.slide),
            replicate_digit,
            regex::escape(&naming.channel_group),
            regex::escape(&naming.acquisition)
        );
        let span_re = format!(
            r"_y0\({}\)_x0\({}\)",
            regex::escape(&dims.y_span()),
            regex::escape(&dims.x_span())
        );

        Ok(Self {
            naming: naming.clone(),
            original: format!("R{original_replicate}C{{c:d+}}.tif"),
            original_ome: format!("R{original_replicate}C{{c:d+}}.ome.tif"),
            czi: format!("{stem}.czi"),
            fovs: format!("{stem}_y0{{y:dd}}_x0{{x:dd}}_c0{{c:dd}}.ome.tif"),
            ff_group_by: if single_replicate { "c" } else { "rc" }.to_string(),
            flatfield: format!("{stem}{span}_c0{{c:dd}}_flatfield.ome.tif"),
            darkfield: format!("{stem}{span}_c0{{c:dd}}_darkfield.ome.tif"),
            stitched: format!("{stem}{span}_c0{{c:dd}}.ome.tif"),
            mist: format!("{}_y0{{rr}}_x0{{cc}}_c000.ome.tif", naming.stem(1)),

            original_ome_re: Regex::new(&format!(
                r"^R{replicate_digit}C\d+\.ome\.tif$"
            ))?,
            pyramid_zarr_re: Regex::new(&format!(
                r"^R{replicate_digit}C\d+\.ome\.zarr$"
            ))?,
            pyramid_stem_re: Regex::new(&format!(r"^R{replicate_digit}C\d+"))?,
            fov_re: Regex::new(&format!(
                r"^{stem_re}_y0\d{{2}}_x0\d{{2}}_c0\d{{2}}\.ome\.tif$"
            ))?,
            flatfield_re: Regex::new(&format!(
                r"^{stem_re}{span_re}_c0\d{{2}}_flatfield\.ome\.tif$"
            ))?,
            recycled_re: Regex::new(&format!(
                r"^{stem_re}{span_re}_c0\d{{2}}-global-positions-1\.txt$"
            ))?,
            stitched_re: Regex::new(&format!(
                r"^{stem_re}{span_re}_c0\d{{2}}\.ome\.tif$"
            ))?,
            stitched_pyramid_stem_re: Regex::new(&format!(
                r"^{stem_re}{span_re}_c0\d{{2}}"
            ))?,
        })
    }

    /// Tile pattern for one replicate/channel, as consumed by the image
    /// assembler when stitching a single recycled vector.
    pub fn fovs_for(&self, replicate: u32, channel: u32) -> String {
        format!(
            "{}_y0{{y:dd}}_x0{{x:dd}}_c0{:02}.ome.tif",
            self.naming.stem(replicate),
            channel
        )
    }
}
