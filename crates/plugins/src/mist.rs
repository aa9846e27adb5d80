//! MIST stitching tool (run as a Docker container) producing the base
//! stitching vector for the reference channel/replicate.

use stitch_kit_common::GridDims;

use crate::{data_path, Plugin};

/// Full argument set for one MIST run
#[derive(Debug, Clone, PartialEq)]
pub struct MistConfig {
    pub docker_image: String,
    /// Tile directory, relative to the data directory
    pub image_dir: String,
    pub filename_pattern_type: String,
    pub filename_pattern: String,
    pub grid_origin: String,
    pub grid_width: u32,
    pub grid_height: u32,
    pub start_tile_row: u32,
    pub start_tile_col: u32,
    pub start_row: u32,
    pub start_col: u32,
    pub extent_width: u32,
    pub extent_height: u32,
    pub is_time_slices: bool,
    pub assemble_no_overlap: bool,
    pub stage_repeatability: u32,
    pub overlap_uncertainty: u32,
    pub program_type: String,
    /// Output directory, relative to the data directory
    pub output_path: String,
}

impl MistConfig {
    /// MIST configuration for a full-grid ROWCOL stitch with the upper-left
    /// origin and the stage tolerances used for this dataset.
    pub fn for_grid(
        image_dir: impl Into<String>,
        filename_pattern: impl Into<String>,
        dims: GridDims,
        output_path: impl Into<String>,
    ) -> Self {
        Self {
            docker_image: "wipp/mist:2.0.7".to_string(),
            image_dir: image_dir.into(),
            filename_pattern_type: "ROWCOL".to_string(),
            filename_pattern: filename_pattern.into(),
            grid_origin: "UL".to_string(),
            grid_width: dims.num_xs,
            grid_height: dims.num_ys,
            start_tile_row: 0,
            start_tile_col: 0,
            start_row: 0,
            start_col: 0,
            extent_width: dims.num_xs,
            extent_height: dims.num_ys,
            is_time_slices: false,
            assemble_no_overlap: true,
            stage_repeatability: 1,
            overlap_uncertainty: 1,
            program_type: "java".to_string(),
            output_path: output_path.into(),
        }
    }
}

impl Plugin for MistConfig {
    fn image(&self) -> String {
        self.docker_image.clone()
    }

    fn args(&self) -> Vec<String> {
        vec![
            "--imageDir".to_string(),
            data_path(&self.image_dir),
            "--filenamePatternType".to_string(),
            self.filename_pattern_type.clone(),
            "--filenamePattern".to_string(),
            self.filename_pattern.clone(),
            "--gridOrigin".to_string(),
            self.grid_origin.clone(),
            "--gridWidth".to_string(),
            self.grid_width.to_string(),
            "--gridHeight".to_string(),
            self.grid_height.to_string(),
            "--startTileRow".to_string(),
            self.start_tile_row.to_string(),
            "--startTileCol".to_string(),
            self.start_tile_col.to_string(),
            "--startRow".to_string(),
            self.start_row.to_string(),
            "--startCol".to_string(),
            self.start_col.to_string(),
            "--extentWidth".to_string(),
            self.extent_width.to_string(),
            "--extentHeight".to_string(),
            self.extent_height.to_string(),
            "--isTimeSlices".to_string(),
            self.is_time_slices.to_string(),
            "--assembleNoOverlap".to_string(),
            self.assemble_no_overlap.to_string(),
            "--stageRepeatability".to_string(),
            self.stage_repeatability.to_string(),
            "--overlapUncertainty".to_string(),
            self.overlap_uncertainty.to_string(),
            "--programType".to_string(),
            self.program_type.clone(),
            "--outputPath".to_string(),
            data_path(&self.output_path),
        ]
    }

    fn description(&self) -> String {
        format!(
            "MIST ({}) over {} ({} x {})",
            self.docker_image, self.image_dir, self.grid_width, self.grid_height
        )
    }
}
