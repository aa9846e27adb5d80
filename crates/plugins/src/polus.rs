//! Argument builders for the Polus WIPP plugin containers used by the
//! pipeline. Each struct captures one invocation; directories are named
//! relative to the mounted data directory.

use crate::{data_path, Plugin};

/// Convert images to OME-TIFF or OME-Zarr
#[derive(Debug, Clone, PartialEq)]
pub struct OmeConverter {
    pub inp_dir: String,
    pub file_pattern: String,
    pub file_extension: String,
    pub out_dir: String,
}

impl Plugin for OmeConverter {
    fn image(&self) -> String {
        "polusai/ome-converter-plugin:0.3.2".to_string()
    }

    fn args(&self) -> Vec<String> {
        vec![
            "--inpDir".to_string(),
            data_path(&self.inp_dir),
            "--filePattern".to_string(),
            self.file_pattern.clone(),
            "--fileExtension".to_string(),
            self.file_extension.clone(),
            "--outDir".to_string(),
            data_path(&self.out_dir),
        ]
    }

    fn description(&self) -> String {
        format!("ome-converter: {} -> {}", self.inp_dir, self.out_dir)
    }
}

/// Build multi-resolution pyramids for zoomed viewing
#[derive(Debug, Clone, PartialEq)]
pub struct PrecomputeSlide {
    pub inp_dir: String,
    pub file_pattern: String,
    pub out_dir: String,
    pub pyramid_type: String,
    pub image_type: String,
}

impl PrecomputeSlide {
    /// Intensity-image Zarr pyramids, the only variant the pipeline uses
    pub fn zarr(
        inp_dir: impl Into<String>,
        file_pattern: impl Into<String>,
        out_dir: impl Into<String>,
    ) -> Self {
        Self {
            inp_dir: inp_dir.into(),
            file_pattern: file_pattern.into(),
            out_dir: out_dir.into(),
            pyramid_type: "Zarr".to_string(),
            image_type: "Intensity".to_string(),
        }
    }
}

impl Plugin for PrecomputeSlide {
    fn image(&self) -> String {
        "polusai/precompute-slide-plugin:1.7.0".to_string()
    }

    fn args(&self) -> Vec<String> {
        vec![
            "--inpDir".to_string(),
            data_path(&self.inp_dir),
            "--filePattern".to_string(),
            self.file_pattern.clone(),
            "--pyramidType".to_string(),
            self.pyramid_type.clone(),
            "--imageType".to_string(),
            self.image_type.clone(),
            "--outDir".to_string(),
            data_path(&self.out_dir),
        ]
    }

    fn description(&self) -> String {
        format!(
            "precompute-slide ({}): {} -> {}",
            self.pyramid_type, self.inp_dir, self.out_dir
        )
    }
}

/// Extract CZI archives into per-tile FOV images
#[derive(Debug, Clone, PartialEq)]
pub struct CziExtract {
    pub inp_dir: String,
    pub file_pattern: String,
    pub out_dir: String,
}

impl Plugin for CziExtract {
    fn image(&self) -> String {
        "polusai/czi-extract-plugin:1.1.1".to_string()
    }

    fn args(&self) -> Vec<String> {
        vec![
            "--inpDir".to_string(),
            data_path(&self.inp_dir),
            "--filePattern".to_string(),
            self.file_pattern.clone(),
            "--outDir".to_string(),
            data_path(&self.out_dir),
        ]
    }

    fn description(&self) -> String {
        format!("czi-extract: {} -> {}", self.inp_dir, self.out_dir)
    }
}

/// Estimate flatfield/darkfield illumination-correction components
#[derive(Debug, Clone, PartialEq)]
pub struct BasicFlatfieldEstimation {
    pub inp_dir: String,
    pub file_pattern: String,
    pub out_dir: String,
    /// Pattern variables to group tiles by, e.g. "rc" for replicate+channel
    pub group_by: String,
    pub get_darkfield: bool,
}

impl Plugin for BasicFlatfieldEstimation {
    fn image(&self) -> String {
        "polusai/basic-flatfield-estimation-plugin:2.1.1".to_string()
    }

    fn args(&self) -> Vec<String> {
        vec![
            "--inpDir".to_string(),
            data_path(&self.inp_dir),
            "--filePattern".to_string(),
            self.file_pattern.clone(),
            "--groupBy".to_string(),
            self.group_by.clone(),
            "--getDarkfield".to_string(),
            self.get_darkfield.to_string(),
            "--outDir".to_string(),
            data_path(&self.out_dir),
        ]
    }

    fn description(&self) -> String {
        format!(
            "basic-flatfield-estimation (group by '{}'): {} -> {}",
            self.group_by, self.inp_dir, self.out_dir
        )
    }
}

/// Apply flatfield/darkfield correction to tiles
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyFlatfield {
    pub img_dir: String,
    pub img_pattern: String,
    pub ff_dir: String,
    pub ff_pattern: String,
    pub df_pattern: String,
    pub out_dir: String,
}

impl Plugin for ApplyFlatfield {
    fn image(&self) -> String {
        "polusai/apply-flatfield-plugin:2.0.0".to_string()
    }

    fn args(&self) -> Vec<String> {
        vec![
            "--imgDir".to_string(),
            data_path(&self.img_dir),
            "--imgPattern".to_string(),
            self.img_pattern.clone(),
            "--ffDir".to_string(),
            data_path(&self.ff_dir),
            "--ffPattern".to_string(),
            self.ff_pattern.clone(),
            "--dfPattern".to_string(),
            self.df_pattern.clone(),
            "--outDir".to_string(),
            data_path(&self.out_dir),
        ]
    }

    fn description(&self) -> String {
        format!("apply-flatfield: {} -> {}", self.img_dir, self.out_dir)
    }
}

/// Assemble tiles into one composite image per stitching vector
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAssembler {
    pub img_dir: String,
    /// Stitching vector file, relative to the data directory
    pub vector_file: String,
    pub file_pattern: String,
    pub out_dir: String,
}

impl Plugin for ImageAssembler {
    fn image(&self) -> String {
        "polusai/image-assembler-plugin:1.4.0".to_string()
    }

    fn args(&self) -> Vec<String> {
        vec![
            "--imgPath".to_string(),
            data_path(&self.img_dir),
            "--stitchPath".to_string(),
            data_path(&self.vector_file),
            "--filePattern".to_string(),
            self.file_pattern.clone(),
            "--outDir".to_string(),
            data_path(&self.out_dir),
        ]
    }

    fn description(&self) -> String {
        format!(
            "image-assembler: {} + {} -> {}",
            self.img_dir, self.vector_file, self.out_dir
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ome_converter_args() {
        let plugin = OmeConverter {
            inp_dir: "original".to_string(),
            file_pattern: "R{r:d}C{c:d+}.tif".to_string(),
            file_extension: ".ome.tif".to_string(),
            out_dir: "original-ome".to_string(),
        };

        assert_eq!(
            plugin.args(),
            vec![
                "--inpDir",
                "/data/original",
                "--filePattern",
                "R{r:d}C{c:d+}.tif",
                "--fileExtension",
                ".ome.tif",
                "--outDir",
                "/data/original-ome",
            ]
        );
    }

    #[test]
    fn test_precompute_slide_zarr() {
        let plugin = PrecomputeSlide::zarr("stitched", ".*", "stitched-pyramids");
        assert_eq!(plugin.pyramid_type, "Zarr");
        assert_eq!(plugin.image_type, "Intensity");

        let args = plugin.args();
        let idx = args.iter().position(|a| a == "--pyramidType").unwrap();
        assert_eq!(args[idx + 1], "Zarr");
    }

    #[test]
    fn test_flatfield_darkfield_flag() {
        let plugin = BasicFlatfieldEstimation {
            inp_dir: "fovs".to_string(),
            file_pattern: "tile_{c:dd}.ome.tif".to_string(),
            out_dir: "fovs-ff".to_string(),
            group_by: "rc".to_string(),
            get_darkfield: true,
        };

        let args = plugin.args();
        let idx = args.iter().position(|a| a == "--getDarkfield").unwrap();
        assert_eq!(args[idx + 1], "true");
    }

    #[test]
    fn test_image_assembler_vector_path() {
        let plugin = ImageAssembler {
            img_dir: "fovs-corrected".to_string(),
            vector_file: "recycled-stitching-vectors/v.txt".to_string(),
            file_pattern: "S1_R2_C1-C11_A1_y0{y:dd}_x0{x:dd}_c001.ome.tif".to_string(),
            out_dir: "stitched".to_string(),
        };

        let args = plugin.args();
        assert_eq!(args[3], "/data/recycled-stitching-vectors/v.txt");
    }
}
