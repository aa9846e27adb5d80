pub mod patterns;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use stitch_kit_common::{GridDims, StitchKitError, TileNaming};

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    InvalidGrid(#[from] StitchKitError),
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
}

/// Layout of one acquisition: how many replicates and channels were scanned
/// and the dimensions of the tile grid.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct DatasetLayout {
    pub num_replicates: u32,
    pub num_channels: u32,
    pub num_xs: u32,
    pub num_ys: u32,
    #[serde(default)]
    pub naming: TileNaming,
}

impl Default for DatasetLayout {
    /// The reference dataset: 5 replicates, 11 channels, 22 x 15 tiles
    fn default() -> Self {
        Self {
            num_replicates: 5,
            num_channels: 11,
            num_xs: 22,
            num_ys: 15,
            naming: TileNaming::default(),
        }
    }
}

impl DatasetLayout {
    /// Validated grid dimensions
    pub fn dims(&self) -> Result<GridDims, LayoutError> {
        Ok(GridDims::new(self.num_xs, self.num_ys)?)
    }

    /// Replicates actually processed in this run
    pub fn effective_replicates(&self, single_replicate: bool) -> u32 {
        if single_replicate {
            1
        } else {
            self.num_replicates
        }
    }

    /// One whole-grid image per replicate/channel combination
    pub fn num_images(&self, single_replicate: bool) -> usize {
        self.effective_replicates(single_replicate) as usize * self.num_channels as usize
    }

    /// Total tile count across all replicates and channels
    pub fn num_fovs(&self, single_replicate: bool) -> Result<usize, LayoutError> {
        Ok(self.num_images(single_replicate) * self.dims()?.tile_count())
    }

    /// Load a layout from a TOML file
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load a layout from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, LayoutError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a layout from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load a layout from a JSON string
    pub fn from_json(content: &str) -> Result<Self, LayoutError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load a layout
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(LayoutError::UnsupportedFileFormat),
        }
    }

    /// Save the layout to a TOML file
    pub fn to_toml_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LayoutError> {
        fs::write(path, toml::to_string_pretty(&self)?)?;
        Ok(())
    }

    /// Save the layout to a JSON file
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LayoutError> {
        fs::write(path, serde_json::to_string_pretty(&self)?)?;
        Ok(())
    }
}
