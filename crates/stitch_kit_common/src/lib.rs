//! # Stitch Kit Common - Shared Types and Utilities
//!
//! A foundational library providing the grid geometry and tile-naming
//! conventions shared across the Stitch Kit ecosystem.
//!
//! ## Example
//!
//! ```rust
//! use stitch_kit_common::{GridDims, GridCoord, TileNaming};
//!
//! let dims = GridDims::new(22, 15).unwrap();
//! let naming = TileNaming::default();
//!
//! // The reference tile (replicate 1, channel 0) at a grid coordinate
//! let name = naming.reference_tile(GridCoord::new(3, 7));
//! assert_eq!(name, "S1_R1_C1-C11_A1_y003_x007_c000.ome.tif");
//!
//! // Row-major traversal of the whole grid
//! assert_eq!(dims.coords().count(), 330);
//! ```

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use thiserror::Error;

/// Result type for stitch kit operations
pub type Result<T> = std::result::Result<T, StitchKitError>;

/// Standard error type for stitch kit operations
#[derive(Error, Debug)]
pub enum StitchKitError {
    #[error("Invalid grid dimensions: {num_xs} x {num_ys} (both must be positive)")]
    InvalidGrid { num_xs: u32, num_ys: u32 },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Dimensions of the rectangular scan grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct GridDims {
    /// Number of tile columns
    pub num_xs: u32,
    /// Number of tile rows
    pub num_ys: u32,
}

impl GridDims {
    /// Create grid dimensions, rejecting empty grids
    pub fn new(num_xs: u32, num_ys: u32) -> Result<Self> {
        if num_xs == 0 || num_ys == 0 {
            return Err(StitchKitError::InvalidGrid { num_xs, num_ys });
        }
        Ok(Self { num_xs, num_ys })
    }

    /// Total number of tiles in the grid
    pub fn tile_count(&self) -> usize {
        self.num_xs as usize * self.num_ys as usize
    }

    /// Check whether a coordinate lies inside the grid
    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.x < self.num_xs && coord.y < self.num_ys
    }

    /// Iterate all grid coordinates in row-major order (y outer, x inner)
    pub fn coords(&self) -> impl Iterator<Item = GridCoord> + '_ {
        let num_xs = self.num_xs;
        (0..self.num_ys).flat_map(move |y| (0..num_xs).map(move |x| GridCoord { y, x }))
    }

    /// Inclusive row span as it appears in filenames, e.g. "00-14" for 15 rows
    pub fn y_span(&self) -> String {
        format!("00-{:02}", self.num_ys - 1)
    }

    /// Inclusive column span as it appears in filenames, e.g. "00-21" for 22 columns
    pub fn x_span(&self) -> String {
        format!("00-{:02}", self.num_xs - 1)
    }
}

/// A tile's row/column position in the scan grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct GridCoord {
    /// Row index
    pub y: u32,
    /// Column index
    pub x: u32,
}

impl GridCoord {
    /// Create a new grid coordinate
    pub fn new(y: u32, x: u32) -> Self {
        Self { y, x }
    }
}

/// Filename conventions for the acquisition.
///
/// All tile and positions-file names share a fixed
/// `{slide}_R{replicate}_{channel_group}_{acquisition}` stem; the grid
/// coordinate and channel are appended with two-digit zero padding behind a
/// literal `y0`/`x0`/`c0` marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TileNaming {
    /// Slide identifier, e.g. "S1"
    pub slide: String,
    /// Channel-group label embedded in every name, e.g. "C1-C11"
    pub channel_group: String,
    /// Acquisition label, e.g. "A1"
    pub acquisition: String,
}

impl Default for TileNaming {
    fn default() -> Self {
        Self {
            slide: "S1".to_string(),
            channel_group: "C1-C11".to_string(),
            acquisition: "A1".to_string(),
        }
    }
}

impl TileNaming {
    /// Shared `{slide}_R{replicate}_{channel_group}_{acquisition}` name stem
    pub fn stem(&self, replicate: u32) -> String {
        format!(
            "{}_R{}_{}_{}",
            self.slide, replicate, self.channel_group, self.acquisition
        )
    }

    /// Tile filename for a given replicate, grid coordinate, and channel
    pub fn tile(&self, replicate: u32, coord: GridCoord, channel: u32) -> String {
        format!(
            "{}_y0{:02}_x0{:02}_c0{:02}.ome.tif",
            self.stem(replicate),
            coord.y,
            coord.x,
            channel
        )
    }

    /// Reference tile filename (replicate 1, channel 0) used as the lookup
    /// key into the base stitching vector
    pub fn reference_tile(&self, coord: GridCoord) -> String {
        self.tile(1, coord, 0)
    }

    /// Filename of the recycled global-positions file for one
    /// replicate/channel combination
    pub fn positions_file(&self, replicate: u32, channel: u32, dims: GridDims) -> String {
        format!(
            "{}_y0({})_x0({})_c0{:02}-global-positions-1.txt",
            self.stem(replicate),
            dims.y_span(),
            dims.x_span(),
            channel
        )
    }

    /// Name of the stitched composite image for one replicate/channel
    pub fn stitched_image(&self, replicate: u32, channel: u32, dims: GridDims) -> String {
        format!(
            "{}_y0({})_x0({})_c0{:02}.ome.tif",
            self.stem(replicate),
            dims.y_span(),
            dims.x_span(),
            channel
        )
    }

    /// Name of the CZI archive holding all tiles of one replicate
    pub fn czi_archive(&self, replicate: u32) -> String {
        format!("{}.czi", self.stem(replicate))
    }
}

/// Utility functions for directory bookkeeping
pub mod utils {
    use super::*;
    use regex::Regex;
    use std::path::Path;

    /// Ensure an output directory exists
    pub fn ensure_output_dir(path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }

    /// Count directory entries whose file name matches the given pattern.
    ///
    /// Non-recursive; entries with non-UTF-8 names are skipped.
    pub fn count_matching(dir: &Path, pattern: &Regex) -> Result<usize> {
        if !dir.exists() {
            return Ok(0);
        }
        let mut count = 0;
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if pattern.is_match(name) {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// List directory entries whose file name matches the given pattern,
    /// sorted by name for deterministic traversal.
    pub fn list_matching(dir: &Path, pattern: &Regex) -> Result<Vec<std::path::PathBuf>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if pattern.is_match(name) {
                    paths.push(entry.path());
                }
            }
        }
        paths.sort();
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_dims_validation() {
        assert!(GridDims::new(22, 15).is_ok());
        assert!(GridDims::new(0, 15).is_err());
        assert!(GridDims::new(22, 0).is_err());
    }

    #[test]
    fn test_grid_traversal_row_major() {
        let dims = GridDims::new(3, 2).unwrap();
        let coords: Vec<_> = dims.coords().collect();

        assert_eq!(coords.len(), dims.tile_count());
        assert_eq!(coords[0], GridCoord::new(0, 0));
        assert_eq!(coords[1], GridCoord::new(0, 1));
        assert_eq!(coords[2], GridCoord::new(0, 2));
        assert_eq!(coords[3], GridCoord::new(1, 0));
        assert_eq!(coords[5], GridCoord::new(1, 2));
    }

    #[test]
    fn test_grid_contains() {
        let dims = GridDims::new(22, 15).unwrap();
        assert!(dims.contains(GridCoord::new(14, 21)));
        assert!(!dims.contains(GridCoord::new(15, 0)));
        assert!(!dims.contains(GridCoord::new(0, 22)));
    }

    #[test]
    fn test_spans() {
        let dims = GridDims::new(22, 15).unwrap();
        assert_eq!(dims.y_span(), "00-14");
        assert_eq!(dims.x_span(), "00-21");

        let small = GridDims::new(2, 1).unwrap();
        assert_eq!(small.y_span(), "00-00");
        assert_eq!(small.x_span(), "00-01");
    }

    #[test]
    fn test_tile_names() {
        let naming = TileNaming::default();
        assert_eq!(
            naming.tile(3, GridCoord::new(12, 5), 7),
            "S1_R3_C1-C11_A1_y012_x005_c007.ome.tif"
        );
        assert_eq!(
            naming.reference_tile(GridCoord::new(0, 0)),
            "S1_R1_C1-C11_A1_y000_x000_c000.ome.tif"
        );
    }

    #[test]
    fn test_positions_file_name() {
        let naming = TileNaming::default();
        let dims = GridDims::new(22, 15).unwrap();
        assert_eq!(
            naming.positions_file(2, 10, dims),
            "S1_R2_C1-C11_A1_y0(00-14)_x0(00-21)_c010-global-positions-1.txt"
        );
    }

    #[test]
    fn test_stitched_and_archive_names() {
        let naming = TileNaming::default();
        let dims = GridDims::new(22, 15).unwrap();
        assert_eq!(
            naming.stitched_image(1, 0, dims),
            "S1_R1_C1-C11_A1_y0(00-14)_x0(00-21)_c000.ome.tif"
        );
        assert_eq!(naming.czi_archive(4), "S1_R4_C1-C11_A1.czi");
    }

    #[test]
    fn test_count_matching() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["R1C1.ome.tif", "R1C2.ome.tif", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let pattern = regex::Regex::new(r"^R\d+C\d+\.ome\.tif$").unwrap();
        assert_eq!(utils::count_matching(dir.path(), &pattern).unwrap(), 2);

        let missing = dir.path().join("does-not-exist");
        assert_eq!(utils::count_matching(&missing, &pattern).unwrap(), 0);
    }
}
