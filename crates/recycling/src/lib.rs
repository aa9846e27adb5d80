//! Stitching-vector recycling.
//!
//! MIST computes one stitching vector for a single reference channel and
//! replicate. All channels and replicates of the same physical scan share
//! identical tile geometry, so that one solved layout can be reused: the
//! recycler re-emits the base vector once per `(replicate, channel)`
//! combination, rewriting only the embedded tile filenames and carrying the
//! position metadata verbatim.

pub mod tokenizer;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use stitch_kit_common::{GridDims, TileNaming};

pub use tokenizer::{parse_positions, StitchingRecord};

#[derive(Error, Debug)]
pub enum RecycleError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Base vector has no record for tile '{image_name}'")]
    MissingRecord { image_name: String },
    #[error("Replicate and channel counts must be positive: {num_replicates} replicate(s), {num_channels} channel(s)")]
    InvalidCounts {
        num_replicates: u32,
        num_channels: u32,
    },
}

/// Configuration for a recycling run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecyclerConfig {
    /// Number of acquisition channels, `0 <= c < num_channels`
    pub num_channels: u32,
    /// Number of replicates, `1 <= r <= num_replicates`
    pub num_replicates: u32,
    /// Scan grid dimensions
    pub dims: GridDims,
    /// Filename conventions of the acquisition
    pub naming: TileNaming,
}

impl RecyclerConfig {
    pub fn new(
        num_channels: u32,
        num_replicates: u32,
        dims: GridDims,
    ) -> Result<Self, RecycleError> {
        if num_channels == 0 || num_replicates == 0 {
            return Err(RecycleError::InvalidCounts {
                num_replicates,
                num_channels,
            });
        }
        Ok(Self {
            num_channels,
            num_replicates,
            dims,
            naming: TileNaming::default(),
        })
    }

    pub fn with_naming(mut self, naming: TileNaming) -> Self {
        self.naming = naming;
        self
    }
}

/// Expands one computed stitching vector into equivalent vectors for every
/// other channel and replicate.
pub struct VectorRecycler {
    config: RecyclerConfig,
}

impl VectorRecycler {
    pub fn new(config: RecyclerConfig) -> Self {
        Self { config }
    }

    /// Recycle the base vector at `base_vector_path` into
    /// `num_replicates * num_channels` files under `out_dir`.
    ///
    /// Existing output files are truncated; for fixed inputs the written
    /// bytes are identical across runs. A lookup miss for any grid
    /// coordinate aborts the whole batch, leaving the file being written at
    /// that point incomplete. Returns the paths written, in creation order.
    pub fn recycle(
        &self,
        base_vector_path: &Path,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, RecycleError> {
        let config = &self.config;
        let text = std::fs::read_to_string(base_vector_path)?;
        let positions = parse_positions(&text);
        info!(
            "Parsed {} position records from {}",
            positions.len(),
            base_vector_path.display()
        );

        std::fs::create_dir_all(out_dir)?;

        let mut written = Vec::new();
        for replicate in 1..=config.num_replicates {
            for channel in 0..config.num_channels {
                let path =
                    out_dir.join(config.naming.positions_file(replicate, channel, config.dims));
                self.write_vector(&positions, replicate, channel, &path)?;
                debug!("Recycled vector written: {}", path.display());
                written.push(path);
            }
        }

        info!(
            "Recycled {} vectors into {}",
            written.len(),
            out_dir.display()
        );
        Ok(written)
    }

    /// Write one recycled vector, one line per grid coordinate in row-major
    /// order.
    fn write_vector(
        &self,
        positions: &HashMap<String, Vec<String>>,
        replicate: u32,
        channel: u32,
        path: &Path,
    ) -> Result<(), RecycleError> {
        let config = &self.config;
        let mut writer = BufWriter::new(File::create(path)?);

        for coord in config.dims.coords() {
            let reference = config.naming.reference_tile(coord);
            let metadata_fields =
                positions
                    .get(&reference)
                    .ok_or_else(|| RecycleError::MissingRecord {
                        image_name: reference.clone(),
                    })?;
            let record = StitchingRecord {
                image_name: config.naming.tile(replicate, coord, channel),
                metadata_fields: metadata_fields.clone(),
            };
            writeln!(writer, "{}", record.to_line())?;
        }

        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stitch_kit_common::GridCoord;

    fn write_base_vector(dir: &Path, dims: GridDims) -> PathBuf {
        let naming = TileNaming::default();
        let mut text = String::new();
        for coord in dims.coords() {
            text.push_str(&format!(
                "file: {};corr: 0.95;position: ({}, {});grid: ({}, {})\n",
                naming.reference_tile(coord),
                coord.x * 1000,
                coord.y * 1000,
                coord.x,
                coord.y
            ));
        }
        let path = dir.join("img-global-positions-1.txt");
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn test_output_file_and_line_counts() {
        let dir = tempfile::tempdir().unwrap();
        let dims = GridDims::new(2, 2).unwrap();
        let base = write_base_vector(dir.path(), dims);

        let recycler = VectorRecycler::new(RecyclerConfig::new(3, 2, dims).unwrap());
        let out_dir = dir.path().join("recycled");
        let written = recycler.recycle(&base, &out_dir).unwrap();

        assert_eq!(written.len(), 6);
        for path in &written {
            let text = std::fs::read_to_string(path).unwrap();
            assert_eq!(text.lines().count(), dims.tile_count());
        }
    }

    #[test]
    fn test_filenames_rewritten_and_metadata_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let dims = GridDims::new(3, 2).unwrap();
        let base = write_base_vector(dir.path(), dims);

        let recycler = VectorRecycler::new(RecyclerConfig::new(2, 2, dims).unwrap());
        let written = recycler.recycle(&base, &dir.path().join("out")).unwrap();

        let naming = TileNaming::default();
        assert!(written[0].ends_with(naming.positions_file(1, 0, dims)));

        // Replicate 2, channel 1
        let path = written
            .iter()
            .find(|p| p.ends_with(naming.positions_file(2, 1, dims)))
            .unwrap();
        let text = std::fs::read_to_string(path).unwrap();

        for (line, coord) in text.lines().zip(dims.coords()) {
            let record = StitchingRecord::parse(line).unwrap();
            assert_eq!(record.image_name, naming.tile(2, coord, 1));
            assert_eq!(
                record.metadata_fields,
                vec![
                    "corr: 0.95".to_string(),
                    format!("position: ({}, {})", coord.x * 1000, coord.y * 1000),
                    format!("grid: ({}, {})", coord.x, coord.y),
                ]
            );
        }
    }

    #[test]
    fn test_degenerate_single_channel_matches_base() {
        // The worked example: 1x2 grid, one replicate, one channel. Channel 0
        // names coincide with the base, so the output reproduces it.
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.txt");
        std::fs::write(
            &base,
            "file: S1_R1_C1-C11_A1_y000_x000_c000.ome.tif;100;200\n\
             file: S1_R1_C1-C11_A1_y000_x001_c000.ome.tif;300;200\n",
        )
        .unwrap();

        let dims = GridDims::new(2, 1).unwrap();
        let recycler = VectorRecycler::new(RecyclerConfig::new(1, 1, dims).unwrap());
        let written = recycler.recycle(&base, &dir.path().join("out")).unwrap();

        assert_eq!(written.len(), 1);
        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert_eq!(
            text,
            "file: S1_R1_C1-C11_A1_y000_x000_c000.ome.tif;100;200\n\
             file: S1_R1_C1-C11_A1_y000_x001_c000.ome.tif;300;200\n"
        );
    }

    #[test]
    fn test_idempotent_byte_identical_reruns() {
        let dir = tempfile::tempdir().unwrap();
        let dims = GridDims::new(2, 3).unwrap();
        let base = write_base_vector(dir.path(), dims);

        let recycler = VectorRecycler::new(RecyclerConfig::new(2, 2, dims).unwrap());
        let out_dir = dir.path().join("out");

        let first = recycler.recycle(&base, &out_dir).unwrap();
        let snapshots: Vec<Vec<u8>> = first.iter().map(|p| std::fs::read(p).unwrap()).collect();

        let second = recycler.recycle(&base, &out_dir).unwrap();
        assert_eq!(first, second);
        for (path, snapshot) in second.iter().zip(&snapshots) {
            assert_eq!(&std::fs::read(path).unwrap(), snapshot);
        }
    }

    #[test]
    fn test_missing_coordinate_aborts_batch() {
        let dir = tempfile::tempdir().unwrap();
        let dims = GridDims::new(2, 1).unwrap();
        let naming = TileNaming::default();

        // Base vector lacking the (y=0, x=0) record
        let base = dir.path().join("base.txt");
        std::fs::write(
            &base,
            format!("file: {};1;2\n", naming.reference_tile(GridCoord::new(0, 1))),
        )
        .unwrap();

        let recycler = VectorRecycler::new(RecyclerConfig::new(2, 1, dims).unwrap());
        let err = recycler
            .recycle(&base, &dir.path().join("out"))
            .unwrap_err();

        match err {
            RecycleError::MissingRecord { image_name } => {
                assert_eq!(image_name, naming.reference_tile(GridCoord::new(0, 0)));
            }
            other => panic!("expected MissingRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_base_vector_produces_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let dims = GridDims::new(2, 2).unwrap();
        let recycler = VectorRecycler::new(RecyclerConfig::new(1, 1, dims).unwrap());

        let out_dir = dir.path().join("out");
        let result = recycler.recycle(&dir.path().join("absent.txt"), &out_dir);

        assert!(matches!(result, Err(RecycleError::Io(_))));
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_invalid_counts_rejected() {
        let dims = GridDims::new(2, 2).unwrap();
        assert!(RecyclerConfig::new(0, 1, dims).is_err());
        assert!(RecyclerConfig::new(1, 0, dims).is_err());
    }
}
