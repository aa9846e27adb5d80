//! Delegation layer for the external image-processing tools.
//!
//! Every processing step of the pipeline is performed by a pre-built
//! containerized tool; this crate only knows how to name those containers,
//! assemble their argument lists, and run them through Docker. No image
//! processing happens here.

pub mod docker;
pub mod mist;
pub mod polus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("Failed to initialize runner: {0}")]
    Initialization(String),
    #[error("Tool execution failed: {0}")]
    Execution(String),
}

/// A containerized tool invocation: which image to run and with what
/// arguments. The host data directory is mounted at `/data` inside the
/// container, so all paths in `args` are container paths.
pub trait Plugin {
    /// Docker image to run, including tag
    fn image(&self) -> String;

    /// Arguments passed to the container entrypoint
    fn args(&self) -> Vec<String>;

    /// Human-readable description of this invocation
    fn description(&self) -> String;
}

/// Map a path relative to the data directory onto its in-container location
pub fn data_path(relative: &str) -> String {
    format!("/data/{relative}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_path() {
        assert_eq!(data_path("fovs-corrected"), "/data/fovs-corrected");
        assert_eq!(
            data_path("stitching-vector/img-global-positions-1.txt"),
            "/data/stitching-vector/img-global-positions-1.txt"
        );
    }
}
