use clap::{Parser, Subcommand};
use cli::patterns::DatasetPatterns;
use cli::DatasetLayout;
use color_eyre::eyre::{eyre, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

use plugins::docker::{DockerRunner, Mount};
use plugins::mist::MistConfig;
use plugins::polus::{
    ApplyFlatfield, BasicFlatfieldEstimation, CziExtract, ImageAssembler, OmeConverter,
    PrecomputeSlide,
};
use plugins::Plugin;
use recycling::{RecyclerConfig, VectorRecycler};
use stitch_kit_common::utils;

const ORIGINAL_MOUNT: &str = "original";
const CZI_MOUNT: &str = "czi";
const ORIGINAL_OME_DIR: &str = "original-ome";
const ORIGINAL_PYRAMIDS_DIR: &str = "original-pyramids";
const FOVS_DIR: &str = "fovs";
const FF_DIR: &str = "fovs-ff";
const FOVS_CORRECTED_DIR: &str = "fovs-corrected";
const VECTOR_DIR: &str = "stitching-vector";
const BASE_VECTOR_NAME: &str = "img-global-positions-1.txt";
const RECYCLED_DIR: &str = "recycled-stitching-vectors";
const STITCHED_DIR: &str = "stitched";
const STITCHED_PYRAMIDS_DIR: &str = "stitched-pyramids";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Default log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    verbosity: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full stitching pipeline
    Run {
        /// Path to the original data directory with the pre-stitched images
        #[arg(short = 'o', long)]
        original_dir: PathBuf,
        /// Path to the CZI data directory containing the tile archives
        #[arg(short = 'c', long)]
        czi_dir: PathBuf,
        /// Path to the data directory, where all the results will be saved
        #[arg(short = 'd', long)]
        data_dir: PathBuf,
        /// Run only on a single replicate from the dataset
        #[arg(short = 's', long)]
        single_replicate: bool,
        /// Dataset layout file (.json or .toml); defaults to the reference
        /// dataset layout
        #[arg(long)]
        layout: Option<PathBuf>,
    },
    /// Recycle an existing base stitching vector for all channels and
    /// replicates
    Recycle {
        /// Base vector file computed by the stitching tool
        #[arg(short, long)]
        base_vector: PathBuf,
        /// Output directory for the recycled vectors
        #[arg(short, long)]
        out_dir: PathBuf,
        #[arg(long, default_value_t = 11)]
        num_channels: u32,
        #[arg(long, default_value_t = 5)]
        num_replicates: u32,
        #[arg(long, default_value_t = 22)]
        num_xs: u32,
        #[arg(long, default_value_t = 15)]
        num_ys: u32,
    },
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&cli.verbosity)),
        )
        .init();

    match &cli.command {
        Commands::Run {
            original_dir,
            czi_dir,
            data_dir,
            single_replicate,
            layout,
        } => {
            let layout = match layout {
                Some(path) => DatasetLayout::from_file(path)?,
                None => DatasetLayout::default(),
            };
            let pipeline = Pipeline::new(
                original_dir,
                czi_dir,
                data_dir,
                layout,
                *single_replicate,
            )?;
            pipeline.run()?;
        }
        Commands::Recycle {
            base_vector,
            out_dir,
            num_channels,
            num_replicates,
            num_xs,
            num_ys,
        } => {
            let dims = stitch_kit_common::GridDims::new(*num_xs, *num_ys)?;
            let config = RecyclerConfig::new(*num_channels, *num_replicates, dims)?;
            let written = VectorRecycler::new(config).recycle(base_vector, out_dir)?;
            info!("✅ Recycled {} stitching vectors", written.len());
        }
    }

    Ok(())
}

struct Pipeline {
    data_dir: PathBuf,
    mounts: Vec<Mount>,
    runner: DockerRunner,
    layout: DatasetLayout,
    patterns: DatasetPatterns,
    single_replicate: bool,
}

impl Pipeline {
    fn new(
        original_dir: &Path,
        czi_dir: &Path,
        data_dir: &Path,
        layout: DatasetLayout,
        single_replicate: bool,
    ) -> Result<Self> {
        if !original_dir.is_dir() {
            return Err(eyre!("Original data directory not found: {original_dir:?}"));
        }
        if !czi_dir.is_dir() {
            return Err(eyre!("CZI data directory not found: {czi_dir:?}"));
        }
        utils::ensure_output_dir(data_dir)?;

        let patterns = DatasetPatterns::new(&layout.naming, layout.dims()?, single_replicate)?;
        let mounts = vec![
            Mount::data(data_dir),
            Mount::new(original_dir, format!("/data/{ORIGINAL_MOUNT}")),
            Mount::new(czi_dir, format!("/data/{CZI_MOUNT}")),
        ];

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            mounts,
            runner: DockerRunner::new()?,
            layout,
            patterns,
            single_replicate,
        })
    }

    fn run(&self) -> Result<()> {
        info!("Starting stitching pipeline...");
        info!("Data directory: {}", self.data_dir.display());
        info!("Single replicate: {}", self.single_replicate);

        self.convert_originals()?;
        self.original_pyramids()?;
        self.extract_fovs()?;
        self.estimate_flatfields()?;
        self.apply_flatfields()?;
        self.compute_base_vector()?;
        self.recycle_vectors()?;
        self.assemble_images()?;
        self.stitched_pyramids()?;

        info!("✅ Pipeline completed");
        Ok(())
    }

    fn stage_dir(&self, name: &str) -> Result<PathBuf> {
        let dir = self.data_dir.join(name);
        utils::ensure_output_dir(&dir)?;
        Ok(dir)
    }

    /// File-count skip check: a stage is complete when its output directory
    /// already holds the expected number of matching artifacts.
    fn stage_complete(&self, dir: &Path, pattern: &Regex, expected: usize) -> Result<bool> {
        Ok(utils::count_matching(dir, pattern)? == expected)
    }

    fn run_plugin(&self, plugin: &dyn Plugin) -> Result<()> {
        self.runner.run(&self.mounts, plugin)?;
        Ok(())
    }

    fn num_images(&self) -> usize {
        self.layout.num_images(self.single_replicate)
    }

    fn convert_originals(&self) -> Result<()> {
        info!("Converting original images to OME-TIFF...");
        let out = self.stage_dir(ORIGINAL_OME_DIR)?;

        if self.stage_complete(&out, &self.patterns.original_ome_re, self.num_images())? {
            info!("OME-TIFF files already exist. Skipping conversion.");
            return Ok(());
        }
        self.run_plugin(&OmeConverter {
            inp_dir: ORIGINAL_MOUNT.to_string(),
            file_pattern: self.patterns.original.clone(),
            file_extension: ".ome.tif".to_string(),
            out_dir: ORIGINAL_OME_DIR.to_string(),
        })
    }

    fn original_pyramids(&self) -> Result<()> {
        info!("Creating pyramids for the original images...");
        let out = self.stage_dir(ORIGINAL_PYRAMIDS_DIR)?;

        if self.stage_complete(&out, &self.patterns.pyramid_zarr_re, self.num_images())? {
            info!("Pyramids already exist. Skipping pyramid creation.");
            return Ok(());
        }
        self.run_plugin(&PrecomputeSlide::zarr(
            ORIGINAL_OME_DIR,
            self.patterns.original_ome.clone(),
            ORIGINAL_PYRAMIDS_DIR,
        ))?;
        fix_zarr_extensions(&out, &self.patterns.pyramid_stem_re)
    }

    fn extract_fovs(&self) -> Result<()> {
        info!("Extracting CZI files into FOVs {}...", self.patterns.czi);
        let out = self.stage_dir(FOVS_DIR)?;
        let num_fovs = self.layout.num_fovs(self.single_replicate)?;

        if self.stage_complete(&out, &self.patterns.fov_re, num_fovs)? {
            info!("FOVs already exist. Skipping extraction.");
            return Ok(());
        }
        self.run_plugin(&CziExtract {
            inp_dir: CZI_MOUNT.to_string(),
            file_pattern: self.patterns.czi.clone(),
            out_dir: FOVS_DIR.to_string(),
        })
    }

    fn estimate_flatfields(&self) -> Result<()> {
        info!("Estimating flatfield and darkfield components of FOVs...");
        let out = self.stage_dir(FF_DIR)?;

        if self.stage_complete(&out, &self.patterns.flatfield_re, self.num_images())? {
            info!("Flatfield and darkfield components already exist. Skipping estimation.");
            return Ok(());
        }
        self.run_plugin(&BasicFlatfieldEstimation {
            inp_dir: FOVS_DIR.to_string(),
            file_pattern: self.patterns.fovs.clone(),
            out_dir: FF_DIR.to_string(),
            group_by: self.patterns.ff_group_by.clone(),
            get_darkfield: true,
        })
    }

    fn apply_flatfields(&self) -> Result<()> {
        info!("Applying flatfield and darkfield correction to FOVs...");
        let out = self.stage_dir(FOVS_CORRECTED_DIR)?;
        let num_fovs = self.layout.num_fovs(self.single_replicate)?;

        if self.stage_complete(&out, &self.patterns.fov_re, num_fovs)? {
            info!("Flatfield and darkfield correction already applied. Skipping.");
            return Ok(());
        }
        self.run_plugin(&ApplyFlatfield {
            img_dir: FOVS_DIR.to_string(),
            img_pattern: self.patterns.fovs.clone(),
            ff_dir: FF_DIR.to_string(),
            ff_pattern: self.patterns.flatfield.clone(),
            df_pattern: self.patterns.darkfield.clone(),
            out_dir: FOVS_CORRECTED_DIR.to_string(),
        })
    }

    fn compute_base_vector(&self) -> Result<()> {
        info!("Getting stitching vector...");
        let out = self.stage_dir(VECTOR_DIR)?;

        if out.join(BASE_VECTOR_NAME).exists() {
            info!("Stitching vector already exists. Skipping.");
            return Ok(());
        }
        self.run_plugin(&MistConfig::for_grid(
            FOVS_CORRECTED_DIR,
            self.patterns.mist.clone(),
            self.layout.dims()?,
            VECTOR_DIR,
        ))
    }

    fn recycle_vectors(&self) -> Result<()> {
        info!("Recycling stitching vector for all channels and replicates...");
        let out = self.stage_dir(RECYCLED_DIR)?;

        if self.stage_complete(&out, &self.patterns.recycled_re, self.num_images())? {
            info!("Recycled stitching vectors already exist. Skipping.");
            return Ok(());
        }
        let config = RecyclerConfig::new(
            self.layout.num_channels,
            self.layout.effective_replicates(self.single_replicate),
            self.layout.dims()?,
        )?
        .with_naming(self.layout.naming.clone());
        let base_vector = self.data_dir.join(VECTOR_DIR).join(BASE_VECTOR_NAME);
        VectorRecycler::new(config).recycle(&base_vector, &out)?;
        Ok(())
    }

    fn assemble_images(&self) -> Result<()> {
        info!("Stitching FOVs with the image-assembler plugin...");
        let out = self.stage_dir(STITCHED_DIR)?;

        if self.stage_complete(&out, &self.patterns.stitched_re, self.num_images())? {
            info!("Stitched images already exist. Skipping.");
            return Ok(());
        }
        let dims = self.layout.dims()?;
        for replicate in 1..=self.layout.effective_replicates(self.single_replicate) {
            for channel in 0..self.layout.num_channels {
                let vector_name = self.layout.naming.positions_file(replicate, channel, dims);
                self.run_plugin(&ImageAssembler {
                    img_dir: FOVS_CORRECTED_DIR.to_string(),
                    vector_file: format!("{RECYCLED_DIR}/{vector_name}"),
                    file_pattern: self.patterns.fovs_for(replicate, channel),
                    out_dir: STITCHED_DIR.to_string(),
                })?;
            }
        }
        Ok(())
    }

    fn stitched_pyramids(&self) -> Result<()> {
        info!("Creating pyramids for the stitched images...");
        let out = self.stage_dir(STITCHED_PYRAMIDS_DIR)?;

        if self.stage_complete(
            &out,
            &self.patterns.stitched_pyramid_stem_re,
            self.num_images(),
        )? {
            info!("Pyramids already exist. Skipping pyramid creation.");
            return Ok(());
        }
        self.run_plugin(&PrecomputeSlide::zarr(
            STITCHED_DIR,
            self.patterns.stitched.clone(),
            STITCHED_PYRAMIDS_DIR,
        ))?;
        fix_zarr_extensions(&out, &self.patterns.stitched_pyramid_stem_re)
    }
}

/// Some pyramids come out of precompute-slide without the `.ome.zarr`
/// extension; add it so downstream pattern checks see a uniform layout.
fn fix_zarr_extensions(dir: &Path, stem_pattern: &Regex) -> Result<()> {
    for path in utils::list_matching(dir, stem_pattern)? {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if !name.contains(".ome.zarr") {
                std::fs::rename(&path, path.with_file_name(format!("{name}.ome.zarr")))?;
            }
        }
    }
    Ok(())
}
