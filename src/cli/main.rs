//! Training-set preparation CLI
//!
//! Command-line interface exposing the two batch pipelines as subcommands.

use super::config::CliConfigBuilder;
use crate::pipeline::{DownloadPipeline, ResizePipeline};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

/// Training-set preparation tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "trainset-prep")]
pub struct Cli {
    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Pipelines available as subcommands
#[derive(Subcommand)]
pub enum Command {
    /// Download dataset images, filtering rows by language and similarity
    Download(DownloadArgs),
    /// Resize a directory of images to a fixed resolution
    Resize(ResizeArgs),
}

/// Arguments of the download pipeline
#[derive(Args)]
pub struct DownloadArgs {
    /// Dataset metadata: a .jsonl file, a directory of .jsonl files, or an
    /// http(s) URL (fetched once into the cache)
    #[arg(short, long, value_name = "PATH|URL")]
    pub metadata: String,

    /// Directory to store the dataset; images land under images/
    #[arg(long, value_name = "DIR", default_value = "./train_data")]
    pub train_data_dir: String,

    /// Directory to store cached metadata [default: XDG cache dir]
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<String>,

    /// Number of rows read from the dataset before filtering
    #[arg(long, default_value_t = 170_000_000)]
    pub max_train_samples: usize,

    /// Number of concurrent image fetches
    #[arg(long, default_value_t = 237)]
    pub num_proc: usize,

    /// Language code a row must carry to be kept
    #[arg(long, default_value = "en")]
    pub language: String,

    /// Keep only rows with similarity strictly above this value
    #[arg(long, default_value_t = 0.3)]
    pub similarity_threshold: f64,
}

/// Arguments of the resize pipeline
#[derive(Args)]
pub struct ResizeArgs {
    /// Directory of input images
    #[arg(short, long, value_name = "DIR", default_value = "./train_data/images")]
    pub input_dir: String,

    /// Directory for resized images and the failure list
    #[arg(short, long, value_name = "DIR", default_value = "./train_data/resized_images")]
    pub output_dir: String,

    /// Target width in pixels
    #[arg(long, default_value_t = 512)]
    pub width: u32,

    /// Target height in pixels
    #[arg(long, default_value_t = 512)]
    pub height: u32,

    /// Sidecar ICC profile embedded into every output PNG
    #[arg(long, value_name = "FILE", default_value = "./srgb.icc")]
    pub icc_profile: String,

    /// Number of resize workers (0 = auto-detect)
    #[arg(short, long, default_value_t = 0)]
    pub workers: usize,

    /// Filename pattern for batch processing (e.g., "*.jpg")
    #[arg(long)]
    pub pattern: Option<String>,

    /// Process the input directory recursively
    #[arg(short, long)]
    pub recursive: bool,
}

/// CLI entry point
///
/// # Errors
/// Returns an error for invalid arguments or a startup-fatal pipeline
/// failure; per-item failures are logged and do not affect the exit code.
pub async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).context("Failed to initialize tracing")?;

    match &cli.command {
        Command::Download(args) => run_download(args).await,
        Command::Resize(args) => run_resize(args).await,
    }
}

async fn run_download(args: &DownloadArgs) -> Result<()> {
    let config = CliConfigBuilder::download_config(args).context("Invalid CLI arguments")?;

    info!("Starting dataset download");
    info!("Metadata source: {}", config.metadata);
    info!("Output root: {}", config.train_data_dir.display());

    let pipeline = DownloadPipeline::new(config);
    let summary = pipeline.run().await.context("Download pipeline failed")?;

    if summary.failures > 0 {
        tracing::warn!(
            "Some rows failed to process. Saved: {}, Failed: {}",
            summary.images_saved,
            summary.failures
        );
    }

    println!(
        "created data folder at: {}",
        pipeline.config().train_data_dir.display()
    );
    Ok(())
}

async fn run_resize(args: &ResizeArgs) -> Result<()> {
    let config = CliConfigBuilder::resize_config(args).context("Invalid CLI arguments")?;

    info!("Starting image resize");
    info!("Input: {}", config.input_dir.display());
    info!("Output: {}", config.output_dir.display());

    let summary = ResizePipeline::new(config)
        .run()
        .await
        .context("Resize pipeline failed")?;

    if summary.failed > 0 {
        tracing::warn!(
            "Some files could not be resized; see {}",
            summary.failure_list.display()
        );
    }

    Ok(())
}

/// Initialize tracing based on the CLI verbosity level
fn init_tracing(verbose_count: u8) -> Result<()> {
    use crate::tracing_config::{TracingConfig, TracingFormat};

    TracingConfig::new()
        .with_verbosity(verbose_count)
        .with_format(TracingFormat::Console)
        .init()
        .context("Failed to initialize tracing subscriber")
}
