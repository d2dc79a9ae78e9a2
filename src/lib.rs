#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Training-Set Preparation Library
//!
//! Batch tooling for assembling an image training set, built around two
//! independent pipelines:
//!
//! - **Download**: stream rows from a tabular image dataset (JSON Lines),
//!   keep those matching a language/similarity filter, fetch each kept row's
//!   image over HTTP, and save it as a PNG named after the row's caption.
//! - **Resize**: enumerate a directory of images and resize each to a fixed
//!   resolution in an independent worker, normalizing channels, flattening
//!   transparency onto white, and embedding a sidecar ICC profile; files that
//!   fail are collected into a failure list for post-run inspection.
//!
//! Both pipelines are failure-tolerant per item: a single bad row or file is
//! logged and skipped while the batch proceeds. Only startup-time problems
//! (unreadable metadata, missing ICC profile) abort a run.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trainset_prep::{DownloadConfig, DownloadPipeline};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = DownloadConfig::builder()
//!     .metadata("https://example.com/laion/part-00001.jsonl")
//!     .train_data_dir("./train_data")
//!     .max_train_samples(100_000)
//!     .num_proc(64)
//!     .build()?;
//!
//! let summary = DownloadPipeline::new(config).run().await?;
//! println!("saved {} images", summary.images_saved);
//! # Ok(())
//! # }
//! ```
//!
//! ```rust,no_run
//! use trainset_prep::{ResizeConfig, ResizePipeline};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ResizeConfig::builder()
//!     .input_dir("./train_data/images")
//!     .output_dir("./train_data/resized_images")
//!     .target_size(512, 512)
//!     .icc_profile_path("./srgb.icc")
//!     .build()?;
//!
//! let summary = ResizePipeline::new(config).run().await?;
//! println!("resized {}, failed {}", summary.resized, summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod cli;
pub mod color_profile;
pub mod config;
pub mod dataset;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod services;
pub mod tracing_config;

// Public API exports
pub use cache::MetadataCache;
pub use color_profile::ColorProfile;
pub use config::{
    DownloadConfig, DownloadConfigBuilder, ResizeConfig, ResizeConfigBuilder, DEFAULT_LANGUAGE,
    DEFAULT_SIMILARITY_THRESHOLD,
};
pub use dataset::{DatasetRow, JsonlRows, MetadataSource, RowFilter};
pub use error::{PrepError, Result};
pub use fetch::{ImageFetcher, MetadataFetcher, IMAGE_FETCH_TIMEOUT};
pub use pipeline::{DownloadPipeline, DownloadSummary, ResizePipeline, ResizeSummary};
pub use services::{FailureList, ImageIoService, FAILURE_LIST_HEADER};
pub use tracing_config::{TracingConfig, TracingFormat};

/// Download images for a dataset using the given configuration
///
/// Convenience wrapper over [`DownloadPipeline`] for one-shot use.
pub async fn download_images(config: DownloadConfig) -> Result<DownloadSummary> {
    DownloadPipeline::new(config).run().await
}

/// Resize a directory of images using the given configuration
///
/// Convenience wrapper over [`ResizePipeline`] for one-shot use.
pub async fn resize_images(config: ResizeConfig) -> Result<ResizeSummary> {
    ResizePipeline::new(config).run().await
}
