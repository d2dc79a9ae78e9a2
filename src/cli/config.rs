//! Configuration conversion utilities for CLI arguments

use crate::cli::main::{DownloadArgs, ResizeArgs};
use crate::config::{DownloadConfig, ResizeConfig};
use anyhow::{Context, Result};

/// Convert CLI arguments to pipeline configurations
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build a [`DownloadConfig`] from CLI arguments
    pub(crate) fn download_config(args: &DownloadArgs) -> Result<DownloadConfig> {
        let mut builder = DownloadConfig::builder()
            .metadata(&args.metadata)
            .train_data_dir(&args.train_data_dir)
            .max_train_samples(args.max_train_samples)
            .num_proc(args.num_proc)
            .language(&args.language)
            .similarity_threshold(args.similarity_threshold);

        if let Some(cache_dir) = &args.cache_dir {
            builder = builder.cache_dir(cache_dir);
        }

        builder.build().context("Invalid download configuration")
    }

    /// Build a [`ResizeConfig`] from CLI arguments
    pub(crate) fn resize_config(args: &ResizeArgs) -> Result<ResizeConfig> {
        let mut builder = ResizeConfig::builder()
            .input_dir(&args.input_dir)
            .output_dir(&args.output_dir)
            .target_size(args.width, args.height)
            .icc_profile_path(&args.icc_profile)
            .workers(args.workers)
            .recursive(args.recursive);

        if let Some(pattern) = &args.pattern {
            builder = builder.pattern(pattern);
        }

        builder.build().context("Invalid resize configuration")
    }
}
