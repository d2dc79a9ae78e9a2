//! Configuration types for the download and resize pipelines
//!
//! Each pipeline takes an explicit config struct built through a validating
//! builder; nothing reads process-global state.

use crate::error::{PrepError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default language code kept by the row filter
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default similarity threshold; rows must score strictly above it
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Configuration for the dataset download pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Metadata source: path to a `.jsonl` file, a directory of `.jsonl`
    /// files, or an `http(s)` URL fetched into the metadata cache
    pub metadata: String,

    /// Output root; images land under `<train_data_dir>/images/`
    pub train_data_dir: PathBuf,

    /// Override for the metadata cache directory (None = XDG default)
    pub cache_dir: Option<PathBuf>,

    /// Number of rows read from the dataset before filtering
    pub max_train_samples: usize,

    /// Number of concurrent image fetches
    pub num_proc: usize,

    /// Language code a row must carry to be kept
    pub language: String,

    /// Rows are kept only when similarity is present and above this value
    pub similarity_threshold: f64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            metadata: String::new(),
            train_data_dir: PathBuf::from("./train_data"),
            cache_dir: None,
            max_train_samples: 170_000_000,
            num_proc: 237,
            language: DEFAULT_LANGUAGE.to_string(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl DownloadConfig {
    /// Create a builder for fluent construction with validation at build time
    #[must_use]
    pub fn builder() -> DownloadConfigBuilder {
        DownloadConfigBuilder::new()
    }

    /// Directory the downloaded images are written to
    #[must_use]
    pub fn images_dir(&self) -> PathBuf {
        self.train_data_dir.join("images")
    }
}

/// Builder for [`DownloadConfig`]
#[derive(Debug, Default)]
pub struct DownloadConfigBuilder {
    config: DownloadConfig,
}

impl DownloadConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: DownloadConfig::default(),
        }
    }

    /// Set the metadata source (path or URL)
    #[must_use]
    pub fn metadata<S: Into<String>>(mut self, metadata: S) -> Self {
        self.config.metadata = metadata.into();
        self
    }

    /// Set the output root directory
    #[must_use]
    pub fn train_data_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.train_data_dir = dir.into();
        self
    }

    /// Override the metadata cache directory
    #[must_use]
    pub fn cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.cache_dir = Some(dir.into());
        self
    }

    /// Cap the number of rows read before filtering
    #[must_use]
    pub fn max_train_samples(mut self, max: usize) -> Self {
        self.config.max_train_samples = max;
        self
    }

    /// Set the number of concurrent image fetches
    #[must_use]
    pub fn num_proc(mut self, num_proc: usize) -> Self {
        self.config.num_proc = num_proc;
        self
    }

    /// Set the language code kept by the row filter
    #[must_use]
    pub fn language<S: Into<String>>(mut self, language: S) -> Self {
        self.config.language = language.into();
        self
    }

    /// Set the similarity threshold
    #[must_use]
    pub fn similarity_threshold(mut self, threshold: f64) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    /// - Empty metadata source
    /// - `max_train_samples` or `num_proc` of zero
    /// - Non-finite similarity threshold
    pub fn build(self) -> Result<DownloadConfig> {
        if self.config.metadata.trim().is_empty() {
            return Err(PrepError::invalid_config(
                "metadata source must be a path or URL, got an empty string",
            ));
        }
        if self.config.max_train_samples == 0 {
            return Err(PrepError::invalid_config(
                "max_train_samples must be at least 1",
            ));
        }
        if self.config.num_proc == 0 {
            return Err(PrepError::invalid_config("num_proc must be at least 1"));
        }
        if !self.config.similarity_threshold.is_finite() {
            return Err(PrepError::invalid_config(format!(
                "similarity threshold must be finite, got {}",
                self.config.similarity_threshold
            )));
        }
        Ok(self.config)
    }
}

/// Configuration for the resize pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeConfig {
    /// Directory of input images
    pub input_dir: PathBuf,

    /// Directory resized PNGs and the failure list are written to
    pub output_dir: PathBuf,

    /// Target width in pixels
    pub target_width: u32,

    /// Target height in pixels
    pub target_height: u32,

    /// Sidecar ICC profile embedded into every output PNG
    pub icc_profile_path: PathBuf,

    /// Number of concurrent resize workers (0 = auto-detect)
    pub workers: usize,

    /// Optional filename glob applied when enumerating inputs
    pub pattern: Option<String>,

    /// Recurse into subdirectories of `input_dir`
    pub recursive: bool,
}

impl Default for ResizeConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./train_data/images"),
            output_dir: PathBuf::from("./train_data/resized_images"),
            target_width: 512,
            target_height: 512,
            icc_profile_path: PathBuf::from("./srgb.icc"),
            workers: 0,
            pattern: None,
            recursive: false,
        }
    }
}

impl ResizeConfig {
    /// Create a builder for fluent construction with validation at build time
    #[must_use]
    pub fn builder() -> ResizeConfigBuilder {
        ResizeConfigBuilder::new()
    }

    /// Worker count with `0` resolved to the available hardware parallelism
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            std::thread::available_parallelism()
                .map(std::num::NonZero::get)
                .unwrap_or(1)
        } else {
            self.workers
        }
    }

    /// Path of the failure list written after the run
    #[must_use]
    pub fn failure_list_path(&self) -> PathBuf {
        self.output_dir.join("non_resizable_images.txt")
    }
}

/// Builder for [`ResizeConfig`]
#[derive(Debug, Default)]
pub struct ResizeConfigBuilder {
    config: ResizeConfig,
}

impl ResizeConfigBuilder {
    /// Create a new builder with default values
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: ResizeConfig::default(),
        }
    }

    /// Set the input directory
    #[must_use]
    pub fn input_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.input_dir = dir.into();
        self
    }

    /// Set the output directory
    #[must_use]
    pub fn output_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    /// Set the target dimensions
    #[must_use]
    pub fn target_size(mut self, width: u32, height: u32) -> Self {
        self.config.target_width = width;
        self.config.target_height = height;
        self
    }

    /// Set the sidecar ICC profile path
    #[must_use]
    pub fn icc_profile_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.icc_profile_path = path.into();
        self
    }

    /// Set the worker count (0 = auto-detect)
    #[must_use]
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set a filename glob, e.g. `*.jpg`
    #[must_use]
    pub fn pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.config.pattern = Some(pattern.into());
        self
    }

    /// Enable or disable recursive input enumeration
    #[must_use]
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.config.recursive = recursive;
        self
    }

    /// Validate and build the configuration
    ///
    /// # Errors
    /// - Zero target width or height
    /// - Invalid glob pattern
    pub fn build(self) -> Result<ResizeConfig> {
        if self.config.target_width == 0 || self.config.target_height == 0 {
            return Err(PrepError::invalid_config(format!(
                "target size must be at least 1x1, got {}x{}",
                self.config.target_width, self.config.target_height
            )));
        }
        if let Some(pattern) = &self.config.pattern {
            glob::Pattern::new(pattern).map_err(|e| {
                PrepError::invalid_config(format!("invalid filename pattern '{pattern}': {e}"))
            })?;
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_download_defaults() {
        let config = DownloadConfig::default();
        assert_eq!(config.max_train_samples, 170_000_000);
        assert_eq!(config.num_proc, 237);
        assert_eq!(config.language, "en");
        assert!((config.similarity_threshold - 0.3).abs() < f64::EPSILON);
        assert_eq!(config.images_dir(), Path::new("./train_data/images"));
    }

    #[test]
    fn test_download_builder_validation() {
        assert!(DownloadConfig::builder().build().is_err()); // empty metadata

        let err = DownloadConfig::builder()
            .metadata("meta.jsonl")
            .num_proc(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("num_proc"));

        assert!(DownloadConfig::builder()
            .metadata("meta.jsonl")
            .max_train_samples(0)
            .build()
            .is_err());

        assert!(DownloadConfig::builder()
            .metadata("meta.jsonl")
            .similarity_threshold(f64::NAN)
            .build()
            .is_err());

        let config = DownloadConfig::builder()
            .metadata("meta.jsonl")
            .train_data_dir("/data/out")
            .max_train_samples(1000)
            .num_proc(8)
            .build()
            .unwrap();
        assert_eq!(config.images_dir(), Path::new("/data/out/images"));
    }

    #[test]
    fn test_resize_builder_validation() {
        assert!(ResizeConfig::builder().target_size(0, 512).build().is_err());
        assert!(ResizeConfig::builder().pattern("[").build().is_err());

        let config = ResizeConfig::builder()
            .input_dir("/in")
            .output_dir("/out")
            .target_size(256, 128)
            .workers(4)
            .pattern("*.jpg")
            .build()
            .unwrap();
        assert_eq!(config.target_width, 256);
        assert_eq!(config.target_height, 128);
        assert_eq!(config.effective_workers(), 4);
        assert_eq!(
            config.failure_list_path(),
            Path::new("/out/non_resizable_images.txt")
        );
    }

    #[test]
    fn test_effective_workers_auto_detect() {
        let config = ResizeConfig::default();
        assert!(config.effective_workers() >= 1);
    }
}
