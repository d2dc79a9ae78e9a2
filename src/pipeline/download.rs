//! Dataset download pipeline
//!
//! Streams metadata rows, filters them, and fetches the surviving rows'
//! images concurrently. Every row is processed independently: a fetch,
//! decode, or save failure is logged with the offending URL and the batch
//! proceeds. Metadata errors are fatal and stop the run.

use crate::cache::MetadataCache;
use crate::config::DownloadConfig;
use crate::dataset::{expand_local_source, DatasetRow, JsonlRows, MetadataSource, RowFilter};
use crate::error::{PrepError, Result};
use crate::fetch::{ImageFetcher, MetadataFetcher};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info};

/// Outcome counters of a download run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Rows read from the metadata source (capped by `max_train_samples`)
    pub rows_seen: u64,
    /// Rows kept by the filter and submitted for fetching
    pub rows_kept: u64,
    /// Images fetched, decoded, and saved
    pub images_saved: u64,
    /// Rows whose fetch or save failed
    pub failures: u64,
    /// Directory the images were written to
    pub images_dir: PathBuf,
}

enum RowOutcome {
    Filtered,
    Saved,
    Failed,
}

/// The download pipeline
#[derive(Debug)]
pub struct DownloadPipeline {
    config: DownloadConfig,
}

impl DownloadPipeline {
    /// Create a pipeline for the given configuration
    #[must_use]
    pub fn new(config: DownloadConfig) -> Self {
        Self { config }
    }

    /// The pipeline's configuration
    #[must_use]
    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    /// Run the pipeline to completion
    ///
    /// # Errors
    /// - Metadata source cannot be resolved, fetched, or parsed
    /// - Output directory cannot be created
    pub async fn run(&self) -> Result<DownloadSummary> {
        let start_time = Instant::now();
        let images_dir = self.config.images_dir();
        std::fs::create_dir_all(&images_dir)
            .map_err(|e| PrepError::file_io_error("create images directory", &images_dir, &e))?;

        let metadata_files = self.resolve_metadata().await?;
        let rows = JsonlRows::new(metadata_files, self.config.max_train_samples);

        let filter = RowFilter {
            language: self.config.language.clone(),
            similarity_threshold: self.config.similarity_threshold,
        };
        let fetcher = ImageFetcher::new()?;

        info!(
            "Downloading up to {} rows with {} concurrent fetches",
            self.config.max_train_samples, self.config.num_proc
        );

        let progress = ProgressBar::new_spinner();
        progress.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {pos} rows {msg}")
                .unwrap(),
        );
        progress.enable_steady_tick(std::time::Duration::from_millis(100));

        let mut rows_seen = 0u64;
        let mut rows_kept = 0u64;
        let mut images_saved = 0u64;
        let mut failures = 0u64;

        let mut tasks = stream::iter(rows)
            .map(|row_result| {
                let fetcher = fetcher.clone();
                let filter = filter.clone();
                let images_dir = images_dir.clone();
                async move {
                    let row = row_result?;
                    if !filter.keeps(&row) {
                        return Ok::<RowOutcome, PrepError>(RowOutcome::Filtered);
                    }
                    match Self::fetch_and_save(&fetcher, &images_dir, &row).await {
                        Ok(()) => {
                            debug!("Saved image for \"{}\"", row.text);
                            Ok(RowOutcome::Saved)
                        },
                        Err(e) => {
                            error!("Failed to process image {}: {e}", row.url);
                            Ok(RowOutcome::Failed)
                        },
                    }
                }
            })
            .buffer_unordered(self.config.num_proc);

        while let Some(outcome) = tasks.next().await {
            rows_seen += 1;
            match outcome? {
                RowOutcome::Filtered => {},
                RowOutcome::Saved => {
                    rows_kept += 1;
                    images_saved += 1;
                },
                RowOutcome::Failed => {
                    rows_kept += 1;
                    failures += 1;
                },
            }
            progress.inc(1);
            progress.set_message(format!("({images_saved} saved, {failures} failed)"));
        }
        drop(tasks);

        progress.finish_and_clear();

        let elapsed = start_time.elapsed();
        info!("📊 Download summary:");
        info!("  ├─ Rows read: {rows_seen}");
        info!("  ├─ Rows kept by filter: {rows_kept}");
        info!("  ├─ Images saved: {images_saved}");
        info!("  ├─ Failures: {failures}");
        info!("  └─ Total time: {:.2}s", elapsed.as_secs_f64());

        Ok(DownloadSummary {
            rows_seen,
            rows_kept,
            images_saved,
            failures,
            images_dir,
        })
    }

    /// Resolve the metadata source into a list of local files to read
    async fn resolve_metadata(&self) -> Result<Vec<PathBuf>> {
        match MetadataSource::parse(&self.config.metadata) {
            MetadataSource::Local(path) => expand_local_source(&path),
            MetadataSource::Remote(url) => {
                let cache = match &self.config.cache_dir {
                    Some(dir) => MetadataCache::with_cache_dir(dir.clone())?,
                    None => MetadataCache::new()?,
                };
                let fetcher = MetadataFetcher::new(cache)?;
                let path = fetcher.fetch(&url, true).await?;
                Ok(vec![path])
            },
        }
    }

    /// Fetch one row's image and save it as `<images_dir>/<text>.png`
    async fn fetch_and_save(
        fetcher: &ImageFetcher,
        images_dir: &Path,
        row: &DatasetRow,
    ) -> Result<()> {
        let image = fetcher.fetch_image(&row.url).await?;
        let output_path = images_dir.join(format!("{}.png", row.text));
        image
            .save_with_format(&output_path, image::ImageFormat::Png)
            .map_err(|e| {
                PrepError::processing(format!(
                    "Failed to save {}: {e}",
                    output_path.display()
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DownloadConfig;
    use std::io::Write;

    fn write_metadata(dir: &Path, rows: &[&str]) -> PathBuf {
        let path = dir.join("meta.jsonl");
        let mut file = std::fs::File::create(&path).unwrap();
        for row in rows {
            writeln!(file, "{row}").unwrap();
        }
        path
    }

    #[tokio::test]
    async fn test_run_creates_images_dir_and_counts_filtered_rows() {
        let dir = tempfile::tempdir().unwrap();
        // Rows that never reach the network: wrong language / low similarity
        let metadata = write_metadata(
            dir.path(),
            &[
                r#"{"URL":"https://invalid.invalid/a.jpg","TEXT":"a","LANGUAGE":"de","similarity":0.9}"#,
                r#"{"URL":"https://invalid.invalid/b.jpg","TEXT":"b","LANGUAGE":"en","similarity":0.1}"#,
                r#"{"URL":"https://invalid.invalid/c.jpg","TEXT":"c","LANGUAGE":"en"}"#,
            ],
        );

        let config = DownloadConfig::builder()
            .metadata(metadata.to_string_lossy())
            .train_data_dir(dir.path().join("train_data"))
            .num_proc(2)
            .build()
            .unwrap();

        let summary = DownloadPipeline::new(config).run().await.unwrap();
        assert_eq!(summary.rows_seen, 3);
        assert_eq!(summary.rows_kept, 0);
        assert_eq!(summary.images_saved, 0);
        assert_eq!(summary.failures, 0);
        assert!(summary.images_dir.is_dir());
    }

    #[tokio::test]
    async fn test_run_counts_unreachable_url_as_failure_and_continues() {
        let dir = tempfile::tempdir().unwrap();
        // Non-routable target: the fetch fails per-item, the run succeeds
        let metadata = write_metadata(
            dir.path(),
            &[
                r#"{"URL":"http://127.0.0.1:1/a.jpg","TEXT":"a cat","LANGUAGE":"en","similarity":0.5}"#,
                r#"{"URL":"https://invalid.invalid/b.jpg","TEXT":"b","LANGUAGE":"en","similarity":0.2}"#,
            ],
        );

        let config = DownloadConfig::builder()
            .metadata(metadata.to_string_lossy())
            .train_data_dir(dir.path().join("train_data"))
            .num_proc(1)
            .build()
            .unwrap();

        let summary = DownloadPipeline::new(config).run().await.unwrap();
        assert_eq!(summary.rows_seen, 2);
        assert_eq!(summary.rows_kept, 1);
        assert_eq!(summary.failures, 1);
        assert_eq!(summary.images_saved, 0);
    }

    #[tokio::test]
    async fn test_run_fails_fast_on_malformed_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let metadata = write_metadata(dir.path(), &[r#"{"TEXT":"no url","LANGUAGE":"en"}"#]);

        let config = DownloadConfig::builder()
            .metadata(metadata.to_string_lossy())
            .train_data_dir(dir.path().join("train_data"))
            .build()
            .unwrap();

        let err = DownloadPipeline::new(config).run().await.unwrap_err();
        assert!(err.to_string().contains("meta.jsonl:1"));
    }

    #[tokio::test]
    async fn test_run_missing_metadata_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = DownloadConfig::builder()
            .metadata(dir.path().join("absent.jsonl").to_string_lossy())
            .train_data_dir(dir.path().join("train_data"))
            .build()
            .unwrap();
        assert!(DownloadPipeline::new(config).run().await.is_err());
    }
}
