//! HTTP fetching for dataset metadata and images
//!
//! Two clients with different timeout budgets: metadata files are large and
//! get a generous streaming download with progress reporting and atomic
//! placement into the cache; image fetches are small, bounded by a fixed
//! 20-second timeout, and decoded straight from memory.

use crate::cache::MetadataCache;
use crate::error::{PrepError, Result};
use futures_util::stream::TryStreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::io::StreamReader;

/// Fixed per-image fetch timeout
pub const IMAGE_FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(20);

/// Timeout for metadata file downloads
const METADATA_FETCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(300);

/// Downloads metadata files into the local cache
#[derive(Debug)]
pub struct MetadataFetcher {
    client: Client,
    cache: MetadataCache,
}

impl MetadataFetcher {
    /// Create a fetcher writing into `cache`
    ///
    /// # Errors
    /// - Failed to create the HTTP client
    pub fn new(cache: MetadataCache) -> Result<Self> {
        let client = Client::builder()
            .timeout(METADATA_FETCH_TIMEOUT)
            .build()
            .map_err(|e| PrepError::network_error("Failed to create HTTP client", e))?;
        Ok(Self { client, cache })
    }

    /// The cache this fetcher stores files in
    #[must_use]
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Fetch a metadata URL into the cache, returning the local path
    ///
    /// A cached copy with an intact checksum is reused without network
    /// traffic. Downloads stream to a temporary file and are renamed into the
    /// cache only after completing, with a checksum sidecar recorded for
    /// later verification.
    ///
    /// # Errors
    /// - Network failure or non-success HTTP status
    /// - File system errors while staging or caching
    pub async fn fetch(&self, url: &str, show_progress: bool) -> Result<PathBuf> {
        let final_path = self.cache.path_for_url(url);
        if self.cache.is_cached(url) {
            log::info!("Metadata already cached: {}", final_path.display());
            return Ok(final_path);
        }

        log::info!("Downloading metadata from: {url}");
        let temp_path = std::env::temp_dir().join(format!(
            "trainset-prep-{}",
            MetadataCache::url_to_file_id(url)
        ));
        if temp_path.exists() {
            fs::remove_file(&temp_path).map_err(|e| {
                PrepError::file_io_error("remove stale temp file", &temp_path, &e)
            })?;
        }

        match self.download_to(url, &temp_path, show_progress).await {
            Ok(()) => {
                fs::rename(&temp_path, &final_path).map_err(|e| {
                    PrepError::file_io_error("move metadata into cache", &final_path, &e)
                })?;
                self.cache.write_checksum(&final_path)?;
                log::info!("Cached metadata at: {}", final_path.display());
                Ok(final_path)
            },
            Err(e) => {
                if temp_path.exists() {
                    if let Err(cleanup_err) = fs::remove_file(&temp_path) {
                        log::warn!("Failed to clean up temp file: {cleanup_err}");
                    }
                }
                Err(e)
            },
        }
    }

    async fn download_to(&self, url: &str, local_path: &Path, show_progress: bool) -> Result<()> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PrepError::network_error(format!("Failed to download {url}"), e))?;

        if !response.status().is_success() {
            return Err(PrepError::network_error(
                format!("HTTP error {} for {url}", response.status()),
                std::io::Error::new(std::io::ErrorKind::Other, "HTTP error"),
            ));
        }

        let total_size = response.content_length();
        let progress = show_progress.then(|| Self::progress_bar(total_size));

        let mut file = tokio::fs::File::create(local_path)
            .await
            .map_err(|e| PrepError::file_io_error("create temp file", local_path, &e))?;

        let mut stream = StreamReader::new(
            response
                .bytes_stream()
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e)),
        );

        let mut downloaded = 0u64;
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let bytes_read = tokio::io::AsyncReadExt::read(&mut stream, &mut buffer)
                .await
                .map_err(|e| PrepError::network_error("Failed to read download stream", e))?;
            if bytes_read == 0 {
                break;
            }
            file.write_all(buffer.get(..bytes_read).unwrap_or(&buffer))
                .await
                .map_err(|e| PrepError::file_io_error("write temp file", local_path, &e))?;
            downloaded += bytes_read as u64;
            if let Some(pb) = &progress {
                pb.set_position(downloaded);
            }
        }

        file.flush()
            .await
            .map_err(|e| PrepError::file_io_error("flush temp file", local_path, &e))?;

        if let Some(pb) = progress {
            pb.finish_with_message("metadata downloaded");
        }
        Ok(())
    }

    fn progress_bar(total_size: Option<u64>) -> ProgressBar {
        let pb = total_size.map_or_else(ProgressBar::new_spinner, ProgressBar::new);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    }
}

/// Fetches and decodes images referenced by dataset rows
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    client: Client,
}

impl ImageFetcher {
    /// Create a fetcher with the fixed per-image timeout
    ///
    /// # Errors
    /// - Failed to create the HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(IMAGE_FETCH_TIMEOUT)
            .build()
            .map_err(|e| PrepError::network_error("Failed to create HTTP client", e))?;
        Ok(Self { client })
    }

    /// Fetch a URL and decode the body as an image
    ///
    /// # Errors
    /// - Network failure, timeout, or non-success HTTP status
    /// - Body is not a decodable image
    pub async fn fetch_image(&self, url: &str) -> Result<image::DynamicImage> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| PrepError::network_error(format!("Failed to fetch {url}"), e))?;

        if !response.status().is_success() {
            return Err(PrepError::network_error(
                format!("HTTP error {} for {url}", response.status()),
                std::io::Error::new(std::io::ErrorKind::Other, "HTTP error"),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| PrepError::network_error(format!("Failed to read body of {url}"), e))?;

        image::load_from_memory(&body)
            .map_err(|e| PrepError::processing(format!("Failed to decode image from {url}: {e}")))
    }
}
