//! Local cache for remotely hosted dataset metadata
//!
//! Fetched metadata files live in an XDG-compliant directory and are verified
//! against a SHA-256 sidecar before being reused, so an interrupted download
//! is never mistaken for a complete one.

use crate::error::{PrepError, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Extension of the checksum sidecar written next to each cached file
const CHECKSUM_EXT: &str = "sha256";

/// Metadata cache manager
#[derive(Debug)]
pub struct MetadataCache {
    cache_dir: PathBuf,
}

impl MetadataCache {
    /// Create a cache manager rooted at the default cache directory
    ///
    /// Resolution order: `TRAINSET_PREP_CACHE_DIR` environment variable, then
    /// the XDG cache directory (`~/.cache/trainset-prep/metadata/` on Linux).
    ///
    /// # Errors
    /// - Failed to determine the cache directory
    /// - Failed to create the cache directory
    pub fn new() -> Result<Self> {
        Self::with_cache_dir(Self::default_cache_dir()?)
    }

    /// Create a cache manager rooted at a custom directory
    ///
    /// # Errors
    /// - Failed to create the cache directory
    pub fn with_cache_dir<P: Into<PathBuf>>(dir: P) -> Result<Self> {
        let cache_dir = dir.into();
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir).map_err(|e| {
                PrepError::file_io_error("create cache directory", &cache_dir, &e)
            })?;
        }
        Ok(Self { cache_dir })
    }

    fn default_cache_dir() -> Result<PathBuf> {
        if let Ok(cache_override) = std::env::var("TRAINSET_PREP_CACHE_DIR") {
            return Ok(PathBuf::from(cache_override).join("metadata"));
        }
        Ok(dirs::cache_dir()
            .ok_or_else(|| {
                PrepError::invalid_config(
                    "Failed to determine cache directory. Set TRAINSET_PREP_CACHE_DIR environment variable.",
                )
            })?
            .join("trainset-prep")
            .join("metadata"))
    }

    /// The directory this cache stores files in
    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Derive a filesystem-safe cache file name from a URL
    ///
    /// The name keeps the URL's final path segment for readability and
    /// prefixes a short content hash of the full URL so distinct URLs with
    /// the same basename never collide.
    #[must_use]
    pub fn url_to_file_id(url: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(url.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        let short_hash = digest.get(..12).unwrap_or(&digest);

        let basename = url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty() && !segment.contains(':'))
            .map(|segment| {
                segment
                    .chars()
                    .map(|c| {
                        if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                            c
                        } else {
                            '-'
                        }
                    })
                    .collect::<String>()
            })
            .unwrap_or_else(|| "metadata.jsonl".to_string());

        format!("{short_hash}-{basename}")
    }

    /// Path a URL's cached copy would live at
    #[must_use]
    pub fn path_for_url(&self, url: &str) -> PathBuf {
        self.cache_dir.join(Self::url_to_file_id(url))
    }

    /// Whether a URL is cached with an intact checksum
    #[must_use]
    pub fn is_cached(&self, url: &str) -> bool {
        let path = self.path_for_url(url);
        path.is_file() && self.verify_checksum(&path).unwrap_or(false)
    }

    /// Record the checksum sidecar for a freshly cached file
    ///
    /// # Errors
    /// - Failed to read the cached file or write the sidecar
    pub fn write_checksum(&self, path: &Path) -> Result<()> {
        let digest = Self::file_sha256(path)?;
        let sidecar = Self::checksum_path(path);
        fs::write(&sidecar, &digest)
            .map_err(|e| PrepError::file_io_error("write checksum sidecar", &sidecar, &e))
    }

    /// Compare a cached file against its checksum sidecar
    ///
    /// Returns `Ok(false)` when the sidecar is missing or does not match.
    ///
    /// # Errors
    /// - Failed to read the cached file
    pub fn verify_checksum(&self, path: &Path) -> Result<bool> {
        let sidecar = Self::checksum_path(path);
        let Ok(expected) = fs::read_to_string(&sidecar) else {
            return Ok(false);
        };
        let actual = Self::file_sha256(path)?;
        Ok(expected.trim() == actual)
    }

    fn checksum_path(path: &Path) -> PathBuf {
        let mut os_string = path.as_os_str().to_os_string();
        os_string.push(".");
        os_string.push(CHECKSUM_EXT);
        PathBuf::from(os_string)
    }

    fn file_sha256(path: &Path) -> Result<String> {
        let file = fs::File::open(path)
            .map_err(|e| PrepError::file_io_error("open cached file", path, &e))?;
        let mut reader = std::io::BufReader::new(file);
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; 64 * 1024];
        loop {
            let read = reader
                .read(&mut buffer)
                .map_err(|e| PrepError::file_io_error("hash cached file", path, &e))?;
            if read == 0 {
                break;
            }
            hasher.update(buffer.get(..read).unwrap_or(&buffer));
        }
        Ok(format!("{:x}", hasher.finalize()))
    }
}
