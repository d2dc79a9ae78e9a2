//! Sidecar ICC color profile handling
//!
//! Every resized PNG declares the same color space regardless of source
//! metadata; the profile bytes come from a sidecar file (typically
//! `srgb.icc`) loaded once at startup. A missing or empty profile file is a
//! fatal startup error, not a per-item failure.

use crate::error::{PrepError, Result};
use std::path::{Path, PathBuf};

/// Offset of the `acsp` signature in an ICC profile header
const ICC_SIGNATURE_OFFSET: usize = 36;

/// An ICC color profile loaded from a sidecar file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorProfile {
    path: PathBuf,
    data: Vec<u8>,
}

impl ColorProfile {
    /// Load a profile from a sidecar file
    ///
    /// The file is read fully into memory. A malformed header (missing the
    /// `acsp` signature) is logged but tolerated; only an unreadable or empty
    /// file is an error.
    ///
    /// # Errors
    /// - File unreadable
    /// - File empty
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = std::fs::read(path_ref)
            .map_err(|e| PrepError::file_io_error("read ICC profile", path_ref, &e))?;

        if data.is_empty() {
            return Err(PrepError::invalid_config(format!(
                "ICC profile file is empty: {}",
                path_ref.display()
            )));
        }

        let has_signature = data
            .get(ICC_SIGNATURE_OFFSET..ICC_SIGNATURE_OFFSET + 4)
            .is_some_and(|sig| sig == b"acsp");
        if !has_signature {
            log::warn!(
                "{} does not carry an ICC 'acsp' signature; embedding its bytes anyway",
                path_ref.display()
            );
        }

        log::debug!(
            "Loaded ICC profile from {} ({} bytes)",
            path_ref.display(),
            data.len()
        );

        Ok(Self {
            path: path_ref.to_path_buf(),
            data,
        })
    }

    /// Raw profile bytes, embedded verbatim into output PNGs
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Profile size in bytes
    #[must_use]
    pub fn data_size(&self) -> usize {
        self.data.len()
    }

    /// Path the profile was loaded from
    #[must_use]
    pub fn source_path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal profile with a valid `acsp` signature at offset 36
    pub(crate) fn fake_srgb_profile() -> Vec<u8> {
        let mut profile = vec![0u8; 128];
        profile.splice(36..40, *b"acsp");
        profile.extend_from_slice(b"sRGB IEC61966-2.1");
        profile
    }

    #[test]
    fn test_load_roundtrips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("srgb.icc");
        let bytes = fake_srgb_profile();
        std::fs::write(&path, &bytes).unwrap();

        let profile = ColorProfile::load(&path).unwrap();
        assert_eq!(profile.data(), bytes.as_slice());
        assert_eq!(profile.data_size(), bytes.len());
        assert_eq!(profile.source_path(), path.as_path());
    }

    #[test]
    fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ColorProfile::load(dir.path().join("missing.icc")).unwrap_err();
        assert!(err.to_string().contains("missing.icc"));
    }

    #[test]
    fn test_load_empty_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.icc");
        std::fs::write(&path, b"").unwrap();
        assert!(ColorProfile::load(&path).is_err());
    }

    #[test]
    fn test_load_tolerates_unsigned_profile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("odd.icc");
        std::fs::write(&path, b"not really a profile").unwrap();
        let profile = ColorProfile::load(&path).unwrap();
        assert_eq!(profile.data(), b"not really a profile");
    }
}
