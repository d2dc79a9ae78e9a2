//! Failure list accumulation and serialization
//!
//! Collects the stems of files whose processing raised an error and writes
//! them once at the end of a run as a single-column text file with a fixed
//! header, for post-run inspection by the operator.

use crate::error::{PrepError, Result};
use std::path::Path;

/// Header line of the serialized failure list
pub const FAILURE_LIST_HEADER: &str = "image_names";

/// In-memory list of failed item identifiers
#[derive(Debug, Default, Clone)]
pub struct FailureList {
    entries: Vec<String>,
}

impl FailureList {
    /// Create an empty list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed item by its identifier (file stem)
    pub fn record<S: Into<String>>(&mut self, identifier: S) {
        self.entries.push(identifier.into());
    }

    /// Number of recorded failures
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether any failure was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Recorded identifiers in insertion order
    #[must_use]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Write the list as UTF-8 text: the `image_names` header followed by one
    /// identifier per line, newline-terminated
    ///
    /// Worker completion order is nondeterministic, so entries are sorted for
    /// stable output across runs.
    ///
    /// # Errors
    /// - Parent directory cannot be created
    /// - File write fails
    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        if let Some(parent) = path_ref.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                PrepError::file_io_error("create failure list directory", parent, &e)
            })?;
        }

        let mut sorted = self.entries.clone();
        sorted.sort();

        let mut content = String::with_capacity(
            FAILURE_LIST_HEADER.len() + 1 + sorted.iter().map(|s| s.len() + 1).sum::<usize>(),
        );
        content.push_str(FAILURE_LIST_HEADER);
        content.push('\n');
        for entry in &sorted {
            content.push_str(entry);
            content.push('\n');
        }

        std::fs::write(path_ref, content)
            .map_err(|e| PrepError::file_io_error("write failure list", path_ref, &e))
    }
}
