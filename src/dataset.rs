//! Dataset metadata: typed rows, the row filter, and a streaming JSONL reader
//!
//! Rows are deserialized into a statically typed record at load time. A row
//! missing a required field or carrying a mismatched type fails the run with
//! an error naming the file and line; only fetch-time failures are tolerated
//! per item.

use crate::config::{DEFAULT_LANGUAGE, DEFAULT_SIMILARITY_THRESHOLD};
use crate::error::{PrepError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

/// One metadata row of the image dataset
///
/// Field names follow the upstream column naming (`URL`, `TEXT`, `LANGUAGE`,
/// `similarity`); unknown columns are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRow {
    /// Source image URL
    #[serde(rename = "URL")]
    pub url: String,

    /// Caption text; also the output file name
    #[serde(rename = "TEXT")]
    pub text: String,

    /// Language code of the caption
    #[serde(rename = "LANGUAGE")]
    pub language: String,

    /// Caption/image similarity score, absent for some rows
    #[serde(rename = "similarity")]
    pub similarity: Option<f64>,
}

/// Predicate deciding which rows enter the download stage
#[derive(Debug, Clone, PartialEq)]
pub struct RowFilter {
    /// Language code a row must carry
    pub language: String,
    /// Rows must score strictly above this value
    pub similarity_threshold: f64,
}

impl Default for RowFilter {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl RowFilter {
    /// True iff the row's language matches and its similarity is present and
    /// strictly greater than the threshold
    #[must_use]
    pub fn keeps(&self, row: &DatasetRow) -> bool {
        if row.language != self.language {
            return false;
        }
        match row.similarity {
            Some(similarity) => similarity > self.similarity_threshold,
            None => false,
        }
    }
}

/// Where dataset metadata comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataSource {
    /// `http(s)` URL, fetched into the metadata cache before reading
    Remote(String),
    /// Local `.jsonl` file or directory of `.jsonl` files
    Local(PathBuf),
}

impl MetadataSource {
    /// Classify a CLI metadata argument as remote or local
    #[must_use]
    pub fn parse(source: &str) -> Self {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::Remote(source.to_string())
        } else {
            Self::Local(PathBuf::from(source))
        }
    }
}

/// Expand a local metadata path into the list of `.jsonl` files to read
///
/// A file path yields itself; a directory yields its `.jsonl` entries in
/// lexicographic order so row numbering is stable across runs.
///
/// # Errors
/// - Path does not exist
/// - Directory contains no `.jsonl` files
pub fn expand_local_source(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if path.is_dir() {
        let mut files = Vec::new();
        let entries = std::fs::read_dir(path)
            .map_err(|e| PrepError::file_io_error("read metadata directory", path, &e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| PrepError::file_io_error("read metadata directory", path, &e))?;
            let entry_path = entry.path();
            let is_jsonl = entry_path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"));
            if entry_path.is_file() && is_jsonl {
                files.push(entry_path);
            }
        }
        if files.is_empty() {
            return Err(PrepError::invalid_config(format!(
                "no .jsonl metadata files found in {}",
                path.display()
            )));
        }
        files.sort();
        return Ok(files);
    }
    Err(PrepError::invalid_config(format!(
        "metadata path does not exist: {}",
        path.display()
    )))
}

/// Streaming iterator over the first `cap` rows of a set of JSONL files
///
/// Rows are yielded in file order without loading any file fully into memory.
/// Blank lines are skipped and do not count toward the cap. I/O and parse
/// errors are yielded once, then the iterator stops.
pub struct JsonlRows {
    pending: std::vec::IntoIter<PathBuf>,
    current: Option<CurrentFile>,
    remaining: usize,
    poisoned: bool,
}

struct CurrentFile {
    path: PathBuf,
    line_number: usize,
    lines: Lines<BufReader<File>>,
}

impl JsonlRows {
    /// Create a reader over `files`, yielding at most `cap` rows
    #[must_use]
    pub fn new(files: Vec<PathBuf>, cap: usize) -> Self {
        Self {
            pending: files.into_iter(),
            current: None,
            remaining: cap,
            poisoned: false,
        }
    }

    fn advance_file(&mut self) -> Result<bool> {
        match self.pending.next() {
            Some(path) => {
                let file = File::open(&path)
                    .map_err(|e| PrepError::file_io_error("open metadata file", &path, &e))?;
                tracing::debug!("Reading metadata from {}", path.display());
                self.current = Some(CurrentFile {
                    path,
                    line_number: 0,
                    lines: BufReader::new(file).lines(),
                });
                Ok(true)
            },
            None => Ok(false),
        }
    }
}

impl Iterator for JsonlRows {
    type Item = Result<DatasetRow>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.poisoned || self.remaining == 0 {
            return None;
        }
        loop {
            if self.current.is_none() {
                match self.advance_file() {
                    Ok(true) => {},
                    Ok(false) => return None,
                    Err(e) => {
                        self.poisoned = true;
                        return Some(Err(e));
                    },
                }
            }
            // Invariant: current is Some here
            let Some(current) = self.current.as_mut() else {
                return None;
            };
            match current.lines.next() {
                None => {
                    self.current = None;
                },
                Some(Err(e)) => {
                    self.poisoned = true;
                    let err =
                        PrepError::file_io_error("read metadata line", &current.path, &e);
                    return Some(Err(err));
                },
                Some(Ok(line)) => {
                    current.line_number += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<DatasetRow>(&line) {
                        Ok(row) => {
                            self.remaining -= 1;
                            return Some(Ok(row));
                        },
                        Err(e) => {
                            self.poisoned = true;
                            return Some(Err(PrepError::dataset(format!(
                                "invalid metadata row at {}:{}: {}",
                                current.path.display(),
                                current.line_number,
                                e
                            ))));
                        },
                    }
                },
            }
        }
    }
}
