//! Expected checksums for attached files
//!
//! The checksum file uses the output format of `sha256sum`, `sha512sum` and
//! `md5sum`:
//!
//! ```text
//! # comments and blank lines are ignored
//! b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9  data.csv
//! 5eb63bbbe01eeed093cb22bb8f5acdc3 *images/plot.png
//! ```
//!
//! The algorithm of each entry is inferred from its digest length.

use rdr_common::types::ChecksumAlgorithm;
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::error::{ImportError, Result};

/// Expected digest for one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedChecksum {
    pub algorithm: ChecksumAlgorithm,
    /// Lowercase hex digest
    pub digest: String,
}

/// Error while reading a checksum listing
#[derive(Error, Debug)]
#[error("line {line}: {reason}")]
pub struct ChecksumParseError {
    pub line: usize,
    pub reason: String,
}

/// File identifier -> expected checksum, loaded once per import run
#[derive(Debug, Clone, Default)]
pub struct ChecksumTable {
    entries: HashMap<String, ExpectedChecksum>,
    /// Final path component -> listed names ending in it
    by_file_name: HashMap<String, Vec<String>>,
}

impl ChecksumTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a checksum file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source_error = |reason: String| ImportError::ChecksumSource {
            path: path.to_path_buf(),
            reason,
        };

        let file = std::fs::File::open(path).map_err(|e| source_error(e.to_string()))?;
        let table = Self::parse(BufReader::new(file)).map_err(|e| source_error(e.to_string()))?;

        info!(path = %path.display(), entries = table.len(), "Loaded checksum table");
        Ok(table)
    }

    /// Parse a checksum listing from any buffered reader
    pub fn parse<R: BufRead>(reader: R) -> std::result::Result<Self, ChecksumParseError> {
        let mut table = Self::new();

        for (index, line) in reader.lines().enumerate() {
            let number = index + 1;
            let line = line.map_err(|e| ChecksumParseError {
                line: number,
                reason: e.to_string(),
            })?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let (digest, name) = line.split_once(char::is_whitespace).ok_or_else(|| {
                ChecksumParseError {
                    line: number,
                    reason: "expected '<digest> <file name>'".to_string(),
                }
            })?;
            let name = name.trim_start();
            let name = name.strip_prefix('*').unwrap_or(name);

            table
                .insert(name, digest)
                .map_err(|reason| ChecksumParseError { line: number, reason })?;
        }

        Ok(table)
    }

    /// Add an entry; identical duplicates are accepted, conflicting ones are not
    pub fn insert(&mut self, name: &str, digest: &str) -> std::result::Result<(), String> {
        let name = normalize_name(name);
        if name.is_empty() {
            return Err("missing file name".to_string());
        }

        let algorithm = ChecksumAlgorithm::detect(digest)
            .ok_or_else(|| format!("'{}' is not an MD5, SHA-256 or SHA-512 hex digest", digest))?;
        let expected = ExpectedChecksum {
            algorithm,
            digest: digest.to_ascii_lowercase(),
        };

        match self.entries.get(name) {
            Some(existing) if *existing == expected => {
                debug!(file = name, "Ignoring duplicate checksum entry");
                Ok(())
            },
            Some(_) => Err(format!("conflicting checksums listed for '{}'", name)),
            None => {
                self.entries.insert(name.to_string(), expected);
                self.by_file_name
                    .entry(file_name(name).to_string())
                    .or_default()
                    .push(name.to_string());
                Ok(())
            },
        }
    }

    /// Find the expected checksum for a file as named in the manifest
    ///
    /// An exact match wins. Otherwise the listing and the manifest may
    /// differ by leading directories, in either direction: `batch1/data.csv`
    /// matches a listing of `data.csv`, and `data.csv` matches a listing of
    /// `files/data.csv`. A name that matches more than one listed file has
    /// no entry.
    pub fn lookup(&self, name: &str) -> Option<&ExpectedChecksum> {
        let name = normalize_name(name);
        if let Some(expected) = self.entries.get(name) {
            return Some(expected);
        }

        let wanted = Path::new(name);
        let candidates = self.by_file_name.get(file_name(name))?;
        let mut matches = candidates.iter().filter(|listed| {
            let listed = Path::new(listed.as_str());
            listed.ends_with(wanted) || wanted.ends_with(listed)
        });

        match (matches.next(), matches.next()) {
            (Some(listed), None) => self.entries.get(listed),
            (Some(_), Some(_)) => {
                debug!(file = name, "Checksum entry is ambiguous, ignoring it");
                None
            },
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn file_name(name: &str) -> &str {
    Path::new(name)
        .file_name()
        .and_then(|base| base.to_str())
        .unwrap_or(name)
}

fn normalize_name(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("./").unwrap_or(name)
}
