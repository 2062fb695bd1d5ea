//! Error types for the importer
//!
//! Every fatal error names the stage that failed and, once rows are being
//! processed, the manifest line of the offending row.

use rdr_common::RdrError;
use std::path::PathBuf;
use thiserror::Error;

use crate::store::StoreError;

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;

/// Broad classification used by callers to pick an exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad job setup: no usable model, unreadable inputs, malformed header
    Configuration,
    /// A data row does not fit the manifest header
    RowFormat,
    /// A row was well formed but its object could not be built or persisted
    Construction,
    /// The run was stopped between rows
    Cancelled,
}

impl ErrorKind {
    /// Process exit status for this kind of failure
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Configuration => 2,
            ErrorKind::RowFormat | ErrorKind::Construction => 1,
            ErrorKind::Cancelled => 130,
        }
    }
}

/// Fatal errors that end an import run
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Invalid import job: {0}")]
    InvalidJob(String),

    #[error("Checksum file '{}' could not be loaded: {reason}", .path.display())]
    ChecksumSource { path: PathBuf, reason: String },

    #[error("Manifest '{}' could not be opened: {source}", .path.display())]
    ManifestOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Manifest format error{}: {reason}", at_line(.line))]
    ManifestFormat { line: Option<u64>, reason: String },

    #[error("No model was specified{}. Pass a job-level model or add a 'type' column.", at_line(.line))]
    MissingModel { line: Option<u64> },

    #[error("Unrecognized model '{name}'{}", at_line(.line))]
    UnknownModel { line: Option<u64>, name: String },

    #[error("Failed to import {model} '{identifier}' at line {line}: {source}")]
    Construction {
        line: u64,
        model: String,
        identifier: String,
        #[source]
        source: ConstructionError,
    },

    #[error("Import cancelled after {imported} object(s)")]
    Cancelled { imported: usize },
}

impl ImportError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ImportError::ManifestFormat { line: Some(_), .. } => ErrorKind::RowFormat,
            ImportError::Construction { .. } => ErrorKind::Construction,
            ImportError::Cancelled { .. } => ErrorKind::Cancelled,
            ImportError::InvalidSettings(_)
            | ImportError::InvalidJob(_)
            | ImportError::ChecksumSource { .. }
            | ImportError::ManifestOpen { .. }
            | ImportError::ManifestFormat { line: None, .. }
            | ImportError::MissingModel { .. }
            | ImportError::UnknownModel { .. } => ErrorKind::Configuration,
        }
    }

    /// Manifest line the error refers to, if it is tied to a row
    pub fn line(&self) -> Option<u64> {
        match self {
            ImportError::ManifestFormat { line, .. }
            | ImportError::MissingModel { line }
            | ImportError::UnknownModel { line, .. } => *line,
            ImportError::Construction { line, .. } => Some(*line),
            _ => None,
        }
    }
}

fn at_line(line: &Option<u64>) -> String {
    match line {
        Some(line) => format!(" at line {}", line),
        None => String::new(),
    }
}

/// Failures raised by a construction strategy while building one object
#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("required field '{field}' is missing")]
    MissingRequired { field: String },

    #[error("unknown attribute '{field}'")]
    UnknownAttribute { field: String },

    #[error("invalid value '{value}' for '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{model} objects cannot carry files")]
    FilesNotAllowed { model: String },

    #[error("invalid file reference '{file}': {reason}")]
    InvalidFilePath { file: String, reason: String },

    #[error("file '{file}' not found at '{}'", .path.display())]
    FileNotFound { file: String, path: PathBuf },

    #[error("checksum mismatch for '{file}': expected {expected}, computed {actual}")]
    ChecksumMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    #[error("no checksum listed for '{file}' and checksums are required")]
    MissingChecksum { file: String },

    #[error("could not read '{file}': {source}")]
    FileRead {
        file: String,
        #[source]
        source: RdrError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
