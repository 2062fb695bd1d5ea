//! RDR Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the RDR import tools.
//!
//! - **Error Handling**: [`RdrError`] and the [`Result`] alias
//! - **Checksums**: streaming digests used to gate file attachments
//! - **Logging**: `tracing` subscriber setup shared by every binary
//!
//! # Example
//!
//! ```no_run
//! use rdr_common::checksum::compute_file_checksum;
//! use rdr_common::types::ChecksumAlgorithm;
//!
//! fn digest(path: &str) -> rdr_common::Result<String> {
//!     compute_file_checksum(path, ChecksumAlgorithm::Sha256)
//! }
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{RdrError, Result};
