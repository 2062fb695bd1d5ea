//! Resolving, digesting and verifying the files a row references

use rdr_common::checksum::{compute_file_checksum, digests_match};
use rdr_common::types::ChecksumAlgorithm;
use rdr_common::RdrError;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

use super::fields::split_values;
use super::FactoryContext;
use crate::attributes::Attributes;
use crate::error::ConstructionError;
use crate::model::AttachedFile;

/// Column listing the files to attach, `|`-separated
pub const FILE_COLUMN: &str = "file";

/// File names listed in the row's `file` column
pub fn listed_files(attributes: &Attributes) -> Vec<String> {
    attributes
        .get(FILE_COLUMN)
        .map(|value| split_values(value))
        .unwrap_or_default()
}

/// Attach every file listed in the row, stopping at the first failure
pub async fn attach_listed_files(
    attributes: &Attributes,
    ctx: &FactoryContext,
) -> Result<Vec<AttachedFile>, ConstructionError> {
    let mut attached = Vec::new();
    for name in listed_files(attributes) {
        attached.push(attach_file(&name, ctx).await?);
    }
    Ok(attached)
}

/// Resolve a manifest file name inside `dir`
///
/// Only plain relative paths are accepted; anything that could step outside
/// the files directory is rejected.
pub fn resolve_in(dir: &Path, name: &str) -> Result<PathBuf, ConstructionError> {
    let invalid = |reason: &str| ConstructionError::InvalidFilePath {
        file: name.to_string(),
        reason: reason.to_string(),
    };

    let relative = Path::new(name);
    let mut resolved = dir.to_path_buf();
    let mut parts = 0;
    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                parts += 1;
            },
            Component::CurDir => {},
            Component::ParentDir => return Err(invalid("parent directory references are not allowed")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(invalid("absolute paths are not allowed"))
            },
        }
    }

    if parts == 0 {
        return Err(invalid("no file name"));
    }
    Ok(resolved)
}

/// Digest one file and check it against the checksum table
pub async fn attach_file(
    name: &str,
    ctx: &FactoryContext,
) -> Result<AttachedFile, ConstructionError> {
    let path = resolve_in(ctx.files_directory(), name)?;
    let size = match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => meta.len(),
        _ => {
            return Err(ConstructionError::FileNotFound {
                file: name.to_string(),
                path,
            })
        },
    };

    let expected = ctx.checksums().and_then(|table| table.lookup(name));
    if expected.is_none() && ctx.settings().require_checksums {
        return Err(ConstructionError::MissingChecksum {
            file: name.to_string(),
        });
    }

    let algorithm: ChecksumAlgorithm = expected.map(|e| e.algorithm).unwrap_or_default();
    let digest = digest_file(path.clone(), algorithm)
        .await
        .map_err(|source| ConstructionError::FileRead {
            file: name.to_string(),
            source,
        })?;

    let verified = match expected {
        Some(expected) if digests_match(&expected.digest, &digest) => {
            debug!(file = name, algorithm = %algorithm, "Checksum verified");
            true
        },
        Some(expected) => {
            return Err(ConstructionError::ChecksumMismatch {
                file: name.to_string(),
                expected: expected.digest.clone(),
                actual: digest,
            })
        },
        None => {
            if ctx.checksums().is_some() {
                warn!(file = name, "No checksum listed, attaching unverified");
            }
            false
        },
    };

    Ok(AttachedFile {
        name: name.to_string(),
        source: path,
        size,
        algorithm,
        digest,
        verified,
    })
}

/// Digest a file on the blocking pool
async fn digest_file(path: PathBuf, algorithm: ChecksumAlgorithm) -> rdr_common::Result<String> {
    tokio::task::spawn_blocking(move || compute_file_checksum(&path, algorithm))
        .await
        .map_err(|e| RdrError::Io(std::io::Error::other(e)))?
}
