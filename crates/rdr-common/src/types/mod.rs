//! Common types used across RDR

use serde::{Deserialize, Serialize};

/// Checksum algorithm type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    #[default]
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    /// Infer the algorithm from the length of a hex digest
    ///
    /// Returns `None` for lengths no supported algorithm produces, or when the
    /// value is not hexadecimal.
    pub fn detect(hex_digest: &str) -> Option<Self> {
        if !hex_digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }

        match hex_digest.len() {
            32 => Some(ChecksumAlgorithm::Md5),
            64 => Some(ChecksumAlgorithm::Sha256),
            128 => Some(ChecksumAlgorithm::Sha512),
            _ => None,
        }
    }
}

impl std::fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChecksumAlgorithm::Md5 => write!(f, "md5"),
            ChecksumAlgorithm::Sha256 => write!(f, "sha256"),
            ChecksumAlgorithm::Sha512 => write!(f, "sha512"),
        }
    }
}
