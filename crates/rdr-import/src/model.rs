//! Objects produced by the construction strategies

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rdr_common::types::ChecksumAlgorithm;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Access level of a deposited object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Open,
    Authenticated,
    #[default]
    Restricted,
}

impl std::str::FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "open" | "public" => Ok(Visibility::Open),
            "authenticated" | "registered" => Ok(Visibility::Authenticated),
            "restricted" | "private" => Ok(Visibility::Restricted),
            _ => Err("expected open, authenticated or restricted".to_string()),
        }
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Visibility::Open => write!(f, "open"),
            Visibility::Authenticated => write!(f, "authenticated"),
            Visibility::Restricted => write!(f, "restricted"),
        }
    }
}

/// A file accepted into an object, with the digest computed at attach time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachedFile {
    /// Name as written in the manifest, relative to the files directory
    pub name: String,
    /// Where the content was read from
    pub source: PathBuf,
    pub size: u64,
    pub algorithm: ChecksumAlgorithm,
    pub digest: String,
    /// Whether the digest was checked against the checksum table
    pub verified: bool,
}

/// One repository object built from a manifest row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkObject {
    pub id: Uuid,
    pub model: String,
    pub depositor: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on_behalf_of: Option<String>,
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_set_id: Option<String>,
    /// Descriptive metadata, field -> values
    pub metadata: IndexMap<String, Vec<String>>,
    #[serde(default)]
    pub files: Vec<AttachedFile>,
    pub deposited_at: DateTime<Utc>,
}

impl WorkObject {
    pub fn new(model: impl Into<String>, depositor: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            model: model.into(),
            depositor: depositor.into(),
            on_behalf_of: None,
            visibility: Visibility::default(),
            admin_set_id: None,
            metadata: IndexMap::new(),
            files: Vec::new(),
            deposited_at: Utc::now(),
        }
    }

    /// First value of a metadata field
    pub fn first(&self, field: &str) -> Option<&str> {
        self.metadata
            .get(field)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.first("title")
    }
}

/// Handle returned by the object store once an object is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRef {
    pub id: Uuid,
    pub model: String,
    /// Store-specific location, e.g. a directory path
    pub location: String,
}
