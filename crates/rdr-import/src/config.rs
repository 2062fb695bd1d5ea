//! Process-wide settings for the importer
//!
//! Built once at startup and handed to the importer behind an `Arc`; core
//! logic never reads the environment itself.

use crate::error::{ImportError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default object store location when `RDR_STORAGE_ROOT` is not set
pub const DEFAULT_STORAGE_ROOT: &str = "./rdr-store";

/// Importer settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory of the filesystem object store
    pub storage_root: PathBuf,

    /// Admin set assigned to datasets that do not name one
    pub preferred_admin_set_id: Option<String>,

    /// Reject files that have no entry in the checksum table
    #[serde(default)]
    pub require_checksums: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            preferred_admin_set_id: None,
            require_checksums: false,
        }
    }
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// - `RDR_STORAGE_ROOT`
    /// - `RDR_PREFERRED_ADMIN_SET_ID`
    /// - `RDR_REQUIRE_CHECKSUMS` (true/false, yes/no, 1/0)
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::default();

        if let Ok(root) = std::env::var("RDR_STORAGE_ROOT") {
            settings.storage_root = PathBuf::from(root);
        }

        if let Ok(admin_set) = std::env::var("RDR_PREFERRED_ADMIN_SET_ID") {
            let admin_set = admin_set.trim();
            if !admin_set.is_empty() {
                settings.preferred_admin_set_id = Some(admin_set.to_string());
            }
        }

        if let Ok(value) = std::env::var("RDR_REQUIRE_CHECKSUMS") {
            settings.require_checksums = parse_flag("RDR_REQUIRE_CHECKSUMS", &value)?;
        }

        Ok(settings)
    }

    pub fn with_storage_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.storage_root = root.into();
        self
    }

    pub fn with_preferred_admin_set_id(mut self, id: impl Into<String>) -> Self {
        self.preferred_admin_set_id = Some(id.into());
        self
    }

    pub fn with_require_checksums(mut self, require: bool) -> Self {
        self.require_checksums = require;
        self
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ImportError::InvalidSettings(format!(
            "{} must be a boolean, got '{}'",
            name, other
        ))),
    }
}
