//! RDR batch importer
//!
//! Creates repository objects in bulk from a CSV manifest. Each row becomes
//! one object built by the construction strategy its model names, with the
//! files it lists verified against an optional checksum table.
//!
//! # Overview
//!
//! - **Manifest**: streamed CSV rows ([`manifest`])
//! - **Checksums**: coreutils-style digest listings ([`checksum_store`])
//! - **Models**: `Dataset` and `Collection` strategies behind a registry ([`factory`])
//! - **Orchestration**: sequential, cancellable runs ([`importer`])
//! - **Persistence**: filesystem or in-memory object stores ([`store`])

#![deny(clippy::unwrap_used, clippy::expect_used)]

pub mod attributes;
pub mod checksum_store;
pub mod config;
pub mod error;
pub mod factory;
pub mod importer;
pub mod manifest;
pub mod model;
pub mod progress;
pub mod store;

// Re-export commonly used types
pub use config::Settings;
pub use error::{ConstructionError, ErrorKind, ImportError, Result};
pub use factory::{FactoryRegistry, ModelSelector, ObjectFactory};
pub use importer::{ImportJob, ImportProgress, Importer};
pub use store::{DryRunStore, FsObjectStore, InMemoryStore, ObjectStore};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// RDR batch importer
#[derive(Parser, Debug)]
#[command(name = "rdr-import")]
#[command(author, version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import every row of a CSV manifest
    Import {
        /// CSV manifest, one object per row
        #[arg(short, long)]
        manifest: PathBuf,

        /// Directory holding the files the manifest references
        #[arg(short, long)]
        files: PathBuf,

        /// Checksum listing in sha256sum/md5sum format
        #[arg(short, long)]
        checksums: Option<PathBuf>,

        /// Model for rows without a `type` column value
        #[arg(long)]
        model: Option<String>,

        /// User recorded as the depositor of every object
        #[arg(short, long, env = "RDR_DEPOSITOR")]
        depositor: String,

        /// User the deposit is made on behalf of
        #[arg(long)]
        on_behalf_of: Option<String>,

        /// Object store root (overrides RDR_STORAGE_ROOT)
        #[arg(long)]
        storage_root: Option<PathBuf>,

        /// Build and verify objects without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// List the supported models
    Models,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_command() {
        let cli = Cli::try_parse_from([
            "rdr-import",
            "import",
            "--manifest",
            "batch.csv",
            "--files",
            "files",
            "--depositor",
            "alice",
            "--model",
            "Dataset",
            "--dry-run",
        ])
        .unwrap();

        match cli.command {
            Commands::Import {
                manifest,
                depositor,
                model,
                dry_run,
                checksums,
                ..
            } => {
                assert_eq!(manifest, PathBuf::from("batch.csv"));
                assert_eq!(depositor, "alice");
                assert_eq!(model.as_deref(), Some("Dataset"));
                assert!(dry_run);
                assert!(checksums.is_none());
            },
            Commands::Models => panic!("expected import command"),
        }
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["rdr-import", "models", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
