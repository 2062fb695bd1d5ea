//! Import orchestration
//!
//! Drives one run: load checksums, open the manifest, then construct one
//! object per row in manifest order. The first failure ends the run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};

use crate::attributes::DepositAttributes;
use crate::checksum_store::ChecksumTable;
use crate::config::Settings;
use crate::error::{ImportError, Result};
use crate::factory::{FactoryContext, FactoryRegistry, ModelSelector};
use crate::manifest::{ManifestParser, TYPE_COLUMN};
use crate::model::PersistedRef;
use crate::store::ObjectStore;

/// Inputs for one import run
#[derive(Debug, Clone)]
pub struct ImportJob {
    manifest: PathBuf,
    files_directory: PathBuf,
    checksum_file: Option<PathBuf>,
    deposit: DepositAttributes,
    model: Option<ModelSelector>,
}

impl ImportJob {
    pub fn builder(
        manifest: impl Into<PathBuf>,
        files_directory: impl Into<PathBuf>,
    ) -> ImportJobBuilder {
        ImportJobBuilder {
            manifest: manifest.into(),
            files_directory: files_directory.into(),
            checksum_file: None,
            depositor: None,
            on_behalf_of: None,
            model: None,
        }
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    pub fn files_directory(&self) -> &Path {
        &self.files_directory
    }

    pub fn checksum_file(&self) -> Option<&Path> {
        self.checksum_file.as_deref()
    }

    pub fn model(&self) -> Option<&ModelSelector> {
        self.model.as_ref()
    }

    pub fn deposit_attributes(&self) -> &DepositAttributes {
        &self.deposit
    }
}

/// Builder for [`ImportJob`]
#[derive(Debug)]
pub struct ImportJobBuilder {
    manifest: PathBuf,
    files_directory: PathBuf,
    checksum_file: Option<PathBuf>,
    depositor: Option<String>,
    on_behalf_of: Option<String>,
    model: Option<ModelSelector>,
}

impl ImportJobBuilder {
    pub fn depositor(mut self, depositor: impl Into<String>) -> Self {
        self.depositor = Some(depositor.into());
        self
    }

    pub fn on_behalf_of(mut self, on_behalf_of: impl Into<String>) -> Self {
        self.on_behalf_of = Some(on_behalf_of.into());
        self
    }

    pub fn checksum_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.checksum_file = Some(path.into());
        self
    }

    /// Job-level model, used by rows without a `type`
    pub fn model(mut self, model: impl Into<ModelSelector>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn build(self) -> Result<ImportJob> {
        let depositor = self
            .depositor
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())
            .ok_or_else(|| ImportError::InvalidJob("a depositor is required".to_string()))?;
        let on_behalf_of = self
            .on_behalf_of
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());

        Ok(ImportJob {
            manifest: self.manifest,
            files_directory: self.files_directory,
            checksum_file: self.checksum_file,
            deposit: DepositAttributes::new(depositor, on_behalf_of),
            model: self.model.filter(|m| !m.is_blank()),
        })
    }
}

/// Observer notified as rows complete
pub trait ImportProgress: Send + Sync {
    fn row_imported(&self, line: u64, persisted: &PersistedRef, imported: usize);

    fn finished(&self, _imported: usize) {}
}

/// Progress observer that ignores everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ImportProgress for NoProgress {
    fn row_imported(&self, _line: u64, _persisted: &PersistedRef, _imported: usize) {}
}

/// Runs import jobs against a registry and an object store
pub struct Importer {
    registry: FactoryRegistry,
    store: Arc<dyn ObjectStore>,
    settings: Arc<Settings>,
}

impl Importer {
    pub fn new(registry: FactoryRegistry, store: Arc<dyn ObjectStore>, settings: Arc<Settings>) -> Self {
        Self {
            registry,
            store,
            settings,
        }
    }

    pub fn registry(&self) -> &FactoryRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Import every row of the job's manifest, returning how many objects
    /// were created
    pub async fn run_import(&self, job: &ImportJob, cancel: &CancellationToken) -> Result<usize> {
        self.run_import_with_progress(job, cancel, &NoProgress).await
    }

    pub async fn run_import_with_progress(
        &self,
        job: &ImportJob,
        cancel: &CancellationToken,
        progress: &dyn ImportProgress,
    ) -> Result<usize> {
        info!(
            manifest = %job.manifest().display(),
            files = %job.files_directory().display(),
            store = self.store.name(),
            "Starting import"
        );

        let mut ctx = FactoryContext::new(
            job.files_directory(),
            Arc::clone(&self.store),
            Arc::clone(&self.settings),
        );
        if let Some(path) = job.checksum_file() {
            ctx = ctx.with_checksums(Arc::new(ChecksumTable::load(path)?));
        }

        let rows = ManifestParser::open(job.manifest())?;
        if !rows.has_column(TYPE_COLUMN) && job.model().is_none() {
            return Err(ImportError::MissingModel { line: None });
        }

        let mut imported = 0usize;
        for row in rows {
            if cancel.is_cancelled() {
                info!(imported, "Import cancelled");
                return Err(ImportError::Cancelled { imported });
            }

            let mut row = row?;
            let line = row.line;
            job.deposit_attributes().merge_into(&mut row.attributes);

            let row_model = row.take_type_override().map(ModelSelector::Name);
            let factory = self
                .registry
                .resolve(row_model.as_ref().or(job.model()), Some(line))?;

            let span = info_span!("row", line, model = factory.model_name());
            let persisted = factory
                .construct(&row.attributes, &ctx)
                .instrument(span)
                .await
                .map_err(|source| ImportError::Construction {
                    line,
                    model: factory.model_name().to_string(),
                    identifier: factory
                        .identify(&row.attributes)
                        .unwrap_or_else(|| format!("row {}", line)),
                    source,
                })?;

            imported += 1;
            debug!(line, id = %persisted.id, location = %persisted.location, "Imported object");
            progress.row_imported(line, &persisted, imported);
        }

        progress.finished(imported);
        info!(imported, "Import finished");
        Ok(imported)
    }
}

impl std::fmt::Debug for Importer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Importer")
            .field("registry", &self.registry)
            .field("store", &self.store.name())
            .field("settings", &self.settings)
            .finish()
    }
}
