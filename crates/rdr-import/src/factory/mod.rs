//! Object construction strategies and the registry that selects them
//!
//! Each supported model registers an [`ObjectFactory`]. The importer resolves
//! a factory per row, from the row's `type` column or the job-level model,
//! and asks it to build, attach files to, and persist one object.

pub mod collection;
pub mod dataset;
pub mod fields;
pub mod files;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::attributes::Attributes;
use crate::checksum_store::ChecksumTable;
use crate::config::Settings;
use crate::error::{ConstructionError, ImportError, Result};
use crate::model::{PersistedRef, WorkObject};
use crate::store::ObjectStore;

pub use collection::CollectionFactory;
pub use dataset::DatasetFactory;

/// Attributes tried, in order, to name a row in error messages
const IDENTIFYING_FIELDS: &[&str] = &["title", "identifier", "doi", "ark"];

/// Everything a factory needs besides the row itself
#[derive(Clone)]
pub struct FactoryContext {
    files_directory: PathBuf,
    checksums: Option<Arc<ChecksumTable>>,
    store: Arc<dyn ObjectStore>,
    settings: Arc<Settings>,
}

impl FactoryContext {
    pub fn new(
        files_directory: impl Into<PathBuf>,
        store: Arc<dyn ObjectStore>,
        settings: Arc<Settings>,
    ) -> Self {
        Self {
            files_directory: files_directory.into(),
            checksums: None,
            store,
            settings,
        }
    }

    pub fn with_checksums(mut self, checksums: Arc<ChecksumTable>) -> Self {
        self.checksums = Some(checksums);
        self
    }

    pub fn files_directory(&self) -> &Path {
        &self.files_directory
    }

    pub fn checksums(&self) -> Option<&ChecksumTable> {
        self.checksums.as_deref()
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

/// Construction strategy for one model
#[async_trait]
pub trait ObjectFactory: Send + Sync {
    /// Model name used in manifests, e.g. "Dataset"
    fn model_name(&self) -> &str;

    /// Distinguishing value for diagnostics
    fn identify(&self, attributes: &Attributes) -> Option<String> {
        IDENTIFYING_FIELDS
            .iter()
            .find_map(|field| attributes.get(*field))
            .map(|value| fields::split_values(value).into_iter().next().unwrap_or_default())
            .filter(|value| !value.is_empty())
    }

    /// Turn merged row attributes into an unsaved object
    fn build(&self, attributes: &Attributes, ctx: &FactoryContext)
        -> std::result::Result<WorkObject, ConstructionError>;

    /// Resolve, verify and attach the files the row references
    async fn attach_files(
        &self,
        object: &mut WorkObject,
        attributes: &Attributes,
        ctx: &FactoryContext,
    ) -> std::result::Result<(), ConstructionError> {
        object.files = files::attach_listed_files(attributes, ctx).await?;
        Ok(())
    }

    async fn persist(
        &self,
        object: WorkObject,
        ctx: &FactoryContext,
    ) -> std::result::Result<PersistedRef, ConstructionError> {
        Ok(ctx.store().persist(object).await?)
    }

    /// Build, attach files, and persist
    async fn construct(
        &self,
        attributes: &Attributes,
        ctx: &FactoryContext,
    ) -> std::result::Result<PersistedRef, ConstructionError> {
        let mut object = self.build(attributes, ctx)?;
        self.attach_files(&mut object, attributes, ctx).await?;
        self.persist(object, ctx).await
    }
}

/// How a job or row names its model
#[derive(Clone)]
pub enum ModelSelector {
    /// Look the factory up by name in the registry
    Name(String),
    /// Use this factory directly, bypassing the registry
    Factory(Arc<dyn ObjectFactory>),
}

impl ModelSelector {
    /// True when the selector names nothing
    pub fn is_blank(&self) -> bool {
        matches!(self, ModelSelector::Name(name) if name.trim().is_empty())
    }
}

impl std::fmt::Debug for ModelSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelSelector::Name(name) => f.debug_tuple("Name").field(name).finish(),
            ModelSelector::Factory(factory) => {
                f.debug_tuple("Factory").field(&factory.model_name()).finish()
            },
        }
    }
}

impl From<&str> for ModelSelector {
    fn from(name: &str) -> Self {
        ModelSelector::Name(name.to_string())
    }
}

impl From<String> for ModelSelector {
    fn from(name: String) -> Self {
        ModelSelector::Name(name)
    }
}

/// Registration table of model name -> factory
#[derive(Clone, Default)]
pub struct FactoryRegistry {
    factories: BTreeMap<String, Arc<dyn ObjectFactory>>,
}

impl FactoryRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in model
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(Arc::new(DatasetFactory))
            .register(Arc::new(CollectionFactory));
        registry
    }

    /// Add a factory under its model name, replacing any previous one
    pub fn register(&mut self, factory: Arc<dyn ObjectFactory>) -> &mut Self {
        self.factories
            .insert(registry_key(factory.model_name()), factory);
        self
    }

    /// Display names of the registered models, sorted
    pub fn model_names(&self) -> Vec<&str> {
        self.factories.values().map(|f| f.model_name()).collect()
    }

    /// Pick the factory for a row
    ///
    /// Names match case-insensitively and may carry a `Factory` suffix.
    pub fn resolve(
        &self,
        selector: Option<&ModelSelector>,
        line: Option<u64>,
    ) -> Result<Arc<dyn ObjectFactory>> {
        match selector {
            Some(ModelSelector::Factory(factory)) => Ok(Arc::clone(factory)),
            Some(ModelSelector::Name(name)) if !name.trim().is_empty() => self
                .factories
                .get(&registry_key(name))
                .cloned()
                .ok_or_else(|| ImportError::UnknownModel {
                    line,
                    name: name.trim().to_string(),
                }),
            _ => Err(ImportError::MissingModel { line }),
        }
    }
}

impl std::fmt::Debug for FactoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactoryRegistry")
            .field("models", &self.model_names())
            .finish()
    }
}

fn registry_key(name: &str) -> String {
    const SUFFIX: &str = "factory";
    let key = name.trim().to_lowercase();
    match key.strip_suffix(SUFFIX) {
        Some(stem) if !stem.is_empty() => stem.to_string(),
        _ => key,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct WidgetFactory;

    #[async_trait]
    impl ObjectFactory for WidgetFactory {
        fn model_name(&self) -> &str {
            "Widget"
        }

        fn build(
            &self,
            _attributes: &Attributes,
            _ctx: &FactoryContext,
        ) -> std::result::Result<WorkObject, ConstructionError> {
            Ok(WorkObject::new("Widget", "nobody"))
        }
    }

    #[test]
    fn test_resolve_by_name() {
        let registry = FactoryRegistry::with_defaults();
        for name in ["Dataset", "dataset", " DATASET ", "DatasetFactory"] {
            let factory = registry.resolve(Some(&name.into()), Some(2)).unwrap();
            assert_eq!(factory.model_name(), "Dataset");
        }
        let factory = registry.resolve(Some(&"Collection".into()), None).unwrap();
        assert_eq!(factory.model_name(), "Collection");
    }

    #[test]
    fn test_injected_factory_is_returned_unchanged() {
        let registry = FactoryRegistry::new();
        let widget: Arc<dyn ObjectFactory> = Arc::new(WidgetFactory);
        let selector = ModelSelector::Factory(Arc::clone(&widget));

        let resolved = registry.resolve(Some(&selector), Some(2)).unwrap();
        assert!(Arc::ptr_eq(&resolved, &widget));
    }

    #[test]
    fn test_missing_model() {
        let registry = FactoryRegistry::with_defaults();
        assert!(matches!(
            registry.resolve(None, Some(2)),
            Err(ImportError::MissingModel { line: Some(2) })
        ));
        assert!(matches!(
            registry.resolve(Some(&"   ".into()), None),
            Err(ImportError::MissingModel { line: None })
        ));
    }

    #[test]
    fn test_unknown_model() {
        let registry = FactoryRegistry::with_defaults();
        match registry.resolve(Some(&"Widget".into()), Some(5)) {
            Err(ImportError::UnknownModel { line, name }) => {
                assert_eq!(line, Some(5));
                assert_eq!(name, "Widget");
            },
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("Widget should not resolve"),
        }
        assert!(registry.resolve(Some(&"Factory".into()), None).is_err());
    }

    #[test]
    fn test_register_custom_factory() {
        let mut registry = FactoryRegistry::with_defaults();
        registry.register(Arc::new(WidgetFactory));

        assert_eq!(registry.model_names(), vec!["Collection", "Dataset", "Widget"]);
        assert!(registry.resolve(Some(&"widget".into()), None).is_ok());
    }

    #[test]
    fn test_identify_prefers_title() {
        let factory = WidgetFactory;
        let mut attributes = Attributes::new();
        attributes.insert("doi".into(), "10.1234/abc".into());
        assert_eq!(factory.identify(&attributes).as_deref(), Some("10.1234/abc"));

        attributes.insert("title".into(), "First | Second".into());
        assert_eq!(factory.identify(&attributes).as_deref(), Some("First"));

        assert_eq!(factory.identify(&Attributes::new()), None);
    }

    #[test]
    fn test_blank_selector() {
        assert!(ModelSelector::from(" ").is_blank());
        assert!(!ModelSelector::from("Dataset").is_blank());
        assert!(!ModelSelector::Factory(Arc::new(WidgetFactory)).is_blank());
    }
}
