//! Dataset works

use super::fields::{self, FieldSpec};
use super::files::FILE_COLUMN;
use super::{FactoryContext, ObjectFactory};
use crate::attributes::{Attributes, DEPOSITOR, ON_BEHALF_OF};
use crate::error::ConstructionError;
use crate::model::WorkObject;
use async_trait::async_trait;

pub const MODEL_NAME: &str = "Dataset";

pub const ADMIN_SET_ID: &str = "admin_set_id";

/// Descriptive fields a dataset accepts
pub const DATASET_FIELDS: &[FieldSpec] = &[
    // basic work metadata
    FieldSpec::multiple("title"),
    FieldSpec::multiple("creator"),
    FieldSpec::multiple("contributor"),
    FieldSpec::multiple("description"),
    FieldSpec::multiple("keyword"),
    FieldSpec::multiple("subject"),
    FieldSpec::multiple("publisher"),
    FieldSpec::multiple("date_created"),
    FieldSpec::multiple("language"),
    FieldSpec::multiple("license"),
    FieldSpec::multiple("rights_statement"),
    FieldSpec::multiple("resource_type"),
    FieldSpec::multiple("identifier"),
    FieldSpec::multiple("source"),
    FieldSpec::multiple("related_url"),
    FieldSpec::multiple("based_near"),
    FieldSpec::multiple("bibliographic_citation"),
    // repository extensions
    FieldSpec::multiple("alternative"),
    FieldSpec::multiple("affiliation"),
    FieldSpec::multiple("available"),
    FieldSpec::multiple("temporal"),
    FieldSpec::multiple("format"),
    FieldSpec::multiple("is_replaced_by"),
    FieldSpec::multiple("provenance"),
    FieldSpec::multiple("replaces"),
    FieldSpec::multiple("rights_note"),
    FieldSpec::single("doi"),
    FieldSpec::single("ark"),
];

/// Columns consumed outside the descriptive metadata
const RESERVED: &[&str] = &[
    FILE_COLUMN,
    DEPOSITOR,
    ON_BEHALF_OF,
    fields::VISIBILITY,
    ADMIN_SET_ID,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DatasetFactory;

#[async_trait]
impl ObjectFactory for DatasetFactory {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn build(
        &self,
        attributes: &Attributes,
        ctx: &FactoryContext,
    ) -> Result<WorkObject, ConstructionError> {
        let metadata = fields::collect_metadata(attributes, DATASET_FIELDS, RESERVED)?;
        fields::require(&metadata, "title")?;

        let mut object = WorkObject::new(MODEL_NAME, fields::depositor(attributes)?);
        object.on_behalf_of = fields::on_behalf_of(attributes)?;
        object.visibility = fields::visibility(attributes)?;
        object.admin_set_id = fields::single_attribute(attributes, ADMIN_SET_ID)?
            .or_else(|| ctx.settings().preferred_admin_set_id.clone());
        object.metadata = metadata;

        Ok(object)
    }
}
