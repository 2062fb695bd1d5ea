//! Collections group works and never carry files

use super::fields::{self, FieldSpec};
use super::files::{listed_files, FILE_COLUMN};
use super::{FactoryContext, ObjectFactory};
use crate::attributes::{Attributes, DEPOSITOR, ON_BEHALF_OF};
use crate::error::ConstructionError;
use crate::model::WorkObject;
use async_trait::async_trait;

pub const MODEL_NAME: &str = "Collection";

pub const COLLECTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::multiple("title"),
    FieldSpec::multiple("description"),
    FieldSpec::multiple("creator"),
    FieldSpec::multiple("keyword"),
    FieldSpec::multiple("related_url"),
];

const RESERVED: &[&str] = &[FILE_COLUMN, DEPOSITOR, ON_BEHALF_OF, fields::VISIBILITY];

#[derive(Debug, Clone, Copy, Default)]
pub struct CollectionFactory;

#[async_trait]
impl ObjectFactory for CollectionFactory {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn build(
        &self,
        attributes: &Attributes,
        _ctx: &FactoryContext,
    ) -> Result<WorkObject, ConstructionError> {
        let metadata = fields::collect_metadata(attributes, COLLECTION_FIELDS, RESERVED)?;
        fields::require(&metadata, "title")?;

        let mut object = WorkObject::new(MODEL_NAME, fields::depositor(attributes)?);
        object.on_behalf_of = fields::on_behalf_of(attributes)?;
        object.visibility = fields::visibility(attributes)?;
        object.metadata = metadata;

        Ok(object)
    }

    async fn attach_files(
        &self,
        _object: &mut WorkObject,
        attributes: &Attributes,
        _ctx: &FactoryContext,
    ) -> Result<(), ConstructionError> {
        if listed_files(attributes).is_empty() {
            Ok(())
        } else {
            Err(ConstructionError::FilesNotAllowed {
                model: MODEL_NAME.to_string(),
            })
        }
    }
}
