//! Attribute -> metadata mapping shared by the construction strategies

use indexmap::IndexMap;

use crate::attributes::{Attributes, DEPOSITOR, ON_BEHALF_OF};
use crate::error::ConstructionError;
use crate::model::Visibility;

/// Separator between values of a multi-valued cell
pub const MULTI_VALUE_SEPARATOR: char = '|';

pub const VISIBILITY: &str = "visibility";

/// A metadata field a model accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub multiple: bool,
}

impl FieldSpec {
    pub const fn single(name: &'static str) -> Self {
        Self {
            name,
            multiple: false,
        }
    }

    pub const fn multiple(name: &'static str) -> Self {
        Self {
            name,
            multiple: true,
        }
    }
}

/// Split a cell on `|`, trimming values and dropping empty ones
pub fn split_values(value: &str) -> Vec<String> {
    value
        .split(MULTI_VALUE_SEPARATOR)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

/// Map row attributes onto a model's metadata fields
///
/// Columns listed in `reserved` are handled elsewhere and skipped; any other
/// column the model does not know is rejected.
pub fn collect_metadata(
    attributes: &Attributes,
    fields: &[FieldSpec],
    reserved: &[&str],
) -> Result<IndexMap<String, Vec<String>>, ConstructionError> {
    let mut metadata = IndexMap::new();

    for (column, value) in attributes {
        if reserved.contains(&column.as_str()) {
            continue;
        }
        let spec = fields
            .iter()
            .find(|spec| spec.name == column.as_str())
            .ok_or_else(|| ConstructionError::UnknownAttribute {
                field: column.clone(),
            })?;

        let values = if spec.multiple {
            split_values(value)
        } else {
            single_value(column, value)?.into_iter().collect()
        };
        if !values.is_empty() {
            metadata.insert(column.clone(), values);
        }
    }

    Ok(metadata)
}

/// Fail unless `field` has at least one value
pub fn require(
    metadata: &IndexMap<String, Vec<String>>,
    field: &str,
) -> Result<(), ConstructionError> {
    match metadata.get(field) {
        Some(values) if !values.is_empty() => Ok(()),
        _ => Err(ConstructionError::MissingRequired {
            field: field.to_string(),
        }),
    }
}

/// Read a column that must hold at most one value
pub fn single_attribute(
    attributes: &Attributes,
    field: &str,
) -> Result<Option<String>, ConstructionError> {
    match attributes.get(field) {
        Some(value) => single_value(field, value),
        None => Ok(None),
    }
}

pub fn depositor(attributes: &Attributes) -> Result<String, ConstructionError> {
    single_attribute(attributes, DEPOSITOR)?.ok_or_else(|| ConstructionError::MissingRequired {
        field: DEPOSITOR.to_string(),
    })
}

pub fn on_behalf_of(attributes: &Attributes) -> Result<Option<String>, ConstructionError> {
    single_attribute(attributes, ON_BEHALF_OF)
}

/// Visibility column, restricted when absent
pub fn visibility(attributes: &Attributes) -> Result<Visibility, ConstructionError> {
    match single_attribute(attributes, VISIBILITY)? {
        Some(value) => value
            .parse()
            .map_err(|reason| ConstructionError::InvalidValue {
                field: VISIBILITY.to_string(),
                value,
                reason,
            }),
        None => Ok(Visibility::default()),
    }
}

fn single_value(field: &str, value: &str) -> Result<Option<String>, ConstructionError> {
    let mut values = split_values(value);
    if values.len() > 1 {
        return Err(ConstructionError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "expected a single value".to_string(),
        });
    }
    Ok(values.pop())
}
