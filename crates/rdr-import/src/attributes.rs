//! Row attributes and deposit-wide defaults

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Column name -> raw value for one manifest row, in column order
pub type Attributes = IndexMap<String, String>;

pub const DEPOSITOR: &str = "depositor";
pub const ON_BEHALF_OF: &str = "on_behalf_of";

/// Identity metadata applied to every row of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositAttributes {
    pub depositor: String,
    pub on_behalf_of: Option<String>,
}

impl DepositAttributes {
    pub fn new(depositor: impl Into<String>, on_behalf_of: Option<String>) -> Self {
        Self {
            depositor: depositor.into(),
            on_behalf_of,
        }
    }

    /// Fill in deposit attributes the row does not supply itself
    ///
    /// Row values always win; applying this more than once has no further
    /// effect.
    pub fn merge_into(&self, attributes: &mut Attributes) {
        attributes
            .entry(DEPOSITOR.to_string())
            .or_insert_with(|| self.depositor.clone());

        if let Some(on_behalf_of) = &self.on_behalf_of {
            attributes
                .entry(ON_BEHALF_OF.to_string())
                .or_insert_with(|| on_behalf_of.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, &str)]) -> Attributes {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_fills_missing_keys() {
        let deposit = DepositAttributes::new("alice", Some("bob".to_string()));
        let mut attributes = row(&[("title", "Sample Dataset")]);

        deposit.merge_into(&mut attributes);

        assert_eq!(attributes.get(DEPOSITOR).map(String::as_str), Some("alice"));
        assert_eq!(attributes.get(ON_BEHALF_OF).map(String::as_str), Some("bob"));
        // row columns keep their position ahead of the defaults
        assert_eq!(attributes.get_index(0).map(|(k, _)| k.as_str()), Some("title"));
    }

    #[test]
    fn test_row_values_win_over_deposit_attributes() {
        let deposit = DepositAttributes::new("alice", Some("bob".to_string()));
        let mut attributes = row(&[("title", "T"), ("depositor", "carol")]);

        deposit.merge_into(&mut attributes);

        assert_eq!(attributes.get(DEPOSITOR).map(String::as_str), Some("carol"));
        assert_eq!(attributes.get(ON_BEHALF_OF).map(String::as_str), Some("bob"));
    }

    #[test]
    fn test_absent_on_behalf_of_adds_nothing() {
        let deposit = DepositAttributes::new("alice", None);
        let mut attributes = row(&[("title", "T")]);

        deposit.merge_into(&mut attributes);

        assert!(!attributes.contains_key(ON_BEHALF_OF));
        assert_eq!(attributes.len(), 2);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let deposit = DepositAttributes::new("alice", Some("bob".to_string()));
        let original = row(&[("title", "T"), ("on_behalf_of", "dave")]);

        let mut once = original.clone();
        deposit.merge_into(&mut once);

        let mut twice = original;
        deposit.merge_into(&mut twice);
        deposit.merge_into(&mut twice);

        assert_eq!(once, twice);
    }
}
