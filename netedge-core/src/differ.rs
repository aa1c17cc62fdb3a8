//! Differ - Compare the last applied state with the desired state
//!
//! An `AttributeDiff` pairs the prior attribute snapshot with the desired one
//! and answers per-attribute change questions for top-level attributes.
//! Nested blocks carry no change flags of their own; callers compare their
//! contents directly after extracting them with [`single_block`] or
//! [`optional_block`].

use std::collections::HashMap;

use thiserror::Error;

use crate::resource::Value;

/// Errors raised when a nested block does not have the expected shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError {
    #[error("illegal number of {name} configurations: expected {expected}, have {found}")]
    Cardinality {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("{name} must be a list of blocks, got {found}")]
    NotABlock { name: String, found: &'static str },
}

/// Whether a value is indistinguishable from an unset attribute
///
/// Empty strings, zero, false and empty collections are all treated as unset.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::Int(i) => *i == 0,
        Value::Bool(b) => !*b,
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
    }
}

fn set_value(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !is_zero(v))
}

/// Prior and desired attribute snapshots of one resource
#[derive(Debug, Clone, Copy)]
pub struct AttributeDiff<'a> {
    prior: &'a HashMap<String, Value>,
    desired: &'a HashMap<String, Value>,
}

impl<'a> AttributeDiff<'a> {
    pub fn new(prior: &'a HashMap<String, Value>, desired: &'a HashMap<String, Value>) -> Self {
        Self { prior, desired }
    }

    /// Desired value of an attribute
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.desired.get(key)
    }

    /// `(prior, desired)` values of an attribute
    pub fn get_change(&self, key: &str) -> (Option<&'a Value>, Option<&'a Value>) {
        (self.prior.get(key), self.desired.get(key))
    }

    /// Whether a top-level attribute differs between the two snapshots
    pub fn has_change(&self, key: &str) -> bool {
        set_value(self.prior.get(key)) != set_value(self.desired.get(key))
    }

    /// Names of all changed top-level attributes, sorted
    pub fn changed_attributes(&self) -> Vec<&'a str> {
        let mut changed: Vec<&'a str> = self
            .prior
            .keys()
            .chain(self.desired.keys())
            .map(String::as_str)
            .filter(|key| self.has_change(key))
            .collect();
        changed.sort_unstable();
        changed.dedup();
        changed
    }
}

fn blocks<'v>(name: &str, value: Option<&'v Value>) -> Result<&'v [Value], BlockError> {
    match value {
        None => Ok(&[]),
        Some(Value::List(items)) => Ok(items),
        Some(other) => Err(BlockError::NotABlock {
            name: name.to_string(),
            found: other.type_name(),
        }),
    }
}

fn as_block<'v>(name: &str, value: &'v Value) -> Result<&'v HashMap<String, Value>, BlockError> {
    value.as_map().ok_or_else(|| BlockError::NotABlock {
        name: name.to_string(),
        found: value.type_name(),
    })
}

/// Extract a block that may appear at most once
pub fn optional_block<'v>(
    name: &str,
    value: Option<&'v Value>,
) -> Result<Option<&'v HashMap<String, Value>>, BlockError> {
    match blocks(name, value)? {
        [] => Ok(None),
        [single] => as_block(name, single).map(Some),
        many => Err(BlockError::Cardinality {
            name: name.to_string(),
            expected: "at most 1",
            found: many.len(),
        }),
    }
}

/// Extract a block that must appear exactly once
pub fn single_block<'v>(
    name: &str,
    value: Option<&'v Value>,
) -> Result<&'v HashMap<String, Value>, BlockError> {
    match blocks(name, value)? {
        [single] => as_block(name, single),
        other => Err(BlockError::Cardinality {
            name: name.to_string(),
            expected: "1",
            found: other.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn has_change_when_value_differs() {
        let prior = attrs(&[("name", "edge-a".into())]);
        let desired = attrs(&[("name", "edge-b".into())]);
        let diff = AttributeDiff::new(&prior, &desired);
        assert!(diff.has_change("name"));
        assert_eq!(diff.get("name"), Some(&Value::from("edge-b")));
    }

    #[test]
    fn no_change_when_same() {
        let prior = attrs(&[("term_length", Value::Int(12))]);
        let desired = prior.clone();
        let diff = AttributeDiff::new(&prior, &desired);
        assert!(!diff.has_change("term_length"));
        assert!(diff.changed_attributes().is_empty());
    }

    #[test]
    fn empty_value_equals_unset() {
        let prior = attrs(&[("acl_template_id", "".into())]);
        let desired = HashMap::new();
        let diff = AttributeDiff::new(&prior, &desired);
        assert!(!diff.has_change("acl_template_id"));
    }

    #[test]
    fn removed_attribute_is_a_change() {
        let prior = attrs(&[("acl_template_id", "acl-1".into())]);
        let desired = HashMap::new();
        let diff = AttributeDiff::new(&prior, &desired);
        assert!(diff.has_change("acl_template_id"));
        assert_eq!(diff.get_change("acl_template_id").1, None);
        assert_eq!(diff.changed_attributes(), vec!["acl_template_id"]);
    }

    #[test]
    fn optional_block_cardinality() {
        let block = Value::Map(attrs(&[("name", "secondary".into())]));
        assert_eq!(optional_block("secondary_device", None), Ok(None));

        let one = Value::List(vec![block.clone()]);
        let found = optional_block("secondary_device", Some(&one)).unwrap();
        assert_eq!(found.and_then(|b| b.get("name")), Some(&Value::from("secondary")));

        let two = Value::List(vec![block.clone(), block]);
        assert!(matches!(
            optional_block("secondary_device", Some(&two)),
            Err(BlockError::Cardinality { found: 2, .. })
        ));
    }

    #[test]
    fn single_block_requires_exactly_one() {
        let empty = Value::List(vec![]);
        let err = single_block("secondary_device", Some(&empty)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "illegal number of secondary_device configurations: expected 1, have 0"
        );

        let wrong = Value::String("x".into());
        assert!(matches!(
            single_block("secondary_device", Some(&wrong)),
            Err(BlockError::NotABlock { found: "string", .. })
        ));
    }
}
