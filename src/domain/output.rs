//! Output document describing everything a bring-up started.
//!
//! Fragments produced by the database bring-up, node launches and DNS
//! registration are folded into one document with [`OutputDocument::merge`]:
//! objects merge key by key, arrays concatenate, and equal scalars are
//! accepted. Anything else is a [`MergeConflict`], since fragments of
//! different instances are expected to be disjoint.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::MergeConflict;

pub const DOCKER_IDS: &str = "docker_ids";
pub const DOMAINS: &str = "domains";
pub const DOMAIN_MAPPINGS: &str = "domain_mappings";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputDocument(Map<String, Value>);

impl OutputDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a top-level key.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder-style insert of a top-level list of strings.
    #[must_use]
    pub fn with_list<I, S>(self, key: impl Into<String>, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let items: Vec<Value> = items.into_iter().map(|s| Value::String(s.into())).collect();
        self.with(key, Value::Array(items))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Follows a path of object keys.
    #[must_use]
    pub fn pointer(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        rest.iter()
            .try_fold(self.0.get(*first)?, |value, key| value.get(*key))
    }

    /// String entries of a top-level list, empty when the key is absent.
    #[must_use]
    pub fn strings(&self, key: &str) -> Vec<&str> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Deep-merges `other` into `self`.
    ///
    /// On conflict `self` may already hold part of `other`; the caller is
    /// expected to abort.
    pub fn merge(&mut self, other: OutputDocument) -> Result<(), MergeConflict> {
        merge_maps(&mut self.0, other.0, "")
    }

    pub fn merged(mut self, other: OutputDocument) -> Result<Self, MergeConflict> {
        self.merge(other)?;
        Ok(self)
    }
}

impl From<Map<String, Value>> for OutputDocument {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn merge_maps(
    into: &mut Map<String, Value>,
    from: Map<String, Value>,
    path: &str,
) -> Result<(), MergeConflict> {
    for (key, value) in from {
        let child_path = if path.is_empty() {
            key.clone()
        } else {
            format!("{path}.{key}")
        };
        match into.get_mut(&key) {
            Some(existing) => merge_values(existing, value, &child_path)?,
            None => {
                into.insert(key, value);
            }
        }
    }
    Ok(())
}

fn merge_values(existing: &mut Value, incoming: Value, path: &str) -> Result<(), MergeConflict> {
    match (existing, incoming) {
        (Value::Object(into), Value::Object(from)) => merge_maps(into, from, path),
        (Value::Array(into), Value::Array(from)) => {
            into.extend(from);
            Ok(())
        }
        (current, incoming) if *current == incoming => Ok(()),
        _ => Err(MergeConflict {
            path: path.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> OutputDocument {
        match value {
            Value::Object(map) => OutputDocument::from(map),
            other => panic!("fixture must be an object, got {other}"),
        }
    }

    #[test]
    fn lists_concatenate_and_maps_merge() {
        let mut out = doc(json!({
            "docker_ids": ["a"],
            "domains": { "c1.1.dev": { "a": ["10.0.0.1"], "ns": [] } }
        }));
        out.merge(doc(json!({
            "docker_ids": ["b"],
            "domains": { "c2.1.dev": { "a": ["10.0.0.2"], "ns": [] } }
        })))
        .unwrap();

        assert_eq!(out.strings(DOCKER_IDS), vec!["a", "b"]);
        assert!(out.pointer(&[DOMAINS, "c1.1.dev"]).is_some());
        assert!(out.pointer(&[DOMAINS, "c2.1.dev"]).is_some());
    }

    #[test]
    fn merge_is_associative() {
        let a = doc(json!({ "docker_ids": ["1"], "domains": { "d1": { "a": ["x"] } } }));
        let b = doc(json!({ "docker_ids": ["2"], "domain_mappings": { "c1": "d1" } }));
        let c = doc(json!({
            "docker_ids": ["3"],
            "domains": { "d1": { "a": ["y"] }, "d2": { "ns": ["z"] } },
            "dns": "10.0.0.9"
        }));

        let left = a
            .clone()
            .merged(b.clone())
            .unwrap()
            .merged(c.clone())
            .unwrap();
        let right = a.merged(b.merged(c).unwrap()).unwrap();

        assert_eq!(left, right);
        assert_eq!(left.strings(DOCKER_IDS), vec!["1", "2", "3"]);
    }

    #[test]
    fn merge_into_empty_preserves_fragment() {
        let fragment = doc(json!({ "docker_ids": ["1"], "dns": "10.0.0.9" }));
        let merged = OutputDocument::new().merged(fragment.clone()).unwrap();
        assert_eq!(merged, fragment);
    }

    #[test]
    fn equal_scalars_are_accepted() {
        let mut out = doc(json!({ "domain_mappings": { "c1": "c1.1.dev" } }));
        out.merge(doc(json!({ "domain_mappings": { "c1": "c1.1.dev" } })))
            .unwrap();
        assert_eq!(
            out.pointer(&[DOMAIN_MAPPINGS, "c1"]),
            Some(&json!("c1.1.dev"))
        );
    }

    #[test]
    fn differing_scalars_fail_with_path() {
        let mut out = doc(json!({ "domain_mappings": { "c1": "c1.1.dev" } }));
        let err = out
            .merge(doc(json!({ "domain_mappings": { "c1": "other.dev" } })))
            .unwrap_err();
        assert_eq!(err.path, "domain_mappings.c1");
    }

    #[test]
    fn shape_mismatch_fails() {
        let mut out = doc(json!({ "docker_ids": ["1"] }));
        let err = out.merge(doc(json!({ "docker_ids": "2" }))).unwrap_err();
        assert_eq!(err.path, "docker_ids");
    }

    #[test]
    fn builders_produce_expected_shape() {
        let out = OutputDocument::new()
            .with_list(DOCKER_IDS, ["c1"])
            .with("dns", "10.0.0.9");
        assert_eq!(
            out.into_value(),
            json!({ "docker_ids": ["c1"], "dns": "10.0.0.9" })
        );
    }
}
