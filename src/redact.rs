//! Field redaction shared by the web and task adapters.
//!
//! Two operations, both pure:
//! - [`filter_map`] replaces the value of every filtered key with [`FILTERED`]
//! - [`omit_keys`] drops excluded keys entirely
//!
//! Matching is exact, case-sensitive key equality. There is no substring or
//! pattern matching: a filter of `password` leaves `password_confirmation`
//! untouched unless it is listed too.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::payload::ContextMap;

/// Marker that replaces the value of a filtered field.
pub const FILTERED: &str = "[FILTERED]";

/// Set of field names whose values must never reach the reporting service.
///
/// # Examples
///
/// ```
/// use faultline::RedactionSet;
///
/// let filters: RedactionSet = ["password", "skip"].into_iter().collect();
/// assert!(filters.contains("password"));
/// assert!(!filters.contains("Password"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedactionSet {
    fields: BTreeSet<String>,
}

impl RedactionSet {
    /// Creates an empty set. Nothing is filtered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field name to the set.
    pub fn insert(&mut self, field: impl Into<String>) {
        self.fields.insert(field.into());
    }

    /// Returns true if `field` must be filtered.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    /// Returns the number of filtered field names.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no field is filtered.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the filtered field names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for RedactionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Returns a copy of `map` with every filtered key's value replaced by [`FILTERED`].
///
/// The whole value is replaced whatever its shape (list, string, object).
/// Keys not in `filters` pass through unchanged. Filtering an already
/// filtered map is a no-op.
///
/// # Examples
///
/// ```
/// use faultline::{filter_map, RedactionSet, FILTERED};
/// use serde_json::{json, Map, Value};
///
/// let mut params = Map::new();
/// params.insert("password".to_string(), json!(["qwerty"]));
/// params.insert("foo".to_string(), json!(["bar"]));
///
/// let filters: RedactionSet = ["password"].into_iter().collect();
/// let filtered = filter_map(&params, &filters);
///
/// assert_eq!(filtered["password"], Value::from(FILTERED));
/// assert_eq!(filtered["foo"], json!(["bar"]));
/// ```
pub fn filter_map(map: &ContextMap, filters: &RedactionSet) -> ContextMap {
    map.iter()
        .map(|(key, value)| {
            if filters.contains(key) {
                (key.clone(), Value::String(FILTERED.to_string()))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

/// Returns a copy of `map` without any key listed in `excluded`.
///
/// Used for request headers: excluded headers are omitted, not masked, so
/// their presence does not leak either.
pub fn omit_keys<V: Clone>(
    map: &BTreeMap<String, V>,
    excluded: &BTreeSet<String>,
) -> BTreeMap<String, V> {
    map.iter()
        .filter(|(key, _)| !excluded.contains(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}
