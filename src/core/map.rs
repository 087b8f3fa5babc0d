//! Validated starter → suffix mapping produced by the stability search.
//!
//! A [`StabilityMap`] records, for every surviving starter, the list of
//! 2-character suffixes (digit + lowercase letter) whose concatenation
//! tokenizes as a stable, relocatable token triple under all probe contexts.
//!
//! The map is built once (expensive, cacheable) and read-only thereafter.
//! Internally a `BTreeMap` keeps iteration and the persisted JSON
//! deterministic; the serialized form is a plain JSON object,
//! e.g. `{"Zq": ["3f", "9k"]}`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Mapping from identifier starter to its tokenizer-stable suffixes.
///
/// Invariants maintained by the generator: every key has at least one
/// suffix, and all keys share one fixed length. [`StabilityMap::starter_len`]
/// reports that length, or `None` when either invariant cannot be observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StabilityMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl StabilityMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a starter with its surviving suffixes.
    pub fn insert(&mut self, starter: String, suffixes: Vec<String>) {
        self.entries.insert(starter, suffixes);
    }

    /// Number of starters in the map.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no starters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether the map contains the given starter.
    pub fn contains(&self, starter: &str) -> bool {
        self.entries.contains_key(starter)
    }

    /// Iterate over starters in sorted order.
    pub fn starters(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Suffixes recorded for a starter, if present.
    pub fn suffixes(&self, starter: &str) -> Option<&[String]> {
        self.entries.get(starter).map(Vec::as_slice)
    }

    /// The common starter length, when all keys agree on one.
    ///
    /// Returns `None` for an empty map or when key lengths disagree.
    pub fn starter_len(&self) -> Option<usize> {
        let mut keys = self.entries.keys();
        let len = keys.next()?.chars().count();
        if keys.all(|k| k.chars().count() == len) {
            Some(len)
        } else {
            None
        }
    }

    /// Iterate over `(starter, suffixes)` pairs in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_slice()))
    }
}

impl FromIterator<(String, Vec<String>)> for StabilityMap {
    fn from_iter<I: IntoIterator<Item = (String, Vec<String>)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> StabilityMap {
        let mut map = StabilityMap::new();
        map.insert("Zq".to_string(), vec!["3f".to_string(), "9k".to_string()]);
        map.insert("Xw".to_string(), vec!["0a".to_string()]);
        map
    }

    #[test]
    fn test_basic_accessors() {
        let map = sample();
        assert_eq!(map.len(), 2);
        assert!(map.contains("Zq"));
        assert_eq!(map.suffixes("Zq").unwrap(), &["3f", "9k"]);
        assert!(map.suffixes("Qq").is_none());
        assert_eq!(map.starter_len(), Some(2));
    }

    #[test]
    fn test_starter_len_empty_and_mixed() {
        assert_eq!(StabilityMap::new().starter_len(), None);

        let mut map = sample();
        map.insert("Abc".to_string(), vec!["1b".to_string()]);
        assert_eq!(map.starter_len(), None);
    }

    #[test]
    fn test_serde_is_plain_object() {
        let map = sample();
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"Xw":["0a"],"Zq":["3f","9k"]}"#);

        let back: StabilityMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
