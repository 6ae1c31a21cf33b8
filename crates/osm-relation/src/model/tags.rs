//! Key/value tags of one element version.

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

/// Tags of one element version, keyed uniquely.
///
/// Iteration follows insertion order. Equality compares the tags as a map,
/// independent of order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet {
    entries: IndexMap<String, String, FxBuildHasher>,
}

impl TagSet {
    /// Creates an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty tag set with room for `capacity` tags.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity_and_hasher(capacity, FxBuildHasher),
        }
    }

    /// Adds a tag unless the key is already present.
    ///
    /// Returns `false` and leaves the set untouched when the key exists.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        match self.entries.entry(key.into()) {
            indexmap::map::Entry::Occupied(_) => false,
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(value.into());
                true
            }
        }
    }

    /// Sets a tag, replacing any previous value. Returns the old value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.entries.insert(key.into(), value.into())
    }

    /// Looks up the value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the tags ordered by key.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut tags: Vec<_> = self.iter().collect();
        tags.sort_unstable_by(|a, b| a.0.cmp(b.0));
        tags
    }
}

impl<'a> IntoIterator for &'a TagSet {
    type Item = (&'a str, &'a str);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a str)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
