// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Immutable global state tree with structural sharing.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::error::FluxError;

/// Immutable associative container keyed by store name.
///
/// Cloning is a reference-count bump. [`StateTree::set`] produces a new
/// container whose untouched entries are `Arc::ptr_eq` to the old ones, so
/// "did slice `k` change" is a pointer comparison.
pub struct StateTree<K, V> {
    entries: Arc<BTreeMap<K, Arc<V>>>,
}

impl<K, V> Clone for StateTree<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<K: Ord, V> Default for StateTree<K, V> {
    fn default() -> Self {
        Self {
            entries: Arc::new(BTreeMap::new()),
        }
    }
}

impl<K: Ord + Clone, V> StateTree<K, V> {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Slice stored under `key`, if any.
    pub fn get(&self, key: &K) -> Option<&Arc<V>> {
        self.entries.get(key)
    }

    /// Returns `true` when `key` has a slice.
    pub fn contains_key(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of slices.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the tree holds no slices.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.entries.keys()
    }

    /// `(key, slice)` pairs in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<V>)> + '_ {
        self.entries.iter()
    }

    /// Returns a tree with `key` mapped to `value`.
    ///
    /// Every other entry is shared with `self`. When `value` is already the
    /// slice stored under `key` the same container is returned.
    pub fn set(&self, key: K, value: Arc<V>) -> Self {
        if self
            .entries
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, &value))
        {
            return self.clone();
        }
        let mut next = BTreeMap::clone(&self.entries);
        next.insert(key, value);
        Self {
            entries: Arc::new(next),
        }
    }

    /// Container identity.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.entries, &b.entries)
    }

    /// Returns `true` when both trees hold the very same slice for `key`
    /// (or both lack it).
    pub fn shares_slice(&self, other: &Self, key: &K) -> bool {
        match (self.get(key), other.get(key)) {
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<K, V> StateTree<K, V>
where
    K: Ord + Clone + FromStr,
    K::Err: fmt::Display,
    V: DeserializeOwned,
{
    /// Builds a tree from a plain JSON object (`{"<store>": <slice>, ...}`).
    pub fn from_json(value: serde_json::Value) -> Result<Self, FluxError> {
        let serde_json::Value::Object(map) = value else {
            return Err(FluxError::InitialState(
                "initial state must be a JSON object".into(),
            ));
        };
        let mut entries = BTreeMap::new();
        for (raw_key, raw_slice) in map {
            let key = K::from_str(&raw_key)
                .map_err(|e| FluxError::InitialState(format!("key `{raw_key}`: {e}")))?;
            let slice = serde_json::from_value(raw_slice)
                .map_err(|e| FluxError::InitialState(format!("slice `{raw_key}`: {e}")))?;
            entries.insert(key, Arc::new(slice));
        }
        Ok(Self {
            entries: Arc::new(entries),
        })
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for StateTree<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: Arc::new(iter.into_iter().map(|(k, v)| (k, Arc::new(v))).collect()),
        }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for StateTree<K, V> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries) || self.entries == other.entries
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for StateTree<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}
