// ============================================================
// Layer 3 — Checkpoint Domain Type
// ============================================================
// A checkpoint is a tagged structure:
//
//   Checkpoint {
//       metadata:   string → string, opaque, copied verbatim
//       parameters: ordered key → tensor mapping
//   }
//
// Metadata carries whatever the training side stored (epoch,
// optimizer state, dataset name ...). Nothing here interprets it.
//
// Parameter order is the order keys were inserted, which for a
// loaded file is the on-disk order of the tensors.
//
// Reference: Rust Book §8 (Vectors, Hash Maps)

use std::collections::{BTreeMap, HashMap};

use crate::domain::tensor::Tensor;

/// Opaque auxiliary metadata.
pub type Metadata = BTreeMap<String, String>;

/// Insertion-ordered map from parameter key to tensor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    entries: Vec<(String, Tensor)>,
    index:   HashMap<String, usize>,
}

impl ParameterMap {
    /// An empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. A replaced key keeps its original position.
    /// Returns the previous tensor if the key was present.
    pub fn insert(&mut self, key: impl Into<String>, tensor: Tensor) -> Option<Tensor> {
        let key = key.into();
        match self.index.get(&key) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos].1, tensor)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, tensor));
                None
            }
        }
    }

    /// Tensor stored under `key`.
    pub fn get(&self, key: &str) -> Option<&Tensor> {
        self.index.get(key).map(|&pos| &self.entries[pos].1)
    }

    /// True if `key` has a tensor.
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of tensors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the map holds no tensors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(key, tensor)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tensor)> {
        self.entries.iter().map(|(k, t)| (k.as_str(), t))
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl IntoIterator for ParameterMap {
    type Item = (String, Tensor);
    type IntoIter = std::vec::IntoIter<(String, Tensor)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Tensor)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (K, Tensor)>>(iter: I) -> Self {
        let mut map = ParameterMap::new();
        for (k, t) in iter {
            map.insert(k, t);
        }
        map
    }
}

/// A parameter snapshot plus its auxiliary metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Checkpoint {
    pub metadata:   Metadata,
    pub parameters: ParameterMap,
}

impl Checkpoint {
    /// Assemble a checkpoint from its two parts.
    pub fn new(metadata: Metadata, parameters: ParameterMap) -> Self {
        Self { metadata, parameters }
    }

    /// Total scalar parameter count across all tensors
    pub fn parameter_count(&self) -> usize {
        self.parameters.iter().map(|(_, t)| t.numel()).sum()
    }
}
