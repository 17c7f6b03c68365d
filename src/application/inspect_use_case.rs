// ============================================================
// Layer 2 — InspectUseCase
// ============================================================
// Summarises a checkpoint layer by layer. Handy for working out
// insertion points: compare the layer lists of the baseline and
// the target and look for where the indices start to drift.
//
// Reference: Rust Book §8 (Hash Maps), §10 (Traits: Display)

use anyhow::{Context, Result};
use serde::Serialize;
use std::{collections::BTreeMap, fmt, path::Path};

use crate::domain::{
    checkpoint::Checkpoint,
    layer_key::{classify, KeyClass},
    traits::CheckpointStore,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerSummary {
    pub index:      usize,
    pub tensors:    usize,
    pub parameters: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CheckpointSummary {
    pub layers:           Vec<LayerSummary>,
    /// Keys outside the layer prefix (or with a malformed index)
    pub other_keys:       Vec<String>,
    pub total_tensors:    usize,
    pub total_parameters: usize,
    pub metadata_keys:    Vec<String>,
}

impl CheckpointSummary {
    /// Group the tensors of `ckpt` by layer index.
    pub fn from_checkpoint(ckpt: &Checkpoint, prefix: &str) -> Self {
        let mut layers: BTreeMap<usize, LayerSummary> = BTreeMap::new();
        let mut other_keys = Vec::new();

        for (key, tensor) in ckpt.parameters.iter() {
            match classify(key, prefix) {
                KeyClass::Layer(layer) => {
                    let entry = layers.entry(layer.index).or_insert_with(|| LayerSummary {
                        index: layer.index,
                        ..LayerSummary::default()
                    });
                    entry.tensors += 1;
                    entry.parameters += tensor.numel();
                }
                KeyClass::Plain | KeyClass::Malformed => other_keys.push(key.to_string()),
            }
        }

        Self {
            layers: layers.into_values().collect(),
            other_keys,
            total_tensors: ckpt.parameters.len(),
            total_parameters: ckpt.parameter_count(),
            metadata_keys: ckpt.metadata.keys().cloned().collect(),
        }
    }
}

impl fmt::Display for CheckpointSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>6}  {:>8}  {:>12}", "layer", "tensors", "parameters")?;
        for l in &self.layers {
            writeln!(f, "{:>6}  {:>8}  {:>12}", l.index, l.tensors, l.parameters)?;
        }
        if !self.other_keys.is_empty() {
            writeln!(f, "other keys: {}", self.other_keys.join(", "))?;
        }
        if !self.metadata_keys.is_empty() {
            writeln!(f, "metadata:   {}", self.metadata_keys.join(", "))?;
        }
        write!(
            f,
            "total: {} tensors, {} parameters",
            self.total_tensors, self.total_parameters
        )
    }
}

pub struct InspectUseCase<S> {
    store:  S,
    prefix: String,
}

impl<S: CheckpointStore> InspectUseCase<S> {
    /// Create an inspector reading through `store`.
    pub fn new(store: S, prefix: impl Into<String>) -> Self {
        Self { store, prefix: prefix.into() }
    }

    /// Load the checkpoint at `path` and summarise it.
    pub fn summarize(&self, path: &Path) -> Result<CheckpointSummary> {
        let ckpt = self
            .store
            .load(path)
            .with_context(|| format!("Cannot load checkpoint '{}'", path.display()))?;
        let summary = CheckpointSummary::from_checkpoint(&ckpt, &self.prefix);
        tracing::debug!(
            "'{}': {} layers with parameters",
            path.display(),
            summary.layers.len()
        );
        Ok(summary)
    }
}
