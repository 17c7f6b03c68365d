// ============================================================
// Layer 3 — Transfer Report
// ============================================================
// Recoverable conditions never abort a transfer. They are
// collected here and handed back to the caller, so tests and
// scripts can assert on counts instead of scraping logs.

use serde::{Deserialize, Serialize};

/// A recoverable condition met while remapping or merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Key is under the layer prefix but its index segment is
    /// not a valid non-negative integer. Passed through.
    MalformedKey { key: String },

    /// Layer index has no entry in the remap table. Passed
    /// through with its original index.
    UncoveredIndex { key: String, index: usize },

    /// Two source keys produced the same output key; the
    /// later one was discarded.
    KeyCollision { key: String, discarded: String },

    /// Source tensor does not fit the skeleton slot. The
    /// skeleton value was kept.
    ShapeMismatch {
        key:          String,
        source_shape: Vec<usize>,
        target_shape: Vec<usize>,
        source_dtype: String,
        target_dtype: String,
    },

    /// Layer key with no slot in the skeleton. Dropped.
    UnmatchedKey { key: String },
}

impl Warning {
    /// Log at warn level. Every warning is logged once as it is recorded.
    pub fn log(&self) {
        match self {
            Warning::MalformedKey { key } => {
                tracing::warn!("Malformed layer key '{}', passing through unchanged", key)
            }
            Warning::UncoveredIndex { key, index } => {
                tracing::warn!("Layer {} of '{}' has no remap entry, keeping original index", index, key)
            }
            Warning::KeyCollision { key, discarded } => {
                tracing::warn!("'{}' would overwrite '{}', discarding it", discarded, key)
            }
            Warning::ShapeMismatch { key, source_shape, target_shape, .. } => {
                tracing::warn!(
                    "Shape mismatch on '{}': source {:?} vs target {:?}, keeping target value",
                    key, source_shape, target_shape
                )
            }
            Warning::UnmatchedKey { key } => {
                tracing::warn!("'{}' has no slot in the target network, dropping it", key)
            }
        }
    }
}

/// Counters from the key-rewriting pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteStats {
    /// Source keys examined
    pub total:          usize,
    /// Layer keys written under their new index
    pub remapped:       usize,
    /// Keys copied with their name unchanged
    pub passed_through: usize,
}

/// Counters from the merge onto the target skeleton.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeStats {
    /// Skeleton slots overwritten with source tensors
    pub applied:         usize,
    /// Source tensors refused because of dtype/shape
    pub mismatched:      usize,
    /// Layer keys with no skeleton slot
    pub dropped:         usize,
    /// Non-layer keys added to the output as-is
    pub carried:         usize,
    /// Skeleton slots nothing was written to
    pub kept_initialized: usize,
}

/// Everything a caller needs to judge a transfer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferReport {
    pub rewrite:  RewriteStats,
    pub merge:    MergeStats,
    pub warnings: Vec<Warning>,
}

impl TransferReport {
    /// Number of warnings matching `pred`.
    pub fn count<F: Fn(&Warning) -> bool>(&self, pred: F) -> usize {
        self.warnings.iter().filter(|w| pred(w)).count()
    }
}
