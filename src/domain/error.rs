// ============================================================
// Layer 3 — Domain Errors
// ============================================================
// Fatal conditions that abort a transfer before anything is
// written. Recoverable conditions are NOT errors; they are
// collected as `Warning`s in the report (see report.rs).
//
// Reference: Rust Book §9 (Error Handling)
//            thiserror crate documentation

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransferError {
    /// Insertion points are not strictly increasing or fall
    /// outside the target layer list.
    #[error("invalid insertion spec: {0}")]
    InvalidInsertionSpec(String),

    /// The output path would overwrite one of the inputs.
    #[error("destination '{}' is also an input ('{}')", .destination.display(), .input.display())]
    DestinationCollision {
        destination: PathBuf,
        input:       PathBuf,
    },

    #[error("source checkpoint not found: '{}'", .0.display())]
    SourceNotFound(PathBuf),

    /// Only raised under `MismatchPolicy::Fail`.
    #[error("shape mismatch on '{key}': source {source_shape:?} {source_dtype}, target {target_shape:?} {target_dtype}")]
    ShapeMismatch {
        key:          String,
        source_shape: Vec<usize>,
        source_dtype: String,
        target_shape: Vec<usize>,
        target_dtype: String,
    },

    /// The checkpoint container could not be decoded or encoded.
    #[error("malformed checkpoint: {0}")]
    Format(String),

    #[error("invalid network description: {0}")]
    Description(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
