// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// The transfer workflow talks to its collaborators only
// through these traits:
//   - SafetensorsStore implements CheckpointStore
//   - BurnSkeletonBuilder implements SkeletonBuilder

use std::path::Path;

use crate::domain::{
    checkpoint::Checkpoint, error::TransferError, network::NetworkDescription,
};

// ─── CheckpointStore ──────────────────────────────────────────────────────────
/// Reads and writes checkpoint files.
pub trait CheckpointStore {
    fn load(&self, path: &Path) -> Result<Checkpoint, TransferError>;

    /// Write `checkpoint` to `path`. Either the whole file is written
    /// or nothing is.
    fn save(&self, checkpoint: &Checkpoint, path: &Path) -> Result<(), TransferError>;
}

// ─── SkeletonBuilder ──────────────────────────────────────────────────────────
/// Produces a freshly initialised checkpoint for a network structure.
pub trait SkeletonBuilder {
    fn build(&self, description: &NetworkDescription) -> Result<Checkpoint, TransferError>;
}
