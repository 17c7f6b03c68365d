// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Pure types and transforms for checkpoint weight transfer.
//
// Rules for this layer:
//   - NO Burn framework types
//   - NO file I/O
//   - Only plain Rust structs, enums, functions and traits
//
// The transfer pipeline in domain terms:
//
//   source Checkpoint ──rewrite(RemapTable)──▶ remapped Checkpoint
//                                                   │
//   skeleton Checkpoint ◀───────merge_into──────────┘
//          │
//          ▼
//   output Checkpoint + TransferReport

/// Tensor values and dtypes
pub mod tensor;

/// Checkpoint = opaque metadata + ordered parameters
pub mod checkpoint;

/// `<prefix>.<index>.<suffix>` key parsing
pub mod layer_key;

/// Insertion spec → old/new layer index table
pub mod remap;

/// Key rewriting through a remap table
pub mod rewrite;

/// Non-strict merge onto a target skeleton
pub mod merge;

/// Structural description of a target network
pub mod network;

/// Warnings and counters returned to the caller
pub mod report;

/// Fatal error taxonomy
pub mod error;

// Collaborator abstractions implemented by infra and ml
pub mod traits;
