// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Everything that touches the filesystem:
//
//   checkpoint_store.rs — SafeTensors-layout container I/O,
//                         atomic temp-file-then-rename writes
//
//   paths.rs            — source existence and destination
//                         collision checks, run before any write
//
//   report_writer.rs    — TransferReport as JSON on disk

/// Checkpoint container encoding and file persistence
pub mod checkpoint_store;

/// Input/output path guards
pub mod paths;

/// Transfer report JSON persistence
pub mod report_writer;
