// ============================================================
// Layer 5 — ML Layer (Burn)
// ============================================================
// The only place that imports burn. The detector itself is
// trained elsewhere; this crate only needs a freshly
// initialised copy of the target network's parameters so that
// inserted layers have something to start from.
//
//   skeleton.rs — NetworkDescription → random-init Checkpoint
//                 on any Burn backend (NdArray on the CLI path)

/// Target network skeleton initialisation
pub mod skeleton;
