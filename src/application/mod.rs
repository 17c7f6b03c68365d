// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// Orchestrates the other layers; does no key parsing, tensor
// handling or file encoding itself. Collaborators (checkpoint
// store, skeleton builder) are passed in, never looked up.
//
// Reference: Clean Architecture pattern
//            Rust Book §7 (Module System)

// The weight transfer workflow
pub mod transfer_use_case;

// Per-layer checkpoint summary
pub mod inspect_use_case;

// Remap table dry run
pub mod plan_use_case;
