// ============================================================
// Layer 6 — Path Guards
// ============================================================
// The pretrained checkpoint is usually the only good copy of
// the weights. Before anything is written, the destination is
// compared against every input path after canonicalisation, so
// `./a.pt`, `a.pt` and a symlink to it all count as the same.
//
// Every path the run writes is checked:
//   destination  vs  source, skeleton
//   report       vs  source, skeleton, destination
//
// Reference: std::fs::canonicalize documentation

use std::path::{Path, PathBuf};

use crate::domain::error::TransferError;

/// Fail with `SourceNotFound` unless `path` is an existing file.
pub fn ensure_source_exists(path: &Path) -> Result<(), TransferError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(TransferError::SourceNotFound(path.to_path_buf()))
    }
}

/// Fail with `DestinationCollision` if `destination` resolves to
/// any of `inputs`.
pub fn ensure_distinct(destination: &Path, inputs: &[&Path]) -> Result<(), TransferError> {
    let dest = resolve(destination);
    for input in inputs {
        if resolve(input) == dest {
            return Err(TransferError::DestinationCollision {
                destination: destination.to_path_buf(),
                input:       input.to_path_buf(),
            });
        }
    }
    Ok(())
}

/// Canonical form of `path`. A path that does not exist yet is
/// resolved through its parent directory.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(p) = path.canonicalize() {
        return p;
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}
