// ============================================================
// Layer 6 — Report Writer
// ============================================================
// Persists a TransferReport as pretty JSON so a run can be
// inspected afterwards (which keys were dropped, which tensors
// kept their random init because of a shape mismatch).
//
// The JSON is rendered before the checkpoint is saved, and the
// file itself is staged in a temp file and renamed into place,
// the same way checkpoint_store.rs writes weights.
//
// Example output:
//   {
//     "rewrite":  { "total": 355, "remapped": 355, "passed_through": 0 },
//     "merge":    { "applied": 331, "mismatched": 24, ... },
//     "warnings": [ { "kind": "shape_mismatch", "key": "model.26.cv3.0.2.weight", ... } ]
//   }
//
// Reference: serde_json documentation
//            tempfile crate (NamedTempFile::persist)

use anyhow::{Context, Result};
use std::{fs, io::Write, path::Path};
use tempfile::NamedTempFile;

use crate::domain::report::TransferReport;

/// Render `report` as the pretty JSON document `write_report` stores.
pub fn render_report(report: &TransferReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Cannot serialise transfer report")
}

/// Write an already rendered report to `path`, creating parent
/// directories as needed. The file is staged next to `path` and
/// renamed into place, so a failed write leaves no partial report.
pub fn write_report(json: &str, path: &Path) -> Result<()> {
    let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create report directory '{}'", dir.display()))?;
            dir
        }
        None => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Cannot stage report in '{}'", dir.display()))?;
    tmp.write_all(json.as_bytes())
        .with_context(|| format!("Cannot write report to '{}'", path.display()))?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Cannot write report to '{}'", path.display()))?;

    tracing::debug!("Saved transfer report to '{}'", path.display());
    Ok(())
}

#[cfg(test)]
pub fn read_report(path: &Path) -> Result<TransferReport> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Cannot read report from '{}'", path.display()))?;
    Ok(serde_json::from_str(&json)?)
}
