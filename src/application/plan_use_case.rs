// ============================================================
// Layer 2 — Plan (dry run)
// ============================================================
// Shows the remap table an insertion spec produces without
// touching any checkpoint, e.g. for 23 layers and [9, 17, 21, 25]:
//
//     old → new
//       0 → 0
//     ...
//       9 → 10   (+1)
//     ...
//   reserved: 9, 17, 21, 25

use anyhow::Result;

use crate::domain::remap::{InsertionSpec, RemapTable};

/// Validate `insertions` and build the table for `source_layers`.
pub fn build_plan(source_layers: usize, insertions: Vec<usize>) -> Result<RemapTable> {
    let spec = InsertionSpec::new(insertions)?;
    Ok(RemapTable::build(source_layers, &spec)?)
}

/// One `old → new` line per source layer, then the reserved slots.
pub fn render_plan(table: &RemapTable) -> String {
    let mut out = format!("{:>5} → {:<5}\n", "old", "new");
    for (old, new) in table.iter() {
        match table.shift(old) {
            Some(shift) if shift > 0 => out.push_str(&format!("{old:>5} → {new:<5} (+{shift})\n")),
            _ => out.push_str(&format!("{old:>5} → {new:<5}\n")),
        }
    }
    let reserved: Vec<String> = table.reserved().iter().map(|r| r.to_string()).collect();
    out.push_str(&format!("reserved: {}", reserved.join(", ")));
    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::TransferError;

    #[test]
    fn test_render_marks_shifted_layers() {
        let table = build_plan(3, vec![1]).unwrap();
        let text = render_plan(&table);
        assert!(text.contains("    0 → 0    \n"));
        assert!(text.contains("    1 → 2     (+1)"));
        assert!(text.ends_with("reserved: 1"));
    }

    #[test]
    fn test_invalid_spec_is_reported() {
        let err = build_plan(3, vec![2, 1]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TransferError>(),
            Some(TransferError::InvalidInsertionSpec(_))
        ));
    }
}
