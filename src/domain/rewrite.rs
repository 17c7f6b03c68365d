// ============================================================
// Layer 3 — Checkpoint Rewriter
// ============================================================
// Renames every layer-indexed key through the remap table and
// copies everything else verbatim. Pure: the source checkpoint
// is borrowed, a new one is returned.
//
// Reference: Rust Book §13 (Iterators)

use crate::domain::{
    checkpoint::{Checkpoint, ParameterMap},
    layer_key::{classify, KeyClass},
    remap::RemapTable,
    report::{RewriteStats, Warning},
};

/// Output of `rewrite`.
#[derive(Debug, Clone)]
pub struct Rewritten {
    pub checkpoint: Checkpoint,
    pub stats:      RewriteStats,
    pub warnings:   Vec<Warning>,
}

/// Rename every layer key of `source` through `table`.
/// Never fails: problems become warnings in the result.
pub fn rewrite(source: &Checkpoint, table: &RemapTable, prefix: &str) -> Rewritten {
    let mut parameters = ParameterMap::new();
    let mut stats = RewriteStats::default();
    let mut warnings = Vec::new();

    for (key, tensor) in source.parameters.iter() {
        stats.total += 1;

        let new_key = match classify(key, prefix) {
            KeyClass::Plain => {
                stats.passed_through += 1;
                key.to_string()
            }
            KeyClass::Malformed => {
                warnings.push(Warning::MalformedKey { key: key.to_string() });
                stats.passed_through += 1;
                key.to_string()
            }
            KeyClass::Layer(layer) => match table.get(layer.index) {
                Some(new) => {
                    stats.remapped += 1;
                    layer.with_index(new).to_string()
                }
                None => {
                    warnings.push(Warning::UncoveredIndex {
                        key:   key.to_string(),
                        index: layer.index,
                    });
                    stats.passed_through += 1;
                    key.to_string()
                }
            },
        };

        if parameters.contains_key(&new_key) {
            warnings.push(Warning::KeyCollision {
                key:       new_key,
                discarded: key.to_string(),
            });
            continue;
        }
        parameters.insert(new_key, tensor.clone());
    }

    for w in &warnings {
        w.log();
    }
    tracing::debug!(
        "Rewrote {} keys: {} remapped, {} passed through",
        stats.total, stats.remapped, stats.passed_through
    );

    Rewritten {
        checkpoint: Checkpoint::new(source.metadata.clone(), parameters),
        stats,
        warnings,
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{checkpoint::Metadata, remap::InsertionSpec, tensor::Tensor};

    fn tensor(v: f32) -> Tensor {
        Tensor::from_f32(vec![1], &[v]).unwrap()
    }

    fn ckpt(keys: &[&str]) -> Checkpoint {
        let params = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (*k, tensor(i as f32)))
            .collect();
        let mut meta = Metadata::new();
        meta.insert("epoch".into(), "-1".into());
        Checkpoint::new(meta, params)
    }

    fn table(n: usize, points: &[usize]) -> RemapTable {
        RemapTable::build(n, &InsertionSpec::new(points.to_vec()).unwrap()).unwrap()
    }

    #[test]
    fn test_unshifted_key_is_identical() {
        let src = ckpt(&["model.5.conv.weight"]);
        let out = rewrite(&src, &table(23, &[9, 17, 21, 25]), "model");
        assert!(out.checkpoint.parameters.contains_key("model.5.conv.weight"));
        assert_eq!(out.stats.remapped, 1);
    }

    #[test]
    fn test_shifted_keys_keep_suffix_and_value() {
        let src = ckpt(&["model.9.cv1.conv.weight", "model.22.dfl.conv.weight"]);
        let out = rewrite(&src, &table(23, &[9, 17, 21, 25]), "model");
        let p = &out.checkpoint.parameters;
        assert_eq!(p.get("model.10.cv1.conv.weight"), Some(&tensor(0.0)));
        assert_eq!(p.get("model.26.dfl.conv.weight"), Some(&tensor(1.0)));
        assert!(!p.contains_key("model.9.cv1.conv.weight"));
    }

    #[test]
    fn test_non_layer_key_untouched() {
        let src = ckpt(&["optimizer.state", "model.1.bn.weight"]);
        for points in [vec![], vec![0], vec![1, 2]] {
            let out = rewrite(&src, &table(2, &points), "model");
            assert_eq!(out.checkpoint.parameters.get("optimizer.state"), Some(&tensor(0.0)));
        }
    }

    #[test]
    fn test_only_plain_keys_round_trip() {
        let src = ckpt(&["optimizer.state", "ema.updates", "train_args"]);
        let out = rewrite(&src, &table(4, &[1, 3]), "model");
        assert_eq!(out.checkpoint, src);
        assert_eq!(out.stats.passed_through, 3);
        assert!(out.warnings.is_empty());
    }

    #[test]
    fn test_uncovered_index_passes_through_with_warning() {
        let src = ckpt(&["model.30.conv.weight"]);
        let out = rewrite(&src, &table(23, &[9]), "model");
        assert!(out.checkpoint.parameters.contains_key("model.30.conv.weight"));
        assert_eq!(
            out.warnings,
            vec![Warning::UncoveredIndex { key: "model.30.conv.weight".into(), index: 30 }]
        );
    }

    #[test]
    fn test_malformed_key_passes_through_with_warning() {
        let src = ckpt(&["model.x.weight"]);
        let out = rewrite(&src, &table(3, &[]), "model");
        assert!(out.checkpoint.parameters.contains_key("model.x.weight"));
        assert!(matches!(out.warnings[0], Warning::MalformedKey { .. }));
    }

    #[test]
    fn test_collision_keeps_first() {
        // model.1 → model.2, and uncovered model.2 would land on the same key
        let src = ckpt(&["model.1.w", "model.2.w"]);
        let out = rewrite(&src, &table(2, &[0]), "model");
        // table: 0→1, 1→2; model.2 is uncovered (only 2 source layers)
        assert_eq!(out.checkpoint.parameters.get("model.2.w"), Some(&tensor(0.0)));
        assert_eq!(out.checkpoint.parameters.len(), 1);
        assert!(out.warnings.iter().any(|w| matches!(w, Warning::KeyCollision { .. })));
    }

    #[test]
    fn test_counters_add_up() {
        let src = ckpt(&["model.0.w", "model.1.w", "model.40.w", "meta"]);
        let out = rewrite(&src, &table(2, &[1]), "model");
        assert_eq!(out.stats.total, 4);
        assert_eq!(out.stats.remapped, 2);
        assert_eq!(out.stats.passed_through, 2);
    }

    #[test]
    fn test_metadata_copied() {
        let src = ckpt(&["model.0.w"]);
        let out = rewrite(&src, &table(1, &[0]), "model");
        assert_eq!(out.checkpoint.metadata, src.metadata);
    }
}
