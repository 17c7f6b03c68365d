// ============================================================
// Layer 3 — Non-strict Merge
// ============================================================
// Lays the remapped source checkpoint over a freshly initialised
// target skeleton. The skeleton decides which slots exist:
//
//   source key in skeleton, same dtype+shape  → overwrite
//   source key in skeleton, different         → MismatchPolicy
//   layer key not in skeleton                 → drop, warn
//   plain key not in skeleton                 → carry over
//
// Skeleton keys the source never touches keep their initial
// values. This is how inserted layers keep a random init.
//
// Reference: Rust Book §18 (Patterns and Matching)

use serde::{Deserialize, Serialize};

use crate::domain::{
    checkpoint::Checkpoint,
    error::TransferError,
    layer_key::{classify, KeyClass},
    report::{MergeStats, Warning},
};

/// What to do with a source tensor whose dtype or shape does not
/// match its skeleton slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Keep the skeleton value and report the key.
    #[default]
    Skip,
    /// Abort the whole transfer.
    Fail,
}

#[derive(Debug, Clone)]
pub struct Merged {
    pub checkpoint: Checkpoint,
    pub stats:      MergeStats,
    pub warnings:   Vec<Warning>,
}

/// Merge `source` onto `skeleton`. Both are consumed; the result is
/// a new checkpoint.
pub fn merge_into(
    skeleton: Checkpoint,
    source:   Checkpoint,
    prefix:   &str,
    policy:   MismatchPolicy,
) -> Result<Merged, TransferError> {
    let mut out = skeleton;
    let mut stats = MergeStats::default();
    let mut warnings = Vec::new();
    let mut touched = 0usize;

    for (key, tensor) in source.parameters {
        match out.parameters.get(&key) {
            Some(slot) if slot.is_compatible_with(&tensor) => {
                out.parameters.insert(key, tensor);
                stats.applied += 1;
                touched += 1;
            }
            Some(slot) => {
                let source_shape = tensor.shape().to_vec();
                let target_shape = slot.shape().to_vec();
                let source_dtype = tensor.dtype().to_string();
                let target_dtype = slot.dtype().to_string();
                if policy == MismatchPolicy::Fail {
                    return Err(TransferError::ShapeMismatch {
                        key,
                        source_shape,
                        source_dtype,
                        target_shape,
                        target_dtype,
                    });
                }
                warnings.push(Warning::ShapeMismatch {
                    key,
                    source_shape,
                    target_shape,
                    source_dtype,
                    target_dtype,
                });
                stats.mismatched += 1;
            }
            None => match classify(&key, prefix) {
                KeyClass::Layer(_) => {
                    warnings.push(Warning::UnmatchedKey { key });
                    stats.dropped += 1;
                }
                KeyClass::Plain | KeyClass::Malformed => {
                    out.parameters.insert(key, tensor);
                    stats.carried += 1;
                }
            },
        }
    }

    // Mismatched slots were not written either.
    let skeleton_slots = out.parameters.len() - stats.carried;
    stats.kept_initialized = skeleton_slots - touched;

    // Source metadata wins; skeleton-only entries survive.
    out.metadata.extend(source.metadata);

    for w in &warnings {
        w.log();
    }
    tracing::debug!(
        "Merged: {} applied, {} mismatched, {} dropped, {} carried, {} kept initialised",
        stats.applied, stats.mismatched, stats.dropped, stats.carried, stats.kept_initialized
    );

    Ok(Merged { checkpoint: out, stats, warnings })
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        checkpoint::{Metadata, ParameterMap},
        tensor::Tensor,
    };

    fn t(shape: &[usize], v: f32) -> Tensor {
        let n = shape.iter().product();
        Tensor::from_f32(shape.to_vec(), &vec![v; n]).unwrap()
    }

    fn ckpt(entries: Vec<(&str, Tensor)>) -> Checkpoint {
        Checkpoint::new(Metadata::new(), entries.into_iter().collect::<ParameterMap>())
    }

    #[test]
    fn test_compatible_slots_overwritten_and_inserted_layers_kept() {
        let skeleton = ckpt(vec![
            ("model.0.w", t(&[2], 0.5)),
            ("model.1.w", t(&[2], 0.5)), // inserted layer
            ("model.2.w", t(&[2], 0.5)),
        ]);
        let source = ckpt(vec![("model.0.w", t(&[2], 1.0)), ("model.2.w", t(&[2], 2.0))]);

        let m = merge_into(skeleton, source, "model", MismatchPolicy::Skip).unwrap();
        let p = &m.checkpoint.parameters;
        assert_eq!(p.get("model.0.w"), Some(&t(&[2], 1.0)));
        assert_eq!(p.get("model.1.w"), Some(&t(&[2], 0.5)));
        assert_eq!(p.get("model.2.w"), Some(&t(&[2], 2.0)));
        assert_eq!(m.stats.applied, 2);
        assert_eq!(m.stats.kept_initialized, 1);
        assert!(m.warnings.is_empty());
    }

    #[test]
    fn test_shape_mismatch_skipped() {
        let skeleton = ckpt(vec![("model.22.cls.weight", t(&[1, 64], 0.0))]);
        let source = ckpt(vec![("model.22.cls.weight", t(&[80, 64], 1.0))]);

        let m = merge_into(skeleton, source, "model", MismatchPolicy::Skip).unwrap();
        assert_eq!(m.checkpoint.parameters.get("model.22.cls.weight"), Some(&t(&[1, 64], 0.0)));
        assert_eq!(m.stats.mismatched, 1);
        assert_eq!(m.stats.kept_initialized, 1);
        assert!(matches!(&m.warnings[0], Warning::ShapeMismatch { key, .. } if key == "model.22.cls.weight"));
    }

    #[test]
    fn test_shape_mismatch_fails_under_strict_policy() {
        let skeleton = ckpt(vec![("model.0.w", t(&[3], 0.0))]);
        let source = ckpt(vec![("model.0.w", t(&[4], 0.0))]);
        let err = merge_into(skeleton, source, "model", MismatchPolicy::Fail).unwrap_err();
        assert!(matches!(err, TransferError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_dtype_mismatch_counts_as_mismatch() {
        let skeleton = ckpt(vec![("model.0.w", t(&[2], 0.0))]);
        let f64_tensor = Tensor::from_f64(vec![2], &[1.0, 2.0]).unwrap();
        let source = ckpt(vec![("model.0.w", f64_tensor)]);
        let m = merge_into(skeleton, source, "model", MismatchPolicy::Skip).unwrap();
        assert_eq!(m.stats.mismatched, 1);
    }

    #[test]
    fn test_layer_key_missing_from_skeleton_dropped() {
        let skeleton = ckpt(vec![("model.0.w", t(&[1], 0.0))]);
        let source = ckpt(vec![("model.0.w", t(&[1], 1.0)), ("model.30.w", t(&[1], 1.0))]);

        let m = merge_into(skeleton, source, "model", MismatchPolicy::Skip).unwrap();
        assert!(!m.checkpoint.parameters.contains_key("model.30.w"));
        assert_eq!(m.stats.dropped, 1);
        assert_eq!(m.warnings, vec![Warning::UnmatchedKey { key: "model.30.w".into() }]);
    }

    #[test]
    fn test_plain_key_carried() {
        let skeleton = ckpt(vec![("model.0.w", t(&[1], 0.0))]);
        let source = ckpt(vec![("optimizer.state", t(&[3], 7.0))]);

        let m = merge_into(skeleton, source, "model", MismatchPolicy::Skip).unwrap();
        assert_eq!(m.checkpoint.parameters.get("optimizer.state"), Some(&t(&[3], 7.0)));
        assert_eq!(m.stats.carried, 1);
        assert_eq!(m.stats.kept_initialized, 1);
    }

    #[test]
    fn test_metadata_overlay() {
        let mut skeleton = ckpt(vec![]);
        skeleton.metadata.insert("arch".into(), "cbam".into());
        skeleton.metadata.insert("epoch".into(), "0".into());
        let mut source = ckpt(vec![]);
        source.metadata.insert("epoch".into(), "-1".into());

        let m = merge_into(skeleton, source, "model", MismatchPolicy::Skip).unwrap();
        assert_eq!(m.checkpoint.metadata.get("arch").map(String::as_str), Some("cbam"));
        assert_eq!(m.checkpoint.metadata.get("epoch").map(String::as_str), Some("-1"));
    }
}
