// ============================================================
// Layer 3 — Layer Key Parser
// ============================================================
// Parameter keys of layer-indexed networks look like
//
//   model.12.cv1.conv.weight
//   ^^^^^ ^^ ^^^^^^^^^^^^^^^
//   prefix index  suffix
//
// Anything else (optimizer.state, a bare "model", ...) is a
// plain key and travels through the remapper untouched.
//
// The index segment must be canonical decimal so that
// parse → format gives back exactly the original key.
//
// Reference: Rust Book §8 (Strings), §6 (Enums and match)

use std::fmt;

/// Default root name of the ordered layer list.
pub const DEFAULT_PREFIX: &str = "model";

/// A parsed `<prefix>.<index>.<suffix>` key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerKey<'a> {
    pub prefix: &'a str,
    pub index:  usize,
    /// Everything after the index segment, may be empty.
    pub suffix: &'a str,
}

impl<'a> LayerKey<'a> {
    /// Same suffix, different layer index.
    pub fn with_index(&self, index: usize) -> LayerKey<'a> {
        LayerKey { index, ..self.clone() }
    }
}

impl fmt::Display for LayerKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.suffix.is_empty() {
            write!(f, "{}.{}", self.prefix, self.index)
        } else {
            write!(f, "{}.{}.{}", self.prefix, self.index, self.suffix)
        }
    }
}

/// Result of classifying a key against a prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyClass<'a> {
    Layer(LayerKey<'a>),
    /// Not under the layer prefix.
    Plain,
    /// Under the layer prefix, but the index segment is not a
    /// canonical non-negative integer.
    Malformed,
}

/// Classify `key` relative to `prefix`.
pub fn classify<'a>(key: &'a str, prefix: &str) -> KeyClass<'a> {
    let mut parts = key.splitn(3, '.');
    let head = parts.next().unwrap_or_default();
    let index_seg = match parts.next() {
        Some(seg) if head == prefix => seg,
        _ => return KeyClass::Plain,
    };
    let suffix = parts.next().unwrap_or_default();

    match parse_index(index_seg) {
        Some(index) => KeyClass::Layer(LayerKey {
            prefix: &key[..head.len()],
            index,
            suffix,
        }),
        None => KeyClass::Malformed,
    }
}

/// Shorthand for callers that only care about layer keys.
pub fn parse<'a>(key: &'a str, prefix: &str) -> Option<LayerKey<'a>> {
    match classify(key, prefix) {
        KeyClass::Layer(k) => Some(k),
        _ => None,
    }
}

fn parse_index(seg: &str) -> Option<usize> {
    let canonical = !seg.is_empty()
        && seg.bytes().all(|b| b.is_ascii_digit())
        && (seg == "0" || !seg.starts_with('0'));
    if !canonical {
        return None;
    }
    seg.parse().ok()
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_index_and_suffix() {
        let k = parse("model.12.cv1.conv.weight", "model").unwrap();
        assert_eq!(k.index, 12);
        assert_eq!(k.suffix, "cv1.conv.weight");
    }

    #[test]
    fn test_two_segment_key_has_empty_suffix() {
        let k = parse("model.3", "model").unwrap();
        assert_eq!(k.index, 3);
        assert_eq!(k.suffix, "");
        assert_eq!(k.to_string(), "model.3");
    }

    #[test]
    fn test_plain_keys() {
        assert_eq!(classify("optimizer.state", "model"), KeyClass::Plain);
        assert_eq!(classify("model", "model"), KeyClass::Plain);
        assert_eq!(classify("models.1.w", "model"), KeyClass::Plain);
        assert_eq!(classify("", "model"), KeyClass::Plain);
    }

    #[test]
    fn test_malformed_index_segments() {
        for key in ["model.x.w", "model.-1.w", "model.+2.w", "model.07.w",
                    "model..w", "model.", "model.99999999999999999999999.w"] {
            assert_eq!(classify(key, "model"), KeyClass::Malformed, "{key}");
        }
    }

    #[test]
    fn test_zero_index() {
        assert_eq!(parse("model.0.bn.running_mean", "model").unwrap().index, 0);
    }

    #[test]
    fn test_reconstruct_is_identity() {
        for key in ["model.0.conv.weight", "model.22.dfl.conv.weight",
                    "model.9", "net.4.m.0.cv2.bn.num_batches_tracked"] {
            let prefix = key.split('.').next().unwrap();
            let k = parse(key, prefix).unwrap();
            assert_eq!(k.to_string(), key);
        }
    }

    #[test]
    fn test_with_index_keeps_suffix() {
        let k = parse("model.16.conv.weight", "model").unwrap();
        assert_eq!(k.with_index(18).to_string(), "model.18.conv.weight");
    }

    #[test]
    fn test_custom_prefix() {
        assert!(parse("backbone.2.w", "backbone").is_some());
        assert!(parse("model.2.w", "backbone").is_none());
    }
}
