// ============================================================
// Layer 3 — Remap Table Builder
// ============================================================
// Splicing K new layers into an ordered list of N layers gives a
// target list of N + K layers. The insertion points name the
// TARGET positions of the new layers. Every other target
// position receives the next source layer, in order:
//
//   source:  0 1 2 3 4            insertions: [2, 5]
//   target:  0 1 _ 2 3 _ 4        (_ = reserved)
//   table:   0→0 1→1 2→3 3→4 4→6
//
// Invariants of the produced table:
//   - injective and strictly increasing
//   - covers every source index in [0, N)
//   - no insertion point appears among its values
//
// Reference: Rust Book §11 (Writing Automated Tests)
//            proptest book (strategies)

use serde::{Deserialize, Serialize};

use crate::domain::error::TransferError;

/// A validated, strictly increasing list of target insertion points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct InsertionSpec(Vec<usize>);

impl InsertionSpec {
    /// Accept `points` only if strictly increasing. Range is
    /// checked later, once the source layer count is known.
    pub fn new(points: Vec<usize>) -> Result<Self, TransferError> {
        if let Some(w) = points.windows(2).find(|w| w[0] >= w[1]) {
            return Err(TransferError::InvalidInsertionSpec(format!(
                "insertion points must be strictly increasing, found {} followed by {}",
                w[0], w[1]
            )));
        }
        Ok(Self(points))
    }

    /// Target indices of the inserted layers, ascending.
    pub fn points(&self) -> &[usize] {
        &self.0
    }

    /// Number of inserted layers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// No layers inserted: the table is the identity.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Vec<usize>> for InsertionSpec {
    type Error = TransferError;

    fn try_from(points: Vec<usize>) -> Result<Self, Self::Error> {
        InsertionSpec::new(points)
    }
}

impl From<InsertionSpec> for Vec<usize> {
    fn from(spec: InsertionSpec) -> Self {
        spec.0
    }
}

/// Old layer index → new layer index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapTable {
    /// `targets[old] == new`
    targets:    Vec<usize>,
    reserved:   Vec<usize>,
    target_len: usize,
}

impl RemapTable {
    /// Build the table for `source_layers` layers with new layers
    /// spliced in at `insertions`.
    pub fn build(source_layers: usize, insertions: &InsertionSpec) -> Result<Self, TransferError> {
        let target_len = source_layers + insertions.len();

        if let Some(&bad) = insertions.points().iter().find(|&&p| p >= target_len) {
            return Err(TransferError::InvalidInsertionSpec(format!(
                "insertion point {bad} is outside the target layer list (length {target_len})"
            )));
        }

        let mut reserved = insertions.points().iter().peekable();
        let mut targets = Vec::with_capacity(source_layers);
        for new in 0..target_len {
            if reserved.peek() == Some(&&new) {
                reserved.next();
                continue;
            }
            targets.push(new);
        }
        debug_assert_eq!(targets.len(), source_layers);

        Ok(Self {
            targets,
            reserved: insertions.points().to_vec(),
            target_len,
        })
    }

    /// New index for `old`, or `None` if `old` is not a source layer.
    pub fn get(&self, old: usize) -> Option<usize> {
        self.targets.get(old).copied()
    }

    /// `(old, new)` pairs in increasing order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.targets.iter().copied().enumerate()
    }

    /// Number of source layers covered
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// True when the source has no layers to move.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Source layers plus inserted layers.
    pub fn target_len(&self) -> usize {
        self.target_len
    }

    /// Target indices left for the inserted layers.
    pub fn reserved(&self) -> &[usize] {
        &self.reserved
    }

    /// Shift applied to `old`, i.e. how many inserted layers precede it.
    pub fn shift(&self, old: usize) -> Option<usize> {
        self.get(old).map(|new| new - old)
    }
}
