// ============================================================
// Layer 3 — Network Description
// ============================================================
// A structural description of a layer-indexed network: an
// ordered list of layers, each with the parameter tensors it
// owns. Layers without parameters (upsample, concat) still
// occupy an index.
//
// Example (JSON):
//   {
//     "prefix": "model",
//     "layers": [
//       { "kind": "Conv", "params": [
//           { "name": "conv.weight", "shape": [16, 3, 3, 3] },
//           { "name": "bn.bias",     "shape": [16], "init": "zeros" }
//       ]},
//       { "kind": "Upsample" }
//     ]
//   }

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::{error::TransferError, layer_key::DEFAULT_PREFIX, tensor::DType};

/// How a skeleton tensor is filled before any weights are transferred.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Init {
    /// N(0, 0.02)
    #[default]
    Normal,
    Zeros,
    Ones,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Key suffix under the layer, e.g. `cv1.conv.weight`
    pub name:  String,
    pub shape: Vec<usize>,
    #[serde(default)]
    pub init:  Init,
    #[serde(default = "default_dtype")]
    pub dtype: DType,
}

fn default_dtype() -> DType {
    DType::F32
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSpec {
    /// Module type, informational only (Conv, C2f, CBAM, Detect ...)
    pub kind:   String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescription {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    pub layers: Vec<LayerSpec>,
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

impl NetworkDescription {
    /// Parse and validate a description. Rejects duplicate keys,
    /// dotted prefixes and random init on non-float parameters.
    pub fn from_json(json: &str) -> Result<Self, TransferError> {
        let desc: NetworkDescription = serde_json::from_str(json)?;
        desc.validate()?;
        Ok(desc)
    }

    /// Number of layers, parameterless ones included.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// `(key, spec)` for every parameter, in layer order.
    pub fn parameter_keys(&self) -> impl Iterator<Item = (String, &ParamSpec)> + '_ {
        self.layers.iter().enumerate().flat_map(move |(i, layer)| {
            layer
                .params
                .iter()
                .map(move |p| (format!("{}.{}.{}", self.prefix, i, p.name), p))
        })
    }

    fn validate(&self) -> Result<(), TransferError> {
        if self.prefix.is_empty() || self.prefix.contains('.') {
            return Err(TransferError::Description(format!(
                "prefix '{}' must be a single non-empty segment",
                self.prefix
            )));
        }
        let mut seen = HashSet::new();
        for (key, p) in self.parameter_keys() {
            if p.name.is_empty() {
                return Err(TransferError::Description(format!("empty parameter name in '{key}'")));
            }
            if p.init == Init::Normal && !matches!(p.dtype, DType::F32 | DType::F64) {
                return Err(TransferError::Description(format!(
                    "'{key}': normal init needs F32 or F64, got {}; use zeros or ones",
                    p.dtype
                )));
            }
            if !seen.insert(key.clone()) {
                return Err(TransferError::Description(format!("duplicate parameter '{key}'")));
            }
        }
        Ok(())
    }
}
