// ============================================================
// Layer 6 — Checkpoint Store (SafeTensors layout)
// ============================================================
// On-disk container:
//
//   [8 bytes]  u64 little-endian header length N
//   [N bytes]  JSON header
//   [rest]     raw tensor bytes
//
// Header:
//   {
//     "__metadata__": { "epoch": "-1", ... },          (optional)
//     "model.0.conv.weight": {
//         "dtype": "F32", "shape": [16, 3, 3, 3],
//         "data_offsets": [0, 1728]                    (relative to data start)
//     },
//     ...
//   }
//
// JSON objects are unordered, so parameter order is recovered
// from the data offsets. Tensors are written back-to-back in
// parameter order, which keeps that order stable across
// load → save → load.
//
// Writes go to a temp file in the destination directory and
// are renamed into place, so a crash never leaves half a file.
//
// Reference: huggingface/safetensors format description

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::domain::{
    checkpoint::{Checkpoint, Metadata, ParameterMap},
    error::TransferError,
    tensor::{DType, Tensor},
    traits::CheckpointStore,
};

const METADATA_KEY: &str = "__metadata__";
const HEADER_ALIGN: usize = 8;

/// Per-tensor header entry
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TensorEntry {
    dtype:        String,
    shape:        Vec<usize>,
    data_offsets: [usize; 2],
}

/// File-backed checkpoint store.
#[derive(Debug, Clone, Default)]
pub struct SafetensorsStore;

impl SafetensorsStore {
    /// Create a store. It holds no state; paths are passed per call.
    pub fn new() -> Self {
        Self
    }
}

impl CheckpointStore for SafetensorsStore {
    fn load(&self, path: &Path) -> Result<Checkpoint, TransferError> {
        let bytes = fs::read(path)?;
        let ckpt = decode(&bytes)?;
        tracing::debug!(
            "Loaded '{}': {} tensors, {} metadata entries",
            path.display(),
            ckpt.parameters.len(),
            ckpt.metadata.len()
        );
        Ok(ckpt)
    }

    fn save(&self, checkpoint: &Checkpoint, path: &Path) -> Result<(), TransferError> {
        let bytes = encode(checkpoint)?;

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| TransferError::Io(e.error))?;

        tracing::debug!("Wrote {} bytes to '{}'", bytes.len(), path.display());
        Ok(())
    }
}

/// Serialise a checkpoint into the container layout.
pub fn encode(checkpoint: &Checkpoint) -> Result<Vec<u8>, TransferError> {
    let mut header = Map::new();
    if !checkpoint.metadata.is_empty() {
        header.insert(METADATA_KEY.to_string(), serde_json::to_value(&checkpoint.metadata)?);
    }

    let mut offset = 0usize;
    for (key, tensor) in checkpoint.parameters.iter() {
        if key == METADATA_KEY {
            return Err(TransferError::Format(format!("'{METADATA_KEY}' is reserved")));
        }
        let end = offset + tensor.bytes().len();
        let entry = TensorEntry {
            dtype:        tensor.dtype().to_string(),
            shape:        tensor.shape().to_vec(),
            data_offsets: [offset, end],
        };
        header.insert(key.to_string(), serde_json::to_value(entry)?);
        offset = end;
    }

    let mut header_bytes = serde_json::to_vec(&Value::Object(header))?;
    // Pad with spaces so the data section starts 8-byte aligned.
    let padded = header_bytes.len().div_ceil(HEADER_ALIGN) * HEADER_ALIGN;
    header_bytes.resize(padded, b' ');

    let mut out = Vec::with_capacity(8 + header_bytes.len() + offset);
    out.extend_from_slice(&(header_bytes.len() as u64).to_le_bytes());
    out.extend_from_slice(&header_bytes);
    for (_, tensor) in checkpoint.parameters.iter() {
        out.extend_from_slice(tensor.bytes());
    }
    Ok(out)
}

/// Parse the container layout back into a checkpoint.
pub fn decode(bytes: &[u8]) -> Result<Checkpoint, TransferError> {
    let len_bytes: [u8; 8] = bytes
        .get(..8)
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| TransferError::Format("file shorter than the 8-byte header length".into()))?;
    let header_len = usize::try_from(u64::from_le_bytes(len_bytes))
        .map_err(|_| TransferError::Format("header length does not fit in memory".into()))?;
    let data_start = 8usize
        .checked_add(header_len)
        .filter(|&end| end <= bytes.len())
        .ok_or_else(|| {
            TransferError::Format(format!(
                "header length {header_len} exceeds file size {}",
                bytes.len()
            ))
        })?;

    let header: Map<String, Value> = serde_json::from_slice(&bytes[8..data_start])?;
    let data = &bytes[data_start..];

    let mut metadata = Metadata::new();
    let mut entries = Vec::with_capacity(header.len());
    for (key, value) in header {
        if key == METADATA_KEY {
            metadata = serde_json::from_value(value)?;
            continue;
        }
        let entry: TensorEntry = serde_json::from_value(value)
            .map_err(|e| TransferError::Format(format!("bad header entry '{key}': {e}")))?;
        entries.push((key, entry));
    }
    entries.sort_by_key(|(_, e)| e.data_offsets);

    let mut parameters = ParameterMap::new();
    for (key, entry) in entries {
        let [start, end] = entry.data_offsets;
        let slice = data.get(start..end).ok_or_else(|| {
            TransferError::Format(format!(
                "'{key}': offsets [{start}, {end}] outside data section of {} bytes",
                data.len()
            ))
        })?;
        let dtype = DType::parse(&entry.dtype)?;
        let tensor = Tensor::new(dtype, entry.shape, slice.to_vec())
            .map_err(|e| TransferError::Format(format!("'{key}': {e}")))?;
        parameters.insert(key, tensor);
    }

    Ok(Checkpoint::new(metadata, parameters))
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Checkpoint {
        let mut metadata = Metadata::new();
        metadata.insert("epoch".into(), "-1".into());
        metadata.insert("optimizer".into(), r#"{"lr":0.01,"momentum":0.937}"#.into());

        let mut parameters = ParameterMap::new();
        parameters.insert("model.1.conv.weight", Tensor::from_f32(vec![2, 2], &[1.0, 2.0, 3.0, 4.0]).unwrap());
        parameters.insert("model.0.bn.num_batches_tracked", Tensor::new(DType::I64, vec![], 7i64.to_le_bytes().to_vec()).unwrap());
        parameters.insert("model.0.conv.weight", Tensor::new(DType::F16, vec![3], vec![1, 2, 3, 4, 5, 6]).unwrap());
        Checkpoint::new(metadata, parameters)
    }

    #[test]
    fn test_encode_decode_preserves_everything() {
        let ckpt = sample();
        let back = decode(&encode(&ckpt).unwrap()).unwrap();
        assert_eq!(back, ckpt);
        // order comes from offsets, not from the (sorted) JSON keys
        let keys: Vec<&str> = back.parameters.keys().collect();
        assert_eq!(keys, vec!["model.1.conv.weight", "model.0.bn.num_batches_tracked", "model.0.conv.weight"]);
    }

    #[test]
    fn test_data_section_is_aligned() {
        let bytes = encode(&sample()).unwrap();
        let n = u64::from_le_bytes(bytes[..8].try_into().unwrap()) as usize;
        assert_eq!(n % HEADER_ALIGN, 0);
    }

    #[test]
    fn test_empty_checkpoint() {
        let ckpt = Checkpoint::default();
        assert_eq!(decode(&encode(&ckpt).unwrap()).unwrap(), ckpt);
    }

    #[test]
    fn test_truncated_file_rejected() {
        let bytes = encode(&sample()).unwrap();
        assert!(matches!(decode(&bytes[..4]), Err(TransferError::Format(_))));
        assert!(matches!(decode(&bytes[..bytes.len() - 1]), Err(TransferError::Format(_))));
    }

    #[test]
    fn test_overflowing_shape_rejected_without_panic() {
        let header = br#"{"w":{"dtype":"F32","shape":[4294967296,4294967296,4],"data_offsets":[0,0]}}"#;
        let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(header);
        assert!(matches!(decode(&bytes), Err(TransferError::Format(_))));
    }

    #[test]
    fn test_oversized_header_length_rejected() {
        let mut bytes = encode(&sample()).unwrap();
        bytes[..8].copy_from_slice(&u64::MAX.to_le_bytes());
        assert!(matches!(decode(&bytes), Err(TransferError::Format(_))));
    }

    #[test]
    fn test_unknown_dtype_rejected() {
        let header = br#"{"w":{"dtype":"F8_E4M3","shape":[1],"data_offsets":[0,1]}}"#;
        let mut bytes = (header.len() as u64).to_le_bytes().to_vec();
        bytes.extend_from_slice(header);
        bytes.push(0);
        assert!(matches!(decode(&bytes), Err(TransferError::Format(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.safetensors");
        let store = SafetensorsStore::new();
        store.save(&sample(), &path).unwrap();
        assert_eq!(store.load(&path).unwrap(), sample());
        // only the final file remains, no temp leftovers
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ckpt.safetensors");
        let store = SafetensorsStore::new();
        store.save(&Checkpoint::default(), &path).unwrap();
        store.save(&sample(), &path).unwrap();
        assert_eq!(store.load(&path).unwrap(), sample());
    }
}
