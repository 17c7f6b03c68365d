// ============================================================
// Layer 3 — Tensor Value
// ============================================================
// A tensor is carried as raw little-endian bytes together with
// its dtype and shape. The remapper never looks inside the
// bytes, so every precision round-trips exactly.
//
// Reference: Rust Book §3.2 (Integer Overflow)
//            huggingface/safetensors dtype table

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::TransferError;

/// Element types understood by the checkpoint container.
/// Names follow the SafeTensors header convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DType {
    F64,
    F32,
    F16,
    BF16,
    I64,
    I32,
    I16,
    I8,
    U8,
    BOOL,
}

impl DType {
    /// Bytes per element
    pub fn size(self) -> usize {
        match self {
            DType::F64 | DType::I64 => 8,
            DType::F32 | DType::I32 => 4,
            DType::F16 | DType::BF16 | DType::I16 => 2,
            DType::I8 | DType::U8 | DType::BOOL => 1,
        }
    }

    /// Header name of the dtype, e.g. `F32`.
    pub fn as_str(self) -> &'static str {
        match self {
            DType::F64  => "F64",
            DType::F32  => "F32",
            DType::F16  => "F16",
            DType::BF16 => "BF16",
            DType::I64  => "I64",
            DType::I32  => "I32",
            DType::I16  => "I16",
            DType::I8   => "I8",
            DType::U8   => "U8",
            DType::BOOL => "BOOL",
        }
    }

    /// Inverse of `as_str`. Unknown names are a `Format` error.
    pub fn parse(s: &str) -> Result<Self, TransferError> {
        Ok(match s {
            "F64"  => DType::F64,
            "F32"  => DType::F32,
            "F16"  => DType::F16,
            "BF16" => DType::BF16,
            "I64"  => DType::I64,
            "I32"  => DType::I32,
            "I16"  => DType::I16,
            "I8"   => DType::I8,
            "U8"   => DType::U8,
            "BOOL" => DType::BOOL,
            other  => {
                return Err(TransferError::Format(format!("unsupported dtype '{other}'")))
            }
        })
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Product of the dimensions, or `None` if it overflows `usize`.
/// An empty shape is a scalar with one element.
pub fn element_count(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &d| acc.checked_mul(d))
}

fn byte_len(dtype: DType, shape: &[usize]) -> Option<usize> {
    element_count(shape)?.checked_mul(dtype.size())
}

/// A row-major tensor stored as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tensor {
    dtype: DType,
    shape: Vec<usize>,
    bytes: Vec<u8>,
}

impl Tensor {
    /// Build a tensor, checking that the byte length agrees with
    /// `shape` and `dtype`.
    pub fn new(dtype: DType, shape: Vec<usize>, bytes: Vec<u8>) -> Result<Self, TransferError> {
        let expected = byte_len(dtype, &shape).ok_or_else(|| {
            TransferError::Format(format!("tensor of shape {shape:?} {dtype} is too large to address"))
        })?;
        if bytes.len() != expected {
            return Err(TransferError::Format(format!(
                "tensor of shape {shape:?} {dtype} needs {expected} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self { dtype, shape, bytes })
    }

    /// A tensor of `dtype` whose every element has the byte pattern
    /// of `element` (little-endian, `dtype.size()` bytes long).
    pub fn filled(dtype: DType, shape: Vec<usize>, element: &[u8]) -> Result<Self, TransferError> {
        if element.len() != dtype.size() {
            return Err(TransferError::Format(format!(
                "{dtype} element needs {} bytes, got {}",
                dtype.size(),
                element.len()
            )));
        }
        if byte_len(dtype, &shape).is_none() {
            return Err(TransferError::Format(format!(
                "tensor of shape {shape:?} {dtype} is too large to address"
            )));
        }
        let numel = shape.iter().product();
        Self::new(dtype, shape, element.repeat(numel))
    }

    /// Build an F32 tensor from values in row-major order.
    pub fn from_f32(shape: Vec<usize>, values: &[f32]) -> Result<Self, TransferError> {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(DType::F32, shape, bytes)
    }

    /// Build an F64 tensor from values in row-major order.
    pub fn from_f64(shape: Vec<usize>, values: &[f64]) -> Result<Self, TransferError> {
        let bytes = values.iter().flat_map(|v| v.to_le_bytes()).collect();
        Self::new(DType::F64, shape, bytes)
    }

    /// Element type of the stored bytes.
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    /// Dimensions, outermost first. Empty for a scalar.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Raw little-endian element data, exactly as stored on disk.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Number of scalar elements. `new` has already checked that
    /// the byte length matches, so this cannot overflow.
    pub fn numel(&self) -> usize {
        self.bytes.len() / self.dtype.size()
    }

    /// Same dtype and shape: the condition for overwriting a slot.
    pub fn is_compatible_with(&self, other: &Tensor) -> bool {
        self.dtype == other.dtype && self.shape == other.shape
    }

    /// Decode as f32 values. Only defined for F32 tensors.
    #[cfg(test)]
    pub fn to_f32_vec(&self) -> Option<Vec<f32>> {
        if self.dtype != DType::F32 {
            return None;
        }
        Some(
            self.bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_length_is_checked() {
        assert!(Tensor::new(DType::F32, vec![2, 3], vec![0; 24]).is_ok());
        assert!(Tensor::new(DType::F32, vec![2, 3], vec![0; 23]).is_err());
        assert!(Tensor::new(DType::F16, vec![4], vec![0; 8]).is_ok());
    }

    #[test]
    fn test_overflowing_shape_is_a_format_error() {
        let huge = vec![1usize << 32, 1usize << 32, 4];
        assert_eq!(element_count(&huge), None);
        assert!(matches!(
            Tensor::new(DType::F32, huge, Vec::new()),
            Err(TransferError::Format(_))
        ));
        // element count fits, byte count does not
        assert!(Tensor::new(DType::F64, vec![usize::MAX / 2], Vec::new()).is_err());
    }

    #[test]
    fn test_filled_repeats_element_bytes() {
        let t = Tensor::filled(DType::I64, vec![3], &1i64.to_le_bytes()).unwrap();
        assert_eq!(t.numel(), 3);
        assert_eq!(t.bytes(), [1i64.to_le_bytes(); 3].concat().as_slice());
        assert!(Tensor::filled(DType::I64, vec![3], &[0u8; 4]).is_err());
        assert!(Tensor::filled(DType::I64, vec![usize::MAX / 4], &[0u8; 8]).is_err());
    }

    #[test]
    fn test_scalar_tensor_has_one_element() {
        // shape [] is a 0-d scalar
        let t = Tensor::new(DType::I64, vec![], vec![0; 8]).unwrap();
        assert_eq!(t.numel(), 1);
    }

    #[test]
    fn test_f32_values_decode() {
        let t = Tensor::from_f32(vec![3], &[1.0, -2.5, 0.25]).unwrap();
        assert_eq!(t.to_f32_vec().unwrap(), vec![1.0, -2.5, 0.25]);
    }

    #[test]
    fn test_compatibility_needs_dtype_and_shape() {
        let a = Tensor::from_f32(vec![2, 2], &[0.0; 4]).unwrap();
        let b = Tensor::from_f32(vec![4], &[0.0; 4]).unwrap();
        let c = Tensor::new(DType::I32, vec![2, 2], vec![0; 16]).unwrap();
        assert!(a.is_compatible_with(&a.clone()));
        assert!(!a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
    }

    #[test]
    fn test_dtype_names_round_trip() {
        for d in [DType::F64, DType::F32, DType::F16, DType::BF16, DType::I64,
                  DType::I32, DType::I16, DType::I8, DType::U8, DType::BOOL] {
            assert_eq!(DType::parse(d.as_str()).unwrap(), d);
        }
        assert!(DType::parse("F8_E4M3").is_err());
    }
}
