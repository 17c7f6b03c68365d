// ============================================================
// Layer 5 — Skeleton Builder
// ============================================================
// Turns a NetworkDescription into a freshly initialised target
// checkpoint, the slots the pretrained weights are merged into.
//
// Initialisers:
//   normal — N(0, 0.02), sampled with Burn's Tensor::random;
//            F32 and F64 only
//   zeros  — every byte 0, any dtype
//   ones   — the dtype's encoding of 1, any dtype
//
// Constant init never touches the backend, so integer buffers
// such as BatchNorm's num_batches_tracked get a slot as well.
//
// Reference: Burn Book §3 (Building Blocks: Tensor)
//            Rust Book §10 (Generic Types)

use burn::{
    backend::NdArray,
    tensor::{backend::Backend, Distribution, Tensor as BurnTensor},
};

use crate::domain::{
    checkpoint::{Checkpoint, Metadata, ParameterMap},
    error::TransferError,
    network::{Init, NetworkDescription, ParamSpec},
    tensor::{element_count, DType, Tensor},
    traits::SkeletonBuilder,
};

/// Standard deviation of the `normal` initialiser
pub const INIT_STD: f64 = 0.02;

/// Metadata entry recording which layers a skeleton was built from.
pub const LAYERS_METADATA_KEY: &str = "layers";

/// Initialises every parameter of a network description on a Burn backend.
#[derive(Debug, Clone)]
pub struct BurnSkeletonBuilder<B: Backend> {
    device: B::Device,
}

impl<B: Backend> BurnSkeletonBuilder<B> {
    /// Builder that samples on `device`.
    pub fn new(device: B::Device) -> Self {
        Self { device }
    }
}

/// Skeleton builder on the CPU NdArray backend.
pub type CpuSkeletonBuilder = BurnSkeletonBuilder<NdArray>;

impl CpuSkeletonBuilder {
    /// Builder on the default NdArray (CPU) device.
    pub fn cpu() -> Self {
        Self::new(Default::default())
    }
}

impl<B: Backend> SkeletonBuilder for BurnSkeletonBuilder<B> {
    fn build(&self, description: &NetworkDescription) -> Result<Checkpoint, TransferError> {
        let mut parameters = ParameterMap::new();
        for (key, spec) in description.parameter_keys() {
            let tensor = init_tensor::<B>(&key, spec, &self.device)?;
            parameters.insert(key, tensor);
        }

        let kinds: Vec<&str> = description.layers.iter().map(|l| l.kind.as_str()).collect();
        let mut metadata = Metadata::new();
        metadata.insert(LAYERS_METADATA_KEY.to_string(), kinds.join(","));

        tracing::info!(
            "Built target skeleton: {} layers, {} tensors",
            description.layer_count(),
            parameters.len()
        );
        Ok(Checkpoint::new(metadata, parameters))
    }
}

/// Initialise one parameter. Random init runs on the Burn backend;
/// constant init of any dtype is written straight into the bytes.
fn init_tensor<B: Backend>(
    key:    &str,
    spec:   &ParamSpec,
    device: &B::Device,
) -> Result<Tensor, TransferError> {
    match spec.init {
        Init::Zeros => Tensor::filled(spec.dtype, spec.shape.clone(), &vec![0u8; spec.dtype.size()]),
        Init::Ones  => Tensor::filled(spec.dtype, spec.shape.clone(), &one_bytes(spec.dtype)),
        Init::Normal => random_tensor::<B>(key, spec, device),
    }
}

fn random_tensor<B: Backend>(
    key:    &str,
    spec:   &ParamSpec,
    device: &B::Device,
) -> Result<Tensor, TransferError> {
    let numel = element_count(&spec.shape)
        .ok_or_else(|| TransferError::Description(format!("'{key}': shape {:?} is too large", spec.shape)))?;
    let values = if numel == 0 {
        Vec::new()
    } else {
        let flat: BurnTensor<B, 1> =
            BurnTensor::random([numel], Distribution::Normal(0.0, INIT_STD), device);
        flat.into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| TransferError::Description(format!("'{key}': {e:?}")))?
    };

    match spec.dtype {
        DType::F32 => Tensor::from_f32(spec.shape.clone(), &values),
        DType::F64 => {
            let wide: Vec<f64> = values.iter().map(|&v| f64::from(v)).collect();
            Tensor::from_f64(spec.shape.clone(), &wide)
        }
        other => Err(TransferError::Description(format!(
            "'{key}': normal init is not defined for {other}"
        ))),
    }
}

/// Little-endian encoding of the value 1 in `dtype`.
fn one_bytes(dtype: DType) -> Vec<u8> {
    match dtype {
        DType::F64  => 1f64.to_le_bytes().to_vec(),
        DType::F32  => 1f32.to_le_bytes().to_vec(),
        DType::F16  => 0x3C00u16.to_le_bytes().to_vec(),
        DType::BF16 => 0x3F80u16.to_le_bytes().to_vec(),
        DType::I64  => 1i64.to_le_bytes().to_vec(),
        DType::I32  => 1i32.to_le_bytes().to_vec(),
        DType::I16  => 1i16.to_le_bytes().to_vec(),
        DType::I8 | DType::U8 | DType::BOOL => vec![1],
    }
}
