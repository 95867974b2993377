//! Tensor records produced by the pipeline.

mod save;

pub use save::save_tensor;

use crate::config::ElementType;

/// Name given to every packed image tensor.
pub const TENSOR_NAME: &str = "image_tensor";

/// Leading batch dimension of every shape.
pub const BATCH_SIZE: u32 = 1;

/// A named, shape-annotated tensor payload.
///
/// `data` holds `product(shape[1..]) * element_size` bytes, multi-byte values
/// in native byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorRecord {
    pub name: String,
    /// Element type code (see [`ElementType::code`]).
    pub data_type: u8,
    pub shape: Vec<u32>,
    pub data: Vec<u8>,
}

impl TensorRecord {
    /// Element type matching `data_type`, if the code is known.
    #[must_use]
    pub fn element_type(&self) -> Option<ElementType> {
        [ElementType::Uint8, ElementType::Float32, ElementType::Float64]
            .into_iter()
            .find(|ty| ty.code() == self.data_type)
    }

    /// Number of elements described by the shape, batch excluded.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.shape.iter().skip(1).map(|&d| d as usize).product()
    }
}
