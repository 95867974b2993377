//! # cv-tensor-process
//!
//! Turns color images into flat tensor buffers ready for an inference stage.
//!
//! Each image is checked to be 3-channel RGB, resized to a fixed target
//! (bilinear), converted to the configured element type, optionally divided
//! by 255.0, and packed as a `[1, H, W, C]` (`nhwc`) or `[1, C, H, W]`
//! (`nchw`) byte buffer.
//!
//! ## Example
//!
//! ```
//! use cv_tensor_process::{Config, ElementType, Pipeline, RawImage, TensorLayout};
//!
//! # fn main() -> cv_tensor_process::Result<()> {
//! let config = Config::new(224, 224, true, TensorLayout::ChannelFirst, ElementType::Float32)?;
//! let pipeline = Pipeline::new(config);
//!
//! let pixels = vec![0u8; 640 * 480 * 3];
//! let tensor = pipeline.process(&RawImage::new(640, 480, 3, &pixels))?;
//!
//! assert_eq!(tensor.shape, [1, 3, 224, 224]);
//! assert_eq!(tensor.data.len(), 224 * 224 * 3 * 4);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod image;
pub mod message;
pub mod pipeline;
pub mod tensor;

pub use config::{Config, ElementType, Options, TensorLayout};
pub use error::{Error, Result};
pub use crate::image::{load_image, RawImage};
pub use message::{Header, ImageMessage, TensorList};
pub use pipeline::Pipeline;
pub use tensor::{save_tensor, TensorRecord};
