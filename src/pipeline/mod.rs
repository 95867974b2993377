//! Image-to-tensor pipeline: preprocessing followed by packing.

mod pack;
mod preprocess;
mod runner;

pub use pack::pack;
pub use preprocess::{transform, NORMALIZE_SCALE};
pub use runner::Pipeline;
