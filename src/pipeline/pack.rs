//! Packing of transformed images into tensor records.

use ndarray::{ArrayView3, Axis};

use crate::config::{Config, TensorLayout};
use crate::error::{Error, Result};
use crate::image::{PixelBuffer, TransformedImage};
use crate::tensor::{TensorRecord, BATCH_SIZE, TENSOR_NAME};

/// A pixel value that can be written into a tensor payload.
trait Element: Copy {
    const SIZE: usize;

    /// Write the value's native-endian bytes into `out` (exactly `SIZE` long).
    fn write_ne(self, out: &mut [u8]);
}

macro_rules! impl_element {
    ($($ty:ty),*) => {
        $(
            impl Element for $ty {
                const SIZE: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn write_ne(self, out: &mut [u8]) {
                    out.copy_from_slice(&self.to_ne_bytes());
                }
            }
        )*
    };
}

impl_element!(u8, f32, f64);

/// Pack a transformed image into a tensor record.
///
/// The payload is allocated once at the configured size (`target_height *
/// target_width * 3 * element_size` bytes) and filled according to the
/// configured layout:
///
/// * `ChannelLast` copies the interleaved buffer as-is, shape
///   `[1, height, width, channels]`.
/// * `ChannelFirst` splits the image into one plane per channel and writes
///   the planes back to back in channel order, shape
///   `[1, channels, height, width]`.
///
/// # Errors
///
/// Returns [`Error::Packing`] if the bytes assembled from the image do not
/// add up to the payload size, e.g. when the image was not resized to the
/// configured target.
pub fn pack(image: &TransformedImage, config: &Config) -> Result<TensorRecord> {
    let (height, width, channels) = (image.height(), image.width(), image.channels());
    let element_type = config.element_type();

    let payload_size = config.payload_size();

    let mut data = vec![0u8; payload_size];
    let dims = (height as usize, width as usize, channels as usize);
    let layout = config.layout();

    match image.pixels() {
        PixelBuffer::Uint8(values) => fill(values, dims, layout, &mut data)?,
        PixelBuffer::Float32(values) => fill(values, dims, layout, &mut data)?,
        PixelBuffer::Float64(values) => fill(values, dims, layout, &mut data)?,
    }

    let shape = match layout {
        TensorLayout::ChannelLast => vec![BATCH_SIZE, height, width, channels],
        TensorLayout::ChannelFirst => vec![BATCH_SIZE, channels, height, width],
    };

    tracing::debug!("Packed {layout} tensor {shape:?} ({payload_size} bytes)");

    Ok(TensorRecord {
        name: TENSOR_NAME.to_string(),
        data_type: element_type.code(),
        shape,
        data,
    })
}

fn fill<T: Element>(
    values: &[T],
    dims: (usize, usize, usize),
    layout: TensorLayout,
    out: &mut [u8],
) -> Result<()> {
    match layout {
        TensorLayout::ChannelLast => fill_interleaved(values, out),
        TensorLayout::ChannelFirst => fill_planar(values, dims, out),
    }
}

fn fill_interleaved<T: Element>(values: &[T], out: &mut [u8]) -> Result<()> {
    let assembled = values.len() * T::SIZE;
    if assembled != out.len() {
        return Err(Error::Packing {
            expected: out.len(),
            actual: assembled,
        });
    }

    let copied = copy_values(values.iter().copied(), out);
    check_copied(copied, out.len())
}

fn fill_planar<T: Element>(
    values: &[T],
    (height, width, channels): (usize, usize, usize),
    out: &mut [u8],
) -> Result<()> {
    let view = ArrayView3::from_shape((height, width, channels), values).map_err(|_| {
        Error::Packing {
            expected: out.len(),
            actual: values.len() * T::SIZE,
        }
    })?;

    // One (height, width) plane per channel, in channel order.
    let planes: Vec<_> = view.axis_iter(Axis(2)).collect();

    let assembled: usize = planes.iter().map(|plane| plane.len() * T::SIZE).sum();
    if assembled != out.len() {
        return Err(Error::Packing {
            expected: out.len(),
            actual: assembled,
        });
    }

    let mut copied = 0;
    for plane in &planes {
        let plane_size = plane.len() * T::SIZE;
        copied += copy_values(
            plane.iter().copied(),
            &mut out[copied..copied + plane_size],
        );
    }

    check_copied(copied, out.len())
}

/// Write values into `out` back to back, returning the number of bytes written.
fn copy_values<T: Element>(values: impl Iterator<Item = T>, out: &mut [u8]) -> usize {
    let mut written = 0;
    for (value, chunk) in values.zip(out.chunks_exact_mut(T::SIZE)) {
        value.write_ne(chunk);
        written += T::SIZE;
    }
    written
}

fn check_copied(copied: usize, expected: usize) -> Result<()> {
    if copied == expected {
        Ok(())
    } else {
        Err(Error::Packing {
            expected,
            actual: copied,
        })
    }
}
