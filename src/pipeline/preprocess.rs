//! Resize, element-type conversion and normalization.

use std::borrow::Cow;

use image::imageops::{self, FilterType};
use image::{ImageBuffer, Rgb};

use crate::config::{Config, ElementType};
use crate::error::{Error, Result};
use crate::image::{PixelBuffer, RawImage, TransformedImage, RGB_CHANNELS};

/// Divisor applied by normalization, whatever the element type.
pub const NORMALIZE_SCALE: f64 = 255.0;

/// Transform a raw image into the configured size and element type.
///
/// Steps, each applied only when needed:
/// 1. Bilinear resize to the target size, unless the image already matches
///    both target dimensions.
/// 2. Widening from 8-bit to the configured element type.
/// 3. Division by 255.0 when normalization is enabled.
///
/// The input is only read; the result owns a fresh buffer.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the image is not 3-channel or its buffer
/// does not match its dimensions.
pub fn transform(image: &RawImage<'_>, config: &Config) -> Result<TransformedImage> {
    image.validate()?;

    let (width, height) = (config.target_width(), config.target_height());

    let rgb: Cow<'_, [u8]> = if needs_resize(image, config) {
        tracing::debug!(
            "Resizing {}x{} -> {width}x{height}",
            image.width(),
            image.height()
        );
        Cow::Owned(resize(image, width, height)?)
    } else {
        Cow::Borrowed(image.data())
    };

    let mut pixels = convert(&rgb, config.element_type());

    if config.normalize() {
        normalize(&mut pixels);
    }

    // Safe: RGB_CHANNELS is 3
    #[allow(clippy::cast_possible_truncation)]
    let channels = RGB_CHANNELS as u32;

    Ok(TransformedImage::new(width, height, channels, pixels))
}

/// Whether the image differs from the target in either dimension.
fn needs_resize(image: &RawImage<'_>, config: &Config) -> bool {
    image.width() != config.target_width() || image.height() != config.target_height()
}

fn resize(image: &RawImage<'_>, width: u32, height: u32) -> Result<Vec<u8>> {
    let src: ImageBuffer<Rgb<u8>, &[u8]> =
        ImageBuffer::from_raw(image.width(), image.height(), image.data()).ok_or_else(|| {
            Error::invalid_input(format!(
                "buffer of {} bytes is too small for {}x{} RGB",
                image.data().len(),
                image.width(),
                image.height()
            ))
        })?;

    Ok(imageops::resize(&src, width, height, FilterType::Triangle).into_raw())
}

/// Copy 8-bit values into a buffer of the requested element type.
fn convert(rgb: &[u8], element_type: ElementType) -> PixelBuffer {
    match element_type {
        ElementType::Uint8 => PixelBuffer::Uint8(rgb.to_vec()),
        ElementType::Float32 => PixelBuffer::Float32(rgb.iter().copied().map(f32::from).collect()),
        ElementType::Float64 => PixelBuffer::Float64(rgb.iter().copied().map(f64::from).collect()),
    }
}

/// Divide every value by [`NORMALIZE_SCALE`].
///
/// The quotient is computed in `f64` and stored back in the buffer's own
/// type. For `Uint8` buffers that means rounding to the nearest integer, so
/// normalized 8-bit output only ever holds 0 or 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn normalize(pixels: &mut PixelBuffer) {
    match pixels {
        PixelBuffer::Uint8(values) => {
            for v in values.iter_mut() {
                // Safe: quotient is within [0, 1]
                *v = (f64::from(*v) / NORMALIZE_SCALE).round() as u8;
            }
        }
        PixelBuffer::Float32(values) => {
            for v in values.iter_mut() {
                *v = (f64::from(*v) / NORMALIZE_SCALE) as f32;
            }
        }
        PixelBuffer::Float64(values) => {
            for v in values.iter_mut() {
                *v /= NORMALIZE_SCALE;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TensorLayout;

    fn config(width: u32, height: u32, normalize: bool, element_type: ElementType) -> Config {
        Config::new(
            width,
            height,
            normalize,
            TensorLayout::ChannelLast,
            element_type,
        )
        .unwrap()
    }

    fn gradient(width: u32, height: u32) -> Vec<u8> {
        (0..width * height * 3)
            .map(|i| u8::try_from(i % 256).unwrap())
            .collect()
    }

    #[test]
    fn test_rejects_non_rgb() {
        let cfg = config(4, 4, false, ElementType::Uint8);
        for channels in [1u32, 2, 4] {
            let data = vec![0u8; 16 * channels as usize];
            let image = RawImage::new(4, 4, channels, &data);
            assert!(matches!(
                transform(&image, &cfg),
                Err(Error::InvalidInput { .. })
            ));
        }
    }

    #[test]
    fn test_identity_when_nothing_to_do() {
        let data = gradient(6, 5);
        let image = RawImage::new(6, 5, 3, &data);
        let out = transform(&image, &config(6, 5, false, ElementType::Uint8)).unwrap();

        assert_eq!((out.width(), out.height(), out.channels()), (6, 5, 3));
        assert_eq!(out.pixels(), &PixelBuffer::Uint8(data));
    }

    #[test]
    fn test_partial_match_still_resizes() {
        let data = gradient(8, 4);
        let image = RawImage::new(8, 4, 3, &data);

        let out = transform(&image, &config(8, 2, false, ElementType::Uint8)).unwrap();
        assert_eq!((out.width(), out.height()), (8, 2));
        assert_eq!(out.pixels().len(), 8 * 2 * 3);

        let out = transform(&image, &config(3, 4, false, ElementType::Uint8)).unwrap();
        assert_eq!((out.width(), out.height()), (3, 4));
        assert_eq!(out.pixels().len(), 3 * 4 * 3);
    }

    #[test]
    fn test_resize_uniform_color() {
        let data: Vec<u8> = [200u8, 100, 50].repeat(10 * 10);
        let image = RawImage::new(10, 10, 3, &data);
        let out = transform(&image, &config(3, 7, false, ElementType::Uint8)).unwrap();

        let PixelBuffer::Uint8(values) = out.pixels() else {
            panic!("expected uint8 pixels");
        };
        for px in values.chunks_exact(3) {
            assert_eq!(px, &[200, 100, 50]);
        }
    }

    #[test]
    fn test_widening_conversion() {
        let data = gradient(2, 2);
        let image = RawImage::new(2, 2, 3, &data);

        let out = transform(&image, &config(2, 2, false, ElementType::Float32)).unwrap();
        let expected: Vec<f32> = data.iter().copied().map(f32::from).collect();
        assert_eq!(out.pixels(), &PixelBuffer::Float32(expected));

        let out = transform(&image, &config(2, 2, false, ElementType::Float64)).unwrap();
        let expected: Vec<f64> = data.iter().copied().map(f64::from).collect();
        assert_eq!(out.pixels(), &PixelBuffer::Float64(expected));
    }

    #[test]
    fn test_normalize_float() {
        let data = vec![0u8, 51, 255, 255, 0, 102];
        let image = RawImage::new(2, 1, 3, &data);
        let out = transform(&image, &config(2, 1, true, ElementType::Float64)).unwrap();

        let PixelBuffer::Float64(values) = out.pixels() else {
            panic!("expected float64 pixels");
        };
        assert_eq!(values, &[0.0, 0.2, 1.0, 1.0, 0.0, 0.4]);
    }

    #[test]
    fn test_normalize_uint8_rounds_to_zero_or_one() {
        let data = vec![0u8, 127, 128, 200, 255, 1];
        let image = RawImage::new(2, 1, 3, &data);
        let out = transform(&image, &config(2, 1, true, ElementType::Uint8)).unwrap();

        assert_eq!(out.pixels(), &PixelBuffer::Uint8(vec![0, 0, 1, 1, 1, 0]));
    }

    #[test]
    fn test_input_untouched() {
        let data = gradient(4, 4);
        let copy = data.clone();
        let image = RawImage::new(4, 4, 3, &data);
        transform(&image, &config(2, 2, true, ElementType::Float32)).unwrap();
        assert_eq!(data, copy);
    }
}
