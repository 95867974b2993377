//! Image types flowing into and through the pipeline.

mod load;

pub use load::load_image;

use std::borrow::Cow;

use crate::config::ElementType;
use crate::error::{Error, Result};

/// Number of channels the pipeline accepts (interleaved RGB).
pub const RGB_CHANNELS: usize = 3;

/// Borrowed view of an 8-bit, row-major, interleaved pixel buffer.
///
/// Nothing is checked at construction; [`crate::Pipeline::process`] checks
/// the view on every call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawImage<'a> {
    width: u32,
    height: u32,
    channels: u32,
    data: &'a [u8],
}

impl<'a> RawImage<'a> {
    /// Wrap a pixel buffer.
    #[must_use]
    pub const fn new(width: u32, height: u32, channels: u32, data: &'a [u8]) -> Self {
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Interleaved channels per pixel.
    #[must_use]
    pub const fn channels(&self) -> u32 {
        self.channels
    }

    /// Raw pixel bytes.
    #[must_use]
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Check the view before any pixel is touched.
    pub(crate) fn validate(&self) -> Result<()> {
        if self.channels as usize != RGB_CHANNELS {
            return Err(Error::invalid_input(format!(
                "expected {RGB_CHANNELS} channels, got {}",
                self.channels
            )));
        }

        if self.width == 0 || self.height == 0 {
            return Err(Error::invalid_input(format!(
                "empty image {}x{}",
                self.width, self.height
            )));
        }

        let expected = (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|px| px.checked_mul(RGB_CHANNELS));
        if expected != Some(self.data.len()) {
            return Err(Error::invalid_input(format!(
                "{}x{}x{} image needs {} bytes, buffer holds {}",
                self.width,
                self.height,
                self.channels,
                expected.map_or_else(|| "more than usize::MAX".to_string(), |n| n.to_string()),
                self.data.len()
            )));
        }

        Ok(())
    }
}

/// Owned or borrowed 8-bit pixel data produced by a decoder.
///
/// Keeps the source's channel count as-is; rejecting non-RGB input is left to
/// the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage<'a> {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub data: Cow<'a, [u8]>,
}

impl DecodedImage<'_> {
    /// Borrow as a [`RawImage`].
    #[must_use]
    pub fn as_raw(&self) -> RawImage<'_> {
        RawImage::new(self.width, self.height, self.channels, &self.data)
    }
}

/// Typed, interleaved pixel storage.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelBuffer {
    Uint8(Vec<u8>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

impl PixelBuffer {
    /// Element type of the stored values.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::Uint8(_) => ElementType::Uint8,
            Self::Float32(_) => ElementType::Float32,
            Self::Float64(_) => ElementType::Float64,
        }
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Uint8(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the stored values in bytes.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.len() * self.element_type().size()
    }
}

/// Image after resize, type conversion and normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedImage {
    width: u32,
    height: u32,
    channels: u32,
    pixels: PixelBuffer,
}

impl TransformedImage {
    pub(crate) const fn new(width: u32, height: u32, channels: u32, pixels: PixelBuffer) -> Self {
        Self {
            width,
            height,
            channels,
            pixels,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn channels(&self) -> u32 {
        self.channels
    }

    /// Interleaved pixel values.
    #[must_use]
    pub const fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Element type of the pixel values.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        self.pixels.element_type()
    }
}
