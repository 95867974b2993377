//! Image and tensor message envelopes.
//!
//! An [`ImageMessage`] carries pixels the way a camera driver publishes them:
//! a named encoding, a row stride that may include padding, and a header with
//! the capture timestamp and frame id. [`ImageMessage::decode`] turns it into
//! tightly packed 8-bit pixels; the header travels unchanged onto the
//! resulting [`TensorList`].

use std::borrow::Cow;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::image::{DecodedImage, RGB_CHANNELS};
use crate::tensor::TensorRecord;

/// Capture timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Time {
    pub sec: i32,
    pub nanosec: u32,
}

/// Per-message metadata copied from input to output.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    pub stamp: Time,
    pub frame_id: String,
}

/// Pixel encodings understood by [`ImageMessage::decode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Rgb8,
    Bgr8,
    Rgba8,
    Bgra8,
    Mono8,
}

impl Encoding {
    /// Interleaved channels per pixel.
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Mono8 => 1,
            Self::Rgb8 | Self::Bgr8 => 3,
            Self::Rgba8 | Self::Bgra8 => 4,
        }
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rgb8" => Ok(Self::Rgb8),
            "bgr8" => Ok(Self::Bgr8),
            "rgba8" => Ok(Self::Rgba8),
            "bgra8" => Ok(Self::Bgra8),
            "mono8" => Ok(Self::Mono8),
            other => Err(Error::Decode {
                reason: format!("unsupported encoding `{other}`"),
            }),
        }
    }
}

/// An incoming image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageMessage {
    pub header: Header,
    pub height: u32,
    pub width: u32,
    pub encoding: String,
    /// Row length in bytes, padding included.
    pub step: u32,
    pub data: Vec<u8>,
}

impl ImageMessage {
    /// Build a tightly packed `rgb8` message.
    #[must_use]
    pub fn rgb8(header: Header, width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            header,
            height,
            width,
            encoding: "rgb8".to_string(),
            step: width.saturating_mul(3),
            data,
        }
    }

    /// Decode into tightly packed 8-bit pixels.
    ///
    /// Row padding is dropped and every encoding is converted to 3-channel
    /// RGB: `bgr8`/`bgra8` are reordered, alpha is dropped, and `mono8` is
    /// replicated into all three channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for unknown encodings, empty images, strides
    /// shorter than a row, or buffers shorter than `step * height`.
    pub fn decode(&self) -> Result<DecodedImage<'_>> {
        let encoding: Encoding = self.encoding.parse()?;
        let channels = encoding.channels();

        if self.width == 0 || self.height == 0 {
            return Err(Error::Decode {
                reason: format!("empty image {}x{}", self.width, self.height),
            });
        }

        let (width, height, step) = (
            self.width as usize,
            self.height as usize,
            self.step as usize,
        );
        let row_bytes = width * channels;
        if step < row_bytes {
            return Err(Error::Decode {
                reason: format!("row stride {step} is shorter than a {row_bytes}-byte row"),
            });
        }

        let needed = step.checked_mul(height).unwrap_or(usize::MAX);
        if self.data.len() < needed {
            return Err(Error::Decode {
                reason: format!(
                    "{}x{} {} image with stride {step} needs {needed} bytes, got {}",
                    self.width,
                    self.height,
                    self.encoding,
                    self.data.len()
                ),
            });
        }

        let packed: Cow<'_, [u8]> = if step == row_bytes {
            Cow::Borrowed(&self.data[..needed])
        } else {
            Cow::Owned(
                self.data
                    .chunks_exact(step)
                    .take(height)
                    .flat_map(|row| &row[..row_bytes])
                    .copied()
                    .collect(),
            )
        };

        let data = match encoding {
            Encoding::Rgb8 => packed,
            Encoding::Bgr8 => Cow::Owned(
                packed
                    .chunks_exact(3)
                    .flat_map(|px| [px[2], px[1], px[0]])
                    .collect(),
            ),
            Encoding::Rgba8 => Cow::Owned(
                packed
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect(),
            ),
            Encoding::Bgra8 => Cow::Owned(
                packed
                    .chunks_exact(4)
                    .flat_map(|px| [px[2], px[1], px[0]])
                    .collect(),
            ),
            Encoding::Mono8 => Cow::Owned(packed.iter().flat_map(|&v| [v; 3]).collect()),
        };

        // Safe: RGB_CHANNELS is 3
        #[allow(clippy::cast_possible_truncation)]
        let channels = RGB_CHANNELS as u32;

        Ok(DecodedImage {
            width: self.width,
            height: self.height,
            channels,
            data,
        })
    }
}

/// Outgoing tensors, stamped with the header of the image they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TensorList {
    pub header: Header,
    pub tensors: Vec<TensorRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(encoding: &str, width: u32, height: u32, step: u32, data: Vec<u8>) -> ImageMessage {
        ImageMessage {
            header: Header::default(),
            height,
            width,
            encoding: encoding.to_string(),
            step,
            data,
        }
    }

    #[test]
    fn test_rgb8_borrows() {
        let msg = ImageMessage::rgb8(Header::default(), 2, 1, vec![1, 2, 3, 4, 5, 6]);
        let decoded = msg.decode().unwrap();

        assert!(matches!(decoded.data, Cow::Borrowed(_)));
        assert_eq!(decoded.channels, 3);
        assert_eq!(&*decoded.data, &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_bgr8_reordered() {
        let msg = message("bgr8", 2, 1, 6, vec![1, 2, 3, 4, 5, 6]);
        let decoded = msg.decode().unwrap();

        assert_eq!(&*decoded.data, &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_row_padding_stripped() {
        let msg = message("rgb8", 1, 2, 4, vec![1, 2, 3, 0, 4, 5, 6, 0]);
        let decoded = msg.decode().unwrap();

        assert_eq!(&*decoded.data, &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_alpha_dropped() {
        let msg = message("rgba8", 2, 1, 8, vec![1, 2, 3, 255, 4, 5, 6, 128]);
        let decoded = msg.decode().unwrap();
        assert_eq!(decoded.channels, 3);
        assert_eq!(&*decoded.data, &[1, 2, 3, 4, 5, 6]);

        let msg = message("bgra8", 2, 1, 8, vec![1, 2, 3, 255, 4, 5, 6, 128]);
        let decoded = msg.decode().unwrap();
        assert_eq!(decoded.channels, 3);
        assert_eq!(&*decoded.data, &[3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_mono_replicated() {
        let msg = message("mono8", 2, 2, 3, vec![7, 9, 0, 11, 13, 0]);
        let decoded = msg.decode().unwrap();
        assert_eq!(decoded.channels, 3);
        assert_eq!(
            &*decoded.data,
            &[7, 7, 7, 9, 9, 9, 11, 11, 11, 13, 13, 13]
        );
    }

    #[test]
    fn test_decode_errors() {
        let cases = [
            message("yuv422", 2, 2, 4, vec![0; 8]),
            message("rgb8", 0, 2, 0, Vec::new()),
            message("rgb8", 2, 2, 5, vec![0; 10]),
            message("rgb8", 2, 2, 6, vec![0; 11]),
        ];
        for msg in cases {
            let err = msg.decode().unwrap_err();
            assert!(matches!(err, Error::Decode { .. }), "{err}");
        }
    }
}
