//! Image file loading.

use std::borrow::Cow;
use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::error::{Error, Result};

use super::{DecodedImage, RGB_CHANNELS};

/// Load an image file as 8-bit interleaved RGB.
///
/// Gray sources are replicated into three channels, alpha is dropped, and
/// deeper samples are reduced to 8 bits per channel.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DecodedImage<'static>> {
    let path = path.as_ref();

    let img = image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(from_dynamic(img))
}

fn from_dynamic(img: DynamicImage) -> DecodedImage<'static> {
    let (width, height) = img.dimensions();

    // Safe: RGB_CHANNELS is 3
    #[allow(clippy::cast_possible_truncation)]
    let channels = RGB_CHANNELS as u32;

    DecodedImage {
        width,
        height,
        channels,
        data: Cow::Owned(img.into_rgb8().into_raw()),
    }
}
