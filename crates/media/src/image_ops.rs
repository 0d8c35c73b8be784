//! Image validation and optimization ahead of platform upload.

use std::io::Cursor;

use image::{DynamicImage, GenericImageView, ImageReader};

use crate::error::{Context, Error, Result};

/// Smallest side length the platform accepts.
pub const MIN_DIMENSION: u32 = 320;

/// Largest side length the platform accepts.
pub const MAX_DIMENSION: u32 = 1080;

/// JPEG quality for optimized output (0-100).
pub(crate) const JPEG_QUALITY: u8 = 85;

/// Decode just enough of an image to get its dimensions.
pub fn dimensions(data: &[u8]) -> Result<(u32, u32)> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("failed to guess image format")?
        .into_dimensions()
        .context("failed to read image dimensions")
}

/// Reject images whose sides fall outside the platform-mandated range,
/// before any processing happens.
pub fn validate_dimensions(data: &[u8]) -> Result<()> {
    let (width, height) = dimensions(data)?;
    if width < MIN_DIMENSION
        || height < MIN_DIMENSION
        || width > MAX_DIMENSION
        || height > MAX_DIMENSION
    {
        return Err(Error::invalid_input(format!(
            "image dimensions ({width}x{height}) are outside the supported \
             {MIN_DIMENSION}-{MAX_DIMENSION} range"
        )));
    }
    Ok(())
}

/// Optimize an image for upload: fit within [`MAX_DIMENSION`] preserving
/// aspect ratio (never enlarging), re-encode as JPEG.
pub fn optimize_image(data: &[u8]) -> Result<Vec<u8>> {
    let img = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("failed to guess image format")?
        .decode()
        .context("failed to decode image")?;

    let resized = resize_to_fit(&img, MAX_DIMENSION);
    encode_jpeg(&resized, JPEG_QUALITY)
}

/// Resize to fit within `max_dimension`, preserving aspect ratio. Returns
/// the image unchanged if it already fits.
pub(crate) fn resize_to_fit(img: &DynamicImage, max_dimension: u32) -> DynamicImage {
    let (width, height) = img.dimensions();
    if width <= max_dimension && height <= max_dimension {
        return img.clone();
    }

    let ratio = if width > height {
        max_dimension as f64 / width as f64
    } else {
        max_dimension as f64 / height as f64
    };
    let new_width = (width as f64 * ratio).round() as u32;
    let new_height = (height as f64 * ratio).round() as u32;

    img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3)
}

/// Encode as JPEG with the given quality.
pub(crate) fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let mut output = Cursor::new(Vec::new());
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
    // JPEG has no alpha channel.
    img.to_rgb8()
        .write_with_encoder(encoder)
        .context("failed to encode image as JPEG")?;
    Ok(output.into_inner())
}
