//! Renderer collaborator: turns a raw upload into the final post image.

use std::io::Cursor;

use {
    image::{GenericImageView, ImageReader},
    tracing::warn,
};

use crate::{
    error::{Context, Result},
    image_ops::{JPEG_QUALITY, MAX_DIMENSION, encode_jpeg, resize_to_fit, validate_dimensions},
};

/// What to composite onto the base media.
#[derive(Debug, Clone, Default)]
pub struct RenderSpec {
    /// Text drawn over the image. Requires an SVG-capable renderer
    /// implementation; the built-in [`ImageRenderer`] skips it.
    pub overlay_text: Option<String>,
    /// Logo watermarked into the top-right corner.
    pub logo: Option<Vec<u8>>,
}

/// Media renderer collaborator.
pub trait MediaRenderer: Send + Sync {
    /// Produce the final post image from `base`. Input dimensions are
    /// validated against the platform range before any processing.
    fn render(&self, base: &[u8], spec: &RenderSpec) -> Result<Vec<u8>>;
}

/// Built-in renderer: optimization plus logo watermark.
///
/// The logo is scaled to 20 % of the base width and placed top-right with a
/// 10 px margin. A logo that fails to decode degrades to the unwatermarked
/// image rather than failing the whole render.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageRenderer;

impl ImageRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl MediaRenderer for ImageRenderer {
    fn render(&self, base: &[u8], spec: &RenderSpec) -> Result<Vec<u8>> {
        validate_dimensions(base)?;

        let decoded = ImageReader::new(Cursor::new(base))
            .with_guessed_format()
            .context("failed to guess image format")?
            .decode()
            .context("failed to decode image")?;
        let mut canvas = resize_to_fit(&decoded, MAX_DIMENSION);

        if spec.overlay_text.is_some() {
            warn!("text overlay requires an SVG-capable renderer, skipping");
        }

        if let Some(logo) = &spec.logo {
            match composite_logo(&mut canvas, logo) {
                Ok(()) => {},
                Err(e) => {
                    // Keep the post going without the watermark.
                    warn!(error = %e, "failed to composite logo, continuing without it");
                },
            }
        }

        encode_jpeg(&canvas, JPEG_QUALITY)
    }
}

fn composite_logo(canvas: &mut image::DynamicImage, logo: &[u8]) -> Result<()> {
    let (base_width, _) = canvas.dimensions();
    let logo_size = ((base_width as f64) * 0.2).round() as u32;

    let logo_img = ImageReader::new(Cursor::new(logo))
        .with_guessed_format()
        .context("failed to guess logo format")?
        .decode()
        .context("failed to decode logo")?
        .resize(
            logo_size,
            logo_size,
            image::imageops::FilterType::Lanczos3,
        );

    let (logo_width, _) = logo_img.dimensions();
    let x = (base_width as i64 - logo_width as i64 - 10).max(0);
    image::imageops::overlay(canvas, &logo_img, x, 10);
    Ok(())
}
