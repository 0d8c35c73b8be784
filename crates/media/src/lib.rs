//! Media pipeline: dimension validation, image optimization, watermarking.

pub mod error;
pub mod image_ops;
pub mod renderer;

pub use {
    error::{Error, Result},
    image_ops::{MAX_DIMENSION, MIN_DIMENSION, optimize_image, validate_dimensions},
    renderer::{ImageRenderer, MediaRenderer, RenderSpec},
};
