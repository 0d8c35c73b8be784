//! Content generation over rate-limited third-party APIs: text captions,
//! images, and translation, all routed through a shared backoff client.

pub mod backoff;
pub mod error;
pub mod generator;

pub use {
    backoff::{BackoffPolicy, execute_with_backoff},
    error::{Error, Result},
    generator::{ContentGenerator, HttpContentGenerator},
};
