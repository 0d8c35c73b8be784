//! Shared error definitions and utilities used across all gramflow crates.

pub mod error;

pub use error::{Error, FromMessage, Result};
