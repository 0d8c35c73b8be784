//! Publish pipeline: authenticated platform session, media upload with
//! per-call-site retry profiles, and post-login cleanup that never masks the
//! primary outcome.

pub mod device;
pub mod error;
pub mod http_client;
pub mod pipeline;
pub mod platform;
pub mod retry;
pub mod thumbnail;

pub use {
    device::DeviceIdentity,
    error::PublishError,
    http_client::HttpPlatformClient,
    pipeline::{PublishOutcome, PublishPipeline, PublishRequest},
    platform::{AccountCredentials, PlatformClient, PlatformError, PlatformSession},
    retry::{PHOTO_UPLOAD, RetryDelay, RetryProfile, VIDEO_UPLOAD},
};
