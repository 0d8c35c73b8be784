//! Named retry profiles for the upload call sites.
//!
//! Photos retry with a fixed pause, videos get a single attempt, and the
//! content-generation APIs use exponential backoff (in `gramflow-content`).
//! Three deliberately distinct policies; do not unify them.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDelay {
    None,
    Fixed(Duration),
}

#[derive(Debug, Clone, Copy)]
pub struct RetryProfile {
    pub name: &'static str,
    pub max_attempts: u32,
    pub delay: RetryDelay,
}

impl RetryProfile {
    /// The pause to apply between attempts, if any.
    #[must_use]
    pub fn pause_between_attempts(&self) -> Option<Duration> {
        match self.delay {
            RetryDelay::None => None,
            RetryDelay::Fixed(pause) => Some(pause),
        }
    }
}

/// Photo uploads: up to 3 attempts with a flat 5-second pause.
pub const PHOTO_UPLOAD: RetryProfile = RetryProfile {
    name: "photo-upload",
    max_attempts: 3,
    delay: RetryDelay::Fixed(Duration::from_secs(5)),
};

/// Video uploads: one attempt, no retry.
pub const VIDEO_UPLOAD: RetryProfile = RetryProfile {
    name: "video-upload",
    max_attempts: 1,
    delay: RetryDelay::None,
};
