use thiserror::Error;

use crate::platform::PlatformError;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("login failed for {username}: {reason}")]
    Login { username: String, reason: String },

    #[error("media file not found or unreadable: {path}")]
    MediaNotFound { path: String },

    #[error("upload failed after {attempts} attempts: {last_error}")]
    Upload { attempts: u32, last_error: String },

    #[error("failed to derive video thumbnail: {reason}")]
    Thumbnail { reason: String },

    #[error(transparent)]
    Media(#[from] gramflow_media::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl PublishError {
    #[must_use]
    pub fn thumbnail(reason: impl Into<String>) -> Self {
        Self::Thumbnail {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PublishError>;
