//! Platform client collaborator: session, credentials, and error shapes.

use {async_trait::async_trait, secrecy::Secret, serde_json::Value};

use crate::device::DeviceIdentity;

/// Credentials resolved from the account table at publish time. Jobs only
/// carry the account name.
#[derive(Debug, Clone)]
pub struct AccountCredentials {
    pub username: String,
    pub password: Secret<String>,
}

impl AccountCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Secret::new(password.into()),
        }
    }
}

/// A platform session bound to one account identity. The device fingerprint
/// is derived from the username, so repeated runs present the same device.
#[derive(Debug, Clone)]
pub struct PlatformSession {
    pub username: String,
    pub device: DeviceIdentity,
    pub auth_token: Option<String>,
}

impl PlatformSession {
    pub fn for_username(username: &str) -> Self {
        Self {
            username: username.to_string(),
            device: DeviceIdentity::derive(username),
            auth_token: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("authentication rejected: {reason}")]
    AuthRejected { reason: String },

    #[error("not found: {resource}")]
    NotFound { resource: String },

    #[error("{operation} returned status {status}: {body}")]
    Status {
        operation: String,
        status: u16,
        body: String,
    },

    #[error("{operation}: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
}

impl PlatformError {
    #[must_use]
    pub fn transport(operation: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            operation: operation.into(),
            source,
        }
    }
}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

/// The platform's post-login flow sometimes 404s on its non-essential
/// suggested-searches endpoint. That never affects an upload that already
/// happened, so it is the one cleanup failure worth swallowing.
#[must_use]
pub fn is_benign_post_login(error: &PlatformError) -> bool {
    matches!(error, PlatformError::NotFound { resource } if resource.contains("suggested_searches"))
}

/// Platform client collaborator.
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Open an unauthenticated session for the account identity.
    fn open_session(&self, username: &str) -> PlatformSession;

    /// The platform's pre-login simulation step.
    async fn pre_login_flow(&self, session: &PlatformSession) -> PlatformResult<()>;

    /// Authenticate. Failure is terminal; the pipeline never retries logins.
    async fn login(
        &self,
        session: &mut PlatformSession,
        credentials: &AccountCredentials,
    ) -> PlatformResult<Value>;

    async fn publish_photo(
        &self,
        session: &PlatformSession,
        photo: &[u8],
        caption: &str,
    ) -> PlatformResult<Value>;

    /// Video and cover go up as a single call.
    async fn publish_video(
        &self,
        session: &PlatformSession,
        video: &[u8],
        cover: &[u8],
        caption: &str,
    ) -> PlatformResult<Value>;

    /// The platform's post-login simulation step, run on every exit path.
    async fn post_login_flow(&self, session: &PlatformSession) -> PlatformResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn benign_post_login_matches_suggested_searches() {
        let err = PlatformError::NotFound {
            resource: "/api/v1/fbsearch/suggested_searches/?type=users".into(),
        };
        assert!(is_benign_post_login(&err));
    }

    #[test]
    fn other_not_found_is_not_benign() {
        let err = PlatformError::NotFound {
            resource: "/api/v1/media/configure".into(),
        };
        assert!(!is_benign_post_login(&err));
    }

    #[test]
    fn non_not_found_is_not_benign() {
        let err = PlatformError::Status {
            operation: "post-login flow".into(),
            status: 500,
            body: "suggested_searches".into(),
        };
        assert!(!is_benign_post_login(&err));
    }
}
