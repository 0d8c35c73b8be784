//! Exponential backoff for rate-limited API calls.

use std::{future::Future, time::Duration};

use {reqwest::StatusCode, tracing::warn};

use crate::error::{Error, Result};

/// Named retry policy for the content-generation call sites. Distinct from
/// the upload-side profiles: those use fixed or zero delay, this one doubles.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl BackoffPolicy {
    /// Delay before retrying after the given zero-based attempt:
    /// `base * 2^attempt`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Run `request` with backoff on rate-limit responses.
///
/// A 429 sleeps `base * 2^attempt` and retries, up to `max_attempts`; there
/// is no sleep after the final attempt. Any other error status propagates
/// immediately without retrying.
pub async fn execute_with_backoff<F, Fut>(
    policy: &BackoffPolicy,
    operation: &str,
    mut request: F,
) -> Result<reqwest::Response>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<reqwest::Response, reqwest::Error>>,
{
    for attempt in 0..policy.max_attempts {
        let response = request()
            .await
            .map_err(|e| Error::transport(operation, e))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            if attempt + 1 == policy.max_attempts {
                break;
            }
            let delay = policy.delay_for(attempt);
            warn!(
                operation,
                attempt = attempt + 1,
                max_attempts = policy.max_attempts,
                delay_ms = delay.as_millis() as u64,
                "rate limited, backing off"
            );
            tokio::time::sleep(delay).await;
            continue;
        }

        if !status.is_success() {
            return Err(Error::status(operation, status.as_u16()));
        }

        return Ok(response);
    }

    Err(Error::RateLimited {
        attempts: policy.max_attempts,
    })
}
