//! Retrying HTTP transport for generative backends
//!
//! The hosted model answers 503 when it is overloaded. Those responses (and
//! transport failures) are retried with exponential backoff; every other
//! non-2xx status fails immediately.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// HTTP status the upstream uses for "overloaded, try again"
pub const STATUS_OVERLOADED: u16 = 503;

/// Retry configuration for one kind of call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Wait after the first failed attempt; doubles after each further failure
    #[serde(rename = "base_delay_ms", with = "duration_ms")]
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Policy with `max_attempts` attempts and `base_delay` backoff base
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// A single attempt, never waits
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Wait before the attempt following 0-based `attempt`: base * 2^attempt
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

/// Status and body of one upstream response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Drain a reqwest response into a reply
    pub async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(Self { status, body })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Run `attempt_fn` until it succeeds or the policy gives up
///
/// `attempt_fn` receives the 0-based attempt number and performs one request.
/// Returns the body of the first 2xx reply.
pub async fn send_with_retry<F, Fut>(policy: &RetryPolicy, mut attempt_fn: F) -> Result<String>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<HttpReply>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..max_attempts {
        match attempt_fn(attempt).await {
            Ok(reply) if reply.is_success() => {
                debug!(attempt = attempt + 1, status = reply.status, "Upstream call succeeded");
                return Ok(reply.body);
            }
            Ok(reply) if reply.status == STATUS_OVERLOADED => {
                warn!(
                    attempt = attempt + 1,
                    status = reply.status,
                    body = %truncate(&reply.body, 200),
                    "Upstream overloaded"
                );
                last_error = Some(Error::Overloaded {
                    attempts: attempt + 1,
                    message: reply.body,
                });
            }
            Ok(reply) => {
                warn!(
                    attempt = attempt + 1,
                    status = reply.status,
                    body = %truncate(&reply.body, 200),
                    "Upstream call failed"
                );
                return Err(Error::Upstream {
                    status: reply.status,
                    message: reply.body,
                });
            }
            Err(e) if e.is_transport() => {
                warn!(attempt = attempt + 1, error = %e, "Upstream transport error");
                last_error = Some(e);
            }
            Err(e) => return Err(e),
        }

        if attempt + 1 < max_attempts {
            let wait = policy.delay_for(attempt);
            debug!(backoff_ms = wait.as_millis() as u64, "Waiting before retry");
            tokio::time::sleep(wait).await;
        }
    }

    Err(last_error.unwrap_or_else(|| Error::InvalidData("Max retries exceeded".into())))
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
