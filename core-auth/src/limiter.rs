//! # Rate-Limit / Retry Controller
//!
//! Drives one logical request through the platform's rate limiting.
//!
//! | Status | Action |
//! |--------|--------|
//! | 2xx | Accept. If `x-rate-limit-remaining` is `0`, block for `x-rate-limit-window` seconds before returning. |
//! | 429 | Block for `Retry-After`, then retry. |
//! | 503 | Block for the current backoff, double it, then retry. |
//! | other | Fail with [`TokenError::HttpStatus`]. |
//! | transport failure | Fail with [`TokenError::TransferFailed`]. |
//!
//! Every physical request consumes one attempt, including the first. When
//! the budget is spent on a retryable status, the call fails with
//! `HttpStatus` carrying that status; no sleep follows the final attempt.

use crate::error::{Result, TokenError};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::ResponseHead;
use bridge_traits::time::{Clock, Sleeper};
use core_runtime::config::ExtractConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const REMAINING_HEADER: &str = "x-rate-limit-remaining";
pub const WINDOW_HEADER: &str = "x-rate-limit-window";

const TOO_MANY_REQUESTS: u16 = 429;
const SERVICE_UNAVAILABLE: u16 = 503;

/// Attempt budget and initial backoff for one logical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub min_backoff: Duration,
}

impl RetryPolicy {
    /// Default budget for data requests: 5 attempts, 15 s initial backoff.
    pub const AUTO: RetryPolicy = RetryPolicy {
        max_attempts: 5,
        min_backoff: Duration::from_secs(15),
    };

    pub fn new(max_attempts: u32, min_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            min_backoff,
        }
    }

    pub fn auto() -> Self {
        Self::AUTO
    }

    /// One attempt, no retries. Used for the token request.
    pub fn single_shot() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self::new(config.max_retry_attempts, config.min_retry_timeout)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::AUTO
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(sleeper: Arc<dyn Sleeper>, clock: Arc<dyn Clock>) -> Self {
        Self { sleeper, clock }
    }

    /// Run one logical request under `policy`.
    ///
    /// `authorize` runs before every physical attempt and produces whatever
    /// `perform` needs to authenticate (typically a freshly validated bearer
    /// token). Its errors are terminal. `perform` issues exactly one request.
    pub fn run<A, F, P>(&self, policy: RetryPolicy, mut authorize: F, mut perform: P) -> Result<ResponseHead>
    where
        F: FnMut() -> Result<A>,
        P: FnMut(A) -> BridgeResult<ResponseHead>,
    {
        let mut backoff = policy.min_backoff;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let auth = authorize()?;
            let head = perform(auth).map_err(|e| {
                warn!(attempt, error = %e, "Transfer failed");
                TokenError::TransferFailed(e.to_string())
            })?;

            if head.is_success() {
                debug!(status = head.status, attempt, "Request accepted");
                self.throttle(&head, policy.min_backoff);
                return Ok(head);
            }

            let delay = match head.status {
                TOO_MANY_REQUESTS => head.retry_after(self.clock.now()).unwrap_or(backoff),
                SERVICE_UNAVAILABLE => {
                    let current = backoff;
                    backoff = backoff.saturating_mul(2);
                    current
                }
                status => {
                    warn!(status, attempt, "Request rejected with non-retryable status");
                    return Err(TokenError::HttpStatus { status });
                }
            };

            if attempt >= policy.max_attempts {
                warn!(
                    status = head.status,
                    attempts = attempt,
                    "Retry budget exhausted"
                );
                return Err(TokenError::HttpStatus {
                    status: head.status,
                });
            }

            warn!(
                status = head.status,
                attempt,
                max_attempts = policy.max_attempts,
                delay_secs = delay.as_secs_f64(),
                "Rate limited, backing off"
            );
            self.sleeper.sleep(delay);
        }
    }

    /// Proactive throttling after an accepted response.
    ///
    /// Blocks only when the remaining-requests header is present and zero.
    /// A missing window header falls back to `fallback`. Returns the delay
    /// that was applied.
    pub fn throttle(&self, head: &ResponseHead, fallback: Duration) -> Option<Duration> {
        if head.header_u64(REMAINING_HEADER) != Some(0) {
            return None;
        }

        let window = head
            .header_u64(WINDOW_HEADER)
            .map(Duration::from_secs)
            .unwrap_or(fallback);

        warn!(
            window_secs = window.as_secs(),
            "Rate limit window exhausted, throttling"
        );
        self.sleeper.sleep(window);
        Some(window)
    }
}
