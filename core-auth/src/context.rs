//! Collaborators shared by token acquisition and data fetches.

use crate::limiter::RateLimiter;
use bridge_traits::http::HttpTransport;
use bridge_traits::time::{Clock, Sleeper};
use std::sync::Arc;

/// Host capabilities needed to talk to the platform.
///
/// Cheap to clone; every field is reference counted. One context may back any
/// number of token/buffer pairs, but each pair is used by one caller at a time.
#[derive(Clone)]
pub struct AuthContext {
    pub http: Arc<dyn HttpTransport>,
    pub clock: Arc<dyn Clock>,
    pub limiter: RateLimiter,
}

impl AuthContext {
    pub fn new(
        http: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        let limiter = RateLimiter::new(sleeper, Arc::clone(&clock));
        Self {
            http,
            clock,
            limiter,
        }
    }
}
