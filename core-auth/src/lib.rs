//! # Authentication Module
//!
//! JWT-bearer token lifecycle and rate-limit handling for the platform's
//! REST API.
//!
//! ## Overview
//!
//! - [`BearerToken`] holds credentials in a fixed 2048-byte [`CredentialSlab`]
//!   and exchanges the JWT assertion for a bearer token when the current one
//!   has expired.
//! - [`RateLimiter`] runs a request through the status-driven retry state
//!   machine (429 hint, 503 doubling backoff, proactive throttling on 2xx).
//! - [`AuthContext`] bundles the transport, clock and limiter that both of
//!   the above need.
//!
//! A token instance is single-owner: sequential reuse is expected, concurrent
//! use requires external synchronization or one instance per caller.

pub mod context;
pub mod error;
pub mod limiter;
pub mod scanner;
pub mod slab;
pub mod token;

pub use context::AuthContext;
pub use error::{Result, TokenError, TokenStatus};
pub use limiter::{RateLimiter, RetryPolicy};
pub use slab::{CredentialSlab, Span, SLAB_CAPACITY};
pub use token::{BearerToken, Credentials, TokenPhase, GRANT_PREFIX};
