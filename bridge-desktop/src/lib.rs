//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! - `HttpTransport` using blocking `reqwest` with rustls
//! - `Clock` and `Sleeper` are re-exported from `bridge-traits`, whose system
//!   implementations already suit desktop hosts
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::ReqwestHttpClient;
//! use std::sync::Arc;
//!
//! let http = Arc::new(ReqwestHttpClient::new()?);
//! // Hand `http` to core_auth::AuthContext::new(...)
//! ```

mod http;

pub use bridge_traits::time::{SystemClock, ThreadSleeper};
pub use http::ReqwestHttpClient;
