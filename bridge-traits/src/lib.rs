//! # Host Bridge Traits
//!
//! Capability contracts the extraction core consumes but does not implement.
//!
//! ## Overview
//!
//! The fetch engine never talks to the network, the wall clock, or the thread
//! scheduler directly. Each of those is a trait defined here so the core can be
//! driven by a real HTTP client in production and by scripted fakes in tests.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpTransport`](http::HttpTransport) - One blocking HTTP exchange with a streaming body sink
//! - [`BodySink`](http::BodySink) - Receives response body chunks as they arrive
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Wall-clock source for token expiry
//! - [`Sleeper`](time::Sleeper) - Blocking delay used by backoff and throttling
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert client-specific failures into it with an actionable message.
//!
//! ## Thread Safety
//!
//! Capabilities are `Send + Sync` so a single transport can be shared behind an
//! `Arc` by several independent token/buffer pairs.
//!
//! ## Example
//!
//! ```ignore
//! use bridge_traits::http::{BodySink, HttpRequest, HttpTransport, ResponseHead};
//! use bridge_traits::error::Result;
//!
//! struct MyTransport;
//!
//! impl HttpTransport for MyTransport {
//!     fn perform(&self, request: &HttpRequest, sink: &mut dyn BodySink) -> Result<ResponseHead> {
//!         // Issue the request, feed 2xx body chunks into `sink`
//!         todo!()
//!     }
//! }
//! ```

pub mod error;
pub mod http;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use http::{BodySink, HttpMethod, HttpRequest, HttpTransport, ResponseHead};
pub use time::{
    Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, Sleeper, SystemClock, ThreadSleeper,
};
