//! Workspace facade crate.
//!
//! Re-exports the extraction crates under one name so host applications can
//! depend on `ringex-workspace` alone. The `desktop-shims` feature (on by
//! default) adds the blocking reqwest transport and
//! [`Extractor::desktop`](core_extract::Extractor).

pub use bridge_traits as bridge;
pub use core_auth as auth;
pub use core_extract as extract;
pub use core_runtime as runtime;

#[cfg(feature = "desktop-shims")]
pub use bridge_desktop as desktop;

pub use core_auth::{BearerToken, Credentials, TokenError, TokenStatus};
pub use core_extract::{Endpoint, Extractor, JsonContent, MediaContent, Output};
pub use core_runtime::ExtractConfig;
