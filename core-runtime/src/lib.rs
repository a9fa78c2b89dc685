//! # Core Runtime Module
//!
//! Foundational runtime infrastructure shared by the extraction crates:
//! - Logging and tracing setup
//! - Extraction configuration (builder and environment loading)
//!
//! Nothing in here performs network I/O; it only establishes the settings and
//! logging conventions that `core-auth` and `core-extract` rely on.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{EnvNames, ExtractConfig, ExtractConfigBuilder};
pub use error::{Error, Result};
