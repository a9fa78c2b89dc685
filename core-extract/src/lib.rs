//! # Extraction Module
//!
//! Pulls data out of the platform's REST API into memory or onto disk.
//!
//! ## Overview
//!
//! - [`JsonContent`] accumulates a paginated JSON collection and stitches the
//!   pages into one document as they arrive.
//! - [`MediaContent`] accumulates binary payloads verbatim.
//! - [`Extractor`] drives fetches: token validation, retries, throttling and
//!   pagination.
//! - [`Endpoint`] names the v1 REST resources with their bulk query presets.
//!
//! ## Usage
//!
//! ```ignore
//! use core_auth::BearerToken;
//! use core_extract::{Endpoint, Extractor, JsonContent};
//! use core_runtime::ExtractConfig;
//!
//! let config = ExtractConfig::from_env()?;
//! let extractor = Extractor::desktop(&config)?;
//! let mut token = BearerToken::from_config(&config);
//! let mut json = JsonContent::from_config(&config);
//!
//! let url = Endpoint::Extension.url(&config.server_url).unwrap_or_default();
//! extractor.json_to_buffer(&mut token, &mut json, &url)?;
//! json.write_file("ext.json");
//! ```

pub mod endpoints;
pub mod extractor;
pub mod growth;
pub mod json;
pub mod media;
pub mod output;

pub use endpoints::Endpoint;
pub use extractor::Extractor;
pub use growth::{BufferError, GrowthPolicy};
pub use json::JsonContent;
pub use media::MediaContent;
pub use output::{Output, WriterSink};
