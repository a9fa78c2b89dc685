//! # Extraction Configuration
//!
//! Settings consumed by the token manager and the fetch engine.
//!
//! ## Overview
//!
//! [`ExtractConfig`] is built through [`ExtractConfigBuilder`]. Values can be
//! set explicitly, loaded from the process environment, or both; explicit
//! values always win over the environment.
//!
//! ## Environment
//!
//! | Variable | Field |
//! |----------|-------|
//! | `RC_SERVER_URL` | `server_url` (defaults to the sandbox platform) |
//! | `RC_CLIENT_ID` | `client_id` |
//! | `RC_CLIENT_SECRET` | `client_secret` |
//! | `RC_JWT` | `jwt` |
//!
//! Variable names can be changed through [`EnvNames`]. An unset or empty
//! variable leaves the field absent.
//!
//! Credentials are optional here: the token manager reports absent credentials
//! as `MissingCredentials` when it first needs them, not at configuration time.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::ExtractConfig;
//! use std::time::Duration;
//!
//! let config = ExtractConfig::builder()
//!     .production(true)
//!     .load_env()
//!     .min_retry_timeout(Duration::from_secs(20))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use std::time::Duration;
use url::Url;

/// Sandbox platform base URL.
pub const SANDBOX_SERVER_URL: &str = "https://platform.devtest.ringcentral.com";

/// Production platform base URL.
pub const PRODUCTION_SERVER_URL: &str = "https://platform.ringcentral.com";

pub const TOKEN_PATH: &str = "/restapi/oauth/token";

pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 5;
pub const DEFAULT_MIN_RETRY_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_GROWTH_QUANTUM: usize = 1024 * 1024;

const MAX_GROWTH_QUANTUM: usize = 1024 * 1024 * 1024;

/// Names of the environment variables read by [`ExtractConfigBuilder::load_env`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvNames {
    pub server_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub jwt: String,
}

impl Default for EnvNames {
    fn default() -> Self {
        Self {
            server_url: "RC_SERVER_URL".to_string(),
            client_id: "RC_CLIENT_ID".to_string(),
            client_secret: "RC_CLIENT_SECRET".to_string(),
            jwt: "RC_JWT".to_string(),
        }
    }
}

/// Validated extraction settings.
#[derive(Clone)]
pub struct ExtractConfig {
    /// Platform base URL, without trailing slash
    pub server_url: String,

    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Pre-issued JWT assertion exchanged for a bearer token
    pub jwt: Option<String>,

    /// Physical attempts per request, including the first
    pub max_retry_attempts: u32,
    /// Initial 503 backoff; doubles after every 503
    pub min_retry_timeout: Duration,

    /// Capacity step of the JSON buffer
    pub json_growth_quantum: usize,
    /// Capacity step of the media buffer
    pub media_growth_quantum: usize,

    /// Whole-request timeout applied by the transport, if any
    pub request_timeout: Option<Duration>,
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for ExtractConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractConfig")
            .field("server_url", &self.server_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("jwt", &self.jwt.as_ref().map(|_| "***"))
            .field("max_retry_attempts", &self.max_retry_attempts)
            .field("min_retry_timeout", &self.min_retry_timeout)
            .field("json_growth_quantum", &self.json_growth_quantum)
            .field("media_growth_quantum", &self.media_growth_quantum)
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            server_url: SANDBOX_SERVER_URL.to_string(),
            client_id: None,
            client_secret: None,
            jwt: None,
            max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
            min_retry_timeout: DEFAULT_MIN_RETRY_TIMEOUT,
            json_growth_quantum: DEFAULT_GROWTH_QUANTUM,
            media_growth_quantum: DEFAULT_GROWTH_QUANTUM,
            request_timeout: None,
            user_agent: None,
        }
    }
}

impl ExtractConfig {
    /// Creates a new builder for constructing an `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::default()
    }

    /// Build a configuration from the process environment using default
    /// variable names.
    pub fn from_env() -> Result<Self> {
        Self::builder().load_env().build()
    }

    /// OAuth token endpoint.
    pub fn token_url(&self) -> String {
        format!("{}{}", self.server_url, TOKEN_PATH)
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The server URL parses and uses https (plain http only for loopback hosts)
    /// - At least one attempt is allowed per request
    /// - Growth quanta are non-zero and at most 1 GiB
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.server_url)?;
        match url.scheme() {
            "https" => {}
            "http" if is_loopback(&url) => {}
            other => {
                return Err(Error::Config(format!(
                    "Server URL must use https, got '{}'",
                    other
                )))
            }
        }
        if url.host_str().is_none() {
            return Err(Error::Config("Server URL has no host".to_string()));
        }

        if self.max_retry_attempts == 0 {
            return Err(Error::Config(
                "Retry attempts must be greater than 0".to_string(),
            ));
        }

        for (name, quantum) in [
            ("JSON", self.json_growth_quantum),
            ("Media", self.media_growth_quantum),
        ] {
            if quantum == 0 {
                return Err(Error::Config(format!(
                    "{} growth quantum must be greater than 0",
                    name
                )));
            }
            if quantum > MAX_GROWTH_QUANTUM {
                return Err(Error::Config(format!(
                    "{} growth quantum exceeds maximum of 1 GiB",
                    name
                )));
            }
        }

        Ok(())
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(d)) => d == "localhost",
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// Builder for constructing [`ExtractConfig`] instances.
#[derive(Default)]
pub struct ExtractConfigBuilder {
    server_url: Option<String>,
    production: bool,
    client_id: Option<String>,
    client_secret: Option<String>,
    jwt: Option<String>,
    env_names: EnvNames,
    max_retry_attempts: Option<u32>,
    min_retry_timeout: Option<Duration>,
    json_growth_quantum: Option<usize>,
    media_growth_quantum: Option<usize>,
    request_timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl ExtractConfigBuilder {
    /// Sets an explicit server base URL; overrides `production`.
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = Some(url.into());
        self
    }

    /// Selects the production platform instead of the sandbox.
    pub fn production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }

    pub fn client_id(mut self, value: impl Into<String>) -> Self {
        self.client_id = Some(value.into());
        self
    }

    pub fn client_secret(mut self, value: impl Into<String>) -> Self {
        self.client_secret = Some(value.into());
        self
    }

    pub fn jwt(mut self, value: impl Into<String>) -> Self {
        self.jwt = Some(value.into());
        self
    }

    /// Overrides the environment variable names used by [`load_env`](Self::load_env).
    pub fn env_names(mut self, names: EnvNames) -> Self {
        self.env_names = names;
        self
    }

    pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = Some(attempts);
        self
    }

    pub fn min_retry_timeout(mut self, timeout: Duration) -> Self {
        self.min_retry_timeout = Some(timeout);
        self
    }

    /// Sets the JSON buffer growth quantum; 0 selects the default.
    pub fn json_growth_quantum(mut self, bytes: usize) -> Self {
        self.json_growth_quantum = Some(bytes);
        self
    }

    /// Sets the media buffer growth quantum; 0 selects the default.
    pub fn media_growth_quantum(mut self, bytes: usize) -> Self {
        self.media_growth_quantum = Some(bytes);
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Fill unset fields from the process environment.
    pub fn load_env(self) -> Self {
        self.load_env_with(|name| std::env::var(name).ok())
    }

    /// Fill unset fields from an arbitrary variable lookup.
    pub fn load_env_with<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if self.server_url.is_none() {
            self.server_url = read(&self.env_names.server_url);
        }
        if self.client_id.is_none() {
            self.client_id = read(&self.env_names.client_id);
        }
        if self.client_secret.is_none() {
            self.client_secret = read(&self.env_names.client_secret);
        }
        if self.jwt.is_none() {
            self.jwt = read(&self.env_names.jwt);
        }
        self
    }

    /// Builds the configuration, validating it first.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] or [`Error::InvalidUrl`] when
    /// [`ExtractConfig::validate`] fails.
    pub fn build(self) -> Result<ExtractConfig> {
        let server_url = self
            .server_url
            .unwrap_or_else(|| {
                if self.production {
                    PRODUCTION_SERVER_URL.to_string()
                } else {
                    SANDBOX_SERVER_URL.to_string()
                }
            })
            .trim_end_matches('/')
            .to_string();

        let quantum = |q: Option<usize>| match q {
            None | Some(0) => DEFAULT_GROWTH_QUANTUM,
            Some(q) => q,
        };

        let config = ExtractConfig {
            server_url,
            client_id: self.client_id,
            client_secret: self.client_secret,
            jwt: self.jwt,
            max_retry_attempts: self
                .max_retry_attempts
                .unwrap_or(DEFAULT_MAX_RETRY_ATTEMPTS),
            min_retry_timeout: self.min_retry_timeout.unwrap_or(DEFAULT_MIN_RETRY_TIMEOUT),
            json_growth_quantum: quantum(self.json_growth_quantum),
            media_growth_quantum: quantum(self.media_growth_quantum),
            request_timeout: self.request_timeout,
            user_agent: self.user_agent,
        };

        config.validate()?;
        Ok(config)
    }
}
