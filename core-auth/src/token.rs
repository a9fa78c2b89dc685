//! # Bearer Token Manager
//!
//! Owns the raw credentials and the current bearer token for one session.
//!
//! ## Lifecycle
//!
//! ```text
//! Uninitialized --materialize--> Materialized --token request--> Valid
//!       |                                ^                          |
//!       |                                +------ expiry <= now -----+
//!       +--credentials too long--> OutOfSpace (sticky until set_credentials)
//! ```
//!
//! Materializing copies the client id, client secret and JWT assertion into a
//! [`CredentialSlab`], back to front, together with the form-encoded grant
//! prefix so that `prefix + jwt` reads as the complete token request body.
//! The caller's `String`s are dropped once copied; the slab is the only copy.
//!
//! The token endpoint's response is received into the slab's free front
//! region (silently truncated at its size) and the access token, token type
//! and lifetime are located there by the minimal [`scanner`](crate::scanner).
//!
//! Each operation records its outcome as a [`TokenStatus`] plus message,
//! readable through [`BearerToken::status`] and [`BearerToken::error_message`].

use crate::context::AuthContext;
use crate::error::{Result, TokenError, TokenStatus};
use crate::limiter::RetryPolicy;
use crate::scanner;
use crate::slab::{CredentialSlab, Span};
use bridge_traits::error::Result as BridgeResult;
use bridge_traits::http::{BodySink, HttpRequest};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use core_runtime::config::ExtractConfig;
use std::ops::Range;
use std::time::Duration;
use tracing::{debug, error, info, instrument, trace};

/// Form-encoded JWT bearer grant; the assertion follows directly.
pub const GRANT_PREFIX: &str =
    "grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer&assertion=";

/// Client credentials and JWT assertion supplied by the host.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub jwt: Option<String>,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        jwt: impl Into<String>,
    ) -> Self {
        Self {
            client_id: Some(client_id.into()),
            client_secret: Some(client_secret.into()),
            jwt: Some(jwt.into()),
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            jwt: config.jwt.clone(),
        }
    }

    /// Client id, client secret and JWT, if all three are present.
    pub fn parts(&self) -> Option<(&str, &str, &str)> {
        Some((
            self.client_id.as_deref()?,
            self.client_secret.as_deref()?,
            self.jwt.as_deref()?,
        ))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "***"))
            .field("jwt", &self.jwt.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPhase {
    Uninitialized,
    Materialized,
    Valid,
    OutOfSpace,
}

#[derive(Debug, Clone, Copy)]
struct Fields {
    client_id: Span,
    client_secret: Span,
    prefix: Span,
    jwt: Span,
}

/// Lay out `jwt`, the grant prefix, `secret` and `id`, back to front.
fn place_fields(slab: &mut CredentialSlab, id: &str, secret: &str, jwt: &str) -> Result<Fields> {
    let jwt = slab.place_back(jwt.as_bytes(), true)?;
    let prefix = slab.place_back(GRANT_PREFIX.as_bytes(), false)?;
    let client_secret = slab.place_back(secret.as_bytes(), true)?;
    let client_id = slab.place_back(id.as_bytes(), true)?;
    Ok(Fields {
        client_id,
        client_secret,
        prefix,
        jwt,
    })
}

/// Receives a response into a fixed region, dropping whatever does not fit.
struct RegionSink<'a> {
    region: &'a mut [u8],
    len: usize,
}

impl BodySink for RegionSink<'_> {
    fn write_chunk(&mut self, chunk: &[u8]) -> BridgeResult<()> {
        let room = self.region.len() - self.len;
        let n = chunk.len().min(room);
        self.region[self.len..self.len + n].copy_from_slice(&chunk[..n]);
        self.len += n;
        if n < chunk.len() {
            trace!(dropped = chunk.len() - n, "Token response truncated");
        }
        Ok(())
    }
}

pub struct BearerToken {
    token_url: String,
    request_timeout: Option<Duration>,
    pending: Credentials,
    slab: CredentialSlab,
    fields: Option<Fields>,
    access_token: Option<Range<usize>>,
    token_type: Option<Range<usize>>,
    expires_at: Option<DateTime<Utc>>,
    phase: TokenPhase,
    status: TokenStatus,
    message: String,
}

impl std::fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerToken")
            .field("token_url", &self.token_url)
            .field("phase", &self.phase)
            .field("status", &self.status)
            .field("expires_at", &self.expires_at)
            .field("slab", &self.slab)
            .finish()
    }
}

impl BearerToken {
    pub fn new(token_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            token_url: token_url.into(),
            request_timeout: None,
            pending: credentials,
            slab: CredentialSlab::new(),
            fields: None,
            access_token: None,
            token_type: None,
            expires_at: None,
            phase: TokenPhase::Uninitialized,
            status: TokenStatus::Uninitialized,
            message: TokenError::Uninitialized.to_string(),
        }
    }

    pub fn from_config(config: &ExtractConfig) -> Self {
        let token = Self::new(config.token_url(), Credentials::from_config(config));
        match config.request_timeout {
            Some(timeout) => token.with_request_timeout(timeout),
            None => token,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Replace the credentials and return to `Uninitialized`.
    ///
    /// This is the only way out of `OutOfSpace`.
    pub fn set_credentials(&mut self, credentials: Credentials) {
        self.slab.clear();
        self.pending = credentials;
        self.fields = None;
        self.clear_token();
        self.phase = TokenPhase::Uninitialized;
        self.status = TokenStatus::Uninitialized;
        self.message = TokenError::Uninitialized.to_string();
    }

    /// Copy the credentials into the slab.
    ///
    /// A no-op once materialized. Fails with `MissingCredentials` if any of
    /// the three inputs is absent, and with `OutOfSpace` if they do not fit.
    pub fn materialize(&mut self) -> Result<()> {
        let outcome = self.materialize_fields();
        self.record(outcome)
    }

    /// Make sure a token that has not expired at the clock's current time is
    /// held, requesting a new one if needed.
    #[instrument(skip(self, ctx), fields(url = %self.token_url))]
    pub fn ensure_valid(&mut self, ctx: &AuthContext) -> Result<()> {
        let outcome = self.validate_or_request(ctx);
        self.record(outcome)
    }

    /// Access token of a materialized, acquired token.
    pub fn bearer(&self) -> Result<&str> {
        self.access_token().ok_or(TokenError::Uninitialized)
    }

    /// Record the outcome of an operation performed on behalf of this token.
    pub fn record<T>(&mut self, outcome: Result<T>) -> Result<T> {
        match &outcome {
            Ok(_) => {
                self.status = TokenStatus::Ok;
                self.message.clear();
            }
            Err(e) => {
                self.status = e.status();
                self.message = e.to_string();
            }
        }
        outcome
    }

    pub fn status(&self) -> TokenStatus {
        self.status
    }

    /// Message describing the last failure; empty after a success.
    pub fn error_message(&self) -> &str {
        &self.message
    }

    pub fn phase(&self) -> TokenPhase {
        self.phase
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.clone().map(|r| self.received_text(r))
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.clone().map(|r| self.received_text(r))
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.phase == TokenPhase::Valid && self.expires_at.is_some_and(|at| at > now)
    }

    /// Free bytes left in the credential slab.
    pub fn available(&self) -> usize {
        self.slab.available()
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    fn received_text(&self, range: Range<usize>) -> &str {
        std::str::from_utf8(&self.slab.receive_region()[range]).unwrap_or_default()
    }

    fn clear_token(&mut self) {
        self.access_token = None;
        self.token_type = None;
        self.expires_at = None;
    }

    fn materialize_fields(&mut self) -> Result<()> {
        match self.phase {
            TokenPhase::Materialized | TokenPhase::Valid => return Ok(()),
            TokenPhase::OutOfSpace => return Err(TokenError::OutOfSpace),
            TokenPhase::Uninitialized => {}
        }

        let Some((id, secret, jwt)) = self.pending.parts() else {
            return Err(TokenError::MissingCredentials);
        };

        match place_fields(&mut self.slab, id, secret, jwt) {
            Ok(fields) => {
                self.fields = Some(fields);
                self.pending = Credentials::default();
                self.phase = TokenPhase::Materialized;
                debug!(available = self.slab.available(), "Credentials materialized");
                Ok(())
            }
            Err(e) => {
                self.slab.clear();
                self.phase = TokenPhase::OutOfSpace;
                error!(capacity = self.slab.capacity(), "Credentials exceed slab capacity");
                Err(e)
            }
        }
    }

    fn validate_or_request(&mut self, ctx: &AuthContext) -> Result<()> {
        self.materialize_fields()?;

        if self.is_valid_at(ctx.clock.now()) {
            return Ok(());
        }

        self.request_token(ctx)
    }

    fn request_token(&mut self, ctx: &AuthContext) -> Result<()> {
        let fields = self.fields.ok_or(TokenError::Uninitialized)?;
        self.clear_token();
        self.phase = TokenPhase::Materialized;

        let mut request = HttpRequest::post(self.token_url.as_str())
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .basic_auth(
                self.slab.text(fields.client_id),
                self.slab.text(fields.client_secret),
            )
            .body(Bytes::copy_from_slice(
                self.slab.joined(fields.prefix, fields.jwt),
            ));
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        debug!("Requesting bearer token");

        let slab = &mut self.slab;
        let mut received = 0;
        ctx.limiter.run(
            RetryPolicy::single_shot(),
            || Ok(()),
            |()| {
                let mut sink = RegionSink {
                    region: slab.receive_region_mut(),
                    len: 0,
                };
                let head = ctx.http.perform(&request, &mut sink);
                received = sink.len;
                head
            },
        )?;

        let now = ctx.clock.now();
        let body = &self.slab.receive_region()[..received];

        let access = scanner::extract_field(body, "access_token");
        let kind = scanner::extract_field(body, "token_type");
        let lifetime = scanner::extract_seconds(body, "expires_in");

        let (Some(access), Some(kind), Some(lifetime)) = (access, kind, lifetime) else {
            debug!(bytes = received, "Token response lacks required fields");
            return Err(TokenError::Parsing);
        };
        if std::str::from_utf8(&body[access.clone()]).is_err()
            || std::str::from_utf8(&body[kind.clone()]).is_err()
        {
            return Err(TokenError::Parsing);
        }

        let expires_at = i64::try_from(lifetime)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .and_then(|d| now.checked_add_signed(d))
            .filter(|at| *at > now)
            .ok_or(TokenError::Parsing)?;

        self.access_token = Some(access);
        self.token_type = Some(kind);
        self.expires_at = Some(expires_at);
        self.phase = TokenPhase::Valid;

        info!(
            token_type = self.token_type().unwrap_or_default(),
            expires_in = lifetime,
            "Bearer token acquired"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slab::SLAB_CAPACITY;
    use bridge_traits::error::BridgeError;
    use bridge_traits::http::{HttpMethod, HttpTransport, ResponseHead};
    use bridge_traits::time::{Clock, Sleeper};
    use chrono::TimeZone;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const TOKEN_URL: &str = "https://platform.devtest.ringcentral.com/restapi/oauth/token";
    const GOOD: &str =
        r#"{"access_token":"AT-123","token_type":"bearer","expires_in":3600,"scope":"ReadAccounts"}"#;

    type Scripted = std::result::Result<(u16, Vec<u8>), String>;

    #[derive(Default)]
    struct FakeTransport {
        script: Mutex<VecDeque<Scripted>>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl FakeTransport {
        fn with(script: Vec<Scripted>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    impl HttpTransport for FakeTransport {
        fn perform(
            &self,
            request: &HttpRequest,
            sink: &mut dyn BodySink,
        ) -> BridgeResult<ResponseHead> {
            self.requests.lock().unwrap().push(request.clone());
            match self.script.lock().unwrap().pop_front() {
                Some(Ok((status, body))) => {
                    let head = ResponseHead::new(status);
                    if head.is_success() {
                        for chunk in body.chunks(7) {
                            sink.write_chunk(chunk)?;
                        }
                    }
                    Ok(head)
                }
                Some(Err(msg)) => Err(BridgeError::OperationFailed(msg)),
                None => panic!("unexpected request to {}", request.url),
            }
        }
    }

    struct TestClock(Mutex<DateTime<Utc>>);

    impl TestClock {
        fn at(secs: i64) -> Arc<Self> {
            Arc::new(Self(Mutex::new(Utc.timestamp_opt(secs, 0).unwrap())))
        }

        fn set(&self, secs: i64) {
            *self.0.lock().unwrap() = Utc.timestamp_opt(secs, 0).unwrap();
        }
    }

    impl Clock for TestClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    struct NoSleep;

    impl Sleeper for NoSleep {
        fn sleep(&self, _duration: Duration) {}
    }

    fn ctx(http: Arc<FakeTransport>, clock: Arc<TestClock>) -> AuthContext {
        AuthContext::new(http, clock, Arc::new(NoSleep))
    }

    fn ok(body: &str) -> Scripted {
        Ok((200, body.as_bytes().to_vec()))
    }

    fn token() -> BearerToken {
        BearerToken::new(TOKEN_URL, Credentials::new("client", "secret", "header.payload.sig"))
    }

    #[test]
    fn test_initial_state() {
        let token = token();
        assert_eq!(token.phase(), TokenPhase::Uninitialized);
        assert_eq!(token.status(), TokenStatus::Uninitialized);
        assert_eq!(token.error_message(), "Token has not been materialized.");
        assert_eq!(token.bearer(), Err(TokenError::Uninitialized));
    }

    #[test]
    fn test_materialize_layout_and_idempotence() {
        let mut token = token();
        token.materialize().unwrap();

        let used = ("header.payload.sig".len() + 1)
            + GRANT_PREFIX.len()
            + ("secret".len() + 1)
            + ("client".len() + 1);
        assert_eq!(token.available(), SLAB_CAPACITY - used);
        assert_eq!(token.phase(), TokenPhase::Materialized);
        assert_eq!(token.status(), TokenStatus::Ok);

        token.materialize().unwrap();
        assert_eq!(token.available(), SLAB_CAPACITY - used);
    }

    #[test]
    fn test_missing_credentials_make_no_request() {
        let http = FakeTransport::with(vec![]);
        let context = ctx(http.clone(), TestClock::at(1_000));
        let mut token = BearerToken::new(TOKEN_URL, Credentials::default());

        assert_eq!(token.ensure_valid(&context), Err(TokenError::MissingCredentials));
        assert_eq!(token.status(), TokenStatus::MissingCredentials);
        assert_eq!(token.error_message(), "Missing credentials.");
        assert_eq!(http.calls(), 0);

        // Recoverable once credentials are supplied
        token.set_credentials(Credentials::new("client", "secret", "jwt"));
        assert!(token.materialize().is_ok());
    }

    #[test]
    fn test_out_of_space_is_sticky_until_new_credentials() {
        let long_jwt = "j".repeat(SLAB_CAPACITY);
        let mut token = BearerToken::new(TOKEN_URL, Credentials::new("client", "secret", long_jwt));

        assert_eq!(token.materialize(), Err(TokenError::OutOfSpace));
        assert_eq!(token.phase(), TokenPhase::OutOfSpace);
        assert_eq!(token.error_message(), "Insufficient space: credentials are too long.");
        assert_eq!(token.available(), SLAB_CAPACITY);

        assert_eq!(token.materialize(), Err(TokenError::OutOfSpace));

        token.set_credentials(Credentials::new("client", "secret", "jwt"));
        assert!(token.materialize().is_ok());
    }

    #[test]
    fn test_token_request_shape() {
        let http = FakeTransport::with(vec![ok(GOOD)]);
        let clock = TestClock::at(1_000);
        let context = ctx(http.clone(), clock);
        let mut token = token();

        token.ensure_valid(&context).unwrap();

        let requests = http.requests.lock().unwrap();
        let request = &requests[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, TOKEN_URL);
        assert_eq!(
            request.headers.get("Content-Type").map(String::as_str),
            Some("application/x-www-form-urlencoded")
        );
        // base64("client:secret")
        assert_eq!(
            request.headers.get("Authorization").map(String::as_str),
            Some("Basic Y2xpZW50OnNlY3JldA==")
        );
        let expected = format!("{}header.payload.sig", GRANT_PREFIX);
        assert_eq!(request.body.as_deref(), Some(expected.as_bytes()));
    }

    #[test]
    fn test_acquire_and_reuse_until_expiry() {
        let http = FakeTransport::with(vec![
            ok(GOOD),
            ok(r#"{"access_token":"AT-456","token_type":"bearer","expires_in":60}"#),
        ]);
        let clock = TestClock::at(1_000);
        let context = ctx(http.clone(), clock.clone());
        let mut token = token();

        token.ensure_valid(&context).unwrap();
        assert_eq!(token.phase(), TokenPhase::Valid);
        assert_eq!(token.bearer(), Ok("AT-123"));
        assert_eq!(token.token_type(), Some("bearer"));
        assert_eq!(token.expires_at(), Some(Utc.timestamp_opt(4_600, 0).unwrap()));
        assert_eq!(token.status(), TokenStatus::Ok);
        assert_eq!(token.error_message(), "");

        clock.set(4_599);
        token.ensure_valid(&context).unwrap();
        assert_eq!(http.calls(), 1);

        // Expiry equal to now is expired
        clock.set(4_600);
        token.ensure_valid(&context).unwrap();
        assert_eq!(http.calls(), 2);
        assert_eq!(token.bearer(), Ok("AT-456"));
        assert_eq!(token.expires_at(), Some(Utc.timestamp_opt(4_660, 0).unwrap()));
    }

    #[test]
    fn test_unparsable_response() {
        let http = FakeTransport::with(vec![
            ok(r#"{"access_token":"AT-1","expires_in":3600}"#),
            ok(r#"{"access_token":"AT-1","token_type":"bearer","expires_in":0}"#),
            ok("<html>gateway</html>"),
        ]);
        let context = ctx(http.clone(), TestClock::at(1_000));
        let mut token = token();

        for _ in 0..3 {
            assert_eq!(token.ensure_valid(&context), Err(TokenError::Parsing));
            assert_eq!(token.status(), TokenStatus::ParsingError);
            assert_eq!(
                token.error_message(),
                "Token parsing error: unknown access token format."
            );
            assert_eq!(token.phase(), TokenPhase::Materialized);
            assert!(token.access_token().is_none());
        }
        assert_eq!(http.calls(), 3);
    }

    #[test]
    fn test_http_and_transport_failures_are_single_shot() {
        let http = FakeTransport::with(vec![
            Ok((503, Vec::new())),
            Ok((401, Vec::new())),
            Err("connection refused".to_string()),
            ok(GOOD),
        ]);
        let context = ctx(http.clone(), TestClock::at(1_000));
        let mut token = token();

        assert_eq!(
            token.ensure_valid(&context),
            Err(TokenError::HttpStatus { status: 503 })
        );
        assert_eq!(http.calls(), 1);
        assert_eq!(
            token.ensure_valid(&context),
            Err(TokenError::HttpStatus { status: 401 })
        );
        assert_eq!(token.status(), TokenStatus::HttpStatusError);
        assert!(matches!(
            token.ensure_valid(&context),
            Err(TokenError::TransferFailed(_))
        ));
        assert_eq!(token.status(), TokenStatus::TransferFailed);

        token.ensure_valid(&context).unwrap();
        assert_eq!(token.bearer(), Ok("AT-123"));
    }

    #[test]
    fn test_response_truncated_to_free_region() {
        // Leave exactly 120 free bytes at the front of the slab
        let fixed = GRANT_PREFIX.len() + ("secret".len() + 1) + ("client".len() + 1);
        let jwt = "j".repeat(SLAB_CAPACITY - 120 - fixed - 1);
        let mut token = BearerToken::new(TOKEN_URL, Credentials::new("client", "secret", jwt));
        token.materialize().unwrap();
        assert_eq!(token.available(), 120);

        let body = format!(
            r#"{{"access_token":"AT-9","token_type":"bearer","expires_in":60,"pad":"{}"}}"#,
            "x".repeat(500)
        );
        let http = FakeTransport::with(vec![ok(&body)]);
        let context = ctx(http, TestClock::at(0));

        token.ensure_valid(&context).unwrap();
        assert_eq!(token.bearer(), Ok("AT-9"));
    }

    #[test]
    fn test_from_config() {
        let config = ExtractConfig::builder()
            .production(true)
            .client_id("a")
            .client_secret("b")
            .jwt("c")
            .request_timeout(Duration::from_secs(9))
            .build()
            .unwrap();
        let token = BearerToken::from_config(&config);

        assert_eq!(
            token.token_url(),
            "https://platform.ringcentral.com/restapi/oauth/token"
        );
        assert_eq!(token.request_timeout, Some(Duration::from_secs(9)));
        assert_eq!(token.pending.parts(), Some(("a", "b", "c")));
    }

    #[test]
    fn test_credentials_parts_require_all_three() {
        assert_eq!(
            Credentials::new("id", "secret", "jwt").parts(),
            Some(("id", "secret", "jwt"))
        );

        let mut creds = Credentials::new("id", "secret", "jwt");
        creds.client_secret = None;
        assert_eq!(creds.parts(), None);
        assert_eq!(Credentials::default().parts(), None);
    }

    #[test]
    fn test_credentials_debug_hides_secrets() {
        let creds = Credentials::new("id", "topsecret", "jwt-value");
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("topsecret"));
        assert!(!rendered.contains("jwt-value"));
    }
}
