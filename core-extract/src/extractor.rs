//! # Transport Driver
//!
//! Binds a [`BearerToken`], a destination and a URL to the rate limiter and
//! the host transport.
//!
//! Every fetch runs under [`RetryPolicy`] (by default 5 attempts, 15 s
//! minimum backoff). Before each physical attempt the token is validated and
//! refreshed if it has expired, so long paginations and retry sleeps never
//! send a stale bearer. The outcome of every fetch is recorded on the token;
//! callers read [`BearerToken::status`] and [`BearerToken::error_message`]
//! after the call, or use the returned `Result`.

use crate::json::JsonContent;
use crate::media::MediaContent;
use crate::output::{self, Output, WriterSink};
use bridge_traits::http::{BodySink, HttpRequest, ResponseHead};
use core_auth::{AuthContext, BearerToken, Result, RetryPolicy, TokenError};
use core_runtime::config::ExtractConfig;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

pub struct Extractor {
    ctx: AuthContext,
    policy: RetryPolicy,
    request_timeout: Option<Duration>,
}

impl Extractor {
    /// Driver with the automatic retry policy.
    pub fn new(ctx: AuthContext) -> Self {
        Self {
            ctx,
            policy: RetryPolicy::auto(),
            request_timeout: None,
        }
    }

    pub fn from_config(ctx: AuthContext, config: &ExtractConfig) -> Self {
        Self {
            ctx,
            policy: RetryPolicy::from_config(config),
            request_timeout: config.request_timeout,
        }
    }

    /// Driver backed by the desktop transport, system clock and thread sleeper.
    #[cfg(feature = "desktop-shims")]
    pub fn desktop(config: &ExtractConfig) -> Result<Self> {
        use bridge_desktop::{ReqwestHttpClient, SystemClock, ThreadSleeper};
        use std::sync::Arc;

        let client = match config.user_agent.as_deref() {
            Some(agent) => ReqwestHttpClient::with_options(config.request_timeout, agent),
            None => match config.request_timeout {
                Some(timeout) => ReqwestHttpClient::with_timeout(timeout),
                None => ReqwestHttpClient::new(),
            },
        }
        .map_err(|e| TokenError::TransportInit(e.to_string()))?;

        let ctx = AuthContext::new(
            Arc::new(client),
            Arc::new(SystemClock),
            Arc::new(ThreadSleeper),
        );
        Ok(Self::from_config(ctx, config))
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn context(&self) -> &AuthContext {
        &self.ctx
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Fetch `url` and every page that follows it into `json`.
    ///
    /// The buffer is reset first. Pagination stops at the first failed page;
    /// whatever was stitched before it stays in the buffer.
    #[instrument(skip(self, token, json))]
    pub fn json_to_buffer(
        &self,
        token: &mut BearerToken,
        json: &mut JsonContent,
        url: &str,
    ) -> Result<()> {
        json.reset();

        let mut next = url.to_owned();
        loop {
            self.fetch(token, json, &next)?;
            match json.finish_page() {
                Some(link) => next = link.to_owned(),
                None => break,
            }
            debug!(pages = json.pages(), "Following next page");
        }

        info!(
            pages = json.pages(),
            bytes = json.len(),
            "JSON extraction complete"
        );
        Ok(())
    }

    /// Stream one JSON response to `path` (stdout when `None`), without
    /// buffering or pagination.
    ///
    /// Returns where the bytes went, or `None` if the target could not be
    /// opened or the fetch failed.
    #[instrument(skip(self, token, path))]
    pub fn json_to_file(
        &self,
        token: &mut BearerToken,
        path: Option<&Path>,
        url: &str,
    ) -> Option<Output> {
        self.pass_through(token, path, url)
    }

    /// Fetch a binary resource into `media`, which is reset first.
    #[instrument(skip(self, token, media))]
    pub fn media_to_buffer(
        &self,
        token: &mut BearerToken,
        media: &mut MediaContent,
        url: &str,
    ) -> Result<()> {
        media.reset();
        self.fetch(token, media, url)?;
        info!(bytes = media.len(), "Media extraction complete");
        Ok(())
    }

    /// Stream a binary resource to `path` (stdout when `None`).
    #[instrument(skip(self, token, path))]
    pub fn media_to_file(
        &self,
        token: &mut BearerToken,
        path: Option<&Path>,
        url: &str,
    ) -> Option<Output> {
        self.pass_through(token, path, url)
    }

    fn pass_through(
        &self,
        token: &mut BearerToken,
        path: Option<&Path>,
        url: &str,
    ) -> Option<Output> {
        let (writer, target) = match output::open_target(path) {
            Ok(opened) => opened,
            Err(e) => {
                warn!(error = %e, "Cannot open output target");
                return None;
            }
        };

        let mut sink = WriterSink::new(writer);
        let fetched = self.fetch(token, &mut sink, url);
        let flushed = sink.flush();

        match (fetched, flushed) {
            (Ok(_), Ok(())) => {
                let file = target.path().map(output::log_name);
                info!(bytes = sink.written(), file = ?file, "Response written");
                Some(target)
            }
            (Err(_), _) => None,
            (Ok(_), Err(e)) => {
                warn!(error = %e, "Failed to flush output");
                None
            }
        }
    }

    /// One logical request: token validation, retries and throttling.
    ///
    /// The outcome is recorded on `token`.
    fn fetch(
        &self,
        token: &mut BearerToken,
        sink: &mut dyn BodySink,
        url: &str,
    ) -> Result<ResponseHead> {
        let ctx = &self.ctx;
        let timeout = self.request_timeout;

        let outcome = ctx.limiter.run(
            self.policy,
            || {
                token.ensure_valid(ctx)?;
                token.bearer().map(str::to_owned)
            },
            |bearer| {
                let mut request = HttpRequest::get(url).bearer_token(&bearer);
                if let Some(timeout) = timeout {
                    request = request.timeout(timeout);
                }
                ctx.http.perform(&request, &mut *sink)
            },
        );

        if let Err(TokenError::HttpStatus { status }) = &outcome {
            warn!(status, url, "Fetch rejected");
        }
        token.record(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::http::{HttpMethod, HttpTransport};
    use bridge_traits::time::{Clock, Sleeper};
    use chrono::{DateTime, TimeZone, Utc};
    use core_auth::{Credentials, TokenStatus};
    use mockall::{mock, predicate::eq};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    const TOKEN_URL: &str = "https://platform.test/restapi/oauth/token";
    const TOKEN_BODY: &str = r#"{"access_token":"AT","token_type":"bearer","expires_in":3600}"#;

    mock! {
        Sleeper {}
        impl Sleeper for Sleeper {
            fn sleep(&self, duration: Duration);
        }
    }

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    /// Serves the token endpoint, then the scripted data responses in order.
    #[derive(Default)]
    struct Script {
        data: Mutex<VecDeque<(u16, Vec<(&'static str, &'static str)>, &'static str)>>,
        seen: Mutex<Vec<(HttpMethod, String, Option<String>)>>,
    }

    impl Script {
        fn push(&self, status: u16, body: &'static str) {
            self.data.lock().unwrap().push_back((status, Vec::new(), body));
        }

        fn push_with(&self, status: u16, headers: Vec<(&'static str, &'static str)>, body: &'static str) {
            self.data.lock().unwrap().push_back((status, headers, body));
        }

        fn data_urls(&self) -> Vec<String> {
            self.seen
                .lock()
                .unwrap()
                .iter()
                .filter(|(m, _, _)| *m == HttpMethod::Get)
                .map(|(_, url, _)| url.clone())
                .collect()
        }
    }

    impl HttpTransport for Script {
        fn perform(&self, request: &HttpRequest, sink: &mut dyn BodySink) -> BridgeResult<ResponseHead> {
            let auth = request
                .headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("authorization"))
                .map(|(_, v)| v.clone());
            self.seen
                .lock()
                .unwrap()
                .push((request.method, request.url.clone(), auth));

            if request.method == HttpMethod::Post {
                sink.write_chunk(TOKEN_BODY.as_bytes())?;
                return Ok(ResponseHead::new(200));
            }

            let (status, headers, body) = self
                .data
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| BridgeError::OperationFailed("script exhausted".into()))?;
            let mut head = ResponseHead::new(status);
            for (name, value) in headers {
                head = head.with_header(name, value);
            }
            if head.is_success() {
                sink.write_chunk(body.as_bytes())?;
            }
            Ok(head)
        }
    }

    fn setup(script: Arc<Script>, sleeper: MockSleeper) -> (Extractor, BearerToken) {
        let clock = Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
        let ctx = AuthContext::new(script, clock, Arc::new(sleeper));
        let token = BearerToken::new(TOKEN_URL, Credentials::new("id", "secret", "jwt"));
        (Extractor::new(ctx), token)
    }

    fn no_sleep() -> MockSleeper {
        let mut sleeper = MockSleeper::new();
        sleeper.expect_sleep().never();
        sleeper
    }

    #[test]
    fn test_paginated_fetch_sends_bearer_and_follows_links() {
        let script = Arc::new(Script::default());
        script.push(200, r#"[{"id":1}],"nextPage":"https://platform.test/p2""#);
        script.push(200, r#"[{"id":2}]"#);
        let (extractor, mut token) = setup(Arc::clone(&script), no_sleep());
        let mut json = JsonContent::new();

        extractor
            .json_to_buffer(&mut token, &mut json, "https://platform.test/p1")
            .unwrap();

        assert_eq!(json.as_bytes(), br#"[{"id":1},{"id":2}]"#);
        assert_eq!(script.data_urls(), ["https://platform.test/p1", "https://platform.test/p2"]);
        assert_eq!(token.status(), TokenStatus::Ok);

        let seen = script.seen.lock().unwrap();
        // One token request serves both pages
        assert_eq!(seen.iter().filter(|(m, _, _)| *m == HttpMethod::Post).count(), 1);
        assert!(seen
            .iter()
            .filter(|(m, _, _)| *m == HttpMethod::Get)
            .all(|(_, _, auth)| auth.as_deref() == Some("Bearer AT")));
    }

    #[test]
    fn test_retry_after_hint_is_honoured() {
        let script = Arc::new(Script::default());
        script.push_with(429, vec![("Retry-After", "7")], "");
        script.push(200, r#"{"ok":true}"#);

        let mut sleeper = MockSleeper::new();
        sleeper
            .expect_sleep()
            .with(eq(Duration::from_secs(7)))
            .times(1)
            .return_const(());
        let (extractor, mut token) = setup(Arc::clone(&script), sleeper);
        let mut json = JsonContent::new();

        extractor
            .json_to_buffer(&mut token, &mut json, "https://platform.test/a")
            .unwrap();

        assert_eq!(json.as_bytes(), br#"{"ok":true}"#);
        assert_eq!(script.data_urls().len(), 2);
    }

    #[test]
    fn test_client_error_is_recorded_on_token() {
        let script = Arc::new(Script::default());
        script.push(404, "");
        let (extractor, mut token) = setup(script, no_sleep());
        let mut media = MediaContent::new();

        let err = extractor
            .media_to_buffer(&mut token, &mut media, "https://platform.test/rec")
            .unwrap_err();

        assert_eq!(err, TokenError::HttpStatus { status: 404 });
        assert_eq!(token.status(), TokenStatus::HttpStatusError);
        assert_eq!(token.error_message(), "HTTP status error: 404");
        assert!(media.is_empty());
    }

    #[test]
    fn test_proactive_throttle_after_success() {
        let script = Arc::new(Script::default());
        script.push_with(
            200,
            vec![("X-Rate-Limit-Remaining", "0"), ("X-Rate-Limit-Window", "60")],
            "RIFF",
        );

        let mut sleeper = MockSleeper::new();
        sleeper
            .expect_sleep()
            .with(eq(Duration::from_secs(60)))
            .times(1)
            .return_const(());
        let (extractor, mut token) = setup(script, sleeper);
        let mut media = MediaContent::new();

        extractor
            .media_to_buffer(&mut token, &mut media, "https://platform.test/rec")
            .unwrap();
        assert_eq!(media.as_bytes(), b"RIFF");
    }

    #[test]
    fn test_custom_policy() {
        let script = Arc::new(Script::default());
        script.push(503, "");
        script.push(503, "");

        let mut sleeper = MockSleeper::new();
        sleeper
            .expect_sleep()
            .with(eq(Duration::from_secs(1)))
            .times(1)
            .return_const(());
        let (extractor, mut token) = setup(Arc::clone(&script), sleeper);
        let extractor = extractor.with_policy(RetryPolicy::new(2, Duration::from_secs(1)));

        let mut media = MediaContent::new();
        let err = extractor
            .media_to_buffer(&mut token, &mut media, "https://platform.test/rec")
            .unwrap_err();

        assert_eq!(err, TokenError::HttpStatus { status: 503 });
        assert_eq!(script.data_urls().len(), 2);
    }
}
