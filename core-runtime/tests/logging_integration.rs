//! Integration tests for logging and configuration

use bridge_traits::time::{LogEntry, LogLevel, LoggerSink};
use core_runtime::config::ExtractConfig;
use core_runtime::logging::{init_logging, redact_if_sensitive, LogFormat, LoggingConfig};
use core_runtime::Error;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct CollectingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl LoggerSink for CollectingSink {
    fn log(&self, entry: LogEntry) -> bridge_traits::error::Result<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// The global subscriber can only be installed once per process, so every
// global-logging assertion lives in this single test.
#[test]
fn test_global_logging_lifecycle() {
    let sink = Arc::new(CollectingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_filter("logging_integration=debug")
        .with_logger_sink(sink.clone());

    init_logging(config).unwrap();

    tracing::debug!(client_secret = "hunter2", pages = 3u64, "fetch finished");

    {
        let entries = sink.entries.lock().unwrap();
        let entry = entries
            .iter()
            .find(|e| e.message == "fetch finished")
            .expect("event forwarded to sink");
        assert_eq!(entry.level, LogLevel::Debug);
        assert_eq!(entry.fields.get("client_secret"), Some(&"[REDACTED]".to_string()));
        assert_eq!(entry.fields.get("pages"), Some(&"3".to_string()));
    }

    let second = init_logging(LoggingConfig::default());
    assert!(matches!(second, Err(Error::Config(_))));
}

#[test]
fn test_redaction_covers_credential_names() {
    for name in ["access_token", "client_secret", "jwt", "assertion", "authorization"] {
        assert_eq!(redact_if_sensitive(name, "value"), "[REDACTED]", "{}", name);
    }
    assert_eq!(redact_if_sensitive("status", "429"), "429");
}

#[test]
fn test_config_debug_is_safe_to_log() {
    let config = ExtractConfig::builder()
        .client_id("app")
        .client_secret("s3cr3t")
        .jwt("header.payload.signature")
        .build()
        .unwrap();

    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("s3cr3t"));
    assert!(!rendered.contains("header.payload.signature"));
}
