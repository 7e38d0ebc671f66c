//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CourierConfig {
    /// Bot credentials and pipeline settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// Bot credentials and pipeline settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Bot token issued by @BotFather. Required.
    #[serde(default)]
    pub token: String,

    /// Base URL of the Bot API server.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Number of concurrent dispatch workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Drop the updates that were pending when the bot started.
    #[serde(default)]
    pub skip_updates: bool,

    /// Long-poll hold requested from the server, in seconds.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,

    /// Maximum number of updates per fetch (1..=100). Server default if unset.
    #[serde(default)]
    pub poll_limit: Option<u8>,

    /// Update categories to receive. Empty keeps the server-side setting.
    #[serde(default)]
    pub allowed_updates: Vec<String>,

    /// Timeout of a single request, on top of the long-poll hold.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Extra wait added to every server-requested `retry_after`.
    #[serde(default = "default_retry_margin_ms")]
    pub retry_margin_ms: u64,

    /// Grace period for in-flight dispatches on shutdown.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// Back-off applied by the poller after a failed fetch.
    #[serde(default)]
    pub fetch_retry: FetchRetryConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            api_url: default_api_url(),
            workers: default_workers(),
            skip_updates: false,
            poll_timeout_secs: default_poll_timeout_secs(),
            poll_limit: None,
            allowed_updates: Vec::new(),
            request_timeout_secs: default_request_timeout_secs(),
            retry_margin_ms: default_retry_margin_ms(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
            fetch_retry: FetchRetryConfig::default(),
        }
    }
}

impl BotConfig {
    /// Creates a configuration with the given token and defaults elsewhere.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_margin(&self) -> Duration {
        Duration::from_millis(self.retry_margin_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

// The token never shows up in logs.
impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .field("workers", &self.workers)
            .field("skip_updates", &self.skip_updates)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("poll_limit", &self.poll_limit)
            .field("allowed_updates", &self.allowed_updates)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry_margin_ms", &self.retry_margin_ms)
            .field("shutdown_timeout_secs", &self.shutdown_timeout_secs)
            .field("fetch_retry", &self.fetch_retry)
            .finish()
    }
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_poll_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_retry_margin_ms() -> u64 {
    500
}

fn default_shutdown_timeout_secs() -> u64 {
    10
}

/// Exponential back-off for failed fetches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchRetryConfig {
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay between retries in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for FetchRetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

impl FetchRetryConfig {
    /// Delay before retry number `attempt` (0-indexed):
    /// `initial * multiplier^attempt`, capped at the maximum.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let delay_ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped_ms = delay_ms.min(self.max_delay_ms as f64);
        Duration::from_secs_f64(capped_ms / 1000.0)
    }
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    30000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Newline-delimited JSON. Requires the `json-log` feature.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Rotation schedule of the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level. `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, used when `output` is `file`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    /// Include thread IDs in log lines.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line in log lines.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module levels, e.g. `courier_runtime = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            rotation: LogRotation::Never,
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bot_defaults() {
        let config = BotConfig::default();
        assert_eq!(config.api_url, "https://api.telegram.org");
        assert_eq!(config.workers, 4);
        assert_eq!(config.poll_timeout(), Duration::from_secs(30));
        assert_eq!(config.retry_margin(), Duration::from_millis(500));
        assert!(!config.skip_updates);
        assert!(config.allowed_updates.is_empty());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let config: CourierConfig =
            serde_json::from_value(serde_json::json!({ "bot": { "token": "1:abc", "workers": 2 } }))
                .unwrap();
        assert_eq!(config.bot.token, "1:abc");
        assert_eq!(config.bot.workers, 2);
        assert_eq!(config.bot.fetch_retry.max_delay_ms, 30000);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_delay_for_attempt_grows_and_caps() {
        let retry = FetchRetryConfig {
            initial_delay_ms: 500,
            max_delay_ms: 3000,
            backoff_multiplier: 2.0,
        };
        assert_eq!(retry.delay_for_attempt(0), Duration::from_millis(500));
        assert_eq!(retry.delay_for_attempt(1), Duration::from_millis(1000));
        assert_eq!(retry.delay_for_attempt(2), Duration::from_millis(2000));
        assert_eq!(retry.delay_for_attempt(3), Duration::from_millis(3000));
        assert_eq!(retry.delay_for_attempt(40), Duration::from_millis(3000));
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", BotConfig::with_token("123:secret"));
        assert!(!rendered.contains("secret"));
    }
}
