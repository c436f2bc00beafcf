//! Configuration management for the MCP server.
//!
//! Configuration is assembled once at startup from defaults, a `.env` file
//! and `MCP_*` environment variables. Nothing here changes per request.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{Error, Result};
use super::pipeline::{Backoff, OutputFormat, RetryPolicy};
use super::transport::TransportConfig;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Market-data provider connection.
    pub provider: ProviderConfig,

    /// Middleware pipeline behavior.
    pub pipeline: PipelineConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Connection settings for the market-data provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL every dataset path is resolved against.
    pub base_url: String,

    /// Per-request HTTP timeout in seconds.
    pub timeout_secs: u64,

    /// Optional bearer token sent with every provider request.
    pub api_key: Option<String>,
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api/".to_string(),
            timeout_secs: 30,
            api_key: None,
        }
    }
}

impl ProviderConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Retry settings, turned into a [`RetryPolicy`] at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first one. `1` disables retries.
    pub max_attempts: u32,

    /// Wait after the first failed attempt.
    pub base_delay_ms: u64,

    /// Upper bound for any single wait.
    pub max_delay_ms: u64,

    /// Growth factor between consecutive waits.
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
            multiplier: 2,
        }
    }
}

impl RetryConfig {
    /// The retry policy for these settings, retrying connectivity and
    /// timeout failures.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::default()
            .with_max_attempts(self.max_attempts)
            .with_backoff(Backoff::Exponential {
                base: Duration::from_millis(self.base_delay_ms),
                multiplier: self.multiplier,
                max: Duration::from_millis(self.max_delay_ms),
            })
    }
}

/// Middleware pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Include argument and result previews in log entries.
    pub include_payloads: bool,

    /// Character limit for those previews.
    pub max_payload_length: usize,

    /// Retry behavior.
    pub retry: RetryConfig,

    /// Keep error source chains in failures sent to clients.
    pub include_trace: bool,

    /// Rendering of tabular results when the call does not ask for one.
    pub output_format: OutputFormat,

    /// Overall bound per call, retries included. `None` means unbounded.
    pub call_timeout_secs: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            include_payloads: true,
            max_payload_length: 1000,
            retry: RetryConfig::default(),
            include_trace: true,
            output_format: OutputFormat::default(),
            call_timeout_secs: None,
        }
    }
}

impl PipelineConfig {
    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "market-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            provider: ProviderConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Variables are prefixed with `MCP_`, e.g. `MCP_SERVER_NAME` or
    /// `MCP_RETRY_MAX_ATTEMPTS`. Values that fail to parse keep their
    /// default and are reported with a warning.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }
        env_parse("MCP_LOG_TIMESTAMPS", &mut config.logging.with_timestamps);

        config.transport = TransportConfig::from_env();

        let provider = &mut config.provider;
        if let Ok(url) = std::env::var("MCP_PROVIDER_URL") {
            provider.base_url = url;
        }
        env_parse("MCP_PROVIDER_TIMEOUT_SECS", &mut provider.timeout_secs);
        if let Ok(api_key) = std::env::var("MCP_PROVIDER_API_KEY") {
            provider.api_key = Some(api_key);
            info!("Provider API key loaded from environment");
        }

        let pipeline = &mut config.pipeline;
        env_parse("MCP_LOG_PAYLOADS", &mut pipeline.include_payloads);
        env_parse("MCP_LOG_MAX_PAYLOAD", &mut pipeline.max_payload_length);
        env_parse("MCP_RETRY_MAX_ATTEMPTS", &mut pipeline.retry.max_attempts);
        env_parse("MCP_RETRY_BASE_DELAY_MS", &mut pipeline.retry.base_delay_ms);
        env_parse("MCP_RETRY_MAX_DELAY_MS", &mut pipeline.retry.max_delay_ms);
        env_parse("MCP_RETRY_MULTIPLIER", &mut pipeline.retry.multiplier);
        env_parse("MCP_INCLUDE_TRACE", &mut pipeline.include_trace);
        env_parse("MCP_OUTPUT_FORMAT", &mut pipeline.output_format);

        let mut call_timeout_secs = 0u64;
        env_parse("MCP_CALL_TIMEOUT_SECS", &mut call_timeout_secs);
        pipeline.call_timeout_secs = (call_timeout_secs > 0).then_some(call_timeout_secs);

        config
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<()> {
        let retry = &self.pipeline.retry;
        if retry.max_attempts == 0 {
            return Err(Error::config("retry max_attempts must be at least 1"));
        }
        if retry.multiplier == 0 {
            return Err(Error::config("retry multiplier must be at least 1"));
        }
        if retry.base_delay_ms > retry.max_delay_ms {
            return Err(Error::config(format!(
                "retry base delay ({} ms) exceeds max delay ({} ms)",
                retry.base_delay_ms, retry.max_delay_ms
            )));
        }
        if self.provider.base_url.trim().is_empty() {
            return Err(Error::config("provider base URL is empty"));
        }
        if self.provider.timeout_secs == 0 {
            return Err(Error::config("provider timeout must be at least 1 second"));
        }
        self.transport.validate().map_err(Error::config)?;
        Ok(())
    }
}

/// Overwrite `target` with the parsed value of `key`, if set and valid.
pub(crate) fn env_parse<T>(key: &str, target: &mut T)
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let Ok(raw) = std::env::var(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(e) => warn!("Ignoring invalid {key}={raw:?}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure env var tests run serially
    static ENV_TEST_LOCK: Mutex<()> = Mutex::new(());

    const PIPELINE_VARS: [&str; 4] = [
        "MCP_RETRY_MAX_ATTEMPTS",
        "MCP_OUTPUT_FORMAT",
        "MCP_LOG_PAYLOADS",
        "MCP_CALL_TIMEOUT_SECS",
    ];

    fn clear(vars: &[&str]) {
        for var in vars {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    fn test_pipeline_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_RETRY_MAX_ATTEMPTS", "5");
            std::env::set_var("MCP_OUTPUT_FORMAT", "json");
            std::env::set_var("MCP_LOG_PAYLOADS", "false");
            std::env::set_var("MCP_CALL_TIMEOUT_SECS", "45");
        }
        let config = Config::from_env();
        assert_eq!(config.pipeline.retry.max_attempts, 5);
        assert_eq!(config.pipeline.output_format, OutputFormat::Json);
        assert!(!config.pipeline.include_payloads);
        assert_eq!(config.pipeline.call_timeout(), Some(Duration::from_secs(45)));
        clear(&PIPELINE_VARS);
    }

    #[test]
    fn test_invalid_env_value_keeps_default() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_RETRY_MAX_ATTEMPTS", "many");
            std::env::set_var("MCP_OUTPUT_FORMAT", "xml");
        }
        let config = Config::from_env();
        assert_eq!(config.pipeline.retry.max_attempts, 3);
        assert_eq!(config.pipeline.output_format, OutputFormat::Markdown);
        clear(&PIPELINE_VARS);
    }

    #[test]
    fn test_provider_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("MCP_PROVIDER_URL", "https://data.example.com/v1/");
            std::env::set_var("MCP_PROVIDER_API_KEY", "test_key_12345");
        }
        let config = Config::from_env();
        assert_eq!(config.provider.base_url, "https://data.example.com/v1/");
        assert_eq!(config.provider.api_key.as_deref(), Some("test_key_12345"));
        clear(&["MCP_PROVIDER_URL", "MCP_PROVIDER_API_KEY"]);
    }

    #[test]
    fn test_api_key_redacted_in_debug() {
        let provider = ProviderConfig {
            api_key: Some("super_secret_key".to_string()),
            ..ProviderConfig::default()
        };
        let debug_str = format!("{:?}", provider);
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("super_secret_key"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.pipeline.retry.max_attempts = 0;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let mut config = Config::default();
        config.pipeline.retry.base_delay_ms = 5_000;
        config.pipeline.retry.max_delay_ms = 1_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_policy_from_config() {
        let retry = RetryConfig {
            max_attempts: 4,
            base_delay_ms: 100,
            max_delay_ms: 250,
            multiplier: 3,
        };
        let policy = retry.policy();
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.backoff.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.backoff.delay_for(2), Duration::from_millis(250));
    }
}
