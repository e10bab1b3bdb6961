//! Client configuration types and builders.

use std::time::Duration;

use gridcache_core::GridError;

/// Default number of attempts per operation, the first one included.
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Default pause before the first retry.
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::ZERO;
/// Default upper bound for the pause between attempts.
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(1);
/// Default backoff multiplier.
const DEFAULT_RETRY_MULTIPLIER: f64 = 2.0;
/// Default jitter factor.
const DEFAULT_JITTER: f64 = 0.0;

/// Configuration error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    message: String,
}

impl ConfigError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the validation message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for GridError {
    fn from(err: ConfigError) -> Self {
        GridError::Configuration(err.message)
    }
}

/// Retry policy for cache operations.
///
/// An operation is attempted at most `max_attempts` times. Between attempts
/// the client waits `initial_backoff`, growing by `multiplier` per retry and
/// capped at `max_backoff`; a zero initial backoff retries immediately.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
    jitter: f64,
}

impl RetryConfig {
    /// Returns the maximum number of attempts per operation.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the pause before the first retry.
    pub fn initial_backoff(&self) -> Duration {
        self.initial_backoff
    }

    /// Returns the maximum pause between attempts.
    pub fn max_backoff(&self) -> Duration {
        self.max_backoff
    }

    /// Returns the backoff multiplier.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Returns the jitter factor in `[0, 1]`.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            multiplier: DEFAULT_RETRY_MULTIPLIER,
            jitter: DEFAULT_JITTER,
        }
    }
}

impl From<RetryConfig> for RetryConfigBuilder {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_attempts: Some(config.max_attempts),
            initial_backoff: Some(config.initial_backoff),
            max_backoff: Some(config.max_backoff),
            multiplier: Some(config.multiplier),
            jitter: Some(config.jitter),
        }
    }
}

/// Builder for `RetryConfig`.
#[derive(Debug, Clone, Default)]
pub struct RetryConfigBuilder {
    max_attempts: Option<u32>,
    initial_backoff: Option<Duration>,
    max_backoff: Option<Duration>,
    multiplier: Option<f64>,
    jitter: Option<f64>,
}

impl RetryConfigBuilder {
    /// Creates a new retry configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of attempts, the first one included.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Sets the pause before the first retry.
    pub fn initial_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = Some(backoff);
        self
    }

    /// Sets the maximum pause between attempts.
    pub fn max_backoff(mut self, backoff: Duration) -> Self {
        self.max_backoff = Some(backoff);
        self
    }

    /// Sets the backoff multiplier.
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Sets the jitter factor.
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Builds the retry configuration, returning an error if validation fails.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `max_attempts` is zero
    /// - `initial_backoff` exceeds `max_backoff`
    /// - `multiplier` is less than 1.0
    /// - `jitter` is outside `[0, 1]`
    pub fn build(self) -> Result<RetryConfig, ConfigError> {
        let max_attempts = self.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let initial_backoff = self.initial_backoff.unwrap_or(DEFAULT_INITIAL_BACKOFF);
        let max_backoff = self.max_backoff.unwrap_or(DEFAULT_MAX_BACKOFF);
        let multiplier = self.multiplier.unwrap_or(DEFAULT_RETRY_MULTIPLIER);
        let jitter = self.jitter.unwrap_or(DEFAULT_JITTER);

        if max_attempts == 0 {
            return Err(ConfigError::new("max_attempts must be at least 1"));
        }

        if initial_backoff > max_backoff {
            return Err(ConfigError::new(
                "initial_backoff must not exceed max_backoff",
            ));
        }

        if multiplier.is_nan() || multiplier < 1.0 {
            return Err(ConfigError::new("multiplier must be at least 1.0"));
        }

        if !(0.0..=1.0).contains(&jitter) {
            return Err(ConfigError::new("jitter must be between 0.0 and 1.0"));
        }

        Ok(RetryConfig {
            max_attempts,
            initial_backoff,
            max_backoff,
            multiplier,
            jitter,
        })
    }
}

/// Main client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    retry: RetryConfig,
    operation_timeout: Option<Duration>,
    partition_aware: bool,
}

impl ClientConfig {
    /// Creates a new client configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Returns the retry configuration.
    pub fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns the bound on a single exchange, if any.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout
    }

    /// Returns `true` if requests are routed to the partition owner.
    pub fn partition_aware(&self) -> bool {
        self.partition_aware
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            operation_timeout: None,
            partition_aware: true,
        }
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    retry: RetryConfigBuilder,
    operation_timeout: Option<Duration>,
    partition_aware: Option<bool>,
}

impl ClientConfigBuilder {
    /// Creates a new client configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures retry settings using a builder function.
    pub fn retry<F>(mut self, f: F) -> Self
    where
        F: FnOnce(RetryConfigBuilder) -> RetryConfigBuilder,
    {
        self.retry = f(self.retry);
        self
    }

    /// Bounds every single exchange with a node; `None` waits indefinitely.
    pub fn operation_timeout(mut self, timeout: impl Into<Option<Duration>>) -> Self {
        self.operation_timeout = timeout.into();
        self
    }

    /// Enables or disables routing to the partition owner.
    ///
    /// When disabled every request goes to any node and carries its affinity
    /// key so the server can forward it.
    pub fn partition_aware(mut self, enabled: bool) -> Self {
        self.partition_aware = Some(enabled);
        self
    }

    /// Builds the client configuration, returning an error if validation fails.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let retry = self.retry.build()?;

        if self.operation_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::new("operation_timeout must be positive"));
        }

        Ok(ClientConfig {
            retry,
            operation_timeout: self.operation_timeout,
            partition_aware: self.partition_aware.unwrap_or(true),
        })
    }
}
