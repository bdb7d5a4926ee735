//! Client configuration.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host of the delivery API.
pub const DEFAULT_HOST: &str = "cdn.contentful.com";

/// Host of the preview API.
pub const PREVIEW_HOST: &str = "preview.contentful.com";

/// Environment used when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "master";

fn default_environment() -> String {
    DEFAULT_ENVIRONMENT.to_string()
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_secure() -> bool {
    true
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

/// Configuration for a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Space to read from.
    pub space_id: String,
    /// Delivery or preview access token.
    pub access_token: String,
    /// Environment within the space.
    #[serde(default = "default_environment")]
    pub environment_id: String,
    /// API host, without scheme.
    #[serde(default = "default_host")]
    pub host: String,
    /// Use https.
    #[serde(default = "default_secure")]
    pub secure: bool,
    /// Request timeout.
    #[serde(default = "default_timeout")]
    pub timeout: Duration,
    /// Retry configuration for whole sync passes.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Creates a configuration for the delivery API.
    pub fn new(space_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            space_id: space_id.into(),
            access_token: access_token.into(),
            environment_id: default_environment(),
            host: default_host(),
            secure: default_secure(),
            timeout: default_timeout(),
            retry: RetryConfig::default(),
        }
    }

    /// Creates a configuration for the preview API.
    pub fn preview(space_id: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self::new(space_id, access_token).with_host(PREVIEW_HOST)
    }

    /// Sets the environment.
    pub fn with_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = environment_id.into();
        self
    }

    /// Sets the host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets whether https is used.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Returns true when pointed at the preview API.
    pub fn is_preview(&self) -> bool {
        self.host == PREVIEW_HOST
    }

    /// URL of the configured environment. Request paths are appended to it.
    pub fn base_url(&self) -> String {
        let scheme = if self.secure { "https" } else { "http" };
        format!(
            "{scheme}://{}/spaces/{}/environments/{}",
            self.host, self.space_id, self.environment_id
        )
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Initial delay between retries.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier for exponential backoff.
    pub backoff_multiplier: f64,
    /// Whether to add jitter to delays.
    pub add_jitter: bool,
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            add_jitter: true,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
            add_jitter: false,
        }
    }

    /// Backs off from `initial` up to `max` between passes.
    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    /// Waits exactly the computed backoff.
    pub fn without_jitter(mut self) -> Self {
        self.add_jitter = false;
        self
    }

    /// Delay before rerunning a pass for the given attempt. The first
    /// attempt (0) runs immediately.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let Some(retry) = attempt.checked_sub(1) else {
            return Duration::ZERO;
        };

        let growth = self.backoff_multiplier.powi(retry.min(i32::MAX as u32) as i32);
        let delay = (self.initial_delay.as_secs_f64() * growth).min(self.max_delay.as_secs_f64());
        let jitter = if self.add_jitter {
            rand::thread_rng().gen_range(0.0..=0.25)
        } else {
            0.0
        };
        Duration::from_secs_f64(delay * (1.0 + jitter))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}
