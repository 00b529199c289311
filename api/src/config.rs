//! Client configuration.
//!
//! Configuration is resolved once at startup from `GHUMLY_*` environment
//! variables. The base URL must be set explicitly in production; development
//! builds fall back to a local backend.

use ghumly_runtime::retry::RetryPolicy;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Default backend address used outside production.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable not set
    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    /// Invalid deployment environment value
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),

    /// Environment variable holds an unparseable value
    #[error("Invalid value for {var}: {value}")]
    InvalidValue {
        /// Variable name
        var: String,
        /// Offending value
        value: String,
    },
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Development environment (local backend allowed)
    Development,
    /// Production environment (explicit base URL required)
    Production,
}

impl Environment {
    /// Check if this is the production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "prod" | "production" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Ghumly API client configuration.
///
/// # Default Values
///
/// - `connect_timeout`: 10 seconds
/// - `read_timeout`: 15 seconds (GET requests)
/// - `mutation_timeout`: 30 seconds (POST/PUT/DELETE requests)
/// - `read_retry`: 2 retries, exponential backoff 250ms..2s
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Backend base URL, without a trailing slash
    pub base_url: String,
    /// Deployment environment
    pub environment: Environment,
    /// TCP connect timeout
    pub connect_timeout: Duration,
    /// Total request timeout for reads
    pub read_timeout: Duration,
    /// Total request timeout for mutations
    pub mutation_timeout: Duration,
    /// Retry policy applied to reads only
    pub read_retry: RetryPolicy,
}

impl ApiConfig {
    /// Create a configuration with defaults for the given base URL.
    ///
    /// A single trailing slash is stripped so paths can always start with `/`.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let base_url = match base_url.strip_suffix('/') {
            Some(stripped) => stripped.to_string(),
            None => base_url,
        };

        Self {
            base_url,
            environment: Environment::Development,
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(15),
            mutation_timeout: Duration::from_secs(30),
            read_retry: default_read_retry(),
        }
    }

    /// Load configuration from `GHUMLY_*` environment variables.
    ///
    /// Reads `GHUMLY_ENV` (defaults to development) and `GHUMLY_API_BASE_URL`
    /// (required in production, defaults to [`DEFAULT_BASE_URL`] otherwise).
    /// Timeout and retry overrides: `GHUMLY_CONNECT_TIMEOUT_SECS`,
    /// `GHUMLY_READ_TIMEOUT_SECS`, `GHUMLY_MUTATION_TIMEOUT_SECS`,
    /// `GHUMLY_READ_RETRIES`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment value is invalid, if the base URL
    /// is missing in production, or if an override cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = match std::env::var("GHUMLY_ENV") {
            Ok(value) => value.parse()?,
            Err(_) => Environment::Development,
        };

        let base_url = resolve_base_url(std::env::var("GHUMLY_API_BASE_URL").ok(), environment)?;

        let mut config = Self::new(base_url);
        config.environment = environment;

        if let Some(secs) = read_secs_var("GHUMLY_CONNECT_TIMEOUT_SECS")? {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = read_secs_var("GHUMLY_READ_TIMEOUT_SECS")? {
            config.read_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = read_secs_var("GHUMLY_MUTATION_TIMEOUT_SECS")? {
            config.mutation_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = read_u32_var("GHUMLY_READ_RETRIES")? {
            config.read_retry.max_retries = retries;
        }

        Ok(config)
    }

    /// Set the deployment environment.
    #[must_use]
    pub const fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the TCP connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the total request timeout for reads.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Set the total request timeout for mutations.
    #[must_use]
    pub const fn with_mutation_timeout(mut self, timeout: Duration) -> Self {
        self.mutation_timeout = timeout;
        self
    }

    /// Set the retry policy applied to reads.
    #[must_use]
    pub fn with_read_retry(mut self, policy: RetryPolicy) -> Self {
        self.read_retry = policy;
        self
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Retry policy for reads: 2 retries, exponential backoff capped at 2 seconds.
fn default_read_retry() -> RetryPolicy {
    RetryPolicy::builder()
        .max_retries(2)
        .initial_delay(Duration::from_millis(250))
        .max_delay(Duration::from_secs(2))
        .multiplier(2.0)
        .build()
}

/// Resolve the base URL from an optional explicit value and the environment.
///
/// Production requires an explicit value; a missing base URL is a startup
/// error there, everywhere else the local default applies.
fn resolve_base_url(
    explicit: Option<String>,
    environment: Environment,
) -> Result<String, ConfigError> {
    match explicit {
        Some(url) => Ok(url),
        None if environment.is_production() => Err(ConfigError::EnvVarNotSet(
            "GHUMLY_API_BASE_URL".to_string(),
        )),
        None => Ok(DEFAULT_BASE_URL.to_string()),
    }
}

fn read_secs_var(var: &str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}

fn read_u32_var(var: &str) -> Result<Option<u32>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue {
                var: var.to_string(),
                value,
            }),
        Err(_) => Ok(None),
    }
}
