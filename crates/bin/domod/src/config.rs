//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `domo.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Dispatcher settings.
    pub dispatch: DispatchConfig,
    /// Technology toggles.
    pub technologies: TechnologiesConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Dispatcher tuning.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Triggers held per stopped technology before dispatch rejects.
    pub queue_limit: usize,
    /// Upper bound on a single handler run, in seconds.
    pub timeout_secs: u64,
}

/// Per-technology toggles.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TechnologiesConfig {
    /// Enable the demo technology.
    pub demo: bool,
    /// Enable the Z-Wave technology (simulated controller).
    pub zwave: bool,
}

impl Config {
    /// Load configuration from `domo.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("domo.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("DOMO_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("DOMO_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("DOMO_DISPATCH_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.dispatch.timeout_secs = secs;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.dispatch.queue_limit == 0 {
            return Err(ConfigError::Validation(
                "dispatch queue_limit must be non-zero".to_string(),
            ));
        }
        if self.dispatch.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "dispatch timeout_secs must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the handler timeout as a [`Duration`].
    #[must_use]
    pub fn dispatch_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch.timeout_secs)
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:domo.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "domod=info,domo=info".to_string(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_limit: 64,
            timeout_secs: 30,
        }
    }
}

impl Default for TechnologiesConfig {
    fn default() -> Self {
        Self {
            demo: true,
            zwave: true,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
