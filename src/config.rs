//! Process configuration, read once at start-up.
use std::time::Duration;

use crate::{allow_list::AllowList, key::SecretKey};

/// Default upper bound for the requested width.
pub const DEFAULT_MAX_WIDTH: u32 = 1800;

/// Default upper bound for the requested height.
pub const DEFAULT_MAX_HEIGHT: u32 = 1800;

/// Default timeout for fetching the source image.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Default limit on the size of the source image body.
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 20 * 1024 * 1024;

/// Errors raised while loading [`Config`] from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `SECRET_KEY` is unset or empty.
    #[error("SECRET_KEY is not set")]
    MissingSecretKey,
}

/// Configuration shared by every request.
///
/// Built once, then handed to [`ImageOptimizerBuilder`](crate::ImageOptimizerBuilder);
/// it is never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    allowed_origins: AllowList,
    secret_key: Option<SecretKey>,
    max_width: u32,
    max_height: u32,
    fetch_timeout: Duration,
    max_source_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allowed_origins: AllowList::new(),
            secret_key: None,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_source_bytes: DEFAULT_MAX_SOURCE_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to
    /// its value.
    ///
    /// Numeric variables that are missing, malformed or not positive fall
    /// back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = lookup("SECRET_KEY")
            .filter(|secret| !secret.is_empty())
            .map(SecretKey::new)
            .ok_or(ConfigError::MissingSecretKey)?;

        let allowed_origins = lookup("ALLOWED_ORIGINS")
            .map(|value| AllowList::from_env_value(&value))
            .unwrap_or_default();

        let positive = |name: &str| -> Option<u64> {
            let value = lookup(name)?;
            match value.trim().parse::<u64>() {
                Ok(parsed) if parsed > 0 => Some(parsed),
                _ => {
                    tracing::warn!(variable = name, value = %value, "ignoring invalid value");
                    None
                }
            }
        };

        Ok(Self {
            allowed_origins,
            secret_key: Some(secret_key),
            max_width: positive("MAX_WIDTH")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_MAX_WIDTH),
            max_height: positive("MAX_HEIGHT")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(DEFAULT_MAX_HEIGHT),
            fetch_timeout: positive("FETCH_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_FETCH_TIMEOUT),
            max_source_bytes: positive("MAX_SOURCE_BYTES")
                .and_then(|v| usize::try_from(v).ok())
                .unwrap_or(DEFAULT_MAX_SOURCE_BYTES),
        })
    }

    /// Configure the allowed origins.
    pub fn set_allowed_origins(self, allowed_origins: AllowList) -> Self {
        Self {
            allowed_origins,
            ..self
        }
    }

    /// Require callers to present `secret_key`.
    pub fn set_secret_key(self, secret_key: SecretKey) -> Self {
        Self {
            secret_key: Some(secret_key),
            ..self
        }
    }

    /// Configure the largest width and height callers may request.
    pub fn set_max_dimensions(self, max_width: u32, max_height: u32) -> Self {
        Self {
            max_width,
            max_height,
            ..self
        }
    }

    /// Configure the timeout for fetching source images.
    pub fn set_fetch_timeout(self, fetch_timeout: Duration) -> Self {
        Self {
            fetch_timeout,
            ..self
        }
    }

    /// Configure the largest source body that will be read.
    pub fn set_max_source_bytes(self, max_source_bytes: usize) -> Self {
        Self {
            max_source_bytes,
            ..self
        }
    }

    /// Allowed origins.
    pub fn allowed_origins(&self) -> &AllowList {
        &self.allowed_origins
    }

    /// Secret callers must present, if any.
    pub fn secret_key(&self) -> Option<&SecretKey> {
        self.secret_key.as_ref()
    }

    /// Largest width callers may request.
    pub fn max_width(&self) -> u32 {
        self.max_width
    }

    /// Largest height callers may request.
    pub fn max_height(&self) -> u32 {
        self.max_height
    }

    /// Timeout for fetching source images.
    pub fn fetch_timeout(&self) -> Duration {
        self.fetch_timeout
    }

    /// Largest source body that will be read.
    pub fn max_source_bytes(&self) -> usize {
        self.max_source_bytes
    }
}
