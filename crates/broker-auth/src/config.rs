//! Configuration with validation and environment overrides.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

use crate::domain::keygen::{KeyPolicy, DEFAULT_CREDENTIAL_LENGTH};
use crate::error::ConfigError;

/// Environment variable naming the credentials file
pub const ENV_AUTH_FILE: &str = "BROKER_AUTH_FILE";
/// Environment variable overriding the generated key length
pub const ENV_KEY_LENGTH: &str = "BROKER_AUTH_KEY_LENGTH";
/// Environment variable overriding the generated secret length
pub const ENV_SECRET_LENGTH: &str = "BROKER_AUTH_SECRET_LENGTH";

/// Credential engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Credentials file. `None` runs without persisted credentials and
    /// leaves the host on its default policy.
    pub credentials_path: Option<PathBuf>,
    /// Length of generated application keys
    pub key_length: usize,
    /// Length of generated application secrets
    pub secret_length: usize,
    /// Reload credentials when the process receives SIGHUP
    pub reload_on_sighup: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: None,
            key_length: DEFAULT_CREDENTIAL_LENGTH,
            secret_length: DEFAULT_CREDENTIAL_LENGTH,
            reload_on_sighup: true,
        }
    }
}

impl AuthConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.key_policy().validate()
    }

    pub fn key_policy(&self) -> KeyPolicy {
        KeyPolicy {
            key_length: self.key_length,
            secret_length: self.secret_length,
        }
    }

    /// Apply overrides from `lookup`. Malformed values are logged and ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_AUTH_FILE).filter(|p| !p.is_empty()) {
            info!(path = %path, "Credentials file from environment");
            self.credentials_path = Some(PathBuf::from(path));
        }

        if let Some(raw) = lookup(ENV_KEY_LENGTH) {
            match raw.parse() {
                Ok(len) if len > 0 => self.key_length = len,
                _ => warn!(value = %raw, "{} must be a positive integer", ENV_KEY_LENGTH),
            }
        }

        if let Some(raw) = lookup(ENV_SECRET_LENGTH) {
            match raw.parse() {
                Ok(len) if len > 0 => self.secret_length = len,
                _ => warn!(value = %raw, "{} must be a positive integer", ENV_SECRET_LENGTH),
            }
        }
    }
}
