//! Random key and secret generation.
//!
//! Keys and secrets are drawn per character, independently and uniformly,
//! from the lowercase alphanumeric alphabet.

use crate::error::ConfigError;
use crate::ports::RandomSource;

/// Symbols used for generated keys and secrets.
pub const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length used when no explicit length is requested.
pub const DEFAULT_LENGTH: usize = 32;

/// Length used for application keys and secrets by the administrative tools.
pub const DEFAULT_CREDENTIAL_LENGTH: usize = 20;

/// Generate a string of `length` symbols from [`ALPHABET`].
pub fn generate(source: &dyn RandomSource, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[source.random_index(ALPHABET.len())] as char)
        .collect()
}

/// Generate a string of [`DEFAULT_LENGTH`] symbols.
pub fn generate_default(source: &dyn RandomSource) -> String {
    generate(source, DEFAULT_LENGTH)
}

/// Length policy for generated application keys and secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPolicy {
    pub key_length: usize,
    pub secret_length: usize,
}

impl Default for KeyPolicy {
    fn default() -> Self {
        Self {
            key_length: DEFAULT_CREDENTIAL_LENGTH,
            secret_length: DEFAULT_CREDENTIAL_LENGTH,
        }
    }
}

impl KeyPolicy {
    pub fn new(key_length: usize, secret_length: usize) -> Result<Self, ConfigError> {
        let policy = Self {
            key_length,
            secret_length,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Both lengths must be non-zero; an empty key is never issued.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.key_length == 0 {
            return Err(ConfigError::ZeroLength {
                field: "key_length",
            });
        }
        if self.secret_length == 0 {
            return Err(ConfigError::ZeroLength {
                field: "secret_length",
            });
        }
        Ok(())
    }
}

/// Key generator bound to a random source and a length policy.
pub struct KeyGenerator<'a> {
    source: &'a dyn RandomSource,
    policy: KeyPolicy,
}

impl<'a> KeyGenerator<'a> {
    pub fn new(source: &'a dyn RandomSource, policy: KeyPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self::with_checked_policy(source, policy))
    }

    /// `policy` must already have passed [`KeyPolicy::validate`].
    pub(crate) fn with_checked_policy(source: &'a dyn RandomSource, policy: KeyPolicy) -> Self {
        Self { source, policy }
    }

    pub fn policy(&self) -> KeyPolicy {
        self.policy
    }

    /// A fresh candidate application key.
    pub fn key(&self) -> String {
        generate(self.source, self.policy.key_length)
    }

    /// A fresh application secret.
    pub fn secret(&self) -> String {
        generate(self.source, self.policy.secret_length)
    }
}
