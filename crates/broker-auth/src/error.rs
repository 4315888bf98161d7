//! Error types for the credential store and authorization engine

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by registry mutations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("An app named `{name}` with key `{key}` already exists")]
    DuplicateKey { name: String, key: String },

    #[error("No application ids left after {last}")]
    IdsExhausted { last: u64 },
}

/// Errors raised by the credential file store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot read credentials file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Cannot encode credentials: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    /// True when the underlying failure is a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound
        )
    }
}

/// Errors reported by decision functions.
///
/// A denial is never an error; this only carries internal faults, which
/// the host must treat as a denial.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Internal fault while evaluating authorization: {0}")]
    InternalFault(String),
}

/// Errors from a reload attempt. The previously installed authorizer stays
/// active whenever one of these is returned.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from administrative entry points
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from configuration validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid generator length for {field}: must be greater than 0")]
    ZeroLength { field: &'static str },
}
