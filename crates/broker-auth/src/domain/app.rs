//! Application records

use serde::{Deserialize, Serialize};

/// Id assigned to the first application of an empty registry.
pub const FIRST_APP_ID: u64 = 1000;

/// A registered application.
///
/// `key` doubles as the client username and `secret` as its password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub name: String,
    pub id: u64,
    pub key: String,
    pub secret: String,
}

/// Request to register a new application.
///
/// Missing `key` or `secret` values are generated when the request is
/// applied to a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewApplication {
    pub name: String,
    pub key: Option<String>,
    pub secret: Option<String>,
}

impl NewApplication {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            key: None,
            secret: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }
}
