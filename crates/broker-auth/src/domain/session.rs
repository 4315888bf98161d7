//! Per-connection authorization state.
//!
//! The host broker owns one [`ClientSession`] per connection and hands it to
//! the decision functions. Authentication binds two fields:
//!
//! - `key`: the matched registry key (client identity), bound as soon as the
//!   username matches a registered application, even if the password check
//!   later fails.
//! - `app`: the authorization scope, bound only after the secret matched.
//!
//! SECURITY: subscribe is authorized on identity alone, so a client that
//! sent a known username with a wrong password can still subscribe. Publish
//! requires the scope.

/// Authorization state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No identity bound
    Unauthenticated,
    /// Username matched a registered application
    IdentityBound,
    /// Secret verified, scope bound
    Authorized,
}

/// Session fields consulted by the decision functions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSession {
    /// Host-assigned client identifier (informational)
    pub client_id: String,
    /// Matched registry key
    pub key: Option<String>,
    /// Scope bound after secret verification
    pub app: Option<String>,
}

impl ClientSession {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            key: None,
            app: None,
        }
    }

    pub fn state(&self) -> SessionState {
        match (&self.key, &self.app) {
            (_, Some(_)) => SessionState::Authorized,
            (Some(_), None) => SessionState::IdentityBound,
            (None, None) => SessionState::Unauthenticated,
        }
    }

    /// Topic prefix this session may publish under: `$<key>:`
    pub fn publish_prefix(&self) -> Option<String> {
        self.key.as_ref().map(|key| format!("${}:", key))
    }
}
