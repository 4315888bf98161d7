//! Authorizer
//!
//! Answers the host broker's authenticate / publish / subscribe questions
//! against one immutable registry. Reloading builds a new `Authorizer`
//! rather than mutating this one.

use std::borrow::Cow;
use std::sync::Arc;

use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::domain::{ClientSession, Registry};
use crate::error::AuthError;
use crate::ports::AuthorizationApi;

/// Decision functions over a registry snapshot
#[derive(Debug, Clone)]
pub struct Authorizer {
    registry: Arc<Registry>,
}

impl Authorizer {
    pub fn new(registry: Registry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }

    pub fn from_shared(registry: Arc<Registry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

fn as_text(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Compare the password a client presented with an app's stored secret.
///
/// The raw bytes are compared in constant time. A length mismatch is
/// rejected up front.
pub fn secret_matches(presented: &[u8], stored: &str) -> bool {
    presented.ct_eq(stored.as_bytes()).into()
}

impl AuthorizationApi for Authorizer {
    fn authenticate(
        &self,
        session: &mut ClientSession,
        username: Option<&[u8]>,
        password: Option<&[u8]>,
    ) -> Result<bool, AuthError> {
        let username = match username.filter(|u| !u.is_empty()) {
            Some(u) => as_text(u),
            None => {
                debug!(client = %session.client_id, "Authentication denied - no username");
                return Ok(false);
            }
        };

        let Some(app) = self.registry.get(&username) else {
            debug!(
                client = %session.client_id,
                key = %username,
                "Authentication denied - unknown key"
            );
            return Ok(false);
        };

        // Identity is bound on a username match, whatever the password says.
        session.key = Some(username.into_owned());

        let Some(password) = password.filter(|p| !p.is_empty()) else {
            debug!(
                client = %session.client_id,
                key = %app.key,
                "Authenticated without password"
            );
            return Ok(true);
        };

        if secret_matches(password, &app.secret) {
            session.app = Some(app.key.clone());
            debug!(client = %session.client_id, key = %app.key, "Authenticated with secret");
            return Ok(true);
        }

        warn!(client = %session.client_id, key = %app.key, "Authentication denied - wrong secret");
        Ok(false)
    }

    fn authorize_publish(
        &self,
        session: &ClientSession,
        topic: &str,
        _payload: &[u8],
    ) -> Result<bool, AuthError> {
        let allowed = session.app.is_some()
            && session
                .publish_prefix()
                .is_some_and(|prefix| topic.starts_with(&prefix));

        debug!(client = %session.client_id, topic, allowed, "Publish check");
        Ok(allowed)
    }

    fn authorize_subscribe(
        &self,
        session: &ClientSession,
        topic: &str,
    ) -> Result<bool, AuthError> {
        let allowed = session.key.is_some();
        debug!(client = %session.client_id, topic, allowed, "Subscribe check");
        Ok(allowed)
    }
}
