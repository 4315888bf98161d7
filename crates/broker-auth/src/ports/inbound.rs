//! Inbound Ports (Driving Ports)
//!
//! The decision functions the host broker calls for every connection,
//! publish and subscribe.

use crate::domain::ClientSession;
use crate::error::AuthError;

/// Authentication and authorization decisions (Driving Port)
///
/// A denial is `Ok(false)`. `Err` is reserved for internal faults; the host
/// must treat it as a denial.
pub trait AuthorizationApi: Send + Sync {
    /// Authenticate a connecting client.
    ///
    /// Binds `session.key` when the username matches a registered
    /// application and `session.app` when the password matches its secret.
    fn authenticate(
        &self,
        session: &mut ClientSession,
        username: Option<&[u8]>,
        password: Option<&[u8]>,
    ) -> Result<bool, AuthError>;

    /// Decide whether `session` may publish `payload` on `topic`.
    fn authorize_publish(
        &self,
        session: &ClientSession,
        topic: &str,
        payload: &[u8],
    ) -> Result<bool, AuthError>;

    /// Decide whether `session` may subscribe to `topic`.
    fn authorize_subscribe(&self, session: &ClientSession, topic: &str)
        -> Result<bool, AuthError>;
}
