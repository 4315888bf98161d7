//! Host-side hook slots.
//!
//! The broker keeps one `HookTable` and consults it on every connect,
//! publish and subscribe. Installing an authorizer swaps a single pointer,
//! so an in-flight decision sees either the old or the new authorizer,
//! never a mix.
//!
//! Decision errors are logged and answered as a denial (fail closed).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{error, info};

use crate::domain::ClientSession;
use crate::error::AuthError;
use crate::metrics::AuthMetrics;
use crate::ports::{AuthHost, AuthorizationApi};

/// Answer given while no authorizer is installed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DefaultPolicy {
    /// Broker runs without credentials: every request is accepted
    #[default]
    Allow,
    /// Every request is rejected until an authorizer is installed
    Deny,
}

impl DefaultPolicy {
    fn answer(self) -> bool {
        matches!(self, DefaultPolicy::Allow)
    }
}

struct InstalledHooks {
    authorizer: Arc<dyn AuthorizationApi>,
    generation: u64,
}

/// Atomically replaceable authorization hooks
pub struct HookTable {
    installed: ArcSwapOption<InstalledHooks>,
    installs: AtomicU64,
    default_policy: DefaultPolicy,
    metrics: Arc<AuthMetrics>,
}

impl HookTable {
    pub fn new(default_policy: DefaultPolicy) -> Self {
        Self::with_metrics(default_policy, Arc::new(AuthMetrics::new()))
    }

    pub fn with_metrics(default_policy: DefaultPolicy, metrics: Arc<AuthMetrics>) -> Self {
        Self {
            installed: ArcSwapOption::empty(),
            installs: AtomicU64::new(0),
            default_policy,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<AuthMetrics> {
        &self.metrics
    }

    pub fn is_installed(&self) -> bool {
        self.installed.load().is_some()
    }

    /// Number of installs so far; 0 while the default policy answers.
    pub fn generation(&self) -> u64 {
        self.current().map_or(0, |hooks| hooks.generation)
    }

    fn current(&self) -> Option<Arc<InstalledHooks>> {
        self.installed.load_full()
    }

    fn fail_closed(&self, what: &str, client: &str, result: Result<bool, AuthError>) -> bool {
        match result {
            Ok(answer) => answer,
            Err(err) => {
                self.metrics.record_internal_fault();
                error!(client, error = %err, "{} failed - denying", what);
                false
            }
        }
    }

    /// Authenticate with the callback contract: `done(error, granted)`.
    ///
    /// A plain denial arrives as `(None, false)`; `Some(error)` means an
    /// internal fault and is always paired with `false`.
    pub fn authenticate_with<F>(
        &self,
        session: &mut ClientSession,
        username: Option<&[u8]>,
        password: Option<&[u8]>,
        done: F,
    ) where
        F: FnOnce(Option<AuthError>, bool),
    {
        match self.current() {
            Some(hooks) => match hooks.authorizer.authenticate(session, username, password) {
                Ok(granted) => done(None, granted),
                Err(err) => done(Some(err), false),
            },
            None => done(None, self.default_policy.answer()),
        }
    }

    /// Publish check with the callback contract: `done(error, allowed)`.
    pub fn authorize_publish_with<F>(
        &self,
        session: &ClientSession,
        topic: &str,
        payload: &[u8],
        done: F,
    ) where
        F: FnOnce(Option<AuthError>, bool),
    {
        match self.current() {
            Some(hooks) => match hooks.authorizer.authorize_publish(session, topic, payload) {
                Ok(allowed) => done(None, allowed),
                Err(err) => done(Some(err), false),
            },
            None => done(None, self.default_policy.answer()),
        }
    }

    /// Subscribe check with the callback contract: `done(error, allowed)`.
    pub fn authorize_subscribe_with<F>(&self, session: &ClientSession, topic: &str, done: F)
    where
        F: FnOnce(Option<AuthError>, bool),
    {
        match self.current() {
            Some(hooks) => match hooks.authorizer.authorize_subscribe(session, topic) {
                Ok(allowed) => done(None, allowed),
                Err(err) => done(Some(err), false),
            },
            None => done(None, self.default_policy.answer()),
        }
    }

    /// Authenticate, treating internal faults as a denial.
    pub fn authenticate(
        &self,
        session: &mut ClientSession,
        username: Option<&[u8]>,
        password: Option<&[u8]>,
    ) -> bool {
        let client = session.client_id.clone();
        let mut result = Ok(false);
        self.authenticate_with(session, username, password, |err, granted| {
            result = err.map_or(Ok(granted), Err);
        });
        let granted = self.fail_closed("Authentication", &client, result);
        self.metrics.record_authentication(granted);
        granted
    }

    /// Publish check, treating internal faults as a denial.
    pub fn authorize_publish(&self, session: &ClientSession, topic: &str, payload: &[u8]) -> bool {
        let mut result = Ok(false);
        self.authorize_publish_with(session, topic, payload, |err, allowed| {
            result = err.map_or(Ok(allowed), Err);
        });
        let allowed = self.fail_closed("Publish authorization", &session.client_id, result);
        self.metrics.record_publish(allowed);
        allowed
    }

    /// Subscribe check, treating internal faults as a denial.
    pub fn authorize_subscribe(&self, session: &ClientSession, topic: &str) -> bool {
        let mut result = Ok(false);
        self.authorize_subscribe_with(session, topic, |err, allowed| {
            result = err.map_or(Ok(allowed), Err);
        });
        let allowed = self.fail_closed("Subscribe authorization", &session.client_id, result);
        self.metrics.record_subscribe(allowed);
        allowed
    }
}

impl Default for HookTable {
    fn default() -> Self {
        Self::new(DefaultPolicy::default())
    }
}

impl AuthHost for HookTable {
    fn install(&self, authorizer: Arc<dyn AuthorizationApi>) {
        let generation = self.installs.fetch_add(1, Ordering::SeqCst) + 1;
        self.installed.store(Some(Arc::new(InstalledHooks {
            authorizer,
            generation,
        })));
        info!(generation, "Installed authorization hooks");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppRecord, Registry, RegistryState};
    use crate::service::Authorizer;
    use std::collections::BTreeMap;

    struct FaultyAuthorizer;

    impl AuthorizationApi for FaultyAuthorizer {
        fn authenticate(
            &self,
            _session: &mut ClientSession,
            _username: Option<&[u8]>,
            _password: Option<&[u8]>,
        ) -> Result<bool, AuthError> {
            Err(AuthError::InternalFault("registry unavailable".into()))
        }

        fn authorize_publish(
            &self,
            _session: &ClientSession,
            _topic: &str,
            _payload: &[u8],
        ) -> Result<bool, AuthError> {
            Err(AuthError::InternalFault("registry unavailable".into()))
        }

        fn authorize_subscribe(
            &self,
            _session: &ClientSession,
            _topic: &str,
        ) -> Result<bool, AuthError> {
            Err(AuthError::InternalFault("registry unavailable".into()))
        }
    }

    fn authorizer_for(key: &str, secret: &str) -> Arc<dyn AuthorizationApi> {
        let mut apps = BTreeMap::new();
        apps.insert(
            key.to_string(),
            AppRecord {
                name: key.to_string(),
                id: 1000,
                key: key.to_string(),
                secret: secret.to_string(),
            },
        );
        Arc::new(Authorizer::new(Registry::from_state(RegistryState {
            idx: 1001,
            apps,
        })))
    }

    #[test]
    fn test_default_policy_allow() {
        let table = HookTable::new(DefaultPolicy::Allow);
        let mut session = ClientSession::new("c1");

        assert!(!table.is_installed());
        assert_eq!(table.generation(), 0);
        assert!(table.authenticate(&mut session, None, None));
        assert!(table.authorize_publish(&session, "any", b""));
        assert!(table.authorize_subscribe(&session, "any"));
    }

    #[test]
    fn test_default_policy_deny() {
        let table = HookTable::new(DefaultPolicy::Deny);
        let mut session = ClientSession::new("c1");

        assert!(!table.authenticate(&mut session, Some(b"acme"), None));
        assert!(!table.authorize_publish(&session, "$acme:x", b""));
        assert!(!table.authorize_subscribe(&session, "x"));
    }

    #[test]
    fn test_installed_authorizer_answers() {
        let table = HookTable::new(DefaultPolicy::Allow);
        table.install(authorizer_for("acme", "s3cret"));
        let mut session = ClientSession::new("c1");

        assert_eq!(table.generation(), 1);
        assert!(table.authenticate(&mut session, Some(b"acme"), Some(b"s3cret")));
        assert!(table.authorize_publish(&session, "$acme:sensors/temp", b"1"));
        assert!(!table.authorize_publish(&session, "acme:sensors/temp", b"1"));

        let snapshot = table.metrics().snapshot();
        assert_eq!(snapshot.authentications_granted, 1);
        assert_eq!(snapshot.publish_denied, 1);
    }

    #[test]
    fn test_reinstall_replaces_decisions() {
        let table = HookTable::new(DefaultPolicy::Deny);
        table.install(authorizer_for("acme", "one"));
        table.install(authorizer_for("acme", "two"));

        let mut session = ClientSession::new("c1");
        assert_eq!(table.generation(), 2);
        assert!(!table.authenticate(&mut session, Some(b"acme"), Some(b"one")));

        let mut session = ClientSession::new("c2");
        assert!(table.authenticate(&mut session, Some(b"acme"), Some(b"two")));
    }

    #[test]
    fn test_existing_session_kept_across_install() {
        let table = HookTable::new(DefaultPolicy::Deny);
        table.install(authorizer_for("acme", "s3cret"));
        let mut session = ClientSession::new("c1");
        assert!(table.authenticate(&mut session, Some(b"acme"), Some(b"s3cret")));

        table.install(authorizer_for("other", "x"));

        // Bound fields survive; the prefix rule is re-evaluated by the new hooks.
        assert!(table.authorize_publish(&session, "$acme:still/mine", b""));
    }

    #[test]
    fn test_internal_fault_fails_closed() {
        let table = HookTable::new(DefaultPolicy::Allow);
        table.install(Arc::new(FaultyAuthorizer));
        let mut session = ClientSession::new("c1");

        assert!(!table.authenticate(&mut session, Some(b"acme"), Some(b"s3cret")));
        assert!(!table.authorize_publish(&session, "$acme:x", b""));
        assert!(!table.authorize_subscribe(&session, "x"));
        assert_eq!(table.metrics().snapshot().internal_faults, 3);
    }

    #[test]
    fn test_callback_contract() {
        let table = HookTable::new(DefaultPolicy::Deny);
        table.install(authorizer_for("acme", "s3cret"));
        let mut session = ClientSession::new("c1");

        let mut outcome = None;
        table.authenticate_with(&mut session, Some(b"acme"), Some(b"bad"), |err, granted| {
            outcome = Some((err, granted));
        });
        assert_eq!(outcome, Some((None, false)));

        table.install(Arc::new(FaultyAuthorizer));
        let mut outcome = None;
        table.authorize_subscribe_with(&session, "x", |err, allowed| {
            outcome = Some((err, allowed));
        });
        assert_eq!(
            outcome,
            Some((
                Some(AuthError::InternalFault("registry unavailable".into())),
                false
            ))
        );
    }
}
