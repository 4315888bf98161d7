//! Reload Controller
//!
//! Hot-swaps the host's active credential set without restarting it.
//!
//! ```text
//!   SIGHUP / trigger_reload()
//!            │
//!            ▼
//!   ┌─────────────────┐  load   ┌──────────────────┐
//!   │ ReloadController│────────→│ CredentialStore  │
//!   └────────┬────────┘         └──────────────────┘
//!            │ install(new Authorizer)   (only on success)
//!            ▼
//!   ┌─────────────────┐
//!   │    AuthHost     │  previous hooks stay active on failure
//!   └─────────────────┘
//! ```
//!
//! A reload may overlap an administrative load/save cycle on the same file.
//! Saves are staged and renamed into place, so a reload reads either the old
//! or the new file; no further coordination is attempted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::domain::Registry;
use crate::error::ReloadError;
use crate::metrics::AuthMetrics;
use crate::ports::{AuthHost, CredentialStore};
use crate::service::Authorizer;

/// Outcome of a reload attempt, reported on the events channel.
#[derive(Debug)]
pub enum ReloadEvent {
    /// New authorizer installed
    Reloaded { apps: usize },
    /// No credentials file configured; nothing loaded or installed
    Skipped,
    /// Reload aborted; previous authorizer still installed
    Failed(ReloadError),
}

/// Cloneable trigger for a running [`ReloadController`].
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: mpsc::Sender<()>,
}

impl ReloadHandle {
    /// Request a reload. Requests arriving while one is already pending are
    /// coalesced. Returns `false` once the controller has stopped.
    pub fn trigger_reload(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) | Err(mpsc::error::TrySendError::Full(())) => true,
            Err(mpsc::error::TrySendError::Closed(())) => false,
        }
    }
}

/// Loads credentials and installs authorizers on the host
pub struct ReloadController<S: CredentialStore> {
    path: Option<PathBuf>,
    store: S,
    host: Arc<dyn AuthHost>,
    metrics: Arc<AuthMetrics>,
    events: Option<mpsc::UnboundedSender<ReloadEvent>>,
    trigger_tx: mpsc::Sender<()>,
    trigger_rx: mpsc::Receiver<()>,
}

impl<S: CredentialStore + 'static> ReloadController<S> {
    pub fn new(path: Option<PathBuf>, store: S, host: Arc<dyn AuthHost>) -> Self {
        let (trigger_tx, trigger_rx) = mpsc::channel(1);
        Self {
            path,
            store,
            host,
            metrics: Arc::new(AuthMetrics::new()),
            events: None,
            trigger_tx,
            trigger_rx,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<AuthMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Report every reload outcome on `events`.
    pub fn with_events(mut self, events: mpsc::UnboundedSender<ReloadEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn handle(&self) -> ReloadHandle {
        ReloadHandle {
            tx: self.trigger_tx.clone(),
        }
    }

    /// Request a reload from the running task.
    pub fn trigger_reload(&self) -> bool {
        self.handle().trigger_reload()
    }

    /// Initial install at startup.
    ///
    /// Without a configured path nothing is installed and `Ok(false)` is
    /// returned: the host keeps its default policy.
    pub fn install_initial(&self) -> Result<bool, ReloadError> {
        if self.path.is_none() {
            info!("No credentials file configured, host keeps its default policy");
        }
        self.reload_now().map(|apps| apps.is_some())
    }

    /// Load the credentials file and install a fresh authorizer.
    ///
    /// On failure nothing is installed. Returns the number of applications
    /// loaded, or `None` when no file is configured, which is not a failure.
    pub fn reload_now(&self) -> Result<Option<usize>, ReloadError> {
        let Some(path) = self.path.as_deref() else {
            debug!("No credentials file configured, nothing to reload");
            return Ok(None);
        };

        let result = self.load_and_install(path);
        self.metrics.record_reload(result.is_ok());
        match &result {
            Ok(apps) => info!(apps, "Credentials reloaded"),
            Err(err) => error!(error = %err, "Credentials reload failed, keeping previous hooks"),
        }
        result.map(Some)
    }

    fn load_and_install(&self, path: &Path) -> Result<usize, ReloadError> {
        let registry = Registry::from_state(self.store.load(path)?);
        let apps = registry.len();
        self.host.install(Arc::new(Authorizer::new(registry)));
        Ok(apps)
    }

    fn report(&self, result: Result<Option<usize>, ReloadError>) {
        if let Some(events) = &self.events {
            let event = match result {
                Ok(Some(apps)) => ReloadEvent::Reloaded { apps },
                Ok(None) => ReloadEvent::Skipped,
                Err(err) => ReloadEvent::Failed(err),
            };
            // Receiver gone means nobody listens; the outcome is already logged.
            let _ = events.send(event);
        }
    }

    /// Serve reload requests until the host reports shutdown.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }
        info!(path = ?self.path, "Reload controller armed");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                request = self.trigger_rx.recv() => {
                    if request.is_none() {
                        break;
                    }
                    debug!("Reload requested");
                    let result = self.reload_now();
                    self.report(result);
                }
            }
        }

        info!("Host shut down, reload controller stopped");
    }

    /// Spawn [`run`](Self::run) on the current runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> (ReloadHandle, JoinHandle<()>) {
        let handle = self.handle();
        (handle, tokio::spawn(self.run(shutdown)))
    }
}

/// Forward SIGHUP to `handle` until the host reports shutdown.
#[cfg(unix)]
pub fn spawn_sighup_listener(
    handle: ReloadHandle,
    mut shutdown: watch::Receiver<bool>,
) -> std::io::Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup = signal(SignalKind::hangup())?;
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                received = hangup.recv() => {
                    if received.is_none() {
                        break;
                    }
                    info!("SIGHUP received, reloading credentials");
                    if !handle.trigger_reload() {
                        break;
                    }
                }
            }
        }
        debug!("SIGHUP listener removed");
    }))
}
