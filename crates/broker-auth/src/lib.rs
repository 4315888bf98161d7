//! # Broker Auth
//!
//! Credential store and authorization engine for a publish/subscribe broker.
//!
//! Clients authenticate with an application key (username) and secret
//! (password) from a persisted application registry. Publishing is limited
//! to the application's own `$<key>:` topic namespace.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        HOST BROKER (external)                    │
//! │      connect ──→ authenticate   publish ──→ authorize_publish    │
//! │                  subscribe ──→ authorize_subscribe               │
//! └───────────────────────────────┬──────────────────────────────────┘
//!                                 │
//!                        ┌────────┴────────┐
//!                        │    HookTable    │  atomic pointer swap
//!                        └────────┬────────┘
//!                                 │ install
//!   SIGHUP ──→ ┌──────────────────┴──┐  load  ┌─────────────────────┐
//!              │  ReloadController   │───────→│   JsonFileStore     │
//!              └──────────┬──────────┘        └──────────▲──────────┘
//!                         │ new                          │ load/save
//!              ┌──────────┴──────────┐        ┌──────────┴──────────┐
//!              │     Authorizer      │        │   CredentialAdmin   │
//!              │  (Arc<Registry>)    │        │  addapp / rmapp     │
//!              └─────────────────────┘        └─────────────────────┘
//! ```
//!
//! This crate follows Hexagonal Architecture (Ports & Adapters):
//!
//! - **Domain Layer** (`domain/`): registry, records, key generation, sessions
//! - **Ports Layer** (`ports/`): `AuthorizationApi`, `CredentialStore`,
//!   `AuthHost`, `RandomSource`
//! - **Service Layer** (`service/`): `Authorizer`, `CredentialAdmin`,
//!   `ReloadController`
//! - **Adapters Layer** (`adapters/`): `JsonFileStore`, `HookTable`,
//!   `OsRandomSource`
//!
//! ## Session States
//!
//! - **Unauthenticated**: nothing bound; every check is denied
//! - **IdentityBound**: username matched a registered key; may subscribe
//! - **Authorized**: secret verified; may also publish under `$<key>:`
//!
//! A known username with a wrong password is denied at connect time but
//! still binds the identity, so such a session can subscribe.
//!
//! ## Usage
//!
//! ```ignore
//! use broker_auth::{DefaultPolicy, HookTable, JsonFileStore, ReloadController};
//! use std::sync::Arc;
//!
//! let hooks = Arc::new(HookTable::new(DefaultPolicy::Allow));
//! let path = Some("auth.json".into());
//! let controller = ReloadController::new(path, JsonFileStore::new(), hooks.clone());
//! controller.install_initial()?;
//! let (reload, _task) = controller.spawn(shutdown_rx);
//! broker_auth::spawn_sighup_listener(reload, shutdown_rx2)?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports for convenience
pub use adapters::{DefaultPolicy, HookTable, JsonFileStore, OsRandomSource};
pub use config::AuthConfig;
pub use domain::{
    AppRecord, ClientSession, Inconsistency, KeyGenerator, KeyPolicy, NewApplication, Registry,
    RegistryState, SessionState,
};
pub use error::{AdminError, AuthError, ConfigError, RegistryError, ReloadError, StoreError};
pub use metrics::{AuthMetrics, MetricsSnapshot};
pub use ports::{AuthHost, AuthorizationApi, CredentialStore, RandomSource};
#[cfg(unix)]
pub use service::spawn_sighup_listener;
pub use service::{Authorizer, CredentialAdmin, ReloadController, ReloadEvent, ReloadHandle};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
