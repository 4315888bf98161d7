//! Service Layer - Orchestration
//!
//! - `Authorizer`: decision functions over a registry snapshot
//! - `CredentialAdmin`: administrative load → mutate → save cycles
//! - `ReloadController`: load-then-swap on an external trigger

pub mod admin;
pub mod authorizer;
pub mod reload;

pub use admin::CredentialAdmin;
pub use authorizer::{secret_matches, Authorizer};
#[cfg(unix)]
pub use reload::spawn_sighup_listener;
pub use reload::{ReloadController, ReloadEvent, ReloadHandle};
