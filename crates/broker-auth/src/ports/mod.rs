//! Ports Layer - Trait definitions
//!
//! - Inbound: decision functions called by the host broker
//! - Outbound: randomness, credential storage, host hook slots

pub mod inbound;
pub mod outbound;

pub use inbound::AuthorizationApi;
pub use outbound::{AuthHost, CredentialStore, RandomSource};
