//! Outbound Ports (Driven Ports)
//!
//! Dependencies the engine needs from its surroundings: randomness, a
//! persistent home for the registry, and the host broker's hook slots.

use std::path::Path;
use std::sync::Arc;

use crate::domain::RegistryState;
use crate::error::StoreError;
use crate::ports::AuthorizationApi;

/// Source of uniformly distributed indices (Driven Port)
pub trait RandomSource: Send + Sync {
    /// A uniformly distributed value in `0..bound`. `bound` is never 0.
    fn random_index(&self, bound: usize) -> usize;
}

/// Persistent storage for registry state (Driven Port)
pub trait CredentialStore: Send + Sync {
    /// Read and decode the state stored at `path`.
    fn load(&self, path: &Path) -> Result<RegistryState, StoreError>;

    /// Encode and write `state` to `path`. Saving unchanged state must
    /// produce identical bytes.
    fn save(&self, path: &Path, state: &RegistryState) -> Result<(), StoreError>;
}

/// The host broker's authorization hook slots (Driven Port)
///
/// Installing replaces all three decision functions at once. Sessions keep
/// their bound fields; the next decision is answered by the new authorizer.
pub trait AuthHost: Send + Sync {
    fn install(&self, authorizer: Arc<dyn AuthorizationApi>);
}
