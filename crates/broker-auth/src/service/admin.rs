//! Administrative entry points
//!
//! Each mutation is one sequential load → mutate → save cycle against the
//! credentials file. Concurrent administration of the same file must be
//! serialized by the caller (one CLI invocation at a time).

use std::path::Path;

use tracing::{debug, info};

use crate::domain::{AppRecord, KeyGenerator, KeyPolicy, NewApplication, Registry};
use crate::error::{AdminError, ConfigError, StoreError};
use crate::ports::{CredentialStore, RandomSource};

/// Administrative operations over a credential store
pub struct CredentialAdmin<S: CredentialStore, R: RandomSource> {
    store: S,
    rng: R,
    policy: KeyPolicy,
}

impl<S: CredentialStore, R: RandomSource> CredentialAdmin<S, R> {
    /// Fails when `policy` would generate empty keys or secrets.
    pub fn new(store: S, rng: R, policy: KeyPolicy) -> Result<Self, ConfigError> {
        policy.validate()?;
        Ok(Self { store, rng, policy })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Generator using this service's random source and length policy
    pub fn generator(&self) -> KeyGenerator<'_> {
        KeyGenerator::with_checked_policy(&self.rng, self.policy)
    }

    /// Load the registry persisted at `path`.
    pub fn load_from_path(&self, path: &Path) -> Result<Registry, StoreError> {
        self.store.load(path).map(Registry::from_state)
    }

    /// Persist `registry` at `path`.
    pub fn save_to_path(&self, path: &Path, registry: &Registry) -> Result<(), StoreError> {
        self.store.save(path, &registry.serialize())
    }

    /// Load for mutation: a missing file starts an empty registry, any other
    /// failure aborts without touching the file.
    fn load_for_update(&self, path: &Path) -> Result<Registry, StoreError> {
        match self.load_from_path(path) {
            Ok(registry) => Ok(registry),
            Err(err) if err.is_not_found() => {
                debug!(path = %path.display(), "No credentials file yet, starting empty");
                Ok(Registry::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Register an application in the file at `path`.
    pub fn add_application(
        &self,
        path: &Path,
        request: NewApplication,
    ) -> Result<AppRecord, AdminError> {
        let mut registry = self.load_for_update(path)?;
        let app = registry.add(request, &self.generator())?;
        self.save_to_path(path, &registry)?;

        info!(name = %app.name, key = %app.key, id = app.id, "Created app");
        Ok(app)
    }

    /// Remove an application from the file at `path`.
    ///
    /// Returns `None` when no application has that key; the file is left
    /// untouched in that case.
    pub fn remove_application(
        &self,
        path: &Path,
        key: &str,
    ) -> Result<Option<AppRecord>, AdminError> {
        let mut registry = self.load_for_update(path)?;
        let removed = registry.remove(key);

        match &removed {
            Some(app) => {
                self.save_to_path(path, &registry)?;
                info!(name = %app.name, key = %app.key, "Removed app");
            }
            None => info!(key, "No app removed"),
        }
        Ok(removed)
    }

    /// All applications in the file at `path`, in key order.
    pub fn list_applications(&self, path: &Path) -> Result<Vec<AppRecord>, StoreError> {
        Ok(self.load_from_path(path)?.apps().cloned().collect())
    }
}
