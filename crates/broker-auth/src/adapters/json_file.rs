//! # JSON Credential File Store
//!
//! Persists registry state as pretty-printed JSON:
//!
//! ```text
//! {
//!   "idx": 1002,
//!   "apps": {
//!     "<key>": { "name": ..., "id": ..., "key": ..., "secret": ... }
//!   }
//! }
//! ```
//!
//! Two-space indentation, keys in sorted order and a trailing newline, so
//! saving unchanged state rewrites the same bytes.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::RegistryState;
use crate::error::StoreError;
use crate::ports::CredentialStore;

/// Credential store backed by a JSON file.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonFileStore;

impl JsonFileStore {
    pub fn new() -> Self {
        Self
    }

    /// Encode `state` in the on-disk format.
    pub fn encode(state: &RegistryState) -> Result<String, StoreError> {
        let mut text = serde_json::to_string_pretty(state).map_err(StoreError::Serialize)?;
        text.push('\n');
        Ok(text)
    }

    /// Decode the on-disk format. `path` is only used for error reporting.
    pub fn decode(path: &Path, bytes: &[u8]) -> Result<RegistryState, StoreError> {
        serde_json::from_slice(bytes).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn staging_path(path: &Path) -> PathBuf {
        let mut staged = OsString::from(path.as_os_str());
        staged.push(".tmp");
        PathBuf::from(staged)
    }

    /// Write `bytes` to `staged` and rename it over `path`. The staged file
    /// takes the permissions of the file it replaces.
    fn write_staged(path: &Path, staged: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::write(staged, bytes)?;
        match fs::metadata(path) {
            Ok(existing) => fs::set_permissions(staged, existing.permissions())?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        fs::rename(staged, path)
    }
}

impl CredentialStore for JsonFileStore {
    fn load(&self, path: &Path) -> Result<RegistryState, StoreError> {
        let bytes = fs::read(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let state = Self::decode(path, &bytes)?;
        debug!(path = %path.display(), apps = state.apps.len(), "Loaded credentials");
        Ok(state)
    }

    fn save(&self, path: &Path, state: &RegistryState) -> Result<(), StoreError> {
        let text = Self::encode(state)?;
        let io_err = |source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        };

        // Readers never see a half-written file.
        let staged = Self::staging_path(path);
        if let Err(err) = Self::write_staged(path, &staged, text.as_bytes()) {
            let _ = fs::remove_file(&staged);
            return Err(io_err(err));
        }

        debug!(path = %path.display(), apps = state.apps.len(), "Saved credentials");
        Ok(())
    }
}
