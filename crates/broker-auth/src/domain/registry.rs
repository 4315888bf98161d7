//! Application registry.
//!
//! In-memory mapping of application key to record, plus the counter that
//! hands out application ids.
//!
//! ## Invariants
//!
//! - `next_id` is greater than every id this registry has issued.
//! - Every record is stored under its own key.
//!
//! Both hold for registries built through [`Registry::add`]. A registry
//! rebuilt with [`Registry::deserialize`] takes the persisted state as-is;
//! [`Registry::inconsistencies`] reports where it does not hold.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::app::{AppRecord, NewApplication, FIRST_APP_ID};
use crate::domain::keygen::KeyGenerator;
use crate::error::RegistryError;

fn first_app_id() -> u64 {
    FIRST_APP_ID
}

/// Persisted registry state.
///
/// Field names match the credential file format. `apps` is ordered so that
/// encoding the same state always yields the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryState {
    /// Next id to assign
    #[serde(default = "first_app_id")]
    pub idx: u64,
    /// Records by key
    #[serde(default)]
    pub apps: BTreeMap<String, AppRecord>,
}

impl Default for RegistryState {
    fn default() -> Self {
        Self {
            idx: FIRST_APP_ID,
            apps: BTreeMap::new(),
        }
    }
}

/// A consistency problem found in a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// Record stored under a key other than its own
    KeyMismatch { map_key: String, record_key: String },
    /// Record id not below the next id to assign
    IdNotBelowNext { key: String, id: u64, next_id: u64 },
}

/// In-memory application registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registry {
    next_id: u64,
    apps: BTreeMap<String, AppRecord>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            next_id: FIRST_APP_ID,
            apps: BTreeMap::new(),
        }
    }

    /// Build a registry from persisted state.
    pub fn from_state(state: RegistryState) -> Self {
        let mut registry = Self::new();
        registry.deserialize(state);
        registry
    }

    /// Register a new application.
    ///
    /// An explicit key that is already present fails with
    /// [`RegistryError::DuplicateKey`] and leaves the registry untouched.
    /// A missing key is generated, retrying until it does not collide with
    /// an existing one. A missing secret is generated. When the id counter
    /// is at its maximum the add fails with [`RegistryError::IdsExhausted`].
    pub fn add(
        &mut self,
        request: NewApplication,
        generator: &KeyGenerator<'_>,
    ) -> Result<AppRecord, RegistryError> {
        let NewApplication { name, key, secret } = request;

        let id = self.next_id;
        let next_id = id
            .checked_add(1)
            .ok_or(RegistryError::IdsExhausted { last: id })?;

        let key = match key.filter(|k| !k.is_empty()) {
            Some(key) if self.apps.contains_key(&key) => {
                return Err(RegistryError::DuplicateKey { name, key });
            }
            Some(key) => key,
            None => loop {
                let candidate = generator.key();
                if !candidate.is_empty() && !self.apps.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        let secret = secret
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| generator.secret());

        let record = AppRecord {
            name,
            id,
            key: key.clone(),
            secret,
        };
        self.next_id = next_id;
        self.apps.insert(key, record.clone());

        Ok(record)
    }

    /// Remove an application. Absence is not an error.
    pub fn remove(&mut self, key: &str) -> Option<AppRecord> {
        self.apps.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&AppRecord> {
        self.apps.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.apps.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Records in key order
    pub fn apps(&self) -> impl Iterator<Item = &AppRecord> {
        self.apps.values()
    }

    /// Snapshot of the registry state. Mutating the snapshot does not
    /// affect the registry.
    pub fn serialize(&self) -> RegistryState {
        RegistryState {
            idx: self.next_id,
            apps: self.apps.clone(),
        }
    }

    /// Replace the whole registry content with `state`.
    ///
    /// A zero `idx` is treated as absent and resets to [`FIRST_APP_ID`].
    /// Records are taken as-is.
    pub fn deserialize(&mut self, state: RegistryState) {
        self.next_id = if state.idx == 0 {
            FIRST_APP_ID
        } else {
            state.idx
        };
        self.apps = state.apps;
    }

    /// Report records that break the registry invariants.
    pub fn inconsistencies(&self) -> Vec<Inconsistency> {
        let mut found = Vec::new();
        for (map_key, record) in &self.apps {
            if &record.key != map_key {
                found.push(Inconsistency::KeyMismatch {
                    map_key: map_key.clone(),
                    record_key: record.key.clone(),
                });
            }
            if record.id >= self.next_id {
                found.push(Inconsistency::IdNotBelowNext {
                    key: map_key.clone(),
                    id: record.id,
                    next_id: self.next_id,
                });
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{OsRandomSource, ScriptedRandomSource};
    use crate::domain::keygen::{KeyPolicy, ALPHABET};
    use proptest::prelude::*;

    fn os_generator(rng: &OsRandomSource) -> KeyGenerator<'_> {
        KeyGenerator::new(rng, KeyPolicy::default()).unwrap()
    }

    #[test]
    fn test_add_with_explicit_key() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();

        let app = registry
            .add(
                NewApplication::new("acme").with_key("acme").with_secret("s3cret"),
                &os_generator(&rng),
            )
            .unwrap();

        assert_eq!(app.key, "acme");
        assert_eq!(app.secret, "s3cret");
        assert_eq!(app.id, FIRST_APP_ID);
        assert_eq!(registry.get("acme").unwrap().key, "acme");
        assert_eq!(registry.next_id(), FIRST_APP_ID + 1);
    }

    #[test]
    fn test_add_duplicate_key_leaves_registry_unchanged() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();
        registry
            .add(NewApplication::new("first").with_key("acme"), &os_generator(&rng))
            .unwrap();
        let before = registry.clone();

        let err = registry
            .add(
                NewApplication::new("second").with_key("acme").with_secret("x"),
                &os_generator(&rng),
            )
            .unwrap_err();

        assert_eq!(
            err,
            RegistryError::DuplicateKey {
                name: "second".into(),
                key: "acme".into()
            }
        );
        assert_eq!(registry, before);
    }

    #[test]
    fn test_add_generates_key_and_secret() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();

        let app = registry
            .add(NewApplication::new("generated"), &os_generator(&rng))
            .unwrap();

        assert_eq!(app.key.len(), 20);
        assert_eq!(app.secret.len(), 20);
        assert!(registry.contains(&app.key));
    }

    #[test]
    fn test_empty_key_treated_as_missing() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();

        let app = registry
            .add(
                NewApplication::new("blank").with_key("").with_secret(""),
                &os_generator(&rng),
            )
            .unwrap();

        assert_eq!(app.key.len(), 20);
        assert_eq!(app.secret.len(), 20);
    }

    #[test]
    fn test_generated_key_retries_on_collision() {
        // Two-symbol keys: "00" collides, "11" does not, secret is "22".
        let rng = ScriptedRandomSource::new(vec![0, 0, 1, 1, 2, 2]);
        let generator = KeyGenerator::new(&rng, KeyPolicy::new(2, 2).unwrap()).unwrap();
        let mut registry = Registry::new();
        registry
            .add(
                NewApplication::new("taken").with_key("00").with_secret("s"),
                &generator,
            )
            .unwrap();

        let app = registry
            .add(NewApplication::new("fresh"), &generator)
            .unwrap();

        assert_eq!(app.key, "11");
        assert_eq!(app.secret, "22");
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_at_last_id_fails_without_change() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::from_state(RegistryState {
            idx: u64::MAX,
            apps: BTreeMap::new(),
        });
        let before = registry.clone();

        let err = registry
            .add(NewApplication::new("late").with_key("late"), &os_generator(&rng))
            .unwrap_err();

        assert_eq!(err, RegistryError::IdsExhausted { last: u64::MAX });
        assert_eq!(registry, before);
    }

    #[test]
    fn test_remove_twice() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();
        let app = registry
            .add(NewApplication::new("acme").with_key("acme"), &os_generator(&rng))
            .unwrap();

        assert_eq!(registry.remove("acme"), Some(app));
        assert_eq!(registry.remove("acme"), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_remove() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();
        let first = registry
            .add(NewApplication::new("a").with_key("a"), &os_generator(&rng))
            .unwrap();
        registry.remove("a");
        let second = registry
            .add(NewApplication::new("a").with_key("a"), &os_generator(&rng))
            .unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn test_serialize_is_a_snapshot() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();
        registry
            .add(NewApplication::new("acme").with_key("acme"), &os_generator(&rng))
            .unwrap();

        let mut snapshot = registry.serialize();
        snapshot.apps.clear();
        snapshot.idx = 1;

        assert!(registry.contains("acme"));
        assert_eq!(registry.next_id(), FIRST_APP_ID + 1);
    }

    #[test]
    fn test_round_trip() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();
        for name in ["a", "b", "c"] {
            registry
                .add(NewApplication::new(name), &os_generator(&rng))
                .unwrap();
        }

        let restored = Registry::from_state(registry.serialize());
        assert_eq!(restored, registry);
    }

    #[test]
    fn test_deserialize_defaults_idx() {
        let state: RegistryState = serde_json::from_str(r#"{"apps":{}}"#).unwrap();
        assert_eq!(Registry::from_state(state).next_id(), FIRST_APP_ID);

        let zero = RegistryState {
            idx: 0,
            apps: BTreeMap::new(),
        };
        assert_eq!(Registry::from_state(zero).next_id(), FIRST_APP_ID);
    }

    #[test]
    fn test_deserialize_replaces_content() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();
        registry
            .add(NewApplication::new("old").with_key("old"), &os_generator(&rng))
            .unwrap();

        registry.deserialize(RegistryState {
            idx: 2000,
            apps: BTreeMap::new(),
        });

        assert!(registry.is_empty());
        assert_eq!(registry.next_id(), 2000);
    }

    #[test]
    fn test_persisted_idx_is_honored() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::from_state(RegistryState {
            idx: 4242,
            apps: BTreeMap::new(),
        });

        let app = registry
            .add(NewApplication::new("next"), &os_generator(&rng))
            .unwrap();
        assert_eq!(app.id, 4242);
    }

    #[test]
    fn test_inconsistencies() {
        let mut apps = BTreeMap::new();
        apps.insert(
            "alias".to_string(),
            AppRecord {
                name: "odd".into(),
                id: 1500,
                key: "real".into(),
                secret: "s".into(),
            },
        );
        let registry = Registry::from_state(RegistryState { idx: 1200, apps });

        let found = registry.inconsistencies();
        assert_eq!(found.len(), 2);
        assert!(found.contains(&Inconsistency::KeyMismatch {
            map_key: "alias".into(),
            record_key: "real".into()
        }));
        assert!(found.contains(&Inconsistency::IdNotBelowNext {
            key: "alias".into(),
            id: 1500,
            next_id: 1200
        }));
    }

    #[test]
    fn test_generated_keys_use_alphabet() {
        let rng = OsRandomSource::new();
        let mut registry = Registry::new();
        let app = registry
            .add(NewApplication::new("x"), &os_generator(&rng))
            .unwrap();
        assert!(app.key.bytes().all(|b| ALPHABET.contains(&b)));
    }

    proptest! {
        #[test]
        fn prop_ids_strictly_increase(names in proptest::collection::vec("[a-z]{1,8}", 1..20)) {
            let rng = OsRandomSource::new();
            let mut registry = Registry::new();
            let mut last = None;
            for name in names {
                let app = registry.add(NewApplication::new(name), &os_generator(&rng)).unwrap();
                if let Some(prev) = last {
                    prop_assert!(app.id > prev);
                }
                last = Some(app.id);
            }
            prop_assert!(registry.inconsistencies().is_empty());
        }
    }
}
