//! Random Source Adapters

use parking_lot::Mutex;
use rand::rngs::OsRng;
use rand::Rng;

use crate::ports::RandomSource;

/// Production random source backed by the operating system CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomSource;

impl OsRandomSource {
    pub fn new() -> Self {
        Self
    }
}

impl RandomSource for OsRandomSource {
    fn random_index(&self, bound: usize) -> usize {
        OsRng.gen_range(0..bound)
    }
}

/// Scripted random source for deterministic testing.
///
/// Replays `values` in order (wrapping around), each reduced modulo the
/// requested bound.
///
/// # Example
///
/// ```rust
/// use broker_auth::adapters::ScriptedRandomSource;
/// use broker_auth::RandomSource;
///
/// let rng = ScriptedRandomSource::new(vec![3, 40]);
/// assert_eq!(rng.random_index(36), 3);
/// assert_eq!(rng.random_index(36), 4);
/// assert_eq!(rng.random_index(36), 3); // wraps around
/// ```
#[derive(Debug)]
pub struct ScriptedRandomSource {
    values: Vec<usize>,
    position: Mutex<usize>,
}

impl ScriptedRandomSource {
    pub fn new(values: Vec<usize>) -> Self {
        Self {
            values,
            position: Mutex::new(0),
        }
    }
}

impl RandomSource for ScriptedRandomSource {
    fn random_index(&self, bound: usize) -> usize {
        if self.values.is_empty() || bound == 0 {
            return 0;
        }
        let mut position = self.position.lock();
        let value = self.values[*position % self.values.len()];
        *position += 1;
        value % bound
    }
}
