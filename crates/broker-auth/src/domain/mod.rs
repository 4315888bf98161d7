//! Domain Layer - Pure business logic
//!
//! This layer contains:
//! - Application records and registration requests
//! - The application registry
//! - Key and secret generation
//! - Per-session authorization state
//!
//! RULES:
//! - No I/O operations
//! - No async code

pub mod app;
pub mod keygen;
pub mod registry;
pub mod session;

pub use app::{AppRecord, NewApplication, FIRST_APP_ID};
pub use keygen::{generate, generate_default, KeyGenerator, KeyPolicy, ALPHABET, DEFAULT_LENGTH};
pub use registry::{Inconsistency, Registry, RegistryState};
pub use session::{ClientSession, SessionState};
