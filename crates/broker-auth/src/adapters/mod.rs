//! Adapters Layer - Port implementations
//!
//! - `JsonFileStore`: credential file persistence
//! - `HookTable`: host-side slots holding the active authorizer
//! - `OsRandomSource` / `ScriptedRandomSource`: randomness for key generation

pub mod hook_table;
pub mod json_file;
pub mod random;

pub use hook_table::{DefaultPolicy, HookTable};
pub use json_file::JsonFileStore;
pub use random::{OsRandomSource, ScriptedRandomSource};
