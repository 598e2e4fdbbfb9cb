//! playtrack-store: persistence boundary.
//! A small synchronous key/value trait with file-backed and in-memory
//! backends, and the mapping repository and settings store built on top.
//! Async callers hop through `spawn_blocking`; no business logic here.

pub mod backend;
pub mod mappings;
pub mod settings;

pub use backend::{JsonFileStore, MemoryStore, StorageBackend, StoreError};
pub use mappings::{MAPPINGS_KEY, MappingRepository};
pub use settings::{SETTINGS_KEY, SettingsStore};
