//! Storage layer for simtrack
//!
//! PostgreSQL-primary with an in-memory backend for tests and local dev,
//! dispatched through the [`StorageBackend`] enum.

mod backend;
mod error;
mod memory;
mod pg;
mod pg_migrations;
pub mod traits;

pub use backend::StorageBackend;
pub use error::StorageError;
pub use memory::MemoryStore;
pub use pg::PgStore;
pub use traits::{HistoryStore, Page, RegistryStore};
