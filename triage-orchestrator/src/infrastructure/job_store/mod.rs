//! Job persistence

pub mod memory;
pub mod sqlite;
pub mod store;

pub use memory::InMemoryJobStore;
pub use sqlite::SqliteJobStore;
pub use store::{JobStore, JobStoreError};
