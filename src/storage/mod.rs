//! Persistent storage for mapped graphs and saved schemas
//!
//! Backends implement the `GraphStore` trait. `SqliteStore` is the one
//! shipped, and it doubles as a `GraphSink` for the ingest pipeline.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{GraphStore, NodeFilter, OpenStore, SavedSchema, StorageError, StorageResult};
