//! Storage trait definitions

use crate::graph::{Node, NodeId, Relationship};
use crate::schema::SchemaDescriptor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Invalid node id: {0}")]
    InvalidId(String),

    #[error("Connection lock poisoned")]
    Poisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for querying nodes
#[derive(Debug, Clone, Default)]
pub struct NodeFilter {
    /// Filter by node type (the sheet a row came from)
    pub node_type: Option<String>,
    /// Maximum number of results
    pub limit: Option<usize>,
}

impl NodeFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, node_type: impl Into<String>) -> Self {
        self.node_type = Some(node_type.into());
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A saved schema descriptor's name and when it was last written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedSchema {
    pub name: String,
    pub saved_at: DateTime<Utc>,
}

/// Trait for graph storage backends
///
/// Implementations must be thread-safe (Send + Sync) so one store can back
/// several concurrent ingests.
pub trait GraphStore: Send + Sync {
    // === Node Operations ===

    /// Upsert a node; properties merge into those already stored
    fn save_node(&self, node: &Node) -> StorageResult<()>;

    /// Load a node by ID
    fn load_node(&self, id: &NodeId) -> StorageResult<Option<Node>>;

    /// Find nodes matching filter criteria
    fn find_nodes(&self, filter: &NodeFilter) -> StorageResult<Vec<Node>>;

    // === Relationship Operations ===

    /// Upsert a relationship, identified by source, type and target
    fn save_relationship(&self, relationship: &Relationship) -> StorageResult<()>;

    /// Relationships leaving a node
    fn relationships_from(&self, id: &NodeId) -> StorageResult<Vec<Relationship>>;

    // === Saved Schemas ===

    /// Store a schema descriptor under `name`, replacing any previous one
    fn save_schema(&self, name: &str, schema: &SchemaDescriptor) -> StorageResult<()>;

    fn load_schema(&self, name: &str) -> StorageResult<Option<SchemaDescriptor>>;

    /// Returns false if nothing was stored under `name`
    fn delete_schema(&self, name: &str) -> StorageResult<bool>;

    /// Saved schemas ordered by name
    fn list_schemas(&self) -> StorageResult<Vec<SavedSchema>>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: GraphStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
