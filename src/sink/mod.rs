//! GraphSink trait and persistence of mapped graphs
//!
//! A sink is where a [`GraphModel`] ends up: an in-memory map for dry runs,
//! a list of Cypher statements for a Neo4j adapter, or the SQLite store.
//! Writes are upserts keyed by node identity, so persisting the same model
//! twice changes nothing.

mod cypher;
mod memory;

pub use cypher::{CypherSink, CypherStatement};
pub use memory::MemorySink;

use crate::graph::{GraphModel, Node, NodeId, Relationship};
use crate::storage::StorageError;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Relationship endpoint not in graph: {0}")]
    MissingEndpoint(NodeId),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Counts of what a `persist` call wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistResult {
    pub nodes_written: usize,
    pub relationships_written: usize,
}

impl PersistResult {
    /// True if the model was empty
    pub fn is_noop(&self) -> bool {
        self.nodes_written == 0 && self.relationships_written == 0
    }
}

/// Destination for mapped nodes and relationships.
///
/// Both calls are upserts. Relationship endpoints are passed in full so a
/// backend can match them by label and key without a lookup of its own.
#[async_trait]
pub trait GraphSink: Send + Sync {
    async fn upsert_node(&self, node: &Node) -> Result<(), SinkError>;

    async fn upsert_relationship(
        &self,
        relationship: &Relationship,
        source: &Node,
        target: &Node,
    ) -> Result<(), SinkError>;
}

/// Write every node, then every relationship, of `model` into `sink`.
pub async fn persist(model: &GraphModel, sink: &dyn GraphSink) -> Result<PersistResult, SinkError> {
    let mut result = PersistResult::default();
    for node in model.nodes() {
        sink.upsert_node(node).await?;
        result.nodes_written += 1;
    }
    for rel in model.relationships() {
        let source = model
            .node(&rel.source)
            .ok_or(SinkError::MissingEndpoint(rel.source))?;
        let target = model
            .node(&rel.target)
            .ok_or(SinkError::MissingEndpoint(rel.target))?;
        sink.upsert_relationship(rel, source, target).await?;
        result.relationships_written += 1;
    }
    tracing::debug!(
        nodes = result.nodes_written,
        relationships = result.relationships_written,
        "persisted graph"
    );
    Ok(result)
}
