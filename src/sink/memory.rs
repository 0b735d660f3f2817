//! In-memory sink for dry runs and tests

use super::{GraphSink, SinkError};
use crate::graph::{Node, NodeId, Relationship};
use async_trait::async_trait;
use dashmap::DashMap;

type RelationshipKey = (NodeId, String, NodeId);

/// Concurrent upsert map. Nodes merge by id; relationships merge by
/// `(source, type, target)`, the later properties winning.
#[derive(Debug, Default)]
pub struct MemorySink {
    nodes: DashMap<NodeId, Node>,
    relationships: DashMap<RelationshipKey, Relationship>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.nodes.get(id).map(|n| n.value().clone())
    }

    pub fn nodes_of_type(&self, node_type: &str) -> Vec<Node> {
        let mut nodes: Vec<Node> = self
            .nodes
            .iter()
            .filter(|n| n.node_type == node_type)
            .map(|n| n.value().clone())
            .collect();
        nodes.sort_by_key(|n| n.id);
        nodes
    }

    pub fn relationships_of_type(&self, rel_type: &str) -> Vec<Relationship> {
        let mut rels: Vec<Relationship> = self
            .relationships
            .iter()
            .filter(|r| r.rel_type == rel_type)
            .map(|r| r.value().clone())
            .collect();
        rels.sort_by_cached_key(|r| r.sort_key());
        rels
    }
}

#[async_trait]
impl GraphSink for MemorySink {
    async fn upsert_node(&self, node: &Node) -> Result<(), SinkError> {
        self.nodes
            .entry(node.id)
            .and_modify(|existing| existing.properties.extend(node.properties.clone()))
            .or_insert_with(|| node.clone());
        Ok(())
    }

    async fn upsert_relationship(
        &self,
        relationship: &Relationship,
        source: &Node,
        target: &Node,
    ) -> Result<(), SinkError> {
        for endpoint in [source.id, target.id] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(SinkError::MissingEndpoint(endpoint));
            }
        }
        let key = (
            relationship.source,
            relationship.rel_type.clone(),
            relationship.target,
        );
        self.relationships
            .entry(key)
            .and_modify(|existing| existing.properties.extend(relationship.properties.clone()))
            .or_insert_with(|| relationship.clone());
        Ok(())
    }
}
