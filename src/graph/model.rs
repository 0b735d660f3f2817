//! GraphModel: the mapped nodes and relationships of one upload

use super::node::{Node, NodeId};
use super::relationship::Relationship;
use serde::Serialize;
use std::collections::HashMap;

/// Nodes and relationships produced by mapping one workbook.
///
/// Nodes keep insertion order (sheet order, then row order). Adding a node
/// whose id already exists merges its properties into the existing node, the
/// same way an upsert would.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GraphModel {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Returns `false` if it merged into an existing node.
    pub fn add_node(&mut self, node: Node) -> bool {
        match self.index.get(&node.id) {
            Some(&pos) => {
                self.nodes[pos].properties.extend(node.properties);
                false
            }
            None => {
                self.index.insert(node.id, self.nodes.len());
                self.nodes.push(node);
                true
            }
        }
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.index.get(id).map(|&pos| &self.nodes[pos])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    pub fn nodes_of_type<'a>(&'a self, node_type: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.nodes.iter().filter(move |n| n.node_type == node_type)
    }

    pub fn relationships_of_type<'a>(
        &'a self,
        rel_type: &'a str,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.iter().filter(move |r| r.rel_type == rel_type)
    }

    /// Relationships leaving `id`.
    pub fn relationships_from<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships.iter().filter(move |r| &r.source == id)
    }

    /// Relationships as a sorted list, for comparing two models regardless of order.
    pub fn sorted_relationships(&self) -> Vec<&Relationship> {
        let mut rels: Vec<&Relationship> = self.relationships.iter().collect();
        rels.sort_by_cached_key(|r| r.sort_key());
        rels
    }

    /// True if both models hold the same nodes and the same multiset of relationships.
    pub fn same_content(&self, other: &GraphModel) -> bool {
        if self.node_count() != other.node_count()
            || self.relationship_count() != other.relationship_count()
        {
            return false;
        }
        let nodes_match = self
            .nodes
            .iter()
            .all(|n| other.node(&n.id).map(|o| o == n).unwrap_or(false));
        nodes_match && self.sorted_relationships() == other.sorted_relationships()
    }
}
