//! Typed, directed relationships between nodes

use super::node::{NodeId, Properties};
use crate::sheet::CellValue;
use serde::{Deserialize, Serialize};

/// A directed relationship, materialized from a sheet connection or reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    /// Relationship type (e.g. "MEASURED_BY", "HAS_SUBSTRATE")
    pub rel_type: String,
    /// Source node
    pub source: NodeId,
    /// Target node
    pub target: NodeId,
    /// Additional properties
    pub properties: Properties,
}

impl Relationship {
    pub fn new(source: NodeId, target: NodeId, rel_type: impl Into<String>) -> Self {
        Self {
            rel_type: rel_type.into(),
            source,
            target,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: CellValue) -> Self {
        if !value.is_blank() {
            self.properties.insert(key.into(), value);
        }
        self
    }

    /// Sort key for order-insensitive comparison of relationship sets.
    pub fn sort_key(&self) -> (String, NodeId, NodeId, String) {
        let props = serde_json::to_string(&self.properties).unwrap_or_default();
        (self.rel_type.clone(), self.source, self.target, props)
    }
}
