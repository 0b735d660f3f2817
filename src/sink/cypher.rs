//! Cypher statement rendering
//!
//! Produces the parameterized `MERGE` statements a Neo4j client would run:
//!
//! ```text
//! MERGE (n:`Reaction` {`REACTION_ID`: $key}) SET n += $props
//! MATCH (s:`Reaction` {`REACTION_ID`: $source_key}), (t:`Molecule` {`NAME`: $target_key})
//! MERGE (s)-[r:`HAS_SUBSTRATE`]->(t) SET r += $props
//! ```

use super::{GraphSink, SinkError};
use crate::graph::{Node, Relationship};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Mutex;

/// One statement with its JSON parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CypherStatement {
    pub query: String,
    pub params: Value,
}

/// Collects statements instead of executing them.
#[derive(Debug, Default)]
pub struct CypherSink {
    statements: Mutex<Vec<CypherStatement>>,
}

impl CypherSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements collected so far, in write order.
    pub fn statements(&self) -> Result<Vec<CypherStatement>, SinkError> {
        Ok(self.lock()?.clone())
    }

    /// Take the collected statements, leaving the sink empty.
    pub fn drain(&self) -> Result<Vec<CypherStatement>, SinkError> {
        Ok(std::mem::take(&mut *self.lock()?))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<CypherStatement>>, SinkError> {
        self.statements
            .lock()
            .map_err(|e| SinkError::Backend(format!("statement buffer poisoned: {}", e)))
    }

    fn push(&self, statement: CypherStatement) -> Result<(), SinkError> {
        self.lock()?.push(statement);
        Ok(())
    }
}

/// Quote a label, relationship type or property name.
pub fn quote_identifier(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

fn node_pattern(var: &str, node: &Node, param: &str) -> String {
    let (key, _) = node.merge_key();
    format!(
        "({}:{} {{{}: ${}}})",
        var,
        quote_identifier(&node.node_type),
        quote_identifier(&key),
        param
    )
}

#[async_trait]
impl GraphSink for CypherSink {
    async fn upsert_node(&self, node: &Node) -> Result<(), SinkError> {
        let (_, key) = node.merge_key();
        let props = serde_json::to_value(&node.properties)
            .map_err(|e| SinkError::Backend(e.to_string()))?;
        self.push(CypherStatement {
            query: format!("MERGE {} SET n += $props", node_pattern("n", node, "key")),
            params: json!({ "key": key, "props": props }),
        })
    }

    async fn upsert_relationship(
        &self,
        relationship: &Relationship,
        source: &Node,
        target: &Node,
    ) -> Result<(), SinkError> {
        let (_, source_key) = source.merge_key();
        let (_, target_key) = target.merge_key();
        let props = serde_json::to_value(&relationship.properties)
            .map_err(|e| SinkError::Backend(e.to_string()))?;
        self.push(CypherStatement {
            query: format!(
                "MATCH {}, {} MERGE (s)-[r:{}]->(t) SET r += $props",
                node_pattern("s", source, "source_key"),
                node_pattern("t", target, "target_key"),
                quote_identifier(&relationship.rel_type)
            ),
            params: json!({
                "source_key": source_key,
                "target_key": target_key,
                "props": props,
            }),
        })
    }
}
