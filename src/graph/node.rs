//! Node representation in the mapped graph

use crate::sheet::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Namespace for deterministic node ids.
const NODE_NAMESPACE: Uuid = Uuid::from_u128(0x6d1f_4c2a_8b3e_4f5d_9a7c_1e2b_3c4d_5e6f);

/// Property written for nodes that have no primary key column.
pub const ROW_KEY_PROPERTY: &str = "_row_id";

/// Unique identifier for a node
///
/// Derived from the node's sheet and key, or its row and cells (UUID v5), so
/// mapping the same upload twice yields the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Id of the row keyed by `value` in primary key column `column`.
    pub fn for_key(sheet: &str, column: &str, value: &str) -> Self {
        let name = format!("key\u{1f}{}\u{1f}{}\u{1f}{}", sheet, column, value);
        Self(Uuid::new_v5(&NODE_NAMESPACE, name.as_bytes()))
    }

    /// Id of a row without a usable key, from its spreadsheet row number and
    /// its non-blank cells. Rows with different cells never share an id.
    pub fn for_row(sheet: &str, row_number: usize, properties: &Properties) -> Self {
        let mut name = format!("row\u{1f}{}\u{1f}{}", sheet, row_number);
        for (column, value) in properties {
            if let (Some(kind), Some(text)) = (value.kind(), value.canonical()) {
                name.push_str(&format!("\u{1f}{}\u{1e}{:?}\u{1e}{}", column, kind, text));
            }
        }
        Self(Uuid::new_v5(&NODE_NAMESPACE, name.as_bytes()))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Properties collection, ordered by column name
pub type Properties = BTreeMap<String, CellValue>;

/// How a persistence backend finds this node again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeKey {
    /// The sheet's primary key column and this row's value in it
    Column { column: String, value: CellValue },
    /// No primary key: the spreadsheet row number
    Row { number: usize },
}

/// A node in the graph: one spreadsheet row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier
    pub id: NodeId,
    /// Sheet the row came from; used as the node label
    pub node_type: String,
    /// Identity used for upserts
    pub key: NodeKey,
    /// Non-blank cells of the row
    pub properties: Properties,
}

impl Node {
    /// Node keyed by a primary key column value.
    pub fn keyed(
        node_type: impl Into<String>,
        column: impl Into<String>,
        value: CellValue,
    ) -> Self {
        let node_type = node_type.into();
        let column = column.into();
        let id = NodeId::for_key(&node_type, &column, &value.to_string());
        Self {
            id,
            node_type,
            key: NodeKey::Column { column, value },
            properties: Properties::new(),
        }
    }

    /// Node without a usable key, identified by its row number and cells.
    pub fn for_row(
        node_type: impl Into<String>,
        row_number: usize,
        mut properties: Properties,
    ) -> Self {
        let node_type = node_type.into();
        properties.retain(|_, value| !value.is_blank());
        Self {
            id: NodeId::for_row(&node_type, row_number, &properties),
            node_type,
            key: NodeKey::Row { number: row_number },
            properties,
        }
    }

    /// Add a property to the node; blank values are not stored
    pub fn with_property(mut self, key: impl Into<String>, value: CellValue) -> Self {
        self.set_property(key, value);
        self
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: CellValue) {
        if !value.is_blank() {
            self.properties.insert(key.into(), value);
        }
    }

    pub fn property(&self, key: &str) -> Option<&CellValue> {
        self.properties.get(key)
    }

    /// Property name and JSON value a backend should MERGE this node on.
    pub fn merge_key(&self) -> (String, serde_json::Value) {
        match &self.key {
            NodeKey::Column { column, value } => (
                column.clone(),
                serde_json::to_value(value).unwrap_or(serde_json::Value::Null),
            ),
            NodeKey::Row { .. } => (
                ROW_KEY_PROPERTY.to_string(),
                serde_json::Value::String(self.id.to_string()),
            ),
        }
    }
}
