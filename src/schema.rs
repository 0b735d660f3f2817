//! Schema descriptor: how sheets map onto the graph
//!
//! Plain data supplied by the user with each upload. Field names match the
//! JSON the upload form posts:
//!
//! ```json
//! {
//!   "sheets": [{"name": "Reaction", "columns": [{"name": "REACTION_ID", "data_type": "text"}]}],
//!   "sheet_connections": [{"source_sheet_name": "Reaction", "target_sheet_name": "Measurement",
//!                          "edge_name": "measured_by", "key": "REACTION_ID"}],
//!   "sheet_references": [{"source_sheet_name": "Reaction", "source_column_name": "has_substrate",
//!                         "target_sheet_name": "Molecule", "target_column_name": "NAME"}]
//! }
//! ```

use crate::sheet::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use thiserror::Error;

/// Errors loading a schema descriptor from disk
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON schema: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML schema: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Declared data type of a column.
///
/// Also accepts the spellings older saved schemas use (`str`, `float`, `bool`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    #[serde(alias = "str", alias = "string")]
    Text,
    #[serde(alias = "float", alias = "int", alias = "integer")]
    Number,
    #[serde(alias = "bool")]
    Boolean,
}

impl DataType {
    pub fn matches(self, kind: ValueKind) -> bool {
        DataType::from(kind) == self
    }
}

impl From<ValueKind> for DataType {
    fn from(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Text => Self::Text,
            ValueKind::Number => Self::Number,
            ValueKind::Boolean => Self::Boolean,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: DataType,
}

impl Column {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Sheet {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

/// Two sheets joined by equal values in a column both carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetConnection {
    pub source_sheet_name: String,
    pub target_sheet_name: String,
    pub edge_name: String,
    pub key: String,
}

impl SheetConnection {
    pub fn new(
        source_sheet_name: impl Into<String>,
        target_sheet_name: impl Into<String>,
        edge_name: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            source_sheet_name: source_sheet_name.into(),
            target_sheet_name: target_sheet_name.into(),
            edge_name: edge_name.into(),
            key: key.into(),
        }
    }

    /// Relationship type emitted for this connection.
    pub fn relationship_type(&self) -> String {
        self.edge_name.to_uppercase()
    }
}

/// A column pointing at an identifying column of another sheet.
///
/// A source cell may list several targets separated by commas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetReference {
    pub source_sheet_name: String,
    pub source_column_name: String,
    pub target_sheet_name: String,
    pub target_column_name: String,
}

impl SheetReference {
    pub fn new(
        source_sheet_name: impl Into<String>,
        source_column_name: impl Into<String>,
        target_sheet_name: impl Into<String>,
        target_column_name: impl Into<String>,
    ) -> Self {
        Self {
            source_sheet_name: source_sheet_name.into(),
            source_column_name: source_column_name.into(),
            target_sheet_name: target_sheet_name.into(),
            target_column_name: target_column_name.into(),
        }
    }

    /// Relationship type emitted for this reference.
    pub fn relationship_type(&self) -> String {
        self.source_column_name.to_uppercase()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    #[serde(default)]
    pub sheets: Vec<Sheet>,
    #[serde(default)]
    pub sheet_connections: Vec<SheetConnection>,
    #[serde(default)]
    pub sheet_references: Vec<SheetReference>,
}

impl SchemaDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connection(mut self, connection: SheetConnection) -> Self {
        self.sheet_connections.push(connection);
        self
    }

    pub fn with_reference(mut self, reference: SheetReference) -> Self {
        self.sheet_references.push(reference);
        self
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Load from a `.json`, `.yaml` or `.yml` file. Other extensions are read as JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
            .unwrap_or(false);
        if is_yaml {
            Ok(serde_yaml::from_str(&text)?)
        } else {
            Ok(serde_json::from_str(&text)?)
        }
    }
}

/// Identifier columns are named in capitals (`REACTION_ID`, `NAME`) and must hold
/// unique values within their sheet.
pub fn is_identifier_column(name: &str) -> bool {
    name.chars().any(char::is_alphabetic) && !name.chars().any(char::is_lowercase)
}
