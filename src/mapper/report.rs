//! Non-fatal findings of a mapping run

use serde::{Deserialize, Serialize};
use std::fmt;

/// A reference value with no matching row in the target sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingReference {
    pub sheet_name: String,
    pub column: String,
    pub row: usize,
    pub value: String,
    pub target_sheet_name: String,
    pub target_column_name: String,
}

impl fmt::Display for DanglingReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "'{}' in column '{}' of sheet '{}' (row {}) matches no '{}' in sheet '{}'",
            self.value,
            self.column,
            self.sheet_name,
            self.row,
            self.target_column_name,
            self.target_sheet_name
        )
    }
}

/// A connection key value matched by several rows on one or both sides,
/// producing every source/target pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateKeyMatch {
    pub source_sheet_name: String,
    pub target_sheet_name: String,
    pub key: String,
    pub value: String,
    pub source_count: usize,
    pub target_count: usize,
}

impl fmt::Display for DuplicateKeyMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} = '{}' joins {} row(s) of '{}' with {} row(s) of '{}'",
            self.key,
            self.value,
            self.source_count,
            self.source_sheet_name,
            self.target_count,
            self.target_sheet_name
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingReport {
    #[serde(default)]
    pub dangling_references: Vec<DanglingReference>,
    #[serde(default)]
    pub duplicate_key_matches: Vec<DuplicateKeyMatch>,
}

impl MappingReport {
    pub fn is_empty(&self) -> bool {
        self.dangling_references.is_empty() && self.duplicate_key_matches.is_empty()
    }
}
