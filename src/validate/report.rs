//! Validation findings

use crate::schema::DataType;
use crate::sheet::ValueKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A column whose non-blank cells have more than one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInconsistency {
    pub sheet_name: String,
    pub column: String,
    /// Every kind observed in the column, sorted
    pub data_types: Vec<ValueKind>,
    /// Rows whose kind differs from the column's dominant kind
    pub rows: Vec<usize>,
}

impl fmt::Display for TypeInconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<String> = self.data_types.iter().map(ToString::to_string).collect();
        write!(
            f,
            "Inconsistent data types found in column '{}' on sheet '{}': [{}] at rows {}",
            self.column,
            self.sheet_name,
            kinds.join(", "),
            join_rows(&self.rows)
        )
    }
}

/// One value that appears in more than one row of an identifier column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateValue {
    pub value: String,
    pub rows: Vec<usize>,
}

/// An identifier column holding duplicate values. One per column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniquenessViolation {
    pub sheet_name: String,
    pub column: String,
    pub duplicates: Vec<DuplicateValue>,
}

impl fmt::Display for UniquenessViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dups: Vec<String> = self
            .duplicates
            .iter()
            .map(|d| format!("'{}' at rows {}", d.value, join_rows(&d.rows)))
            .collect();
        write!(
            f,
            "Values not unique in column '{}' of sheet '{}': {}",
            self.column,
            self.sheet_name,
            dups.join("; ")
        )
    }
}

/// Disagreement between the schema descriptor and the workbook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SchemaProblem {
    MissingSheet {
        sheet_name: String,
        referenced_by: String,
    },
    MissingColumn {
        sheet_name: String,
        column: String,
        referenced_by: String,
    },
    DataTypeMismatch {
        sheet_name: String,
        column: String,
        declared: DataType,
        inferred: DataType,
    },
}

impl fmt::Display for SchemaProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSheet {
                sheet_name,
                referenced_by,
            } => write!(f, "Sheet '{}' not found ({})", sheet_name, referenced_by),
            Self::MissingColumn {
                sheet_name,
                column,
                referenced_by,
            } => write!(
                f,
                "Column '{}' not found in sheet '{}' ({})",
                column, sheet_name, referenced_by
            ),
            Self::DataTypeMismatch {
                sheet_name,
                column,
                declared,
                inferred,
            } => write!(
                f,
                "Column '{}' of sheet '{}' is declared {} but holds {} values",
                column, sheet_name, declared, inferred
            ),
        }
    }
}

/// Everything wrong with an upload, collected in one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error(
    "{}",
    summarize(.type_inconsistencies, .uniqueness_violations, .schema_problems)
)]
pub struct ValidationReport {
    #[serde(default)]
    pub type_inconsistencies: Vec<TypeInconsistency>,
    #[serde(default)]
    pub uniqueness_violations: Vec<UniquenessViolation>,
    #[serde(default)]
    pub schema_problems: Vec<SchemaProblem>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.problem_count() == 0
    }

    pub fn problem_count(&self) -> usize {
        self.type_inconsistencies.len()
            + self.uniqueness_violations.len()
            + self.schema_problems.len()
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_clean() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn summarize(
    type_inconsistencies: &[TypeInconsistency],
    uniqueness_violations: &[UniquenessViolation],
    schema_problems: &[SchemaProblem],
) -> String {
    let count = type_inconsistencies.len() + uniqueness_violations.len() + schema_problems.len();
    if count == 0 {
        return "no problems found".to_string();
    }
    let mut text = format!("{} problem(s) found", count);
    section(&mut text, "Type Inconsistencies", type_inconsistencies);
    section(&mut text, "Uniqueness Violations", uniqueness_violations);
    section(&mut text, "Schema Problems", schema_problems);
    text
}

fn section<T: fmt::Display>(text: &mut String, title: &str, items: &[T]) {
    if items.is_empty() {
        return;
    }
    text.push_str(&format!("\n{}:", title));
    for item in items {
        text.push_str(&format!("\n  - {}", item));
    }
}

fn join_rows(rows: &[usize]) -> String {
    let rows: Vec<String> = rows.iter().map(ToString::to_string).collect();
    format!("[{}]", rows.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_is_clean() {
        let report = ValidationReport::default();
        assert!(report.is_clean());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn display_lists_every_section() {
        let report = ValidationReport {
            type_inconsistencies: vec![TypeInconsistency {
                sheet_name: "Reaction".into(),
                column: "temperature".into(),
                data_types: vec![ValueKind::Number, ValueKind::Text],
                rows: vec![4],
            }],
            uniqueness_violations: vec![],
            schema_problems: vec![SchemaProblem::MissingSheet {
                sheet_name: "Enzyme".into(),
                referenced_by: "target of edge 'catalyzed_by'".into(),
            }],
        };
        let text = report.to_string();
        assert!(text.starts_with("2 problem(s) found"));
        assert!(text.contains("[number, text] at rows [4]"));
        assert!(text.contains("Sheet 'Enzyme' not found"));
        assert!(!text.contains("Uniqueness"));
    }

    #[test]
    fn report_is_an_error() {
        let report = ValidationReport::default();
        assert_eq!(report.to_string(), "no problems found");
        let err: Box<dyn std::error::Error> = Box::new(report);
        assert!(err.source().is_none());
    }

    #[test]
    fn schema_problem_serializes_with_kind_tag() {
        let problem = SchemaProblem::MissingColumn {
            sheet_name: "Molecule".into(),
            column: "NAME".into(),
            referenced_by: "target of reference from 'has_substrate'".into(),
        };
        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["kind"], "missing_column");
        assert_eq!(json["column"], "NAME");
    }
}
