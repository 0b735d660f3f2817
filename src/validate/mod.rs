//! Validation of parsed workbooks
//!
//! Every check runs to completion and every finding lands in one
//! [`ValidationReport`], so a user can fix the whole spreadsheet in one pass.

mod consistency;
mod relations;
mod report;

pub use relations::check_relations;
pub use report::{
    DuplicateValue, SchemaProblem, TypeInconsistency, UniquenessViolation, ValidationReport,
};

use crate::schema::{Column, DataType, SchemaDescriptor, Sheet};
use crate::sheet::Workbook;

/// Validate a workbook, optionally against a schema descriptor.
///
/// Succeeds only when the report would be empty.
pub fn validate(
    workbook: &Workbook,
    schema: Option<&SchemaDescriptor>,
) -> Result<(), ValidationReport> {
    ValidationReport::collect(workbook, schema).into_result()
}

impl ValidationReport {
    /// Run every check and return the findings, clean or not.
    pub fn collect(workbook: &Workbook, schema: Option<&SchemaDescriptor>) -> Self {
        let mut report = Self::default();
        for table in workbook.sheets() {
            let types = consistency::type_inconsistencies(table);
            let uniqueness = consistency::uniqueness_violations(table);
            tracing::debug!(
                sheet = table.name(),
                rows = table.row_count(),
                type_inconsistencies = types.len(),
                uniqueness_violations = uniqueness.len(),
                "checked sheet"
            );
            report.type_inconsistencies.extend(types);
            report.uniqueness_violations.extend(uniqueness);
        }
        if let Some(schema) = schema {
            report
                .schema_problems
                .extend(relations::check_relations(workbook, schema));
            report
                .schema_problems
                .extend(relations::check_declarations(workbook, schema));
        }
        report
    }
}

/// Describe every sheet and column with its inferred data type.
///
/// Columns with no non-blank cell are `text`. Connections and references are
/// left empty for the user to fill in.
pub fn infer_schema(workbook: &Workbook) -> SchemaDescriptor {
    let sheets = workbook
        .sheets()
        .iter()
        .map(|table| Sheet {
            name: table.name().to_string(),
            columns: table
                .columns()
                .iter()
                .map(|name| {
                    let data_type = table
                        .column_kind(name)
                        .map(DataType::from)
                        .unwrap_or(DataType::Text);
                    Column::new(name.clone(), data_type)
                })
                .collect(),
        })
        .collect();
    SchemaDescriptor {
        sheets,
        ..SchemaDescriptor::default()
    }
}
