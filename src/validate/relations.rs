//! Checks of the schema descriptor against the workbook

use super::report::SchemaProblem;
use crate::schema::{DataType, SchemaDescriptor};
use crate::sheet::Workbook;

/// Sheets and columns named by connections and references that the workbook lacks.
///
/// The mapper runs the same check and refuses to map when it is not empty.
pub fn check_relations(workbook: &Workbook, schema: &SchemaDescriptor) -> Vec<SchemaProblem> {
    let mut problems = Vec::new();

    for conn in &schema.sheet_connections {
        for (sheet_name, role) in [
            (&conn.source_sheet_name, "source"),
            (&conn.target_sheet_name, "target"),
        ] {
            let referenced_by = format!("{} of edge '{}'", role, conn.edge_name);
            require_column(workbook, sheet_name, &conn.key, referenced_by, &mut problems);
        }
    }

    for reference in &schema.sheet_references {
        let referenced_by = format!("source of reference '{}'", reference.source_column_name);
        require_column(
            workbook,
            &reference.source_sheet_name,
            &reference.source_column_name,
            referenced_by,
            &mut problems,
        );
        let referenced_by = format!("target of reference '{}'", reference.source_column_name);
        require_column(
            workbook,
            &reference.target_sheet_name,
            &reference.target_column_name,
            referenced_by,
            &mut problems,
        );
    }

    dedup(problems)
}

/// Declared sheets and columns that are missing, or whose cells disagree with
/// the declared data type.
pub(crate) fn check_declarations(
    workbook: &Workbook,
    schema: &SchemaDescriptor,
) -> Vec<SchemaProblem> {
    let mut problems = Vec::new();
    for declared in &schema.sheets {
        let Some(table) = workbook.sheet(&declared.name) else {
            problems.push(SchemaProblem::MissingSheet {
                sheet_name: declared.name.clone(),
                referenced_by: "declared sheet".to_string(),
            });
            continue;
        };
        for column in &declared.columns {
            if !table.has_column(&column.name) {
                problems.push(SchemaProblem::MissingColumn {
                    sheet_name: declared.name.clone(),
                    column: column.name.clone(),
                    referenced_by: "declared column".to_string(),
                });
                continue;
            }
            if let Some(kind) = table.column_kind(&column.name) {
                if !column.data_type.matches(kind) {
                    problems.push(SchemaProblem::DataTypeMismatch {
                        sheet_name: declared.name.clone(),
                        column: column.name.clone(),
                        declared: column.data_type,
                        inferred: DataType::from(kind),
                    });
                }
            }
        }
    }
    problems
}

fn require_column(
    workbook: &Workbook,
    sheet_name: &str,
    column: &str,
    referenced_by: String,
    problems: &mut Vec<SchemaProblem>,
) {
    match workbook.sheet(sheet_name) {
        None => problems.push(SchemaProblem::MissingSheet {
            sheet_name: sheet_name.to_string(),
            referenced_by,
        }),
        Some(table) => {
            if !table.has_column(column) {
                problems.push(SchemaProblem::MissingColumn {
                    sheet_name: sheet_name.to_string(),
                    column: column.to_string(),
                    referenced_by,
                });
            }
        }
    }
}

fn dedup(problems: Vec<SchemaProblem>) -> Vec<SchemaProblem> {
    let mut unique: Vec<SchemaProblem> = Vec::with_capacity(problems.len());
    for problem in problems {
        if !unique.contains(&problem) {
            unique.push(problem);
        }
    }
    unique
}
