//! Per-sheet checks that need no schema

use super::report::{DuplicateValue, TypeInconsistency, UniquenessViolation};
use crate::schema::is_identifier_column;
use crate::sheet::{dominant_kind, SheetTable};
use std::collections::HashMap;

/// Columns whose non-blank cells hold more than one kind.
pub(crate) fn type_inconsistencies(table: &SheetTable) -> Vec<TypeInconsistency> {
    let mut found = Vec::new();
    for column in table.columns() {
        let counts = table.kind_counts(column);
        if counts.len() < 2 {
            continue;
        }
        let dominant = dominant_kind(&counts);
        let rows = table
            .column_values(column)
            .into_iter()
            .flatten()
            .filter(|(_, value)| value.kind().is_some() && value.kind() != dominant)
            .map(|(row, _)| row)
            .collect();
        found.push(TypeInconsistency {
            sheet_name: table.name().to_string(),
            column: column.clone(),
            data_types: counts.keys().copied().collect(),
            rows,
        });
    }
    found
}

/// Duplicate values in identifier columns, one violation per column.
pub(crate) fn uniqueness_violations(table: &SheetTable) -> Vec<UniquenessViolation> {
    let mut found = Vec::new();
    for column in table.columns().iter().filter(|c| is_identifier_column(c)) {
        let mut order: Vec<DuplicateValue> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (row, value) in table.column_values(column).into_iter().flatten() {
            let Some(key) = value.canonical() else {
                continue;
            };
            match positions.get(&key) {
                Some(&pos) => order[pos].rows.push(row),
                None => {
                    positions.insert(key.clone(), order.len());
                    order.push(DuplicateValue {
                        value: key,
                        rows: vec![row],
                    });
                }
            }
        }
        let duplicates: Vec<DuplicateValue> =
            order.into_iter().filter(|d| d.rows.len() > 1).collect();
        if !duplicates.is_empty() {
            found.push(UniquenessViolation {
                sheet_name: table.name().to_string(),
                column: column.clone(),
                duplicates,
            });
        }
    }
    found
}
