//! In-memory workbooks

use sheetgraph::schema::SheetReference;
use sheetgraph::{CellValue, SchemaDescriptor, SheetTable, Workbook};

/// `Reaction{REACTION_ID, has_substrate}` with one row per substrate cell,
/// plus `Molecule{NAME}` holding Molecule A and Molecule B.
pub fn reaction_workbook(substrates: &[&str]) -> Workbook {
    let reactions = SheetTable::from_rows(
        "Reaction",
        &["REACTION_ID", "has_substrate"],
        substrates.iter().enumerate().map(|(i, cell)| {
            let cell = if cell.trim().is_empty() {
                CellValue::Blank
            } else {
                CellValue::Text(cell.to_string())
            };
            vec![CellValue::Text(format!("R{}", i + 1)), cell]
        }),
    );
    let molecules = SheetTable::from_rows(
        "Molecule",
        &["NAME"],
        vec![vec!["Molecule A".into()], vec!["Molecule B".into()]],
    );
    Workbook::from_tables([reactions, molecules])
}

/// `Reaction.has_substrate -> Molecule.NAME`
pub fn substrate_schema() -> SchemaDescriptor {
    SchemaDescriptor::new().with_reference(SheetReference::new(
        "Reaction",
        "has_substrate",
        "Molecule",
        "NAME",
    ))
}

/// Two sheets sharing a `batch` column: `source_rows` Reaction rows and
/// `target_rows` Measurement rows all carrying batch "B1".
pub fn measurement_workbook(source_rows: usize, target_rows: usize) -> Workbook {
    let reactions = SheetTable::from_rows(
        "Reaction",
        &["REACTION_ID", "batch"],
        (0..source_rows).map(|i| vec![CellValue::Text(format!("R{}", i + 1)), "B1".into()]),
    );
    let measurements = SheetTable::from_rows(
        "Measurement",
        &["MEASUREMENT_ID", "batch", "value"],
        (0..target_rows).map(|i| {
            vec![
                CellValue::Text(format!("M{}", i + 1)),
                "B1".into(),
                CellValue::Number(i as f64 / 10.0),
            ]
        }),
    );
    Workbook::from_tables([reactions, measurements])
}
