//! CSV uploads

use super::{header_names, ParseError, SpreadsheetParser};
use crate::sheet::{CellValue, SheetTable, Workbook, FIRST_DATA_ROW};
use csv::ReaderBuilder;
use std::path::Path;

/// Read a CSV file as a single sheet named after the file stem.
///
/// Cells carry no type information, so each one is inferred on its own.
pub(super) fn parse_csv(
    parser: &SpreadsheetParser,
    bytes: &[u8],
    filename: &str,
) -> Result<Workbook, ParseError> {
    let sheet_name = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Sheet1")
        .to_string();

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ParseError::corrupt(filename, e))?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    let columns = header_names(headers, &sheet_name, filename)?;
    let mut table = SheetTable::new(sheet_name, columns);

    for (i, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ParseError::corrupt(filename, e))?;
        let number = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(FIRST_DATA_ROW + i);
        let cells: Vec<CellValue> = record.iter().map(|raw| parser.infer(raw)).collect();
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }
        table.push_row(number, cells);
    }

    Ok(Workbook::from_tables([table]))
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse, ParseError};
    use crate::sheet::CellValue;

    const REACTIONS: &str = "REACTION_ID,has_substrate,yield,success\n\
                             R1,\"Molecule A, Molecule B,\",0.5,true\n\
                             ,,,\n\
                             R2,,12,FALSE\n";

    #[test]
    fn single_sheet_named_after_stem() {
        let wb = parse(REACTIONS.as_bytes(), "uploads/reactions.csv").unwrap();
        assert_eq!(wb.sheet_names(), vec!["reactions"]);
        let sheet = wb.sheet("reactions").unwrap();
        assert_eq!(sheet.columns(), &["REACTION_ID", "has_substrate", "yield", "success"]);
    }

    #[test]
    fn cells_are_inferred_and_cleaned() {
        let wb = parse(REACTIONS.as_bytes(), "reactions.csv").unwrap();
        let sheet = wb.sheet("reactions").unwrap();
        let first = sheet.row(0).unwrap();
        assert_eq!(first.get("has_substrate"), &CellValue::Text("Molecule A, Molecule B".into()));
        assert_eq!(first.get("yield"), &CellValue::Number(0.5));
        assert_eq!(first.get("success"), &CellValue::Boolean(true));
        let second = sheet.row(1).unwrap();
        assert!(second.get("has_substrate").is_blank());
        assert_eq!(second.get("success"), &CellValue::Boolean(false));
    }

    #[test]
    fn blank_rows_are_skipped_but_numbers_kept() {
        let wb = parse(REACTIONS.as_bytes(), "reactions.csv").unwrap();
        let numbers: Vec<usize> = wb.sheet("reactions").unwrap().rows().map(|r| r.number()).collect();
        assert_eq!(numbers, vec![2, 4]);
    }

    #[test]
    fn invalid_utf8_is_corrupt() {
        let err = parse(b"NAME\n\xff\xfe\xfd\n", "bad.csv").unwrap_err();
        assert!(matches!(err, ParseError::Corrupt { .. }));
    }
}
