//! Excel workbooks (`.xlsx` and legacy `.xls`)

use super::{header_names, ParseError, SpreadsheetParser};
use crate::sheet::{CellValue, SheetTable, Workbook};
use calamine::{Data, Range, Reader, Xls, Xlsx};
use std::io::{Cursor, Read, Seek};

pub(super) fn parse_xlsx(
    parser: &SpreadsheetParser,
    bytes: &[u8],
    filename: &str,
) -> Result<Workbook, ParseError> {
    let reader: Xlsx<_> =
        Xlsx::new(Cursor::new(bytes)).map_err(|e| ParseError::corrupt(filename, e))?;
    read_workbook(parser, reader, filename)
}

pub(super) fn parse_xls(
    parser: &SpreadsheetParser,
    bytes: &[u8],
    filename: &str,
) -> Result<Workbook, ParseError> {
    let reader: Xls<_> =
        Xls::new(Cursor::new(bytes)).map_err(|e| ParseError::corrupt(filename, e))?;
    read_workbook(parser, reader, filename)
}

fn read_workbook<RS, R>(
    parser: &SpreadsheetParser,
    mut reader: R,
    filename: &str,
) -> Result<Workbook, ParseError>
where
    RS: Read + Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let mut workbook = Workbook::new();
    for name in reader.sheet_names() {
        let range = reader
            .worksheet_range(&name)
            .map_err(|e| ParseError::corrupt(filename, e))?;
        let table = read_sheet(parser, &name, &range, filename)?;
        tracing::debug!(sheet = %name, rows = table.row_count(), "read worksheet");
        workbook.insert(table);
    }
    Ok(workbook)
}

/// First used row is the header; blank rows are skipped.
fn read_sheet(
    parser: &SpreadsheetParser,
    name: &str,
    range: &Range<Data>,
    filename: &str,
) -> Result<SheetTable, ParseError> {
    // Spreadsheet row number of the header (ranges start at the first used cell).
    let header_row = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows = range.rows();

    let header = match rows.next() {
        Some(header) => header,
        None => return Ok(SheetTable::new(name, Vec::new())),
    };
    let raw_names = header.iter().map(|c| convert(parser, c).to_string()).collect();
    let columns = header_names(raw_names, name, filename)?;
    let mut table = SheetTable::new(name, columns);

    for (i, row) in rows.enumerate() {
        let cells: Vec<CellValue> = row.iter().map(|c| convert(parser, c)).collect();
        if cells.iter().all(CellValue::is_blank) {
            continue;
        }
        table.push_row(header_row + 1 + i, cells);
    }
    Ok(table)
}

fn convert(parser: &SpreadsheetParser, cell: &Data) -> CellValue {
    match cell {
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) if f.is_finite() => CellValue::Number(*f),
        Data::Float(_) => CellValue::Blank,
        Data::String(s) => parser.text(s),
        Data::Bool(b) => CellValue::Boolean(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(datetime) => CellValue::Text(datetime.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => parser.text(s),
        Data::Error(e) => CellValue::Text(e.to_string()),
        Data::Empty => CellValue::Blank,
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::{parse, ParseError, SpreadsheetParser, OLE_MAGIC};
    use crate::sheet::CellValue;
    use rust_xlsxwriter::{ExcelDateTime, Format, Workbook as XlsxWriter};

    fn reaction_workbook() -> Vec<u8> {
        let mut book = XlsxWriter::new();

        let reactions = book.add_worksheet();
        reactions.set_name("Reaction").unwrap();
        reactions.write_string(0, 0, "REACTION_ID").unwrap();
        reactions.write_string(0, 1, "has_substrate").unwrap();
        reactions.write_string(0, 2, "temperature").unwrap();
        reactions.write_string(0, 3, "success").unwrap();
        reactions.write_string(1, 0, "R1").unwrap();
        reactions.write_string(1, 1, " Molecule A, Molecule B,").unwrap();
        reactions.write_number(1, 2, 37.0).unwrap();
        reactions.write_boolean(1, 3, true).unwrap();
        // row index 2 left empty
        reactions.write_string(3, 0, "R2").unwrap();
        reactions.write_number(3, 2, 21.5).unwrap();

        let molecules = book.add_worksheet();
        molecules.set_name("Molecule").unwrap();
        molecules.write_string(0, 0, "NAME").unwrap();
        molecules.write_string(1, 0, "Molecule A").unwrap();

        book.save_to_buffer().unwrap()
    }

    #[test]
    fn reads_every_sheet_in_order() {
        let wb = parse(&reaction_workbook(), "upload.xlsx").unwrap();
        assert_eq!(wb.sheet_names(), vec!["Reaction", "Molecule"]);
        assert_eq!(wb.sheet("Molecule").unwrap().row_count(), 1);
    }

    #[test]
    fn cells_keep_their_kinds() {
        let wb = parse(&reaction_workbook(), "upload.xlsx").unwrap();
        let reactions = wb.sheet("Reaction").unwrap();
        let first = reactions.row(0).unwrap();
        assert_eq!(first.get("REACTION_ID"), &CellValue::Text("R1".into()));
        assert_eq!(first.get("has_substrate"), &CellValue::Text("Molecule A, Molecule B".into()));
        assert_eq!(first.get("temperature"), &CellValue::Number(37.0));
        assert_eq!(first.get("success"), &CellValue::Boolean(true));
    }

    #[test]
    fn skipped_blank_rows_keep_spreadsheet_numbers() {
        let wb = parse(&reaction_workbook(), "upload.xlsx").unwrap();
        let numbers: Vec<usize> = wb.sheet("Reaction").unwrap().rows().map(|r| r.number()).collect();
        assert_eq!(numbers, vec![2, 4]);
        let second = wb.sheet("Reaction").unwrap().row(1).unwrap();
        assert!(second.get("has_substrate").is_blank());
    }

    #[test]
    fn trailing_commas_kept_when_disabled() {
        let config = crate::config::Config {
            strip_trailing_commas: false,
            ..Default::default()
        };
        let wb = SpreadsheetParser::from_config(&config)
            .parse(&reaction_workbook(), "upload.xlsx")
            .unwrap();
        let first = wb.sheet("Reaction").unwrap().row(0).unwrap();
        assert_eq!(first.get("has_substrate"), &CellValue::Text("Molecule A, Molecule B,".into()));
    }

    #[test]
    fn truncated_zip_is_corrupt() {
        let mut bytes = reaction_workbook();
        bytes.truncate(64);
        let err = parse(&bytes, "upload.xlsx").unwrap_err();
        assert!(matches!(err, ParseError::Corrupt { .. }));
    }

    #[test]
    fn date_cells_become_iso_text() {
        let mut book = XlsxWriter::new();
        let sheet = book.add_worksheet();
        sheet.set_name("Run").unwrap();
        sheet.write_string(0, 0, "RUN_ID").unwrap();
        sheet.write_string(0, 1, "started").unwrap();
        sheet.write_string(1, 0, "RUN1").unwrap();
        let date = ExcelDateTime::from_ymd(2024, 3, 15).unwrap();
        let format = Format::new().set_num_format("yyyy-mm-dd");
        sheet.write_datetime_with_format(1, 1, &date, &format).unwrap();
        let bytes = book.save_to_buffer().unwrap();

        let wb = parse(&bytes, "runs.xlsx").unwrap();
        let row = wb.sheet("Run").unwrap().row(0).unwrap();
        assert_eq!(row.get("started"), &CellValue::Text("2024-03-15T00:00:00".into()));
    }

    #[test]
    fn garbage_ole_container_is_corrupt() {
        let mut bytes = OLE_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 24]);
        let err = parse(&bytes, "legacy.xls").unwrap_err();
        assert!(matches!(err, ParseError::Corrupt { .. }));
    }
}
