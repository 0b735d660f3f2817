//! In-memory sheets and workbooks

use super::value::{CellValue, ValueKind};
use std::collections::BTreeMap;

/// Spreadsheet row number of the first data row (the header is row 1).
pub const FIRST_DATA_ROW: usize = 2;

static BLANK: CellValue = CellValue::Blank;

#[derive(Debug, Clone, PartialEq)]
struct RowData {
    number: usize,
    cells: Vec<CellValue>,
}

/// One sheet of a workbook: ordered columns and ordered rows.
///
/// Every row carries the spreadsheet row number it was read from, so reports
/// point at the line the user sees even when blank rows were skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    name: String,
    columns: Vec<String>,
    rows: Vec<RowData>,
}

impl SheetTable {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a sheet from literal rows, numbered from row 2 onward.
    pub fn from_rows<C, R>(name: impl Into<String>, columns: &[C], rows: R) -> Self
    where
        C: AsRef<str>,
        R: IntoIterator<Item = Vec<CellValue>>,
    {
        let mut table = Self::new(name, columns.iter().map(|c| c.as_ref().to_string()).collect());
        for (i, cells) in rows.into_iter().enumerate() {
            table.push_row(FIRST_DATA_ROW + i, cells);
        }
        table
    }

    /// Append a row read from spreadsheet row `number`.
    ///
    /// Short rows are padded with blanks, cells beyond the header are dropped.
    pub fn push_row(&mut self, number: usize, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Blank);
        self.rows.push(RowData { number, cells });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_index(column).is_some()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.rows.len()).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        (0..self.rows.len()).map(move |index| Row { table: self, index })
    }

    /// `(row number, value)` pairs of one column, or `None` if the column is unknown.
    pub fn column_values<'a>(
        &'a self,
        column: &str,
    ) -> Option<impl Iterator<Item = (usize, &'a CellValue)> + 'a> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(move |r| (r.number, &r.cells[idx])))
    }

    /// How many non-blank cells of each kind a column holds.
    pub fn kind_counts(&self, column: &str) -> BTreeMap<ValueKind, usize> {
        let mut counts = BTreeMap::new();
        if let Some(values) = self.column_values(column) {
            for (_, value) in values {
                if let Some(kind) = value.kind() {
                    *counts.entry(kind).or_insert(0) += 1;
                }
            }
        }
        counts
    }

    /// The dominant kind of a column; `None` when every cell is blank.
    pub fn column_kind(&self, column: &str) -> Option<ValueKind> {
        dominant_kind(&self.kind_counts(column))
    }
}

/// Most frequent kind; ties go to the smaller kind.
pub(crate) fn dominant_kind(counts: &BTreeMap<ValueKind, usize>) -> Option<ValueKind> {
    counts
        .iter()
        .max_by(|(ka, ca), (kb, cb)| ca.cmp(cb).then_with(|| kb.cmp(ka)))
        .map(|(kind, _)| *kind)
}

/// A borrowed view of one row: column name to cell value.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    table: &'a SheetTable,
    index: usize,
}

impl<'a> Row<'a> {
    /// Position among the sheet's data rows (0-based).
    pub fn index(&self) -> usize {
        self.index
    }

    /// Spreadsheet row number.
    pub fn number(&self) -> usize {
        self.table.rows[self.index].number
    }

    /// The cell under `column`; unknown columns read as blank.
    pub fn get(&self, column: &str) -> &'a CellValue {
        match self.table.column_index(column) {
            Some(idx) => &self.table.rows[self.index].cells[idx],
            None => &BLANK,
        }
    }

    /// `(column, value)` pairs in column order.
    pub fn cells(&self) -> impl Iterator<Item = (&'a str, &'a CellValue)> + 'a {
        let table = self.table;
        let cells = &table.rows[self.index].cells;
        table.columns.iter().map(String::as_str).zip(cells.iter())
    }

    pub fn is_blank(&self) -> bool {
        self.table.rows[self.index].cells.iter().all(CellValue::is_blank)
    }
}

/// All sheets of one upload, in workbook order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Workbook {
    sheets: Vec<SheetTable>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tables(tables: impl IntoIterator<Item = SheetTable>) -> Self {
        let mut workbook = Self::new();
        for table in tables {
            workbook.insert(table);
        }
        workbook
    }

    /// Add a sheet, replacing any sheet with the same name.
    pub fn insert(&mut self, table: SheetTable) {
        match self.sheets.iter_mut().find(|s| s.name == table.name) {
            Some(existing) => *existing = table,
            None => self.sheets.push(table),
        }
    }

    pub fn sheet(&self, name: &str) -> Option<&SheetTable> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> &[SheetTable] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}
