//! Tabular data read from an upload

mod table;
mod value;

pub use table::{Row, SheetTable, Workbook, FIRST_DATA_ROW};
pub(crate) use table::dominant_kind;
pub use value::{CellValue, ValueKind};
