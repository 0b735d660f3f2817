//! Spreadsheet parsing
//!
//! Turns uploaded bytes into a [`Workbook`]. The format is chosen from the
//! file extension and checked against the content's magic bytes, so a renamed
//! file is rejected up front instead of failing deep inside a reader.

mod delimited;
mod excel;

use crate::config::Config;
use crate::sheet::{CellValue, Workbook};
use std::path::Path;
use thiserror::Error;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Corrupt spreadsheet '{file}': {reason}")]
    Corrupt { file: String, reason: String },
}

impl ParseError {
    fn corrupt(file: &str, reason: impl ToString) -> Self {
        Self::Corrupt {
            file: file.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    /// Office Open XML workbook (`.xlsx`, `.xlsm`)
    Xlsx,
    /// Legacy binary workbook (`.xls`)
    Xls,
    /// Comma separated values, one sheet named after the file stem
    Csv,
}

impl SpreadsheetFormat {
    pub fn from_filename(filename: &str) -> Result<Self, ParseError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("xlsx") | Some("xlsm") => Ok(Self::Xlsx),
            Some("xls") => Ok(Self::Xls),
            Some("csv") => Ok(Self::Csv),
            Some(other) => Err(ParseError::UnsupportedFormat(format!(
                "'.{}' files are not supported (expected .xlsx, .xls or .csv)",
                other
            ))),
            None => Err(ParseError::UnsupportedFormat(format!(
                "'{}' has no file extension",
                filename
            ))),
        }
    }

    /// Reject content that clearly belongs to another format.
    fn check_content(self, bytes: &[u8], filename: &str) -> Result<(), ParseError> {
        let ok = match self {
            Self::Xlsx => bytes.starts_with(ZIP_MAGIC),
            Self::Xls => bytes.starts_with(OLE_MAGIC),
            Self::Csv => !bytes.starts_with(ZIP_MAGIC) && !bytes.starts_with(OLE_MAGIC),
        };
        if ok {
            Ok(())
        } else {
            Err(ParseError::UnsupportedFormat(format!(
                "content of '{}' does not match its {:?} extension",
                filename, self
            )))
        }
    }
}

/// Reads uploads into workbooks.
#[derive(Debug, Clone)]
pub struct SpreadsheetParser {
    strip_trailing_commas: bool,
}

impl Default for SpreadsheetParser {
    fn default() -> Self {
        Self {
            strip_trailing_commas: true,
        }
    }
}

impl SpreadsheetParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            strip_trailing_commas: config.strip_trailing_commas,
        }
    }

    pub fn parse(&self, bytes: &[u8], filename: &str) -> Result<Workbook, ParseError> {
        let format = SpreadsheetFormat::from_filename(filename)?;
        format.check_content(bytes, filename)?;
        tracing::debug!(filename, ?format, size = bytes.len(), "parsing spreadsheet");

        let workbook = match format {
            SpreadsheetFormat::Xlsx => excel::parse_xlsx(self, bytes, filename)?,
            SpreadsheetFormat::Xls => excel::parse_xls(self, bytes, filename)?,
            SpreadsheetFormat::Csv => delimited::parse_csv(self, bytes, filename)?,
        };

        tracing::debug!(filename, sheets = workbook.len(), "parsed spreadsheet");
        Ok(workbook)
    }

    fn text(&self, raw: &str) -> CellValue {
        CellValue::from_text(raw, self.strip_trailing_commas)
    }

    fn infer(&self, raw: &str) -> CellValue {
        CellValue::infer(raw, self.strip_trailing_commas)
    }
}

/// Parse with default cleaning rules.
pub fn parse(bytes: &[u8], filename: &str) -> Result<Workbook, ParseError> {
    SpreadsheetParser::new().parse(bytes, filename)
}

/// Normalize a header row: blank names become `column_<n>`, duplicates are rejected.
fn header_names(raw: Vec<String>, sheet: &str, file: &str) -> Result<Vec<String>, ParseError> {
    let mut names: Vec<String> = Vec::with_capacity(raw.len());
    for (i, name) in raw.into_iter().enumerate() {
        let name = name.trim();
        let name = if name.is_empty() {
            format!("column_{}", i + 1)
        } else {
            name.to_string()
        };
        if names.contains(&name) {
            return Err(ParseError::corrupt(
                file,
                format!("sheet '{}' has duplicate column '{}'", sheet, name),
            ));
        }
        names.push(name);
    }
    Ok(names)
}
