//! Cell values

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a non-blank cell.
///
/// Ordering doubles as the tie-break when two kinds are equally common in a
/// column: numeric columns win over boolean ones, boolean over text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Number,
    Boolean,
    Text,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number => write!(f, "number"),
            Self::Boolean => write!(f, "boolean"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A single spreadsheet cell.
///
/// Integers and floats share `Number`. `Blank` serializes as `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Boolean(bool),
    Number(f64),
    Text(String),
    Blank,
}

impl CellValue {
    /// Build a text cell from raw input, cleaning it the way uploads are cleaned:
    /// surrounding whitespace is trimmed and, if `strip_trailing_commas` is set,
    /// trailing commas too. Text that ends up empty is `Blank`.
    pub fn from_text(raw: &str, strip_trailing_commas: bool) -> Self {
        let mut cleaned = raw.trim();
        if strip_trailing_commas {
            cleaned = cleaned.trim_end_matches(',').trim_end();
        }
        if cleaned.is_empty() {
            Self::Blank
        } else {
            Self::Text(cleaned.to_string())
        }
    }

    /// Infer a cell from untyped text (CSV input).
    ///
    /// `true`/`false` in any case become `Boolean`, finite floats become
    /// `Number`, everything else is cleaned text.
    pub fn infer(raw: &str, strip_trailing_commas: bool) -> Self {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return Self::Boolean(true);
        }
        if trimmed.eq_ignore_ascii_case("false") {
            return Self::Boolean(false);
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return Self::Number(n);
            }
        }
        Self::from_text(trimmed, strip_trailing_commas)
    }

    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Self::Boolean(_) => Some(ValueKind::Boolean),
            Self::Number(_) => Some(ValueKind::Number),
            Self::Text(_) => Some(ValueKind::Text),
            Self::Blank => None,
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }

    /// Canonical string form used for joins and reference lookups.
    ///
    /// Whole numbers render without a fractional part so that `1.0` read from
    /// a workbook matches `"1"` typed into a reference cell.
    pub fn canonical(&self) -> Option<String> {
        match self {
            Self::Boolean(b) => Some(b.to_string()),
            Self::Number(n) => Some(format_number(*n)),
            Self::Text(s) => Some(s.clone()),
            Self::Blank => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.canonical() {
            Some(s) => write!(f, "{}", s),
            None => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for CellValue {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}
