//! Report sink: typed rows per named sheet, persisted as a single document.
//!
//! The sink accepts rows of typed scalars, strips control characters, and
//! truncates oversized text before anything is stored, so a hostile log line
//! can never corrupt the output document.

pub mod workbook;

pub use workbook::{Sheet, SheetKind, Workbook};

use serde::{Deserialize, Serialize};

/// Default name of the persisted document, relative to the scanned root.
pub const DEFAULT_OUTPUT_NAME: &str = "minecraft_worlds_recovery.json";

/// Longest text accepted into a single cell.
pub const MAX_CELL_TEXT: usize = 32_000;

/// A typed scalar cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl CellValue {
    /// Text cell with sanitization applied.
    pub fn text(value: impl AsRef<str>) -> Self {
        CellValue::Text(sanitize_text(value.as_ref()))
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<u64> for CellValue {
    fn from(value: u64) -> Self {
        CellValue::Int(value as i64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::text(&value)
    }
}

/// Strip non-ASCII and control characters (newlines and tabs survive) and
/// cap the length.
pub fn sanitize_text(text: &str) -> String {
    let mut out: String = text
        .chars()
        .filter(|c| c.is_ascii())
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
        .collect();
    out.truncate(MAX_CELL_TEXT);
    out
}
