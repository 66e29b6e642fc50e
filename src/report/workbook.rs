//! Workbook-shaped document: named sheets of typed rows.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, ScanError};
use crate::registry::FieldKey;

use super::CellValue;

/// Logical sheets of the output document, in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetKind {
    /// Deduplicated seed registry, sorted by occurrence count.
    Seeds,
    /// Seed matches extracted from log lines.
    LogResults,
    /// Per-file raw records.
    Data,
    /// One row per failed file.
    Errors,
    /// Files that failed but still had readable bytes.
    Corrupted,
    /// Low-confidence numeric tokens pending human review.
    Leads,
}

impl SheetKind {
    pub const ALL: [SheetKind; 6] = [
        SheetKind::Seeds,
        SheetKind::LogResults,
        SheetKind::Data,
        SheetKind::Errors,
        SheetKind::Corrupted,
        SheetKind::Leads,
    ];

    pub fn title(self) -> &'static str {
        match self {
            SheetKind::Seeds => "All Seeds",
            SheetKind::LogResults => "Log Results",
            SheetKind::Data => "Data",
            SheetKind::Errors => "Errors",
            SheetKind::Corrupted => "Corrupted Files",
            SheetKind::Leads => "Random Strings",
        }
    }

    pub fn columns(self) -> Vec<String> {
        match self {
            SheetKind::Seeds => {
                let mut cols = vec!["Seed Value".to_string()];
                cols.push(FieldKey::FirstFoundIn.column_name().to_string());
                cols.push(FieldKey::WorldName.column_name().to_string());
                cols.push(FieldKey::GameMode.column_name().to_string());
                cols.push(FieldKey::Generator.column_name().to_string());
                cols.push(FieldKey::Version.column_name().to_string());
                cols.push(FieldKey::LastPlayed.column_name().to_string());
                cols.push(FieldKey::Path.column_name().to_string());
                cols.push("Times Found".to_string());
                cols.push(FieldKey::TimePlayed.column_name().to_string());
                cols.push(FieldKey::SpawnLocation.column_name().to_string());
                cols.push(FieldKey::DataVersion.column_name().to_string());
                cols.push(FieldKey::Difficulty.column_name().to_string());
                cols.push(FieldKey::Hardcore.column_name().to_string());
                cols.push(FieldKey::AllowCommands.column_name().to_string());
                cols.push(FieldKey::SizeOnDisk.column_name().to_string());
                cols
            }
            SheetKind::LogResults => to_strings(&["File Name", "Path", "Log Line", "Extracted Seed"]),
            SheetKind::Data => to_strings(&[
                "File Name",
                "Random Seed",
                "Time Played",
                "Generator Name",
                "Level Name",
                "Game Mode",
                "Spawn Location",
                "Path",
                "Version",
                "Data Version",
                "Last Played",
                "Size on Disk",
                "Difficulty",
                "Hardcore",
                "Allow Commands",
                "Has Errors",
            ]),
            SheetKind::Errors => to_strings(&["File Name", "Error Message", "Path", "Detail"]),
            SheetKind::Corrupted => to_strings(&[
                "File Name",
                "Path",
                "Partial Data Retrieved",
                "Error Details",
            ]),
            SheetKind::Leads => to_strings(&[
                "Confidence",
                "Number",
                "Found In",
                "Context",
                "Line",
                "Path",
            ]),
        }
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// One named sheet: column headers plus rows of typed cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Sheet {
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// The full output document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

impl Workbook {
    /// Empty workbook with all sheets and their headers in place.
    pub fn new() -> Self {
        Self {
            sheets: SheetKind::ALL
                .iter()
                .map(|kind| Sheet {
                    name: kind.title().to_string(),
                    columns: kind.columns(),
                    rows: Vec::new(),
                })
                .collect(),
        }
    }

    /// Accept one row into a sheet. Text cells are sanitized on the way in;
    /// the row is padded or cut to the sheet's column count.
    pub fn append_row(&mut self, kind: SheetKind, row: Vec<CellValue>) {
        let sheet = self
            .sheets
            .iter_mut()
            .find(|s| s.name == kind.title())
            .expect("workbook always holds every sheet");
        let width = sheet.columns.len();
        let mut row: Vec<CellValue> = row
            .into_iter()
            .map(|cell| match cell {
                CellValue::Text(text) => CellValue::text(text),
                other => other,
            })
            .collect();
        row.truncate(width);
        while row.len() < width {
            row.push(CellValue::Text(String::new()));
        }
        sheet.rows.push(row);
    }

    pub fn sheet(&self, kind: SheetKind) -> &Sheet {
        self.sheets
            .iter()
            .find(|s| s.name == kind.title())
            .expect("workbook always holds every sheet")
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ScanError::Unexpected(format!("JSON serialization error: {e}")))
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ScanError::Unexpected(format!("JSON deserialization error: {e}")))
    }

    /// Persist the document. Write conflicts surface as `Io` so the caller
    /// can retry rather than lose results.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = self.to_json_string()?;
        fs::write(path, json)?;
        info!(path = %path.display(), "report saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn new_workbook_has_every_sheet_with_headers() {
        let wb = Workbook::new();
        assert_eq!(wb.sheets.len(), 6);
        let seeds = wb.sheet(SheetKind::Seeds);
        assert_eq!(seeds.columns[0], "Seed Value");
        assert_eq!(seeds.find_column("Times Found"), Some(8));
        assert_eq!(wb.sheet(SheetKind::Leads).columns.len(), 6);
    }

    #[test]
    fn append_sanitizes_and_pads() {
        let mut wb = Workbook::new();
        wb.append_row(
            SheetKind::Errors,
            vec![CellValue::Text("bad\x00name".into())],
        );
        let sheet = wb.sheet(SheetKind::Errors);
        assert_eq!(sheet.rows[0].len(), sheet.columns.len());
        assert_eq!(sheet.rows[0][0], CellValue::Text("badname".into()));
        assert_eq!(sheet.rows[0][3], CellValue::Text(String::new()));
    }

    #[test]
    fn save_and_load_round_trip() {
        let mut wb = Workbook::new();
        wb.append_row(
            SheetKind::Seeds,
            vec![
                CellValue::text("-42"),
                CellValue::text("level.dat"),
                CellValue::text("Test"),
            ],
        );
        wb.append_row(
            SheetKind::Leads,
            vec![CellValue::text("High"), CellValue::text("123456789")],
        );

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        wb.save(&path).unwrap();
        let back = Workbook::load(&path).unwrap();
        assert_eq!(wb, back);
    }

    #[test]
    fn save_to_impossible_destination_fails_cleanly() {
        let wb = Workbook::new();
        let result = wb.save(Path::new("/nonexistent-dir-for-sure/report.json"));
        assert!(matches!(result, Err(ScanError::Io(_))));
    }
}
