//! Per-scan state: registry, leads, counters, and pending report rows.
//!
//! One session object owns everything a scan mutates. Parse results arrive
//! here only after the bounded executor returned successfully, so a
//! late-finishing abandoned worker can never touch this state.

use std::fs::File;
use std::io::Read;

use tracing::debug;

use crate::error::ScanError;
use crate::logs::MinedLog;
use crate::nbt::WorldRecord;
use crate::registry::{FieldBag, FieldKey, LeadTable, SeedRegistry};
use crate::report::{CellValue, SheetKind, Workbook};

use super::walk::ScanCandidate;

/// Bytes probed when deciding whether a failed file still had readable data.
const PARTIAL_PROBE: usize = 4096;

/// Process-wide monotonic counters, reset once at scan start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub processed_files: u64,
    pub saved_entries: u64,
    pub errors_encountered: u64,
    pub corrupted_files: u64,
    pub skipped_files: u64,
}

/// One failed file.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    pub filename: String,
    pub path: String,
    pub message: String,
    pub detail: Option<String>,
}

/// A failed file that still had readable bytes.
#[derive(Debug, Clone)]
pub struct CorruptionRecord {
    pub filename: String,
    pub path: String,
    pub partial_data: bool,
    pub detail: String,
}

/// Per-file raw record for the Data sheet.
#[derive(Debug, Clone)]
pub struct RawRecord {
    pub filename: String,
    pub seed: String,
    pub fields: FieldBag,
    pub path: String,
    pub has_errors: bool,
}

/// One extracted seed line for the Log Results sheet.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub filename: String,
    pub path: String,
    pub line: String,
    pub seed: String,
}

/// All mutable state of one scan.
#[derive(Debug, Default)]
pub struct ScanSession {
    pub registry: SeedRegistry,
    pub leads: LeadTable,
    pub counters: Counters,
    raw_records: Vec<RawRecord>,
    log_records: Vec<LogRecord>,
    errors: Vec<ErrorRecord>,
    corrupted: Vec<CorruptionRecord>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a successfully extracted world record.
    pub fn apply_world(&mut self, candidate: &ScanCandidate, record: WorldRecord) {
        let mut fields = record.fields;
        fields.set(FieldKey::FirstFoundIn, candidate.filename.clone());
        fields.set(FieldKey::Path, candidate.dir.clone());
        self.registry.merge(&record.seed, fields.clone());
        self.raw_records.push(RawRecord {
            filename: candidate.filename.clone(),
            seed: record.seed,
            fields,
            path: candidate.dir.clone(),
            has_errors: false,
        });
        self.counters.saved_entries += 1;
    }

    /// Apply everything mined from one log file.
    pub fn apply_mined(&mut self, candidate: &ScanCandidate, mined: MinedLog) {
        for hit in mined.hits {
            self.log_records.push(LogRecord {
                filename: candidate.filename.clone(),
                path: candidate.dir.clone(),
                line: hit.line,
                seed: hit.seed.clone(),
            });
            let mut fields = FieldBag::new();
            fields.set(FieldKey::FirstFoundIn, candidate.filename.clone());
            fields.set(FieldKey::Path, candidate.dir.clone());
            fields.set(FieldKey::WorldName, "Found in Logs");
            if let Some(version) = &hit.version {
                fields.set(FieldKey::Version, version.clone());
            }
            if let Some(mode) = &hit.game_mode {
                fields.set(FieldKey::GameMode, mode.clone());
            }
            self.registry.merge(&hit.seed, fields);
        }
        self.leads.absorb(mined.leads);
    }

    /// Record one failed file: an Errors row, a Corrupted row when any bytes
    /// were still readable, and an error placeholder in the Data sheet.
    pub fn record_failure(&mut self, candidate: &ScanCandidate, error: &ScanError) {
        self.counters.errors_encountered += 1;
        let message = error.to_string();
        self.errors.push(ErrorRecord {
            filename: candidate.filename.clone(),
            path: candidate.dir.clone(),
            message: message.clone(),
            detail: Some(error.kind_label().to_string()),
        });

        if readable_bytes_remain(candidate) {
            debug!(file = %candidate.filename, "partial data still readable");
            self.counters.corrupted_files += 1;
            self.corrupted.push(CorruptionRecord {
                filename: candidate.filename.clone(),
                path: candidate.dir.clone(),
                partial_data: true,
                detail: message.clone(),
            });
        }

        self.raw_records.push(RawRecord {
            filename: candidate.filename.clone(),
            seed: format!("Error: {message}"),
            fields: FieldBag::new(),
            path: candidate.dir.clone(),
            has_errors: true,
        });
    }

    pub fn raw_record_count(&self) -> usize {
        self.raw_records.len()
    }

    pub fn log_record_count(&self) -> usize {
        self.log_records.len()
    }

    /// Build the output document from everything collected.
    pub fn finalize(&self) -> Workbook {
        let mut wb = Workbook::new();

        for (seed, record) in self.registry.all() {
            let f = &record.fields;
            wb.append_row(
                SheetKind::Seeds,
                vec![
                    CellValue::text(seed),
                    CellValue::text(f.display(FieldKey::FirstFoundIn)),
                    CellValue::text(f.display(FieldKey::WorldName)),
                    CellValue::text(f.display(FieldKey::GameMode)),
                    CellValue::text(f.display(FieldKey::Generator)),
                    CellValue::text(f.display(FieldKey::Version)),
                    CellValue::text(f.display(FieldKey::LastPlayed)),
                    CellValue::text(f.display(FieldKey::Path)),
                    CellValue::Int(record.times_found as i64),
                    CellValue::text(f.display(FieldKey::TimePlayed)),
                    CellValue::text(f.display(FieldKey::SpawnLocation)),
                    CellValue::text(f.display(FieldKey::DataVersion)),
                    CellValue::text(f.display(FieldKey::Difficulty)),
                    CellValue::text(f.display(FieldKey::Hardcore)),
                    CellValue::text(f.display(FieldKey::AllowCommands)),
                    CellValue::text(f.display(FieldKey::SizeOnDisk)),
                ],
            );
        }

        for rec in &self.log_records {
            wb.append_row(
                SheetKind::LogResults,
                vec![
                    CellValue::text(&rec.filename),
                    CellValue::text(&rec.path),
                    CellValue::text(&rec.line),
                    CellValue::text(&rec.seed),
                ],
            );
        }

        for rec in &self.raw_records {
            let f = &rec.fields;
            wb.append_row(
                SheetKind::Data,
                vec![
                    CellValue::text(&rec.filename),
                    CellValue::text(&rec.seed),
                    CellValue::text(f.display(FieldKey::TimePlayed)),
                    CellValue::text(f.display(FieldKey::Generator)),
                    CellValue::text(f.display(FieldKey::WorldName)),
                    CellValue::text(f.display(FieldKey::GameMode)),
                    CellValue::text(f.display(FieldKey::SpawnLocation)),
                    CellValue::text(&rec.path),
                    CellValue::text(f.display(FieldKey::Version)),
                    CellValue::text(f.display(FieldKey::DataVersion)),
                    CellValue::text(f.display(FieldKey::LastPlayed)),
                    CellValue::text(f.display(FieldKey::SizeOnDisk)),
                    CellValue::text(f.display(FieldKey::Difficulty)),
                    CellValue::text(f.display(FieldKey::Hardcore)),
                    CellValue::text(f.display(FieldKey::AllowCommands)),
                    CellValue::Bool(rec.has_errors),
                ],
            );
        }

        for rec in &self.errors {
            wb.append_row(
                SheetKind::Errors,
                vec![
                    CellValue::text(&rec.filename),
                    CellValue::text(&rec.message),
                    CellValue::text(&rec.path),
                    CellValue::text(rec.detail.as_deref().unwrap_or("")),
                ],
            );
        }

        for rec in &self.corrupted {
            wb.append_row(
                SheetKind::Corrupted,
                vec![
                    CellValue::text(&rec.filename),
                    CellValue::text(&rec.path),
                    CellValue::Bool(rec.partial_data),
                    CellValue::text(&rec.detail),
                ],
            );
        }

        for lead in self.leads.all() {
            wb.append_row(
                SheetKind::Leads,
                vec![
                    CellValue::text(lead.confidence.label()),
                    CellValue::text(&lead.token),
                    CellValue::text(&lead.filename),
                    CellValue::text(&lead.context),
                    CellValue::text(&lead.line),
                    CellValue::text(&lead.path),
                ],
            );
        }

        wb
    }
}

fn readable_bytes_remain(candidate: &ScanCandidate) -> bool {
    let Ok(mut file) = File::open(&candidate.path) else {
        return false;
    };
    let mut probe = [0u8; PARTIAL_PROBE];
    matches!(file.read(&mut probe), Ok(n) if n > 0)
}
