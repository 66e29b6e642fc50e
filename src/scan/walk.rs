//! Directory traversal, skip rules, and candidate classification.
//!
//! Classification probes the first bytes of each file: extensions narrow
//! which interpretations are worth attempting, but headers decide. A `.dat`
//! whose header is gzip is dispatched both as a tag tree and as a compressed
//! log, because recovered files lie about their contents often enough that
//! both readings must be tried.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::WalkConfig;
use crate::sniff::{self, ContentKind};

/// Known non-world data files, never classified or dispatched.
static SKIP_FILES: &[&str] = &[
    "raids.dat",
    "raids_end.dat",
    "villages.dat",
    "villages_end.dat",
    "villages_nether.dat",
    "village.dat",
    "scoreboard.dat",
    "capabilities.dat",
    "temple.dat",
    "idcounts.dat",
    "random_sequences.dat",
    "mineshaft.dat",
    "fortress.dat",
    "fortress_index.dat",
    "mansion_index.dat",
    "mineshaft_index.dat",
    "passwords.txt",
];

/// How a candidate will be interpreted when dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// Binary tag tree (raw or gzip-framed).
    Tree,
    /// gzip-framed text.
    CompressedLog,
    /// Plaintext log.
    PlainLog,
}

/// One file/interpretation pair awaiting dispatch.
#[derive(Debug, Clone)]
pub struct ScanCandidate {
    pub path: PathBuf,
    pub filename: String,
    pub dir: String,
    pub kind: CandidateKind,
    pub size: u64,
}

/// Result of classifying one directory's files.
#[derive(Debug, Default)]
pub struct DirScan {
    pub candidates: Vec<ScanCandidate>,
    /// Files over the hard size cap, skipped outright.
    pub oversized: u64,
}

/// Whether a filename is excluded before any classification.
pub fn should_skip(filename: &str) -> bool {
    let lower = filename.to_lowercase();
    if SKIP_FILES.contains(&lower.as_str()) {
        return true;
    }
    // Numbered map items carry no world seed.
    if lower.starts_with("map_") && lower.ends_with(".dat") {
        return true;
    }
    // Advancement progress JSON.
    if lower.ends_with(".json") && lower.contains("advancements") {
        return true;
    }
    false
}

/// Classify every file in one directory.
pub fn classify_directory(dir: &Path, files: Vec<String>, cfg: &WalkConfig) -> DirScan {
    let mut scan = DirScan::default();
    for filename in files {
        classify_file(dir, &filename, cfg, &mut scan);
    }
    scan
}

/// Batched classification for very large directories: identical output, but
/// progress is logged per batch and no deadline wraps the pass.
pub fn classify_directory_batched(dir: &Path, files: Vec<String>, cfg: &WalkConfig) -> DirScan {
    let mut scan = DirScan::default();
    let total = files.len();
    let batches = total.div_ceil(cfg.batch_size.max(1));
    for (index, batch) in files.chunks(cfg.batch_size.max(1)).enumerate() {
        debug!(
            dir = %dir.display(),
            batch = index + 1,
            batches,
            files = batch.len(),
            "classifying batch"
        );
        for filename in batch {
            classify_file(dir, filename, cfg, &mut scan);
        }
    }
    scan
}

fn classify_file(dir: &Path, filename: &str, cfg: &WalkConfig, scan: &mut DirScan) {
    if should_skip(filename) {
        return;
    }
    let path = dir.join(filename);
    let Ok(meta) = path.metadata() else {
        return;
    };
    if !meta.is_file() {
        return;
    }
    let size = meta.len();
    if size == 0 {
        return;
    }
    if size > cfg.max_file_size {
        warn!(path = %path.display(), size, "over the size cap, skipping");
        scan.oversized += 1;
        return;
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    let dir_str = dir.display().to_string();

    // Need more than the magic itself before a header is trusted.
    if size > 2 {
        if let Some(header) = read_header(&path) {
            let kind = sniff::classify_bytes(size, &header);
            let gzip = kind == ContentKind::CompressedTree;
            let tree = kind == ContentKind::RawTree;
            if ext == "dat" {
                if gzip || tree {
                    scan.candidates.push(candidate(
                        &path,
                        filename,
                        &dir_str,
                        CandidateKind::Tree,
                        size,
                    ));
                }
                if gzip {
                    scan.candidates.push(candidate(
                        &path,
                        filename,
                        &dir_str,
                        CandidateKind::CompressedLog,
                        size,
                    ));
                }
            } else if ext == "gz" && gzip {
                scan.candidates.push(candidate(
                    &path,
                    filename,
                    &dir_str,
                    CandidateKind::CompressedLog,
                    size,
                ));
            }
        }
    }

    if ext == "log" || ext == "txt" {
        scan.candidates.push(candidate(
            &path,
            filename,
            &dir_str,
            CandidateKind::PlainLog,
            size,
        ));
    }
}

fn candidate(
    path: &Path,
    filename: &str,
    dir: &str,
    kind: CandidateKind,
    size: u64,
) -> ScanCandidate {
    ScanCandidate {
        path: path.to_path_buf(),
        filename: filename.to_string(),
        dir: dir.to_string(),
        kind,
        size,
    }
}

fn read_header(path: &Path) -> Option<[u8; 3]> {
    let mut file = File::open(path).ok()?;
    let mut header = [0u8; 3];
    let mut total = 0;
    while total < header.len() {
        match file.read(&mut header[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(_) => return None,
        }
    }
    (total == header.len()).then_some(header)
}

/// Collect every directory under `root` with its direct child files, in walk
/// order. Unreadable entries are skipped.
pub fn collect_directories(root: &Path) -> Vec<(PathBuf, Vec<String>)> {
    let mut dirs: Vec<(PathBuf, Vec<String>)> = Vec::new();
    let mut index: HashMap<PathBuf, usize> = HashMap::new();

    for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if entry.file_type().is_dir() {
            index.insert(path.to_path_buf(), dirs.len());
            dirs.push((path.to_path_buf(), Vec::new()));
        } else if entry.file_type().is_file() {
            let Some(parent) = path.parent() else {
                continue;
            };
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some(&slot) = index.get(parent) {
                dirs[slot].1.push(name.to_string());
            }
        }
    }

    dirs
}
