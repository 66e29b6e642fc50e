//! Scan orchestration.
//!
//! A single logical worker walks the tree, classifies candidates, and
//! dispatches each one to the right extractor inside the bounded executor.
//! Results are applied to the session only after a successful, non-timed-out
//! return, never from the worker itself.

pub mod session;
pub mod walk;

pub use session::{Counters, ScanSession};
pub use walk::{CandidateKind, ScanCandidate};

use std::path::Path;

use tracing::{debug, info, info_span, warn};

use crate::config::ScanConfig;
use crate::error::{Result, ScanError};
use crate::executor::BoundedExecutor;
use crate::logs;
use crate::nbt;

/// Observational progress events. These must never affect scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanProgress {
    Discovering { directories: usize, scanned: usize },
    Processing { total: usize, done: usize, percent: u8 },
}

/// Drives a full scan of one directory tree.
pub struct Scanner {
    config: ScanConfig,
    executor: BoundedExecutor,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Result<Self> {
        let executor = BoundedExecutor::new(config.timeouts.clone())?;
        Ok(Self { config, executor })
    }

    pub fn scan(&self, root: &Path) -> Result<ScanSession> {
        self.scan_with_progress(root, |_| {})
    }

    pub fn scan_with_progress(
        &self,
        root: &Path,
        mut progress: impl FnMut(ScanProgress),
    ) -> Result<ScanSession> {
        let span = info_span!("scan", root = %root.display());
        let _guard = span.enter();

        let mut session = ScanSession::new();
        let candidates = self.discover(root, &mut session, &mut progress);
        info!(candidates = candidates.len(), "discovery complete");

        let total = candidates.len();
        if total == 0 {
            info!("no candidate files found");
            return Ok(session);
        }

        let mut last_percent = 0u8;
        for (index, candidate) in candidates.into_iter().enumerate() {
            let percent = ((index + 1) * 100 / total) as u8;
            if percent != last_percent {
                progress(ScanProgress::Processing {
                    total,
                    done: index + 1,
                    percent,
                });
                last_percent = percent;
            }

            session.counters.processed_files += 1;

            // Files can vanish between discovery and dispatch.
            if !candidate.path.is_file() {
                session.counters.skipped_files += 1;
                continue;
            }

            self.dispatch(&candidate, &mut session);
        }

        info!(
            processed = session.counters.processed_files,
            saved = session.counters.saved_entries,
            errors = session.counters.errors_encountered,
            corrupted = session.counters.corrupted_files,
            "scan complete"
        );
        Ok(session)
    }

    /// Walk the tree and classify every directory's files into candidates.
    fn discover(
        &self,
        root: &Path,
        session: &mut ScanSession,
        progress: &mut impl FnMut(ScanProgress),
    ) -> Vec<ScanCandidate> {
        let directories = walk::collect_directories(root);
        let total = directories.len();
        let mut candidates = Vec::new();

        for (index, (dir, files)) in directories.into_iter().enumerate() {
            progress(ScanProgress::Discovering {
                directories: total,
                scanned: index,
            });

            let scan = if files.len() > self.config.walk.batch_threshold {
                walk::classify_directory_batched(&dir, files, &self.config.walk)
            } else {
                let work_dir = dir.clone();
                let work_files = files.clone();
                let work_cfg = self.config.walk.clone();
                match self.executor.run(self.executor.directory_deadline(), move || {
                    Ok(walk::classify_directory(&work_dir, work_files, &work_cfg))
                }) {
                    Ok(scan) => scan,
                    Err(ScanError::Timeout { .. }) => {
                        warn!(dir = %dir.display(), "directory deadline hit, switching to batches");
                        walk::classify_directory_batched(&dir, files, &self.config.walk)
                    }
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "directory classification failed");
                        continue;
                    }
                }
            };

            session.counters.skipped_files += scan.oversized;
            candidates.extend(scan.candidates);
        }

        candidates
    }

    /// Run one candidate's extractor under its deadline and apply the result.
    fn dispatch(&self, candidate: &ScanCandidate, session: &mut ScanSession) {
        let deadline = self.executor.deadline_for(candidate.size);
        debug!(
            file = %candidate.path.display(),
            kind = ?candidate.kind,
            deadline_secs = deadline.as_secs_f64(),
            "dispatching"
        );

        match candidate.kind {
            CandidateKind::Tree => {
                let path = candidate.path.clone();
                match self.executor.run(deadline, move || nbt::extract_world(&path)) {
                    Ok(Some(record)) => session.apply_world(candidate, record),
                    Ok(None) => {}
                    Err(e) => session.record_failure(candidate, &e),
                }
            }
            CandidateKind::CompressedLog => {
                let path = candidate.path.clone();
                let filename = candidate.filename.clone();
                let dir = candidate.dir.clone();
                let sampling = self.config.sampling.clone();
                match self.executor.run(deadline, move || {
                    logs::mine_gz_file(&path, &filename, &dir, &sampling)
                }) {
                    Ok(Some(mined)) => session.apply_mined(candidate, mined),
                    Ok(None) => {}
                    Err(e) => session.record_failure(candidate, &e),
                }
            }
            CandidateKind::PlainLog => {
                let path = candidate.path.clone();
                let filename = candidate.filename.clone();
                let dir = candidate.dir.clone();
                let sampling = self.config.sampling.clone();
                match self.executor.run(deadline, move || {
                    logs::mine_plain_file(&path, &filename, &dir, &sampling)
                }) {
                    Ok(Some(mined)) => session.apply_mined(candidate, mined),
                    Ok(None) => {}
                    Err(e) => session.record_failure(candidate, &e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::FieldKey;
    use std::fs;
    use tempfile::TempDir;

    fn world_bytes(seed: i64, name: &str) -> Vec<u8> {
        // Compound root, "Data" compound, RandomSeed + LevelName entries.
        let mut data = vec![0x0a, 0x00, 0x00];
        data.push(0x0a);
        data.extend((4u16).to_be_bytes());
        data.extend(b"Data");
        data.push(0x04);
        data.extend((10u16).to_be_bytes());
        data.extend(b"RandomSeed");
        data.extend(seed.to_be_bytes());
        data.push(0x08);
        data.extend((9u16).to_be_bytes());
        data.extend(b"LevelName");
        data.extend((name.len() as u16).to_be_bytes());
        data.extend(name.as_bytes());
        data.push(0x00);
        data.push(0x00);
        data
    }

    fn scanner() -> Scanner {
        Scanner::new(ScanConfig::default()).unwrap()
    }

    #[test]
    fn end_to_end_tree_and_log() {
        let tmp = TempDir::new().unwrap();
        // The world file sits in the root so it merges ahead of the log.
        fs::write(tmp.path().join("level.dat"), world_bytes(-42, "Test")).unwrap();
        fs::create_dir(tmp.path().join("logs")).unwrap();
        fs::write(
            tmp.path().join("logs").join("latest.log"),
            "Minecraft version 1.19\nRandom Seed: -42\n",
        )
        .unwrap();

        let session = scanner().scan(tmp.path()).unwrap();
        assert_eq!(session.counters.processed_files, 2);
        assert_eq!(session.counters.errors_encountered, 0);

        let record = session.registry.get("-42").unwrap();
        assert_eq!(record.times_found, 2);
        assert_eq!(record.fields.display(FieldKey::WorldName), "Test");
        assert_eq!(record.fields.display(FieldKey::Version), "1.19");
    }

    #[test]
    fn skip_listed_files_are_never_dispatched() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("scoreboard.dat"), world_bytes(9, "Nope")).unwrap();
        fs::write(tmp.path().join("map_3.dat"), world_bytes(10, "Nope")).unwrap();

        let session = scanner().scan(tmp.path()).unwrap();
        assert_eq!(session.counters.processed_files, 0);
        assert!(session.registry.is_empty());
    }

    #[test]
    fn empty_tree_scans_clean() {
        let tmp = TempDir::new().unwrap();
        let session = scanner().scan(tmp.path()).unwrap();
        assert_eq!(session.counters.processed_files, 0);
        assert!(session.registry.is_empty());
    }

    #[test]
    fn garbage_dat_is_silent_not_an_error() {
        let tmp = TempDir::new().unwrap();
        // Raw tree header but the content decodes to a seedless compound.
        fs::write(tmp.path().join("odd.dat"), [0x0a, 0x00, 0x00, 0x00]).unwrap();
        let session = scanner().scan(tmp.path()).unwrap();
        assert_eq!(session.counters.processed_files, 1);
        assert_eq!(session.counters.errors_encountered, 0);
        assert!(session.registry.is_empty());
    }

    #[test]
    fn progress_reaches_one_hundred() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.log"), "seed: 11111\n").unwrap();
        fs::write(tmp.path().join("b.log"), "seed: 22222\n").unwrap();

        let mut final_percent = 0;
        scanner()
            .scan_with_progress(tmp.path(), |p| {
                if let ScanProgress::Processing { percent, .. } = p {
                    final_percent = percent;
                }
            })
            .unwrap();
        assert_eq!(final_percent, 100);
    }
}
