//! Configuration for the scan pipeline.
//!
//! Centralized tuning profile with sensible defaults. The shape of the
//! per-file budget is fixed (larger files get more time, capped); only the
//! constants vary between profiles.

use serde::{Deserialize, Serialize};

/// Master configuration for a scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Per-file and per-directory time budgets.
    pub timeouts: TimeoutConfig,
    /// Line sampling policy for large text inputs.
    pub sampling: SamplingConfig,
    /// Directory walk and batching limits.
    pub walk: WalkConfig,
}

/// Time budget profile for bounded execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Base per-file budget in seconds.
    pub base_secs: f64,
    /// Hard cap on any per-file budget in seconds.
    pub max_secs: f64,
    /// One extra second of budget per this many bytes of file size.
    pub size_ratio_bytes: u64,
    /// Budget for classifying a single directory's files.
    pub directory_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            base_secs: 2.0,
            max_secs: 5.0,
            size_ratio_bytes: 5 * 1024 * 1024,
            directory_secs: 120,
        }
    }
}

/// Sampling policy for line-oriented mining of large files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Files at or below this size are always mined line-by-line in full.
    pub small_file_threshold: u64,
    /// Above this size the keyword sampling policy applies.
    pub large_file_threshold: u64,
    /// Lines examined before sampling restricts to keyword-bearing lines.
    pub max_sample_lines: usize,
    /// Probe read size used for binary-content detection.
    pub probe_chunk: usize,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            small_file_threshold: 1024 * 1024,
            large_file_threshold: 10 * 1024 * 1024,
            max_sample_lines: 5000,
            probe_chunk: 8192,
        }
    }
}

impl SamplingConfig {
    /// Whether a line of a file of `size` bytes still gets full examination
    /// after `lines_seen` lines, or only keyword-bearing lines do.
    pub fn examine_all(&self, size: u64, lines_seen: usize) -> bool {
        if size <= self.small_file_threshold {
            return true;
        }
        !(size > self.large_file_threshold && lines_seen > self.max_sample_lines)
    }
}

/// Directory walk limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkConfig {
    /// Directories with more files than this switch to batched,
    /// header-probe-only classification with no deadline.
    pub batch_threshold: usize,
    /// Files per batch in batched classification.
    pub batch_size: usize,
    /// Files larger than this are skipped outright and counted.
    pub max_file_size: u64,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            batch_threshold: 1000,
            batch_size: 1000,
            max_file_size: 2 * 1024 * 1024 * 1024,
        }
    }
}
