//! Bounded execution of per-file work.
//!
//! Each unit of work (parsing one file) runs on a background blocking task
//! while the caller waits up to a deadline computed from the file size. On
//! expiry the caller gets `ScanError::Timeout`; the task itself is abandoned
//! rather than killed, so it may finish late on its own. Work run here must
//! therefore return a self-contained value and never mutate shared state:
//! the caller applies results only after a successful, non-timed-out return.

use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio::time::timeout;
use tracing::warn;

use crate::config::TimeoutConfig;
use crate::error::{Result, ScanError};

/// Runs closures under a deadline on a private runtime.
pub struct BoundedExecutor {
    rt: Runtime,
    profile: TimeoutConfig,
}

impl BoundedExecutor {
    pub fn new(profile: TimeoutConfig) -> Result<Self> {
        let rt = Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(ScanError::Io)?;
        Ok(Self { rt, profile })
    }

    /// Per-file deadline: base budget plus one second per configured slice of
    /// file size, clamped to [base, max].
    pub fn deadline_for(&self, size_bytes: u64) -> Duration {
        let extra = size_bytes as f64 / self.profile.size_ratio_bytes as f64;
        let secs = (self.profile.base_secs + extra).clamp(self.profile.base_secs, self.profile.max_secs);
        Duration::from_secs_f64(secs)
    }

    /// Deadline for classifying a single directory's files.
    pub fn directory_deadline(&self) -> Duration {
        Duration::from_secs(self.profile.directory_secs)
    }

    /// Run `work` under `deadline`.
    ///
    /// Expiry surfaces as `Timeout` even when the work never observes
    /// cancellation; the blocking task is left to finish or die on its own.
    pub fn run<T, F>(&self, deadline: Duration, work: F) -> Result<T>
    where
        F: FnOnce() -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        self.rt.block_on(async {
            match timeout(deadline, tokio::task::spawn_blocking(work)).await {
                Ok(Ok(result)) => result,
                Ok(Err(join)) => Err(ScanError::Unexpected(format!("worker failed: {join}"))),
                Err(_) => {
                    warn!(
                        deadline_secs = deadline.as_secs_f64(),
                        "deadline expired, abandoning worker"
                    );
                    Err(ScanError::Timeout {
                        seconds: deadline.as_secs_f64(),
                    })
                }
            }
        })
    }
}

impl std::fmt::Debug for BoundedExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedExecutor")
            .field("profile", &self.profile)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> BoundedExecutor {
        BoundedExecutor::new(TimeoutConfig::default()).unwrap()
    }

    #[test]
    fn deadline_scales_with_size_and_clamps() {
        let ex = executor();
        assert_eq!(ex.deadline_for(0), Duration::from_secs_f64(2.0));
        // 5 MiB buys one extra second.
        assert_eq!(
            ex.deadline_for(5 * 1024 * 1024),
            Duration::from_secs_f64(3.0)
        );
        // Huge files cap at the maximum.
        assert_eq!(
            ex.deadline_for(10 * 1024 * 1024 * 1024),
            Duration::from_secs_f64(5.0)
        );
    }

    #[test]
    fn completes_within_deadline() {
        let ex = executor();
        let value = ex
            .run(Duration::from_secs(2), || Ok(40 + 2))
            .unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn expiry_surfaces_timeout_without_cooperation() {
        let ex = executor();
        let result: Result<()> = ex.run(Duration::from_millis(50), || {
            std::thread::sleep(Duration::from_secs(2));
            Ok(())
        });
        assert!(matches!(result, Err(ScanError::Timeout { .. })));
    }

    #[test]
    fn work_errors_pass_through() {
        let ex = executor();
        let result: Result<()> = ex.run(Duration::from_secs(2), || {
            Err(ScanError::Decode("bad bytes".into()))
        });
        assert!(matches!(result, Err(ScanError::Decode(_))));
    }
}
