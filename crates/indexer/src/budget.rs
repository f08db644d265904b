use std::path::Path;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Per-file and aggregate size caps for one discovery pass.
///
/// The aggregate budget only ever shrinks. It is shared by every walker of the
/// pass, so reservations go through an atomic compare-and-decrement.
#[derive(Debug)]
pub struct SizeBudgetTracker {
    max_file_size: Option<u64>,
    remaining: Option<AtomicU64>,
    accepted_bytes: AtomicU64,
    stat_failures: AtomicUsize,
}

impl SizeBudgetTracker {
    /// Caps in megabytes; `None` leaves that cap unbounded.
    pub fn new(max_file_size_mb: Option<f64>, max_index_size_mb: Option<f64>) -> Self {
        Self::from_bytes(
            max_file_size_mb.map(mb_to_bytes),
            max_index_size_mb.map(mb_to_bytes),
        )
    }

    pub fn from_bytes(max_file_size: Option<u64>, max_index_size: Option<u64>) -> Self {
        Self {
            max_file_size,
            remaining: max_index_size.map(AtomicU64::new),
            accepted_bytes: AtomicU64::new(0),
            stat_failures: AtomicUsize::new(0),
        }
    }

    pub fn unbounded() -> Self {
        Self::from_bytes(None, None)
    }

    /// No cap configured: every file is accepted without touching the disk.
    pub fn is_unbounded(&self) -> bool {
        self.max_file_size.is_none() && self.remaining.is_none()
    }

    /// Stat `path` and reserve its size against the budget.
    ///
    /// A file whose size cannot be read is rejected and counted as a stat
    /// failure.
    pub fn accepts(&self, path: &Path) -> bool {
        if self.is_unbounded() {
            return true;
        }

        let size = match std::fs::metadata(path) {
            Ok(meta) => meta.len(),
            Err(e) => {
                log::warn!("Error reading file size for {}: {e}", path.display());
                self.stat_failures.fetch_add(1, Ordering::Relaxed);
                return false;
            }
        };

        let accepted = self.try_reserve(size);
        if !accepted {
            log::debug!("Skipping {} ({size} bytes) over size budget", path.display());
        }
        accepted
    }

    /// Reserve `size` bytes if it fits both caps.
    pub fn try_reserve(&self, size: u64) -> bool {
        if self.max_file_size.is_some_and(|max| size > max) {
            return false;
        }

        if let Some(remaining) = &self.remaining {
            let reserved = remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| {
                    left.checked_sub(size)
                })
                .is_ok();
            if !reserved {
                return false;
            }
        }

        self.accepted_bytes.fetch_add(size, Ordering::Relaxed);
        true
    }

    /// Bytes left in the aggregate budget; `None` when unbounded.
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
            .as_ref()
            .map(|remaining| remaining.load(Ordering::Acquire))
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == Some(0)
    }

    pub fn max_file_size(&self) -> Option<u64> {
        self.max_file_size
    }

    /// Total size of accepted files. Sizes are only read when a cap is set.
    pub fn accepted_bytes(&self) -> u64 {
        self.accepted_bytes.load(Ordering::Relaxed)
    }

    pub fn stat_failures(&self) -> usize {
        self.stat_failures.load(Ordering::Relaxed)
    }
}

/// Megabytes to bytes. Negative and NaN sizes become zero.
pub fn mb_to_bytes(mb: f64) -> u64 {
    (mb.max(0.0) * BYTES_PER_MB as f64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn converts_megabytes() {
        assert_eq!(mb_to_bytes(10.0), 10 * BYTES_PER_MB);
        assert_eq!(mb_to_bytes(0.5), BYTES_PER_MB / 2);
        assert_eq!(mb_to_bytes(-3.0), 0);
        assert_eq!(mb_to_bytes(f64::NAN), 0);
    }

    #[test]
    fn rejects_files_over_per_file_cap() {
        let budget = SizeBudgetTracker::from_bytes(Some(100), None);
        assert!(budget.try_reserve(100));
        assert!(!budget.try_reserve(101));
        assert_eq!(budget.accepted_bytes(), 100);
        assert_eq!(budget.remaining(), None);
    }

    #[test]
    fn aggregate_budget_is_monotonic_and_never_overdrawn() {
        let budget = SizeBudgetTracker::from_bytes(None, Some(250));
        let mut last = budget.remaining().unwrap();
        for size in [100, 200, 100, 60, 50] {
            budget.try_reserve(size);
            let now = budget.remaining().unwrap();
            assert!(now <= last);
            last = now;
        }
        assert_eq!(budget.accepted_bytes(), 250);
        assert!(budget.is_exhausted());
        assert!(!budget.try_reserve(1));
    }

    #[test]
    fn zero_sized_budget_starts_exhausted() {
        let budget = SizeBudgetTracker::new(Some(10.0), Some(0.0));
        assert!(budget.is_exhausted());
        assert!(!SizeBudgetTracker::unbounded().is_exhausted());
    }

    #[test]
    fn unbounded_tracker_accepts_missing_files_without_stat() {
        let budget = SizeBudgetTracker::unbounded();
        assert!(budget.is_unbounded());
        assert!(budget.accepts(Path::new("/definitely/not/here.rs")));
        assert_eq!(budget.stat_failures(), 0);
    }

    #[test]
    fn stat_failure_rejects_and_is_counted() {
        let budget = SizeBudgetTracker::new(Some(1.0), None);
        assert!(!budget.accepts(Path::new("/definitely/not/here.rs")));
        assert_eq!(budget.stat_failures(), 1);
    }

    #[test]
    fn accepts_deducts_real_file_sizes() {
        let temp = tempdir().unwrap();
        let small = temp.path().join("small.rs");
        let large = temp.path().join("large.rs");
        fs::write(&small, vec![b'a'; 40]).unwrap();
        fs::write(&large, vec![b'a'; 80]).unwrap();

        let budget = SizeBudgetTracker::from_bytes(Some(100), Some(100));
        assert!(budget.accepts(&small));
        assert_eq!(budget.remaining(), Some(60));
        assert!(!budget.accepts(&large));
        assert_eq!(budget.remaining(), Some(60));
    }

    #[test]
    fn concurrent_reservations_never_exceed_budget() {
        let budget = Arc::new(SizeBudgetTracker::from_bytes(None, Some(1_000)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let budget = Arc::clone(&budget);
                std::thread::spawn(move || (0..100).filter(|_| budget.try_reserve(7)).count())
            })
            .collect();
        let accepted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(accepted as u64 * 7, budget.accepted_bytes());
        assert!(budget.accepted_bytes() <= 1_000);
        assert_eq!(budget.remaining(), Some(1_000 - budget.accepted_bytes()));
    }
}
