//! Page I/O counters.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counts the page operations issued against one index file.
///
/// `DiskManager` bumps these from its `&mut self` I/O methods; the atomics let
/// any holder of a shared `&IoStats` update or read them as well.
/// `Ordering::Relaxed` is enough: only atomicity matters, never ordering
/// between counters.
///
/// # Example
/// ```
/// use secidx::storage::IoStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = IoStats::new();
/// stats.pages_read.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().pages_read, 1);
/// ```
#[derive(Debug)]
pub struct IoStats {
    /// Number of whole pages read from disk.
    pub pages_read: AtomicU64,

    /// Number of whole pages written in place.
    pub pages_written: AtomicU64,

    /// Number of pages appended to the end of the file.
    pub pages_appended: AtomicU64,
}

impl IoStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            pages_read: AtomicU64::new(0),
            pages_written: AtomicU64::new(0),
            pages_appended: AtomicU64::new(0),
        }
    }

    /// Get a snapshot of current counters.
    pub fn snapshot(&self) -> IoSnapshot {
        IoSnapshot {
            pages_read: self.pages_read.load(Ordering::Relaxed),
            pages_written: self.pages_written.load(Ordering::Relaxed),
            pages_appended: self.pages_appended.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.pages_read.store(0, Ordering::Relaxed);
        self.pages_written.store(0, Ordering::Relaxed);
        self.pages_appended.store(0, Ordering::Relaxed);
    }
}

impl Default for IoStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`IoStats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IoSnapshot {
    pub pages_read: u64,
    pub pages_written: u64,
    pub pages_appended: u64,
}

impl IoSnapshot {
    /// Counter deltas between an earlier snapshot and this one.
    ///
    /// A counter that went down, because [`IoStats::reset`] ran in between,
    /// reports zero.
    pub fn since(&self, earlier: &IoSnapshot) -> IoSnapshot {
        IoSnapshot {
            pages_read: self.pages_read.saturating_sub(earlier.pages_read),
            pages_written: self.pages_written.saturating_sub(earlier.pages_written),
            pages_appended: self.pages_appended.saturating_sub(earlier.pages_appended),
        }
    }
}

impl fmt::Display for IoSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reads={} writes={} appends={}",
            self.pages_read, self.pages_written, self.pages_appended
        )
    }
}
