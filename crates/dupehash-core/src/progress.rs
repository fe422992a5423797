//! Progress aggregation (C8).
//!
//! Progress reports may arrive out of order from parallel workers (spec §5), so
//! the reporter only exposes atomic adds on two counters. Individual snapshots
//! need not be serializable with respect to each other — only the ratio is
//! monotone as deltas arrive.

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time read of accumulated progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSnapshot {
    pub total_read: u64,
    pub total_to_read: u64,
}

/// Collaborator interface for progress rendering (spec §1: progress-bar
/// rendering is an external collaborator; this trait is the seam).
pub trait ProgressSink: Send + Sync {
    fn add_read(&self, bytes: u64);
    fn add_to_read(&self, bytes: u64);
    fn snapshot(&self) -> ProgressSnapshot;
}

/// Discards all progress. Used when the caller doesn't care.
#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn add_read(&self, _bytes: u64) {}
    fn add_to_read(&self, _bytes: u64) {}
    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot::default()
    }
}

/// Plain atomic-counter implementation, suitable both for production use behind
/// a renderer and as a test double that asserts on accumulated totals.
#[derive(Debug, Default)]
pub struct CountingProgressSink {
    total_read: AtomicU64,
    total_to_read: AtomicU64,
}

impl CountingProgressSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressSink for CountingProgressSink {
    fn add_read(&self, bytes: u64) {
        self.total_read.fetch_add(bytes, Ordering::Relaxed);
    }

    fn add_to_read(&self, bytes: u64) {
        self.total_to_read.fetch_add(bytes, Ordering::Relaxed);
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_read: self.total_read.load(Ordering::Relaxed),
            total_to_read: self.total_to_read.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn counts_accumulate() {
        let sink = CountingProgressSink::new();
        sink.add_read(10);
        sink.add_read(5);
        sink.add_to_read(100);
        let snap = sink.snapshot();
        assert_eq!(snap.total_read, 15);
        assert_eq!(snap.total_to_read, 100);
    }

    #[test]
    fn concurrent_adds_are_sound() {
        let sink = Arc::new(CountingProgressSink::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let sink = sink.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        sink.add_read(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(sink.snapshot().total_read, 8000);
    }

    #[test]
    fn null_sink_reports_zero() {
        let sink = NullProgressSink;
        sink.add_read(10);
        assert_eq!(sink.snapshot(), ProgressSnapshot::default());
    }
}
