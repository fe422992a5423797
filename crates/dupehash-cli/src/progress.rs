//! `indicatif`-backed `ProgressSink` (the progress-bar rendering collaborator
//! from spec §1).

use dupehash_core::progress::{ProgressSink, ProgressSnapshot};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};

pub struct BarProgressSink {
    bar: ProgressBar,
    total_read: AtomicU64,
    total_to_read: AtomicU64,
}

impl BarProgressSink {
    #[must_use]
    pub fn new() -> Self {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {bytes}/{total_bytes} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self {
            bar,
            total_read: AtomicU64::new(0),
            total_to_read: AtomicU64::new(0),
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for BarProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for BarProgressSink {
    fn add_read(&self, bytes: u64) {
        let total = self.total_read.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.bar.set_position(total);
    }

    fn add_to_read(&self, bytes: u64) {
        let total = self.total_to_read.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.bar.set_length(total);
    }

    fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            total_read: self.total_read.load(Ordering::Relaxed),
            total_to_read: self.total_to_read.load(Ordering::Relaxed),
        }
    }
}
