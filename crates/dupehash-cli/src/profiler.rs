//! `tracing`-backed `Profiler` (spec §1's profiling collaborator, §9's
//! recommendation to thread a handle rather than reach for a global). Timings
//! ride the same logging pipeline instead of a bespoke metrics exporter.

use dupehash_core::profiler::Profiler;
use std::time::Duration;

#[derive(Debug, Default)]
pub struct TracingProfiler;

impl Profiler for TracingProfiler {
    fn record(&self, label: &'static str, elapsed: Duration) {
        tracing::info!(label, elapsed_ms = elapsed.as_millis() as u64, "timing");
    }
}
