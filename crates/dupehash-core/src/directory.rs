//! Directory aggregator (C3).
//!
//! A directory's fingerprint is the combination of its children's fingerprints;
//! its `data_length` is their sum. Children that failed to hash are expected to
//! already be excluded from `children` by the caller (spec §4.3, OQ2: "omit
//! silently") — this function has no knowledge of failures, only successes.

use crate::fingerprint::Fingerprint;

/// One child's contribution to a directory's aggregate.
#[derive(Debug, Clone, Copy)]
pub struct ChildOutcome {
    pub fingerprint: Fingerprint,
    pub data_length: u64,
}

/// Combine successful children into a directory's `(fingerprint, data_length)`
/// (spec invariants 4 and 5: exact sum, content-only — not name — dependence).
#[must_use]
pub fn aggregate(children: &[ChildOutcome]) -> (Fingerprint, u64) {
    let fingerprint = Fingerprint::combine(children.iter().map(|c| c.fingerprint));
    let data_length = children.iter().map(|c| c.data_length).sum();
    (fingerprint, data_length)
}
