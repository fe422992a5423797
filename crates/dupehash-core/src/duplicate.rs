//! Duplicate engine (C6): turns cached fingerprints into verified duplicate
//! groups through successive re-hashing rounds (spec §4.6).
//!
//! Phase 1 pulls every persisted record satisfying `initial_segment_length`
//! (including whole-hash rows of files too small to have been sampled, per
//! the §4.5 step-4 equivalence), groups by fingerprint, and discards
//! singletons. Phase 2 re-hashes each surviving
//! group at increasing sample sizes — `[2, 4, 8, 16, 32, 64, 0]` multiples of
//! `initial_segment_length`, with `0` meaning a whole-file hash — regrouping
//! by `(fingerprint, data_length)` after each round and discarding singletons
//! again. A directory's aggregate fingerprint legitimately changes from round
//! to round as its descendants get re-sampled at wider windows; that is the
//! mechanism, not a defect (OQ3).

use crate::record::HashRecord;
use crate::scheduler::{self, HashContext};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Successive sample-size multipliers applied to `initial_segment_length`
/// during verification; `0` means a whole-file hash (spec §4.6).
pub const VERIFICATION_MULTIPLIERS: [u64; 7] = [2, 4, 8, 16, 32, 64, 0];

/// A set of entries (by path) confirmed to share content at the final
/// verification round.
#[derive(Debug, Clone)]
pub struct DuplicateGroup {
    pub fingerprint_hex: String,
    pub data_length: u64,
    pub paths: Vec<std::path::PathBuf>,
}

/// Run the full duplicate pipeline rooted under `prefix` (or the whole store
/// if `None`), starting from candidates at `initial_segment_length`.
pub async fn find_duplicates(
    initial_segment_length: u64,
    prefix: Option<&Path>,
    ctx: Arc<HashContext>,
) -> Vec<DuplicateGroup> {
    let candidates = ctx.cache.candidate_groups(initial_segment_length, prefix);
    debug!(groups = candidates.len(), "phase 1 candidate groups");

    let mut surviving = candidates;
    for multiplier in VERIFICATION_MULTIPLIERS {
        if surviving.is_empty() {
            break;
        }
        let segment_length = if multiplier == 0 {
            0
        } else {
            initial_segment_length * multiplier
        };
        surviving = verify_round(surviving, segment_length, ctx.clone()).await;
        debug!(
            segment_length,
            groups = surviving.len(),
            "verification round complete"
        );
    }

    surviving
        .into_iter()
        .filter_map(|group| {
            let first = group.first()?;
            Some(DuplicateGroup {
                fingerprint_hex: first.fingerprint.to_hex(),
                data_length: first.data_length,
                paths: group.into_iter().map(|r| r.path).collect(),
            })
        })
        .collect()
}

/// Re-hash every member of every group at `segment_length`, regroup by
/// `(fingerprint, data_length)`, and discard groups that no longer have at
/// least two members (spec §4.6 phase 2).
async fn verify_round(
    groups: Vec<Vec<HashRecord>>,
    segment_length: u64,
    ctx: Arc<HashContext>,
) -> Vec<Vec<HashRecord>> {
    let mut regrouped: HashMap<(crate::fingerprint::Fingerprint, u64), Vec<HashRecord>> =
        HashMap::new();

    for group in groups {
        for record in group {
            let Ok(Some(outcome)) = scheduler::hash(&record.path, segment_length, ctx.clone()).await
            else {
                continue;
            };
            let mut updated = record;
            updated.fingerprint = outcome.fingerprint;
            updated.data_length = outcome.data_length;
            updated.segment_length = segment_length;
            regrouped
                .entry((outcome.fingerprint, outcome.data_length))
                .or_default()
                .push(updated);
        }
    }

    regrouped
        .into_values()
        .filter(|group| group.len() >= 2)
        .collect()
}
