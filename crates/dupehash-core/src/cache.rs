//! Two-tier cache (C5): in-memory + persistent, keyed by `(segment_length, path)`.
//!
//! Lookup policy follows spec §4.5 exactly: a fresh in-memory hit short-circuits
//! everything; a recorded negative miss short-circuits to absent; a file miss
//! triggers a parent-directory pre-cache before retrying; anything left falls
//! through to a single persistent-store query under the segment-length
//! equivalence of step 4 (a whole-hash row satisfies a sampled query for files
//! small enough that the query would itself have whole-hashed, and vice versa).

use crate::persist::{group_by_fingerprint, is_under_prefix, PersistentStore};
use crate::record::{uuid_for, HashRecord};
use dashmap::{DashMap, DashSet};
use dupehash_util::fs::EntryStamp;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// In-memory map keyed by segment length, then path.
type MemTier = DashMap<u64, DashMap<PathBuf, HashRecord>>;
/// Negative-miss set keyed by segment length.
type NegativeTier = DashMap<u64, DashSet<PathBuf>>;

pub struct Cache {
    store: Arc<dyn PersistentStore>,
    mem: MemTier,
    negative: NegativeTier,
    precache_directories: bool,
    restrict_files_to_mem_cache: bool,
}

impl Cache {
    #[must_use]
    pub fn new(
        store: Arc<dyn PersistentStore>,
        precache_directories: bool,
        restrict_files_to_mem_cache: bool,
    ) -> Self {
        let _ = store.ensure_unique_index("uuid");
        Self {
            store,
            mem: DashMap::new(),
            negative: DashMap::new(),
            precache_directories,
            restrict_files_to_mem_cache,
        }
    }

    /// Look up a fingerprint for `path` at `segment_length`, validating
    /// freshness against `current` (spec §4.5).
    pub fn get(
        &self,
        path: &Path,
        is_directory: bool,
        segment_length: u64,
        current: &EntryStamp,
    ) -> Option<HashRecord> {
        if let Some(record) = self.mem_lookup(segment_length, path, current) {
            return Some(record);
        }

        if self.negative_contains(segment_length, path) {
            return None;
        }

        if !is_directory {
            self.precache_subtree(path.parent().unwrap_or(path));
            if let Some(record) = self.mem_lookup(segment_length, path, current) {
                return Some(record);
            }
            if self.restrict_files_to_mem_cache {
                self.record_negative(segment_length, path);
                return None;
            }
        }

        match self.query_persistent(path, segment_length, current) {
            Some(record) => {
                self.mem_insert(record.clone());
                if self.precache_directories && is_directory {
                    self.precache_subtree(path);
                }
                Some(record)
            }
            None => {
                self.record_negative(segment_length, path);
                None
            }
        }
    }

    /// Persist a freshly-computed record and make it visible to subsequent
    /// in-memory lookups (spec §4.4 step 5).
    pub fn upsert(&self, record: HashRecord) {
        self.clear_negative(record.segment_length, &record.path);
        if let Err(err) = self.store.upsert(&record) {
            warn!(path = %record.path.display(), error = %err, "persistent store upsert failed; continuing with in-memory result only");
        }
        self.mem_insert(record);
    }

    /// Candidate groups for the duplicate engine's phase 1 (spec §4.6): all
    /// records satisfying `segment_length` under an optional directory prefix,
    /// grouped by fingerprint, singletons discarded.
    ///
    /// A record qualifies via the same §4.5 step-4 equivalence used for cache
    /// lookups (`HashRecord::satisfies_segment_query`), not strict equality —
    /// otherwise a small file whole-hashed under invariant 3 (its stored
    /// `segment_length` normalized to 0) would never enter the candidate set
    /// at a sampled `segment_length`, even though its whole-file digest is by
    /// definition what a sampled hash of that file would have produced.
    pub fn candidate_groups(
        &self,
        segment_length: u64,
        prefix: Option<&Path>,
    ) -> Vec<Vec<HashRecord>> {
        let records = self.store.query_by_hash(prefix).unwrap_or_else(|err| {
            warn!(error = %err, "persistent store query failed during candidate grouping");
            Vec::new()
        });
        let at_segment: Vec<HashRecord> = records
            .into_iter()
            .filter(|r| {
                HashRecord::satisfies_segment_query(r.segment_length, r.data_length, segment_length)
            })
            .collect();
        group_by_fingerprint(at_segment)
    }

    fn mem_lookup(
        &self,
        segment_length: u64,
        path: &Path,
        current: &EntryStamp,
    ) -> Option<HashRecord> {
        let by_path = self.mem.get(&segment_length)?;
        let record = by_path.get(path)?;
        if record.is_fresh(current) {
            Some(record.clone())
        } else {
            None
        }
    }

    fn mem_insert(&self, record: HashRecord) {
        self.mem
            .entry(record.segment_length)
            .or_default()
            .insert(record.path.clone(), record);
    }

    fn negative_contains(&self, segment_length: u64, path: &Path) -> bool {
        self.negative
            .get(&segment_length)
            .is_some_and(|set| set.contains(path))
    }

    fn record_negative(&self, segment_length: u64, path: &Path) {
        self.negative
            .entry(segment_length)
            .or_default()
            .insert(path.to_path_buf());
    }

    fn clear_negative(&self, segment_length: u64, path: &Path) {
        if let Some(set) = self.negative.get(&segment_length) {
            set.remove(path);
        }
    }

    /// Bulk-load every persisted row under `dir` into the in-memory tier (spec
    /// §4.5 steps 3 and the post-step-5 directory pre-cache note).
    fn precache_subtree(&self, dir: &Path) {
        match self.store.query_by_directory_prefix(dir) {
            Ok(rows) => {
                debug!(dir = %dir.display(), count = rows.len(), "pre-cached directory subtree");
                for row in rows {
                    self.mem_insert(row);
                }
            }
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "persistent store fault during pre-cache; treating as miss");
            }
        }
    }

    fn query_persistent(
        &self,
        path: &Path,
        segment_length: u64,
        current: &EntryStamp,
    ) -> Option<HashRecord> {
        let uuid = uuid_for(segment_length, path);
        // Fast path: exact (segment_length, path) row.
        if let Ok(Some(record)) = self.store.get_by_uuid(&uuid) {
            if record.is_fresh(current) {
                return Some(record);
            }
        }

        // Slow path: scan the containing directory for a row whose stored
        // segment_length satisfies this query per the equivalence in spec §4.5
        // step 4 / record::HashRecord::satisfies_segment_query.
        let dir = path.parent().unwrap_or(path);
        let candidates = self.store.query_by_directory_prefix(dir).ok()?;
        candidates
            .into_iter()
            .filter(|r| is_under_prefix(&r.directory_path, dir) && r.path == path)
            .find(|r| {
                HashRecord::satisfies_segment_query(r.segment_length, r.data_length, segment_length)
                    && r.is_fresh(current)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::Fingerprint;
    use crate::persist::InMemoryStore;

    fn record(path: &str, segment_length: u64, data_length: u64) -> HashRecord {
        let p = PathBuf::from(path);
        HashRecord {
            directory_path: p.parent().unwrap_or(&p).to_path_buf(),
            path: p,
            is_directory: false,
            segment_length,
            data_length,
            fingerprint: Fingerprint::of_bytes(path.as_bytes()),
            last_write_utc_ms: 100,
            hash_time_utc_ms: 100,
        }
    }

    fn fresh_stamp(len: u64) -> EntryStamp {
        EntryStamp {
            last_write_utc_ms: 100,
            len,
            is_directory: false,
        }
    }

    #[test]
    fn miss_then_upsert_then_hit() {
        let cache = Cache::new(Arc::new(InMemoryStore::new()), true, true);
        let path = Path::new("/root/a.bin");
        assert!(cache.get(path, false, 8192, &fresh_stamp(10)).is_none());

        cache.upsert(record("/root/a.bin", 8192, 10));
        let hit = cache.get(path, false, 8192, &fresh_stamp(10));
        assert!(hit.is_some());
    }

    #[test]
    fn stale_mtime_invalidates_mem_hit() {
        let cache = Cache::new(Arc::new(InMemoryStore::new()), true, true);
        cache.upsert(record("/root/a.bin", 8192, 10));

        let stale = EntryStamp {
            last_write_utc_ms: 200,
            len: 10,
            is_directory: false,
        };
        assert!(cache
            .get(Path::new("/root/a.bin"), false, 8192, &stale)
            .is_none());
    }

    #[test]
    fn negative_set_short_circuits_repeat_misses() {
        let cache = Cache::new(Arc::new(InMemoryStore::new()), true, true);
        let path = Path::new("/root/missing.bin");
        assert!(cache.get(path, false, 8192, &fresh_stamp(10)).is_none());
        // Second miss should hit the negative set rather than re-querying.
        assert!(cache.get(path, false, 8192, &fresh_stamp(10)).is_none());
    }

    #[test]
    fn whole_hash_row_satisfies_sampled_query_via_persistent_path() {
        let store = Arc::new(InMemoryStore::new());
        // A whole-hash row (segment_length=0) exists only in the persistent
        // tier; restrict_files_to_mem_cache=false allows the direct query.
        store.upsert(&record("/root/small.bin", 0, 100)).unwrap();
        let cache = Cache::new(store, true, false);

        let hit = cache.get(
            Path::new("/root/small.bin"),
            false,
            8192,
            &fresh_stamp(100),
        );
        assert!(hit.is_some());
        assert_eq!(hit.unwrap().segment_length, 0);
    }

    #[test]
    fn candidate_groups_filters_by_segment_length_and_drops_singletons() {
        let store = Arc::new(InMemoryStore::new());
        store.upsert(&record("/root/a", 8192, 10)).unwrap();
        let mut b = record("/root/b", 8192, 10);
        b.fingerprint = record("/root/a", 8192, 10).fingerprint;
        store.upsert(&b).unwrap();
        store.upsert(&record("/root/c", 16384, 10)).unwrap();

        let cache = Cache::new(store, true, true);
        let groups = cache.candidate_groups(8192, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn candidate_groups_includes_whole_hash_rows_of_small_files() {
        // Files small enough that segment_length=8192 would itself have
        // whole-hashed them are stored with segment_length=0 (invariant 3).
        // A phase-1 scan at 8192 must still pick them up (spec §8 S1).
        let store = Arc::new(InMemoryStore::new());
        let mut a = record("/root/a", 0, 10_000);
        a.fingerprint = Fingerprint::of_bytes(b"same content");
        store.upsert(&a).unwrap();
        let mut b = record("/root/b", 0, 10_000);
        b.fingerprint = Fingerprint::of_bytes(b"same content");
        store.upsert(&b).unwrap();

        let cache = Cache::new(store, true, true);
        let groups = cache.candidate_groups(8192, None);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].len(), 2);
    }

    #[test]
    fn candidate_groups_excludes_whole_hash_rows_of_large_files() {
        // A whole-hash row for a file too large for segment_length=8192 to
        // have whole-hashed must not be treated as satisfying that sample.
        let store = Arc::new(InMemoryStore::new());
        let mut a = record("/root/a", 0, 1_000_000);
        a.fingerprint = Fingerprint::of_bytes(b"same content");
        store.upsert(&a).unwrap();
        let mut b = record("/root/b", 0, 1_000_000);
        b.fingerprint = Fingerprint::of_bytes(b"same content");
        store.upsert(&b).unwrap();

        let cache = Cache::new(store, true, true);
        let groups = cache.candidate_groups(8192, None);
        assert!(groups.is_empty());
    }
}
