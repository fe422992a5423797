//! Persistent-store seam (C5's persistent tier, spec §6 "Persistence interface").
//!
//! The concrete embedded key-value store is an external collaborator (spec §1);
//! `dupehash-store` supplies a `sled`-backed implementation. This module only
//! defines the trait and a small in-memory implementation used by tests and by
//! callers that want an ephemeral run with no disk footprint.

use crate::fingerprint::Fingerprint;
use crate::record::HashRecord;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

/// Errors from the persistent tier. Per spec §7, these are never fatal to the
/// caller — the cache treats any fault as a miss and continues hashing.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("{0}")]
    Backend(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// The abstract persistence interface (spec §6).
pub trait PersistentStore: Send + Sync {
    /// Ensure a unique index exists on `field` (idempotent).
    fn ensure_unique_index(&self, field: &str) -> PersistResult<()>;

    /// Look up a single record by its derived `uuid` (`"{segment_length};{path}"`).
    fn get_by_uuid(&self, uuid: &str) -> PersistResult<Option<HashRecord>>;

    /// All records whose `directory_path` equals `prefix` or is a descendant of
    /// it (spec §6: `directory_path == d OR directory_path startswith d + SEP`).
    fn query_by_directory_prefix(&self, prefix: &Path) -> PersistResult<Vec<HashRecord>>;

    /// All records sharing a fingerprint, keyed by an optional directory prefix
    /// (spec §4.6 phase 1's candidate query).
    fn query_by_hash(&self, prefix: Option<&Path>) -> PersistResult<Vec<HashRecord>>;

    /// Insert or replace a record, keyed by its `uuid`.
    fn upsert(&self, record: &HashRecord) -> PersistResult<()>;
}

/// In-memory reference implementation. Used by tests and by short-lived runs
/// that opt out of a persistent cache file entirely.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    rows: RwLock<HashMap<String, HashRecord>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistentStore for InMemoryStore {
    fn ensure_unique_index(&self, _field: &str) -> PersistResult<()> {
        Ok(())
    }

    fn get_by_uuid(&self, uuid: &str) -> PersistResult<Option<HashRecord>> {
        Ok(self.rows.read().unwrap().get(uuid).cloned())
    }

    fn query_by_directory_prefix(&self, prefix: &Path) -> PersistResult<Vec<HashRecord>> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .values()
            .filter(|r| is_under_prefix(&r.directory_path, prefix))
            .cloned()
            .collect())
    }

    fn query_by_hash(&self, prefix: Option<&Path>) -> PersistResult<Vec<HashRecord>> {
        let rows = self.rows.read().unwrap();
        Ok(rows
            .values()
            .filter(|r| match prefix {
                Some(p) => is_under_prefix(&r.path, p),
                None => true,
            })
            .cloned()
            .collect())
    }

    fn upsert(&self, record: &HashRecord) -> PersistResult<()> {
        self.rows
            .write()
            .unwrap()
            .insert(record.uuid(), record.clone());
        Ok(())
    }
}

/// `directory_path == prefix || directory_path.starts_with(prefix)` (spec §6).
#[must_use]
pub fn is_under_prefix(directory_path: &Path, prefix: &Path) -> bool {
    directory_path == prefix || directory_path.starts_with(prefix)
}

/// Group records by fingerprint, keeping only groups with at least two members
/// (spec §4.6 phase 1).
#[must_use]
pub fn group_by_fingerprint(records: Vec<HashRecord>) -> Vec<Vec<HashRecord>> {
    let mut groups: HashMap<Fingerprint, Vec<HashRecord>> = HashMap::new();
    for record in records {
        groups.entry(record.fingerprint).or_default().push(record);
    }
    groups
        .into_values()
        .filter(|group| group.len() >= 2)
        .collect()
}
