#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! `sled`-backed persistent store (C5's persistent tier, spec §6).
//!
//! Records are bincode-encoded under their derived `uuid` key. `sled` has no
//! secondary indices, so the prefix/hash queries scan the tree and filter in
//! process; acceptable at the scale this tool targets (one machine's
//! filesystem), and simpler than maintaining a hand-rolled reverse index.

use dupehash_core::persist::{is_under_prefix, PersistError, PersistResult, PersistentStore};
use dupehash_core::record::HashRecord;
use std::path::Path;
use tracing::warn;

pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    /// Open (creating if absent) a `sled` database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened (corrupt file,
    /// permission denied, already locked by another process).
    pub fn open(path: &Path) -> PersistResult<Self> {
        let db = sled::open(path).map_err(|e| PersistError::Backend(e.to_string()))?;
        Ok(Self { db })
    }

    fn all_records(&self) -> PersistResult<Vec<HashRecord>> {
        self.db
            .iter()
            .values()
            .map(|res| {
                let bytes = res.map_err(|e| PersistError::Backend(e.to_string()))?;
                bincode::deserialize(&bytes).map_err(|e| PersistError::Backend(e.to_string()))
            })
            .collect()
    }

    /// Number of persisted records and their total on-disk size, for `dh cache
    /// stats`.
    pub fn stats(&self) -> PersistResult<CacheStats> {
        Ok(CacheStats {
            record_count: self.db.len(),
            disk_bytes: self.db.size_on_disk().map_err(|e| PersistError::Backend(e.to_string()))?,
        })
    }

    /// Drop every persisted record, for `dh cache clear`.
    pub fn clear(&self) -> PersistResult<()> {
        self.db.clear().map_err(|e| PersistError::Backend(e.to_string()))?;
        self.db.flush().map_err(|e| PersistError::Backend(e.to_string()))?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub record_count: usize,
    pub disk_bytes: u64,
}

impl PersistentStore for SledStore {
    fn ensure_unique_index(&self, _field: &str) -> PersistResult<()> {
        // The uuid is already the primary key, so uniqueness is structural.
        Ok(())
    }

    fn get_by_uuid(&self, uuid: &str) -> PersistResult<Option<HashRecord>> {
        match self.db.get(uuid.as_bytes()) {
            Ok(Some(bytes)) => bincode::deserialize(&bytes)
                .map(Some)
                .map_err(|e| PersistError::Backend(e.to_string())),
            Ok(None) => Ok(None),
            Err(e) => Err(PersistError::Backend(e.to_string())),
        }
    }

    fn query_by_directory_prefix(&self, prefix: &Path) -> PersistResult<Vec<HashRecord>> {
        Ok(self
            .all_records()?
            .into_iter()
            .filter(|r| is_under_prefix(&r.directory_path, prefix))
            .collect())
    }

    fn query_by_hash(&self, prefix: Option<&Path>) -> PersistResult<Vec<HashRecord>> {
        Ok(self
            .all_records()?
            .into_iter()
            .filter(|r| match prefix {
                Some(p) => is_under_prefix(&r.path, p),
                None => true,
            })
            .collect())
    }

    fn upsert(&self, record: &HashRecord) -> PersistResult<()> {
        let bytes = bincode::serialize(record).map_err(|e| PersistError::Backend(e.to_string()))?;
        self.db
            .insert(record.uuid().as_bytes(), bytes)
            .map_err(|e| PersistError::Backend(e.to_string()))?;
        if let Err(err) = self.db.flush() {
            warn!(error = %err, "sled flush failed; record is durable only in the page cache");
        }
        Ok(())
    }
}
