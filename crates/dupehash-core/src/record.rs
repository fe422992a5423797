//! `HashRecord`: the persisted row shape (spec §3).

use crate::fingerprint::Fingerprint;
use dupehash_util::fs::EntryStamp;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A persisted fingerprint for one filesystem entry at one sampling level.
///
/// `uuid = "{segment_length};{path}"` is the derived primary key (spec §3,
/// invariant 1): `(segment_length, path)` uniquely identifies a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashRecord {
    pub path: PathBuf,
    pub directory_path: PathBuf,
    pub is_directory: bool,
    /// 0 means the fingerprint covers the whole file (spec invariant 3).
    pub segment_length: u64,
    pub data_length: u64,
    #[serde(with = "fingerprint_bytes")]
    pub fingerprint: Fingerprint,
    pub last_write_utc_ms: u64,
    pub hash_time_utc_ms: u64,
}

impl HashRecord {
    /// The derived primary key, spec §3: `"{segment_length};{path}"`.
    #[must_use]
    pub fn uuid(&self) -> String {
        uuid_for(self.segment_length, &self.path)
    }

    /// Whether this record is still valid for `path` given its current
    /// filesystem state (spec §3 "Lifecycle" and testable property 4).
    ///
    /// A record is stale if the entry's kind changed, its modification time now
    /// exceeds the time recorded at hash time, or (for files) its length
    /// changed.
    #[must_use]
    pub fn is_fresh(&self, current: &EntryStamp) -> bool {
        if current.is_directory != self.is_directory {
            return false;
        }
        if current.last_write_utc_ms > self.last_write_utc_ms {
            return false;
        }
        if !self.is_directory && current.len != self.data_length {
            return false;
        }
        true
    }

    /// Whether a stored record at `stored_segment_length` satisfies a query for
    /// `requested_segment_length`, per spec §4.5 step 4's equivalence (OQ3): a
    /// whole-hash row (`stored_segment_length == 0`) satisfies a sampled query
    /// only for a file small enough that the query would itself have
    /// whole-hashed (`data_length <= 2 * requested_segment_length`), and a row
    /// whose sampling already covered the whole file
    /// (`data_length <= 2 * stored_segment_length`) satisfies any other query.
    /// Without the first bound, a whole-hash row of a large file would answer
    /// a narrow sampled query with the wrong digest (property 1).
    #[must_use]
    pub fn satisfies_segment_query(
        stored_segment_length: u64,
        data_length: u64,
        requested_segment_length: u64,
    ) -> bool {
        if stored_segment_length == requested_segment_length {
            return true;
        }
        if stored_segment_length == 0 {
            return data_length <= 2 * requested_segment_length;
        }
        data_length <= 2 * stored_segment_length
    }
}

/// Derive the `(segment_length, path)` primary key used throughout C5.
#[must_use]
pub fn uuid_for(segment_length: u64, path: &Path) -> String {
    format!("{segment_length};{}", path.display())
}

mod fingerprint_bytes {
    use crate::fingerprint::{Fingerprint, FINGERPRINT_LEN};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    // `[u8; 64]` has no built-in serde impl (serde only special-cases arrays up
    // to length 32), so round-trip through a `Vec<u8>` instead.
    pub fn serialize<S: Serializer>(fp: &Fingerprint, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_bytes(fp.as_bytes())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Fingerprint, D::Error> {
        let bytes: Vec<u8> = Deserialize::deserialize(d)?;
        let array: [u8; FINGERPRINT_LEN] = bytes
            .try_into()
            .map_err(|_| D::Error::custom("fingerprint must be exactly 64 bytes"))?;
        Ok(Fingerprint::from_bytes(array))
    }
}
