//! Runtime configuration (spec §6's defaults, mirroring `fastnode_core::Config`).
//!
//! Loaded from an optional `dupehash.toml` at the scanned root, then
//! overridden by whatever CLI flags the caller passed; `Default` supplies
//! the spec's literal defaults so a bare invocation needs no config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cwd: PathBuf,
    pub json_logs: bool,
    pub verbosity: u8,

    /// Concurrent file I/O permits (spec §4.4, §6 default 32).
    pub max_jobs: usize,
    /// Phase-1 candidate sample window in bytes (spec §6 default 8192).
    pub initial_segment_length: u64,
    /// Where the persistent store lives on disk.
    pub cache_path: PathBuf,
    /// Bulk-load a directory's descendants into memory on first file miss
    /// under it (spec §4.5).
    pub precache_directories: bool,
    /// Disable the direct single-file persistent-store query on a file miss,
    /// relying only on the pre-cache pass (spec §4.5).
    pub restrict_files_to_mem_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
            max_jobs: dupehash_core::scheduler::DEFAULT_MAX_CONCURRENT_IO,
            initial_segment_length: dupehash_core::DEFAULT_INITIAL_SEGMENT_LENGTH,
            cache_path: PathBuf::from("Cache.db"),
            precache_directories: true,
            restrict_files_to_mem_cache: true,
        }
    }
}

impl Config {
    /// Load `dupehash.toml` from `root` if present, falling back to defaults.
    #[must_use]
    pub fn load(root: &Path) -> Self {
        let path = root.join("dupehash.toml");
        let Ok(text) = std::fs::read_to_string(&path) else {
            return Self::default();
        };
        toml::from_str(&text).unwrap_or_else(|err| {
            tracing::warn!(path = %path.display(), error = %err, "failed to parse dupehash.toml; using defaults");
            Self::default()
        })
    }

    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}
