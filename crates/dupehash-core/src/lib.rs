#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Sampled-segment content fingerprinting and duplicate-detection engine.
//!
//! Fingerprints files and directories by hashing three fixed windows of each
//! file instead of its full contents ([`hasher`]), aggregates directories from
//! their children's fingerprints ([`directory`]), schedules the walk with
//! bounded concurrency ([`scheduler`]), caches results across runs behind an
//! external persistent store ([`cache`], [`persist`]), and turns cached
//! fingerprints into verified duplicate groups through successive re-hashing
//! rounds ([`duplicate`]).
//!
//! Concrete `.dupeignore` parsing ([`ignore::IgnoreFilter`]), persistent
//! storage ([`persist::PersistentStore`]) and progress rendering
//! ([`progress::ProgressSink`]) are external collaborators; this crate only
//! defines the seams and the default/test doubles.

pub mod buffer_pool;
pub mod cache;
pub mod directory;
pub mod duplicate;
pub mod error;
pub mod fingerprint;
pub mod hasher;
pub mod ignore;
pub mod persist;
pub mod profiler;
pub mod progress;
pub mod record;
pub mod scheduler;

pub use cache::Cache;
pub use duplicate::{find_duplicates, DuplicateGroup};
pub use error::{Error, Result};
pub use fingerprint::Fingerprint;
pub use ignore::IgnoreFilter;
pub use persist::{InMemoryStore, PersistentStore};
pub use profiler::Profiler;
pub use progress::ProgressSink;
pub use record::HashRecord;
pub use scheduler::{hash, HashContext, HashOutcome};

/// Default sample window size in bytes for the phase-1 candidate scan (spec §6).
pub const DEFAULT_INITIAL_SEGMENT_LENGTH: u64 = 8192;
