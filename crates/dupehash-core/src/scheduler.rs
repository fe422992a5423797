//! Hash scheduler (C4): walks a tree and fingerprints it, one `tokio::task` per
//! entry, bounded by a global semaphore over file I/O (spec §4.4, §5, §9).
//!
//! A directory holds a permit only for the span of its own enumeration; it
//! releases it before fanning its children out as independent tasks and
//! awaiting them, so a wide fan-out never holds more than one permit per
//! in-flight file read (spec §5: "the semaphore bounds concurrent file I/O,
//! not concurrent tasks"). Every entry checks `cancel.is_cancelled()` before
//! each await point and bails out with `None` rather than propagating an
//! error — per-entry failure (transient I/O, permission denied, a vanished
//! path) is swallowed here and simply excluded from the parent's aggregate
//! (spec §7, OQ2).

use crate::buffer_pool::BufferPool;
use crate::cache::Cache;
use crate::directory::{self, ChildOutcome};
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::hasher;
use crate::ignore::{IgnoreFilter, NoIgnore};
use crate::profiler::{NullProfiler, Profiler};
use crate::progress::{NullProgressSink, ProgressSink};
use crate::record::HashRecord;
use dupehash_util::fs::EntryStamp;
use dupehash_util::time::now_millis;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default bound on concurrent file I/O (spec §4.4, §6).
pub const DEFAULT_MAX_CONCURRENT_IO: usize = 32;

/// Collaborators and shared state threaded through every task in one scan.
pub struct HashContext {
    pub semaphore: Arc<Semaphore>,
    pub cache: Arc<Cache>,
    pub ignore: Arc<dyn IgnoreFilter>,
    pub progress: Arc<dyn ProgressSink>,
    pub profiler: Arc<dyn Profiler>,
    pub buffer_pool: BufferPool,
    pub cancel: CancellationToken,
}

impl HashContext {
    #[must_use]
    pub fn new(cache: Arc<Cache>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(DEFAULT_MAX_CONCURRENT_IO)),
            cache,
            ignore: Arc::new(NoIgnore),
            progress: Arc::new(NullProgressSink),
            profiler: Arc::new(NullProfiler),
            buffer_pool: BufferPool::default(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_max_concurrent_io(mut self, permits: usize) -> Self {
        self.semaphore = Arc::new(Semaphore::new(permits.max(1)));
        self
    }

    #[must_use]
    pub fn with_ignore(mut self, ignore: Arc<dyn IgnoreFilter>) -> Self {
        self.ignore = ignore;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    #[must_use]
    pub fn with_profiler(mut self, profiler: Arc<dyn Profiler>) -> Self {
        self.profiler = profiler;
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Outcome of fingerprinting one filesystem entry.
#[derive(Debug, Clone, Copy)]
pub struct HashOutcome {
    pub fingerprint: Fingerprint,
    pub data_length: u64,
    pub is_directory: bool,
}

/// Fingerprint `root` at `segment_length` (0 forces whole-file hashing
/// everywhere). Returns `Ok(None)` if `root` vanished, was unreadable, or the
/// scan was cancelled before producing a result; `Err` only for a failure to
/// resolve `root` itself.
pub async fn hash(
    root: &Path,
    segment_length: u64,
    ctx: Arc<HashContext>,
) -> Result<Option<HashOutcome>> {
    let canonical = dupehash_util::fs::canonicalize(root).map_err(|e| Error::io(root, e))?;
    Ok(hash_entry(canonical, segment_length, ctx, true).await)
}

fn hash_entry(
    path: PathBuf,
    segment_length: u64,
    ctx: Arc<HashContext>,
    is_root: bool,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Option<HashOutcome>> + Send>> {
    Box::pin(async move {
        if ctx.cancel.is_cancelled() {
            return None;
        }

        let stamp = match EntryStamp::read(&path) {
            Ok(stamp) => stamp,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "entry vanished or unreadable; omitting");
                return None;
            }
        };

        if let Some(record) = ctx.cache.get(&path, stamp.is_directory, segment_length, &stamp) {
            ctx.progress.add_to_read(record.data_length);
            return Some(HashOutcome {
                fingerprint: record.fingerprint,
                data_length: record.data_length,
                is_directory: record.is_directory,
            });
        }

        if stamp.is_directory {
            hash_directory(path, stamp, segment_length, ctx, is_root).await
        } else {
            hash_file(path, stamp, segment_length, ctx, is_root).await
        }
    })
}

async fn hash_directory(
    path: PathBuf,
    stamp: EntryStamp,
    segment_length: u64,
    ctx: Arc<HashContext>,
    is_root: bool,
) -> Option<HashOutcome> {
    if ctx.cancel.is_cancelled() {
        return None;
    }

    let permit = ctx.semaphore.clone().acquire_owned().await.ok()?;
    let children = match list_children(&path).await {
        Ok(children) => children,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to enumerate directory; omitting");
            return None;
        }
    };
    drop(permit);

    if ctx.cancel.is_cancelled() {
        return None;
    }

    let mut joinset = tokio::task::JoinSet::new();
    for child in children {
        if ctx.ignore.is_ignored(&child) {
            debug!(path = %child.display(), "ignored by .dupeignore");
            continue;
        }
        let ctx = ctx.clone();
        joinset.spawn(async move { hash_entry(child, segment_length, ctx, false).await });
    }

    let mut outcomes = Vec::new();
    while let Some(joined) = joinset.join_next().await {
        match joined {
            Ok(Some(outcome)) => outcomes.push(ChildOutcome {
                fingerprint: outcome.fingerprint,
                data_length: outcome.data_length,
            }),
            Ok(None) => {}
            Err(err) => warn!(error = %err, "child hash task panicked; omitting"),
        }
    }

    if ctx.cancel.is_cancelled() {
        return None;
    }

    let (fingerprint, data_length) = directory::aggregate(&outcomes);
    let record = HashRecord {
        directory_path: directory_path_of(&path, is_root),
        path: path.clone(),
        is_directory: true,
        segment_length,
        data_length,
        fingerprint,
        last_write_utc_ms: stamp.last_write_utc_ms,
        hash_time_utc_ms: now_millis(),
    };
    ctx.cache.upsert(record);

    Some(HashOutcome {
        fingerprint,
        data_length,
        is_directory: true,
    })
}

async fn hash_file(
    path: PathBuf,
    stamp: EntryStamp,
    segment_length: u64,
    ctx: Arc<HashContext>,
    is_root: bool,
) -> Option<HashOutcome> {
    if ctx.cancel.is_cancelled() {
        return None;
    }

    let permit = ctx.semaphore.clone().acquire_owned().await.ok()?;
    let started = std::time::Instant::now();

    let mut file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) => {
            drop(permit);
            warn!(path = %path.display(), error = %err, "failed to open file; omitting");
            return None;
        }
    };

    let result = hasher::hash_stream(
        &mut file,
        stamp.len,
        segment_length,
        &ctx.buffer_pool,
        ctx.progress.as_ref(),
        &ctx.cancel,
    )
    .await;
    drop(permit);
    ctx.profiler.record("hash_file", started.elapsed());

    let sampled = match result {
        Ok(sampled) => sampled,
        Err(err) => {
            if err.kind() != std::io::ErrorKind::Interrupted {
                warn!(path = %path.display(), error = %err, "failed to hash file; omitting");
            }
            return None;
        }
    };

    let record = HashRecord {
        directory_path: directory_path_of(&path, is_root),
        path: path.clone(),
        is_directory: false,
        segment_length: sampled.segment_length,
        data_length: stamp.len,
        fingerprint: sampled.fingerprint,
        last_write_utc_ms: stamp.last_write_utc_ms,
        hash_time_utc_ms: now_millis(),
    };
    ctx.cache.upsert(record);

    Some(HashOutcome {
        fingerprint: sampled.fingerprint,
        data_length: stamp.len,
        is_directory: false,
    })
}

/// `directory_path` is empty for the scan root, and the containing directory
/// for everything beneath it (spec §3, §6).
fn directory_path_of(path: &Path, is_root: bool) -> PathBuf {
    if is_root {
        PathBuf::new()
    } else {
        path.parent().map(Path::to_path_buf).unwrap_or_default()
    }
}

/// List a directory's immediate children, skipping symlinks to avoid cycles
/// (spec §9's guidance; the spec's data model has no notion of a symlink entry).
async fn list_children(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut children = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let file_type = entry.file_type().await?;
        if file_type.is_symlink() {
            continue;
        }
        children.push(entry.path());
    }
    Ok(children)
}
