pub mod cache;
pub mod dupes;
pub mod scan;

use crate::config::Config;
use crate::progress::BarProgressSink;
use anyhow::{Context, Result};
use dupehash_core::scheduler::HashContext;
use dupehash_core::Cache;
use dupehash_ignore::DupeIgnore;
use dupehash_store::SledStore;
use std::path::Path;
use std::sync::Arc;

/// Build the shared engine context used by `scan` and `dupes`: a persistent
/// store at `config.cache_path`, the `.dupeignore` matcher rooted at `root`,
/// and an `indicatif` progress sink.
pub fn build_context(config: &Config, root: &Path) -> Result<(Arc<HashContext>, Arc<BarProgressSink>)> {
    let store = SledStore::open(&config.cache_path)
        .with_context(|| format!("opening cache at {}", config.cache_path.display()))?;
    let cache = Arc::new(Cache::new(
        Arc::new(store),
        config.precache_directories,
        config.restrict_files_to_mem_cache,
    ));
    let ignore = Arc::new(DupeIgnore::load(root));
    let progress = Arc::new(BarProgressSink::new());

    let ctx = Arc::new(
        HashContext::new(cache)
            .with_max_concurrent_io(config.max_jobs)
            .with_ignore(ignore)
            .with_progress(progress.clone())
            .with_profiler(Arc::new(crate::profiler::TracingProfiler)),
    );
    Ok((ctx, progress))
}
