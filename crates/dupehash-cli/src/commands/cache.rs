//! `dh cache stats|clear`: introspect or clear the persistent store.

use crate::config::Config;
use anyhow::{Context, Result};
use dupehash_store::SledStore;

pub fn stats(config: &Config) -> Result<()> {
    let store = SledStore::open(&config.cache_path)
        .with_context(|| format!("opening cache at {}", config.cache_path.display()))?;
    let stats = store.stats()?;
    println!("records: {}", stats.record_count);
    println!("disk: {} bytes", stats.disk_bytes);
    Ok(())
}

pub fn clear(config: &Config) -> Result<()> {
    let store = SledStore::open(&config.cache_path)
        .with_context(|| format!("opening cache at {}", config.cache_path.display()))?;
    store.clear()?;
    println!("cache cleared at {}", config.cache_path.display());
    Ok(())
}
