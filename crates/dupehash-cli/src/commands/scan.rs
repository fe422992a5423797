//! `dh scan`: warm the cache for a tree without reporting duplicates.

use crate::config::Config;
use anyhow::Result;
use std::path::Path;

pub async fn run(config: &Config, root: &Path) -> Result<()> {
    let (ctx, progress) = super::build_context(config, root)?;
    let outcome = dupehash_core::hash(root, config.initial_segment_length, ctx).await?;
    progress.finish();

    match outcome {
        Some(outcome) => {
            println!(
                "scanned {} ({} bytes, fingerprint {})",
                root.display(),
                outcome.data_length,
                outcome.fingerprint.to_hex()
            );
        }
        None => {
            eprintln!("scan of {} produced no result (unreadable or cancelled)", root.display());
        }
    }
    Ok(())
}
