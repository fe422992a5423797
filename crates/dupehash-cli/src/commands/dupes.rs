//! `dh dupes`: run the full duplicate-detection pipeline and print surviving
//! groups.

use crate::config::Config;
use anyhow::Result;
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct GroupOut {
    fingerprint: String,
    data_length: u64,
    paths: Vec<PathBuf>,
}

pub async fn run(config: &Config, root: &Path, prefix: Option<&Path>, json: bool) -> Result<()> {
    let (ctx, progress) = super::build_context(config, root)?;

    // Warm the cache first so phase 1 has candidates to group.
    dupehash_core::hash(root, config.initial_segment_length, ctx.clone()).await?;
    progress.finish();

    let groups = dupehash_core::find_duplicates(config.initial_segment_length, prefix, ctx).await;

    if json {
        let out: Vec<GroupOut> = groups
            .into_iter()
            .map(|g| GroupOut {
                fingerprint: g.fingerprint_hex,
                data_length: g.data_length,
                paths: g.paths,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else if groups.is_empty() {
        println!("no duplicates found under {}", root.display());
    } else {
        for group in &groups {
            println!("{} bytes, fingerprint {}:", group.data_length, group.fingerprint_hex);
            for path in &group.paths {
                println!("  {}", path.display());
            }
        }
    }
    Ok(())
}
