#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod commands;
mod config;
mod logging;
mod profiler;
mod progress;

use anyhow::Result;
use clap::Parser;
use config::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dh")]
#[command(author, version, about = "Sampled-segment duplicate file and directory finder", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output where applicable
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Warm the cache for a tree without reporting duplicates
    Scan {
        /// Directory or file to scan
        path: PathBuf,

        /// Concurrent file I/O permits
        #[arg(long)]
        max_jobs: Option<usize>,

        /// Phase-1 candidate sample window in bytes
        #[arg(long)]
        segment_length: Option<u64>,

        /// Persistent cache location
        #[arg(long)]
        cache_path: Option<PathBuf>,
    },

    /// Find duplicate files and directories under a tree
    Dupes {
        /// Directory or file to scan
        path: PathBuf,

        /// Restrict duplicate search to this subtree of the cache
        #[arg(long)]
        prefix: Option<PathBuf>,

        /// Concurrent file I/O permits
        #[arg(long)]
        max_jobs: Option<usize>,

        /// Phase-1 candidate sample window in bytes
        #[arg(long)]
        segment_length: Option<u64>,

        /// Persistent cache location
        #[arg(long)]
        cache_path: Option<PathBuf>,
    },

    /// Inspect or clear the persistent cache
    Cache {
        #[command(subcommand)]
        cache_cmd: CacheCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
enum CacheCommands {
    /// Print record count and disk usage
    Stats {
        #[arg(long)]
        cache_path: Option<PathBuf>,
    },
    /// Remove every persisted record
    Clear {
        #[arg(long)]
        cache_path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    logging::init(cli.verbose, cli.json);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Commands::Scan {
            path,
            max_jobs,
            segment_length,
            cache_path,
        } => {
            let config = resolve_config(&cwd, &path, max_jobs, segment_length, cache_path, cli.verbose, cli.json);
            runtime.block_on(commands::scan::run(&config, &path))
        }
        Commands::Dupes {
            path,
            prefix,
            max_jobs,
            segment_length,
            cache_path,
        } => {
            let config = resolve_config(&cwd, &path, max_jobs, segment_length, cache_path, cli.verbose, cli.json);
            runtime.block_on(commands::dupes::run(&config, &path, prefix.as_deref(), cli.json))
        }
        Commands::Cache { cache_cmd } => match cache_cmd {
            CacheCommands::Stats { cache_path } => {
                let mut config = Config::load(&cwd).with_verbosity(cli.verbose).with_json_logs(cli.json);
                if let Some(path) = cache_path {
                    config.cache_path = path;
                }
                commands::cache::stats(&config)
            }
            CacheCommands::Clear { cache_path } => {
                let mut config = Config::load(&cwd).with_verbosity(cli.verbose).with_json_logs(cli.json);
                if let Some(path) = cache_path {
                    config.cache_path = path;
                }
                commands::cache::clear(&config)
            }
        },
    }
}

fn resolve_config(
    cwd: &std::path::Path,
    scan_root: &std::path::Path,
    max_jobs: Option<usize>,
    segment_length: Option<u64>,
    cache_path: Option<PathBuf>,
    verbosity: u8,
    json: bool,
) -> Config {
    let mut config = Config::load(scan_root)
        .with_verbosity(verbosity)
        .with_json_logs(json);
    config.cwd = cwd.to_path_buf();
    if let Some(max_jobs) = max_jobs {
        config.max_jobs = max_jobs;
    }
    if let Some(segment_length) = segment_length {
        config.initial_segment_length = segment_length;
    }
    if let Some(cache_path) = cache_path {
        config.cache_path = cache_path;
    }
    config
}
