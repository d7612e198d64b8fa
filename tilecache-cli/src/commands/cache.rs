//! Cache management CLI commands.

use crate::error::CliError;
use clap::Subcommand;
use std::path::PathBuf;
use tilecache::cache::{cache_stats, clear_cache};
use tilecache::config::{format_size, CacheConfig};

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Show cache directory statistics
    Stats {
        /// Cache directory (defaults to the user cache dir)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
    /// Clear the cache, removing all records
    Clear {
        /// Cache directory (defaults to the user cache dir)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
    },
}

/// Run a cache subcommand.
pub fn run(action: CacheAction) -> Result<(), CliError> {
    match action {
        CacheAction::Stats { cache_dir } => {
            let root = resolve_root(cache_dir);
            let (files, bytes) = cache_stats(&root)?;
            println!("Cache: {}", root.display());
            println!("  Files: {}", files);
            println!("  Size:  {}", format_size(bytes));
            Ok(())
        }
        CacheAction::Clear { cache_dir } => {
            let root = resolve_root(cache_dir);
            println!("Clearing cache at: {}", root.display());
            let result = clear_cache(&root)?;
            println!(
                "Deleted {} files, freed {}",
                result.files_deleted,
                format_size(result.bytes_freed)
            );
            Ok(())
        }
    }
}

fn resolve_root(cache_dir: Option<PathBuf>) -> PathBuf {
    cache_dir.unwrap_or_else(|| CacheConfig::default().local_root)
}
