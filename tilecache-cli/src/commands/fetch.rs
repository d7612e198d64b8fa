//! Single-URL fetch through the file cache.

use crate::error::CliError;
use clap::Args;
use std::path::PathBuf;
use tilecache::accessor::{AssetAccessor, FileCacheAccessor, HttpAccessor};
use tilecache::config::{format_size, CacheConfig};
use tilecache::executor::DEFAULT_WORKER_COUNT;

/// Arguments for the `fetch` command.
#[derive(Debug, Args)]
pub struct FetchArgs {
    /// URL to fetch
    pub url: String,

    /// Cache directory (defaults to the user cache dir)
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Remote prefix stripped from URLs when deriving cache paths
    #[arg(long, default_value = "")]
    pub remote_prefix: String,

    /// Cache generation stamp; 0 disables the cache
    #[arg(long, default_value_t = 1)]
    pub generation: i64,

    /// Worker pool size
    #[arg(long, default_value_t = DEFAULT_WORKER_COUNT)]
    pub workers: usize,

    /// Write the response body to this file
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Run the fetch command.
pub async fn run(args: FetchArgs) -> Result<(), CliError> {
    let config = match &args.cache_dir {
        Some(dir) => CacheConfig::new(dir.clone()),
        None => CacheConfig::default(),
    }
    .with_remote_prefix(args.remote_prefix)
    .with_generation(args.generation)
    .with_workers(args.workers);

    let transport = HttpAccessor::new().map_err(CliError::Accessor)?;
    let cache = FileCacheAccessor::new(transport, config);

    let request = cache.get(&args.url, &[]).await.map_err(CliError::Fetch)?;
    let response = request.response();

    println!("{} {}", response.status(), request.url());
    if let Some(etag) = response.etag() {
        println!("etag: {}", etag);
    }

    match args.output {
        Some(path) => {
            std::fs::write(&path, response.data()).map_err(|error| CliError::FileWrite {
                path: path.display().to_string(),
                error,
            })?;
            println!(
                "wrote {} to {}",
                format_size(response.data().len() as u64),
                path.display()
            );
        }
        None => println!("{}", format_size(response.data().len() as u64)),
    }

    let stats = cache.stats();
    if stats.hits > 0 {
        println!("served from cache");
    } else if stats.revalidations > 0 {
        println!("revalidated (304)");
    } else if stats.offline_fallbacks > 0 {
        println!("served stale copy (upstream failed)");
    }

    Ok(())
}
