//! tilecache CLI - command-line interface
//!
//! Drives the tilecache library from the shell: fetch a URL through the
//! file cache, inspect the cache directory, or clear it.

use clap::{Parser, Subcommand};

mod commands;
mod error;

#[derive(Parser)]
#[command(name = "tilecache")]
#[command(about = "Disk-backed HTTP asset cache with conditional revalidation", version)]
struct Cli {
    /// Enable logging to ./logs and stdout (RUST_LOG controls verbosity)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a URL through the file cache
    Fetch(commands::fetch::FetchArgs),
    /// Cache management
    Cache {
        #[command(subcommand)]
        action: commands::cache::CacheAction,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let _logging_guard = if cli.verbose {
        match tilecache::logging::init_logging("logs", tilecache::logging::default_log_file()) {
            Ok(guard) => Some(guard),
            Err(error) => {
                eprintln!("Warning: failed to initialize logging: {}", error);
                None
            }
        }
    } else {
        None
    };

    let result = match cli.command {
        Command::Fetch(args) => commands::fetch::run(args).await,
        Command::Cache { action } => commands::cache::run(action),
    };

    if let Err(error) = result {
        error.exit();
    }
}
