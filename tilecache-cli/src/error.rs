//! CLI error handling with user-friendly messages.

use std::fmt;
use std::process;
use tilecache::accessor::AccessorError;
use tilecache::cache::CacheError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to construct the HTTP accessor
    Accessor(AccessorError),
    /// Fetch through the cache failed
    Fetch(AccessorError),
    /// Failed to write the output file
    FileWrite { path: String, error: std::io::Error },
    /// Cache maintenance failed
    Cache(CacheError),
}

impl CliError {
    /// Exit the process with an error message and a non-zero code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        if let CliError::Fetch(AccessorError::Transport { .. }) = self {
            eprintln!();
            eprintln!("The upstream could not be reached and no cached copy exists.");
            eprintln!("A previously fetched URL would have been served from the cache.");
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Accessor(e) => write!(f, "Failed to create HTTP accessor: {}", e),
            CliError::Fetch(e) => write!(f, "Fetch failed: {}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write file '{}': {}", path, error)
            }
            CliError::Cache(e) => write!(f, "Cache operation failed: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Accessor(e) | CliError::Fetch(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            CliError::Cache(e) => Some(e),
        }
    }
}

impl From<CacheError> for CliError {
    fn from(e: CacheError) -> Self {
        CliError::Cache(e)
    }
}
