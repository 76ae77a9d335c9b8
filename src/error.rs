// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a run before or outside of aggregation
#[derive(Error, Debug)]
pub enum AlmanacError {
    #[error("path does not exist: {}", .0.display())]
    RepositoryNotFound(PathBuf),

    #[error("not a valid git repository: {}", .0.display())]
    NotAGitRepository(PathBuf),

    #[error("git error: {0}")]
    Git(#[from] git2::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AlmanacError>;
