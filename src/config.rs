// src/config.rs

use crate::bugfix::DEFAULT_KEYWORDS;
use crate::error::{AlmanacError, Result};
use crate::model::Granularity;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File looked up in the repository root when no `--config` is given
pub const CONFIG_FILE_NAME: &str = ".git-almanac.toml";

/// Tunables for one analysis run
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Bucket width of the commit frequency histogram
    pub granularity: Granularity,

    /// Number of authors in the ranking
    pub top_authors: usize,

    /// Number of commits listed as recent
    pub recent_limit: usize,

    /// Most recent commits inspected for file change counts
    pub file_stats_limit: usize,

    /// Target sample size for churn analysis
    pub churn_sample: usize,

    /// Enable the complexity timeline
    pub complexity: bool,

    /// Target sample size for complexity analysis
    pub complexity_sample: usize,

    /// File suffixes handed to the metrics provider
    pub complexity_extensions: Vec<String>,

    /// Substrings that mark a commit message as a bug fix
    pub bug_keywords: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Month,
            top_authors: 10,
            recent_limit: 10,
            file_stats_limit: 500,
            churn_sample: 100,
            complexity: true,
            complexity_sample: 30,
            complexity_extensions: vec![".py".to_string()],
            bug_keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl AnalysisConfig {
    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| AlmanacError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `explicit` if given, else `<repo>/.git-almanac.toml` if present,
    /// else defaults.
    pub fn load(repo: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path: PathBuf = match explicit {
            Some(p) => p.to_path_buf(),
            None => {
                let candidate = repo.join(CONFIG_FILE_NAME);
                if !candidate.is_file() {
                    debug!("No {} in {}, using defaults", CONFIG_FILE_NAME, repo.display());
                    return Ok(Self::default());
                }
                candidate
            }
        };
        debug!("Loading config from {}", path.display());
        Self::from_file(&path)
    }
}
