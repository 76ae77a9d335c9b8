// src/cli.rs

use clap::Parser;
use git_almanac::config::AnalysisConfig;
use git_almanac::model::Granularity;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the git repository to analyze
    pub repo: PathBuf,

    /// Directory for analysis_result.json and report.txt
    #[arg(short, long, default_value = "analysis_results")]
    pub output: PathBuf,

    /// Number of authors in the ranking
    #[arg(short, long)]
    pub top: Option<usize>,

    /// Bucket width of the commit frequency histogram
    #[arg(long, value_enum)]
    pub granularity: Option<Granularity>,

    /// Number of recent commits to list
    #[arg(long)]
    pub recent: Option<usize>,

    /// Most recent commits inspected for file change counts
    #[arg(long)]
    pub file_limit: Option<usize>,

    /// Target sample size for churn analysis
    #[arg(long)]
    pub churn_sample: Option<usize>,

    /// Target sample size for the complexity timeline
    #[arg(long)]
    pub complexity_sample: Option<usize>,

    /// File suffix to measure for complexity (repeatable, e.g. --ext .rs --ext .py)
    #[arg(long = "ext")]
    pub extensions: Vec<String>,

    /// Skip the complexity timeline
    #[arg(long)]
    pub no_complexity: bool,

    /// TOML config file (defaults to <REPO>/.git-almanac.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Write only analysis_result.json
    #[arg(long)]
    pub json_only: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Flags given on the command line override values from the config file
    pub fn apply(&self, config: &mut AnalysisConfig) {
        if let Some(top) = self.top {
            config.top_authors = top;
        }
        if let Some(granularity) = self.granularity {
            config.granularity = granularity;
        }
        if let Some(recent) = self.recent {
            config.recent_limit = recent;
        }
        if let Some(limit) = self.file_limit {
            config.file_stats_limit = limit;
        }
        if let Some(size) = self.churn_sample {
            config.churn_sample = size;
        }
        if let Some(size) = self.complexity_sample {
            config.complexity_sample = size;
        }
        if !self.extensions.is_empty() {
            config.complexity_extensions = self.extensions.clone();
        }
        if self.no_complexity {
            config.complexity = false;
        }
    }
}
