// src/pipeline.rs

use crate::aggregate::HistoryAggregator;
use crate::bugfix::BugClassifier;
use crate::churn::ChurnAnalyzer;
use crate::complexity::{default_provider, ComplexityTimeline, ComplexityTrendSampler, MetricsProvider};
use crate::config::AnalysisConfig;
use crate::contributors::ContributorLifecycleTracker;
use crate::error::Result;
use crate::history::{stride_sample, History};
use crate::report::{FullReport, Metadata};
use crate::source::{CommitSource, GitSource};
use crate::velocity;
use chrono::Local;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Runs every analysis over one repository
pub struct Pipeline {
    config: AnalysisConfig,
    provider: Option<Box<dyn MetricsProvider>>,
}

impl Pipeline {
    pub fn new(config: AnalysisConfig, provider: Option<Box<dyn MetricsProvider>>) -> Self {
        Self { config, provider }
    }

    /// A pipeline using the metrics provider compiled into this build
    pub fn with_default_provider(config: AnalysisConfig) -> Self {
        Self::new(config, default_provider())
    }

    pub fn run<S>(&self, source: &S, repo_path: &Path) -> Result<FullReport>
    where
        S: CommitSource + ?Sized,
    {
        let config = &self.config;
        let classifier = BugClassifier::new(&config.bug_keywords);

        info!("Reading commit history of {}", repo_path.display());
        let commits = source.commits()?;

        // file stats, churn and bug-fix attribution share one diff per commit
        let churn_picks: HashSet<usize> = stride_sample(commits.len(), config.churn_sample).into_iter().collect();
        let history = History::capture_commits(source, commits, |idx, commit| {
            idx < config.file_stats_limit || churn_picks.contains(&idx) || classifier.is_bug_fix(&commit.message)
        });

        info!("Aggregating {} commits", history.len());
        let aggregator = HistoryAggregator::new(&history);
        let ((basic_stats, author_ranking, commit_frequency, recent_commits, file_changes), (bug_fixes, (churn, (velocity, contributors)))) =
            rayon::join(
                || {
                    (
                        aggregator.basic_stats(),
                        aggregator.author_ranking(config.top_authors),
                        aggregator.commit_frequency(config.granularity),
                        aggregator.recent_commits(config.recent_limit),
                        aggregator.file_change_stats(config.file_stats_limit),
                    )
                },
                || {
                    rayon::join(
                        || classifier.analyze(&history),
                        || {
                            rayon::join(
                                || ChurnAnalyzer::new(&history, config.churn_sample).analyze(),
                                || {
                                    rayon::join(
                                        || velocity::analyze(&history),
                                        || ContributorLifecycleTracker::new(&history).analyze(),
                                    )
                                },
                            )
                        },
                    )
                },
            );

        let complexity = if config.complexity {
            ComplexityTrendSampler::new(
                self.provider.as_deref(),
                &config.complexity_extensions,
                config.complexity_sample,
            )
            .sample(source, history.commits())
        } else {
            ComplexityTimeline::unavailable("disabled")
        };

        Ok(FullReport {
            metadata: Metadata {
                repo_path: repo_path.display().to_string(),
                generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                tool: format!("git-almanac {}", env!("CARGO_PKG_VERSION")),
                total_commits: history.len(),
            },
            basic_stats,
            author_ranking,
            commit_frequency,
            recent_commits,
            file_changes,
            bug_fixes,
            churn,
            velocity,
            contributors,
            complexity,
        })
    }
}

/// Opens the repository at `path` and runs the full analysis
pub fn analyze_repository(path: &Path, config: AnalysisConfig) -> Result<FullReport> {
    let source = GitSource::open(path)?;
    Pipeline::with_default_provider(config).run(&source, source.path())
}
