// src/complexity.rs

use crate::history::stride_sample;
use crate::model::*;
use crate::source::CommitSource;
use indicatif::ProgressBar;
use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),

    #[error("could not analyze {path}: {message}")]
    Analysis { path: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionMetrics {
    pub name: String,
    pub complexity: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FileMetrics {
    pub functions: Vec<FunctionMetrics>,
    pub line_count: usize,
}

/// Static code metrics for a single file
pub trait MetricsProvider: Send + Sync {
    fn analyze(&self, path: &str, content: &str) -> Result<FileMetrics, MetricsError>;
}

/// The provider compiled into this build, if any
pub fn default_provider() -> Option<Box<dyn MetricsProvider>> {
    #[cfg(feature = "syntax-metrics")]
    {
        Some(Box::new(crate::metrics::SyntaxMetrics))
    }
    #[cfg(not(feature = "syntax-metrics"))]
    {
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplexityPoint {
    pub hash: String,
    pub date: String,
    pub avg_complexity: f64,
    pub total_loc: usize,
    pub file_count: usize,
    pub function_count: usize,
    pub complexity_per_loc: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ComplexityTimeline {
    Available {
        points: Vec<ComplexityPoint>,
        skipped: Vec<SkippedItem>,
    },
    Unavailable {
        reason: String,
    },
}

impl ComplexityTimeline {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable { reason: reason.into() }
    }
}

#[derive(Default)]
struct Totals {
    complexity: u64,
    functions: usize,
    lines: usize,
    files: usize,
}

/// Samples commit trees and tracks complexity over time
pub struct ComplexityTrendSampler<'a> {
    provider: Option<&'a dyn MetricsProvider>,
    extensions: Vec<String>,
    sample_size: usize,
}

impl<'a> ComplexityTrendSampler<'a> {
    pub fn new(provider: Option<&'a dyn MetricsProvider>, extensions: &[String], sample_size: usize) -> Self {
        Self {
            provider,
            extensions: extensions.to_vec(),
            sample_size,
        }
    }

    fn wanted(&self, path: &str) -> bool {
        self.extensions.iter().any(|ext| path.ends_with(ext.as_str()))
    }

    pub fn sample<S>(&self, source: &S, commits: &[CommitRecord]) -> ComplexityTimeline
    where
        S: CommitSource + ?Sized,
    {
        let Some(provider) = self.provider else {
            return ComplexityTimeline::unavailable("no complexity metrics provider in this build");
        };

        let picked = stride_sample(commits.len(), self.sample_size);
        let bar = ProgressBar::new(picked.len() as u64);
        bar.set_message("Measuring complexity");

        let mut points = Vec::new();
        let mut skipped = Vec::new();
        for idx in picked {
            let commit = &commits[idx];
            match self.measure(provider, source, commit, &mut skipped) {
                Inspection::Analyzed(totals) => points.push((commit.timestamp, point(commit, &totals))),
                Inspection::Skipped(reason) => {
                    debug!("complexity: skipping {}: {reason}", commit.short_id());
                    skipped.push(SkippedItem { commit: commit.short_id().to_string(), path: None, reason });
                }
            }
            bar.inc(1);
        }
        bar.finish_and_clear();

        points.sort_by_key(|(ts, _)| *ts);
        info!("Complexity timeline has {} points", points.len());
        ComplexityTimeline::Available {
            points: points.into_iter().map(|(_, p)| p).collect(),
            skipped,
        }
    }

    fn measure<S>(
        &self,
        provider: &dyn MetricsProvider,
        source: &S,
        commit: &CommitRecord,
        skipped: &mut Vec<SkippedItem>,
    ) -> Inspection<Totals>
    where
        S: CommitSource + ?Sized,
    {
        let blobs = match source.tree(commit, &|p: &str| self.wanted(p)) {
            Ok(blobs) => blobs,
            Err(e) => return Inspection::Skipped(SkipReason::TreeFailed(e.to_string())),
        };

        let results: Vec<(String, Inspection<FileMetrics>)> = blobs
            .into_par_iter()
            .map(|blob| {
                let outcome = match blob.content {
                    Inspection::Analyzed(bytes) => {
                        let text = String::from_utf8_lossy(&bytes);
                        match provider.analyze(&blob.path, &text) {
                            Ok(metrics) => Inspection::Analyzed(metrics),
                            Err(e) => Inspection::Skipped(SkipReason::AnalysisFailed(e.to_string())),
                        }
                    }
                    Inspection::Skipped(reason) => Inspection::Skipped(reason),
                };
                (blob.path, outcome)
            })
            .collect();

        let mut totals = Totals::default();
        for (path, outcome) in results {
            match outcome {
                Inspection::Analyzed(metrics) => {
                    totals.complexity += metrics.functions.iter().map(|f| u64::from(f.complexity)).sum::<u64>();
                    totals.functions += metrics.functions.len();
                    totals.lines += metrics.line_count;
                    totals.files += 1;
                }
                Inspection::Skipped(reason) => skipped.push(SkippedItem {
                    commit: commit.short_id().to_string(),
                    path: Some(path),
                    reason,
                }),
            }
        }

        if totals.files == 0 {
            return Inspection::Skipped(SkipReason::NoMatchingFiles);
        }
        Inspection::Analyzed(totals)
    }
}

fn point(commit: &CommitRecord, totals: &Totals) -> ComplexityPoint {
    ComplexityPoint {
        hash: commit.short_id().to_string(),
        date: commit.timestamp.format("%Y-%m-%d").to_string(),
        avg_complexity: round_to(totals.complexity as f64 / totals.functions.max(1) as f64, 2),
        total_loc: totals.lines,
        file_count: totals.files,
        function_count: totals.functions,
        complexity_per_loc: round_to(totals.complexity as f64 / totals.lines.max(1) as f64 * 100.0, 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    /// One function per non-empty line, complexity = line length
    struct LineMetrics;

    impl MetricsProvider for LineMetrics {
        fn analyze(&self, path: &str, content: &str) -> Result<FileMetrics, MetricsError> {
            if content.contains("BROKEN") {
                return Err(MetricsError::Analysis { path: path.into(), message: "bad input".into() });
            }
            let functions: Vec<_> = content
                .lines()
                .filter(|l| !l.is_empty())
                .map(|l| FunctionMetrics { name: l.into(), complexity: l.len() as u32 })
                .collect();
            Ok(FileMetrics { line_count: functions.len(), functions })
        }
    }

    fn py() -> Vec<String> {
        vec![".py".to_string()]
    }

    #[test]
    fn missing_provider_is_unavailable() {
        let source = MemorySource::default();
        let timeline = ComplexityTrendSampler::new(None, &py(), 30).sample(&source, &[]);
        assert!(matches!(timeline, ComplexityTimeline::Unavailable { .. }));
    }

    #[test]
    fn aggregates_matching_files_per_commit() {
        let commits = linear(&[
            ("A", "2024-02-01T00:00:00+00:00", "two"),
            ("A", "2024-01-01T00:00:00+00:00", "one"),
        ]);
        let source = MemorySource::new(commits.clone())
            .with_tree(&commits[0], &[("a.py", "aa\nbbbb\n"), ("b.py", "cccccc\n"), ("notes.md", "zzzzzzzz\n")])
            .with_tree(&commits[1], &[("a.py", "aa\n")]);
        let provider = LineMetrics;

        let timeline = ComplexityTrendSampler::new(Some(&provider), &py(), 30).sample(&source, &commits);
        let ComplexityTimeline::Available { points, skipped } = timeline else {
            panic!("expected available timeline");
        };
        assert!(skipped.is_empty());
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, "2024-01-01");

        let latest = &points[1];
        assert_eq!(latest.file_count, 2);
        assert_eq!(latest.function_count, 3);
        assert_eq!(latest.total_loc, 3);
        assert_eq!(latest.avg_complexity, 4.0);
        assert_eq!(latest.complexity_per_loc, 400.0);
    }

    #[test]
    fn commit_with_only_failing_files_is_omitted() {
        let commits = linear(&[
            ("A", "2024-02-01T00:00:00+00:00", "two"),
            ("A", "2024-01-01T00:00:00+00:00", "one"),
        ]);
        let source = MemorySource::new(commits.clone())
            .with_tree(&commits[0], &[("a.py", "BROKEN\n")])
            .with_tree(&commits[1], &[("README", "text\n")]);
        let provider = LineMetrics;

        let timeline = ComplexityTrendSampler::new(Some(&provider), &py(), 30).sample(&source, &commits);
        let ComplexityTimeline::Available { points, skipped } = timeline else {
            panic!("expected available timeline");
        };
        assert!(points.is_empty());
        assert!(skipped.iter().any(|s| matches!(s.reason, SkipReason::AnalysisFailed(_)) && s.path.as_deref() == Some("a.py")));
        assert_eq!(skipped.iter().filter(|s| s.reason == SkipReason::NoMatchingFiles).count(), 2);
    }

    #[test]
    fn tree_failure_skips_commit() {
        let commits = linear(&[("A", "2024-01-01T00:00:00+00:00", "one")]);
        let source = MemorySource::new(commits.clone());
        let provider = LineMetrics;
        let timeline = ComplexityTrendSampler::new(Some(&provider), &py(), 30).sample(&source, &commits);
        let ComplexityTimeline::Available { points, skipped } = timeline else {
            panic!("expected available timeline");
        };
        assert!(points.is_empty());
        assert!(matches!(skipped[0].reason, SkipReason::TreeFailed(_)));
    }
}
