// src/churn.rs

use crate::history::{stride_sample, History};
use crate::model::*;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{debug, info};

const TOP_FILES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChurnPoint {
    pub hash: String,
    pub date: String,
    pub additions: usize,
    pub deletions: usize,
    pub net_change: i64,
    pub files_changed: usize,
    pub churn: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChurn {
    pub path: String,
    pub total_churn: usize,
    pub additions: usize,
    pub deletions: usize,
    pub change_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChurnReport {
    pub timeline: Vec<ChurnPoint>,
    pub high_churn_files: Vec<FileChurn>,
    pub total_additions: usize,
    pub total_deletions: usize,
    pub skipped: Vec<SkippedItem>,
}

/// Added and removed line counts of a textual patch.
///
/// Counts `"\n+"` and `"\n-"` occurrences and subtracts one from each for
/// the `+++`/`---` file header. Patches rendered by [`GitSource`] carry that
/// header, so the counts are exact there. A bare hunk without the header
/// comes out one line short on each side.
///
/// [`GitSource`]: crate::source::GitSource
pub fn count_changes(patch: &str) -> Inspection<(usize, usize)> {
    if !patch.contains("\n@@") && !patch.starts_with("@@") {
        return Inspection::Skipped(SkipReason::EmptyPatch);
    }
    let additions = patch.matches("\n+").count().saturating_sub(1);
    let deletions = patch.matches("\n-").count().saturating_sub(1);
    Inspection::Analyzed((additions, deletions))
}

/// Diff-based addition/deletion accounting over a stride sample
pub struct ChurnAnalyzer<'a> {
    history: &'a History,
    sample_size: usize,
}

impl<'a> ChurnAnalyzer<'a> {
    pub fn new(history: &'a History, sample_size: usize) -> Self {
        Self { history, sample_size }
    }

    /// Commit indices this analyzer will look at
    pub fn sample(&self) -> Vec<usize> {
        stride_sample(self.history.len(), self.sample_size)
    }

    pub fn analyze(&self) -> ChurnReport {
        let commits = self.history.commits();
        let mut points = Vec::new();
        let mut files: IndexMap<String, (usize, usize, usize)> = IndexMap::new();
        let mut skipped = Vec::new();

        for idx in self.sample() {
            let commit = &commits[idx];
            let items = match self.history.diff(idx) {
                Inspection::Analyzed(items) => items,
                Inspection::Skipped(reason) => {
                    debug!("churn: skipping {}: {reason}", commit.short_id());
                    skipped.push(SkippedItem { commit: commit.short_id().to_string(), path: None, reason });
                    continue;
                }
            };

            let (mut additions, mut deletions, mut files_changed) = (0, 0, 0);
            for item in items {
                let counted = match &item.patch {
                    PatchText::Text(text) => count_changes(text),
                    PatchText::Binary => Inspection::Skipped(SkipReason::Binary),
                    PatchText::Unreadable(e) => Inspection::Skipped(SkipReason::UnreadablePatch(e.clone())),
                };
                let (added, removed) = match counted {
                    Inspection::Analyzed(counts) => counts,
                    Inspection::Skipped(reason) => {
                        skipped.push(SkippedItem {
                            commit: commit.short_id().to_string(),
                            path: item.touched_path().map(str::to_string),
                            reason,
                        });
                        continue;
                    }
                };

                additions += added;
                deletions += removed;
                files_changed += 1;

                if let Some(path) = item.touched_path() {
                    let entry = files.entry(path.to_string()).or_default();
                    entry.0 += added;
                    entry.1 += removed;
                    entry.2 += 1;
                }
            }

            if files_changed > 0 {
                points.push((
                    commit.timestamp,
                    ChurnPoint {
                        hash: commit.short_id().to_string(),
                        date: commit.timestamp.format("%Y-%m-%d").to_string(),
                        additions,
                        deletions,
                        net_change: additions as i64 - deletions as i64,
                        files_changed,
                        churn: additions + deletions,
                    },
                ));
            }
        }

        points.sort_by_key(|(ts, _)| *ts);
        let timeline: Vec<ChurnPoint> = points.into_iter().map(|(_, p)| p).collect();

        let mut high_churn_files: Vec<FileChurn> = files
            .into_iter()
            .map(|(path, (additions, deletions, change_count))| FileChurn {
                path,
                total_churn: additions + deletions,
                additions,
                deletions,
                change_count,
            })
            .collect();
        high_churn_files.sort_by(|a, b| b.total_churn.cmp(&a.total_churn));
        high_churn_files.truncate(TOP_FILES);

        info!("Churn analysis covered {} commits", timeline.len());
        ChurnReport {
            total_additions: timeline.iter().map(|p| p.additions).sum(),
            total_deletions: timeline.iter().map(|p| p.deletions).sum(),
            timeline,
            high_churn_files,
            skipped,
        }
    }
}
