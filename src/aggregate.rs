// src/aggregate.rs

use crate::history::History;
use crate::model::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

const TOP_FILES: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicStats {
    pub total_commits: usize,
    pub total_authors: usize,
    pub first_commit: Option<String>,
    pub last_commit: Option<String>,
    pub active_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorRank {
    pub author: String,
    pub commits: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyBucket {
    pub key: String,
    pub commits: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentCommit {
    pub index: usize,
    pub hash: String,
    pub author: String,
    pub time: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChangeEntry {
    pub path: String,
    pub changes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileChangeStats {
    pub analyzed_commits: usize,
    pub touched_files: usize,
    pub top_files: Vec<FileChangeEntry>,
    pub skipped: Vec<SkippedItem>,
}

/// Whole-history statistics: totals, rankings, histograms
pub struct HistoryAggregator<'a> {
    history: &'a History,
}

impl<'a> HistoryAggregator<'a> {
    pub fn new(history: &'a History) -> Self {
        Self { history }
    }

    pub fn basic_stats(&self) -> BasicStats {
        let commits = self.history.commits();
        let authors: HashSet<&str> = commits.iter().map(|c| c.author.as_str()).collect();

        // newest first: the head of the sequence is the latest commit
        let (first, last, active_days) = match (commits.last(), commits.first()) {
            (Some(oldest), Some(newest)) => {
                let days = (newest.timestamp - oldest.timestamp).num_days().max(0);
                (Some(oldest.timestamp.to_rfc3339()), Some(newest.timestamp.to_rfc3339()), days)
            }
            _ => (None, None, 0),
        };

        BasicStats {
            total_commits: commits.len(),
            total_authors: authors.len(),
            first_commit: first,
            last_commit: last,
            active_days,
        }
    }

    pub fn author_ranking(&self, top_n: usize) -> Vec<AuthorRank> {
        let commits = self.history.commits();
        let mut tally = Tally::default();
        for commit in commits {
            tally.add(&commit.author);
        }
        tally
            .most_common(top_n)
            .into_iter()
            .map(|(author, count)| AuthorRank {
                author,
                commits: count,
                percentage: percentage(count, commits.len()),
            })
            .collect()
    }

    pub fn commit_frequency(&self, granularity: Granularity) -> Vec<FrequencyBucket> {
        let mut buckets: BTreeMap<String, usize> = BTreeMap::new();
        for commit in self.history.commits() {
            *buckets.entry(granularity.key(&commit.timestamp)).or_default() += 1;
        }
        buckets
            .into_iter()
            .map(|(key, commits)| FrequencyBucket { key, commits })
            .collect()
    }

    pub fn recent_commits(&self, limit: usize) -> Vec<RecentCommit> {
        self.history
            .commits()
            .iter()
            .take(limit)
            .enumerate()
            .map(|(i, c)| RecentCommit {
                index: i + 1,
                hash: c.short_id().to_string(),
                author: c.author.clone(),
                time: c.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                message: c.summary(),
            })
            .collect()
    }

    /// Touch counts per path over the `limit` most recent commits
    pub fn file_change_stats(&self, limit: usize) -> FileChangeStats {
        let analyzed = limit.min(self.history.len());
        let mut tally = Tally::default();
        let mut skipped = Vec::new();

        for (idx, commit) in self.history.commits().iter().enumerate().take(analyzed) {
            match self.history.diff(idx) {
                Inspection::Analyzed(items) => {
                    for path in items.iter().filter_map(DiffItem::touched_path) {
                        tally.add(path);
                    }
                }
                Inspection::Skipped(reason) => {
                    debug!("file stats: skipping {}: {reason}", commit.short_id());
                    skipped.push(SkippedItem {
                        commit: commit.short_id().to_string(),
                        path: None,
                        reason,
                    });
                }
            }
        }

        FileChangeStats {
            analyzed_commits: analyzed,
            touched_files: tally.len(),
            top_files: tally
                .most_common(TOP_FILES)
                .into_iter()
                .map(|(path, changes)| FileChangeEntry { path, changes })
                .collect(),
            skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn three_commits() -> Vec<CommitRecord> {
        linear(&[
            ("A", "2024-03-10T09:00:00+00:00", "Fix crash"),
            ("B", "2024-02-01T12:30:00+00:00", "Add feature"),
            ("A", "2024-01-01T08:00:00+00:00", "Initial commit"),
        ])
    }

    #[test]
    fn ranking_of_two_authors() {
        let history = History::new(three_commits());
        let agg = HistoryAggregator::new(&history);

        let ranking = agg.author_ranking(10);
        assert_eq!(
            ranking,
            vec![
                AuthorRank { author: "A".into(), commits: 2, percentage: 66.67 },
                AuthorRank { author: "B".into(), commits: 1, percentage: 33.33 },
            ]
        );
        assert_eq!(ranking.iter().map(|r| r.commits).sum::<usize>(), 3);

        let stats = agg.basic_stats();
        assert_eq!(stats.total_commits, 3);
        assert_eq!(stats.total_authors, 2);
        assert_eq!(stats.active_days, 69);
        assert_eq!(stats.first_commit.as_deref(), Some("2024-01-01T08:00:00+00:00"));
    }

    #[test]
    fn ranking_ties_follow_first_encounter() {
        let history = History::new(linear(&[
            ("Zed", "2024-01-03T00:00:00+00:00", "x"),
            ("Amy", "2024-01-02T00:00:00+00:00", "y"),
        ]));
        let names: Vec<_> = HistoryAggregator::new(&history)
            .author_ranking(5)
            .into_iter()
            .map(|r| r.author)
            .collect();
        assert_eq!(names, vec!["Zed", "Amy"]);
    }

    #[test]
    fn single_commit_spans_zero_days() {
        let history = History::new(linear(&[("A", "2024-01-01T00:00:00+00:00", "init")]));
        assert_eq!(HistoryAggregator::new(&history).basic_stats().active_days, 0);
    }

    #[test]
    fn frequency_buckets_ascend_and_cover_all_commits() {
        let history = History::new(three_commits());
        let agg = HistoryAggregator::new(&history);

        for granularity in [Granularity::Day, Granularity::Month, Granularity::Year] {
            let buckets = agg.commit_frequency(granularity);
            assert!(buckets.windows(2).all(|w| w[0].key < w[1].key));
            assert_eq!(buckets.iter().map(|b| b.commits).sum::<usize>(), 3);
        }
        let months: Vec<_> = agg.commit_frequency(Granularity::Month).into_iter().map(|b| b.key).collect();
        assert_eq!(months, vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn buckets_use_author_local_time() {
        let history = History::new(linear(&[("A", "2024-01-31T23:30:00-05:00", "late")]));
        let buckets = HistoryAggregator::new(&history).commit_frequency(Granularity::Month);
        assert_eq!(buckets[0].key, "2024-01");
    }

    #[test]
    fn recent_commits_are_newest_first() {
        let history = History::new(three_commits());
        let recent = HistoryAggregator::new(&history).recent_commits(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].index, 1);
        assert_eq!(recent[0].message, "Fix crash");
        assert_eq!(recent[0].time, "2024-03-10 09:00");
        assert_eq!(recent[0].hash.len(), 8);
    }

    #[test]
    fn root_commit_is_analyzed_but_touches_nothing() {
        let commits = linear(&[("A", "2024-01-01T00:00:00+00:00", "init")]);
        let source = MemorySource::new(commits);
        let history = capture(&source, |_, _| true);

        let stats = HistoryAggregator::new(&history).file_change_stats(500);
        assert_eq!(stats.analyzed_commits, 1);
        assert_eq!(stats.touched_files, 0);
        assert_eq!(stats.skipped[0].reason, SkipReason::RootCommit);
    }

    #[test]
    fn file_stats_count_touches_and_skip_failures() {
        let commits = three_commits();
        let source = MemorySource::new(commits.clone())
            .with_diff(
                &commits[0],
                vec![text_item("src/a.rs", ""), DiffItem { old_path: None, new_path: Some("src/b.rs".into()), patch: PatchText::Binary }],
            )
            .with_failing_diff(&commits[1]);
        let history = capture(&source, |_, _| true);

        let stats = HistoryAggregator::new(&history).file_change_stats(2);
        assert_eq!(stats.analyzed_commits, 2);
        assert_eq!(stats.touched_files, 2);
        assert_eq!(stats.top_files[0], FileChangeEntry { path: "src/a.rs".into(), changes: 1 });
        assert!(matches!(stats.skipped[0].reason, SkipReason::DiffFailed(_)));
    }

    #[test]
    fn empty_history_yields_zero_values() {
        let history = History::default();
        let agg = HistoryAggregator::new(&history);
        let stats = agg.basic_stats();
        assert_eq!(stats.total_commits, 0);
        assert_eq!(stats.active_days, 0);
        assert!(stats.first_commit.is_none());
        assert!(agg.author_ranking(10).is_empty());
        assert!(agg.commit_frequency(Granularity::Month).is_empty());
        assert!(agg.recent_commits(10).is_empty());
        assert_eq!(agg.file_change_stats(100).analyzed_commits, 0);
    }

    #[test]
    fn percentages_sum_to_about_one_hundred() {
        for (n, authors) in [(7, 3), (10, 7), (3, 3)] {
            let history = History::new(series(n, |i| (format!("a{}", i % authors), "m".to_string())));
            let ranking = HistoryAggregator::new(&history).author_ranking(authors);
            let total: f64 = ranking.iter().map(|r| r.percentage).sum();
            assert!((total - 100.0).abs() <= 0.01 * authors as f64, "{n} commits: {total}");
        }
    }

    #[test]
    fn ranking_and_file_stats_are_capped() {
        let commits = series(25, |i| (format!("a{i}"), "m".to_string()));
        let source = commits.iter().enumerate().fold(MemorySource::new(commits.clone()), |s, (i, c)| {
            s.with_diff(c, vec![text_item("common.rs", ""), text_item(&format!("f{i}.rs"), "")])
        });
        let history = capture(&source, |_, _| true);
        let agg = HistoryAggregator::new(&history);

        assert_eq!(agg.author_ranking(10).len(), 10);
        assert_eq!(agg.recent_commits(10).len(), 10);

        let stats = agg.file_change_stats(500);
        assert_eq!(stats.analyzed_commits, 25);
        // the root commit touches nothing
        assert_eq!(stats.touched_files, 25);
        assert_eq!(stats.top_files.len(), 20);
        assert_eq!(stats.top_files[0], FileChangeEntry { path: "common.rs".into(), changes: 24 });
    }
}
