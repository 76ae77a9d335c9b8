// src/velocity.rs

use crate::history::History;
use crate::model::round_to;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyVelocity {
    pub week: String,
    pub commits: usize,
    pub active_authors: usize,
    pub avg_commits_per_author: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyVelocity {
    pub month: String,
    pub commits: usize,
    pub active_authors: usize,
    pub active_days: usize,
    pub commits_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VelocityReport {
    pub weekly: Vec<WeeklyVelocity>,
    pub monthly: Vec<MonthlyVelocity>,
}

#[derive(Default)]
struct Bucket<'a> {
    commits: usize,
    authors: HashSet<&'a str>,
    days: HashSet<NaiveDate>,
}

/// Development pace per calendar week (Sunday-start, `%Y-W%U`) and month
pub fn analyze(history: &History) -> VelocityReport {
    let mut weeks: BTreeMap<String, Bucket<'_>> = BTreeMap::new();
    let mut months: BTreeMap<String, Bucket<'_>> = BTreeMap::new();

    for commit in history.commits() {
        let week = weeks.entry(commit.timestamp.format("%Y-W%U").to_string()).or_default();
        week.commits += 1;
        week.authors.insert(&commit.author);

        let month = months.entry(commit.timestamp.format("%Y-%m").to_string()).or_default();
        month.commits += 1;
        month.authors.insert(&commit.author);
        month.days.insert(commit.timestamp.date_naive());
    }

    VelocityReport {
        weekly: weeks
            .into_iter()
            .map(|(week, b)| WeeklyVelocity {
                week,
                commits: b.commits,
                active_authors: b.authors.len(),
                avg_commits_per_author: round_to(b.commits as f64 / b.authors.len().max(1) as f64, 2),
            })
            .collect(),
        monthly: months
            .into_iter()
            .map(|(month, b)| MonthlyVelocity {
                month,
                commits: b.commits,
                active_authors: b.authors.len(),
                active_days: b.days.len(),
                commits_per_day: round_to(b.commits as f64 / b.days.len().max(1) as f64, 2),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    #[test]
    fn weekly_and_monthly_buckets() {
        let history = History::new(linear(&[
            ("B", "2024-01-10T09:00:00+00:00", "m"),
            ("A", "2024-01-08T18:00:00+00:00", "m"),
            ("A", "2024-01-08T09:00:00+00:00", "m"),
            ("A", "2024-01-02T09:00:00+00:00", "m"),
        ]));
        let report = analyze(&history);

        assert_eq!(
            report.weekly,
            vec![
                WeeklyVelocity { week: "2024-W00".into(), commits: 1, active_authors: 1, avg_commits_per_author: 1.0 },
                WeeklyVelocity { week: "2024-W01".into(), commits: 3, active_authors: 2, avg_commits_per_author: 1.5 },
            ]
        );
        assert_eq!(
            report.monthly,
            vec![MonthlyVelocity { month: "2024-01".into(), commits: 4, active_authors: 2, active_days: 3, commits_per_day: 1.33 }]
        );
        assert_eq!(report.weekly.iter().map(|w| w.commits).sum::<usize>(), history.len());
    }
}
