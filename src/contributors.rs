// src/contributors.rs

use crate::history::History;
use crate::model::*;
use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

const TOP_CONTRIBUTORS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorStat {
    pub author: String,
    pub total_commits: usize,
    pub first_commit: String,
    pub last_commit: String,
    pub active_days: i64,
    pub commits_per_day: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContributorEvolutionPoint {
    pub month: String,
    pub total_contributors: usize,
    pub new_contributors: usize,
    pub cumulative_contributors: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributorReport {
    pub evolution: Vec<ContributorEvolutionPoint>,
    pub contributor_stats: Vec<ContributorStat>,
    pub total_contributors: usize,
}

/// Per-author activity spans and monthly cohort growth
pub struct ContributorLifecycleTracker<'a> {
    history: &'a History,
}

impl<'a> ContributorLifecycleTracker<'a> {
    pub fn new(history: &'a History) -> Self {
        Self { history }
    }

    pub fn analyze(&self) -> ContributorReport {
        let mut by_month: BTreeMap<String, HashSet<&str>> = BTreeMap::new();
        let mut dates: IndexMap<&str, Vec<DateTime<FixedOffset>>> = IndexMap::new();

        for commit in self.history.commits() {
            by_month
                .entry(commit.timestamp.format("%Y-%m").to_string())
                .or_default()
                .insert(commit.author.as_str());
            dates.entry(commit.author.as_str()).or_default().push(commit.timestamp);
        }

        let mut stats: Vec<ContributorStat> = dates
            .into_iter()
            .filter_map(|(author, mut stamps)| {
                stamps.sort();
                let (first, last) = (*stamps.first()?, *stamps.last()?);
                let active_days = ((last.date_naive() - first.date_naive()).num_days() + 1).max(1);
                Some(ContributorStat {
                    author: author.to_string(),
                    total_commits: stamps.len(),
                    first_commit: first.format("%Y-%m-%d").to_string(),
                    last_commit: last.format("%Y-%m-%d").to_string(),
                    active_days,
                    commits_per_day: round_to(stamps.len() as f64 / active_days as f64, 3),
                })
            })
            .collect();
        stats.sort_by(|a, b| b.total_commits.cmp(&a.total_commits));
        stats.truncate(TOP_CONTRIBUTORS);

        // BTreeMap iterates months oldest first regardless of traversal order
        let mut seen: HashSet<&str> = HashSet::new();
        let evolution: Vec<ContributorEvolutionPoint> = by_month
            .into_iter()
            .map(|(month, authors)| {
                let new_contributors = authors.iter().filter(|a| !seen.contains(*a)).count();
                seen.extend(authors.iter().copied());
                ContributorEvolutionPoint {
                    month,
                    total_contributors: authors.len(),
                    new_contributors,
                    cumulative_contributors: seen.len(),
                }
            })
            .collect();

        info!("Tracked {} contributors over {} months", seen.len(), evolution.len());
        ContributorReport {
            evolution,
            contributor_stats: stats,
            total_contributors: seen.len(),
        }
    }
}
