// src/history.rs

use crate::model::*;
use crate::source::CommitSource;
use indicatif::ProgressBar;
use std::collections::HashMap;
use tracing::{debug, info};

/// The commit sequence of one run, captured once and shared read-only by
/// every aggregator. Diffs are fetched at most once per commit.
#[derive(Debug, Default)]
pub struct History {
    commits: Vec<CommitRecord>,
    diffs: HashMap<usize, Inspection<Vec<DiffItem>>>,
}

impl History {
    /// A history without any captured diffs
    pub fn new(commits: Vec<CommitRecord>) -> Self {
        Self { commits, diffs: HashMap::new() }
    }

    /// Fetches the first-parent diff of every commit for which `needs_diff`
    /// returns true. A failing diff is recorded, not raised.
    pub fn capture_commits<S, F>(source: &S, commits: Vec<CommitRecord>, needs_diff: F) -> Self
    where
        S: CommitSource + ?Sized,
        F: Fn(usize, &CommitRecord) -> bool,
    {
        info!("Loaded {} commits", commits.len());

        let wanted: Vec<usize> = commits
            .iter()
            .enumerate()
            .filter(|(i, c)| !c.is_root() && needs_diff(*i, c))
            .map(|(i, _)| i)
            .collect();

        let bar = ProgressBar::new(wanted.len() as u64);
        bar.set_message("Reading diffs");

        let mut diffs = HashMap::with_capacity(wanted.len());
        for idx in wanted {
            let commit = &commits[idx];
            let inspection = match source.diff(commit) {
                Ok(items) => Inspection::Analyzed(items),
                Err(e) => {
                    debug!("Skipping diff of {}: {e}", commit.short_id());
                    Inspection::Skipped(SkipReason::DiffFailed(e.to_string()))
                }
            };
            diffs.insert(idx, inspection);
            bar.inc(1);
        }
        bar.finish_and_clear();

        Self { commits, diffs }
    }

    pub fn commits(&self) -> &[CommitRecord] {
        &self.commits
    }

    pub fn len(&self) -> usize {
        self.commits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// First-parent diff of the commit at `idx`
    pub fn diff(&self, idx: usize) -> Inspection<&[DiffItem]> {
        if self.commits.get(idx).map_or(false, CommitRecord::is_root) {
            return Inspection::Skipped(SkipReason::RootCommit);
        }
        match self.diffs.get(&idx) {
            Some(Inspection::Analyzed(items)) => Inspection::Analyzed(items.as_slice()),
            Some(Inspection::Skipped(reason)) => Inspection::Skipped(reason.clone()),
            None => Inspection::Skipped(SkipReason::NotCaptured),
        }
    }
}

/// Indices picked by stride sampling: every `⌊len / size⌋`-th element when
/// `len` exceeds `size`, otherwise all of them.
pub fn stride_sample(len: usize, size: usize) -> Vec<usize> {
    if size == 0 || len <= size {
        return (0..len).collect();
    }
    (0..len).step_by(len / size).collect()
}
