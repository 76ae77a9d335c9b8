// src/bugfix.rs

use crate::history::History;
use crate::model::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Keywords that mark a commit message as a bug fix
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "fix", "bug", "error", "issue", "patch", "correct", "修复", "错误", "hotfix", "bugfix",
];

const TOP_AUTHORS: usize = 10;
const TOP_FILES: usize = 10;
const RECENT_FIXES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BugFix {
    pub hash: String,
    pub author: String,
    pub date: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BugFixer {
    pub author: String,
    pub fixes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuggyFile {
    pub path: String,
    pub fixes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: String,
    pub fixes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BugFixReport {
    pub total_bug_fixes: usize,
    pub bug_fix_rate: f64,
    pub bug_fixes_by_month: Vec<MonthCount>,
    pub top_bug_fixers: Vec<BugFixer>,
    pub most_buggy_files: Vec<BuggyFile>,
    pub recent_bug_fixes: Vec<BugFix>,
    pub skipped: Vec<SkippedItem>,
}

/// Keyword classifier for bug-fix commits.
///
/// Matching is a case-insensitive substring test, so "prefix" matches "fix".
#[derive(Debug, Clone)]
pub struct BugClassifier {
    keywords: Vec<String>,
}

impl Default for BugClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS.iter().copied())
    }
}

impl BugClassifier {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    pub fn is_bug_fix(&self, message: &str) -> bool {
        let message = message.to_lowercase();
        self.keywords.iter().any(|k| message.contains(k.as_str()))
    }

    pub fn analyze(&self, history: &History) -> BugFixReport {
        let commits = history.commits();
        let mut by_month: BTreeMap<String, usize> = BTreeMap::new();
        let mut authors = Tally::default();
        let mut files = Tally::default();
        let mut fixes = Vec::new();
        let mut skipped = Vec::new();

        for (idx, commit) in commits.iter().enumerate() {
            if !self.is_bug_fix(&commit.message) {
                continue;
            }

            *by_month.entry(commit.timestamp.format("%Y-%m").to_string()).or_default() += 1;
            authors.add(&commit.author);

            match history.diff(idx) {
                Inspection::Analyzed(items) => {
                    for path in items.iter().filter_map(DiffItem::touched_path) {
                        files.add(path);
                    }
                }
                Inspection::Skipped(SkipReason::RootCommit) => {}
                Inspection::Skipped(reason) => {
                    debug!("bug fixes: no file attribution for {}: {reason}", commit.short_id());
                    skipped.push(SkippedItem { commit: commit.short_id().to_string(), path: None, reason });
                }
            }

            fixes.push(BugFix {
                hash: commit.short_id().to_string(),
                author: commit.author.clone(),
                date: commit.timestamp.format("%Y-%m-%d %H:%M").to_string(),
                message: commit.summary(),
            });
        }

        let rate = percentage(fixes.len(), commits.len());
        info!("Found {} bug-fix commits ({rate:.1}%)", fixes.len());

        BugFixReport {
            total_bug_fixes: fixes.len(),
            bug_fix_rate: rate,
            bug_fixes_by_month: by_month
                .into_iter()
                .map(|(month, fixes)| MonthCount { month, fixes })
                .collect(),
            top_bug_fixers: authors
                .most_common(TOP_AUTHORS)
                .into_iter()
                .map(|(author, fixes)| BugFixer { author, fixes })
                .collect(),
            most_buggy_files: files
                .most_common(TOP_FILES)
                .into_iter()
                .map(|(path, fixes)| BuggyFile { path, fixes })
                .collect(),
            recent_bug_fixes: fixes.into_iter().take(RECENT_FIXES).collect(),
            skipped,
        }
    }
}
