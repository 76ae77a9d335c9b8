// src/model.rs

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// Full 40-hex commit id
pub type CommitId = String;

/// A single commit as delivered by a [`crate::source::CommitSource`]
#[derive(Debug, Clone)]
pub struct CommitRecord {
    pub id: CommitId,
    pub author: String,
    /// Authored instant in the author's own offset
    pub timestamp: DateTime<FixedOffset>,
    pub message: String,
    pub parents: Vec<CommitId>,
}

impl CommitRecord {
    pub fn short_id(&self) -> &str {
        self.id.get(..8).unwrap_or(&self.id)
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// First line of the trimmed message, cut to 100 characters
    pub fn summary(&self) -> String {
        self.message
            .trim()
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(100)
            .collect()
    }
}

/// Patch body of a single diff item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchText {
    Text(String),
    Binary,
    Unreadable(String),
}

/// One file entry of a commit's diff against its first parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffItem {
    pub old_path: Option<String>,
    pub new_path: Option<String>,
    pub patch: PatchText,
}

impl DiffItem {
    /// The pre-image path if there is one, else the post-image path
    pub fn touched_path(&self) -> Option<&str> {
        self.old_path.as_deref().or(self.new_path.as_deref())
    }
}

/// A file blob read out of a commit's tree
#[derive(Debug, Clone)]
pub struct TreeBlob {
    pub path: String,
    pub content: Inspection<Vec<u8>>,
}

/// Why an item was left out of an aggregate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum SkipReason {
    RootCommit,
    NotCaptured,
    DiffFailed(String),
    Binary,
    UnreadablePatch(String),
    EmptyPatch,
    BlobFailed(String),
    TreeFailed(String),
    AnalysisFailed(String),
    NoMatchingFiles,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RootCommit => write!(f, "root commit"),
            Self::NotCaptured => write!(f, "diff not captured"),
            Self::DiffFailed(e) => write!(f, "diff failed: {e}"),
            Self::Binary => write!(f, "binary patch"),
            Self::UnreadablePatch(e) => write!(f, "unreadable patch: {e}"),
            Self::EmptyPatch => write!(f, "patch has no hunks"),
            Self::BlobFailed(e) => write!(f, "blob read failed: {e}"),
            Self::TreeFailed(e) => write!(f, "tree walk failed: {e}"),
            Self::AnalysisFailed(e) => write!(f, "analysis failed: {e}"),
            Self::NoMatchingFiles => write!(f, "no analyzable files"),
        }
    }
}

/// Outcome of inspecting one commit, diff item or file
#[derive(Debug, Clone, PartialEq)]
pub enum Inspection<T> {
    Analyzed(T),
    Skipped(SkipReason),
}

/// A skip surfaced in a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub commit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub reason: SkipReason,
}

/// Time-bucket width for frequency histograms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Month,
    Year,
}

impl Granularity {
    pub fn format(&self) -> &'static str {
        match self {
            Self::Day => "%Y-%m-%d",
            Self::Month => "%Y-%m",
            Self::Year => "%Y",
        }
    }

    pub fn key(&self, ts: &DateTime<FixedOffset>) -> String {
        ts.format(self.format()).to_string()
    }
}

/// Counter that keeps first-seen order, so equal counts rank deterministically
#[derive(Debug, Clone, Default)]
pub struct Tally {
    counts: IndexMap<String, usize>,
}

impl Tally {
    pub fn add(&mut self, key: &str) {
        match self.counts.get_mut(key) {
            Some(c) => *c += 1,
            None => {
                self.counts.insert(key.to_string(), 1);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Highest counts first; ties keep insertion order
    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut entries: Vec<(String, usize)> =
            self.counts.iter().map(|(k, &v)| (k.clone(), v)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(n);
        entries
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `part / whole * 100`, 2 decimals, 0 when `whole` is 0
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_to(part as f64 / whole as f64 * 100.0, 2)
}
