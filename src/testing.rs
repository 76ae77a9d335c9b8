// src/testing.rs

use crate::error::{AlmanacError, Result};
use crate::history::History;
use crate::model::*;
use crate::source::CommitSource;
use chrono::{DateTime, Duration};
use git2::{Repository, Signature, Time};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Builds a `CommitRecord` with a synthetic id derived from `n`
pub fn record(n: u32, author: &str, rfc3339: &str, message: &str, parent: Option<u32>) -> CommitRecord {
    CommitRecord {
        id: format!("{n:040x}"),
        author: author.to_string(),
        timestamp: DateTime::parse_from_rfc3339(rfc3339).unwrap(),
        message: message.to_string(),
        parents: parent.map(|p| format!("{p:040x}")).into_iter().collect(),
    }
}

/// Newest-first linear history; element `i` has element `i + 1` as parent
pub fn linear(specs: &[(&str, &str, &str)]) -> Vec<CommitRecord> {
    let n = specs.len() as u32;
    specs
        .iter()
        .enumerate()
        .map(|(i, (author, ts, msg))| {
            let i = i as u32;
            let parent = if i + 1 < n { Some(n - i - 1) } else { None };
            record(n - i, author, ts, msg, parent)
        })
        .collect()
}

/// Newest-first linear history of `n` commits one day apart; `spec(i)`
/// gives the author and message of the `i`-th newest commit
pub fn series<F>(n: usize, spec: F) -> Vec<CommitRecord>
where
    F: Fn(usize) -> (String, String),
{
    let base = DateTime::parse_from_rfc3339("2023-01-01T12:00:00+00:00").unwrap();
    (0..n)
        .map(|i| {
            let (author, message) = spec(i);
            CommitRecord {
                id: format!("{:040x}", n - i),
                author,
                timestamp: base + Duration::days((n - 1 - i) as i64),
                message,
                parents: if i + 1 < n { vec![format!("{:040x}", n - i - 1)] } else { Vec::new() },
                    }
        })
        .collect()
}

/// Loads every commit of `source` and captures the diffs `needs_diff` asks for
pub fn capture<F>(source: &MemorySource, needs_diff: F) -> History
where
    F: Fn(usize, &CommitRecord) -> bool,
{
    History::capture_commits(source, source.commits().unwrap(), needs_diff)
}

pub fn text_item(path: &str, patch: &str) -> DiffItem {
    DiffItem {
        old_path: Some(path.to_string()),
        new_path: Some(path.to_string()),
        patch: PatchText::Text(patch.to_string()),
    }
}

/// A unified patch with the given numbers of added and removed lines
pub fn patch_with(path: &str, added: usize, removed: usize) -> String {
    let mut text = format!("diff --git a/{path} b/{path}\n--- a/{path}\n+++ b/{path}\n@@ -1 +1 @@\n");
    for i in 0..removed {
        text.push_str(&format!("-old {i}\n"));
    }
    for i in 0..added {
        text.push_str(&format!("+new {i}\n"));
    }
    text
}

/// In-memory [`CommitSource`]
#[derive(Default)]
pub struct MemorySource {
    pub commits: Vec<CommitRecord>,
    pub diffs: HashMap<String, std::result::Result<Vec<DiffItem>, String>>,
    pub trees: HashMap<String, Vec<(String, String)>>,
}

impl MemorySource {
    pub fn new(commits: Vec<CommitRecord>) -> Self {
        Self { commits, ..Self::default() }
    }

    pub fn with_diff(mut self, commit: &CommitRecord, items: Vec<DiffItem>) -> Self {
        self.diffs.insert(commit.id.clone(), Ok(items));
        self
    }

    pub fn with_failing_diff(mut self, commit: &CommitRecord) -> Self {
        self.diffs.insert(commit.id.clone(), Err("corrupt object".to_string()));
        self
    }

    pub fn with_tree(mut self, commit: &CommitRecord, files: &[(&str, &str)]) -> Self {
        self.trees.insert(
            commit.id.clone(),
            files.iter().map(|(p, c)| (p.to_string(), c.to_string())).collect(),
        );
        self
    }
}

impl CommitSource for MemorySource {
    fn commits(&self) -> Result<Vec<CommitRecord>> {
        Ok(self.commits.clone())
    }

    fn diff(&self, commit: &CommitRecord) -> Result<Vec<DiffItem>> {
        match self.diffs.get(&commit.id) {
            Some(Ok(items)) => Ok(items.clone()),
            Some(Err(msg)) => Err(AlmanacError::Git(git2::Error::from_str(msg))),
            None => Ok(Vec::new()),
        }
    }

    fn tree(&self, commit: &CommitRecord, wanted: &dyn Fn(&str) -> bool) -> Result<Vec<TreeBlob>> {
        let files = self
            .trees
            .get(&commit.id)
            .ok_or_else(|| AlmanacError::Git(git2::Error::from_str("missing tree")))?;
        Ok(files
            .iter()
            .filter(|(p, _)| wanted(p))
            .map(|(p, c)| TreeBlob {
                path: p.clone(),
                content: Inspection::Analyzed(c.clone().into_bytes()),
            })
            .collect())
    }
}

/// A scratch git repository in a temporary directory
pub struct GitFixture {
    dir: TempDir,
    repo: Repository,
}

impl GitFixture {
    pub fn new() -> Result<Self> {
        let dir = tempfile::tempdir()?;
        let repo = Repository::init(dir.path())?;
        Ok(Self { dir, repo })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn remove(&self, file: &str) -> Result<()> {
        fs::remove_file(self.dir.path().join(file))?;
        let mut index = self.repo.index()?;
        index.remove_path(Path::new(file))?;
        index.write()?;
        Ok(())
    }

    /// Writes `files`, stages them and commits on top of HEAD
    pub fn commit(
        &self,
        author: &str,
        seconds: i64,
        offset_minutes: i32,
        message: &str,
        files: &[(&str, &str)],
    ) -> Result<git2::Oid> {
        let mut index = self.repo.index()?;
        for (name, content) in files {
            let full = self.dir.path().join(name);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&full, content)?;
            index.add_path(Path::new(name))?;
        }
        index.write()?;
        let tree = self.repo.find_tree(index.write_tree()?)?;

        let email = format!("{}@example.com", author.to_lowercase());
        let sig = Signature::new(author, &email, &Time::new(seconds, offset_minutes))?;
        let parent = match self.repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(_) => None,
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();
        Ok(self.repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?)
    }
}
