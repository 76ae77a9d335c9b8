// src/source.rs

use crate::error::{AlmanacError, Result};
use crate::model::*;
use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use git2::{Delta, DiffFindOptions, DiffOptions, ErrorCode, ObjectType, Oid, Patch, Repository, Sort, TreeWalkMode, TreeWalkResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only access to a repository's history
pub trait CommitSource {
    /// All commits reachable from HEAD, newest first
    fn commits(&self) -> Result<Vec<CommitRecord>>;

    /// Diff of `commit` against its first parent
    fn diff(&self, commit: &CommitRecord) -> Result<Vec<DiffItem>>;

    /// Blobs of `commit`'s tree whose path satisfies `wanted`
    fn tree(&self, commit: &CommitRecord, wanted: &dyn Fn(&str) -> bool) -> Result<Vec<TreeBlob>>;
}

/// [`CommitSource`] backed by libgit2
pub struct GitSource {
    repo: Repository,
    path: PathBuf,
}

impl GitSource {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AlmanacError::RepositoryNotFound(path.to_path_buf()));
        }
        let repo = Repository::open(path).map_err(|e| {
            debug!("Repository::open({}) failed: {e}", path.display());
            AlmanacError::NotAGitRepository(path.to_path_buf())
        })?;
        debug!("Opened git repository at {:?}", repo.path());
        Ok(Self { repo, path: path.to_path_buf() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn find(&self, id: &str) -> Result<git2::Commit<'_>> {
        Ok(self.repo.find_commit(Oid::from_str(id)?)?)
    }
}

impl CommitSource for GitSource {
    fn commits(&self) -> Result<Vec<CommitRecord>> {
        match self.repo.head() {
            Ok(_) => {}
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                debug!("HEAD is unborn, repository has no commits");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push_head()?;
        revwalk.set_sorting(Sort::TIME)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            let author = commit.author();
            commits.push(CommitRecord {
                id: commit.id().to_string(),
                author: String::from_utf8_lossy(author.name_bytes()).into_owned(),
                timestamp: to_datetime(author.when()),
                message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
                parents: commit.parent_ids().map(|p| p.to_string()).collect(),
            });
        }
        Ok(commits)
    }

    fn diff(&self, commit: &CommitRecord) -> Result<Vec<DiffItem>> {
        let commit = self.find(&commit.id)?;
        let parent_tree = commit.parent(0)?.tree()?;
        let current_tree = commit.tree()?;

        let mut diff_opts = DiffOptions::new();
        diff_opts.ignore_filemode(true);

        let mut diff = self
            .repo
            .diff_tree_to_tree(Some(&parent_tree), Some(&current_tree), Some(&mut diff_opts))?;
        diff.find_similar(Some(DiffFindOptions::new().renames(true)))?;

        let mut items = Vec::with_capacity(diff.deltas().len());
        for (idx, delta) in diff.deltas().enumerate() {
            let old_path = delta.old_file().path().map(|p| p.to_string_lossy().into_owned());
            let new_path = delta.new_file().path().map(|p| p.to_string_lossy().into_owned());
            let (old_path, new_path) = match delta.status() {
                Delta::Added | Delta::Untracked => (None, new_path),
                Delta::Deleted => (old_path, None),
                _ => (old_path, new_path),
            };

            let patch = if delta.flags().is_binary() {
                PatchText::Binary
            } else {
                match Patch::from_diff(&diff, idx) {
                    Ok(Some(mut patch)) => match patch.to_buf() {
                        Ok(buf) => PatchText::Text(String::from_utf8_lossy(&buf).into_owned()),
                        Err(e) => PatchText::Unreadable(e.message().to_string()),
                    },
                    Ok(None) => PatchText::Binary,
                    Err(e) => PatchText::Unreadable(e.message().to_string()),
                }
            };

            items.push(DiffItem { old_path, new_path, patch });
        }
        Ok(items)
    }

    fn tree(&self, commit: &CommitRecord, wanted: &dyn Fn(&str) -> bool) -> Result<Vec<TreeBlob>> {
        let tree = self.find(&commit.id)?.tree()?;

        let mut entries: Vec<(String, Oid)> = Vec::new();
        tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                let path = format!("{}{}", dir, String::from_utf8_lossy(entry.name_bytes()));
                if wanted(&path) {
                    entries.push((path, entry.id()));
                }
            }
            TreeWalkResult::Ok
        })?;

        Ok(entries
            .into_iter()
            .map(|(path, oid)| {
                let content = match self.repo.find_blob(oid) {
                    Ok(blob) => Inspection::Analyzed(blob.content().to_vec()),
                    Err(e) => Inspection::Skipped(SkipReason::BlobFailed(e.message().to_string())),
                };
                TreeBlob { path, content }
            })
            .collect())
    }
}

fn to_datetime(time: git2::Time) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    offset
        .timestamp_opt(time.seconds(), 0)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::default().with_timezone(&Utc.fix()))
}
