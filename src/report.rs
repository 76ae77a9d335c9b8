// src/report.rs

use crate::aggregate::*;
use crate::bugfix::BugFixReport;
use crate::churn::ChurnReport;
use crate::complexity::ComplexityTimeline;
use crate::contributors::ContributorReport;
use crate::error::Result;
use crate::velocity::VelocityReport;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const JSON_FILE_NAME: &str = "analysis_result.json";
pub const TEXT_FILE_NAME: &str = "report.txt";

const RULE_WIDTH: usize = 50;
const SECTION_WIDTH: usize = 30;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub repo_path: String,
    /// Wall-clock time of the run, the only field that differs between runs
    pub generated_at: String,
    pub tool: String,
    pub total_commits: usize,
}

/// Everything one run produces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FullReport {
    pub metadata: Metadata,
    pub basic_stats: BasicStats,
    pub author_ranking: Vec<AuthorRank>,
    pub commit_frequency: Vec<FrequencyBucket>,
    pub recent_commits: Vec<RecentCommit>,
    pub file_changes: FileChangeStats,
    pub bug_fixes: BugFixReport,
    pub churn: ChurnReport,
    pub velocity: VelocityReport,
    pub contributors: ContributorReport,
    pub complexity: ComplexityTimeline,
}

impl FullReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Human-readable summary of the headline aggregates
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        // writing into a String cannot fail
        let _ = self.write_text(&mut out);
        out
    }

    fn write_text(&self, out: &mut String) -> std::fmt::Result {
        writeln!(out, "Git Repository Analysis Report")?;
        writeln!(out, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(out)?;
        writeln!(out, "Repository: {}", self.metadata.repo_path)?;
        writeln!(out, "Generated:  {}", self.metadata.generated_at)?;
        writeln!(out)?;

        section(out, "1. Basic statistics")?;
        let stats = &self.basic_stats;
        writeln!(out, "Total commits: {}", stats.total_commits)?;
        writeln!(out, "Total authors: {}", stats.total_authors)?;
        writeln!(out, "First commit: {}", stats.first_commit.as_deref().unwrap_or("-"))?;
        writeln!(out, "Last commit: {}", stats.last_commit.as_deref().unwrap_or("-"))?;
        writeln!(out, "Active days: {}", stats.active_days)?;

        section(out, "2. Author ranking")?;
        for (i, rank) in self.author_ranking.iter().enumerate() {
            writeln!(out, "{}. {}: {} commits ({:.1}%)", i + 1, rank.author, rank.commits, rank.percentage)?;
        }

        section(out, "3. Recent commits")?;
        for commit in &self.recent_commits {
            writeln!(out, "[{}] {}: {}", commit.time, commit.author, commit.message)?;
        }

        section(out, "4. Most changed files")?;
        writeln!(
            out,
            "{} files touched in the last {} commits",
            self.file_changes.touched_files, self.file_changes.analyzed_commits
        )?;
        for entry in self.file_changes.top_files.iter().take(10) {
            writeln!(out, "{:>6}  {}", entry.changes, entry.path)?;
        }

        section(out, "5. Bug fixes")?;
        writeln!(
            out,
            "{} bug-fix commits ({:.2}% of all commits)",
            self.bug_fixes.total_bug_fixes, self.bug_fixes.bug_fix_rate
        )?;
        for fixer in &self.bug_fixes.top_bug_fixers {
            writeln!(out, "  {}: {}", fixer.author, fixer.fixes)?;
        }

        section(out, "6. Code churn")?;
        writeln!(
            out,
            "+{} / -{} over {} sampled commits",
            self.churn.total_additions,
            self.churn.total_deletions,
            self.churn.timeline.len()
        )?;
        for file in self.churn.high_churn_files.iter().take(10) {
            writeln!(out, "{:>8}  {}", file.total_churn, file.path)?;
        }

        section(out, "7. Contributors")?;
        writeln!(out, "{} distinct contributors", self.contributors.total_contributors)?;
        if let Some(last) = self.contributors.evolution.last() {
            writeln!(out, "{} active in {}", last.total_contributors, last.month)?;
        }

        section(out, "8. Complexity")?;
        match &self.complexity {
            ComplexityTimeline::Available { points, .. } => match (points.first(), points.last()) {
                (Some(first), Some(last)) => {
                    writeln!(out, "{} samples", points.len())?;
                    writeln!(out, "{}: avg {:.2} over {} LOC", first.date, first.avg_complexity, first.total_loc)?;
                    writeln!(out, "{}: avg {:.2} over {} LOC", last.date, last.avg_complexity, last.total_loc)?;
                }
                _ => writeln!(out, "no files matched")?,
            },
            ComplexityTimeline::Unavailable { reason } => writeln!(out, "unavailable: {reason}")?,
        }
        Ok(())
    }

    /// Writes the JSON summary and, unless `json_only`, the text report into
    /// `dir`. Returns the paths written.
    pub fn write_outputs(&self, dir: &Path, json_only: bool) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(2);

        let json_path = dir.join(JSON_FILE_NAME);
        fs::write(&json_path, self.to_json()?)?;
        info!("Wrote {}", json_path.display());
        written.push(json_path);

        if !json_only {
            let text_path = dir.join(TEXT_FILE_NAME);
            fs::write(&text_path, self.to_text())?;
            info!("Wrote {}", text_path.display());
            written.push(text_path);
        }
        Ok(written)
    }
}

fn section(out: &mut String, title: &str) -> std::fmt::Result {
    writeln!(out)?;
    writeln!(out, "{title}")?;
    writeln!(out, "{}", "-".repeat(SECTION_WIDTH))
}
