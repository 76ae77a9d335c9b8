// src/main.rs

mod cli;

use anyhow::Context;
use clap::Parser;
use cli::Args;
use git_almanac::complexity::ComplexityTimeline;
use git_almanac::{analyze_repository, logging, AnalysisConfig, FullReport};
use std::process::ExitCode;
use std::time::Instant;

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error analyzing repository: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    let start_time = Instant::now();

    let mut config = AnalysisConfig::load(&args.repo, args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut config);

    let report = analyze_repository(&args.repo, config)
        .with_context(|| format!("failed to analyze {}", args.repo.display()))?;
    println!("Analysis finished in {:.2?}.", start_time.elapsed());
    print_summary(&report);

    let written = report
        .write_outputs(&args.output, args.json_only)
        .with_context(|| format!("failed to write results to {}", args.output.display()))?;
    for path in written {
        println!("Saved {}", path.display());
    }

    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}

fn print_summary(report: &FullReport) {
    let stats = &report.basic_stats;
    println!("{} commits by {} authors over {} days.", stats.total_commits, stats.total_authors, stats.active_days);
    if let (Some(first), Some(last)) = (&stats.first_commit, &stats.last_commit) {
        println!("Repository history spans from {first} to {last}.");
    }
    if let Some(top) = report.author_ranking.first() {
        println!("Top author: {} ({} commits, {:.1}%)", top.author, top.commits, top.percentage);
    }
    println!(
        "Bug fixes: {} ({:.2}%), churn: +{} / -{}",
        report.bug_fixes.total_bug_fixes,
        report.bug_fixes.bug_fix_rate,
        report.churn.total_additions,
        report.churn.total_deletions
    );
    match &report.complexity {
        ComplexityTimeline::Available { points, .. } => println!("Complexity samples: {}", points.len()),
        ComplexityTimeline::Unavailable { reason } => println!("Complexity: unavailable ({reason})"),
    }
}
