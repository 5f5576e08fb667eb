//! Git importer.
//!
//! Shells out to `git log` and feeds commits into the day logs through the
//! same backdated-append contract as every other adapter; the core neither
//! knows nor cares that these events came from a repository.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use anyhow::{Context, Result, ensure};
use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};

use zeit_core::{Event, Note, SessionState, SpecialEvent};
use zeit_db::Database;

use super::normalize_name;

/// Options for `zeit import git`.
#[derive(Debug, Default)]
pub struct GitImportOptions {
    pub directory: Option<PathBuf>,
    pub since: Option<String>,
    pub author: Option<String>,
    pub limit: Option<usize>,
    pub project: Option<String>,
    pub as_subtasks: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Commit {
    hash: String,
    timestamp: NaiveDateTime,
    message: String,
}

fn short_hash(hash: &str) -> &str {
    &hash[..7.min(hash.len())]
}

fn resolve_project(options: &GitImportOptions) -> Result<String> {
    if let Some(project) = &options.project {
        return Ok(normalize_name(project));
    }
    let dir = match &options.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("failed to resolve current directory")?,
    };
    Ok(dir.file_name().map_or_else(
        || SpecialEvent::Default.as_str().to_string(),
        |name| name.to_string_lossy().to_lowercase(),
    ))
}

fn fetch_commits(options: &GitImportOptions) -> Result<Vec<Commit>> {
    let mut cmd = Command::new("git");
    if let Some(dir) = &options.directory {
        cmd.arg("-C").arg(dir);
    }
    cmd.args(["log", "--pretty=format:%H|%at|%s", "--reverse"]);
    if let Some(since) = &options.since {
        cmd.arg("--since").arg(since);
    }
    if let Some(author) = &options.author {
        cmd.arg("--author").arg(author);
    }
    if let Some(limit) = options.limit {
        cmd.arg("-n").arg(limit.to_string());
    }

    let output = cmd.output().context("failed to run git")?;
    ensure!(
        output.status.success(),
        "git log failed: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    Ok(parse_log(&String::from_utf8_lossy(&output.stdout)))
}

/// Parses `%H|%at|%s` lines into commits with local timestamps. Malformed
/// lines are skipped.
fn parse_log(raw: &str) -> Vec<Commit> {
    raw.lines()
        .filter_map(|line| {
            let mut parts = line.splitn(3, '|');
            let hash = parts.next()?.trim();
            let seconds: i64 = parts.next()?.trim().parse().ok()?;
            let message = parts.next().unwrap_or("").trim();
            if hash.is_empty() {
                return None;
            }
            let timestamp = Local.timestamp_opt(seconds, 0).single()?.naive_local();
            Some(Commit {
                hash: hash.to_string(),
                timestamp,
                message: message.to_string(),
            })
        })
        .collect()
}

pub fn run<W: Write>(writer: &mut W, db: &mut Database, options: &GitImportOptions) -> Result<()> {
    let project = resolve_project(options)?;
    let commits = fetch_commits(options)?;
    if commits.is_empty() {
        writeln!(writer, "No commits found.")?;
        return Ok(());
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<Commit>> = BTreeMap::new();
    for commit in commits {
        by_date.entry(commit.timestamp.date()).or_default().push(commit);
    }

    let mut imported = 0usize;
    for (date, commits) in by_date {
        let mut day = db
            .load_day(date)
            .with_context(|| format!("failed to load log for {date}"))?;

        if options.as_subtasks {
            if matches!(day.current_status(), SessionState::Closed(_)) {
                writeln!(writer, "Skipping {date}: day is already closed.")?;
                continue;
            }
            if matches!(day.current_status(), SessionState::Idle) {
                day.append_backdated(Event::new(project.clone(), commits[0].timestamp));
            }
            for commit in &commits {
                day.attach_subtask(
                    short_hash(&commit.hash),
                    commit.timestamp,
                    Some(commit.message.clone()),
                )
                .with_context(|| {
                    format!("failed to attach commit {} on {date}", short_hash(&commit.hash))
                })?;
            }
        } else {
            for commit in &commits {
                let mut event = Event::new(project.clone(), commit.timestamp);
                event.notes.push(Note {
                    text: commit.message.clone(),
                    timestamp: commit.timestamp,
                });
                day.append_backdated(event);
            }
        }

        db.save_day(&day)
            .with_context(|| format!("failed to save log for {date}"))?;
        tracing::debug!(%date, count = commits.len(), "imported commits");
        writeln!(writer, "Imported {} commit(s) into {date}.", commits.len())?;
        imported += commits.len();
    }

    writeln!(writer, "Imported {imported} commit(s) for project '{project}'.")?;
    Ok(())
}
