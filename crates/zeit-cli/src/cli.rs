//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use zeit_core::Clock;

/// Interval-based time tracker.
///
/// Marks the start and stop of work on named projects with short commands and
/// keeps an append-oriented per-day event log with derived summaries.
#[derive(Debug, Parser)]
#[command(name = "zeit", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start tracking time for a project.
    Start {
        /// Project name; a bare `start` records the DEFAULT placeholder.
        name: Option<String>,
    },

    /// Stop tracking time.
    Stop,

    /// Start a lunch break.
    Lunch,

    /// Record a backdated event at an explicit time today.
    Add {
        /// Project name.
        name: String,

        /// Time in HHMM, e.g. 0930.
        time: String,
    },

    /// Attach a subtask to the currently open event.
    Sub {
        /// Subtask name.
        name: String,

        /// Attach a note to the new subtask.
        #[arg(long)]
        note: Option<String>,
    },

    /// Attach a note to the most granular open item.
    Note {
        /// Note text.
        text: String,
    },

    /// Show the day's events, subtasks and totals.
    Status {
        #[command(flatten)]
        day: DaySelection,

        /// Emit the report tree as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check the day against the validation rules.
    Verify {
        #[command(flatten)]
        day: DaySelection,
    },

    /// Remove the last event.
    Remove,

    /// Rename the last event.
    Change {
        /// The new project name.
        name: String,
    },

    /// Erase a day's events.
    Clear {
        #[command(flatten)]
        day: DaySelection,
    },

    /// Prune malformed entries from a day.
    Clean {
        #[command(flatten)]
        day: DaySelection,
    },

    /// Import events from external sources.
    Import {
        #[command(subcommand)]
        source: ImportSource,
    },
}

/// Which day a command operates on. Defaults to today.
#[derive(Debug, Default, Args)]
pub struct DaySelection {
    /// Operate on yesterday.
    #[arg(long, conflicts_with = "date")]
    pub yesterday: bool,

    /// Operate on a specific date (YYYY-MM-DD).
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl DaySelection {
    /// Resolves the selection against the clock.
    pub fn resolve<C: Clock>(&self, clock: &C) -> NaiveDate {
        if let Some(date) = self.date {
            date
        } else if self.yesterday {
            clock.today() - chrono::Duration::days(1)
        } else {
            clock.today()
        }
    }
}

/// External event sources.
#[derive(Debug, Subcommand)]
pub enum ImportSource {
    /// Import git commits as backdated events.
    Git {
        /// Repository directory; defaults to the current directory.
        #[arg(short, long)]
        directory: Option<PathBuf>,

        /// Only commits since this date (anything `git log --since` accepts).
        #[arg(short, long)]
        since: Option<String>,

        /// Filter by author.
        #[arg(short, long)]
        author: Option<String>,

        /// Limit the number of commits.
        #[arg(short, long)]
        limit: Option<usize>,

        /// Project name; defaults to the repository directory name.
        #[arg(short, long)]
        project: Option<String>,

        /// Attach commits as subtasks of the open event instead of events.
        #[arg(long)]
        as_subtasks: bool,
    },
}
