//! Terminal rendering for report trees, summaries and rule checks.
//!
//! The core hands over plain data structures; everything about lines, boxes
//! and padding is decided here.

use std::io::{self, Write};

use chrono::NaiveDateTime;

use zeit_core::{DayReport, DaySummary, ProjectTotals};

const MAX_WIDTH: usize = 70;
const NAME_PAD: usize = 44;

/// Formats milliseconds as `HH:MM:SS`. Negative durations clamp to zero.
#[must_use]
pub fn format_hms(ms: i64) -> String {
    let total_seconds = ms.max(0) / 1000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

fn format_time(timestamp: NaiveDateTime) -> String {
    timestamp.format("%H:%M:%S").to_string()
}

/// Draws a boxed section title.
pub fn render_title<W: Write>(writer: &mut W, title: &str) -> io::Result<()> {
    writeln!(writer, "┌{}┐", "─".repeat(MAX_WIDTH - 2))?;
    writeln!(writer, "│ {title:<width$}│", width = MAX_WIDTH - 3)?;
    writeln!(writer, "└{}┘", "─".repeat(MAX_WIDTH - 2))?;
    Ok(())
}

/// Renders the day tree: events, nested subtasks, notes.
pub fn render_report<W: Write>(writer: &mut W, report: &DayReport) -> io::Result<()> {
    render_title(writer, &format!("Events for {}", report.date))?;
    for node in &report.events {
        let duration = node
            .duration_ms
            .map_or_else(|| "─".repeat(8), format_hms);
        writeln!(
            writer,
            "{:<width$} {}  {}",
            node.name,
            format_time(node.start),
            duration,
            width = NAME_PAD
        )?;
        let child_count = node.subtasks.len();
        for (index, subtask) in node.subtasks.iter().enumerate() {
            let last = index + 1 == child_count;
            let branch = if last { "└─" } else { "├─" };
            let stem = if last { "  " } else { "│ " };
            writeln!(
                writer,
                "  {branch} {:<width$} {}  {}",
                subtask.name,
                format_time(subtask.start),
                format_hms(subtask.duration_ms),
                width = NAME_PAD - 5
            )?;
            for note in &subtask.notes {
                writeln!(writer, "  {stem}    └─ {note}")?;
            }
        }
        for note in &node.notes {
            writeln!(writer, "     · {note}")?;
        }
    }
    if report.open {
        if let Some(last) = report.events.last() {
            writeln!(writer)?;
            writeln!(
                writer,
                "Ongoing project: {} ({})",
                last.name,
                last.duration_ms
                    .map_or_else(|| "00:00:00".to_string(), format_hms)
            )?;
        }
    }
    Ok(())
}

fn project_total(bucket: &ProjectTotals) -> i64 {
    bucket.total_ms + bucket.subtasks.values().sum::<i64>()
}

/// Renders per-project times, busiest first, excluded buckets omitted.
pub fn render_project_times<W: Write>(writer: &mut W, summary: &DaySummary) -> io::Result<()> {
    render_title(writer, "Time per project")?;
    let mut projects: Vec<_> = summary
        .projects
        .iter()
        .filter(|(_, bucket)| !bucket.excluded)
        .collect();
    projects.sort_by(|(a_name, a), (b_name, b)| {
        project_total(b)
            .cmp(&project_total(a))
            .then_with(|| a_name.cmp(b_name))
    });

    for (name, bucket) in projects {
        let label = if bucket.placeholder {
            format!("{name} (placeholder)")
        } else {
            name.clone()
        };
        writeln!(
            writer,
            "{label:<width$}{}",
            format_hms(project_total(bucket)),
            width = MAX_WIDTH - 8
        )?;
        for (subtask, ms) in &bucket.subtasks {
            writeln!(
                writer,
                "  └─ {subtask:<width$}{}",
                format_hms(*ms),
                width = MAX_WIDTH - 13
            )?;
        }
    }
    Ok(())
}

/// Renders the included/excluded grand totals.
pub fn render_totals<W: Write>(writer: &mut W, summary: &DaySummary) -> io::Result<()> {
    render_title(writer, "Total time")?;
    writeln!(
        writer,
        "{:<width$}{}",
        "Total:",
        format_hms(summary.included_ms),
        width = MAX_WIDTH - 8
    )?;
    writeln!(
        writer,
        "{:<width$}{}",
        "Excluded:",
        format_hms(summary.excluded_ms),
        width = MAX_WIDTH - 8
    )?;
    Ok(())
}
