//! Status command: the day tree, per-project times and grand totals.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use zeit_core::{Clock, build_report, summarize};
use zeit_db::Database;

use crate::render;

pub fn run<W: Write, C: Clock>(
    writer: &mut W,
    db: &Database,
    clock: &C,
    date: NaiveDate,
    json: bool,
) -> Result<()> {
    let day = db
        .load_day(date)
        .with_context(|| format!("failed to load log for {date}"))?;

    if day.is_empty() {
        writeln!(writer, "No events recorded for {date}.")?;
        return Ok(());
    }

    let now = clock.now();
    let report = build_report(&day, now);

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
        return Ok(());
    }

    render::render_report(writer, &report)?;
    let summary = summarize(&day, now);
    render::render_project_times(writer, &summary)?;
    render::render_totals(writer, &summary)?;
    Ok(())
}
