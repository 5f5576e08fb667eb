//! Verify command: report the structural checks for a day.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use zeit_core::{Rule, validate};
use zeit_db::Database;

fn describe(rule: Rule) -> &'static str {
    match rule {
        Rule::NoDefaultEvents => "no DEFAULT events",
        Rule::HasFinalStop => "day ends with STOP",
        Rule::HasLunch => "LUNCH recorded",
        Rule::NoDefaultSubtasks => "no DEFAULT subtasks",
    }
}

pub fn run<W: Write>(writer: &mut W, db: &Database, date: NaiveDate) -> Result<()> {
    let day = db
        .load_day(date)
        .with_context(|| format!("failed to load log for {date}"))?;

    let checks = validate(&day);
    for check in &checks {
        let mark = if check.passed { '✓' } else { '✗' };
        writeln!(writer, "{mark} {}", describe(check.rule))?;
    }
    if checks.iter().all(|check| check.passed) {
        writeln!(writer, "All checks passed.")?;
    }
    Ok(())
}
