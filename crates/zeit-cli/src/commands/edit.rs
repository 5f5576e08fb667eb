//! Log-editing commands: `remove`, `change`, `clear`, `clean`.

use std::io::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;

use zeit_core::Clock;
use zeit_db::Database;

use super::normalize_name;

/// Removes the last event of today, flagging destroyed children.
pub fn remove<W: Write, C: Clock>(writer: &mut W, db: &mut Database, clock: &C) -> Result<()> {
    let date = clock.today();
    let mut day = db
        .load_day(date)
        .context("failed to load today's log")?;
    let removed = day.remove_last().context("failed to remove last event")?;
    db.save_day(&day).context("failed to save today's log")?;

    writeln!(writer, "Removed event: {}", removed.event.name)?;
    if removed.lost_subtasks > 0 || removed.lost_notes > 0 {
        writeln!(
            writer,
            "Discarded {} subtask(s) and {} note(s) with it.",
            removed.lost_subtasks, removed.lost_notes
        )?;
    }
    Ok(())
}

/// Renames the last event of today.
pub fn change<W: Write, C: Clock>(
    writer: &mut W,
    db: &mut Database,
    clock: &C,
    name: &str,
) -> Result<()> {
    let name = normalize_name(name);
    let date = clock.today();
    let mut day = db
        .load_day(date)
        .context("failed to load today's log")?;
    day.rename_last(name.clone())
        .context("failed to rename last event")?;
    db.save_day(&day).context("failed to save today's log")?;

    writeln!(writer, "Renamed last event to {name}.")?;
    Ok(())
}

/// Erases a day's events. Idempotent.
pub fn clear<W: Write>(writer: &mut W, db: &mut Database, date: NaiveDate) -> Result<()> {
    db.clear_day(date)
        .with_context(|| format!("failed to clear {date}"))?;
    writeln!(writer, "Cleared {date}.")?;
    Ok(())
}

/// Prunes malformed entries from a day: unreadable rows are discarded at
/// load, blank names and zero-duration duplicates are collapsed in memory.
pub fn clean<W: Write>(writer: &mut W, db: &mut Database, date: NaiveDate) -> Result<()> {
    let (mut day, discarded) = db
        .load_day_lossy(date)
        .with_context(|| format!("failed to load log for {date}"))?;
    let collapsed = day.clean();
    db.save_day(&day)
        .with_context(|| format!("failed to save log for {date}"))?;

    writeln!(
        writer,
        "Cleaned {date}: dropped {discarded} unreadable entries, collapsed {collapsed} duplicates."
    )?;
    Ok(())
}
