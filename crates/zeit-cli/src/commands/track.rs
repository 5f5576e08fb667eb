//! Event-creating commands: `start`, `stop`, `lunch`, `add`.

use std::io::Write;

use anyhow::{Context, Result, anyhow, ensure};
use chrono::{NaiveDateTime, NaiveTime};

use zeit_core::{Clock, Event, SpecialEvent};
use zeit_db::Database;

use super::normalize_name;

/// Loads today, appends an event at `now` and persists the day.
fn record_event<C: Clock>(db: &mut Database, clock: &C, name: String) -> Result<NaiveDateTime> {
    let now = clock.now();
    let mut day = db
        .load_day(now.date())
        .context("failed to load today's log")?;
    day.append(Event::new(name, now))
        .context("failed to append event")?;
    db.save_day(&day).context("failed to save today's log")?;
    Ok(now)
}

pub fn start<W: Write, C: Clock>(
    writer: &mut W,
    db: &mut Database,
    clock: &C,
    name: Option<&str>,
) -> Result<()> {
    let name = name.map_or_else(
        || SpecialEvent::Default.as_str().to_string(),
        normalize_name,
    );
    record_event(db, clock, name.clone())?;
    writeln!(writer, "Started tracking time for project: {name}")?;
    Ok(())
}

pub fn stop<W: Write, C: Clock>(writer: &mut W, db: &mut Database, clock: &C) -> Result<()> {
    record_event(db, clock, SpecialEvent::Stop.as_str().to_string())?;
    writeln!(writer, "Stopped time tracking.")?;
    Ok(())
}

pub fn lunch<W: Write, C: Clock>(writer: &mut W, db: &mut Database, clock: &C) -> Result<()> {
    record_event(db, clock, SpecialEvent::Lunch.as_str().to_string())?;
    writeln!(writer, "Started lunch break.")?;
    Ok(())
}

/// Records a backdated event at an explicit HHMM time today, re-sorting the
/// day around it.
pub fn add<W: Write, C: Clock>(
    writer: &mut W,
    db: &mut Database,
    clock: &C,
    name: &str,
    time: &str,
) -> Result<()> {
    let name = normalize_name(name);
    let time = parse_hhmm(time)?;
    let timestamp = clock.today().and_time(time);

    let mut day = db
        .load_day(timestamp.date())
        .context("failed to load today's log")?;
    day.append_backdated(Event::new(name.clone(), timestamp));
    db.save_day(&day).context("failed to save today's log")?;

    writeln!(writer, "Added {name} at {}.", time.format("%H:%M"))?;
    Ok(())
}

/// Parses the compact `HHMM` time format, e.g. `0930` or `1715`.
fn parse_hhmm(raw: &str) -> Result<NaiveTime> {
    ensure!(
        raw.len() == 4 && raw.bytes().all(|b| b.is_ascii_digit()),
        "time must be HHMM, e.g. 0930"
    );
    let hour: u32 = raw[..2].parse()?;
    let minute: u32 = raw[2..].parse()?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| anyhow!("invalid time: {raw}"))
}
