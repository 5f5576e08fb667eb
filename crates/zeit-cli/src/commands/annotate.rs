//! Annotation commands: `sub`, `note`.

use std::io::Write;

use anyhow::{Context, Result};

use zeit_core::Clock;
use zeit_db::Database;

use super::normalize_name;

/// Attaches a subtask to the currently open event.
pub fn sub<W: Write, C: Clock>(
    writer: &mut W,
    db: &mut Database,
    clock: &C,
    name: &str,
    note: Option<String>,
) -> Result<()> {
    let name = normalize_name(name);
    let now = clock.now();
    let mut day = db
        .load_day(now.date())
        .context("failed to load today's log")?;
    day.attach_subtask(name.clone(), now, note)
        .context("failed to attach subtask")?;
    db.save_day(&day).context("failed to save today's log")?;

    writeln!(writer, "Added subtask: {name}")?;
    Ok(())
}

/// Attaches a note to the most granular open item.
pub fn note<W: Write, C: Clock>(
    writer: &mut W,
    db: &mut Database,
    clock: &C,
    text: &str,
) -> Result<()> {
    let now = clock.now();
    let mut day = db
        .load_day(now.date())
        .context("failed to load today's log")?;
    day.attach_note(text, now).context("failed to attach note")?;
    db.save_day(&day).context("failed to save today's log")?;

    writeln!(writer, "Note added.")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    use zeit_core::{Event, FixedClock};

    fn clock_at(hour: u32, minute: u32) -> FixedClock {
        FixedClock(
            NaiveDate::from_ymd_opt(2025, 3, 10)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap(),
        )
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn db_with_open_event() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let mut day = zeit_core::DayLog::new(date());
        day.append(Event::new("writing", clock_at(9, 0).0)).unwrap();
        db.save_day(&day).unwrap();
        db
    }

    #[test]
    fn sub_attaches_to_the_open_event() {
        let mut db = db_with_open_event();
        let mut out = Vec::new();
        sub(
            &mut out,
            &mut db,
            &clock_at(9, 30),
            "Outline",
            Some("ch. 3".to_string()),
        )
        .unwrap();

        let day = db.load_day(date()).unwrap();
        let subtask = &day.events()[0].subtasks[0];
        assert_eq!(subtask.name, "outline");
        assert_eq!(subtask.notes[0].text, "ch. 3");
    }

    #[test]
    fn sub_fails_without_an_open_event() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        let err = sub(&mut out, &mut db, &clock_at(9, 30), "outline", None).unwrap_err();
        assert!(err.to_string().contains("failed to attach subtask"));
    }

    #[test]
    fn note_lands_on_the_latest_subtask_when_present() {
        let mut db = db_with_open_event();
        let mut out = Vec::new();
        sub(&mut out, &mut db, &clock_at(9, 30), "outline", None).unwrap();
        note(&mut out, &mut db, &clock_at(9, 45), "halfway there").unwrap();

        let day = db.load_day(date()).unwrap();
        assert_eq!(day.events()[0].subtasks[0].notes[0].text, "halfway there");
        assert!(day.events()[0].notes.is_empty());
    }

    #[test]
    fn note_lands_on_the_event_otherwise() {
        let mut db = db_with_open_event();
        let mut out = Vec::new();
        note(&mut out, &mut db, &clock_at(9, 45), "warm-up").unwrap();

        let day = db.load_day(date()).unwrap();
        assert_eq!(day.events()[0].notes[0].text, "warm-up");
    }
}
