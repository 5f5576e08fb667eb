//! Storage layer for the zeit interval tracker.
//!
//! Persists per-day event logs using `rusqlite`. The day is the unit of
//! persistence: mutations load the entire day, work on it in memory and write
//! the entire day back inside a single transaction, so no partial-write state
//! is ever visible. Concurrent processes are last-writer-wins by design.
//!
//! # Schema
//!
//! Timestamps are stored as TEXT in `YYYY-MM-DD HH:MM:SS[.fff]` local time
//! (lexicographic order matches chronological order within a day); the day
//! key is the `YYYY-MM-DD` date string. Events, subtasks and notes live in
//! three tables keyed by `(date, position)` so a day round-trips exactly,
//! including child ordering.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, params};
use thiserror::Error;

use zeit_core::{DayLog, Event, Note, Subtask};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A stored timestamp failed to parse during a strict load.
    #[error("invalid timestamp for {name} on {date}: {timestamp}")]
    TimestampParse {
        date: NaiveDate,
        name: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// Database connection wrapper.
///
/// Wraps a `rusqlite::Connection`, which is `Send` but not `Sync`; the tool
/// is single-threaded so no external synchronization is needed.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database. Useful for testing; destroyed when the
    /// connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the schema. Idempotent.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS events (
                date TEXT NOT NULL,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (date, position)
            );

            CREATE TABLE IF NOT EXISTS subtasks (
                date TEXT NOT NULL,
                event_position INTEGER NOT NULL,
                position INTEGER NOT NULL,
                name TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                PRIMARY KEY (date, event_position, position)
            );

            -- subtask_position NULL means the note hangs off the event itself
            CREATE TABLE IF NOT EXISTS notes (
                date TEXT NOT NULL,
                event_position INTEGER NOT NULL,
                subtask_position INTEGER,
                position INTEGER NOT NULL,
                text TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_subtasks_date ON subtasks(date);
            CREATE INDEX IF NOT EXISTS idx_notes_date ON notes(date);
            ",
        )?;
        Ok(())
    }

    /// Loads one day's log. Fails on the first malformed timestamp.
    pub fn load_day(&self, date: NaiveDate) -> Result<DayLog, DbError> {
        let (day, _) = self.load_day_inner(date, false)?;
        Ok(day)
    }

    /// Loads one day's log, discarding rows that fail to parse (and any
    /// children orphaned by the discard). Returns the log together with the
    /// number of discarded rows; used by `clean` to repair a damaged day.
    pub fn load_day_lossy(&self, date: NaiveDate) -> Result<(DayLog, usize), DbError> {
        self.load_day_inner(date, true)
    }

    fn load_day_inner(&self, date: NaiveDate, lossy: bool) -> Result<(DayLog, usize), DbError> {
        let date_key = format_date(date);
        let mut discarded = 0usize;
        let mut dropped_events: HashSet<i64> = HashSet::new();
        let mut events: BTreeMap<i64, Event> = BTreeMap::new();

        let mut stmt = self.conn.prepare(
            "SELECT position, name, timestamp FROM events WHERE date = ? ORDER BY position ASC",
        )?;
        let rows = stmt.query_map([&date_key], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (position, name, timestamp) = row?;
            match parse_timestamp(&timestamp) {
                Ok(parsed) => {
                    events.insert(position, Event::new(name, parsed));
                }
                Err(source) => {
                    if !lossy {
                        return Err(DbError::TimestampParse {
                            date,
                            name,
                            timestamp,
                            source,
                        });
                    }
                    tracing::warn!(%date, %name, %timestamp, "discarding unreadable event");
                    dropped_events.insert(position);
                    discarded += 1;
                }
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT event_position, name, timestamp FROM subtasks WHERE date = ?
             ORDER BY event_position ASC, position ASC",
        )?;
        let rows = stmt.query_map([&date_key], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for row in rows {
            let (event_position, name, timestamp) = row?;
            if dropped_events.contains(&event_position) {
                discarded += 1;
                continue;
            }
            match parse_timestamp(&timestamp) {
                Ok(parsed) => {
                    if let Some(event) = events.get_mut(&event_position) {
                        event.subtasks.push(Subtask::new(name, parsed));
                    } else {
                        tracing::warn!(%date, %name, "discarding subtask with no parent event");
                        discarded += 1;
                    }
                }
                Err(source) => {
                    if !lossy {
                        return Err(DbError::TimestampParse {
                            date,
                            name,
                            timestamp,
                            source,
                        });
                    }
                    tracing::warn!(%date, %name, %timestamp, "discarding unreadable subtask");
                    discarded += 1;
                }
            }
        }

        let mut stmt = self.conn.prepare(
            "SELECT event_position, subtask_position, text, timestamp FROM notes WHERE date = ?
             ORDER BY event_position ASC, position ASC",
        )?;
        let rows = stmt.query_map([&date_key], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, Option<i64>>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;
        for row in rows {
            let (event_position, subtask_position, text, timestamp) = row?;
            if dropped_events.contains(&event_position) {
                discarded += 1;
                continue;
            }
            let parsed = match parse_timestamp(&timestamp) {
                Ok(parsed) => parsed,
                Err(source) => {
                    if !lossy {
                        return Err(DbError::TimestampParse {
                            date,
                            name: text,
                            timestamp,
                            source,
                        });
                    }
                    tracing::warn!(%date, %timestamp, "discarding unreadable note");
                    discarded += 1;
                    continue;
                }
            };
            let note = Note {
                text,
                timestamp: parsed,
            };
            let owner = events.get_mut(&event_position).and_then(|event| {
                match subtask_position.map(usize::try_from) {
                    Some(Ok(position)) => event
                        .subtasks
                        .get_mut(position)
                        .map(|subtask| &mut subtask.notes),
                    Some(Err(_)) => None,
                    None => Some(&mut event.notes),
                }
            });
            match owner {
                Some(notes) => notes.push(note),
                None => {
                    tracing::warn!(%date, "discarding note with no parent");
                    discarded += 1;
                }
            }
        }

        let day = DayLog::from_events(date, events.into_values().collect());
        Ok((day, discarded))
    }

    /// Replaces one day's log wholesale, inside a single transaction.
    #[allow(clippy::cast_possible_wrap)]
    pub fn save_day(&mut self, day: &DayLog) -> Result<(), DbError> {
        let date_key = format_date(day.date());
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM events WHERE date = ?", [&date_key])?;
        tx.execute("DELETE FROM subtasks WHERE date = ?", [&date_key])?;
        tx.execute("DELETE FROM notes WHERE date = ?", [&date_key])?;
        {
            let mut event_stmt = tx.prepare(
                "INSERT INTO events (date, position, name, timestamp) VALUES (?, ?, ?, ?)",
            )?;
            let mut subtask_stmt = tx.prepare(
                "INSERT INTO subtasks (date, event_position, position, name, timestamp)
                 VALUES (?, ?, ?, ?, ?)",
            )?;
            let mut note_stmt = tx.prepare(
                "INSERT INTO notes (date, event_position, subtask_position, position, text, timestamp)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )?;

            for (event_position, event) in day.events().iter().enumerate() {
                let event_position = event_position as i64;
                event_stmt.execute(params![
                    date_key,
                    event_position,
                    event.name,
                    format_timestamp(event.timestamp),
                ])?;
                let mut note_position = 0i64;
                for note in &event.notes {
                    note_stmt.execute(params![
                        date_key,
                        event_position,
                        Option::<i64>::None,
                        note_position,
                        note.text,
                        format_timestamp(note.timestamp),
                    ])?;
                    note_position += 1;
                }
                for (subtask_position, subtask) in event.subtasks.iter().enumerate() {
                    let subtask_position = subtask_position as i64;
                    subtask_stmt.execute(params![
                        date_key,
                        event_position,
                        subtask_position,
                        subtask.name,
                        format_timestamp(subtask.timestamp),
                    ])?;
                    for note in &subtask.notes {
                        note_stmt.execute(params![
                            date_key,
                            event_position,
                            Some(subtask_position),
                            note_position,
                            note.text,
                            format_timestamp(note.timestamp),
                        ])?;
                        note_position += 1;
                    }
                }
            }
        }
        tx.commit()?;
        tracing::debug!(date = %day.date(), events = day.len(), "saved day");
        Ok(())
    }

    /// Deletes all events for a date. Idempotent.
    pub fn clear_day(&mut self, date: NaiveDate) -> Result<(), DbError> {
        let date_key = format_date(date);
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM events WHERE date = ?", [&date_key])?;
        tx.execute("DELETE FROM subtasks WHERE date = ?", [&date_key])?;
        tx.execute("DELETE FROM notes WHERE date = ?", [&date_key])?;
        tx.commit()?;
        tracing::debug!(%date, "cleared day");
        Ok(())
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn format_timestamp(timestamp: NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Timelike;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        date().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn sample_day() -> DayLog {
        let mut day = DayLog::new(date());
        day.append(Event::new("writing", ts(9, 0))).unwrap();
        day.attach_subtask("outline", ts(9, 10), Some("ch. 3".to_string()))
            .unwrap();
        day.attach_note("on the subtask", ts(9, 20)).unwrap();
        day.append(Event::new("LUNCH", ts(12, 0))).unwrap();
        day.append(Event::new("review", ts(13, 0))).unwrap();
        day.attach_note("on the event", ts(13, 5)).unwrap();
        day.append(Event::new("STOP", ts(17, 0))).unwrap();
        day
    }

    #[test]
    fn save_then_load_roundtrips_exactly() {
        let mut db = Database::open_in_memory().unwrap();
        let day = sample_day();
        db.save_day(&day).unwrap();
        let loaded = db.load_day(date()).unwrap();
        assert_eq!(loaded, day);
    }

    #[test]
    fn loading_an_unknown_date_yields_an_empty_day() {
        let db = Database::open_in_memory().unwrap();
        let day = db.load_day(date()).unwrap();
        assert!(day.is_empty());
        assert_eq!(day.date(), date());
    }

    #[test]
    fn days_are_independent() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_day(&sample_day()).unwrap();

        let other_date = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();
        let mut other = DayLog::new(other_date);
        other
            .append(Event::new(
                "planning",
                other_date.and_hms_opt(8, 0, 0).unwrap(),
            ))
            .unwrap();
        db.save_day(&other).unwrap();

        assert_eq!(db.load_day(date()).unwrap(), sample_day());
        assert_eq!(db.load_day(other_date).unwrap(), other);
    }

    #[test]
    fn save_replaces_the_previous_day_wholesale() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_day(&sample_day()).unwrap();

        let mut trimmed = sample_day();
        trimmed.remove_last().unwrap();
        db.save_day(&trimmed).unwrap();

        assert_eq!(db.load_day(date()).unwrap(), trimmed);
    }

    #[test]
    fn clear_day_is_idempotent() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_day(&sample_day()).unwrap();

        db.clear_day(date()).unwrap();
        assert!(db.load_day(date()).unwrap().is_empty());
        db.clear_day(date()).unwrap();
        assert!(db.load_day(date()).unwrap().is_empty());
    }

    #[test]
    fn subsecond_timestamps_roundtrip() {
        let mut db = Database::open_in_memory().unwrap();
        let precise = date()
            .and_hms_opt(9, 0, 0)
            .unwrap()
            .with_nanosecond(123_000_000)
            .unwrap();
        let mut day = DayLog::new(date());
        day.append(Event::new("writing", precise)).unwrap();
        db.save_day(&day).unwrap();
        assert_eq!(db.load_day(date()).unwrap(), day);
    }

    #[test]
    fn strict_load_fails_on_a_malformed_timestamp() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_day(&sample_day()).unwrap();
        db.conn
            .execute(
                "INSERT INTO events (date, position, name, timestamp) VALUES (?, ?, ?, ?)",
                params!["2025-03-10", 99, "broken", "not-a-time"],
            )
            .unwrap();

        let err = db.load_day(date()).unwrap_err();
        assert!(matches!(err, DbError::TimestampParse { name, .. } if name == "broken"));
    }

    #[test]
    fn lossy_load_discards_malformed_rows_and_counts_them() {
        let mut db = Database::open_in_memory().unwrap();
        db.save_day(&sample_day()).unwrap();
        db.conn
            .execute(
                "INSERT INTO events (date, position, name, timestamp) VALUES (?, ?, ?, ?)",
                params!["2025-03-10", 99, "broken", "not-a-time"],
            )
            .unwrap();
        db.conn
            .execute(
                "INSERT INTO subtasks (date, event_position, position, name, timestamp)
                 VALUES (?, ?, ?, ?, ?)",
                params!["2025-03-10", 99, 0, "orphaned", "2025-03-10 10:00:00"],
            )
            .unwrap();

        let (day, discarded) = db.load_day_lossy(date()).unwrap();
        assert_eq!(discarded, 2);
        assert_eq!(day, sample_day());
    }

    #[test]
    fn open_on_disk_persists_across_connections() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("zeit.db");

        let mut db = Database::open(&path).unwrap();
        db.save_day(&sample_day()).unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        assert_eq!(db.load_day(date()).unwrap(), sample_day());
    }
}
