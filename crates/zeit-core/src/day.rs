//! The per-day event log and its mutation rules.
//!
//! A [`DayLog`] owns every event, subtask and note recorded for one calendar
//! date. All mutations go through it so the ordering invariant (timestamps
//! non-decreasing) holds at every return.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::event::{Event, Note, Subtask};

/// Errors raised by day-log mutations.
///
/// These are always returned to the caller; the core never drops or retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DayError {
    /// The timestamp precedes the current tail of the log.
    #[error("timestamp {given} precedes the last event at {last}")]
    OutOfOrder {
        last: NaiveDateTime,
        given: NaiveDateTime,
    },

    /// A mutation was attempted on a day with no events.
    #[error("no events recorded for this day")]
    EmptyLog,

    /// There is no open event to attach to (the day is empty or already
    /// STOP-terminated).
    #[error("no open event to attach to")]
    NoOpenEvent,
}

/// Tracking state at the tail of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState<'a> {
    /// No events recorded yet.
    Idle,
    /// The last event is still accumulating time.
    Open(&'a Event),
    /// The day ends with a STOP marker.
    Closed(&'a Event),
}

/// The result of [`DayLog::remove_last`]: the removed event together with an
/// explicit count of the children destroyed with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedEvent {
    pub event: Event,
    pub lost_subtasks: usize,
    pub lost_notes: usize,
}

/// One date's ordered event log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayLog {
    date: NaiveDate,
    events: Vec<Event>,
}

impl DayLog {
    /// An empty log for the given date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self {
            date,
            events: Vec::new(),
        }
    }

    /// Builds a log from stored events, repairing order if needed.
    ///
    /// The sort is stable, so events sharing a timestamp keep the order they
    /// were persisted in.
    #[must_use]
    pub fn from_events(date: NaiveDate, mut events: Vec<Event>) -> Self {
        events.sort_by_key(|event| event.timestamp);
        Self { date, events }
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Appends an event at the tail of the log.
    ///
    /// Fails with [`DayError::OutOfOrder`] if the timestamp precedes the
    /// stored tail. Equal timestamps are accepted; collapsing zero-duration
    /// entries is [`DayLog::clean`]'s job.
    pub fn append(&mut self, event: Event) -> Result<(), DayError> {
        if let Some(last) = self.events.last() {
            if event.timestamp < last.timestamp {
                return Err(DayError::OutOfOrder {
                    last: last.timestamp,
                    given: event.timestamp,
                });
            }
        }
        tracing::debug!(name = %event.name, timestamp = %event.timestamp, "append event");
        self.events.push(event);
        Ok(())
    }

    /// Inserts a backdated event, re-sorting the day.
    ///
    /// This is the explicit backdating path used by `add` and importers;
    /// unlike [`DayLog::append`] it never rejects on ordering. The sort is
    /// stable, so an entry backdated to an existing timestamp lands after it.
    pub fn append_backdated(&mut self, event: Event) {
        tracing::debug!(name = %event.name, timestamp = %event.timestamp, "append backdated event");
        self.events.push(event);
        self.events.sort_by_key(|e| e.timestamp);
    }

    /// Removes the most recent event, flagging destroyed subtasks and notes.
    pub fn remove_last(&mut self) -> Result<RemovedEvent, DayError> {
        let event = self.events.pop().ok_or(DayError::EmptyLog)?;
        let lost_subtasks = event.subtasks.len();
        let lost_notes = event.notes.len()
            + event
                .subtasks
                .iter()
                .map(|subtask| subtask.notes.len())
                .sum::<usize>();
        tracing::debug!(name = %event.name, lost_subtasks, lost_notes, "removed last event");
        Ok(RemovedEvent {
            event,
            lost_subtasks,
            lost_notes,
        })
    }

    /// Renames the most recent event. The kind follows the new name.
    pub fn rename_last(&mut self, name: impl Into<String>) -> Result<(), DayError> {
        let event = self.events.last_mut().ok_or(DayError::EmptyLog)?;
        event.name = name.into();
        Ok(())
    }

    /// The last event and whether the session is still open.
    #[must_use]
    pub fn current_status(&self) -> SessionState<'_> {
        match self.events.last() {
            None => SessionState::Idle,
            Some(event) if event.kind().is_stop() => SessionState::Closed(event),
            Some(event) => SessionState::Open(event),
        }
    }

    /// Attaches a subtask to the currently open event.
    ///
    /// Fails with [`DayError::NoOpenEvent`] if the day is empty or already
    /// STOP-terminated, and with [`DayError::OutOfOrder`] if the timestamp
    /// precedes an existing sibling.
    pub fn attach_subtask(
        &mut self,
        name: impl Into<String>,
        timestamp: NaiveDateTime,
        note: Option<String>,
    ) -> Result<(), DayError> {
        let event = match self.events.last_mut() {
            Some(event) if !event.kind().is_stop() => event,
            _ => return Err(DayError::NoOpenEvent),
        };
        if let Some(last) = event.subtasks.last() {
            if timestamp < last.timestamp {
                return Err(DayError::OutOfOrder {
                    last: last.timestamp,
                    given: timestamp,
                });
            }
        }
        let mut subtask = Subtask::new(name, timestamp);
        if let Some(text) = note {
            subtask.notes.push(Note { text, timestamp });
        }
        event.subtasks.push(subtask);
        Ok(())
    }

    /// Attaches a note to the most granular open item: the open event's last
    /// subtask if it has one, otherwise the event itself.
    pub fn attach_note(
        &mut self,
        text: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Result<(), DayError> {
        let event = match self.events.last_mut() {
            Some(event) if !event.kind().is_stop() => event,
            _ => return Err(DayError::NoOpenEvent),
        };
        let note = Note {
            text: text.into(),
            timestamp,
        };
        match event.subtasks.last_mut() {
            Some(subtask) => subtask.notes.push(note),
            None => event.notes.push(note),
        }
        Ok(())
    }

    /// Structural repair: re-sorts the day, drops blank-named entries and
    /// collapses adjacent same-name runs (their children move to the
    /// surviving event). Returns how many events were removed.
    pub fn clean(&mut self) -> usize {
        let before = self.events.len();
        self.events.sort_by_key(|event| event.timestamp);
        self.events.retain(|event| !event.name.trim().is_empty());
        self.events.dedup_by(|later, earlier| {
            if later.name == earlier.name {
                earlier.subtasks.append(&mut later.subtasks);
                earlier.notes.append(&mut later.notes);
                true
            } else {
                false
            }
        });
        let removed = before - self.events.len();
        if removed > 0 {
            tracing::debug!(removed, date = %self.date, "cleaned day log");
        }
        removed
    }
}
