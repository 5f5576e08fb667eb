//! Duration aggregation over a day's events.
//!
//! Everything is calculated on top of timestamps: each event owns the
//! half-open interval up to the next event (or `now` for the last event of an
//! in-progress day), and durations are accumulated per project name. The
//! whole thing is a pure fold over an immutable [`DayLog`] snapshot with an
//! explicit `now`, so results are deterministic under test.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::day::DayLog;
use crate::event::{Event, EventKind};

/// Accumulated time for one project name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTotals {
    /// The project's own time in milliseconds, with subtask time carved out.
    pub total_ms: i64,
    /// True for `STOP`/`LUNCH` buckets, which never count as work.
    pub excluded: bool,
    /// True for the `DEFAULT` placeholder, which should not survive in a
    /// finalized log.
    pub placeholder: bool,
    /// Carved-out time per subtask name, in milliseconds.
    pub subtasks: BTreeMap<String, i64>,
}

impl ProjectTotals {
    fn new(kind: EventKind) -> Self {
        Self {
            total_ms: 0,
            excluded: kind.is_excluded(),
            placeholder: kind.is_placeholder(),
            subtasks: BTreeMap::new(),
        }
    }
}

/// Aggregated durations for one day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DaySummary {
    /// Per-name totals in deterministic (lexicographic) order.
    pub projects: BTreeMap<String, ProjectTotals>,
    /// Total tracked work time in milliseconds.
    pub included_ms: i64,
    /// Total break/termination time in milliseconds.
    pub excluded_ms: i64,
    /// Whether the day is still in progress (no terminal STOP).
    pub open: bool,
}

/// The end boundary of the interval owned by `events[index]`.
///
/// Returns `None` for the terminal STOP of a closed day, which owns nothing.
/// The open interval of an in-progress day never extends backwards: if `now`
/// precedes the last timestamp the interval is empty.
pub(crate) fn interval_end(
    events: &[Event],
    index: usize,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    match events.get(index + 1) {
        Some(next) => Some(next.timestamp),
        None => {
            let event = &events[index];
            if event.kind().is_stop() {
                None
            } else {
                Some(now.max(event.timestamp))
            }
        }
    }
}

/// The carved-out span of each subtask, in milliseconds.
///
/// Subtask `k` owns `[sub_k, sub_k+1)` with the final subtask bounded by the
/// parent interval's end; spans are clamped into the parent interval so a
/// mis-timed subtask can never produce negative own time.
pub(crate) fn subtask_spans(event: &Event, end: NaiveDateTime) -> Vec<(&str, i64)> {
    let mut spans = Vec::with_capacity(event.subtasks.len());
    for (index, subtask) in event.subtasks.iter().enumerate() {
        let start = subtask.timestamp.max(event.timestamp).min(end);
        let stop = event
            .subtasks
            .get(index + 1)
            .map_or(end, |next| next.timestamp)
            .max(start)
            .min(end);
        spans.push((subtask.name.as_str(), (stop - start).num_milliseconds()));
    }
    spans
}

/// Computes per-project durations and the included/excluded totals.
///
/// For a closed (STOP-terminated) day,
/// `included_ms + excluded_ms == stop.timestamp - first.timestamp`; for an
/// open day the boundary is `now`.
#[must_use]
pub fn summarize(day: &DayLog, now: NaiveDateTime) -> DaySummary {
    let events = day.events();
    let mut summary = DaySummary::default();

    for (index, event) in events.iter().enumerate() {
        let Some(end) = interval_end(events, index, now) else {
            continue;
        };
        if events.get(index + 1).is_none() {
            summary.open = true;
        }
        let interval_ms = (end - event.timestamp).num_milliseconds();

        let kind = event.kind();
        let bucket = summary
            .projects
            .entry(event.name.clone())
            .or_insert_with(|| ProjectTotals::new(kind));

        let mut own_ms = interval_ms;
        for (name, span_ms) in subtask_spans(event, end) {
            *bucket.subtasks.entry(name.to_string()).or_insert(0) += span_ms;
            own_ms -= span_ms;
        }
        bucket.total_ms += own_ms;

        if kind.is_excluded() {
            summary.excluded_ms += interval_ms;
        } else {
            summary.included_ms += interval_ms;
        }
    }

    summary
}
