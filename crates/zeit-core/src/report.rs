//! The status report tree handed to adapters.
//!
//! The core's contract is the structure, not its rendering: a day node with
//! event children, subtask grandchildren and note leaves, each annotated with
//! its start timestamp and computed duration, plus the grand totals. The tree
//! is `Serialize` so adapters can also emit it as JSON verbatim.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::day::DayLog;
use crate::summary::{interval_end, subtask_spans};

/// A subtask annotated with its carved-out span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtaskNode {
    pub name: String,
    pub start: NaiveDateTime,
    pub duration_ms: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// An event annotated with its own (post-carve-out) duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventNode {
    pub name: String,
    pub start: NaiveDateTime,
    /// The event's own time; `None` for a closed day's terminal STOP, which
    /// owns no interval.
    pub duration_ms: Option<i64>,
    pub excluded: bool,
    pub placeholder: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<SubtaskNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// The full day tree plus grand totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub events: Vec<EventNode>,
    pub included_ms: i64,
    pub excluded_ms: i64,
    pub open: bool,
}

/// Builds the report tree for a day.
///
/// Node durations are derived with the same interval math as
/// [`crate::summary::summarize`], so the tree and the totals always agree.
#[must_use]
pub fn build_report(day: &DayLog, now: NaiveDateTime) -> DayReport {
    let events = day.events();
    let mut nodes = Vec::with_capacity(events.len());
    let mut included_ms = 0;
    let mut excluded_ms = 0;
    let mut open = false;

    for (index, event) in events.iter().enumerate() {
        let kind = event.kind();
        let end = interval_end(events, index, now);
        let mut subtask_nodes = Vec::with_capacity(event.subtasks.len());
        let mut own_ms = None;

        if let Some(end) = end {
            if events.get(index + 1).is_none() {
                open = true;
            }
            let interval_ms = (end - event.timestamp).num_milliseconds();
            let mut remainder = interval_ms;
            for ((name, span_ms), subtask) in
                subtask_spans(event, end).into_iter().zip(&event.subtasks)
            {
                subtask_nodes.push(SubtaskNode {
                    name: name.to_string(),
                    start: subtask.timestamp,
                    duration_ms: span_ms,
                    notes: subtask.notes.iter().map(|n| n.text.clone()).collect(),
                });
                remainder -= span_ms;
            }
            own_ms = Some(remainder);
            if kind.is_excluded() {
                excluded_ms += interval_ms;
            } else {
                included_ms += interval_ms;
            }
        }

        nodes.push(EventNode {
            name: event.name.clone(),
            start: event.timestamp,
            duration_ms: own_ms,
            excluded: kind.is_excluded(),
            placeholder: kind.is_placeholder(),
            subtasks: subtask_nodes,
            notes: event.notes.iter().map(|n| n.text.clone()).collect(),
        });
    }

    DayReport {
        date: day.date(),
        events: nodes,
        included_ms,
        excluded_ms,
        open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::event::{Event, Subtask};
    use crate::summary::summarize;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        date().and_hms_opt(hour, minute, 0).unwrap()
    }

    const MINUTE_MS: i64 = 60 * 1000;

    fn sample_day() -> DayLog {
        let mut writing = Event::new("writing", ts(9, 0));
        writing.subtasks.push(Subtask::new("outline", ts(9, 10)));
        let mut day = DayLog::from_events(
            date(),
            vec![
                writing,
                Event::new("LUNCH", ts(12, 0)),
                Event::new("review", ts(13, 0)),
            ],
        );
        day.attach_note("ship it", ts(13, 30)).unwrap();
        day.append(Event::new("STOP", ts(17, 0))).unwrap();
        day
    }

    #[test]
    fn tree_mirrors_the_event_sequence() {
        let report = build_report(&sample_day(), ts(18, 0));
        let names: Vec<_> = report.events.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, ["writing", "LUNCH", "review", "STOP"]);
        assert_eq!(report.date, date());
        assert!(!report.open);
    }

    #[test]
    fn node_durations_carve_out_subtasks() {
        let report = build_report(&sample_day(), ts(18, 0));
        let writing = &report.events[0];
        // [9:00, 12:00) minus the outline subtask's [9:10, 12:00).
        assert_eq!(writing.duration_ms, Some(10 * MINUTE_MS));
        assert_eq!(writing.subtasks[0].duration_ms, 170 * MINUTE_MS);
    }

    #[test]
    fn terminal_stop_owns_no_interval() {
        let report = build_report(&sample_day(), ts(18, 0));
        let stop = report.events.last().unwrap();
        assert_eq!(stop.duration_ms, None);
        assert!(stop.excluded);
    }

    #[test]
    fn notes_surface_on_their_owning_node() {
        let report = build_report(&sample_day(), ts(18, 0));
        let review = &report.events[2];
        assert_eq!(review.notes, ["ship it"]);
    }

    #[test]
    fn totals_agree_with_the_summary() {
        let day = sample_day();
        let now = ts(18, 0);
        let report = build_report(&day, now);
        let summary = summarize(&day, now);
        assert_eq!(report.included_ms, summary.included_ms);
        assert_eq!(report.excluded_ms, summary.excluded_ms);
        assert_eq!(report.open, summary.open);
    }

    #[test]
    fn open_day_is_reported_open() {
        let day = DayLog::from_events(date(), vec![Event::new("writing", ts(9, 0))]);
        let report = build_report(&day, ts(9, 30));
        assert!(report.open);
        assert_eq!(report.events[0].duration_ms, Some(30 * MINUTE_MS));
    }

    #[test]
    fn report_serializes_to_json() {
        let report = build_report(&sample_day(), ts(18, 0));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["events"][0]["name"], "writing");
        assert_eq!(json["included_ms"], report.included_ms);
        // Empty note/subtask lists are omitted.
        assert!(json["events"][1].get("subtasks").is_none());
    }
}
