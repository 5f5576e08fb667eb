//! Structural checks over a day's events.
//!
//! The rule set is fixed and every rule is evaluated independently against
//! the full day, so the report always carries all four results.

use std::fmt;

use crate::day::DayLog;
use crate::event::SpecialEvent;

/// The fixed validation rules, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    /// No event is the `DEFAULT` placeholder.
    NoDefaultEvents,
    /// The day's last event is the `STOP` marker.
    HasFinalStop,
    /// At least one `LUNCH` event exists.
    HasLunch,
    /// No subtask is named `DEFAULT`.
    NoDefaultSubtasks,
}

impl Rule {
    /// All rules in evaluation order.
    pub const ALL: [Self; 4] = [
        Self::NoDefaultEvents,
        Self::HasFinalStop,
        Self::HasLunch,
        Self::NoDefaultSubtasks,
    ];

    /// Stable identifier for adapters and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoDefaultEvents => "no_default_events",
            Self::HasFinalStop => "has_final_stop",
            Self::HasLunch => "has_lunch",
            Self::NoDefaultSubtasks => "no_default_subtasks",
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One rule's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleCheck {
    pub rule: Rule,
    pub passed: bool,
}

/// Runs every rule against the day. No short-circuiting.
#[must_use]
pub fn validate(day: &DayLog) -> Vec<RuleCheck> {
    Rule::ALL
        .iter()
        .map(|&rule| RuleCheck {
            rule,
            passed: check(rule, day),
        })
        .collect()
}

fn check(rule: Rule, day: &DayLog) -> bool {
    let events = day.events();
    match rule {
        Rule::NoDefaultEvents => !events.iter().any(|e| e.kind().is_placeholder()),
        Rule::HasFinalStop => events.last().is_some_and(|e| e.kind().is_stop()),
        Rule::HasLunch => events
            .iter()
            .any(|e| e.kind() == crate::event::EventKind::Special(SpecialEvent::Lunch)),
        Rule::NoDefaultSubtasks => !events
            .iter()
            .flat_map(|e| e.subtasks.iter())
            .any(|s| s.name == SpecialEvent::Default.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::event::Event;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        date().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn failed(checks: &[RuleCheck]) -> Vec<Rule> {
        checks
            .iter()
            .filter(|check| !check.passed)
            .map(|check| check.rule)
            .collect()
    }

    fn well_formed_day() -> DayLog {
        DayLog::from_events(
            date(),
            vec![
                Event::new("work", ts(9, 0)),
                Event::new("LUNCH", ts(12, 0)),
                Event::new("work", ts(13, 0)),
                Event::new("STOP", ts(17, 0)),
            ],
        )
    }

    #[test]
    fn well_formed_day_passes_all_rules() {
        let checks = validate(&well_formed_day());
        assert_eq!(checks.len(), 4);
        assert!(checks.iter().all(|check| check.passed));
    }

    #[test]
    fn report_order_is_stable() {
        let checks = validate(&well_formed_day());
        let rules: Vec<_> = checks.iter().map(|check| check.rule).collect();
        assert_eq!(rules, Rule::ALL);
    }

    #[test]
    fn default_event_fails_exactly_one_rule() {
        let mut day = well_formed_day();
        day.append_backdated(Event::new("DEFAULT", ts(8, 0)));
        assert_eq!(failed(&validate(&day)), [Rule::NoDefaultEvents]);
    }

    #[test]
    fn missing_final_stop_fails_exactly_one_rule() {
        let day = DayLog::from_events(
            date(),
            vec![
                Event::new("work", ts(9, 0)),
                Event::new("LUNCH", ts(12, 0)),
                Event::new("work", ts(13, 0)),
            ],
        );
        assert_eq!(failed(&validate(&day)), [Rule::HasFinalStop]);
    }

    #[test]
    fn stop_in_the_middle_does_not_count_as_final() {
        let day = DayLog::from_events(
            date(),
            vec![
                Event::new("STOP", ts(12, 0)),
                Event::new("LUNCH", ts(12, 30)),
                Event::new("work", ts(13, 0)),
            ],
        );
        assert_eq!(failed(&validate(&day)), [Rule::HasFinalStop]);
    }

    #[test]
    fn missing_lunch_fails_exactly_one_rule() {
        let day = DayLog::from_events(
            date(),
            vec![Event::new("work", ts(9, 0)), Event::new("STOP", ts(17, 0))],
        );
        assert_eq!(failed(&validate(&day)), [Rule::HasLunch]);
    }

    #[test]
    fn default_subtask_fails_exactly_one_rule() {
        let mut day = DayLog::new(date());
        day.append(Event::new("work", ts(9, 0))).unwrap();
        day.attach_subtask("DEFAULT", ts(9, 30), None).unwrap();
        day.append(Event::new("LUNCH", ts(12, 0))).unwrap();
        day.append(Event::new("STOP", ts(17, 0))).unwrap();
        assert_eq!(failed(&validate(&day)), [Rule::NoDefaultSubtasks]);
    }

    #[test]
    fn empty_day_fails_the_presence_rules_only() {
        let day = DayLog::new(date());
        assert_eq!(
            failed(&validate(&day)),
            [Rule::HasFinalStop, Rule::HasLunch]
        );
    }

    #[test]
    fn independent_failures_accumulate() {
        // DEFAULT event, no LUNCH, no terminal STOP: three failures at once.
        let day = DayLog::from_events(
            date(),
            vec![
                Event::new("DEFAULT", ts(9, 0)),
                Event::new("work", ts(10, 0)),
            ],
        );
        assert_eq!(
            failed(&validate(&day)),
            [Rule::NoDefaultEvents, Rule::HasFinalStop, Rule::HasLunch]
        );
    }
}
