//! Events, subtasks and notes: the raw material of a day's log.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Reserved markers with fixed semantics.
///
/// By convention user-entered project names are lowercase; the reserved names
/// are uppercase and recognised exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialEvent {
    /// Placeholder project recorded by a bare `start`; should not survive in
    /// a finalized log.
    Default,
    /// Terminates the day's session.
    Stop,
    /// Lunch break.
    Lunch,
}

impl SpecialEvent {
    /// The reserved name for this marker.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "DEFAULT",
            Self::Stop => "STOP",
            Self::Lunch => "LUNCH",
        }
    }

    /// Looks up a reserved name. Anything else is an ordinary project.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "DEFAULT" => Some(Self::Default),
            "STOP" => Some(Self::Stop),
            "LUNCH" => Some(Self::Lunch),
            _ => None,
        }
    }

    /// Whether intervals owned by this marker count as excluded time.
    #[must_use]
    pub const fn is_excluded(self) -> bool {
        matches!(self, Self::Stop | Self::Lunch)
    }
}

impl fmt::Display for SpecialEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification of an event, derived from its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A user project.
    Normal,
    /// One of the reserved markers.
    Special(SpecialEvent),
}

impl EventKind {
    /// Classifies a name.
    #[must_use]
    pub fn for_name(name: &str) -> Self {
        SpecialEvent::from_name(name).map_or(Self::Normal, Self::Special)
    }

    /// Whether intervals owned by this kind go to the excluded total.
    #[must_use]
    pub const fn is_excluded(self) -> bool {
        match self {
            Self::Normal => false,
            Self::Special(special) => special.is_excluded(),
        }
    }

    /// Whether this is the `DEFAULT` placeholder.
    #[must_use]
    pub const fn is_placeholder(self) -> bool {
        matches!(self, Self::Special(SpecialEvent::Default))
    }

    /// Whether this is the `STOP` marker.
    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Special(SpecialEvent::Stop))
    }
}

/// Free-text annotation attached to an event or subtask.
///
/// Notes are purely descriptive and never affect duration math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub timestamp: NaiveDateTime,
}

/// A named sub-interval nested under an event.
///
/// A subtask's duration is carved out of its parent's interval; it never
/// appears in the top-level totals under its own name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub name: String,
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

impl Subtask {
    pub fn new(name: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            timestamp,
            notes: Vec::new(),
        }
    }
}

/// A named, timestamped marker starting an interval of tracked or excluded
/// time. Owns its subtasks and notes.
///
/// The kind is not stored: it is a pure function of the name, so renames can
/// never leave the two out of sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub timestamp: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<Subtask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<Note>,
}

impl Event {
    pub fn new(name: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            name: name.into(),
            timestamp,
            subtasks: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// The event's classification, derived from its name.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        EventKind::for_name(&self.name)
    }
}
