//! Recorder Vocabulary
//!
//! Ids, level events, and the row types the read APIs hand back.

use chrono::{DateTime, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use crate::core::address::Endpoint;

/// Id of a `levels` row. Opaque to the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LevelId(pub i64);

/// Id of a `sessions` row. Opaque to the simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub i64);

impl LevelId {
    /// Returned when the level could not be recorded.
    pub const INVALID: LevelId = LevelId(-1);

    /// Whether this id refers to a recorded row.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl SessionId {
    /// Returned when the session could not be recorded.
    pub const INVALID: SessionId = SessionId(-1);

    /// Whether this id refers to a recorded row.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

/// Kind of a level event, stored as a small integer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelEventKind {
    /// No particular kind.
    None,
    /// A client changed team. Context: client slot, old team, new team.
    TeamChanged,
    /// Host-defined kind.
    Other(i32),
}

impl LevelEventKind {
    /// Stored integer code.
    pub fn code(self) -> i32 {
        match self {
            LevelEventKind::None => 0,
            LevelEventKind::TeamChanged => 1,
            LevelEventKind::Other(code) => code,
        }
    }

    /// Decode a stored integer.
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => LevelEventKind::None,
            1 => LevelEventKind::TeamChanged,
            other => LevelEventKind::Other(other),
        }
    }
}

/// Something that happened during a level.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelEvent {
    /// Milliseconds since the level started.
    pub level_time: i32,
    /// Event kind.
    pub kind: LevelEventKind,
    /// Integer context slots.
    pub context: [i32; 4],
    /// Free-text context.
    pub text: String,
}

impl LevelEvent {
    /// Event with empty context.
    pub fn new(level_time: i32, kind: LevelEventKind) -> Self {
        Self {
            level_time,
            kind,
            context: [0; 4],
            text: String::new(),
        }
    }

    /// Set the integer context slots.
    pub fn with_context(mut self, context: [i32; 4]) -> Self {
        self.context = context;
        self
    }

    /// Set the text context.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// A team change by the client in `slot`.
    pub fn team_changed(level_time: i32, slot: i32, old_team: i32, new_team: i32) -> Self {
        Self::new(level_time, LevelEventKind::TeamChanged)
            .with_context([slot, old_team, new_team, 0])
    }
}

/// Lifecycle of a level or session row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordState {
    /// `end_time` not yet set.
    Open,
    /// `end_time` set; the row is history.
    Closed,
}

/// A `levels` row.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelRow {
    /// Level id.
    pub id: LevelId,
    /// When the level started.
    pub start_time: Option<DateTime<Utc>>,
    /// When the level ended.
    pub end_time: Option<DateTime<Utc>>,
    /// Map name.
    pub map_name: String,
    /// Whether this was a map restart.
    pub is_restart: bool,
}

impl LevelRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: LevelId(row.get(0)?),
            start_time: row.get(1)?,
            end_time: row.get(2)?,
            map_name: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
            is_restart: row.get::<_, Option<bool>>(4)?.unwrap_or(false),
        })
    }

    /// Open or closed.
    pub fn state(&self) -> RecordState {
        if self.end_time.is_some() {
            RecordState::Closed
        } else {
            RecordState::Open
        }
    }
}

/// A `sessions` row.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionRow {
    /// Session id.
    pub id: SessionId,
    /// When the client connected.
    pub start_time: Option<DateTime<Utc>>,
    /// When the client disconnected.
    pub end_time: Option<DateTime<Utc>>,
    /// Parsed client endpoint.
    pub endpoint: Endpoint,
}

impl SessionRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: SessionId(row.get(0)?),
            start_time: row.get(1)?,
            end_time: row.get(2)?,
            endpoint: Endpoint::new(
                [row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?],
                row.get(7)?,
            ),
        })
    }

    /// Open or closed.
    pub fn state(&self) -> RecordState {
        if self.end_time.is_some() {
            RecordState::Closed
        } else {
            RecordState::Open
        }
    }
}

/// A `level_events` row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelEventRow {
    /// Event row id.
    pub id: i64,
    /// Owning level.
    pub level_id: LevelId,
    /// The event as logged.
    pub event: LevelEvent,
}

impl LevelEventRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            level_id: LevelId(row.get(1)?),
            event: LevelEvent {
                level_time: row.get(2)?,
                kind: LevelEventKind::from_code(row.get(3)?),
                context: [row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?],
                text: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_codes() {
        assert_eq!(LevelEventKind::None.code(), 0);
        assert_eq!(LevelEventKind::TeamChanged.code(), 1);
        assert_eq!(LevelEventKind::from_code(1), LevelEventKind::TeamChanged);
        assert_eq!(LevelEventKind::from_code(77), LevelEventKind::Other(77));
    }

    #[test]
    fn test_sentinel_ids_are_invalid() {
        assert!(!LevelId::INVALID.is_valid());
        assert!(!SessionId::INVALID.is_valid());
        assert!(LevelId(1).is_valid());
    }

    #[test]
    fn test_team_changed_context() {
        let event = LevelEvent::team_changed(1500, 3, 1, 2);
        assert_eq!(event.kind, LevelEventKind::TeamChanged);
        assert_eq!(event.context, [3, 1, 2, 0]);
        assert!(event.text.is_empty());
    }
}
