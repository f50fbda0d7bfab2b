//! Lifecycle Recorder
//!
//! Records levels, client sessions, level events and anomaly reports.
//!
//! ## Failure Policy
//!
//! Nothing here may disrupt gameplay. If the store failed to open the
//! recorder runs disabled: `start_*` returns the sentinel id and every other
//! call is a no-op. Statement failures are logged and the record is dropped.
//!
//! ## Record Lifecycle
//!
//! ```text
//! start_level / start_session          end_level / end_session
//!        │                                     │
//!        ▼                                     ▼
//!     ┌──────┐   end_time set (once)      ┌────────┐
//!     │ Open │ ─────────────────────────▶ │ Closed │  (immutable history)
//!     └──────┘                            └────────┘
//! ```

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, Params};
use tracing::{debug, error, info, warn};

use crate::core::address::Endpoint;
use crate::core::clock::{Clock, SystemClock};
use crate::recorder::events::{LevelEvent, LevelEventRow, LevelId, LevelRow, SessionId, SessionRow};
use crate::recorder::stats::SessionStats;
use crate::storage::{Executed, Listing, Store};

const SQL_LEVEL_START: &str =
    "INSERT INTO levels (level_start, mapname, restart) VALUES (?1, ?2, ?3)";

const SQL_LEVEL_END: &str =
    "UPDATE levels SET level_end = ?1 WHERE level_id = ?2 AND level_end IS NULL";

const SQL_SESSION_START: &str = "INSERT INTO sessions \
     (session_start, ip_A, ip_B, ip_C, ip_D, ip_port) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";

const SQL_SESSION_END: &str =
    "UPDATE sessions SET session_end = ?1 WHERE session_id = ?2 AND session_end IS NULL";

const SQL_LEVEL_EVENT: &str = "INSERT INTO level_events (level_id, event_level_time, event_id, \
     event_context_i1, event_context_i2, event_context_i3, event_context_i4, event_context) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";

const SQL_HACK_ATTEMPT: &str =
    "INSERT INTO hack_attempts (session_id, ip_text, description) VALUES (?1, ?2, ?3)";

const SQL_SESSION_STATS: &str = "INSERT INTO session_stats \
     (session_id, accuracy_hits, accuracy_shots) SELECT ?1, ?2, ?3 \
     WHERE NOT EXISTS (SELECT 1 FROM session_stats WHERE session_id = ?1)";

const SQL_LIST_LEVELS: &str =
    "SELECT level_id, level_start, level_end, mapname, restart FROM levels ORDER BY level_id";

const SQL_LIST_SESSIONS: &str = "SELECT session_id, session_start, session_end, \
     ip_A, ip_B, ip_C, ip_D, ip_port FROM sessions ORDER BY session_id";

const SQL_LIST_LEVEL_EVENTS: &str = "SELECT level_event_id, level_id, event_level_time, event_id, \
     event_context_i1, event_context_i2, event_context_i3, event_context_i4, event_context \
     FROM level_events WHERE level_id = ?1 ORDER BY level_event_id";

/// Session/level/event logging on top of the store.
pub struct Recorder {
    store: Option<Store>,
    clock: Box<dyn Clock>,
}

impl Recorder {
    /// Open the log database at `path`.
    ///
    /// Never fails: if the store cannot be opened or created the recorder
    /// comes up disabled.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Store::open(path) {
            Ok(store) => {
                info!("Log database {} ready ({:?})", path.display(), store.bootstrap());
                Self::with_store(store, Box::new(SystemClock))
            }
            Err(err) => {
                error!("Log database unavailable, persistence disabled: {}", err);
                Self::disabled()
            }
        }
    }

    /// Recorder over an already-open store.
    pub fn with_store(store: Store, clock: Box<dyn Clock>) -> Self {
        Self {
            store: Some(store),
            clock,
        }
    }

    /// Recorder that records nothing.
    pub fn disabled() -> Self {
        Self {
            store: None,
            clock: Box::new(SystemClock),
        }
    }

    /// Whether a store is attached.
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// The underlying store, if any.
    pub fn store(&self) -> Option<&Store> {
        self.store.as_ref()
    }

    pub(crate) fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Close the store. Called once at shutdown.
    pub fn unload(self) {
        if let Some(store) = self.store {
            if let Err(err) = store.close() {
                warn!("Closing log database failed: {}", err);
            }
        }
    }

    /// Run one statement, logging and swallowing failures.
    pub(crate) fn run<P: Params>(&self, what: &str, sql: &str, params: P) -> Option<Executed> {
        let store = self.store.as_ref()?;
        match store.execute(sql, params) {
            Ok(done) => Some(done),
            Err(err) => {
                warn!("{} not recorded: {}", what, err);
                None
            }
        }
    }

    /// Build a listing, or `None` when disabled.
    pub(crate) fn listing<T>(
        &self,
        sql: &'static str,
        params: Vec<Value>,
        map: fn(&rusqlite::Row<'_>) -> rusqlite::Result<T>,
    ) -> Option<Listing<'_, T>> {
        self.store.as_ref().map(|store| store.query(sql, params, map))
    }

    // =========================================================================
    // LEVELS
    // =========================================================================

    /// Record the start of a level. Returns the new level id, or
    /// [`LevelId::INVALID`] if nothing was recorded.
    pub fn start_level(&self, map_name: &str, is_restart: bool) -> LevelId {
        self.run(
            "level start",
            SQL_LEVEL_START,
            params![self.clock.now(), map_name, is_restart],
        )
        .map(|done| LevelId(done.last_insert_id))
        .unwrap_or(LevelId::INVALID)
    }

    /// Close a level. Returns false if the level is unknown or already closed.
    pub fn end_level(&self, level_id: LevelId) -> bool {
        if !level_id.is_valid() {
            return false;
        }
        let closed = self
            .run("level end", SQL_LEVEL_END, params![self.clock.now(), level_id.0])
            .is_some_and(|done| done.rows_affected > 0);
        if !closed {
            debug!("Level {} not open, end ignored", level_id.0);
        }
        closed
    }

    /// Append an event to a level. Returns whether the row was written.
    pub fn log_level_event(&self, level_id: LevelId, event: &LevelEvent) -> bool {
        if !level_id.is_valid() {
            return false;
        }
        let [c1, c2, c3, c4] = event.context;
        self.run(
            "level event",
            SQL_LEVEL_EVENT,
            params![level_id.0, event.level_time, event.kind.code(), c1, c2, c3, c4, event.text],
        )
        .is_some()
    }

    /// All levels, oldest first.
    pub fn levels(&self) -> Option<Listing<'_, LevelRow>> {
        self.listing(SQL_LIST_LEVELS, Vec::new(), LevelRow::from_row)
    }

    /// Events of one level, in insertion order.
    pub fn level_events(&self, level_id: LevelId) -> Option<Listing<'_, LevelEventRow>> {
        let params = vec![Value::Integer(level_id.0)];
        self.listing(SQL_LIST_LEVEL_EVENTS, params, LevelEventRow::from_row)
    }

    // =========================================================================
    // SESSIONS
    // =========================================================================

    /// Record a client connection from `endpoint_text` (`"A.B.C.D:port"`).
    ///
    /// Unparsable endpoints are recorded as zeros; the row is still written.
    pub fn start_session(&self, endpoint_text: &str) -> SessionId {
        let endpoint = Endpoint::parse(endpoint_text);
        if endpoint.is_unknown() {
            debug!("Unparsable endpoint {:?}, recording as unknown", endpoint_text);
        }
        let [a, b, c, d] = endpoint.octets;
        self.run(
            "session start",
            SQL_SESSION_START,
            params![self.clock.now(), a, b, c, d, endpoint.port],
        )
        .map(|done| SessionId(done.last_insert_id))
        .unwrap_or(SessionId::INVALID)
    }

    /// Close a session. Returns false if the session is unknown or already
    /// closed.
    pub fn end_session(&self, session_id: SessionId) -> bool {
        if !session_id.is_valid() {
            return false;
        }
        let closed = self
            .run("session end", SQL_SESSION_END, params![self.clock.now(), session_id.0])
            .is_some_and(|done| done.rows_affected > 0);
        if !closed {
            debug!("Session {} not open, end ignored", session_id.0);
        }
        closed
    }

    /// Write a session's accuracy counters.
    ///
    /// A session gets one stats row. Later flushes for the same session are
    /// ignored and return false.
    pub fn flush_session_stats(&self, session_id: SessionId, stats: &SessionStats) -> bool {
        if !session_id.is_valid() {
            return false;
        }
        let written = self
            .run(
                "session stats",
                SQL_SESSION_STATS,
                params![session_id.0, stats.hits, stats.shots],
            )
            .is_some_and(|done| done.rows_affected > 0);
        if !written {
            debug!("Stats for session {} not written", session_id.0);
        }
        written
    }

    /// All sessions, oldest first.
    pub fn sessions(&self) -> Option<Listing<'_, SessionRow>> {
        self.listing(SQL_LIST_SESSIONS, Vec::new(), SessionRow::from_row)
    }

    // =========================================================================
    // ANOMALIES
    // =========================================================================

    /// Record a suspected hack attempt. `session_id` is `None` when the
    /// anomaly was seen before a session existed.
    pub fn report_anomaly(
        &self,
        session_id: Option<SessionId>,
        ip_text: &str,
        description: &str,
    ) -> bool {
        let session = session_id.filter(|id| id.is_valid()).map(|id| id.0);
        warn!("Anomaly from {}: {}", ip_text, description);
        self.run("hack attempt", SQL_HACK_ATTEMPT, params![session, ip_text, description])
            .is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================
