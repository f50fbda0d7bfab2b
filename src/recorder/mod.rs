//! Lifecycle Recorder
//!
//! Session/level/event vocabulary on top of the storage layer, plus the
//! admin-facing access lists and map pools that share the same database.
//!
//! ## Module Structure
//!
//! - `lifecycle`: levels, sessions, level events, anomalies, stats flush
//! - `events`: ids, event kinds, row types
//! - `stats`: per-session accuracy counters
//! - `access`: address/mask whitelist and blacklist
//! - `pools`: weighted map pools

pub mod access;
pub mod events;
pub mod lifecycle;
pub mod pools;
pub mod stats;

pub use access::{BlacklistEntry, WhitelistEntry};
pub use events::{
    LevelEvent, LevelEventKind, LevelEventRow, LevelId, LevelRow, RecordState, SessionId,
    SessionRow,
};
pub use lifecycle::Recorder;
pub use pools::PoolMapRow;
pub use stats::SessionStats;
