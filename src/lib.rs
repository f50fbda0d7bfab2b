//! # Game Persistence
//!
//! Durable records for a multiplayer game server: level and session
//! lifecycle, gameplay events, anomaly reports, access lists and map pools in
//! SQLite, plus a binary snapshot of per-client session state that survives
//! process restarts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     GAME PERSISTENCE                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Shared primitives                         │
//! │  ├── address.rs  - "A.B.C.D:port" parsing, masks             │
//! │  ├── clock.rs    - Injectable wall clock                     │
//! │  └── hash.rs     - Client id hashing                         │
//! │                                                              │
//! │  storage/        - Storage Engine                            │
//! │  ├── engine.rs   - Open/create/repair, execute, query        │
//! │  ├── schema.rs   - Table definitions                         │
//! │  └── listing.rs  - Lazy restartable result sets              │
//! │                                                              │
//! │  recorder/       - Lifecycle Recorder                        │
//! │  ├── lifecycle.rs- Levels, sessions, events, anomalies       │
//! │  ├── events.rs   - Ids, event kinds, rows                    │
//! │  ├── stats.rs    - Accuracy counters                         │
//! │  ├── access.rs   - Whitelist / blacklist                     │
//! │  └── pools.rs    - Weighted map pools                        │
//! │                                                              │
//! │  session/        - Session Snapshot Store                    │
//! │  ├── state.rs    - Per-client fixed-layout record            │
//! │  ├── arena.rs    - One record per client slot                │
//! │  ├── snapshot.rs - Binary file codec                         │
//! │  └── world.rs    - Restart detection                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Model
//!
//! Persistence is best effort. The [`Recorder`] never hands an error to the
//! simulation: a failed insert yields an invalid id, a failed update yields
//! `false`, and the failure is logged. A snapshot that cannot be trusted is
//! discarded as a whole and the server starts a new session.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod recorder;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use crate::config::PersistConfig;
pub use crate::core::address::Endpoint;
pub use crate::core::clock::{Clock, SystemClock};
pub use crate::recorder::{LevelEvent, LevelEventKind, LevelId, Recorder, SessionId, SessionStats};
pub use crate::session::{ClientArena, ClientSessionState, Fingerprint, WorldSession};
pub use crate::storage::{Bootstrap, StorageError, Store};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
