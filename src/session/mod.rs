//! Session Snapshot Store
//!
//! Per-client state that outlives a level change or a process restart.
//!
//! ## Module Structure
//!
//! - `state`: the fixed-layout per-client record and its connect-time init
//! - `fixed_str`: NUL-padded string fields
//! - `arena`: one record per client slot
//! - `snapshot`: the binary file codec
//! - `world`: restart detection and save/restore of the arena

pub mod arena;
pub mod fixed_str;
pub mod snapshot;
pub mod state;
pub mod world;

pub use arena::{ClientArena, SlotId, DEFAULT_CLIENTS, MAX_CLIENTS};
pub use fixed_str::FixedStr;
pub use snapshot::{
    decode_snapshot, encode_snapshot, read_snapshot, write_snapshot, AbsentReason, Fingerprint,
    SnapshotError, SnapshotOutcome, FINGERPRINT_LEN,
};
pub use state::{ClientSessionState, ConnectInfo, DuelTeam, SessionInit, SpectatorState, Team};
pub use world::{restore_sessions, save_sessions, WorldSession};
