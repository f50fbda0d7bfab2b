//! Session Snapshot File
//!
//! Layout: a [`FINGERPRINT_LEN`]-byte fingerprint header, then every slot's
//! state in slot order, each exactly `struct_size` bytes of bincode fixed-int
//! encoding. No length prefixes, no padding, no compression.
//!
//! A read either yields every slot or nothing. A missing file, a size that is
//! off by even one byte, a foreign fingerprint or an undecodable slot all
//! produce [`SnapshotOutcome::Absent`].

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::state::ClientSessionState;

/// Bytes taken by the fingerprint header.
pub const FINGERPRINT_LEN: usize = 4;

/// Identifies the configuration a snapshot was written under (the game
/// mode). A snapshot from a different configuration is never applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub i32);

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a snapshot was not used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AbsentReason {
    /// No file at the path.
    Missing,
    /// The file exists but could not be read.
    Unreadable,
    /// File length is not header plus one record per slot.
    SizeMismatch {
        /// Length the current layout requires.
        expected: usize,
        /// Length found.
        actual: usize,
    },
    /// Written under another configuration.
    FingerprintMismatch {
        /// Fingerprint in the file.
        stored: Fingerprint,
        /// Fingerprint of the running configuration.
        expected: Fingerprint,
    },
    /// A record did not decode (e.g. an out-of-range enum tag).
    Corrupt,
}

impl fmt::Display for AbsentReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbsentReason::Missing => write!(f, "no snapshot file"),
            AbsentReason::Unreadable => write!(f, "snapshot file unreadable"),
            AbsentReason::SizeMismatch { expected, actual } => {
                write!(f, "snapshot is {} bytes, expected {}", actual, expected)
            }
            AbsentReason::FingerprintMismatch { stored, expected } => {
                write!(f, "snapshot fingerprint {} does not match {}", stored, expected)
            }
            AbsentReason::Corrupt => write!(f, "snapshot record failed to decode"),
        }
    }
}

/// Result of reading a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SnapshotOutcome {
    /// Every slot, in slot order.
    Restored(Vec<ClientSessionState>),
    /// Nothing usable; start fresh.
    Absent(AbsentReason),
}

/// Snapshot write errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// File could not be written.
    #[error("snapshot io: {0}")]
    Io(#[from] io::Error),
    /// A state could not be encoded.
    #[error("snapshot encode: {0}")]
    Encode(#[from] bincode::Error),
}

/// Expected file length for `slot_count` records of `struct_size` bytes, or
/// `None` if that length is not representable.
pub fn snapshot_len(slot_count: usize, struct_size: usize) -> Option<usize> {
    slot_count
        .checked_mul(struct_size)?
        .checked_add(FINGERPRINT_LEN)
}

/// Encode a full snapshot.
pub fn encode_snapshot(
    states: &[ClientSessionState],
    fingerprint: Fingerprint,
) -> Result<Vec<u8>, SnapshotError> {
    let capacity = snapshot_len(states.len(), ClientSessionState::ENCODED_SIZE).unwrap_or(0);
    let mut bytes = Vec::with_capacity(capacity);
    bincode::serialize_into(&mut bytes, &fingerprint)?;
    for state in states {
        bincode::serialize_into(&mut bytes, state)?;
    }
    Ok(bytes)
}

/// Decode a full snapshot, all or nothing.
pub fn decode_snapshot(
    bytes: &[u8],
    slot_count: usize,
    struct_size: usize,
    expected: Fingerprint,
) -> SnapshotOutcome {
    let expected_len = snapshot_len(slot_count, struct_size);
    if expected_len != Some(bytes.len()) || struct_size != ClientSessionState::ENCODED_SIZE {
        return SnapshotOutcome::Absent(AbsentReason::SizeMismatch {
            expected: expected_len.unwrap_or(usize::MAX),
            actual: bytes.len(),
        });
    }

    let (header, records) = bytes.split_at(FINGERPRINT_LEN);
    let stored: Fingerprint = match bincode::deserialize(header) {
        Ok(stored) => stored,
        Err(_) => return SnapshotOutcome::Absent(AbsentReason::Corrupt),
    };
    if stored != expected {
        return SnapshotOutcome::Absent(AbsentReason::FingerprintMismatch { stored, expected });
    }

    let decoded: Result<Vec<ClientSessionState>, _> = records
        .chunks_exact(struct_size)
        .map(|record| bincode::deserialize(record))
        .collect();
    match decoded {
        Ok(states) => SnapshotOutcome::Restored(states),
        Err(_) => SnapshotOutcome::Absent(AbsentReason::Corrupt),
    }
}

/// Write every slot to `path`, replacing any previous file.
pub fn write_snapshot(
    path: impl AsRef<Path>,
    states: &[ClientSessionState],
    fingerprint: Fingerprint,
) -> Result<(), SnapshotError> {
    let bytes = encode_snapshot(states, fingerprint)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Read a snapshot written for `slot_count` slots under `expected`.
pub fn read_snapshot(
    path: impl AsRef<Path>,
    slot_count: usize,
    struct_size: usize,
    expected: Fingerprint,
) -> SnapshotOutcome {
    match fs::read(path) {
        Ok(bytes) => decode_snapshot(&bytes, slot_count, struct_size, expected),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            SnapshotOutcome::Absent(AbsentReason::Missing)
        }
        Err(_) => SnapshotOutcome::Absent(AbsentReason::Unreadable),
    }
}

// =============================================================================
// TESTS
// =============================================================================
