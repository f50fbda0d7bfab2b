//! World Session
//!
//! Restart detection: decides on boot whether per-client state from the
//! previous process can be trusted, and writes it back on shutdown.

use std::path::Path;

use tracing::{info, warn};

use crate::session::arena::ClientArena;
use crate::session::snapshot::{
    read_snapshot, write_snapshot, AbsentReason, Fingerprint, SnapshotError, SnapshotOutcome,
};
use crate::session::state::ClientSessionState;

/// Session-wide state decided once per boot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorldSession {
    /// Client state was not carried over; every client connects fresh.
    pub new_session: bool,
    /// Configuration this boot runs under.
    pub fingerprint: Fingerprint,
}

impl WorldSession {
    /// Compare the fingerprint a previous process stored with the current one.
    pub fn init(persisted: Option<Fingerprint>, current: Fingerprint) -> Self {
        let new_session = match persisted {
            Some(stored) if stored != current => {
                info!("Gametype changed, clearing session data.");
                true
            }
            Some(_) => false,
            None => true,
        };
        Self {
            new_session,
            fingerprint: current,
        }
    }
}

/// Load the snapshot at `path` into `arena`.
///
/// The arena is only touched when every slot restores; otherwise it keeps
/// its current contents and the session is marked new.
pub fn restore_sessions(
    path: impl AsRef<Path>,
    arena: &mut ClientArena,
    fingerprint: Fingerprint,
) -> WorldSession {
    let outcome = read_snapshot(
        path,
        arena.slot_count(),
        ClientSessionState::ENCODED_SIZE,
        fingerprint,
    );

    match outcome {
        SnapshotOutcome::Restored(states) => {
            if arena.replace_all(states) {
                info!("Restored session data for {} slots", arena.slot_count());
                WorldSession::init(Some(fingerprint), fingerprint)
            } else {
                WorldSession::init(None, fingerprint)
            }
        }
        SnapshotOutcome::Absent(AbsentReason::FingerprintMismatch { stored, .. }) => {
            WorldSession::init(Some(stored), fingerprint)
        }
        SnapshotOutcome::Absent(AbsentReason::Missing) => WorldSession::init(None, fingerprint),
        SnapshotOutcome::Absent(reason) => {
            info!("Discarding session data: {}", reason);
            WorldSession::init(None, fingerprint)
        }
    }
}

/// Write every slot of `arena` to `path`.
pub fn save_sessions(
    path: impl AsRef<Path>,
    arena: &ClientArena,
    fingerprint: Fingerprint,
) -> Result<(), SnapshotError> {
    let path = path.as_ref();
    write_snapshot(path, arena.states(), fingerprint).map_err(|err| {
        warn!("Failed to write session data to {}: {}", path.display(), err);
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::Team;

    #[test]
    fn test_init_compares_fingerprints() {
        assert!(!WorldSession::init(Some(Fingerprint(6)), Fingerprint(6)).new_session);
        assert!(WorldSession::init(Some(Fingerprint(6)), Fingerprint(7)).new_session);
        assert!(WorldSession::init(None, Fingerprint(7)).new_session);
    }

    #[test]
    fn test_save_then_restore() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.dat");

        let mut arena = ClientArena::new(4);
        let slot = arena.slot(2).unwrap();
        arena.get_mut(slot).unwrap().session_team = Team::Blue;
        save_sessions(&path, &arena, Fingerprint(6)).unwrap();

        let mut fresh = ClientArena::new(4);
        let world = restore_sessions(&path, &mut fresh, Fingerprint(6));
        assert!(!world.new_session);
        assert_eq!(fresh, arena);
    }

    #[test]
    fn test_gametype_change_leaves_arena_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.dat");

        let mut arena = ClientArena::new(2);
        arena.get_mut(arena.slot(0).unwrap()).unwrap().session_team = Team::Red;
        save_sessions(&path, &arena, Fingerprint(6)).unwrap();

        let mut fresh = ClientArena::new(2);
        let world = restore_sessions(&path, &mut fresh, Fingerprint(8));
        assert!(world.new_session);
        assert_eq!(world.fingerprint, Fingerprint(8));
        assert_eq!(fresh, ClientArena::new(2));
    }

    #[test]
    fn test_missing_snapshot_is_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut arena = ClientArena::new(2);
        let world = restore_sessions(dir.path().join("session.dat"), &mut arena, Fingerprint(0));
        assert!(world.new_session);
    }

    #[test]
    fn test_slot_count_change_discards() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.dat");
        save_sessions(&path, &ClientArena::new(2), Fingerprint(1)).unwrap();

        let mut arena = ClientArena::new(3);
        assert!(restore_sessions(&path, &mut arena, Fingerprint(1)).new_session);
        assert_eq!(arena.slot_count(), 3);
    }
}
