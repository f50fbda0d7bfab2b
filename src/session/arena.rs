//! Client Arena
//!
//! One [`ClientSessionState`] per client slot, indexed by [`SlotId`].

use std::fmt;

use crate::session::state::ClientSessionState;

/// Hard upper bound on client slots.
pub const MAX_CLIENTS: usize = 64;

/// Slot count used when nothing else is configured.
pub const DEFAULT_CLIENTS: usize = 32;

/// Index of a client slot, checked against the arena that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(usize);

impl SlotId {
    /// Raw slot number.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed-size array of per-slot session state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientArena {
    states: Vec<ClientSessionState>,
}

impl ClientArena {
    /// Create an arena of `slot_count` default states, clamped to
    /// `1..=MAX_CLIENTS`.
    pub fn new(slot_count: usize) -> Self {
        let slot_count = slot_count.clamp(1, MAX_CLIENTS);
        Self {
            states: vec![ClientSessionState::default(); slot_count],
        }
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.states.len()
    }

    /// Validate a raw slot number.
    pub fn slot(&self, index: usize) -> Option<SlotId> {
        (index < self.states.len()).then_some(SlotId(index))
    }

    /// State of a slot.
    pub fn get(&self, slot: SlotId) -> Option<&ClientSessionState> {
        self.states.get(slot.0)
    }

    /// Mutable state of a slot.
    pub fn get_mut(&mut self, slot: SlotId) -> Option<&mut ClientSessionState> {
        self.states.get_mut(slot.0)
    }

    /// Iterate slots in order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &ClientSessionState)> {
        self.states.iter().enumerate().map(|(i, state)| (SlotId(i), state))
    }

    /// All states in slot order.
    pub fn states(&self) -> &[ClientSessionState] {
        &self.states
    }

    /// Replace every slot at once. Rejected (arena untouched) unless
    /// `states` has exactly one entry per slot.
    pub fn replace_all(&mut self, states: Vec<ClientSessionState>) -> bool {
        if states.len() != self.states.len() {
            return false;
        }
        self.states = states;
        true
    }
}

impl Default for ClientArena {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENTS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::Team;

    #[test]
    fn test_slot_bounds() {
        let arena = ClientArena::new(4);
        assert_eq!(arena.slot_count(), 4);
        assert!(arena.slot(3).is_some());
        assert!(arena.slot(4).is_none());
    }

    #[test]
    fn test_slot_count_clamped() {
        assert_eq!(ClientArena::new(0).slot_count(), 1);
        assert_eq!(ClientArena::new(1000).slot_count(), MAX_CLIENTS);
        assert_eq!(ClientArena::default().slot_count(), DEFAULT_CLIENTS);
    }

    #[test]
    fn test_get_mut_updates_slot() {
        let mut arena = ClientArena::new(2);
        let slot = arena.slot(1).unwrap();
        arena.get_mut(slot).unwrap().session_team = Team::Red;

        let teams: Vec<Team> = arena.iter().map(|(_, s)| s.session_team).collect();
        assert_eq!(teams, vec![Team::Free, Team::Red]);
    }

    #[test]
    fn test_replace_all_requires_exact_count() {
        let mut arena = ClientArena::new(2);
        assert!(!arena.replace_all(vec![ClientSessionState::default()]));
        assert_eq!(arena.slot_count(), 2);

        let mut states = vec![ClientSessionState::default(); 2];
        states[0].saber_level = 3;
        assert!(arena.replace_all(states));
        assert_eq!(arena.states()[0].saber_level, 3);
    }
}
