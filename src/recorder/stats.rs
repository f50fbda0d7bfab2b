//! Per-session accuracy counters, accumulated in memory and flushed to
//! `session_stats` when the session ends.

use serde::{Deserialize, Serialize};

/// Accuracy counters for one session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Shots that hit.
    pub hits: u32,
    /// Shots fired.
    pub shots: u32,
}

impl SessionStats {
    /// Count a shot.
    pub fn record_shot(&mut self) {
        self.shots = self.shots.saturating_add(1);
    }

    /// Count a hit.
    pub fn record_hit(&mut self) {
        self.hits = self.hits.saturating_add(1);
    }

    /// Hit percentage, 0 when nothing was fired.
    pub fn accuracy(&self) -> u32 {
        if self.shots == 0 {
            0
        } else {
            (u64::from(self.hits) * 100 / u64::from(self.shots)) as u32
        }
    }

    /// Whether there is anything worth flushing.
    pub fn is_empty(&self) -> bool {
        self.hits == 0 && self.shots == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accuracy() {
        let mut stats = SessionStats::default();
        assert_eq!(stats.accuracy(), 0);
        assert!(stats.is_empty());

        for _ in 0..4 {
            stats.record_shot();
        }
        stats.record_hit();
        assert_eq!(stats.accuracy(), 25);
        assert!(!stats.is_empty());
    }
}
