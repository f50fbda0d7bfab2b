//! Runtime Configuration
//!
//! Paths and limits for the persistence subsystem, read from the environment.

use std::path::PathBuf;

use crate::session::arena::{DEFAULT_CLIENTS, MAX_CLIENTS};

/// Default database file.
pub const DEFAULT_LOG_DB: &str = "jka_log.db";

/// Default session snapshot file.
pub const DEFAULT_SESSION_FILE: &str = "session.dat";

/// Persistence configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistConfig {
    /// Lifecycle database path.
    pub log_db: PathBuf,
    /// Session snapshot path.
    pub session_file: PathBuf,
    /// Number of client slots (1..=64).
    pub max_clients: usize,
    /// Filter connections with the whitelist instead of the blacklist.
    pub whitelist_mode: bool,
    /// Seconds an idle spectator is allowed. 0 disables the check.
    pub spectator_inactivity: u32,
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            log_db: PathBuf::from(DEFAULT_LOG_DB),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            max_clients: DEFAULT_CLIENTS,
            whitelist_mode: false,
            spectator_inactivity: 0,
        }
    }
}

impl PersistConfig {
    /// Create config from environment variables. Unset or malformed values
    /// fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_db: lookup("PERSIST_LOG_DB")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.log_db),
            session_file: lookup("PERSIST_SESSION_FILE")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),
            max_clients: lookup("PERSIST_MAX_CLIENTS")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .map(|n| n.clamp(1, MAX_CLIENTS))
                .unwrap_or(defaults.max_clients),
            whitelist_mode: lookup("PERSIST_WHITELIST")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.whitelist_mode),
            spectator_inactivity: lookup("PERSIST_SPECTATOR_INACTIVITY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.spectator_inactivity),
        }
    }
}
