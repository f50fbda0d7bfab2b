//! Database schema.
//!
//! Every statement is `CREATE TABLE IF NOT EXISTS`, so the same script both
//! bootstraps a new file and repairs one that lost a table.

/// Tables that must exist for the store to be considered healthy.
pub const REQUIRED_TABLES: [&str; 9] = [
    "sessions",
    "hack_attempts",
    "levels",
    "level_events",
    "session_stats",
    "ip_whitelist",
    "ip_blacklist",
    "pools",
    "pool_has_map",
];

/// Full schema creation script.
pub const CREATE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS [sessions] (
    [session_id]    INTEGER PRIMARY KEY AUTOINCREMENT,
    [session_start] DATETIME,
    [session_end]   DATETIME,
    [ip_A]          INTEGER,
    [ip_B]          INTEGER,
    [ip_C]          INTEGER,
    [ip_D]          INTEGER,
    [ip_port]       INTEGER);

CREATE TABLE IF NOT EXISTS [hack_attempts] (
    [session_id]  INTEGER REFERENCES [sessions]([session_id]),
    [ip_text]     TEXT,
    [description] TEXT);

CREATE TABLE IF NOT EXISTS [levels] (
    [level_id]    INTEGER PRIMARY KEY AUTOINCREMENT,
    [level_start] DATETIME,
    [level_end]   DATETIME,
    [mapname]     TEXT,
    [restart]     BOOL);

CREATE TABLE IF NOT EXISTS [level_events] (
    [level_event_id]   INTEGER PRIMARY KEY AUTOINCREMENT,
    [level_id]         INTEGER REFERENCES [levels]([level_id]),
    [event_level_time] INTEGER,
    [event_id]         INTEGER,
    [event_context_i1] INTEGER,
    [event_context_i2] INTEGER,
    [event_context_i3] INTEGER,
    [event_context_i4] INTEGER,
    [event_context]    TEXT);

CREATE TABLE IF NOT EXISTS [session_stats] (
    [session_id]     INTEGER REFERENCES [sessions]([session_id]),
    [accuracy_hits]  INTEGER,
    [accuracy_shots] INTEGER);

CREATE TABLE IF NOT EXISTS [ip_whitelist] (
    [ip_A]   INTEGER,
    [ip_B]   INTEGER,
    [ip_C]   INTEGER,
    [ip_D]   INTEGER,
    [mask_A] INTEGER,
    [mask_B] INTEGER,
    [mask_C] INTEGER,
    [mask_D] INTEGER,
    [notes]  TEXT);

CREATE TABLE IF NOT EXISTS [ip_blacklist] (
    [ip_A]         INTEGER,
    [ip_B]         INTEGER,
    [ip_C]         INTEGER,
    [ip_D]         INTEGER,
    [mask_A]       INTEGER,
    [mask_B]       INTEGER,
    [mask_C]       INTEGER,
    [mask_D]       INTEGER,
    [notes]        TEXT,
    [reason]       TEXT,
    [banned_since] DATETIME,
    [banned_until] DATETIME);

CREATE TABLE IF NOT EXISTS [pools] (
    [pool_id]    INTEGER PRIMARY KEY AUTOINCREMENT,
    [short_name] TEXT UNIQUE,
    [long_name]  TEXT);

CREATE TABLE IF NOT EXISTS [pool_has_map] (
    [pool_id] INTEGER REFERENCES [pools]([pool_id]),
    [mapname] TEXT,
    [weight]  INTEGER);
"#;
