//! Storage Engine
//!
//! Owns the single SQLite connection for the process. Opens an existing file
//! read/write, or creates it and runs the schema script. Every statement is
//! parameterized; callers never splice values into SQL text.

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Params, Row};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::listing::Listing;
use super::schema::{CREATE_SCHEMA, REQUIRED_TABLES};

/// How the store came up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    /// Existing file, schema intact.
    Opened,
    /// New file, schema created.
    Created,
    /// Existing file with missing tables; schema script re-run.
    Repaired,
}

/// Result of a single executed statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Executed {
    /// Row id of the most recent successful insert on this connection.
    /// Only meaningful after an INSERT.
    pub last_insert_id: i64,
    /// Rows changed by this statement.
    pub rows_affected: usize,
}

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The database file could not be created.
    #[error("failed to create database {path}: {source}")]
    Create {
        /// Database path.
        path: String,
        /// Underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// The file exists but is not a readable database.
    #[error("database {path} is unreadable: {source}")]
    Unreadable {
        /// Database path.
        path: String,
        /// Underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// Running the schema script failed.
    #[error("schema bootstrap failed: {0}")]
    Schema(#[source] rusqlite::Error),

    /// A single statement failed (bind, constraint, disk).
    #[error("statement failed: {0}")]
    Statement(#[from] rusqlite::Error),
}

/// Handle to the persisted database.
///
/// Exactly one exists per database file; it is created at boot and consumed
/// by [`Store::close`] at shutdown.
pub struct Store {
    conn: Connection,
    bootstrap: Bootstrap,
}

impl Store {
    /// Open the database at `path`, creating it if the open fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        match Connection::open_with_flags(path, flags) {
            Ok(conn) => Self::attach_existing(conn, path),
            Err(err) => {
                debug!("Open of {} failed ({}), creating", path.display(), err);
                Self::create(path)
            }
        }
    }

    /// Open a private in-memory database with the full schema.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::Create {
            path: ":memory:".into(),
            source,
        })?;
        Self::bootstrap_new(conn)
    }

    fn create(path: &Path) -> Result<Self, StorageError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| StorageError::Create {
            path: path.display().to_string(),
            source,
        })?;

        let store = Self::bootstrap_new(conn)?;
        info!("Created database {}", path.display());
        Ok(store)
    }

    fn bootstrap_new(mut conn: Connection) -> Result<Self, StorageError> {
        configure(&conn).map_err(StorageError::Schema)?;
        run_schema(&mut conn)?;
        Ok(Self {
            conn,
            bootstrap: Bootstrap::Created,
        })
    }

    fn attach_existing(mut conn: Connection, path: &Path) -> Result<Self, StorageError> {
        let unreadable = |source| StorageError::Unreadable {
            path: path.display().to_string(),
            source,
        };

        configure(&conn).map_err(unreadable)?;
        let present = table_names(&conn).map_err(unreadable)?;
        let missing: Vec<&str> = REQUIRED_TABLES
            .iter()
            .copied()
            .filter(|table| !present.iter().any(|p| p == table))
            .collect();

        let bootstrap = if missing.is_empty() {
            Bootstrap::Opened
        } else {
            warn!("Database {} is missing tables {:?}, repairing", path.display(), missing);
            run_schema(&mut conn)?;
            Bootstrap::Repaired
        };

        Ok(Self { conn, bootstrap })
    }

    /// How this handle came up.
    pub fn bootstrap(&self) -> Bootstrap {
        self.bootstrap
    }

    /// Prepare `sql`, bind `params`, run it once.
    pub fn execute<P: Params>(&self, sql: &str, params: P) -> Result<Executed, StorageError> {
        #[cfg(feature = "debug-tracing")]
        debug!(sql = sql.trim(), "execute");

        let mut statement = self.conn.prepare_cached(sql)?;
        let rows_affected = statement.execute(params)?;
        Ok(Executed {
            last_insert_id: self.conn.last_insert_rowid(),
            rows_affected,
        })
    }

    /// Run a query expected to yield at most one row.
    pub fn query_row<T, P, F>(
        &self,
        sql: &str,
        params: P,
        map: F,
    ) -> Result<Option<T>, StorageError>
    where
        P: Params,
        F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut statement = self.conn.prepare_cached(sql)?;
        Ok(statement.query_row(params, map).optional()?)
    }

    /// Build a lazy listing. Nothing runs until the listing is scanned.
    pub fn query<T>(
        &self,
        sql: &'static str,
        params: Vec<Value>,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Listing<'_, T> {
        Listing::new(&self.conn, sql, params, map)
    }

    /// Names of all user tables.
    pub fn tables(&self) -> Result<Vec<String>, StorageError> {
        Ok(table_names(&self.conn)?)
    }

    /// Flush and release the handle.
    pub fn close(self) -> Result<(), StorageError> {
        self.conn.close().map_err(|(_, err)| StorageError::Statement(err))
    }
}

fn configure(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
}

fn run_schema(conn: &mut Connection) -> Result<(), StorageError> {
    let tx = conn.transaction().map_err(StorageError::Schema)?;
    tx.execute_batch(CREATE_SCHEMA).map_err(StorageError::Schema)?;
    tx.commit().map_err(StorageError::Schema)
}

fn table_names(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut statement =
        conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let names = statement.query_map([], |row| row.get(0))?;
    names.collect()
}

// =============================================================================
// TESTS
// =============================================================================
