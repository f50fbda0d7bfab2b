//! Lazy Listings
//!
//! A listing is a query that has not run yet. Every scan re-runs the
//! statement and maps rows one at a time, so a listing can be streamed to a
//! console, collected, or scanned again later to see fresh rows.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};

use super::engine::StorageError;

/// A finite, restartable sequence of rows.
pub struct Listing<'s, T> {
    conn: &'s Connection,
    sql: &'static str,
    params: Vec<Value>,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
}

impl<'s, T> Listing<'s, T> {
    pub(crate) fn new(
        conn: &'s Connection,
        sql: &'static str,
        params: Vec<Value>,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Self {
        Self { conn, sql, params, map }
    }

    /// Run the query and hand a row iterator to `f`.
    ///
    /// Rows are fetched as the iterator is advanced; dropping it early stops
    /// the query.
    pub fn scan<R, F>(&self, f: F) -> Result<R, StorageError>
    where
        F: FnOnce(&mut dyn Iterator<Item = Result<T, StorageError>>) -> R,
    {
        let mut statement = self.conn.prepare_cached(self.sql)?;
        let rows = statement.query_map(params_from_iter(self.params.iter()), self.map)?;
        let mut rows = rows.map(|row| row.map_err(StorageError::from));
        Ok(f(&mut rows))
    }

    /// Push every row to `f`. Returns the number of rows delivered.
    pub fn for_each<F>(&self, mut f: F) -> Result<usize, StorageError>
    where
        F: FnMut(T),
    {
        self.scan(|rows| -> Result<usize, StorageError> {
            let mut delivered = 0;
            for row in rows {
                f(row?);
                delivered += 1;
            }
            Ok(delivered)
        })?
    }

    /// Collect every row.
    pub fn collect(&self) -> Result<Vec<T>, StorageError> {
        self.scan(|rows| rows.collect::<Result<Vec<T>, StorageError>>())?
    }
}

#[cfg(test)]
mod tests {
    use crate::storage::Store;
    use rusqlite::params;
    use rusqlite::types::Value;

    const ALL_MAPS: &str = "SELECT mapname FROM levels ORDER BY level_id";

    fn map_name(row: &rusqlite::Row<'_>) -> rusqlite::Result<String> {
        row.get(0)
    }

    fn seeded_store() -> Store {
        let store = Store::open_in_memory().unwrap();
        for name in ["mp/ffa1", "mp/ffa2", "mp/ffa3"] {
            store
                .execute("INSERT INTO levels (mapname, restart) VALUES (?1, 0)", params![name])
                .unwrap();
        }
        store
    }

    #[test]
    fn test_listing_is_lazy_and_restartable() {
        let store = seeded_store();
        let listing = store.query(ALL_MAPS, Vec::new(), map_name);

        assert_eq!(listing.collect().unwrap().len(), 3);

        // Rows added after the listing was built show up on the next scan
        store
            .execute("INSERT INTO levels (mapname, restart) VALUES ('mp/ffa4', 0)", [])
            .unwrap();
        assert_eq!(listing.collect().unwrap().len(), 4);
    }

    #[test]
    fn test_for_each_streams_rows() {
        let store = seeded_store();
        let listing = store.query(ALL_MAPS, Vec::new(), map_name);

        let mut seen = Vec::new();
        let delivered = listing.for_each(|name| seen.push(name)).unwrap();
        assert_eq!(delivered, 3);
        assert_eq!(seen, vec!["mp/ffa1", "mp/ffa2", "mp/ffa3"]);
    }

    #[test]
    fn test_scan_can_stop_early() {
        let store = seeded_store();
        let listing = store.query(ALL_MAPS, Vec::new(), map_name);

        let first = listing.scan(|rows| rows.next()).unwrap();
        assert_eq!(first.unwrap().unwrap(), "mp/ffa1");
    }

    #[test]
    fn test_bound_parameters() {
        let store = seeded_store();
        let listing = store.query(
            "SELECT mapname FROM levels WHERE mapname LIKE ?1",
            vec![Value::Text("%ffa2".into())],
            map_name,
        );
        assert_eq!(listing.collect().unwrap(), vec!["mp/ffa2".to_string()]);
    }
}
