//! Map Pools
//!
//! Named sets of maps with relative weights, used by map voting.

use rusqlite::{params, Row};

use crate::recorder::lifecycle::Recorder;
use crate::storage::Listing;

const SQL_POOL_CREATE: &str = "INSERT INTO pools (short_name, long_name) VALUES (?1, ?2)";

const SQL_POOL_ADD_MAP: &str =
    "INSERT INTO pool_has_map (pool_id, mapname, weight) VALUES (?1, ?2, ?3)";

const SQL_POOL_LIST: &str = "SELECT m.pool_id, m.mapname, m.weight, \
     m.weight * 100.0 / (SELECT SUM(weight) FROM pool_has_map WHERE pool_id = m.pool_id) \
     FROM pool_has_map m ORDER BY m.pool_id, m.rowid";

/// One map in one pool.
#[derive(Clone, Debug, PartialEq)]
pub struct PoolMapRow {
    /// Pool id.
    pub pool_id: i64,
    /// Map name.
    pub map_name: String,
    /// Relative weight.
    pub weight: i64,
    /// Share of the pool's total weight, in percent.
    pub weight_perc: f64,
}

fn pool_map_row(row: &Row<'_>) -> rusqlite::Result<PoolMapRow> {
    Ok(PoolMapRow {
        pool_id: row.get(0)?,
        map_name: row.get(1)?,
        weight: row.get(2)?,
        // NULL when the pool's weights sum to zero
        weight_perc: row.get::<_, Option<f64>>(3)?.unwrap_or(0.0),
    })
}

impl Recorder {
    /// Create a pool. Returns its id, or `None` if the short name is taken
    /// or nothing could be recorded.
    pub fn create_pool(&self, short_name: &str, long_name: &str) -> Option<i64> {
        self.run("pool create", SQL_POOL_CREATE, params![short_name, long_name])
            .map(|done| done.last_insert_id)
    }

    /// Add a map to a pool.
    pub fn add_map_to_pool(&self, pool_id: i64, map_name: &str, weight: u32) -> bool {
        self.run("pool map add", SQL_POOL_ADD_MAP, params![pool_id, map_name, weight])
            .is_some()
    }

    /// Every pool's maps with their weight share.
    pub fn list_pools(&self) -> Option<Listing<'_, PoolMapRow>> {
        self.listing(SQL_POOL_LIST, Vec::new(), pool_map_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::SystemClock;
    use crate::storage::Store;

    fn create_test_recorder() -> Recorder {
        Recorder::with_store(Store::open_in_memory().unwrap(), Box::new(SystemClock))
    }

    #[test]
    fn test_pool_weights() {
        let recorder = create_test_recorder();
        let ffa = recorder.create_pool("ffa", "Free for all").unwrap();
        let duel = recorder.create_pool("duel", "Duel maps").unwrap();

        assert!(recorder.add_map_to_pool(ffa, "mp/ffa1", 1));
        assert!(recorder.add_map_to_pool(ffa, "mp/ffa3", 3));
        assert!(recorder.add_map_to_pool(duel, "mp/duel1", 5));

        let rows = recorder.list_pools().unwrap().collect().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].map_name, "mp/ffa1");
        assert!((rows[0].weight_perc - 25.0).abs() < 1e-9);
        assert!((rows[1].weight_perc - 75.0).abs() < 1e-9);
        assert!((rows[2].weight_perc - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_pool_name_rejected() {
        let recorder = create_test_recorder();
        assert!(recorder.create_pool("ctf", "Capture the flag").is_some());
        assert!(recorder.create_pool("ctf", "Again").is_none());
    }

    #[test]
    fn test_map_needs_existing_pool() {
        let recorder = create_test_recorder();
        assert!(!recorder.add_map_to_pool(42, "mp/ffa1", 1));
    }

    #[test]
    fn test_zero_weight_pool() {
        let recorder = create_test_recorder();
        let pool = recorder.create_pool("empty", "Zero weights").unwrap();
        assert!(recorder.add_map_to_pool(pool, "mp/siege_hoth", 0));

        let rows = recorder.list_pools().unwrap().collect().unwrap();
        assert_eq!(rows[0].weight_perc, 0.0);
    }
}
