//! Access Lists
//!
//! Address/mask whitelist and blacklist kept in the log database. An entry
//! matches a client when every octet satisfies `addr & mask == ip & mask`.
//!
//! - Whitelist mode: a client is filtered unless some whitelist entry matches.
//! - Blacklist mode: a client is filtered when a matching ban has not expired.
//!   Bans added with zero hours never expire.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Row};
use tracing::info;

use crate::core::address::{Endpoint, MaskedAddress};
use crate::recorder::lifecycle::Recorder;
use crate::storage::Listing;

const SQL_WHITELIST_ADD: &str = "INSERT INTO ip_whitelist \
     (ip_A, ip_B, ip_C, ip_D, mask_A, mask_B, mask_C, mask_D, notes) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";

const SQL_WHITELIST_REMOVE: &str = "DELETE FROM ip_whitelist WHERE \
     ip_A = ?1 AND ip_B = ?2 AND ip_C = ?3 AND ip_D = ?4 AND \
     mask_A = ?5 AND mask_B = ?6 AND mask_C = ?7 AND mask_D = ?8";

const SQL_WHITELIST_LIST: &str = "SELECT ip_A, ip_B, ip_C, ip_D, \
     mask_A, mask_B, mask_C, mask_D, notes FROM ip_whitelist ORDER BY rowid";

const SQL_BLACKLIST_ADD: &str = "INSERT INTO ip_blacklist \
     (ip_A, ip_B, ip_C, ip_D, mask_A, mask_B, mask_C, mask_D, \
     notes, reason, banned_since, banned_until) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)";

const SQL_BLACKLIST_REMOVE: &str = "DELETE FROM ip_blacklist WHERE \
     ip_A = ?1 AND ip_B = ?2 AND ip_C = ?3 AND ip_D = ?4 AND \
     mask_A = ?5 AND mask_B = ?6 AND mask_C = ?7 AND mask_D = ?8";

const SQL_BLACKLIST_LIST: &str = "SELECT ip_A, ip_B, ip_C, ip_D, mask_A, mask_B, mask_C, mask_D, \
     notes, reason, banned_since, banned_until FROM ip_blacklist ORDER BY rowid";

/// Reason given to clients filtered in whitelist mode.
pub const NOT_WHITELISTED: &str = "Not on the whitelist";

/// A whitelist row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WhitelistEntry {
    /// Address and mask.
    pub address: MaskedAddress,
    /// Admin notes.
    pub notes: String,
}

/// A blacklist row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlacklistEntry {
    /// Address and mask.
    pub address: MaskedAddress,
    /// Admin notes.
    pub notes: String,
    /// Reason shown to the client.
    pub reason: String,
    /// When the ban was added.
    pub banned_since: Option<DateTime<Utc>>,
    /// When the ban lapses. `None` never lapses.
    pub banned_until: Option<DateTime<Utc>>,
}

impl BlacklistEntry {
    /// Whether the ban is in force at `now`.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.banned_until.map_or(true, |until| until > now)
    }
}

fn masked_address(row: &Row<'_>) -> rusqlite::Result<MaskedAddress> {
    Ok(MaskedAddress {
        ip: [row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?],
        mask: [row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?],
    })
}

fn whitelist_row(row: &Row<'_>) -> rusqlite::Result<WhitelistEntry> {
    Ok(WhitelistEntry {
        address: masked_address(row)?,
        notes: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
    })
}

fn blacklist_row(row: &Row<'_>) -> rusqlite::Result<BlacklistEntry> {
    Ok(BlacklistEntry {
        address: masked_address(row)?,
        notes: row.get::<_, Option<String>>(8)?.unwrap_or_default(),
        reason: row.get::<_, Option<String>>(9)?.unwrap_or_default(),
        banned_since: row.get(10)?,
        banned_until: row.get(11)?,
    })
}

impl Recorder {
    /// Allow `ip`/`mask` in whitelist mode. False if either text is not a
    /// dotted address or the insert failed.
    pub fn add_to_whitelist(&self, ip: &str, mask: &str, notes: &str) -> bool {
        let Some(entry) = MaskedAddress::parse(ip, mask) else {
            return false;
        };
        let ([a, b, c, d], [ma, mb, mc, md]) = (entry.ip, entry.mask);
        self.run(
            "whitelist add",
            SQL_WHITELIST_ADD,
            params![a, b, c, d, ma, mb, mc, md, notes],
        )
        .is_some()
    }

    /// Remove a whitelist entry. False if nothing matched.
    pub fn remove_from_whitelist(&self, ip: &str, mask: &str) -> bool {
        let Some(entry) = MaskedAddress::parse(ip, mask) else {
            return false;
        };
        let ([a, b, c, d], [ma, mb, mc, md]) = (entry.ip, entry.mask);
        self.run("whitelist remove", SQL_WHITELIST_REMOVE, params![a, b, c, d, ma, mb, mc, md])
            .is_some_and(|done| done.rows_affected > 0)
    }

    /// Ban `ip`/`mask` for `hours` (0 = permanently).
    pub fn add_to_blacklist(
        &self,
        ip: &str,
        mask: &str,
        notes: &str,
        reason: &str,
        hours: u32,
    ) -> bool {
        let Some(entry) = MaskedAddress::parse(ip, mask) else {
            return false;
        };
        let now = self.clock().now();
        let until = (hours > 0).then(|| now + Duration::hours(i64::from(hours)));
        let ([a, b, c, d], [ma, mb, mc, md]) = (entry.ip, entry.mask);

        let added = self
            .run(
                "blacklist add",
                SQL_BLACKLIST_ADD,
                params![a, b, c, d, ma, mb, mc, md, notes, reason, now, until],
            )
            .is_some();
        if added {
            info!("Banned {}/{} for {} hours: {}", ip, mask, hours, reason);
        }
        added
    }

    /// Lift a ban. False if nothing matched.
    pub fn remove_from_blacklist(&self, ip: &str, mask: &str) -> bool {
        let Some(entry) = MaskedAddress::parse(ip, mask) else {
            return false;
        };
        let ([a, b, c, d], [ma, mb, mc, md]) = (entry.ip, entry.mask);
        self.run("blacklist remove", SQL_BLACKLIST_REMOVE, params![a, b, c, d, ma, mb, mc, md])
            .is_some_and(|done| done.rows_affected > 0)
    }

    /// Every whitelist entry, in insertion order.
    pub fn list_whitelist(&self) -> Option<Listing<'_, WhitelistEntry>> {
        self.listing(SQL_WHITELIST_LIST, Vec::new(), whitelist_row)
    }

    /// Every blacklist entry, expired ones included, in insertion order.
    pub fn list_blacklist(&self) -> Option<Listing<'_, BlacklistEntry>> {
        self.listing(SQL_BLACKLIST_LIST, Vec::new(), blacklist_row)
    }

    /// Whether no whitelist entry covers `addr`. Returns the reason.
    pub fn is_filtered_by_whitelist(&self, addr: [u8; 4]) -> Option<String> {
        let listing = self.list_whitelist()?;
        let allowed = listing
            .scan(|rows| rows.flatten().any(|entry| entry.address.matches(addr)))
            .unwrap_or(true);
        (!allowed).then(|| NOT_WHITELISTED.to_string())
    }

    /// Whether an active ban covers `addr`. Returns the ban reason.
    pub fn is_filtered_by_blacklist(&self, addr: [u8; 4]) -> Option<String> {
        let now = self.clock().now();
        self.list_blacklist()?
            .scan(|rows| {
                rows.flatten()
                    .find(|entry| entry.address.matches(addr) && entry.is_active(now))
                    .map(|entry| entry.reason)
            })
            .ok()
            .flatten()
    }

    /// Access check for a connecting client. `None` admits the client.
    ///
    /// A disabled recorder, or a store error mid-check, admits everyone.
    pub fn is_filtered(&self, ip_text: &str, whitelist_mode: bool) -> Option<String> {
        let addr = Endpoint::parse(ip_text).octets;
        if whitelist_mode {
            self.is_filtered_by_whitelist(addr)
        } else {
            self.is_filtered_by_blacklist(addr)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::storage::Store;
    use chrono::TimeZone;
    use std::rc::Rc;

    fn create_test_recorder() -> (Recorder, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 1, 20, 0, 0).unwrap()));
        let store = Store::open_in_memory().unwrap();
        (Recorder::with_store(store, Box::new(clock.clone())), clock)
    }

    #[test]
    fn test_blacklist_filters_until_expiry() {
        let (recorder, clock) = create_test_recorder();
        assert!(recorder.add_to_blacklist("10.1.0.0", "255.255.0.0", "range", "cheating", 2));

        assert_eq!(recorder.is_filtered("10.1.7.7:29070", false).as_deref(), Some("cheating"));
        assert_eq!(recorder.is_filtered("10.2.7.7:29070", false), None);

        clock.advance(Duration::hours(3));
        assert_eq!(recorder.is_filtered("10.1.7.7:29070", false), None);
    }

    #[test]
    fn test_permanent_ban() {
        let (recorder, clock) = create_test_recorder();
        assert!(recorder.add_to_blacklist("1.2.3.4", "255.255.255.255", "", "spam", 0));

        clock.advance(Duration::days(3650));
        assert_eq!(recorder.is_filtered("1.2.3.4:1", false).as_deref(), Some("spam"));
    }

    #[test]
    fn test_remove_from_blacklist() {
        let (recorder, _) = create_test_recorder();
        assert!(recorder.add_to_blacklist("1.2.3.4", "255.255.255.255", "", "spam", 0));
        assert!(recorder.remove_from_blacklist("1.2.3.4", "255.255.255.255"));
        assert!(!recorder.remove_from_blacklist("1.2.3.4", "255.255.255.255"));
        assert_eq!(recorder.is_filtered("1.2.3.4:1", false), None);
    }

    #[test]
    fn test_whitelist_mode() {
        let (recorder, _) = create_test_recorder();
        assert!(recorder.add_to_whitelist("192.168.0.0", "255.255.0.0", "lan"));

        assert_eq!(recorder.is_filtered("192.168.4.2:29070", true), None);
        assert_eq!(
            recorder.is_filtered("8.8.8.8:29070", true).as_deref(),
            Some(NOT_WHITELISTED)
        );

        assert!(recorder.remove_from_whitelist("192.168.0.0", "255.255.0.0"));
        assert!(recorder.is_filtered("192.168.4.2:29070", true).is_some());
    }

    #[test]
    fn test_invalid_address_text_rejected() {
        let (recorder, _) = create_test_recorder();
        assert!(!recorder.add_to_whitelist("nonsense", "255.255.255.255", ""));
        assert!(!recorder.add_to_blacklist("1.2.3.4", "", "", "", 1));
    }

    #[test]
    fn test_list_blacklist_rows() {
        let (recorder, _) = create_test_recorder();
        recorder.add_to_blacklist("1.2.3.4", "255.255.255.255", "first", "a", 1);
        recorder.add_to_blacklist("5.6.0.0", "255.255.0.0", "second", "b", 0);

        let mut rows = Vec::new();
        let delivered = recorder
            .list_blacklist()
            .unwrap()
            .for_each(|entry| {
                rows.push((entry.address.ip_text(), entry.address.mask_text(), entry.notes))
            })
            .unwrap();

        assert_eq!(delivered, 2);
        assert_eq!(rows[0], ("1.2.3.4".into(), "255.255.255.255".into(), "first".into()));
        assert_eq!(rows[1].1, "255.255.0.0");

        let entries = recorder.list_blacklist().unwrap().collect().unwrap();
        assert!(entries[0].banned_until.is_some());
        assert!(entries[1].banned_until.is_none());
    }

    #[test]
    fn test_disabled_recorder_admits_everyone() {
        let recorder = Recorder::disabled();
        assert_eq!(recorder.is_filtered("1.2.3.4:5", true), None);
        assert_eq!(recorder.is_filtered("1.2.3.4:5", false), None);
        assert!(recorder.list_whitelist().is_none());
    }
}
