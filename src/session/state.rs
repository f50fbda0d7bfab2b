//! Client Session State
//!
//! Per-client data that survives level changes and server restarts. Every
//! field is fixed width so a state always encodes to [`ENCODED_SIZE`] bytes.
//!
//! [`ENCODED_SIZE`]: ClientSessionState::ENCODED_SIZE

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::address::Endpoint;
use crate::core::hash::{format_cuid_hash, hash_cuid, CuidHash};
use crate::session::fixed_str::FixedStr;

/// Team a client plays on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    /// No team (free-for-all).
    #[default]
    Free,
    /// Red team.
    Red,
    /// Blue team.
    Blue,
    /// Watching.
    Spectator,
}

/// Side in power duel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DuelTeam {
    /// Not in a power duel.
    #[default]
    Free,
    /// The lone duelist.
    Lone,
    /// One of the pair.
    Double,
}

/// How a spectator is watching.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpectatorState {
    /// Not spectating.
    #[default]
    Not,
    /// Free-flying camera.
    Free,
    /// Following another client.
    Follow,
    /// Looking at the scoreboard.
    Scoreboard,
}

/// Userinfo fields read at connect time.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConnectInfo<'a> {
    /// Client address text, `"A.B.C.D:port"`.
    pub ip: &'a str,
    /// Primary saber.
    pub saber1: &'a str,
    /// Secondary saber.
    pub saber2: &'a str,
    /// Newmod client version; empty for other clients.
    pub newmod_version: &'a str,
    /// Newmod client unique id.
    pub cuid: &'a str,
}

/// Everything the host decides at connect time and hands to
/// [`ClientSessionState::init`].
#[derive(Clone, Copy, Debug)]
pub struct SessionInit<'a> {
    /// Userinfo of the connecting client.
    pub userinfo: ConnectInfo<'a>,
    /// Team picked by the host's team policy.
    pub team: Team,
    /// Power duel side picked by the host.
    pub duel_team: DuelTeam,
    /// Whether this is the client's first connect (not a level change).
    pub first_time: bool,
    /// Whether the client passed the join password check.
    pub can_join: bool,
    /// Global time in milliseconds.
    pub now_ms: i64,
    /// Level time in milliseconds.
    pub level_time: i32,
    /// Spectator inactivity allowance in seconds.
    pub inactivity_secs: u32,
}

/// Session data of one client slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSessionState {
    /// Current team.
    pub session_team: Team,
    /// Team requested in siege.
    pub siege_desired_team: Team,
    /// Power duel side.
    pub duel_team: DuelTeam,
    /// Spectator mode.
    pub spectator_state: SpectatorState,
    /// Client being followed, -1 for none.
    pub spectator_client: i32,
    /// Level time the client became a spectator.
    pub spectator_time: i32,
    /// Global time (ms) after which an idle spectator is moved on.
    pub inactivity_time: i64,
    /// Primary saber preference.
    pub saber_type: FixedStr<64>,
    /// Secondary saber preference.
    pub saber2_type: FixedStr<64>,
    /// Saber style.
    pub saber_level: i32,
    /// Selected force power.
    pub selected_fp: i32,
    /// Address text captured at first connect.
    pub ip_string: FixedStr<32>,
    /// Parsed address, network order. 0 when unparsable.
    pub ip: u32,
    /// Parsed port. 0 when unparsable.
    pub port: u16,
    /// Account name.
    pub username: FixedStr<32>,
    /// Hidden from the player list.
    pub is_inkognito: bool,
    /// Per-client chat ignore bits.
    pub ignore_flags: u32,
    /// Allowed to leave spectator.
    pub can_join: bool,
    /// Trusted for the wallhack check.
    pub wh_trust_toggle: bool,
    /// Siege class.
    pub siege_class: FixedStr<64>,
    /// Hash of the newmod cuid, 0 when absent.
    pub cuid_hash: CuidHash,
    /// Newmod confirmation keys. `[-1, -1]` means "compute on begin".
    pub confirmation_keys: [i32; 2],
    /// Newmod handshake completed.
    pub confirmed_newmod: bool,
    /// Global time (ms) of the last name change.
    pub name_change_time: i64,
}

impl ClientSessionState {
    /// Bytes one state occupies in a snapshot.
    pub const ENCODED_SIZE: usize = 334;

    /// Set up session data on connect.
    ///
    /// `slot` is only used for logging. On a first connect the address text
    /// is captured; it is re-parsed on every connect.
    pub fn init(&mut self, slot: usize, init: &SessionInit<'_>) {
        let info = &init.userinfo;

        self.siege_desired_team = Team::Free;
        self.session_team = init.team;
        self.duel_team = init.duel_team;

        if init.first_time {
            self.ip_string.set(info.ip);
        }

        match Endpoint::parse_strict(self.ip_string.as_str()) {
            Some(endpoint) => {
                self.ip = endpoint.ip_u32();
                self.port = endpoint.port;
            }
            None => {
                self.ip = 0;
                self.port = 0;
            }
        }

        self.name_change_time = init.now_ms;
        self.username.clear();
        self.is_inkognito = false;
        self.ignore_flags = 0;
        self.can_join = init.can_join;
        self.wh_trust_toggle = false;

        self.spectator_state = SpectatorState::Free;
        self.spectator_time = init.level_time;
        self.inactivity_time = init.now_ms + 1000 * i64::from(init.inactivity_secs);

        self.siege_class.clear();
        self.saber_type.set(info.saber1);
        self.saber2_type.set(info.saber2);

        if info.newmod_version.is_empty() {
            self.cuid_hash = 0;
            self.confirmation_keys = [0, 0];
        } else {
            self.cuid_hash = hash_cuid(info.cuid);
            if self.cuid_hash != 0 {
                let hash = format_cuid_hash(self.cuid_hash);
                info!("Newmod client {} reports cuid hash {}", slot, hash);
            } else {
                info!("Newmod client {} reports default cuid", slot);
            }
            self.confirmation_keys = [-1, -1];
        }
        self.confirmed_newmod = false;
    }

    /// Parsed endpoint of this client.
    pub fn endpoint(&self) -> Endpoint {
        Endpoint::new(self.ip.to_be_bytes(), self.port)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn connect_info() -> ConnectInfo<'static> {
        ConnectInfo {
            ip: "10.0.0.5:27960",
            saber1: "single_1",
            saber2: "none",
            newmod_version: "",
            cuid: "",
        }
    }

    fn session_init(first_time: bool) -> SessionInit<'static> {
        SessionInit {
            userinfo: connect_info(),
            team: Team::Spectator,
            duel_team: DuelTeam::Free,
            first_time,
            can_join: true,
            now_ms: 50_000,
            level_time: 1_200,
            inactivity_secs: 60,
        }
    }

    #[test]
    fn test_encoded_size_is_constant() {
        let empty = bincode::serialize(&ClientSessionState::default()).unwrap();
        assert_eq!(empty.len(), ClientSessionState::ENCODED_SIZE);

        let mut full = ClientSessionState::default();
        full.init(3, &session_init(true));
        full.username.set("a-very-long-account-name-that-gets-cut");
        full.siege_class.set("Imperial Infantry");
        full.cuid_hash = u64::MAX;
        let encoded = bincode::serialize(&full).unwrap();
        assert_eq!(encoded.len(), ClientSessionState::ENCODED_SIZE);
    }

    #[test]
    fn test_first_connect_captures_address() {
        let mut state = ClientSessionState::default();
        state.init(0, &session_init(true));

        assert_eq!(state.ip_string.as_str(), "10.0.0.5:27960");
        assert_eq!(state.endpoint(), Endpoint::new([10, 0, 0, 5], 27960));
        assert_eq!(state.session_team, Team::Spectator);
        assert_eq!(state.spectator_state, SpectatorState::Free);
        assert_eq!(state.spectator_time, 1_200);
        assert_eq!(state.inactivity_time, 110_000);
        assert_eq!(state.name_change_time, 50_000);
        assert_eq!(state.saber_type.as_str(), "single_1");
        assert!(state.can_join);
    }

    #[test]
    fn test_reconnect_keeps_first_address() {
        let mut state = ClientSessionState::default();
        state.init(0, &session_init(true));

        let mut later = session_init(false);
        later.userinfo.ip = "99.99.99.99:1";
        state.init(0, &later);
        assert_eq!(state.ip_string.as_str(), "10.0.0.5:27960");
    }

    #[test]
    fn test_unparsable_address_zeroes_endpoint() {
        let mut state = ClientSessionState::default();
        let mut init = session_init(true);
        init.userinfo.ip = "localhost";
        state.init(0, &init);

        assert_eq!(state.ip, 0);
        assert_eq!(state.port, 0);
        assert_eq!(state.ip_string.as_str(), "localhost");
    }

    #[test]
    fn test_newmod_cuid_hashing() {
        let mut state = ClientSessionState::default();
        let mut init = session_init(true);
        init.userinfo.newmod_version = "1.5";
        init.userinfo.cuid = "1234-5678";
        state.init(0, &init);
        assert_eq!(state.cuid_hash, hash_cuid("1234-5678"));
        assert_eq!(state.confirmation_keys, [-1, -1]);

        init.userinfo.newmod_version = "";
        state.init(0, &init);
        assert_eq!(state.cuid_hash, 0);
        assert_eq!(state.confirmation_keys, [0, 0]);
    }
}
