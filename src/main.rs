//! Game Persistence Demo
//!
//! Walks one server run through the persistence layer: restore client
//! sessions, record a level with a few connections and events, then save.

use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use game_persist::{
    recorder::SessionStats,
    session::{restore_sessions, save_sessions, ConnectInfo, DuelTeam, SessionInit, Team},
    ClientArena, Clock, Fingerprint, LevelEvent, LevelEventKind, PersistConfig, Recorder,
    SystemClock, VERSION,
};

/// Game mode the demo runs under; a different value invalidates old snapshots.
const GAMETYPE: Fingerprint = Fingerprint(0);

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = PersistConfig::from_env();
    info!("Game Persistence v{}", VERSION);
    info!("Database: {}", config.log_db.display());
    info!("Session file: {}", config.session_file.display());

    let recorder = Recorder::open(&config.log_db);
    if !recorder.is_enabled() {
        warn!("Running without a lifecycle database");
    }

    let mut arena = ClientArena::new(config.max_clients);
    let world = restore_sessions(&config.session_file, &mut arena, GAMETYPE);
    info!("New session: {}", world.new_session);

    demo_level(&recorder, &mut arena, &config, world.new_session);

    save_sessions(&config.session_file, &arena, world.fingerprint)?;
    recorder.unload();
    Ok(())
}

/// Record one level with two clients.
fn demo_level(
    recorder: &Recorder,
    arena: &mut ClientArena,
    config: &PersistConfig,
    first_time: bool,
) {
    let clock = SystemClock;
    let level = recorder.start_level("mp/ffa3", false);
    info!("Level {} started", level.0);

    let addresses = ["192.168.1.20:29070", "10.0.0.5:27960"];
    let mut sessions = Vec::new();

    for (index, &address) in addresses.iter().enumerate() {
        if let Some(reason) = recorder.is_filtered(address, config.whitelist_mode) {
            info!("Rejected {}: {}", address, reason);
            continue;
        }
        let Some(slot) = arena.slot(index) else {
            break;
        };

        let init = SessionInit {
            userinfo: ConnectInfo {
                ip: address,
                saber1: "single_1",
                saber2: "none",
                newmod_version: "",
                cuid: "",
            },
            team: Team::Free,
            duel_team: DuelTeam::Free,
            first_time,
            can_join: true,
            now_ms: clock.now_millis(),
            level_time: 0,
            inactivity_secs: config.spectator_inactivity,
        };
        if let Some(state) = arena.get_mut(slot) {
            state.init(slot.index(), &init);
        }

        let session = recorder.start_session(address);
        info!("Client {} connected as session {}", slot, session.0);
        sessions.push(session);
    }

    let event = LevelEvent::team_changed(1_500, 0, Team::Free as i32, Team::Red as i32);
    recorder.log_level_event(level, &event);
    recorder.log_level_event(
        level,
        &LevelEvent::new(2_000, LevelEventKind::Other(7)).with_text("flag captured"),
    );

    for session in sessions {
        let mut stats = SessionStats::default();
        stats.record_shot();
        stats.record_hit();
        recorder.flush_session_stats(session, &stats);
        recorder.end_session(session);
    }

    recorder.end_level(level);
    info!("Level {} ended", level.0);
}
