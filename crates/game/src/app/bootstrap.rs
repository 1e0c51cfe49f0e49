use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use engine::{locate_assets, EngineConfig, RoomKind, SpriteCatalog};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::loop_runner::AppError;

pub(crate) const ROOM_ENV_VAR: &str = "LEPAK_ROOM";
pub(crate) const SEED_ENV_VAR: &str = "LEPAK_SEED";
pub(crate) const SIM_SECONDS_ENV_VAR: &str = "LEPAK_SIM_SECONDS";
pub(crate) const TARGET_FPS_ENV_VAR: &str = "LEPAK_TARGET_FPS";
pub(crate) const SPRITES_ENV_VAR: &str = "LEPAK_SPRITES";
pub(crate) const REALTIME_ENV_VAR: &str = "LEPAK_REALTIME";
pub(crate) const NPC_COUNT_ENV_VAR: &str = "LEPAK_NPCS";

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SessionConfig {
    pub(crate) room: RoomKind,
    pub(crate) seed: u64,
    pub(crate) sim_duration: Duration,
    pub(crate) target_fps: u32,
    pub(crate) sprites_path: Option<PathBuf>,
    /// Pace frames against the wall clock instead of a simulated clock.
    pub(crate) realtime: bool,
    pub(crate) npc_count: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            room: RoomKind::Park,
            seed: 7,
            sim_duration: Duration::from_secs(10),
            target_fps: 60,
            sprites_path: None,
            realtime: false,
            npc_count: 6,
        }
    }
}

impl SessionConfig {
    pub(crate) fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads each setting through `lookup`; unparsable values keep the default.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let sim_seconds = parse_or_default(
            &lookup,
            SIM_SECONDS_ENV_VAR,
            defaults.sim_duration.as_secs_f32(),
        );
        let sim_duration = if sim_seconds.is_finite() && sim_seconds > 0.0 {
            Duration::from_secs_f32(sim_seconds)
        } else {
            warn!(
                env_var = SIM_SECONDS_ENV_VAR,
                value = sim_seconds,
                "non-positive simulation length; falling back to default"
            );
            defaults.sim_duration
        };
        Self {
            room: parse_or_default(&lookup, ROOM_ENV_VAR, defaults.room),
            seed: parse_or_default(&lookup, SEED_ENV_VAR, defaults.seed),
            sim_duration,
            target_fps: parse_or_default(&lookup, TARGET_FPS_ENV_VAR, defaults.target_fps).max(1),
            sprites_path: lookup(SPRITES_ENV_VAR)
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from),
            realtime: parse_flag(&lookup, REALTIME_ENV_VAR, defaults.realtime),
            npc_count: parse_or_default(&lookup, NPC_COUNT_ENV_VAR, defaults.npc_count),
        }
    }
}

fn parse_or_default<T>(lookup: &impl Fn(&str) -> Option<String>, env_var: &'static str, default: T) -> T
where
    T: FromStr,
{
    let Some(raw) = lookup(env_var) else {
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(
                env_var,
                value = raw.as_str(),
                "invalid env var value; falling back to default"
            );
            default
        }
    }
}

fn parse_flag(lookup: &impl Fn(&str) -> Option<String>, env_var: &'static str, default: bool) -> bool {
    let Some(raw) = lookup(env_var) else {
        return default;
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => {
            warn!(
                env_var,
                value = raw.as_str(),
                "invalid env var flag; falling back to default"
            );
            default
        }
    }
}

pub(crate) struct AppWiring {
    pub(crate) session: SessionConfig,
    pub(crate) engine_config: EngineConfig,
    pub(crate) catalog: SpriteCatalog,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Lepak Room Startup ===");

    let session = SessionConfig::from_env();
    let sprites_path = match &session.sprites_path {
        Some(path) => path.clone(),
        None => locate_assets()?.sprite_catalog,
    };
    let catalog = SpriteCatalog::load_from_path(&sprites_path)?;
    info!(
        room = %session.room,
        seed = session.seed,
        sim_ms = session.sim_duration.as_millis() as u64,
        target_fps = session.target_fps,
        realtime = session.realtime,
        npc_count = session.npc_count,
        "session_config"
    );

    Ok(AppWiring {
        session,
        engine_config: EngineConfig::default(),
        catalog,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}
