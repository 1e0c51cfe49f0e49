use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use engine::{
    compute_cap_sleep, target_frame_duration, AssetRootError, Clock, Engine, FrameLoop,
    ManualClock, SpriteConfigError, SystemClock, TileGridError,
};
use thiserror::Error;
use tracing::{error, info};

use super::bootstrap::{build_app, AppWiring, SessionConfig};
use super::session::{RoomSession, SessionSummary};

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error(transparent)]
    Assets(#[from] AssetRootError),
    #[error("failed to load sprite catalog: {0}")]
    Sprites(#[from] SpriteConfigError),
    #[error("failed to build room: {0}")]
    Room(#[from] TileGridError),
    #[error("failed to encode session summary: {0}")]
    Summary(#[from] serde_json::Error),
}

pub(crate) fn run() -> ExitCode {
    match build_app().and_then(run_session) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "session_failed");
            ExitCode::FAILURE
        }
    }
}

fn run_session(app: AppWiring) -> Result<(), AppError> {
    let engine = Engine::new(app.engine_config, app.catalog);
    let summary = if app.session.realtime {
        let frame_loop = FrameLoop::new(engine, SystemClock::new());
        drive(frame_loop, &app.session, |elapsed, target| {
            thread::sleep(compute_cap_sleep(elapsed, target));
        })?
    } else {
        let clock = ManualClock::new();
        let frame_loop = FrameLoop::new(engine, clock.clone());
        let frame_dt = simulated_frame_duration(app.session.target_fps);
        drive(frame_loop, &app.session, move |_, _| clock.advance(frame_dt))?
    };

    info!(summary = %serde_json::to_string(&summary)?, "session_summary");
    Ok(())
}

/// Runs frames until the clock passes the session length. `pace` is called
/// after every frame with the frame's wall time and the frame budget.
fn drive<C: Clock>(
    mut frame_loop: FrameLoop<C>,
    config: &SessionConfig,
    mut pace: impl FnMut(Duration, Option<Duration>),
) -> Result<SessionSummary, AppError> {
    let target = target_frame_duration(Some(config.target_fps));
    let mut session = RoomSession::new(config);
    frame_loop.start();
    session.populate(&mut frame_loop, config.room, config.seed, config.npc_count)?;

    let end = frame_loop.clock().now().saturating_add(config.sim_duration);
    info!(
        frame_budget_ms = target.map(|value| value.as_secs_f64() * 1000.0).unwrap_or(0.0),
        "session_started"
    );
    while frame_loop.clock().now() < end {
        let started = Instant::now();
        session.frame(&mut frame_loop);
        pace(started.elapsed(), target);
    }
    frame_loop.stop();
    info!(frames = frame_loop.frames_pumped(), "shutdown");
    Ok(session.finish(&frame_loop))
}

fn simulated_frame_duration(target_fps: u32) -> Duration {
    target_frame_duration(Some(target_fps)).unwrap_or(Duration::from_millis(16))
}

#[cfg(test)]
mod tests {
    use engine::{EngineConfig, RoomKind, SpriteCatalog};

    use super::*;

    #[test]
    fn simulated_frame_duration_follows_target_fps() {
        assert_eq!(simulated_frame_duration(50), Duration::from_millis(20));
        assert_eq!(simulated_frame_duration(0), Duration::from_millis(16));
    }

    #[test]
    fn simulated_drive_covers_the_session_length() {
        let catalog = SpriteCatalog::from_json_str(
            r#"[{ "id": "sprite1", "sheet": "sprites/sprite1", "frame_width": 64, "frame_height": 64 }]"#,
        )
        .expect("catalog");
        let config = SessionConfig {
            room: RoomKind::Arcade,
            sim_duration: Duration::from_secs(1),
            target_fps: 50,
            npc_count: 0,
            ..SessionConfig::default()
        };
        let clock = ManualClock::new();
        let frame_loop = FrameLoop::new(Engine::new(EngineConfig::default(), catalog), clock.clone());
        let summary = drive(frame_loop, &config, |_, _| clock.advance(Duration::from_millis(20)))
            .expect("session");
        assert_eq!(summary.frames, 50);
        assert_eq!(summary.room, "arcade");
    }
}
