use std::sync::Arc;
use std::time::Duration;

use engine::{
    Actor, ActorId, AnimState, Clock, CommandOutcome, EngineCommand, FrameLoop, FrameView,
    GameAction, GridConfig, InitPayload, MoveEvent, MoveOutcome, RoomKind, TileCoord, TileGrid,
    TileGridError, Vec2, ViewportPx,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use super::bootstrap::SessionConfig;

pub(crate) const PLAYER_ID: &str = "player";
const PLAYER_SPRITE: &str = "sprite1";
const NPC_SPRITES: [&str; 2] = ["sprite2", "sprite3"];
const VIEWPORT: ViewportPx = ViewportPx {
    width: 480,
    height: 320,
};
const NPC_WANDER_RADIUS_TILES: i32 = 6;
/// Chance per frame that an idle NPC picks a new destination.
const NPC_WANDER_CHANCE: f64 = 0.02;
/// Chance per frame that an idle NPC emotes instead of standing still.
const NPC_EMOTE_CHANCE: f64 = 0.005;
const PLAYER_TAP_INTERVAL: Duration = Duration::from_secs(3);
const NPC_EMOTES: [AnimState; 3] = [AnimState::Waving, AnimState::Dancing, AnimState::Sitting];

/// Counters reported when a session ends.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub(crate) struct SessionSummary {
    pub(crate) room: String,
    pub(crate) frames: u64,
    pub(crate) moves_started: u64,
    pub(crate) moves_rejected: u64,
    pub(crate) arrivals: u64,
    pub(crate) stuck_moves: u64,
    pub(crate) emotes: u64,
    pub(crate) effects_ticks: u64,
    pub(crate) max_visible_actors: usize,
    pub(crate) player_tile: (i32, i32),
}

/// Scripted stand-in for the players and NPCs of one hangout room.
pub(crate) struct RoomSession {
    rng: StdRng,
    npc_ids: Vec<ActorId>,
    next_player_tap: Duration,
    summary: SessionSummary,
}

impl RoomSession {
    pub(crate) fn new(config: &SessionConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(config.seed ^ 0x9e37_79b9_7f4a_7c15),
            npc_ids: Vec::new(),
            next_player_tap: Duration::ZERO,
            summary: SessionSummary {
                room: config.room.name().to_string(),
                ..SessionSummary::default()
            },
        }
    }

    /// Generates the room and hands it to the engine along with the actors.
    pub(crate) fn populate<C: Clock>(
        &mut self,
        frame_loop: &mut FrameLoop<C>,
        room: RoomKind,
        seed: u64,
        npc_count: usize,
    ) -> Result<(), TileGridError> {
        let tiles = Arc::new(room.generate(seed)?);
        let grid = *tiles.config();
        let center = TileCoord::new(grid.cols as i32 / 2, grid.rows as i32 / 2);
        let player_tile = nearest_walkable(&tiles, center).unwrap_or(center);
        let mut actors = vec![Actor::new(PLAYER_ID, PLAYER_SPRITE, player_tile, &grid)];

        self.npc_ids.clear();
        for index in 0..npc_count {
            let Some(tile) = self.random_walkable_near(&tiles, player_tile, 10) else {
                continue;
            };
            let id = ActorId(format!("npc_{index}"));
            let sprite = NPC_SPRITES[index % NPC_SPRITES.len()];
            let speed = self.rng.gen_range(2.0..4.0);
            actors.push(Actor::new(id.clone(), sprite, tile, &grid).with_speed(speed));
            self.npc_ids.push(id);
        }

        info!(
            room = %room,
            player_x = player_tile.x,
            player_y = player_tile.y,
            npc_count = self.npc_ids.len(),
            "room_populated"
        );
        frame_loop.engine_mut().dispatch(GameAction::Init(InitPayload {
            tiles,
            actors,
            viewport: VIEWPORT,
            zoom: None,
            local_player_id: Some(ActorId::from(PLAYER_ID)),
        }));
        self.follow_player(frame_loop);
        Ok(())
    }

    /// Issues this frame's scripted input, pumps the loop and keeps the
    /// camera on the player.
    pub(crate) fn frame<C: Clock>(&mut self, frame_loop: &mut FrameLoop<C>) -> FrameView {
        let now = frame_loop.clock().now();
        if now >= self.next_player_tap {
            self.tap_somewhere(frame_loop, now);
            self.next_player_tap = now + PLAYER_TAP_INTERVAL;
        }
        self.drive_npcs(frame_loop, now);

        let effects_before = frame_loop.engine().state().effects_tick;
        frame_loop.pump_frame();
        let effects_after = frame_loop.engine().state().effects_tick;
        self.summary.effects_ticks += effects_after.wrapping_sub(effects_before);
        let events = frame_loop.engine_mut().drain_events();
        self.record_events(&events);
        self.follow_player(frame_loop);

        let view = frame_loop.engine_mut().frame_view();
        self.summary.frames += 1;
        self.summary.max_visible_actors = self.summary.max_visible_actors.max(view.actors.len());
        debug!(
            visible_tiles = view.tile_indices.len(),
            visible_effects = view.tile_effects.len(),
            visible_actors = view.actors.len(),
            camera_x = view.camera.x,
            camera_y = view.camera.y,
            "frame_composed"
        );
        view
    }

    pub(crate) fn finish<C: Clock>(mut self, frame_loop: &FrameLoop<C>) -> SessionSummary {
        if let Some(player) = frame_loop.engine().state().local_player() {
            self.summary.player_tile = (player.tile.x, player.tile.y);
        }
        self.summary
    }

    fn tap_somewhere<C: Clock>(&mut self, frame_loop: &mut FrameLoop<C>, now: Duration) {
        let screen_px = Vec2::new(
            self.rng.gen_range(0.0..VIEWPORT.width as f32),
            self.rng.gen_range(0.0..VIEWPORT.height as f32),
        );
        let outcome = frame_loop.engine_mut().apply_command(
            EngineCommand::TapTile {
                screen_px,
                allow_diagonal: true,
            },
            now,
        );
        self.record(outcome);
    }

    fn drive_npcs<C: Clock>(&mut self, frame_loop: &mut FrameLoop<C>, now: Duration) {
        for index in 0..self.npc_ids.len() {
            let npc_id = self.npc_ids[index].clone();
            let engine = frame_loop.engine();
            if engine.movement().is_moving(&npc_id) {
                continue;
            }
            let Some(npc) = engine.state().actor(&npc_id) else {
                continue;
            };
            let origin = npc.tile;
            let tiles = Arc::clone(&engine.state().tiles);

            let command = if self.rng.gen_bool(NPC_WANDER_CHANCE) {
                let Some(target) = self.random_walkable_near(&tiles, origin, NPC_WANDER_RADIUS_TILES)
                else {
                    continue;
                };
                EngineCommand::MoveActor {
                    actor_id: npc_id,
                    target,
                    allow_diagonal: true,
                }
            } else if self.rng.gen_bool(NPC_EMOTE_CHANCE) {
                let state = NPC_EMOTES[self.rng.gen_range(0..NPC_EMOTES.len())];
                EngineCommand::Emote {
                    actor_id: npc_id,
                    state,
                }
            } else {
                continue;
            };
            let outcome = frame_loop.engine_mut().apply_command(command, now);
            self.record(outcome);
        }
    }

    fn record(&mut self, outcome: CommandOutcome) {
        match outcome {
            CommandOutcome::Move(MoveOutcome::Started { .. }) => self.summary.moves_started += 1,
            CommandOutcome::Move(_) => self.summary.moves_rejected += 1,
            CommandOutcome::Emoted => self.summary.emotes += 1,
            _ => {}
        }
    }

    fn record_events(&mut self, events: &[MoveEvent]) {
        for event in events {
            match event {
                MoveEvent::Arrived { .. } => self.summary.arrivals += 1,
                MoveEvent::Stuck { .. } => self.summary.stuck_moves += 1,
                MoveEvent::StepCompleted { .. } => {}
            }
        }
    }

    fn follow_player<C: Clock>(&self, frame_loop: &mut FrameLoop<C>) {
        let state = frame_loop.engine().state();
        let Some(player) = state.local_player() else {
            return;
        };
        let camera = camera_centered_on(state.grid(), player.pixel, state.view_extent_px());
        if camera != state.camera {
            frame_loop
                .engine_mut()
                .dispatch(GameAction::SetCamera { camera });
        }
    }

    fn random_walkable_near(
        &mut self,
        tiles: &TileGrid,
        origin: TileCoord,
        radius: i32,
    ) -> Option<TileCoord> {
        for _ in 0..16 {
            let candidate = TileCoord::new(
                origin.x + self.rng.gen_range(-radius..=radius),
                origin.y + self.rng.gen_range(-radius..=radius),
            );
            if tiles.is_walkable(candidate) {
                return Some(candidate);
            }
        }
        None
    }
}

/// Camera that centers `focus`, clamped so the view stays inside the room
/// when the room is larger than the view.
pub(crate) fn camera_centered_on(grid: &GridConfig, focus: Vec2, view_extent: Vec2) -> Vec2 {
    let world = grid.world_size_px();
    let clamp_axis = |focus: f32, extent: f32, world: f32| {
        let wanted = focus - extent / 2.0;
        if world <= extent {
            (world - extent) / 2.0
        } else {
            wanted.clamp(0.0, world - extent)
        }
    };
    Vec2::new(
        clamp_axis(focus.x, view_extent.x, world.x),
        clamp_axis(focus.y, view_extent.y, world.y),
    )
}

fn nearest_walkable(tiles: &TileGrid, center: TileCoord) -> Option<TileCoord> {
    let grid = tiles.config();
    let max_radius = grid.cols.max(grid.rows) as i32;
    (0..=max_radius).find_map(|radius| {
        (-radius..=radius)
            .flat_map(|dy| (-radius..=radius).map(move |dx| (dx, dy)))
            .filter(|(dx, dy)| dx.abs() == radius || dy.abs() == radius)
            .map(|(dx, dy)| TileCoord::new(center.x + dx, center.y + dy))
            .find(|tile| tiles.is_walkable(*tile))
    })
}
