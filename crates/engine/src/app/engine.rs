use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use tracing::{debug, info};

use crate::anim::{AnimState, AnimationStateMachine};
use crate::content::SpriteCatalog;
use crate::grid::{tile_center_px, world_px_to_tile, DirectionModel, Vec2};
use crate::movement::{MoveCommand, MoveEvent, MoveOutcome, MovementController};
use crate::render::{
    compose_actor_visuals, screen_to_world_px, visible_tile_effects, visible_tile_window,
    ActorVisual, TileEffectVisual, TileWindow, ACTOR_CULL_PADDING_PX, TILE_WINDOW_PADDING,
};
use crate::state::{reduce, ActorId, GameAction, GameState};

use super::input::{CommandOutcome, EngineCommand};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub tile_padding: u32,
    pub actor_cull_padding_px: f32,
    pub effects_interval: Duration,
    pub metrics_interval: Duration,
    pub direction_model: DirectionModel,
    /// `None` lets a search visit every tile once.
    pub max_path_expansions: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tile_padding: TILE_WINDOW_PADDING,
            actor_cull_padding_px: ACTOR_CULL_PADDING_PX,
            effects_interval: Duration::from_millis(250),
            metrics_interval: Duration::from_secs(1),
            direction_model: DirectionModel::Eight,
            max_path_expansions: None,
        }
    }
}

/// What a renderer draws for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub tile_window: Option<TileWindow>,
    /// Row-major indices into the tile array for `tile_window`.
    pub tile_indices: Vec<usize>,
    pub tile_effects: Vec<TileEffectVisual>,
    pub actors: Vec<ActorVisual>,
    pub camera: Vec2,
    pub zoom: f32,
    pub effects_tick: u64,
}

/// Owns the room's state tree and the subsystems allowed to write it.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    state: GameState,
    movement: MovementController,
    animation: AnimationStateMachine,
    catalog: SpriteCatalog,
    frames: BTreeMap<ActorId, u32>,
    pending_events: Vec<MoveEvent>,
    warned_sprites: HashSet<String>,
}

impl Engine {
    pub fn new(config: EngineConfig, catalog: SpriteCatalog) -> Self {
        let movement = MovementController::new(config.direction_model)
            .with_max_path_expansions(config.max_path_expansions);
        Self {
            config,
            state: GameState::default(),
            movement,
            animation: AnimationStateMachine::new(),
            catalog,
            frames: BTreeMap::new(),
            pending_events: Vec::new(),
            warned_sprites: HashSet::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn movement(&self) -> &MovementController {
        &self.movement
    }

    pub fn animation(&self) -> &AnimationStateMachine {
        &self.animation
    }

    pub fn catalog(&self) -> &SpriteCatalog {
        &self.catalog
    }

    /// Sheet frame chosen for the actor on the latest tick.
    pub fn frame_of(&self, actor_id: &ActorId) -> Option<u32> {
        self.frames.get(actor_id).copied()
    }

    /// Applies a structural change. Transient movement and animation data of
    /// actors that no longer exist is dropped along with them.
    pub fn dispatch(&mut self, action: GameAction) {
        match &action {
            GameAction::Init(payload) => {
                self.movement.clear();
                self.animation.clear_all();
                self.frames.clear();
                self.pending_events.clear();
                info!(
                    cols = payload.tiles.config().cols,
                    rows = payload.tiles.config().rows,
                    actor_count = payload.actors.len(),
                    "room_initialized"
                );
            }
            GameAction::ActorLeft(actor_id) => {
                self.movement.cancel(actor_id);
                self.animation.clear(actor_id);
                self.frames.remove(actor_id);
            }
            _ => {}
        }
        self.state = reduce(&self.state, action);
    }

    pub fn apply_command(&mut self, command: EngineCommand, now: Duration) -> CommandOutcome {
        match command {
            EngineCommand::MoveActor {
                actor_id,
                target,
                allow_diagonal,
            } => CommandOutcome::Move(self.movement.issue_move(
                &mut self.state,
                MoveCommand {
                    target,
                    allow_diagonal,
                },
                &actor_id,
                now,
            )),
            EngineCommand::TapTile {
                screen_px,
                allow_diagonal,
            } => self.tap_tile(screen_px, allow_diagonal, now),
            EngineCommand::PanCamera { dx, dy } => {
                let camera = Vec2::new(self.state.camera.x + dx, self.state.camera.y + dy);
                self.dispatch(GameAction::SetCamera { camera });
                CommandOutcome::CameraPanned
            }
            EngineCommand::CancelMove { actor_id } => self.cancel_move(&actor_id, now),
            EngineCommand::Emote { actor_id, state } => self.emote(&actor_id, state, now),
        }
    }

    fn tap_tile(&mut self, screen_px: Vec2, allow_diagonal: bool, now: Duration) -> CommandOutcome {
        let world = screen_to_world_px(screen_px, self.state.camera, self.state.zoom);
        let target = world_px_to_tile(self.state.grid(), world);
        if !self.state.grid().contains(target) {
            debug!(tile_x = target.x, tile_y = target.y, "tap_outside_grid");
            return CommandOutcome::Ignored;
        }
        let Some(player_id) = self.state.local_player_id.clone() else {
            return CommandOutcome::Ignored;
        };
        CommandOutcome::Move(self.movement.issue_move(
            &mut self.state,
            MoveCommand {
                target,
                allow_diagonal,
            },
            &player_id,
            now,
        ))
    }

    /// Stops a walk in place: the actor snaps back to the center of the tile
    /// it still occupies and goes idle.
    fn cancel_move(&mut self, actor_id: &ActorId, now: Duration) -> CommandOutcome {
        let was_moving = self.movement.cancel(actor_id);
        if was_moving {
            let grid = *self.state.grid();
            if let Some(actor) = self.state.actors.get_mut(actor_id) {
                actor.pixel = tile_center_px(&grid, actor.tile);
                self.animation.set_state(actor, AnimState::Idle, now);
            }
        }
        CommandOutcome::Cancelled { was_moving }
    }

    fn emote(&mut self, actor_id: &ActorId, state: AnimState, now: Duration) -> CommandOutcome {
        if self.movement.is_moving(actor_id) {
            return CommandOutcome::Ignored;
        }
        let Some(actor) = self.state.actors.get_mut(actor_id) else {
            return CommandOutcome::Ignored;
        };
        self.animation.set_state(actor, state, now);
        CommandOutcome::Emoted
    }

    /// One simulation step: movement first, then animation, so an actor that
    /// arrives this tick already shows its idle frame. The returned events are
    /// also kept for [`Engine::drain_events`].
    pub fn tick(&mut self, now: Duration) -> Vec<MoveEvent> {
        let events = self.movement.update(&mut self.state, now);
        self.pending_events.extend(events.iter().cloned());
        for actor in self.state.actors.values() {
            let Some(sprite) = self.catalog.get(&actor.sprite_id) else {
                continue;
            };
            let frame = self.animation.step(actor, sprite, now);
            self.frames.insert(actor.id.clone(), frame);
        }
        events
    }

    /// Movement events produced since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<MoveEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn frame_view(&mut self) -> FrameView {
        let tile_window = visible_tile_window(&self.state, self.config.tile_padding);
        let cols = self.state.grid().cols;
        let (tile_indices, tile_effects) = match &tile_window {
            Some(window) => (
                window.indices(cols).collect(),
                visible_tile_effects(&self.state, window),
            ),
            None => (Vec::new(), Vec::new()),
        };
        let actors = compose_actor_visuals(
            &self.state,
            &self.catalog,
            &self.frames,
            self.config.actor_cull_padding_px,
            &mut self.warned_sprites,
        );
        FrameView {
            tile_window,
            tile_indices,
            tile_effects,
            actors,
            camera: self.state.camera,
            zoom: self.state.zoom,
            effects_tick: self.state.effects_tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::anim::{AnimationDef, SpriteConfig};
    use crate::content::parse_room_layout;
    use crate::grid::{Direction, TileCoord};
    use crate::state::{Actor, InitPayload, ViewportPx};

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn sprite() -> SpriteConfig {
        let def = |frames: Vec<u32>| AnimationDef {
            by_dir: BTreeMap::from([(Direction::South, frames)]),
            looping: true,
        };
        SpriteConfig {
            id: "sprite1".to_string(),
            sheet: "sprites/sprite1".to_string(),
            frame_width: 32,
            frame_height: 32,
            scale: 1.0,
            fps: 10.0,
            anchor: None,
            animations: BTreeMap::from([
                (AnimState::Idle, def(vec![0])),
                (AnimState::Walking, def(vec![1, 2, 3])),
                (AnimState::Waving, def(vec![40, 41])),
            ]),
        }
    }

    fn engine() -> Engine {
        let catalog = SpriteCatalog::new(vec![sprite()]).expect("catalog");
        let mut engine = Engine::new(EngineConfig::default(), catalog);
        let tiles = Arc::new(
            parse_room_layout(
                "
                ......
                ......
                ......
                ......
                ",
                24,
            )
            .expect("layout"),
        );
        let player = Actor::new("p1", "sprite1", TileCoord::new(0, 0), tiles.config());
        let npc = Actor::new("npc", "sprite1", TileCoord::new(5, 3), tiles.config());
        engine.dispatch(GameAction::Init(InitPayload {
            tiles,
            actors: vec![player, npc],
            viewport: ViewportPx {
                width: 144,
                height: 96,
            },
            zoom: None,
            local_player_id: Some(ActorId::from("p1")),
        }));
        engine
    }

    fn p1() -> ActorId {
        ActorId::from("p1")
    }

    #[test]
    fn tap_moves_local_player_to_tapped_tile() {
        let mut engine = engine();
        let outcome = engine.apply_command(
            EngineCommand::TapTile {
                screen_px: Vec2::new(3.0 * 24.0 + 5.0, 5.0),
                allow_diagonal: true,
            },
            ms(0),
        );
        assert_eq!(outcome, CommandOutcome::Move(MoveOutcome::Started { legs: 3 }));
        assert_eq!(
            engine.movement().path(&p1()).and_then(|path| path.last().copied()),
            Some(TileCoord::new(3, 0))
        );
    }

    #[test]
    fn tap_outside_grid_is_ignored() {
        let mut engine = engine();
        engine.apply_command(EngineCommand::PanCamera { dx: -48.0, dy: 0.0 }, ms(0));
        let outcome = engine.apply_command(
            EngineCommand::TapTile {
                screen_px: Vec2::new(10.0, 10.0),
                allow_diagonal: true,
            },
            ms(0),
        );
        assert_eq!(outcome, CommandOutcome::Ignored);
        assert!(!engine.movement().is_moving(&p1()));
    }

    #[test]
    fn pan_camera_accumulates_through_the_reducer() {
        let mut engine = engine();
        engine.apply_command(EngineCommand::PanCamera { dx: 10.0, dy: 4.0 }, ms(0));
        engine.apply_command(EngineCommand::PanCamera { dx: 2.0, dy: -1.0 }, ms(0));
        assert_eq!(engine.state().camera, Vec2::new(12.0, 3.0));
    }

    #[test]
    fn tick_runs_movement_before_animation() {
        let mut engine = engine();
        engine.apply_command(
            EngineCommand::MoveActor {
                actor_id: p1(),
                target: TileCoord::new(1, 0),
                allow_diagonal: false,
            },
            ms(0),
        );
        engine.tick(ms(0));
        assert_eq!(engine.frame_of(&p1()), Some(1));

        let events = engine.tick(ms(250));
        assert_eq!(
            events,
            vec![MoveEvent::Arrived {
                actor_id: p1(),
                tile: TileCoord::new(1, 0),
            }]
        );
        assert_eq!(engine.frame_of(&p1()), Some(0));
        assert_eq!(
            engine.state().actor(&p1()).map(|actor| actor.state),
            Some(AnimState::Idle)
        );
        assert_eq!(engine.drain_events(), events);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn emote_plays_while_standing_and_is_ignored_while_walking() {
        let mut engine = engine();
        let wave = EngineCommand::Emote {
            actor_id: p1(),
            state: AnimState::Waving,
        };
        assert_eq!(engine.apply_command(wave.clone(), ms(0)), CommandOutcome::Emoted);
        engine.tick(ms(0));
        assert_eq!(engine.frame_of(&p1()), Some(40));
        engine.tick(ms(100));
        assert_eq!(engine.frame_of(&p1()), Some(41));

        engine.apply_command(
            EngineCommand::MoveActor {
                actor_id: p1(),
                target: TileCoord::new(3, 0),
                allow_diagonal: false,
            },
            ms(150),
        );
        assert_eq!(engine.apply_command(wave, ms(160)), CommandOutcome::Ignored);
        assert_eq!(
            engine.state().actor(&p1()).map(|actor| actor.state),
            Some(AnimState::Walking)
        );
    }

    #[test]
    fn departed_actor_loses_move_and_cursor() {
        let mut engine = engine();
        let npc = ActorId::from("npc");
        engine.apply_command(
            EngineCommand::MoveActor {
                actor_id: npc.clone(),
                target: TileCoord::new(0, 3),
                allow_diagonal: true,
            },
            ms(0),
        );
        engine.tick(ms(10));
        assert!(engine.animation().cursor(&npc).is_some());

        engine.dispatch(GameAction::ActorLeft(npc.clone()));
        assert!(!engine.movement().is_moving(&npc));
        assert!(engine.animation().cursor(&npc).is_none());
        assert_eq!(engine.frame_of(&npc), None);
        assert!(engine.state().actor(&npc).is_none());
    }

    #[test]
    fn cancel_reports_whether_a_move_was_active() {
        let mut engine = engine();
        let cancel = EngineCommand::CancelMove { actor_id: p1() };
        assert_eq!(
            engine.apply_command(cancel.clone(), ms(0)),
            CommandOutcome::Cancelled { was_moving: false }
        );
        engine.apply_command(
            EngineCommand::MoveActor {
                actor_id: p1(),
                target: TileCoord::new(2, 2),
                allow_diagonal: true,
            },
            ms(0),
        );
        engine.tick(ms(0));
        engine.tick(ms(125));
        let halfway = engine.state().actor(&p1()).expect("p1").pixel;
        assert_ne!(halfway, Vec2::new(12.0, 12.0));

        assert_eq!(
            engine.apply_command(cancel, ms(125)),
            CommandOutcome::Cancelled { was_moving: true }
        );
        for step in 1..=100 {
            engine.tick(ms(125 + step * 100));
        }
        let actor = engine.state().actor(&p1()).expect("p1");
        assert_eq!(actor.state, AnimState::Idle);
        assert_eq!(actor.tile, TileCoord::new(0, 0));
        assert_eq!(actor.pixel, Vec2::new(12.0, 12.0));
        assert!(!engine.movement().is_moving(&p1()));
        assert_eq!(engine.frame_of(&p1()), Some(0));
    }

    #[test]
    fn frame_view_lists_visible_tiles_and_actors() {
        let mut engine = engine();
        engine.tick(ms(0));
        let view = engine.frame_view();
        let window = view.tile_window.expect("window");
        assert_eq!((window.x_min, window.x_max), (0, 5));
        assert_eq!((window.y_min, window.y_max), (0, 3));
        assert_eq!(view.tile_indices.len(), 24);
        assert!(view.tile_effects.is_empty());
        let ids: Vec<&str> = view.actors.iter().map(|visual| visual.actor_id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "npc"]);
        assert_eq!(view.effects_tick, 0);
    }
}
