use std::collections::BTreeMap;
use std::sync::Arc;

use crate::grid::{tile_center_px, TileGrid, Vec2};

use super::{Actor, ActorId, GameState, ViewportPx, ZOOM_DEFAULT};

#[derive(Debug, Clone, PartialEq)]
pub struct InitPayload {
    pub tiles: Arc<TileGrid>,
    pub actors: Vec<Actor>,
    pub viewport: ViewportPx,
    pub zoom: Option<f32>,
    pub local_player_id: Option<ActorId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameAction {
    Init(InitPayload),
    SetCamera { camera: Vec2 },
    SetZoom { zoom: f32 },
    EffectTick,
    /// Adds an actor entering the room. An existing actor with the same id is
    /// left untouched.
    ActorJoined(Actor),
    ActorLeft(ActorId),
}

/// Pure transition. Never touches an existing actor's position, facing or
/// animation state.
pub fn reduce(state: &GameState, action: GameAction) -> GameState {
    match action {
        GameAction::Init(payload) => init_state(payload),
        GameAction::SetCamera { camera } => GameState {
            camera,
            ..state.clone()
        },
        GameAction::SetZoom { zoom } => GameState {
            zoom,
            ..state.clone()
        },
        GameAction::EffectTick => GameState {
            effects_tick: state.effects_tick.wrapping_add(1),
            ..state.clone()
        },
        GameAction::ActorJoined(actor) => {
            let mut next = state.clone();
            if !next.actors.contains_key(&actor.id) {
                let actor = with_derived_pixel(actor, &next.tiles);
                next.actors.insert(actor.id.clone(), actor);
            }
            next
        }
        GameAction::ActorLeft(actor_id) => {
            let mut next = state.clone();
            next.actors.remove(&actor_id);
            if next.local_player_id.as_ref() == Some(&actor_id) {
                next.local_player_id = None;
            }
            next
        }
    }
}

fn init_state(payload: InitPayload) -> GameState {
    let actors: BTreeMap<ActorId, Actor> = payload
        .actors
        .into_iter()
        .map(|actor| {
            let actor = with_derived_pixel(actor, &payload.tiles);
            (actor.id.clone(), actor)
        })
        .collect();
    GameState {
        tiles: payload.tiles,
        zoom: payload.zoom.unwrap_or(ZOOM_DEFAULT),
        camera: Vec2::ZERO,
        viewport: payload.viewport,
        actors,
        local_player_id: payload.local_player_id,
        effects_tick: 0,
    }
}

fn with_derived_pixel(mut actor: Actor, tiles: &TileGrid) -> Actor {
    actor.pixel = tile_center_px(tiles.config(), actor.tile);
    actor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::AnimState;
    use crate::grid::{Direction, GridConfig, TileCoord, TileKind};

    fn tiles() -> Arc<TileGrid> {
        Arc::new(
            TileGrid::filled(
                GridConfig {
                    cols: 10,
                    rows: 10,
                    tile_size: 24,
                    isometric: false,
                },
                TileKind::Floor,
            )
            .expect("grid"),
        )
    }

    fn initialized() -> GameState {
        let tiles = tiles();
        let mut player = Actor::new("player", "sprite1", TileCoord::new(2, 3), tiles.config());
        player.pixel = Vec2::new(-999.0, 999.0);
        reduce(
            &GameState::default(),
            GameAction::Init(InitPayload {
                tiles,
                actors: vec![player],
                viewport: ViewportPx {
                    width: 320,
                    height: 240,
                },
                zoom: None,
                local_player_id: Some(ActorId::from("player")),
            }),
        )
    }

    #[test]
    fn default_state_is_a_single_tile_room() {
        let state = GameState::default();
        assert_eq!(state.grid().cols, 1);
        assert_eq!(state.grid().rows, 1);
        assert_eq!(state.grid().tile_size, 24);
        assert_eq!(state.zoom, 1.0);
        assert_eq!(state.viewport, ViewportPx::default());
        assert!(state.actors.is_empty());
    }

    #[test]
    fn init_rederives_actor_pixel_positions() {
        let state = initialized();
        let player = state.actor(&ActorId::from("player")).expect("player");
        assert_eq!(player.pixel, Vec2::new(2.0 * 24.0 + 12.0, 3.0 * 24.0 + 12.0));
        assert_eq!(state.zoom, ZOOM_DEFAULT);
        assert_eq!(state.local_player().map(|actor| &actor.id), Some(&ActorId::from("player")));
    }

    #[test]
    fn set_camera_only_replaces_camera_without_clamping() {
        let before = initialized();
        let after = reduce(
            &before,
            GameAction::SetCamera {
                camera: Vec2::new(-50.0, 10_000.0),
            },
        );
        assert_eq!(after.camera, Vec2::new(-50.0, 10_000.0));
        assert_eq!(before.camera, Vec2::ZERO);
        assert!(Arc::ptr_eq(&before.tiles, &after.tiles));
        assert_eq!(before.actors, after.actors);
        assert_eq!(before.zoom, after.zoom);
    }

    #[test]
    fn set_zoom_and_effect_tick_touch_one_field() {
        let before = initialized();
        let zoomed = reduce(&before, GameAction::SetZoom { zoom: 2.0 });
        assert_eq!(zoomed.zoom, 2.0);
        assert_eq!(zoomed.effects_tick, before.effects_tick);

        let ticked = reduce(&zoomed, GameAction::EffectTick);
        assert_eq!(ticked.effects_tick, 1);
        assert_eq!(ticked.zoom, 2.0);
        assert_eq!(ticked.camera, zoomed.camera);
    }

    #[test]
    fn reducer_is_deterministic_and_leaves_input_untouched() {
        let before = initialized();
        let snapshot = before.clone();
        let first = reduce(&before, GameAction::EffectTick);
        let second = reduce(&before, GameAction::EffectTick);
        assert_eq!(first, second);
        assert_eq!(before, snapshot);
    }

    #[test]
    fn actor_joined_does_not_overwrite_existing_actor() {
        let before = initialized();
        let mut impostor = Actor::new("player", "sprite2", TileCoord::new(9, 9), before.grid());
        impostor.direction = Direction::North;
        impostor.state = AnimState::Dancing;
        let after = reduce(&before, GameAction::ActorJoined(impostor));
        assert_eq!(after.actors, before.actors);

        let npc = Actor::new("npc", "sprite2", TileCoord::new(9, 9), before.grid());
        let after = reduce(&after, GameAction::ActorJoined(npc));
        assert_eq!(after.actors.len(), 2);
    }

    #[test]
    fn actor_left_clears_local_player() {
        let after = reduce(&initialized(), GameAction::ActorLeft(ActorId::from("player")));
        assert!(after.actors.is_empty());
        assert_eq!(after.local_player_id, None);
    }
}
