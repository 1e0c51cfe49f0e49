use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::anim::AnimState;
use crate::content::SpriteCatalog;
use crate::grid::{tile_to_world_px, Direction, TileCoord, TileEffect, Vec2};
use crate::state::{ActorId, GameState};

use super::transform::{normalize_zoom, world_to_screen_px};
use super::virtualize::{cull_actors, TileWindow};

/// Number of phases a tile effect cycles through.
pub const TILE_EFFECT_PHASES: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenRectPx {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything a renderer needs to draw one actor this frame.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorVisual {
    pub actor_id: ActorId,
    pub sprite_id: String,
    pub sheet: String,
    /// Frame number within the sprite sheet.
    pub frame: u32,
    pub rect: ScreenRectPx,
    pub direction: Direction,
    pub state: AnimState,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileEffectVisual {
    pub tile: TileCoord,
    pub effect: TileEffect,
    pub phase: u8,
    /// Where the tile's footprint starts on screen.
    pub screen_origin: Vec2,
}

/// Draw list for the actors inside the padded viewport, in draw order.
///
/// `frames` holds the sheet frame last produced by the animation state machine;
/// actors without one draw frame 0. Actors whose sprite id is not in the
/// catalog are skipped and reported once per sprite id through `warned`.
pub fn compose_actor_visuals(
    state: &GameState,
    catalog: &SpriteCatalog,
    frames: &BTreeMap<ActorId, u32>,
    padding_px: f32,
    warned: &mut HashSet<String>,
) -> Vec<ActorVisual> {
    let zoom = normalize_zoom(state.zoom);
    cull_actors(state, padding_px)
        .into_iter()
        .filter_map(|actor| {
            let Some(sprite) = catalog.get(&actor.sprite_id) else {
                warn_missing_sprite_once(warned, &actor.sprite_id, &actor.id);
                return None;
            };
            let anchor = sprite.anchor_or_feet();
            let scale = sprite.scale * zoom;
            let origin = world_to_screen_px(actor.pixel, state.camera, state.zoom);
            Some(ActorVisual {
                actor_id: actor.id.clone(),
                sprite_id: actor.sprite_id.clone(),
                sheet: sprite.sheet.clone(),
                frame: frames.get(&actor.id).copied().unwrap_or(0),
                rect: ScreenRectPx {
                    x: origin.x - anchor.ox * scale,
                    y: origin.y - anchor.oy * scale,
                    width: sprite.frame_width as f32 * scale,
                    height: sprite.frame_height as f32 * scale,
                },
                direction: actor.direction,
                state: actor.state,
            })
        })
        .collect()
}

fn warn_missing_sprite_once(warned: &mut HashSet<String>, sprite_id: &str, actor_id: &ActorId) {
    if !warned.insert(sprite_id.to_string()) {
        return;
    }
    warn!(
        sprite_id,
        actor = %actor_id,
        "actor_sprite_missing_skipping_draw"
    );
}

/// Effect-tagged tiles inside `window`, row-major. Neighbouring tiles are
/// offset by one phase so effects ripple instead of blinking in unison.
pub fn visible_tile_effects(state: &GameState, window: &TileWindow) -> Vec<TileEffectVisual> {
    let effects_tick = state.effects_tick;
    window
        .coords()
        .filter_map(|coord| {
            let tile = state.tiles.tile(coord)?;
            let effect = tile.effect?;
            let offset = (coord.x + coord.y) as u64;
            Some(TileEffectVisual {
                tile: coord,
                effect,
                phase: (effects_tick.wrapping_add(offset) % TILE_EFFECT_PHASES) as u8,
                screen_origin: tile_screen_origin_px(state, coord),
            })
        })
        .collect()
}

/// Screen-space top-left corner of a tile's footprint.
pub fn tile_screen_origin_px(state: &GameState, tile: TileCoord) -> Vec2 {
    world_to_screen_px(tile_to_world_px(state.grid(), tile), state.camera, state.zoom)
}
