mod reducer;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::anim::AnimState;
use crate::grid::{tile_center_px, Direction, GridConfig, TileCoord, TileGrid, Vec2};

pub use reducer::{reduce, GameAction, InitPayload};

pub const ZOOM_DEFAULT: f32 = 1.0;
pub const DEFAULT_ACTOR_SPEED_TILES_PER_SEC: f32 = 4.0;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(pub String);

impl ActorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActorId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub sprite_id: String,
    pub tile: TileCoord,
    /// Tile-center pixel at rest; on the segment between two tile centers while
    /// a move is in flight.
    pub pixel: Vec2,
    pub direction: Direction,
    pub state: AnimState,
    pub speed_tiles_per_sec: f32,
}

impl Actor {
    /// Idle actor facing south with its pixel position derived from `tile`.
    pub fn new(
        id: impl Into<ActorId>,
        sprite_id: impl Into<String>,
        tile: TileCoord,
        grid: &GridConfig,
    ) -> Self {
        Self {
            id: id.into(),
            sprite_id: sprite_id.into(),
            tile,
            pixel: tile_center_px(grid, tile),
            direction: Direction::DEFAULT,
            state: AnimState::Idle,
            speed_tiles_per_sec: DEFAULT_ACTOR_SPEED_TILES_PER_SEC,
        }
    }

    pub fn with_speed(mut self, speed_tiles_per_sec: f32) -> Self {
        self.speed_tiles_per_sec = speed_tiles_per_sec;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewportPx {
    pub width: u32,
    pub height: u32,
}

impl Default for ViewportPx {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
        }
    }
}

/// The room session's single state tree.
///
/// Writers own disjoint fields:
/// - [`reduce`] owns `tiles`, `camera`, `zoom`, `viewport`, `local_player_id`,
///   `effects_tick`, and the actor roster itself.
/// - The movement controller owns each actor's `tile`, `pixel`, `direction`
///   and movement-driven `state`.
/// - The animation state machine keeps frame cursors outside this tree and
///   only writes `state` through explicit state changes.
/// - Rendering reads and never writes.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    pub tiles: Arc<TileGrid>,
    pub zoom: f32,
    /// World pixel at the top-left of the viewport.
    pub camera: Vec2,
    pub viewport: ViewportPx,
    pub actors: BTreeMap<ActorId, Actor>,
    pub local_player_id: Option<ActorId>,
    pub effects_tick: u64,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            tiles: Arc::new(TileGrid::default()),
            zoom: ZOOM_DEFAULT,
            camera: Vec2::ZERO,
            viewport: ViewportPx::default(),
            actors: BTreeMap::new(),
            local_player_id: None,
            effects_tick: 0,
        }
    }
}

impl GameState {
    pub fn grid(&self) -> &GridConfig {
        self.tiles.config()
    }

    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn local_player(&self) -> Option<&Actor> {
        self.local_player_id
            .as_ref()
            .and_then(|id| self.actors.get(id))
    }

    /// World extent of the viewport at the current zoom.
    pub fn view_extent_px(&self) -> Vec2 {
        let zoom = if self.zoom.is_finite() && self.zoom > f32::EPSILON {
            self.zoom
        } else {
            ZOOM_DEFAULT
        };
        Vec2 {
            x: self.viewport.width as f32 / zoom,
            y: self.viewport.height as f32 / zoom,
        }
    }
}
