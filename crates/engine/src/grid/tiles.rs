use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::coord::{GridConfig, TileCoord};

pub const GRASS_TILE_COST: f32 = 1.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    #[default]
    Floor,
    Water,
    Grass,
    Wall,
    Portal,
    Object,
}

impl TileKind {
    pub const fn is_impassable(self) -> bool {
        matches!(self, TileKind::Wall | TileKind::Water | TileKind::Object)
    }

    pub const fn default_cost(self) -> f32 {
        match self {
            TileKind::Grass => GRASS_TILE_COST,
            _ => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileEffect {
    Splash,
    Footstep,
    Sparkle,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub coord: TileCoord,
    pub kind: TileKind,
    pub walkable: bool,
    pub cost: f32,
    pub effect: Option<TileEffect>,
}

impl Tile {
    /// Tile with the kind's default walkability and cost.
    pub fn new(coord: TileCoord, kind: TileKind) -> Self {
        Self {
            coord,
            kind,
            walkable: !kind.is_impassable(),
            cost: kind.default_cost(),
            effect: None,
        }
    }

    pub fn with_effect(mut self, effect: TileEffect) -> Self {
        self.effect = Some(effect);
        self
    }

    /// Overrides the movement cost; non-finite values and values below 1 clamp to 1.
    pub fn with_cost(mut self, cost: f32) -> Self {
        self.cost = normalize_cost(cost);
        self
    }

    /// Marks a passable kind as blocked. Impassable kinds stay blocked either way.
    pub fn blocked(mut self) -> Self {
        self.walkable = false;
        self
    }
}

fn normalize_cost(cost: f32) -> f32 {
    if cost.is_finite() {
        cost.max(1.0)
    } else {
        1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileGridError {
    #[error("tile count mismatch: expected {expected}, got {actual}")]
    TileCountMismatch { expected: usize, actual: usize },
    #[error("tile at index {index} has coordinate ({x}, {y}), expected ({expected_x}, {expected_y})")]
    CoordinateMismatch {
        index: usize,
        x: i32,
        y: i32,
        expected_x: i32,
        expected_y: i32,
    },
    #[error("tile ({x}, {y}) is outside the grid")]
    OutOfBounds { x: i32, y: i32 },
    #[error("tile size must be non-zero")]
    ZeroTileSize,
}

/// Immutable room terrain: a grid configuration plus its row-major tile array.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    config: GridConfig,
    tiles: Vec<Tile>,
}

impl Default for TileGrid {
    /// A single floor tile on the default grid.
    fn default() -> Self {
        let config = GridConfig::default();
        let tiles = (0..config.tile_count())
            .map(|index| Tile::new(config.coord_of(index), TileKind::Floor))
            .collect();
        Self { config, tiles }
    }
}

impl TileGrid {
    pub fn new(config: GridConfig, tiles: Vec<Tile>) -> Result<Self, TileGridError> {
        if config.tile_size == 0 {
            return Err(TileGridError::ZeroTileSize);
        }
        let expected = config.tile_count();
        let actual = tiles.len();
        if expected != actual {
            return Err(TileGridError::TileCountMismatch { expected, actual });
        }

        let mut tiles = tiles;
        for (index, tile) in tiles.iter_mut().enumerate() {
            let expected_coord = config.coord_of(index);
            if tile.coord != expected_coord {
                return Err(TileGridError::CoordinateMismatch {
                    index,
                    x: tile.coord.x,
                    y: tile.coord.y,
                    expected_x: expected_coord.x,
                    expected_y: expected_coord.y,
                });
            }
            if tile.kind.is_impassable() {
                tile.walkable = false;
            }
            tile.cost = normalize_cost(tile.cost);
        }

        Ok(Self { config, tiles })
    }

    /// Grid where every tile has the same kind.
    pub fn filled(config: GridConfig, kind: TileKind) -> Result<Self, TileGridError> {
        let tiles = (0..config.tile_count())
            .map(|index| Tile::new(config.coord_of(index), kind))
            .collect();
        Self::new(config, tiles)
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, coord: TileCoord) -> Option<&Tile> {
        self.config
            .index_of(coord)
            .and_then(|index| self.tiles.get(index))
    }

    pub fn is_walkable(&self, coord: TileCoord) -> bool {
        self.tile(coord).map(|tile| tile.walkable).unwrap_or(false)
    }

    /// Returns a copy with one tile replaced. Used while building rooms, never
    /// during a session.
    pub fn with_tile(mut self, tile: Tile) -> Result<Self, TileGridError> {
        let Some(index) = self.config.index_of(tile.coord) else {
            return Err(TileGridError::OutOfBounds {
                x: tile.coord.x,
                y: tile.coord.y,
            });
        };
        let mut tile = tile;
        if tile.kind.is_impassable() {
            tile.walkable = false;
        }
        tile.cost = normalize_cost(tile.cost);
        self.tiles[index] = tile;
        Ok(self)
    }
}
