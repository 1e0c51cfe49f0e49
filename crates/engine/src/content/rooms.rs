use std::fmt;
use std::str::FromStr;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{GridConfig, Tile, TileCoord, TileEffect, TileGrid, TileGridError, TileKind};

/// The 85x85 orthogonal grid every lepak room is built on.
pub const LEPAK_GRID: GridConfig = GridConfig {
    cols: 85,
    rows: 85,
    tile_size: 24,
    isometric: false,
};

const PARK_GRASS_CHANCE: f64 = 0.3;
const ARCADE_WATER_CHANCE: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    Park,
    Cafe,
    Arcade,
}

impl RoomKind {
    pub const ALL: [RoomKind; 3] = [RoomKind::Park, RoomKind::Cafe, RoomKind::Arcade];

    pub const fn name(self) -> &'static str {
        match self {
            RoomKind::Park => "park",
            RoomKind::Cafe => "cafe",
            RoomKind::Arcade => "arcade",
        }
    }

    pub fn generate(self, seed: u64) -> Result<TileGrid, TileGridError> {
        self.generate_with(LEPAK_GRID, seed)
    }

    /// Builds the room's terrain. The same seed always yields the same tiles.
    pub fn generate_with(self, config: GridConfig, seed: u64) -> Result<TileGrid, TileGridError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let last_x = config.cols.saturating_sub(1) as i32;
        let last_y = config.rows.saturating_sub(1) as i32;
        let mut tiles = Vec::with_capacity(config.tile_count());

        for index in 0..config.tile_count() {
            let coord = config.coord_of(index);
            let tile = match self {
                RoomKind::Cafe => {
                    let on_perimeter =
                        coord.x == 0 || coord.y == 0 || coord.x == last_x || coord.y == last_y;
                    if on_perimeter {
                        Tile::new(coord, TileKind::Wall)
                    } else {
                        Tile::new(coord, TileKind::Floor)
                    }
                }
                RoomKind::Park => {
                    if rng.gen_bool(PARK_GRASS_CHANCE) {
                        Tile::new(coord, TileKind::Grass).with_effect(TileEffect::Footstep)
                    } else {
                        Tile::new(coord, TileKind::Floor)
                    }
                }
                RoomKind::Arcade => {
                    if rng.gen_bool(ARCADE_WATER_CHANCE) {
                        Tile::new(coord, TileKind::Water).with_effect(TileEffect::Splash)
                    } else {
                        Tile::new(coord, TileKind::Floor)
                    }
                }
            };
            tiles.push(tile);
        }

        TileGrid::new(config, tiles)
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown room '{0}' (expected park, cafe or arcade)")]
pub struct UnknownRoomError(pub String);

impl FromStr for RoomKind {
    type Err = UnknownRoomError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        RoomKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| UnknownRoomError(raw.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomLayoutError {
    #[error("room layout has no rows")]
    Empty,
    #[error("row {row} has {actual} tiles, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile glyph '{glyph}' at ({x}, {y})")]
    UnknownGlyph { glyph: char, x: usize, y: usize },
    #[error(transparent)]
    Grid(#[from] TileGridError),
}

/// Parses a hand-drawn room. One line per row, blank lines ignored:
///
/// ```text
/// .  floor      ,  grass (footsteps)   ~  water (splash)
/// #  wall       P  portal (sparkle)    o  object
/// ```
pub fn parse_room_layout(layout: &str, tile_size: u32) -> Result<TileGrid, RoomLayoutError> {
    let rows: Vec<&str> = layout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let Some(first) = rows.first() else {
        return Err(RoomLayoutError::Empty);
    };
    let cols = first.chars().count();

    let mut tiles = Vec::with_capacity(cols * rows.len());
    for (y, row) in rows.iter().enumerate() {
        let actual = row.chars().count();
        if actual != cols {
            return Err(RoomLayoutError::RaggedRow {
                row: y,
                expected: cols,
                actual,
            });
        }
        for (x, glyph) in row.chars().enumerate() {
            let coord = TileCoord::new(x as i32, y as i32);
            let tile = match glyph {
                '.' => Tile::new(coord, TileKind::Floor),
                ',' => Tile::new(coord, TileKind::Grass).with_effect(TileEffect::Footstep),
                '~' => Tile::new(coord, TileKind::Water).with_effect(TileEffect::Splash),
                '#' => Tile::new(coord, TileKind::Wall),
                'P' => Tile::new(coord, TileKind::Portal).with_effect(TileEffect::Sparkle),
                'o' => Tile::new(coord, TileKind::Object),
                _ => return Err(RoomLayoutError::UnknownGlyph { glyph, x, y }),
            };
            tiles.push(tile);
        }
    }

    let config = GridConfig {
        cols: cols as u32,
        rows: rows.len() as u32,
        tile_size,
        isometric: false,
    };
    Ok(TileGrid::new(config, tiles)?)
}
