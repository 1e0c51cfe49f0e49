use serde::{Deserialize, Serialize};

/// Continuous world-pixel position. `y` grows downward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn lerp(self, to: Vec2, s: f32) -> Vec2 {
        Vec2 {
            x: self.x + (to.x - self.x) * s,
            y: self.y + (to.y - self.y) * s,
        }
    }
}

/// Integer tile coordinate. Values outside the grid are representable; consumers
/// validate them against a [`GridConfig`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct TileCoord {
    pub x: i32,
    pub y: i32,
}

impl TileCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn is_adjacent_4(self, other: TileCoord) -> bool {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y) == 1
    }

    pub fn is_adjacent_8(self, other: TileCoord) -> bool {
        self != other && self.x.abs_diff(other.x) <= 1 && self.y.abs_diff(other.y) <= 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "N")]
    North,
    #[serde(rename = "NE")]
    NorthEast,
    #[serde(rename = "E")]
    East,
    #[serde(rename = "SE")]
    SouthEast,
    #[serde(rename = "S")]
    South,
    #[serde(rename = "SW")]
    SouthWest,
    #[serde(rename = "W")]
    West,
    #[serde(rename = "NW")]
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// Fallback used when a sprite table lacks an entry and for zero deltas.
    pub const DEFAULT: Direction = Direction::South;

    pub const fn short_name(self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::NorthEast => "NE",
            Direction::East => "E",
            Direction::SouthEast => "SE",
            Direction::South => "S",
            Direction::SouthWest => "SW",
            Direction::West => "W",
            Direction::NorthWest => "NW",
        }
    }
}

impl Default for Direction {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectionModel {
    Four,
    #[default]
    Eight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub cols: u32,
    pub rows: u32,
    /// World pixels per tile before zoom. For isometric grids this is the
    /// horizontal half-extent of a tile diamond.
    pub tile_size: u32,
    #[serde(default)]
    pub isometric: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cols: 1,
            rows: 1,
            tile_size: 24,
            isometric: false,
        }
    }
}

impl GridConfig {
    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.x >= 0 && tile.y >= 0 && (tile.x as u32) < self.cols && (tile.y as u32) < self.rows
    }

    pub fn index_of(&self, tile: TileCoord) -> Option<usize> {
        if !self.contains(tile) {
            return None;
        }
        Some(tile.y as usize * self.cols as usize + tile.x as usize)
    }

    pub fn coord_of(&self, index: usize) -> TileCoord {
        let cols = self.cols.max(1) as usize;
        TileCoord {
            x: (index % cols) as i32,
            y: (index / cols) as i32,
        }
    }

    pub fn tile_count(&self) -> usize {
        self.cols as usize * self.rows as usize
    }

    /// Size of the orthogonal world in pixels.
    pub fn world_size_px(&self) -> Vec2 {
        Vec2 {
            x: self.cols as f32 * self.tile_size as f32,
            y: self.rows as f32 * self.tile_size as f32,
        }
    }

    fn tile_height_px(&self) -> f32 {
        if self.isometric {
            self.tile_size as f32 / 2.0
        } else {
            self.tile_size as f32
        }
    }
}

/// Pixel position of a tile's origin: the top-left corner for orthogonal grids,
/// the top vertex of the tile diamond for isometric grids.
pub fn tile_to_world_px(grid: &GridConfig, tile: TileCoord) -> Vec2 {
    let tw = grid.tile_size as f32;
    if grid.isometric {
        let th = grid.tile_height_px();
        return Vec2 {
            x: (i64::from(tile.x) - i64::from(tile.y)) as f32 * tw,
            y: (i64::from(tile.x) + i64::from(tile.y)) as f32 * th,
        };
    }
    Vec2 {
        x: tile.x as f32 * tw,
        y: tile.y as f32 * tw,
    }
}

pub fn world_px_to_tile(grid: &GridConfig, px: Vec2) -> TileCoord {
    let tw = grid.tile_size.max(1) as f32;
    if grid.isometric {
        let th = tw / 2.0;
        let u = px.x / tw;
        let v = px.y / th;
        return TileCoord {
            x: ((u + v) / 2.0).floor() as i32,
            y: ((v - u) / 2.0).floor() as i32,
        };
    }
    TileCoord {
        x: (px.x / tw).floor() as i32,
        y: (px.y / tw).floor() as i32,
    }
}

/// Pixel center of a tile. Actors at rest sit exactly on this point.
pub fn tile_center_px(grid: &GridConfig, tile: TileCoord) -> Vec2 {
    let origin = tile_to_world_px(grid, tile);
    if grid.isometric {
        return Vec2 {
            x: origin.x,
            y: origin.y + grid.tile_height_px(),
        };
    }
    let half = grid.tile_size as f32 / 2.0;
    Vec2 {
        x: origin.x + half,
        y: origin.y + half,
    }
}

pub fn clamp_tile(grid: &GridConfig, tile: TileCoord) -> TileCoord {
    let max_x = grid.cols.saturating_sub(1) as i32;
    let max_y = grid.rows.saturating_sub(1) as i32;
    TileCoord {
        x: tile.x.clamp(0, max_x),
        y: tile.y.clamp(0, max_y),
    }
}

/// Facing for a movement delta. A zero delta faces [`Direction::DEFAULT`] under
/// both models.
pub fn direction_from_delta(dx: i32, dy: i32, model: DirectionModel) -> Direction {
    match model {
        DirectionModel::Four => {
            if dx.unsigned_abs() > dy.unsigned_abs() {
                if dx > 0 {
                    Direction::East
                } else {
                    Direction::West
                }
            } else if dy < 0 {
                Direction::North
            } else {
                Direction::South
            }
        }
        DirectionModel::Eight => match (dx.signum(), dy.signum()) {
            (0, -1) => Direction::North,
            (1, -1) => Direction::NorthEast,
            (1, 0) => Direction::East,
            (1, 1) => Direction::SouthEast,
            (0, 1) => Direction::South,
            (-1, 1) => Direction::SouthWest,
            (-1, 0) => Direction::West,
            (-1, -1) => Direction::NorthWest,
            _ => Direction::DEFAULT,
        },
    }
}
