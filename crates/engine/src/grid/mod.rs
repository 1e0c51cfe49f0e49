mod coord;
mod tiles;

pub use coord::{
    clamp_tile, direction_from_delta, tile_center_px, tile_to_world_px, world_px_to_tile,
    Direction, DirectionModel, GridConfig, TileCoord, Vec2,
};
pub use tiles::{Tile, TileEffect, TileGrid, TileGridError, TileKind, GRASS_TILE_COST};
