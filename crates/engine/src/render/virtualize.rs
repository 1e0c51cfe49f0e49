use crate::grid::{world_px_to_tile, GridConfig, TileCoord, Vec2};
use crate::state::{Actor, GameState};

/// Tiles of padding added on every side of the visible tile window.
pub const TILE_WINDOW_PADDING: u32 = 2;
/// World pixels of padding around the viewport when culling actors.
pub const ACTOR_CULL_PADDING_PX: f32 = 64.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

/// Inclusive tile rectangle, always inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileWindow {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl TileWindow {
    pub fn contains(&self, tile: TileCoord) -> bool {
        tile.x >= self.x_min as i32
            && tile.x <= self.x_max as i32
            && tile.y >= self.y_min as i32
            && tile.y <= self.y_max as i32
    }

    pub fn tile_count(&self) -> usize {
        (self.x_max - self.x_min + 1) as usize * (self.y_max - self.y_min + 1) as usize
    }

    /// Row-major tile indices for a grid `cols` wide.
    pub fn indices(&self, cols: u32) -> impl Iterator<Item = usize> + '_ {
        (self.y_min..=self.y_max).flat_map(move |y| {
            (self.x_min..=self.x_max).map(move |x| y as usize * cols as usize + x as usize)
        })
    }

    pub fn coords(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (self.y_min..=self.y_max).flat_map(move |y| {
            (self.x_min..=self.x_max).map(move |x| TileCoord::new(x as i32, y as i32))
        })
    }
}

/// World rectangle shown by the viewport, grown by `padding_px` on every side.
pub fn view_bounds_world(state: &GameState, padding_px: f32) -> WorldBounds {
    let extent = state.view_extent_px();
    let padding = padding_px.max(0.0);
    WorldBounds {
        min_x: state.camera.x - padding,
        max_x: state.camera.x + extent.x + padding,
        min_y: state.camera.y - padding,
        max_y: state.camera.y + extent.y + padding,
    }
}

/// Minimal tile rectangle intersecting the viewport, grown by `padding_tiles`
/// and clamped to the grid. `None` when the viewport shows no tile at all.
pub fn visible_tile_window(state: &GameState, padding_tiles: u32) -> Option<TileWindow> {
    let grid = state.grid();
    if grid.cols == 0 || grid.rows == 0 || grid.tile_size == 0 {
        return None;
    }
    let bounds = view_bounds_world(state, 0.0);
    let (x_min, x_max, y_min, y_max) = if grid.isometric {
        isometric_tile_span(grid, &bounds)
    } else {
        orthogonal_tile_span(grid, &bounds)
    };

    // Reject before padding so a far-away camera never pads its way back in.
    let x_limit = grid.cols as i64 - 1;
    let y_limit = grid.rows as i64 - 1;
    if x_max < 0 || y_max < 0 || x_min > x_limit || y_min > y_limit || x_min > x_max || y_min > y_max
    {
        return None;
    }

    let padding = padding_tiles as i64;
    Some(TileWindow {
        x_min: (x_min - padding).max(0) as u32,
        x_max: (x_max + padding).min(x_limit) as u32,
        y_min: (y_min - padding).max(0) as u32,
        y_max: (y_max + padding).min(y_limit) as u32,
    })
}

fn orthogonal_tile_span(grid: &GridConfig, bounds: &WorldBounds) -> (i64, i64, i64, i64) {
    let ts = grid.tile_size as f32;
    (
        (bounds.min_x / ts).floor() as i64,
        (bounds.max_x / ts).ceil() as i64 - 1,
        (bounds.min_y / ts).floor() as i64,
        (bounds.max_y / ts).ceil() as i64 - 1,
    )
}

/// Tile-space bounding box of the viewport's corners. The projection is linear,
/// so every visible diamond lies within it.
fn isometric_tile_span(grid: &GridConfig, bounds: &WorldBounds) -> (i64, i64, i64, i64) {
    let corners = [
        Vec2::new(bounds.min_x, bounds.min_y),
        Vec2::new(bounds.max_x, bounds.min_y),
        Vec2::new(bounds.min_x, bounds.max_y),
        Vec2::new(bounds.max_x, bounds.max_y),
    ];
    let mut span = (i64::MAX, i64::MIN, i64::MAX, i64::MIN);
    for corner in corners {
        let tile = world_px_to_tile(grid, corner);
        span.0 = span.0.min(tile.x as i64);
        span.1 = span.1.max(tile.x as i64);
        span.2 = span.2.min(tile.y as i64);
        span.3 = span.3.max(tile.y as i64);
    }
    span
}

/// Actors whose pixel position lies inside the padded viewport, in draw order
/// (pixel y, then id).
pub fn cull_actors(state: &GameState, padding_px: f32) -> Vec<&Actor> {
    let bounds = view_bounds_world(state, padding_px);
    let mut visible: Vec<&Actor> = state
        .actors
        .values()
        .filter(|actor| bounds_contains_point(&bounds, actor.pixel))
        .collect();
    visible.sort_by(|left, right| {
        left.pixel
            .y
            .total_cmp(&right.pixel.y)
            .then_with(|| left.id.cmp(&right.id))
    });
    visible
}

fn bounds_contains_point(bounds: &WorldBounds, point: Vec2) -> bool {
    point.x >= bounds.min_x
        && point.x <= bounds.max_x
        && point.y >= bounds.min_y
        && point.y <= bounds.max_y
}
