use crate::grid::{TileCoord, TileGrid};

/// Bresenham walk from `from` to `to`; every visited tile must be walkable.
pub fn has_line_of_sight(tiles: &TileGrid, from: TileCoord, to: TileCoord) -> bool {
    let (mut x, mut y) = (from.x, from.y);
    let dx = (to.x - x).abs();
    let dy = (to.y - y).abs();
    let sx = if x < to.x { 1 } else { -1 };
    let sy = if y < to.y { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        if !tiles.is_walkable(TileCoord::new(x, y)) {
            return false;
        }
        if x == to.x && y == to.y {
            return true;
        }
        let doubled = 2 * err;
        if doubled > -dy {
            err -= dy;
            x += sx;
        }
        if doubled < dx {
            err += dx;
            y += sy;
        }
    }
}

/// String-pulls a tile path down to the waypoints where line of sight breaks.
/// Endpoints are always kept; consecutive waypoints may be non-adjacent.
pub fn smooth_path(tiles: &TileGrid, path: &[TileCoord]) -> Vec<TileCoord> {
    if path.len() <= 2 {
        return path.to_vec();
    }

    let mut smoothed = vec![path[0]];
    let mut anchor = 0usize;
    let mut reach = 1usize;
    while reach < path.len() {
        while reach + 1 < path.len() && has_line_of_sight(tiles, path[anchor], path[reach + 1]) {
            reach += 1;
        }
        smoothed.push(path[reach]);
        anchor = reach;
        reach = anchor + 1;
    }
    smoothed
}
