use tracing::{debug, warn};

use crate::grid::{TileCoord, TileGrid};

/// Fixed-point cost of one orthogonal step.
pub const ORTHOGONAL_STEP_COST: u32 = 10;
/// Fixed-point cost of one diagonal step (about sqrt(2) * 10).
pub const DIAGONAL_STEP_COST: u32 = 14;

const CARDINAL_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL_OFFSETS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathQuery {
    pub start: TileCoord,
    pub goal: TileCoord,
    pub allow_diagonal: bool,
    /// Upper bound on expanded nodes. `None` means one expansion per tile, which a
    /// search with a closed set can never exceed.
    pub max_expansions: Option<usize>,
}

impl PathQuery {
    pub fn new(start: TileCoord, goal: TileCoord, allow_diagonal: bool) -> Self {
        Self {
            start,
            goal,
            allow_diagonal,
            max_expansions: None,
        }
    }
}

/// Shortest path from `start` to `goal`, both inclusive.
///
/// Returns an empty path when either endpoint is outside the grid, the goal is
/// not walkable, or the goal cannot be reached. A path of length 1 means the
/// actor is already there.
pub fn find_path(
    tiles: &TileGrid,
    start: TileCoord,
    goal: TileCoord,
    allow_diagonal: bool,
) -> Vec<TileCoord> {
    find_path_with(tiles, PathQuery::new(start, goal, allow_diagonal))
}

pub fn find_path_with(tiles: &TileGrid, query: PathQuery) -> Vec<TileCoord> {
    let config = tiles.config();
    let (Some(start_index), Some(goal_index)) =
        (config.index_of(query.start), config.index_of(query.goal))
    else {
        return Vec::new();
    };
    if !tiles.is_walkable(query.goal) {
        return Vec::new();
    }
    if query.start == query.goal {
        return vec![query.start];
    }

    let node_count = config.tile_count();
    let max_expansions = query.max_expansions.unwrap_or(node_count);
    let mut closed = vec![false; node_count];
    let mut best_g = vec![u32::MAX; node_count];
    let mut parent = vec![None::<usize>; node_count];
    let mut open: Vec<OpenNode> = Vec::new();
    let mut next_insertion = 0u64;
    let mut expansions = 0usize;

    let start_h = heuristic(query.start, query.goal, query.allow_diagonal);
    open.push(OpenNode {
        coord: query.start,
        g_cost: 0,
        h_cost: start_h,
        f_cost: start_h,
        insertion_order: next_insertion,
    });
    next_insertion = next_insertion.saturating_add(1);
    best_g[start_index] = 0;

    while !open.is_empty() {
        if expansions >= max_expansions {
            warn!(
                start_x = query.start.x,
                start_y = query.start.y,
                goal_x = query.goal.x,
                goal_y = query.goal.y,
                max_expansions,
                "path_search_capped"
            );
            return Vec::new();
        }

        let best_index = pick_best_open_node_index(&open);
        let current = open.swap_remove(best_index);
        let Some(current_index) = config.index_of(current.coord) else {
            continue;
        };
        closed[current_index] = true;
        expansions += 1;

        if current_index == goal_index {
            let path = reconstruct_tile_path(tiles, &parent, start_index, goal_index);
            debug!(expansions, path_len = path.len(), "path_found");
            return path;
        }

        for (neighbor, step_cost) in neighbors(tiles, current.coord, query.allow_diagonal) {
            let Some(neighbor_index) = config.index_of(neighbor) else {
                continue;
            };
            if closed[neighbor_index] {
                continue;
            }

            let tentative_g = current
                .g_cost
                .saturating_add(step_cost)
                .saturating_add(terrain_surcharge(tiles, neighbor));
            if tentative_g >= best_g[neighbor_index] {
                continue;
            }

            best_g[neighbor_index] = tentative_g;
            parent[neighbor_index] = Some(current_index);
            let h_cost = heuristic(neighbor, query.goal, query.allow_diagonal);
            let f_cost = tentative_g.saturating_add(h_cost);
            match open.iter_mut().find(|node| node.coord == neighbor) {
                Some(existing) => {
                    existing.g_cost = tentative_g;
                    existing.f_cost = f_cost;
                }
                None => {
                    open.push(OpenNode {
                        coord: neighbor,
                        g_cost: tentative_g,
                        h_cost,
                        f_cost,
                        insertion_order: next_insertion,
                    });
                    next_insertion = next_insertion.saturating_add(1);
                }
            }
        }
    }

    debug!(expansions, "path_unreachable");
    Vec::new()
}

/// Extra fixed-point cost of entering `tile`: 0 for cost 1, 5 for grass at 1.5.
fn terrain_surcharge(tiles: &TileGrid, tile: TileCoord) -> u32 {
    let cost = tiles.tile(tile).map(|tile| tile.cost).unwrap_or(1.0);
    let scaled = (cost * ORTHOGONAL_STEP_COST as f32).round().max(1.0) as u32;
    scaled.saturating_sub(ORTHOGONAL_STEP_COST)
}

fn heuristic(from: TileCoord, goal: TileCoord, allow_diagonal: bool) -> u32 {
    let dx = from.x.abs_diff(goal.x);
    let dy = from.y.abs_diff(goal.y);
    let tiles = if allow_diagonal { dx.max(dy) } else { dx + dy };
    tiles.saturating_mul(ORTHOGONAL_STEP_COST)
}

/// Walkable neighbors in cardinal-then-diagonal order. Diagonals never cut a
/// blocked corner.
fn neighbors(
    tiles: &TileGrid,
    coord: TileCoord,
    allow_diagonal: bool,
) -> impl Iterator<Item = (TileCoord, u32)> + '_ {
    let cardinals = CARDINAL_OFFSETS.iter().map(move |&(dx, dy)| {
        (
            TileCoord::new(coord.x + dx, coord.y + dy),
            ORTHOGONAL_STEP_COST,
        )
    });
    let diagonals = DIAGONAL_OFFSETS
        .iter()
        .filter(move |_| allow_diagonal)
        .filter(move |&&(dx, dy)| {
            tiles.is_walkable(TileCoord::new(coord.x + dx, coord.y))
                && tiles.is_walkable(TileCoord::new(coord.x, coord.y + dy))
        })
        .map(move |&(dx, dy)| {
            (
                TileCoord::new(coord.x + dx, coord.y + dy),
                DIAGONAL_STEP_COST,
            )
        });
    cardinals
        .chain(diagonals)
        .filter(move |(neighbor, _)| tiles.is_walkable(*neighbor))
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    coord: TileCoord,
    g_cost: u32,
    h_cost: u32,
    f_cost: u32,
    insertion_order: u64,
}

fn pick_best_open_node_index(open: &[OpenNode]) -> usize {
    let mut best_index = 0usize;
    for index in 1..open.len() {
        if open_node_order_key(open[index]) < open_node_order_key(open[best_index]) {
            best_index = index;
        }
    }
    best_index
}

fn open_node_order_key(node: OpenNode) -> (u32, u32, i32, i32, u64) {
    (
        node.f_cost,
        node.h_cost,
        node.coord.y,
        node.coord.x,
        node.insertion_order,
    )
}

fn reconstruct_tile_path(
    tiles: &TileGrid,
    parent: &[Option<usize>],
    start_index: usize,
    goal_index: usize,
) -> Vec<TileCoord> {
    let mut cursor = goal_index;
    let mut indices = vec![cursor];

    while cursor != start_index {
        let Some(next) = parent.get(cursor).copied().flatten() else {
            return Vec::new();
        };
        cursor = next;
        indices.push(cursor);
    }
    indices.reverse();
    indices
        .into_iter()
        .map(|index| tiles.config().coord_of(index))
        .collect()
}
