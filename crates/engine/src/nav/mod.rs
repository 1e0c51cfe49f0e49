mod astar;
mod line_of_sight;

pub use astar::{find_path, find_path_with, PathQuery, DIAGONAL_STEP_COST, ORTHOGONAL_STEP_COST};
pub use line_of_sight::{has_line_of_sight, smooth_path};
