use crate::grid::Vec2;
use crate::state::ZOOM_DEFAULT;

/// Screen pixel for a world pixel. The camera is the world pixel shown at the
/// top-left of the viewport; both axes grow right/down.
pub fn world_to_screen_px(world: Vec2, camera: Vec2, zoom: f32) -> Vec2 {
    let zoom = normalize_zoom(zoom);
    Vec2 {
        x: (world.x - camera.x) * zoom,
        y: (world.y - camera.y) * zoom,
    }
}

pub fn screen_to_world_px(screen: Vec2, camera: Vec2, zoom: f32) -> Vec2 {
    let zoom = normalize_zoom(zoom);
    Vec2 {
        x: screen.x / zoom + camera.x,
        y: screen.y / zoom + camera.y,
    }
}

pub(crate) fn normalize_zoom(zoom: f32) -> f32 {
    if zoom.is_finite() && zoom > f32::EPSILON {
        zoom
    } else {
        ZOOM_DEFAULT
    }
}
