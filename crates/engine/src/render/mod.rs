mod transform;
mod virtualize;
mod visuals;

pub use transform::{screen_to_world_px, world_to_screen_px};
pub use virtualize::{
    cull_actors, view_bounds_world, visible_tile_window, TileWindow, WorldBounds,
    ACTOR_CULL_PADDING_PX, TILE_WINDOW_PADDING,
};
pub use visuals::{
    compose_actor_visuals, tile_screen_origin_px, visible_tile_effects, ActorVisual,
    ScreenRectPx, TileEffectVisual, TILE_EFFECT_PHASES,
};
