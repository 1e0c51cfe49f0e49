pub mod anim;
pub mod app;
pub mod content;
pub mod grid;
pub mod movement;
pub mod nav;
pub mod render;
pub mod state;
mod sprite_keys;

pub use anim::{AnimState, AnimationStateMachine, SpriteConfig};
pub use app::{
    compute_cap_sleep, target_frame_duration, Clock, CommandOutcome, Engine, EngineCommand,
    EngineConfig, FrameLoop, FrameView, LoopMetricsSnapshot, ManualClock, MetricsHandle,
    SystemClock, TimerManager,
};
pub use content::{
    locate_assets, parse_room_layout, AssetPaths, AssetRootError, RoomKind, RoomLayoutError,
    SpriteCatalog, SpriteConfigError, UnknownRoomError, LEPAK_GRID,
};
pub use grid::{
    Direction, DirectionModel, GridConfig, Tile, TileCoord, TileGrid, TileGridError, TileKind,
    Vec2,
};
pub use movement::{MoveCommand, MoveEvent, MoveOutcome, MovementController};
pub use nav::{find_path, find_path_with, PathQuery};
pub use state::{reduce, Actor, ActorId, GameAction, GameState, InitPayload, ViewportPx};
pub use sprite_keys::SpriteKeyError;
