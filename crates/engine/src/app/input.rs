use crate::anim::AnimState;
use crate::grid::{TileCoord, Vec2};
use crate::movement::MoveOutcome;
use crate::state::ActorId;

/// Requests from the host (local input, network, scripted NPCs).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCommand {
    MoveActor {
        actor_id: ActorId,
        target: TileCoord,
        allow_diagonal: bool,
    },
    /// Walks the local player to the tile under a screen position.
    TapTile {
        screen_px: Vec2,
        allow_diagonal: bool,
    },
    /// Shifts the camera by a world-pixel delta.
    PanCamera { dx: f32, dy: f32 },
    CancelMove { actor_id: ActorId },
    /// Plays a stationary animation such as sitting or waving. Ignored while
    /// the actor is walking.
    Emote { actor_id: ActorId, state: AnimState },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Move(MoveOutcome),
    CameraPanned,
    Cancelled { was_moving: bool },
    Emoted,
    /// Nothing to act on, e.g. an off-grid tap or an unknown actor.
    Ignored,
}
