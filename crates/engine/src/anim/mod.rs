mod sprite;
mod state_machine;

pub use sprite::{AnimState, Anchor, AnimationDef, SpriteConfig, DEFAULT_SPRITE_FPS};
pub use state_machine::{AnimationStateMachine, FrameCursor};
