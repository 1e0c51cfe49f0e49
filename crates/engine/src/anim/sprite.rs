use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::grid::Direction;

pub const DEFAULT_SPRITE_FPS: f32 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimState {
    #[default]
    Idle,
    Walking,
    Running,
    Jumping,
    Sitting,
    Dancing,
    Waving,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationDef {
    #[serde(default)]
    pub by_dir: BTreeMap<Direction, Vec<u32>>,
    #[serde(rename = "loop", default = "default_looping")]
    pub looping: bool,
}

fn default_looping() -> bool {
    true
}

/// Pixel origin within a frame. Sprites are drawn so this point lands on the
/// actor's pixel position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub ox: f32,
    pub oy: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpriteConfig {
    pub id: String,
    pub sheet: String,
    pub frame_width: u32,
    pub frame_height: u32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_fps")]
    pub fps: f32,
    #[serde(default)]
    pub anchor: Option<Anchor>,
    #[serde(default)]
    pub animations: BTreeMap<AnimState, AnimationDef>,
}

fn default_scale() -> f32 {
    1.0
}

fn default_fps() -> f32 {
    DEFAULT_SPRITE_FPS
}

impl SpriteConfig {
    /// Frame list for a state and facing. Missing facings fall back to south; a
    /// missing state yields an empty list.
    pub fn frames_for(&self, state: AnimState, direction: Direction) -> &[u32] {
        let Some(animation) = self.animations.get(&state) else {
            return &[];
        };
        animation
            .by_dir
            .get(&direction)
            .or_else(|| animation.by_dir.get(&Direction::DEFAULT))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_looping(&self, state: AnimState) -> bool {
        self.animations
            .get(&state)
            .map(|animation| animation.looping)
            .unwrap_or(true)
    }

    pub fn frame_interval(&self) -> Duration {
        let fps = if self.fps.is_finite() && self.fps > 0.0 {
            self.fps
        } else {
            DEFAULT_SPRITE_FPS
        };
        Duration::from_nanos((1_000_000_000.0 / fps as f64).round() as u64)
    }

    /// Configured anchor, or the bottom-center of the frame.
    pub fn anchor_or_feet(&self) -> Anchor {
        self.anchor.unwrap_or(Anchor {
            ox: self.frame_width as f32 / 2.0,
            oy: self.frame_height as f32,
        })
    }
}
