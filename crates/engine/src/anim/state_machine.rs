use std::collections::BTreeMap;
use std::time::Duration;

use crate::grid::Direction;
use crate::state::{Actor, ActorId};

use super::sprite::{AnimState, SpriteConfig};

/// Per-actor animation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCursor {
    /// Position in the active frame list, not the sheet frame number.
    pub frame_index: usize,
    pub last_advance: Duration,
    state: AnimState,
    direction: Direction,
}

/// Advances frame cursors on a fixed cadence, independent of movement
/// progress. Only observes actors; writes `Actor::state` through
/// [`AnimationStateMachine::set_state`].
#[derive(Debug, Default)]
pub struct AnimationStateMachine {
    cursors: BTreeMap<ActorId, FrameCursor>,
}

impl AnimationStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sheet frame to draw for `actor` at `now`.
    ///
    /// Returns 0 without touching any cursor when the animation has no frames.
    /// Within one frame interval repeated calls return the same frame.
    pub fn step(&mut self, actor: &Actor, sprite: &SpriteConfig, now: Duration) -> u32 {
        let frames = sprite.frames_for(actor.state, actor.direction);
        if frames.is_empty() {
            return 0;
        }

        let cursor = self
            .cursors
            .entry(actor.id.clone())
            .or_insert(FrameCursor {
                frame_index: 0,
                last_advance: now,
                state: actor.state,
                direction: actor.direction,
            });

        if cursor.state != actor.state || cursor.direction != actor.direction {
            cursor.frame_index = 0;
            cursor.last_advance = now;
            cursor.state = actor.state;
            cursor.direction = actor.direction;
        } else if now.saturating_sub(cursor.last_advance) >= sprite.frame_interval() {
            cursor.frame_index = if sprite.is_looping(actor.state) {
                (cursor.frame_index + 1) % frames.len()
            } else {
                (cursor.frame_index + 1).min(frames.len() - 1)
            };
            cursor.last_advance = now;
        }

        let index = cursor.frame_index.min(frames.len() - 1);
        frames[index]
    }

    /// Switches the actor's animation state and restarts it from its first frame.
    pub fn set_state(&mut self, actor: &mut Actor, state: AnimState, now: Duration) {
        actor.state = state;
        self.cursors.insert(
            actor.id.clone(),
            FrameCursor {
                frame_index: 0,
                last_advance: now,
                state,
                direction: actor.direction,
            },
        );
    }

    pub fn cursor(&self, actor_id: &ActorId) -> Option<&FrameCursor> {
        self.cursors.get(actor_id)
    }

    pub fn clear(&mut self, actor_id: &ActorId) {
        self.cursors.remove(actor_id);
    }

    pub fn clear_all(&mut self) {
        self.cursors.clear();
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}
