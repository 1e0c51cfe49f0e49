use std::collections::BTreeMap;
use std::time::Duration;

use tracing::{debug, warn};

use crate::anim::AnimState;
use crate::grid::{direction_from_delta, tile_center_px, Direction, DirectionModel, TileCoord};
use crate::nav::{find_path_with, PathQuery};
use crate::state::{ActorId, GameState};

/// Slowest speed a move is planned with; slower or invalid speeds are raised to it.
pub const MIN_SPEED_TILES_PER_SEC: f32 = 0.1;
/// A move is abandoned once `STUCK_FACTOR` times its planned duration plus
/// `STUCK_GRACE` has passed since it was issued.
pub const STUCK_FACTOR: u32 = 2;
pub const STUCK_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveCommand {
    pub target: TileCoord,
    pub allow_diagonal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Started { legs: usize },
    AlreadyThere,
    NoPath,
    UnknownActor,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveEvent {
    StepCompleted { actor_id: ActorId, tile: TileCoord },
    Arrived { actor_id: ActorId, tile: TileCoord },
    /// The move overran its deadline and the actor was parked on `tile`.
    Stuck { actor_id: ActorId, tile: TileCoord },
}

/// Transient per-actor movement intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveMove {
    path: Vec<TileCoord>,
    next_index: usize,
    step_started_at: Duration,
    step_duration: Duration,
    last_direction: Direction,
    issued_at: Duration,
    deadline: Duration,
}

impl ActiveMove {
    pub fn path(&self) -> &[TileCoord] {
        &self.path
    }

    /// Index of the tile the actor is walking toward.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn step_duration(&self) -> Duration {
        self.step_duration
    }

    pub fn issued_at(&self) -> Duration {
        self.issued_at
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    fn current_tile(&self) -> TileCoord {
        self.path[self.next_index - 1]
    }

    fn next_tile(&self) -> TileCoord {
        self.path[self.next_index]
    }
}

/// Sole writer of actor `tile`, `pixel`, `direction`, and of the
/// idle/walking transitions caused by movement.
#[derive(Debug, Default)]
pub struct MovementController {
    moves: BTreeMap<ActorId, ActiveMove>,
    direction_model: DirectionModel,
    max_path_expansions: Option<usize>,
}

impl MovementController {
    pub fn new(direction_model: DirectionModel) -> Self {
        Self {
            moves: BTreeMap::new(),
            direction_model,
            max_path_expansions: None,
        }
    }

    /// Bounds the search work of every path planned by [`Self::issue_move`].
    pub fn with_max_path_expansions(mut self, max_expansions: Option<usize>) -> Self {
        self.max_path_expansions = max_expansions;
        self
    }

    /// Plans a path from the actor's tile and replaces any move already in
    /// flight. Unreachable or trivial targets leave the actor and its current
    /// move untouched.
    pub fn issue_move(
        &mut self,
        state: &mut GameState,
        command: MoveCommand,
        actor_id: &ActorId,
        now: Duration,
    ) -> MoveOutcome {
        let Some(actor) = state.actors.get_mut(actor_id) else {
            return MoveOutcome::UnknownActor;
        };
        let path = find_path_with(
            &state.tiles,
            PathQuery {
                max_expansions: self.max_path_expansions,
                ..PathQuery::new(actor.tile, command.target, command.allow_diagonal)
            },
        );
        match path.len() {
            0 => {
                debug!(
                    actor = %actor_id,
                    target_x = command.target.x,
                    target_y = command.target.y,
                    "move_no_path"
                );
                return MoveOutcome::NoPath;
            }
            1 => return MoveOutcome::AlreadyThere,
            _ => {}
        }

        let legs = path.len() - 1;
        let step_duration = step_duration_for_speed(actor.speed_tiles_per_sec);
        let first_direction = direction_from_delta(
            path[1].x - path[0].x,
            path[1].y - path[0].y,
            self.direction_model,
        );
        actor.direction = first_direction;
        actor.state = AnimState::Walking;

        let planned = step_duration.saturating_mul(legs as u32);
        let deadline = now
            .saturating_add(planned.saturating_mul(STUCK_FACTOR))
            .saturating_add(STUCK_GRACE);
        let replaced = self
            .moves
            .insert(
                actor_id.clone(),
                ActiveMove {
                    path,
                    next_index: 1,
                    step_started_at: now,
                    step_duration,
                    last_direction: first_direction,
                    issued_at: now,
                    deadline,
                },
            )
            .is_some();
        debug!(
            actor = %actor_id,
            legs,
            step_ms = step_duration.as_millis() as u64,
            replaced,
            "move_issued"
        );
        MoveOutcome::Started { legs }
    }

    /// Advances every active move to `now`.
    pub fn update(&mut self, state: &mut GameState, now: Duration) -> Vec<MoveEvent> {
        let grid = *state.tiles.config();
        let mut events = Vec::new();
        let mut finished = Vec::new();

        for (actor_id, active) in self.moves.iter_mut() {
            let Some(actor) = state.actors.get_mut(actor_id) else {
                finished.push(actor_id.clone());
                continue;
            };

            if now >= active.deadline {
                let tile = active.current_tile();
                actor.tile = tile;
                actor.pixel = tile_center_px(&grid, tile);
                actor.state = AnimState::Idle;
                warn!(
                    actor = %actor_id,
                    tile_x = tile.x,
                    tile_y = tile.y,
                    remaining_legs = active.path.len() - active.next_index,
                    overrun_ms = now.saturating_sub(active.deadline).as_millis() as u64,
                    "move_stuck"
                );
                events.push(MoveEvent::Stuck {
                    actor_id: actor_id.clone(),
                    tile,
                });
                finished.push(actor_id.clone());
                continue;
            }

            let from = active.current_tile();
            let to = active.next_tile();
            let direction =
                direction_from_delta(to.x - from.x, to.y - from.y, self.direction_model);
            if direction != active.last_direction {
                actor.direction = direction;
                active.last_direction = direction;
            }

            let elapsed = now.saturating_sub(active.step_started_at);
            if elapsed >= active.step_duration {
                actor.tile = to;
                actor.pixel = tile_center_px(&grid, to);
                active.next_index += 1;
                active.step_started_at = now;
                if active.next_index >= active.path.len() {
                    actor.state = AnimState::Idle;
                    events.push(MoveEvent::Arrived {
                        actor_id: actor_id.clone(),
                        tile: to,
                    });
                    finished.push(actor_id.clone());
                } else {
                    events.push(MoveEvent::StepCompleted {
                        actor_id: actor_id.clone(),
                        tile: to,
                    });
                }
                continue;
            }

            let t = elapsed.as_secs_f32() / active.step_duration.as_secs_f32();
            let from_px = tile_center_px(&grid, from);
            let to_px = tile_center_px(&grid, to);
            actor.pixel = from_px.lerp(to_px, smoothstep(t));
        }

        for actor_id in finished {
            self.moves.remove(&actor_id);
        }
        events
    }

    /// Drops the actor's move where it stands. Position and animation state are
    /// left as they are.
    pub fn cancel(&mut self, actor_id: &ActorId) -> bool {
        self.moves.remove(actor_id).is_some()
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }

    pub fn is_moving(&self, actor_id: &ActorId) -> bool {
        self.moves.contains_key(actor_id)
    }

    pub fn path(&self, actor_id: &ActorId) -> Option<&[TileCoord]> {
        self.moves.get(actor_id).map(ActiveMove::path)
    }

    pub fn active_move(&self, actor_id: &ActorId) -> Option<&ActiveMove> {
        self.moves.get(actor_id)
    }

    pub fn active_move_count(&self) -> usize {
        self.moves.len()
    }

    pub fn direction_model(&self) -> DirectionModel {
        self.direction_model
    }
}

/// Duration of one tile-to-tile leg.
pub fn step_duration_for_speed(speed_tiles_per_sec: f32) -> Duration {
    let speed = if speed_tiles_per_sec.is_finite() {
        speed_tiles_per_sec.max(MIN_SPEED_TILES_PER_SEC)
    } else {
        MIN_SPEED_TILES_PER_SEC
    };
    Duration::from_nanos((1_000_000_000.0 / speed as f64).round() as u64)
}

pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::content::parse_room_layout;
    use crate::grid::{TileGrid, Vec2};
    use crate::state::{reduce, Actor, GameAction, InitPayload, ViewportPx};

    const STEP: Duration = Duration::from_millis(250);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    fn state_with(layout: &str, start: TileCoord) -> GameState {
        let tiles: Arc<TileGrid> = Arc::new(parse_room_layout(layout, 24).expect("layout"));
        let actor = Actor::new("p1", "sprite1", start, tiles.config()).with_speed(4.0);
        reduce(
            &GameState::default(),
            GameAction::Init(InitPayload {
                tiles,
                actors: vec![actor],
                viewport: ViewportPx::default(),
                zoom: None,
                local_player_id: Some(ActorId::from("p1")),
            }),
        )
    }

    fn corridor() -> GameState {
        state_with(
            "
            .....
            .....
            ",
            TileCoord::new(0, 0),
        )
    }

    fn p1() -> ActorId {
        ActorId::from("p1")
    }

    fn move_to(x: i32, y: i32) -> MoveCommand {
        MoveCommand {
            target: TileCoord::new(x, y),
            allow_diagonal: false,
        }
    }

    fn actor(state: &GameState) -> &Actor {
        state.actor(&p1()).expect("actor")
    }

    #[test]
    fn smoothstep_eases_in_and_out() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(0.5), 0.5);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.25), 0.15625);
        assert_eq!(smoothstep(-1.0), 0.0);
        assert_eq!(smoothstep(2.0), 1.0);
    }

    #[test]
    fn step_duration_derives_from_speed() {
        assert_eq!(step_duration_for_speed(4.0), STEP);
        assert_eq!(step_duration_for_speed(0.0), Duration::from_secs(10));
        assert_eq!(step_duration_for_speed(f32::NAN), Duration::from_secs(10));
    }

    #[test]
    fn unreachable_or_trivial_target_is_a_no_op() {
        let mut state = state_with(
            "
            ..#.
            ..#.
            ",
            TileCoord::new(0, 0),
        );
        let before = state.clone();
        let mut movement = MovementController::new(DirectionModel::Eight);

        assert_eq!(
            movement.issue_move(&mut state, move_to(3, 0), &p1(), ms(0)),
            MoveOutcome::NoPath
        );
        assert_eq!(
            movement.issue_move(&mut state, move_to(0, 0), &p1(), ms(0)),
            MoveOutcome::AlreadyThere
        );
        assert_eq!(
            movement.issue_move(&mut state, move_to(9, 9), &p1(), ms(0)),
            MoveOutcome::NoPath
        );
        assert_eq!(
            movement.issue_move(&mut state, move_to(1, 0), &ActorId::from("ghost"), ms(0)),
            MoveOutcome::UnknownActor
        );
        assert_eq!(state, before);
        assert!(!movement.is_moving(&p1()));
    }

    #[test]
    fn issuing_a_move_faces_the_first_step_and_starts_walking() {
        let mut state = corridor();
        let mut movement = MovementController::new(DirectionModel::Eight);
        let outcome = movement.issue_move(&mut state, move_to(0, 1), &p1(), ms(0));
        assert_eq!(outcome, MoveOutcome::Started { legs: 1 });
        assert_eq!(actor(&state).state, AnimState::Walking);
        assert_eq!(actor(&state).direction, Direction::South);
        assert_eq!(actor(&state).tile, TileCoord::new(0, 0));
        assert_eq!(
            movement.path(&p1()),
            Some(&[TileCoord::new(0, 0), TileCoord::new(0, 1)][..])
        );
    }

    #[test]
    fn pixel_position_follows_smoothstep_between_centers() {
        let mut state = corridor();
        let mut movement = MovementController::new(DirectionModel::Eight);
        movement.issue_move(&mut state, move_to(1, 0), &p1(), ms(0));

        movement.update(&mut state, Duration::from_micros(62_500));
        assert!((actor(&state).pixel.x - 15.75).abs() < 1e-4);
        assert_eq!(actor(&state).pixel.y, 12.0);
        assert_eq!(actor(&state).tile, TileCoord::new(0, 0));

        movement.update(&mut state, ms(125));
        assert!((actor(&state).pixel.x - 24.0).abs() < 1e-4);
    }

    #[test]
    fn progress_is_monotonic_and_stays_on_the_segment() {
        let mut state = corridor();
        let mut movement = MovementController::new(DirectionModel::Eight);
        movement.issue_move(&mut state, move_to(4, 1), &p1(), ms(0));
        let path = movement.path(&p1()).expect("path").to_vec();

        let mut last_index = 0usize;
        let mut last_x = actor(&state).pixel.x + actor(&state).pixel.y;
        let mut now = ms(0);
        while movement.is_moving(&p1()) {
            now += ms(15);
            movement.update(&mut state, now);
            let current = actor(&state);
            let index = path
                .iter()
                .position(|tile| *tile == current.tile)
                .expect("actor tile lies on the path");
            assert!(index >= last_index);
            last_index = index;

            // Corridor path only moves right or down, so x + y never decreases.
            let progress = current.pixel.x + current.pixel.y;
            assert!(progress + 1e-3 >= last_x);
            last_x = progress;

            if let Some(active) = movement.active_move(&p1()) {
                let from = tile_center_px(state.grid(), path[active.next_index() - 1]);
                let to = tile_center_px(state.grid(), path[active.next_index()]);
                let on_x = current.pixel.x >= from.x.min(to.x) - 1e-3
                    && current.pixel.x <= from.x.max(to.x) + 1e-3;
                let on_y = current.pixel.y >= from.y.min(to.y) - 1e-3
                    && current.pixel.y <= from.y.max(to.y) + 1e-3;
                assert!(on_x && on_y, "pixel {:?} left segment", current.pixel);
            }
        }
        assert_eq!(actor(&state).tile, TileCoord::new(4, 1));
    }

    #[test]
    fn completes_after_total_step_time_and_returns_to_idle() {
        let mut state = corridor();
        let mut movement = MovementController::new(DirectionModel::Eight);
        movement.issue_move(&mut state, move_to(4, 0), &p1(), ms(0));

        let mut events = Vec::new();
        for tick in 1..=100u64 {
            events.extend(movement.update(&mut state, ms(tick * 10)));
        }
        let arrived = actor(&state);
        assert_eq!(arrived.tile, TileCoord::new(4, 0));
        assert_eq!(arrived.pixel, Vec2::new(4.0 * 24.0 + 12.0, 12.0));
        assert_eq!(arrived.state, AnimState::Idle);
        assert!(!movement.is_moving(&p1()));
        assert_eq!(
            events.last(),
            Some(&MoveEvent::Arrived {
                actor_id: p1(),
                tile: TileCoord::new(4, 0)
            })
        );
        assert_eq!(
            events
                .iter()
                .filter(|event| matches!(event, MoveEvent::StepCompleted { .. }))
                .count(),
            3
        );
    }

    #[test]
    fn facing_is_recomputed_when_the_path_turns() {
        let mut state = state_with(
            "
            ..
            #.
            ",
            TileCoord::new(0, 0),
        );
        let mut movement = MovementController::new(DirectionModel::Eight);
        movement.issue_move(&mut state, move_to(1, 1), &p1(), ms(0));
        assert_eq!(actor(&state).direction, Direction::East);

        movement.update(&mut state, ms(250));
        assert_eq!(actor(&state).tile, TileCoord::new(1, 0));
        movement.update(&mut state, ms(260));
        assert_eq!(actor(&state).direction, Direction::South);
    }

    #[test]
    fn new_move_supersedes_the_old_one() {
        let mut state = corridor();
        let mut movement = MovementController::new(DirectionModel::Eight);
        movement.issue_move(&mut state, move_to(4, 0), &p1(), ms(0));
        movement.update(&mut state, ms(250));
        movement.issue_move(&mut state, move_to(1, 1), &p1(), ms(300));
        assert_eq!(movement.active_move_count(), 1);
        assert_eq!(
            movement.path(&p1()),
            Some(&[TileCoord::new(1, 0), TileCoord::new(1, 1)][..])
        );
    }

    #[test]
    fn cancel_stops_mid_tile_without_resetting_position() {
        let mut state = corridor();
        let mut movement = MovementController::new(DirectionModel::Eight);
        movement.issue_move(&mut state, move_to(2, 0), &p1(), ms(0));
        movement.update(&mut state, ms(125));
        let mid = actor(&state).clone();

        assert!(movement.cancel(&p1()));
        assert!(!movement.cancel(&p1()));
        movement.update(&mut state, ms(500));
        assert_eq!(actor(&state), &mid);
        assert_eq!(actor(&state).state, AnimState::Walking);
    }

    #[test]
    fn overrunning_the_deadline_parks_the_actor_idle() {
        let mut state = corridor();
        let mut movement = MovementController::new(DirectionModel::Eight);
        movement.issue_move(&mut state, move_to(4, 0), &p1(), ms(0));
        movement.update(&mut state, ms(100));
        let deadline = movement.active_move(&p1()).expect("move").deadline();
        assert_eq!(deadline, ms(4 * 250 * 2 + 1_000));

        let events = movement.update(&mut state, deadline);
        assert_eq!(
            events,
            vec![MoveEvent::Stuck {
                actor_id: p1(),
                tile: TileCoord::new(0, 0)
            }]
        );
        let parked = actor(&state);
        assert_eq!(parked.state, AnimState::Idle);
        assert_eq!(parked.pixel, tile_center_px(state.grid(), TileCoord::new(0, 0)));
        assert!(!movement.is_moving(&p1()));
    }

    #[test]
    fn moves_of_departed_actors_are_dropped() {
        let mut state = corridor();
        let mut movement = MovementController::new(DirectionModel::Eight);
        movement.issue_move(&mut state, move_to(3, 0), &p1(), ms(0));
        let mut state = reduce(&state, GameAction::ActorLeft(p1()));
        assert!(movement.update(&mut state, ms(10)).is_empty());
        assert_eq!(movement.active_move_count(), 0);
    }

    #[test]
    fn four_way_model_faces_cardinals_only() {
        let mut state = corridor();
        let mut movement = MovementController::new(DirectionModel::Four);
        movement.issue_move(
            &mut state,
            MoveCommand {
                target: TileCoord::new(1, 1),
                allow_diagonal: true,
            },
            &p1(),
            ms(0),
        );
        assert_eq!(movement.path(&p1()).map(<[TileCoord]>::len), Some(2));
        assert_eq!(actor(&state).direction, Direction::South);
    }

    #[test]
    fn capped_search_reports_no_path() {
        let mut state = corridor();
        let mut movement =
            MovementController::new(DirectionModel::Eight).with_max_path_expansions(Some(1));
        assert_eq!(
            movement.issue_move(&mut state, move_to(4, 1), &p1(), ms(0)),
            MoveOutcome::NoPath
        );
        assert!(!movement.is_moving(&p1()));
    }
}
