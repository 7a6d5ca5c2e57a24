//! Plain data aggregates describing one snapshot of the game world (spec §3).
//!
//! These types carry no simulation logic beyond constructors and read
//! accessors; the per-tick transform lives in [`crate::simulation`].

use std::collections::HashMap;

pub use crate::geometry::Point;

/// A piece of food lying in the arena. `Copy` and POD by construction: the
/// foods array is allocated from a [`crate::arena::SnapshotArena`] each
/// tick, which reclaims its backing bytes wholesale without running
/// per-element destructors.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Food {
    pub p: Point,
    pub w: f32,
}

/// One living (or just-died) snake within a [`Field`] snapshot.
///
/// `skeleton[0]` is always the head; `skeleton.len()` equals
/// [`crate::config::GameConfig::skeleton_len_for`] for the snake's current
/// mass (spec §3's skeleton-length invariant). A dead snake (`w == 0.0`) is
/// kept in the snapshot for exactly one tick so its player's live-snake
/// counter can be decremented (spec §9 open question).
///
/// The snakes array itself is a plain `Vec` (allocated and shrunk with
/// `Vec::with_capacity`/`truncate`, the idiomatic equivalent of the arena's
/// hint-then-shrink discipline): unlike `Food`, `Snake` owns a variable
/// length skeleton and cannot be `Copy`, so it does not fit the arena's POD
/// typed-array API.
#[derive(Debug, Clone)]
pub struct Snake {
    /// Numeric id of the owning [`Player`] (spec's `player_ref`).
    pub player_ref: u64,
    pub id: u64,
    pub w: f32,
    pub r: f32,
    pub speed: f32,
    pub boost: bool,
    pub skeleton: Vec<Point>,
}

impl Snake {
    pub fn is_alive(&self) -> bool {
        self.w > 0.0
    }

    pub fn head(&self) -> Point {
        self.skeleton[0]
    }

    /// Current heading vector: `skeleton[0] - skeleton[1]` (spec §3).
    pub fn heading(&self) -> Point {
        self.skeleton[0] - self.skeleton[1]
    }
}

/// A per-(player, snake) movement intent. Defaults preserve the snake's
/// current heading rather than pointing anywhere in particular, matching
/// spec §3: "Direction.p defaults such that the heading vector is preserved
/// when the target is within 1e-2 of the head."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Direction {
    pub p: Point,
    pub boost: bool,
    pub split: bool,
}

impl Direction {
    pub fn straight_ahead() -> Self {
        Self {
            p: Point::ZERO,
            boost: false,
            split: false,
        }
    }
}

/// A registered login. Persists across snapshots for the lifetime of the
/// server process (spec §3: "Persisted across snapshots; lives for the
/// server's lifetime keyed by login.").
#[derive(Debug, Clone)]
pub struct Player {
    /// Stable numeric id exposed on the wire (`Welcome.player_id`,
    /// `Snake.player_id`). Assigned once, in join order, distinct from the
    /// login string that keys `Game.players`.
    pub id: u64,
    pub login: String,
    pub level: u32,
    pub connections: u32,
    pub directions: HashMap<u64, Direction>,
    /// Number of currently-live snakes owned by this player.
    pub snakes: u32,
    pub w_sum: f32,
    pub w_max: f32,
    next_snake_id: u64,
}

impl Player {
    pub fn new(id: u64, login: String, level: u32) -> Self {
        Self {
            id,
            login,
            level,
            connections: 0,
            directions: HashMap::new(),
            snakes: 0,
            w_sum: 0.0,
            w_max: 0.0,
            next_snake_id: 0,
        }
    }

    pub fn next_snake_id(&mut self) -> u64 {
        let id = self.next_snake_id;
        self.next_snake_id += 1;
        id
    }

    pub fn direction_for(&self, snake_id: u64) -> Direction {
        self.directions
            .get(&snake_id)
            .copied()
            .unwrap_or_else(Direction::straight_ahead)
    }
}

/// A request to spawn a snake, either a fresh respawn (empty skeleton) or a
/// split-off (skeleton pre-seeded as the reverse of the parent's).
#[derive(Debug, Clone)]
pub struct CreateSnakeRequest {
    pub player_login: String,
    pub w: Option<f32>,
    pub skeleton: Vec<Point>,
}

impl CreateSnakeRequest {
    pub fn respawn(player_login: String) -> Self {
        Self {
            player_login,
            w: None,
            skeleton: Vec::new(),
        }
    }

    pub fn split_off(player_login: String, w: f32, skeleton: Vec<Point>) -> Self {
        Self {
            player_login,
            w: Some(w),
            skeleton,
        }
    }
}

/// The immutable world state for one tick. Never mutated after
/// [`crate::simulation::Game::tick`] publishes it; the previous snapshot is
/// dropped once no connection still holds a clone of its `Arc`.
#[derive(Debug, Clone)]
pub struct Field {
    pub time: f32,
    pub tick: u64,
    pub snakes: std::sync::Arc<[Snake]>,
    pub foods: std::sync::Arc<[Food]>,
}

impl Field {
    pub fn genesis() -> Self {
        Self {
            time: 0.0,
            tick: 0,
            snakes: std::sync::Arc::from(Vec::new()),
            foods: std::sync::Arc::from(Vec::new()),
        }
    }

    pub fn live_snakes(&self) -> impl Iterator<Item = &Snake> {
        self.snakes.iter().filter(|s| s.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_default_is_straight_ahead() {
        let d = Direction::straight_ahead();
        assert_eq!(d.p, Point::ZERO);
        assert!(!d.boost && !d.split);
    }

    #[test]
    fn player_snake_ids_increment() {
        let mut p = Player::new(0, "alice".into(), 1);
        assert_eq!(p.next_snake_id(), 0);
        assert_eq!(p.next_snake_id(), 1);
    }

    #[test]
    fn genesis_field_is_empty() {
        let f = Field::genesis();
        assert_eq!(f.tick, 0);
        assert_eq!(f.live_snakes().count(), 0);
    }
}
