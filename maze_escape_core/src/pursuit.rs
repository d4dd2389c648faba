//! Enemy pursuit and knockback behavior, operating on plain [`Enemy`]
//! records so the logic stays testable on hand-carved grids.

use serde::{Deserialize, Serialize};

use crate::Position;
use crate::entity::{Enemy, try_move};
use crate::map::MazeGrid;

/// Greedy line-of-sight pursuit with a per-move cooldown.
///
/// Deliberately not a pathfinder: the step is the rounded unit vector
/// toward the target, so a pursuer can stall against a wall even when a
/// route around it exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PursuitAi {
    /// Value the cooldown resets to after each successful move.
    pub cooldown_period: u32,
}

impl PursuitAi {
    pub fn new(cooldown_period: u32) -> Self {
        PursuitAi { cooldown_period }
    }

    /// Advances the enemy by one tick.
    ///
    /// While the cooldown is running the enemy only counts it down,
    /// independent of how fast commands arrive. Once expired, the enemy
    /// attempts a single-cell step toward `target`; success rearms the
    /// cooldown, while a blocked step leaves it at zero so the attempt
    /// repeats every tick until the enemy is unblocked or the target
    /// moves.
    pub fn advance(&self, enemy: &mut Enemy, target: Position, grid: &MazeGrid) {
        if enemy.cooldown_remaining > 0 {
            enemy.cooldown_remaining -= 1;
            return;
        }
        let (dx, dy) = unit_step(enemy.position, target);
        if try_move(&mut enemy.position, dx, dy, grid) {
            enemy.cooldown_remaining = self.cooldown_period;
        }
    }
}

/// Pushes the enemy up to `steps` cells directly away from `source`,
/// stopping at the first blocked cell.
///
/// The direction is computed once from the source, not re-derived per
/// step, and a wall truncates the push rather than erroring. An enemy
/// standing on the source gets a zero vector and does not move.
pub fn knockback(enemy: &mut Enemy, source: Position, grid: &MazeGrid, steps: u32) {
    let (dx, dy) = unit_step(source, enemy.position);
    for _ in 0..steps {
        if !try_move(&mut enemy.position, dx, dy, grid) {
            break;
        }
    }
}

/// The single-cell step closest to the straight line from `from` to `to`:
/// the difference vector normalized to unit length, each component
/// rounded to the nearest integer. A zero vector stays zero.
fn unit_step(from: Position, to: Position) -> (isize, isize) {
    let dx = to.x as isize - from.x as isize;
    let dy = to.y as isize - from.y as isize;
    let length = ((dx * dx + dy * dy) as f64).sqrt();
    if length == 0.0 {
        return (0, 0);
    }
    (
        (dx as f64 / length).round() as isize,
        (dy as f64 / length).round() as isize,
    )
}
