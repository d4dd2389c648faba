use serde::{Deserialize, Serialize};

use crate::Position;
use crate::map::MazeGrid;

/// The player's grid state and inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub position: Position,
    pub has_key: bool,
    pub has_shotgun: bool,
    pub ammo: u32,
}

impl Player {
    /// A player at the maze start with an empty inventory.
    pub fn spawn(position: Position) -> Self {
        Player {
            position,
            has_key: false,
            has_shotgun: false,
            ammo: 0,
        }
    }
}

/// A pursuer's grid state. Behavior lives in [`crate::pursuit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enemy {
    pub position: Position,
    /// Ticks until the next move is allowed. Starts at zero so a fresh
    /// enemy may act on its first tick.
    pub cooldown_remaining: u32,
}

impl Enemy {
    pub fn spawn(position: Position) -> Self {
        Enemy {
            position,
            cooldown_remaining: 0,
        }
    }
}

/// Attempts a single-cell displacement.
///
/// Succeeds only if the target cell is in bounds and a passage; otherwise
/// the position is left untouched and `false` is returned. This is the
/// one gate every entity displacement goes through, so no entity can ever
/// occupy a wall or leave the grid. Rejection is normal control flow, not
/// an error.
pub fn try_move(position: &mut Position, dx: isize, dy: isize, grid: &MazeGrid) -> bool {
    let Some(target) = position.offset(dx, dy) else {
        return false;
    };
    if !grid.is_passage_at(target) {
        return false;
    }
    *position = target;
    true
}
