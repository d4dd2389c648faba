//! Maze generation using Wilson's algorithm.
//!
//! Rooms live at odd coordinates; even coordinates are the walls between
//! them. Loop-erased random walks are committed to the grid one at a time
//! until every room belongs to the tree, which guarantees a fully
//! connected, cycle-free passage network.

use std::collections::HashMap;

use rand::{Rng, rngs::StdRng, seq::IndexedRandom};

use crate::Position;
use crate::map::MazeGrid;

/// Smallest edge length that still leaves interior rooms and a boundary
/// ring to host an exit.
pub const MIN_DIMENSION: usize = 5;

/// Represents errors that can occur while generating a maze.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error(
        "grid dimensions ({width}, {height}) are too small to carve a maze with a boundary exit"
    )]
    InvalidDimensions { width: usize, height: usize },
    #[error("no boundary cell is adjacent to a passage; cannot place an exit")]
    NoExitCandidate,
}

/// A finished maze plus the two cells a session is anchored on.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GeneratedMaze {
    pub grid: MazeGrid,
    pub start: Position,
    pub exit: Position,
}

/// Generates a maze of the given dimensions.
///
/// Dimensions are validated eagerly; a malformed grid is never produced.
/// All randomness is drawn from `rng`, so a seeded source reproduces the
/// maze exactly.
pub fn generate(
    width: usize,
    height: usize,
    rng: &mut StdRng,
) -> Result<GeneratedMaze, GenerationError> {
    if width < MIN_DIMENSION || height < MIN_DIMENSION {
        return Err(GenerationError::InvalidDimensions { width, height });
    }

    let mut grid = MazeGrid::new(width, height);
    let start = random_room(width, height, rng);
    carve_tree(&mut grid, start, rng);
    open_around_start(&mut grid, start);
    let exit = choose_exit(&mut grid, rng)?;

    Ok(GeneratedMaze { grid, start, exit })
}

/// Picks a uniformly random room cell.
fn random_room(width: usize, height: usize, rng: &mut StdRng) -> Position {
    let x = rng.random_range(0..width / 2) * 2 + 1;
    let y = rng.random_range(0..height / 2) * 2 + 1;
    Position::new(x, y)
}

/// All room cells of a grid in row-major order.
fn rooms(width: usize, height: usize) -> impl Iterator<Item = Position> {
    (1..height)
        .step_by(2)
        .flat_map(move |y| (1..width).step_by(2).map(move |x| Position::new(x, y)))
}

/// The up-to-four rooms two cells away along each axis.
fn room_neighbors(grid: &MazeGrid, cell: Position) -> Vec<Position> {
    const OFFSETS: [(isize, isize); 4] = [(0, 2), (2, 0), (0, -2), (-2, 0)];
    OFFSETS
        .iter()
        .filter_map(|&(dx, dy)| cell.offset(dx, dy))
        .filter(|neighbor| grid.in_bounds(neighbor.x, neighbor.y))
        .collect()
}

/// The wall cell between two rooms that are two cells apart.
fn midpoint(a: Position, b: Position) -> Position {
    Position::new((a.x + b.x) / 2, (a.y + b.y) / 2)
}

/// Carves a uniform spanning tree over the rooms.
///
/// Each iteration performs a loop-erased random walk from an unvisited
/// room until it reaches a cell already in the tree, then commits the
/// walk. The loop erasure is what makes the result a tree: a walk that
/// revisits one of its own cells is truncated back to the first visit, so
/// committed paths are always simple.
fn carve_tree(grid: &mut MazeGrid, start: Position, rng: &mut StdRng) {
    grid.carve(start);

    let mut unvisited: Vec<Position> = rooms(grid.width(), grid.height())
        .filter(|&room| room != start)
        .collect();

    while !unvisited.is_empty() {
        let mut current = *unvisited.choose(rng).expect("unvisited is non-empty");
        let mut path = vec![current];
        // Position-to-index lookup for O(1) loop detection during the walk.
        let mut visited_at: HashMap<Position, usize> = HashMap::from([(current, 0)]);

        while !grid.is_passage_at(current) {
            let next = *room_neighbors(grid, current)
                .choose(rng)
                .expect("every room has an in-bounds neighbor");
            if let Some(&index) = visited_at.get(&next) {
                for erased in path.drain(index + 1..) {
                    visited_at.remove(&erased);
                }
            } else {
                visited_at.insert(next, path.len());
                path.push(next);
            }
            current = next;
        }

        // Commit the walk: carve each room and the wall between
        // consecutive rooms.
        for pair in path.windows(2) {
            grid.carve(pair[0]);
            grid.carve(midpoint(pair[0], pair[1]));
            grid.carve(pair[1]);
        }
        unvisited.retain(|&room| !grid.is_passage_at(room));
    }
}

/// Opens the four orthogonal neighbors of the start so an odd/even parity
/// edge case can never seal it off.
fn open_around_start(grid: &mut MazeGrid, start: Position) {
    for (dx, dy) in [(0, 1), (1, 0), (0, -1), (-1, 0)] {
        if let Some(neighbor) = start.offset(dx, dy) {
            grid.carve(neighbor);
        }
    }
}

/// Scans the ring one cell inside each edge; every passage found there
/// nominates the adjacent boundary cell as an exit candidate. One
/// candidate is chosen uniformly and carved open.
fn choose_exit(grid: &mut MazeGrid, rng: &mut StdRng) -> Result<Position, GenerationError> {
    let (width, height) = (grid.width(), grid.height());
    let mut candidates = Vec::new();
    for x in 0..width {
        if grid.is_passage(x, 1) {
            candidates.push(Position::new(x, 0));
        }
        if grid.is_passage(x, height - 2) {
            candidates.push(Position::new(x, height - 1));
        }
    }
    for y in 0..height {
        if grid.is_passage(1, y) {
            candidates.push(Position::new(0, y));
        }
        if grid.is_passage(width - 2, y) {
            candidates.push(Position::new(width - 1, y));
        }
    }

    let exit = *candidates
        .choose(rng)
        .ok_or(GenerationError::NoExitCandidate)?;
    grid.carve(exit);
    Ok(exit)
}
