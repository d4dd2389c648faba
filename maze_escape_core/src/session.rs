//! Turn sequencing for a single run: player commands, enemy ticks, and
//! the win/loss/pickup predicates.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::entity::{Enemy, Player, try_move};
use crate::generator::{self, GeneratedMaze, GenerationError};
use crate::map::MazeGrid;
use crate::pursuit::{PursuitAi, knockback};
use crate::{Direction, Position};

/// One discrete input from the external command stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Fire,
    Quit,
}

/// The session lifecycle. Every state except `Active` is terminal: the
/// session freezes but stays observable so the final frame can still be
/// drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Active,
    Escaped,
    Caught,
    Quit,
}

/// Which of the two game variants the session runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Collect the key, then reach the exit. No enemy.
    KeyHunt,
    /// Reach the exit while an enemy gives chase; a shotgun pickup can
    /// knock it back.
    Pursuit,
}

/// Tunables for a single run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub width: usize,
    pub height: usize,
    pub mode: Mode,
    /// Fixed seed for reproducible runs; `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Ticks between enemy moves.
    pub cooldown_period: u32,
    /// Cells a shotgun blast pushes the enemy.
    pub knockback_steps: u32,
    /// Per-tick chance of the shotgun pickup appearing.
    pub shotgun_spawn_chance: f64,
    /// Shells granted when the shotgun is picked up.
    pub ammo_bonus: u32,
    /// Chebyshev radius the renderer may clip the view to; `None` shows
    /// the whole grid, which is the observed behavior.
    pub visibility_radius: Option<usize>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            width: 39,
            height: 29,
            mode: Mode::KeyHunt,
            seed: None,
            cooldown_period: 15,
            knockback_steps: 2,
            shotgun_spawn_chance: 0.02,
            ammo_bonus: 3,
            visibility_radius: None,
        }
    }
}

/// Read-only snapshot handed to the renderer each frame. Collectible
/// markers are `Option<Position>`: `None` means collected or not yet
/// spawned, never a sentinel coordinate.
#[derive(Debug)]
pub struct SessionView<'a> {
    pub grid: &'a MazeGrid,
    pub player: &'a Player,
    pub enemy: Option<&'a Enemy>,
    pub key: Option<Position>,
    pub shotgun: Option<Position>,
    pub exit: Position,
    pub mode: Mode,
    pub state: SessionState,
    pub visibility_radius: Option<usize>,
}

/// A single in-memory game: the maze (immutable after generation) plus
/// all mutable entity and collectible state.
///
/// The session is driven by a serialized stream of commands and ticks;
/// [`Session::handle_command`] and [`Session::tick`] are the only
/// mutation entry points after construction.
pub struct Session {
    config: SessionConfig,
    grid: MazeGrid,
    player: Player,
    enemy: Option<Enemy>,
    ai: PursuitAi,
    key: Option<Position>,
    shotgun: Option<Position>,
    exit: Position,
    state: SessionState,
    rng: StdRng,
}

impl Session {
    /// Generates a maze and places the entities for the configured mode.
    ///
    /// Generation failures abort session creation and propagate to the
    /// caller.
    pub fn new(config: SessionConfig) -> Result<Self, GenerationError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let maze = generator::generate(config.width, config.height, &mut rng)?;
        Ok(Self::from_maze(maze, config, rng))
    }

    /// Builds a session around an already-generated maze.
    fn from_maze(maze: GeneratedMaze, config: SessionConfig, mut rng: StdRng) -> Self {
        let GeneratedMaze { grid, start, exit } = maze;
        let player = Player::spawn(start);
        let key = match config.mode {
            Mode::KeyHunt => random_passage(&grid, &mut rng, &[start, exit]),
            Mode::Pursuit => None,
        };
        let enemy = match config.mode {
            Mode::KeyHunt => None,
            Mode::Pursuit => random_passage(&grid, &mut rng, &[start, exit]).map(Enemy::spawn),
        };
        let ai = PursuitAi::new(config.cooldown_period);

        Session {
            config,
            grid,
            player,
            enemy,
            ai,
            key,
            shotgun: None,
            exit,
            state: SessionState::Active,
            rng,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The snapshot the renderer reads each frame.
    pub fn view(&self) -> SessionView<'_> {
        SessionView {
            grid: &self.grid,
            player: &self.player,
            enemy: self.enemy.as_ref(),
            key: self.key,
            shotgun: self.shotgun,
            exit: self.exit,
            mode: self.config.mode,
            state: self.state,
            visibility_radius: self.config.visibility_radius,
        }
    }

    /// Applies one external command.
    ///
    /// `Quit` is honored from any state; everything else is ignored once
    /// the session is terminal. Rejected moves (wall or boundary) are a
    /// silent no-op.
    pub fn handle_command(&mut self, command: Command) {
        match command {
            Command::Quit => self.state = SessionState::Quit,
            _ if self.state != SessionState::Active => {}
            Command::Move(direction) => {
                let (dx, dy) = direction.delta();
                if try_move(&mut self.player.position, dx, dy, &self.grid) {
                    self.after_player_move();
                }
            }
            Command::Fire => self.fire(),
        }
    }

    /// Advances time by one tick: enemy pursuit, the catch check, and the
    /// shotgun spawn roll. A no-op once the session is terminal.
    pub fn tick(&mut self) {
        if self.state != SessionState::Active {
            return;
        }
        if let Some(enemy) = self.enemy.as_mut() {
            self.ai.advance(enemy, self.player.position, &self.grid);
        }
        self.check_caught();
        self.maybe_spawn_shotgun();
    }

    /// Pickup and win/loss predicates evaluated after a successful player
    /// step.
    fn after_player_move(&mut self) {
        match self.config.mode {
            Mode::KeyHunt => {
                if self.key == Some(self.player.position) {
                    self.player.has_key = true;
                    self.key = None;
                }
                if self.player.position == self.exit && self.player.has_key {
                    self.state = SessionState::Escaped;
                }
            }
            Mode::Pursuit => {
                if self.shotgun == Some(self.player.position) {
                    self.player.has_shotgun = true;
                    self.player.ammo += self.config.ammo_bonus;
                    self.shotgun = None;
                }
                if self.player.position == self.exit {
                    self.state = SessionState::Escaped;
                } else {
                    self.check_caught();
                }
            }
        }
    }

    /// Co-location with the enemy ends the run, whichever side moved
    /// last.
    fn check_caught(&mut self) {
        if let Some(enemy) = &self.enemy {
            if enemy.position == self.player.position {
                self.state = SessionState::Caught;
            }
        }
    }

    fn fire(&mut self) {
        if !self.player.has_shotgun || self.player.ammo == 0 {
            return;
        }
        let Some(enemy) = self.enemy.as_mut() else {
            return;
        };
        self.player.ammo -= 1;
        knockback(
            enemy,
            self.player.position,
            &self.grid,
            self.config.knockback_steps,
        );
    }

    /// While no shotgun is held or placed, each tick rolls a small fixed
    /// chance to drop one on a random passage cell away from the player.
    fn maybe_spawn_shotgun(&mut self) {
        if self.config.mode != Mode::Pursuit
            || self.state != SessionState::Active
            || self.player.has_shotgun
            || self.shotgun.is_some()
        {
            return;
        }
        if self.rng.random_bool(self.config.shotgun_spawn_chance) {
            self.shotgun = random_passage(&self.grid, &mut self.rng, &[self.player.position]);
        }
    }
}

/// A uniformly random passage cell outside the excluded set.
fn random_passage(grid: &MazeGrid, rng: &mut StdRng, excluded: &[Position]) -> Option<Position> {
    let candidates: Vec<Position> = grid
        .passages()
        .filter(|cell| !excluded.contains(cell))
        .collect();
    candidates.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 7x3 grid whose only passages are row y = 1 plus a boundary exit
    /// at (0, 1). The unique carved path is the corridor itself.
    fn corridor_session(mode: Mode) -> Session {
        let mut grid = MazeGrid::new(7, 3);
        for x in 0..6 {
            grid.carve(Position::new(x, 1));
        }
        let maze = GeneratedMaze {
            grid,
            start: Position::new(1, 1),
            exit: Position::new(0, 1),
        };
        let config = SessionConfig {
            width: 7,
            height: 3,
            mode,
            seed: Some(1),
            ..SessionConfig::default()
        };
        let rng = StdRng::seed_from_u64(1);
        let mut session = Session::from_maze(maze, config, rng);
        // Pin the randomized placements so the scenarios are exact.
        session.key = None;
        session.enemy = None;
        session
    }

    fn moves(session: &mut Session, steps: &[Direction]) {
        for &step in steps {
            session.handle_command(Command::Move(step));
        }
    }

    #[test]
    fn key_then_exit_escapes() {
        let mut session = corridor_session(Mode::KeyHunt);
        session.key = Some(Position::new(3, 1));

        moves(&mut session, &[Direction::Right, Direction::Right]);
        assert!(session.player.has_key);
        assert_eq!(session.key, None);
        assert_eq!(session.state(), SessionState::Active);

        moves(
            &mut session,
            &[Direction::Left, Direction::Left, Direction::Left],
        );
        assert_eq!(session.state(), SessionState::Escaped);
    }

    #[test]
    fn exit_without_the_key_does_not_escape() {
        let mut session = corridor_session(Mode::KeyHunt);
        session.key = Some(Position::new(3, 1));

        moves(&mut session, &[Direction::Left]);
        assert_eq!(session.player.position, Position::new(0, 1));
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn blocked_moves_are_silently_ignored() {
        let mut session = corridor_session(Mode::KeyHunt);
        moves(&mut session, &[Direction::Up, Direction::Down]);
        assert_eq!(session.player.position, Position::new(1, 1));
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn pursuit_mode_needs_no_key_to_escape() {
        let mut session = corridor_session(Mode::Pursuit);
        moves(&mut session, &[Direction::Left]);
        assert_eq!(session.state(), SessionState::Escaped);
    }

    #[test]
    fn enemy_advances_once_per_cooldown_period() {
        let mut session = corridor_session(Mode::Pursuit);
        session.enemy = Some(Enemy::spawn(Position::new(5, 1)));

        // First tick moves (fresh cooldown is zero), then the cooldown
        // gates the rest of the window: exactly one cell in 15 ticks.
        for _ in 0..15 {
            session.tick();
        }
        assert_eq!(
            session.enemy.as_ref().unwrap().position,
            Position::new(4, 1)
        );
        assert_eq!(session.state(), SessionState::Active);
    }

    #[test]
    fn walking_into_the_enemy_is_caught() {
        let mut session = corridor_session(Mode::Pursuit);
        session.enemy = Some(Enemy::spawn(Position::new(2, 1)));
        moves(&mut session, &[Direction::Right]);
        assert_eq!(session.state(), SessionState::Caught);
    }

    #[test]
    fn enemy_reaching_the_player_is_caught() {
        let mut session = corridor_session(Mode::Pursuit);
        session.enemy = Some(Enemy::spawn(Position::new(2, 1)));
        session.tick();
        assert_eq!(
            session.enemy.as_ref().unwrap().position,
            session.player.position
        );
        assert_eq!(session.state(), SessionState::Caught);
    }

    #[test]
    fn fire_spends_ammo_and_knocks_the_enemy_back() {
        let mut session = corridor_session(Mode::Pursuit);
        session.enemy = Some(Enemy::spawn(Position::new(2, 1)));
        session.player.has_shotgun = true;
        session.player.ammo = 2;

        session.handle_command(Command::Fire);
        assert_eq!(session.player.ammo, 1);
        assert_eq!(
            session.enemy.as_ref().unwrap().position,
            Position::new(4, 1)
        );
    }

    #[test]
    fn fire_without_ammo_is_a_no_op() {
        let mut session = corridor_session(Mode::Pursuit);
        session.enemy = Some(Enemy::spawn(Position::new(2, 1)));
        session.player.has_shotgun = true;
        session.player.ammo = 0;

        session.handle_command(Command::Fire);
        assert_eq!(
            session.enemy.as_ref().unwrap().position,
            Position::new(2, 1)
        );
    }

    #[test]
    fn shotgun_spawns_and_is_picked_up() {
        let mut session = corridor_session(Mode::Pursuit);
        session.config.shotgun_spawn_chance = 1.0;

        session.tick();
        let placed = session.shotgun.expect("shotgun placed");
        assert_ne!(placed, session.player.position);
        assert!(session.grid.is_passage_at(placed));
        assert!(!session.player.has_shotgun);

        // Walking onto the pickup grants the shotgun and the ammo bonus.
        session.shotgun = Some(Position::new(2, 1));
        moves(&mut session, &[Direction::Right]);
        assert!(session.player.has_shotgun);
        assert_eq!(session.player.ammo, session.config.ammo_bonus);
        assert_eq!(session.shotgun, None);

        // Held shotgun suppresses further spawns.
        session.tick();
        assert_eq!(session.shotgun, None);
    }

    #[test]
    fn terminal_session_is_frozen_except_for_quit() {
        let mut session = corridor_session(Mode::Pursuit);
        moves(&mut session, &[Direction::Left]);
        assert_eq!(session.state(), SessionState::Escaped);

        moves(&mut session, &[Direction::Right]);
        assert_eq!(session.player.position, Position::new(0, 1));
        session.tick();
        assert_eq!(session.state(), SessionState::Escaped);

        session.handle_command(Command::Quit);
        assert_eq!(session.state(), SessionState::Quit);
    }

    #[test]
    fn quit_works_from_an_active_session() {
        let mut session = corridor_session(Mode::KeyHunt);
        session.handle_command(Command::Quit);
        assert_eq!(session.state(), SessionState::Quit);
        moves(&mut session, &[Direction::Right]);
        assert_eq!(session.player.position, Position::new(1, 1));
    }

    #[test]
    fn generated_session_places_markers_on_passages() {
        let config = SessionConfig {
            width: 15,
            height: 11,
            mode: Mode::KeyHunt,
            seed: Some(42),
            ..SessionConfig::default()
        };
        let session = Session::new(config).unwrap();
        let view = session.view();
        assert!(view.grid.is_passage_at(view.player.position));
        assert!(view.grid.is_passage_at(view.exit));
        let key = view.key.expect("key hunt places a key");
        assert!(view.grid.is_passage_at(key));
        assert_ne!(key, view.player.position);
    }

    #[test]
    fn generation_errors_propagate_from_session_new() {
        let config = SessionConfig {
            width: 3,
            height: 3,
            seed: Some(0),
            ..SessionConfig::default()
        };
        assert!(matches!(
            Session::new(config),
            Err(GenerationError::InvalidDimensions { .. })
        ));
    }
}
