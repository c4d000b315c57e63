//! Match state definitions and the one-tick transition.
//!
//! Pure simulation for a single two-player match: snakes, food, collisions
//! and scoring. Nothing in here touches the network or the scheduler.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::constants::scoring;

/// A player's fixed identity within a room, 1 or 2, assigned at join time.
pub type Slot = u8;

/// Winner code for a finished match: 0 = draw, 1 or 2 = the winning slot.
pub type Winner = u8;

/// Integer coordinate on the square grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Check the cell lies inside `[0, grid_size)` on both axes
    pub fn in_bounds(&self, grid_size: i32) -> bool {
        self.x >= 0 && self.x < grid_size && self.y >= 0 && self.y < grid_size
    }

    fn offset(&self, (dx, dy): (i32, i32)) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Per-tick movement direction. `None` means the snake holds still, which
/// is only legal before its first move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Velocity {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

impl Velocity {
    /// Unit delta in grid coordinates; y grows downward as on a canvas
    pub fn delta(self) -> (i32, i32) {
        match self {
            Velocity::None => (0, 0),
            Velocity::Up => (0, -1),
            Velocity::Down => (0, 1),
            Velocity::Left => (-1, 0),
            Velocity::Right => (1, 0),
        }
    }

    /// True when `self` is the exact negation of `other` (both moving).
    /// Applying such a change would steer the snake into its own neck.
    pub fn is_reverse_of(self, other: Velocity) -> bool {
        let (dx, dy) = self.delta();
        let (ox, oy) = other.delta();
        (dx, dy) != (0, 0) && (dx, dy) == (-ox, -oy)
    }
}

/// One player's share of the match state.
///
/// Owned exclusively by the room's match engine; mutated only through
/// [`MatchState::set_velocity`] and [`MatchState::advance`].
#[derive(Debug, Clone)]
pub struct PlayerState {
    /// Ordered cells, head first, length >= 1
    pub snake: Vec<Cell>,
    pub velocity: Velocity,
    pub score: u32,
    /// Set once the snake has taken its first step; afterwards a `None`
    /// velocity is rejected
    pub moved: bool,
}

impl PlayerState {
    fn starting(head: Cell, velocity: Velocity) -> Self {
        Self {
            snake: vec![head],
            velocity,
            score: 0,
            moved: false,
        }
    }

    pub fn head(&self) -> Cell {
        self.snake[0]
    }

    pub fn occupies(&self, cell: Cell) -> bool {
        self.snake.contains(&cell)
    }

    pub fn len(&self) -> usize {
        self.snake.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snake.is_empty()
    }
}

/// Match lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    InProgress,
    Over { winner: Winner },
}

/// Authoritative state of one match
#[derive(Debug, Clone)]
pub struct MatchState {
    pub grid_size: i32,
    pub food: Cell,
    pub players: [PlayerState; 2],
    pub phase: Phase,
}

impl MatchState {
    /// Create a fresh match: each snake a single cell on the centre row,
    /// player 1 in the left third heading right, player 2 in the right
    /// third heading left, food on a free cell.
    pub fn new<R: Rng>(grid_size: i32, rng: &mut R) -> Self {
        let row = grid_size / 2;
        let mut state = Self {
            grid_size,
            // placeholder, replaced with a free cell below
            food: Cell::new(0, 0),
            players: [
                PlayerState::starting(Cell::new(grid_size / 3, row), Velocity::Right),
                PlayerState::starting(Cell::new(grid_size * 2 / 3, row), Velocity::Left),
            ],
            phase: Phase::InProgress,
        };
        if let Some(cell) = state.pick_free_cell(rng) {
            state.food = cell;
        }
        state
    }

    pub fn player(&self, slot: Slot) -> &PlayerState {
        &self.players[Self::index(slot)]
    }

    fn player_mut(&mut self, slot: Slot) -> &mut PlayerState {
        &mut self.players[Self::index(slot)]
    }

    fn index(slot: Slot) -> usize {
        debug_assert!(slot == 1 || slot == 2, "slot must be 1 or 2");
        (slot - 1) as usize
    }

    /// Pure validation used both here and by the engine's input buffer:
    /// a velocity change is rejected when it reverses the current heading,
    /// and `None` is rejected once the snake has moved.
    pub fn velocity_allowed(&self, slot: Slot, velocity: Velocity) -> bool {
        let player = self.player(slot);
        if velocity == Velocity::None && player.moved {
            return false;
        }
        !velocity.is_reverse_of(player.velocity)
    }

    /// Store a velocity for use at the next tick. Invalid changes are a
    /// no-op; this never moves anything.
    pub fn set_velocity(&mut self, slot: Slot, velocity: Velocity) {
        if !self.velocity_allowed(slot, velocity) {
            return;
        }
        self.player_mut(slot).velocity = velocity;
    }

    /// Advance the match by one tick.
    ///
    /// Both snakes step first, then collisions are evaluated against the
    /// new head positions, so a head-to-head meeting counts against both
    /// players. Food consumption grows the eater by one and relocates the
    /// food to a uniformly chosen free cell; a board with no free cell
    /// left ends the match as a draw.
    pub fn advance<R: Rng>(&mut self, rng: &mut R) {
        if self.phase != Phase::InProgress {
            return;
        }

        let food = self.food;
        let mut ate = false;
        for player in self.players.iter_mut() {
            let delta = player.velocity.delta();
            if delta == (0, 0) {
                continue;
            }
            let new_head = player.head().offset(delta);
            player.snake.insert(0, new_head);
            if new_head == food {
                ate = true;
                player.score += scoring::FOOD_POINTS;
            } else {
                player.snake.pop();
            }
            player.moved = true;
        }

        if ate {
            match self.pick_free_cell(rng) {
                Some(cell) => self.food = cell,
                None => {
                    // grid fully covered by snake cells: forced draw
                    self.phase = Phase::Over { winner: 0 };
                    return;
                }
            }
        }

        let c1 = self.collided(0);
        let c2 = self.collided(1);
        self.phase = match (c1, c2) {
            (true, true) => Phase::Over { winner: 0 },
            (true, false) => Phase::Over { winner: 2 },
            (false, true) => Phase::Over { winner: 1 },
            (false, false) => Phase::InProgress,
        };
    }

    /// Whether the player at `idx` collided this tick, judged on the new
    /// head: wall, own body, or any cell of the opponent (their new head
    /// included).
    fn collided(&self, idx: usize) -> bool {
        let player = &self.players[idx];
        let head = player.head();
        if !head.in_bounds(self.grid_size) {
            return true;
        }
        if player.snake[1..].contains(&head) {
            return true;
        }
        self.players[1 - idx].occupies(head)
    }

    /// All in-bounds cells not covered by either snake
    fn free_cells(&self) -> Vec<Cell> {
        let mut free = Vec::new();
        for y in 0..self.grid_size {
            for x in 0..self.grid_size {
                let cell = Cell::new(x, y);
                if !self.players.iter().any(|p| p.occupies(cell)) {
                    free.push(cell);
                }
            }
        }
        free
    }

    fn pick_free_cell<R: Rng>(&self, rng: &mut R) -> Option<Cell> {
        let free = self.free_cells();
        if free.is_empty() {
            None
        } else {
            Some(free[rng.gen_range(0..free.len())])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn player(cells: Vec<Cell>, velocity: Velocity) -> PlayerState {
        PlayerState {
            snake: cells,
            velocity,
            score: 0,
            moved: true,
        }
    }

    /// Two single-cell snakes on a size-20 grid, heads at (5,10) heading
    /// right and (15,10) heading left, food out of the way.
    fn mid_match() -> MatchState {
        MatchState {
            grid_size: 20,
            food: Cell::new(0, 0),
            players: [
                player(vec![Cell::new(5, 10)], Velocity::Right),
                player(vec![Cell::new(15, 10)], Velocity::Left),
            ],
            phase: Phase::InProgress,
        }
    }

    #[test]
    fn test_new_match_layout() {
        let state = MatchState::new(20, &mut rng());
        assert_eq!(state.phase, Phase::InProgress);
        assert_eq!(state.player(1).head(), Cell::new(6, 10));
        assert_eq!(state.player(2).head(), Cell::new(13, 10));
        assert_eq!(state.player(1).velocity, Velocity::Right);
        assert_eq!(state.player(2).velocity, Velocity::Left);
        assert_eq!(state.player(1).score, 0);
        assert_eq!(state.player(2).score, 0);
        assert!(state.food.in_bounds(20));
        assert!(!state.players.iter().any(|p| p.occupies(state.food)));
    }

    #[test]
    fn test_both_snakes_advance_toward_center() {
        // Scenario A
        let mut state = mid_match();
        state.advance(&mut rng());

        assert_eq!(state.player(1).head(), Cell::new(6, 10));
        assert_eq!(state.player(2).head(), Cell::new(14, 10));
        assert_eq!(state.phase, Phase::InProgress);
    }

    #[test]
    fn test_velocity_change_moves_head_by_unit_delta() {
        let mut state = mid_match();
        state.set_velocity(1, Velocity::Up);
        state.advance(&mut rng());
        assert_eq!(state.player(1).head(), Cell::new(5, 9));
    }

    #[test]
    fn test_reverse_velocity_rejected() {
        let mut state = mid_match();
        state.set_velocity(1, Velocity::Left);
        assert_eq!(state.player(1).velocity, Velocity::Right);

        state.set_velocity(2, Velocity::Right);
        assert_eq!(state.player(2).velocity, Velocity::Left);
    }

    #[test]
    fn test_none_velocity_rejected_after_first_move() {
        let mut state = mid_match();
        state.players[0].moved = false;
        state.set_velocity(1, Velocity::None);
        assert_eq!(state.player(1).velocity, Velocity::None);

        state.set_velocity(1, Velocity::Right);
        state.advance(&mut rng());
        state.set_velocity(1, Velocity::None);
        assert_eq!(state.player(1).velocity, Velocity::Right);
    }

    #[test]
    fn test_none_velocity_holds_snake_still() {
        let mut state = mid_match();
        state.players[0].velocity = Velocity::None;
        state.players[0].moved = false;
        state.advance(&mut rng());
        assert_eq!(state.player(1).head(), Cell::new(5, 10));
        assert_eq!(state.player(2).head(), Cell::new(14, 10));
    }

    #[test]
    fn test_wall_collision_other_player_wins() {
        // Scenario B: player 1 at (0,10) heading left steps out of bounds
        let mut state = mid_match();
        state.players[0].snake = vec![Cell::new(0, 10)];
        state.players[0].velocity = Velocity::Left;
        state.advance(&mut rng());
        assert_eq!(state.phase, Phase::Over { winner: 2 });
    }

    #[test]
    fn test_simultaneous_wall_collision_is_draw() {
        let mut state = mid_match();
        state.players[0].snake = vec![Cell::new(0, 10)];
        state.players[0].velocity = Velocity::Left;
        state.players[1].snake = vec![Cell::new(19, 10)];
        state.players[1].velocity = Velocity::Right;
        state.advance(&mut rng());
        assert_eq!(state.phase, Phase::Over { winner: 0 });
    }

    #[test]
    fn test_food_consumption_grows_and_scores() {
        // Scenario C: player 1 steps onto the food at (5,5)
        let mut state = mid_match();
        state.food = Cell::new(5, 5);
        state.players[0].snake = vec![Cell::new(4, 5), Cell::new(3, 5)];
        let before = state.player(1).len();

        state.advance(&mut rng());

        assert_eq!(state.player(1).len(), before + 1);
        assert_eq!(state.player(1).score, 1);
        assert_eq!(state.player(2).score, 0);
        assert_ne!(state.food, Cell::new(5, 5));
        assert!(!state.players.iter().any(|p| p.occupies(state.food)));
        assert!(state.food.in_bounds(20));
    }

    #[test]
    fn test_miss_keeps_length() {
        let mut state = mid_match();
        state.players[0].snake = vec![Cell::new(4, 5), Cell::new(3, 5)];
        state.advance(&mut rng());
        assert_eq!(state.player(1).len(), 2);
        assert_eq!(state.player(1).score, 0);
    }

    #[test]
    fn test_self_collision() {
        // Head at (5,5) turning down into its own body below
        let mut state = mid_match();
        state.players[0].snake = vec![
            Cell::new(5, 5),
            Cell::new(4, 5),
            Cell::new(4, 6),
            Cell::new(5, 6),
            Cell::new(6, 6),
        ];
        state.players[0].velocity = Velocity::Down;
        state.advance(&mut rng());
        assert_eq!(state.phase, Phase::Over { winner: 2 });
    }

    #[test]
    fn test_stepping_into_vacated_tail_is_safe() {
        // A 4-cell loop: the head moves onto the cell the tail vacates
        // this same tick, which must not count as self-collision.
        let mut state = mid_match();
        state.players[0].snake = vec![
            Cell::new(5, 5),
            Cell::new(4, 5),
            Cell::new(4, 6),
            Cell::new(5, 6),
        ];
        state.players[0].velocity = Velocity::Down;
        state.advance(&mut rng());
        assert_eq!(state.phase, Phase::InProgress);
        assert_eq!(state.player(1).head(), Cell::new(5, 6));
    }

    #[test]
    fn test_head_to_head_is_draw() {
        let mut state = mid_match();
        state.players[0].snake = vec![Cell::new(9, 10)];
        state.players[1].snake = vec![Cell::new(11, 10)];
        state.advance(&mut rng());
        // both new heads land on (10,10)
        assert_eq!(state.phase, Phase::Over { winner: 0 });
    }

    #[test]
    fn test_running_into_opponent_body() {
        let mut state = mid_match();
        state.players[1].snake = vec![
            Cell::new(6, 9),
            Cell::new(6, 10),
            Cell::new(6, 11),
        ];
        state.players[1].velocity = Velocity::Up;
        // player 1 head (5,10) moving right lands on (6,10), still part of
        // the opponent's body after its own move
        state.advance(&mut rng());
        assert_eq!(state.phase, Phase::Over { winner: 2 });
    }

    #[test]
    fn test_advance_after_over_is_noop() {
        let mut state = mid_match();
        state.phase = Phase::Over { winner: 1 };
        let snapshot = state.player(1).head();
        state.advance(&mut rng());
        assert_eq!(state.player(1).head(), snapshot);
        assert_eq!(state.phase, Phase::Over { winner: 1 });
    }

    #[test]
    fn test_full_grid_food_relocation_is_forced_draw() {
        // 2x2 grid, one snake covering three cells, food on the last free
        // cell. Eating it leaves nowhere to put food.
        let mut state = MatchState {
            grid_size: 2,
            food: Cell::new(1, 1),
            players: [
                player(
                    vec![Cell::new(0, 1), Cell::new(0, 0), Cell::new(1, 0)],
                    Velocity::Right,
                ),
                player(vec![Cell::new(1, 0)], Velocity::None),
            ],
            phase: Phase::InProgress,
        };
        state.players[1].moved = false;
        state.advance(&mut rng());
        assert_eq!(state.phase, Phase::Over { winner: 0 });
    }

    #[test]
    fn test_food_never_lands_on_snakes_over_many_rolls() {
        let mut r = rng();
        for seed in 0..50 {
            let mut state = MatchState::new(20, &mut StdRng::seed_from_u64(seed));
            state.food = Cell::new(7, 10);
            state.players[0].snake = vec![Cell::new(6, 10), Cell::new(5, 10)];
            state.advance(&mut r);
            assert!(!state.players.iter().any(|p| p.occupies(state.food)));
        }
    }
}
