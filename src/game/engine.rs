//! Match engine: one match state plus the pending-velocity buffer.
//!
//! Input handlers run on connection tasks and may fire any number of times
//! between ticks; they only ever touch the single-slot pending cell for
//! their player. The tick drains both cells, applies them, and advances.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

use crate::game::constants::keys;
use crate::game::state::{MatchState, Phase, Slot, Velocity, Winner};

/// Outcome of one engine tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickResult {
    /// Match continues; `scores_changed` is set when food was consumed
    Continuing { scores_changed: bool },
    /// Terminal tick. The scheduler must stop after seeing this.
    Finished { winner: Winner },
}

/// Map a browser key code to a velocity. Anything but the arrow keys is
/// client noise and maps to nothing.
pub fn velocity_for_key(key_code: i32) -> Option<Velocity> {
    match key_code {
        keys::LEFT => Some(Velocity::Left),
        keys::UP => Some(Velocity::Up),
        keys::RIGHT => Some(Velocity::Right),
        keys::DOWN => Some(Velocity::Down),
        _ => None,
    }
}

/// Wraps one [`MatchState`] with last-value-wins input buffering.
pub struct MatchEngine {
    state: MatchState,
    /// One pending velocity per slot, overwritten by newer valid input
    pending: [Option<Velocity>; 2],
    rng: StdRng,
}

impl MatchEngine {
    pub fn new(grid_size: i32) -> Self {
        Self::with_rng(grid_size, StdRng::from_entropy())
    }

    /// Deterministic construction for tests
    pub fn with_rng(grid_size: i32, mut rng: StdRng) -> Self {
        let state = MatchState::new(grid_size, &mut rng);
        Self {
            state,
            pending: [None, None],
            rng,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Buffer a directional key press for `slot`.
    ///
    /// Unrecognized codes are ignored without error. Validation happens
    /// here, against the snake's current velocity, so that only the most
    /// recent *valid* value survives until the next tick.
    pub fn apply_input(&mut self, slot: Slot, key_code: i32) {
        let Some(velocity) = velocity_for_key(key_code) else {
            debug!(key_code, "ignoring unmapped key code");
            return;
        };
        if !self.state.velocity_allowed(slot, velocity) {
            return;
        }
        self.pending[(slot - 1) as usize] = Some(velocity);
    }

    /// Apply buffered inputs and advance the match one tick.
    ///
    /// A finished engine stays finished; ticking it again returns the same
    /// outcome without touching the state (the scheduler stops on the
    /// first `Finished`, this is only a backstop).
    pub fn tick(&mut self) -> TickResult {
        if let Phase::Over { winner } = self.state.phase {
            return TickResult::Finished { winner };
        }

        for slot in [1u8, 2u8] {
            if let Some(velocity) = self.pending[(slot - 1) as usize].take() {
                self.state.set_velocity(slot, velocity);
            }
        }

        let scores_before = self.scores();
        self.state.advance(&mut self.rng);

        match self.state.phase {
            Phase::Over { winner } => TickResult::Finished { winner },
            Phase::InProgress => TickResult::Continuing {
                scores_changed: self.scores() != scores_before,
            },
        }
    }

    /// Current scores as `(player one, player two)`
    pub fn scores(&self) -> (u32, u32) {
        (self.state.players[0].score, self.state.players[1].score)
    }
}
