/// Tick timing constants
pub mod tick {
    /// Simulation and broadcast rate in Hz (they are the same tick)
    pub const FRAME_RATE: u32 = 10;
    /// Tick duration in milliseconds
    pub const TICK_DURATION_MS: u64 = 1000 / FRAME_RATE as u64;
}

/// Grid constants
pub mod grid {
    /// Side length of the square play field, in cells
    pub const SIZE: i32 = 20;
}

/// Scoring constants
pub mod scoring {
    /// Points awarded per food consumed
    pub const FOOD_POINTS: u32 = 1;
}

/// Browser `e.keyCode` values for the arrow keys.
///
/// Clients forward raw keydown codes untouched, so this mapping must stay
/// in sync with the arrow-key capture convention.
pub mod keys {
    pub const LEFT: i32 = 37;
    pub const UP: i32 = 38;
    pub const RIGHT: i32 = 39;
    pub const DOWN: i32 = 40;
}
