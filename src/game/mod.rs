//! Match simulation: state model, transition rules, and the match engine.

pub mod constants;
pub mod engine;
pub mod state;
