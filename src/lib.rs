//! Snake Arena Server Library
//!
//! A server-authoritative real-time two-player snake game. Clients render
//! and capture input only; all gameplay truth lives here and is streamed
//! to both players each tick.

pub mod config;
pub mod game;
pub mod net;
pub mod room;
