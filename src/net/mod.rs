//! Networking: wire protocol, session gateway, per-room tick loops, and
//! the TCP boundary.

pub mod gateway;
pub mod protocol;
pub mod ticker;
pub mod transport;
