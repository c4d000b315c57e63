//! Room and session management: identity, capacity, lifecycle.

pub mod registry;
pub mod room;
