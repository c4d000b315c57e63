//! A room holds exactly one match and up to two client slots.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::game::engine::MatchEngine;
use crate::game::state::Slot;

/// Opaque unique room identifier; never reused once torn down
pub type RoomId = Uuid;

/// Identity of a connected client, assigned by the transport boundary
pub type ClientId = Uuid;

/// Isolated context for one match.
///
/// The engine is shared between the room's ticker task and the input path;
/// the mutex serializes all mutation per room. The ticker handle is the
/// sole cancellation primitive.
pub struct Room {
    pub id: RoomId,
    slots: [Option<ClientId>; 2],
    pub engine: Arc<Mutex<MatchEngine>>,
    ticker: Option<JoinHandle<()>>,
    pub created_at: Instant,
}

impl Room {
    /// Create a room with slot 1 reserved for the creator
    pub fn new(creator: ClientId, grid_size: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            slots: [Some(creator), None],
            engine: Arc::new(Mutex::new(MatchEngine::new(grid_size))),
            ticker: None,
            created_at: Instant::now(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    /// Claim the first free slot for `client`, or `None` when full.
    /// Check and assignment are a single step; the registry calls this
    /// under its write lock so two joiners can never both succeed.
    pub fn reserve_slot(&mut self, client: ClientId) -> Option<Slot> {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(client);
                return Some((i + 1) as Slot);
            }
        }
        None
    }

    pub fn slot_of(&self, client: ClientId) -> Option<Slot> {
        self.slots
            .iter()
            .position(|s| *s == Some(client))
            .map(|i| (i + 1) as Slot)
    }

    /// Vacate whichever slot `client` holds. Slots are never reassigned
    /// mid-match; this only matters for teardown bookkeeping.
    pub fn remove_client(&mut self, client: ClientId) -> Option<Slot> {
        let slot = self.slot_of(client)?;
        self.slots[(slot - 1) as usize] = None;
        Some(slot)
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.slots.iter().flatten().copied().collect()
    }

    pub fn attach_ticker(&mut self, handle: JoinHandle<()>) {
        self.ticker = Some(handle);
    }

    pub fn has_ticker(&self) -> bool {
        self.ticker.is_some()
    }

    /// Stop the room's scheduled loop. Idempotent; aborting an already
    /// finished task is a no-op.
    pub fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for Room {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}
