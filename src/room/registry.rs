//! Room registry: maps room ids to rooms and clients to their room/slot.
//!
//! All room and membership state lives here behind explicit operations;
//! there is no ambient global table. The gateway holds the registry in an
//! `Arc<tokio::sync::RwLock<_>>`, so every operation below runs atomically
//! under that lock.

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::game::state::Slot;
use crate::room::room::{ClientId, Room, RoomId};

/// Registry errors. `UnknownRoom` and `RoomFull` are reported to the
/// joining client only; `NotInAnyRoom` input is dropped silently upstream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("unknown room code")]
    UnknownRoom,
    #[error("room already has two players")]
    RoomFull,
    #[error("client is not in any room")]
    NotInAnyRoom,
    #[error("client is already in a room")]
    AlreadyInRoom,
    #[error("too many rooms")]
    TooManyRooms,
}

pub struct RoomRegistry {
    rooms: HashMap<RoomId, Room>,
    client_rooms: HashMap<ClientId, (RoomId, Slot)>,
    max_rooms: usize,
    grid_size: i32,
}

impl RoomRegistry {
    pub fn new(max_rooms: usize, grid_size: i32) -> Self {
        Self {
            rooms: HashMap::new(),
            client_rooms: HashMap::new(),
            max_rooms,
            grid_size,
        }
    }

    /// Create a room with a fresh match and the creator in slot 1.
    /// No tick loop runs until a second player joins.
    pub fn create_room(&mut self, creator: ClientId) -> Result<RoomId, RegistryError> {
        if self.client_rooms.contains_key(&creator) {
            return Err(RegistryError::AlreadyInRoom);
        }
        if self.rooms.len() >= self.max_rooms {
            return Err(RegistryError::TooManyRooms);
        }

        let room = Room::new(creator, self.grid_size);
        let id = room.id;
        self.rooms.insert(id, room);
        self.client_rooms.insert(creator, (id, 1));

        info!(room = %id, client = %creator, "room created");
        Ok(id)
    }

    /// Reserve slot 2 for `joiner`, or fail without registering anything.
    /// Capacity check and slot assignment are one atomic operation.
    pub fn join_room(&mut self, room_id: RoomId, joiner: ClientId) -> Result<Slot, RegistryError> {
        if self.client_rooms.contains_key(&joiner) {
            return Err(RegistryError::AlreadyInRoom);
        }
        let room = self
            .rooms
            .get_mut(&room_id)
            .ok_or(RegistryError::UnknownRoom)?;
        let slot = room.reserve_slot(joiner).ok_or(RegistryError::RoomFull)?;
        self.client_rooms.insert(joiner, (room_id, slot));

        info!(room = %room_id, client = %joiner, slot, "client joined room");
        Ok(slot)
    }

    /// Route lookup for input events
    pub fn resolve(&self, client: ClientId) -> Result<(RoomId, Slot), RegistryError> {
        self.client_rooms
            .get(&client)
            .copied()
            .ok_or(RegistryError::NotInAnyRoom)
    }

    pub fn get_room(&self, room_id: RoomId) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn get_room_mut(&mut self, room_id: RoomId) -> Option<&mut Room> {
        self.rooms.get_mut(&room_id)
    }

    /// Remove a room and cancel its loop. Idempotent: tearing down an
    /// unknown or already removed room is a no-op. The Uuid identifier is
    /// never handed out again, so the room id cannot be reused.
    pub fn teardown(&mut self, room_id: RoomId) -> bool {
        let Some(mut room) = self.rooms.remove(&room_id) else {
            return false;
        };
        room.stop_ticker();
        for client in room.client_ids() {
            self.client_rooms.remove(&client);
        }
        info!(room = %room_id, "room torn down");
        true
    }

    /// Drop a disconnecting client's membership. Returns what the client
    /// was part of so the gateway can apply its disconnect policy. The
    /// room itself is left running; tearing it down is the caller's call.
    pub fn remove_client(&mut self, client: ClientId) -> Option<(RoomId, Slot)> {
        let (room_id, slot) = self.client_rooms.remove(&client)?;
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.remove_client(client);
        }
        debug!(room = %room_id, client = %client, slot, "client left room");
        Some((room_id, slot))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().copied().collect()
    }

    /// Tear down every room (shutdown path)
    pub fn teardown_all(&mut self) {
        for room_id in self.room_ids() {
            self.teardown(room_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> RoomRegistry {
        RoomRegistry::new(16, 20)
    }

    fn client() -> ClientId {
        Uuid::new_v4()
    }

    #[test]
    fn test_create_room_registers_creator() {
        let mut reg = registry();
        let creator = client();

        let room_id = reg.create_room(creator).unwrap();

        assert_eq!(reg.resolve(creator), Ok((room_id, 1)));
        assert_eq!(reg.room_count(), 1);
        assert!(!reg.get_room(room_id).unwrap().has_ticker());
    }

    #[test]
    fn test_join_assigns_slot_two() {
        let mut reg = registry();
        let creator = client();
        let joiner = client();
        let room_id = reg.create_room(creator).unwrap();

        assert_eq!(reg.join_room(room_id, joiner), Ok(2));
        assert_eq!(reg.resolve(joiner), Ok((room_id, 2)));
    }

    #[test]
    fn test_join_unknown_room() {
        let mut reg = registry();
        let joiner = client();

        let result = reg.join_room(Uuid::new_v4(), joiner);

        assert_eq!(result, Err(RegistryError::UnknownRoom));
        // Scenario D: a failed join must register nothing
        assert_eq!(reg.resolve(joiner), Err(RegistryError::NotInAnyRoom));
    }

    #[test]
    fn test_join_full_room_always_fails() {
        let mut reg = registry();
        let room_id = reg.create_room(client()).unwrap();
        reg.join_room(room_id, client()).unwrap();

        for _ in 0..3 {
            let late = client();
            assert_eq!(reg.join_room(room_id, late), Err(RegistryError::RoomFull));
            assert_eq!(reg.resolve(late), Err(RegistryError::NotInAnyRoom));
        }
    }

    #[test]
    fn test_cannot_join_while_in_a_room() {
        let mut reg = registry();
        let creator = client();
        let room_id = reg.create_room(creator).unwrap();
        let other = reg.create_room(client()).unwrap();

        assert_eq!(
            reg.join_room(other, creator),
            Err(RegistryError::AlreadyInRoom)
        );
        assert_eq!(reg.resolve(creator), Ok((room_id, 1)));
    }

    #[test]
    fn test_max_rooms() {
        let mut reg = RoomRegistry::new(2, 20);
        reg.create_room(client()).unwrap();
        reg.create_room(client()).unwrap();

        assert_eq!(
            reg.create_room(client()),
            Err(RegistryError::TooManyRooms)
        );
    }

    #[test]
    fn test_teardown_removes_room_and_memberships() {
        let mut reg = registry();
        let creator = client();
        let joiner = client();
        let room_id = reg.create_room(creator).unwrap();
        reg.join_room(room_id, joiner).unwrap();

        assert!(reg.teardown(room_id));

        assert!(reg.get_room(room_id).is_none());
        assert_eq!(reg.resolve(creator), Err(RegistryError::NotInAnyRoom));
        assert_eq!(reg.resolve(joiner), Err(RegistryError::NotInAnyRoom));
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let mut reg = registry();
        let room_id = reg.create_room(client()).unwrap();

        assert!(reg.teardown(room_id));
        assert!(!reg.teardown(room_id));
        assert!(!reg.teardown(Uuid::new_v4()));
    }

    #[test]
    fn test_remove_client_leaves_room_running() {
        let mut reg = registry();
        let creator = client();
        let joiner = client();
        let room_id = reg.create_room(creator).unwrap();
        reg.join_room(room_id, joiner).unwrap();

        assert_eq!(reg.remove_client(joiner), Some((room_id, 2)));
        assert!(reg.get_room(room_id).is_some());
        assert_eq!(reg.resolve(joiner), Err(RegistryError::NotInAnyRoom));
    }

    #[test]
    fn test_teardown_all() {
        let mut reg = registry();
        reg.create_room(client()).unwrap();
        reg.create_room(client()).unwrap();

        reg.teardown_all();

        assert_eq!(reg.room_count(), 0);
    }
}
