//! Session gateway - translates client events into registry and engine
//! calls and fans server events back out to connected clients.
//!
//! This is the only component that knows both the transport boundary
//! (per-client event channels) and the core (registry, engines). The
//! simulation never sees a socket.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::DisconnectPolicy;
use crate::game::engine::MatchEngine;
use crate::game::state::Winner;
use crate::net::protocol::{ClientEvent, GameOverPayload, ServerEvent};
use crate::net::ticker;
use crate::room::registry::{RegistryError, RoomRegistry};
use crate::room::room::{ClientId, RoomId};

/// Outbound half of a client's event channel
pub type ClientSender = mpsc::UnboundedSender<ServerEvent>;

/// Cheap to clone; every connection task and room ticker holds one.
#[derive(Clone)]
pub struct SessionGateway {
    registry: Arc<RwLock<RoomRegistry>>,
    clients: Arc<RwLock<HashMap<ClientId, ClientSender>>>,
    policy: DisconnectPolicy,
}

impl SessionGateway {
    pub fn new(registry: Arc<RwLock<RoomRegistry>>, policy: DisconnectPolicy) -> Self {
        Self {
            registry,
            clients: Arc::new(RwLock::new(HashMap::new())),
            policy,
        }
    }

    /// Register a freshly connected client's outbound channel
    pub async fn register_client(&self, client: ClientId, sender: ClientSender) {
        self.clients.write().await.insert(client, sender);
    }

    /// Handle one inbound client event
    pub async fn handle_event(&self, client: ClientId, event: ClientEvent) {
        match event {
            ClientEvent::NewGame => self.handle_new_game(client).await,
            ClientEvent::JoinGame(code) => self.handle_join_game(client, &code).await,
            ClientEvent::Keydown(key_code) => self.handle_keydown(client, key_code).await,
        }
    }

    async fn handle_new_game(&self, client: ClientId) {
        let created = self.registry.write().await.create_room(client);
        match created {
            Ok(room_id) => {
                self.send_to(client, ServerEvent::GameCode(room_id.to_string()))
                    .await;
                self.send_to(client, ServerEvent::Init(1)).await;
            }
            Err(e) => warn!(client = %client, error = %e, "newGame rejected"),
        }
    }

    async fn handle_join_game(&self, client: ClientId, code: &str) {
        let Ok(room_id) = code.trim().parse::<Uuid>() else {
            self.send_to(client, ServerEvent::UnknownCode).await;
            return;
        };

        let joined = {
            let mut registry = self.registry.write().await;
            let result = registry.join_room(room_id, client);
            if result.is_ok() {
                // room just filled: start its loop before releasing the
                // lock so no second joiner can slip in between
                let handle = ticker::start_room_loop(self.clone(), room_id);
                if let Some(room) = registry.get_room_mut(room_id) {
                    room.attach_ticker(handle);
                }
            }
            result
        };

        match joined {
            Ok(slot) => self.send_to(client, ServerEvent::Init(slot)).await,
            Err(RegistryError::UnknownRoom) => {
                self.send_to(client, ServerEvent::UnknownCode).await;
            }
            Err(RegistryError::RoomFull) => {
                self.send_to(client, ServerEvent::TooManyPlayers).await;
            }
            Err(e) => warn!(client = %client, error = %e, "joinGame rejected"),
        }
    }

    async fn handle_keydown(&self, client: ClientId, key_code: i32) {
        let engine_slot = {
            let registry = self.registry.read().await;
            match registry.resolve(client) {
                Ok((room_id, slot)) => registry
                    .get_room(room_id)
                    .map(|room| (room.engine.clone(), slot)),
                Err(_) => {
                    // input from a client with no room is dropped silently
                    debug!(client = %client, "keydown from client not in any room");
                    None
                }
            }
        };
        if let Some((engine, slot)) = engine_slot {
            engine.lock().apply_input(slot, key_code);
        }
    }

    /// Handle a client leaving. A room abandoned before pairing completes
    /// is torn down; a room mid-match follows the disconnect policy.
    pub async fn handle_disconnect(&self, client: ClientId) {
        self.clients.write().await.remove(&client);

        let action = {
            let mut registry = self.registry.write().await;
            let Some((room_id, _slot)) = registry.remove_client(client) else {
                return;
            };
            let Some(room) = registry.get_room(room_id) else {
                return;
            };

            if !room.has_ticker() {
                // pairing never completed; nothing to play
                registry.teardown(room_id);
                None
            } else {
                match self.policy {
                    DisconnectPolicy::Continue => {
                        info!(room = %room_id, "client left mid-match, room continues");
                        None
                    }
                    DisconnectPolicy::Forfeit => {
                        let remaining = room.client_ids();
                        let winner: Winner = remaining
                            .first()
                            .and_then(|c| room.slot_of(*c))
                            .unwrap_or(0);
                        registry.teardown(room_id);
                        Some((remaining, winner))
                    }
                }
            }
        };

        if let Some((remaining, winner)) = action {
            info!(winner, "match forfeited on disconnect");
            for survivor in remaining {
                self.send_to(survivor, ServerEvent::GameOver(GameOverPayload { winner }))
                    .await;
            }
        }
    }

    /// Send an event to one client; closed channels are ignored, the
    /// disconnect path cleans them up.
    pub async fn send_to(&self, client: ClientId, event: ServerEvent) {
        if let Some(sender) = self.clients.read().await.get(&client) {
            let _ = sender.send(event);
        }
    }

    /// Broadcast an event to every client in a room
    pub async fn broadcast(&self, room_id: RoomId, event: ServerEvent) {
        let recipients = {
            let registry = self.registry.read().await;
            match registry.get_room(room_id) {
                Some(room) => room.client_ids(),
                None => return,
            }
        };
        let clients = self.clients.read().await;
        for client in recipients {
            if let Some(sender) = clients.get(&client) {
                let _ = sender.send(event.clone());
            }
        }
    }

    /// Shared engine handle for a room, if the room still exists
    pub(crate) async fn room_engine(&self, room_id: RoomId) -> Option<Arc<Mutex<MatchEngine>>> {
        self.registry
            .read()
            .await
            .get_room(room_id)
            .map(|room| room.engine.clone())
    }

    pub(crate) async fn teardown_room(&self, room_id: RoomId) {
        self.registry.write().await.teardown(room_id);
    }
}
