//! Fixed-shape wire events.
//!
//! Every event travels as one JSON object, `{"event": <name>, "data": ..}`.
//! Event names and payload field names (`gridsize`, `playerOne`, ...) are
//! the upstream browser client's contract and must not change.

use serde::{Deserialize, Serialize};

use crate::game::state::{Cell, MatchState, Winner};

/// Events a client may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Create a room; replies with `gameCode` and `init 1`
    NewGame,
    /// Join an existing room by its code
    JoinGame(String),
    /// Raw browser key code from the client's keydown capture
    Keydown(i32),
}

/// Events the server emits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// The freshly created room's code, sent to the creator
    GameCode(String),
    /// Slot confirmation: 1 for the creator, 2 for the joiner
    Init(u8),
    /// Join target does not exist
    UnknownCode,
    /// Join target already has two players
    TooManyPlayers,
    /// Per-tick authoritative state while the match is in progress
    GameState(GameStateSnapshot),
    /// Sent whenever a score changed this tick
    UpdateScore(ScoreUpdate),
    /// Terminal outcome; no `gameState` follows this
    GameOver(GameOverPayload),
}

/// Serialized match state, shaped exactly as the client paints it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub gridsize: i32,
    pub food: Cell,
    pub players: [PlayerSnapshot; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub snake: Vec<Cell>,
}

impl GameStateSnapshot {
    pub fn from_match_state(state: &MatchState) -> Self {
        Self {
            gridsize: state.grid_size,
            food: state.food,
            players: [
                PlayerSnapshot {
                    snake: state.players[0].snake.clone(),
                },
                PlayerSnapshot {
                    snake: state.players[1].snake.clone(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreUpdate {
    pub player_one: u32,
    pub player_two: u32,
}

impl ScoreUpdate {
    pub fn from_match_state(state: &MatchState) -> Self {
        Self {
            player_one: state.players[0].score,
            player_two: state.players[1].score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameOverPayload {
    pub winner: Winner,
}

/// Decode failures cover both malformed JSON and unknown event names;
/// callers drop the offending line either way.
#[derive(Debug, thiserror::Error)]
#[error("protocol error: {0}")]
pub struct ProtocolError(#[from] serde_json::Error);

pub fn encode(event: &ServerEvent) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(event)?)
}

pub fn decode(line: &str) -> Result<ClientEvent, ProtocolError> {
    Ok(serde_json::from_str(line)?)
}
