//! Per-room tick scheduler.
//!
//! One task per active room, started the moment slot 2 fills. Each firing
//! locks the room's engine, advances one tick, and broadcasts the result.
//! Ticks are serialized per room by construction; rooms never share state.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::constants::tick;
use crate::game::engine::TickResult;
use crate::game::state::Winner;
use crate::net::gateway::SessionGateway;
use crate::net::protocol::{GameOverPayload, GameStateSnapshot, ScoreUpdate, ServerEvent};
use crate::room::room::RoomId;

enum RoomStep {
    Continue {
        snapshot: GameStateSnapshot,
        scores: Option<ScoreUpdate>,
    },
    Finished {
        winner: Winner,
    },
}

/// Spawn the fixed-rate loop for a freshly filled room.
///
/// The loop stops on the first `Finished` tick (after broadcasting the
/// outcome and tearing the room down) or when the room disappears from
/// the registry underneath it. The returned handle is the cancellation
/// primitive held by the room.
pub fn start_room_loop(gateway: SessionGateway, room_id: RoomId) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_millis(tick::TICK_DURATION_MS));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        debug!(room = %room_id, rate = tick::FRAME_RATE, "tick loop started");

        loop {
            ticker.tick().await;

            let Some(engine) = gateway.room_engine(room_id).await else {
                // torn down externally (disconnect policy, shutdown)
                break;
            };

            // A panic inside the simulation is a defect, not an expected
            // condition; treat it like a collision draw so observers see
            // a terminal event, then tear the room down.
            let step = std::panic::catch_unwind(AssertUnwindSafe(|| {
                let mut engine = engine.lock();
                match engine.tick() {
                    TickResult::Continuing { scores_changed } => {
                        let state = engine.state();
                        RoomStep::Continue {
                            snapshot: GameStateSnapshot::from_match_state(state),
                            scores: scores_changed
                                .then(|| ScoreUpdate::from_match_state(state)),
                        }
                    }
                    TickResult::Finished { winner } => RoomStep::Finished { winner },
                }
            }));

            match step {
                Ok(RoomStep::Continue { snapshot, scores }) => {
                    gateway
                        .broadcast(room_id, ServerEvent::GameState(snapshot))
                        .await;
                    if let Some(update) = scores {
                        gateway
                            .broadcast(room_id, ServerEvent::UpdateScore(update))
                            .await;
                    }
                }
                Ok(RoomStep::Finished { winner }) => {
                    info!(room = %room_id, winner, "match finished");
                    gateway
                        .broadcast(room_id, ServerEvent::GameOver(GameOverPayload { winner }))
                        .await;
                    gateway.teardown_room(room_id).await;
                    break;
                }
                Err(_) => {
                    warn!(room = %room_id, "room tick panicked, tearing down as a draw");
                    gateway
                        .broadcast(room_id, ServerEvent::GameOver(GameOverPayload { winner: 0 }))
                        .await;
                    gateway.teardown_room(room_id).await;
                    break;
                }
            }
        }

        debug!(room = %room_id, "tick loop stopped");
    })
}
