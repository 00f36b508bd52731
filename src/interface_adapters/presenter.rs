use crate::domain::SimEvent;
use crate::interface_adapters::protocol::{ServerMessage, WorldUpdateDto};
use crate::use_cases::{SessionState, TickOutput};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

/// Serializes a tick result as a tagged `WorldUpdate` message.
pub fn encode_update(output: &TickOutput) -> serde_json::Result<String> {
    serde_json::to_string(&ServerMessage::WorldUpdate(WorldUpdateDto::from(output)))
}

pub fn encode_state(state: SessionState) -> serde_json::Result<String> {
    serde_json::to_string(&ServerMessage::GameState(state.into()))
}

/// Logs the discrete events of one tick. Lifecycle events at info, combat noise at debug.
pub fn log_events(tick: u64, events: &[SimEvent]) {
    for event in events {
        match *event {
            SimEvent::ProjectileSpawned {
                projectile_id,
                faction,
                ..
            } => debug!(tick, projectile_id, ?faction, "projectile spawned"),
            SimEvent::ActorDamaged {
                actor_id,
                kind,
                amount,
                remaining,
            } => debug!(tick, actor_id, ?kind, amount, remaining, "actor damaged"),
            SimEvent::ActorDied { actor_id, kind } => {
                info!(tick, actor_id, ?kind, "actor died")
            }
            SimEvent::BossSpawned { actor_id, position } => info!(
                tick,
                actor_id,
                x = position.x,
                z = position.z,
                "boss entered the arena"
            ),
            SimEvent::PlayerDied => info!(tick, "player died"),
        }
    }
}

/// Consumes world updates, logs their events and keeps the latest encoded message.
///
/// Exits when the world channel closes.
pub async fn world_update_presenter(
    mut world_rx: broadcast::Receiver<TickOutput>,
    latest_tx: watch::Sender<String>,
) {
    let mut last_state = SessionState::Running;

    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let tick = update.snapshot.tick;
                log_events(tick, &update.events);

                let state = update.snapshot.state;
                if state != last_state {
                    last_state = state;
                    match encode_state(state) {
                        Ok(txt) => info!(tick, payload = %txt, "session state changed"),
                        Err(e) => error!(error = ?e, "failed to serialize session state"),
                    }
                }

                match encode_update(&update) {
                    Ok(txt) => {
                        latest_tx.send_replace(txt);
                    }
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                    }
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "presenter lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                debug!("world updates channel closed; presenter exiting");
                break;
            }
        }
    }
}
