use super::simulation::Simulation;
use super::types::{SessionCommand, SessionState, TickOutput};
use crate::domain::InputIntent;
use crate::domain::ports::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info};

/// Folds several intents received within one tick into one.
///
/// Axes take the latest value, look deltas add up, one-shot requests are kept if any
/// intent carried them, and two pause toggles cancel out.
pub fn coalesce(acc: InputIntent, next: InputIntent) -> InputIntent {
    InputIntent {
        move_forward: next.move_forward,
        move_right: next.move_right,
        look_yaw: acc.look_yaw + next.look_yaw,
        look_pitch: acc.look_pitch + next.look_pitch,
        jump: acc.jump || next.jump,
        fire_held: next.fire_held,
        reload_requested: acc.reload_requested || next.reload_requested,
        pause_toggle: acc.pause_toggle ^ next.pause_toggle,
    }
}

/// Starting intent for a tick: held state (movement axes and trigger) from the last
/// tick, with every one-shot field cleared.
pub fn carry_over(last: InputIntent) -> InputIntent {
    InputIntent {
        move_forward: last.move_forward,
        move_right: last.move_right,
        fire_held: last.fire_held,
        ..InputIntent::default()
    }
}

/// Drives one simulation session at a fixed interval until shutdown or `max_ticks`.
///
/// Returns the simulation so callers can inspect the final state.
pub async fn session_task<C: Clock>(
    mut sim: Simulation<C>,
    mut input_rx: mpsc::Receiver<SessionCommand>,
    world_tx: broadcast::Sender<TickOutput>,
    state_tx: watch::Sender<SessionState>,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
    max_ticks: Option<u64>,
) -> Simulation<C> {
    // Drive the fixed-step loop at the configured tick rate.
    let mut interval = tokio::time::interval(tick_interval);
    let mut last_tick = Instant::now();
    let mut ticks_run: u64 = 0;
    let mut held = InputIntent::default();

    info!(
        tick_ms = tick_interval.as_millis() as u64,
        max_ticks, "session started"
    );

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                info!(ticks_run, "session shutdown requested");
                break;
            }
            _ = interval.tick() => {}
        }

        // Axes and trigger stay held until an intent changes them.
        let mut intent = carry_over(held);
        let mut restart = false;
        while let Ok(command) = input_rx.try_recv() {
            match command {
                SessionCommand::Input(next) => intent = coalesce(intent, next),
                SessionCommand::Restart => restart = true,
            }
        }
        held = intent;

        if restart {
            sim.restart();
        }

        let now = Instant::now();
        let raw_dt = now.duration_since(last_tick).as_secs_f32();
        last_tick = now;

        let output = sim.tick(raw_dt, intent);
        let state = output.snapshot.state;
        state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            debug!(?state, "session state changed");
            *current = state;
            true
        });
        // No subscribers is not an error; the session keeps running headless.
        let _ = world_tx.send(output);

        ticks_run += 1;
        if max_ticks.is_some_and(|limit| ticks_run >= limit) {
            info!(ticks_run, "tick limit reached");
            break;
        }
    }

    sim
}
