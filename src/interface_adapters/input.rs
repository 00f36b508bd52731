// Headless input sources feeding the session: a scripted autopilot and a JSON-lines reader.

use crate::domain::InputIntent;
use crate::interface_adapters::protocol::ClientMessage;
use crate::use_cases::SessionCommand;
use std::io::BufRead;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, mpsc};
use tracing::{debug, warn};

const LEG_STEPS: u64 = 60;
const BURST_STEPS: u64 = 30;
const TURN_PER_STEP: f32 = 0.01;

/// Scripted player: walks a square, sweeps the view and fires in bursts.
#[derive(Debug, Default)]
pub struct Autopilot {
    step: u64,
}

impl Autopilot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_intent(&mut self) -> InputIntent {
        let step = self.step;
        self.step = self.step.wrapping_add(1);

        let (move_forward, move_right) = match (step / LEG_STEPS) % 4 {
            0 => (1.0, 0.0),
            1 => (0.0, 1.0),
            2 => (-1.0, 0.0),
            _ => (0.0, -1.0),
        };

        InputIntent {
            move_forward,
            move_right,
            look_yaw: TURN_PER_STEP,
            look_pitch: 0.0,
            jump: step % (LEG_STEPS * 2) == LEG_STEPS,
            fire_held: (step / BURST_STEPS) % 2 == 0,
            reload_requested: false,
            pause_toggle: false,
        }
    }
}

/// Sends one autopilot intent per interval until shutdown or until the session is gone.
pub async fn autopilot_task(
    input_tx: mpsc::Sender<SessionCommand>,
    interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut pilot = Autopilot::new();
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = ticker.tick() => {}
        }

        if input_tx
            .send(SessionCommand::Input(pilot.next_intent()))
            .await
            .is_err()
        {
            debug!("session input closed; autopilot exiting");
            break;
        }
    }
}

/// Reads one tagged `ClientMessage` per line and forwards it to the session.
///
/// Blocking; run it on a dedicated thread. Malformed lines are logged and skipped.
/// Returns at end of input or once the session stops accepting commands.
pub fn read_json_lines<R: BufRead>(reader: R, input_tx: &mpsc::Sender<SessionCommand>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "input stream failed");
                return;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ClientMessage>(line) {
            Ok(message) => {
                if input_tx.blocking_send(message.into()).is_err() {
                    debug!("session input closed; reader exiting");
                    return;
                }
            }
            Err(e) => warn!(error = %e, "ignoring malformed input line"),
        }
    }
    debug!("input stream ended");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_autopilot_runs_a_full_cycle_then_it_walks_all_four_legs() {
        let mut pilot = Autopilot::new();
        let intents: Vec<InputIntent> = (0..LEG_STEPS * 4).map(|_| pilot.next_intent()).collect();

        assert_eq!(intents[0].move_forward, 1.0);
        assert_eq!(intents[LEG_STEPS as usize].move_right, 1.0);
        assert_eq!(intents[2 * LEG_STEPS as usize].move_forward, -1.0);
        assert_eq!(intents[3 * LEG_STEPS as usize].move_right, -1.0);
        assert!(intents[0].fire_held);
        assert!(!intents[BURST_STEPS as usize].fire_held);
        assert!(intents[LEG_STEPS as usize].jump);
    }

    #[test]
    fn when_reading_json_lines_then_valid_messages_are_forwarded_in_order() {
        let input = b"{\"type\":\"Input\",\"data\":{\"fire\":true}}\nnot json\n\n{\"type\":\"Restart\"}\n";
        let (tx, mut rx) = mpsc::channel(8);

        read_json_lines(&input[..], &tx);
        drop(tx);

        let first = rx.try_recv().expect("first command");
        assert!(matches!(first, SessionCommand::Input(intent) if intent.fire_held));
        assert!(matches!(rx.try_recv(), Ok(SessionCommand::Restart)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn when_session_input_closes_then_autopilot_exits() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            autopilot_task(tx, Duration::from_millis(1), Arc::new(Notify::new())),
        )
        .await;

        assert!(result.is_ok());
    }
}
