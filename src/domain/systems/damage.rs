// Cooldown gate for damage dealt to the player.

use crate::domain::ports::{Clock, cooldown_elapsed};

/// Global cooldown on damage taken by the player, shared by every source.
///
/// Damage arriving while the gate is closed is dropped, not queued.
#[derive(Debug, Clone)]
pub struct PlayerDamageGate {
    cooldown_ms: u64,
    last_admitted_ms: Option<u64>,
}

impl PlayerDamageGate {
    pub fn new(cooldown_ms: u64) -> Self {
        Self {
            cooldown_ms,
            last_admitted_ms: None,
        }
    }

    /// Returns true and closes the gate if damage may be applied now.
    pub fn try_admit(&mut self, clock: &dyn Clock) -> bool {
        let now = clock.now_ms();
        if cooldown_elapsed(self.last_admitted_ms, now, self.cooldown_ms) {
            self.last_admitted_ms = Some(now);
            true
        } else {
            false
        }
    }

    pub fn reset(&mut self) {
        self.last_admitted_ms = None;
    }
}
