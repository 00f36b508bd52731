// Use-case level inputs/outputs for the simulation session.

use crate::domain::{ActorSnapshot, InputIntent, ProjectileSnapshot, SimEvent, WeaponSnapshot};

/// Commands accepted by the session task.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Input(InputIntent),
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Running,
    Paused,
    GameOver,
}

/// Copy-out view of the whole session after a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldSnapshot {
    pub tick: u64,
    pub state: SessionState,
    pub player: ActorSnapshot,
    /// Camera yaw in radians; 0 looks down -Z.
    pub yaw: f32,
    /// Camera pitch in radians, clamped to a quarter turn either way.
    pub pitch: f32,
    pub enemies: Vec<ActorSnapshot>,
    pub boss: Option<ActorSnapshot>,
    pub projectiles: Vec<ProjectileSnapshot>,
    pub weapon: WeaponSnapshot,
}

/// Result of one tick. This is also what the session task broadcasts.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutput {
    pub snapshot: WorldSnapshot,
    pub events: Vec<SimEvent>,
}
