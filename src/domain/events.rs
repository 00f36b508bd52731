// Discrete events emitted by a tick for audio/visual feedback and the HUD.

use crate::domain::state::{ActorKind, Faction};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    ProjectileSpawned {
        projectile_id: u64,
        faction: Faction,
        origin: Vec3,
        direction: Vec3,
    },
    ActorDamaged {
        actor_id: u64,
        kind: ActorKind,
        amount: f32,
        remaining: f32,
    },
    ActorDied {
        actor_id: u64,
        kind: ActorKind,
    },
    BossSpawned {
        actor_id: u64,
        position: Vec3,
    },
    PlayerDied,
}
