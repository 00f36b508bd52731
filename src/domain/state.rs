// Domain-level simulation actors and input/snapshot types.

use crate::domain::health::Health;
use crate::domain::kinematics::Body;
use crate::domain::systems::ai::{AiOverrides, AiState};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Faction {
    Player,
    Hostile,
}

impl Faction {
    pub fn opposite(self) -> Self {
        match self {
            Faction::Player => Faction::Hostile,
            Faction::Hostile => Faction::Player,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    Player,
    Enemy,
    Boss,
}

impl ActorKind {
    pub fn faction(self) -> Faction {
        match self {
            ActorKind::Player => Faction::Player,
            ActorKind::Enemy | ActorKind::Boss => Faction::Hostile,
        }
    }
}

/// Per-tick input intent, already decoded from raw devices by an external layer.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputIntent {
    /// Forward/back axis in `[-1, 1]`.
    pub move_forward: f32,
    /// Strafe axis in `[-1, 1]`, positive is right.
    pub move_right: f32,
    /// Yaw change in radians, positive turns left.
    pub look_yaw: f32,
    /// Pitch change in radians, positive looks up.
    pub look_pitch: f32,
    pub jump: bool,
    pub fire_held: bool,
    pub reload_requested: bool,
    pub pause_toggle: bool,
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub id: u64,
    pub kind: ActorKind,
    pub body: Body,
    /// Heading around +Y in radians; 0 faces -Z.
    pub facing: f32,
    pub health: Health,
}

impl Actor {
    pub fn new(id: u64, kind: ActorKind, position: Vec3, half_extents: Vec3, max_health: f32) -> Self {
        Self {
            id,
            kind,
            body: Body::new(position, half_extents),
            facing: 0.0,
            health: Health::new(max_health),
        }
    }

    pub fn faction(&self) -> Faction {
        self.kind.faction()
    }

    pub fn position(&self) -> Vec3 {
        self.body.position
    }

    pub fn is_dead(&self) -> bool {
        self.health.is_dead()
    }

    /// Turns the actor to face a horizontal point.
    pub fn face_towards(&mut self, target: Vec3) {
        let d = target - self.body.position;
        if d.x != 0.0 || d.z != 0.0 {
            // atan2 of the negated axes so that facing 0 points down -Z.
            self.facing = (-d.x).atan2(-d.z);
        }
    }
}

/// Copy-out view of an actor for presentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActorSnapshot {
    pub id: u64,
    pub kind: ActorKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub facing: f32,
    pub health: f32,
    pub max_health: f32,
    pub grounded: bool,
    /// Reported AI label; `None` for the player.
    pub ai_state: Option<AiState>,
    pub ai_overrides: AiOverrides,
}

impl From<&Actor> for ActorSnapshot {
    fn from(a: &Actor) -> Self {
        Self {
            id: a.id,
            kind: a.kind,
            position: a.body.position,
            velocity: a.body.velocity,
            facing: a.facing,
            health: a.health.current(),
            max_health: a.health.max(),
            grounded: a.body.grounded,
            ai_state: None,
            ai_overrides: AiOverrides::default(),
        }
    }
}

/// Copy-out view of a projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSnapshot {
    pub id: u64,
    pub faction: Faction,
    pub position: Vec3,
    pub direction: Vec3,
}

/// Copy-out view of the player's weapon for the HUD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponSnapshot {
    pub ammo_in_magazine: u32,
    pub magazines_in_reserve: u32,
    pub capacity: u32,
    /// Time left before the next shot is allowed.
    pub fire_cooldown_remaining_ms: u64,
    pub reloading: bool,
    /// `0..=1`, zero while not reloading.
    pub reload_progress: f32,
}
