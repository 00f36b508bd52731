// Physics integration shared by the player, enemies and the boss.

use crate::domain::collision::CollisionWorld;
use crate::domain::geometry::finite_or_zero;
use crate::domain::tuning::WorldBounds;
use glam::Vec3;

/// Physical state of an actor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Body {
    pub position: Vec3,
    pub velocity: Vec3,
    pub grounded: bool,
    /// Half size of the collision box.
    pub half_extents: Vec3,
}

impl Body {
    pub fn new(position: Vec3, half_extents: Vec3) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            grounded: false,
            half_extents,
        }
    }

    pub fn size(&self) -> Vec3 {
        self.half_extents * 2.0
    }
}

/// Per-kind physics constants.
#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub gravity: f32,
    pub jump_impulse: f32,
    /// Horizontal velocity multiplier applied after each step.
    pub friction: f32,
    pub bounds: WorldBounds,
}

/// Advances `body` by one tick.
///
/// `desired` is the horizontal velocity for this tick, already scaled to the actor's
/// speed. A blocked horizontal step is dropped as a whole; there is no sliding.
pub fn step_body(
    body: &mut Body,
    desired: Vec3,
    jump: bool,
    dt: f32,
    world: &CollisionWorld,
    cfg: &MovementConfig,
) {
    let dt = finite_or_zero(dt).max(0.0);
    let desired = if desired.is_finite() { desired } else { Vec3::ZERO };

    body.velocity.y += cfg.gravity * dt;

    if jump && body.grounded {
        body.velocity.y = cfg.jump_impulse;
        body.grounded = false;
    }

    body.velocity.x = desired.x;
    body.velocity.z = desired.z;

    let next = body.position + body.velocity * dt;

    let probe = Vec3::new(next.x, body.position.y, next.z);
    if !world.overlaps(probe, body.size()) {
        let clamped = cfg.bounds.clamp_horizontal(probe, 0.0);
        body.position.x = clamped.x;
        body.position.z = clamped.z;
    }

    let floor = world.ground_height_at(body.position.x, body.position.z) + body.half_extents.y;
    if next.y <= floor {
        body.position.y = floor;
        body.velocity.y = 0.0;
        body.grounded = true;
    } else {
        body.position.y = next.y;
        body.grounded = false;
    }

    body.velocity.x *= cfg.friction;
    body.velocity.z *= cfg.friction;
}

/// Puts a body on the ground at its current column.
pub fn snap_to_ground(body: &mut Body, world: &CollisionWorld) {
    body.position.y =
        world.ground_height_at(body.position.x, body.position.z) + body.half_extents.y;
    body.velocity.y = 0.0;
    body.grounded = true;
}
