use serde::{Deserialize, Serialize};

/// Gameplay tuning for the player-controlled actor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Horizontal move speed in units per second.
    pub speed: f32,

    /// Vertical velocity applied by a jump.
    pub jump_impulse: f32,

    /// Vertical acceleration in units per second squared (negative is down).
    pub gravity: f32,

    /// Horizontal velocity multiplier applied after each tick.
    pub friction: f32,

    /// Standing height of the collision box.
    pub height: f32,

    /// Horizontal collision radius. Also used for projectile hit checks.
    pub radius: f32,

    pub max_health: f32,

    /// Height of the eye above the actor center; bullets leave from here.
    pub eye_offset: f32,
}

impl PlayerTuning {
    pub fn half_extents(&self) -> glam::Vec3 {
        glam::Vec3::new(self.radius, self.height * 0.5, self.radius)
    }
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            speed: 5.0,
            jump_impulse: 8.0,
            gravity: -20.0,
            friction: 0.9,
            height: 1.8,
            radius: 0.3,
            max_health: 100.0,
            eye_offset: 0.7,
        }
    }
}
