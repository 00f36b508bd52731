use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Size of the playable area and related limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldTuning {
    /// Half of the square ground edge; the playable area is `[-half, half]` on X and Z.
    pub half_extent: f32,

    /// Ground height where no obstacle underlies a point.
    pub default_floor: f32,

    /// Projectiles expire below this height.
    pub min_y: f32,

    /// Projectiles expire above this height.
    pub max_y: f32,

    /// Patrol waypoints keep this distance from the outer walls.
    pub wall_margin: f32,
}

impl Default for WorldTuning {
    fn default() -> Self {
        Self {
            half_extent: 75.0,
            default_floor: 0.0,
            min_y: -5.0,
            max_y: 50.0,
            wall_margin: 5.0,
        }
    }
}

impl WorldTuning {
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds {
            half_extent: self.half_extent,
            min_y: self.min_y,
            max_y: self.max_y,
        }
    }
}

/// Axis-aligned limits of the simulated volume.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBounds {
    pub half_extent: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl WorldBounds {
    /// True while a projectile at `p` is still inside the simulated volume.
    pub fn contains(&self, p: Vec3) -> bool {
        p.x.abs() <= self.half_extent
            && p.z.abs() <= self.half_extent
            && p.y >= self.min_y
            && p.y <= self.max_y
    }

    /// Clamps X and Z into `[-half + margin, half - margin]`.
    pub fn clamp_horizontal(&self, p: Vec3, margin: f32) -> Vec3 {
        let limit = (self.half_extent - margin).max(0.0);
        Vec3::new(p.x.clamp(-limit, limit), p.y, p.z.clamp(-limit, limit))
    }
}
