use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Gameplay tuning for AI-driven hostiles. Regular enemies and the boss share the
/// same controller and physics and differ only in these numbers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HostileTuning {
    pub max_health: f32,

    /// Edge size of the actor. Drives its collision box, hit radius and muzzle height.
    pub size: f32,

    /// Speed while the reported state is Chase.
    pub chase_speed: f32,

    /// Speed while patrolling or attacking.
    pub patrol_speed: f32,

    pub detection_range: f32,
    pub attack_range: f32,

    /// Minimum time between two ranged attacks.
    pub attack_cooldown_ms: u64,

    pub projectile_speed: f32,
    pub projectile_damage: f32,

    /// Damage dealt when attacking from closer than `melee_reach`.
    pub melee_damage: f32,
    pub melee_reach: f32,

    pub gravity: f32,
    pub friction: f32,

    /// Health fraction under which the actor retreats.
    pub retreat_health_fraction: f32,

    /// How long after taking damage the actor keeps looking for cover.
    pub cover_memory_ms: u64,

    /// Distance of the cover probes from the actor.
    pub cover_scan_radius: f32,

    /// Number of evenly spaced cover probes.
    pub cover_samples: u32,

    /// Angle between the direct approach and the flanking approach.
    pub flank_angle_deg: f32,

    /// Flanking is attempted beyond `attack_range * flank_distance_factor`.
    pub flank_distance_factor: f32,

    /// Length of the obstacle avoidance probe step.
    pub lookahead: f32,

    pub chase_avoid_blend: f32,
    pub patrol_avoid_blend: f32,

    /// Share of the approach vector kept while attacking.
    pub attack_move_scale: f32,

    /// Target speed above which shots are led.
    pub lead_velocity_threshold: f32,
}

impl HostileTuning {
    /// Defaults for regular enemies.
    pub fn enemy() -> Self {
        Self::default()
    }

    /// Defaults for the boss.
    pub fn boss() -> Self {
        Self {
            max_health: 200.0,
            size: 1.5,
            chase_speed: 2.5,
            patrol_speed: 1.2,
            detection_range: 30.0,
            attack_range: 10.0,
            attack_cooldown_ms: 800,
            projectile_speed: 45.0,
            projectile_damage: 20.0,
            melee_damage: 20.0,
            ..Self::default()
        }
    }

    /// Half-extents of the collision box (0.8 size wide, 2 sizes tall).
    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.size * 0.4, self.size, self.size * 0.4)
    }

    /// Height of the muzzle above the actor center (head level).
    pub fn muzzle_height(&self) -> f32 {
        self.size * 0.5
    }
}

impl Default for HostileTuning {
    fn default() -> Self {
        Self {
            max_health: 50.0,
            size: 1.0,
            chase_speed: 2.0,
            patrol_speed: 1.0,
            detection_range: 15.0,
            attack_range: 8.0,
            attack_cooldown_ms: 1_500,
            projectile_speed: 40.0,
            projectile_damage: 15.0,
            melee_damage: 10.0,
            melee_reach: 2.0,
            gravity: -20.0,
            friction: 0.9,
            retreat_health_fraction: 0.3,
            cover_memory_ms: 2_000,
            cover_scan_radius: 5.0,
            cover_samples: 8,
            flank_angle_deg: 60.0,
            flank_distance_factor: 1.5,
            lookahead: 2.0,
            chase_avoid_blend: 0.3,
            patrol_avoid_blend: 0.5,
            attack_move_scale: 0.3,
            lead_velocity_threshold: 0.1,
        }
    }
}
