use serde::{Deserialize, Serialize};

/// Gameplay tuning for the player's magazine-fed weapon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    /// Minimum time between two shots.
    pub fire_cooldown_ms: u64,

    /// Damage carried by each projectile.
    pub damage: f32,

    /// Projectile speed in units per second.
    pub projectile_speed: f32,

    /// Rounds per magazine.
    pub capacity: u32,

    /// Magazines held in reserve at spawn.
    pub reserve_magazines: u32,

    pub reload_ms: u64,

    /// Distance in front of the eye where projectiles spawn.
    pub muzzle_offset: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            fire_cooldown_ms: 600,
            damage: 25.0,
            projectile_speed: 50.0,
            capacity: 30,
            reserve_magazines: 4,
            reload_ms: 1_500,
            muzzle_offset: 0.5,
        }
    }
}
