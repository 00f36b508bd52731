use serde::{Deserialize, Serialize};

/// Gameplay tuning shared by every projectile regardless of who fired it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileTuning {
    /// Lifetime in seconds before the projectile expires on its own.
    pub lifetime: f32,

    /// Longest distance travelled between two world collision checks.
    pub max_step: f32,

    /// Edge length of the cube used for world collision checks.
    pub probe_size: f32,

    /// Added to a target's collision radius for hit checks.
    pub hit_margin: f32,

    /// Oldest projectiles are trimmed once this many are active.
    pub max_active: usize,
}

impl Default for ProjectileTuning {
    fn default() -> Self {
        Self {
            lifetime: 3.0,
            max_step: 0.2,
            probe_size: 0.2,
            hit_margin: 0.2,
            max_active: 50,
        }
    }
}
