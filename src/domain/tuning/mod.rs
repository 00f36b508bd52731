// Gameplay tuning records. Runtime constants (tick rate, channel sizes) live in
// `frameworks::config` instead.

pub mod hostile;
pub mod player;
pub mod projectile;
pub mod weapon;
pub mod world;

pub use hostile::HostileTuning;
pub use player::PlayerTuning;
pub use projectile::ProjectileTuning;
pub use weapon::WeaponTuning;
pub use world::{WorldBounds, WorldTuning};
