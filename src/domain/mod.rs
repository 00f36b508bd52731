// Domain layer: simulation state, rules and ports. Nothing here awaits or does I/O.

pub mod collision;
pub mod events;
pub mod geometry;
pub mod health;
pub mod kinematics;
pub mod level;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use collision::{CollisionWorld, Obstacle};
pub use events::SimEvent;
pub use level::Level;
pub use ports::Clock;
pub use state::{
    Actor, ActorKind, ActorSnapshot, Faction, InputIntent, ProjectileSnapshot, WeaponSnapshot,
};
