// Per-tick systems driven by the simulation loop.

pub mod ai;
pub mod damage;
pub mod projectiles;
pub mod weapon;
