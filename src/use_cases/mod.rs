// Use cases layer: the simulation session and the task that drives it.

pub mod session;
pub mod simulation;
pub mod types;

pub use session::session_task;
pub use simulation::{Simulation, SimulationSettings};
pub use types::{SessionCommand, SessionState, TickOutput, WorldSnapshot};
