// Shared builders for driving a simulation deterministically across integration tests.
#![allow(dead_code)]

use combat_core::domain::{InputIntent, Level, SimEvent};
use combat_core::interface_adapters::utils::clock::ManualClock;
use combat_core::use_cases::{Simulation, SimulationSettings, TickOutput};
// `Vec3` is the position type used by levels and snapshots.
use glam::Vec3;
// `Arc` lets the test advance the clock the simulation reads from.
use std::sync::Arc;

// Frame time used by every scripted step, in seconds and in milliseconds.
pub const STEP_DT: f32 = 0.05;
pub const STEP_MS: u64 = 50;

// A simulation plus the clock handle that drives it.
pub struct Harness {
    pub sim: Simulation<Arc<ManualClock>>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    // Build a harness with a fixed seed so AI choices repeat run to run.
    pub fn new(settings: SimulationSettings, level: Level) -> Self {
        // Start at zero so the first shot is never on cooldown.
        let clock = Arc::new(ManualClock::new(0));
        let sim = Simulation::new(settings, level, Arc::clone(&clock), 7);
        Self { sim, clock }
    }

    // Advance time by one frame, then run exactly one tick.
    pub fn step(&mut self, input: InputIntent) -> TickOutput {
        self.clock.advance(STEP_MS);
        self.sim.tick(STEP_DT, input)
    }

    // Step repeatedly, collecting every tick's output.
    pub fn run(&mut self, ticks: usize, input: InputIntent) -> Vec<TickOutput> {
        (0..ticks).map(|_| self.step(input)).collect()
    }
}

// Flat empty arena with the player at the origin and the given enemy spawns.
pub fn open_level(enemy_spawns: &[Vec3]) -> Level {
    Level {
        player_spawn: Vec3::ZERO,
        enemy_spawns: enemy_spawns.to_vec(),
        obstacles: Vec::new(),
    }
}

// Intent that only holds the trigger, aiming straight ahead.
pub fn firing() -> InputIntent {
    InputIntent {
        fire_held: true,
        ..InputIntent::default()
    }
}

// Intent that toggles pause and nothing else.
pub fn pause_toggle() -> InputIntent {
    InputIntent {
        pause_toggle: true,
        ..InputIntent::default()
    }
}

// Count matching events across a run.
pub fn count_events(outputs: &[TickOutput], pred: impl Fn(&SimEvent) -> bool) -> usize {
    outputs
        .iter()
        .flat_map(|o| o.events.iter())
        .filter(|e| pred(e))
        .count()
}
