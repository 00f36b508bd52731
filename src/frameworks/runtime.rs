// Framework bootstrap for the headless simulation runtime.

use crate::domain::Level;
use crate::frameworks::config::{self, ConfigError, InputSource};
use crate::interface_adapters::input::{autopilot_task, read_json_lines};
use crate::interface_adapters::level::{LevelError, default_arena, load_level};
use crate::interface_adapters::presenter::world_update_presenter;
use crate::interface_adapters::utils::clock::MonotonicClock;
use crate::use_cases::{SessionCommand, SessionState, Simulation, SimulationSettings, session_task};

use std::{sync::Arc, time::Duration};
use thiserror::Error;
use tokio::sync::{Notify, broadcast, mpsc, watch};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Level(#[from] LevelError),
    #[error("session task failed: {0}")]
    Session(#[from] tokio::task::JoinError),
}

/// Knobs read from the environment that shape one run.
#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    pub tick_interval: Duration,
    pub seed: u64,
    pub max_ticks: Option<u64>,
    pub input: InputSource,
}

impl RunOptions {
    pub fn from_env() -> Self {
        Self {
            tick_interval: config::tick_interval(),
            seed: config::seed(),
            max_ticks: config::max_ticks(),
            input: config::input_source(),
        }
    }
}

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Runs one session until ctrl-c or the configured tick limit.
pub async fn run(
    settings: SimulationSettings,
    level: Level,
    options: RunOptions,
) -> Result<(), RunError> {
    let sim = Simulation::new(settings, level, MonotonicClock::new(), options.seed);

    // input_tx/rx: every command funnels into the single session task.
    let (input_tx, input_rx) = mpsc::channel::<SessionCommand>(config::INPUT_CHANNEL_CAPACITY);
    // world_tx: one TickOutput per tick, fanned out to presenters.
    let (world_tx, _) = broadcast::channel(config::WORLD_BROADCAST_CAPACITY);
    let (state_tx, state_rx) = watch::channel(SessionState::Running);
    let (latest_tx, latest_rx) = watch::channel(String::new());

    let session_shutdown = Arc::new(Notify::new());
    let pilot_shutdown = Arc::new(Notify::new());

    let presenter = tokio::spawn(world_update_presenter(world_tx.subscribe(), latest_tx));

    match options.input {
        InputSource::Autopilot => {
            tokio::spawn(autopilot_task(
                input_tx,
                options.tick_interval,
                pilot_shutdown.clone(),
            ));
        }
        InputSource::Stdin => {
            // Blocking reads live on their own thread so shutdown never waits on stdin.
            std::thread::spawn(move || read_json_lines(std::io::stdin().lock(), &input_tx));
        }
    }

    let ctrl_c_shutdown = session_shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("ctrl-c received");
            ctrl_c_shutdown.notify_one();
        }
    });

    tracing::info!(
        seed = options.seed,
        input = ?options.input,
        "simulation starting"
    );

    let session = tokio::spawn(session_task(
        sim,
        input_rx,
        world_tx,
        state_tx,
        options.tick_interval,
        session_shutdown,
        options.max_ticks,
    ));

    let sim = session.await.inspect_err(|e| {
        tracing::error!(error = %e, "session task failed");
    })?;
    pilot_shutdown.notify_one();

    // The session dropped its broadcast sender, so the presenter drains and exits.
    if let Err(e) = presenter.await {
        tracing::warn!(error = %e, "presenter task failed");
    }

    tracing::info!(
        ticks = sim.tick_count(),
        state = ?*state_rx.borrow(),
        boss_spawned = sim.boss_spawned(),
        "simulation finished"
    );
    tracing::debug!(update = %latest_rx.borrow().as_str(), "last world update");

    Ok(())
}

pub async fn run_with_config() -> Result<(), RunError> {
    init_runtime();

    let settings_path = config::settings_path();
    let settings = config::load_settings(settings_path.as_deref()).inspect_err(|e| {
        tracing::error!(error = %e, "failed to load settings");
    })?;

    let level = match config::level_path() {
        Some(path) => load_level(&path).inspect_err(|e| {
            tracing::error!(error = %e, "failed to load level");
        })?,
        None => default_arena(),
    };
    tracing::debug!(
        obstacles = level.obstacles.len(),
        enemy_spawns = level.enemy_spawns.len(),
        "level loaded"
    );

    run(settings, level, RunOptions::from_env()).await
}
