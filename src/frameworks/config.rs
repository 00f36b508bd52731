use crate::domain::tuning::HostileTuning;
use crate::use_cases::SimulationSettings;
use std::{
    env,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use thiserror::Error;

// Runtime constants and environment lookups (not gameplay tuning).

pub const INPUT_CHANNEL_CAPACITY: usize = 1024;
pub const WORLD_BROADCAST_CAPACITY: usize = 128;

pub const TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60);

/// Where session commands come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Autopilot,
    Stdin,
}

pub fn tick_interval() -> Duration {
    env::var("SIM_TICK_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(TICK_INTERVAL)
}

/// RNG seed for AI decisions; falls back to the wall clock when unset.
pub fn seed() -> u64 {
    env::var("SIM_SEED")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        })
}

// 0 or unset runs until ctrl-c.
pub fn max_ticks() -> Option<u64> {
    env::var("SIM_MAX_TICKS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|n| *n > 0)
}

pub fn settings_path() -> Option<PathBuf> {
    env::var_os("SIM_CONFIG_PATH").map(PathBuf::from)
}

pub fn level_path() -> Option<PathBuf> {
    env::var_os("SIM_LEVEL_PATH").map(PathBuf::from)
}

pub fn input_source() -> InputSource {
    match env::var("SIM_INPUT").as_deref() {
        Ok("stdin") => InputSource::Stdin,
        _ => InputSource::Autopilot,
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read settings from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid settings toml: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to encode default settings: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Loads settings from `path`, or returns the defaults when no file is configured.
pub fn load_settings(path: Option<&Path>) -> Result<SimulationSettings, ConfigError> {
    let Some(path) = path else {
        return Ok(SimulationSettings::default());
    };
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_settings(&text)
}

/// Parses a settings file. Keys the file leaves out keep their default values,
/// including individual keys inside a partially specified table.
pub fn parse_settings(text: &str) -> Result<SimulationSettings, ConfigError> {
    let overrides: toml::Table = toml::from_str(text)?;
    let defaults = toml::to_string(&SimulationSettings::default())?;
    let mut merged: toml::Table = toml::from_str(&defaults)?;
    merge_tables(&mut merged, overrides);

    let settings: SimulationSettings = toml::from_str(&toml::to_string(&merged)?)?;
    validate(&settings)?;
    Ok(settings)
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

// Upper bound on projectile sub-steps a single tick may schedule.
pub const MAX_SUBSTEPS_PER_TICK: f32 = 1_000.0;

fn invalid(message: String) -> ConfigError {
    ConfigError::Invalid(message)
}

fn positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite and positive, got {value}")))
    }
}

fn non_negative(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite and not negative, got {value}")))
    }
}

fn finite(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(format!("{name} must be finite, got {value}")))
    }
}

fn validate_hostile(prefix: &str, t: &HostileTuning) -> Result<(), ConfigError> {
    positive(&format!("{prefix}.max_health"), t.max_health)?;
    positive(&format!("{prefix}.size"), t.size)?;
    non_negative(&format!("{prefix}.chase_speed"), t.chase_speed)?;
    non_negative(&format!("{prefix}.patrol_speed"), t.patrol_speed)?;
    non_negative(&format!("{prefix}.detection_range"), t.detection_range)?;
    non_negative(&format!("{prefix}.attack_range"), t.attack_range)?;
    positive(&format!("{prefix}.projectile_speed"), t.projectile_speed)?;
    non_negative(&format!("{prefix}.projectile_damage"), t.projectile_damage)?;
    non_negative(&format!("{prefix}.melee_damage"), t.melee_damage)?;
    non_negative(&format!("{prefix}.melee_reach"), t.melee_reach)?;
    finite(&format!("{prefix}.gravity"), t.gravity)?;
    finite(&format!("{prefix}.friction"), t.friction)?;
    finite(&format!("{prefix}.retreat_health_fraction"), t.retreat_health_fraction)?;
    non_negative(&format!("{prefix}.cover_scan_radius"), t.cover_scan_radius)?;
    finite(&format!("{prefix}.flank_angle_deg"), t.flank_angle_deg)?;
    non_negative(&format!("{prefix}.flank_distance_factor"), t.flank_distance_factor)?;
    non_negative(&format!("{prefix}.lookahead"), t.lookahead)?;
    finite(&format!("{prefix}.chase_avoid_blend"), t.chase_avoid_blend)?;
    finite(&format!("{prefix}.patrol_avoid_blend"), t.patrol_avoid_blend)?;
    finite(&format!("{prefix}.attack_move_scale"), t.attack_move_scale)?;
    non_negative(
        &format!("{prefix}.lead_velocity_threshold"),
        t.lead_velocity_threshold,
    )
}

/// Rejects settings a tick could not run with: non-finite numbers, empty extents, and
/// projectile speeds that would need an unbounded number of sub-steps.
fn validate(settings: &SimulationSettings) -> Result<(), ConfigError> {
    positive("dt_ceiling", settings.dt_ceiling)?;
    // An infinite radius means every enemy is always active.
    let radius = settings.activity_radius;
    if radius.is_nan() || radius < 0.0 {
        return Err(invalid(format!(
            "activity_radius must not be negative, got {radius}"
        )));
    }
    for (axis, value) in ["x", "y", "z"].into_iter().zip(settings.boss_offset) {
        finite(&format!("boss_offset.{axis}"), value)?;
    }

    let player = &settings.player;
    positive("player.speed", player.speed)?;
    non_negative("player.jump_impulse", player.jump_impulse)?;
    finite("player.gravity", player.gravity)?;
    finite("player.friction", player.friction)?;
    positive("player.height", player.height)?;
    positive("player.radius", player.radius)?;
    positive("player.max_health", player.max_health)?;
    finite("player.eye_offset", player.eye_offset)?;

    validate_hostile("enemy", &settings.enemy)?;
    validate_hostile("boss", &settings.boss)?;

    let weapon = &settings.weapon;
    positive("weapon.projectile_speed", weapon.projectile_speed)?;
    non_negative("weapon.damage", weapon.damage)?;
    non_negative("weapon.muzzle_offset", weapon.muzzle_offset)?;

    let projectile = &settings.projectile;
    positive("projectile.lifetime", projectile.lifetime)?;
    positive("projectile.max_step", projectile.max_step)?;
    non_negative("projectile.probe_size", projectile.probe_size)?;
    non_negative("projectile.hit_margin", projectile.hit_margin)?;

    let world = &settings.world;
    positive("world.half_extent", world.half_extent)?;
    finite("world.default_floor", world.default_floor)?;
    finite("world.min_y", world.min_y)?;
    finite("world.max_y", world.max_y)?;
    non_negative("world.wall_margin", world.wall_margin)?;
    if world.min_y >= world.max_y {
        return Err(invalid(format!(
            "world.min_y ({}) must be below world.max_y ({})",
            world.min_y, world.max_y
        )));
    }

    let fastest = weapon
        .projectile_speed
        .max(settings.enemy.projectile_speed)
        .max(settings.boss.projectile_speed);
    let substeps = fastest * settings.dt_ceiling / projectile.max_step;
    if substeps > MAX_SUBSTEPS_PER_TICK {
        return Err(invalid(format!(
            "projectile speed {fastest} needs {substeps} sub-steps per tick; \
             the limit is {MAX_SUBSTEPS_PER_TICK}"
        )));
    }
    Ok(())
}
