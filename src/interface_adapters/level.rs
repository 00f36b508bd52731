// Level files (TOML) and the built-in arena.

use crate::domain::{Level, Obstacle};
use glam::Vec3;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid level file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value in {0}")]
    Invalid(String),
}

/// On-disk level layout.
///
/// ```toml
/// player_spawn = [0.0, 3.0, 10.0]
/// enemy_spawns = [[37.5, 2.0, 22.5]]
///
/// [[obstacles]]
/// position = [15.0, 0.5, 25.0]
/// size = 1.0
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct LevelDto {
    pub player_spawn: [f32; 3],
    #[serde(default)]
    pub enemy_spawns: Vec<[f32; 3]>,
    #[serde(default)]
    pub obstacles: Vec<ObstacleDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObstacleDto {
    pub position: [f32; 3],
    pub size: f32,
}

impl TryFrom<LevelDto> for Level {
    type Error = LevelError;

    fn try_from(dto: LevelDto) -> Result<Self, Self::Error> {
        let player_spawn = finite_point(dto.player_spawn, || "player_spawn".to_string())?;
        let enemy_spawns = dto
            .enemy_spawns
            .iter()
            .enumerate()
            .map(|(i, p)| finite_point(*p, || format!("enemy_spawns[{i}]")))
            .collect::<Result<Vec<_>, _>>()?;
        let obstacles = dto
            .obstacles
            .iter()
            .enumerate()
            .map(|(i, o)| {
                let position = finite_point(o.position, || format!("obstacles[{i}].position"))?;
                if !o.size.is_finite() || o.size <= 0.0 {
                    return Err(LevelError::Invalid(format!("obstacles[{i}].size")));
                }
                Ok(Obstacle {
                    position,
                    size: o.size,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Level {
            player_spawn,
            enemy_spawns,
            obstacles,
        })
    }
}

fn finite_point(p: [f32; 3], field: impl FnOnce() -> String) -> Result<Vec3, LevelError> {
    let v = Vec3::from_array(p);
    if v.is_finite() {
        Ok(v)
    } else {
        Err(LevelError::Invalid(field()))
    }
}

pub fn parse_level(text: &str) -> Result<Level, LevelError> {
    let dto: LevelDto = toml::from_str(text)?;
    Level::try_from(dto)
}

pub fn load_level(path: &Path) -> Result<Level, LevelError> {
    let text = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_level(&text)
}

const BLOCK: f32 = 1.0;

/// Beach arena with wreckage hulls and rock stacks as cover.
pub fn default_arena() -> Level {
    let mut obstacles = Vec::new();

    let wreckage = [
        (30.0, 20.0),
        (-25.0, 15.0),
        (40.0, -10.0),
        (-35.0, -15.0),
        (20.0, 35.0),
        (-20.0, 30.0),
    ];
    for (variant, (cx, cz)) in wreckage.into_iter().enumerate() {
        let width = 4 + variant % 3;
        let height = 3 + variant % 2;
        let half = width as f32 / 2.0;
        for x in 0..width {
            for z in 0..width {
                for y in 0..height {
                    obstacles.push(Obstacle {
                        position: Vec3::new(
                            cx + x as f32 - half,
                            y as f32 + BLOCK / 2.0,
                            cz + z as f32 - half,
                        ),
                        size: BLOCK,
                    });
                }
            }
        }
    }

    let rocks = [
        (15.0, 25.0, 3),
        (-15.0, 25.0, 2),
        (20.0, -5.0, 2),
        (-20.0, -5.0, 3),
        (10.0, 15.0, 2),
        (-10.0, 15.0, 3),
    ];
    for (x, z, stack) in rocks {
        for y in 0..stack {
            obstacles.push(Obstacle {
                position: Vec3::new(x, y as f32 + BLOCK / 2.0, z),
                size: BLOCK,
            });
        }
    }

    let half = 75.0;
    Level {
        player_spawn: Vec3::new(0.0, 3.0, 10.0),
        enemy_spawns: vec![
            Vec3::new(half * 0.5, 2.0, half * 0.3),
            Vec3::new(-half * 0.5, 2.0, half * 0.3),
            Vec3::new(half * 0.4, 2.0, -half * 0.2),
            Vec3::new(-half * 0.4, 2.0, -half * 0.2),
            Vec3::new(0.0, 2.0, half * 0.4),
            Vec3::new(half * 0.6, 2.0, 0.0),
            Vec3::new(-half * 0.6, 2.0, 0.0),
        ],
        obstacles,
    }
}
