// Static collision world: the obstacle footprint produced by level generation.

use crate::domain::geometry::aabb_overlap;
use glam::Vec3;
use std::collections::HashMap;
use tracing::warn;

/// Number of samples used by line-of-sight checks when the caller has no preference.
pub const DEFAULT_LOS_STEPS: u32 = 5;

/// Edge length of the probe cube tested at each line-of-sight sample.
const LOS_PROBE_SIZE: f32 = 0.2;

/// Edge length of a spatial hash cell on the XZ plane.
const DEFAULT_CELL_SIZE: f32 = 4.0;

/// A static axis-aligned cube.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub position: Vec3,
    pub size: f32,
}

impl Obstacle {
    fn contains_column(&self, x: f32, z: f32) -> bool {
        let half = self.size * 0.5;
        x >= self.position.x - half
            && x <= self.position.x + half
            && z >= self.position.z - half
            && z <= self.position.z + half
    }

    fn top(&self) -> f32 {
        self.position.y + self.size * 0.5
    }
}

/// Append-only registry of static obstacles.
///
/// Obstacles keep their registration order; a uniform XZ hash narrows queries down to
/// nearby obstacles without changing any answer compared to a full scan.
#[derive(Debug, Clone)]
pub struct CollisionWorld {
    obstacles: Vec<Obstacle>,
    cells: HashMap<(i32, i32), Vec<usize>>,
    cell_size: f32,
    default_floor: f32,
}

impl CollisionWorld {
    pub fn new(default_floor: f32) -> Self {
        Self::with_cell_size(default_floor, DEFAULT_CELL_SIZE)
    }

    pub fn with_cell_size(default_floor: f32, cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            DEFAULT_CELL_SIZE
        };
        Self {
            obstacles: Vec::new(),
            cells: HashMap::new(),
            cell_size,
            default_floor,
        }
    }

    /// Registers a cube of edge `size` centered on `position`.
    ///
    /// Only called while the world is being built, never from inside a tick.
    pub fn add_static_obstacle(&mut self, position: Vec3, size: f32) {
        if !position.is_finite() || !size.is_finite() || size <= 0.0 {
            warn!(?position, size, "ignoring degenerate obstacle");
            return;
        }

        let index = self.obstacles.len();
        let obstacle = Obstacle { position, size };
        self.obstacles.push(obstacle);

        let half = size * 0.5;
        let (min, max) = (position - Vec3::splat(half), position + Vec3::splat(half));
        for cell in self.cells_between(min, max) {
            self.cells.entry(cell).or_default().push(index);
        }
    }

    /// True if the box of full `size` centered on `position` touches any obstacle.
    pub fn overlaps(&self, position: Vec3, size: Vec3) -> bool {
        if !position.is_finite() || !size.is_finite() {
            return false;
        }

        let hit = |obstacle: &Obstacle| {
            aabb_overlap(position, size, obstacle.position, Vec3::splat(obstacle.size))
        };

        let half = size.abs() * 0.5;
        let (min, max) = (position - half, position + half);
        if self.cell_count_between(min, max) > self.obstacles.len() {
            // A query wider than the whole registry is cheaper as a plain scan.
            return self.obstacles.iter().any(hit);
        }

        self.cells_between(min, max).any(|cell| {
            self.cells
                .get(&cell)
                .is_some_and(|indices| indices.iter().any(|&i| hit(&self.obstacles[i])))
        })
    }

    /// Top surface of the first registered obstacle whose footprint contains `(x, z)`,
    /// or the default floor.
    pub fn ground_height_at(&self, x: f32, z: f32) -> f32 {
        if !x.is_finite() || !z.is_finite() {
            return self.default_floor;
        }

        self.cells
            .get(&self.cell_of(x, z))
            .and_then(|indices| {
                indices
                    .iter()
                    .copied()
                    .filter(|&i| self.obstacles[i].contains_column(x, z))
                    .min()
            })
            .map(|i| self.obstacles[i].top())
            .unwrap_or(self.default_floor)
    }

    /// Tests `steps` evenly spaced interior points of the segment; true when none is blocked.
    pub fn sample_line_of_sight(&self, from: Vec3, to: Vec3, steps: u32) -> bool {
        let probe = Vec3::splat(LOS_PROBE_SIZE);
        (0..steps).all(|i| {
            let t = (i + 1) as f32 / (steps + 1) as f32;
            !self.overlaps(from.lerp(to, t), probe)
        })
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn default_floor(&self) -> f32 {
        self.default_floor
    }

    fn cell_coord(&self, value: f32) -> i32 {
        (value / self.cell_size).floor() as i32
    }

    fn cell_of(&self, x: f32, z: f32) -> (i32, i32) {
        (self.cell_coord(x), self.cell_coord(z))
    }

    fn cell_count_between(&self, min: Vec3, max: Vec3) -> usize {
        let dx = (self.cell_coord(max.x) as i64 - self.cell_coord(min.x) as i64 + 1).max(0);
        let dz = (self.cell_coord(max.z) as i64 - self.cell_coord(min.z) as i64 + 1).max(0);
        dx.saturating_mul(dz) as usize
    }

    fn cells_between(&self, min: Vec3, max: Vec3) -> impl Iterator<Item = (i32, i32)> + use<> {
        let (x0, x1) = (self.cell_coord(min.x), self.cell_coord(max.x));
        let (z0, z1) = (self.cell_coord(min.z), self.cell_coord(max.z));
        (x0..=x1).flat_map(move |x| (z0..=z1).map(move |z| (x, z)))
    }
}

impl Default for CollisionWorld {
    fn default() -> Self {
        Self::new(0.0)
    }
}
