// Static layout a session is built from.

use crate::domain::collision::{CollisionWorld, Obstacle};
use glam::Vec3;

/// Obstacle footprint plus spawn layout, produced by the world generator or a level file.
#[derive(Debug, Clone, PartialEq)]
pub struct Level {
    pub player_spawn: Vec3,
    /// Candidate enemy spawns, used in order.
    pub enemy_spawns: Vec<Vec3>,
    /// Registration order is preserved; it decides ground-height ties.
    pub obstacles: Vec<Obstacle>,
}

impl Level {
    pub fn collision_world(&self, default_floor: f32) -> CollisionWorld {
        let mut world = CollisionWorld::new(default_floor);
        for obstacle in &self.obstacles {
            world.add_static_obstacle(obstacle.position, obstacle.size);
        }
        world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn when_building_world_then_obstacles_keep_registration_order() {
        let level = Level {
            player_spawn: Vec3::ZERO,
            enemy_spawns: Vec::new(),
            obstacles: vec![
                Obstacle {
                    position: Vec3::new(0.0, 0.5, 0.0),
                    size: 1.0,
                },
                Obstacle {
                    position: Vec3::new(0.0, 1.5, 0.0),
                    size: 1.0,
                },
            ],
        };

        let world = level.collision_world(0.0);

        assert_eq!(world.obstacles(), level.obstacles.as_slice());
        assert_eq!(world.ground_height_at(0.0, 0.0), 1.0);
    }
}
