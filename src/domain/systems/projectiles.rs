// Projectile integration, expiry and hit detection.

use crate::domain::collision::CollisionWorld;
use crate::domain::geometry::{direction_or_zero, finite_or_zero};
use crate::domain::state::{Faction, ProjectileSnapshot};
use crate::domain::tuning::{ProjectileTuning, WorldBounds};
use glam::Vec3;
use tracing::debug;

/// Request to create a projectile, produced by a weapon or an attacking hostile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileSpawn {
    pub origin: Vec3,
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    pub faction: Faction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: u64,
    pub faction: Faction,
    pub position: Vec3,
    /// Unit direction of travel.
    pub direction: Vec3,
    pub speed: f32,
    pub damage: f32,
    /// Seconds left before the projectile expires on its own.
    pub lifetime: f32,
    pub expired: bool,
}

impl Projectile {
    /// Moves the projectile for one tick in bounded sub-steps.
    ///
    /// The first sub-step that lands inside an obstacle or outside the world expires the
    /// projectile at that position. Returns the number of sub-steps the tick was split into
    /// (zero if the projectile did not move).
    pub fn advance(
        &mut self,
        dt: f32,
        world: &CollisionWorld,
        bounds: &WorldBounds,
        tuning: &ProjectileTuning,
    ) -> u32 {
        if self.expired {
            return 0;
        }

        self.lifetime -= dt;
        if self.lifetime <= 0.0 {
            self.expired = true;
            return 0;
        }

        let displacement = self.direction * self.speed * dt;
        let steps = substep_count(displacement.length(), tuning.max_step);
        let step = displacement / steps as f32;
        let probe = Vec3::splat(tuning.probe_size);

        for _ in 0..steps {
            let next = self.position + step;
            self.position = next;
            if world.overlaps(next, probe) || !bounds.contains(next) {
                self.expired = true;
                break;
            }
        }
        steps
    }
}

const SUBSTEP_TOLERANCE: f32 = 4.0 * f32::EPSILON;

/// Number of sub-steps needed so none is longer than `max_step`. Always at least one.
pub fn substep_count(distance: f32, max_step: f32) -> u32 {
    if !distance.is_finite() || !max_step.is_finite() || max_step <= 0.0 || distance <= 0.0 {
        return 1;
    }
    // Shave a few ulps so rounding noise (25.000002) does not add a step; a step can
    // then exceed `max_step` by float noise only.
    let steps = (distance / max_step * (1.0 - SUBSTEP_TOLERANCE)).ceil();
    steps.clamp(1.0, u32::MAX as f32) as u32
}

/// Dynamic actor a projectile can hit.
#[derive(Debug, Clone, Copy)]
pub struct HitTarget {
    pub actor_id: u64,
    pub faction: Faction,
    pub position: Vec3,
    pub radius: f32,
}

/// A projectile struck a target. Damage is applied by the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileHit {
    pub projectile_id: u64,
    pub target_id: u64,
    pub damage: f32,
}

/// Owns every live projectile.
#[derive(Debug, Clone)]
pub struct ProjectileSystem {
    tuning: ProjectileTuning,
    projectiles: Vec<Projectile>,
    next_id: u64,
}

impl ProjectileSystem {
    pub fn new(tuning: ProjectileTuning) -> Self {
        Self {
            tuning,
            projectiles: Vec::new(),
            next_id: 1,
        }
    }

    /// Creates a projectile and returns its id. Degenerate requests are dropped.
    pub fn spawn(&mut self, request: ProjectileSpawn) -> Option<u64> {
        let direction = direction_or_zero(request.direction);
        let speed = finite_or_zero(request.speed);
        if direction == Vec3::ZERO || speed <= 0.0 || !request.origin.is_finite() {
            debug!(?request, "dropping degenerate projectile");
            return None;
        }

        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.projectiles.push(Projectile {
            id,
            faction: request.faction,
            position: request.origin,
            direction,
            speed,
            damage: finite_or_zero(request.damage).max(0.0),
            lifetime: self.tuning.lifetime,
            expired: false,
        });

        // Trim the oldest first; a drain never skips an element the way index-based
        // front removal inside a forward loop does.
        let cap = self.tuning.max_active;
        if cap > 0 && self.projectiles.len() > cap {
            let excess = self.projectiles.len() - cap;
            self.projectiles.drain(..excess);
        }

        Some(id)
    }

    /// Moves every projectile, tests hits once after movement and removes the expired ones.
    ///
    /// Hits are not swept: a target that crosses a projectile's path inside a single tick
    /// is only hit if it is within range of the projectile's end position.
    pub fn update(
        &mut self,
        dt: f32,
        world: &CollisionWorld,
        bounds: &WorldBounds,
        targets: &[HitTarget],
    ) -> Vec<ProjectileHit> {
        let mut hits = Vec::new();

        for p in self.projectiles.iter_mut() {
            p.advance(dt, world, bounds, &self.tuning);
            if p.expired {
                continue;
            }

            let victim = targets.iter().find(|t| {
                t.faction == p.faction.opposite()
                    && t.position.distance(p.position) < t.radius + self.tuning.hit_margin
            });
            if let Some(target) = victim {
                p.expired = true;
                hits.push(ProjectileHit {
                    projectile_id: p.id,
                    target_id: target.actor_id,
                    damage: p.damage,
                });
            }
        }

        self.projectiles.retain(|p| !p.expired);
        hits
    }

    pub fn clear(&mut self) {
        self.projectiles.clear();
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn snapshots(&self) -> Vec<ProjectileSnapshot> {
        self.projectiles.iter().map(ProjectileSnapshot::from).collect()
    }
}

impl From<&Projectile> for ProjectileSnapshot {
    fn from(p: &Projectile) -> Self {
        Self {
            id: p.id,
            faction: p.faction,
            position: p.position,
            direction: p.direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::WorldTuning;

    fn bounds() -> WorldBounds {
        WorldTuning::default().bounds()
    }

    fn projectile(speed: f32) -> Projectile {
        Projectile {
            id: 1,
            faction: Faction::Player,
            position: Vec3::new(0.0, 1.0, 0.0),
            direction: Vec3::X,
            speed,
            damage: 25.0,
            lifetime: 3.0,
            expired: false,
        }
    }

    fn spawn_request(faction: Faction, origin: Vec3) -> ProjectileSpawn {
        ProjectileSpawn {
            origin,
            direction: Vec3::X,
            speed: 10.0,
            damage: 5.0,
            faction,
        }
    }

    #[test]
    fn when_path_is_clear_then_tick_is_split_into_bounded_substeps() {
        let world = CollisionWorld::default();
        let mut p = projectile(50.0);

        let steps = p.advance(0.1, &world, &bounds(), &ProjectileTuning::default());

        assert_eq!(steps, 25);
        assert!(!p.expired);
        assert!((p.position.x - 5.0).abs() < 1e-4);
    }

    #[test]
    fn when_obstacle_sits_at_tenth_substep_then_projectile_stops_there() {
        let mut world = CollisionWorld::default();
        // Near face at x = 2.0: sub-step 9 (x = 1.8) is clear, sub-step 10 (x = 2.0) is not.
        world.add_static_obstacle(Vec3::new(2.5, 1.0, 0.0), 1.0);
        let mut p = projectile(50.0);

        p.advance(0.1, &world, &bounds(), &ProjectileTuning::default());

        assert!(p.expired);
        assert!((p.position.x - 2.0).abs() < 1e-4, "stopped at {}", p.position.x);
    }

    #[test]
    fn when_thin_wall_lies_between_frames_then_substeps_still_catch_it() {
        let mut world = CollisionWorld::default();
        world.add_static_obstacle(Vec3::new(3.0, 1.0, 0.0), 0.1);
        let mut p = projectile(100.0);

        p.advance(0.1, &world, &bounds(), &ProjectileTuning::default());

        assert!(p.expired);
        assert!(p.position.x < 3.2);
    }

    #[test]
    fn when_lifetime_runs_out_then_projectile_expires_without_moving() {
        let world = CollisionWorld::default();
        let mut p = projectile(10.0);
        p.lifetime = 0.05;

        let steps = p.advance(0.1, &world, &bounds(), &ProjectileTuning::default());

        assert_eq!(steps, 0);
        assert!(p.expired);
        assert_eq!(p.position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn when_projectile_is_expired_then_advance_is_a_no_op() {
        let world = CollisionWorld::default();
        let mut p = projectile(10.0);
        p.expired = true;
        let lifetime = p.lifetime;

        assert_eq!(p.advance(0.1, &world, &bounds(), &ProjectileTuning::default()), 0);
        assert_eq!(p.lifetime, lifetime);
    }

    #[test]
    fn when_projectile_leaves_world_then_it_expires_at_the_boundary_step() {
        let world = CollisionWorld::default();
        let mut p = projectile(50.0);
        p.position.x = 74.5;

        p.advance(0.1, &world, &bounds(), &ProjectileTuning::default());

        assert!(p.expired);
        assert!(p.position.x > 75.0 && p.position.x < 75.3);
    }

    #[test]
    fn when_projectile_is_near_opposing_target_then_exactly_one_target_is_hit() {
        let world = CollisionWorld::default();
        let mut system = ProjectileSystem::new(ProjectileTuning::default());
        system.spawn(spawn_request(Faction::Player, Vec3::new(0.0, 1.0, 0.0)));
        let targets = [
            HitTarget {
                actor_id: 7,
                faction: Faction::Hostile,
                position: Vec3::new(1.0, 1.0, 0.0),
                radius: 1.0,
            },
            HitTarget {
                actor_id: 8,
                faction: Faction::Hostile,
                position: Vec3::new(1.2, 1.0, 0.0),
                radius: 1.0,
            },
        ];

        let hits = system.update(0.05, &world, &bounds(), &targets);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target_id, 7);
        assert_eq!(hits[0].damage, 5.0);
        assert!(system.is_empty());
    }

    #[test]
    fn when_target_shares_faction_then_projectile_passes_through() {
        let world = CollisionWorld::default();
        let mut system = ProjectileSystem::new(ProjectileTuning::default());
        system.spawn(spawn_request(Faction::Hostile, Vec3::new(0.0, 1.0, 0.0)));
        let ally = HitTarget {
            actor_id: 3,
            faction: Faction::Hostile,
            position: Vec3::new(0.5, 1.0, 0.0),
            radius: 1.0,
        };

        let hits = system.update(0.05, &world, &bounds(), &[ally]);

        assert!(hits.is_empty());
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn when_target_is_crossed_within_one_tick_then_it_is_not_hit() {
        // Hit tests run once on the end position of the tick, so a fast projectile can
        // skip over a target it would have touched mid-flight.
        let world = CollisionWorld::default();
        let mut system = ProjectileSystem::new(ProjectileTuning::default());
        system.spawn(ProjectileSpawn {
            speed: 200.0,
            ..spawn_request(Faction::Player, Vec3::new(0.0, 1.0, 0.0))
        });
        let target = HitTarget {
            actor_id: 9,
            faction: Faction::Hostile,
            position: Vec3::new(10.0, 1.0, 0.0),
            radius: 1.0,
        };

        let hits = system.update(0.1, &world, &bounds(), &[target]);

        assert!(hits.is_empty());
        assert_eq!(system.len(), 1);
    }

    #[test]
    fn when_projectile_expires_on_a_wall_then_it_is_not_hit_tested() {
        let mut world = CollisionWorld::default();
        world.add_static_obstacle(Vec3::new(1.0, 1.0, 0.0), 1.0);
        let mut system = ProjectileSystem::new(ProjectileTuning::default());
        system.spawn(spawn_request(Faction::Player, Vec3::new(0.0, 1.0, 0.0)));
        let target = HitTarget {
            actor_id: 4,
            faction: Faction::Hostile,
            position: Vec3::new(0.6, 1.0, 0.0),
            radius: 1.0,
        };

        let hits = system.update(0.1, &world, &bounds(), &[target]);

        assert!(hits.is_empty());
        assert!(system.is_empty());
    }

    #[test]
    fn when_active_projectiles_exceed_cap_then_oldest_are_trimmed_without_skipping() {
        let tuning = ProjectileTuning {
            max_active: 3,
            ..ProjectileTuning::default()
        };
        let mut system = ProjectileSystem::new(tuning);

        let ids: Vec<u64> = (0..6)
            .filter_map(|i| system.spawn(spawn_request(Faction::Player, Vec3::new(0.0, 1.0, i as f32))))
            .collect();

        let remaining: Vec<u64> = system.iter().map(|p| p.id).collect();
        assert_eq!(remaining, ids[3..].to_vec());
    }

    #[test]
    fn when_spawn_direction_is_zero_then_request_is_dropped() {
        let mut system = ProjectileSystem::new(ProjectileTuning::default());
        let request = ProjectileSpawn {
            direction: Vec3::ZERO,
            ..spawn_request(Faction::Player, Vec3::ZERO)
        };

        assert_eq!(system.spawn(request), None);
        assert!(system.is_empty());
    }

    #[test]
    fn when_computing_substeps_then_count_never_drops_below_one() {
        assert_eq!(substep_count(0.0, 0.2), 1);
        assert_eq!(substep_count(0.1, 0.2), 1);
        assert_eq!(substep_count(0.21, 0.2), 2);
        assert_eq!(substep_count(5.0, 0.2), 25);
        assert_eq!(substep_count(5.000_000_5, 0.2), 25);
        assert_eq!(substep_count(0.200_01, 0.2), 2);
        assert_eq!(substep_count(4.01, 0.2), 21);
        assert_eq!(substep_count(1.0, 0.0), 1);
    }
}
