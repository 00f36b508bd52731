// Decision making for enemies and the boss.
//
// The controller only decides. It returns a direction, a speed and an optional attack;
// the simulation applies movement through the shared kinematics and spawns projectiles.

use crate::domain::collision::{CollisionWorld, DEFAULT_LOS_STEPS};
use crate::domain::geometry::{
    direction_or_zero, finite_or_zero, flat_direction, flat_distance, rotate_y,
};
use crate::domain::ports::{Clock, cooldown_elapsed};
use crate::domain::tuning::{HostileTuning, WorldBounds};
use glam::Vec3;
use rand::Rng;
use std::f32::consts::TAU;

const WAYPOINT_REACHED: f32 = 1.0;
const WAYPOINT_MIN_PICK: f32 = 3.0;
const WAYPOINT_ATTEMPTS: u32 = 10;
const FALLBACK_MIN_DISTANCE: f32 = 10.0;
const FALLBACK_DISTANCE_SPREAD: f32 = 20.0;

/// Reported base state. `Dead` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    Patrol,
    Chase,
    Attack,
    Dead,
}

/// Transient behaviors layered on top of the base state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AiOverrides {
    pub seeking_cover: bool,
    pub flanking: bool,
    pub retreating: bool,
}

/// Base transition rule, applied when no override short-circuits it.
pub fn base_state(distance: f32, attack_range: f32, detection_range: f32) -> AiState {
    if distance <= attack_range {
        AiState::Attack
    } else if distance <= detection_range {
        AiState::Chase
    } else {
        AiState::Patrol
    }
}

/// Everything a controller reads for one decision.
pub struct AiContext<'a> {
    /// Actor center.
    pub position: Vec3,
    /// Current health over max health.
    pub health_fraction: f32,
    /// Center of the player.
    pub target: Vec3,
    pub tuning: &'a HostileTuning,
    pub world: &'a CollisionWorld,
    pub bounds: &'a WorldBounds,
    /// Distance patrol waypoints keep from the outer walls.
    pub wall_margin: f32,
    pub clock: &'a dyn Clock,
}

/// A ranged attack the simulation should turn into a projectile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackIntent {
    pub muzzle: Vec3,
    /// Unit vector from the muzzle to `aim_point`.
    pub direction: Vec3,
    /// Target position, led by the target's estimated velocity when it moves.
    pub aim_point: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiDecision {
    pub state: AiState,
    pub overrides: AiOverrides,
    /// Horizontal movement direction; may be shorter than unit length while attacking.
    pub direction: Vec3,
    pub speed: f32,
    pub attack: Option<AttackIntent>,
    /// Target is inside melee reach while attacking.
    pub melee: bool,
}

impl AiDecision {
    fn moving(state: AiState, overrides: AiOverrides, direction: Vec3, speed: f32) -> Self {
        Self {
            state,
            overrides,
            direction,
            speed,
            attack: None,
            melee: false,
        }
    }

    fn dead() -> Self {
        Self::moving(AiState::Dead, AiOverrides::default(), Vec3::ZERO, 0.0)
    }

    /// Horizontal velocity to feed into the kinematics step.
    pub fn desired_velocity(&self) -> Vec3 {
        self.direction * self.speed
    }
}

#[derive(Debug, Clone)]
pub struct AiController {
    state: AiState,
    overrides: AiOverrides,
    waypoint: Option<Vec3>,
    last_attack_ms: Option<u64>,
    last_damage_ms: Option<u64>,
    previous_target: Option<(Vec3, u64)>,
    latest_target: Option<(Vec3, u64)>,
    /// +1 or -1; picks the flanking side for the controller's lifetime.
    flank_sign: f32,
}

impl AiController {
    pub fn new<R: Rng>(rng: &mut R) -> Self {
        Self {
            state: AiState::Patrol,
            overrides: AiOverrides::default(),
            waypoint: None,
            last_attack_ms: None,
            last_damage_ms: None,
            previous_target: None,
            latest_target: None,
            flank_sign: if rng.random_bool(0.5) { 1.0 } else { -1.0 },
        }
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn overrides(&self) -> AiOverrides {
        self.overrides
    }

    pub fn waypoint(&self) -> Option<Vec3> {
        self.waypoint
    }

    /// Records when the actor was last hurt; drives cover-seeking.
    pub fn notify_damaged(&mut self, now_ms: u64) {
        self.last_damage_ms = Some(now_ms);
    }

    pub fn kill(&mut self) {
        self.state = AiState::Dead;
        self.overrides = AiOverrides::default();
    }

    pub fn update<R: Rng>(&mut self, ctx: &AiContext<'_>, rng: &mut R) -> AiDecision {
        if self.state == AiState::Dead || ctx.health_fraction <= 0.0 {
            self.kill();
            return AiDecision::dead();
        }

        let now = ctx.clock.now_ms();
        self.observe_target(ctx.target, now);
        self.overrides = AiOverrides::default();

        let tuning = ctx.tuning;
        let distance = ctx.position.distance(ctx.target);
        let in_detection = distance <= tuning.detection_range;

        let decision = if in_detection && ctx.health_fraction < tuning.retreat_health_fraction {
            self.retreat(ctx)
        } else {
            let cover = if in_detection {
                self.seek_cover_after_damage(ctx, now)
            } else {
                None
            };
            match cover {
                Some(decision) => decision,
                None => self.base_decision(ctx, distance, now, rng),
            }
        };

        self.state = decision.state;
        decision
    }

    fn base_decision<R: Rng>(
        &mut self,
        ctx: &AiContext<'_>,
        distance: f32,
        now: u64,
        rng: &mut R,
    ) -> AiDecision {
        let tuning = ctx.tuning;
        match base_state(distance, tuning.attack_range, tuning.detection_range) {
            AiState::Attack => self.attack(ctx, distance, now),
            AiState::Chase => {
                let direction = self.chase_direction(ctx, distance, rng);
                AiDecision::moving(AiState::Chase, self.overrides, direction, tuning.chase_speed)
            }
            AiState::Patrol | AiState::Dead => {
                let direction = self.patrol_direction(ctx, rng);
                AiDecision::moving(AiState::Patrol, self.overrides, direction, tuning.patrol_speed)
            }
        }
    }

    fn retreat(&mut self, ctx: &AiContext<'_>) -> AiDecision {
        self.overrides.retreating = true;
        let direction = match self.find_cover(ctx) {
            Some(cover) => {
                self.overrides.seeking_cover = true;
                flat_direction(ctx.position, cover)
            }
            None => flat_direction(ctx.target, ctx.position),
        };
        AiDecision::moving(AiState::Chase, self.overrides, direction, ctx.tuning.chase_speed)
    }

    fn seek_cover_after_damage(&mut self, ctx: &AiContext<'_>, now: u64) -> Option<AiDecision> {
        let last = self.last_damage_ms?;
        if now.saturating_sub(last) >= ctx.tuning.cover_memory_ms {
            return None;
        }
        let cover = self.find_cover(ctx)?;
        self.overrides.seeking_cover = true;
        Some(AiDecision::moving(
            AiState::Chase,
            self.overrides,
            flat_direction(ctx.position, cover),
            ctx.tuning.chase_speed,
        ))
    }

    /// Probes a ring around the actor and returns the obstructed point that best
    /// trades distance from the target against distance from the actor.
    fn find_cover(&self, ctx: &AiContext<'_>) -> Option<Vec3> {
        let tuning = ctx.tuning;
        let footprint = footprint(tuning);
        let samples = tuning.cover_samples.max(1);

        let mut best: Option<(f32, Vec3)> = None;
        for i in 0..samples {
            let angle = TAU * i as f32 / samples as f32;
            let probe = ctx.position
                + Vec3::new(angle.cos(), 0.0, angle.sin()) * tuning.cover_scan_radius;
            if !ctx.world.overlaps(probe, footprint) {
                continue;
            }
            let score = probe.distance(ctx.target) / (probe.distance(ctx.position) + 1.0);
            if best.is_none_or(|(top, _)| score > top) {
                best = Some((score, probe));
            }
        }
        best.map(|(_, point)| point)
    }

    fn chase_direction<R: Rng>(&mut self, ctx: &AiContext<'_>, distance: f32, rng: &mut R) -> Vec3 {
        let tuning = ctx.tuning;
        let direct = flat_direction(ctx.position, ctx.target);

        if distance > tuning.attack_range * tuning.flank_distance_factor {
            let flank = rotate_y(direct, self.flank_sign * tuning.flank_angle_deg.to_radians());
            if flank != Vec3::ZERO && !lookahead_blocked(ctx, flank) {
                self.overrides.flanking = true;
                return flank;
            }
        }

        avoid_obstacles(ctx, direct, tuning.chase_avoid_blend, rng)
    }

    fn attack(&mut self, ctx: &AiContext<'_>, distance: f32, now: u64) -> AiDecision {
        let tuning = ctx.tuning;
        let approach = flat_direction(ctx.position, ctx.target) * tuning.attack_move_scale;

        let mut decision =
            AiDecision::moving(AiState::Attack, self.overrides, approach, tuning.patrol_speed);
        decision.attack = self.try_ranged_attack(ctx, distance, now);
        decision.melee = distance < tuning.melee_reach;
        decision
    }

    fn try_ranged_attack(&mut self, ctx: &AiContext<'_>, distance: f32, now: u64) -> Option<AttackIntent> {
        let tuning = ctx.tuning;
        if !cooldown_elapsed(self.last_attack_ms, now, tuning.attack_cooldown_ms) {
            return None;
        }

        let muzzle = ctx.position + Vec3::Y * tuning.muzzle_height();
        if !ctx.world.sample_line_of_sight(muzzle, ctx.target, DEFAULT_LOS_STEPS) {
            return None;
        }

        let velocity = self.target_velocity();
        let aim_point = if velocity.length() > tuning.lead_velocity_threshold
            && tuning.projectile_speed > 0.0
        {
            ctx.target + velocity * (distance / tuning.projectile_speed)
        } else {
            ctx.target
        };

        let direction = direction_or_zero(aim_point - muzzle);
        if direction == Vec3::ZERO {
            return None;
        }

        self.last_attack_ms = Some(now);
        Some(AttackIntent {
            muzzle,
            direction,
            aim_point,
        })
    }

    fn patrol_direction<R: Rng>(&mut self, ctx: &AiContext<'_>, rng: &mut R) -> Vec3 {
        let needs_waypoint = self
            .waypoint
            .is_none_or(|w| flat_distance(ctx.position, w) < WAYPOINT_REACHED);
        if needs_waypoint {
            self.waypoint = Some(pick_waypoint(ctx, rng));
        }

        let direction = self
            .waypoint
            .map(|w| flat_direction(ctx.position, w))
            .unwrap_or(Vec3::ZERO);
        avoid_obstacles(ctx, direction, ctx.tuning.patrol_avoid_blend, rng)
    }

    fn observe_target(&mut self, target: Vec3, now: u64) {
        match self.latest_target {
            Some((_, seen)) if seen == now => self.latest_target = Some((target, now)),
            _ => {
                self.previous_target = self.latest_target;
                self.latest_target = Some((target, now));
            }
        }
    }

    /// Finite difference of the last two target observations, in units per second.
    fn target_velocity(&self) -> Vec3 {
        match (self.previous_target, self.latest_target) {
            (Some((a, t0)), Some((b, t1))) if t1 > t0 => {
                (b - a) / ((t1 - t0) as f32 / 1_000.0)
            }
            _ => Vec3::ZERO,
        }
    }
}

fn footprint(tuning: &HostileTuning) -> Vec3 {
    tuning.half_extents() * 2.0
}

fn lookahead_blocked(ctx: &AiContext<'_>, direction: Vec3) -> bool {
    let probe = ctx.position + direction * ctx.tuning.lookahead;
    ctx.world.overlaps(probe, footprint(ctx.tuning))
}

/// Bends `direction` sideways when the lookahead step is blocked. The side is random.
fn avoid_obstacles<R: Rng>(ctx: &AiContext<'_>, direction: Vec3, blend: f32, rng: &mut R) -> Vec3 {
    if direction == Vec3::ZERO || !lookahead_blocked(ctx, direction) {
        return direction;
    }
    let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
    let perpendicular = Vec3::new(-direction.z, 0.0, direction.x);
    direction_or_zero(direction + perpendicular * blend * sign)
}

fn pick_waypoint<R: Rng>(ctx: &AiContext<'_>, rng: &mut R) -> Vec3 {
    // A non-finite extent would make the sampling range unbounded.
    let limit = finite_or_zero(ctx.bounds.half_extent - ctx.wall_margin).max(0.0);
    let y = ctx.position.y;

    for _ in 0..WAYPOINT_ATTEMPTS {
        let candidate = Vec3::new(
            rng.random_range(-limit..=limit),
            y,
            rng.random_range(-limit..=limit),
        );
        if flat_distance(ctx.position, candidate) > WAYPOINT_MIN_PICK {
            return candidate;
        }
    }

    let angle = rng.random::<f32>() * TAU;
    let distance = FALLBACK_MIN_DISTANCE + rng.random::<f32>() * FALLBACK_DISTANCE_SPREAD;
    let fallback = ctx.position + Vec3::new(angle.cos(), 0.0, angle.sin()) * distance;
    ctx.bounds.clamp_horizontal(fallback, ctx.wall_margin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tuning::WorldTuning;
    use crate::interface_adapters::utils::clock::ManualClock;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const SELF_POS: Vec3 = Vec3::new(0.0, 1.0, 0.0);

    struct Fixture {
        tuning: HostileTuning,
        world: CollisionWorld,
        bounds: WorldBounds,
        clock: ManualClock,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                tuning: HostileTuning::enemy(),
                world: CollisionWorld::default(),
                bounds: WorldTuning::default().bounds(),
                clock: ManualClock::new(10_000),
            }
        }

        fn ctx(&self, target: Vec3, health_fraction: f32) -> AiContext<'_> {
            AiContext {
                position: SELF_POS,
                health_fraction,
                target,
                tuning: &self.tuning,
                world: &self.world,
                bounds: &self.bounds,
                wall_margin: 5.0,
                clock: &self.clock,
            }
        }
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn when_distance_varies_then_base_state_follows_ranges() {
        assert_eq!(base_state(7.0, 8.0, 15.0), AiState::Attack);
        assert_eq!(base_state(12.0, 8.0, 15.0), AiState::Chase);
        assert_eq!(base_state(20.0, 8.0, 15.0), AiState::Patrol);
        assert_eq!(base_state(8.0, 8.0, 15.0), AiState::Attack);
        assert_eq!(base_state(15.0, 8.0, 15.0), AiState::Chase);
    }

    #[test]
    fn when_health_is_gone_then_controller_stays_dead_and_still() {
        let fx = Fixture::new();
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -3.0), 0.0), &mut rng);
        assert_eq!(decision.state, AiState::Dead);
        assert_eq!(decision.desired_velocity(), Vec3::ZERO);
        assert!(decision.attack.is_none());

        let again = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -3.0), 1.0), &mut rng);
        assert_eq!(again.state, AiState::Dead);
    }

    #[test]
    fn when_target_is_in_range_with_clear_sight_then_attack_is_issued_once_per_cooldown() {
        let fx = Fixture::new();
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);
        let target = Vec3::new(0.0, 1.0, -7.0);

        let first = ai.update(&fx.ctx(target, 1.0), &mut rng);
        assert_eq!(first.state, AiState::Attack);
        let attack = first.attack.expect("attack");
        assert_eq!(attack.muzzle, SELF_POS + Vec3::Y * 0.5);
        assert!((attack.direction.length() - 1.0).abs() < 1e-5);
        assert!((first.direction.length() - 0.3).abs() < 1e-5);
        assert_eq!(first.speed, fx.tuning.patrol_speed);
        assert!(!first.melee);

        fx.clock.set(11_000);
        assert!(ai.update(&fx.ctx(target, 1.0), &mut rng).attack.is_none());

        fx.clock.set(11_500);
        assert!(ai.update(&fx.ctx(target, 1.0), &mut rng).attack.is_some());
    }

    #[test]
    fn when_line_of_sight_is_blocked_then_no_attack_is_issued() {
        let mut fx = Fixture::new();
        fx.world.add_static_obstacle(Vec3::new(0.0, 1.0, -4.0), 2.0);
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -7.0), 1.0), &mut rng);

        assert_eq!(decision.state, AiState::Attack);
        assert!(decision.attack.is_none());
    }

    #[test]
    fn when_target_is_moving_then_shot_leads_it() {
        let fx = Fixture::new();
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);

        // First sighting fires straight at the target.
        let first = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -6.0), 1.0), &mut rng);
        assert_eq!(first.attack.map(|a| a.aim_point), Some(Vec3::new(0.0, 1.0, -6.0)));

        fx.clock.set(12_000);
        let moved = Vec3::new(2.0, 1.0, -6.0);
        let second = ai.update(&fx.ctx(moved, 1.0), &mut rng);

        let aim = second.attack.expect("attack").aim_point;
        let expected_lead = SELF_POS.distance(moved) / fx.tuning.projectile_speed;
        assert!((aim.x - (2.0 + expected_lead)).abs() < 1e-4, "aim {aim:?}");
        assert_eq!(aim.z, -6.0);
    }

    #[test]
    fn when_target_is_within_melee_reach_then_melee_is_flagged() {
        let fx = Fixture::new();
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -1.5), 1.0), &mut rng);

        assert_eq!(decision.state, AiState::Attack);
        assert!(decision.melee);
    }

    #[test]
    fn when_health_is_low_and_no_cover_exists_then_actor_retreats_away() {
        let fx = Fixture::new();
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -6.0), 0.2), &mut rng);

        assert_eq!(decision.state, AiState::Chase);
        assert!(decision.overrides.retreating);
        assert!(!decision.overrides.seeking_cover);
        assert!(decision.attack.is_none());
        assert!((decision.direction - Vec3::Z).length() < 1e-5);
        assert_eq!(decision.speed, fx.tuning.chase_speed);
    }

    #[test]
    fn when_recently_damaged_and_cover_is_near_then_actor_moves_to_cover() {
        let mut fx = Fixture::new();
        fx.world.add_static_obstacle(Vec3::new(5.0, 1.0, 0.0), 2.0);
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);
        ai.notify_damaged(9_900);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -10.0), 0.8), &mut rng);

        assert_eq!(decision.state, AiState::Chase);
        assert!(decision.overrides.seeking_cover);
        assert!((decision.direction - Vec3::X).length() < 1e-5);
    }

    #[test]
    fn when_damage_is_old_then_cover_is_not_sought() {
        let mut fx = Fixture::new();
        fx.world.add_static_obstacle(Vec3::new(5.0, 1.0, 0.0), 2.0);
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);
        ai.notify_damaged(7_000);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -10.0), 0.8), &mut rng);

        assert!(!decision.overrides.seeking_cover);
    }

    #[test]
    fn when_target_is_far_and_flank_is_open_then_approach_is_angled() {
        let fx = Fixture::new();
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -14.0), 1.0), &mut rng);

        assert_eq!(decision.state, AiState::Chase);
        assert!(decision.overrides.flanking);
        assert!((decision.direction.dot(Vec3::NEG_Z) - 0.5).abs() < 1e-4);
        assert!((decision.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn when_chase_lookahead_is_blocked_then_direction_bends_sideways() {
        let mut fx = Fixture::new();
        fx.world.add_static_obstacle(Vec3::new(0.0, 1.0, -2.0), 1.0);
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -10.0), 1.0), &mut rng);

        assert_eq!(decision.state, AiState::Chase);
        assert!(!decision.overrides.flanking);
        assert!(decision.direction.x.abs() > 0.2);
        assert!(decision.direction.z < 0.0);
        assert!((decision.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn when_patrolling_then_waypoint_stays_inside_margin_and_away_from_actor() {
        let fx = Fixture::new();
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -40.0), 1.0), &mut rng);

        assert_eq!(decision.state, AiState::Patrol);
        assert_eq!(decision.speed, fx.tuning.patrol_speed);
        let waypoint = ai.waypoint().expect("waypoint");
        assert!(waypoint.x.abs() <= 70.0 && waypoint.z.abs() <= 70.0);
        assert!(flat_distance(SELF_POS, waypoint) > 3.0);
        assert!((decision.direction.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn when_every_pick_is_too_close_then_fallback_point_is_used() {
        let fx = Fixture {
            bounds: WorldBounds {
                half_extent: 6.0,
                min_y: -5.0,
                max_y: 50.0,
            },
            ..Fixture::new()
        };
        let mut rng = rng();
        // Margin 5 leaves a 1-unit square, so every random pick is within 3 units.
        let waypoint = pick_waypoint(&fx.ctx(Vec3::new(0.0, 1.0, -40.0), 1.0), &mut rng);

        assert!(waypoint.x.abs() <= 1.0 && waypoint.z.abs() <= 1.0);
    }

    #[test]
    fn when_world_extent_is_infinite_then_patrol_still_picks_a_finite_waypoint() {
        let fx = Fixture {
            bounds: WorldBounds {
                half_extent: f32::INFINITY,
                min_y: -5.0,
                max_y: 50.0,
            },
            ..Fixture::new()
        };
        let mut rng = rng();
        let mut ai = AiController::new(&mut rng);

        let decision = ai.update(&fx.ctx(Vec3::new(0.0, 1.0, -40.0), 1.0), &mut rng);

        assert_eq!(decision.state, AiState::Patrol);
        let waypoint = ai.waypoint().expect("waypoint");
        assert!(waypoint.is_finite());
        assert!(decision.direction.is_finite());
    }
}
