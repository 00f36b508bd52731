// Per-tick orchestration: the fixed update order, actor lifecycle and damage arbitration.

use super::types::{SessionState, TickOutput, WorldSnapshot};
use crate::domain::collision::CollisionWorld;
use crate::domain::events::SimEvent;
use crate::domain::geometry::{direction_or_zero, finite_or_zero};
use crate::domain::kinematics::{MovementConfig, snap_to_ground, step_body};
use crate::domain::level::Level;
use crate::domain::ports::Clock;
use crate::domain::state::{Actor, ActorKind, ActorSnapshot, Faction, InputIntent};
use crate::domain::systems::ai::{AiContext, AiController, AiDecision};
use crate::domain::systems::damage::PlayerDamageGate;
use crate::domain::systems::projectiles::{
    HitTarget, ProjectileHit, ProjectileSpawn, ProjectileSystem,
};
use crate::domain::systems::weapon::{MagazineWeapon, Weapon};
use crate::domain::tuning::{
    HostileTuning, PlayerTuning, ProjectileTuning, WeaponTuning, WorldBounds, WorldTuning,
};
use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;
use tracing::{debug, info};

/// Everything a session is tuned with. Loaded from TOML by the frameworks layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Longest simulated step in seconds; longer frames are clamped to it.
    pub dt_ceiling: f32,

    /// Enemies farther than this from the player are not updated.
    pub activity_radius: f32,

    /// Global cooldown between two damage applications to the player.
    pub player_damage_cooldown_ms: u64,

    /// Boss spawn point relative to the player.
    pub boss_offset: [f32; 3],

    /// Enemies spawned at session start, capped by the level's spawn points.
    pub enemy_count: usize,

    // Tables stay after the scalar fields so the settings serialize as TOML.
    pub player: PlayerTuning,
    pub enemy: HostileTuning,
    pub boss: HostileTuning,
    pub weapon: WeaponTuning,
    pub projectile: ProjectileTuning,
    pub world: WorldTuning,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            player: PlayerTuning::default(),
            enemy: HostileTuning::enemy(),
            boss: HostileTuning::boss(),
            weapon: WeaponTuning::default(),
            projectile: ProjectileTuning::default(),
            world: WorldTuning::default(),
            dt_ceiling: 0.1,
            activity_radius: 50.0,
            player_damage_cooldown_ms: 500,
            boss_offset: [20.0, 0.0, 20.0],
            enemy_count: 4,
        }
    }
}

/// An AI-driven actor: an enemy or the boss.
#[derive(Debug, Clone)]
pub struct Hostile {
    pub actor: Actor,
    pub ai: AiController,
}

impl Hostile {
    fn snapshot(&self) -> ActorSnapshot {
        ActorSnapshot {
            ai_state: Some(self.ai.state()),
            ai_overrides: self.ai.overrides(),
            ..ActorSnapshot::from(&self.actor)
        }
    }
}

/// Clamps a raw frame time into `[0, ceiling]`. Non-finite input counts as zero.
pub fn clamp_delta(raw_dt: f32, ceiling: f32) -> f32 {
    finite_or_zero(raw_dt).clamp(0.0, finite_or_zero(ceiling).max(0.0))
}

/// The boss appears once, when a roster that had enemies has none left.
pub fn should_spawn_boss(roster_len: usize, roster_seen: bool, boss_spawned: bool) -> bool {
    roster_len == 0 && roster_seen && !boss_spawned
}

/// One game session. Exactly one tick runs per call to [`Simulation::tick`]; nothing awaits.
pub struct Simulation<C: Clock> {
    settings: SimulationSettings,
    clock: C,
    rng: StdRng,
    level: Level,
    world: CollisionWorld,
    bounds: WorldBounds,
    player: Actor,
    yaw: f32,
    pitch: f32,
    weapon: Box<dyn Weapon>,
    projectiles: ProjectileSystem,
    enemies: Vec<Hostile>,
    boss: Option<Hostile>,
    boss_spawned: bool,
    /// The current roster was non-empty at some point.
    roster_seen: bool,
    damage_gate: PlayerDamageGate,
    state: SessionState,
    tick: u64,
    next_actor_id: u64,
}

/// Read-only surroundings shared by every hostile update in a tick.
struct Surroundings<'a> {
    world: &'a CollisionWorld,
    bounds: &'a WorldBounds,
    wall_margin: f32,
    clock: &'a dyn Clock,
    target: Vec3,
}

impl<C: Clock> Simulation<C> {
    pub fn new(settings: SimulationSettings, level: Level, clock: C, seed: u64) -> Self {
        let world = level.collision_world(settings.world.default_floor);
        info!(
            obstacles = world.len(),
            enemy_spawns = level.enemy_spawns.len(),
            seed,
            "simulation created"
        );

        let player = Actor::new(
            0,
            ActorKind::Player,
            level.player_spawn,
            settings.player.half_extents(),
            settings.player.max_health,
        );
        let mut sim = Self {
            bounds: settings.world.bounds(),
            weapon: Box::new(MagazineWeapon::new(settings.weapon, Faction::Player)),
            projectiles: ProjectileSystem::new(settings.projectile),
            damage_gate: PlayerDamageGate::new(settings.player_damage_cooldown_ms),
            rng: StdRng::seed_from_u64(seed),
            settings,
            clock,
            level,
            world,
            player,
            yaw: 0.0,
            pitch: 0.0,
            enemies: Vec::new(),
            boss: None,
            boss_spawned: false,
            roster_seen: false,
            state: SessionState::Running,
            tick: 0,
            next_actor_id: 1,
        };
        sim.reset_session();
        sim
    }

    /// Runs one tick in the fixed order and returns the committed snapshot plus events.
    ///
    /// While paused or after game over the state is left untouched and no events are
    /// produced.
    pub fn tick(&mut self, raw_dt: f32, input: InputIntent) -> TickOutput {
        let input = sanitize_input(input);
        if input.pause_toggle {
            self.toggle_pause();
        }
        if self.state != SessionState::Running {
            return TickOutput {
                snapshot: self.snapshot(),
                events: Vec::new(),
            };
        }

        let dt = clamp_delta(raw_dt, self.settings.dt_ceiling);
        let mut events = Vec::new();
        self.tick = self.tick.wrapping_add(1);

        self.step_player(dt, &input);
        self.step_weapon(&input, &mut events);
        self.step_projectiles(dt, &mut events);
        self.step_enemies(dt, &mut events);
        self.spawn_boss_if_cleared(&mut events);
        self.step_boss(dt, &mut events);
        self.check_player_death(&mut events);

        TickOutput {
            snapshot: self.snapshot(),
            events,
        }
    }

    /// Resets every subsystem to the level's starting layout.
    pub fn restart(&mut self) {
        self.reset_session();
        info!(enemies = self.enemies.len(), "session restarted");
    }

    pub fn snapshot(&self) -> WorldSnapshot {
        WorldSnapshot {
            tick: self.tick,
            state: self.state,
            player: ActorSnapshot::from(&self.player),
            yaw: self.yaw,
            pitch: self.pitch,
            enemies: self.enemies.iter().map(Hostile::snapshot).collect(),
            boss: self.boss.as_ref().map(Hostile::snapshot),
            projectiles: self.projectiles.snapshots(),
            weapon: self.weapon.snapshot(&self.clock),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn boss_spawned(&self) -> bool {
        self.boss_spawned
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn world(&self) -> &CollisionWorld {
        &self.world
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    fn reset_session(&mut self) {
        self.next_actor_id = 1;
        self.tick = 0;
        self.state = SessionState::Running;
        self.yaw = 0.0;
        self.pitch = 0.0;

        self.player = self.spawn_player();
        self.weapon.reset();
        self.projectiles.clear();
        self.damage_gate.reset();
        self.boss = None;
        self.boss_spawned = false;

        let spawns: Vec<Vec3> = self
            .level
            .enemy_spawns
            .iter()
            .copied()
            .take(self.settings.enemy_count)
            .collect();
        let enemies: Vec<Hostile> = spawns
            .into_iter()
            .map(|position| self.spawn_hostile(ActorKind::Enemy, position))
            .collect();
        self.enemies = enemies;
        self.roster_seen = !self.enemies.is_empty();
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_actor_id;
        self.next_actor_id = self.next_actor_id.wrapping_add(1);
        id
    }

    fn spawn_player(&mut self) -> Actor {
        let tuning = self.settings.player;
        let id = self.allocate_id();
        let mut player = Actor::new(
            id,
            ActorKind::Player,
            self.level.player_spawn,
            tuning.half_extents(),
            tuning.max_health,
        );
        snap_to_ground(&mut player.body, &self.world);
        player
    }

    fn spawn_hostile(&mut self, kind: ActorKind, position: Vec3) -> Hostile {
        let tuning = self.hostile_tuning(kind);
        let id = self.allocate_id();
        let mut actor = Actor::new(id, kind, position, tuning.half_extents(), tuning.max_health);
        snap_to_ground(&mut actor.body, &self.world);
        Hostile {
            actor,
            ai: AiController::new(&mut self.rng),
        }
    }

    fn hostile_tuning(&self, kind: ActorKind) -> HostileTuning {
        match kind {
            ActorKind::Boss => self.settings.boss,
            ActorKind::Enemy | ActorKind::Player => self.settings.enemy,
        }
    }

    fn toggle_pause(&mut self) {
        self.state = match self.state {
            SessionState::Running => SessionState::Paused,
            SessionState::Paused => SessionState::Running,
            SessionState::GameOver => SessionState::GameOver,
        };
        info!(state = ?self.state, "pause toggled");
    }

    /// Unit look direction from yaw and pitch.
    fn aim_direction(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    fn eye_position(&self) -> Vec3 {
        self.player.position() + Vec3::Y * self.settings.player.eye_offset
    }

    fn step_player(&mut self, dt: f32, input: &InputIntent) {
        let tuning = self.settings.player;
        self.yaw += input.look_yaw;
        self.pitch = (self.pitch + input.look_pitch).clamp(-FRAC_PI_2, FRAC_PI_2);

        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let forward = Vec3::new(-sin_yaw, 0.0, -cos_yaw);
        let right = Vec3::new(cos_yaw, 0.0, -sin_yaw);
        let wish = forward * input.move_forward + right * input.move_right;
        let desired = direction_or_zero(wish) * tuning.speed;

        let cfg = MovementConfig {
            gravity: tuning.gravity,
            jump_impulse: tuning.jump_impulse,
            friction: tuning.friction,
            bounds: self.bounds,
        };
        step_body(&mut self.player.body, desired, input.jump, dt, &self.world, &cfg);
        self.player.facing = self.yaw;
    }

    fn step_weapon(&mut self, input: &InputIntent, events: &mut Vec<SimEvent>) {
        self.weapon.tick(&self.clock);

        if input.reload_requested && self.weapon.request_reload(&self.clock) {
            debug!("reload requested");
        }

        if input.fire_held {
            let eye = self.eye_position();
            let aim = self.aim_direction();
            if let Some(spawn) = self.weapon.request_fire(&self.clock, eye, aim) {
                launch(&mut self.projectiles, spawn, events);
            }
        }
    }

    fn step_projectiles(&mut self, dt: f32, events: &mut Vec<SimEvent>) {
        let targets = self.hit_targets();
        let hits = self
            .projectiles
            .update(dt, &self.world, &self.bounds, &targets);
        for hit in hits {
            self.apply_hit(hit, events);
        }
    }

    /// Live actors in hit-test order: player, enemies, boss.
    fn hit_targets(&self) -> Vec<HitTarget> {
        let mut targets = Vec::with_capacity(self.enemies.len() + 2);
        if !self.player.is_dead() {
            targets.push(HitTarget {
                actor_id: self.player.id,
                faction: Faction::Player,
                position: self.player.position(),
                radius: self.settings.player.radius,
            });
        }
        let hostiles = self
            .enemies
            .iter()
            .map(|h| (h, self.settings.enemy.size))
            .chain(self.boss.iter().map(|h| (h, self.settings.boss.size)));
        for (hostile, radius) in hostiles {
            if hostile.actor.is_dead() {
                continue;
            }
            targets.push(HitTarget {
                actor_id: hostile.actor.id,
                faction: Faction::Hostile,
                position: hostile.actor.position(),
                radius,
            });
        }
        targets
    }

    fn apply_hit(&mut self, hit: ProjectileHit, events: &mut Vec<SimEvent>) {
        if hit.target_id == self.player.id {
            hurt_player(
                &mut self.player,
                &mut self.damage_gate,
                &self.clock,
                hit.damage,
                events,
            );
            return;
        }

        let now = self.clock.now_ms();
        let victim = self
            .enemies
            .iter_mut()
            .chain(self.boss.as_mut())
            .find(|h| h.actor.id == hit.target_id);
        if let Some(hostile) = victim {
            damage_hostile(hostile, hit.damage, now, events);
        }
    }

    fn step_enemies(&mut self, dt: f32, events: &mut Vec<SimEvent>) {
        let before = self.enemies.len();
        self.enemies.retain(|h| !h.actor.is_dead());
        if self.enemies.len() != before {
            debug!(
                removed = before - self.enemies.len(),
                remaining = self.enemies.len(),
                "dead enemies removed"
            );
        }

        let tuning = self.settings.enemy;
        let radius = self.settings.activity_radius;
        let env = Surroundings {
            world: &self.world,
            bounds: &self.bounds,
            wall_margin: self.settings.world.wall_margin,
            clock: &self.clock,
            target: self.player.position(),
        };

        for hostile in self.enemies.iter_mut() {
            if hostile.actor.position().distance(env.target) > radius {
                continue;
            }
            let decision = drive_hostile(hostile, &tuning, &env, dt, &mut self.rng);
            resolve_hostile_actions(
                &decision,
                &tuning,
                &mut self.projectiles,
                &mut self.player,
                &mut self.damage_gate,
                env.clock,
                events,
            );
        }
    }

    fn spawn_boss_if_cleared(&mut self, events: &mut Vec<SimEvent>) {
        if !should_spawn_boss(self.enemies.len(), self.roster_seen, self.boss_spawned) {
            return;
        }

        let offset = Vec3::from_array(self.settings.boss_offset);
        let margin = self.settings.boss.half_extents().x;
        let position = self
            .bounds
            .clamp_horizontal(self.player.position() + offset, margin);
        let boss = self.spawn_hostile(ActorKind::Boss, position);
        let (actor_id, position) = (boss.actor.id, boss.actor.position());

        info!(actor_id, x = position.x, z = position.z, "boss spawned");
        events.push(SimEvent::BossSpawned { actor_id, position });
        self.boss = Some(boss);
        self.boss_spawned = true;
    }

    fn step_boss(&mut self, dt: f32, events: &mut Vec<SimEvent>) {
        if self.boss.as_ref().is_some_and(|b| b.actor.is_dead()) {
            info!("boss removed");
            self.boss = None;
            return;
        }
        let Some(boss) = self.boss.as_mut() else {
            return;
        };

        let tuning = self.settings.boss;
        let env = Surroundings {
            world: &self.world,
            bounds: &self.bounds,
            wall_margin: self.settings.world.wall_margin,
            clock: &self.clock,
            target: self.player.position(),
        };
        let decision = drive_hostile(boss, &tuning, &env, dt, &mut self.rng);
        resolve_hostile_actions(
            &decision,
            &tuning,
            &mut self.projectiles,
            &mut self.player,
            &mut self.damage_gate,
            env.clock,
            events,
        );
    }

    fn check_player_death(&mut self, events: &mut Vec<SimEvent>) {
        if self.player.is_dead() {
            self.state = SessionState::GameOver;
            info!(tick = self.tick, "player died; game over");
            events.push(SimEvent::PlayerDied);
        }
    }
}

fn sanitize_input(input: InputIntent) -> InputIntent {
    InputIntent {
        move_forward: finite_or_zero(input.move_forward).clamp(-1.0, 1.0),
        move_right: finite_or_zero(input.move_right).clamp(-1.0, 1.0),
        look_yaw: finite_or_zero(input.look_yaw),
        look_pitch: finite_or_zero(input.look_pitch),
        ..input
    }
}

fn launch(projectiles: &mut ProjectileSystem, spawn: ProjectileSpawn, events: &mut Vec<SimEvent>) {
    if let Some(projectile_id) = projectiles.spawn(spawn) {
        events.push(SimEvent::ProjectileSpawned {
            projectile_id,
            faction: spawn.faction,
            origin: spawn.origin,
            direction: spawn.direction,
        });
    }
}

/// Applies damage and reports it. Returns true if this hit killed the actor.
fn apply_damage(actor: &mut Actor, amount: f32, events: &mut Vec<SimEvent>) -> bool {
    if actor.is_dead() {
        return false;
    }
    let applied = actor.health.take_damage(amount);
    events.push(SimEvent::ActorDamaged {
        actor_id: actor.id,
        kind: actor.kind,
        amount: applied,
        remaining: actor.health.current(),
    });
    actor.is_dead()
}

/// Every source of player damage goes through the shared gate.
fn hurt_player(
    player: &mut Actor,
    gate: &mut PlayerDamageGate,
    clock: &dyn Clock,
    amount: f32,
    events: &mut Vec<SimEvent>,
) {
    if player.is_dead() || !gate.try_admit(clock) {
        return;
    }
    apply_damage(player, amount, events);
}

fn damage_hostile(hostile: &mut Hostile, amount: f32, now_ms: u64, events: &mut Vec<SimEvent>) {
    hostile.ai.notify_damaged(now_ms);
    if apply_damage(&mut hostile.actor, amount, events) {
        hostile.ai.kill();
        let (actor_id, kind) = (hostile.actor.id, hostile.actor.kind);
        info!(actor_id, ?kind, "hostile killed");
        events.push(SimEvent::ActorDied { actor_id, kind });
    }
}

fn drive_hostile(
    hostile: &mut Hostile,
    tuning: &HostileTuning,
    env: &Surroundings<'_>,
    dt: f32,
    rng: &mut StdRng,
) -> AiDecision {
    let ctx = AiContext {
        position: hostile.actor.position(),
        health_fraction: hostile.actor.health.fraction(),
        target: env.target,
        tuning,
        world: env.world,
        bounds: env.bounds,
        wall_margin: env.wall_margin,
        clock: env.clock,
    };
    let decision = hostile.ai.update(&ctx, rng);

    let cfg = MovementConfig {
        gravity: tuning.gravity,
        jump_impulse: 0.0,
        friction: tuning.friction,
        bounds: *env.bounds,
    };
    step_body(
        &mut hostile.actor.body,
        decision.desired_velocity(),
        false,
        dt,
        env.world,
        &cfg,
    );
    hostile.actor.face_towards(env.target);
    decision
}

fn resolve_hostile_actions(
    decision: &AiDecision,
    tuning: &HostileTuning,
    projectiles: &mut ProjectileSystem,
    player: &mut Actor,
    gate: &mut PlayerDamageGate,
    clock: &dyn Clock,
    events: &mut Vec<SimEvent>,
) {
    if let Some(attack) = decision.attack {
        let spawn = ProjectileSpawn {
            origin: attack.muzzle,
            direction: attack.direction,
            speed: tuning.projectile_speed,
            damage: tuning.projectile_damage,
            faction: Faction::Hostile,
        };
        launch(projectiles, spawn, events);
    }
    if decision.melee {
        hurt_player(player, gate, clock, tuning.melee_damage, events);
    }
}
