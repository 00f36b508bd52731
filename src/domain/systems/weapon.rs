// Weapon contract and the magazine-fed rifle carried by the player.

use crate::domain::geometry::direction_or_zero;
use crate::domain::ports::{Clock, cooldown_elapsed};
use crate::domain::state::{Faction, WeaponSnapshot};
use crate::domain::systems::projectiles::ProjectileSpawn;
use crate::domain::tuning::WeaponTuning;
use glam::Vec3;
use tracing::debug;

/// Contract every player weapon implements.
///
/// All timing is read from the injected clock; the weapon keeps no frame counters.
pub trait Weapon: Send + std::fmt::Debug {
    /// Advances timers (reload completion, auto-reload).
    fn tick(&mut self, clock: &dyn Clock);

    /// Tries to fire from `eye` along `aim`. Returns the projectile to spawn on success.
    fn request_fire(&mut self, clock: &dyn Clock, eye: Vec3, aim: Vec3) -> Option<ProjectileSpawn>;

    /// Tries to start a reload. Returns true if a reload started.
    fn request_reload(&mut self, clock: &dyn Clock) -> bool;

    /// Restores the spawn loadout.
    fn reset(&mut self);

    fn snapshot(&self, clock: &dyn Clock) -> WeaponSnapshot;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    Ready,
    Reloading { started_ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeaponLoadout {
    pub ammo_in_magazine: u32,
    pub magazines_in_reserve: u32,
    pub capacity: u32,
}

impl WeaponLoadout {
    fn full(tuning: &WeaponTuning) -> Self {
        Self {
            ammo_in_magazine: tuning.capacity,
            magazines_in_reserve: tuning.reserve_magazines,
            capacity: tuning.capacity,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MagazineWeapon {
    tuning: WeaponTuning,
    faction: Faction,
    loadout: WeaponLoadout,
    reload: ReloadState,
    last_shot_ms: Option<u64>,
}

impl MagazineWeapon {
    pub fn new(tuning: WeaponTuning, faction: Faction) -> Self {
        Self {
            tuning,
            faction,
            loadout: WeaponLoadout::full(&tuning),
            reload: ReloadState::Ready,
            last_shot_ms: None,
        }
    }

    /// Starts from an explicit loadout instead of a full one.
    pub fn with_loadout(mut self, loadout: WeaponLoadout) -> Self {
        self.loadout = WeaponLoadout {
            ammo_in_magazine: loadout.ammo_in_magazine.min(loadout.capacity),
            ..loadout
        };
        self
    }

    pub fn loadout(&self) -> WeaponLoadout {
        self.loadout
    }

    pub fn reload_state(&self) -> ReloadState {
        self.reload
    }

    pub fn is_reloading(&self) -> bool {
        matches!(self.reload, ReloadState::Reloading { .. })
    }

    fn can_reload(&self) -> bool {
        !self.is_reloading()
            && self.loadout.magazines_in_reserve > 0
            && self.loadout.ammo_in_magazine < self.loadout.capacity
    }

    fn start_reload(&mut self, now_ms: u64) {
        self.reload = ReloadState::Reloading { started_ms: now_ms };
        debug!(
            reserve = self.loadout.magazines_in_reserve,
            "reload started"
        );
    }

    fn finish_reload_if_due(&mut self, now_ms: u64) {
        if let ReloadState::Reloading { started_ms } = self.reload {
            if now_ms.saturating_sub(started_ms) >= self.tuning.reload_ms {
                self.loadout.ammo_in_magazine = self.loadout.capacity;
                self.loadout.magazines_in_reserve = self.loadout.magazines_in_reserve.saturating_sub(1);
                self.reload = ReloadState::Ready;
                debug!(
                    reserve = self.loadout.magazines_in_reserve,
                    "reload finished"
                );
            }
        }
    }

    fn auto_reload(&mut self, now_ms: u64) {
        if self.loadout.ammo_in_magazine == 0 && self.can_reload() {
            self.start_reload(now_ms);
        }
    }
}

impl Weapon for MagazineWeapon {
    fn tick(&mut self, clock: &dyn Clock) {
        let now = clock.now_ms();
        self.finish_reload_if_due(now);
        self.auto_reload(now);
    }

    fn request_fire(&mut self, clock: &dyn Clock, eye: Vec3, aim: Vec3) -> Option<ProjectileSpawn> {
        let now = clock.now_ms();
        self.finish_reload_if_due(now);

        if self.is_reloading() || self.loadout.ammo_in_magazine == 0 {
            return None;
        }
        if !cooldown_elapsed(self.last_shot_ms, now, self.tuning.fire_cooldown_ms) {
            return None;
        }
        let direction = direction_or_zero(aim);
        if direction == Vec3::ZERO {
            return None;
        }

        self.loadout.ammo_in_magazine -= 1;
        self.last_shot_ms = Some(now);
        self.auto_reload(now);

        Some(ProjectileSpawn {
            origin: eye + direction * self.tuning.muzzle_offset,
            direction,
            speed: self.tuning.projectile_speed,
            damage: self.tuning.damage,
            faction: self.faction,
        })
    }

    fn request_reload(&mut self, clock: &dyn Clock) -> bool {
        if !self.can_reload() {
            return false;
        }
        self.start_reload(clock.now_ms());
        true
    }

    fn reset(&mut self) {
        self.loadout = WeaponLoadout::full(&self.tuning);
        self.reload = ReloadState::Ready;
        self.last_shot_ms = None;
    }

    fn snapshot(&self, clock: &dyn Clock) -> WeaponSnapshot {
        let now = clock.now_ms();
        let fire_cooldown_remaining_ms = self
            .last_shot_ms
            .map(|last| self.tuning.fire_cooldown_ms.saturating_sub(now.saturating_sub(last)))
            .unwrap_or(0);
        let reload_progress = match self.reload {
            ReloadState::Ready => 0.0,
            ReloadState::Reloading { .. } if self.tuning.reload_ms == 0 => 1.0,
            ReloadState::Reloading { started_ms } => {
                (now.saturating_sub(started_ms) as f32 / self.tuning.reload_ms as f32).min(1.0)
            }
        };

        WeaponSnapshot {
            ammo_in_magazine: self.loadout.ammo_in_magazine,
            magazines_in_reserve: self.loadout.magazines_in_reserve,
            capacity: self.loadout.capacity,
            fire_cooldown_remaining_ms,
            reloading: self.is_reloading(),
            reload_progress,
        }
    }
}
