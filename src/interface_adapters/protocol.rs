// JSON DTOs for world updates and input intents, and conversions from domain types.

use crate::domain::systems::ai::AiState;
use crate::domain::{
    ActorKind, ActorSnapshot, Faction, InputIntent, ProjectileSnapshot, SimEvent, WeaponSnapshot,
};
use crate::use_cases::{SessionCommand, SessionState, TickOutput};
use serde::{Deserialize, Serialize};

/// Messages the runtime publishes for presentation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum ServerMessage {
    // Snapshot of the session after a tick, with that tick's events.
    WorldUpdate(WorldUpdateDto),
    // Session lifecycle transitions (running, paused, game over).
    GameState(SessionStateDto),
}

/// Messages an input source sends to the session.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    Input(InputIntentDto),
    Restart,
}

impl From<ClientMessage> for SessionCommand {
    fn from(message: ClientMessage) -> Self {
        match message {
            ClientMessage::Input(input) => SessionCommand::Input(input.into()),
            ClientMessage::Restart => SessionCommand::Restart,
        }
    }
}

/// Per-tick input payload. Missing fields mean "no input".
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InputIntentDto {
    pub move_forward: f32,
    pub move_right: f32,
    pub look_yaw: f32,
    pub look_pitch: f32,
    pub jump: bool,
    pub fire: bool,
    pub reload: bool,
    pub pause: bool,
}

impl From<InputIntentDto> for InputIntent {
    fn from(input: InputIntentDto) -> Self {
        Self {
            move_forward: input.move_forward,
            move_right: input.move_right,
            look_yaw: input.look_yaw,
            look_pitch: input.look_pitch,
            jump: input.jump,
            fire_held: input.fire,
            reload_requested: input.reload,
            pause_toggle: input.pause,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStateDto {
    Running,
    Paused,
    GameOver,
}

impl From<SessionState> for SessionStateDto {
    fn from(state: SessionState) -> Self {
        match state {
            SessionState::Running => SessionStateDto::Running,
            SessionState::Paused => SessionStateDto::Paused,
            SessionState::GameOver => SessionStateDto::GameOver,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorKindDto {
    Player,
    Enemy,
    Boss,
}

impl From<ActorKind> for ActorKindDto {
    fn from(kind: ActorKind) -> Self {
        match kind {
            ActorKind::Player => ActorKindDto::Player,
            ActorKind::Enemy => ActorKindDto::Enemy,
            ActorKind::Boss => ActorKindDto::Boss,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactionDto {
    Player,
    Hostile,
}

impl From<Faction> for FactionDto {
    fn from(faction: Faction) -> Self {
        match faction {
            Faction::Player => FactionDto::Player,
            Faction::Hostile => FactionDto::Hostile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiStateDto {
    Patrol,
    Chase,
    Attack,
    Dead,
}

impl From<AiState> for AiStateDto {
    fn from(state: AiState) -> Self {
        match state {
            AiState::Patrol => AiStateDto::Patrol,
            AiState::Chase => AiStateDto::Chase,
            AiState::Attack => AiStateDto::Attack,
            AiState::Dead => AiStateDto::Dead,
        }
    }
}

/// Snapshot of the session sent after each tick.
#[derive(Debug, Clone, Serialize)]
pub struct WorldUpdateDto {
    pub tick: u64,
    pub state: SessionStateDto,
    pub player: ActorStateDto,
    pub yaw: f32,
    pub pitch: f32,
    pub enemies: Vec<ActorStateDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boss: Option<ActorStateDto>,
    pub projectiles: Vec<ProjectileStateDto>,
    pub weapon: WeaponStateDto,
    pub events: Vec<EventDto>,
}

impl From<&TickOutput> for WorldUpdateDto {
    fn from(output: &TickOutput) -> Self {
        let snapshot = &output.snapshot;
        Self {
            tick: snapshot.tick,
            state: snapshot.state.into(),
            player: ActorStateDto::from(&snapshot.player),
            yaw: snapshot.yaw,
            pitch: snapshot.pitch,
            enemies: snapshot.enemies.iter().map(ActorStateDto::from).collect(),
            boss: snapshot.boss.as_ref().map(ActorStateDto::from),
            projectiles: snapshot
                .projectiles
                .iter()
                .map(ProjectileStateDto::from)
                .collect(),
            weapon: WeaponStateDto::from(&snapshot.weapon),
            events: output.events.iter().map(EventDto::from).collect(),
        }
    }
}

/// Flattened actor state for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct ActorStateDto {
    pub id: u64,
    pub kind: ActorKindDto,
    pub position: [f32; 3],
    pub velocity: [f32; 3],
    pub facing: f32,
    pub health: f32,
    pub max_health: f32,
    pub grounded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_state: Option<AiStateDto>,
    pub seeking_cover: bool,
    pub flanking: bool,
    pub retreating: bool,
}

impl From<&ActorSnapshot> for ActorStateDto {
    fn from(actor: &ActorSnapshot) -> Self {
        Self {
            id: actor.id,
            kind: actor.kind.into(),
            position: actor.position.to_array(),
            velocity: actor.velocity.to_array(),
            facing: actor.facing,
            health: actor.health,
            max_health: actor.max_health,
            grounded: actor.grounded,
            ai_state: actor.ai_state.map(AiStateDto::from),
            seeking_cover: actor.ai_overrides.seeking_cover,
            flanking: actor.ai_overrides.flanking,
            retreating: actor.ai_overrides.retreating,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectileStateDto {
    pub id: u64,
    pub faction: FactionDto,
    pub position: [f32; 3],
    pub direction: [f32; 3],
}

impl From<&ProjectileSnapshot> for ProjectileStateDto {
    fn from(projectile: &ProjectileSnapshot) -> Self {
        Self {
            id: projectile.id,
            faction: projectile.faction.into(),
            position: projectile.position.to_array(),
            direction: projectile.direction.to_array(),
        }
    }
}

/// HUD view of the player's weapon.
#[derive(Debug, Clone, Serialize)]
pub struct WeaponStateDto {
    pub ammo: u32,
    pub reserve_magazines: u32,
    pub capacity: u32,
    pub cooldown_ms: u64,
    pub reloading: bool,
    pub reload_progress: f32,
}

impl From<&WeaponSnapshot> for WeaponStateDto {
    fn from(weapon: &WeaponSnapshot) -> Self {
        Self {
            ammo: weapon.ammo_in_magazine,
            reserve_magazines: weapon.magazines_in_reserve,
            capacity: weapon.capacity,
            cooldown_ms: weapon.fire_cooldown_remaining_ms,
            reloading: weapon.reloading,
            reload_progress: weapon.reload_progress,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDto {
    ProjectileSpawned {
        projectile_id: u64,
        faction: FactionDto,
        origin: [f32; 3],
        direction: [f32; 3],
    },
    ActorDamaged {
        actor_id: u64,
        actor_kind: ActorKindDto,
        amount: f32,
        remaining: f32,
    },
    ActorDied {
        actor_id: u64,
        actor_kind: ActorKindDto,
    },
    BossSpawned {
        actor_id: u64,
        position: [f32; 3],
    },
    PlayerDied,
}

impl From<&SimEvent> for EventDto {
    fn from(event: &SimEvent) -> Self {
        match *event {
            SimEvent::ProjectileSpawned {
                projectile_id,
                faction,
                origin,
                direction,
            } => EventDto::ProjectileSpawned {
                projectile_id,
                faction: faction.into(),
                origin: origin.to_array(),
                direction: direction.to_array(),
            },
            SimEvent::ActorDamaged {
                actor_id,
                kind,
                amount,
                remaining,
            } => EventDto::ActorDamaged {
                actor_id,
                actor_kind: kind.into(),
                amount,
                remaining,
            },
            SimEvent::ActorDied { actor_id, kind } => EventDto::ActorDied {
                actor_id,
                actor_kind: kind.into(),
            },
            SimEvent::BossSpawned { actor_id, position } => EventDto::BossSpawned {
                actor_id,
                position: position.to_array(),
            },
            SimEvent::PlayerDied => EventDto::PlayerDied,
        }
    }
}
