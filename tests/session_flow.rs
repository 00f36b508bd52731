mod support;

use combat_core::domain::{ActorKind, InputIntent, SimEvent};
use combat_core::interface_adapters::utils::clock::ManualClock;
use combat_core::use_cases::{
    SessionCommand, SessionState, Simulation, SimulationSettings, TickOutput, session_task,
};
use glam::Vec3;
use std::{sync::Arc, time::Duration};
use support::{Harness, count_events, firing, open_level, pause_toggle};
use tokio::sync::{Notify, broadcast, mpsc, watch};

#[test]
fn when_last_enemy_is_shot_down_then_boss_spawns_once_in_the_same_tick() {
    let mut harness = Harness::new(
        SimulationSettings::default(),
        open_level(&[Vec3::new(0.0, 0.0, -5.0)]),
    );

    let outputs = harness.run(40, firing());

    let hits = count_events(&outputs, |e| {
        matches!(e, SimEvent::ActorDamaged { kind: ActorKind::Enemy, .. })
    });
    assert_eq!(hits, 2, "two 25-point hits take a 50-health enemy down");

    let death_tick = outputs
        .iter()
        .find(|o| {
            o.events
                .iter()
                .any(|e| matches!(e, SimEvent::ActorDied { kind: ActorKind::Enemy, .. }))
        })
        .expect("enemy should die");
    assert!(
        death_tick
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::BossSpawned { .. }))
    );
    assert!(death_tick.snapshot.enemies.is_empty());

    let boss = death_tick.snapshot.boss.as_ref().expect("boss in snapshot");
    assert_eq!(boss.kind, ActorKind::Boss);
    assert!((boss.max_health - 200.0).abs() < 1e-4);

    assert_eq!(
        count_events(&outputs, |e| matches!(e, SimEvent::BossSpawned { .. })),
        1
    );
    assert!(harness.sim.boss_spawned());
}

#[test]
fn when_boss_spawns_then_it_is_offset_from_the_player_and_grounded() {
    let mut harness = Harness::new(
        SimulationSettings::default(),
        open_level(&[Vec3::new(0.0, 0.0, -5.0)]),
    );

    let outputs = harness.run(40, firing());

    let position = outputs
        .iter()
        .flat_map(|o| o.events.iter())
        .find_map(|e| match e {
            SimEvent::BossSpawned { position, .. } => Some(*position),
            _ => None,
        })
        .expect("boss spawned");
    assert!((position.x - 20.0).abs() < 1e-3);
    assert!((position.z - 20.0).abs() < 1e-3);
    assert!((position.y - 1.5).abs() < 1e-3, "boss rests on the floor");
}

#[test]
fn when_enemy_is_beyond_activity_radius_then_it_does_not_move() {
    let far = Vec3::new(0.0, 0.0, -60.0);
    let mut harness = Harness::new(SimulationSettings::default(), open_level(&[far]));
    let start = harness.sim.snapshot().enemies[0].position;

    let outputs = harness.run(20, InputIntent::default());

    let last = outputs.last().expect("ticks ran");
    assert_eq!(last.snapshot.enemies.len(), 1);
    assert_eq!(last.snapshot.enemies[0].position, start);
    assert_eq!(
        count_events(&outputs, |e| matches!(e, SimEvent::ProjectileSpawned { .. })),
        0
    );
}

#[test]
fn when_session_is_paused_then_ticks_change_nothing_until_resumed() {
    let mut harness = Harness::new(
        SimulationSettings::default(),
        open_level(&[Vec3::new(0.0, 0.0, -5.0)]),
    );
    harness.run(3, InputIntent::default());
    let before = harness.sim.snapshot();

    let paused = harness.step(pause_toggle());
    assert_eq!(paused.snapshot.state, SessionState::Paused);
    let idle = harness.run(10, firing());
    assert!(idle.iter().all(|o| o.events.is_empty()));
    assert_eq!(harness.sim.tick_count(), before.tick);
    assert_eq!(harness.sim.snapshot().enemies, before.enemies);
    assert_eq!(harness.sim.snapshot().projectiles, before.projectiles);

    let resumed = harness.step(pause_toggle());
    assert_eq!(resumed.snapshot.state, SessionState::Running);
    assert_eq!(resumed.snapshot.tick, before.tick + 1);
}

#[test]
fn when_player_dies_then_game_over_freezes_the_session_until_restart() {
    let mut settings = SimulationSettings::default();
    settings.player.max_health = 5.0;
    let mut harness = Harness::new(settings, open_level(&[Vec3::new(0.0, 0.0, -1.5)]));

    let first = harness.step(InputIntent::default());
    assert!(first.events.contains(&SimEvent::PlayerDied));
    assert_eq!(first.snapshot.state, SessionState::GameOver);
    assert_eq!(first.snapshot.player.health, 0.0);

    let frozen = harness.run(5, firing());
    assert!(frozen.iter().all(|o| o.events.is_empty()));
    assert_eq!(harness.sim.tick_count(), 1);

    // Pause cannot leave game over.
    harness.step(pause_toggle());
    assert_eq!(harness.sim.state(), SessionState::GameOver);

    harness.sim.restart();
    let snapshot = harness.sim.snapshot();
    assert_eq!(snapshot.state, SessionState::Running);
    assert_eq!(snapshot.tick, 0);
    assert_eq!(snapshot.player.health, 5.0);
    assert_eq!(snapshot.enemies.len(), 1);
    assert!(snapshot.boss.is_none());
    assert!(snapshot.projectiles.is_empty());
    assert_eq!(snapshot.weapon.ammo_in_magazine, snapshot.weapon.capacity);
}

#[test]
fn when_frame_time_is_huge_then_the_step_is_clamped() {
    let mut harness = Harness::new(SimulationSettings::default(), open_level(&[]));
    harness.clock.advance(5_000);

    let output = harness.sim.tick(5.0, firing());

    assert_eq!(output.snapshot.projectiles.len(), 1);
    let bullet = &output.snapshot.projectiles[0];
    // Muzzle sits half a unit ahead of the eye; one clamped step covers 50 * 0.1.
    assert!((bullet.position.z - (-5.5)).abs() < 1e-3, "z = {}", bullet.position.z);
    assert!((bullet.position.y - 1.6).abs() < 1e-3);
}

#[test]
fn when_level_has_no_enemies_then_boss_never_spawns() {
    let mut harness = Harness::new(SimulationSettings::default(), open_level(&[]));

    let outputs = harness.run(30, InputIntent::default());

    assert!(outputs.iter().all(|o| o.snapshot.boss.is_none()));
    assert!(!harness.sim.boss_spawned());
}

#[tokio::test]
async fn when_restart_is_sent_to_a_paused_session_task_then_it_runs_from_scratch() {
    let clock = Arc::new(ManualClock::new(0));
    let sim = Simulation::new(
        SimulationSettings::default(),
        open_level(&[Vec3::new(0.0, 0.0, -60.0)]),
        clock,
        3,
    );

    let (input_tx, input_rx) = mpsc::channel(16);
    let (world_tx, mut world_rx) = broadcast::channel::<TickOutput>(256);
    let (state_tx, mut state_rx) = watch::channel(SessionState::Running);
    let shutdown = Arc::new(Notify::new());

    let task = tokio::spawn(session_task(
        sim,
        input_rx,
        world_tx,
        state_tx,
        Duration::from_millis(5),
        shutdown.clone(),
        None,
    ));

    input_tx
        .send(SessionCommand::Input(pause_toggle()))
        .await
        .expect("send pause");
    tokio::time::timeout(
        Duration::from_secs(2),
        state_rx.wait_for(|s| *s == SessionState::Paused),
    )
    .await
    .expect("paused in time")
    .expect("state channel open");

    input_tx.send(SessionCommand::Restart).await.expect("send restart");
    tokio::time::timeout(
        Duration::from_secs(2),
        state_rx.wait_for(|s| *s == SessionState::Running),
    )
    .await
    .expect("running again in time")
    .expect("state channel open");

    shutdown.notify_one();
    let sim = tokio::time::timeout(Duration::from_secs(2), task)
        .await
        .expect("session stops")
        .expect("session task");

    assert!(world_rx.try_recv().is_ok(), "ticks were broadcast");
    assert_eq!(sim.state(), SessionState::Running);
    assert_eq!(sim.snapshot().enemies.len(), 1);
}
