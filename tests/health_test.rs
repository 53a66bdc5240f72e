//! Health ledger behavior through a headless app: clamping, the
//! exactly-once death transition, silent full-health heals, revival, and
//! invulnerability windows.

use std::time::Duration;

use bevy::prelude::*;

use slime_hunter::health::{
    DamageEvent, DamageIntakePolicy, DamageTakenEvent, DeathEvent, HealEvent, HealedEvent, Health,
    HitInvulnerability, Invulnerable, ReviveEvent, RevivedEvent,
};
use slime_hunter::SimulationPlugin;

/// Tallies of every notification the ledger emits, captured by observers.
#[derive(Resource, Default)]
struct Tally {
    damage_taken: Vec<i32>,
    healed: Vec<i32>,
    deaths: usize,
    revives: usize,
}

fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins(SimulationPlugin);
    app.insert_resource(Time::<()>::default());
    app.init_resource::<Tally>();
    app.add_observer(|on: On<DamageTakenEvent>, mut tally: ResMut<Tally>| {
        tally.damage_taken.push(on.amount);
    });
    app.add_observer(|on: On<HealedEvent>, mut tally: ResMut<Tally>| {
        tally.healed.push(on.amount);
    });
    app.add_observer(|_: On<DeathEvent>, mut tally: ResMut<Tally>| {
        tally.deaths += 1;
    });
    app.add_observer(|_: On<RevivedEvent>, mut tally: ResMut<Tally>| {
        tally.revives += 1;
    });
    app
}

fn advance(app: &mut App, secs: f32) {
    app.world_mut()
        .resource_mut::<Time>()
        .advance_by(Duration::from_secs_f32(secs));
    app.update();
}

fn health_of(app: &App, entity: Entity) -> &Health {
    app.world().get::<Health>(entity).expect("entity has Health")
}

#[test]
fn damage_clamps_and_death_fires_exactly_once() {
    let mut app = test_app();
    let target = app.world_mut().spawn(Health::new(100)).id();

    app.world_mut().trigger(DamageEvent { target, amount: 30 });
    assert_eq!(health_of(&app, target).current, 70);
    assert!(!health_of(&app, target).is_dead());

    // Overkill clamps to zero, dies once.
    app.world_mut().trigger(DamageEvent { target, amount: 80 });
    assert_eq!(health_of(&app, target).current, 0);
    assert!(health_of(&app, target).is_dead());
    assert_eq!(app.world().resource::<Tally>().deaths, 1);

    // Further damage and heals are no-ops on the dead.
    app.world_mut().trigger(DamageEvent { target, amount: 50 });
    app.world_mut().trigger(HealEvent { target, amount: 50 });
    assert_eq!(health_of(&app, target).current, 0);
    assert_eq!(app.world().resource::<Tally>().deaths, 1);
    assert!(app.world().resource::<Tally>().healed.is_empty());
}

#[test]
fn intake_floor_applies_per_entity() {
    let mut app = test_app();
    // Player-style: at least 1 per hit.
    let floored = app
        .world_mut()
        .spawn((Health::new(100), DamageIntakePolicy { minimum: 1 }))
        .id();
    // Enemy-style: raw amounts, zero allowed.
    let raw = app
        .world_mut()
        .spawn((Health::new(100), DamageIntakePolicy { minimum: 0 }))
        .id();

    app.world_mut().trigger(DamageEvent {
        target: floored,
        amount: 0,
    });
    app.world_mut().trigger(DamageEvent {
        target: raw,
        amount: 0,
    });

    assert_eq!(health_of(&app, floored).current, 99);
    assert_eq!(health_of(&app, raw).current, 100);
    // Both hits were "taken" — one for 1, one for 0.
    assert_eq!(app.world().resource::<Tally>().damage_taken, vec![1, 0]);
}

#[test]
fn heal_clamps_and_full_health_heal_is_silent() {
    let mut app = test_app();
    let target = app.world_mut().spawn(Health::new(100)).id();

    app.world_mut().trigger(DamageEvent { target, amount: 60 });
    // Requested 80, only 60 missing: actual applied amount is notified.
    app.world_mut().trigger(HealEvent { target, amount: 80 });
    assert_eq!(health_of(&app, target).current, 100);
    assert_eq!(app.world().resource::<Tally>().healed, vec![60]);

    // At full health nothing happens and nothing is announced.
    app.world_mut().trigger(HealEvent { target, amount: 10 });
    assert_eq!(health_of(&app, target).current, 100);
    assert_eq!(app.world().resource::<Tally>().healed, vec![60]);
}

#[test]
fn revive_round_trip_restores_full_health() {
    let mut app = test_app();
    let target = app.world_mut().spawn(Health::new(100)).id();

    app.world_mut().trigger(DamageEvent {
        target,
        amount: 150,
    });
    assert!(health_of(&app, target).is_dead());

    app.world_mut().trigger(ReviveEvent {
        target,
        full_health: true,
    });
    assert!(!health_of(&app, target).is_dead());
    assert_eq!(health_of(&app, target).current, 100);
    assert_eq!(app.world().resource::<Tally>().revives, 1);

    // Reviving the living is a no-op.
    app.world_mut().trigger(ReviveEvent {
        target,
        full_health: true,
    });
    assert_eq!(app.world().resource::<Tally>().revives, 1);
}

#[test]
fn half_health_revive_floors_at_one() {
    let mut app = test_app();
    let sturdy = app.world_mut().spawn(Health::new(100)).id();
    let frail = app.world_mut().spawn(Health::new(1)).id();

    for target in [sturdy, frail] {
        app.world_mut().trigger(DamageEvent {
            target,
            amount: 999,
        });
        app.world_mut().trigger(ReviveEvent {
            target,
            full_health: false,
        });
    }

    assert_eq!(health_of(&app, sturdy).current, 50);
    assert_eq!(health_of(&app, frail).current, 1);
}

#[test]
fn hit_invulnerability_window_blocks_followup_damage() {
    let mut app = test_app();
    let target = app
        .world_mut()
        .spawn((Health::new(100), HitInvulnerability { duration: 0.5 }))
        .id();

    app.world_mut().trigger(DamageEvent { target, amount: 10 });
    assert_eq!(health_of(&app, target).current, 90);

    // Inside the window: ignored.
    app.world_mut().trigger(DamageEvent { target, amount: 10 });
    assert_eq!(health_of(&app, target).current, 90);

    // Window expires, damage lands again.
    advance(&mut app, 0.6);
    app.world_mut().trigger(DamageEvent { target, amount: 10 });
    assert_eq!(health_of(&app, target).current, 80);
}

#[test]
fn persistent_invulnerable_flag_blocks_damage_until_revive_clears_it() {
    let mut app = test_app();
    let target = app
        .world_mut()
        .spawn((Health::new(100), Invulnerable))
        .id();

    app.world_mut().trigger(DamageEvent { target, amount: 40 });
    assert_eq!(health_of(&app, target).current, 100);
    assert!(app.world().resource::<Tally>().damage_taken.is_empty());
}
