//! Experience and leveling through a headless app: the cascade on big
//! awards, stat bonuses, the max-level freeze, and the enemy-death feed.

use bevy::prelude::*;

use slime_hunter::damage::DamageProfile;
use slime_hunter::experience::{
    required_xp, Experience, ExperienceAwardEvent, ExperienceChangedEvent, ExperienceGainedEvent,
    ExperienceValue, LevelUpEvent, LevelingConfig,
};
use slime_hunter::health::{DamageEvent, DamageIntakePolicy, Health};
use slime_hunter::player_combat::Player;
use slime_hunter::SimulationPlugin;

#[derive(Resource, Default)]
struct Tally {
    gained: Vec<i32>,
    level_ups: Vec<u32>,
    changed: Vec<(i32, i32, u32)>,
}

fn test_app() -> App {
    let mut app = App::new();
    app.add_plugins(SimulationPlugin);
    app.insert_resource(Time::<()>::default());
    app.init_resource::<Tally>();
    app.add_observer(|on: On<ExperienceGainedEvent>, mut tally: ResMut<Tally>| {
        tally.gained.push(on.amount);
    });
    app.add_observer(|on: On<LevelUpEvent>, mut tally: ResMut<Tally>| {
        tally.level_ups.push(on.new_level);
    });
    app.add_observer(|on: On<ExperienceChangedEvent>, mut tally: ResMut<Tally>| {
        tally.changed.push((on.current, on.required, on.level));
    });
    app
}

fn spawn_player(app: &mut App) -> Entity {
    let config = app.world().resource::<LevelingConfig>().clone();
    app.world_mut()
        .spawn((
            Player,
            Transform::default(),
            Health::new(100),
            DamageIntakePolicy { minimum: 1 },
            DamageProfile::new(10, 1.0, 1),
            Experience::level_one(&config),
        ))
        .id()
}

#[test]
fn big_award_cascades_two_levels() {
    let mut app = test_app();
    let player = spawn_player(&mut app);

    // base 100, growth 1.2: thresholds are 100, 120, 144, ...
    app.world_mut().trigger(ExperienceAwardEvent { amount: 250 });

    let xp = app.world().get::<Experience>(player).unwrap();
    // 250 − 100 = 150, 150 − 120 = 30 → level 3 with 30 toward 144.
    assert_eq!((xp.level, xp.current, xp.required), (3, 30, 144));
    assert!(xp.current < xp.required);

    let tally = app.world().resource::<Tally>();
    assert_eq!(tally.level_ups, vec![2, 3]);
    assert_eq!(tally.gained, vec![250]);
    // One final changed notification carries the settled triple.
    assert_eq!(tally.changed, vec![(30, 144, 3)]);
}

#[test]
fn level_ups_grant_health_and_damage_bonuses() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    let config = app.world().resource::<LevelingConfig>().clone();

    app.world_mut().trigger(ExperienceAwardEvent { amount: 250 });

    // Two levels: +2 × health_per_level max health (shifted, so current
    // moves with it) and +2 × damage_per_level base damage.
    let health = app.world().get::<Health>(player).unwrap();
    assert_eq!(health.max, 100 + 2 * config.health_per_level);
    assert_eq!(health.current, health.max);

    let profile = app.world().get::<DamageProfile>(player).unwrap();
    assert_eq!(profile.base, 10 + 2 * config.damage_per_level);
}

#[test]
fn award_at_max_level_is_a_complete_noop() {
    let mut app = test_app();
    let config = app.world().resource::<LevelingConfig>().clone();
    let player = app
        .world_mut()
        .spawn((
            Player,
            Transform::default(),
            Health::new(100),
            DamageProfile::new(10, 1.0, 1),
            Experience::restored(&config, config.max_level, 0),
        ))
        .id();

    app.world_mut().trigger(ExperienceAwardEvent { amount: 9999 });

    let xp = app.world().get::<Experience>(player).unwrap();
    assert_eq!(xp.level, config.max_level);
    assert_eq!(xp.current, 0);

    let tally = app.world().resource::<Tally>();
    assert!(tally.gained.is_empty());
    assert!(tally.level_ups.is_empty());
    assert!(tally.changed.is_empty());
}

#[test]
fn reaching_max_level_freezes_progress() {
    let mut app = test_app();
    let config = app.world().resource::<LevelingConfig>().clone();
    let penultimate = config.max_level - 1;
    let player = app
        .world_mut()
        .spawn((
            Player,
            Transform::default(),
            Health::new(100),
            DamageProfile::new(10, 1.0, 1),
            Experience::restored(&config, penultimate, 0),
        ))
        .id();

    let threshold = required_xp(&config, config.max_level);
    // Enough for the last level plus a huge surplus.
    app.world_mut().trigger(ExperienceAwardEvent {
        amount: threshold + 100_000,
    });

    let xp = app.world().get::<Experience>(player).unwrap();
    assert_eq!(xp.level, config.max_level);
    // Surplus kept but no longer consumed; only one level-up fired.
    assert_eq!(xp.current, 100_000);
    assert_eq!(
        app.world().resource::<Tally>().level_ups,
        vec![config.max_level]
    );
}

#[test]
fn enemy_death_feeds_the_ledger() {
    let mut app = test_app();
    let player = spawn_player(&mut app);
    let slime = app
        .world_mut()
        .spawn((
            Transform::default(),
            Health::new(10),
            DamageIntakePolicy { minimum: 0 },
            ExperienceValue {
                base: 25,
                variance: 0,
                level_scale: 0.0,
                level: 1,
            },
        ))
        .id();

    app.world_mut().trigger(DamageEvent {
        target: slime,
        amount: 10,
    });

    let xp = app.world().get::<Experience>(player).unwrap();
    assert_eq!(xp.current, 25);
    assert_eq!(app.world().resource::<Tally>().gained, vec![25]);

    // A second corpse-kick awards nothing: the death already happened.
    app.world_mut().trigger(DamageEvent {
        target: slime,
        amount: 10,
    });
    let xp = app.world().get::<Experience>(player).unwrap();
    assert_eq!(xp.current, 25);
}
