use bevy::prelude::*;

use crate::attack::{
    advance_attack_phase_system, AttackPhase, AttackRange, AttackTiming, PendingHit,
};
use crate::config::CombatTuning;
use crate::enemy_ai::Enemy;
use crate::health::{DeathEvent, Health, ReviveEvent};

pub struct PlayerCombatPlugin;

impl Plugin for PlayerCombatPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<AttackCommand>()
            .add_observer(on_player_death)
            .add_systems(
                Update,
                (
                    retarget_system,
                    attack_input_system,
                    attack_dispatch_system,
                )
                    .chain()
                    .before(advance_attack_phase_system),
            )
            .add_systems(Update, respawn_system);
    }
}

// ── Components ──────────────────────────────────────────────────────────────

/// The one player-controlled hero.
#[derive(Component)]
pub struct Player;

/// Non-owning reference to the enemy currently in the player's sights.
/// Recomputed every tick and re-validated again at the moment a hit resolves;
/// a stale target is never trusted just because it was valid when acquired.
#[derive(Component, Clone, Copy, Debug)]
pub struct CurrentTarget(pub Entity);

/// Counts down from player death to automatic revival.
#[derive(Component)]
pub struct RespawnTimer(pub Timer);

/// Buffered attack input. Written by [`attack_input_system`] on an input
/// edge; tests (and future AI allies, scripted sequences) write it directly.
#[derive(Message)]
pub struct AttackCommand;

// ── Systems ─────────────────────────────────────────────────────────────────

/// Recomputes the player's target each tick: nearest living enemy within
/// attack range. Ties go to whichever the query yields first — iteration
/// order, deliberately left implementation-defined.
///
/// A dead player targets nothing, and any in-flight swing is aborted here,
/// before the attack timers get a chance to resolve it.
fn retarget_system(
    mut commands: Commands,
    mut player: Query<
        (
            Entity,
            &Transform,
            &Health,
            &AttackRange,
            &mut AttackPhase,
            Option<&CurrentTarget>,
        ),
        With<Player>,
    >,
    enemies: Query<(Entity, &Transform, &Health), (With<Enemy>, Without<Player>)>,
) {
    let Ok((entity, transform, health, range, mut phase, current)) = player.single_mut() else {
        return;
    };

    if health.is_dead() {
        if !phase.can_attack() {
            phase.cancel();
        }
        commands.entity(entity).remove::<(CurrentTarget, PendingHit)>();
        return;
    }

    let nearest = enemies
        .iter()
        .filter(|(_, _, enemy_health)| !enemy_health.is_dead())
        .map(|(enemy, enemy_transform, _)| {
            (
                enemy,
                transform
                    .translation
                    .distance(enemy_transform.translation),
            )
        })
        .filter(|(_, distance)| *distance <= range.0)
        .min_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(enemy, _)| enemy);

    match nearest {
        Some(enemy) => {
            if current.map(|t| t.0) != Some(enemy) {
                commands.entity(entity).insert(CurrentTarget(enemy));
            }
        }
        None => {
            if current.is_some() {
                commands.entity(entity).remove::<CurrentTarget>();
            }
        }
    }
}

/// Polls raw input for an attack edge. Both resources are optional so a
/// headless app (tests, a dedicated sim run) simply has no manual input
/// rather than a crash.
fn attack_input_system(
    buttons: Option<Res<ButtonInput<MouseButton>>>,
    keys: Option<Res<ButtonInput<KeyCode>>>,
    mut commands_out: MessageWriter<AttackCommand>,
) {
    let clicked = buttons
        .map(|b| b.just_pressed(MouseButton::Left))
        .unwrap_or(false);
    let pressed = keys
        .map(|k| k.just_pressed(KeyCode::Space))
        .unwrap_or(false);

    if clicked || pressed {
        commands_out.write(AttackCommand);
    }
}

/// Starts the player's swing when an attack was requested (manually this
/// tick, or standing auto-attack) and the availability conditions hold: off
/// cooldown, not mid-swing, and a target in sight.
fn attack_dispatch_system(
    mut commands: Commands,
    tuning: Res<CombatTuning>,
    mut requests: MessageReader<AttackCommand>,
    mut player: Query<
        (
            Entity,
            &Health,
            &mut AttackPhase,
            &AttackTiming,
            Option<&CurrentTarget>,
        ),
        With<Player>,
    >,
) {
    // Drain even when the attack can't start — a queued click from a dead
    // player shouldn't fire the moment they revive.
    let requested = requests.read().count() > 0;

    let Ok((entity, health, mut phase, timing, target)) = player.single_mut() else {
        return;
    };

    if health.is_dead() || !(requested || tuning.auto_attack) || !phase.can_attack() {
        return;
    }
    let Some(target) = target else {
        return;
    };

    phase.start(timing);
    commands.entity(entity).insert(PendingHit { target: target.0 });
}

/// The player comes back after a fixed delay. Enemies notice via the health
/// ledger (their Idle state stops holding) — nothing here tells them.
fn respawn_system(
    mut commands: Commands,
    time: Res<Time>,
    tuning: Res<CombatTuning>,
    mut player: Query<(Entity, &mut RespawnTimer), With<Player>>,
) {
    let Ok((entity, mut timer)) = player.single_mut() else {
        return;
    };

    timer.0.tick(time.delta());
    if timer.0.just_finished() {
        commands.entity(entity).remove::<RespawnTimer>();
        commands.trigger(ReviveEvent {
            target: entity,
            full_health: tuning.revive_full_health,
        });
    }
}

// ── Observers ───────────────────────────────────────────────────────────────

fn on_player_death(
    trigger: On<DeathEvent>,
    tuning: Res<CombatTuning>,
    player: Query<(), With<Player>>,
    mut commands: Commands,
) {
    if player.get(trigger.entity).is_ok() {
        info!("player down, respawning in {}s", tuning.respawn_delay);
        commands
            .entity(trigger.entity)
            .insert(RespawnTimer(Timer::from_seconds(
                tuning.respawn_delay,
                TimerMode::Once,
            )));
    }
}
