use bevy::prelude::*;

use crate::attack::{
    advance_attack_phase_system, AttackPhase, AttackRange, AttackTiming, PendingHit,
};
use crate::health::Health;
use crate::movement::Speed;
use crate::player_combat::Player;

pub struct EnemyAiPlugin;

impl Plugin for EnemyAiPlugin {
    fn build(&self, app: &mut App) {
        // Decide, then move, then let the attack timers run. Chained so the
        // per-frame order is guaranteed; without it Bevy could run movement
        // against a state from the previous frame.
        app.add_systems(
            Update,
            (enemy_transition_system, enemy_chase_system)
                .chain()
                .before(advance_attack_phase_system),
        );
    }
}

// ── Components ──────────────────────────────────────────────────────────────

/// Marks an entity as an enemy combatant.
#[derive(Component)]
pub struct Enemy;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AiState {
    /// Closing in on the player.
    Chasing,
    /// Mid-swing (the attack phase machine owns the timing).
    Attacking,
    /// Player is dead; stand down until they come back.
    Idle,
    /// Terminal. Nothing ticks for this enemy anymore.
    Dead,
}

#[derive(Component, Debug)]
pub struct EnemyAi {
    pub state: AiState,
}

impl Default for EnemyAi {
    fn default() -> Self {
        EnemyAi {
            state: AiState::Chasing,
        }
    }
}

/// Chase keep-away distance. Spawn code guarantees this is strictly below the
/// enemy's attack range, or the enemy would stop walking before it could
/// ever land a hit.
#[derive(Component, Clone, Copy, Debug)]
pub struct StopDistance(pub f32);

/// Past this multiple of attack range, a wind-up gets abandoned — the target
/// escaped and there is no point finishing a swing at empty air.
const ESCAPE_RANGE_FACTOR: f32 = 1.5;

// ── Systems ─────────────────────────────────────────────────────────────────

/// One transition per enemy per tick, rules checked in strict priority order:
///
/// 1. own death → `Dead`, terminal (cancel any swing);
/// 2. player dead → `Idle` (cancel any swing, no posthumous hits);
/// 3. (implicit) `Idle` with a living player → back to `Chasing`;
/// 4. `Chasing`, in range, off cooldown → `Attacking` (start the wind-up);
/// 5. `Attacking`, swing over → `Chasing`;
/// 6. `Attacking`, target escaped past 1.5× range → `Chasing`, swing cancelled.
fn enemy_transition_system(
    mut commands: Commands,
    player: Query<(Entity, &Transform, &Health), With<Player>>,
    mut enemies: Query<
        (
            Entity,
            &mut EnemyAi,
            &mut AttackPhase,
            &AttackTiming,
            &Transform,
            &AttackRange,
            &Health,
        ),
        (With<Enemy>, Without<Player>),
    >,
) {
    // No player in the world: nothing to react to this tick.
    let Ok((player_entity, player_transform, player_health)) = player.single() else {
        return;
    };

    for (entity, mut ai, mut phase, timing, transform, range, health) in enemies.iter_mut() {
        // Rule 1: own death is terminal.
        if health.is_dead() {
            if ai.state != AiState::Dead {
                ai.state = AiState::Dead;
                phase.cancel();
                commands.entity(entity).remove::<PendingHit>();
            }
            continue;
        }

        // Rule 2: the player died. Abort anything in flight — a wind-up that
        // was mid-wait applies no damage.
        if player_health.is_dead() {
            if ai.state != AiState::Idle {
                ai.state = AiState::Idle;
                phase.cancel();
                commands.entity(entity).remove::<PendingHit>();
            }
            continue;
        }

        let distance = transform
            .translation
            .distance(player_transform.translation);

        match ai.state {
            // Player is alive again (rule 2 stopped matching): re-engage.
            AiState::Idle => ai.state = AiState::Chasing,

            AiState::Chasing => {
                if distance <= range.0 && phase.can_attack() {
                    ai.state = AiState::Attacking;
                    phase.start(timing);
                    commands.entity(entity).insert(PendingHit {
                        target: player_entity,
                    });
                }
            }

            AiState::Attacking => {
                if !phase.is_attacking() {
                    // Swing finished (cooldown may still be running).
                    ai.state = AiState::Chasing;
                } else if distance > range.0 * ESCAPE_RANGE_FACTOR {
                    // Escape fallback: give up on the swing entirely.
                    phase.cancel();
                    commands.entity(entity).remove::<PendingHit>();
                    ai.state = AiState::Chasing;
                }
            }

            // Terminal; rule 1 already handled the entry edge.
            AiState::Dead => {}
        }
    }
}

/// Chasing enemies step toward the player at their own speed, stopping at
/// stop distance so they don't stack on top of the target. Runs after the
/// transition system so it sees this frame's state.
fn enemy_chase_system(
    time: Res<Time>,
    player: Query<&Transform, With<Player>>,
    mut enemies: Query<
        (&EnemyAi, &mut Transform, &Speed, &StopDistance),
        (With<Enemy>, Without<Player>),
    >,
) {
    let Ok(player_transform) = player.single() else {
        return;
    };

    let delta = time.delta_secs();
    for (ai, mut transform, speed, stop) in enemies.iter_mut() {
        if ai.state != AiState::Chasing {
            continue;
        }

        let diff = player_transform.translation - transform.translation;
        let distance = diff.length();
        if distance > stop.0 {
            let step = speed.0 * delta;
            // Never overshoot past the stop distance in one frame.
            let step = step.min(distance - stop.0);
            transform.translation += diff.normalize() * step;
        }
    }
}
