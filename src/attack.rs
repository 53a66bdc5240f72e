use bevy::prelude::*;

use crate::damage::DamageProfile;
use crate::health::{DamageEvent, Health};

pub struct AttackPlugin;

impl Plugin for AttackPlugin {
    fn build(&self, app: &mut App) {
        // AI transitions and player dispatch are registered .before() this
        // system by their own plugins, so within one frame the order is:
        // decide → move → resolve timers. Across entities, no order is
        // promised.
        app.add_systems(Update, advance_attack_phase_system);
    }
}

// ── Components ──────────────────────────────────────────────────────────────

/// The attack routine, shared by the player and every enemy. A swing is a
/// fixed sequence of timed waits:
///
///   Ready → WindingUp → (hit resolves) → Recovering → CoolingDown → Ready
///
/// "Can attack" and "is attacking" are derived from the variant, so the two
/// can never both be true — there is no pair of bools to desync. Cancelling
/// at any wait drops straight back to `Ready` without applying damage; the
/// cooldown only ever follows a completed swing.
#[derive(Component, Debug)]
pub enum AttackPhase {
    Ready,
    WindingUp(Timer),
    Recovering(Timer),
    CoolingDown(Timer),
}

impl AttackPhase {
    pub fn can_attack(&self) -> bool {
        matches!(self, AttackPhase::Ready)
    }

    /// True from the start of the wind-up until recovery ends. The cooldown
    /// that follows is downtime, not an attack.
    pub fn is_attacking(&self) -> bool {
        matches!(self, AttackPhase::WindingUp(_) | AttackPhase::Recovering(_))
    }

    /// Begin a swing. Callers check `can_attack()` first and insert a
    /// [`PendingHit`] naming the victim.
    pub fn start(&mut self, timing: &AttackTiming) {
        *self = AttackPhase::WindingUp(Timer::from_seconds(timing.windup, TimerMode::Once));
    }

    /// Abort wherever we are. No damage lands, no cooldown is owed.
    pub fn cancel(&mut self) {
        *self = AttackPhase::Ready;
    }
}

/// Durations for each leg of the swing, in seconds. Sanitized at construction
/// so a zero or negative duration from config can't wedge a timer.
#[derive(Component, Clone, Copy, Debug)]
pub struct AttackTiming {
    pub windup: f32,
    pub recover: f32,
    pub cooldown: f32,
}

impl AttackTiming {
    pub const MIN_DURATION: f32 = 0.05;

    pub fn new(windup: f32, recover: f32, cooldown: f32) -> Self {
        AttackTiming {
            windup: windup.max(Self::MIN_DURATION),
            recover: recover.max(Self::MIN_DURATION),
            cooldown: cooldown.max(Self::MIN_DURATION),
        }
    }
}

/// How far this entity can reach with an attack.
#[derive(Component, Clone, Copy, Debug)]
pub struct AttackRange(pub f32);

/// The victim a wind-up is aimed at. Inserted when the swing starts, removed
/// when the hit resolves or the swing is cancelled. A non-owning reference:
/// the target is re-validated (still present, still alive, still in range) at
/// the moment of impact, never trusted from when the swing began.
#[derive(Component)]
pub struct PendingHit {
    pub target: Entity,
}

// ── Systems ─────────────────────────────────────────────────────────────────

/// Advances every attacker's phase timer and resolves hits.
///
/// Wind-up completion is the single point where damage happens, and it
/// re-checks everything: the attacker must still be alive, the pending target
/// must still exist, be alive, and be within the attacker's reach. A failed
/// check wastes the swing (the recovery still plays out) but applies nothing.
pub fn advance_attack_phase_system(
    mut commands: Commands,
    time: Res<Time>,
    mut attackers: Query<(
        Entity,
        &mut AttackPhase,
        &AttackTiming,
        &Health,
        &Transform,
        &AttackRange,
        &DamageProfile,
        Option<&PendingHit>,
    )>,
    targets: Query<(&Transform, &Health)>,
) {
    for (entity, mut phase, timing, health, transform, range, profile, pending) in
        attackers.iter_mut()
    {
        // A dead attacker's routine stops at the next resumption point,
        // before any pending damage applies.
        if health.is_dead() {
            if !phase.can_attack() {
                phase.cancel();
                commands.entity(entity).remove::<PendingHit>();
            }
            continue;
        }

        match &mut *phase {
            AttackPhase::Ready => {}
            AttackPhase::WindingUp(timer) => {
                timer.tick(time.delta());
                if timer.just_finished() {
                    if let Some(pending) = pending {
                        if let Ok((target_transform, target_health)) = targets.get(pending.target)
                        {
                            let distance = transform
                                .translation
                                .distance(target_transform.translation);
                            if !target_health.is_dead() && distance <= range.0 {
                                commands.trigger(DamageEvent {
                                    target: pending.target,
                                    amount: profile.effective(),
                                });
                            }
                        }
                        commands.entity(entity).remove::<PendingHit>();
                    }
                    *phase =
                        AttackPhase::Recovering(Timer::from_seconds(timing.recover, TimerMode::Once));
                }
            }
            AttackPhase::Recovering(timer) => {
                timer.tick(time.delta());
                if timer.just_finished() {
                    *phase = AttackPhase::CoolingDown(Timer::from_seconds(
                        timing.cooldown,
                        TimerMode::Once,
                    ));
                }
            }
            AttackPhase::CoolingDown(timer) => {
                timer.tick(time.delta());
                if timer.just_finished() {
                    *phase = AttackPhase::Ready;
                }
            }
        }
    }
}
