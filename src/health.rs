use bevy::prelude::*;

pub struct HealthPlugin;

impl Plugin for HealthPlugin {
    fn build(&self, app: &mut App) {
        app.add_observer(on_damage_event)
            .add_observer(on_heal_event)
            .add_observer(on_revive_event)
            .add_systems(Update, (invulnerability_window_system, despawn_dead_system));
    }
}

// ── Components ──────────────────────────────────────────────────────────────

/// Per-entity health ledger.
///
/// The `dead` flag inside the struct is the source of truth for the ledger's
/// own rules (no damage or heal after death, no double death). The [`Dead`]
/// marker component mirrors it for query filtering (`Without<Dead>`) — the
/// marker goes through deferred commands, so within a single flush it can lag
/// the flag. Ledger logic never reads the marker.
#[derive(Component, Clone, Debug)]
pub struct Health {
    pub current: i32,
    pub max: i32,
    dead: bool,
}

impl Health {
    pub fn new(max: i32) -> Self {
        let max = max.max(1);
        Health {
            current: max,
            max,
            dead: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Current health as a fraction of max, in `0.0..=1.0`. Health-bar food.
    pub fn fraction(&self) -> f32 {
        self.current as f32 / self.max as f32
    }

    /// Enemy-style max-health change: current is clamped to the new max and
    /// otherwise left alone.
    pub fn rebase_clamped(&mut self, new_max: i32) {
        self.max = new_max.max(1);
        self.current = self.current.clamp(0, self.max);
    }

    /// Player-style max-health change: current shifts by the delta, so a
    /// +10 max bonus also grants +10 current. Clamped to `[0, new_max]`.
    pub fn rebase_shifted(&mut self, new_max: i32) {
        let new_max = new_max.max(1);
        let delta = new_max - self.max;
        self.max = new_max;
        self.current = (self.current + delta).clamp(0, self.max);
    }
}

/// Marker for dead entities. Presence/absence drives query filters the same
/// way the attack components do: targeting and AI use `Without<Dead>` rather
/// than checking a bool on every candidate.
#[derive(Component)]
pub struct Dead;

/// Persistent invulnerability flag. While present, damage is a no-op.
#[derive(Component)]
pub struct Invulnerable;

/// Config: entities with this open a timed invulnerability window after every
/// hit. The player has it; slimes don't.
#[derive(Component)]
pub struct HitInvulnerability {
    pub duration: f32,
}

/// The transient window itself. Ticked down each frame and removed when done.
#[derive(Component)]
pub struct InvulnerabilityWindow(pub Timer);

/// Floor applied to *incoming* damage. The player takes at least 1 per hit,
/// enemies take the raw amount (minimum 0). Kept as per-entity data so the
/// two policies stay visibly distinct.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct DamageIntakePolicy {
    pub minimum: i32,
}

/// Dead enemies linger for a moment (long enough for a death animation or
/// particle burst downstream), then despawn. The player never gets one — the
/// player dies and revives, never despawns.
#[derive(Component)]
pub struct DespawnTimer(pub Timer);

// ── Events ──────────────────────────────────────────────────────────────────
// Requests mutate the ledger; notifications report what actually happened.
// Downstream consumers (health bars, floating damage text, audio) subscribe
// to the notifications and never poke the ledger directly.

/// Request: apply damage to `target`.
#[derive(Event)]
pub struct DamageEvent {
    pub target: Entity,
    pub amount: i32,
}

/// Request: heal `target`.
#[derive(Event)]
pub struct HealEvent {
    pub target: Entity,
    pub amount: i32,
}

/// Request: bring `target` back from the dead. No-op on the living.
#[derive(Event)]
pub struct ReviveEvent {
    pub target: Entity,
    pub full_health: bool,
}

/// Notification: health changed, by any path.
#[derive(Event)]
pub struct HealthChangedEvent {
    pub entity: Entity,
    pub current: i32,
    pub max: i32,
}

/// Notification: damage actually landed, with the applied (post-floor) amount.
#[derive(Event)]
pub struct DamageTakenEvent {
    pub entity: Entity,
    pub amount: i32,
}

/// Notification: healing actually applied. Never fired with amount 0 — a heal
/// at full health is silent.
#[derive(Event)]
pub struct HealedEvent {
    pub entity: Entity,
    pub amount: i32,
}

/// Notification: the entity just died. Fired exactly once per death.
#[derive(Event)]
pub struct DeathEvent {
    pub entity: Entity,
}

/// Notification: the entity came back.
#[derive(Event)]
pub struct RevivedEvent {
    pub entity: Entity,
}

// ── Observers ───────────────────────────────────────────────────────────────

fn on_damage_event(
    trigger: On<DamageEvent>,
    mut query: Query<(
        &mut Health,
        Option<&DamageIntakePolicy>,
        Option<&Invulnerable>,
        Option<&InvulnerabilityWindow>,
        Option<&HitInvulnerability>,
    )>,
    mut commands: Commands,
) {
    let Ok((mut health, policy, invulnerable, window, hit_invuln)) = query.get_mut(trigger.target)
    else {
        return;
    };

    // Dead or invulnerable: damage is a no-op, not an error.
    if health.dead || invulnerable.is_some() || window.is_some() {
        return;
    }

    let minimum = policy.copied().unwrap_or_default().minimum;
    let applied = trigger.amount.max(minimum);
    health.current = (health.current - applied).clamp(0, health.max);

    commands.trigger(DamageTakenEvent {
        entity: trigger.target,
        amount: applied,
    });
    commands.trigger(HealthChangedEvent {
        entity: trigger.target,
        current: health.current,
        max: health.max,
    });

    // Post-hit invulnerability window, for entities configured with one.
    if let Some(hit_invuln) = hit_invuln {
        commands
            .entity(trigger.target)
            .insert(InvulnerabilityWindow(Timer::from_seconds(
                hit_invuln.duration,
                TimerMode::Once,
            )));
    }

    if health.current == 0 {
        // The flag flips here, synchronously — a second lethal hit processed
        // in the same flush already sees it and no-ops, so DeathEvent fires
        // exactly once per death.
        health.dead = true;
        commands.entity(trigger.target).insert(Dead);
        commands.trigger(DeathEvent {
            entity: trigger.target,
        });
    }
}

fn on_heal_event(trigger: On<HealEvent>, mut query: Query<&mut Health>, mut commands: Commands) {
    let Ok(mut health) = query.get_mut(trigger.target) else {
        return;
    };

    if health.dead {
        return;
    }

    let actual = trigger.amount.min(health.max - health.current).max(0);
    if actual == 0 {
        // Already at full health (or a zero heal): nothing happened, so
        // nothing is announced.
        return;
    }

    health.current += actual;
    commands.trigger(HealedEvent {
        entity: trigger.target,
        amount: actual,
    });
    commands.trigger(HealthChangedEvent {
        entity: trigger.target,
        current: health.current,
        max: health.max,
    });
}

fn on_revive_event(
    trigger: On<ReviveEvent>,
    mut query: Query<&mut Health>,
    mut commands: Commands,
) {
    let Ok(mut health) = query.get_mut(trigger.target) else {
        return;
    };

    if !health.dead {
        return;
    }

    health.current = if trigger.full_health {
        health.max
    } else {
        (health.max / 2).max(1)
    };
    health.dead = false;

    commands
        .entity(trigger.target)
        .remove::<(Dead, Invulnerable, InvulnerabilityWindow)>();

    commands.trigger(RevivedEvent {
        entity: trigger.target,
    });
    commands.trigger(HealthChangedEvent {
        entity: trigger.target,
        current: health.current,
        max: health.max,
    });
}

// ── Systems ─────────────────────────────────────────────────────────────────

fn invulnerability_window_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut InvulnerabilityWindow)>,
) {
    for (entity, mut window) in query.iter_mut() {
        window.0.tick(time.delta());
        if window.0.is_finished() {
            commands.entity(entity).remove::<InvulnerabilityWindow>();
        }
    }
}

fn despawn_dead_system(
    mut commands: Commands,
    time: Res<Time>,
    mut query: Query<(Entity, &mut DespawnTimer), With<Dead>>,
) {
    for (entity, mut timer) in query.iter_mut() {
        timer.0.tick(time.delta());
        if timer.0.just_finished() {
            commands.entity(entity).despawn();
        }
    }
}
