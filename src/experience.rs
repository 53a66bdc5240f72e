use bevy::prelude::*;
use rand::Rng;

use crate::damage::DamageProfile;
use crate::health::{DeathEvent, Health, HealthChangedEvent};
use crate::player_combat::Player;

pub struct ExperiencePlugin;

impl Plugin for ExperiencePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelingConfig>()
            .add_observer(on_enemy_death)
            .add_observer(on_experience_award);
    }
}

// ── Config ──────────────────────────────────────────────────────────────────

/// How the per-level XP threshold grows.
#[derive(Clone, Debug)]
pub enum Progression {
    /// `base_required × growth^(level − 2)`: each level costs `growth` times
    /// the one before it.
    Exponential { growth: f32 },
    /// A designer-authored monotonic curve, sampled at
    /// `(level − 1) / (max_level − 1)` and scaled by `base_required`. Points
    /// are `(normalized level, multiplier)` pairs sorted by x.
    Curve(Vec<Vec2>),
}

#[derive(Resource, Clone, Debug)]
pub struct LevelingConfig {
    pub base_required: i32,
    pub max_level: u32,
    pub progression: Progression,
    /// Max-health bonus per level, applied with the shifted rebase so the
    /// bonus is felt immediately.
    pub health_per_level: i32,
    /// Added to the player's `DamageProfile.base` per level.
    pub damage_per_level: i32,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        LevelingConfig {
            base_required: 100,
            max_level: 20,
            progression: Progression::Exponential { growth: 1.2 },
            health_per_level: 10,
            damage_per_level: 2,
        }
    }
}

/// XP needed to go from `target_level − 1` to `target_level`. Level 1 (and
/// below) is free — it's where you start.
pub fn required_xp(config: &LevelingConfig, target_level: u32) -> i32 {
    if target_level <= 1 {
        return 0;
    }
    match &config.progression {
        Progression::Exponential { growth } => {
            (config.base_required as f32 * growth.powi(target_level as i32 - 2)).round() as i32
        }
        Progression::Curve(points) => {
            let span = (config.max_level.max(2) - 1) as f32;
            let t = (target_level - 1) as f32 / span;
            (config.base_required as f32 * sample_curve(points, t)).round() as i32
        }
    }
}

/// Piecewise-linear lookup, clamped at both ends.
fn sample_curve(points: &[Vec2], t: f32) -> f32 {
    let Some(first) = points.first() else {
        return 1.0;
    };
    if t <= first.x {
        return first.y;
    }
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.x {
            let span = b.x - a.x;
            if span <= f32::EPSILON {
                return b.y;
            }
            return a.y + (b.y - a.y) * (t - a.x) / span;
        }
    }
    points.last().map(|p| p.y).unwrap_or(1.0)
}

// ── Components ──────────────────────────────────────────────────────────────

/// The player's leveling ledger. `current` always stays below `required`
/// (the gain loop consumes whole thresholds), except at `max_level` where
/// progress is frozen as-is.
#[derive(Component, Clone, Debug)]
pub struct Experience {
    pub level: u32,
    pub current: i32,
    pub required: i32,
}

impl Experience {
    pub fn level_one(config: &LevelingConfig) -> Self {
        Experience {
            level: 1,
            current: 0,
            required: required_xp(config, 2),
        }
    }

    /// Rebuild from persisted `{level, experience}`. The threshold is always
    /// recomputed from config — a stored value could belong to an older
    /// curve, so it is never trusted.
    pub fn restored(config: &LevelingConfig, level: u32, experience: i32) -> Self {
        let level = level.clamp(1, config.max_level);
        Experience {
            level,
            current: experience.max(0),
            required: required_xp(config, level + 1),
        }
    }
}

/// How much XP killing this entity is worth. The enemy side of the bargain:
/// the leveling engine only ever asks for one number.
#[derive(Component, Clone, Debug)]
pub struct ExperienceValue {
    pub base: i32,
    /// Uniform ± spread on `base`.
    pub variance: i32,
    /// Bonus fraction per enemy level above 1.
    pub level_scale: f32,
    pub level: u32,
}

impl ExperienceValue {
    pub fn roll(&self) -> i32 {
        let mut rng = rand::thread_rng();
        let base = if self.variance > 0 {
            rng.gen_range(self.base - self.variance..=self.base + self.variance)
        } else {
            self.base
        };
        let scale = 1.0 + self.level_scale * self.level.saturating_sub(1) as f32;
        ((base as f32 * scale).round() as i32).max(1)
    }
}

// ── Events ──────────────────────────────────────────────────────────────────

/// Request: grant the player `amount` XP. Fired by the enemy-death observer,
/// but anything (quests, debug commands) may trigger one.
#[derive(Event)]
pub struct ExperienceAwardEvent {
    pub amount: i32,
}

/// Notification: XP was received (pre level-up accounting).
#[derive(Event)]
pub struct ExperienceGainedEvent {
    pub amount: i32,
}

/// Notification: final ledger state after an award settled, including any
/// level-ups it caused.
#[derive(Event)]
pub struct ExperienceChangedEvent {
    pub current: i32,
    pub required: i32,
    pub level: u32,
}

/// Notification: one per level gained. A large award can fire several.
#[derive(Event)]
pub struct LevelUpEvent {
    pub new_level: u32,
}

// ── Observers ───────────────────────────────────────────────────────────────

/// Every enemy death worth XP becomes one award.
fn on_enemy_death(
    trigger: On<DeathEvent>,
    values: Query<&ExperienceValue>,
    mut commands: Commands,
) {
    if let Ok(value) = values.get(trigger.entity) {
        commands.trigger(ExperienceAwardEvent {
            amount: value.roll(),
        });
    }
}

/// Applies an award to the player: gain, cascade level-ups, hand out stat
/// bonuses, announce the final state.
fn on_experience_award(
    trigger: On<ExperienceAwardEvent>,
    config: Res<LevelingConfig>,
    mut player: Query<(Entity, &mut Experience, &mut Health, &mut DamageProfile), With<Player>>,
    mut commands: Commands,
) {
    let Ok((entity, mut xp, mut health, mut profile)) = player.single_mut() else {
        return;
    };

    // At the cap the whole award is a no-op, notifications included.
    if xp.level >= config.max_level {
        return;
    }

    xp.current += trigger.amount.max(0);
    commands.trigger(ExperienceGainedEvent {
        amount: trigger.amount.max(0),
    });

    // One big award can clear several thresholds.
    while xp.current >= xp.required && xp.level < config.max_level {
        xp.current -= xp.required;
        xp.level += 1;
        if xp.level < config.max_level {
            xp.required = required_xp(&config, xp.level + 1);
        }
        // else: frozen — `required` keeps its last threshold and `current`
        // stops being consumed.

        let new_max = health.max + config.health_per_level;
        health.rebase_shifted(new_max);
        commands.trigger(HealthChangedEvent {
            entity,
            current: health.current,
            max: health.max,
        });
        profile.base += config.damage_per_level;

        info!("level up: {} (max health {})", xp.level, health.max);
        commands.trigger(LevelUpEvent {
            new_level: xp.level,
        });
    }

    commands.trigger(ExperienceChangedEvent {
        current: xp.current,
        required: xp.required,
        level: xp.level,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_one_and_below_are_free() {
        let config = LevelingConfig::default();
        assert_eq!(required_xp(&config, 0), 0);
        assert_eq!(required_xp(&config, 1), 0);
    }

    #[test]
    fn exponential_thresholds() {
        let config = LevelingConfig {
            base_required: 100,
            progression: Progression::Exponential { growth: 1.2 },
            ..Default::default()
        };
        assert_eq!(required_xp(&config, 2), 100);
        assert_eq!(required_xp(&config, 3), 120);
        assert_eq!(required_xp(&config, 4), 144);
    }

    #[test]
    fn curve_progression_interpolates() {
        let config = LevelingConfig {
            base_required: 100,
            max_level: 11,
            progression: Progression::Curve(vec![Vec2::new(0.0, 1.0), Vec2::new(1.0, 5.0)]),
            ..Default::default()
        };
        // level 2 → t = 0.1 → multiplier 1.4
        assert_eq!(required_xp(&config, 2), 140);
        // level 11 → t = 1.0 → multiplier 5.0
        assert_eq!(required_xp(&config, 11), 500);
    }

    #[test]
    fn restored_recomputes_threshold() {
        let config = LevelingConfig::default();
        let xp = Experience::restored(&config, 3, 50);
        assert_eq!(xp.level, 3);
        assert_eq!(xp.current, 50);
        assert_eq!(xp.required, required_xp(&config, 4));
    }

    #[test]
    fn restored_clamps_out_of_range_levels() {
        let config = LevelingConfig::default();
        assert_eq!(Experience::restored(&config, 0, -5).level, 1);
        assert_eq!(
            Experience::restored(&config, 999, 0).level,
            config.max_level
        );
    }

    #[test]
    fn experience_roll_respects_floor_and_scaling() {
        let flat = ExperienceValue {
            base: 10,
            variance: 0,
            level_scale: 0.5,
            level: 3,
        };
        // 10 × (1 + 0.5 × 2) = 20, no variance
        assert_eq!(flat.roll(), 20);

        let tiny = ExperienceValue {
            base: 0,
            variance: 0,
            level_scale: 0.0,
            level: 1,
        };
        assert_eq!(tiny.roll(), 1);
    }
}
