use bevy::prelude::*;
use rand::Rng;

use crate::attack::{AttackPhase, AttackRange, AttackTiming};
use crate::config::CombatTuning;
use crate::damage::DamageProfile;
use crate::enemy_ai::{Enemy, EnemyAi, StopDistance};
use crate::experience::{Experience, ExperienceValue, LevelingConfig};
use crate::health::{
    DamageIntakePolicy, DespawnTimer, Health, HitInvulnerability,
};
use crate::movement::{FaceTarget, Speed};
use crate::player_combat::Player;
use crate::save_load::SaveData;

pub struct SpawnPlugin;

impl Plugin for SpawnPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<EnemyWaves>()
            .init_resource::<CurrentWave>()
            .add_systems(Startup, (spawn_player_system, queue_first_wave_system))
            .add_systems(
                Update,
                (
                    staggered_spawn_system.run_if(resource_exists::<PendingSpawns>),
                    next_wave_system.run_if(not(resource_exists::<PendingSpawns>)),
                ),
            );
    }
}

// ── Wave data ───────────────────────────────────────────────────────────────

/// One encounter's worth of slimes. Static game data, defined in code —
/// the same every run, like frame counts or attack stats.
#[derive(Debug, Clone)]
pub struct WaveDefinition {
    pub name: &'static str,
    pub count: u32,
    pub base_health: i32,
    pub base_damage: i32,
    pub xp_value: i32,
    /// Enemy levels roll uniformly in this range; stats scale with level.
    pub min_level: u32,
    pub max_level: u32,
}

/// The encounter table. A Vec because the game is a sequence of fights;
/// the last wave repeats once the table runs out.
#[derive(Resource, Debug)]
pub struct EnemyWaves {
    pub waves: Vec<WaveDefinition>,
}

impl Default for EnemyWaves {
    fn default() -> Self {
        Self {
            waves: vec![
                WaveDefinition {
                    name: "Green Slimes",
                    count: 4,
                    base_health: 30,
                    base_damage: 5,
                    xp_value: 25,
                    min_level: 1,
                    max_level: 2,
                },
                WaveDefinition {
                    name: "Slime Pack",
                    count: 7,
                    base_health: 40,
                    base_damage: 7,
                    xp_value: 35,
                    min_level: 2,
                    max_level: 4,
                },
                WaveDefinition {
                    name: "Slime Horde",
                    count: 10,
                    base_health: 55,
                    base_damage: 9,
                    xp_value: 50,
                    min_level: 4,
                    max_level: 7,
                },
            ],
        }
    }
}

#[derive(Resource, Default)]
struct CurrentWave(usize);

/// Remaining enemies to trickle in for the active wave, plus the stagger
/// timer. The resource removes itself when the count hits zero, which gates
/// [`staggered_spawn_system`] off entirely.
#[derive(Resource)]
struct PendingSpawns {
    wave: usize,
    remaining: u32,
    timer: Timer,
}

/// How long a dead slime's body lingers before despawning.
const CORPSE_LINGER_SECS: f32 = 1.5;

/// Stats grow 15% per enemy level above 1.
fn level_scaled(base: i32, level: u32) -> i32 {
    let factor = 1.0 + 0.15 * level.saturating_sub(1) as f32;
    ((base as f32 * factor).round() as i32).max(1)
}

// ── Systems ─────────────────────────────────────────────────────────────────

/// Spawns the hero, restoring persisted progress. Max health and base damage
/// include the per-level bonuses for every level already earned — the save
/// only stores `{level, experience}`, everything derived is recomputed.
fn spawn_player_system(
    mut commands: Commands,
    tuning: Res<CombatTuning>,
    leveling: Res<LevelingConfig>,
    save: Res<SaveData>,
) {
    let xp = Experience::restored(&leveling, save.level, save.experience);
    let earned_levels = (xp.level - 1) as i32;
    let max_health = tuning.player_max_health + leveling.health_per_level * earned_levels;
    let base_damage = tuning.player_base_damage + leveling.damage_per_level * earned_levels;

    info!("spawning player at level {} ({} hp)", xp.level, max_health);

    commands.spawn((
        Player,
        Transform::from_xyz(0.0, 0.0, 0.0),
        Health::new(max_health),
        // The player never takes a zero-damage hit...
        DamageIntakePolicy { minimum: 1 },
        // ...and never deals one either.
        DamageProfile::new(base_damage, 1.0, 1),
        HitInvulnerability {
            duration: tuning.hit_invulnerability,
        },
        AttackPhase::Ready,
        AttackTiming::new(
            tuning.player_windup,
            tuning.player_recover,
            tuning.player_cooldown,
        ),
        AttackRange(tuning.player_attack_range),
        xp,
        Sprite {
            color: Color::srgb(0.9, 0.85, 0.3),
            custom_size: Some(Vec2::splat(40.0)),
            ..default()
        },
    ));
}

fn queue_first_wave_system(mut commands: Commands, waves: Res<EnemyWaves>) {
    if let Some(wave) = waves.waves.first() {
        info!("wave 1: {} ({} enemies)", wave.name, wave.count);
        commands.insert_resource(PendingSpawns {
            wave: 0,
            remaining: wave.count,
            timer: Timer::from_seconds(0.3, TimerMode::Repeating),
        });
    }
}

/// Trickles the active wave in one enemy at a time so they don't all arrive
/// in a single clump on the same frame.
fn staggered_spawn_system(
    mut commands: Commands,
    time: Res<Time>,
    tuning: Res<CombatTuning>,
    waves: Res<EnemyWaves>,
    mut pending: ResMut<PendingSpawns>,
) {
    pending.timer.tick(time.delta());
    if !pending.timer.just_finished() {
        return;
    }

    let Some(wave) = waves.waves.get(pending.wave) else {
        commands.remove_resource::<PendingSpawns>();
        return;
    };

    spawn_slime(&mut commands, &tuning, wave);
    pending.remaining -= 1;

    if pending.remaining == 0 {
        commands.remove_resource::<PendingSpawns>();
    }
}

/// When the field is clear and nothing is queued, the next wave starts.
/// The table's last entry repeats forever.
fn next_wave_system(
    mut commands: Commands,
    mut current: ResMut<CurrentWave>,
    waves: Res<EnemyWaves>,
    living: Query<&Health, With<Enemy>>,
) {
    if living.iter().any(|health| !health.is_dead()) {
        return;
    }
    // Corpses still lingering also hold the next wave back.
    if !living.is_empty() {
        return;
    }

    let next = (current.0 + 1).min(waves.waves.len().saturating_sub(1));
    let Some(wave) = waves.waves.get(next) else {
        return;
    };
    current.0 = next;

    info!("wave {}: {} ({} enemies)", next + 1, wave.name, wave.count);
    commands.insert_resource(PendingSpawns {
        wave: next,
        remaining: wave.count,
        timer: Timer::from_seconds(0.3, TimerMode::Repeating),
    });
}

fn spawn_slime(commands: &mut Commands, tuning: &CombatTuning, wave: &WaveDefinition) {
    let mut rng = rand::thread_rng();

    // Arrive from outside the arena edges, random side.
    let x = if rng.gen_bool(0.5) {
        rng.gen_range(-600.0..-350.0)
    } else {
        rng.gen_range(350.0..600.0)
    };
    let y = rng.gen_range(-300.0..300.0);
    let level = rng.gen_range(wave.min_level..=wave.max_level);

    commands.spawn((
        Enemy,
        EnemyAi::default(),
        Transform::from_xyz(x, y, 0.0),
        Health::new(level_scaled(wave.base_health, level)),
        DamageIntakePolicy { minimum: 0 },
        DamageProfile::new(level_scaled(wave.base_damage, level), 1.0, 0),
        AttackPhase::Ready,
        AttackTiming::new(tuning.enemy_windup, tuning.enemy_recover, tuning.enemy_cooldown),
        AttackRange(tuning.enemy_attack_range),
        StopDistance(tuning.enemy_stop_distance),
        Speed(tuning.enemy_speed),
        FaceTarget,
        ExperienceValue {
            base: wave.xp_value,
            variance: wave.xp_value / 5,
            level_scale: 0.15,
            level,
        },
        DespawnTimer(Timer::from_seconds(CORPSE_LINGER_SECS, TimerMode::Once)),
        Sprite {
            color: Color::srgb(0.3, 0.8, 0.4),
            custom_size: Some(Vec2::splat(30.0 + 4.0 * level as f32)),
            ..default()
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_scaling_grows_and_floors() {
        assert_eq!(level_scaled(40, 1), 40);
        assert_eq!(level_scaled(40, 3), 52); // 40 × 1.3
        assert_eq!(level_scaled(0, 1), 1);
    }
}
