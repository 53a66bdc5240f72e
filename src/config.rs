use bevy::prelude::*;

pub struct ConfigPlugin;

impl Plugin for ConfigPlugin {
    fn build(&self, app: &mut App) {
        // Sanitize once, up front. Every consumer can then trust the values
        // without re-checking.
        app.insert_resource(CombatTuning::default().sanitized());
    }
}

/// Global combat tunables. One copy for the whole game; per-entity components
/// are stamped from these at spawn time.
///
/// Bad values are corrected, never rejected: a stop distance at or beyond the
/// attack range would leave enemies parked out of reach forever, and a
/// non-positive duration would wedge a timer, so [`sanitized`] clamps both
/// and warns. A misconfigured game that runs beats a correct one that
/// crashed on startup.
///
/// [`sanitized`]: CombatTuning::sanitized
#[derive(Resource, Clone, Debug)]
pub struct CombatTuning {
    // Player
    pub player_max_health: i32,
    pub player_base_damage: i32,
    pub player_attack_range: f32,
    pub player_windup: f32,
    pub player_recover: f32,
    pub player_cooldown: f32,
    /// Seconds of post-hit invulnerability.
    pub hit_invulnerability: f32,
    /// Start attacks automatically whenever a target is in range.
    pub auto_attack: bool,
    /// Seconds between player death and automatic revival.
    pub respawn_delay: f32,
    /// Revive at full health; `false` revives at half (minimum 1).
    pub revive_full_health: bool,

    // Enemies
    pub enemy_attack_range: f32,
    /// Must stay strictly below `enemy_attack_range`.
    pub enemy_stop_distance: f32,
    pub enemy_speed: f32,
    pub enemy_windup: f32,
    pub enemy_recover: f32,
    pub enemy_cooldown: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        CombatTuning {
            player_max_health: 100,
            player_base_damage: 10,
            player_attack_range: 90.0,
            player_windup: 0.25,
            player_recover: 0.2,
            player_cooldown: 0.6,
            hit_invulnerability: 0.8,
            auto_attack: true,
            respawn_delay: 3.0,
            revive_full_health: true,

            enemy_attack_range: 65.0,
            enemy_stop_distance: 50.0,
            enemy_speed: 125.0,
            enemy_windup: 0.4,
            enemy_recover: 0.3,
            enemy_cooldown: 1.2,
        }
    }
}

impl CombatTuning {
    const MIN_DURATION: f32 = 0.05;

    pub fn sanitized(mut self) -> Self {
        for duration in [
            &mut self.player_windup,
            &mut self.player_recover,
            &mut self.player_cooldown,
            &mut self.hit_invulnerability,
            &mut self.respawn_delay,
            &mut self.enemy_windup,
            &mut self.enemy_recover,
            &mut self.enemy_cooldown,
        ] {
            if *duration <= 0.0 {
                warn!(
                    "non-positive combat duration {}, clamping to {}",
                    duration,
                    Self::MIN_DURATION
                );
                *duration = Self::MIN_DURATION;
            }
        }

        if self.enemy_stop_distance >= self.enemy_attack_range {
            let corrected = self.enemy_attack_range * 0.75;
            warn!(
                "enemy stop distance {} >= attack range {}, clamping to {}",
                self.enemy_stop_distance, self.enemy_attack_range, corrected
            );
            self.enemy_stop_distance = corrected;
        }

        self
    }
}
