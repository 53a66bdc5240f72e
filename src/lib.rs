pub mod attack;
pub mod config;
pub mod damage;
pub mod enemy_ai;
pub mod experience;
pub mod health;
pub mod movement;
pub mod player_combat;
pub mod save_load;
pub mod spawn;

use bevy::prelude::*;

/// The whole combat simulation, minus anything that touches disk or spawns
/// game content: health ledger, damage, attack phases, enemy AI, player
/// targeting, leveling. This is the set integration tests run headless.
///
/// The binary adds [`save_load::SaveLoadPlugin`] and [`spawn::SpawnPlugin`]
/// on top.
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            config::ConfigPlugin,
            health::HealthPlugin,
            attack::AttackPlugin,
            enemy_ai::EnemyAiPlugin,
            player_combat::PlayerCombatPlugin,
            experience::ExperiencePlugin,
            movement::MovementPlugin,
        ));
    }
}
