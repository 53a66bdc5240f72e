use bevy::prelude::*;

use slime_hunter::{save_load::SaveLoadPlugin, spawn::SpawnPlugin, SimulationPlugin};

fn main() {
    App::new()
        .add_plugins((DefaultPlugins, SimulationPlugin, SaveLoadPlugin, SpawnPlugin))
        .add_systems(Startup, spawn_camera)
        .run();
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
