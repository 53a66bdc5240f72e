use bevy::prelude::*;

use crate::player_combat::Player;

pub struct MovementPlugin;

impl Plugin for MovementPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, face_player_system);
    }
}

/// Movement speed in units per second.
#[derive(Component, Clone, Copy, Debug)]
pub struct Speed(pub f32);

/// Entities with this always face the player's horizontal direction — while
/// chasing, while standing at stop distance, and mid-attack. Purely visual:
/// the simulation never reads a facing back.
#[derive(Component)]
pub struct FaceTarget;

fn face_player_system(
    player: Query<&Transform, With<Player>>,
    mut facers: Query<(&Transform, &mut Sprite), (With<FaceTarget>, Without<Player>)>,
) {
    let Ok(player_transform) = player.single() else {
        return;
    };

    for (transform, mut sprite) in facers.iter_mut() {
        let dx = player_transform.translation.x - transform.translation.x;
        // Dead zone so a slime directly above the player doesn't flicker.
        if dx.abs() > 0.5 {
            sprite.flip_x = dx < 0.0;
        }
    }
}
