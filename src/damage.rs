use bevy::prelude::*;

/// How hard an entity hits. Lives on the attacker; the actual number applied
/// to a defender comes out of [`effective_damage`] at the moment of impact,
/// so buffing `base` or `multiplier` mid-fight takes effect on the next swing.
///
/// `minimum` is the attacker's own floor: the player uses 1 (a hit never deals
/// zero, even with a zeroed multiplier), enemies use 0. It is data, not a
/// constant — both policies exist in the game and are set at spawn.
#[derive(Component, Clone, Debug)]
pub struct DamageProfile {
    pub base: i32,
    pub multiplier: f32,
    pub minimum: i32,
}

impl DamageProfile {
    pub fn new(base: i32, multiplier: f32, minimum: i32) -> Self {
        Self {
            base,
            multiplier,
            minimum,
        }
    }

    /// The amount this profile deals right now.
    pub fn effective(&self) -> i32 {
        effective_damage(self.base, self.multiplier, self.minimum)
    }
}

/// Pure damage computation: scale, round to nearest, then floor.
pub fn effective_damage(base: i32, multiplier: f32, minimum: i32) -> i32 {
    let scaled = (base as f32 * multiplier).round() as i32;
    scaled.max(minimum)
}
