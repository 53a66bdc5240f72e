use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::experience::ExperienceChangedEvent;
use crate::health::DeathEvent;
use crate::player_combat::Player;

pub struct SaveLoadPlugin;

impl Plugin for SaveLoadPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreStartup, load_save_data)
            .add_observer(on_experience_changed)
            .add_observer(on_player_death);
    }
}

/// The player's persistent progress: just `{level, experience}`.
///
/// Everything derived from these (the next-level threshold, the stat
/// bonuses) is recomputed from config on load — a stored threshold could
/// belong to an older balance pass, so none is stored in the first place.
///
/// `#[serde(default)]` keeps old save files parseable when fields are added:
/// missing fields take their `Default` value instead of failing the whole
/// file.
#[derive(Resource, Serialize, Deserialize, Debug, Clone)]
pub struct SaveData {
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub experience: i32,
}

fn default_level() -> u32 {
    1
}

impl Default for SaveData {
    fn default() -> Self {
        Self {
            level: 1,
            experience: 0,
        }
    }
}

mod storage {
    use super::SaveData;
    use bevy::prelude::*;

    const SAVE_FILE: &str = "save.ron";

    /// Platform data dir (`~/.local/share/slime-hunter` on Linux, the
    /// equivalents elsewhere), falling back to the working directory when the
    /// platform has no notion of one.
    fn save_file_path() -> std::path::PathBuf {
        match dirs::data_dir() {
            Some(dir) => dir.join("slime-hunter").join(SAVE_FILE),
            None => std::path::PathBuf::from(SAVE_FILE),
        }
    }

    /// Reads SaveData from disk, or None if absent/unreadable. A corrupt or
    /// outdated file logs and falls back to defaults rather than crashing.
    pub fn load() -> Option<SaveData> {
        let path = save_file_path();

        if !path.exists() {
            info!("no save file at {:?}, starting fresh", path);
            return None;
        }

        match std::fs::read_to_string(&path) {
            Ok(contents) => match ron::from_str::<SaveData>(&contents) {
                Ok(data) => {
                    info!("loaded save from {:?}: {:?}", path, data);
                    Some(data)
                }
                Err(e) => {
                    error!("failed to parse save file: {}, using defaults", e);
                    None
                }
            },
            Err(e) => {
                error!("failed to read save file: {}, using defaults", e);
                None
            }
        }
    }

    pub fn save(save_data: &SaveData) {
        let path = save_file_path();

        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                error!("failed to create save directory: {}", e);
                return;
            }
        }

        let pretty = ron::ser::PrettyConfig::default();
        match ron::ser::to_string_pretty(save_data, pretty) {
            Ok(serialized) => {
                if let Err(e) = std::fs::write(&path, serialized) {
                    error!("failed to write save file: {}", e);
                } else {
                    info!("progress saved to {:?}", path);
                }
            }
            Err(e) => error!("failed to serialize save data: {}", e),
        }
    }
}

/// PreStartup so the save exists before the player spawns from it.
fn load_save_data(mut commands: Commands) {
    commands.insert_resource(storage::load().unwrap_or_default());
}

/// Mirrors the leveling ledger into the save resource, writing to disk when
/// the level actually changed. Plain XP trickle only updates the in-memory
/// copy; it gets flushed on the next level-up or death.
fn on_experience_changed(trigger: On<ExperienceChangedEvent>, mut save: ResMut<SaveData>) {
    let leveled = save.level != trigger.level;
    save.level = trigger.level;
    save.experience = trigger.current;
    if leveled {
        storage::save(&save);
    }
}

/// Death is the other moment progress hits disk — whatever XP was earned
/// this life survives the respawn and the process alike.
fn on_player_death(trigger: On<DeathEvent>, player: Query<(), With<Player>>, save: Res<SaveData>) {
    if player.get(trigger.entity).is_ok() {
        storage::save(&save);
    }
}
