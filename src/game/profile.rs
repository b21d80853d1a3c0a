//! Player profile persistence: tutorial progress and power-up unlocks.
//!
//! Stored next to the high scores as a small JSON file.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<PlayerProfile>();
    app.add_systems(Startup, load_profile);
}

/// Power-ups earned by reaching level milestones; they persist across
/// sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpFlag {
    /// Restarts the level instead of losing, once per level.
    ExtraLife,
    /// Freezes the ceiling for a while on demand.
    FreezeCeiling,
    /// Pauses the level timer for a while on demand.
    PauseTimer,
}

#[derive(Resource, Debug, Default, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub seen_tutorial: bool,
    unlocked: Vec<PowerUpFlag>,
}

impl PlayerProfile {
    pub fn has(&self, flag: PowerUpFlag) -> bool {
        self.unlocked.contains(&flag)
    }

    /// Returns true if the flag was newly unlocked.
    pub fn unlock(&mut self, flag: PowerUpFlag) -> bool {
        if self.has(flag) {
            return false;
        }
        self.unlocked.push(flag);
        true
    }

    fn file_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("bubble-bluster").join("profile.json"))
    }

    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for the profile");
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(profile) => profile,
                Err(e) => {
                    warn!("Failed to parse profile: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read profile: {}", e);
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for saving the profile");
            return;
        };
        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("Failed to create profile directory: {}", e);
            return;
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    warn!("Failed to write profile: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize profile: {}", e),
        }
    }
}

fn load_profile(mut profile: ResMut<PlayerProfile>) {
    *profile = PlayerProfile::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlock_is_idempotent() {
        let mut profile = PlayerProfile::default();
        assert!(!profile.has(PowerUpFlag::ExtraLife));
        assert!(profile.unlock(PowerUpFlag::ExtraLife));
        assert!(!profile.unlock(PowerUpFlag::ExtraLife));
        assert!(profile.has(PowerUpFlag::ExtraLife));
    }
}
