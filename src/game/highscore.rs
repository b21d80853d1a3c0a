//! High score persistence with a top 10 leaderboard.
//!
//! Scores are saved to a local JSON file in the user's data directory.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<HighScores>();
    app.add_systems(Startup, load_high_scores);
}

/// Maximum number of high scores to keep.
const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub score: u32,
    pub level: u32,
}

/// Resource holding the top 10 high scores.
#[derive(Resource, Debug, Default, Serialize, Deserialize)]
pub struct HighScores {
    pub entries: Vec<ScoreEntry>,
}

impl HighScores {
    pub fn best(&self) -> Option<u32> {
        self.entries.first().map(|entry| entry.score)
    }

    /// Add a score to the leaderboard if it qualifies, keeping the list
    /// sorted descending. Returns true if the score was added.
    pub fn add_score(&mut self, score: u32, level: u32) -> bool {
        if score == 0 {
            return false;
        }

        let pos = self
            .entries
            .iter()
            .position(|e| score > e.score)
            .unwrap_or(self.entries.len());

        if pos >= MAX_HIGH_SCORES {
            return false;
        }

        self.entries.insert(pos, ScoreEntry { score, level });
        if self.entries.len() > MAX_HIGH_SCORES {
            self.entries.truncate(MAX_HIGH_SCORES);
        }
        true
    }

    fn file_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("bubble-bluster").join("highscores.json"))
    }

    /// Load high scores from disk.
    pub fn load() -> Self {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for high scores");
            return Self::default();
        };

        if !path.exists() {
            info!("No high scores file found at {:?}, starting fresh", path);
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(scores) => scores,
                Err(e) => {
                    warn!("Failed to parse high scores: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read high scores file: {}", e);
                Self::default()
            }
        }
    }

    /// Save high scores to disk.
    pub fn save(&self) {
        let Some(path) = Self::file_path() else {
            warn!("Could not determine data directory for saving high scores");
            return;
        };

        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!("Failed to create high scores directory: {}", e);
            return;
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = fs::write(&path, json) {
                    warn!("Failed to write high scores: {}", e);
                }
            }
            Err(e) => warn!("Failed to serialize high scores: {}", e),
        }
    }
}

fn load_high_scores(mut high_scores: ResMut<HighScores>) {
    *high_scores = HighScores::load();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scores_stay_sorted_descending() {
        let mut scores = HighScores::default();
        scores.add_score(100, 1);
        scores.add_score(300, 2);
        scores.add_score(200, 1);
        let values: Vec<u32> = scores.entries.iter().map(|e| e.score).collect();
        assert_eq!(values, vec![300, 200, 100]);
        assert_eq!(scores.best(), Some(300));
    }

    #[test]
    fn zero_scores_are_rejected() {
        let mut scores = HighScores::default();
        assert!(!scores.add_score(0, 5));
        assert!(scores.entries.is_empty());
    }

    #[test]
    fn leaderboard_caps_at_ten() {
        let mut scores = HighScores::default();
        for i in 1..=12 {
            scores.add_score(i * 10, 1);
        }
        assert_eq!(scores.entries.len(), 10);
        assert_eq!(scores.best(), Some(120));
        assert!(!scores.add_score(5, 1));
    }
}
