//! Score, multiplier and session counters

use serde::{Deserialize, Serialize};

/// Multiplier floor
pub const MIN_MULTIPLIER: f32 = 1.0;
/// Multiplier ceiling
pub const MAX_MULTIPLIER: f32 = 5.0;

/// Per-attempt counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub score: u64,
    pub score_multiplier: f32,
    pub enemies_killed: u32,
    pub pods_rescued: u32,
    pub pods_lost: u32,
    /// Current wave (1-based; boss encounter counts as its own wave)
    pub current_wave: u32,
}

impl Default for SessionStats {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStats {
    pub fn new() -> Self {
        Self {
            score: 0,
            score_multiplier: MIN_MULTIPLIER,
            enemies_killed: 0,
            pods_rescued: 0,
            pods_lost: 0,
            current_wave: 0,
        }
    }

    /// Add `floor(points * multiplier)`; returns what was awarded
    pub fn add_score(&mut self, points: u32) -> u64 {
        let awarded = (points as f64 * self.score_multiplier as f64).floor() as u64;
        self.score = self.score.saturating_add(awarded);
        awarded
    }

    /// Shift the multiplier by `delta`, clamped
    pub fn adjust_multiplier(&mut self, delta: f32) {
        self.set_multiplier(self.score_multiplier + delta);
    }

    /// Scale the multiplier by `factor`, clamped
    pub fn scale_multiplier(&mut self, factor: f32) {
        self.set_multiplier(self.score_multiplier * factor);
    }

    fn set_multiplier(&mut self, value: f32) {
        self.score_multiplier = if value.is_nan() {
            MIN_MULTIPLIER
        } else {
            value.clamp(MIN_MULTIPLIER, MAX_MULTIPLIER)
        };
    }

    pub fn summary(&self, level: u32, victory: bool) -> LevelSummary {
        LevelSummary {
            level,
            score: self.score,
            wave: self.current_wave,
            enemies_killed: self.enemies_killed,
            pods_rescued: self.pods_rescued,
            victory,
        }
    }
}

/// Record handed to the end-of-level screen and the progress store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub level: u32,
    pub score: u64,
    pub wave: u32,
    pub enemies_killed: u32,
    pub pods_rescued: u32,
    pub victory: bool,
}
