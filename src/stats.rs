use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LanguageStats {
    pub correct: u64,
    pub games: u64,
}

impl LanguageStats {
    pub fn average_score(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.correct as f64 / self.games as f64
        }
    }
}

/// Lifetime statistics across every game played.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Statistics {
    pub best_streak: u64,
    pub highest_cycle: u32,
    pub games_played: u64,
    pub language_stats: BTreeMap<String, LanguageStats>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self {
            best_streak: 0,
            highest_cycle: 1,
            games_played: 0,
            language_stats: BTreeMap::new(),
        }
    }
}

impl Statistics {
    /// A score of zero is never a personal best.
    pub fn is_new_personal_best(&self, session_score: u64) -> bool {
        session_score > 0 && session_score > self.best_streak
    }

    pub fn record_game(&mut self, session_score: u64, language: &str, current_cycle: u32) {
        self.games_played += 1;
        self.best_streak = self.best_streak.max(session_score);
        self.highest_cycle = self.highest_cycle.max(current_cycle);
        let entry = self.language_stats.entry(language.to_string()).or_default();
        entry.correct += session_score;
        entry.games += 1;
    }

    pub fn average_for(&self, language: &str) -> f64 {
        self.language_stats
            .get(language)
            .map(LanguageStats::average_score)
            .unwrap_or(0.0)
    }
}

/// Where finished games are reported.
pub trait StatsSink {
    fn statistics(&self) -> &Statistics;
    fn record_game(&mut self, session_score: u64, language: &str, current_cycle: u32) -> Result<()>;
    fn reset(&mut self) -> Result<()>;
}

/// Statistics that live only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStats {
    stats: Statistics,
}

impl StatsSink for MemoryStats {
    fn statistics(&self) -> &Statistics {
        &self.stats
    }

    fn record_game(&mut self, session_score: u64, language: &str, current_cycle: u32) -> Result<()> {
        self.stats.record_game(session_score, language, current_cycle);
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.stats = Statistics::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_games_and_tracks_bests() {
        let mut stats = Statistics::default();
        assert!(!stats.is_new_personal_best(0));
        assert!(stats.is_new_personal_best(3));
        stats.record_game(3, "es", 1);
        stats.record_game(7, "es", 2);
        stats.record_game(1, "fr", 1);

        assert_eq!(stats.games_played, 3);
        assert_eq!(stats.best_streak, 7);
        assert_eq!(stats.highest_cycle, 2);
        assert!(!stats.is_new_personal_best(7));
        assert_eq!(stats.average_for("es"), 5.0);
        assert_eq!(stats.average_for("de"), 0.0);
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let mut stats = Statistics::default();
        stats.record_game(4, "it", 1);
        let value = serde_json::to_value(&stats).unwrap();
        assert_eq!(value["bestStreak"], 4);
        assert_eq!(value["languageStats"]["it"]["games"], 1);

        let partial: Statistics = serde_json::from_str(r#"{"gamesPlayed": 2}"#).unwrap();
        assert_eq!(partial.games_played, 2);
        assert_eq!(partial.highest_cycle, 1);
    }
}
