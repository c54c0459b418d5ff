use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::progression::phase::{self, Phase};
use crate::progression::rules::ProgressionRules;
use crate::types::category::Category;

/// Language that pre-category progress documents belonged to.
pub const LEGACY_LANGUAGE: &str = "es";

/// Old records only knew a running answer count; ten answers made a level and
/// the level counter wrapped at 30.
const LEGACY_ANSWERS_PER_LEVEL: u64 = 10;
const LEGACY_LEVEL_WRAP: u64 = 30;

/// Largest counters a stored record may carry. Anything beyond is treated as
/// a corrupt record and loads as fresh progress.
pub const MAX_STORED_CYCLE: u32 = 100_000;
pub const MAX_STORED_LEVELS: u32 = 10_000_000;

/// Persisted learner progress for one language x category.
///
/// Field names on disk are the historic ones (`totalAnswers`), so existing
/// documents keep loading.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(from = "StoredProgress")]
pub struct Progress {
    #[serde(rename = "totalAnswers")]
    pub total_correct_answers: u64,
    #[serde(rename = "currentCycle")]
    pub current_cycle: u32,
    #[serde(rename = "levelsCompleted")]
    pub levels_completed: u32,
}

impl Default for Progress {
    fn default() -> Self {
        Self { total_correct_answers: 0, current_cycle: 1, levels_completed: 0 }
    }
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self, rules: &ProgressionRules) -> Phase {
        phase::phase_from_levels_completed(self.levels_completed, rules)
    }

    pub fn level_in_phase(&self, rules: &ProgressionRules) -> u32 {
        phase::level_in_phase(self.levels_completed, rules)
    }

    pub fn level_in_cycle(&self, rules: &ProgressionRules) -> u32 {
        phase::level_in_cycle(self.levels_completed, rules)
    }

    /// Moves to the first level of `target` within the current cycle. This is an
    /// explicit learner choice, like a reset, so it may move backwards.
    pub fn jump_to_phase(&self, target: Phase, rules: &ProgressionRules) -> Progress {
        Progress {
            levels_completed: phase::phase_start(self.current_cycle, target, rules),
            ..*self
        }
    }
}

pub fn legacy_levels_completed(total_answers: u64) -> u32 {
    ((total_answers / LEGACY_ANSWERS_PER_LEVEL) % LEGACY_LEVEL_WRAP) as u32
}

// Lenient on-disk shape: every field optional, missing levelsCompleted is
// backfilled from the answer count.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
struct StoredProgress {
    #[serde(rename = "totalAnswers", alias = "totalCorrectAnswers")]
    total_answers: Option<u64>,
    #[serde(rename = "currentCycle")]
    current_cycle: Option<u32>,
    #[serde(rename = "levelsCompleted")]
    levels_completed: Option<u32>,
}

impl From<StoredProgress> for Progress {
    fn from(stored: StoredProgress) -> Self {
        let total = stored.total_answers.unwrap_or(0);
        let progress = Progress {
            total_correct_answers: total,
            current_cycle: stored.current_cycle.unwrap_or(1).max(1),
            levels_completed: stored
                .levels_completed
                .unwrap_or_else(|| legacy_levels_completed(total)),
        };
        if progress.current_cycle > MAX_STORED_CYCLE || progress.levels_completed > MAX_STORED_LEVELS {
            warn!(
                "Progress record out of range (cycle {}, levels {}); starting fresh",
                progress.current_cycle, progress.levels_completed
            );
            return Progress::default();
        }
        progress
    }
}

/// Storage key: colours predate categories and use the bare language code.
pub fn progress_key(language: &str, category: Category) -> String {
    match category {
        Category::Colours => language.to_string(),
        other => format!("{}_{}", language, other.slug()),
    }
}

/// Every progress record the learner has, keyed by [`progress_key`].
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct ProgressDocument {
    pub languages: BTreeMap<String, Progress>,
}

impl ProgressDocument {
    /// Interprets any JSON value as a progress document. Unrecognised shapes
    /// give an empty document; unreadable records are dropped individually.
    pub fn from_value(value: Value) -> Self {
        let Value::Object(mut root) = value else {
            warn!("Progress document is not a JSON object; starting fresh");
            return Self::default();
        };

        if !root.contains_key("languages") && root.contains_key("totalAnswers") {
            let legacy: Progress = serde_json::from_value(Value::Object(root)).unwrap_or_default();
            let migrated = Progress {
                levels_completed: legacy_levels_completed(legacy.total_correct_answers),
                ..legacy
            };
            let mut languages = BTreeMap::new();
            languages.insert(progress_key(LEGACY_LANGUAGE, Category::Colours), migrated);
            return Self { languages };
        }

        let mut languages = BTreeMap::new();
        if let Some(Value::Object(records)) = root.remove("languages") {
            for (key, record) in records {
                match serde_json::from_value::<Progress>(record) {
                    Ok(progress) => {
                        languages.insert(key, progress);
                    }
                    Err(e) => warn!("Dropping unreadable progress record '{}': {}", key, e),
                }
            }
        }
        Self { languages }
    }

    pub fn get(&self, language: &str, category: Category) -> Progress {
        self.languages
            .get(&progress_key(language, category))
            .copied()
            .unwrap_or_default()
    }

    pub fn set(&mut self, language: &str, category: Category, progress: Progress) {
        self.languages.insert(progress_key(language, category), progress);
    }

    /// Clears every category of one language.
    pub fn remove_language(&mut self, language: &str) {
        for category in Category::ALL {
            self.languages.remove(&progress_key(language, category));
        }
    }

    pub fn total_correct_all(&self) -> u64 {
        self.languages.values().map(|p| p.total_correct_answers).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn legacy_single_language_document_migrates() {
        let doc = ProgressDocument::from_value(json!({"totalAnswers": 123, "currentCycle": 2}));
        let progress = doc.get("es", Category::Colours);
        assert_eq!(progress.levels_completed, 12);
        assert_eq!(progress.total_correct_answers, 123);
        assert_eq!(progress.current_cycle, 2);
    }

    #[test]
    fn record_without_levels_is_backfilled() {
        let doc = ProgressDocument::from_value(json!({
            "languages": {"fr_animals": {"totalAnswers": 345, "currentCycle": 1}}
        }));
        assert_eq!(doc.get("fr", Category::Animals).levels_completed, 4);
    }

    #[test]
    fn corrupt_input_gives_zeroed_progress() {
        let doc = ProgressDocument::from_value(json!("garbage"));
        assert_eq!(doc.get("es", Category::Food), Progress::default());

        let doc = ProgressDocument::from_value(json!({
            "languages": {"es": {"totalAnswers": -4}, "de": {"totalAnswers": 20, "levelsCompleted": 3}}
        }));
        assert_eq!(doc.get("es", Category::Colours), Progress::default());
        assert_eq!(doc.get("de", Category::Colours).levels_completed, 3);
    }

    #[test]
    fn out_of_range_counters_load_as_fresh_progress() {
        let rules = ProgressionRules::default();
        let doc = ProgressDocument::from_value(json!({
            "languages": {
                "es": {"totalAnswers": 50, "levelsCompleted": 4294967295u32},
                "fr": {"totalAnswers": 50, "currentCycle": 200000000},
                "de": {"totalAnswers": 50, "currentCycle": 3, "levelsCompleted": 85}
            }
        }));
        assert_eq!(doc.get("es", Category::Colours), Progress::default());
        assert_eq!(doc.get("fr", Category::Colours), Progress::default());
        assert_eq!(doc.get("de", Category::Colours).levels_completed, 85);

        let jumped = doc.get("fr", Category::Colours).jump_to_phase(Phase::Speech, &rules);
        assert_eq!(jumped.levels_completed, 30);
    }

    #[test]
    fn jump_saturates_on_the_largest_accepted_cycle() {
        let rules = ProgressionRules { levels_per_phase: u32::MAX, ..ProgressionRules::default() };
        let progress = Progress { current_cycle: MAX_STORED_CYCLE, ..Progress::default() };
        let jumped = progress.jump_to_phase(Phase::Speech, &rules);
        assert_eq!(jumped.levels_completed, u32::MAX);
    }

    #[test]
    fn keys_and_serialized_names_match_stored_format() {
        assert_eq!(progress_key("es", Category::Colours), "es");
        assert_eq!(progress_key("es", Category::Weather), "es_weather");

        let progress = Progress { total_correct_answers: 7, current_cycle: 2, levels_completed: 41 };
        let value = serde_json::to_value(progress).unwrap();
        assert_eq!(value, json!({"totalAnswers": 7, "currentCycle": 2, "levelsCompleted": 41}));
    }

    #[test]
    fn jump_to_phase_stays_in_current_cycle() {
        let rules = ProgressionRules::default();
        let progress = Progress { total_correct_answers: 90, current_cycle: 2, levels_completed: 47 };
        let jumped = progress.jump_to_phase(Phase::Speech, &rules);
        assert_eq!(jumped.levels_completed, 70);
        assert_eq!(jumped.phase(&rules), Phase::Speech);
        assert_eq!(jumped.total_correct_answers, 90);
    }

    #[test]
    fn remove_language_clears_all_its_categories() {
        let mut doc = ProgressDocument::default();
        let progress = Progress { total_correct_answers: 5, ..Progress::default() };
        doc.set("es", Category::Colours, progress);
        doc.set("es", Category::Food, progress);
        doc.set("fr", Category::Food, progress);
        doc.remove_language("es");
        assert_eq!(doc.languages.len(), 1);
        assert_eq!(doc.total_correct_all(), 5);
    }
}
