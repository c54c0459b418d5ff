use serde::Deserialize;

/// Number of phases in a cycle: Learning, Practice, Typing, Speech.
pub const PHASE_COUNT: u32 = 4;

pub const LEVELS_PER_PHASE: u32 = 10;
pub const MASTERY_THRESHOLD: u32 = 2;
pub const REMOVAL_STREAK: u32 = 3;

/// Emoji categories start each phase with this many items on screen...
pub const STARTING_BUTTON_COUNT: usize = 4;
/// ...and gain one more every this many levels within the phase.
pub const BUTTONS_ADD_INTERVAL: u32 = 2;

/// Colour pool size by cycle (cycle 1 first). Later cycles stay at the last entry.
pub const COLOUR_UNLOCK_COUNTS: [usize; 4] = [5, 7, 9, 11];

pub const ARTICLE_CYCLE: u32 = 2;
pub const PLURAL_CYCLE: u32 = 3;
pub const FEMININE_CYCLE: u32 = 2;

/// Tunables for the progression state machine. Defaults are the constants above;
/// the `[rules]` table in config.toml can override them.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ProgressionRules {
    pub levels_per_phase: u32,
    pub mastery_threshold: u32,
    pub removal_streak: u32,
    pub starting_button_count: usize,
    pub buttons_add_interval: u32,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            levels_per_phase: LEVELS_PER_PHASE,
            mastery_threshold: MASTERY_THRESHOLD,
            removal_streak: REMOVAL_STREAK,
            starting_button_count: STARTING_BUTTON_COUNT,
            buttons_add_interval: BUTTONS_ADD_INTERVAL,
        }
    }
}

impl ProgressionRules {
    pub fn levels_per_cycle(&self) -> u32 {
        self.levels_per_phase.saturating_mul(PHASE_COUNT)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.levels_per_phase == 0 {
            return Err("rules.levels_per_phase must be at least 1".to_string());
        }
        if self.mastery_threshold == 0 {
            return Err("rules.mastery_threshold must be at least 1".to_string());
        }
        if self.removal_streak == 0 {
            return Err("rules.removal_streak must be at least 1".to_string());
        }
        if self.starting_button_count < 2 {
            return Err("rules.starting_button_count must be at least 2".to_string());
        }
        if self.buttons_add_interval == 0 {
            return Err("rules.buttons_add_interval must be at least 1".to_string());
        }
        Ok(())
    }
}
