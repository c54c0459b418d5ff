use serde::Deserialize;

use super::phase::{level_in_phase, phase_from_levels_completed};
use super::rules::ProgressionRules;
use crate::profile::Progress;

pub const MAX_TIME_SECONDS: u32 = 10;
pub const TIME_STEP_SECONDS: u32 = 2;
pub const MIN_TIME_SECONDS: u32 = 2;
pub const MERCY_BONUS_SECONDS: u32 = 2;

/// Time-limit staircase settings. Each level in a phase takes `step_seconds`
/// off `max_seconds` until the floor is reached; a new phase starts again at
/// `max_seconds`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TimingPolicy {
    pub max_seconds: u32,
    pub step_seconds: u32,
    pub min_seconds: u32,
    /// Separate floor for typed answers. `None` means typing uses `min_seconds`.
    pub typing_min_seconds: Option<u32>,
    /// Seconds granted each time the learner takes the "add time" mercy.
    pub mercy_bonus_seconds: u32,
}

impl Default for TimingPolicy {
    fn default() -> Self {
        Self {
            max_seconds: MAX_TIME_SECONDS,
            step_seconds: TIME_STEP_SECONDS,
            min_seconds: MIN_TIME_SECONDS,
            typing_min_seconds: None,
            mercy_bonus_seconds: MERCY_BONUS_SECONDS,
        }
    }
}

impl TimingPolicy {
    pub fn floor_seconds(&self, mode_is_typing: bool) -> u32 {
        match self.typing_min_seconds {
            Some(floor) if mode_is_typing => floor,
            _ => self.min_seconds,
        }
    }

    /// Seconds allowed before any bonus is added.
    pub fn base_seconds(&self, level_in_phase: u32, mode_is_typing: bool) -> u32 {
        let ramp = self
            .max_seconds
            .saturating_sub(level_in_phase.saturating_sub(1).saturating_mul(self.step_seconds));
        ramp.max(self.floor_seconds(mode_is_typing))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.min_seconds == 0 {
            return Err("timing.min_seconds must be at least 1".to_string());
        }
        if self.max_seconds < self.min_seconds {
            return Err("timing.max_seconds must not be below timing.min_seconds".to_string());
        }
        if self.typing_min_seconds == Some(0) {
            return Err("timing.typing_min_seconds must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Time limit in milliseconds for a round at `levels_completed`.
pub fn compute_time_limit(
    levels_completed: u32,
    time_bonus_seconds: u32,
    mode_is_typing: bool,
    rules: &ProgressionRules,
    timing: &TimingPolicy,
) -> u64 {
    let lip = level_in_phase(levels_completed, rules);
    let seconds = timing.base_seconds(lip, mode_is_typing).saturating_add(time_bonus_seconds);
    u64::from(seconds) * 1000
}

/// Time limit with the input mode taken from the phase `levels_completed` is in.
pub fn time_limit_for_level(
    levels_completed: u32,
    time_bonus_seconds: u32,
    rules: &ProgressionRules,
    timing: &TimingPolicy,
) -> u64 {
    let typing = phase_from_levels_completed(levels_completed, rules).is_typing();
    compute_time_limit(levels_completed, time_bonus_seconds, typing, rules, timing)
}

/// True once the staircase has bottomed out. Ignores any bonus: a learner who
/// bought extra seconds at the floor is still "at minimum".
pub fn is_at_min_time(
    levels_completed: u32,
    mode_is_typing: bool,
    rules: &ProgressionRules,
    timing: &TimingPolicy,
) -> bool {
    let lip = level_in_phase(levels_completed, rules);
    timing.base_seconds(lip, mode_is_typing) <= timing.floor_seconds(mode_is_typing)
}

/// Whether completing the current level would change the time limit.
pub fn will_time_change_on_level_up(
    progress: &Progress,
    time_bonus_seconds: u32,
    rules: &ProgressionRules,
    timing: &TimingPolicy,
) -> bool {
    let now = time_limit_for_level(progress.levels_completed, time_bonus_seconds, rules, timing);
    let next_level = progress.levels_completed.saturating_add(1);
    let next = time_limit_for_level(next_level, time_bonus_seconds, rules, timing);
    now != next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seconds(levels_completed: u32, bonus: u32, typing: bool, timing: &TimingPolicy) -> u64 {
        compute_time_limit(levels_completed, bonus, typing, &ProgressionRules::default(), timing) / 1000
    }

    #[test]
    fn staircase_descends_then_flattens() {
        let timing = TimingPolicy::default();
        let got: Vec<u64> = (0..10).map(|l| seconds(l, 0, false, &timing)).collect();
        assert_eq!(got, vec![10, 8, 6, 4, 2, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn staircase_resets_each_phase() {
        let timing = TimingPolicy::default();
        assert_eq!(seconds(9, 0, false, &timing), 2);
        assert_eq!(seconds(10, 0, false, &timing), 10);
        assert_eq!(seconds(41, 0, false, &timing), 8);
    }

    #[test]
    fn bonus_is_added_on_top() {
        let timing = TimingPolicy::default();
        assert_eq!(seconds(0, 4, false, &timing), 14);
        assert_eq!(seconds(7, 2, false, &timing), 4);
    }

    #[test]
    fn typing_floor_only_applies_when_configured_and_typing() {
        let timing = TimingPolicy { typing_min_seconds: Some(1), ..TimingPolicy::default() };
        assert_eq!(seconds(25, 0, true, &timing), 1);
        assert_eq!(seconds(25, 0, false, &timing), 2);
        assert_eq!(seconds(25, 0, true, &TimingPolicy::default()), 2);
    }

    #[test]
    fn min_time_check_ignores_bonus() {
        let rules = ProgressionRules::default();
        let timing = TimingPolicy::default();
        assert!(!is_at_min_time(3, false, &rules, &timing));
        assert!(is_at_min_time(4, false, &rules, &timing));
        assert!(is_at_min_time(9, false, &rules, &timing));
        // Level 5 with bonus seconds still counts as the floor.
        assert!(seconds(4, 2, false, &timing) > 2);
        assert!(is_at_min_time(4, false, &rules, &timing));
    }

    #[test]
    fn lookahead_detects_time_changes_without_mutating() {
        let rules = ProgressionRules::default();
        let timing = TimingPolicy::default();
        let progress = Progress { levels_completed: 2, ..Progress::default() };
        assert!(will_time_change_on_level_up(&progress, 0, &rules, &timing));
        assert_eq!(progress.levels_completed, 2);

        let flat = Progress { levels_completed: 6, ..Progress::default() };
        assert!(!will_time_change_on_level_up(&flat, 0, &rules, &timing));

        // Last level of a phase: the next phase resets to the maximum.
        let end_of_phase = Progress { levels_completed: 9, ..Progress::default() };
        assert!(will_time_change_on_level_up(&end_of_phase, 0, &rules, &timing));
    }
}
