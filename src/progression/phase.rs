use serde::{Deserialize, Serialize};
use std::fmt;

use super::rules::{ProgressionRules, ARTICLE_CYCLE, FEMININE_CYCLE, PHASE_COUNT, PLURAL_CYCLE};
use crate::types::category::{CategoryKind, Form};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Phase {
    Learning = 0,
    Practice = 1,
    Typing = 2,
    Speech = 3,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Learning, Phase::Practice, Phase::Typing, Phase::Speech];

    /// Wraps, so any ordinal maps to a phase.
    pub fn from_index(index: u32) -> Phase {
        Phase::ALL[(index % PHASE_COUNT) as usize]
    }

    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Learning => "Learning",
            Phase::Practice => "Practice",
            Phase::Typing => "Typing",
            Phase::Speech => "Speech",
        }
    }

    pub fn is_typing(self) -> bool {
        self == Phase::Typing
    }

    /// Only the button phases read the word aloud; in Typing and Speech it
    /// would give the answer away.
    pub fn speaks_prompt(self) -> bool {
        matches!(self, Phase::Learning | Phase::Practice)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn phase_from_levels_completed(levels_completed: u32, rules: &ProgressionRules) -> Phase {
    Phase::from_index(levels_completed / rules.levels_per_phase)
}

/// 1-based level within the current phase.
pub fn level_in_phase(levels_completed: u32, rules: &ProgressionRules) -> u32 {
    levels_completed % rules.levels_per_phase + 1
}

/// 1-based level within the current cycle.
pub fn level_in_cycle(levels_completed: u32, rules: &ProgressionRules) -> u32 {
    levels_completed % rules.levels_per_cycle() + 1
}

/// `levels_completed` value at which `phase` of `cycle` starts.
pub fn phase_start(cycle: u32, phase: Phase, rules: &ProgressionRules) -> u32 {
    cycle
        .saturating_sub(1)
        .saturating_mul(rules.levels_per_cycle())
        .saturating_add(phase.index().saturating_mul(rules.levels_per_phase))
}

/// Grammatical forms drilled for a category kind at a given cycle. Always
/// starts with `Form::Base`.
pub fn available_forms(kind: CategoryKind, cycle: u32) -> Vec<Form> {
    match kind {
        CategoryKind::Colour => vec![Form::Base],
        CategoryKind::Adjective if cycle >= FEMININE_CYCLE => vec![Form::Base, Form::Feminine],
        CategoryKind::Adjective => vec![Form::Base],
        CategoryKind::Noun if cycle >= PLURAL_CYCLE => vec![Form::Base, Form::Article, Form::Plural],
        CategoryKind::Noun if cycle >= ARTICLE_CYCLE => vec![Form::Base, Form::Article],
        CategoryKind::Noun => vec![Form::Base],
    }
}

/// Forms that become available when moving from `old_cycle` to `new_cycle`.
pub fn newly_unlocked_forms(kind: CategoryKind, old_cycle: u32, new_cycle: u32) -> Vec<Form> {
    let before = available_forms(kind, old_cycle);
    available_forms(kind, new_cycle)
        .into_iter()
        .filter(|form| !before.contains(form))
        .collect()
}
