use log::{debug, info};
use rand::Rng;

use super::engine::{record_answer, ProgressEvent};
use super::mastery::{build_level_mastery, MasteryMap, MasteryProgress, SessionStreak};
use super::phase::{available_forms, Phase};
use super::rules::ProgressionRules;
use super::selector::{compute_active_pool_size, pick_next_question, resample_pool};
use super::timing::{is_at_min_time, time_limit_for_level, TimingPolicy};
use crate::error::{DrillError, Result};
use crate::profile::Progress;
use crate::types::category::{CategoryKind, Form, Question};
use crate::types::vocabulary::CategoryView;

/// Where a game draws its items from. The progression code only needs the
/// ordered item keys and which grammatical forms each one has.
pub trait ItemCatalog<K> {
    fn kind(&self) -> CategoryKind;
    /// All items of the category, in unlock order.
    fn items(&self) -> Vec<K>;
    fn has_form(&self, item: &K, form: Form) -> bool;
}

impl ItemCatalog<String> for CategoryView<'_> {
    fn kind(&self) -> CategoryKind {
        CategoryView::kind(self)
    }

    fn items(&self) -> Vec<String> {
        CategoryView::items(self).to_vec()
    }

    fn has_form(&self, item: &String, form: Form) -> bool {
        CategoryView::has_form(self, item, form)
    }
}

/// The learner's choice when the game offers mercy at minimum time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MercyChoice {
    /// Keep the time limit, just play on.
    Retry,
    /// Play on with `mercy_bonus_seconds` more on every round.
    AddTime,
}

/// Everything needed to resume or continue a game, as one value.
///
/// Methods never mutate in place; each returns the next state.
#[derive(Debug, Clone)]
pub struct GameState<K: Ord> {
    pub progress: Progress,
    pub pool: Vec<K>,
    pub forms: Vec<Form>,
    pub mastery: MasteryMap<K>,
    pub streak: SessionStreak<K>,
    pub current: Option<Question<K>>,
    pub time_bonus_seconds: u32,
    pub mercy_used: bool,
}

impl<K: Ord + Clone> GameState<K> {
    /// First level of a session. The pool is the first items in unlock order,
    /// so a new learner always meets the same starting set.
    pub fn start<C: ItemCatalog<K>>(progress: Progress, catalog: &C, rules: &ProgressionRules) -> Result<Self> {
        let items = catalog.items();
        if items.is_empty() {
            return Err(DrillError::InvalidState("category has no items".to_string()));
        }
        let size = compute_active_pool_size(
            progress.current_cycle,
            progress.level_in_phase(rules),
            catalog.kind(),
            items.len(),
            rules,
        );
        let pool: Vec<K> = items.into_iter().take(size).collect();
        let forms = available_forms(catalog.kind(), progress.current_cycle);
        let mastery = build_level_mastery(&pool, &forms, |item, form| catalog.has_form(item, form));
        info!(
            "Starting at level {} ({}), cycle {}, pool of {}",
            progress.level_in_cycle(rules),
            progress.phase(rules),
            progress.current_cycle,
            pool.len()
        );

        Ok(Self {
            progress,
            pool,
            forms,
            mastery,
            streak: SessionStreak::new(),
            current: None,
            time_bonus_seconds: 0,
            mercy_used: false,
        })
    }

    pub fn phase(&self, rules: &ProgressionRules) -> Phase {
        self.progress.phase(rules)
    }

    pub fn time_limit_ms(&self, rules: &ProgressionRules, timing: &TimingPolicy) -> u64 {
        time_limit_for_level(self.progress.levels_completed, self.time_bonus_seconds, rules, timing)
    }

    pub fn is_at_min_time(&self, rules: &ProgressionRules, timing: &TimingPolicy) -> bool {
        is_at_min_time(
            self.progress.levels_completed,
            self.phase(rules).is_typing(),
            rules,
            timing,
        )
    }

    /// Mercy is offered once per session, and only at the bottom of the staircase.
    pub fn mercy_available(&self, rules: &ProgressionRules, timing: &TimingPolicy) -> bool {
        !self.mercy_used && self.is_at_min_time(rules, timing)
    }

    pub fn mastery_progress(&self, rules: &ProgressionRules) -> MasteryProgress {
        self.mastery.progress(rules.mastery_threshold)
    }

    /// Picks the next question, avoiding the item just asked.
    pub fn with_next_question<R: Rng + ?Sized>(&self, rules: &ProgressionRules, rng: &mut R) -> Result<Self> {
        let previous = self.current.as_ref().map(|q| &q.item);
        let question = pick_next_question(
            &self.pool,
            &self.forms,
            &self.mastery,
            previous,
            rules.mastery_threshold,
            rng,
        )?;
        Ok(Self { current: Some(question), ..self.clone() })
    }

    /// Feeds an answer to the current question through the engine.
    pub fn answer(
        &self,
        is_correct: bool,
        rules: &ProgressionRules,
        timing: &TimingPolicy,
    ) -> Result<(Self, Vec<ProgressEvent<K>>)> {
        let asked = self
            .current
            .as_ref()
            .ok_or_else(|| DrillError::InvalidState("answer given with no question asked".to_string()))?;
        let outcome = record_answer(
            &self.progress,
            &self.mastery,
            &self.streak,
            asked,
            is_correct,
            self.time_bonus_seconds,
            rules,
            timing,
        );
        let next = Self {
            progress: outcome.progress,
            mastery: outcome.mastery,
            streak: outcome.streak,
            ..self.clone()
        };
        Ok((next, outcome.events))
    }

    /// Sets up the level `progress` now points at: new pool size, a fresh random
    /// sample of the whole category, forms for the current cycle, zeroed mastery.
    /// The session streak carries over.
    pub fn advance_level<C, R>(&self, catalog: &C, rules: &ProgressionRules, rng: &mut R) -> Self
    where
        C: ItemCatalog<K>,
        R: Rng + ?Sized,
    {
        let items = catalog.items();
        let size = compute_active_pool_size(
            self.progress.current_cycle,
            self.progress.level_in_phase(rules),
            catalog.kind(),
            items.len(),
            rules,
        );
        let pool = resample_pool(&items, size, rng);
        let forms = available_forms(catalog.kind(), self.progress.current_cycle);
        let mastery = build_level_mastery(&pool, &forms, |item, form| catalog.has_form(item, form));
        debug!("New level pool of {} with {} mastery keys", pool.len(), mastery.len());
        Self { pool, forms, mastery, ..self.clone() }
    }

    pub fn with_mercy(&self, choice: MercyChoice, timing: &TimingPolicy) -> Self {
        let bonus = match choice {
            MercyChoice::Retry => 0,
            MercyChoice::AddTime => timing.mercy_bonus_seconds,
        };
        Self {
            mercy_used: true,
            time_bonus_seconds: self.time_bonus_seconds.saturating_add(bonus),
            ..self.clone()
        }
    }
}
