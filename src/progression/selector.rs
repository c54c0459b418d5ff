use rand::seq::SliceRandom;
use rand::Rng;

use super::mastery::MasteryMap;
use super::rules::{ProgressionRules, COLOUR_UNLOCK_COUNTS};
use crate::error::{DrillError, Result};
use crate::types::category::{CategoryKind, Form, MasteryKey, Question};

/// Picks the next question for the level.
///
/// Unmastered pairs are preferred, and among those any pair whose item differs
/// from `previous_item`. A repeat of the previous item is only returned when
/// nothing else is left. If every pair is mastered, falls back to the base
/// form of a pool item.
pub fn pick_next_question<K, R>(
    pool: &[K],
    forms: &[Form],
    mastery: &MasteryMap<K>,
    previous_item: Option<&K>,
    mastery_threshold: u32,
    rng: &mut R,
) -> Result<Question<K>>
where
    K: Ord + Clone,
    R: Rng + ?Sized,
{
    if pool.is_empty() {
        return Err(DrillError::InvalidState("question requested for an empty pool".to_string()));
    }
    if forms.is_empty() {
        return Err(DrillError::InvalidState("question requested with no available forms".to_string()));
    }

    let unmastered: Vec<MasteryKey<K>> = pool
        .iter()
        .flat_map(|item| forms.iter().map(move |&form| MasteryKey::new(item.clone(), form)))
        .filter(|key| mastery.is_unmastered(key, mastery_threshold))
        .collect();

    let candidates = if unmastered.is_empty() {
        pool.iter().cloned().map(MasteryKey::base).collect()
    } else {
        unmastered
    };

    let fresh: Vec<&MasteryKey<K>> = candidates
        .iter()
        .filter(|key| previous_item != Some(&key.item))
        .collect();

    let picked = if fresh.is_empty() {
        candidates.choose(rng)
    } else {
        fresh.choose(rng).copied()
    };
    // candidates is non-empty: either unmastered pairs or the non-empty pool.
    picked
        .cloned()
        .ok_or_else(|| DrillError::InvalidState("no question candidates".to_string()))
}

/// A uniformly shuffled copy of `full_items`, cut to `desired_size`.
pub fn resample_pool<K, R>(full_items: &[K], desired_size: usize, rng: &mut R) -> Vec<K>
where
    K: Clone,
    R: Rng + ?Sized,
{
    let mut pool = full_items.to_vec();
    pool.shuffle(rng);
    pool.truncate(desired_size);
    pool
}

/// How many items the pool holds for this level.
///
/// Colours grow with the cycle. Other categories grow within a phase, one
/// extra item every `buttons_add_interval` levels.
pub fn compute_active_pool_size(
    cycle: u32,
    level_in_phase: u32,
    kind: CategoryKind,
    category_size: usize,
    rules: &ProgressionRules,
) -> usize {
    let wanted = match kind {
        CategoryKind::Colour => {
            let index = (cycle.max(1) as usize - 1).min(COLOUR_UNLOCK_COUNTS.len() - 1);
            COLOUR_UNLOCK_COUNTS[index]
        }
        CategoryKind::Noun | CategoryKind::Adjective => {
            let extra = level_in_phase.saturating_sub(1) / rules.buttons_add_interval;
            rules.starting_button_count + extra as usize
        }
    };
    wanted.min(category_size)
}

/// Colours that join the unlocked set when `new_cycle` begins. `all_colours`
/// must be in unlock order.
pub fn newly_unlocked_colours<K: Clone>(
    all_colours: &[K],
    old_cycle: u32,
    new_cycle: u32,
    rules: &ProgressionRules,
) -> Vec<K> {
    let before = compute_active_pool_size(old_cycle, 1, CategoryKind::Colour, all_colours.len(), rules);
    let after = compute_active_pool_size(new_cycle, 1, CategoryKind::Colour, all_colours.len(), rules);
    all_colours
        .get(before..after)
        .map(<[K]>::to_vec)
        .unwrap_or_default()
}
