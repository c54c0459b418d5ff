use log::debug;

use super::mastery::{MasteryMap, SessionStreak};
use super::phase::Phase;
use super::rules::ProgressionRules;
use super::timing::{will_time_change_on_level_up, TimingPolicy};
use crate::profile::Progress;
use crate::types::category::MasteryKey;

/// What an answer did to the learner's progression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent<K> {
    /// The key hit the removal streak and left this level's mastery map.
    Pruned(MasteryKey<K>),
    /// A level inside the current cycle was completed.
    LevelComplete {
        levels_completed: u32,
        level_in_cycle: u32,
        previous_phase: Phase,
        phase: Phase,
        time_changed: bool,
    },
    /// The last level of a cycle was completed. Replaces `LevelComplete`.
    CycleComplete { completed_cycle: u32, new_cycle: u32 },
    /// Wrong answer: nothing advanced.
    NoChange,
}

impl<K> ProgressEvent<K> {
    pub fn phase_changed(&self) -> bool {
        matches!(self, ProgressEvent::LevelComplete { previous_phase, phase, .. } if previous_phase != phase)
    }
}

#[derive(Debug, Clone)]
pub struct AnswerOutcome<K: Ord> {
    pub progress: Progress,
    pub mastery: MasteryMap<K>,
    pub streak: SessionStreak<K>,
    pub events: Vec<ProgressEvent<K>>,
}

impl<K: Ord> AnswerOutcome<K> {
    /// True for both a plain level-up and a cycle completion.
    pub fn level_completed(&self) -> bool {
        self.events.iter().any(|event| {
            matches!(event, ProgressEvent::LevelComplete { .. } | ProgressEvent::CycleComplete { .. })
        })
    }

    pub fn cycle_completed(&self) -> bool {
        self.events
            .iter()
            .any(|event| matches!(event, ProgressEvent::CycleComplete { .. }))
    }
}

/// Applies one answer to the question `asked` and returns the next state.
///
/// Counters in `Progress` only ever grow here. On a wrong answer only the
/// streak for the asked key changes; ending the round is the caller's call.
pub fn record_answer<K: Ord + Clone>(
    progress: &Progress,
    mastery: &MasteryMap<K>,
    streak: &SessionStreak<K>,
    asked: &MasteryKey<K>,
    is_correct: bool,
    time_bonus_seconds: u32,
    rules: &ProgressionRules,
    timing: &TimingPolicy,
) -> AnswerOutcome<K> {
    let mut progress = *progress;
    let mut mastery = mastery.clone();
    let mut streak = streak.clone();
    let mut events = Vec::new();

    if !is_correct {
        streak.reset(asked);
        events.push(ProgressEvent::NoChange);
        return AnswerOutcome { progress, mastery, streak, events };
    }

    progress.total_correct_answers = progress.total_correct_answers.saturating_add(1);
    mastery.record_correct(asked);
    if streak.increment(asked) >= rules.removal_streak && mastery.remove(asked) {
        debug!("Pruned a key after {} consecutive correct answers", rules.removal_streak);
        events.push(ProgressEvent::Pruned(asked.clone()));
    }

    if mastery.is_empty() || mastery.is_mastered(rules.mastery_threshold) {
        let previous_phase = progress.phase(rules);
        let time_changed = will_time_change_on_level_up(&progress, time_bonus_seconds, rules, timing);
        progress.levels_completed = progress.levels_completed.saturating_add(1);

        if progress.levels_completed % rules.levels_per_cycle() == 0 {
            let completed_cycle = progress.current_cycle;
            progress.current_cycle = progress.current_cycle.saturating_add(1);
            events.push(ProgressEvent::CycleComplete {
                completed_cycle,
                new_cycle: progress.current_cycle,
            });
        } else {
            events.push(ProgressEvent::LevelComplete {
                levels_completed: progress.levels_completed,
                level_in_cycle: progress.level_in_cycle(rules),
                previous_phase,
                phase: progress.phase(rules),
                time_changed,
            });
        }
    }

    AnswerOutcome { progress, mastery, streak, events }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progression::mastery::build_level_mastery;
    use crate::types::category::Form;

    fn answer(
        progress: &Progress,
        mastery: &MasteryMap<&'static str>,
        streak: &SessionStreak<&'static str>,
        item: &'static str,
        correct: bool,
    ) -> AnswerOutcome<&'static str> {
        record_answer(
            progress,
            mastery,
            streak,
            &MasteryKey::base(item),
            correct,
            0,
            &ProgressionRules::default(),
            &TimingPolicy::default(),
        )
    }

    #[test]
    fn five_item_level_completes_after_ten_correct_answers() {
        let pool = ["red", "green", "blue", "yellow", "orange"];
        let mut mastery = build_level_mastery(&pool, &[Form::Base], |_, _| true);
        let mut streak = SessionStreak::new();
        let mut progress = Progress::default();
        let mut level_ups = 0;

        // Alternate through the pool twice so no key reaches the removal streak.
        for &item in pool.iter().chain(pool.iter()) {
            let outcome = answer(&progress, &mastery, &streak, item, true);
            if outcome.level_completed() {
                level_ups += 1;
            }
            progress = outcome.progress;
            mastery = outcome.mastery;
            streak = outcome.streak;
        }

        assert_eq!(level_ups, 1);
        assert_eq!(progress.levels_completed, 1);
        assert_eq!(progress.total_correct_answers, 10);
        assert_eq!(progress.current_cycle, 1);
    }

    #[test]
    fn wrong_answer_resets_streak_of_asked_key_only() {
        let mastery = build_level_mastery(&["a", "b"], &[Form::Base], |_, _| true);
        let mut streak = SessionStreak::new();
        streak.increment(&MasteryKey::base("a"));
        streak.increment(&MasteryKey::base("b"));

        let outcome = answer(&Progress::default(), &mastery, &streak, "a", false);
        assert_eq!(outcome.events, vec![ProgressEvent::NoChange]);
        assert_eq!(outcome.streak.get(&MasteryKey::base("a")), 0);
        assert_eq!(outcome.streak.get(&MasteryKey::base("b")), 1);
        assert_eq!(outcome.progress, Progress::default());
        assert_eq!(outcome.mastery, mastery);
    }

    #[test]
    fn removal_streak_prunes_below_threshold_and_empty_map_masters_level() {
        let rules = ProgressionRules { mastery_threshold: 5, ..ProgressionRules::default() };
        let mastery = build_level_mastery(&["solo"], &[Form::Base], |_, _| true);
        let key = MasteryKey::base("solo");
        let mut streak = SessionStreak::new();
        // Earlier levels this session already built a streak of two.
        streak.increment(&key);
        streak.increment(&key);

        let outcome = record_answer(
            &Progress::default(),
            &mastery,
            &streak,
            &key,
            true,
            0,
            &rules,
            &TimingPolicy::default(),
        );
        assert!(outcome.events.contains(&ProgressEvent::Pruned(key.clone())));
        assert!(outcome.mastery.is_empty());
        assert!(outcome.level_completed());
        assert_eq!(outcome.progress.levels_completed, 1);
    }

    #[test]
    fn cycle_boundary_emits_cycle_complete_instead_of_level_up() {
        let mastery = build_level_mastery(&["a"], &[Form::Base], |_, _| true);
        let mut primed = mastery.clone();
        primed.record_correct(&MasteryKey::base("a"));
        let progress = Progress { total_correct_answers: 400, current_cycle: 1, levels_completed: 39 };

        let outcome = answer(&progress, &primed, &SessionStreak::new(), "a", true);
        assert_eq!(
            outcome.events,
            vec![ProgressEvent::CycleComplete { completed_cycle: 1, new_cycle: 2 }]
        );
        assert_eq!(outcome.progress.current_cycle, 2);
        assert_eq!(outcome.progress.levels_completed, 40);
    }

    #[test]
    fn phase_change_is_reported_on_last_level_of_phase() {
        let mut mastery = build_level_mastery(&["a"], &[Form::Base], |_, _| true);
        mastery.record_correct(&MasteryKey::base("a"));
        let progress = Progress { levels_completed: 9, ..Progress::default() };
        let outcome = answer(&progress, &mastery, &SessionStreak::new(), "a", true);
        let event = outcome.events.last().unwrap();
        assert!(event.phase_changed());
        assert!(matches!(
            event,
            ProgressEvent::LevelComplete { phase: Phase::Practice, time_changed: true, level_in_cycle: 11, .. }
        ));
    }

    #[test]
    fn level_up_at_the_counter_ceiling_saturates() {
        let progress = Progress { total_correct_answers: u64::MAX, current_cycle: u32::MAX, levels_completed: u32::MAX };
        let outcome = answer(&progress, &MasteryMap::new(), &SessionStreak::new(), "a", true);
        assert_eq!(outcome.progress.levels_completed, u32::MAX);
        assert_eq!(outcome.progress.total_correct_answers, u64::MAX);
        assert_eq!(outcome.progress.current_cycle, u32::MAX);
        assert!(outcome.level_completed());
    }

    #[test]
    fn correct_answers_never_decrease_counters() {
        let pool = ["a", "b", "c"];
        let rules = ProgressionRules::default();
        let mut progress = Progress { total_correct_answers: 0, current_cycle: 1, levels_completed: 35 };
        let mut mastery = build_level_mastery(&pool, &[Form::Base], |_, _| true);
        let mut streak = SessionStreak::new();

        for step in 0..300 {
            let item = pool[step % pool.len()];
            let outcome = answer(&progress, &mastery, &streak, item, true);
            assert!(outcome.progress.levels_completed >= progress.levels_completed);
            assert!(outcome.progress.current_cycle >= progress.current_cycle);
            assert!(outcome.progress.total_correct_answers > progress.total_correct_answers);
            mastery = if outcome.level_completed() {
                build_level_mastery(&pool, &[Form::Base], |_, _| true)
            } else {
                outcome.mastery
            };
            progress = outcome.progress;
            streak = outcome.streak;
        }
        assert!(progress.levels_completed > 35);
        assert!(progress.current_cycle >= 2);
        assert!(progress.phase(&rules).index() < 4);
    }
}
