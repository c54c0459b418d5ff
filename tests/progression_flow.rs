use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use waffley_drill::progression::{GameState, ItemCatalog, Phase, ProgressEvent, ProgressionRules, TimingPolicy};
use waffley_drill::types::category::{Category, CategoryKind, Form};
use waffley_drill::{Progress, VocabularyRegistry};

/// A drill over subject pronouns, to show the machinery is not tied to vocabulary keys.
struct Pronouns;

impl ItemCatalog<&'static str> for Pronouns {
    fn kind(&self) -> CategoryKind {
        CategoryKind::Noun
    }

    fn items(&self) -> Vec<&'static str> {
        vec!["yo", "tú", "él", "ella", "nosotros", "vosotros", "ellos", "ellas"]
    }

    fn has_form(&self, _item: &&'static str, form: Form) -> bool {
        form != Form::Plural
    }
}

/// Answers correctly until the level ends; returns the level event.
fn play_level<K, C, R>(
    state: GameState<K>,
    catalog: &C,
    rules: &ProgressionRules,
    timing: &TimingPolicy,
    rng: &mut R,
) -> (GameState<K>, ProgressEvent<K>)
where
    K: Ord + Clone + std::fmt::Debug,
    C: ItemCatalog<K>,
    R: Rng,
{
    let mut state = state;
    for _ in 0..500 {
        state = state.with_next_question(rules, rng).unwrap();
        let (next, events) = state.answer(true, rules, timing).unwrap();
        state = next;
        let level_event = events.into_iter().find(|e| {
            matches!(e, ProgressEvent::LevelComplete { .. } | ProgressEvent::CycleComplete { .. })
        });
        if let Some(event) = level_event {
            return (state.advance_level(catalog, rules, rng), event);
        }
    }
    panic!("level never completed");
}

#[test]
fn a_whole_cycle_walks_every_phase_and_unlocks_articles() {
    let rules = ProgressionRules::default();
    let timing = TimingPolicy::default();
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut state = GameState::start(Progress::new(), &Pronouns, &rules).unwrap();
    assert_eq!(state.forms, vec![Form::Base]);

    let mut phases_seen = vec![state.phase(&rules)];
    let mut limits = Vec::new();
    for level in 1..=40 {
        limits.push(state.time_limit_ms(&rules, &timing) / 1000);
        let (next, event) = play_level(state, &Pronouns, &rules, &timing, &mut rng);
        state = next;
        if level < 40 {
            assert!(matches!(event, ProgressEvent::LevelComplete { .. }), "level {}", level);
        } else {
            assert_eq!(event, ProgressEvent::CycleComplete { completed_cycle: 1, new_cycle: 2 });
        }
        if phases_seen.last() != Some(&state.phase(&rules)) {
            phases_seen.push(state.phase(&rules));
        }
    }

    assert_eq!(
        phases_seen,
        vec![Phase::Learning, Phase::Practice, Phase::Typing, Phase::Speech, Phase::Learning]
    );
    assert_eq!(&limits[..10], &[10, 8, 6, 4, 2, 2, 2, 2, 2, 2]);
    assert_eq!(&limits[10..20], &limits[..10]);
    assert_eq!(state.progress.current_cycle, 2);
    assert_eq!(state.progress.levels_completed, 40);
    assert_eq!(state.forms, vec![Form::Base, Form::Article]);
    assert_eq!(state.mastery.len(), state.pool.len() * 2);
}

#[test]
fn mixed_answers_never_move_progress_backwards() {
    let registry = VocabularyRegistry::builtin().unwrap();
    let view = registry.view("pt", Category::Animals).unwrap();
    let rules = ProgressionRules::default();
    let timing = TimingPolicy::default();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let mut state = GameState::start(Progress::new(), &view, &rules).unwrap();

    let mut previous = state.progress;
    for _ in 0..300 {
        state = state.with_next_question(&rules, &mut rng).unwrap();
        let asked = state.current.clone().unwrap();
        assert!(state.pool.contains(&asked.item));

        let correct = rng.gen_bool(0.8);
        let (next, events) = state.answer(correct, &rules, &timing).unwrap();
        state = next;
        if !correct {
            assert_eq!(events, vec![ProgressEvent::NoChange]);
            assert_eq!(state.streak.get(&asked), 0);
        }
        if events.iter().any(|e| matches!(e, ProgressEvent::LevelComplete { .. } | ProgressEvent::CycleComplete { .. })) {
            state = state.advance_level(&view, &rules, &mut rng);
        }

        assert!(state.progress.total_correct_answers >= previous.total_correct_answers);
        assert!(state.progress.levels_completed >= previous.levels_completed);
        assert!(state.progress.current_cycle >= previous.current_cycle);
        assert!((1..=10).contains(&state.progress.level_in_phase(&rules)));
        previous = state.progress;
    }
    assert!(previous.levels_completed > 0);
}
