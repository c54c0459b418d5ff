use log::{debug, info, warn};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{DrillError, Result};
use crate::parsing::answer_matcher::{heard_excerpt, match_button, match_spoken, match_typed};
use crate::profile::Progress;
use crate::profile_io::ProgressStore;
use crate::progression::engine::ProgressEvent;
use crate::progression::mastery::MasteryProgress;
use crate::progression::phase::{available_forms, newly_unlocked_forms, Phase};
use crate::progression::round::{Round, RoundEnd, RoundTimer};
use crate::progression::rules::ProgressionRules;
use crate::progression::selector::newly_unlocked_colours;
use crate::progression::state::{GameState, MercyChoice};
use crate::progression::timing::TimingPolicy;
use crate::prompts;
use crate::speech::{SilentSpeaker, Speaker};
use crate::stats::StatsSink;
use crate::types::category::{CategoryKind, Form, Question};
use crate::types::vocabulary::CategoryView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Ready for `next_round`.
    AwaitingQuestion,
    InRound,
    Paused,
    /// A wrong answer or timeout at minimum time; waiting on `accept_mercy`
    /// or `decline_mercy`.
    MercyOffered,
    /// The game ended; only `finish` is left.
    Over,
    Finished,
}

/// How the learner answered.
#[derive(Debug, Clone, Copy)]
pub enum Answer<'a> {
    /// Index into the buttons of the current round.
    Button(usize),
    Typed(&'a str),
    /// A final speech transcript.
    Spoken(&'a str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ButtonView {
    pub label: String,
    /// Background colour, only in the Learning phase of the colour category.
    pub swatch: Option<String>,
}

/// Everything a front end needs to present one question.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundView {
    pub question: Question<String>,
    pub prompt: &'static str,
    /// Emoji to show, or `None` when `swatch` carries the question.
    pub picture: Option<String>,
    pub swatch: Option<String>,
    /// The answer text, shown only on the very first Learning level of emoji categories.
    pub hint: Option<String>,
    /// Empty in the Typing and Speech phases.
    pub buttons: Vec<ButtonView>,
    pub accents: Vec<String>,
    pub phase: Phase,
    pub level_in_cycle: u32,
    pub cycle: u32,
    pub time_limit_ms: u64,
    pub mastery: MasteryProgress,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Milestone {
    LevelUp {
        title: &'static str,
        level_in_cycle: u32,
        phase: Phase,
        phase_intro: Option<String>,
        items_note: String,
        time_note: String,
    },
    CycleComplete {
        completed_cycle: u32,
        new_cycle: u32,
        unlock_note: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The answer arrived when no round was running, or could not be read.
    Ignored,
    /// Speech that named nothing in the pool. The round keeps going.
    Unrecognised { heard: String },
    Correct { score: u64, milestone: Option<Milestone> },
    Wrong { expected: String, mercy: Option<String> },
    TimedOut { expected: String, mercy: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub score: u64,
    pub questions: u64,
    pub accuracy_percent: u32,
    pub average_response_seconds: f64,
    pub is_new_best: bool,
    pub previous_best: u64,
    pub message: String,
    pub progress: Progress,
}

/// One play session: question loop, timer, mercy and bookkeeping around a
/// [`GameState`].
pub struct GameSession<'v, S, T, R> {
    view: CategoryView<'v>,
    rules: ProgressionRules,
    timing: TimingPolicy,
    state: GameState<String>,
    store: S,
    timer: T,
    rng: R,
    speaker: Box<dyn Speaker>,
    status: SessionStatus,
    round: Round,
    buttons: Vec<String>,
    score: u64,
    questions: u64,
    response_times_ms: Vec<u64>,
}

impl<'v, S, T, R> GameSession<'v, S, T, R>
where
    S: ProgressStore,
    T: RoundTimer,
    R: Rng,
{
    pub fn new(
        view: CategoryView<'v>,
        store: S,
        timer: T,
        rng: R,
        rules: ProgressionRules,
        timing: TimingPolicy,
    ) -> Result<Self> {
        let progress = store.load(&view.pack.code, view.category());
        let state = GameState::start(progress, &view, &rules)?;
        info!("New {} session in '{}'", view.category(), view.pack.code);
        Ok(Self {
            view,
            rules,
            timing,
            state,
            store,
            timer,
            rng,
            speaker: Box::new(SilentSpeaker),
            status: SessionStatus::AwaitingQuestion,
            round: Round::new(),
            buttons: Vec::new(),
            score: 0,
            questions: 0,
            response_times_ms: Vec::new(),
        })
    }

    pub fn with_speaker(mut self, speaker: Box<dyn Speaker>) -> Self {
        self.speaker = speaker;
        self
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn state(&self) -> &GameState<String> {
        &self.state
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn feminine_active(&self) -> bool {
        self.view.kind() == CategoryKind::Adjective && self.state.forms.contains(&Form::Feminine)
    }

    /// Picks a question, starts the timer and describes the round.
    pub fn next_round(&mut self) -> Result<RoundView> {
        if self.status != SessionStatus::AwaitingQuestion {
            return Err(DrillError::InvalidState(format!("next_round called while {:?}", self.status)));
        }
        self.state = self.state.with_next_question(&self.rules, &mut self.rng)?;
        let question = self
            .state
            .current
            .clone()
            .ok_or_else(|| DrillError::InvalidState("no question after selection".to_string()))?;

        let phase = self.state.phase(&self.rules);
        let kind = self.view.kind();
        let colour = kind == CategoryKind::Colour;
        let display = self.view.display(&question.item).unwrap_or_default();
        let answer_text = self.view.render(&question.item, question.form);

        self.buttons = if phase.is_typing() || phase == Phase::Speech {
            Vec::new()
        } else {
            let mut items = self.state.pool.clone();
            items.shuffle(&mut self.rng);
            items
        };
        let buttons = self
            .buttons
            .iter()
            .map(|item| ButtonView {
                label: self.view.render(item, question.form).unwrap_or_else(|| item.clone()),
                swatch: (phase == Phase::Learning && colour)
                    .then(|| self.view.display(item).map(str::to_string))
                    .flatten(),
            })
            .collect();

        let hint = (!colour && phase == Phase::Learning && self.state.progress.level_in_phase(&self.rules) == 1)
            .then(|| answer_text.clone())
            .flatten();

        if phase.speaks_prompt() {
            if let Some(text) = &answer_text {
                self.speaker.speak(text, &self.view.pack.speech_locale);
            }
        }

        let time_limit_ms = self.state.time_limit_ms(&self.rules, &self.timing);
        self.round = Round::new();
        self.timer.start(time_limit_ms);
        self.status = SessionStatus::InRound;
        debug!("Asking {} with {} ms", question, time_limit_ms);

        Ok(RoundView {
            prompt: prompts::question_prompt(phase, question.form, kind, self.feminine_active()),
            picture: prompts::question_picture(display, question.form, kind, self.feminine_active()),
            swatch: colour.then(|| display.to_string()),
            hint,
            buttons,
            accents: if phase.is_typing() { self.view.pack.accents.clone() } else { Vec::new() },
            phase,
            level_in_cycle: self.state.progress.level_in_cycle(&self.rules),
            cycle: self.state.progress.current_cycle,
            time_limit_ms,
            mastery: self.state.mastery_progress(&self.rules),
            question,
        })
    }

    /// Handles an answer. Late answers (after a timeout, while paused, after
    /// the game ended) are ignored.
    pub fn submit(&mut self, answer: Answer<'_>) -> Result<SubmitOutcome> {
        if self.status != SessionStatus::InRound {
            return Ok(SubmitOutcome::Ignored);
        }
        if self.timer.is_expired() {
            return self.on_timer_expired();
        }
        let Some(asked) = self.state.current.clone() else {
            return Ok(SubmitOutcome::Ignored);
        };

        let chosen = match answer {
            Answer::Button(index) => match match_button(&self.buttons, index) {
                Some(item) => Some(item.clone()),
                None => return Ok(SubmitOutcome::Ignored),
            },
            Answer::Typed(text) if text.trim().is_empty() => return Ok(SubmitOutcome::Ignored),
            Answer::Typed(text) => match_typed(&self.view, &self.state.pool, asked.form, text),
            Answer::Spoken(transcript) => {
                match match_spoken(&self.view, &self.state.pool, asked.form, transcript) {
                    Some(item) => Some(item),
                    None => {
                        return Ok(SubmitOutcome::Unrecognised { heard: heard_excerpt(transcript) });
                    }
                }
            }
        };

        let is_correct = chosen.as_deref() == Some(asked.item.as_str());
        if !self.round.resolve(if is_correct { RoundEnd::Correct } else { RoundEnd::Wrong }) {
            return Ok(SubmitOutcome::Ignored);
        }
        let elapsed = self.timer.elapsed_ms();
        self.timer.cancel();
        self.questions += 1;

        let (next, events) = self.state.answer(is_correct, &self.rules, &self.timing)?;
        self.state = next;

        if !is_correct {
            return Ok(self.end_or_offer_mercy(false));
        }

        self.score += 1;
        self.response_times_ms.push(elapsed);
        self.save_progress()?;

        let milestone = self.handle_level_events(&events);
        self.status = SessionStatus::AwaitingQuestion;
        Ok(SubmitOutcome::Correct { score: self.score, milestone })
    }

    /// Polls the timer and ends the round if it ran out.
    pub fn poll_timer(&mut self) -> Result<Option<SubmitOutcome>> {
        if self.status == SessionStatus::InRound && self.timer.is_expired() {
            return self.on_timer_expired().map(Some);
        }
        Ok(None)
    }

    /// Ends the current round as timed out. Safe to call more than once.
    pub fn on_timer_expired(&mut self) -> Result<SubmitOutcome> {
        if self.status != SessionStatus::InRound || !self.round.resolve(RoundEnd::TimedOut) {
            return Ok(SubmitOutcome::Ignored);
        }
        self.timer.cancel();
        self.questions += 1;
        Ok(self.end_or_offer_mercy(true))
    }

    fn end_or_offer_mercy(&mut self, timed_out: bool) -> SubmitOutcome {
        let expected = self.expected_answer();
        let mercy = if self.state.mercy_available(&self.rules, &self.timing) {
            self.status = SessionStatus::MercyOffered;
            let seconds = self.state.time_limit_ms(&self.rules, &self.timing) / 1000;
            let floor = self.timing.floor_seconds(self.state.phase(&self.rules).is_typing());
            Some(prompts::mercy_message(seconds, floor))
        } else {
            self.status = SessionStatus::Over;
            None
        };
        if timed_out {
            SubmitOutcome::TimedOut { expected, mercy }
        } else {
            SubmitOutcome::Wrong { expected, mercy }
        }
    }

    fn expected_answer(&self) -> String {
        match &self.state.current {
            Some(q) => self
                .view
                .render(&q.item, q.form)
                .unwrap_or_else(|| q.item.clone()),
            None => String::new(),
        }
    }

    fn save_progress(&mut self) -> Result<()> {
        self.store
            .save(&self.view.pack.code, self.view.category(), &self.state.progress)
    }

    fn handle_level_events(&mut self, events: &[ProgressEvent<String>]) -> Option<Milestone> {
        let milestone = events.iter().find_map(|event| match *event {
            ProgressEvent::LevelComplete { level_in_cycle, previous_phase, phase, time_changed, .. } => {
                Some(self.level_up(level_in_cycle, previous_phase, phase, time_changed))
            }
            ProgressEvent::CycleComplete { completed_cycle, new_cycle } => {
                Some(self.cycle_complete(completed_cycle, new_cycle))
            }
            _ => None,
        })?;
        self.state = self.state.advance_level(&self.view, &self.rules, &mut self.rng);
        Some(milestone)
    }

    fn level_up(&self, level_in_cycle: u32, previous_phase: Phase, phase: Phase, time_changed: bool) -> Milestone {
        let phase_changed = phase != previous_phase;
        info!("Level up: level {} of cycle, {}", level_in_cycle, phase);
        let seconds = self.state.time_limit_ms(&self.rules, &self.timing) / 1000;
        let forms = available_forms(self.view.kind(), self.state.progress.current_cycle);
        Milestone::LevelUp {
            title: prompts::level_up_title(phase_changed),
            level_in_cycle,
            phase,
            phase_intro: phase_changed.then(|| prompts::phase_intro(phase, self.view.kind())),
            items_note: prompts::new_items_note(&forms),
            time_note: prompts::time_note(seconds, time_changed, self.timing.step_seconds),
        }
    }

    fn cycle_complete(&self, completed_cycle: u32, new_cycle: u32) -> Milestone {
        info!("Cycle {} complete", completed_cycle);
        let kind = self.view.kind();
        let forms = newly_unlocked_forms(kind, completed_cycle, new_cycle);
        let colour_names: Vec<String> = if kind == CategoryKind::Colour {
            newly_unlocked_colours(self.view.items(), completed_cycle, new_cycle, &self.rules)
                .iter()
                .filter_map(|item| self.view.translation(item).map(str::to_string))
                .collect()
        } else {
            Vec::new()
        };
        Milestone::CycleComplete {
            completed_cycle,
            new_cycle,
            unlock_note: prompts::cycle_unlock_note(kind, &forms, &colour_names),
        }
    }

    pub fn pause(&mut self) {
        if self.status == SessionStatus::InRound {
            self.timer.pause();
            self.status = SessionStatus::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.status == SessionStatus::Paused {
            self.timer.resume();
            self.status = SessionStatus::InRound;
        }
    }

    pub fn accept_mercy(&mut self, choice: MercyChoice) -> Result<()> {
        if self.status != SessionStatus::MercyOffered {
            return Err(DrillError::InvalidState("no mercy on offer".to_string()));
        }
        self.state = self.state.with_mercy(choice, &self.timing);
        info!("Mercy taken: {:?}, bonus now {}s", choice, self.state.time_bonus_seconds);
        self.status = SessionStatus::AwaitingQuestion;
        Ok(())
    }

    pub fn decline_mercy(&mut self) {
        if self.status == SessionStatus::MercyOffered {
            self.status = SessionStatus::Over;
        }
    }

    /// Jumps to another phase of the current cycle. Only between rounds.
    pub fn jump_to_phase(&mut self, target: Phase) -> Result<()> {
        if self.status != SessionStatus::AwaitingQuestion {
            return Err(DrillError::InvalidState("can only jump between rounds".to_string()));
        }
        let progress = self.state.progress.jump_to_phase(target, &self.rules);
        let moved = GameState { progress, ..self.state.clone() };
        self.state = moved.advance_level(&self.view, &self.rules, &mut self.rng);
        self.save_progress()
    }

    /// Ends the game and reports it. Progress was saved as the game went.
    pub fn finish(&mut self, stats: &mut dyn StatsSink) -> Result<SessionSummary> {
        if self.status == SessionStatus::Finished {
            return Err(DrillError::InvalidState("session already finished".to_string()));
        }
        self.timer.cancel();
        self.status = SessionStatus::Finished;

        let previous_best = stats.statistics().best_streak;
        let is_new_best = stats.statistics().is_new_personal_best(self.score);
        if let Err(e) = stats.record_game(self.score, &self.view.pack.code, self.state.progress.current_cycle) {
            warn!("Could not record game statistics: {}", e);
        }

        let accuracy_percent = if self.questions == 0 {
            0
        } else {
            ((self.score as f64 / self.questions as f64) * 100.0).round() as u32
        };
        let average_response_seconds = if self.response_times_ms.is_empty() {
            0.0
        } else {
            self.response_times_ms.iter().sum::<u64>() as f64 / self.response_times_ms.len() as f64 / 1000.0
        };
        let missed = self.missed_answer();

        Ok(SessionSummary {
            score: self.score,
            questions: self.questions,
            accuracy_percent,
            average_response_seconds,
            is_new_best,
            previous_best,
            message: prompts::end_message(self.score, missed.as_deref()),
            progress: self.state.progress,
        })
    }

    // "Perro 🐶 (dog)" or "Rojo (red)".
    fn missed_answer(&self) -> Option<String> {
        let q = self.state.current.as_ref()?;
        let word = self.view.render(&q.item, q.form)?;
        let picture = self
            .view
            .display(&q.item)
            .and_then(|d| prompts::question_picture(d, q.form, self.view.kind(), false));
        Some(match picture {
            Some(p) => format!("{} {} ({})", word, p, q.item),
            None => format!("{} ({})", word, q.item),
        })
    }
}
