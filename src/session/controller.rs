use std::time::Duration;

use crate::audio::{Cue, CuePlayer};
use crate::catalog::{Family, FamilySelection};
use crate::engine::question::{Question, QuestionEngine};
use crate::session::score::ScoreTally;
use crate::session::timer::{SessionTimer, TimerDuration, TimerPhase};
use crate::store::kv::KeyValueStore;
use crate::store::schema::StatsMap;
use crate::store::stats::StatsStore;

/// Feedback pauses before moving on. A timeout gets the longer one so the
/// correct reading stays on screen a little longer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    pub answer_pause: Duration,
    pub timeout_pause: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            answer_pause: Duration::from_millis(1000),
            timeout_pause: Duration::from_millis(2000),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SessionSettings {
    pub families: FamilySelection,
    pub timer: TimerDuration,
    pub pacing: Pacing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum View {
    Practice,
    Stats,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Correct,
    Incorrect { chosen: String },
    TimedOut,
}

impl Outcome {
    pub fn is_correct(&self) -> bool {
        matches!(self, Outcome::Correct)
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Outcome::TimedOut)
    }
}

/// Snapshot of a resolved question for colouring its choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Feedback<'a> {
    /// The submitted romanization; `None` after a timeout.
    pub chosen: Option<&'a str>,
    pub timed_out: bool,
    pub correct: &'a str,
}

/// What a `tick` changed, for the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    TimedOut,
    Advanced,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Phase {
    Awaiting,
    Resolved { outcome: Outcome, pause_left: Duration },
}

/// The practice loop: one question at a time, answered or timed out,
/// scored, recorded, then replaced after a short pause.
pub struct SessionController<S: KeyValueStore, A: CuePlayer> {
    engine: QuestionEngine,
    timer: SessionTimer,
    stats: StatsStore<S>,
    audio: A,
    score: ScoreTally,
    families: FamilySelection,
    timer_duration: TimerDuration,
    pacing: Pacing,
    view: View,
    phase: Phase,
}

impl<S: KeyValueStore, A: CuePlayer> SessionController<S, A> {
    pub fn new(
        engine: QuestionEngine,
        stats: StatsStore<S>,
        audio: A,
        settings: SessionSettings,
    ) -> Self {
        let mut controller = Self {
            engine,
            timer: SessionTimer::new(),
            stats,
            audio,
            score: ScoreTally::default(),
            families: settings.families,
            timer_duration: settings.timer,
            pacing: settings.pacing,
            view: View::Practice,
            phase: Phase::Awaiting,
        };
        controller.apply_families();
        controller
    }

    /// Add or remove a family. Refuses to remove the last one, leaving the
    /// pool, queue and score untouched.
    pub fn toggle_family(&mut self, family: Family) -> bool {
        if !self.families.toggle(family) {
            log::info!("Ignoring toggle of {family}: at least one family must stay selected");
            return false;
        }
        self.apply_families();
        true
    }

    pub fn set_families(&mut self, families: FamilySelection) {
        if families == self.families {
            return;
        }
        self.families = families;
        self.apply_families();
    }

    fn apply_families(&mut self) {
        self.score.reset();
        self.engine.set_families(self.families.iter());
        self.present_question();
    }

    /// Start the current queue slot: fresh phase, timer from full duration.
    fn present_question(&mut self) {
        self.phase = Phase::Awaiting;
        let has_question = self.engine.current_question().is_some();
        if has_question && self.view == View::Practice {
            self.timer.start(self.timer_duration);
        } else {
            self.timer.clear();
        }
    }

    /// Submit a romanization for the current question. Ignored (returns
    /// `None`) once the question already has an outcome.
    pub fn submit_answer(&mut self, submitted: &str) -> Option<Outcome> {
        if self.phase != Phase::Awaiting {
            return None;
        }
        let question = self.engine.question()?;
        let glyph = question.prompt.glyph.clone();
        let outcome = if QuestionEngine::evaluate(submitted, question) {
            Outcome::Correct
        } else {
            Outcome::Incorrect {
                chosen: submitted.to_string(),
            }
        };

        self.timer.stop();
        self.resolve(&glyph, outcome.clone(), self.pacing.answer_pause);
        Some(outcome)
    }

    /// Submit the choice at `index` (0-based) of the current question.
    pub fn submit_choice(&mut self, index: usize) -> Option<Outcome> {
        let choice = self.engine.question()?.choices.get(index)?.clone();
        self.submit_answer(&choice)
    }

    fn handle_timeout(&mut self) -> bool {
        if self.phase != Phase::Awaiting {
            return false;
        }
        let Some(glyph) = self.engine.question().map(|q| q.prompt.glyph.clone()) else {
            return false;
        };
        self.resolve(&glyph, Outcome::TimedOut, self.pacing.timeout_pause);
        true
    }

    fn resolve(&mut self, glyph: &str, outcome: Outcome, pause: Duration) {
        let was_correct = outcome.is_correct();
        self.score.record(was_correct);

        if let Err(e) = self.stats.record_outcome(glyph, was_correct) {
            log::error!("Failed to save stats for {glyph}: {e:#}");
        }

        let cue = if was_correct { Cue::Correct } else { Cue::Incorrect };
        if let Err(e) = self.audio.play(cue) {
            log::warn!("Could not play {} cue: {e:#}", cue.as_str());
        }

        log::debug!("{glyph}: {outcome:?}");
        self.phase = Phase::Resolved {
            outcome,
            pause_left: pause,
        };
    }

    /// Feed elapsed time to the countdown and to any pending advance.
    pub fn tick(&mut self, elapsed: Duration) -> Option<SessionEvent> {
        match &mut self.phase {
            Phase::Awaiting => {
                if self.view == View::Practice && self.timer.tick(elapsed) && self.handle_timeout()
                {
                    Some(SessionEvent::TimedOut)
                } else {
                    None
                }
            }
            Phase::Resolved { pause_left, .. } => {
                *pause_left = pause_left.saturating_sub(elapsed);
                if pause_left.is_zero() {
                    self.engine.advance();
                    self.present_question();
                    Some(SessionEvent::Advanced)
                } else {
                    None
                }
            }
        }
    }

    /// Switch screens. The countdown only runs on the practice view; coming
    /// back to an unanswered question restarts it from the full duration.
    pub fn set_view(&mut self, view: View) {
        if view == self.view {
            return;
        }
        self.view = view;
        match view {
            View::Stats => {
                if self.timer.is_running() {
                    self.timer.clear();
                }
            }
            View::Practice => self.restart_timer_if_unanswered(),
        }
    }

    pub fn set_timer_duration(&mut self, duration: TimerDuration) {
        self.timer_duration = duration;
        self.restart_timer_if_unanswered();
    }

    fn restart_timer_if_unanswered(&mut self) {
        if self.phase == Phase::Awaiting
            && self.view == View::Practice
            && self.engine.question().is_some()
        {
            self.timer.start(self.timer_duration);
        }
    }

    pub fn reset_score_and_queue(&mut self) {
        self.score.reset();
        self.engine.reshuffle();
        self.present_question();
    }

    pub fn reset_all_stats(&mut self) {
        if let Err(e) = self.stats.clear() {
            log::error!("Failed to clear stats: {e:#}");
        }
        self.reset_score_and_queue();
    }

    pub fn question(&self) -> Option<&Question> {
        self.engine.question()
    }

    /// Outcome of the current question, once answered or timed out.
    pub fn outcome(&self) -> Option<&Outcome> {
        match &self.phase {
            Phase::Awaiting => None,
            Phase::Resolved { outcome, .. } => Some(outcome),
        }
    }

    pub fn feedback(&self) -> Option<Feedback<'_>> {
        let outcome = self.outcome()?;
        let correct = self.engine.question()?.prompt.romanization.as_str();
        let chosen = match outcome {
            Outcome::Correct => Some(correct),
            Outcome::Incorrect { chosen } => Some(chosen.as_str()),
            Outcome::TimedOut => None,
        };
        Some(Feedback {
            chosen,
            timed_out: outcome.is_timeout(),
            correct,
        })
    }

    pub fn is_answered(&self) -> bool {
        self.outcome().is_some()
    }

    pub fn score(&self) -> ScoreTally {
        self.score
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn timer_duration(&self) -> TimerDuration {
        self.timer_duration
    }

    /// Fraction of time left on the current question.
    pub fn progress(&self) -> f64 {
        if self.timer_duration.is_unlimited() || self.timer.phase() == TimerPhase::Idle {
            return 1.0;
        }
        self.timer.progress()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn families(&self) -> &FamilySelection {
        &self.families
    }

    pub fn engine(&self) -> &QuestionEngine {
        &self.engine
    }

    pub fn stats(&self) -> &StatsMap {
        self.stats.snapshot()
    }

    pub fn stats_store(&self) -> &StatsStore<S> {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Character};
    use crate::store::kv::MemoryStore;
    use crate::store::schema::CharacterStat;
    use anyhow::{Result, bail};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    const TICK: Duration = Duration::from_millis(100);

    #[derive(Clone, Default)]
    struct RecordingPlayer {
        cues: Rc<RefCell<Vec<Cue>>>,
        broken: bool,
    }

    impl CuePlayer for RecordingPlayer {
        fn play(&mut self, cue: Cue) -> Result<()> {
            self.cues.borrow_mut().push(cue);
            if self.broken {
                bail!("no audio device");
            }
            Ok(())
        }
    }

    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn set(&mut self, _key: &str, _value: &str) -> Result<()> {
            bail!("read-only")
        }
        fn delete(&mut self, _key: &str) -> Result<()> {
            bail!("read-only")
        }
    }

    fn settings(timer: TimerDuration) -> SessionSettings {
        SessionSettings {
            families: FamilySelection::single(Family::Hiragana),
            timer,
            pacing: Pacing::default(),
        }
    }

    fn make_controller(
        timer: TimerDuration,
    ) -> (SessionController<MemoryStore, RecordingPlayer>, RecordingPlayer) {
        let player = RecordingPlayer::default();
        let engine =
            QuestionEngine::with_rng(Catalog::load().unwrap(), SmallRng::seed_from_u64(17));
        let controller = SessionController::new(
            engine,
            StatsStore::new(MemoryStore::new()),
            player.clone(),
            settings(timer),
        );
        (controller, player)
    }

    fn prompt(controller: &SessionController<MemoryStore, RecordingPlayer>) -> Character {
        controller.question().unwrap().prompt.clone()
    }

    fn wrong_choice(controller: &SessionController<MemoryStore, RecordingPlayer>) -> String {
        let question = controller.question().unwrap();
        question
            .choices
            .iter()
            .find(|c| **c != question.prompt.romanization)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_starts_with_hiragana_pool_and_running_timer() {
        let (controller, _) = make_controller(TimerDuration::Five);
        assert_eq!(controller.engine().pool().len(), 46);
        assert_eq!(controller.question().unwrap().choices.len(), 4);
        assert!(controller.timer().is_running());
        assert_eq!(controller.score(), ScoreTally::default());
    }

    #[test]
    fn test_correct_answer_updates_score_stats_and_cue() {
        let (mut controller, player) = make_controller(TimerDuration::Five);
        let character = prompt(&controller);

        let outcome = controller.submit_answer(&character.romanization);
        assert_eq!(outcome, Some(Outcome::Correct));
        assert_eq!((controller.score().correct(), controller.score().total()), (1, 1));
        assert_eq!(
            controller.stats_store().load()[&character.glyph],
            CharacterStat { correct: 1, total: 1 }
        );
        assert_eq!(*player.cues.borrow(), vec![Cue::Correct]);
        assert_eq!(controller.timer().phase(), TimerPhase::Stopped);
    }

    #[test]
    fn test_wrong_answer_counts_total_only() {
        let (mut controller, player) = make_controller(TimerDuration::Five);
        let character = prompt(&controller);
        let wrong = wrong_choice(&controller);

        let outcome = controller.submit_answer(&wrong).unwrap();
        assert_eq!(outcome, Outcome::Incorrect { chosen: wrong });
        assert_eq!((controller.score().correct(), controller.score().total()), (0, 1));
        assert_eq!(
            controller.stats()[&character.glyph],
            CharacterStat { correct: 0, total: 1 }
        );
        assert_eq!(*player.cues.borrow(), vec![Cue::Incorrect]);
    }

    #[test]
    fn test_feedback_reports_choice_and_answer() {
        let (mut controller, _) = make_controller(TimerDuration::Three);
        assert!(controller.feedback().is_none());
        let character = prompt(&controller);
        let wrong = wrong_choice(&controller);
        controller.submit_answer(&wrong);
        assert_eq!(
            controller.feedback(),
            Some(Feedback {
                chosen: Some(wrong.as_str()),
                timed_out: false,
                correct: character.romanization.as_str(),
            })
        );

        let (mut controller, _) = make_controller(TimerDuration::Three);
        controller.tick(Duration::from_secs(3));
        let feedback = controller.feedback().unwrap();
        assert!(feedback.timed_out);
        assert_eq!(feedback.chosen, None);
    }

    #[test]
    fn test_second_answer_for_same_question_is_ignored() {
        let (mut controller, _) = make_controller(TimerDuration::Five);
        let character = prompt(&controller);
        controller.submit_answer(&character.romanization).unwrap();
        assert!(controller.submit_answer(&character.romanization).is_none());
        assert!(controller.submit_choice(0).is_none());
        assert_eq!(controller.score().total(), 1);
    }

    #[test]
    fn test_timeout_fires_once_and_counts_as_incorrect() {
        let (mut controller, player) = make_controller(TimerDuration::Three);
        let character = prompt(&controller);

        let mut timeouts = 0;
        for _ in 0..35 {
            if controller.tick(TICK) == Some(SessionEvent::TimedOut) {
                timeouts += 1;
            }
        }
        assert_eq!(timeouts, 1);
        assert_eq!(controller.outcome(), Some(&Outcome::TimedOut));
        assert_eq!((controller.score().correct(), controller.score().total()), (0, 1));
        assert_eq!(
            controller.stats()[&character.glyph],
            CharacterStat { correct: 0, total: 1 }
        );
        assert_eq!(*player.cues.borrow(), vec![Cue::Incorrect]);
        // Late answer after the timeout is rejected.
        assert!(controller.submit_answer(&character.romanization).is_none());
    }

    #[test]
    fn test_timeout_pause_is_longer_than_answer_pause() {
        let (mut controller, _) = make_controller(TimerDuration::Three);
        assert_eq!(controller.tick(Duration::from_secs(3)), Some(SessionEvent::TimedOut));
        assert_eq!(controller.tick(Duration::from_millis(1500)), None);
        assert_eq!(controller.tick(Duration::from_millis(500)), Some(SessionEvent::Advanced));
        assert!(!controller.is_answered());
        assert!(controller.timer().is_running());
        assert_eq!(controller.engine().position(), 1);
    }

    #[test]
    fn test_answer_cancels_timeout_and_advances_after_pause() {
        let (mut controller, _) = make_controller(TimerDuration::Three);
        let first = prompt(&controller);
        controller.tick(Duration::from_millis(2900));
        controller.submit_answer(&first.romanization).unwrap();

        assert_eq!(controller.tick(Duration::from_millis(500)), None);
        assert_eq!(controller.tick(Duration::from_millis(500)), Some(SessionEvent::Advanced));
        assert_eq!(controller.score().total(), 1);
        assert_ne!(prompt(&controller).glyph, first.glyph);
        assert_eq!(controller.timer().remaining(), Duration::from_secs(3));
    }

    #[test]
    fn test_unlimited_timer_never_times_out() {
        let (mut controller, _) = make_controller(TimerDuration::Unlimited);
        for _ in 0..100 {
            assert_eq!(controller.tick(Duration::from_secs(60)), None);
        }
        assert_eq!(controller.score().total(), 0);
        assert_eq!(controller.progress(), 1.0);
    }

    #[test]
    fn test_toggling_only_family_is_rejected() {
        let (mut controller, _) = make_controller(TimerDuration::Five);
        controller.engine.advance();
        controller.present_question();
        let before = controller.question().cloned();
        let position = controller.engine().position();

        assert!(!controller.toggle_family(Family::Hiragana));
        assert_eq!(controller.question().cloned(), before);
        assert_eq!(controller.engine().position(), position);
        assert_eq!(controller.engine().pool().len(), 46);
    }

    #[test]
    fn test_family_change_resets_score_and_cancels_pending_advance() {
        let (mut controller, _) = make_controller(TimerDuration::Five);
        let character = prompt(&controller);
        controller.submit_answer(&character.romanization).unwrap();

        assert!(controller.toggle_family(Family::Katakana));
        assert_eq!(controller.score(), ScoreTally::default());
        assert_eq!(controller.engine().pool().len(), 92);
        assert_eq!(controller.engine().position(), 0);
        assert!(!controller.is_answered());
        // The stale pause is gone; a second passes without advancing.
        assert_eq!(controller.tick(Duration::from_secs(1)), None);
        assert_eq!(controller.engine().position(), 0);
    }

    #[test]
    fn test_stats_view_freezes_timer() {
        let (mut controller, _) = make_controller(TimerDuration::Three);
        controller.tick(Duration::from_secs(2));
        controller.set_view(View::Stats);
        assert!(!controller.timer().is_running());
        for _ in 0..10 {
            assert_eq!(controller.tick(Duration::from_secs(1)), None);
        }
        controller.set_view(View::Practice);
        assert_eq!(controller.timer().remaining(), Duration::from_secs(3));
        assert_eq!(controller.score().total(), 0);
    }

    #[test]
    fn test_pending_advance_still_runs_on_stats_view() {
        let (mut controller, _) = make_controller(TimerDuration::Three);
        let character = prompt(&controller);
        controller.submit_answer(&character.romanization).unwrap();
        controller.set_view(View::Stats);
        assert_eq!(controller.tick(Duration::from_secs(1)), Some(SessionEvent::Advanced));
        assert!(!controller.timer().is_running());
        controller.set_view(View::Practice);
        assert!(controller.timer().is_running());
    }

    #[test]
    fn test_timer_duration_change_restarts_unanswered_question() {
        let (mut controller, _) = make_controller(TimerDuration::Three);
        controller.tick(Duration::from_secs(2));
        controller.set_timer_duration(TimerDuration::Ten);
        assert_eq!(controller.timer().remaining(), Duration::from_secs(10));
        assert_eq!(controller.timer_duration(), TimerDuration::Ten);
    }

    #[test]
    fn test_reset_all_stats_clears_storage_and_score() {
        let (mut controller, _) = make_controller(TimerDuration::Five);
        let character = prompt(&controller);
        controller.submit_answer(&character.romanization).unwrap();

        controller.reset_all_stats();
        assert!(controller.stats_store().load().is_empty());
        assert!(controller.stats().is_empty());
        assert_eq!(controller.score(), ScoreTally::default());
        assert_eq!(controller.engine().position(), 0);
        assert!(!controller.is_answered());
    }

    #[test]
    fn test_reset_score_and_queue_keeps_stats() {
        let (mut controller, _) = make_controller(TimerDuration::Five);
        let character = prompt(&controller);
        controller.submit_answer(&character.romanization).unwrap();
        controller.reset_score_and_queue();
        assert_eq!(controller.score(), ScoreTally::default());
        assert_eq!(controller.stats().len(), 1);
    }

    #[test]
    fn test_audio_and_storage_failures_do_not_affect_scoring() {
        let player = RecordingPlayer {
            broken: true,
            ..RecordingPlayer::default()
        };
        let engine =
            QuestionEngine::with_rng(Catalog::load().unwrap(), SmallRng::seed_from_u64(3));
        let mut controller = SessionController::new(
            engine,
            StatsStore::new(ReadOnlyStore),
            player.clone(),
            settings(TimerDuration::Five),
        );
        let glyph = controller.question().unwrap().prompt.glyph.clone();
        let answer = controller.question().unwrap().prompt.romanization.clone();

        assert_eq!(controller.submit_answer(&answer), Some(Outcome::Correct));
        assert_eq!(controller.score().correct(), 1);
        assert_eq!(controller.stats()[&glyph], CharacterStat { correct: 1, total: 1 });
        assert_eq!(player.cues.borrow().len(), 1);
        assert_eq!(controller.tick(Duration::from_secs(1)), Some(SessionEvent::Advanced));
    }

    #[test]
    fn test_score_invariant_over_mixed_events() {
        let (mut controller, _) = make_controller(TimerDuration::Three);
        for round in 0..60 {
            match round % 3 {
                0 => {
                    let answer = prompt(&controller).romanization;
                    controller.submit_answer(&answer);
                }
                1 => {
                    let wrong = wrong_choice(&controller);
                    controller.submit_answer(&wrong);
                }
                _ => {
                    controller.tick(Duration::from_secs(3));
                }
            }
            let score = controller.score();
            assert!(score.correct() <= score.total());
            controller.tick(Duration::from_secs(2));
        }
        assert_eq!(controller.score().total(), 60);
        assert_eq!(controller.score().correct(), 20);
        assert!(controller.stats().values().all(CharacterStat::is_consistent));
    }
}
