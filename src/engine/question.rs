use std::collections::HashSet;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;

use crate::catalog::{Catalog, Character, Family};

/// Number of wrong choices offered alongside the correct romanization.
pub const DISTRACTOR_COUNT: usize = 3;

/// Random draws spent looking for distractors before falling back to a
/// scan of the remaining candidates.
const MAX_DISTRACTOR_DRAWS: usize = 64;

/// A prompt plus its shuffled choices. Exactly one choice is the prompt's
/// romanization and no choice repeats.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Question {
    pub prompt: Character,
    pub choices: Vec<String>,
}

pub struct QuestionEngine {
    catalog: Catalog,
    pool: Vec<Character>,
    queue: Vec<usize>,
    position: usize,
    current: Option<Question>,
    rng: SmallRng,
}

impl QuestionEngine {
    pub fn new(catalog: Catalog) -> Self {
        Self::with_rng(catalog, SmallRng::from_entropy())
    }

    pub fn with_rng(catalog: Catalog, rng: SmallRng) -> Self {
        Self {
            catalog,
            pool: Vec::new(),
            queue: Vec::new(),
            position: 0,
            current: None,
            rng,
        }
    }

    /// Rebuild the pool from `families` and start a fresh pass. An empty
    /// iterator leaves the engine with no content.
    pub fn set_families(&mut self, families: impl IntoIterator<Item = Family>) {
        self.pool = self.catalog.pool_for(families);
        self.reshuffle();
    }

    /// New random permutation of the current pool, back at position 0.
    pub fn reshuffle(&mut self) {
        self.queue = (0..self.pool.len()).collect();
        self.queue.shuffle(&mut self.rng);
        self.position = 0;
        self.current = None;
    }

    /// Move to the next queue slot, starting a new pass after the last one.
    pub fn advance(&mut self) {
        if self.pool.is_empty() {
            return;
        }
        if self.position + 1 >= self.queue.len() {
            self.reshuffle();
        } else {
            self.position += 1;
            self.current = None;
        }
    }

    /// The question for the current queue slot, built on first access and
    /// kept until the slot changes. `None` means no family is loaded.
    pub fn current_question(&mut self) -> Option<&Question> {
        if self.current.is_none() {
            let index = *self.queue.get(self.position)?;
            let prompt = self.pool[index].clone();
            let question = self.build_question(prompt);
            self.current = Some(question);
        }
        self.current.as_ref()
    }

    /// The question last built by `current_question`, if still valid.
    pub fn question(&self) -> Option<&Question> {
        self.current.as_ref()
    }

    pub fn evaluate(submitted: &str, question: &Question) -> bool {
        submitted == question.prompt.romanization
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn pool(&self) -> &[Character] {
        &self.pool
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Character at the current queue slot without building choices.
    pub fn current_character(&self) -> Option<&Character> {
        self.queue
            .get(self.position)
            .and_then(|&index| self.pool.get(index))
    }

    fn build_question(&mut self, prompt: Character) -> Question {
        let distractors = self.pick_distractors(&prompt.romanization);
        let mut choices = Vec::with_capacity(distractors.len() + 1);
        choices.push(prompt.romanization.clone());
        choices.extend(distractors);
        choices.shuffle(&mut self.rng);
        Question { prompt, choices }
    }

    fn pick_distractors(&mut self, correct: &str) -> Vec<String> {
        let mut chosen: Vec<String> = Vec::with_capacity(DISTRACTOR_COUNT);
        if self.pool.is_empty() {
            return chosen;
        }

        for _ in 0..MAX_DISTRACTOR_DRAWS {
            if chosen.len() == DISTRACTOR_COUNT {
                return chosen;
            }
            let candidate = &self.pool[self.rng.gen_range(0..self.pool.len())].romanization;
            if candidate != correct && !chosen.contains(candidate) {
                chosen.push(candidate.clone());
            }
        }

        // Draw budget spent: fill from whatever unique wrong answers remain.
        let mut seen: HashSet<&str> = chosen.iter().map(String::as_str).collect();
        seen.insert(correct);
        let mut remaining: Vec<String> = Vec::new();
        for character in &self.pool {
            if seen.insert(character.romanization.as_str()) {
                remaining.push(character.romanization.clone());
            }
        }
        remaining.shuffle(&mut self.rng);
        let needed = DISTRACTOR_COUNT - chosen.len();
        chosen.extend(remaining.into_iter().take(needed));
        chosen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(catalog: Catalog, seed: u64) -> QuestionEngine {
        QuestionEngine::with_rng(catalog, SmallRng::seed_from_u64(seed))
    }

    fn tiny_catalog(romanizations: &[&str]) -> Catalog {
        let hiragana = romanizations
            .iter()
            .enumerate()
            .map(|(i, r)| Character::new(&format!("g{i}"), r))
            .collect();
        Catalog::from_lists(hiragana, Vec::new())
    }

    fn assert_well_formed(question: &Question) {
        let correct = question
            .choices
            .iter()
            .filter(|c| **c == question.prompt.romanization)
            .count();
        assert_eq!(correct, 1, "correct answer appears once: {question:?}");
        let unique: HashSet<&String> = question.choices.iter().collect();
        assert_eq!(unique.len(), question.choices.len(), "no duplicates: {question:?}");
    }

    #[test]
    fn test_empty_pool_has_no_question() {
        let mut engine = seeded(Catalog::load().unwrap(), 1);
        assert!(engine.current_question().is_none());
        engine.set_families(Vec::new());
        assert!(engine.current_question().is_none());
        engine.advance();
        assert_eq!(engine.position(), 0);
    }

    #[test]
    fn test_full_pool_questions_have_four_unique_choices() {
        let mut engine = seeded(Catalog::load().unwrap(), 7);
        engine.set_families([Family::Hiragana, Family::Katakana]);
        for _ in 0..300 {
            let question = engine.current_question().unwrap();
            assert_eq!(question.choices.len(), 4);
            assert_well_formed(question);
            engine.advance();
        }
    }

    #[test]
    fn test_small_pool_never_duplicates_or_hangs() {
        for size in 1..=3 {
            let names: Vec<String> = (0..size).map(|i| format!("r{i}")).collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let mut engine = seeded(tiny_catalog(&refs), size as u64);
            engine.set_families([Family::Hiragana]);
            for _ in 0..10 {
                let question = engine.current_question().unwrap();
                assert_eq!(question.choices.len(), size);
                assert_well_formed(question);
                engine.advance();
            }
        }
    }

    #[test]
    fn test_shared_romanizations_are_not_repeated() {
        // Four glyphs, only two distinct readings.
        let mut engine = seeded(tiny_catalog(&["a", "a", "b", "b"]), 3);
        engine.set_families([Family::Hiragana]);
        let question = engine.current_question().unwrap();
        assert_eq!(question.choices.len(), 2);
        assert_well_formed(question);
    }

    #[test]
    fn test_exactly_four_choices_when_barely_enough() {
        let mut engine = seeded(tiny_catalog(&["a", "b", "c", "d"]), 11);
        engine.set_families([Family::Hiragana]);
        for _ in 0..20 {
            let question = engine.current_question().unwrap();
            assert_eq!(question.choices.len(), 4);
            assert_well_formed(question);
            engine.advance();
        }
    }

    #[test]
    fn test_one_pass_visits_every_character_once() {
        let mut engine = seeded(Catalog::load().unwrap(), 42);
        engine.set_families([Family::Hiragana]);
        let n = engine.pool().len();
        assert_eq!(n, 46);

        let mut seen = HashSet::new();
        for _ in 0..n {
            let glyph = engine.current_character().unwrap().glyph.clone();
            assert!(seen.insert(glyph), "character repeated within a pass");
            engine.advance();
        }
        assert_eq!(seen.len(), n);
        // The advance past the last slot began a new pass.
        assert_eq!(engine.position(), 0);
        assert_eq!(engine.queue_len(), n);
    }

    #[test]
    fn test_question_is_stable_until_advance() {
        let mut engine = seeded(Catalog::load().unwrap(), 5);
        engine.set_families([Family::Katakana]);
        let first = engine.current_question().cloned().unwrap();
        assert_eq!(engine.current_question().cloned().unwrap(), first);
        engine.advance();
        assert_ne!(engine.current_question().unwrap().prompt, first.prompt);
    }

    #[test]
    fn test_set_families_resets_position() {
        let mut engine = seeded(Catalog::load().unwrap(), 9);
        engine.set_families([Family::Hiragana]);
        engine.advance();
        engine.advance();
        assert_eq!(engine.position(), 2);
        engine.set_families([Family::Hiragana, Family::Katakana]);
        assert_eq!(engine.position(), 0);
        assert_eq!(engine.queue_len(), 92);
    }

    #[test]
    fn test_evaluate_is_pure() {
        let question = Question {
            prompt: Character::new("し", "shi"),
            choices: vec!["shi".into(), "chi".into(), "tsu".into(), "su".into()],
        };
        for _ in 0..3 {
            assert!(QuestionEngine::evaluate("shi", &question));
            assert!(!QuestionEngine::evaluate("chi", &question));
            assert!(!QuestionEngine::evaluate("", &question));
        }
    }
}
