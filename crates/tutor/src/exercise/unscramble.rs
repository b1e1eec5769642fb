use std::sync::Arc;
use std::time::Instant;

use parla_domain::VocabularyItem;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use super::{Deck, Exercise, ExerciseAction, ExerciseEvent, ExerciseKind, Step};
use crate::config::PracticeConfig;
use crate::scoring::sequence_matches;
use crate::timer::{Timer, TimerToken};

/// Letters of one term, split between the shuffled pool and the learner's assembled answer.
/// The two together always hold exactly the term's characters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScrambleUnit {
    term: Vec<char>,
    pool: Vec<char>,
    assembled: Vec<char>,
    verdict: Option<bool>,
}

impl ScrambleUnit {
    pub fn new<R: Rng + ?Sized>(term: &str, rng: &mut R) -> Self {
        let term: Vec<char> = term.chars().collect();
        let pool = scramble(&term, rng);
        Self {
            term,
            pool,
            assembled: Vec::new(),
            verdict: None,
        }
    }

    pub fn pool(&self) -> &[char] {
        &self.pool
    }

    pub fn assembled(&self) -> &[char] {
        &self.assembled
    }

    pub fn assembled_text(&self) -> String {
        self.assembled.iter().collect()
    }

    pub fn is_correct(&self) -> Option<bool> {
        self.verdict
    }

    fn is_locked(&self) -> bool {
        self.verdict.is_some()
    }

    fn pick(&mut self, index: usize) -> bool {
        if self.is_locked() || index >= self.pool.len() {
            return false;
        }
        let letter = self.pool.remove(index);
        self.assembled.push(letter);
        true
    }

    fn unpick(&mut self, index: usize) -> bool {
        if self.is_locked() || index >= self.assembled.len() {
            return false;
        }
        let letter = self.assembled.remove(index);
        self.pool.push(letter);
        true
    }

    fn reset<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.is_locked() {
            return false;
        }
        self.assembled.clear();
        self.pool = scramble(&self.term, rng);
        true
    }

    fn matches_term(&self) -> bool {
        let term: String = self.term.iter().collect();
        sequence_matches(&self.assembled, &term)
    }

    fn reveal(&mut self) -> bool {
        if self.is_locked() {
            return false;
        }
        self.pool.clear();
        self.assembled = self.term.clone();
        self.verdict = Some(false);
        true
    }
}

/// Shuffles the letters, avoiding the original order whenever another order exists.
fn scramble<R: Rng + ?Sized>(term: &[char], rng: &mut R) -> Vec<char> {
    let mut letters = term.to_vec();
    letters.shuffle(rng);
    let all_same = term.windows(2).all(|pair| pair[0] == pair[1]);
    if letters == term && !all_same {
        letters.rotate_left(1);
    }
    letters
}

/// Rebuild the term from its scrambled letters. Filling the assembled sequence triggers the
/// check; a wrong arrangement stays editable.
pub struct UnscrambleExercise {
    deck: Deck<ScrambleUnit>,
    timer: Timer,
    rng: StdRng,
    config: PracticeConfig,
    score: u32,
}

impl UnscrambleExercise {
    pub fn new(items: Vec<Arc<VocabularyItem>>, config: &PracticeConfig, rng: StdRng) -> Self {
        let mut exercise = Self {
            deck: Deck::new(items),
            timer: Timer::new(),
            rng,
            config: config.clone(),
            score: 0,
        };
        exercise.build_current();
        exercise
    }

    pub fn unit(&self) -> Option<&ScrambleUnit> {
        self.deck.unit()
    }

    fn build_current(&mut self) {
        let rng = &mut self.rng;
        self.deck
            .ensure_unit(|item, _| ScrambleUnit::new(&item.term, rng));
    }

    fn current_id(&self) -> Option<String> {
        self.deck.current_item().map(|item| item.id.clone())
    }

    fn pick(&mut self, index: usize, now: Instant) -> Vec<ExerciseEvent> {
        let Some(item_id) = self.current_id() else {
            return Vec::new();
        };
        let Some(unit) = self.deck.unit_mut() else {
            return Vec::new();
        };
        if !unit.pick(index) {
            debug!(index, "pick ignored");
            return Vec::new();
        }
        if !unit.pool.is_empty() {
            return Vec::new();
        }
        if unit.matches_term() {
            unit.verdict = Some(true);
            self.score += 1;
            self.timer.schedule(now, self.config.auto_advance_delay());
            vec![ExerciseEvent::Answered {
                item_id,
                correct: true,
            }]
        } else {
            vec![ExerciseEvent::Rejected {
                item_id,
                near_miss: false,
            }]
        }
    }

    fn reveal(&mut self) -> Vec<ExerciseEvent> {
        let Some(item_id) = self.current_id() else {
            return Vec::new();
        };
        match self.deck.unit_mut().map(|unit| unit.reveal()) {
            Some(true) => vec![ExerciseEvent::Answered {
                item_id,
                correct: false,
            }],
            _ => Vec::new(),
        }
    }

    fn advance(&mut self) -> Vec<ExerciseEvent> {
        self.timer.cancel();
        match self.deck.step_forward() {
            Step::Moved(_) => {
                self.build_current();
                self.deck.presented().into_iter().collect()
            }
            Step::AtEnd => {
                if self.deck.finish() {
                    vec![ExerciseEvent::Finished]
                } else {
                    Vec::new()
                }
            }
        }
    }

    fn current_locked(&self) -> bool {
        self.deck.unit().map(ScrambleUnit::is_locked).unwrap_or(false)
    }
}

impl Exercise for UnscrambleExercise {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Unscramble
    }

    fn len(&self) -> usize {
        self.deck.len()
    }

    fn position(&self) -> usize {
        self.deck.index()
    }

    fn current_item(&self) -> Option<&Arc<VocabularyItem>> {
        self.deck.current_item()
    }

    fn score(&self) -> u32 {
        self.score
    }

    fn is_finished(&self) -> bool {
        self.deck.is_finished()
    }

    fn enter(&self) -> Vec<ExerciseEvent> {
        self.deck.presented().into_iter().collect()
    }

    fn apply(&mut self, action: ExerciseAction, now: Instant) -> Vec<ExerciseEvent> {
        match action {
            ExerciseAction::Pick(index) => self.pick(index, now),
            ExerciseAction::Unpick(index) => {
                if let Some(unit) = self.deck.unit_mut() {
                    unit.unpick(index);
                }
                Vec::new()
            }
            ExerciseAction::Reset => {
                let rng = &mut self.rng;
                if let Some(unit) = self.deck.unit_mut() {
                    unit.reset(rng);
                }
                Vec::new()
            }
            ExerciseAction::Reveal => self.reveal(),
            ExerciseAction::Next if self.current_locked() => self.advance(),
            ExerciseAction::Previous => {
                if self.deck.step_back().is_some() {
                    self.timer.cancel();
                    self.deck.presented().into_iter().collect()
                } else {
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    fn tick(&mut self, now: Instant) -> Vec<ExerciseEvent> {
        if self.timer.poll(now) {
            self.advance()
        } else {
            Vec::new()
        }
    }

    fn on_timer(&mut self, token: TimerToken) -> Vec<ExerciseEvent> {
        if self.timer.fire(token) {
            self.advance()
        } else {
            Vec::new()
        }
    }

    fn pending_timer(&self) -> Option<(TimerToken, Instant)> {
        self.timer.pending()
    }
}
