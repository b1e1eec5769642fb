use std::sync::Arc;
use std::time::Instant;

use parla_domain::VocabularyItem;

use super::{Deck, Exercise, ExerciseAction, ExerciseEvent, ExerciseKind, Step};
use crate::config::PracticeConfig;
use crate::scoring::{grade_typed, AnswerVerdict};
use crate::timer::{Timer, TimerToken};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypingUnit {
    pub input: String,
    pub attempts: u32,
    /// Last rejected attempt was within the near-miss distance.
    pub near_miss: bool,
    verdict: Option<bool>,
    revealed: bool,
}

impl TypingUnit {
    pub fn is_correct(&self) -> Option<bool> {
        self.verdict
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

/// Type the term for the shown meaning. Wrong attempts stay open; a correct answer or a reveal
/// locks the unit.
pub struct TypingExercise {
    deck: Deck<TypingUnit>,
    timer: Timer,
    config: PracticeConfig,
    score: u32,
}

impl TypingExercise {
    pub fn new(items: Vec<Arc<VocabularyItem>>, config: &PracticeConfig) -> Self {
        let mut deck = Deck::new(items);
        deck.ensure_unit(|_, _| TypingUnit::default());
        Self {
            deck,
            timer: Timer::new(),
            config: config.clone(),
            score: 0,
        }
    }

    pub fn unit(&self) -> Option<&TypingUnit> {
        self.deck.unit()
    }

    fn open_unit(&mut self) -> Option<(&mut TypingUnit, String, String)> {
        let item = self.deck.current_item()?.clone();
        let unit = self.deck.unit_mut()?;
        if unit.verdict.is_some() {
            return None;
        }
        Some((unit, item.id.clone(), item.term.clone()))
    }

    fn submit(&mut self, now: Instant) -> Vec<ExerciseEvent> {
        let near_miss_distance = self.config.near_miss_distance;
        let Some((unit, item_id, term)) = self.open_unit() else {
            return Vec::new();
        };
        match grade_typed(&unit.input, &term, near_miss_distance) {
            AnswerVerdict::Correct => {
                unit.verdict = Some(true);
                unit.near_miss = false;
                self.score += 1;
                self.timer.schedule(now, self.config.auto_advance_delay());
                vec![ExerciseEvent::Answered {
                    item_id,
                    correct: true,
                }]
            }
            verdict => {
                unit.attempts += 1;
                unit.near_miss = matches!(verdict, AnswerVerdict::NearMiss { .. });
                vec![ExerciseEvent::Rejected {
                    item_id,
                    near_miss: unit.near_miss,
                }]
            }
        }
    }

    fn reveal(&mut self) -> Vec<ExerciseEvent> {
        let Some((unit, item_id, term)) = self.open_unit() else {
            return Vec::new();
        };
        unit.input = term;
        unit.verdict = Some(false);
        unit.revealed = true;
        vec![ExerciseEvent::Answered {
            item_id,
            correct: false,
        }]
    }

    fn advance(&mut self) -> Vec<ExerciseEvent> {
        self.timer.cancel();
        match self.deck.step_forward() {
            Step::Moved(_) => {
                self.deck.ensure_unit(|_, _| TypingUnit::default());
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
}

impl Exercise for TypingExercise {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Typing
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
            ExerciseAction::Input(text) => {
                if let Some((unit, _, _)) = self.open_unit() {
                    unit.input = text;
                }
                Vec::new()
            }
            ExerciseAction::Submit => self.submit(now),
            ExerciseAction::Reveal => self.reveal(),
            ExerciseAction::Next if self.unit().and_then(TypingUnit::is_correct).is_some() => {
                self.advance()
            }
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
