use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use parla_domain::VocabularyItem;

use super::{Deck, Exercise, ExerciseAction, ExerciseEvent, ExerciseKind, Step};
use crate::timer::TimerToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CardSide {
    Front,
    Back,
}

/// Free-navigation recall cards. Flipping never grades; an item is completed from outside,
/// typically by a passing pronunciation attempt.
pub struct FlashcardExercise {
    deck: Deck<()>,
    side: CardSide,
    completed: HashSet<String>,
}

impl FlashcardExercise {
    pub fn new(items: Vec<Arc<VocabularyItem>>) -> Self {
        Self {
            deck: Deck::new(items),
            side: CardSide::Front,
            completed: HashSet::new(),
        }
    }

    pub fn side(&self) -> CardSide {
        self.side
    }

    pub fn is_completed(&self, item_id: &str) -> bool {
        self.completed.contains(item_id)
    }

    /// Marks an item done. Emits `Finished` once every card is complete.
    pub fn mark_completed(&mut self, item_id: &str) -> Vec<ExerciseEvent> {
        let known = self.deck.items().iter().any(|item| item.id == item_id);
        if !known || !self.completed.insert(item_id.to_string()) {
            return Vec::new();
        }
        if self.completed.len() == self.deck.len() && self.deck.finish() {
            vec![ExerciseEvent::Finished]
        } else {
            Vec::new()
        }
    }

    fn moved(&mut self) -> Vec<ExerciseEvent> {
        self.side = CardSide::Front;
        self.deck.presented().into_iter().collect()
    }
}

impl Exercise for FlashcardExercise {
    fn kind(&self) -> ExerciseKind {
        ExerciseKind::Flashcard
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
        self.completed.len() as u32
    }

    fn is_finished(&self) -> bool {
        self.deck.is_finished()
    }

    fn enter(&self) -> Vec<ExerciseEvent> {
        self.deck.presented().into_iter().collect()
    }

    fn apply(&mut self, action: ExerciseAction, _now: Instant) -> Vec<ExerciseEvent> {
        if self.deck.current_item().is_none() {
            return Vec::new();
        }
        match action {
            ExerciseAction::Flip => {
                self.side = match self.side {
                    CardSide::Front => CardSide::Back,
                    CardSide::Back => CardSide::Front,
                };
                Vec::new()
            }
            ExerciseAction::Next => match self.deck.step_forward() {
                Step::Moved(_) => self.moved(),
                Step::AtEnd => Vec::new(),
            },
            ExerciseAction::Previous => match self.deck.step_back() {
                Some(_) => self.moved(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn tick(&mut self, _now: Instant) -> Vec<ExerciseEvent> {
        Vec::new()
    }

    fn on_timer(&mut self, _token: TimerToken) -> Vec<ExerciseEvent> {
        Vec::new()
    }

    fn pending_timer(&self) -> Option<(TimerToken, Instant)> {
        None
    }
}
