use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use parla_domain::{PracticeError, VocabularyItem};
use serde::{Deserialize, Serialize};

use crate::timer::TimerToken;

pub mod choice;
pub mod flashcard;
pub mod typing;
pub mod unscramble;

pub use choice::{ChoiceExercise, ChoiceMode};
pub use flashcard::{CardSide, FlashcardExercise};
pub use typing::{TypingExercise, TypingUnit};
pub use unscramble::{ScrambleUnit, UnscrambleExercise};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    Flashcard,
    MultipleChoice,
    Listening,
    Typing,
    Unscramble,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 5] = [
        ExerciseKind::Flashcard,
        ExerciseKind::MultipleChoice,
        ExerciseKind::Listening,
        ExerciseKind::Typing,
        ExerciseKind::Unscramble,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Flashcard => "flashcard",
            ExerciseKind::MultipleChoice => "multiple-choice",
            ExerciseKind::Listening => "listening",
            ExerciseKind::Typing => "typing",
            ExerciseKind::Unscramble => "unscramble",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExerciseKind {
    type Err = PracticeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ExerciseKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| PracticeError::validation(format!("unknown exercise kind '{value}'")))
    }
}

/// User input routed to the active exercise. Actions an exercise does not support are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExerciseAction {
    Flip,
    Next,
    Previous,
    /// Choose the option at this index.
    Select(usize),
    /// Replace the typed text.
    Input(String),
    Submit,
    Reveal,
    /// Move the pool character at this index to the end of the assembled sequence.
    Pick(usize),
    /// Return the assembled character at this index to the pool.
    Unpick(usize),
    Reset,
    /// Play the current item's audio again.
    Replay,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExerciseEvent {
    Presented { item_id: String, index: usize },
    /// The unit's verdict is locked.
    Answered { item_id: String, correct: bool },
    /// A wrong attempt that leaves the unit open.
    Rejected { item_id: String, near_miss: bool },
    PlayAudio { item_id: String, url: Option<String> },
    Finished,
}

pub trait Exercise {
    fn kind(&self) -> ExerciseKind;
    fn len(&self) -> usize;
    fn position(&self) -> usize;
    fn current_item(&self) -> Option<&Arc<VocabularyItem>>;
    fn score(&self) -> u32;
    fn is_finished(&self) -> bool;
    /// Events for presenting the current item, e.g. when the exercise is first shown.
    fn enter(&self) -> Vec<ExerciseEvent>;
    fn apply(&mut self, action: ExerciseAction, now: Instant) -> Vec<ExerciseEvent>;
    /// Runs any due timer.
    fn tick(&mut self, now: Instant) -> Vec<ExerciseEvent>;
    /// Runs the timer identified by `token` if it is still current.
    fn on_timer(&mut self, token: TimerToken) -> Vec<ExerciseEvent>;
    /// The pending auto-advance, for hosts that schedule their own callbacks.
    fn pending_timer(&self) -> Option<(TimerToken, Instant)>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One multiple-choice question: the target plus its shuffled candidates.
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseUnit {
    pub target: Arc<VocabularyItem>,
    pub options: Vec<Arc<VocabularyItem>>,
    answered_index: Option<usize>,
}

impl ExerciseUnit {
    pub fn new(target: Arc<VocabularyItem>, options: Vec<Arc<VocabularyItem>>) -> Self {
        Self {
            target,
            options,
            answered_index: None,
        }
    }

    pub fn answered_index(&self) -> Option<usize> {
        self.answered_index
    }

    pub fn is_answered(&self) -> bool {
        self.answered_index.is_some()
    }

    pub fn is_correct(&self) -> Option<bool> {
        self.answered_index
            .and_then(|index| self.options.get(index))
            .map(|option| option.id == self.target.id)
    }

    pub fn correct_index(&self) -> Option<usize> {
        self.options
            .iter()
            .position(|option| option.id == self.target.id)
    }

    /// Locks the unit on the first valid selection. Returns the verdict, or `None` when the unit
    /// was already answered or the index is out of range.
    pub fn answer(&mut self, index: usize) -> Option<bool> {
        if self.answered_index.is_some() || index >= self.options.len() {
            return None;
        }
        self.answered_index = Some(index);
        self.is_correct()
    }
}

pub(crate) enum Step {
    Moved(usize),
    AtEnd,
}

/// Ordered working list with one lazily built unit per position.
pub(crate) struct Deck<U> {
    items: Vec<Arc<VocabularyItem>>,
    units: Vec<Option<U>>,
    index: usize,
    finished: bool,
}

impl<U> Deck<U> {
    pub(crate) fn new(items: Vec<Arc<VocabularyItem>>) -> Self {
        let units = items.iter().map(|_| None).collect();
        Self {
            items,
            units,
            index: 0,
            finished: false,
        }
    }

    pub(crate) fn items(&self) -> &[Arc<VocabularyItem>] {
        &self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn current_item(&self) -> Option<&Arc<VocabularyItem>> {
        if self.finished {
            return None;
        }
        self.items.get(self.index)
    }

    pub(crate) fn unit(&self) -> Option<&U> {
        if self.finished {
            return None;
        }
        self.units.get(self.index).and_then(Option::as_ref)
    }

    pub(crate) fn unit_mut(&mut self) -> Option<&mut U> {
        if self.finished {
            return None;
        }
        self.units.get_mut(self.index).and_then(Option::as_mut)
    }

    pub(crate) fn ensure_unit<F>(&mut self, build: F)
    where
        F: FnOnce(&Arc<VocabularyItem>, &[Arc<VocabularyItem>]) -> U,
    {
        let index = self.index;
        if index < self.units.len() && self.units[index].is_none() {
            let unit = build(&self.items[index], &self.items);
            self.units[index] = Some(unit);
        }
    }

    pub(crate) fn step_forward(&mut self) -> Step {
        if self.finished || self.items.is_empty() {
            return Step::AtEnd;
        }
        if self.index + 1 < self.items.len() {
            self.index += 1;
            Step::Moved(self.index)
        } else {
            Step::AtEnd
        }
    }

    pub(crate) fn step_back(&mut self) -> Option<usize> {
        if self.finished || self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.index)
    }

    pub(crate) fn finish(&mut self) -> bool {
        if self.finished || self.items.is_empty() {
            return false;
        }
        self.finished = true;
        true
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn presented(&self) -> Option<ExerciseEvent> {
        self.current_item().map(|item| ExerciseEvent::Presented {
            item_id: item.id.clone(),
            index: self.index,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_strings() {
        for kind in ExerciseKind::ALL {
            assert_eq!(kind.as_str().parse::<ExerciseKind>().unwrap(), kind);
        }
        assert!("speaking".parse::<ExerciseKind>().is_err());
    }

    #[test]
    fn unit_locks_on_first_answer() {
        let items = fixtures::items(&["cat", "dog", "fish"]);
        let mut unit = ExerciseUnit::new(items[0].clone(), items.clone());
        assert_eq!(unit.answer(9), None);
        assert_eq!(unit.answer(1), Some(false));
        assert_eq!(unit.answer(0), None);
        assert_eq!(unit.answered_index(), Some(1));
        assert_eq!(unit.is_correct(), Some(false));
        assert_eq!(unit.correct_index(), Some(0));
    }

    #[test]
    fn deck_navigation_stops_at_edges() {
        let mut deck: Deck<()> = Deck::new(fixtures::items(&["a", "b"]));
        assert_eq!(deck.step_back(), None);
        assert!(matches!(deck.step_forward(), Step::Moved(1)));
        assert!(matches!(deck.step_forward(), Step::AtEnd));
        assert_eq!(deck.index(), 1);
        assert!(deck.finish());
        assert!(!deck.finish());
        assert!(deck.current_item().is_none());
    }

    #[test]
    fn empty_deck_is_inert() {
        let mut deck: Deck<()> = Deck::new(Vec::new());
        assert!(deck.current_item().is_none());
        assert!(matches!(deck.step_forward(), Step::AtEnd));
        assert!(!deck.finish());
        assert!(deck.presented().is_none());
    }
}
