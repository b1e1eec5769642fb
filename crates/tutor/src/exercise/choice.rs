use std::sync::Arc;
use std::time::Instant;

use parla_domain::VocabularyItem;
use rand::rngs::StdRng;
use tracing::debug;

use super::{Deck, Exercise, ExerciseAction, ExerciseEvent, ExerciseKind, ExerciseUnit, Step};
use crate::config::PracticeConfig;
use crate::distractor::select_options;
use crate::timer::{Timer, TimerToken};

const LISTENING_PROMPT: &str = "Listen and choose the meaning";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChoiceMode {
    /// Shows the meaning, offers terms.
    MultipleChoice,
    /// Plays the term, offers meanings.
    Listening,
}

impl ChoiceMode {
    pub fn prompt<'a>(&self, item: &'a VocabularyItem) -> &'a str {
        match self {
            ChoiceMode::MultipleChoice => &item.meaning,
            ChoiceMode::Listening => LISTENING_PROMPT,
        }
    }

    pub fn option_label<'a>(&self, item: &'a VocabularyItem) -> &'a str {
        match self {
            ChoiceMode::MultipleChoice => &item.term,
            ChoiceMode::Listening => &item.meaning,
        }
    }
}

/// Multiple-choice and listening discrimination. The first selection locks the unit; the
/// exercise then moves on by itself after the configured delay.
pub struct ChoiceExercise {
    mode: ChoiceMode,
    deck: Deck<ExerciseUnit>,
    timer: Timer,
    rng: StdRng,
    config: PracticeConfig,
    score: u32,
}

impl ChoiceExercise {
    pub fn new(
        mode: ChoiceMode,
        items: Vec<Arc<VocabularyItem>>,
        config: &PracticeConfig,
        rng: StdRng,
    ) -> Self {
        let mut exercise = Self {
            mode,
            deck: Deck::new(items),
            timer: Timer::new(),
            rng,
            config: config.clone(),
            score: 0,
        };
        exercise.build_current();
        exercise
    }

    pub fn mode(&self) -> ChoiceMode {
        self.mode
    }

    pub fn unit(&self) -> Option<&ExerciseUnit> {
        self.deck.unit()
    }

    fn build_current(&mut self) {
        let count = self.config.distractor_count;
        let rng = &mut self.rng;
        self.deck.ensure_unit(|target, items| {
            ExerciseUnit::new(target.clone(), select_options(target, items, count, rng))
        });
    }

    fn play_current(&self) -> Option<ExerciseEvent> {
        if self.mode != ChoiceMode::Listening {
            return None;
        }
        self.deck.current_item().map(|item| ExerciseEvent::PlayAudio {
            item_id: item.id.clone(),
            url: item.audio_url(self.config.accent).map(str::to_string),
        })
    }

    fn entry_events(&self) -> Vec<ExerciseEvent> {
        self.deck
            .presented()
            .into_iter()
            .chain(self.play_current())
            .collect()
    }

    fn select(&mut self, index: usize, now: Instant) -> Vec<ExerciseEvent> {
        let Some(unit) = self.deck.unit_mut() else {
            return Vec::new();
        };
        let Some(correct) = unit.answer(index) else {
            debug!(index, "selection ignored");
            return Vec::new();
        };
        let item_id = unit.target.id.clone();
        if correct {
            self.score += 1;
        }
        self.timer.schedule(now, self.config.auto_advance_delay());
        let mut events = vec![ExerciseEvent::Answered { item_id, correct }];
        events.extend(self.play_current());
        events
    }

    fn advance(&mut self) -> Vec<ExerciseEvent> {
        self.timer.cancel();
        match self.deck.step_forward() {
            Step::Moved(_) => {
                self.build_current();
                self.entry_events()
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

    fn current_answered(&self) -> bool {
        self.deck.unit().map(ExerciseUnit::is_answered).unwrap_or(false)
    }
}

impl Exercise for ChoiceExercise {
    fn kind(&self) -> ExerciseKind {
        match self.mode {
            ChoiceMode::MultipleChoice => ExerciseKind::MultipleChoice,
            ChoiceMode::Listening => ExerciseKind::Listening,
        }
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
        self.entry_events()
    }

    fn apply(&mut self, action: ExerciseAction, now: Instant) -> Vec<ExerciseEvent> {
        match action {
            ExerciseAction::Select(index) => self.select(index, now),
            ExerciseAction::Next if self.current_answered() => self.advance(),
            ExerciseAction::Replay => self.play_current().into_iter().collect(),
            ExerciseAction::Previous => {
                if self.deck.step_back().is_some() {
                    self.timer.cancel();
                    self.entry_events()
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

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::SeedableRng;

    use super::*;
    use crate::exercise::fixtures::items;

    fn exercise(mode: ChoiceMode, terms: &[&str]) -> ChoiceExercise {
        ChoiceExercise::new(
            mode,
            items(terms),
            &PracticeConfig::default(),
            StdRng::seed_from_u64(11),
        )
    }

    fn correct_index(exercise: &ChoiceExercise) -> usize {
        exercise.unit().unwrap().correct_index().unwrap()
    }

    #[test]
    fn builds_four_options_per_unit() {
        let exercise = exercise(ChoiceMode::MultipleChoice, &["a", "b", "c", "d", "e"]);
        let unit = exercise.unit().unwrap();
        assert_eq!(unit.options.len(), 4);
        assert_eq!(unit.target.id, exercise.current_item().unwrap().id);
    }

    #[test]
    fn first_answer_locks_the_unit() {
        let mut exercise = exercise(ChoiceMode::MultipleChoice, &["a", "b", "c", "d"]);
        let now = Instant::now();
        let right = correct_index(&exercise);
        let wrong = (right + 1) % 4;
        let events = exercise.apply(ExerciseAction::Select(wrong), now);
        assert!(matches!(
            events.as_slice(),
            [ExerciseEvent::Answered { correct: false, .. }]
        ));
        assert!(exercise.apply(ExerciseAction::Select(right), now).is_empty());
        assert_eq!(exercise.unit().unwrap().is_correct(), Some(false));
        assert_eq!(exercise.score(), 0);
    }

    #[test]
    fn correct_answer_scores_and_auto_advances() {
        let mut exercise = exercise(ChoiceMode::MultipleChoice, &["a", "b", "c", "d"]);
        let now = Instant::now();
        let right = correct_index(&exercise);
        exercise.apply(ExerciseAction::Select(right), now);
        assert_eq!(exercise.score(), 1);
        assert!(exercise.tick(now + Duration::from_millis(1_999)).is_empty());
        let events = exercise.tick(now + Duration::from_secs(2));
        assert!(matches!(
            events.as_slice(),
            [ExerciseEvent::Presented { index: 1, .. }]
        ));
        assert_eq!(exercise.position(), 1);
        assert!(!exercise.unit().unwrap().is_answered());
    }

    #[test]
    fn last_unit_finishes_instead_of_advancing() {
        let mut exercise = exercise(ChoiceMode::MultipleChoice, &["a", "b"]);
        let now = Instant::now();
        for _ in 0..2 {
            let right = correct_index(&exercise);
            exercise.apply(ExerciseAction::Select(right), now);
            exercise.apply(ExerciseAction::Next, now);
        }
        assert!(exercise.is_finished());
        assert_eq!(exercise.score(), 2);
        assert!(exercise.current_item().is_none());
        assert!(exercise.tick(now + Duration::from_secs(10)).is_empty());
    }

    #[test]
    fn navigating_away_cancels_the_pending_advance() {
        let mut exercise = exercise(ChoiceMode::MultipleChoice, &["a", "b", "c"]);
        let now = Instant::now();
        exercise.apply(ExerciseAction::Select(correct_index(&exercise)), now);
        exercise.apply(ExerciseAction::Next, now);
        exercise.apply(ExerciseAction::Select(correct_index(&exercise)), now);
        let (token, _) = exercise.pending_timer().unwrap();
        exercise.apply(ExerciseAction::Previous, now);
        assert!(exercise.on_timer(token).is_empty());
        assert!(exercise.tick(now + Duration::from_secs(5)).is_empty());
        assert_eq!(exercise.position(), 0);
        // revisiting keeps the locked answer and its score
        assert!(exercise.unit().unwrap().is_answered());
        assert_eq!(exercise.score(), 2);
    }

    #[test]
    fn next_is_gated_on_an_answer() {
        let mut exercise = exercise(ChoiceMode::MultipleChoice, &["a", "b"]);
        assert!(exercise
            .apply(ExerciseAction::Next, Instant::now())
            .is_empty());
        assert_eq!(exercise.position(), 0);
    }

    #[test]
    fn listening_plays_on_entry_and_after_answer() {
        let mut exercise = exercise(ChoiceMode::Listening, &["a", "b", "c", "d"]);
        let entry = exercise.enter();
        assert!(matches!(
            entry.as_slice(),
            [ExerciseEvent::Presented { .. }, ExerciseEvent::PlayAudio { url: Some(_), .. }]
        ));
        let wrong = (correct_index(&exercise) + 1) % 4;
        let events = exercise.apply(ExerciseAction::Select(wrong), Instant::now());
        assert!(matches!(
            events.as_slice(),
            [ExerciseEvent::Answered { correct: false, .. }, ExerciseEvent::PlayAudio { .. }]
        ));
        assert_eq!(
            ChoiceMode::Listening.option_label(exercise.current_item().unwrap()),
            exercise.current_item().unwrap().meaning
        );
    }

    #[test]
    fn listening_prompt_never_shows_the_term() {
        let mut exercise = exercise(ChoiceMode::Listening, &["apple", "pear", "plum"]);
        for _ in 0..exercise.len() {
            let item = exercise.current_item().unwrap().clone();
            let prompt = ChoiceMode::Listening.prompt(&item);
            assert!(!prompt.contains(&item.term));
            let now = Instant::now();
            exercise.apply(ExerciseAction::Select(correct_index(&exercise)), now);
            exercise.apply(ExerciseAction::Next, now);
        }
        let bare = VocabularyItem::new("a", "apple", "a fruit");
        assert_eq!(ChoiceMode::Listening.prompt(&bare), "Listen and choose the meaning");
    }

    #[test]
    fn replay_repeats_audio_only_when_listening() {
        let mut listening = exercise(ChoiceMode::Listening, &["a", "b"]);
        let events = listening.apply(ExerciseAction::Replay, Instant::now());
        assert!(matches!(
            events.as_slice(),
            [ExerciseEvent::PlayAudio { url: Some(_), .. }]
        ));
        let mut choice = exercise(ChoiceMode::MultipleChoice, &["a", "b"]);
        assert!(choice.apply(ExerciseAction::Replay, Instant::now()).is_empty());
    }

    #[test]
    fn empty_list_is_a_defined_state() {
        let mut exercise = exercise(ChoiceMode::MultipleChoice, &[]);
        assert!(exercise.is_empty());
        assert!(exercise.unit().is_none());
        assert!(exercise.enter().is_empty());
        assert!(exercise
            .apply(ExerciseAction::Select(0), Instant::now())
            .is_empty());
    }

    #[test]
    fn two_item_pool_offers_two_options() {
        let exercise = exercise(ChoiceMode::MultipleChoice, &["a", "b"]);
        assert_eq!(exercise.unit().unwrap().options.len(), 2);
    }
}
