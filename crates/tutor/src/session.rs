use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use parla_domain::{
    CompletionReport, ContentProvider, ItemFilter, PracticeError, ProgressSnapshot, ProgressStore,
    PronunciationResult, SessionProgress, VocabularyItem,
};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

use crate::analytics::{SessionAnalytics, SessionSummary};
use crate::config::PracticeConfig;
use crate::exercise::{
    ChoiceExercise, ChoiceMode, Exercise, ExerciseAction, ExerciseEvent, ExerciseKind,
    FlashcardExercise, TypingExercise, UnscrambleExercise,
};
use crate::interpret::{AssessmentStats, ResultInterpreter, ResultView};
use crate::timer::TimerToken;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SessionStatus {
    /// No items to practice.
    Empty,
    Active,
    Finished,
}

pub enum ActiveExercise {
    Flashcard(FlashcardExercise),
    Choice(ChoiceExercise),
    Typing(TypingExercise),
    Unscramble(UnscrambleExercise),
}

impl ActiveExercise {
    fn build(
        kind: ExerciseKind,
        items: Vec<Arc<VocabularyItem>>,
        config: &PracticeConfig,
        rng: StdRng,
    ) -> Self {
        match kind {
            ExerciseKind::Flashcard => ActiveExercise::Flashcard(FlashcardExercise::new(items)),
            ExerciseKind::MultipleChoice => ActiveExercise::Choice(ChoiceExercise::new(
                ChoiceMode::MultipleChoice,
                items,
                config,
                rng,
            )),
            ExerciseKind::Listening => ActiveExercise::Choice(ChoiceExercise::new(
                ChoiceMode::Listening,
                items,
                config,
                rng,
            )),
            ExerciseKind::Typing => ActiveExercise::Typing(TypingExercise::new(items, config)),
            ExerciseKind::Unscramble => {
                ActiveExercise::Unscramble(UnscrambleExercise::new(items, config, rng))
            }
        }
    }

    pub fn as_exercise(&self) -> &dyn Exercise {
        match self {
            ActiveExercise::Flashcard(exercise) => exercise,
            ActiveExercise::Choice(exercise) => exercise,
            ActiveExercise::Typing(exercise) => exercise,
            ActiveExercise::Unscramble(exercise) => exercise,
        }
    }

    pub fn as_exercise_mut(&mut self) -> &mut dyn Exercise {
        match self {
            ActiveExercise::Flashcard(exercise) => exercise,
            ActiveExercise::Choice(exercise) => exercise,
            ActiveExercise::Typing(exercise) => exercise,
            ActiveExercise::Unscramble(exercise) => exercise,
        }
    }
}

/// Outcome of a pronunciation attempt recorded against an item.
#[derive(Debug, Clone, PartialEq)]
pub struct PronunciationVerdict {
    pub view: ResultView,
    pub passed: bool,
    /// The attempt completed the item for the first time.
    pub newly_completed: bool,
}

/// Sequences one exercise kind over the session's items and keeps score.
///
/// The pool is deduplicated by id, shuffled once and capped at `session_size`; progress is
/// counted over that set. Every locked answer is queued as a [`CompletionReport`] for the
/// progress store.
pub struct PracticeSession {
    config: PracticeConfig,
    items: Vec<Arc<VocabularyItem>>,
    kind: ExerciseKind,
    exercise: ActiveExercise,
    status: SessionStatus,
    progress: SessionProgress,
    analytics: SessionAnalytics,
    stats: AssessmentStats,
    interpreter: ResultInterpreter,
    outbox: Vec<CompletionReport>,
    snapshot: Option<ProgressSnapshot>,
    rng: StdRng,
}

impl PracticeSession {
    pub fn new(
        pool: Vec<VocabularyItem>,
        kind: ExerciseKind,
        config: PracticeConfig,
    ) -> Result<Self, PracticeError> {
        Self::with_rng(pool, kind, config, StdRng::from_entropy())
    }

    pub fn with_rng(
        pool: Vec<VocabularyItem>,
        kind: ExerciseKind,
        config: PracticeConfig,
        mut rng: StdRng,
    ) -> Result<Self, PracticeError> {
        config.validate()?;
        let mut seen = HashSet::new();
        let mut items: Vec<Arc<VocabularyItem>> = pool
            .into_iter()
            .filter(|item| seen.insert(item.id.clone()))
            .map(Arc::new)
            .collect();
        items.shuffle(&mut rng);
        if let Some(size) = config.session_size {
            items.truncate(size);
        }

        let progress = SessionProgress::new(items.iter().map(|item| item.id.clone()));
        let status = if items.is_empty() {
            SessionStatus::Empty
        } else {
            SessionStatus::Active
        };
        let exercise_rng = StdRng::seed_from_u64(rng.gen());
        let exercise = ActiveExercise::build(kind, items.clone(), &config, exercise_rng);
        info!(items = items.len(), %kind, "practice session started");
        Ok(Self {
            interpreter: ResultInterpreter::new(config.tiers),
            config,
            items,
            kind,
            exercise,
            status,
            progress,
            analytics: SessionAnalytics::new(),
            stats: AssessmentStats::new(),
            outbox: Vec::new(),
            snapshot: None,
            rng,
        })
    }

    /// Fetches the pool from `provider` and starts a session over it.
    #[instrument(skip(provider, config))]
    pub async fn load(
        provider: &dyn ContentProvider,
        filter: &ItemFilter,
        kind: ExerciseKind,
        config: PracticeConfig,
    ) -> Result<Self, PracticeError> {
        let pool = provider.fetch_items(filter).await?;
        Self::new(pool, kind, config)
    }

    pub fn config(&self) -> &PracticeConfig {
        &self.config
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn items(&self) -> &[Arc<VocabularyItem>] {
        &self.items
    }

    pub fn progress(&self) -> &SessionProgress {
        &self.progress
    }

    pub fn stats(&self) -> &AssessmentStats {
        &self.stats
    }

    pub fn interpreter(&self) -> &ResultInterpreter {
        &self.interpreter
    }

    /// Last snapshot read from the progress store. Display only; never feeds the local score.
    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.snapshot
    }

    pub fn exercise(&self) -> Result<&ActiveExercise, PracticeError> {
        match self.status {
            SessionStatus::Empty => Err(PracticeError::EmptyPool),
            _ => Ok(&self.exercise),
        }
    }

    pub fn exercise_mut(&mut self) -> Result<&mut ActiveExercise, PracticeError> {
        match self.status {
            SessionStatus::Empty => Err(PracticeError::EmptyPool),
            _ => Ok(&mut self.exercise),
        }
    }

    /// Events for presenting the current item.
    pub fn enter(&self) -> Vec<ExerciseEvent> {
        self.exercise.as_exercise().enter()
    }

    /// Replaces the active exercise with a fresh one of `kind` over a new shuffle of the same
    /// items. Progress and the outbox carry over.
    pub fn switch_kind(&mut self, kind: ExerciseKind) -> Vec<ExerciseEvent> {
        let mut items = self.items.clone();
        items.shuffle(&mut self.rng);
        let exercise_rng = StdRng::seed_from_u64(self.rng.gen());
        self.exercise = ActiveExercise::build(kind, items, &self.config, exercise_rng);
        self.kind = kind;
        if self.status != SessionStatus::Empty {
            self.status = SessionStatus::Active;
        }
        debug!(%kind, "exercise kind switched");
        self.enter()
    }

    pub fn apply(&mut self, action: ExerciseAction, now: Instant) -> Vec<ExerciseEvent> {
        if self.status == SessionStatus::Empty {
            return Vec::new();
        }
        let events = self.exercise.as_exercise_mut().apply(action, now);
        self.route(&events);
        events
    }

    pub fn tick(&mut self, now: Instant) -> Vec<ExerciseEvent> {
        let events = self.exercise.as_exercise_mut().tick(now);
        self.route(&events);
        events
    }

    pub fn on_timer(&mut self, token: TimerToken) -> Vec<ExerciseEvent> {
        let events = self.exercise.as_exercise_mut().on_timer(token);
        self.route(&events);
        events
    }

    pub fn pending_timer(&self) -> Option<(TimerToken, Instant)> {
        self.exercise.as_exercise().pending_timer()
    }

    fn route(&mut self, events: &[ExerciseEvent]) {
        for event in events {
            match event {
                ExerciseEvent::Answered { item_id, correct } => {
                    self.analytics.record_answer(*correct);
                    self.progress.record_attempt(item_id, *correct);
                    self.outbox.push(CompletionReport {
                        item_id: item_id.clone(),
                        correct: *correct,
                    });
                }
                ExerciseEvent::Rejected { item_id, .. } => {
                    self.analytics.record_rejection();
                    self.progress.record_attempt(item_id, false);
                }
                ExerciseEvent::Finished => {
                    self.status = SessionStatus::Finished;
                    info!(
                        kind = %self.kind,
                        completion = self.progress.completion_percentage(),
                        "exercise finished"
                    );
                }
                ExerciseEvent::Presented { .. } | ExerciseEvent::PlayAudio { .. } => {}
            }
        }
    }

    /// Marks an item complete from outside the exercise, e.g. after a passing pronunciation.
    /// Returns `false` when the item was already complete or is not part of the session.
    pub fn on_item_complete(&mut self, item_id: &str) -> bool {
        let newly_completed = self.progress.mark_complete(item_id);
        if newly_completed {
            self.outbox.push(CompletionReport {
                item_id: item_id.to_string(),
                correct: true,
            });
        }
        if let ActiveExercise::Flashcard(cards) = &mut self.exercise {
            let events = cards.mark_completed(item_id);
            self.route(&events);
        }
        newly_completed
    }

    /// Interprets a pronunciation result for `item_id` and completes the item when the overall
    /// score reaches the pass threshold.
    pub fn record_pronunciation(
        &mut self,
        item_id: &str,
        result: &PronunciationResult,
    ) -> Result<PronunciationVerdict, PracticeError> {
        let term = self
            .items
            .iter()
            .find(|item| item.id == item_id)
            .map(|item| item.term.clone())
            .ok_or_else(|| PracticeError::validation(format!("unknown item '{item_id}'")))?;
        self.stats.record(result);
        let view = self.interpreter.interpret(&term, result);
        let passed = result
            .scores
            .overall
            .map(|overall| overall >= self.config.pass_threshold)
            .unwrap_or(false);
        let newly_completed = if passed {
            self.on_item_complete(item_id)
        } else {
            self.progress.record_attempt(item_id, false);
            false
        };
        debug!(item_id, passed, "pronunciation recorded");
        Ok(PronunciationVerdict {
            view,
            passed,
            newly_completed,
        })
    }

    pub fn completion_percentage(&self) -> u8 {
        self.progress.completion_percentage()
    }

    pub fn score(&self) -> u32 {
        self.exercise.as_exercise().score()
    }

    pub fn pending_reports(&self) -> &[CompletionReport] {
        &self.outbox
    }

    pub fn take_reports(&mut self) -> Vec<CompletionReport> {
        std::mem::take(&mut self.outbox)
    }

    /// Sends queued reports. Failures are logged and dropped; returns how many were accepted.
    pub async fn flush_reports(&mut self, store: &dyn ProgressStore) -> usize {
        let mut delivered = 0;
        for report in self.take_reports() {
            match store
                .report_completion(&report.item_id, report.correct)
                .await
            {
                Ok(()) => delivered += 1,
                Err(err) => warn!(item_id = %report.item_id, %err, "progress report dropped"),
            }
        }
        delivered
    }

    /// Reads the stored progress for display. A failed read keeps the previous snapshot.
    pub async fn preload_snapshot(
        &mut self,
        store: &dyn ProgressStore,
        set_id: &str,
    ) -> Option<ProgressSnapshot> {
        match store.get_progress(set_id).await {
            Ok(snapshot) => self.snapshot = Some(snapshot),
            Err(err) => warn!(set_id, %err, "progress snapshot unavailable"),
        }
        self.snapshot
    }

    pub fn summary(&self) -> SessionSummary {
        self.analytics.summarize(
            self.kind,
            self.completion_percentage(),
            &self.stats,
            OffsetDateTime::now_utc(),
        )
    }
}
