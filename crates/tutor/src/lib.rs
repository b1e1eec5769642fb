pub mod analytics;
pub mod config;
pub mod distractor;
pub mod exercise;
pub mod interpret;
pub mod pronunciation;
pub mod scoring;
pub mod session;
pub mod timer;

pub use analytics::{SessionAnalytics, SessionSummary, StreakTracker};
pub use config::PracticeConfig;
pub use distractor::select_options;
pub use exercise::{
    CardSide, ChoiceExercise, ChoiceMode, Exercise, ExerciseAction, ExerciseEvent, ExerciseKind,
    ExerciseUnit, FlashcardExercise, ScrambleUnit, TypingExercise, TypingUnit, UnscrambleExercise,
};
pub use interpret::{
    format_score, AccuracyTier, AssessmentStats, PhonemeView, ResultInterpreter, ResultView,
    ScoreLine, SyllableView, TierThresholds, MISSING_SCORE,
};
pub use pronunciation::{PendingAssessment, PronunciationFlow, RecordingSession, RecordingState};
pub use scoring::{answers_match, edit_distance, grade_typed, AnswerVerdict};
pub use session::{ActiveExercise, PracticeSession, PronunciationVerdict, SessionStatus};
pub use timer::{Timer, TimerToken};
