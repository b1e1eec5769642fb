pub mod assessment;
pub mod error;
pub mod io;
pub mod progress;
pub mod service;
pub mod vocabulary;

pub use crate::assessment::{
    AudioPayload, Phoneme, PhonemeResult, PronunciationResult, PronunciationScores, Syllable,
};
pub use crate::error::PracticeError;
pub use crate::io::{decode_items, AssessmentDecoder, JsonAssessmentDecoder};
pub use crate::progress::{CompletionReport, ItemProgress, ProgressSnapshot, SessionProgress};
pub use crate::service::{AssessmentService, ContentProvider, ItemFilter, ProgressStore};
pub use crate::vocabulary::{Accent, Collocation, ExampleSentence, RegionalAudio, VocabularyItem};
