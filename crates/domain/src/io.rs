use serde::Deserialize;

use crate::{
    assessment::{PronunciationResult, PronunciationScores},
    error::PracticeError,
    vocabulary::VocabularyItem,
};

pub trait AssessmentDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PronunciationResult, PracticeError>;
}

/// Decodes the scoring service's JSON body. Missing or null score fields stay `None`;
/// out-of-range values are clamped to 0-100.
pub struct JsonAssessmentDecoder;

impl AssessmentDecoder for JsonAssessmentDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<PronunciationResult, PracticeError> {
        let mut result: PronunciationResult = serde_json::from_slice(bytes)
            .map_err(|err| PracticeError::Serialization(err.to_string()))?;
        normalize_result(&mut result);
        Ok(result)
    }
}

pub fn normalize_result(result: &mut PronunciationResult) {
    normalize_scores(&mut result.scores);
    for syllable in &mut result.syllables {
        syllable.accuracy = syllable.accuracy.and_then(clamp_score);
        for phoneme in &mut syllable.phonemes {
            phoneme.accuracy = phoneme.accuracy.and_then(clamp_score);
        }
    }
}

fn normalize_scores(scores: &mut PronunciationScores) {
    scores.overall = scores.overall.and_then(clamp_score);
    scores.accuracy = scores.accuracy.and_then(clamp_score);
    scores.fluency = scores.fluency.and_then(clamp_score);
    scores.completeness = scores.completeness.and_then(clamp_score);
}

fn clamp_score(value: f64) -> Option<f64> {
    value.is_finite().then(|| value.clamp(0.0, 100.0))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ItemDocument {
    Bare(Vec<VocabularyItem>),
    Wrapped { items: Vec<VocabularyItem> },
}

/// Parses a vocabulary set, accepting either a bare array or `{"items": [...]}`.
pub fn decode_items(bytes: &[u8]) -> Result<Vec<VocabularyItem>, PracticeError> {
    let document: ItemDocument = serde_json::from_slice(bytes)
        .map_err(|err| PracticeError::Serialization(err.to_string()))?;
    let items = match document {
        ItemDocument::Bare(items) | ItemDocument::Wrapped { items } => items,
    };
    for item in &items {
        item.validate()?;
    }
    Ok(items)
}
