use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A packaged recording ready to be sent to the assessment service.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`, e.g. `audio/wav`.
    pub media_type: String,
    pub sample_rate: u32,
    pub duration: Duration,
}

impl AudioPayload {
    pub fn new(bytes: Vec<u8>, media_type: impl Into<String>, sample_rate: u32, duration: Duration) -> Self {
        Self {
            bytes,
            media_type: media_type.into(),
            sample_rate,
            duration,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Overall scores on a 0-100 scale. A field the service omitted (or sent as null) stays `None`.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PronunciationScores {
    #[serde(default)]
    pub overall: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub fluency: Option<f64>,
    #[serde(default)]
    pub completeness: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PhonemeResult {
    Perfect,
    #[serde(alias = "nearCorrect", alias = "near-correct")]
    NearCorrect,
    Mispronounced,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Phoneme {
    /// Expected symbol.
    pub target: String,
    /// Symbol the speaker actually produced; equals `target` when pronounced as expected.
    #[serde(default, alias = "altPh")]
    pub alt_ph: Option<String>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub result: PhonemeResult,
    #[serde(default)]
    pub feedback: String,
}

impl Phoneme {
    pub fn produced(&self) -> &str {
        self.alt_ph.as_deref().unwrap_or(&self.target)
    }

    pub fn was_substituted(&self) -> bool {
        self.produced() != self.target
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Syllable {
    pub ipa: String,
    #[serde(default)]
    pub grapheme: Option<String>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub phonemes: Vec<Phoneme>,
}

impl Syllable {
    /// Server-supplied accuracy, falling back to the mean of the scored phonemes.
    pub fn effective_accuracy(&self) -> Option<f64> {
        self.accuracy.or_else(|| {
            let scored: Vec<f64> = self.phonemes.iter().filter_map(|p| p.accuracy).collect();
            if scored.is_empty() {
                None
            } else {
                Some(scored.iter().sum::<f64>() / scored.len() as f64)
            }
        })
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PronunciationResult {
    #[serde(default)]
    pub scores: PronunciationScores,
    #[serde(default)]
    pub syllables: Vec<Syllable>,
}

impl PronunciationResult {
    pub fn phonemes(&self) -> impl Iterator<Item = &Phoneme> {
        self.syllables.iter().flat_map(|syllable| syllable.phonemes.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn phoneme(target: &str, accuracy: Option<f64>) -> Phoneme {
        Phoneme {
            target: target.into(),
            alt_ph: None,
            accuracy,
            result: PhonemeResult::Unknown,
            feedback: String::new(),
        }
    }

    #[test]
    fn syllable_accuracy_falls_back_to_phoneme_mean() {
        let syllable = Syllable {
            ipa: "kæt".into(),
            grapheme: Some("cat".into()),
            accuracy: None,
            phonemes: vec![
                phoneme("k", Some(90.0)),
                phoneme("æ", Some(60.0)),
                phoneme("t", None),
            ],
        };
        assert_relative_eq!(syllable.effective_accuracy().unwrap(), 75.0);
    }

    #[test]
    fn syllable_accuracy_prefers_server_value() {
        let syllable = Syllable {
            ipa: "kæt".into(),
            grapheme: None,
            accuracy: Some(42.0),
            phonemes: vec![phoneme("k", Some(90.0))],
        };
        assert_eq!(syllable.effective_accuracy(), Some(42.0));
    }

    #[test]
    fn unknown_result_tags_do_not_fail() {
        let json = r#"{"target":"θ","altPh":"s","accuracy":40,"result":"whatever"}"#;
        let phoneme: Phoneme = serde_json::from_str(json).unwrap();
        assert_eq!(phoneme.result, PhonemeResult::Unknown);
        assert!(phoneme.was_substituted());
        assert_eq!(phoneme.produced(), "s");
    }

    #[test]
    fn null_scores_stay_missing() {
        let json = r#"{"scores":{"overall":null,"accuracy":81.5},"syllables":[]}"#;
        let result: PronunciationResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.scores.overall, None);
        assert_eq!(result.scores.accuracy, Some(81.5));
        assert_eq!(result.scores.fluency, None);
    }
}
