use std::collections::HashMap;
use std::fmt;

use parla_domain::{Phoneme, PhonemeResult, PronunciationResult, PronunciationScores, Syllable};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const MISSING_SCORE: &str = "N/A";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AccuracyTier {
    Poor,
    Fair,
    Good,
}

impl AccuracyTier {
    /// Tier implied by the service's own phoneme classification.
    pub fn from_result(result: PhonemeResult) -> Option<Self> {
        match result {
            PhonemeResult::Perfect => Some(AccuracyTier::Good),
            PhonemeResult::NearCorrect => Some(AccuracyTier::Fair),
            PhonemeResult::Mispronounced => Some(AccuracyTier::Poor),
            PhonemeResult::Unknown => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccuracyTier::Good => "good",
            AccuracyTier::Fair => "fair",
            AccuracyTier::Poor => "poor",
        }
    }
}

impl fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct TierThresholds {
    pub good: f64,
    pub fair: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            good: 80.0,
            fair: 60.0,
        }
    }
}

impl TierThresholds {
    pub fn classify(&self, accuracy: f64) -> AccuracyTier {
        if accuracy >= self.good {
            AccuracyTier::Good
        } else if accuracy >= self.fair {
            AccuracyTier::Fair
        } else {
            AccuracyTier::Poor
        }
    }
}

/// Whole-number score as shown to the user. Tiers are classified from this value too.
fn displayed(score: f64) -> f64 {
    score.round()
}

pub fn format_score(value: Option<f64>) -> String {
    match value {
        Some(score) => format!("{:.0}", displayed(score)),
        None => MISSING_SCORE.to_string(),
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoreLine {
    pub label: &'static str,
    pub value: Option<f64>,
    pub display: String,
    pub tier: Option<AccuracyTier>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhonemeView {
    pub target: String,
    pub produced: String,
    pub display: String,
    /// Tier shown to the user. Numeric accuracy wins; the service tag is used only without it.
    pub tier: Option<AccuracyTier>,
    pub service_tier: Option<AccuracyTier>,
    /// The service tag disagrees with the numeric accuracy.
    pub mismatch: bool,
    pub feedback: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SyllableView {
    pub ipa: String,
    pub grapheme: Option<String>,
    pub display: String,
    pub tier: Option<AccuracyTier>,
    pub phonemes: Vec<PhonemeView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResultView {
    pub word: String,
    pub scores: Vec<ScoreLine>,
    pub overall_tier: Option<AccuracyTier>,
    pub syllables: Vec<SyllableView>,
    pub mismatches: usize,
}

impl ResultView {
    pub fn score(&self, label: &str) -> Option<&ScoreLine> {
        self.scores.iter().find(|line| line.label == label)
    }
}

/// Maps a scoring response onto display tiers.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResultInterpreter {
    thresholds: TierThresholds,
}

impl ResultInterpreter {
    pub fn new(thresholds: TierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn tier(&self, accuracy: Option<f64>) -> Option<AccuracyTier> {
        accuracy.map(|value| self.thresholds.classify(displayed(value)))
    }

    pub fn interpret(&self, word: &str, result: &PronunciationResult) -> ResultView {
        let syllables: Vec<SyllableView> = result
            .syllables
            .iter()
            .map(|syllable| self.syllable_view(syllable))
            .collect();
        let mismatches = syllables
            .iter()
            .flat_map(|syllable| syllable.phonemes.iter())
            .filter(|phoneme| phoneme.mismatch)
            .count();
        if mismatches > 0 {
            warn!(word, mismatches, "service phoneme tags disagree with accuracy scores");
        }
        ResultView {
            word: word.to_string(),
            scores: self.score_lines(&result.scores),
            overall_tier: self.tier(result.scores.overall),
            syllables,
            mismatches,
        }
    }

    fn score_lines(&self, scores: &PronunciationScores) -> Vec<ScoreLine> {
        [
            ("overall", scores.overall),
            ("accuracy", scores.accuracy),
            ("fluency", scores.fluency),
            ("completeness", scores.completeness),
        ]
        .into_iter()
        .map(|(label, value)| ScoreLine {
            label,
            value,
            display: format_score(value),
            tier: self.tier(value),
        })
        .collect()
    }

    fn syllable_view(&self, syllable: &Syllable) -> SyllableView {
        let accuracy = syllable.effective_accuracy();
        SyllableView {
            ipa: syllable.ipa.clone(),
            grapheme: syllable.grapheme.clone(),
            display: format_score(accuracy),
            tier: self.tier(accuracy),
            phonemes: syllable
                .phonemes
                .iter()
                .map(|phoneme| self.phoneme_view(phoneme))
                .collect(),
        }
    }

    fn phoneme_view(&self, phoneme: &Phoneme) -> PhonemeView {
        let numeric = self.tier(phoneme.accuracy);
        let service_tier = AccuracyTier::from_result(phoneme.result);
        let mismatch = matches!((numeric, service_tier), (Some(a), Some(b)) if a != b);
        PhonemeView {
            target: phoneme.target.clone(),
            produced: phoneme.produced().to_string(),
            display: format_score(phoneme.accuracy),
            tier: numeric.or(service_tier),
            service_tier,
            mismatch,
            feedback: phoneme.feedback.clone(),
        }
    }
}

/// Aggregates pronunciation attempts across a session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AssessmentStats {
    attempts: usize,
    scored: usize,
    overall_total: f64,
    best_overall: Option<f64>,
    phonemes: HashMap<String, (f64, usize)>,
}

impl AssessmentStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, result: &PronunciationResult) {
        self.attempts += 1;
        if let Some(overall) = result.scores.overall {
            self.scored += 1;
            self.overall_total += overall;
            self.best_overall = Some(self.best_overall.map_or(overall, |best| best.max(overall)));
        }
        for phoneme in result.phonemes() {
            if let Some(accuracy) = phoneme.accuracy {
                let entry = self.phonemes.entry(phoneme.target.clone()).or_insert((0.0, 0));
                entry.0 += accuracy;
                entry.1 += 1;
            }
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn mean_overall(&self) -> Option<f64> {
        (self.scored > 0).then(|| self.overall_total / self.scored as f64)
    }

    pub fn best_overall(&self) -> Option<f64> {
        self.best_overall
    }

    /// Phoneme symbols with the lowest mean accuracy, worst first.
    pub fn weakest_phonemes(&self, limit: usize) -> Vec<(String, f64)> {
        let mut means: Vec<(String, f64)> = self
            .phonemes
            .iter()
            .map(|(symbol, (total, count))| (symbol.clone(), total / *count as f64))
            .collect();
        means.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        means.truncate(limit);
        means
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use parla_domain::{AssessmentDecoder, JsonAssessmentDecoder};

    fn phoneme(target: &str, accuracy: Option<f64>, result: PhonemeResult) -> Phoneme {
        Phoneme {
            target: target.into(),
            alt_ph: None,
            accuracy,
            result,
            feedback: String::new(),
        }
    }

    #[test]
    fn tier_boundaries() {
        let thresholds = TierThresholds::default();
        assert_eq!(thresholds.classify(100.0), AccuracyTier::Good);
        assert_eq!(thresholds.classify(80.0), AccuracyTier::Good);
        assert_eq!(thresholds.classify(79.9), AccuracyTier::Fair);
        assert_eq!(thresholds.classify(60.0), AccuracyTier::Fair);
        assert_eq!(thresholds.classify(59.9), AccuracyTier::Poor);
        assert_eq!(thresholds.classify(0.0), AccuracyTier::Poor);
    }

    #[test]
    fn tiers_are_monotonic() {
        let thresholds = TierThresholds::default();
        let mut previous = AccuracyTier::Poor;
        for step in 0..=1000 {
            let tier = thresholds.classify(step as f64 / 10.0);
            assert!(tier >= previous);
            previous = tier;
        }
    }

    #[test]
    fn tier_agrees_with_displayed_number() {
        let interpreter = ResultInterpreter::default();
        let line = |overall: f64| {
            let result = PronunciationResult {
                scores: PronunciationScores {
                    overall: Some(overall),
                    ..Default::default()
                },
                syllables: Vec::new(),
            };
            interpreter
                .interpret("apple", &result)
                .score("overall")
                .cloned()
                .unwrap()
        };
        for (value, display, tier) in [
            (79.4, "79", AccuracyTier::Fair),
            (79.5, "80", AccuracyTier::Good),
            (79.6, "80", AccuracyTier::Good),
            (59.6, "60", AccuracyTier::Fair),
            (59.4, "59", AccuracyTier::Poor),
        ] {
            let line = line(value);
            assert_eq!(line.display, display, "display of {value}");
            assert_eq!(line.tier, Some(tier), "tier of {value}");
        }
    }

    #[test]
    fn missing_overall_renders_not_available() {
        let result = JsonAssessmentDecoder
            .decode(br#"{"scores":{"overall":null,"accuracy":72,"fluency":90,"completeness":100}}"#)
            .unwrap();
        let view = ResultInterpreter::default().interpret("apple", &result);
        assert_eq!(view.score("overall").unwrap().display, "N/A");
        assert_eq!(view.score("overall").unwrap().tier, None);
        assert_eq!(view.score("accuracy").unwrap().display, "72");
        assert_eq!(view.score("accuracy").unwrap().tier, Some(AccuracyTier::Fair));
        assert_eq!(view.score("fluency").unwrap().display, "90");
        assert_eq!(view.overall_tier, None);
    }

    #[test]
    fn numeric_accuracy_wins_and_mismatch_is_flagged() {
        let result = PronunciationResult {
            scores: PronunciationScores::default(),
            syllables: vec![Syllable {
                ipa: "æp".into(),
                grapheme: None,
                accuracy: None,
                phonemes: vec![
                    phoneme("æ", Some(92.0), PhonemeResult::Mispronounced),
                    phoneme("p", Some(66.0), PhonemeResult::NearCorrect),
                    phoneme("l", None, PhonemeResult::Perfect),
                ],
            }],
        };
        let view = ResultInterpreter::default().interpret("apple", &result);
        let phonemes = &view.syllables[0].phonemes;
        assert_eq!(phonemes[0].tier, Some(AccuracyTier::Good));
        assert!(phonemes[0].mismatch);
        assert!(!phonemes[1].mismatch);
        assert_eq!(phonemes[2].tier, Some(AccuracyTier::Good));
        assert_eq!(phonemes[2].display, "N/A");
        assert_eq!(view.mismatches, 1);
        assert_eq!(view.syllables[0].display, "79");
        assert_eq!(view.syllables[0].tier, Some(AccuracyTier::Fair));
    }

    #[test]
    fn stats_track_means_and_weak_phonemes() {
        let mut stats = AssessmentStats::new();
        let attempt = |overall: Option<f64>, th: f64, s: f64| PronunciationResult {
            scores: PronunciationScores {
                overall,
                ..Default::default()
            },
            syllables: vec![Syllable {
                ipa: "θs".into(),
                grapheme: None,
                accuracy: None,
                phonemes: vec![
                    phoneme("θ", Some(th), PhonemeResult::Unknown),
                    phoneme("s", Some(s), PhonemeResult::Unknown),
                ],
            }],
        };
        stats.record(&attempt(Some(70.0), 40.0, 90.0));
        stats.record(&attempt(Some(90.0), 60.0, 100.0));
        stats.record(&attempt(None, 50.0, 95.0));
        assert_eq!(stats.attempts(), 3);
        assert_relative_eq!(stats.mean_overall().unwrap(), 80.0);
        assert_eq!(stats.best_overall(), Some(90.0));
        let weakest = stats.weakest_phonemes(1);
        assert_eq!(weakest[0].0, "θ");
        assert_relative_eq!(weakest[0].1, 50.0);
    }
}
