use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use parla_domain::{Accent, PracticeError};
use serde::{Deserialize, Serialize};

use crate::interpret::TierThresholds;

/// Policy knobs for a practice session. Durations are in milliseconds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PracticeConfig {
    /// Delay between a correct (or locked) answer and the next question.
    pub auto_advance_ms: u64,
    /// Forced stop for guided pronunciation recordings.
    pub recording_timeout_ms: u64,
    pub distractor_count: usize,
    /// Overall pronunciation score that completes an item.
    pub pass_threshold: f64,
    /// Typed answers within this edit distance get a "close" hint. Zero disables the hint.
    pub near_miss_distance: usize,
    /// Caps the number of items drawn into a session.
    pub session_size: Option<usize>,
    pub accent: Accent,
    pub tiers: TierThresholds,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            auto_advance_ms: 2_000,
            recording_timeout_ms: 3_000,
            distractor_count: 3,
            pass_threshold: 80.0,
            near_miss_distance: 1,
            session_size: None,
            accent: Accent::default(),
            tiers: TierThresholds::default(),
        }
    }
}

impl PracticeConfig {
    pub fn auto_advance_delay(&self) -> Duration {
        Duration::from_millis(self.auto_advance_ms)
    }

    pub fn recording_timeout(&self) -> Duration {
        Duration::from_millis(self.recording_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), PracticeError> {
        if self.distractor_count == 0 {
            return Err(PracticeError::validation(
                "distractor_count must be at least 1",
            ));
        }
        if !(0.0..=100.0).contains(&self.pass_threshold) {
            return Err(PracticeError::validation(
                "pass_threshold must be between 0 and 100",
            ));
        }
        let TierThresholds { good, fair } = self.tiers;
        if !(0.0..=100.0).contains(&fair) || !(fair..=100.0).contains(&good) {
            return Err(PracticeError::validation(
                "tier thresholds must satisfy 0 <= fair <= good <= 100",
            ));
        }
        if self.session_size == Some(0) {
            return Err(PracticeError::validation("session_size must be positive"));
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> Result<Self, PracticeError> {
        let config: Self = serde_yaml::from_str(text)
            .map_err(|err| PracticeError::Serialization(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(text: &str) -> Result<Self, PracticeError> {
        let config: Self = serde_json::from_str(text)
            .map_err(|err| PracticeError::Serialization(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a `.json` file as JSON and anything else as YAML.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read practice config {:?}", path))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let config = if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_yaml_str(&text)
        }
        .with_context(|| format!("parse practice config {:?}", path))?;
        Ok(config)
    }
}
