use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    assessment::{AudioPayload, PronunciationResult},
    error::PracticeError,
    progress::ProgressSnapshot,
    vocabulary::VocabularyItem,
};

/// Selects which vocabulary set to fetch.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    pub set_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl ItemFilter {
    pub fn set(set_id: impl Into<String>) -> Self {
        Self {
            set_id: set_id.into(),
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn fetch_items(&self, filter: &ItemFilter) -> Result<Vec<VocabularyItem>, PracticeError>;
}

#[async_trait]
pub trait AssessmentService: Send + Sync {
    async fn assess(
        &self,
        audio: &AudioPayload,
        word: &str,
    ) -> Result<PronunciationResult, PracticeError>;
}

#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn report_completion(&self, item_id: &str, correct: bool) -> Result<(), PracticeError>;
    async fn get_progress(&self, set_id: &str) -> Result<ProgressSnapshot, PracticeError>;
}
