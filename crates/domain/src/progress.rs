use std::collections::HashMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ItemProgress {
    pub attempted: bool,
    pub correct: bool,
}

/// Per-item outcome of the current session, keyed by item id.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionProgress {
    entries: HashMap<String, ItemProgress>,
}

impl SessionProgress {
    pub fn new<I, S>(item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: item_ids
                .into_iter()
                .map(|id| (id.into(), ItemProgress::default()))
                .collect(),
        }
    }

    pub fn get(&self, item_id: &str) -> Option<ItemProgress> {
        self.entries.get(item_id).copied()
    }

    /// Records an attempt. Returns `true` when this attempt completed the item for the first time.
    /// Unknown ids are ignored so the percentage never exceeds 100.
    pub fn record_attempt(&mut self, item_id: &str, correct: bool) -> bool {
        match self.entries.get_mut(item_id) {
            Some(entry) => {
                entry.attempted = true;
                let newly_completed = correct && !entry.correct;
                entry.correct |= correct;
                newly_completed
            }
            None => false,
        }
    }

    pub fn mark_complete(&mut self, item_id: &str) -> bool {
        self.record_attempt(item_id, true)
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    pub fn attempted_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.attempted).count()
    }

    pub fn completed_count(&self) -> usize {
        self.entries.values().filter(|entry| entry.correct).count()
    }

    pub fn completion_percentage(&self) -> u8 {
        if self.entries.is_empty() {
            return 0;
        }
        let ratio = self.completed_count() as f64 / self.entries.len() as f64;
        (ratio * 100.0).round() as u8
    }

    pub fn is_complete(&self) -> bool {
        !self.entries.is_empty() && self.completed_count() == self.entries.len()
    }
}

/// Progress as reported by the progress store; display only.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub completion_percentage: f64,
    pub is_completed: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionReport {
    pub item_id: String,
    pub correct: bool,
}
