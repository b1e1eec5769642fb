use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use parla_domain::{CompletionReport, PracticeError, ProgressSnapshot, ProgressStore};
use tracing::debug;

#[derive(Debug, Default)]
struct Ledger {
    reports: Vec<CompletionReport>,
    completed: HashSet<String>,
    sets: HashMap<String, Vec<String>>,
}

/// Progress store kept in process memory, for offline sessions and tests.
#[derive(Debug, Default)]
pub struct InMemoryProgressStore {
    ledger: Mutex<Ledger>,
}

impl InMemoryProgressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares which items make up `set_id`, so snapshots can be computed for it.
    pub fn with_set<I, S>(self, set_id: impl Into<String>, item_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()
            .sets
            .insert(set_id.into(), item_ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn reports(&self) -> Vec<CompletionReport> {
        self.lock().reports.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
    async fn report_completion(&self, item_id: &str, correct: bool) -> Result<(), PracticeError> {
        let mut ledger = self.lock();
        if correct {
            ledger.completed.insert(item_id.to_string());
        }
        ledger.reports.push(CompletionReport {
            item_id: item_id.to_string(),
            correct,
        });
        debug!(item_id, correct, "completion stored");
        Ok(())
    }

    async fn get_progress(&self, set_id: &str) -> Result<ProgressSnapshot, PracticeError> {
        let ledger = self.lock();
        let Some(items) = ledger.sets.get(set_id) else {
            return Ok(ProgressSnapshot::default());
        };
        if items.is_empty() {
            return Ok(ProgressSnapshot::default());
        }
        let done = items
            .iter()
            .filter(|id| ledger.completed.contains(id.as_str()))
            .count();
        Ok(ProgressSnapshot {
            completion_percentage: done as f64 * 100.0 / items.len() as f64,
            is_completed: done == items.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn snapshot_counts_correct_items_of_the_set() {
        let store = InMemoryProgressStore::new().with_set("unit-1", ["a", "b", "c", "d"]);
        store.report_completion("a", true).await.unwrap();
        store.report_completion("b", false).await.unwrap();
        store.report_completion("a", true).await.unwrap();
        store.report_completion("zzz", true).await.unwrap();
        let snapshot = store.get_progress("unit-1").await.unwrap();
        assert_eq!(snapshot.completion_percentage, 25.0);
        assert!(!snapshot.is_completed);
        assert_eq!(store.reports().len(), 4);
    }

    #[tokio::test]
    async fn unknown_set_reads_as_empty() {
        let store = InMemoryProgressStore::new();
        assert_eq!(
            store.get_progress("nope").await.unwrap(),
            ProgressSnapshot::default()
        );
    }
}
