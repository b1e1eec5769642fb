use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::exercise::ExerciseKind;
use crate::interpret::AssessmentStats;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreakTracker {
    current: u32,
    best: u32,
}

impl StreakTracker {
    pub fn record(&mut self, correct: bool) {
        if correct {
            self.current += 1;
            self.best = self.best.max(self.current);
        } else {
            self.current = 0;
        }
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn best(&self) -> u32 {
        self.best
    }
}

/// Running answer tally for one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SessionAnalytics {
    answered: usize,
    correct: usize,
    rejected: usize,
    streak: StreakTracker,
}

impl SessionAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_answer(&mut self, correct: bool) {
        self.answered += 1;
        if correct {
            self.correct += 1;
        }
        self.streak.record(correct);
    }

    /// A wrong attempt that left the unit open still breaks the streak.
    pub fn record_rejection(&mut self) {
        self.rejected += 1;
        self.streak.record(false);
    }

    pub fn answered(&self) -> usize {
        self.answered
    }

    pub fn correct(&self) -> usize {
        self.correct
    }

    pub fn streak(&self) -> StreakTracker {
        self.streak
    }

    /// Share of locked answers that were correct, in `0.0..=1.0`.
    pub fn accuracy(&self) -> f64 {
        if self.answered == 0 {
            0.0
        } else {
            self.correct as f64 / self.answered as f64
        }
    }

    pub fn summarize(
        &self,
        kind: ExerciseKind,
        completion_percentage: u8,
        stats: &AssessmentStats,
        finished_at: OffsetDateTime,
    ) -> SessionSummary {
        SessionSummary {
            kind,
            answered: self.answered,
            correct: self.correct,
            rejected: self.rejected,
            accuracy: self.accuracy(),
            best_streak: self.streak.best(),
            completion_percentage,
            pronunciation_attempts: stats.attempts(),
            mean_pronunciation: stats.mean_overall(),
            finished_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionSummary {
    pub kind: ExerciseKind,
    pub answered: usize,
    pub correct: usize,
    pub rejected: usize,
    pub accuracy: f64,
    pub best_streak: u32,
    pub completion_percentage: u8,
    pub pronunciation_attempts: usize,
    pub mean_pronunciation: Option<f64>,
    pub finished_at: OffsetDateTime,
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn streak_keeps_the_best_run() {
        let mut streak = StreakTracker::default();
        for correct in [true, true, false, true] {
            streak.record(correct);
        }
        assert_eq!(streak.current(), 1);
        assert_eq!(streak.best(), 2);
    }

    #[test]
    fn summary_reports_accuracy_and_streak() {
        let mut analytics = SessionAnalytics::new();
        analytics.record_answer(true);
        analytics.record_rejection();
        analytics.record_answer(true);
        analytics.record_answer(false);
        let summary = analytics.summarize(
            ExerciseKind::Typing,
            67,
            &AssessmentStats::new(),
            OffsetDateTime::UNIX_EPOCH,
        );
        assert_eq!(summary.answered, 3);
        assert_eq!(summary.rejected, 1);
        assert_relative_eq!(summary.accuracy, 2.0 / 3.0);
        assert_eq!(summary.best_streak, 1);
        assert_eq!(summary.mean_pronunciation, None);
    }

    #[test]
    fn empty_session_has_zero_accuracy() {
        assert_eq!(SessionAnalytics::new().accuracy(), 0.0);
    }
}
