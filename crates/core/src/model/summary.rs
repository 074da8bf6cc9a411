use std::fmt;

use crate::model::AggregateStats;

/// Results of a finished round plus the lifetime statistics read back after storing it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundSummary {
    pub correct: u32,
    pub total: u32,
    pub stats: AggregateStats,
}

impl RoundSummary {
    #[must_use]
    pub fn new(correct: u32, total: u32, stats: AggregateStats) -> Self {
        Self {
            correct,
            total,
            stats,
        }
    }
}

impl fmt::Display for RoundSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Your result: {}/{}", self.correct, self.total)?;
        writeln!(f, "Quizzes played: {}", self.stats.games_count)?;
        writeln!(f, "Record: {}", self.stats.best_game)?;
        write!(f, "Average accuracy: {:.2}%", self.stats.total_accuracy())
    }
}
