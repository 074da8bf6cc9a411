use crate::model::GameResult;

/// Lifetime statistics across every stored round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateStats {
    pub best_game: GameResult,
    pub games_count: u32,
    pub total_correct: u64,
    pub total_questions: u64,
}

impl AggregateStats {
    /// Percentage of correctly answered questions over all rounds.
    ///
    /// Returns `0.0` while nothing was answered correctly, which also covers the
    /// empty store where `total_questions` is zero.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn total_accuracy(&self) -> f64 {
        if self.total_correct == 0 || self.total_questions == 0 {
            return 0.0;
        }
        self.total_correct as f64 / self.total_questions as f64 * 100.0
    }
}
