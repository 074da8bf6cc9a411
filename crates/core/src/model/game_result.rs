use std::fmt;

use chrono::{DateTime, Utc};

use crate::time::record_date_label;

/// Outcome of one completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    correct: u32,
    total: u32,
    date: DateTime<Utc>,
}

impl GameResult {
    #[must_use]
    pub fn new(correct: u32, total: u32, date: DateTime<Utc>) -> Self {
        Self {
            correct,
            total,
            date,
        }
    }

    /// The placeholder record reported before any round was stored.
    #[must_use]
    pub fn zero(date: DateTime<Utc>) -> Self {
        Self::new(0, 0, date)
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Only a strictly higher correct count wins; ties keep the old record.
    #[must_use]
    pub fn is_better_than(&self, other: &GameResult) -> bool {
        self.correct > other.correct
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} ({})",
            self.correct,
            self.total,
            record_date_label(self.date)
        )
    }
}
