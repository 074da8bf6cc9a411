use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("questions amount must be > 0")]
    InvalidQuestionsAmount,

    #[error("rating threshold range is empty ({min}..={max})")]
    InvalidThresholdRange { min: u8, max: u8 },
}

/// Round settings for a quiz session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    questions_amount: usize,
    feedback_delay: Duration,
}

impl QuizSettings {
    pub const DEFAULT_QUESTIONS_AMOUNT: usize = 10;
    pub const DEFAULT_FEEDBACK_DELAY: Duration = Duration::from_secs(1);

    /// Creates custom round settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidQuestionsAmount` if `questions_amount` is zero.
    pub fn new(questions_amount: usize, feedback_delay: Duration) -> Result<Self, SettingsError> {
        if questions_amount == 0 {
            return Err(SettingsError::InvalidQuestionsAmount);
        }
        Ok(Self {
            questions_amount,
            feedback_delay,
        })
    }

    #[must_use]
    pub fn questions_amount(&self) -> usize {
        self.questions_amount
    }

    /// Pause between showing an answer result and moving on.
    #[must_use]
    pub fn feedback_delay(&self) -> Duration {
        self.feedback_delay
    }
}

impl Default for QuizSettings {
    fn default() -> Self {
        Self {
            questions_amount: Self::DEFAULT_QUESTIONS_AMOUNT,
            feedback_delay: Self::DEFAULT_FEEDBACK_DELAY,
        }
    }
}

/// Inclusive range the "rated higher than N?" threshold is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingThresholds {
    min: u8,
    max: u8,
}

impl RatingThresholds {
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidThresholdRange` if `min > max`.
    pub fn new(min: u8, max: u8) -> Result<Self, SettingsError> {
        if min > max {
            return Err(SettingsError::InvalidThresholdRange { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> u8 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> u8 {
        self.max
    }
}

impl Default for RatingThresholds {
    fn default() -> Self {
        Self { min: 5, max: 8 }
    }
}
