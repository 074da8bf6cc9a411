use std::env;
use std::time::Duration;

use quiz_core::model::{QuizSettings, RatingThresholds};

use crate::error::ConfigError;

pub const QUESTIONS_AMOUNT_VAR: &str = "QUIZ_QUESTIONS_AMOUNT";
pub const FEEDBACK_DELAY_MS_VAR: &str = "QUIZ_FEEDBACK_DELAY_MS";
pub const RATING_MIN_VAR: &str = "QUIZ_RATING_THRESHOLD_MIN";
pub const RATING_MAX_VAR: &str = "QUIZ_RATING_THRESHOLD_MAX";

/// Round and question-generation settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizConfig {
    pub settings: QuizSettings,
    pub thresholds: RatingThresholds,
}

impl QuizConfig {
    /// Read the configuration from `QUIZ_*` environment variables, falling back
    /// to defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is not a number or the resulting
    /// settings are invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`QuizConfig::from_env`] with an injectable variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a value is not a number or the resulting
    /// settings are invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = QuizSettings::default();
        let default_thresholds = RatingThresholds::default();

        let questions_amount = parse_var(&lookup, QUESTIONS_AMOUNT_VAR)?
            .map_or(Ok(defaults.questions_amount()), usize::try_from)
            .map_err(|_| ConfigError::InvalidNumber {
                var: QUESTIONS_AMOUNT_VAR,
                raw: lookup(QUESTIONS_AMOUNT_VAR).unwrap_or_default(),
            })?;
        let feedback_delay = parse_var(&lookup, FEEDBACK_DELAY_MS_VAR)?
            .map_or(defaults.feedback_delay(), Duration::from_millis);
        let min = parse_threshold(&lookup, RATING_MIN_VAR)?.unwrap_or(default_thresholds.min());
        let max = parse_threshold(&lookup, RATING_MAX_VAR)?.unwrap_or(default_thresholds.max());

        Ok(Self {
            settings: QuizSettings::new(questions_amount, feedback_delay)?,
            thresholds: RatingThresholds::new(min, max)?,
        })
    }
}

fn parse_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u64>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u64>()
        .map(Some)
        .map_err(|_| ConfigError::InvalidNumber { var, raw })
}

fn parse_threshold(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<u8>, ConfigError> {
    parse_var(lookup, var)?
        .map(|value| {
            u8::try_from(value).map_err(|_| ConfigError::InvalidNumber {
                var,
                raw: value.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use quiz_core::model::SettingsError;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = QuizConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, QuizConfig::default());
    }

    #[test]
    fn reads_overrides() {
        let config = QuizConfig::from_lookup(lookup(&[
            (QUESTIONS_AMOUNT_VAR, "5"),
            (FEEDBACK_DELAY_MS_VAR, "250"),
            (RATING_MIN_VAR, "6"),
            (RATING_MAX_VAR, " 9 "),
        ]))
        .unwrap();

        assert_eq!(config.settings.questions_amount(), 5);
        assert_eq!(config.settings.feedback_delay(), Duration::from_millis(250));
        assert_eq!(config.thresholds, RatingThresholds::new(6, 9).unwrap());
    }

    #[test]
    fn rejects_zero_questions() {
        let err = QuizConfig::from_lookup(lookup(&[(QUESTIONS_AMOUNT_VAR, "0")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Settings(SettingsError::InvalidQuestionsAmount)
        );
    }

    #[test]
    fn rejects_garbage_numbers() {
        let err = QuizConfig::from_lookup(lookup(&[(FEEDBACK_DELAY_MS_VAR, "soon")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidNumber {
                var: FEEDBACK_DELAY_MS_VAR,
                ..
            }
        ));

        let err = QuizConfig::from_lookup(lookup(&[(RATING_MAX_VAR, "300")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { var: RATING_MAX_VAR, .. }));
    }
}
