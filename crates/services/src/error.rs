//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::SettingsError;

/// Errors raised while fetching the movie corpus or a poster image.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProviderError {
    #[error("movie feed request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("movie feed reported an error: {0}")]
    Api(String),
    #[error("movie feed is unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the quiz session handle.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("quiz session has stopped")]
    Stopped,
}

/// Errors emitted while reading configuration from the environment.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer, got {raw:?}")]
    InvalidNumber { var: &'static str, raw: String },
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
