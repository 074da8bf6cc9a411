#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod questions;
pub mod sessions;
pub mod statistics;

pub use quiz_core::Clock;

pub use config::QuizConfig;
pub use error::{ConfigError, ProviderError, SessionError};
pub use questions::{
    ImdbMovieProvider, MovieFeedConfig, MovieProvider, QuestionFactory, QuestionSource,
    SourceEvent, StaticMovieProvider,
};
pub use sessions::{
    QuizCommand, QuizEvent, QuizHandle, QuizLoopService, QuizSession, RunningQuiz,
    SessionPhase, SessionProgress,
};
pub use statistics::StatisticsService;
