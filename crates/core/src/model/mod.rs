mod game_result;
mod movie;
mod question;
mod settings;
mod stats;
mod summary;

pub use game_result::GameResult;
pub use movie::MovieRecord;
pub use question::{Question, QuizStep};
pub use settings::{QuizSettings, RatingThresholds, SettingsError};
pub use stats::AggregateStats;
pub use summary::RoundSummary;
