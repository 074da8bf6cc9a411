mod factory;
mod imdb;
mod provider;

pub use factory::{QuestionFactory, QuestionSource, SourceEvent};
pub use imdb::{ImdbMovieProvider, MovieFeedConfig};
pub use provider::{MovieProvider, StaticMovieProvider};
