use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::MovieRecord;

use crate::error::ProviderError;

/// External source of the movie corpus.
#[async_trait]
pub trait MovieProvider: Send + Sync {
    /// Fetch the whole corpus in one call.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the feed cannot be fetched or parsed.
    async fn fetch_movies(&self) -> Result<Vec<MovieRecord>, ProviderError>;

    /// Fetch the poster bytes for a movie.
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` when the image cannot be downloaded.
    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ProviderError>;
}

/// In-memory provider for tests and offline play.
///
/// Movies without a registered image get an empty poster.
#[derive(Clone, Default)]
pub struct StaticMovieProvider {
    movies: Vec<MovieRecord>,
    images: HashMap<String, Vec<u8>>,
    failures_left: Arc<AtomicUsize>,
    failure_message: String,
    latency: Option<Duration>,
}

impl StaticMovieProvider {
    #[must_use]
    pub fn new(movies: Vec<MovieRecord>) -> Self {
        Self {
            movies,
            ..Self::default()
        }
    }

    /// A small built-in corpus of well-known movies and their ratings.
    #[must_use]
    pub fn builtin() -> Self {
        let movies = [
            ("The Godfather", "9.2"),
            ("The Dark Knight", "9.0"),
            ("Kill Bill", "8.2"),
            ("The Avengers", "8.0"),
            ("Deadpool", "8.0"),
            ("The Green Knight", "6.6"),
            ("Old", "5.8"),
            ("The Ice Age Adventures of Buck Wild", "4.3"),
            ("Tesla", "5.1"),
            ("Vivarium", "5.8"),
        ]
        .into_iter()
        .map(|(title, rating)| MovieRecord::new(title, rating, ""))
        .collect();
        Self::new(movies)
    }

    #[must_use]
    pub fn with_image(mut self, url: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.images.insert(url.into(), bytes);
        self
    }

    /// Make the next `times` corpus fetches fail with `message`.
    #[must_use]
    pub fn with_failures(mut self, times: usize, message: impl Into<String>) -> Self {
        self.failures_left = Arc::new(AtomicUsize::new(times));
        self.failure_message = message.into();
        self
    }

    /// Delay every image fetch, to simulate a slow network.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl MovieProvider for StaticMovieProvider {
    async fn fetch_movies(&self) -> Result<Vec<MovieRecord>, ProviderError> {
        if self.take_failure() {
            return Err(ProviderError::Unavailable(self.failure_message.clone()));
        }
        Ok(self.movies.clone())
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.images.get(url).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fails_the_requested_number_of_times() {
        let provider = StaticMovieProvider::builtin().with_failures(2, "offline");

        for _ in 0..2 {
            let err = provider.fetch_movies().await.unwrap_err();
            assert_eq!(err.to_string(), "movie feed is unavailable: offline");
        }
        assert_eq!(provider.fetch_movies().await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn serves_registered_images() {
        let provider = StaticMovieProvider::new(vec![MovieRecord::new("A", "7.5", "poster-a")])
            .with_image("poster-a", vec![0xff, 0xd8]);

        assert_eq!(provider.fetch_image("poster-a").await.unwrap(), vec![0xff, 0xd8]);
        assert!(provider.fetch_image("missing").await.unwrap().is_empty());
    }
}
