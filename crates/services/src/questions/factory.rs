use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quiz_core::model::{MovieRecord, Question, RatingThresholds};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::UnboundedSender;

use crate::questions::MovieProvider;

/// Notifications pushed from a question source to its observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// The corpus finished loading.
    DataReady,
    /// The corpus could not be loaded; carries a human-readable reason.
    LoadFailed(String),
    /// Answer to `request_next_question`; `None` when the corpus is empty.
    QuestionReady(Option<Question>),
}

/// Supplies questions one at a time. Results arrive as [`SourceEvent`]s.
pub trait QuestionSource: Send + Sync {
    /// Start loading the corpus. Never retries on its own.
    fn load_data(&self);

    /// Start producing one question from the loaded corpus.
    ///
    /// A newer request supersedes any request still in flight.
    fn request_next_question(&self);

    /// Forget in-flight requests so the next round starts clean.
    fn reset(&self);
}

/// Builds rating questions from random corpus entries.
///
/// Entries are drawn with replacement, so a round may repeat a movie.
pub struct QuestionFactory {
    provider: Arc<dyn MovieProvider>,
    observer: UnboundedSender<SourceEvent>,
    movies: Arc<Mutex<Vec<MovieRecord>>>,
    rng: Mutex<StdRng>,
    thresholds: RatingThresholds,
    latest_request: Arc<AtomicU64>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn notify(observer: &UnboundedSender<SourceEvent>, event: SourceEvent) {
    if observer.send(event).is_err() {
        tracing::debug!("question observer is gone; event dropped");
    }
}

impl QuestionFactory {
    #[must_use]
    pub fn new(provider: Arc<dyn MovieProvider>, observer: UnboundedSender<SourceEvent>) -> Self {
        Self {
            provider,
            observer,
            movies: Arc::new(Mutex::new(Vec::new())),
            rng: Mutex::new(StdRng::from_os_rng()),
            thresholds: RatingThresholds::default(),
            latest_request: Arc::new(AtomicU64::new(0)),
        }
    }

    #[must_use]
    pub fn with_thresholds(mut self, thresholds: RatingThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Use a seeded generator so question order is reproducible.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Number of corpus entries currently loaded.
    #[must_use]
    pub fn corpus_len(&self) -> usize {
        lock(&self.movies).len()
    }

    fn pick(&self) -> Option<(MovieRecord, u8)> {
        let movies = lock(&self.movies);
        if movies.is_empty() {
            return None;
        }
        let mut rng = lock(&self.rng);
        let movie = movies[rng.random_range(0..movies.len())].clone();
        let threshold = rng.random_range(self.thresholds.min()..=self.thresholds.max());
        Some((movie, threshold))
    }
}

impl QuestionSource for QuestionFactory {
    fn load_data(&self) {
        let provider = Arc::clone(&self.provider);
        let movies = Arc::clone(&self.movies);
        let observer = self.observer.clone();

        tokio::spawn(async move {
            match provider.fetch_movies().await {
                Ok(records) => {
                    tracing::info!(count = records.len(), "movie corpus loaded");
                    *lock(&movies) = records;
                    notify(&observer, SourceEvent::DataReady);
                }
                Err(err) => {
                    tracing::warn!(%err, "movie corpus failed to load");
                    notify(&observer, SourceEvent::LoadFailed(err.to_string()));
                }
            }
        });
    }

    fn request_next_question(&self) {
        let ticket = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        let picked = self.pick();
        let provider = Arc::clone(&self.provider);
        let latest_request = Arc::clone(&self.latest_request);
        let observer = self.observer.clone();

        tokio::spawn(async move {
            let question = match picked {
                None => {
                    tracing::warn!("question requested but the corpus is empty");
                    None
                }
                Some((movie, threshold)) => {
                    let image = provider
                        .fetch_image(&movie.image_url)
                        .await
                        .unwrap_or_else(|err| {
                            tracing::warn!(title = %movie.title, %err, "failed to load poster");
                            Vec::new()
                        });
                    Some(Question::about_rating(image, movie.rating(), threshold))
                }
            };

            if latest_request.load(Ordering::SeqCst) != ticket {
                tracing::debug!(ticket, "question request superseded");
                return;
            }
            notify(&observer, SourceEvent::QuestionReady(question));
        });
    }

    fn reset(&self) {
        self.latest_request.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::sync::mpsc::{self, UnboundedReceiver};

    use super::*;
    use crate::questions::StaticMovieProvider;

    fn factory(provider: StaticMovieProvider) -> (QuestionFactory, UnboundedReceiver<SourceEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (QuestionFactory::new(Arc::new(provider), tx).with_seed(7), rx)
    }

    fn corpus() -> Vec<MovieRecord> {
        vec![
            MovieRecord::new("High", "9.5", "high.jpg"),
            MovieRecord::new("Low", "2.0", "low.jpg"),
        ]
    }

    #[tokio::test]
    async fn load_reports_data_ready() {
        let (factory, mut events) = factory(StaticMovieProvider::new(corpus()));

        factory.load_data();

        assert_eq!(events.recv().await, Some(SourceEvent::DataReady));
        assert_eq!(factory.corpus_len(), 2);
    }

    #[tokio::test]
    async fn load_failure_is_reported_without_retry() {
        let provider = StaticMovieProvider::new(corpus()).with_failures(1, "network down");
        let (factory, mut events) = factory(provider);

        factory.load_data();
        assert_eq!(
            events.recv().await,
            Some(SourceEvent::LoadFailed(
                "movie feed is unavailable: network down".into()
            ))
        );
        assert_eq!(factory.corpus_len(), 0);
        assert!(events.try_recv().is_err());

        factory.load_data();
        assert_eq!(events.recv().await, Some(SourceEvent::DataReady));
    }

    #[tokio::test]
    async fn unloaded_corpus_delivers_no_question() {
        let (factory, mut events) = factory(StaticMovieProvider::new(corpus()));

        factory.request_next_question();

        assert_eq!(events.recv().await, Some(SourceEvent::QuestionReady(None)));
    }

    #[tokio::test]
    async fn questions_follow_movie_ratings() {
        let provider = StaticMovieProvider::new(corpus()).with_image("high.jpg", vec![1, 2, 3]);
        let (factory, mut events) = factory(provider);
        factory.load_data();
        assert_eq!(events.recv().await, Some(SourceEvent::DataReady));

        for _ in 0..20 {
            factory.request_next_question();
            let Some(SourceEvent::QuestionReady(Some(question))) = events.recv().await else {
                panic!("expected a question");
            };
            // 9.5 beats every threshold in 5..=8 and 2.0 beats none.
            if question.image().is_empty() {
                assert!(!question.correct_answer());
            } else {
                assert_eq!(question.image(), &[1, 2, 3]);
                assert!(question.correct_answer());
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn newer_request_supersedes_pending_one() {
        let provider = StaticMovieProvider::new(corpus()).with_latency(Duration::from_millis(200));
        let (factory, mut events) = factory(provider);
        factory.load_data();
        assert_eq!(events.recv().await, Some(SourceEvent::DataReady));

        factory.request_next_question();
        factory.request_next_question();

        assert!(matches!(
            events.recv().await,
            Some(SourceEvent::QuestionReady(Some(_)))
        ));
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn reset_drops_in_flight_question() {
        let provider = StaticMovieProvider::new(corpus()).with_latency(Duration::from_millis(200));
        let (factory, mut events) = factory(provider);
        factory.load_data();
        assert_eq!(events.recv().await, Some(SourceEvent::DataReady));

        factory.request_next_question();
        factory.reset();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(events.try_recv().is_err());
    }
}
