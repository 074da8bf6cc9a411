use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{AggregateStats, GameResult};
use storage::repository::{KeyValueRepository, KvWrite, StorageError};
use tokio::sync::Mutex;

/// Storage keys; the best game is spread across `correct`, `total` and `date`.
mod keys {
    pub const CORRECT: &str = "correct";
    pub const TOTAL: &str = "total";
    pub const DATE: &str = "date";
    pub const GAMES_COUNT: &str = "gamesCount";
    pub const TOTAL_CORRECT: &str = "totalCorrect";
    pub const TOTAL_QUESTIONS: &str = "totalQuestions";
}

/// Running totals as read back from storage before an update.
struct StoredCounters {
    games_count: i64,
    total_questions: i64,
    total_correct: i64,
    best_game: GameResult,
}

/// Persists round results and aggregates lifetime statistics.
///
/// Storage failures never reach the caller: reads fall back to zero values and
/// failed writes are logged. A round whose stored totals cannot be read is
/// dropped rather than written over them.
#[derive(Clone)]
pub struct StatisticsService {
    clock: Clock,
    repo: Arc<dyn KeyValueRepository>,
    write_lock: Arc<Mutex<()>>,
}

impl StatisticsService {
    #[must_use]
    pub fn new(clock: Clock, repo: Arc<dyn KeyValueRepository>) -> Self {
        Self {
            clock,
            repo,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Build the service and seed zeroed counters on first run.
    pub async fn open(clock: Clock, repo: Arc<dyn KeyValueRepository>) -> Self {
        let service = Self::new(clock, repo);
        service.ensure_initialized().await;
        service
    }

    async fn ensure_initialized(&self) {
        let _guard = self.write_lock.lock().await;
        match self.repo.get(keys::TOTAL_CORRECT).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let writes = [
                    KvWrite::int(keys::TOTAL_CORRECT, 0),
                    KvWrite::int(keys::TOTAL_QUESTIONS, 0),
                    KvWrite::int(keys::GAMES_COUNT, 0),
                ];
                match self.repo.apply(&writes).await {
                    Ok(()) => tracing::info!("initialized statistics store"),
                    Err(err) => tracing::warn!(%err, "failed to initialize statistics store"),
                }
            }
            Err(err) => tracing::warn!(%err, "failed to read statistics store"),
        }
    }

    async fn read_int(&self, key: &str) -> i64 {
        match self.repo.get_int(key).await {
            Ok(value) => value.unwrap_or(0),
            Err(err) => {
                tracing::warn!(key, %err, "statistics read failed; using 0");
                0
            }
        }
    }

    async fn read_count(&self, key: &str) -> u64 {
        u64::try_from(self.read_int(key).await).unwrap_or(0)
    }

    async fn read_counters(&self) -> Result<StoredCounters, StorageError> {
        Ok(StoredCounters {
            games_count: self.repo.get_int(keys::GAMES_COUNT).await?.unwrap_or(0),
            total_questions: self.repo.get_int(keys::TOTAL_QUESTIONS).await?.unwrap_or(0),
            total_correct: self.repo.get_int(keys::TOTAL_CORRECT).await?.unwrap_or(0),
            best_game: GameResult::new(
                u32::try_from(self.repo.get_int(keys::CORRECT).await?.unwrap_or(0)).unwrap_or(0),
                u32::try_from(self.repo.get_int(keys::TOTAL).await?.unwrap_or(0)).unwrap_or(0),
                self.repo
                    .get_date(keys::DATE)
                    .await?
                    .unwrap_or_else(|| self.clock.now()),
            ),
        })
    }

    /// Number of rounds ever stored.
    pub async fn games_count(&self) -> u32 {
        u32::try_from(self.read_int(keys::GAMES_COUNT).await).unwrap_or(0)
    }

    /// The best stored round, or a zero result dated now if none exists.
    pub async fn best_game(&self) -> GameResult {
        let correct = u32::try_from(self.read_int(keys::CORRECT).await).unwrap_or(0);
        let total = u32::try_from(self.read_int(keys::TOTAL).await).unwrap_or(0);
        let date = match self.repo.get_date(keys::DATE).await {
            Ok(date) => date,
            Err(err) => {
                tracing::warn!(%err, "best game date unreadable; using now");
                None
            }
        }
        .unwrap_or_else(|| self.clock.now());

        GameResult::new(correct, total, date)
    }

    /// Lifetime accuracy in percent.
    pub async fn total_accuracy(&self) -> f64 {
        self.snapshot().await.total_accuracy()
    }

    /// Read every aggregate at once.
    pub async fn snapshot(&self) -> AggregateStats {
        AggregateStats {
            best_game: self.best_game().await,
            games_count: self.games_count().await,
            total_correct: self.read_count(keys::TOTAL_CORRECT).await,
            total_questions: self.read_count(keys::TOTAL_QUESTIONS).await,
        }
    }

    /// Record a finished round.
    ///
    /// Bumps the games counter and the running totals, and replaces the best
    /// game only when this round is strictly better. All writes go out as one
    /// batch.
    pub async fn store(&self, correct: u32, total: u32) {
        let _guard = self.write_lock.lock().await;

        let counters = match self.read_counters().await {
            Ok(counters) => counters,
            Err(err) => {
                tracing::warn!(correct, total, %err, "statistics unreadable; game result not stored");
                return;
            }
        };
        let games_count = counters.games_count.saturating_add(1);
        let total_questions = counters.total_questions.saturating_add(i64::from(total));
        let total_correct = counters.total_correct.saturating_add(i64::from(correct));

        let mut writes = vec![
            KvWrite::int(keys::GAMES_COUNT, games_count),
            KvWrite::int(keys::TOTAL_QUESTIONS, total_questions),
            KvWrite::int(keys::TOTAL_CORRECT, total_correct),
        ];

        let current = GameResult::new(correct, total, self.clock.now());
        let new_record = current.is_better_than(&counters.best_game);
        if new_record {
            writes.push(KvWrite::int(keys::CORRECT, i64::from(current.correct())));
            writes.push(KvWrite::int(keys::TOTAL, i64::from(current.total())));
            writes.push(KvWrite::date(keys::DATE, current.date()));
        }

        match self.repo.apply(&writes).await {
            Ok(()) => tracing::debug!(correct, total, games_count, new_record, "stored game result"),
            Err(err) => tracing::warn!(correct, total, %err, "failed to store game result"),
        }
    }
}

impl std::fmt::Debug for StatisticsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatisticsService")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
