use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

use super::events::{QuizEvent, QuizHandle};
use super::service::QuizSession;
use crate::config::QuizConfig;
use crate::questions::{MovieProvider, QuestionFactory};
use crate::statistics::StatisticsService;

/// A quiz session running on its own task.
#[derive(Debug)]
pub struct RunningQuiz {
    pub handle: QuizHandle,
    pub events: UnboundedReceiver<QuizEvent>,
    pub task: JoinHandle<()>,
}

/// Wires a question factory, statistics and a session together and starts them.
#[derive(Clone)]
pub struct QuizLoopService {
    config: QuizConfig,
    provider: Arc<dyn MovieProvider>,
    statistics: StatisticsService,
    seed: Option<u64>,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(
        config: QuizConfig,
        provider: Arc<dyn MovieProvider>,
        statistics: StatisticsService,
    ) -> Self {
        Self {
            config,
            provider,
            statistics,
            seed: None,
        }
    }

    /// Seed question selection for reproducible rounds.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Spawn a new session. It begins loading the corpus immediately.
    ///
    /// Must be called from within a tokio runtime. The session stops once
    /// every [`QuizHandle`] clone is dropped.
    #[must_use]
    pub fn start(&self) -> RunningQuiz {
        let (source_tx, source_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();

        let mut factory = QuestionFactory::new(Arc::clone(&self.provider), source_tx)
            .with_thresholds(self.config.thresholds);
        if let Some(seed) = self.seed {
            factory = factory.with_seed(seed);
        }

        let session = QuizSession::new(
            self.config.settings.clone(),
            Arc::new(factory),
            source_rx,
            self.statistics.clone(),
            events_tx,
        );
        tracing::debug!(
            questions_amount = self.config.settings.questions_amount(),
            "starting quiz session"
        );
        let task = tokio::spawn(session.run(commands_rx));

        RunningQuiz {
            handle: QuizHandle::new(commands_tx),
            events,
            task,
        }
    }
}
