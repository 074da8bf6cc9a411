use std::fmt;
use std::sync::Arc;

use quiz_core::model::{Question, QuizSettings, QuizStep, RoundSummary};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use super::events::{QuizCommand, QuizEvent};
use super::progress::{SessionPhase, SessionProgress};
use crate::questions::{QuestionSource, SourceEvent};
use crate::statistics::StatisticsService;

//
// ─── INPUTS ────────────────────────────────────────────────────────────────────
//

/// Fires when the feedback pause after an answer is over.
///
/// Carries the round and index it was scheduled for so a timer that outlives
/// a restart is recognised as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct AdvanceDue {
    round: u64,
    index: usize,
}

#[derive(Debug)]
enum Input {
    Command(QuizCommand),
    Source(SourceEvent),
    Advance(AdvanceDue),
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Quiz progression state machine.
///
/// Owns the round state, consumes one input at a time, and reports to the
/// presentation layer through the events channel. Questions come from a
/// [`QuestionSource`]; finished rounds go to the [`StatisticsService`].
pub struct QuizSession {
    settings: QuizSettings,
    source: Arc<dyn QuestionSource>,
    source_events: UnboundedReceiver<SourceEvent>,
    statistics: StatisticsService,
    events: UnboundedSender<QuizEvent>,
    timers_tx: UnboundedSender<AdvanceDue>,
    timers: UnboundedReceiver<AdvanceDue>,
    pending_advance: Option<JoinHandle<()>>,
    phase: SessionPhase,
    round: u64,
    current_index: usize,
    correct_count: u32,
    current_question: Option<Question>,
}

impl QuizSession {
    /// Create a session in the `Loading` phase.
    ///
    /// `source_events` must be the receiving end of the channel `source` reports to.
    #[must_use]
    pub fn new(
        settings: QuizSettings,
        source: Arc<dyn QuestionSource>,
        source_events: UnboundedReceiver<SourceEvent>,
        statistics: StatisticsService,
        events: UnboundedSender<QuizEvent>,
    ) -> Self {
        let (timers_tx, timers) = mpsc::unbounded_channel();
        Self {
            settings,
            source,
            source_events,
            statistics,
            events,
            timers_tx,
            timers,
            pending_advance: None,
            phase: SessionPhase::Loading,
            round: 0,
            current_index: 0,
            correct_count: 0,
            current_question: None,
        }
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.current_question.as_ref()
    }

    #[must_use]
    pub fn questions_amount(&self) -> usize {
        self.settings.questions_amount()
    }

    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            phase: self.phase,
            current_index: self.current_index,
            correct_count: self.correct_count,
            questions_amount: self.questions_amount(),
        }
    }

    /// Drive the session until the command channel closes.
    ///
    /// Starts by loading the corpus.
    pub async fn run(mut self, mut commands: UnboundedReceiver<QuizCommand>) {
        self.load_data();

        loop {
            let input = tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => Input::Command(command),
                    None => break,
                },
                Some(event) = self.source_events.recv() => Input::Source(event),
                Some(due) = self.timers.recv() => Input::Advance(due),
            };
            self.dispatch(input).await;
        }

        self.cancel_pending_advance();
        tracing::debug!("quiz session stopped");
    }

    async fn dispatch(&mut self, input: Input) {
        match input {
            Input::Command(QuizCommand::SubmitAnswer(answer)) => self.submit_answer(answer),
            Input::Command(QuizCommand::RestartRound) => self.restart_round(),
            Input::Command(QuizCommand::LoadData) => self.load_data(),
            Input::Source(event) => self.handle_source_event(event),
            Input::Advance(due) => self.advance(due).await,
        }
    }

    /// (Re)load the corpus and start over in the `Loading` phase.
    pub fn load_data(&mut self) {
        self.start_new_round();
        self.phase = SessionPhase::Loading;
        self.source.load_data();
    }

    /// React to a notification from the question source.
    pub fn handle_source_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::DataReady => {
                // A reload can still succeed after an earlier overlapping load failed.
                if !matches!(self.phase, SessionPhase::Loading | SessionPhase::LoadFailed) {
                    tracing::debug!(phase = ?self.phase, "unexpected data-ready ignored");
                    return;
                }
                self.phase = SessionPhase::AwaitingAnswer;
                self.request_question();
            }
            SourceEvent::LoadFailed(message) => {
                if self.phase != SessionPhase::Loading {
                    tracing::debug!(phase = ?self.phase, "stale load failure ignored");
                    return;
                }
                tracing::warn!(%message, "question corpus unavailable");
                self.phase = SessionPhase::LoadFailed;
                self.emit(QuizEvent::LoadFailed(message));
            }
            SourceEvent::QuestionReady(question) => self.show_question(question),
        }
    }

    fn show_question(&mut self, question: Option<Question>) {
        if self.phase != SessionPhase::AwaitingAnswer || self.current_question.is_some() {
            tracing::debug!(phase = ?self.phase, "unrequested question ignored");
            return;
        }
        let Some(question) = question else {
            tracing::warn!(index = self.current_index, "no question available");
            return;
        };

        self.current_question = Some(question.clone());
        self.emit(QuizEvent::QuestionReady(QuizStep {
            question,
            number: self.current_index + 1,
            total: self.questions_amount(),
        }));
    }

    /// Answer the current question.
    ///
    /// Only the first answer per question counts; anything submitted while
    /// evaluating, or with no question on screen, is ignored.
    pub fn submit_answer(&mut self, answer: bool) {
        if self.phase != SessionPhase::AwaitingAnswer {
            tracing::debug!(phase = ?self.phase, "answer ignored");
            return;
        }
        let Some(question) = self.current_question.as_ref() else {
            tracing::debug!("answer ignored; no question shown");
            return;
        };

        let is_correct = question.is_correct(answer);
        if is_correct {
            self.correct_count += 1;
        }
        self.phase = SessionPhase::Evaluating;
        self.emit(QuizEvent::AnswerResult { is_correct });
        self.schedule_advance();
    }

    fn schedule_advance(&mut self) {
        let due = AdvanceDue {
            round: self.round,
            index: self.current_index,
        };
        let delay = self.settings.feedback_delay();
        let timers = self.timers_tx.clone();

        self.cancel_pending_advance();
        self.pending_advance = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = timers.send(due);
        }));
    }

    fn cancel_pending_advance(&mut self) {
        if let Some(task) = self.pending_advance.take() {
            task.abort();
        }
    }

    /// Move past the evaluated question once the feedback pause is over.
    pub(crate) async fn advance(&mut self, due: AdvanceDue) {
        if due.round != self.round
            || due.index != self.current_index
            || self.phase != SessionPhase::Evaluating
        {
            tracing::debug!(?due, round = self.round, "stale advance ignored");
            return;
        }
        self.pending_advance = None;

        if self.current_index + 1 >= self.questions_amount() {
            self.finish_round().await;
        } else {
            self.current_index += 1;
            self.phase = SessionPhase::AwaitingAnswer;
            self.request_question();
        }
    }

    async fn finish_round(&mut self) {
        self.phase = SessionPhase::RoundComplete;
        self.current_question = None;

        let total = u32::try_from(self.questions_amount()).unwrap_or(u32::MAX);
        self.statistics.store(self.correct_count, total).await;
        let stats = self.statistics.snapshot().await;

        tracing::info!(correct = self.correct_count, total, "round complete");
        self.emit(QuizEvent::RoundSummary(RoundSummary::new(
            self.correct_count,
            total,
            stats,
        )));
    }

    /// Start a fresh round with the already loaded corpus.
    ///
    /// Ignored while the corpus is loading or failed to load.
    pub fn restart_round(&mut self) {
        if matches!(self.phase, SessionPhase::Loading | SessionPhase::LoadFailed) {
            tracing::debug!(phase = ?self.phase, "restart ignored; corpus not loaded");
            return;
        }
        self.start_new_round();
        self.source.reset();
        self.phase = SessionPhase::AwaitingAnswer;
        self.request_question();
    }

    fn start_new_round(&mut self) {
        self.cancel_pending_advance();
        self.round += 1;
        self.current_index = 0;
        self.correct_count = 0;
        self.current_question = None;
    }

    fn request_question(&mut self) {
        self.current_question = None;
        self.source.request_next_question();
    }

    fn emit(&self, event: QuizEvent) {
        if self.events.send(event).is_err() {
            tracing::debug!("presentation layer is gone; event dropped");
        }
    }

    #[cfg(test)]
    pub(crate) async fn next_advance(&mut self) -> Option<AdvanceDue> {
        self.timers.recv().await
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase)
            .field("round", &self.round)
            .field("current_index", &self.current_index)
            .field("correct_count", &self.correct_count)
            .field("questions_amount", &self.questions_amount())
            .field("has_question", &self.current_question.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use quiz_core::time::fixed_clock;
    use storage::repository::InMemoryKeyValueStore;

    use super::*;

    #[derive(Default)]
    struct RecordingSource {
        loads: AtomicUsize,
        requests: AtomicUsize,
        resets: AtomicUsize,
    }

    impl QuestionSource for RecordingSource {
        fn load_data(&self) {
            self.loads.fetch_add(1, Ordering::SeqCst);
        }

        fn request_next_question(&self) {
            self.requests.fetch_add(1, Ordering::SeqCst);
        }

        fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct Harness {
        session: QuizSession,
        source: Arc<RecordingSource>,
        events: UnboundedReceiver<QuizEvent>,
        // Kept alive so the session's source channel stays open.
        _source_tx: UnboundedSender<SourceEvent>,
    }

    fn harness(questions_amount: usize) -> Harness {
        let source = Arc::new(RecordingSource::default());
        let (source_tx, source_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let statistics =
            StatisticsService::new(fixed_clock(), Arc::new(InMemoryKeyValueStore::new()));
        let settings = QuizSettings::new(questions_amount, Duration::from_secs(1)).unwrap();
        let session = QuizSession::new(
            settings,
            source.clone(),
            source_rx,
            statistics,
            events_tx,
        );
        Harness {
            session,
            source,
            events,
            _source_tx: source_tx,
        }
    }

    fn yes_question() -> Question {
        Question::new(Vec::new(), "Is this movie rated higher than 7?", true)
    }

    impl Harness {
        fn loaded(mut self) -> Self {
            self.session.load_data();
            self.session.handle_source_event(SourceEvent::DataReady);
            self
        }

        fn deliver(&mut self, question: Question) {
            self.session
                .handle_source_event(SourceEvent::QuestionReady(Some(question)));
        }

        async fn answer_and_advance(&mut self, answer: bool) {
            self.session.submit_answer(answer);
            let due = self.session.next_advance().await.expect("advance scheduled");
            self.session.advance(due).await;
        }

        fn drain(&mut self) -> Vec<QuizEvent> {
            let mut out = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                out.push(event);
            }
            out
        }
    }

    #[test]
    fn starts_in_loading_at_index_zero() {
        let h = harness(10);
        assert_eq!(h.session.phase(), SessionPhase::Loading);
        assert_eq!(h.session.current_index(), 0);
        assert_eq!(h.session.correct_count(), 0);
    }

    #[test]
    fn data_ready_requests_first_question() {
        let mut h = harness(3).loaded();

        assert_eq!(h.source.loads.load(Ordering::SeqCst), 1);
        assert_eq!(h.source.requests.load(Ordering::SeqCst), 1);
        assert_eq!(h.session.phase(), SessionPhase::AwaitingAnswer);

        h.deliver(yes_question());
        let events = h.drain();
        let [QuizEvent::QuestionReady(step)] = events.as_slice() else {
            panic!("expected one question, got {events:?}");
        };
        assert_eq!(step.counter_label(), "1/3");
    }

    #[test]
    fn load_failure_is_a_distinct_phase() {
        let mut h = harness(3);
        h.session.load_data();
        h.session
            .handle_source_event(SourceEvent::LoadFailed("timed out".into()));

        assert_eq!(h.session.phase(), SessionPhase::LoadFailed);
        assert_eq!(h.drain(), vec![QuizEvent::LoadFailed("timed out".into())]);

        // No silent retry; only an explicit reload asks the source again.
        assert_eq!(h.source.loads.load(Ordering::SeqCst), 1);
        h.session.restart_round();
        assert_eq!(h.session.phase(), SessionPhase::LoadFailed);
        h.session.load_data();
        assert_eq!(h.source.loads.load(Ordering::SeqCst), 2);
        assert_eq!(h.session.phase(), SessionPhase::Loading);
    }

    #[test]
    fn overlapping_reload_recovers_after_earlier_failure() {
        let mut h = harness(3);
        h.session.load_data();
        h.session.load_data();

        h.session
            .handle_source_event(SourceEvent::LoadFailed("timed out".into()));
        assert_eq!(h.session.phase(), SessionPhase::LoadFailed);
        h.session.handle_source_event(SourceEvent::DataReady);

        assert_eq!(h.session.phase(), SessionPhase::AwaitingAnswer);
        assert_eq!(h.source.requests.load(Ordering::SeqCst), 1);
        h.deliver(yes_question());
        let events = h.drain();
        assert!(matches!(
            events.as_slice(),
            [QuizEvent::LoadFailed(_), QuizEvent::QuestionReady(_)]
        ));
    }

    #[test]
    fn late_failure_after_data_ready_is_ignored() {
        let mut h = harness(3);
        h.session.load_data();
        h.session.load_data();

        h.session.handle_source_event(SourceEvent::DataReady);
        h.session
            .handle_source_event(SourceEvent::LoadFailed("timed out".into()));

        assert_eq!(h.session.phase(), SessionPhase::AwaitingAnswer);
        assert!(h.drain().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn correct_answer_adds_exactly_one() {
        let mut h = harness(3).loaded();
        h.deliver(yes_question());

        h.session.submit_answer(true);
        assert_eq!(h.session.correct_count(), 1);
        assert_eq!(h.session.phase(), SessionPhase::Evaluating);

        let events = h.drain();
        assert_eq!(events.last(), Some(&QuizEvent::AnswerResult { is_correct: true }));
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_answer_keeps_score() {
        let mut h = harness(3).loaded();
        h.deliver(yes_question());

        h.session.submit_answer(false);
        assert_eq!(h.session.correct_count(), 0);
        let events = h.drain();
        assert_eq!(events.last(), Some(&QuizEvent::AnswerResult { is_correct: false }));
    }

    #[tokio::test(start_paused = true)]
    async fn input_is_closed_while_evaluating() {
        let mut h = harness(3).loaded();
        h.deliver(yes_question());

        h.session.submit_answer(true);
        h.session.submit_answer(true);
        h.session.submit_answer(false);

        assert_eq!(h.session.correct_count(), 1);
        let results = h
            .drain()
            .into_iter()
            .filter(|e| matches!(e, QuizEvent::AnswerResult { .. }))
            .count();
        assert_eq!(results, 1);
    }

    #[test]
    fn answer_without_question_is_noop() {
        let mut h = harness(3).loaded();

        h.session.submit_answer(true);

        assert_eq!(h.session.phase(), SessionPhase::AwaitingAnswer);
        assert_eq!(h.session.correct_count(), 0);
        assert!(h.drain().is_empty());
    }

    #[test]
    fn empty_corpus_delivers_nothing() {
        let mut h = harness(3).loaded();

        h.session
            .handle_source_event(SourceEvent::QuestionReady(None));

        assert!(h.session.current_question().is_none());
        assert!(h.drain().is_empty());
    }

    #[test]
    fn duplicate_delivery_for_one_slot_is_ignored() {
        let mut h = harness(3).loaded();
        h.deliver(yes_question());
        h.deliver(Question::new(Vec::new(), "Other", false));

        assert_eq!(h.drain().len(), 1);
        assert_eq!(h.session.current_question(), Some(&yes_question()));
    }

    #[tokio::test(start_paused = true)]
    async fn advance_waits_for_feedback_delay() {
        let mut h = harness(3).loaded();
        h.deliver(yes_question());
        let started = tokio::time::Instant::now();

        h.answer_and_advance(true).await;

        assert!(started.elapsed() >= Duration::from_secs(1));
        assert_eq!(h.session.current_index(), 1);
        assert_eq!(h.session.phase(), SessionPhase::AwaitingAnswer);
        assert_eq!(h.source.requests.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn full_round_completes_exactly_once() {
        let n = 4;
        let mut h = harness(n).loaded();

        for i in 0..n {
            assert_eq!(h.session.current_index(), i);
            h.deliver(yes_question());
            h.answer_and_advance(i % 2 == 0).await;
            assert!(h.session.current_index() < n);
        }

        assert_eq!(h.session.phase(), SessionPhase::RoundComplete);
        assert_eq!(h.session.current_index(), n - 1);
        let summaries: Vec<_> = h
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                QuizEvent::RoundSummary(summary) => Some(summary),
                _ => None,
            })
            .collect();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].correct, 2);
        assert_eq!(summaries[0].total, 4);
        assert_eq!(summaries[0].stats.games_count, 1);

        // Answers after the round are ignored and no second summary appears.
        h.session.submit_answer(true);
        assert!(h.drain().is_empty());
        assert_eq!(h.source.requests.load(Ordering::SeqCst), n);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_resets_counters_and_replays() {
        let mut h = harness(2).loaded();
        for _ in 0..2 {
            h.deliver(yes_question());
            h.answer_and_advance(true).await;
        }
        assert_eq!(h.session.phase(), SessionPhase::RoundComplete);
        h.drain();

        h.session.restart_round();
        assert_eq!(h.session.current_index(), 0);
        assert_eq!(h.session.correct_count(), 0);
        assert_eq!(h.source.resets.load(Ordering::SeqCst), 1);

        for _ in 0..2 {
            h.deliver(yes_question());
            h.answer_and_advance(false).await;
        }
        let summaries: Vec<_> = h
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                QuizEvent::RoundSummary(summary) => Some(summary),
                _ => None,
            })
            .collect();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].correct, 0);
        assert_eq!(summaries[0].stats.games_count, 2);
        assert_eq!(summaries[0].stats.best_game.correct(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_during_feedback_suppresses_stale_advance() {
        let mut h = harness(3).loaded();
        h.deliver(yes_question());
        h.session.submit_answer(true);
        let stale = AdvanceDue {
            round: h.session.round,
            index: 0,
        };

        h.session.restart_round();
        h.deliver(yes_question());
        h.session.advance(stale).await;

        assert_eq!(h.session.current_index(), 0);
        assert_eq!(h.session.phase(), SessionPhase::AwaitingAnswer);
        assert!(h.session.current_question().is_some());

        // The aborted timer never fires.
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(h.session.timers.try_recv().is_err());
    }
}
