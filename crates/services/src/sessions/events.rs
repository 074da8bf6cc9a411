use quiz_core::model::{QuizStep, RoundSummary};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::SessionError;

/// Input sent from the presentation layer into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizCommand {
    SubmitAnswer(bool),
    RestartRound,
    LoadData,
}

/// Output delivered from the session to the presentation layer, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum QuizEvent {
    QuestionReady(QuizStep),
    AnswerResult { is_correct: bool },
    RoundSummary(RoundSummary),
    LoadFailed(String),
}

/// Cloneable handle the presentation layer uses to drive a running session.
#[derive(Debug, Clone)]
pub struct QuizHandle {
    commands: UnboundedSender<QuizCommand>,
}

impl QuizHandle {
    #[must_use]
    pub fn new(commands: UnboundedSender<QuizCommand>) -> Self {
        Self { commands }
    }

    /// # Errors
    ///
    /// Returns `SessionError::Stopped` if the session loop has ended.
    pub fn submit_answer(&self, answer: bool) -> Result<(), SessionError> {
        self.send(QuizCommand::SubmitAnswer(answer))
    }

    /// # Errors
    ///
    /// Returns `SessionError::Stopped` if the session loop has ended.
    pub fn restart_round(&self) -> Result<(), SessionError> {
        self.send(QuizCommand::RestartRound)
    }

    /// Reload the corpus, e.g. after a failed load.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Stopped` if the session loop has ended.
    pub fn load_data(&self) -> Result<(), SessionError> {
        self.send(QuizCommand::LoadData)
    }

    fn send(&self, command: QuizCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .map_err(|_| SessionError::Stopped)
    }
}
