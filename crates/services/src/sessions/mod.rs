mod events;
mod progress;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use events::{QuizCommand, QuizEvent, QuizHandle};
pub use progress::{SessionPhase, SessionProgress};
pub use service::QuizSession;
pub use workflow::{QuizLoopService, RunningQuiz};
