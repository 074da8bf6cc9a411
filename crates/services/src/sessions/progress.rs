/// Where a quiz session is in its round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting for the corpus to load.
    Loading,
    /// The corpus failed to load; waiting for an explicit reload.
    LoadFailed,
    /// Showing a question (or waiting for it to arrive).
    AwaitingAnswer,
    /// An answer was given; input is closed until the feedback pause ends.
    Evaluating,
    /// All questions answered and the result stored.
    RoundComplete,
}

/// Snapshot of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    pub phase: SessionPhase,
    pub current_index: usize,
    pub correct_count: u32,
    pub questions_amount: usize,
}
