use std::fmt;

/// A single yes/no question shown to the player.
#[derive(Clone, PartialEq, Eq)]
pub struct Question {
    image: Vec<u8>,
    text: String,
    correct_answer: bool,
}

impl Question {
    #[must_use]
    pub fn new(image: Vec<u8>, text: impl Into<String>, correct_answer: bool) -> Self {
        Self {
            image,
            text: text.into(),
            correct_answer,
        }
    }

    /// Builds the "is the rating higher than N?" question for a movie.
    ///
    /// The correct answer is `true` only when `rating` is strictly greater than
    /// `threshold`.
    #[must_use]
    pub fn about_rating(image: Vec<u8>, rating: f32, threshold: u8) -> Self {
        Self::new(
            image,
            format!("Is this movie rated higher than {threshold}?"),
            rating > f32::from(threshold),
        )
    }

    #[must_use]
    pub fn image(&self) -> &[u8] {
        &self.image
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn correct_answer(&self) -> bool {
        self.correct_answer
    }

    /// Returns true if `answer` matches the expected answer.
    #[must_use]
    pub fn is_correct(&self, answer: bool) -> bool {
        self.correct_answer == answer
    }
}

// Image payloads can be large; print their size only.
impl fmt::Debug for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Question")
            .field("image_len", &self.image.len())
            .field("text", &self.text)
            .field("correct_answer", &self.correct_answer)
            .finish()
    }
}

/// The current question together with its position in the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizStep {
    pub question: Question,
    /// 1-based position of the question in the round.
    pub number: usize,
    pub total: usize,
}

impl QuizStep {
    /// Counter text such as `3/10`.
    #[must_use]
    pub fn counter_label(&self) -> String {
        format!("{}/{}", self.number, self.total)
    }
}
