/// One raw entry of the movie corpus, as delivered by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieRecord {
    pub title: String,
    pub rating_text: String,
    pub image_url: String,
}

impl MovieRecord {
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        rating_text: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            rating_text: rating_text.into(),
            image_url: image_url.into(),
        }
    }

    /// Parsed rating; an unparsable or missing rating counts as `0.0`.
    #[must_use]
    pub fn rating(&self) -> f32 {
        self.rating_text.trim().parse::<f32>().unwrap_or(0.0)
    }
}
