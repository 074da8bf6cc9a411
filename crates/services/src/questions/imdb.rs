use std::env;

use async_trait::async_trait;
use quiz_core::model::MovieRecord;
use reqwest::Client;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::questions::MovieProvider;

const DEFAULT_BASE_URL: &str = "https://tv-api.com/en/API";

#[derive(Clone, Debug)]
pub struct MovieFeedConfig {
    pub base_url: String,
    pub api_key: String,
}

impl MovieFeedConfig {
    /// Reads `QUIZ_IMDB_API_KEY` and optional `QUIZ_IMDB_BASE_URL`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUIZ_IMDB_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("QUIZ_IMDB_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Some(Self { base_url, api_key })
    }
}

/// Top-250 movie feed served by the IMDb API.
#[derive(Clone)]
pub struct ImdbMovieProvider {
    client: Client,
    config: MovieFeedConfig,
}

impl ImdbMovieProvider {
    #[must_use]
    pub fn new(config: MovieFeedConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }
}

#[async_trait]
impl MovieProvider for ImdbMovieProvider {
    async fn fetch_movies(&self) -> Result<Vec<MovieRecord>, ProviderError> {
        let url = format!(
            "{}/Top250Movies/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.api_key
        );
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let feed: FeedResponse = response.json().await?;
        feed.into_records()
    }

    async fn fetch_image(&self, url: &str) -> Result<Vec<u8>, ProviderError> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeedResponse {
    #[serde(default)]
    error_message: String,
    #[serde(default)]
    items: Vec<FeedItem>,
}

impl FeedResponse {
    fn into_records(self) -> Result<Vec<MovieRecord>, ProviderError> {
        // The API answers 200 with a message when the key is bad or over quota.
        if !self.error_message.trim().is_empty() {
            return Err(ProviderError::Api(self.error_message));
        }
        Ok(self
            .items
            .into_iter()
            .map(|item| {
                MovieRecord::new(
                    item.full_title,
                    item.rating,
                    resized_image_url(&item.image),
                )
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(rename = "fullTitle")]
    full_title: String,
    #[serde(rename = "imDbRating", default)]
    rating: String,
    #[serde(default)]
    image: String,
}

/// Swap the thumbnail suffix for the 600px-wide poster variant.
fn resized_image_url(url: &str) -> String {
    if url.is_empty() {
        return String::new();
    }
    let base = url.split("._").next().unwrap_or(url);
    format!("{base}._V0_UX600_.jpg")
}
