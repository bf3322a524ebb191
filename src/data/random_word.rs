//! Random word API client
//!
//! Fetches a single candidate word from one of the supported random word
//! providers. The provider is picked from configuration at startup.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::{UpstreamError, Word, WordSource};
use crate::retry::RetryPolicy;

/// Base URL for the Heroku-hosted random word API
pub const RANDOM_WORD_API_BASE_URL: &str = "https://random-word-api.herokuapp.com";

/// Base URL for the Vercel-hosted random word API
pub const VERCEL_BASE_URL: &str = "https://random-word-api.vercel.app/api";

/// Supported random word providers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WordProvider {
    /// `GET {base}/word?number=1`
    #[default]
    RandomWordApi,
    /// `GET {base}?number=1`
    Vercel,
}

/// Error returned when a provider name is not recognized
#[derive(Debug, Error)]
#[error("Unknown word provider: '{0}'. Valid providers: random-word-api, vercel")]
pub struct UnknownProvider(pub String);

impl FromStr for WordProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "random-word-api" | "randomwordapi" | "heroku" => Ok(WordProvider::RandomWordApi),
            "vercel" => Ok(WordProvider::Vercel),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for WordProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WordProvider::RandomWordApi => f.write_str("random-word-api"),
            WordProvider::Vercel => f.write_str("vercel"),
        }
    }
}

impl WordProvider {
    /// The public endpoint this provider is normally reached at
    pub fn default_base_url(&self) -> &'static str {
        match self {
            WordProvider::RandomWordApi => RANDOM_WORD_API_BASE_URL,
            WordProvider::Vercel => VERCEL_BASE_URL,
        }
    }
}

/// Client for fetching a random word
#[derive(Debug, Clone)]
pub struct RandomWordClient {
    http_client: Client,
    base_url: Url,
    provider: WordProvider,
    retry: RetryPolicy,
}

impl RandomWordClient {
    /// Creates a client for `provider` rooted at `base_url`
    pub fn new(http_client: Client, base_url: Url, provider: WordProvider, retry: RetryPolicy) -> Self {
        Self {
            http_client,
            base_url,
            provider,
            retry,
        }
    }

    /// Builds the request URL for a single word
    fn request_url(&self) -> Url {
        let mut url = self.base_url.clone();
        if self.provider == WordProvider::RandomWordApi {
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.pop_if_empty().push("word");
            }
        }
        url.query_pairs_mut().append_pair("number", "1");
        url
    }

    /// Performs one request without retrying
    async fn fetch_once(&self) -> Result<Word, UpstreamError> {
        let url = self.request_url();
        debug!(%url, provider = %self.provider, "requesting random word");

        let response = self.http_client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status { status });
        }

        let text = response.text().await?;
        let words: Vec<String> = serde_json::from_str(&text)?;
        first_word(words)
    }
}

#[async_trait]
impl WordSource for RandomWordClient {
    async fn fetch_random_word(&self) -> Result<Word, UpstreamError> {
        let word = self
            .retry
            .execute_with_retry(|| self.fetch_once(), UpstreamError::is_retryable)
            .await?;
        debug!(%word, "received random word");
        Ok(word)
    }
}

/// Takes the first word of an API response
fn first_word(words: Vec<String>) -> Result<Word, UpstreamError> {
    words
        .into_iter()
        .next()
        .and_then(Word::new)
        .ok_or(UpstreamError::EmptyResponse)
}
