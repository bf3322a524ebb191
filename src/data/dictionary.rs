//! Dictionary API client
//!
//! Looks up a word in a free-dictionary style API and flattens the nested
//! entry / meaning / definition structure into a flat list of definitions.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, info};

use super::{Definition, DefinitionSource, UpstreamError, Word};
use crate::retry::RetryPolicy;

/// Base URL for the free dictionary API
pub const DICTIONARY_API_BASE_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries";

/// Language segment used for lookups
const LANGUAGE: &str = "en";

/// A single dictionary entry returned by the API
#[derive(Debug, Deserialize)]
struct DictionaryEntry {
    #[serde(default)]
    meanings: Vec<Meaning>,
}

/// One sense group of an entry, tagged with its part of speech
#[derive(Debug, Deserialize)]
struct Meaning {
    #[serde(rename = "partOfSpeech", default)]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<DefinitionText>,
}

#[derive(Debug, Deserialize)]
struct DefinitionText {
    definition: String,
}

/// Client for fetching word definitions
#[derive(Debug, Clone)]
pub struct DictionaryClient {
    http_client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl DictionaryClient {
    pub fn new(http_client: Client, base_url: Url, retry: RetryPolicy) -> Self {
        Self {
            http_client,
            base_url,
            retry,
        }
    }

    /// Builds `{base}/en/{word}` with the word encoded as one path segment
    fn definitions_url(&self, word: &Word) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(LANGUAGE).push(word.as_str());
        }
        url
    }

    /// Performs one lookup without retrying
    async fn fetch_once(&self, word: &Word) -> Result<Vec<Definition>, UpstreamError> {
        let url = self.definitions_url(word);
        debug!(%url, "requesting definitions");

        let response = self.http_client.get(url).send().await?;
        let status = response.status();

        // Unknown words come back as 404
        if status == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(UpstreamError::Status { status });
        }

        let text = response.text().await?;
        let entries: Vec<DictionaryEntry> = serde_json::from_str(&text)?;
        Ok(flatten_entries(entries))
    }
}

#[async_trait]
impl DefinitionSource for DictionaryClient {
    async fn fetch_definitions(&self, word: &Word) -> Result<Vec<Definition>, UpstreamError> {
        let definitions = self
            .retry
            .execute_with_retry(|| self.fetch_once(word), UpstreamError::is_retryable)
            .await?;

        if definitions.is_empty() {
            info!(%word, "no definitions found");
        } else {
            debug!(%word, count = definitions.len(), "found definitions");
        }
        Ok(definitions)
    }
}

/// Flattens entries into (definition, part of speech) pairs
///
/// Order is preserved: entry order, then meaning order, then definition order.
fn flatten_entries(entries: Vec<DictionaryEntry>) -> Vec<Definition> {
    entries
        .into_iter()
        .flat_map(|entry| entry.meanings)
        .flat_map(|meaning| {
            let part_of_speech = meaning.part_of_speech;
            meaning
                .definitions
                .into_iter()
                .map(move |d| Definition::new(d.definition, part_of_speech.clone()))
        })
        .collect()
}
