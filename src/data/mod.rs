//! Core data models and upstream sources for the word of the day
//!
//! This module contains the types shared by the word and dictionary clients,
//! the error taxonomy for upstream calls, and the source traits the service
//! is composed from.

pub mod dictionary;
pub mod random_word;

pub use dictionary::DictionaryClient;
pub use random_word::{RandomWordClient, WordProvider};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::retry::RetryError;

/// A single non-empty word token produced by a word source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word(String);

impl Word {
    /// Creates a word from raw text, trimming surrounding whitespace.
    ///
    /// Returns `None` if nothing is left after trimming.
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One definition of a word together with its part of speech
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    /// Definition text
    pub definition: String,
    /// Part-of-speech tag (e.g. "noun")
    #[serde(rename = "partOfSpeech")]
    pub part_of_speech: String,
}

impl Definition {
    pub fn new(definition: impl Into<String>, part_of_speech: impl Into<String>) -> Self {
        Self {
            definition: definition.into(),
            part_of_speech: part_of_speech.into(),
        }
    }
}

/// The composed word of the day returned to callers and held in the cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordOfTheDay {
    /// The featured word
    pub word: String,
    /// Flattened definitions, in upstream order
    pub definitions: Vec<Definition>,
    /// Set when the result is the fallback rather than upstream data
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    /// Reason attached to a degraded result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WordOfTheDay {
    /// Builds a non-degraded result from upstream data
    pub fn new(word: Word, definitions: Vec<Definition>) -> Self {
        Self {
            word: word.0,
            definitions,
            degraded: false,
            error: None,
        }
    }
}

/// Whether an upstream failure is worth retrying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 5xx responses, timeouts, connection and I/O failures
    Transient,
    /// 4xx responses, malformed payloads, empty word lists
    Permanent,
}

/// Errors that can occur when calling an upstream provider
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-success status
    #[error("Upstream returned HTTP {status}")]
    Status { status: StatusCode },

    /// HTTP request failed before a usable response arrived
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Failed to parse JSON response
    #[error("Failed to parse JSON response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Random word API returned no words
    #[error("Random word API returned an empty response")]
    EmptyResponse,

    /// Transient failures persisted through every attempt
    #[error("Giving up after {attempts} attempts: {last}")]
    RetryExhausted {
        attempts: u32,
        #[source]
        last: Box<UpstreamError>,
    },
}

impl UpstreamError {
    /// Classifies the error for the retry policy
    pub fn kind(&self) -> ErrorKind {
        match self {
            UpstreamError::Status { status } if status.is_server_error() => ErrorKind::Transient,
            UpstreamError::Status { .. } => ErrorKind::Permanent,
            UpstreamError::Request(err) => {
                if err.is_decode() || err.is_builder() || err.is_redirect() {
                    ErrorKind::Permanent
                } else {
                    // timeouts, refused connections, broken bodies
                    ErrorKind::Transient
                }
            }
            UpstreamError::Parse(_) | UpstreamError::EmptyResponse => ErrorKind::Permanent,
            UpstreamError::RetryExhausted { last, .. } => last.kind(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<RetryError<UpstreamError>> for UpstreamError {
    fn from(err: RetryError<UpstreamError>) -> Self {
        match err {
            RetryError::Exhausted { attempts, last } => UpstreamError::RetryExhausted {
                attempts,
                last: Box::new(last),
            },
            RetryError::Permanent(err) => err,
        }
    }
}

/// A provider of random candidate words
#[async_trait]
pub trait WordSource: Send + Sync {
    /// Fetches one word, retrying transient failures
    async fn fetch_random_word(&self) -> Result<Word, UpstreamError>;
}

/// A provider of dictionary definitions
#[async_trait]
pub trait DefinitionSource: Send + Sync {
    /// Fetches the flattened definitions for `word`.
    ///
    /// An unknown word yields an empty list rather than an error.
    async fn fetch_definitions(&self, word: &Word) -> Result<Vec<Definition>, UpstreamError>;
}

/// Builds the shared HTTP client used by both upstream clients
pub fn build_http_client(timeout: Duration) -> Result<Client, UpstreamError> {
    let client = Client::builder()
        .timeout(timeout)
        .user_agent(concat!("wotd/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_rejects_blank_input() {
        assert!(Word::new("").is_none());
        assert!(Word::new("   ").is_none());
        assert!(Word::new("\t\n").is_none());
    }

    #[test]
    fn test_word_trims_whitespace() {
        let word = Word::new("  lumen \n").unwrap();
        assert_eq!(word.as_str(), "lumen");
        assert_eq!(word.to_string(), "lumen");
    }

    #[test]
    fn test_definition_serializes_camel_case_part_of_speech() {
        let definition = Definition::new("a unit of luminous flux", "noun");
        let json = serde_json::to_value(&definition).unwrap();

        assert_eq!(json["definition"], "a unit of luminous flux");
        assert_eq!(json["partOfSpeech"], "noun");
    }

    #[test]
    fn test_word_of_the_day_json_omits_flags_when_healthy() {
        let result = WordOfTheDay::new(
            Word::new("lumen").unwrap(),
            vec![Definition::new("a unit of luminous flux", "noun")],
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "word": "lumen",
                "definitions": [
                    { "definition": "a unit of luminous flux", "partOfSpeech": "noun" }
                ]
            })
        );
    }

    #[test]
    fn test_word_of_the_day_json_includes_degraded_flag() {
        let result = WordOfTheDay {
            word: "fallback".to_string(),
            definitions: vec![],
            degraded: true,
            error: Some("boom".to_string()),
        };
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["degraded"], true);
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn test_status_classification() {
        let server_error = UpstreamError::Status {
            status: StatusCode::SERVICE_UNAVAILABLE,
        };
        let gateway = UpstreamError::Status {
            status: StatusCode::BAD_GATEWAY,
        };
        let not_found = UpstreamError::Status {
            status: StatusCode::NOT_FOUND,
        };
        let too_many = UpstreamError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
        };

        assert_eq!(server_error.kind(), ErrorKind::Transient);
        assert_eq!(gateway.kind(), ErrorKind::Transient);
        assert_eq!(not_found.kind(), ErrorKind::Permanent);
        assert_eq!(too_many.kind(), ErrorKind::Permanent);
    }

    #[test]
    fn test_parse_and_empty_are_permanent() {
        let parse = serde_json::from_str::<Vec<String>>("{ nope").unwrap_err();
        assert!(!UpstreamError::Parse(parse).is_retryable());
        assert!(!UpstreamError::EmptyResponse.is_retryable());
    }

    #[test]
    fn test_retry_exhausted_keeps_inner_kind() {
        let err = UpstreamError::RetryExhausted {
            attempts: 3,
            last: Box::new(UpstreamError::Status {
                status: StatusCode::SERVICE_UNAVAILABLE,
            }),
        };

        assert_eq!(err.kind(), ErrorKind::Transient);
        assert!(err.to_string().contains("3 attempts"));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let client = build_http_client(Duration::from_secs(1)).unwrap();
        // Port 9 (discard) on localhost is not listening in test environments
        let err = client
            .get("http://127.0.0.1:9/word")
            .send()
            .await
            .map_err(UpstreamError::from)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Transient);
    }
}
