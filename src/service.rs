//! Word of the day service
//!
//! Composes a word source, a definition source and the result cache into the
//! single "get word of the day" operation. Results are cached for the cache TTL;
//! upstream failures degrade the result instead of failing the call.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::cache::{Clock, ResultCache, SystemClock};
use crate::config::{Config, ConfigError};
use crate::data::{
    build_http_client, Definition, DefinitionSource, DictionaryClient, RandomWordClient,
    UpstreamError, WordOfTheDay, WordSource,
};

/// Cache key for the word of the day
pub const WORD_OF_THE_DAY_KEY: &str = "wordOfTheDay";

/// Word returned when no word could be fetched
pub const FALLBACK_WORD: &str = "fallback";

/// The single definition attached to [`FALLBACK_WORD`]
pub const FALLBACK_DEFINITION: &str = "A contingency option to be taken if the primary option fails";

/// Part of speech of [`FALLBACK_DEFINITION`]
pub const FALLBACK_PART_OF_SPEECH: &str = "noun";

/// Reason reported on a fallback result
pub const FALLBACK_ERROR: &str = "Failed to fetch data from external APIs";

/// One async lock per cache key
///
/// Holding a key's lock means this task is the only one fetching that key.
#[derive(Debug, Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl KeyedLocks {
    fn lock_for(&self, key: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks.lock().entry(key.to_string()).or_default().clone()
    }
}

/// Serves the word of the day with caching and graceful degradation
pub struct WordOfTheDayService<C: Clock = SystemClock> {
    word_source: Arc<dyn WordSource>,
    definition_source: Arc<dyn DefinitionSource>,
    cache: Arc<ResultCache<WordOfTheDay, C>>,
    locks: Arc<KeyedLocks>,
    cache_key: String,
}

impl<C: Clock> Clone for WordOfTheDayService<C> {
    fn clone(&self) -> Self {
        Self {
            word_source: self.word_source.clone(),
            definition_source: self.definition_source.clone(),
            cache: self.cache.clone(),
            locks: self.locks.clone(),
            cache_key: self.cache_key.clone(),
        }
    }
}

impl WordOfTheDayService<SystemClock> {
    /// Builds the service and its HTTP clients from configuration
    ///
    /// Fails only on configuration problems, which are fatal at startup.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let http_client = build_http_client(config.request_timeout())?;
        let random_word_url = config.random_word_url()?;
        let dictionary_url = config.dictionary_url()?;
        info!(
            provider = %config.word_provider,
            %random_word_url,
            %dictionary_url,
            "configured upstream providers"
        );

        let word_source = RandomWordClient::new(
            http_client.clone(),
            random_word_url,
            config.word_provider,
            config.retry.clone(),
        );
        let definition_source = DictionaryClient::new(http_client, dictionary_url, config.retry.clone());
        let cache = Arc::new(ResultCache::new(&config.cache));

        Ok(Self::new(Arc::new(word_source), Arc::new(definition_source), cache))
    }
}

impl<C: Clock> WordOfTheDayService<C> {
    /// Creates a service that caches under [`WORD_OF_THE_DAY_KEY`]
    pub fn new(
        word_source: Arc<dyn WordSource>,
        definition_source: Arc<dyn DefinitionSource>,
        cache: Arc<ResultCache<WordOfTheDay, C>>,
    ) -> Self {
        Self {
            word_source,
            definition_source,
            cache,
            locks: Arc::new(KeyedLocks::default()),
            cache_key: WORD_OF_THE_DAY_KEY.to_string(),
        }
    }

    /// Returns a service for another cache key sharing this one's sources,
    /// cache and locks
    ///
    /// Fetches for different keys do not wait on each other.
    pub fn for_key(&self, cache_key: impl Into<String>) -> Self {
        Self {
            cache_key: cache_key.into(),
            ..self.clone()
        }
    }

    pub fn cache_key(&self) -> &str {
        &self.cache_key
    }

    /// Returns the word of the day
    ///
    /// Serves from cache while the entry is fresh. On a miss, fetches a word and
    /// its definitions and caches the result. If the definitions cannot be
    /// fetched the word is cached with no definitions; if the word itself cannot
    /// be fetched a fixed fallback is returned and nothing is cached.
    ///
    /// At most one fetch per key runs at a time. Callers arriving during a fetch
    /// wait for it and then read the fresh cache entry.
    pub async fn get_word_of_the_day(&self) -> WordOfTheDay {
        if let Some(cached) = self.cache.get_if_valid(&self.cache_key) {
            debug!(key = %self.cache_key, "returning cached word of the day");
            return cached;
        }

        let lock = self.locks.lock_for(&self.cache_key);
        let _guard = lock.lock().await;

        if let Some(cached) = self.cache.get_if_valid(&self.cache_key) {
            debug!(key = %self.cache_key, "word of the day fetched by a concurrent request");
            return cached;
        }

        info!(key = %self.cache_key, "cache miss for word of the day, fetching new data");

        match self.compose().await {
            Ok(result) => {
                self.cache.put(self.cache_key.clone(), result.clone());
                info!(word = %result.word, "fetched and cached new word of the day");
                result
            }
            Err(err @ UpstreamError::RetryExhausted { .. }) => {
                error!(error = %err, "random word source unavailable after retries");
                warn!("returning fallback word of the day due to API failures");
                fallback()
            }
            Err(err) => {
                error!(error = %err, "random word source rejected the request");
                warn!("returning fallback word of the day due to API failures");
                fallback()
            }
        }
    }

    /// Drops the cached word so the next call fetches a new one
    ///
    /// Waits for an in-flight fetch of this key to finish first, so a result
    /// fetched before the clear is never served after it.
    pub async fn clear_cache(&self) {
        let lock = self.locks.lock_for(&self.cache_key);
        let _guard = lock.lock().await;
        self.cache.invalidate(&self.cache_key);
    }

    /// Clears the cache and fetches a new word of the day
    pub async fn refresh(&self) -> WordOfTheDay {
        self.clear_cache().await;
        self.get_word_of_the_day().await
    }

    /// Fetches a word and its definitions
    ///
    /// Only a word source failure is an error. A definition source failure
    /// of either kind keeps the word with an empty definition list.
    async fn compose(&self) -> Result<WordOfTheDay, UpstreamError> {
        let word = self.word_source.fetch_random_word().await?;

        let definitions = match self.definition_source.fetch_definitions(&word).await {
            Ok(definitions) => definitions,
            Err(err @ UpstreamError::RetryExhausted { .. }) => {
                warn!(
                    %word,
                    error = %err,
                    "dictionary unavailable after retries, returning word with empty definitions"
                );
                Vec::new()
            }
            Err(err) => {
                error!(
                    %word,
                    error = %err,
                    "dictionary rejected the request, returning word with empty definitions"
                );
                Vec::new()
            }
        };

        Ok(WordOfTheDay::new(word, definitions))
    }
}

/// The fixed result served when no word can be fetched
pub fn fallback() -> WordOfTheDay {
    WordOfTheDay {
        word: FALLBACK_WORD.to_string(),
        definitions: vec![Definition::new(FALLBACK_DEFINITION, FALLBACK_PART_OF_SPEECH)],
        degraded: true,
        error: Some(FALLBACK_ERROR.to_string()),
    }
}
