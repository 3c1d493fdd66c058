//! Builder for configuring gateway instances

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use super::{FeatureMessages, StudyGateway};
use crate::Result;
use crate::api::{DEFAULT_BASE_URL, HttpStudyApi, StudyApi};
use crate::cache::CacheConfig;
use crate::control::RetryPolicy;
use crate::store::{MemoryStore, StateStore};

/// Debounce and throttle timings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacingConfig {
    /// Quiet period before a document list request is sent. Default: 1s.
    pub documents_debounce: Duration,
    /// Minimum time between settled document list requests. Default: 2s.
    pub documents_min_interval: Duration,
    /// Quiet period before a suggestion request is sent. Default: 500ms.
    pub suggestions_debounce: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            documents_debounce: Duration::from_millis(1000),
            documents_min_interval: Duration::from_millis(2000),
            suggestions_debounce: Duration::from_millis(500),
        }
    }
}

impl PacingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn documents_debounce(mut self, quiet: Duration) -> Self {
        self.documents_debounce = quiet;
        self
    }

    pub fn documents_min_interval(mut self, interval: Duration) -> Self {
        self.documents_min_interval = interval;
        self
    }

    pub fn suggestions_debounce(mut self, quiet: Duration) -> Self {
        self.suggestions_debounce = quiet;
        self
    }

    /// No debouncing or throttling at all.
    pub fn immediate() -> Self {
        Self {
            documents_debounce: Duration::ZERO,
            documents_min_interval: Duration::ZERO,
            suggestions_debounce: Duration::ZERO,
        }
    }
}

/// Main entry point for creating gateway instances.
pub struct Mimir;

impl Mimir {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> MimirBuilder {
        MimirBuilder::new()
    }
}

/// Builder for configuring gateway instances.
pub struct MimirBuilder {
    base_url: Option<String>,
    timeout: Duration,
    api: Option<Arc<dyn StudyApi>>,
    store: Option<Arc<dyn StateStore>>,
    pub(super) documents_cache: CacheConfig,
    pub(super) artifacts_cache: CacheConfig,
    pub(super) search_cache: CacheConfig,
    pub(super) suggestions_cache: CacheConfig,
    pub(super) ai_retry: RetryPolicy,
    pub(super) documents_retry: RetryPolicy,
    pub(super) pacing: PacingConfig,
    pub(super) messages: FeatureMessages,
}

impl MimirBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(60),
            api: None,
            store: None,
            documents_cache: CacheConfig::new()
                .max_entries(20)
                .ttl(Duration::from_secs(30)),
            artifacts_cache: CacheConfig::new().max_entries(100),
            search_cache: CacheConfig::new().max_entries(20),
            suggestions_cache: CacheConfig::new().max_entries(50),
            ai_retry: RetryPolicy::ai_features(),
            documents_retry: RetryPolicy::documents(),
            pacing: PacingConfig::default(),
            messages: FeatureMessages::default(),
        }
    }

    /// Backend base URL including the `/api` prefix.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Per-request HTTP timeout (default 60s).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use a custom transport instead of the HTTP client.
    ///
    /// `base_url` and `timeout` are ignored when set.
    pub fn api(mut self, api: Arc<dyn StudyApi>) -> Self {
        self.api = Some(api);
        self
    }

    /// Durable state for the auth token and search history
    /// (default: in-memory).
    pub fn store(mut self, store: Arc<dyn StateStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn documents_cache(mut self, config: CacheConfig) -> Self {
        self.documents_cache = config;
        self
    }

    /// Cache for summaries, quizzes and flashcards.
    pub fn artifacts_cache(mut self, config: CacheConfig) -> Self {
        self.artifacts_cache = config;
        self
    }

    pub fn search_cache(mut self, config: CacheConfig) -> Self {
        self.search_cache = config;
        self
    }

    pub fn suggestions_cache(mut self, config: CacheConfig) -> Self {
        self.suggestions_cache = config;
        self
    }

    /// Retry policy for summary, quiz, flashcards, Q&A and search.
    pub fn ai_retry(mut self, policy: RetryPolicy) -> Self {
        self.ai_retry = policy;
        self
    }

    /// Retry policy for document listing, upload and deletion.
    pub fn documents_retry(mut self, policy: RetryPolicy) -> Self {
        self.documents_retry = policy;
        self
    }

    pub fn pacing(mut self, pacing: PacingConfig) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn messages(mut self, messages: FeatureMessages) -> Self {
        self.messages = messages;
        self
    }

    /// Build the gateway.
    pub fn build(mut self) -> Result<StudyGateway> {
        let store: Arc<dyn StateStore> = self
            .store
            .take()
            .unwrap_or_else(|| Arc::new(MemoryStore::new()));
        let api: Arc<dyn StudyApi> = match self.api.take() {
            Some(api) => api,
            None => {
                let base_url = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
                Arc::new(HttpStudyApi::new(base_url, self.timeout, store.clone())?)
            }
        };
        debug!(api = api.name(), "gateway built");
        Ok(StudyGateway::from_parts(api, store, self))
    }
}

impl Default for MimirBuilder {
    fn default() -> Self {
        Self::new()
    }
}
