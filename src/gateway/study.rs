//! The request orchestration gateway.

use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::builder::{MimirBuilder, PacingConfig};
use super::feature::{Feature, FeatureMessages};
use crate::api::StudyApi;
use crate::cache::{CacheConfig, RequestKey, ResultCache};
use crate::control::{InFlight, RetryPolicy, Throttle, ViewSession, guarded};
use crate::store::{SearchHistory, StateStore, TOKEN_KEY};
use crate::types::{
    Answer, AuthToken, Credentials, Document, DocumentType, FlashcardDeck, OtpVerification,
    Outcome, Quiz, Registration, SearchResults, Summary, Upload, UploadReport, UserProfile,
};
use crate::{MimirError, Result};

/// Shown when the backend could re-run extraction but still got no text.
pub const EXTRACTION_FAILED_AGAIN: &str =
    "Text extraction failed again. The file might be corrupted or unsupported.";

const DOCUMENTS_SLOT: &str = "documents";
const SUGGESTIONS_TRIGGER: &str = "suggestions";
const MIN_SEARCH_CHARS: usize = 3;
const MIN_SUGGESTION_CHARS: usize = 2;

/// A result cache plus the in-flight registry that fills it.
struct Memo<V> {
    cache: ResultCache<V>,
    flights: InFlight<V>,
}

impl<V: Clone> Memo<V> {
    fn new(name: &'static str, config: CacheConfig) -> Self {
        Self {
            cache: ResultCache::new(name, config),
            flights: InFlight::new(name),
        }
    }

    /// Cached value, or one shared call (with retry) that caches on success.
    async fn fetch<F, Fut>(
        &self,
        key: RequestKey,
        policy: &RetryPolicy,
        operation: &'static str,
        call: F,
    ) -> Result<V>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }
        let cache = &self.cache;
        let cache_key = key.clone();
        self.flights
            .run(key, move || async move {
                let result = policy.execute(operation, call).await;
                if let Ok(value) = &result {
                    cache.put(cache_key, value.clone());
                }
                result
            })
            .await
    }
}

fn document_key(endpoint: &'static str, id: u64) -> RequestKey {
    RequestKey::new(endpoint).param("document", id)
}

fn documents_key(document_type: Option<u64>) -> RequestKey {
    let filter = document_type.map_or_else(|| "all".to_string(), |id| id.to_string());
    RequestKey::new("documents").param("document_type", filter)
}

fn search_key(endpoint: &'static str, query: &str) -> RequestKey {
    RequestKey::new(endpoint).param("query", query.to_lowercase())
}

/// Orchestrates every backend call a study front end makes.
///
/// Owns the result caches, in-flight registries, throttle and durable state;
/// nothing is global, so independent gateways do not interact. Operations
/// take the [`ViewSession`] of the calling view and return an [`Outcome`]
/// that is already safe to show.
///
/// Build one with [`Mimir::builder()`](super::Mimir::builder).
pub struct StudyGateway {
    api: Arc<dyn StudyApi>,
    store: Arc<dyn StateStore>,
    history: SearchHistory,
    messages: FeatureMessages,
    pacing: PacingConfig,
    ai_retry: RetryPolicy,
    documents_retry: RetryPolicy,
    single_attempt: RetryPolicy,

    documents: Memo<Vec<Document>>,
    summaries: Memo<Summary>,
    quizzes: Memo<Quiz>,
    decks: Memo<FlashcardDeck>,
    searches: Memo<SearchResults>,
    suggestion_lists: Memo<Vec<String>>,
    documents_throttle: Throttle,

    profile_flights: InFlight<UserProfile>,
    type_flights: InFlight<Vec<DocumentType>>,
    document_flights: InFlight<Document>,
    answer_flights: InFlight<Answer>,
    delete_flights: InFlight<()>,
    extraction_flights: InFlight<Option<Document>>,
}

impl StudyGateway {
    pub(super) fn from_parts(
        api: Arc<dyn StudyApi>,
        store: Arc<dyn StateStore>,
        config: MimirBuilder,
    ) -> Self {
        Self {
            history: SearchHistory::load(store.clone()),
            api,
            store,
            documents_throttle: Throttle::new(config.pacing.documents_min_interval),
            messages: config.messages,
            pacing: config.pacing,
            ai_retry: config.ai_retry,
            documents_retry: config.documents_retry,
            single_attempt: RetryPolicy::disabled(),
            documents: Memo::new("documents", config.documents_cache),
            summaries: Memo::new("summaries", config.artifacts_cache.clone()),
            quizzes: Memo::new("quizzes", config.artifacts_cache.clone()),
            decks: Memo::new("flashcards", config.artifacts_cache),
            searches: Memo::new("search", config.search_cache),
            suggestion_lists: Memo::new("suggestions", config.suggestions_cache),
            profile_flights: InFlight::new("validate_token"),
            type_flights: InFlight::new("document_types"),
            document_flights: InFlight::new("document"),
            answer_flights: InFlight::new("ask"),
            delete_flights: InFlight::new("delete_document"),
            extraction_flights: InFlight::new("retry_extraction"),
        }
    }

    /// Start a session for a newly shown view.
    pub fn begin_session(&self) -> ViewSession {
        debug!("view session started");
        ViewSession::new()
    }

    // ===== Auth =====

    /// Exchange credentials for a token and store it.
    pub async fn login(&self, credentials: &Credentials) -> Outcome<AuthToken> {
        let result = match self.api.login(credentials).await {
            Ok(token) => self.store_token(&token.token).map(|()| token),
            // Wrong credentials, not an expired session.
            Err(MimirError::AuthenticationFailed) => Err(MimirError::Api {
                status: 401,
                message: "Unauthorized".to_string(),
            }),
            Err(e) => Err(e),
        };
        if result.is_ok() {
            info!(username = %credentials.username, "signed in");
        }
        self.messages.login.humanize(result)
    }

    /// Create an account; the backend mails a one-time passcode.
    pub async fn register(&self, registration: &Registration) -> Outcome<()> {
        let result = self.api.register(registration).await;
        if result.is_ok() {
            info!(email = %registration.email, "registration pending verification");
        }
        self.messages.register.humanize(result)
    }

    /// Confirm the passcode; on success the returned token is stored.
    pub async fn verify_otp(&self, verification: &OtpVerification) -> Outcome<AuthToken> {
        let result = match self.api.verify_otp(verification).await {
            Ok(token) => self.store_token(&token.token).map(|()| token),
            Err(e) => Err(e),
        };
        if result.is_ok() {
            info!(email = %verification.email, "account verified");
        }
        self.messages.verify_otp.humanize(result)
    }

    /// Validate the stored token and fetch the signed-in user.
    pub async fn current_user(&self, session: &ViewSession) -> Outcome<UserProfile> {
        let work = self
            .profile_flights
            .run(RequestKey::new("validate_token"), move || self.api.validate_token());
        let result = guarded(&session.child(), work).await;
        self.settle(&self.messages.current_user, result)
    }

    /// Forget the stored token and everything cached for this user.
    pub fn logout(&self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.clear_caches();
        info!("signed out");
        Ok(())
    }

    pub fn is_signed_in(&self) -> bool {
        self.store.get(TOKEN_KEY).is_some()
    }

    // ===== Documents =====

    pub async fn document_types(&self, session: &ViewSession) -> Outcome<Vec<DocumentType>> {
        let work = self
            .type_flights
            .run(RequestKey::new("document_types"), move || self.api.document_types());
        let result = guarded(&session.child(), work).await;
        self.settle(&self.messages.document_types, result)
    }

    /// Document list, optionally filtered by type.
    ///
    /// Supersedes any listing still pending in `session`. Served from cache
    /// while fresh; otherwise refused if the same listing settled within the
    /// minimum interval, then debounced before the request goes out.
    pub async fn list_documents(
        &self,
        session: &ViewSession,
        document_type: Option<u64>,
    ) -> Outcome<Vec<Document>> {
        let feature = &self.messages.documents;
        let token = session.scope(DOCUMENTS_SLOT);
        let key = documents_key(document_type);

        if let Some(documents) = self.documents.cache.get(&key) {
            return Outcome::Ready(documents);
        }
        if let Err(e) = self.documents_throttle.check(&key) {
            return feature.humanize(Err(e));
        }

        let work = async {
            let quiet = self.pacing.documents_debounce;
            if !session.debounce().quiet_period(DOCUMENTS_SLOT, quiet).await {
                return Err(MimirError::Superseded);
            }
            self.documents
                .fetch(key.clone(), &self.documents_retry, feature.operation, move || {
                    self.api.documents(document_type)
                })
                .await
        };
        let result = guarded(&token, work).await;

        match &result {
            Err(e) if e.is_silent() => {}
            _ => self.documents_throttle.record(&key),
        }
        self.settle(feature, result)
    }

    /// Drop cached listings and list again. The throttle still applies.
    pub async fn refresh_documents(
        &self,
        session: &ViewSession,
        document_type: Option<u64>,
    ) -> Outcome<Vec<Document>> {
        self.documents.cache.invalidate_all();
        self.list_documents(session, document_type).await
    }

    pub async fn document(&self, session: &ViewSession, id: u64) -> Outcome<Document> {
        let operation = self.messages.document.operation;
        let work = self
            .document_flights
            .run(document_key("document", id), move || {
                self.documents_retry
                    .execute(operation, move || self.api.document(id))
            });
        let result = guarded(&session.child(), work).await;
        self.settle(&self.messages.document, result)
    }

    /// Upload a file. Listings are refetched afterwards.
    pub async fn upload(&self, session: &ViewSession, upload: &Upload) -> Outcome<UploadReport> {
        let feature = &self.messages.upload;
        if upload.title.trim().is_empty() || upload.bytes.is_empty() {
            return feature.humanize(Err(MimirError::InvalidInput(
                "a title and a non-empty file are required".to_string(),
            )));
        }

        let work = self
            .documents_retry
            .execute(feature.operation, move || self.api.upload(upload));
        let result = guarded(&session.child(), work).await;

        if let Ok(document) = &result {
            info!(document = document.id, title = %document.title, "document uploaded");
            self.documents_changed();
        }
        self.settle(feature, result.map(UploadReport::from))
    }

    /// Delete a document. A document that is already gone counts as deleted.
    pub async fn delete_document(&self, session: &ViewSession, id: u64) -> Outcome<()> {
        let operation = self.messages.delete.operation;
        let work = self
            .delete_flights
            .run(document_key("delete", id), move || async move {
                let result = self
                    .documents_retry
                    .execute(operation, move || self.api.delete_document(id))
                    .await;
                match result {
                    Err(MimirError::NotFound) => {
                        debug!(document = id, "document already deleted");
                        Ok(())
                    }
                    Err(MimirError::RetryExhausted { last })
                        if matches!(*last, MimirError::NotFound) =>
                    {
                        debug!(document = id, "document already deleted");
                        Ok(())
                    }
                    other => other,
                }
            });
        let result = guarded(&session.child(), work).await;

        if result.is_ok() {
            info!(document = id, "document deleted");
            self.forget_document(id);
            self.documents_changed();
        }
        self.settle(&self.messages.delete, result)
    }

    /// Ask the backend to extract text again.
    ///
    /// On success the document is refetched and its cached summary, quiz
    /// and flashcards are dropped so they regenerate from the new text.
    pub async fn retry_extraction(&self, session: &ViewSession, id: u64) -> Outcome<Document> {
        let work = self
            .extraction_flights
            .run(document_key("retry_extraction", id), move || self.reextract(id));
        match guarded(&session.child(), work).await {
            Ok(Some(document)) => {
                info!(document = id, "text extraction succeeded");
                Outcome::Ready(document)
            }
            Ok(None) => {
                warn!(document = id, "text extraction failed again");
                Outcome::Failed {
                    message: EXTRACTION_FAILED_AGAIN.to_string(),
                }
            }
            Err(e) => self.settle(&self.messages.extraction, Err(e)),
        }
    }

    async fn reextract(&self, id: u64) -> Result<Option<Document>> {
        let retry = self.api.retry_extraction(id).await?;
        if !retry.success {
            return Ok(None);
        }
        let document = self.api.document(id).await?;
        self.forget_document(id);
        self.documents.cache.invalidate_all();
        Ok(Some(document))
    }

    // ===== AI features =====

    pub async fn summary(&self, session: &ViewSession, id: u64) -> Outcome<Summary> {
        let feature = &self.messages.summary;
        let work = self.summaries.fetch(
            document_key("summary", id),
            &self.ai_retry,
            feature.operation,
            move || self.api.summarize(id),
        );
        let result = guarded(&session.child(), work).await;
        self.settle(feature, result)
    }

    pub async fn quiz(&self, session: &ViewSession, id: u64) -> Outcome<Quiz> {
        let feature = &self.messages.quiz;
        let work = self.quizzes.fetch(
            document_key("quiz", id),
            &self.ai_retry,
            feature.operation,
            move || self.api.generate_quiz(id),
        );
        let result = guarded(&session.child(), work).await;
        self.settle(feature, result)
    }

    pub async fn flashcards(&self, session: &ViewSession, id: u64) -> Outcome<FlashcardDeck> {
        let feature = &self.messages.flashcards;
        let work = self.decks.fetch(
            document_key("flashcards", id),
            &self.ai_retry,
            feature.operation,
            move || self.api.generate_flashcards(id),
        );
        let result = guarded(&session.child(), work).await;
        self.settle(feature, result)
    }

    /// Generate more questions and append them after the cached ones.
    ///
    /// Returns the whole quiz. The base quiz is settled first (served from
    /// cache, joined if in flight, or fetched) so a concurrent [`quiz`]
    /// cannot overwrite the appended batch.
    ///
    /// [`quiz`]: Self::quiz
    pub async fn load_more_quiz(&self, session: &ViewSession, id: u64) -> Outcome<Quiz> {
        let feature = &self.messages.quiz;
        let operation = feature.operation;
        let cache_key = document_key("quiz", id);
        let work = self
            .quizzes
            .flights
            .run(document_key("quiz_more", id), move || async move {
                self.quizzes
                    .fetch(cache_key.clone(), &self.ai_retry, operation, || {
                        self.api.generate_quiz(id)
                    })
                    .await?;
                let more = self
                    .ai_retry
                    .execute(operation, move || self.api.generate_quiz(id))
                    .await?;
                let quiz = self.quizzes.cache.append(cache_key, more, Quiz::items_mut);
                Ok::<_, MimirError>(quiz)
            });
        let result = guarded(&session.child(), work).await;
        self.settle(feature, result)
    }

    /// Generate more flashcards and append them after the cached ones.
    ///
    /// Like [`load_more_quiz`](Self::load_more_quiz), waits for the base deck first.
    pub async fn load_more_flashcards(
        &self,
        session: &ViewSession,
        id: u64,
    ) -> Outcome<FlashcardDeck> {
        let feature = &self.messages.flashcards;
        let operation = feature.operation;
        let cache_key = document_key("flashcards", id);
        let work = self
            .decks
            .flights
            .run(document_key("flashcards_more", id), move || async move {
                self.decks
                    .fetch(cache_key.clone(), &self.ai_retry, operation, || {
                        self.api.generate_flashcards(id)
                    })
                    .await?;
                let more = self
                    .ai_retry
                    .execute(operation, move || self.api.generate_flashcards(id))
                    .await?;
                let deck = self
                    .decks
                    .cache
                    .append(cache_key, more, |deck| &mut deck.flashcards);
                Ok::<_, MimirError>(deck)
            });
        let result = guarded(&session.child(), work).await;
        self.settle(feature, result)
    }

    /// Ask a question about a document. Blank questions are skipped.
    pub async fn ask(&self, session: &ViewSession, id: u64, question: &str) -> Outcome<Answer> {
        let question = question.trim();
        if question.is_empty() {
            return Outcome::Skipped;
        }
        let feature = &self.messages.question;
        let operation = feature.operation;
        let key = document_key("ask", id).param("question", question);
        let work = self.answer_flights.run(key, move || {
            self.ai_retry
                .execute(operation, move || self.api.ask(id, question))
        });
        let result = guarded(&session.child(), work).await;
        self.settle(feature, result)
    }

    // ===== Search =====

    /// Smart search across all documents.
    ///
    /// Queries shorter than three characters are skipped. Results are cached
    /// per lowercased query; every answered search, cached or not, is moved
    /// to the front of the search history.
    pub async fn search(&self, session: &ViewSession, query: &str) -> Outcome<SearchResults> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_CHARS {
            return Outcome::Skipped;
        }
        let feature = &self.messages.search;
        let work = self.searches.fetch(
            search_key("search", query),
            &self.ai_retry,
            feature.operation,
            move || self.api.search(query),
        );
        let result = guarded(&session.child(), work).await;

        if result.is_ok() {
            self.history.record(query);
        }
        self.settle(feature, result)
    }

    /// Autocomplete suggestions for a partially typed query.
    ///
    /// Debounced per session; a call superseded by a newer keystroke settles
    /// as [`Outcome::Skipped`]. Fewer than two characters yields an empty
    /// list without a request. Failures also yield an empty list.
    pub async fn suggestions(&self, session: &ViewSession, query: &str) -> Outcome<Vec<String>> {
        let query = query.trim();
        if query.chars().count() < MIN_SUGGESTION_CHARS {
            session.debounce().cancel(SUGGESTIONS_TRIGGER);
            return Outcome::Ready(Vec::new());
        }
        let feature = &self.messages.suggestions;

        let work = async {
            let quiet = self.pacing.suggestions_debounce;
            if !session.debounce().quiet_period(SUGGESTIONS_TRIGGER, quiet).await {
                return Err(MimirError::Superseded);
            }
            self.suggestion_lists
                .fetch(
                    search_key("suggestions", query),
                    &self.single_attempt,
                    feature.operation,
                    move || async move {
                        self.api
                            .suggestions(query)
                            .await
                            .map(|found| found.suggestions)
                    },
                )
                .await
        };

        match guarded(&session.child(), work).await {
            Err(e) if !e.is_silent() && !matches!(e, MimirError::AuthenticationFailed) => {
                warn!(error = %e, "suggestions unavailable");
                Outcome::Ready(Vec::new())
            }
            result => self.settle(feature, result),
        }
    }

    /// Recent searches, newest first.
    pub fn search_history(&self) -> Vec<String> {
        self.history.entries()
    }

    pub fn clear_search_history(&self) {
        self.history.clear();
    }

    // ===== Cache access =====

    pub fn cached_documents(&self, document_type: Option<u64>) -> Option<Vec<Document>> {
        self.documents.cache.get(&documents_key(document_type))
    }

    pub fn cached_summary(&self, id: u64) -> Option<Summary> {
        self.summaries.cache.get(&document_key("summary", id))
    }

    pub fn cached_quiz(&self, id: u64) -> Option<Quiz> {
        self.quizzes.cache.get(&document_key("quiz", id))
    }

    pub fn cached_flashcards(&self, id: u64) -> Option<FlashcardDeck> {
        self.decks.cache.get(&document_key("flashcards", id))
    }

    pub fn cached_search(&self, query: &str) -> Option<SearchResults> {
        self.searches.cache.get(&search_key("search", query.trim()))
    }

    /// Drop the cached summary, quiz and flashcards of one document.
    pub fn forget_document(&self, id: u64) {
        self.summaries.cache.invalidate(&document_key("summary", id));
        self.quizzes.cache.invalidate(&document_key("quiz", id));
        self.decks.cache.invalidate(&document_key("flashcards", id));
    }

    /// Empty every result cache.
    pub fn clear_caches(&self) {
        self.documents.cache.invalidate_all();
        self.summaries.cache.invalidate_all();
        self.quizzes.cache.invalidate_all();
        self.decks.cache.invalidate_all();
        self.searches.cache.invalidate_all();
        self.suggestion_lists.cache.invalidate_all();
    }

    // ===== Internals =====

    fn store_token(&self, token: &str) -> Result<()> {
        self.store.set(TOKEN_KEY, token)?;
        self.clear_caches();
        Ok(())
    }

    /// Listings are stale after an upload or delete; let the next listing
    /// through immediately.
    fn documents_changed(&self) {
        self.documents.cache.invalidate_all();
        self.documents_throttle.reset_all();
    }

    /// Humanize, signing out first if the backend rejected the token.
    fn settle<T>(&self, feature: &Feature, result: Result<T>) -> Outcome<T> {
        if matches!(result, Err(MimirError::AuthenticationFailed)) {
            warn!(operation = feature.operation, "auth token rejected, signing out");
            if let Err(e) = self.store.remove(TOKEN_KEY) {
                warn!(error = %e, "failed to clear auth token");
            }
            self.clear_caches();
        }
        feature.humanize(result)
    }
}
