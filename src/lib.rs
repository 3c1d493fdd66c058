//! Mimir - request orchestration client for the study-companion API
//!
//! This crate sits between a study front end (CLI, TUI, GUI) and the
//! study-companion REST backend. Every backend call goes through one
//! [`StudyGateway`] that caches results, collapses concurrent identical
//! requests, debounces and throttles bursty views, retries once after a rate
//! limit, degrades gracefully in server fallback mode and abandons requests
//! whose view has gone away.
//!
//! Operations return an [`Outcome`] whose messages are ready to show.
//!
//! # Example
//!
//! ```rust,no_run
//! use mimir::{Credentials, Mimir, Outcome};
//!
//! #[tokio::main]
//! async fn main() -> mimir::Result<()> {
//!     let gateway = Mimir::builder()
//!         .base_url("http://127.0.0.1:8000/api")
//!         .build()?;
//!
//!     gateway.login(&Credentials::new("ada", "correct horse")).await;
//!
//!     let session = gateway.begin_session();
//!     match gateway.summary(&session, 42).await {
//!         Outcome::Ready(summary) => println!("{}", summary.summary),
//!         Outcome::Notice { message } | Outcome::Failed { message } => eprintln!("{message}"),
//!         _ => {}
//!     }
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
#[cfg(feature = "cli")]
pub mod config;
pub mod control;
pub mod error;
pub mod forms;
pub mod gateway;
pub mod store;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use api::{HttpStudyApi, StudyApi};
pub use cache::{CacheConfig, RequestKey, ResultCache};
pub use control::{RetryPolicy, ViewSession};
pub use error::{MimirError, Result};
pub use gateway::{
    EXTRACTION_FAILED_AGAIN, Feature, FeatureMessages, Mimir, MimirBuilder, PacingConfig,
    StudyGateway,
};
pub use store::{FileStore, MemoryStore, SearchHistory, StateStore};

// Re-export all types
pub use types::{
    Answer, AuthToken, Credentials, Document, DocumentStats, DocumentType, ExtractionRetry,
    Flashcard, FlashcardDeck, OtpVerification, Outcome, Quiz, QuizQuestion, QuizQuestions,
    Registration, Relevance, SearchHit, SearchResults, Suggestions, Summary, Upload,
    UploadReport, UserProfile, format_file_size,
};
