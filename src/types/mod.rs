//! Public types for the Mimir API.

mod auth;
mod document;
mod outcome;
mod search;
mod study;

pub use auth::{AuthToken, Credentials, OtpVerification, Registration, UserProfile};
pub use document::{
    Document, DocumentStats, DocumentType, EXTRACTION_FAILED_PREFIX, Upload, UploadReport,
    format_file_size,
};
pub use outcome::Outcome;
pub use search::{Relevance, SearchHit, SearchResults, Suggestions};
pub use study::{
    Answer, ExtractionRetry, Flashcard, FlashcardDeck, Quiz, QuizQuestion,
    QuizQuestions, Summary,
};
