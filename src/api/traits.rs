//! Core StudyApi trait

use async_trait::async_trait;

use crate::types::{
    Answer, AuthToken, Credentials, Document, DocumentType, ExtractionRetry, FlashcardDeck,
    OtpVerification, Quiz, Registration, SearchResults, Suggestions, Summary, Upload, UserProfile,
};
use crate::{MimirError, Result};

/// One method per backend endpoint.
///
/// Implementations perform a single attempt and classify failures into
/// [`MimirError`]; retry, caching and deduplication happen in the gateway.
/// Every method has a default returning [`MimirError::NotImplemented`], so
/// test doubles only implement what they exercise.
#[async_trait]
pub trait StudyApi: Send + Sync {
    /// Name for logging
    fn name(&self) -> &str {
        "study-api"
    }

    // ===== Auth =====

    /// `POST /auth/token/`
    async fn login(&self, _credentials: &Credentials) -> Result<AuthToken> {
        Err(MimirError::NotImplemented("login"))
    }

    /// `POST /auth/register/`; the server answers by mailing an OTP.
    async fn register(&self, _registration: &Registration) -> Result<()> {
        Err(MimirError::NotImplemented("register"))
    }

    /// `POST /auth/verify-otp/`
    async fn verify_otp(&self, _verification: &OtpVerification) -> Result<AuthToken> {
        Err(MimirError::NotImplemented("verify_otp"))
    }

    /// `GET /auth/validate-token/`
    async fn validate_token(&self) -> Result<UserProfile> {
        Err(MimirError::NotImplemented("validate_token"))
    }

    // ===== Documents =====

    /// `GET /document-types/`
    async fn document_types(&self) -> Result<Vec<DocumentType>> {
        Err(MimirError::NotImplemented("document_types"))
    }

    /// `GET /documents/`, optionally filtered by document type
    async fn documents(&self, _document_type: Option<u64>) -> Result<Vec<Document>> {
        Err(MimirError::NotImplemented("documents"))
    }

    /// `GET /documents/:id/`
    async fn document(&self, _id: u64) -> Result<Document> {
        Err(MimirError::NotImplemented("document"))
    }

    /// `POST /documents/upload/`
    async fn upload(&self, _upload: &Upload) -> Result<Document> {
        Err(MimirError::NotImplemented("upload"))
    }

    /// `DELETE /documents/:id/`
    async fn delete_document(&self, _id: u64) -> Result<()> {
        Err(MimirError::NotImplemented("delete_document"))
    }

    /// `POST /documents/:id/retry-extraction/`
    async fn retry_extraction(&self, _id: u64) -> Result<ExtractionRetry> {
        Err(MimirError::NotImplemented("retry_extraction"))
    }

    // ===== AI features =====

    /// `POST /documents/:id/summarize/`
    async fn summarize(&self, _id: u64) -> Result<Summary> {
        Err(MimirError::NotImplemented("summarize"))
    }

    /// `POST /documents/:id/generate-quiz/`
    async fn generate_quiz(&self, _id: u64) -> Result<Quiz> {
        Err(MimirError::NotImplemented("generate_quiz"))
    }

    /// `POST /documents/:id/generate-flashcards/`
    async fn generate_flashcards(&self, _id: u64) -> Result<FlashcardDeck> {
        Err(MimirError::NotImplemented("generate_flashcards"))
    }

    /// `POST /documents/:id/qna/`
    async fn ask(&self, _id: u64, _question: &str) -> Result<Answer> {
        Err(MimirError::NotImplemented("ask"))
    }

    // ===== Search =====

    /// `POST /documents/search/`
    async fn search(&self, _query: &str) -> Result<SearchResults> {
        Err(MimirError::NotImplemented("search"))
    }

    /// `POST /documents/search/suggestions/`
    async fn suggestions(&self, _query: &str) -> Result<Suggestions> {
        Err(MimirError::NotImplemented("suggestions"))
    }
}
