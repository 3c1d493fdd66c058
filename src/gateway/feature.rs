//! Per-feature user-facing messages and the error-to-outcome mapping.
//!
//! Every gateway operation settles through [`Feature::humanize`], so retry
//! exhaustion, fallback mode, cancellation and plain failures read the same
//! way across features; only the message text differs.

use tracing::{debug, warn};

use crate::telemetry;
use crate::types::Outcome;
use crate::{MimirError, Result};

/// Message templates for one user-facing feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    /// Operation name for logs and metrics.
    pub operation: &'static str,
    /// Shown when the backend is still rate limiting after the retry.
    pub busy: String,
    /// Prefix shown when the server answered in fallback mode.
    pub fallback: String,
    /// Shown for any other failure.
    pub failure: String,
    /// Show the server's own `error` text instead of `failure` when present.
    pub server_errors: bool,
}

impl Feature {
    pub fn new(operation: &'static str, failure: impl Into<String>) -> Self {
        let failure = failure.into();
        Self {
            operation,
            busy: "Too many requests. Please wait a moment and try again.".to_string(),
            fallback: failure.clone(),
            failure,
            server_errors: false,
        }
    }

    pub fn busy(mut self, message: impl Into<String>) -> Self {
        self.busy = message.into();
        self
    }

    pub fn fallback(mut self, message: impl Into<String>) -> Self {
        self.fallback = message.into();
        self
    }

    pub fn server_errors(mut self, enabled: bool) -> Self {
        self.server_errors = enabled;
        self
    }

    pub fn summary() -> Self {
        Self::new("summarize", "Failed to generate summary. Please try again later.")
            .busy("Summary generation is in progress. Please wait a moment and try again.")
            .fallback("AI is temporarily unavailable. Using basic summary instead.")
    }

    pub fn quiz() -> Self {
        Self::new("generate_quiz", "Failed to generate quiz. Please try again later.")
            .busy("Quiz generation is in progress. Please wait a moment and try again.")
            .fallback("AI is temporarily unavailable. Using basic quiz instead.")
    }

    pub fn flashcards() -> Self {
        Self::new(
            "generate_flashcards",
            "Failed to generate flashcards. Please try again later.",
        )
        .busy("Flashcard generation is in progress. Please wait a moment and try again.")
        .fallback("AI is temporarily unavailable. Using basic flashcards instead.")
    }

    pub fn question() -> Self {
        Self::new("ask", "Sorry, I couldn't process your question. Please try again.")
            .busy("This question is already being processed. Please wait a moment and try again.")
            .fallback("AI is temporarily unavailable. Using a basic answer instead.")
    }

    pub fn search() -> Self {
        Self::new("search", "Search failed. Please try again.")
            .busy("This search is already being processed. Please wait a moment and try again.")
            .fallback("AI search is temporarily unavailable. Showing basic results instead.")
            .server_errors(true)
    }

    pub fn suggestions() -> Self {
        Self::new("suggestions", "Suggestions are unavailable right now.")
    }

    pub fn documents() -> Self {
        Self::new("list_documents", "Failed to load documents. Please try again.")
    }

    pub fn document() -> Self {
        Self::new("document", "Failed to load the document. Please try again.")
    }

    pub fn document_types() -> Self {
        Self::new("document_types", "Failed to load document types")
    }

    pub fn upload() -> Self {
        Self::new("upload", "Upload failed. Please check your file and try again.")
    }

    pub fn delete() -> Self {
        Self::new("delete_document", "There was an error deleting the document.")
    }

    pub fn extraction() -> Self {
        Self::new(
            "retry_extraction",
            "Failed to retry text extraction. Please try again later.",
        )
    }

    pub fn login() -> Self {
        Self::new("login", "Invalid credentials. Please try again.").server_errors(true)
    }

    pub fn register() -> Self {
        Self::new(
            "register",
            "Registration failed. Username or email may already exist.",
        )
    }

    pub fn verify_otp() -> Self {
        Self::new(
            "verify_otp",
            "Invalid OTP or it has expired. Please try again.",
        )
    }

    pub fn current_user() -> Self {
        Self::new("validate_token", "Failed to load your profile. Please try again.")
    }

    /// Map a settled result to what presentation code shows.
    ///
    /// Clearing the stored token on [`MimirError::AuthenticationFailed`] is
    /// the caller's job; this only picks the outcome.
    pub fn humanize<T>(&self, result: Result<T>) -> Outcome<T> {
        let error = match result {
            Ok(value) => return Outcome::Ready(value),
            Err(e) => e,
        };

        match error {
            MimirError::Cancelled => {
                debug!(operation = self.operation, "request cancelled");
                metrics::counter!(telemetry::CANCELLED_TOTAL, "operation" => self.operation)
                    .increment(1);
                Outcome::Cancelled
            }
            MimirError::Throttled | MimirError::Superseded => {
                debug!(operation = self.operation, error = %error, "request skipped");
                Outcome::Skipped
            }
            MimirError::AuthenticationFailed => Outcome::SignedOut,
            MimirError::RetryExhausted { .. } | MimirError::RateLimited { .. } => {
                warn!(operation = self.operation, error = %error, "backend still busy");
                Outcome::Notice {
                    message: self.busy.clone(),
                }
            }
            MimirError::Fallback { error: text, .. } => {
                metrics::counter!(telemetry::FALLBACKS_TOTAL, "operation" => self.operation)
                    .increment(1);
                let message = if text.is_empty() {
                    self.fallback.clone()
                } else {
                    format!("{}\n\n{}", self.fallback, text)
                };
                Outcome::Notice { message }
            }
            MimirError::Rejected { error: text, .. } if self.server_errors => {
                warn!(operation = self.operation, error = %text, "request rejected");
                Outcome::Failed { message: text }
            }
            other => {
                warn!(operation = self.operation, error = %other, "request failed");
                Outcome::Failed {
                    message: self.failure.clone(),
                }
            }
        }
    }
}

/// Message set used by a gateway; override entries to localize or reword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureMessages {
    pub summary: Feature,
    pub quiz: Feature,
    pub flashcards: Feature,
    pub question: Feature,
    pub search: Feature,
    pub suggestions: Feature,
    pub documents: Feature,
    pub document: Feature,
    pub document_types: Feature,
    pub upload: Feature,
    pub delete: Feature,
    pub extraction: Feature,
    pub login: Feature,
    pub register: Feature,
    pub verify_otp: Feature,
    pub current_user: Feature,
}

impl Default for FeatureMessages {
    fn default() -> Self {
        Self {
            summary: Feature::summary(),
            quiz: Feature::quiz(),
            flashcards: Feature::flashcards(),
            question: Feature::question(),
            search: Feature::search(),
            suggestions: Feature::suggestions(),
            documents: Feature::documents(),
            document: Feature::document(),
            document_types: Feature::document_types(),
            upload: Feature::upload(),
            delete: Feature::delete(),
            extraction: Feature::extraction(),
            login: Feature::login(),
            register: Feature::register(),
            verify_otp: Feature::verify_otp(),
            current_user: Feature::current_user(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exhausted_retry_reads_as_busy() {
        let err = MimirError::RetryExhausted {
            last: Box::new(MimirError::RateLimited { retry_after: None }),
        };
        let outcome = Feature::summary().humanize::<()>(Err(err));
        assert_eq!(
            outcome.message(),
            Some("Summary generation is in progress. Please wait a moment and try again.")
        );
        assert!(matches!(outcome, Outcome::Notice { .. }));
    }

    #[test]
    fn fallback_includes_server_text() {
        let outcome = Feature::quiz().humanize::<()>(Err(MimirError::Fallback {
            error: "Quota exceeded".into(),
            details: Some("try later".into()),
        }));
        assert_eq!(
            outcome.message(),
            Some("AI is temporarily unavailable. Using basic quiz instead.\n\nQuota exceeded")
        );
    }

    #[test]
    fn server_errors_only_where_enabled() {
        let rejected = || MimirError::Rejected {
            status: 400,
            error: "Search query must be at least 3 characters long.".into(),
        };
        assert_eq!(
            Feature::search().humanize::<()>(Err(rejected())).message(),
            Some("Search query must be at least 3 characters long.")
        );
        assert_eq!(
            Feature::summary().humanize::<()>(Err(rejected())).message(),
            Some("Failed to generate summary. Please try again later.")
        );
    }

    #[test]
    fn silent_outcomes() {
        let f = Feature::documents();
        assert_eq!(f.humanize::<()>(Err(MimirError::Cancelled)), Outcome::Cancelled);
        assert_eq!(f.humanize::<()>(Err(MimirError::Throttled)), Outcome::Skipped);
        assert_eq!(f.humanize::<()>(Err(MimirError::Superseded)), Outcome::Skipped);
        assert_eq!(
            f.humanize::<()>(Err(MimirError::AuthenticationFailed)),
            Outcome::SignedOut
        );
        assert_eq!(f.humanize(Ok(3)), Outcome::Ready(3));
    }
}
