//! reqwest implementation of [`StudyApi`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::{debug, trace};

use super::StudyApi;
use crate::store::{StateStore, TOKEN_KEY};
use crate::types::{
    Answer, AuthToken, Credentials, Document, DocumentType, ExtractionRetry, FlashcardDeck,
    OtpVerification, Quiz, Registration, SearchResults, Suggestions, Summary, Upload, UserProfile,
};
use crate::{MimirError, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for the study-companion REST API.
///
/// The auth token is read from the [`StateStore`] on every request, so a
/// login or sign-out elsewhere takes effect immediately.
pub struct HttpStudyApi {
    http: Client,
    base_url: String,
    store: Arc<dyn StateStore>,
}

impl HttpStudyApi {
    /// Client for `base_url` with the default 60s timeout.
    pub fn with_base_url(base_url: impl Into<String>, store: Arc<dyn StateStore>) -> Result<Self> {
        Self::new(base_url, DEFAULT_TIMEOUT, store)
    }

    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        store: Arc<dyn StateStore>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| MimirError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.store.get(TOKEN_KEY) {
            Some(token) => request.header("Authorization", format!("Token {token}")),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = self.authorize(request).send().await?;
        trace!(url = %response.url(), status = %response.status(), "response");
        check_status(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.send(self.http.get(self.url(path))).await?;
        Ok(response.json().await?)
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = self.send(request).await?;
        Ok(response.json().await?)
    }
}

/// Error body written by the backend on non-success responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
    #[serde(default)]
    fallback_mode: bool,
}

/// Check response status and map to appropriate error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status.as_u16() {
        401 => Err(MimirError::AuthenticationFailed),
        404 => Err(MimirError::NotFound),
        429 => {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .map(Duration::from_secs);
            Err(MimirError::RateLimited { retry_after })
        }
        code => {
            let body: ErrorBody = response.json().await.unwrap_or_default();
            debug!(status = code, error = ?body.error, "request failed");
            match body {
                ErrorBody {
                    fallback_mode: true,
                    error,
                    details,
                } if code == 503 => Err(MimirError::Fallback {
                    error: error.unwrap_or_default(),
                    details,
                }),
                ErrorBody {
                    error: Some(error), ..
                } if !error.is_empty() => Err(MimirError::Rejected {
                    status: code,
                    error,
                }),
                _ => Err(MimirError::Api {
                    status: code,
                    message: status.canonical_reason().unwrap_or("unknown status").to_string(),
                }),
            }
        }
    }
}

#[async_trait]
impl StudyApi for HttpStudyApi {
    fn name(&self) -> &str {
        "http"
    }

    async fn login(&self, credentials: &Credentials) -> Result<AuthToken> {
        let response = self
            .send(self.http.post(self.url("/auth/token/")).json(credentials))
            .await?;
        Ok(response.json().await?)
    }

    async fn register(&self, registration: &Registration) -> Result<()> {
        self.send(self.http.post(self.url("/auth/register/")).json(registration))
            .await?;
        Ok(())
    }

    async fn verify_otp(&self, verification: &OtpVerification) -> Result<AuthToken> {
        let response = self
            .send(self.http.post(self.url("/auth/verify-otp/")).json(verification))
            .await?;
        Ok(response.json().await?)
    }

    async fn validate_token(&self) -> Result<UserProfile> {
        self.get_json("/auth/validate-token/").await
    }

    async fn document_types(&self) -> Result<Vec<DocumentType>> {
        self.get_json("/document-types/").await
    }

    async fn documents(&self, document_type: Option<u64>) -> Result<Vec<Document>> {
        // `_t` defeats intermediary HTTP caches; freshness is managed client-side.
        let mut query = vec![("_t", chrono::Utc::now().timestamp_millis().to_string())];
        if let Some(id) = document_type {
            query.push(("document_type", id.to_string()));
        }
        let response = self
            .send(self.http.get(self.url("/documents/")).query(&query))
            .await?;
        Ok(response.json().await?)
    }

    async fn document(&self, id: u64) -> Result<Document> {
        self.get_json(&format!("/documents/{id}/")).await
    }

    async fn upload(&self, upload: &Upload) -> Result<Document> {
        let file = Part::bytes(upload.bytes.clone()).file_name(upload.file_name.clone());
        let mut form = Form::new()
            .text("title", upload.title.trim().to_string())
            .part("file", file);
        if let Some(id) = upload.document_type_id {
            form = form.text("document_type_id", id.to_string());
        }
        let response = self
            .send(self.http.post(self.url("/documents/upload/")).multipart(form))
            .await?;
        Ok(response.json().await?)
    }

    async fn delete_document(&self, id: u64) -> Result<()> {
        self.send(self.http.delete(self.url(&format!("/documents/{id}/"))))
            .await?;
        Ok(())
    }

    async fn retry_extraction(&self, id: u64) -> Result<ExtractionRetry> {
        self.post_json(&format!("/documents/{id}/retry-extraction/"), None)
            .await
    }

    async fn summarize(&self, id: u64) -> Result<Summary> {
        self.post_json(&format!("/documents/{id}/summarize/"), None)
            .await
    }

    async fn generate_quiz(&self, id: u64) -> Result<Quiz> {
        self.post_json(&format!("/documents/{id}/generate-quiz/"), None)
            .await
    }

    async fn generate_flashcards(&self, id: u64) -> Result<FlashcardDeck> {
        self.post_json(&format!("/documents/{id}/generate-flashcards/"), None)
            .await
    }

    async fn ask(&self, id: u64, question: &str) -> Result<Answer> {
        self.post_json(
            &format!("/documents/{id}/qna/"),
            Some(json!({ "question": question })),
        )
        .await
    }

    async fn search(&self, query: &str) -> Result<SearchResults> {
        self.post_json("/documents/search/", Some(json!({ "query": query })))
            .await
    }

    async fn suggestions(&self, query: &str) -> Result<Suggestions> {
        self.post_json(
            "/documents/search/suggestions/",
            Some(json!({ "query": query })),
        )
        .await
    }
}
