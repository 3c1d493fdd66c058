//! Wire-level tests for the reqwest client against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use mimir::store::TOKEN_KEY;
use mimir::{HttpStudyApi, MemoryStore, MimirError, StateStore, StudyApi, Upload};

fn client(server: &MockServer, token: Option<&str>) -> (HttpStudyApi, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    if let Some(token) = token {
        store.set(TOKEN_KEY, token).unwrap();
    }
    let api = HttpStudyApi::with_base_url(format!("{}/api/", server.uri()), store.clone())
        .expect("client builds");
    (api, store)
}

fn document_json(id: u64, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "title": title,
        "uploaded_at": "2024-03-01T10:00:00Z",
        "file_size": 2048,
        "extracted_text": "Plants convert light into chemical energy.",
        "document_type": { "id": 4, "name": "Lecture notes" }
    })
}

async fn failing_summary(template: ResponseTemplate) -> MimirError {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/1/summarize/"))
        .respond_with(template)
        .mount(&server)
        .await;
    let (api, _) = client(&server, Some("abc"));
    api.summarize(1).await.unwrap_err()
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn documents_sends_token_filter_and_cache_buster() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/documents/"))
        .and(header("Authorization", "Token abc"))
        .and(query_param("document_type", "4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([document_json(1, "Photosynthesis")])),
        )
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = client(&server, Some("abc"));

    let documents = api.documents(Some(4)).await.unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].title, "Photosynthesis");
    assert_eq!(
        documents[0].document_type.as_ref().map(|t| t.name.as_str()),
        Some("Lecture notes")
    );

    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].url.query_pairs().any(|(name, _)| name == "_t"));
}

#[tokio::test]
async fn token_is_read_on_every_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/document-types/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    let (api, store) = client(&server, None);

    api.document_types().await.unwrap();
    store.set(TOKEN_KEY, "fresh").unwrap();
    api.document_types().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    assert!(!requests[0].headers.contains_key("authorization"));
    assert_eq!(requests[1].headers["authorization"], "Token fresh");
}

#[tokio::test]
async fn ask_posts_the_question() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/9/qna/"))
        .and(body_json(json!({ "question": "What is ATP?" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "question": "What is ATP?",
            "answer": "The energy currency of the cell."
        })))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = client(&server, Some("abc"));

    let answer = api.ask(9, "What is ATP?").await.unwrap();
    assert_eq!(answer.answer, "The energy currency of the cell.");
}

#[tokio::test]
async fn upload_sends_multipart_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/documents/upload/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(document_json(3, "Notes")))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = client(&server, Some("abc"));

    let upload = Upload::new("  Notes  ", "notes.txt", b"mitochondria".to_vec()).document_type(4);
    let document = api.upload(&upload).await.unwrap();
    assert_eq!(document.id, 3);

    let requests = server.received_requests().await.unwrap();
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains("name=\"title\"\r\n\r\nNotes\r\n"));
    assert!(body.contains("filename=\"notes.txt\""));
    assert!(body.contains("mitochondria"));
    assert!(body.contains("name=\"document_type_id\"\r\n\r\n4\r\n"));
}

#[tokio::test]
async fn login_parses_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/auth/token/"))
        .and(body_json(json!({ "username": "ada", "password": "secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "tok-123",
            "user_id": 7
        })))
        .mount(&server)
        .await;
    let (api, _) = client(&server, None);

    let token = api
        .login(&mimir::Credentials::new("ada", "secret"))
        .await
        .unwrap();
    assert_eq!(token.token, "tok-123");
    assert_eq!(token.user_id, Some(7));
}

// ============================================================================
// Status mapping
// ============================================================================

#[tokio::test]
async fn unauthorized_maps_to_authentication_failed() {
    let error = failing_summary(ResponseTemplate::new(401)).await;
    assert!(matches!(error, MimirError::AuthenticationFailed));
}

#[tokio::test]
async fn missing_document_maps_to_not_found() {
    let error = failing_summary(ResponseTemplate::new(404)).await;
    assert!(matches!(error, MimirError::NotFound));
}

#[tokio::test]
async fn too_many_requests_carries_retry_after() {
    let error = failing_summary(ResponseTemplate::new(429).insert_header("Retry-After", "3")).await;
    assert!(error.is_transient());
    assert_eq!(error.retry_after(), Some(Duration::from_secs(3)));
}

#[tokio::test]
async fn overloaded_in_fallback_mode_maps_to_fallback() {
    let error = failing_summary(ResponseTemplate::new(503).set_body_json(json!({
        "error": "AI service overloaded",
        "details": "queue full",
        "fallback_mode": true
    })))
    .await;
    match error {
        MimirError::Fallback { error, details } => {
            assert_eq!(error, "AI service overloaded");
            assert_eq!(details.as_deref(), Some("queue full"));
        }
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn overloaded_without_fallback_mode_is_rejected() {
    let error = failing_summary(
        ResponseTemplate::new(503).set_body_json(json!({ "error": "maintenance" })),
    )
    .await;
    assert!(matches!(
        error,
        MimirError::Rejected { status: 503, ref error } if error == "maintenance"
    ));
}

#[tokio::test]
async fn server_error_without_body_maps_to_api_error() {
    let error = failing_summary(ResponseTemplate::new(500)).await;
    assert!(matches!(error, MimirError::Api { status: 500, .. }));
    assert!(!error.is_transient());
}
