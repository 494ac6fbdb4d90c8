//! Integration tests for the Doubt Resolution Agent

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
use doubt_resolution::client::{
    DocumentStore, GenerativeClient, InMemoryStore, StaticCredentials,
};
use doubt_resolution::contracts::{IncomingQuestion, ResolutionPath};
use doubt_resolution::engine::{
    CannedCatalog, DoubtResolver, EXAM_MODE_MESSAGE, GENERATIVE_CITATIONS,
};
use doubt_resolution::error::GenerationError;
use doubt_resolution::{create_router, AgentConfig, AppState};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Generator that answers with a fixed text and counts calls
#[derive(Debug)]
struct FixedGenerator {
    reply: String,
    calls: AtomicUsize,
}

impl FixedGenerator {
    fn new(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: reply.to_string(),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeClient for FixedGenerator {
    async fn generate(
        &self,
        _api_key: &str,
        _model_id: &str,
        _prompt: &str,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

fn exam_mode(store: &InMemoryStore, enabled: bool) {
    store.set(
        "system",
        "settings",
        json!({ "exam_mode": enabled }).as_object().cloned().unwrap(),
    );
}

fn resolver(store: Arc<InMemoryStore>, generator: Arc<FixedGenerator>) -> DoubtResolver {
    DoubtResolver::new(
        store,
        generator,
        Arc::new(StaticCredentials::new("GOOGLE_API_KEY", Some("test-key".into()))),
        Arc::new(CannedCatalog::embedded().unwrap()),
    )
}

fn ask(text: &str) -> IncomingQuestion {
    IncomingQuestion::new("student_42", text)
}

#[tokio::test]
async fn test_keyword_override_when_exam_mode_off() {
    let store = Arc::new(InMemoryStore::new());
    exam_mode(&store, false);
    let generator = FixedGenerator::new("unused");
    let resolver = resolver(store, generator.clone());

    let result = resolver.resolve(&ask("What are the layers of OSI?")).await;

    assert_eq!(result.path, ResolutionPath::Keyword);
    assert_eq!(result.citations, vec!["Networking Standards", "ISO Model"]);
    assert_eq!(
        result.answer_text,
        CannedCatalog::embedded().unwrap().keyword_overrides()[0].body
    );
    assert!(result.answer_text.starts_with("\n📡 **Explain the OSI Model**"));
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_exam_mode_blocks_every_question() {
    let store = Arc::new(InMemoryStore::new());
    exam_mode(&store, true);
    let generator = FixedGenerator::new("unused");
    let resolver = resolver(store, generator.clone());

    for text in [
        "osi model",
        "Help me understand recursion",
        "what time is it",
        "",
    ] {
        let result = resolver.resolve(&ask(text)).await;
        assert_eq!(result.path, ResolutionPath::ExamMode);
        assert_eq!(result.answer_text, EXAM_MODE_MESSAGE);
        assert!(result.citations.is_empty());
    }
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_exact_and_padded_canned_keys() {
    let store = Arc::new(InMemoryStore::new());
    let generator = FixedGenerator::new("unused");
    let resolver = resolver(store, generator.clone());

    let exact = resolver
        .resolve(&ask("What is the difference between TCP and UDP?"))
        .await;
    assert_eq!(exact.path, ResolutionPath::Canned);
    assert_eq!(exact.match_score, Some(100));

    let padded = resolver
        .resolve(&ask("  what is the DIFFERENCE between tcp and udp, please?  "))
        .await;
    assert_eq!(padded.path, ResolutionPath::Canned);
    assert_eq!(padded.answer_text, exact.answer_text);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_unrelated_question_uses_generator() {
    let store = Arc::new(InMemoryStore::new());
    let generator = FixedGenerator::new("It is always tea time.");
    let resolver = resolver(store, generator.clone());

    let result = resolver.resolve(&ask("what time is it")).await;

    assert_eq!(result.path, ResolutionPath::Generative);
    assert_eq!(result.answer_text, "It is always tea time.");
    assert_eq!(result.citations, GENERATIVE_CITATIONS.to_vec());
    assert!(result.match_score.unwrap_or(0) < 80);
    assert_eq!(generator.calls(), 1);
}

#[tokio::test]
async fn test_non_generative_answers_are_idempotent() {
    let store = Arc::new(InMemoryStore::new());
    let resolver = resolver(store, FixedGenerator::new("unused"));

    for text in ["osi", "Explain Big O notation with examples"] {
        let first = resolver.resolve(&ask(text)).await;
        let second = resolver.resolve(&ask(text)).await;
        assert_eq!(first, second);
    }
}

#[tokio::test]
async fn test_missing_credential_answer() {
    let resolver = DoubtResolver::new(
        Arc::new(InMemoryStore::new()),
        FixedGenerator::new("unused"),
        Arc::new(StaticCredentials::missing("GOOGLE_API_KEY")),
        Arc::new(CannedCatalog::embedded().unwrap()),
    );

    let result = resolver.resolve(&ask("what time is it")).await;

    assert_eq!(result.path, ResolutionPath::MissingCredential);
    assert_eq!(
        result.answer_text,
        "Error: GOOGLE_API_KEY not found in environment variables."
    );
    assert!(result.citations.is_empty());
}

#[tokio::test]
async fn test_store_failure_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let store = doubt_resolution::client::FirestoreClient::new(
        doubt_resolution::client::FirestoreConfig::new("manan-test").with_base_url(server.uri()),
    )
    .unwrap();
    assert!(store.get("system", "settings").await.is_err());

    let resolver = DoubtResolver::new(
        Arc::new(store),
        FixedGenerator::new("unused"),
        Arc::new(StaticCredentials::missing("GOOGLE_API_KEY")),
        Arc::new(CannedCatalog::embedded().unwrap()),
    );

    let result = resolver.resolve(&ask("osi")).await;
    assert_eq!(result.path, ResolutionPath::Keyword);
}

#[tokio::test]
async fn test_end_to_end_with_firestore_and_gemini() {
    let firestore = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/v1/projects/manan-test/databases/(default)/documents/system/settings",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/manan-test/databases/(default)/documents/system/settings",
            "fields": {
                "exam_mode": { "booleanValue": false },
                "attendance_threshold": { "integerValue": "70" }
            }
        })))
        .mount(&firestore)
        .await;

    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "e2e-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "Clocks measure time." }] }
            }]
        })))
        .expect(1)
        .mount(&gemini)
        .await;

    std::env::set_var("DOUBT_E2E_GEMINI_KEY", "e2e-key");
    let config = AgentConfig {
        firestore_project: Some("manan-test".to_string()),
        firestore_base_url: firestore.uri(),
        gemini_base_url: gemini.uri(),
        api_key_var: "DOUBT_E2E_GEMINI_KEY".to_string(),
        ..AgentConfig::default()
    };
    let router = create_router(Arc::new(AppState::from_config(&config).unwrap()));

    let request = Request::builder()
        .method("POST")
        .uri("/solve-doubt")
        .header(CONTENT_TYPE, "application/json")
        .body(Body::from(
            json!({ "student_id": "s9", "question_text": "what time is it" }).to_string(),
        ))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
            .unwrap();
    assert_eq!(
        body,
        json!({
            "answer": "Clocks measure time.",
            "citations": ["General Knowledge", "Gemini Model"]
        })
    );

    let request = Request::builder()
        .uri("/admin/settings")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap())
            .unwrap();
    assert_eq!(body["status"], json!("success"));
    assert_eq!(body["settings"]["attendance_threshold"], json!(70.0));
    assert_eq!(body["settings"]["exam_mode"], json!(false));
}

#[tokio::test]
async fn test_upstream_failure_is_reported_in_answer() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted", "status": "RESOURCE_EXHAUSTED" }
        })))
        .mount(&gemini)
        .await;

    std::env::set_var("DOUBT_E2E_FAILING_KEY", "k");
    let config = AgentConfig {
        gemini_base_url: gemini.uri(),
        api_key_var: "DOUBT_E2E_FAILING_KEY".to_string(),
        ..AgentConfig::default()
    };
    let state = AppState::from_config(&config).unwrap();

    let result = state.resolver.resolve(&ask("what time is it")).await;

    assert_eq!(result.path, ResolutionPath::UpstreamFailure);
    assert!(result
        .answer_text
        .starts_with("Error processing request: "));
    assert!(result.answer_text.contains("Resource has been exhausted"));
    assert!(result.citations.is_empty());
}
