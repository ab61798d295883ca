//! End-to-end tests against the assembled router, driven through
//! tower's oneshot without binding a socket.
//!
//! External source URLs point at an unroutable address so every run
//! exercises the degraded path deterministically.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use async_trait::async_trait;
use biosearch_rs::config::SourcesConfig;
use biosearch_rs::db::models::{
    AnalyticsSnapshot, ChatMessageRecord, MessageRole, PublicationPage, PublicationQuery,
    ResearchMode, SessionSummary, SourceRecord,
};
use biosearch_rs::db::{MockStore, Store};
use biosearch_rs::errors::AppError;
use biosearch_rs::routes;
use biosearch_rs::services::AppState;

/// Seeded catalog behind a session table that always fails to write.
struct SessionlessStore(MockStore);

#[async_trait]
impl Store for SessionlessStore {
    async fn ping(&self) -> Result<(), AppError> {
        self.0.ping().await
    }

    async fn search_publications(
        &self,
        query: &str,
        limit: u64,
    ) -> Result<Vec<SourceRecord>, AppError> {
        self.0.search_publications(query, limit).await
    }

    async fn list_publications(
        &self,
        query: &PublicationQuery,
    ) -> Result<PublicationPage, AppError> {
        self.0.list_publications(query).await
    }

    async fn analytics(&self) -> Result<AnalyticsSnapshot, AppError> {
        self.0.analytics().await
    }

    async fn ensure_session(
        &self,
        _session_id: &str,
        _mode: ResearchMode,
    ) -> Result<(), AppError> {
        Err(AppError::DatabaseConnectionError(
            "connection pool exhausted".to_string(),
        ))
    }

    async fn log_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        sources: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        self.0.log_message(session_id, role, content, sources).await
    }

    async fn session_history(
        &self,
        session_id: &str,
        limit: u64,
    ) -> Result<Vec<ChatMessageRecord>, AppError> {
        self.0.session_history(session_id, limit).await
    }

    async fn clear_history(&self, session_id: &str) -> Result<(), AppError> {
        self.0.clear_history(session_id).await
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, AppError> {
        self.0.list_sessions().await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        self.0.delete_session(session_id).await
    }
}

fn app(store: Arc<dyn Store>) -> Router {
    let sources = SourcesConfig {
        images_api_url: "http://127.0.0.1:1".to_string(),
        techport_api_url: "http://127.0.0.1:1".to_string(),
        nasa_api_key: None,
        wikipedia_search_url: "http://127.0.0.1:1/w/api.php".to_string(),
        wikipedia_summary_url: "http://127.0.0.1:1/api/rest_v1".to_string(),
    };
    routes::api_router(AppState::new(store, sources))
}

fn seeded_app() -> Router {
    app(Arc::new(MockStore::seeded()))
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn post_json(app: Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let response = app
        .oneshot(
            Request::post(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn health_endpoints_respond() {
    let (status, body) = get_json(seeded_app(), "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = get_json(seeded_app(), "/readiness").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"]["status"], "healthy");
}

#[tokio::test]
async fn publications_listing_filters_and_paginates() {
    let (status, body) = get_json(seeded_app(), "/publications?search=microgravity").await;
    assert_eq!(status, StatusCode::OK);

    let total = body["pagination"]["total"].as_u64().unwrap();
    assert!(total > 0);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 12);
    assert_eq!(
        body["publications"].as_array().unwrap().len() as u64,
        total.min(12)
    );

    // Newest first
    let years: Vec<i64> = body["publications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["publication_year"].as_i64().unwrap())
        .collect();
    let mut sorted = years.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(years, sorted);

    // Filter metadata accompanies every page
    assert!(!body["filters"]["researchAreas"].as_array().unwrap().is_empty());
    assert_eq!(body["filters"]["yearRange"]["min_year"], 2020);
    assert_eq!(body["filters"]["yearRange"]["max_year"], 2024);
}

#[tokio::test]
async fn identical_listing_requests_are_idempotent() {
    let uri = "/publications?search=bone&yearFrom=2020&yearTo=2024";
    let (_, first) = get_json(seeded_app(), uri).await;
    let (_, second) = get_json(seeded_app(), uri).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn inverted_year_range_returns_empty_page() {
    let (status, body) = get_json(seeded_app(), "/publications?yearFrom=2024&yearTo=2020").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 0);
    assert!(body["publications"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn analytics_document_has_the_fixed_shape() {
    let (status, body) = get_json(seeded_app(), "/analytics").await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["overview"]["totalPublications"], 12);
    assert_eq!(body["overview"]["averageYear"], 2022);
    assert!(body["overview"]["totalAreas"].as_i64().unwrap() >= 4);

    let by_year = body["charts"]["publicationsByYear"].as_array().unwrap();
    let years: Vec<i64> = by_year.iter().map(|y| y["year"].as_i64().unwrap()).collect();
    assert_eq!(years, vec![2020, 2021, 2022, 2023, 2024]);

    // Gap areas feed the under-researched trend list
    let gaps = body["insights"]["researchGaps"].as_array().unwrap();
    assert!(gaps.iter().all(|g| g["publicationCount"].as_i64().unwrap() <= 3));
    let under = body["insights"]["trends"]["underResearched"]
        .as_array()
        .unwrap();
    assert!(under.len() <= 5);
    assert_eq!(
        body["insights"]["trends"]["growingAreas"]
            .as_array()
            .unwrap()
            .len(),
        3
    );
}

#[tokio::test]
async fn chat_requires_message_and_session_id() {
    let (status, body) = post_json(
        seeded_app(),
        "/chat",
        json!({"sessionId": "s1", "mode": "student"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Message is required");

    let (status, body) = post_json(
        seeded_app(),
        "/chat",
        json!({"message": "bone density", "mode": "student"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Session ID is required");
}

#[tokio::test]
async fn chat_with_no_matches_apologizes_and_suggests_rephrasing() {
    let empty = app(Arc::new(MockStore::empty()));
    let (status, body) = post_json(
        empty,
        "/chat",
        json!({"message": "bone density", "sessionId": "s1", "mode": "student"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["response"]
        .as_str()
        .unwrap()
        .starts_with("I couldn't find NASA sources matching \"bone density\""));
    assert!(body["sources"].as_array().unwrap().is_empty());
    assert_eq!(body["suggestions"].as_array().unwrap().len(), 2);
    assert_eq!(body["mode"], "student");
    assert_eq!(body["sessionId"], "s1");
}

#[tokio::test]
async fn chat_merges_local_results_with_bounded_distinct_sources() {
    let (status, body) = post_json(
        seeded_app(),
        "/chat",
        json!({"message": "microgravity", "sessionId": "s2", "mode": "scientist"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["response"]
        .as_str()
        .unwrap()
        .starts_with("Technical summary for \"microgravity\":"));

    let sources = body["sources"].as_array().unwrap();
    assert!(!sources.is_empty());
    assert!(sources.len() <= 5);

    let keys: std::collections::HashSet<&str> = sources
        .iter()
        .map(|s| s["nasa_publication_id"].as_str().unwrap())
        .collect();
    assert_eq!(keys.len(), sources.len());

    assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn chat_empty_message_falls_back_to_greeting() {
    let (status, body) = post_json(
        seeded_app(),
        "/chat",
        json!({"message": "   ", "sessionId": "s3"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // "Hello" matches nothing in the catalog and the external sources
    // are unreachable, so the apology names the substituted query
    assert!(body["response"]
        .as_str()
        .unwrap()
        .contains("\"Hello\""));
}

#[tokio::test]
async fn chat_get_variant_defaults_everything() {
    let (status, body) = get_json(seeded_app(), "/chat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], "scientist");
    assert!(body["sessionId"].as_str().unwrap().starts_with("anon-"));
}

#[tokio::test]
async fn chat_get_still_searches_when_session_upsert_fails() {
    let router = app(Arc::new(SessionlessStore(MockStore::seeded())));
    let (status, body) = get_json(
        router,
        "/chat?message=microgravity&sessionId=s9&mode=scientist",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    // The session write failure is swallowed; the catalog search still
    // produces a live answer rather than a canned body
    assert!(body["response"]
        .as_str()
        .unwrap()
        .starts_with("Technical summary for \"microgravity\":"));
    assert!(!body["sources"].as_array().unwrap().is_empty());
    assert_eq!(body["sessionId"], "s9");
}

#[tokio::test]
async fn history_requires_session_id() {
    let (status, body) = get_json(seeded_app(), "/chat/history").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "Session ID is required");
}

#[tokio::test]
async fn history_is_empty_without_a_database() {
    let (status, body) = get_json(seeded_app(), "/chat/history?sessionId=s1").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn clearing_history_reports_success() {
    let response = seeded_app()
        .oneshot(
            Request::delete("/chat/history?sessionId=s1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["message"], "Chat history cleared");
}

#[tokio::test]
async fn sessions_list_and_delete() {
    let (status, body) = get_json(seeded_app(), "/chat/sessions").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["sessions"].as_array().unwrap().is_empty());

    let response = seeded_app()
        .oneshot(
            Request::delete("/chat/sessions?sessionId=s1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["success"], true);

    let response = seeded_app()
        .oneshot(
            Request::delete("/chat/sessions")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
