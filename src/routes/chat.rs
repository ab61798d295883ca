//! Chat endpoints: the assistant turn itself plus session history and
//! session management.
//!
//! The POST handler validates its two required fields up front; after
//! validation it never reports failure, degrading to a canned fallback
//! body instead so the conversational UI always has something to show.

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::db::models::{ChatMessageRecord, ResearchMode, SessionSummary, SourceRecord};
use crate::errors::AppError;
use crate::services::assistant::DEFAULT_SOURCE_LIMIT;
use crate::services::AppState;

const DEFAULT_HISTORY_LIMIT: u64 = 50;

/// Shared by the POST body and the GET query string; the handlers
/// differ only in which fields they require.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub mode: ResearchMode,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub sources: Vec<SourceRecord>,
    pub suggestions: Vec<String>,
    pub mode: &'static str,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

pub async fn post_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = request
        .message
        .ok_or_else(|| AppError::MissingField("Message".to_string()))?;
    let session_id = request
        .session_id
        .ok_or_else(|| AppError::MissingField("Session ID".to_string()))?;

    // An empty message is tolerated with a generic greeting
    let message = if message.trim().is_empty() {
        "Hello".to_string()
    } else {
        message
    };

    if let Err(error) = state.store.ensure_session(&session_id, request.mode).await {
        tracing::error!(%error, session_id, "chat turn failed, serving fallback body");
        return Ok(Json(post_fallback()));
    }

    let outcome = state
        .assistant
        .respond(&message, request.mode, DEFAULT_SOURCE_LIMIT, &session_id)
        .await;

    Ok(Json(ChatResponse {
        response: outcome.response,
        sources: outcome.sources,
        suggestions: outcome.suggestions,
        mode: request.mode.as_str(),
        session_id,
    }))
}

/// Query-string variant kept for quick manual poking; every field is
/// optional and defaulted.
pub async fn get_chat(
    State(state): State<AppState>,
    Query(params): Query<ChatRequest>,
) -> Json<ChatResponse> {
    let message = params
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| "Hello".to_string());
    let session_id = params.session_id.unwrap_or_else(anon_session_id);

    // Session bookkeeping is best-effort here; the search still runs
    // even when the store cannot record the session
    if let Err(error) = state.store.ensure_session(&session_id, params.mode).await {
        tracing::warn!(%error, session_id, "session upsert failed, continuing without persistence");
    }

    let outcome = state
        .assistant
        .respond(&message, params.mode, DEFAULT_SOURCE_LIMIT, &session_id)
        .await;

    Json(ChatResponse {
        response: outcome.response,
        sources: outcome.sources,
        suggestions: outcome.suggestions,
        mode: params.mode.as_str(),
        session_id,
    })
}

fn anon_session_id() -> String {
    format!("anon-{}", Utc::now().timestamp_millis())
}

fn post_fallback() -> ChatResponse {
    ChatResponse {
        response: "I ran into a hiccup, but here is a quick helpful summary: \
                   please try rephrasing or ask another question while I stabilize."
            .to_string(),
        sources: Vec::new(),
        suggestions: vec![
            "Try rephrasing your question".to_string(),
            "Ask for a short summary".to_string(),
            "Ask for related studies".to_string(),
        ],
        mode: ResearchMode::Scientist.as_str(),
        session_id: anon_session_id(),
    }
}

// ========================================================================
// History
// ========================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatMessageRecord>,
}

pub async fn get_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<HistoryResponse>, AppError> {
    let session_id = params
        .session_id
        .ok_or_else(|| AppError::MissingField("Session ID".to_string()))?;
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);

    let messages = state.store.session_history(&session_id, limit).await?;
    Ok(Json(HistoryResponse { messages }))
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub message: &'static str,
}

pub async fn delete_history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<ClearedResponse>, AppError> {
    let session_id = params
        .session_id
        .ok_or_else(|| AppError::MissingField("Session ID".to_string()))?;

    state.store.clear_history(&session_id).await?;
    Ok(Json(ClearedResponse {
        message: "Chat history cleared",
    }))
}

// ========================================================================
// Sessions
// ========================================================================

#[derive(Debug, Deserialize)]
pub struct SessionParams {
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<SessionSummary>,
}

pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionsResponse>, AppError> {
    let sessions = state.store.list_sessions().await?;
    Ok(Json(SessionsResponse { sessions }))
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub success: bool,
}

pub async fn delete_session(
    State(state): State<AppState>,
    Query(params): Query<SessionParams>,
) -> Result<Json<DeletedResponse>, AppError> {
    let session_id = params
        .session_id
        .ok_or_else(|| AppError::MissingField("Session ID".to_string()))?;

    state.store.delete_session(&session_id).await?;
    Ok(Json(DeletedResponse { success: true }))
}
