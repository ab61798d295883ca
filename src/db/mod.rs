//! Storage layer for BioSearch-rs
//!
//! Provides:
//! - The `Store` trait: every query the route handlers and the chat
//!   assistant need, behind one seam
//! - `PgStore`: SeaORM over Postgres
//! - `MockStore`: in-memory fallback used when no database is configured
//!
//! The concrete store is selected once at process start and passed into
//! every handler through `AppState`; nothing else decides where data
//! comes from.

pub mod entities;
pub mod mock;
pub mod models;
pub mod postgres;

pub use mock::MockStore;
pub use postgres::PgStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::DatabaseConfig;
use crate::errors::AppError;
use models::{
    AnalyticsSnapshot, ChatMessageRecord, MessageRole, PublicationPage, PublicationQuery,
    ResearchMode, SessionSummary, SourceRecord,
};

#[async_trait]
pub trait Store: Send + Sync {
    /// Verify connectivity. Used by the readiness probe.
    async fn ping(&self) -> Result<(), AppError>;

    /// Ranked substring search used by the chat assistant: title matches
    /// rank above abstract matches rank above everything else, then
    /// descending publication year.
    async fn search_publications(
        &self,
        query: &str,
        limit: u64,
    ) -> Result<Vec<SourceRecord>, AppError>;

    /// Filtered, paginated listing plus the filter-population aids
    /// (research areas with counts, global year range).
    async fn list_publications(
        &self,
        query: &PublicationQuery,
    ) -> Result<PublicationPage, AppError>;

    /// Raw aggregates for the analytics dashboard.
    async fn analytics(&self) -> Result<AnalyticsSnapshot, AppError>;

    /// Insert the session if new, otherwise refresh user_mode and
    /// updated_at.
    async fn ensure_session(&self, session_id: &str, mode: ResearchMode) -> Result<(), AppError>;

    async fn log_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        sources: Option<serde_json::Value>,
    ) -> Result<(), AppError>;

    async fn session_history(
        &self,
        session_id: &str,
        limit: u64,
    ) -> Result<Vec<ChatMessageRecord>, AppError>;

    async fn clear_history(&self, session_id: &str) -> Result<(), AppError>;

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, AppError>;

    /// Remove a session and all of its messages.
    async fn delete_session(&self, session_id: &str) -> Result<(), AppError>;
}

/// Resolve the storage strategy from configuration: Postgres when a
/// connection string is present, the seeded in-memory mock otherwise.
pub async fn connect(config: &DatabaseConfig) -> Result<Arc<dyn Store>, AppError> {
    match &config.url {
        Some(_) => {
            let store = PgStore::connect(config).await?;
            tracing::info!("Connected to database");
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set - falling back to the in-memory mock store");
            Ok(Arc::new(MockStore::seeded()))
        }
    }
}
