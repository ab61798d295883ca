//! The result aggregator behind the chat endpoints.
//!
//! Given a free-text query it fans out to the local store and the
//! external NASA sources concurrently, merges and deduplicates the
//! candidates, renders a mode-framed textual reply, and best-effort
//! logs the exchange. It never fails outward: every internal error
//! degrades to an empty source list or a swallowed write.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use serde_json::json;

use crate::config::SourcesConfig;
use crate::db::models::{MessageRole, ResearchMode, SourceRecord};
use crate::db::Store;
use crate::errors::AppError;
use crate::sources::{NasaImagesClient, TechportClient, WikipediaClient};

/// Default and maximum number of merged sources per reply.
pub const DEFAULT_SOURCE_LIMIT: usize = 5;

pub struct AssistantService {
    store: Arc<dyn Store>,
    images: NasaImagesClient,
    techport: TechportClient,
    wikipedia: WikipediaClient,
}

/// Everything a chat handler needs to shape its response body.
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub response: String,
    pub sources: Vec<SourceRecord>,
    pub suggestions: Vec<String>,
}

impl AssistantService {
    pub fn new(store: Arc<dyn Store>, config: SourcesConfig, http: reqwest::Client) -> Self {
        Self {
            store,
            images: NasaImagesClient::new(http.clone(), config.images_api_url),
            techport: TechportClient::new(http.clone(), config.techport_api_url, config.nasa_api_key),
            wikipedia: WikipediaClient::new(
                http,
                config.wikipedia_search_url,
                config.wikipedia_summary_url,
            ),
        }
    }

    /// Run one full chat turn: gather, render, log, suggest.
    pub async fn respond(
        &self,
        query: &str,
        mode: ResearchMode,
        limit: usize,
        session_id: &str,
    ) -> ChatOutcome {
        let sources = self.gather(query, limit).await;
        let response = render_reply(query, &sources, mode);
        self.log_exchange(session_id, query, &response, &sources).await;

        metrics::counter!("biosearch_chat_turns_total").increment(1);

        ChatOutcome {
            suggestions: suggestions_for(&sources),
            response,
            sources,
        }
    }

    /// Concurrent fan-out with per-source failure absorption, fixed
    /// concatenation order (local, images, techport, wikipedia), dedup,
    /// and truncation to `limit`.
    async fn gather(&self, query: &str, limit: usize) -> Vec<SourceRecord> {
        let local = async {
            match self.store.search_publications(query, limit as u64).await {
                Ok(records) => records,
                Err(error) => {
                    tracing::warn!(%error, "local publication search failed, treating as empty");
                    Vec::new()
                }
            }
        };
        let images = absorb("nasa-images", self.images.search(query, limit));
        let techport = absorb("techport", self.techport.search(query, limit));

        // Awaited jointly; completion order never affects merge order
        let (local, images, techport) = tokio::join!(local, images, techport);

        let mut combined = local;
        combined.extend(images);
        combined.extend(techport);

        // Encyclopedia lookup is a last resort only
        if combined.is_empty() {
            combined = absorb("wikipedia", self.wikipedia.summary(query)).await;
        }

        dedup_and_truncate(combined, limit)
    }

    /// Persist both halves of the exchange. Failures are logged and
    /// swallowed so a successful chat response is never masked by a
    /// write error.
    async fn log_exchange(
        &self,
        session_id: &str,
        query: &str,
        response: &str,
        sources: &[SourceRecord],
    ) {
        if let Err(error) = self
            .store
            .log_message(session_id, MessageRole::User, query, None)
            .await
        {
            tracing::warn!(%error, session_id, "failed to log user message");
        }

        let condensed = json!(sources
            .iter()
            .map(|record| json!({
                "id": record.id,
                "nasa_id": record.nasa_publication_id,
                "title": record.title,
                "url": record.url,
            }))
            .collect::<Vec<_>>());

        if let Err(error) = self
            .store
            .log_message(session_id, MessageRole::Assistant, response, Some(condensed))
            .await
        {
            tracing::warn!(%error, session_id, "failed to log assistant message");
        }
    }
}

/// Convert any source failure into an empty result so one slow or broken
/// collaborator never blocks the others.
async fn absorb<F>(source: &str, lookup: F) -> Vec<SourceRecord>
where
    F: Future<Output = Result<Vec<SourceRecord>, AppError>>,
{
    match lookup.await {
        Ok(records) => records,
        Err(error) => {
            tracing::warn!(source, %error, "external source failed, treating as empty");
            Vec::new()
        }
    }
}

/// First occurrence wins; the key is the external/native identifier when
/// present, else the title. Records lacking both are dropped.
fn dedup_and_truncate(records: Vec<SourceRecord>, limit: usize) -> Vec<SourceRecord> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    for record in records {
        if kept.len() >= limit {
            break;
        }
        let Some(key) = record.dedup_key() else {
            continue;
        };
        if seen.insert(key) {
            kept.push(record);
        }
    }
    kept
}

fn render_reply(query: &str, records: &[SourceRecord], mode: ResearchMode) -> String {
    if records.is_empty() {
        return format!(
            "I couldn't find NASA sources matching \"{query}\" right now. \
             Try rephrasing or broadening your query."
        );
    }

    let budget = mode.abstract_budget();
    let entries = records
        .iter()
        .enumerate()
        .map(|(index, record)| format_entry(index, record, budget))
        .collect::<Vec<_>>()
        .join("\n\n");

    match mode {
        ResearchMode::Student => format!(
            "In simple terms, here are NASA resources about \"{query}\":\n\n{entries}\n\n\
             Tell me if you want a kid-friendly explanation or pictures."
        ),
        ResearchMode::Scientist => format!(
            "Technical summary for \"{query}\":\n\n{entries}\n\n\
             I can cross-compare methodologies, extract metrics, or suggest analyses."
        ),
        ResearchMode::Manager | ResearchMode::Researcher => format!(
            "Executive summary for \"{query}\":\n\n{entries}\n\n\
             Ask for key takeaways or a short brief you can share."
        ),
    }
}

fn format_entry(index: usize, record: &SourceRecord, budget: usize) -> String {
    let mut entry = format!("{}. {}", index + 1, record.title);

    if let Some(year) = record.publication_year {
        entry.push_str(&format!(" ({year})"));
    }
    if let Some(nasa_id) = record
        .nasa_publication_id
        .as_deref()
        .filter(|id| !id.is_empty())
    {
        entry.push_str(&format!(" [{nasa_id}]"));
    }
    if let Some(text) = record.abstract_text.as_deref().filter(|t| !t.is_empty()) {
        let excerpt: String = text.chars().take(budget).collect();
        let marker = if text.chars().count() > budget { "…" } else { "" };
        entry.push_str(&format!("\nSummary: {excerpt}{marker}"));
    }
    if let Some(url) = record.url.as_deref() {
        entry.push_str(&format!("\nLink: {url}"));
    }

    entry
}

/// Follow-ups conditioned only on whether anything was found.
fn suggestions_for(records: &[SourceRecord]) -> Vec<String> {
    if records.is_empty() {
        vec![
            "Try rephrasing your question or using different keywords".to_string(),
            "Ask about a broader research area".to_string(),
        ]
    } else {
        vec![
            "Show me related studies".to_string(),
            "Compare findings across different years".to_string(),
            "Generate a visualization of the results".to_string(),
        ]
    }
}
