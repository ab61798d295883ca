//! Domain types shared by the Postgres and mock store implementations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Caller-selected response framing for the chat assistant.
///
/// Controls only the verbosity of the generated text, never which
/// sources get queried. Unknown values fall back to `researcher`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchMode {
    Student,
    #[default]
    Scientist,
    Manager,
    #[serde(other)]
    Researcher,
}

impl ResearchMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Scientist => "scientist",
            Self::Manager => "manager",
            Self::Researcher => "researcher",
        }
    }

    /// Character budget for abstract excerpts in the templated reply.
    pub fn abstract_budget(&self) -> usize {
        match self {
            Self::Student => 180,
            Self::Scientist => 420,
            Self::Manager | Self::Researcher => 240,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Identifier of a merged search record: database rows carry integer ids,
/// externally synthesized records carry string tags (`nasa-image-…`,
/// `techport-…`, `wiki-…`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SourceId {
    Id(i64),
    Tag(String),
}

/// A publication-like record as merged by the chat assistant. Stored rows
/// and external pseudo-publications share this shape; external records are
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct SourceRecord {
    pub id: SourceId,
    pub title: String,
    pub authors: Option<String>,
    pub publication_year: Option<i32>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub results: Option<String>,
    pub conclusion: Option<String>,
    pub nasa_publication_id: Option<String>,
    pub research_area: Option<String>,
    pub keywords: Vec<String>,
    pub url: Option<String>,
}

impl SourceRecord {
    /// Dedup key: non-empty nasa_publication_id, else non-empty title.
    /// Records with neither are unusable and get dropped during merge.
    pub fn dedup_key(&self) -> Option<String> {
        self.nasa_publication_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .map(str::to_owned)
            .or_else(|| (!self.title.is_empty()).then(|| self.title.clone()))
    }
}

/// One catalogued publication as returned by the listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct Publication {
    pub id: i32,
    pub title: String,
    pub authors: Option<String>,
    pub publication_year: Option<i32>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub research_area: Option<String>,
    pub keywords: Vec<String>,
    pub nasa_publication_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Filter parameters for the publications listing.
#[derive(Debug, Clone, Default)]
pub struct PublicationQuery {
    pub search: Option<String>,
    pub research_area: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone)]
pub struct PublicationPage {
    pub publications: Vec<Publication>,
    pub total: u64,
    pub research_areas: Vec<ResearchAreaCount>,
    pub year_range: YearRange,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResearchAreaCount {
    pub research_area: String,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct YearRange {
    pub min_year: i32,
    pub max_year: i32,
}

impl Default for YearRange {
    // Fixed fallback range used when no publication carries a year.
    fn default() -> Self {
        Self {
            min_year: 1990,
            max_year: 2024,
        }
    }
}

/// A persisted chat message as returned by the history endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessageRecord {
    pub id: i32,
    pub role: String,
    pub content: String,
    pub sources: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Per-session summary for the sessions listing.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub user_mode: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub message_count: i64,
    pub last_message: Option<String>,
}

// =========================================================================
// Analytics snapshot (raw aggregates; the presenter reshapes these into
// the chart-ready response document)
// =========================================================================

#[derive(Debug, Clone, Default)]
pub struct AnalyticsSnapshot {
    pub totals: AnalyticsTotals,
    pub by_year: Vec<YearCount>,
    pub by_area: Vec<AreaCount>,
    pub top_keywords: Vec<KeywordCount>,
    pub top_authors: Vec<AuthorCount>,
    pub chat_activity: Vec<ChatActivityBucket>,
    pub popular_topics: Vec<TopicMentions>,
    pub research_gaps: Vec<AreaCount>,
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsTotals {
    pub total_publications: i64,
    pub total_areas: i64,
    pub total_authors: i64,
    pub avg_year: Option<f64>,
    pub recent_publications: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct AreaCount {
    pub area: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct AuthorCount {
    pub author: String,
    pub count: i64,
}

#[derive(Debug, Clone)]
pub struct ChatActivityBucket {
    pub month: DateTime<Utc>,
    pub messages: i64,
    pub sessions: i64,
}

#[derive(Debug, Clone)]
pub struct TopicMentions {
    pub topic: String,
    pub mentions: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_deserializes_known_and_unknown_values() {
        let m: ResearchMode = serde_json::from_str("\"student\"").unwrap();
        assert_eq!(m, ResearchMode::Student);
        let m: ResearchMode = serde_json::from_str("\"manager\"").unwrap();
        assert_eq!(m, ResearchMode::Manager);
        // Unknown values collapse into the generic researcher framing
        let m: ResearchMode = serde_json::from_str("\"pilot\"").unwrap();
        assert_eq!(m, ResearchMode::Researcher);
    }

    #[test]
    fn mode_budgets() {
        assert_eq!(ResearchMode::Student.abstract_budget(), 180);
        assert_eq!(ResearchMode::Scientist.abstract_budget(), 420);
        assert_eq!(ResearchMode::Manager.abstract_budget(), 240);
        assert_eq!(ResearchMode::Researcher.abstract_budget(), 240);
    }

    #[test]
    fn dedup_key_prefers_nasa_id_over_title() {
        let mut record = SourceRecord {
            id: SourceId::Id(1),
            title: "Bone loss".to_string(),
            authors: None,
            publication_year: None,
            abstract_text: None,
            results: None,
            conclusion: None,
            nasa_publication_id: Some("NASA-1".to_string()),
            research_area: None,
            keywords: vec![],
            url: None,
        };
        assert_eq!(record.dedup_key().as_deref(), Some("NASA-1"));

        record.nasa_publication_id = Some(String::new());
        assert_eq!(record.dedup_key().as_deref(), Some("Bone loss"));

        record.title.clear();
        assert_eq!(record.dedup_key(), None);
    }
}
