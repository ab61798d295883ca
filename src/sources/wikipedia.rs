//! Wikipedia summary fallback.
//!
//! Two-step lookup: an opensearch call resolves the query to a page
//! title, then the REST summary endpoint supplies the extract. Used only
//! when every NASA-backed source comes up empty.

use serde::Deserialize;

use crate::db::models::{SourceId, SourceRecord};
use crate::errors::AppError;

#[derive(Clone)]
pub struct WikipediaClient {
    http: reqwest::Client,
    search_url: String,
    summary_base_url: String,
}

#[derive(Debug, Deserialize)]
struct Summary {
    title: Option<String>,
    extract: Option<String>,
    pageid: Option<i64>,
    content_urls: Option<ContentUrls>,
}

#[derive(Debug, Deserialize)]
struct ContentUrls {
    desktop: Option<DesktopUrls>,
}

#[derive(Debug, Deserialize)]
struct DesktopUrls {
    page: Option<String>,
}

impl WikipediaClient {
    pub fn new(http: reqwest::Client, search_url: String, summary_base_url: String) -> Self {
        Self {
            http,
            search_url,
            summary_base_url,
        }
    }

    /// Resolve the query to at most one encyclopedia summary record.
    pub async fn summary(&self, query: &str) -> Result<Vec<SourceRecord>, AppError> {
        let Some(title) = self.top_title(query).await? else {
            return Ok(Vec::new());
        };

        let mut url = reqwest::Url::parse(&self.summary_base_url)
            .map_err(|e| AppError::SourceError(format!("wikipedia summary url invalid: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| AppError::SourceError("wikipedia summary url cannot be a base".into()))?
            .extend(["page", "summary", title.as_str()]);

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::SourceError(format!("wikipedia summary failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::SourceError(format!(
                "wikipedia summary returned {}",
                response.status()
            )));
        }

        let summary: Summary = response
            .json()
            .await
            .map_err(|e| AppError::SourceError(format!("wikipedia summary parse error: {e}")))?;

        let tag = summary
            .pageid
            .map(|id| id.to_string())
            .unwrap_or_else(|| title.clone());
        let url = summary
            .content_urls
            .and_then(|u| u.desktop)
            .and_then(|d| d.page)
            .unwrap_or_else(|| {
                format!("https://en.wikipedia.org/wiki/{}", title.replace(' ', "_"))
            });

        Ok(vec![SourceRecord {
            id: SourceId::Tag(format!("wiki-{tag}")),
            title: summary.title.unwrap_or(title),
            authors: None,
            publication_year: None,
            abstract_text: summary.extract,
            results: None,
            conclusion: None,
            nasa_publication_id: None,
            research_area: None,
            keywords: Vec::new(),
            url: Some(url),
        }])
    }

    /// Opensearch returns a positional JSON array; only the first title
    /// of the second element matters here.
    async fn top_title(&self, query: &str) -> Result<Option<String>, AppError> {
        let response = self
            .http
            .get(&self.search_url)
            .query(&[
                ("action", "opensearch"),
                ("search", query),
                ("limit", "1"),
                ("namespace", "0"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| AppError::SourceError(format!("wikipedia search failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::SourceError(format!(
                "wikipedia search returned {}",
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::SourceError(format!("wikipedia search parse error: {e}")))?;

        Ok(body
            .get(1)
            .and_then(|titles| titles.get(0))
            .and_then(|title| title.as_str())
            .map(str::to_owned))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_a_source_error() {
        let client = WikipediaClient::new(
            reqwest::Client::new(),
            "http://127.0.0.1:1/w/api.php".to_string(),
            "http://127.0.0.1:1/api/rest_v1".to_string(),
        );
        let err = client.summary("bone density").await.unwrap_err();
        assert!(matches!(err, AppError::SourceError(_)));
    }
}
