//! NASA Image and Video Library search client.

use chrono::Datelike;
use serde::Deserialize;

use crate::db::models::{SourceId, SourceRecord};
use crate::errors::AppError;

#[derive(Clone)]
pub struct NasaImagesClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    collection: Option<Collection>,
}

#[derive(Debug, Default, Deserialize)]
struct Collection {
    #[serde(default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    #[serde(default)]
    data: Vec<ItemData>,
    #[serde(default)]
    links: Vec<ItemLink>,
}

#[derive(Debug, Default, Deserialize)]
struct ItemData {
    nasa_id: Option<String>,
    title: Option<String>,
    photographer: Option<String>,
    date_created: Option<String>,
    description: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ItemLink {
    href: Option<String>,
}

impl NasaImagesClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    /// Search image metadata by free text. Each hit becomes a
    /// pseudo-publication tagged `nasa-image-…`; nothing is persisted.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SourceRecord>, AppError> {
        let url = format!("{}/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("media_type", "image")])
            .send()
            .await
            .map_err(|e| AppError::SourceError(format!("images-api request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::SourceError(format!(
                "images-api returned {}",
                response.status()
            )));
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| AppError::SourceError(format!("images-api parse error: {e}")))?;

        let items = envelope.collection.unwrap_or_default().items;
        Ok(items
            .into_iter()
            .take(limit)
            .enumerate()
            .map(|(index, item)| map_item(index, item))
            .collect())
    }
}

fn map_item(index: usize, item: Item) -> SourceRecord {
    let data = item.data.into_iter().next().unwrap_or_default();
    let link = item.links.into_iter().find_map(|l| l.href);
    let keywords = data.keywords;
    let keyword_blurb = (!keywords.is_empty()).then(|| keywords.join(", "));
    let tag = data
        .nasa_id
        .clone()
        .unwrap_or_else(|| index.to_string());

    SourceRecord {
        id: SourceId::Tag(format!("nasa-image-{tag}")),
        title: data.title.unwrap_or_else(|| "NASA Image".to_string()),
        authors: data.photographer,
        publication_year: data.date_created.as_deref().and_then(created_year),
        abstract_text: data.description.or_else(|| keyword_blurb.clone()),
        results: None,
        conclusion: None,
        nasa_publication_id: data.nasa_id.clone(),
        research_area: keyword_blurb,
        keywords,
        url: link.or_else(|| {
            data.nasa_id
                .map(|id| format!("https://images.nasa.gov/details-{id}"))
        }),
    }
}

/// The library dates entries with RFC 3339 timestamps, but some older
/// records carry bare year prefixes.
fn created_year(raw: &str) -> Option<i32> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.year())
        .ok()
        .or_else(|| raw.get(..4)?.parse().ok())
}
