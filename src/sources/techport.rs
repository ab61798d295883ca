//! NASA TechPort project search client.
//!
//! TechPort requires an api.nasa.gov key. Without one the source is
//! silently disabled: `search` returns an empty list and never errors.

use serde::Deserialize;

use crate::db::models::{SourceId, SourceRecord};
use crate::errors::AppError;

#[derive(Clone)]
pub struct TechportClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
    projects: Option<ProjectList>,
}

#[derive(Debug, Default, Deserialize)]
struct ProjectList {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
struct Project {
    id: i64,
    title: String,
    description: Option<String>,
    #[serde(rename = "startYear")]
    start_year: Option<i32>,
    #[serde(rename = "primaryTaxonomyNodes", default)]
    primary_taxonomy_nodes: Vec<TaxonomyNode>,
}

#[derive(Debug, Deserialize)]
struct TaxonomyNode {
    title: Option<String>,
}

impl TechportClient {
    pub fn new(http: reqwest::Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<SourceRecord>, AppError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(Vec::new());
        };

        let url = format!("{}/projects/search", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("searchQuery", query), ("api_key", api_key)])
            .send()
            .await
            .map_err(|e| AppError::SourceError(format!("techport request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AppError::SourceError(format!(
                "techport returned {}",
                response.status()
            )));
        }

        let envelope: SearchEnvelope = response
            .json()
            .await
            .map_err(|e| AppError::SourceError(format!("techport parse error: {e}")))?;

        let projects = envelope.projects.unwrap_or_default().projects;
        Ok(projects
            .into_iter()
            .take(limit)
            .map(map_project)
            .collect())
    }
}

fn map_project(project: Project) -> SourceRecord {
    let areas: Vec<String> = project
        .primary_taxonomy_nodes
        .into_iter()
        .filter_map(|node| node.title)
        .collect();

    SourceRecord {
        id: SourceId::Tag(format!("techport-{}", project.id)),
        title: project.title,
        authors: None,
        publication_year: project.start_year,
        abstract_text: project.description,
        results: None,
        conclusion: None,
        nasa_publication_id: Some(project.id.to_string()),
        research_area: (!areas.is_empty()).then(|| areas.join(", ")),
        keywords: Vec::new(),
        url: Some(format!("https://techport.nasa.gov/view/{}", project.id)),
    }
}
