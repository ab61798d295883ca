//! Publication catalog listing with filters and pagination.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::db::models::{Publication, PublicationQuery, YearRange};
use crate::errors::AppError;
use crate::services::AppState;

const DEFAULT_PAGE: u64 = 1;
const DEFAULT_LIMIT: u64 = 12;
const MAX_LIMIT: u64 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    #[serde(rename = "researchArea")]
    pub research_area: Option<String>,
    #[serde(rename = "yearFrom")]
    pub year_from: Option<i32>,
    #[serde(rename = "yearTo")]
    pub year_to: Option<i32>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub publications: Vec<Publication>,
    pub pagination: Pagination,
    pub filters: Filters,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    pub research_areas: Vec<String>,
    pub year_range: YearRange,
}

pub async fn list_publications(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, AppError> {
    let query = normalize(params);
    let page = state.store.list_publications(&query).await?;

    let total_pages = page.total.div_ceil(query.limit);

    Ok(Json(ListResponse {
        publications: page.publications,
        pagination: Pagination {
            page: query.page,
            limit: query.limit,
            total: page.total,
            total_pages,
        },
        filters: Filters {
            research_areas: page
                .research_areas
                .into_iter()
                .map(|a| a.research_area)
                .collect(),
            year_range: page.year_range,
        },
    }))
}

/// Empty-string filters count as absent; page and limit get defaults and
/// the limit is capped.
fn normalize(params: ListParams) -> PublicationQuery {
    let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    PublicationQuery {
        search: non_empty(params.search),
        research_area: non_empty(params.research_area),
        year_from: params.year_from,
        year_to: params.year_to,
        page: params.page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE),
        limit: params
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_when_params_are_absent() {
        let query = normalize(ListParams::default());
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 12);
        assert_eq!(query.search, None);
    }

    #[test]
    fn blank_filters_are_dropped_and_limit_is_capped() {
        let query = normalize(ListParams {
            search: Some("  ".to_string()),
            research_area: Some(String::new()),
            limit: Some(5000),
            page: Some(0),
            ..Default::default()
        });
        assert_eq!(query.search, None);
        assert_eq!(query.research_area, None);
        assert_eq!(query.limit, 100);
        assert_eq!(query.page, 1);
    }
}
