//! Analytics presenter: reshapes raw store aggregates into the fixed
//! chart-ready dashboard document.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::models::{AnalyticsSnapshot, KeywordCount, YearCount};
use crate::db::Store;
use crate::errors::AppError;

pub struct AnalyticsService {
    store: Arc<dyn Store>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsReport {
    pub overview: Overview,
    pub charts: Charts,
    pub insights: Insights,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_publications: i64,
    pub total_areas: i64,
    pub total_authors: i64,
    pub average_year: i64,
    pub recent_publications: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Charts {
    pub publications_by_year: Vec<YearCount>,
    pub publications_by_area: Vec<AreaBucket>,
    pub top_keywords: Vec<KeywordCount>,
    pub top_authors: Vec<AuthorBucket>,
    pub chat_activity: Vec<ActivityBucket>,
    pub popular_topics: Vec<TopicBucket>,
}

#[derive(Debug, Serialize)]
pub struct AreaBucket {
    pub area: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct AuthorBucket {
    pub author: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct ActivityBucket {
    pub month: DateTime<Utc>,
    pub messages: i64,
    pub sessions: i64,
}

#[derive(Debug, Serialize)]
pub struct TopicBucket {
    pub topic: String,
    pub mentions: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub research_gaps: Vec<GapBucket>,
    pub trends: Trends,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GapBucket {
    pub area: String,
    pub publication_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trends {
    pub growing_areas: Vec<String>,
    pub under_researched: Vec<String>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn report(&self) -> Result<AnalyticsReport, AppError> {
        Ok(shape(self.store.analytics().await?))
    }
}

fn shape(snapshot: AnalyticsSnapshot) -> AnalyticsReport {
    // Trend lists are derived by truncating the area series: the top
    // of the by-area ranking reads as "growing", the head of the gaps
    // list as "under-researched".
    let growing_areas = snapshot
        .by_area
        .iter()
        .take(3)
        .map(|a| a.area.clone())
        .collect();
    let under_researched = snapshot
        .research_gaps
        .iter()
        .take(5)
        .map(|g| g.area.clone())
        .collect();

    AnalyticsReport {
        overview: Overview {
            total_publications: snapshot.totals.total_publications,
            total_areas: snapshot.totals.total_areas,
            total_authors: snapshot.totals.total_authors,
            average_year: snapshot
                .totals
                .avg_year
                .map(|year| year.round() as i64)
                .unwrap_or(0),
            recent_publications: snapshot.totals.recent_publications,
        },
        charts: Charts {
            publications_by_year: snapshot.by_year,
            publications_by_area: snapshot
                .by_area
                .into_iter()
                .map(|a| AreaBucket {
                    area: a.area,
                    count: a.count,
                })
                .collect(),
            top_keywords: snapshot.top_keywords,
            top_authors: snapshot
                .top_authors
                .into_iter()
                .map(|a| AuthorBucket {
                    author: a.author,
                    count: a.count,
                })
                .collect(),
            chat_activity: snapshot
                .chat_activity
                .into_iter()
                .map(|b| ActivityBucket {
                    month: b.month,
                    messages: b.messages,
                    sessions: b.sessions,
                })
                .collect(),
            popular_topics: snapshot
                .popular_topics
                .into_iter()
                .map(|t| TopicBucket {
                    topic: t.topic,
                    mentions: t.mentions,
                })
                .collect(),
        },
        insights: Insights {
            research_gaps: snapshot
                .research_gaps
                .into_iter()
                .map(|g| GapBucket {
                    area: g.area,
                    publication_count: g.count,
                })
                .collect(),
            trends: Trends {
                growing_areas,
                under_researched,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{AnalyticsTotals, AreaCount};

    #[test]
    fn average_year_rounds_to_nearest_integer() {
        let snapshot = AnalyticsSnapshot {
            totals: AnalyticsTotals {
                total_publications: 3,
                avg_year: Some(2021.6),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(shape(snapshot).overview.average_year, 2022);
    }

    #[test]
    fn trends_truncate_area_and_gap_series() {
        let area = |name: &str, count: i64| AreaCount {
            area: name.to_string(),
            count,
        };
        let snapshot = AnalyticsSnapshot {
            by_area: vec![
                area("A", 9),
                area("B", 7),
                area("C", 5),
                area("D", 4),
            ],
            research_gaps: vec![
                area("E", 1),
                area("F", 1),
                area("G", 2),
                area("H", 2),
                area("I", 3),
                area("J", 3),
            ],
            ..Default::default()
        };
        let report = shape(snapshot);
        assert_eq!(report.insights.trends.growing_areas, vec!["A", "B", "C"]);
        assert_eq!(
            report.insights.trends.under_researched,
            vec!["E", "F", "G", "H", "I"]
        );
    }
}
