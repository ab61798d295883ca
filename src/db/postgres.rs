//! Postgres implementation of the `Store` trait.
//!
//! Search, listing, and analytics go through raw parameterized
//! statements mapped with `FromQueryResult` (the query shapes do not fit
//! a single entity); chat session/message writes go through entity
//! `ActiveModel`s.

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, Statement, Value,
};

use super::entities::{chat_message, chat_session};
use super::models::{
    AnalyticsSnapshot, AnalyticsTotals, AreaCount, AuthorCount, ChatActivityBucket,
    ChatMessageRecord, KeywordCount, MessageRole, Publication, PublicationPage, PublicationQuery,
    ResearchAreaCount, ResearchMode, SessionSummary, SourceId, SourceRecord, TopicMentions,
    YearCount, YearRange,
};
use super::Store;
use crate::config::DatabaseConfig;
use crate::errors::AppError;

#[derive(Clone)]
pub struct PgStore {
    db: DatabaseConnection,
}

impl PgStore {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        let url = config.url.as_deref().ok_or_else(|| {
            AppError::DatabaseConnectionError("database.url is not configured".to_string())
        })?;

        let mut opt = sea_orm::ConnectOptions::new(url);
        opt.max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(std::time::Duration::from_secs(config.connect_timeout))
            .sqlx_logging(cfg!(debug_assertions));

        let db = sea_orm::Database::connect(opt).await?;

        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Database connection pool initialized"
        );

        Ok(Self { db })
    }
}

#[derive(Debug, FromQueryResult)]
struct ChatSearchRow {
    id: i32,
    title: String,
    authors: Option<String>,
    publication_year: Option<i32>,
    abstract_text: Option<String>,
    results: Option<String>,
    conclusion: Option<String>,
    nasa_publication_id: Option<String>,
    research_area: Option<String>,
    keywords: Option<Vec<String>>,
}

#[derive(Debug, FromQueryResult)]
struct PublicationRow {
    id: i32,
    title: String,
    authors: Option<String>,
    publication_year: Option<i32>,
    abstract_text: Option<String>,
    research_area: Option<String>,
    keywords: Option<Vec<String>>,
    nasa_publication_id: Option<String>,
    created_at: chrono::DateTime<chrono::FixedOffset>,
}

#[derive(Debug, FromQueryResult)]
struct CountRow {
    total: i64,
}

#[derive(Debug, FromQueryResult)]
struct AreaCountRow {
    research_area: String,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct YearRangeRow {
    min_year: Option<i32>,
    max_year: Option<i32>,
}

#[derive(Debug, FromQueryResult)]
struct YearCountRow {
    year: i32,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct KeywordCountRow {
    keyword: String,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct AuthorCountRow {
    authors: String,
    publications_count: i64,
}

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    total_publications: i64,
    total_areas: i64,
    total_authors: i64,
    avg_year: Option<f64>,
}

#[derive(Debug, FromQueryResult)]
struct ChatActivityRow {
    month: chrono::DateTime<chrono::FixedOffset>,
    message_count: i64,
    unique_sessions: i64,
}

#[derive(Debug, FromQueryResult)]
struct TopicRow {
    research_area: String,
    mention_count: i64,
}

#[derive(Debug, FromQueryResult)]
struct SessionRow {
    session_id: String,
    user_mode: String,
    created_at: chrono::DateTime<chrono::FixedOffset>,
    updated_at: chrono::DateTime<chrono::FixedOffset>,
    message_count: i64,
    last_message: Option<String>,
}

impl PgStore {
    fn stmt(sql: &str, values: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(DbBackend::Postgres, sql, values)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), AppError> {
        let stmt = Statement::from_string(DbBackend::Postgres, "SELECT 1".to_string());
        self.db.execute(stmt).await?;
        Ok(())
    }

    async fn search_publications(
        &self,
        query: &str,
        limit: u64,
    ) -> Result<Vec<SourceRecord>, AppError> {
        let pattern = format!("%{}%", query);

        let sql = r#"
            SELECT p.id, p.title, p.authors, p.publication_year,
                   p.abstract AS abstract_text, p.results, p.conclusion,
                   p.nasa_publication_id, p.research_area, p.keywords
            FROM publications p
            WHERE
                LOWER(p.title) LIKE LOWER($1) OR
                LOWER(p.abstract) LIKE LOWER($1) OR
                LOWER(p.results) LIKE LOWER($1) OR
                LOWER(p.conclusion) LIKE LOWER($1) OR
                array_to_string(p.keywords, ' ') ILIKE $1
            ORDER BY
                CASE
                    WHEN LOWER(p.title) LIKE LOWER($1) THEN 1
                    WHEN LOWER(p.abstract) LIKE LOWER($1) THEN 2
                    ELSE 3
                END,
                p.publication_year DESC
            LIMIT $2
        "#;

        let rows = ChatSearchRow::find_by_statement(Self::stmt(
            sql,
            vec![pattern.into(), (limit as i64).into()],
        ))
        .all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SourceRecord {
                id: SourceId::Id(r.id as i64),
                title: r.title,
                authors: r.authors,
                publication_year: r.publication_year,
                abstract_text: r.abstract_text,
                results: r.results,
                conclusion: r.conclusion,
                nasa_publication_id: r.nasa_publication_id,
                research_area: r.research_area,
                keywords: r.keywords.unwrap_or_default(),
                url: None,
            })
            .collect())
    }

    async fn list_publications(
        &self,
        query: &PublicationQuery,
    ) -> Result<PublicationPage, AppError> {
        // Dynamic WHERE clause with numbered parameters, same shape the
        // original service builds.
        let mut conditions: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(format!("%{}%", search).into());
            let idx = params.len();
            conditions.push(format!(
                "(LOWER(title) LIKE LOWER(${idx}) OR \
                 LOWER(abstract) LIKE LOWER(${idx}) OR \
                 LOWER(authors) LIKE LOWER(${idx}) OR \
                 array_to_string(keywords, ' ') ILIKE ${idx})"
            ));
        }

        if let Some(area) = query.research_area.as_deref().filter(|s| !s.is_empty()) {
            params.push(area.to_owned().into());
            conditions.push(format!("LOWER(research_area) = LOWER(${})", params.len()));
        }

        if let Some(year_from) = query.year_from {
            params.push(year_from.into());
            conditions.push(format!("publication_year >= ${}", params.len()));
        }

        if let Some(year_to) = query.year_to {
            params.push(year_to.into());
            conditions.push(format!("publication_year <= ${}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) AS total FROM publications {where_clause}");
        let count = CountRow::find_by_statement(Self::stmt(&count_sql, params.clone()))
            .one(&self.db)
            .await?
            .map(|r| r.total)
            .unwrap_or(0);

        let offset = (query.page.saturating_sub(1)) * query.limit;
        let page_sql = format!(
            "SELECT id, title, authors, publication_year, abstract AS abstract_text, \
                    research_area, keywords, nasa_publication_id, created_at \
             FROM publications \
             {where_clause} \
             ORDER BY publication_year DESC, created_at DESC \
             LIMIT ${} OFFSET ${}",
            params.len() + 1,
            params.len() + 2,
        );
        let mut page_params = params;
        page_params.push((query.limit as i64).into());
        page_params.push((offset as i64).into());

        let rows = PublicationRow::find_by_statement(Self::stmt(&page_sql, page_params))
            .all(&self.db)
            .await?;

        // Filter-population aids are computed over the whole table, not
        // the filtered subset.
        let areas = AreaCountRow::find_by_statement(Self::stmt(
            "SELECT research_area, COUNT(*) AS count \
             FROM publications \
             WHERE research_area IS NOT NULL \
             GROUP BY research_area \
             ORDER BY count DESC",
            vec![],
        ))
        .all(&self.db)
        .await?;

        let year_range = YearRangeRow::find_by_statement(Self::stmt(
            "SELECT MIN(publication_year) AS min_year, MAX(publication_year) AS max_year \
             FROM publications \
             WHERE publication_year IS NOT NULL",
            vec![],
        ))
        .one(&self.db)
        .await?;

        let year_range = match year_range {
            Some(YearRangeRow {
                min_year: Some(min),
                max_year: Some(max),
            }) => YearRange {
                min_year: min,
                max_year: max,
            },
            _ => YearRange::default(),
        };

        Ok(PublicationPage {
            publications: rows
                .into_iter()
                .map(|r| Publication {
                    id: r.id,
                    title: r.title,
                    authors: r.authors,
                    publication_year: r.publication_year,
                    abstract_text: r.abstract_text,
                    research_area: r.research_area,
                    keywords: r.keywords.unwrap_or_default(),
                    nasa_publication_id: r.nasa_publication_id,
                    created_at: r.created_at.with_timezone(&Utc),
                })
                .collect(),
            total: count as u64,
            research_areas: areas
                .into_iter()
                .map(|r| ResearchAreaCount {
                    research_area: r.research_area,
                    count: r.count,
                })
                .collect(),
            year_range,
        })
    }

    async fn analytics(&self) -> Result<AnalyticsSnapshot, AppError> {
        let by_year = YearCountRow::find_by_statement(Self::stmt(
            "SELECT publication_year AS year, COUNT(*) AS count \
             FROM publications \
             WHERE publication_year IS NOT NULL \
             GROUP BY publication_year \
             ORDER BY publication_year ASC",
            vec![],
        ))
        .all(&self.db)
        .await?;

        let by_area = AreaCountRow::find_by_statement(Self::stmt(
            "SELECT research_area, COUNT(*) AS count \
             FROM publications \
             WHERE research_area IS NOT NULL \
             GROUP BY research_area \
             ORDER BY count DESC",
            vec![],
        ))
        .all(&self.db)
        .await?;

        let top_keywords = KeywordCountRow::find_by_statement(Self::stmt(
            "SELECT UNNEST(keywords) AS keyword, COUNT(*) AS count \
             FROM publications \
             WHERE keywords IS NOT NULL AND array_length(keywords, 1) > 0 \
             GROUP BY keyword \
             ORDER BY count DESC \
             LIMIT 15",
            vec![],
        ))
        .all(&self.db)
        .await?;

        let current_year = Utc::now().year();
        let recent = CountRow::find_by_statement(Self::stmt(
            "SELECT COUNT(*) AS total FROM publications WHERE publication_year >= $1",
            vec![(current_year - 4).into()],
        ))
        .one(&self.db)
        .await?
        .map(|r| r.total)
        .unwrap_or(0);

        let totals = TotalsRow::find_by_statement(Self::stmt(
            "SELECT COUNT(*) AS total_publications, \
                    COUNT(DISTINCT research_area) AS total_areas, \
                    COUNT(DISTINCT authors) AS total_authors, \
                    AVG(publication_year)::float8 AS avg_year \
             FROM publications",
            vec![],
        ))
        .one(&self.db)
        .await?;

        let top_authors = AuthorCountRow::find_by_statement(Self::stmt(
            "SELECT authors, COUNT(*) AS publications_count \
             FROM publications \
             WHERE authors IS NOT NULL AND authors != '' \
             GROUP BY authors \
             ORDER BY publications_count DESC \
             LIMIT 10",
            vec![],
        ))
        .all(&self.db)
        .await?;

        let research_gaps = AreaCountRow::find_by_statement(Self::stmt(
            "SELECT research_area, COUNT(*) AS count \
             FROM publications \
             WHERE research_area IS NOT NULL \
             GROUP BY research_area \
             HAVING COUNT(*) <= 3 \
             ORDER BY count ASC, research_area ASC",
            vec![],
        ))
        .all(&self.db)
        .await?;

        let chat_activity = ChatActivityRow::find_by_statement(Self::stmt(
            "SELECT DATE_TRUNC('month', created_at) AS month, \
                    COUNT(*) AS message_count, \
                    COUNT(DISTINCT session_id) AS unique_sessions \
             FROM chat_messages \
             WHERE created_at >= NOW() - INTERVAL '12 months' \
             GROUP BY DATE_TRUNC('month', created_at) \
             ORDER BY month ASC",
            vec![],
        ))
        .all(&self.db)
        .await?;

        let popular_topics = TopicRow::find_by_statement(Self::stmt(
            "SELECT p.research_area, COUNT(cm.id) AS mention_count \
             FROM publications p \
             JOIN chat_messages cm ON ( \
                 LOWER(cm.content) LIKE LOWER('%' || p.research_area || '%') OR \
                 LOWER(cm.content) LIKE LOWER('%' || p.title || '%') \
             ) \
             WHERE p.research_area IS NOT NULL \
             GROUP BY p.research_area \
             ORDER BY mention_count DESC \
             LIMIT 10",
            vec![],
        ))
        .all(&self.db)
        .await?;

        let totals = totals
            .map(|t| AnalyticsTotals {
                total_publications: t.total_publications,
                total_areas: t.total_areas,
                total_authors: t.total_authors,
                avg_year: t.avg_year,
                recent_publications: recent,
            })
            .unwrap_or_default();

        Ok(AnalyticsSnapshot {
            totals,
            by_year: by_year
                .into_iter()
                .map(|r| YearCount {
                    year: r.year,
                    count: r.count,
                })
                .collect(),
            by_area: by_area
                .into_iter()
                .map(|r| AreaCount {
                    area: r.research_area,
                    count: r.count,
                })
                .collect(),
            top_keywords: top_keywords
                .into_iter()
                .map(|r| KeywordCount {
                    keyword: r.keyword,
                    count: r.count,
                })
                .collect(),
            top_authors: top_authors
                .into_iter()
                .map(|r| AuthorCount {
                    author: r.authors,
                    count: r.publications_count,
                })
                .collect(),
            chat_activity: chat_activity
                .into_iter()
                .map(|r| ChatActivityBucket {
                    month: r.month.with_timezone(&Utc),
                    messages: r.message_count,
                    sessions: r.unique_sessions,
                })
                .collect(),
            popular_topics: popular_topics
                .into_iter()
                .map(|r| TopicMentions {
                    topic: r.research_area,
                    mentions: r.mention_count,
                })
                .collect(),
            research_gaps: research_gaps
                .into_iter()
                .map(|r| AreaCount {
                    area: r.research_area,
                    count: r.count,
                })
                .collect(),
        })
    }

    async fn ensure_session(&self, session_id: &str, mode: ResearchMode) -> Result<(), AppError> {
        let now = Utc::now();
        let existing = chat_session::Entity::find_by_id(session_id.to_owned())
            .one(&self.db)
            .await?;

        match existing {
            Some(model) => {
                let mut active: chat_session::ActiveModel = model.into();
                active.user_mode = Set(mode.as_str().to_owned());
                active.updated_at = Set(now.into());
                active.update(&self.db).await?;
            }
            None => {
                chat_session::ActiveModel {
                    session_id: Set(session_id.to_owned()),
                    user_mode: Set(mode.as_str().to_owned()),
                    created_at: Set(now.into()),
                    updated_at: Set(now.into()),
                }
                .insert(&self.db)
                .await?;
            }
        }

        Ok(())
    }

    async fn log_message(
        &self,
        session_id: &str,
        role: MessageRole,
        content: &str,
        sources: Option<serde_json::Value>,
    ) -> Result<(), AppError> {
        chat_message::ActiveModel {
            session_id: Set(session_id.to_owned()),
            role: Set(role.as_str().to_owned()),
            content: Set(content.to_owned()),
            sources: Set(sources),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        Ok(())
    }

    async fn session_history(
        &self,
        session_id: &str,
        limit: u64,
    ) -> Result<Vec<ChatMessageRecord>, AppError> {
        let messages = chat_message::Entity::find()
            .filter(chat_message::Column::SessionId.eq(session_id))
            .order_by_asc(chat_message::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(messages
            .into_iter()
            .map(|m| ChatMessageRecord {
                id: m.id,
                role: m.role,
                content: m.content,
                sources: m.sources,
                created_at: m.created_at.with_timezone(&Utc),
            })
            .collect())
    }

    async fn clear_history(&self, session_id: &str) -> Result<(), AppError> {
        chat_message::Entity::delete_many()
            .filter(chat_message::Column::SessionId.eq(session_id))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<SessionSummary>, AppError> {
        let rows = SessionRow::find_by_statement(Self::stmt(
            "SELECT cs.session_id, cs.user_mode, cs.created_at, cs.updated_at, \
                    COUNT(cm.id) AS message_count, \
                    ( \
                        SELECT content FROM chat_messages \
                        WHERE session_id = cs.session_id AND role = 'user' \
                        ORDER BY created_at DESC \
                        LIMIT 1 \
                    ) AS last_message \
             FROM chat_sessions cs \
             LEFT JOIN chat_messages cm ON cs.session_id = cm.session_id \
             GROUP BY cs.session_id, cs.user_mode, cs.created_at, cs.updated_at \
             ORDER BY cs.updated_at DESC",
            vec![],
        ))
        .all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SessionSummary {
                session_id: r.session_id,
                user_mode: r.user_mode,
                created_at: r.created_at.with_timezone(&Utc),
                updated_at: r.updated_at.with_timezone(&Utc),
                message_count: r.message_count,
                last_message: r.last_message,
            })
            .collect())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), AppError> {
        // The schema cascades message deletion, but delete explicitly so
        // the behavior does not depend on the FK being present.
        chat_message::Entity::delete_many()
            .filter(chat_message::Column::SessionId.eq(session_id))
            .exec(&self.db)
            .await?;
        chat_session::Entity::delete_by_id(session_id.to_owned())
            .exec(&self.db)
            .await?;
        Ok(())
    }
}
