//! Dashboard analytics endpoint.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::services::analytics::AnalyticsReport;
use crate::services::AppState;

pub async fn dashboard(State(state): State<AppState>) -> Result<Json<AnalyticsReport>, AppError> {
    Ok(Json(state.analytics.report().await?))
}
