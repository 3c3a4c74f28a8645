//! Owner analytics route.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use tracing::error;

use crate::routes::auth::AuthUser;
use crate::services::analytics::{self, Analytics, AnalyticsError, AnalyticsRange};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// Window length in days: 7, 30, 90 or 365.
    pub days: Option<String>,
}

pub(crate) fn analytics_error_to_status(err: &AnalyticsError) -> StatusCode {
    match err {
        AnalyticsError::Database(e) => {
            error!(error = %e, "analytics query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn parse_range(raw: Option<&str>) -> Result<AnalyticsRange, StatusCode> {
    match raw.map(str::trim) {
        None | Some("") => Ok(AnalyticsRange::default()),
        Some(value) => AnalyticsRange::parse(value).ok_or(StatusCode::BAD_REQUEST),
    }
}

/// `GET /api/analytics` — lead totals, conversion and daily trend; `?days=`
/// picks the window (default 30).
pub async fn owner_analytics(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Analytics>, StatusCode> {
    let range = parse_range(query.days.as_deref())?;
    let analytics = analytics::owner_analytics(&state.pool, auth.user.id, range)
        .await
        .map_err(|e| analytics_error_to_status(&e))?;
    Ok(Json(analytics))
}

#[cfg(test)]
#[path = "analytics_test.rs"]
mod tests;
