//! Page catalog routes — list, create, rename, publish, duplicate, delete.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::builder::page::PageStatus;
use crate::routes::auth::AuthUser;
use crate::services::editor;
use crate::services::page::{self, MetaUpdate, PageError, PageFilter, PageRow, PageStats};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListPagesQuery {
    pub search: Option<String>,
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct CreatePageBody {
    pub title: String,
    pub slug: Option<String>,
}

pub(crate) fn page_error_to_status(err: PageError) -> StatusCode {
    match err {
        PageError::NotFound(_) => StatusCode::NOT_FOUND,
        PageError::InvalidTitle | PageError::InvalidSlug(_) => StatusCode::BAD_REQUEST,
        PageError::SlugTaken(_) => StatusCode::CONFLICT,
        PageError::Malformed(e) => {
            error!(error = %e, "stored page content is malformed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        PageError::Database(e) => {
            error!(error = %e, "page query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn parse_filter(query: ListPagesQuery) -> Result<PageFilter, StatusCode> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("" | "all") => None,
        Some(raw) => Some(PageStatus::parse(raw).ok_or(StatusCode::BAD_REQUEST)?),
    };
    let search = query.search.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
    Ok(PageFilter { search, status })
}

/// `GET /api/pages` — list the caller's pages, newest first.
pub async fn list_pages(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListPagesQuery>,
) -> Result<Json<Vec<PageRow>>, StatusCode> {
    let filter = parse_filter(query)?;
    let rows = page::list_pages(&state.pool, auth.user.id, &filter)
        .await
        .map_err(page_error_to_status)?;
    Ok(Json(rows))
}

/// `POST /api/pages` — create a draft page holding the starter hero.
pub async fn create_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<CreatePageBody>,
) -> Result<(StatusCode, Json<PageRow>), StatusCode> {
    let slug = body.slug.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let row = page::create_page(&state.pool, auth.user.id, &body.title, slug)
        .await
        .map_err(page_error_to_status)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/pages/:id`
pub async fn get_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<Json<PageRow>, StatusCode> {
    let row = page::get_page(&state.pool, page_id, auth.user.id)
        .await
        .map_err(page_error_to_status)?;
    Ok(Json(row))
}

/// `GET /api/pages/:id/stats` — views, leads, conversion rate.
pub async fn page_stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<Json<PageStats>, StatusCode> {
    let row = page::get_page(&state.pool, page_id, auth.user.id)
        .await
        .map_err(page_error_to_status)?;
    Ok(Json(row.stats()))
}

/// `PATCH /api/pages/:id` — update title, slug, SEO fields or status.
/// An open editor picks up the new metadata.
pub async fn update_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
    Json(body): Json<MetaUpdate>,
) -> Result<Json<PageRow>, StatusCode> {
    let row = page::update_meta(&state.pool, page_id, auth.user.id, body)
        .await
        .map_err(page_error_to_status)?;
    editor::sync_meta(&state, page_id, row.meta()).await;
    Ok(Json(row))
}

/// `POST /api/pages/:id/duplicate` — copy as a new draft.
pub async fn duplicate_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<(StatusCode, Json<PageRow>), StatusCode> {
    let row = page::duplicate_page(&state.pool, page_id, auth.user.id)
        .await
        .map_err(page_error_to_status)?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `DELETE /api/pages/:id` — delete the page and drop any open editor.
pub async fn delete_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    page::delete_page(&state.pool, page_id, auth.user.id)
        .await
        .map_err(page_error_to_status)?;
    editor::forget(&state, page_id).await;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "pages_test.rs"]
mod tests;
