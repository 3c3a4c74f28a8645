//! Lead management routes — owner view of captured contact requests.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::services::lead::{self, LeadError, LeadRow, LeadStatus, NoteRow};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListLeadsQuery {
    pub status: Option<String>,
    pub page_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct UpdateLeadBody {
    pub status: String,
}

#[derive(Deserialize)]
pub struct AddNoteBody {
    pub body: String,
}

pub(crate) fn lead_error_to_status(err: &LeadError) -> StatusCode {
    match err {
        LeadError::MissingName
        | LeadError::InvalidEmail
        | LeadError::MissingContact
        | LeadError::TooLong(_)
        | LeadError::EmptyNote => StatusCode::BAD_REQUEST,
        LeadError::NotFound(_) => StatusCode::NOT_FOUND,
        LeadError::Database(e) => {
            error!(error = %e, "lead query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<LeadStatus>, StatusCode> {
    match raw.map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(value) => LeadStatus::parse(value).map(Some).ok_or(StatusCode::BAD_REQUEST),
    }
}

/// `GET /api/leads` — newest first; `?status=` and `?page_id=` narrow it.
pub async fn list_leads(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListLeadsQuery>,
) -> Result<Json<Vec<LeadRow>>, StatusCode> {
    let status = parse_status_filter(query.status.as_deref())?;
    let rows = lead::list_leads(&state.pool, auth.user.id, status, query.page_id)
        .await
        .map_err(|e| lead_error_to_status(&e))?;
    Ok(Json(rows))
}

/// `GET /api/leads/:id`
pub async fn get_lead(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<LeadRow>, StatusCode> {
    let row = lead::get_lead(&state.pool, lead_id, auth.user.id)
        .await
        .map_err(|e| lead_error_to_status(&e))?;
    Ok(Json(row))
}

/// `PATCH /api/leads/:id` — move a lead through the pipeline.
pub async fn update_lead(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lead_id): Path<Uuid>,
    Json(body): Json<UpdateLeadBody>,
) -> Result<Json<LeadRow>, StatusCode> {
    let status = LeadStatus::parse(body.status.trim()).ok_or(StatusCode::BAD_REQUEST)?;
    let row = lead::update_status(&state.pool, lead_id, auth.user.id, status)
        .await
        .map_err(|e| lead_error_to_status(&e))?;
    Ok(Json(row))
}

/// `GET /api/leads/:id/notes`
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lead_id): Path<Uuid>,
) -> Result<Json<Vec<NoteRow>>, StatusCode> {
    let rows = lead::list_notes(&state.pool, lead_id, auth.user.id)
        .await
        .map_err(|e| lead_error_to_status(&e))?;
    Ok(Json(rows))
}

/// `POST /api/leads/:id/notes`
pub async fn add_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(lead_id): Path<Uuid>,
    Json(body): Json<AddNoteBody>,
) -> Result<(StatusCode, Json<NoteRow>), StatusCode> {
    let note = lead::add_note(&state.pool, lead_id, auth.user.id, &body.body)
        .await
        .map_err(|e| lead_error_to_status(&e))?;
    Ok((StatusCode::CREATED, Json(note)))
}

#[cfg(test)]
#[path = "leads_test.rs"]
mod tests;
