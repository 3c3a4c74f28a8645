//! Automation workflow routes — owner CRUD over stored workflow definitions.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use tracing::{error, warn};
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::services::workflow::{self, WorkflowError, WorkflowInput, WorkflowRow};
use crate::state::AppState;

pub(crate) fn workflow_error_to_status(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::MissingName
        | WorkflowError::TooLong(_)
        | WorkflowError::TooManyActions
        | WorkflowError::TooManyConditions
        | WorkflowError::InvalidAction { .. }
        | WorkflowError::InvalidCondition(_) => StatusCode::BAD_REQUEST,
        WorkflowError::NotFound(_) => StatusCode::NOT_FOUND,
        WorkflowError::Malformed(e) => {
            error!(error = %e, "stored workflow failed to parse");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        WorkflowError::Database(e) => {
            error!(error = %e, "workflow query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// `GET /api/workflows` — newest first.
pub async fn list_workflows(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<WorkflowRow>>, StatusCode> {
    let rows = workflow::list_workflows(&state.pool, auth.user.id)
        .await
        .map_err(|e| workflow_error_to_status(&e))?;
    Ok(Json(rows))
}

/// `POST /api/workflows`
pub async fn create_workflow(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<WorkflowInput>,
) -> Result<(StatusCode, Json<WorkflowRow>), StatusCode> {
    let new = workflow::validate(body).map_err(|e| {
        warn!(error = %e, "workflow rejected");
        workflow_error_to_status(&e)
    })?;
    let row = workflow::create_workflow(&state.pool, auth.user.id, &new)
        .await
        .map_err(|e| workflow_error_to_status(&e))?;
    Ok((StatusCode::CREATED, Json(row)))
}

/// `GET /api/workflows/:id`
pub async fn get_workflow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<WorkflowRow>, StatusCode> {
    let row = workflow::get_workflow(&state.pool, workflow_id, auth.user.id)
        .await
        .map_err(|e| workflow_error_to_status(&e))?;
    Ok(Json(row))
}

/// `POST /api/workflows/:id/toggle` — pause or resume.
pub async fn toggle_workflow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workflow_id): Path<Uuid>,
) -> Result<Json<WorkflowRow>, StatusCode> {
    let row = workflow::toggle_workflow(&state.pool, workflow_id, auth.user.id)
        .await
        .map_err(|e| workflow_error_to_status(&e))?;
    Ok(Json(row))
}

/// `DELETE /api/workflows/:id`
pub async fn delete_workflow(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workflow_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    workflow::delete_workflow(&state.pool, workflow_id, auth.user.id)
        .await
        .map_err(|e| workflow_error_to_status(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
#[path = "workflows_test.rs"]
mod tests;
