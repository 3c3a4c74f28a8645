//! Lead capture widget routes — owner management plus the public script and
//! form endpoint that embedded widgets talk to.

use axum::extract::{Form, Path, State};
use axum::http::{HeaderMap, HeaderName, StatusCode, header};
use axum::response::{Html, Json};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::routes::auth::AuthUser;
use crate::routes::leads::lead_error_to_status;
use crate::routes::public::message_page;
use crate::services::lead::{self, LeadError, LeadForm};
use crate::services::widget::{self, WidgetError, WidgetInput, WidgetRow};
use crate::state::AppState;

type ScriptResponse = ([(HeaderName, &'static str); 2], String);

#[derive(Debug, Serialize)]
pub struct WidgetResponse {
    #[serde(flatten)]
    pub widget: WidgetRow,
    pub embed_code: String,
}

impl WidgetResponse {
    fn new(widget: WidgetRow, origin: &str) -> Self {
        let embed_code = widget::embed_code(origin, widget.id);
        Self { widget, embed_code }
    }
}

pub(crate) fn widget_error_to_status(err: &WidgetError) -> StatusCode {
    match err {
        WidgetError::MissingName
        | WidgetError::MissingCopy(_)
        | WidgetError::TooLong(_)
        | WidgetError::InvalidDelay
        | WidgetError::MissingNameField
        | WidgetError::MissingContactField
        | WidgetError::InvalidColor(_)
        | WidgetError::InvalidRadius => StatusCode::BAD_REQUEST,
        WidgetError::NotFound(_) => StatusCode::NOT_FOUND,
        WidgetError::Malformed(e) => {
            error!(error = %e, "stored widget failed to parse");
            StatusCode::INTERNAL_SERVER_ERROR
        }
        WidgetError::Database(e) => {
            error!(error = %e, "widget query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Scheme and host the request came in on, or empty when the `Host` header
/// is missing or not a plain host name.
pub(crate) fn request_origin(headers: &HeaderMap, secure: bool) -> String {
    let Some(host) = headers.get(header::HOST).and_then(|v| v.to_str().ok()).map(str::trim) else {
        return String::new();
    };
    if host.is_empty() || !host.chars().all(|c| c.is_ascii_alphanumeric() || ".-:[]".contains(c)) {
        return String::new();
    }
    let scheme = if secure { "https" } else { "http" };
    format!("{scheme}://{host}")
}

fn validated(body: WidgetInput) -> Result<widget::NewWidget, StatusCode> {
    widget::validate(body).map_err(|e| {
        warn!(error = %e, "widget rejected");
        widget_error_to_status(&e)
    })
}

// =============================================================================
// OWNER
// =============================================================================

/// `GET /api/widgets` — newest first, each with its embed snippet.
pub async fn list_widgets(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
) -> Result<Json<Vec<WidgetResponse>>, StatusCode> {
    let origin = request_origin(&headers, state.cookie_secure);
    let rows = widget::list_widgets(&state.pool, auth.user.id)
        .await
        .map_err(|e| widget_error_to_status(&e))?;
    Ok(Json(rows.into_iter().map(|w| WidgetResponse::new(w, &origin)).collect()))
}

/// `POST /api/widgets`
pub async fn create_widget(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Json(body): Json<WidgetInput>,
) -> Result<(StatusCode, Json<WidgetResponse>), StatusCode> {
    let new = validated(body)?;
    let row = widget::create_widget(&state.pool, auth.user.id, &new)
        .await
        .map_err(|e| widget_error_to_status(&e))?;
    let origin = request_origin(&headers, state.cookie_secure);
    Ok((StatusCode::CREATED, Json(WidgetResponse::new(row, &origin))))
}

/// `GET /api/widgets/:id`
pub async fn get_widget(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(widget_id): Path<Uuid>,
) -> Result<Json<WidgetResponse>, StatusCode> {
    let row = widget::get_widget(&state.pool, widget_id, auth.user.id)
        .await
        .map_err(|e| widget_error_to_status(&e))?;
    Ok(Json(WidgetResponse::new(row, &request_origin(&headers, state.cookie_secure))))
}

/// `PUT /api/widgets/:id` — replace the configuration.
pub async fn update_widget(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(widget_id): Path<Uuid>,
    Json(body): Json<WidgetInput>,
) -> Result<Json<WidgetResponse>, StatusCode> {
    let new = validated(body)?;
    let row = widget::update_widget(&state.pool, widget_id, auth.user.id, &new)
        .await
        .map_err(|e| widget_error_to_status(&e))?;
    Ok(Json(WidgetResponse::new(row, &request_origin(&headers, state.cookie_secure))))
}

/// `POST /api/widgets/:id/toggle` — pause or resume.
pub async fn toggle_widget(
    State(state): State<AppState>,
    auth: AuthUser,
    headers: HeaderMap,
    Path(widget_id): Path<Uuid>,
) -> Result<Json<WidgetResponse>, StatusCode> {
    let row = widget::toggle_widget(&state.pool, widget_id, auth.user.id)
        .await
        .map_err(|e| widget_error_to_status(&e))?;
    Ok(Json(WidgetResponse::new(row, &request_origin(&headers, state.cookie_secure))))
}

/// `DELETE /api/widgets/:id`
pub async fn delete_widget(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(widget_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    widget::delete_widget(&state.pool, widget_id, auth.user.id)
        .await
        .map_err(|e| widget_error_to_status(&e))?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// PUBLIC
// =============================================================================

/// `{uuid}.js` to the widget id.
fn script_id(file: &str) -> Option<Uuid> {
    file.strip_suffix(".js").and_then(|id| Uuid::parse_str(id).ok())
}

/// `GET /widget/:id.js` — the embeddable script for an active widget.
pub async fn widget_script(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(file): Path<String>,
) -> Result<ScriptResponse, StatusCode> {
    let widget_id = script_id(&file).ok_or(StatusCode::NOT_FOUND)?;
    let row = widget::find_active(&state.pool, widget_id)
        .await
        .map_err(|e| widget_error_to_status(&e))?;
    let script = widget::widget_script(&row, &request_origin(&headers, state.cookie_secure));
    Ok((
        [
            (header::CONTENT_TYPE, "application/javascript; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        script,
    ))
}

/// `POST /widget/:id/leads` — form submission from an embedded widget.
pub async fn submit_widget_lead(
    State(state): State<AppState>,
    Path(widget_id): Path<Uuid>,
    Form(form): Form<LeadForm>,
) -> (StatusCode, Html<String>) {
    let row = match widget::find_active(&state.pool, widget_id).await {
        Ok(row) => row,
        Err(WidgetError::NotFound(_)) => {
            return (StatusCode::NOT_FOUND, Html(message_page("Form not found", "This form is no longer available.")));
        }
        Err(e) => {
            return (widget_error_to_status(&e), Html(message_page("Something went wrong", "Please try again later.")));
        }
    };

    let new_lead = match lead::validate(form) {
        Ok(new_lead) => new_lead,
        Err(e) => {
            warn!(%widget_id, error = %e, "widget lead rejected");
            return (lead_error_to_status(&e), Html(message_page("Please check your details", &e.to_string())));
        }
    };

    match lead::capture(&state.pool, None, row.owner_id, &new_lead).await {
        Ok(lead) => {
            info!(%widget_id, lead_id = %lead.id, "widget lead captured");
            (StatusCode::CREATED, Html(message_page("Thank you!", &row.content.thank_you_message)))
        }
        Err(e) => {
            if !matches!(e, LeadError::Database(_)) {
                warn!(%widget_id, error = %e, "widget lead capture rejected");
            }
            (lead_error_to_status(&e), Html(message_page("Something went wrong", "Please try again later.")))
        }
    }
}

#[cfg(test)]
#[path = "widgets_test.rs"]
mod tests;
