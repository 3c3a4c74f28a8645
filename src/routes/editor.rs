//! Editor routes — HTTP surface over live editing sessions.
//!
//! DESIGN
//! ======
//! Every mutating route returns the full `EditorSnapshot` so the client can
//! redraw canvas, selection, panel and save indicator from one response.
//! Sessions are scoped to the caller: another owner's page id looks exactly
//! like a page that is not open.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, Json};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::builder::block::{Content, FieldValue, Scalar};
use crate::builder::canvas::CanvasError;
use crate::builder::render::{self, RenderMode};
use crate::builder::schema::{self, BlockKind, SchemaError};
use crate::builder::session::SessionError;
use crate::routes::auth::AuthUser;
use crate::routes::pages::page_error_to_status;
use crate::routes::public::page_head;
use crate::services::editor::{self, EditorError, EditorSnapshot};
use crate::services::page::MetaUpdate;
use crate::state::AppState;

// =============================================================================
// ERROR MAPPING
// =============================================================================

pub(crate) fn schema_error_to_status(err: &SchemaError) -> StatusCode {
    match err {
        SchemaError::IndexOutOfRange { .. } => StatusCode::BAD_REQUEST,
        SchemaError::NoSchema(_)
        | SchemaError::UnknownField { .. }
        | SchemaError::TypeMismatch { .. }
        | SchemaError::NotAList { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

pub(crate) fn session_error_to_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::Loading | SessionError::AlreadyLoaded | SessionError::SaveInFlight | SessionError::NotSaving => {
            StatusCode::CONFLICT
        }
        SessionError::Canvas(CanvasError::BlockNotFound(_)) => StatusCode::NOT_FOUND,
        SessionError::Canvas(CanvasError::DuplicateId(_)) => StatusCode::CONFLICT,
        SessionError::Canvas(CanvasError::IndexOutOfRange { .. }) => StatusCode::BAD_REQUEST,
        SessionError::Canvas(CanvasError::Schema(e)) | SessionError::Schema(e) => schema_error_to_status(e),
    }
}

pub(crate) fn editor_error_to_status(err: EditorError) -> StatusCode {
    match err {
        EditorError::NotOpen(_) => StatusCode::NOT_FOUND,
        EditorError::LoadFailed(e) => page_error_to_status(e),
        EditorError::SaveFailed(e) => {
            error!(error = %e, "editor save failed");
            page_error_to_status(e)
        }
        EditorError::Session(e) => session_error_to_status(&e),
    }
}

// =============================================================================
// COMPONENT LIBRARY
// =============================================================================

#[derive(Serialize)]
pub struct BlockFieldResponse {
    pub key: &'static str,
    pub label: &'static str,
    pub input: &'static str,
}

/// One card of the component library.
#[derive(Serialize)]
pub struct BlockTypeResponse {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub fields: Vec<BlockFieldResponse>,
    pub default_content: Content,
}

/// `GET /api/block-types` — the component library, in display order.
pub async fn block_types() -> Json<Vec<BlockTypeResponse>> {
    let cards = schema::library()
        .map(|schema| BlockTypeResponse {
            kind: schema.kind.as_str(),
            name: schema.name,
            icon: schema.icon,
            description: schema.description,
            fields: schema
                .fields
                .iter()
                .map(|f| BlockFieldResponse { key: f.key, label: f.label, input: f.input.tag() })
                .collect(),
            default_content: schema.default_content(),
        })
        .collect();
    Json(cards)
}

// =============================================================================
// SESSION LIFECYCLE
// =============================================================================

/// `POST /api/pages/:id/editor` — open (or rejoin) the editing session.
pub async fn open_editor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let snap = editor::open(&state, page_id, auth.user.id)
        .await
        .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

/// `GET /api/pages/:id/editor`
pub async fn get_editor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let snap = editor::snapshot(&state, page_id, auth.user.id)
        .await
        .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

/// `DELETE /api/pages/:id/editor` — close, discarding unsaved edits.
pub async fn close_editor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<StatusCode, StatusCode> {
    editor::close(&state, page_id, auth.user.id)
        .await
        .map_err(editor_error_to_status)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/pages/:id/editor/save`
pub async fn save_editor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let snap = editor::save(&state, page_id, auth.user.id)
        .await
        .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

/// `GET /api/pages/:id/editor/render` — canvas HTML in editor mode.
pub async fn render_editor(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<Html<String>, StatusCode> {
    let html = editor::with_session(&state, page_id, auth.user.id, |session| {
        let meta = session.meta().ok_or(SessionError::Loading)?;
        let canvas = session.canvas();
        Ok(render::render_document(
            page_head(meta),
            canvas.blocks(),
            canvas.selected_id(),
            &RenderMode::Editor,
        ))
    })
    .await
    .map_err(editor_error_to_status)?;
    Ok(Html(html))
}

// =============================================================================
// CANVAS
// =============================================================================

#[derive(Deserialize)]
pub struct AddBlockBody {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Serialize)]
pub struct AddBlockResponse {
    pub block_id: String,
    pub editor: EditorSnapshot,
}

#[derive(Deserialize)]
pub struct MoveBlockBody {
    pub from: usize,
    pub to: usize,
}

#[derive(Deserialize)]
pub struct SelectBlockBody {
    pub block_id: Option<String>,
}

/// `POST /api/pages/:id/editor/blocks` — append a block of the given type
/// with its default content.
pub async fn add_block(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
    Json(body): Json<AddBlockBody>,
) -> Result<(StatusCode, Json<AddBlockResponse>), StatusCode> {
    let kind = BlockKind::parse(body.kind.trim());
    let (block_id, editor) = editor::edit(&state, page_id, auth.user.id, |s| s.add_block(kind))
        .await
        .map_err(editor_error_to_status)?;
    Ok((StatusCode::CREATED, Json(AddBlockResponse { block_id, editor })))
}

/// `DELETE /api/pages/:id/editor/blocks/:block_id`
pub async fn delete_block(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((page_id, block_id)): Path<(Uuid, String)>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let ((), snap) = editor::edit(&state, page_id, auth.user.id, |s| s.delete_block(&block_id))
        .await
        .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

/// `POST /api/pages/:id/editor/move` — move the block at `from` to `to`.
pub async fn move_block(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
    Json(body): Json<MoveBlockBody>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let ((), snap) = editor::edit(&state, page_id, auth.user.id, |s| s.move_block(body.from, body.to))
        .await
        .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

/// `POST /api/pages/:id/editor/select` — select a block, or clear with `null`.
pub async fn select_block(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
    Json(body): Json<SelectBlockBody>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let ((), snap) = editor::edit(&state, page_id, auth.user.id, |s| s.select(body.block_id.as_deref()))
        .await
        .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

// =============================================================================
// PROPERTIES
// =============================================================================

#[derive(Deserialize)]
pub struct SetFieldBody {
    pub value: FieldValue,
}

#[derive(Deserialize)]
pub struct SetItemFieldBody {
    /// Record field to edit; absent for plain string lists.
    pub item_key: Option<String>,
    pub value: Scalar,
}

#[derive(Debug, Serialize)]
pub struct AppendItemResponse {
    pub index: usize,
    pub editor: EditorSnapshot,
}

/// `PUT /api/pages/:id/editor/blocks/:block_id/fields/:key`
pub async fn set_field(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((page_id, block_id, key)): Path<(Uuid, String, String)>,
    Json(body): Json<SetFieldBody>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let ((), snap) = editor::edit(&state, page_id, auth.user.id, |s| s.set_field(&block_id, &key, body.value))
        .await
        .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

/// `POST /api/pages/:id/editor/blocks/:block_id/fields/:key/items`
pub async fn append_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((page_id, block_id, key)): Path<(Uuid, String, String)>,
) -> Result<(StatusCode, Json<AppendItemResponse>), StatusCode> {
    let (index, editor) = editor::edit(&state, page_id, auth.user.id, |s| s.append_item(&block_id, &key))
        .await
        .map_err(editor_error_to_status)?;
    Ok((StatusCode::CREATED, Json(AppendItemResponse { index, editor })))
}

/// `PATCH /api/pages/:id/editor/blocks/:block_id/fields/:key/items/:index`
pub async fn set_item_field(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((page_id, block_id, key, index)): Path<(Uuid, String, String, usize)>,
    Json(body): Json<SetItemFieldBody>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let ((), snap) = editor::edit(&state, page_id, auth.user.id, |s| {
        s.set_item_field(&block_id, &key, index, body.item_key.as_deref(), body.value)
    })
    .await
    .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

/// `DELETE /api/pages/:id/editor/blocks/:block_id/fields/:key/items/:index`
pub async fn remove_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((page_id, block_id, key, index)): Path<(Uuid, String, String, usize)>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let (_removed, snap) = editor::edit(&state, page_id, auth.user.id, |s| s.remove_item(&block_id, &key, index))
        .await
        .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

/// `PUT /api/pages/:id/editor/meta` — stage metadata changes; written on save.
pub async fn set_meta(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
    Json(body): Json<MetaUpdate>,
) -> Result<Json<EditorSnapshot>, StatusCode> {
    let current = editor::snapshot(&state, page_id, auth.user.id)
        .await
        .map_err(editor_error_to_status)?
        .meta
        .ok_or(StatusCode::CONFLICT)?;
    let meta = body.apply(current).map_err(page_error_to_status)?;
    let ((), snap) = editor::edit(&state, page_id, auth.user.id, |s| s.set_meta(meta))
        .await
        .map_err(editor_error_to_status)?;
    Ok(Json(snap))
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
