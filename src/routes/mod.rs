//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router carries the owner JSON API under `/api` (auth, page
//! catalog, editor, leads, workflows, widgets, analytics), public published
//! pages and lead capture under `/p`, embeddable widgets under `/widget`,
//! and the owner preview under `/preview`.

pub mod analytics;
pub mod auth;
pub mod editor;
pub mod leads;
pub mod pages;
pub mod public;
pub mod widgets;
pub mod workflows;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Owner API: auth, catalog, editor sessions, leads, automation.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/email/request-code", post(auth::request_email_code))
        .route("/api/auth/email/verify-code", post(auth::verify_email_code))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/block-types", get(editor::block_types))
        .route("/api/pages", get(pages::list_pages).post(pages::create_page))
        .route(
            "/api/pages/{id}",
            get(pages::get_page).patch(pages::update_page).delete(pages::delete_page),
        )
        .route("/api/pages/{id}/duplicate", post(pages::duplicate_page))
        .route("/api/pages/{id}/stats", get(pages::page_stats))
        .route(
            "/api/pages/{id}/editor",
            post(editor::open_editor).get(editor::get_editor).delete(editor::close_editor),
        )
        .route("/api/pages/{id}/editor/blocks", post(editor::add_block))
        .route(
            "/api/pages/{id}/editor/blocks/{block_id}",
            axum::routing::delete(editor::delete_block),
        )
        .route("/api/pages/{id}/editor/blocks/{block_id}/fields/{key}", put(editor::set_field))
        .route(
            "/api/pages/{id}/editor/blocks/{block_id}/fields/{key}/items",
            post(editor::append_item),
        )
        .route(
            "/api/pages/{id}/editor/blocks/{block_id}/fields/{key}/items/{index}",
            patch(editor::set_item_field).delete(editor::remove_item),
        )
        .route("/api/pages/{id}/editor/move", post(editor::move_block))
        .route("/api/pages/{id}/editor/select", post(editor::select_block))
        .route("/api/pages/{id}/editor/meta", put(editor::set_meta))
        .route("/api/pages/{id}/editor/save", post(editor::save_editor))
        .route("/api/pages/{id}/editor/render", get(editor::render_editor))
        .route("/api/leads", get(leads::list_leads))
        .route("/api/leads/{id}", get(leads::get_lead).patch(leads::update_lead))
        .route("/api/leads/{id}/notes", get(leads::list_notes).post(leads::add_note))
        .route("/api/workflows", get(workflows::list_workflows).post(workflows::create_workflow))
        .route(
            "/api/workflows/{id}",
            get(workflows::get_workflow).delete(workflows::delete_workflow),
        )
        .route("/api/workflows/{id}/toggle", post(workflows::toggle_workflow))
        .route("/api/widgets", get(widgets::list_widgets).post(widgets::create_widget))
        .route(
            "/api/widgets/{id}",
            get(widgets::get_widget).put(widgets::update_widget).delete(widgets::delete_widget),
        )
        .route("/api/widgets/{id}/toggle", post(widgets::toggle_widget))
        .route("/api/analytics", get(analytics::owner_analytics))
}

/// Visitor-facing pages, embeddable widgets and the owner preview.
fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/p/{slug}", get(public::published_page))
        .route("/p/{slug}/leads", post(public::submit_lead))
        .route("/preview/{id}", get(public::preview_page))
        // `{id}` is `<uuid>.js` for the script.
        .route("/widget/{id}", get(widgets::widget_script))
        .route("/widget/{id}/leads", post(widgets::submit_widget_lead))
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes())
        .merge(page_routes())
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
