//! Public page routes — published pages, owner preview, lead capture.
//!
//! Visitors never authenticate. A page is only reachable by slug once its
//! status is `published`; anything else is a plain 404.

use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use tracing::{info, warn};
use uuid::Uuid;

use crate::builder::page::PageMeta;
use crate::builder::render::{self, Head, Node, RenderMode};
use crate::routes::auth::AuthUser;
use crate::routes::leads::lead_error_to_status;
use crate::routes::pages::page_error_to_status;
use crate::services::editor;
use crate::services::lead::{self, LeadError, LeadForm};
use crate::services::page::{self, PageError};
use crate::state::AppState;

/// Document head for a page: SEO title when set, else the page title.
pub(crate) fn page_head(meta: &PageMeta) -> Head<'_> {
    Head {
        title: meta.seo_title.as_deref().filter(|t| !t.is_empty()).unwrap_or(&meta.title),
        description: meta.seo_description.as_deref(),
    }
}

pub(crate) fn lead_action(slug: &str) -> String {
    format!("/p/{slug}/leads")
}

/// Minimal standalone page with a heading and one paragraph.
pub(crate) fn message_page(title: &str, message: &str) -> String {
    let html = Node::el("html")
        .attr("lang", "en")
        .child(
            Node::el("head")
                .child(Node::el("meta").attr("charset", "utf-8"))
                .child(Node::el("title").child(Node::text(title))),
        )
        .child(
            Node::el("body").child(
                Node::el("main")
                    .class("message")
                    .child(Node::el("h1").child(Node::text(title)))
                    .child(Node::el("p").child(Node::text(message))),
            ),
        );
    format!("<!DOCTYPE html>{}", html.to_html())
}

fn render_published(meta: &PageMeta, blocks: &[crate::builder::block::Block]) -> String {
    let mode = RenderMode::Published { lead_action: lead_action(&meta.slug) };
    render::render_document(page_head(meta), blocks, None, &mode)
}

/// `GET /p/:slug` — serve a published page and count the view.
pub async fn published_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Html<String>, StatusCode> {
    let page = page::find_published(&state.pool, &slug)
        .await
        .map_err(page_error_to_status)?;

    if let Err(e) = page::record_view(&state.pool, page.id).await {
        warn!(page_id = %page.id, error = %e, "view count update failed");
    }
    Ok(Html(render_published(&page.meta, &page.document.components)))
}

/// `GET /preview/:id` — owner preview in published mode, any status.
/// Shows unsaved edits when an editor is open.
pub async fn preview_page(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(page_id): Path<Uuid>,
) -> Result<Html<String>, StatusCode> {
    let (meta, document) = match editor::live_document(&state, page_id, auth.user.id).await {
        Some(live) => live,
        None => {
            let page = state
                .pages
                .load(page_id, auth.user.id)
                .await
                .map_err(page_error_to_status)?;
            (page.meta, page.document)
        }
    };
    Ok(Html(render_published(&meta, &document.components)))
}

/// `POST /p/:slug/leads` — contact form submission from a published page.
pub async fn submit_lead(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Form(form): Form<LeadForm>,
) -> (StatusCode, Html<String>) {
    let page = match page::find_published(&state.pool, &slug).await {
        Ok(page) => page,
        Err(PageError::NotFound(_)) => {
            return (StatusCode::NOT_FOUND, Html(message_page("Page not found", "This page is not available.")));
        }
        Err(e) => {
            return (page_error_to_status(e), Html(message_page("Something went wrong", "Please try again later.")));
        }
    };

    let new_lead = match lead::validate(form) {
        Ok(new_lead) => new_lead,
        Err(e) => {
            warn!(%slug, error = %e, "lead rejected");
            let status = lead_error_to_status(&e);
            return (status, Html(message_page("Please check your details", &e.to_string())));
        }
    };

    match lead::capture(&state.pool, Some(page.id), page.owner_id, &new_lead).await {
        Ok(row) => {
            info!(%slug, lead_id = %row.id, "lead captured");
            (
                StatusCode::CREATED,
                Html(message_page("Thank you!", "We received your request and will be in touch shortly.")),
            )
        }
        Err(e) => {
            let status = lead_error_to_status(&e);
            if !matches!(e, LeadError::Database(_)) {
                warn!(%slug, error = %e, "lead capture rejected");
            }
            (status, Html(message_page("Something went wrong", "Please try again later.")))
        }
    }
}

#[cfg(test)]
#[path = "public_test.rs"]
mod tests;
