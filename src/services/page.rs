//! Landing page service — catalog CRUD, slugs, stats, and the page store.
//!
//! DESIGN
//! ======
//! The editor only ever needs two document-store calls: load one page and
//! write one page back wholesale. Those sit behind `PageStore` so editing
//! sessions can run against an in-memory store in tests. Catalog operations
//! (list, duplicate, stats, public lookup) are plain functions over the pool,
//! scoped by owner.
//!
//! ERROR HANDLING
//! ==============
//! A page owned by someone else is reported as `NotFound`, never as a
//! permission error, so ids of other owners' pages cannot be probed.
//! Unique-slug violations surface as `SlugTaken` even when they race past
//! the pre-insert check.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::builder::page::{Page, PageDocument, PageMeta, PageStatus};
use crate::builder::session::SaveRequest;

const MAX_SLUG_LEN: usize = 80;
const MAX_TITLE_LEN: usize = 200;
const FALLBACK_SLUG: &str = "page";
/// Longest slug prefix shared by a base and all of its suffixed forms.
const SLUG_STEM_LEN: usize = MAX_SLUG_LEN - 12;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("page not found: {0}")]
    NotFound(Uuid),
    #[error("title must be 1-200 characters")]
    InvalidTitle,
    #[error("invalid slug: {0}")]
    InvalidSlug(String),
    #[error("slug already in use: {0}")]
    SlugTaken(String),
    #[error("stored content is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for PageError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => Self::SlugTaken(String::new()),
            _ => Self::Database(err),
        }
    }
}

/// Catalog row for one landing page.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PageRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub slug: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub status: PageStatus,
    pub views: i64,
    pub leads: i64,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

impl PageRow {
    #[must_use]
    pub fn meta(&self) -> PageMeta {
        PageMeta {
            title: self.title.clone(),
            slug: self.slug.clone(),
            seo_title: self.seo_title.clone(),
            seo_description: self.seo_description.clone(),
            status: self.status,
        }
    }

    #[must_use]
    pub fn stats(&self) -> PageStats {
        PageStats::new(self.views, self.leads)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct PageStats {
    pub views: i64,
    pub leads: i64,
    /// Leads per hundred views.
    pub conversion_rate: f64,
}

impl PageStats {
    #[must_use]
    pub fn new(views: i64, leads: i64) -> Self {
        Self { views, leads, conversion_rate: conversion_rate(views, leads) }
    }
}

/// Owner-side list filters.
#[derive(Debug, Clone, Default)]
pub struct PageFilter {
    /// Case-insensitive title substring.
    pub search: Option<String>,
    pub status: Option<PageStatus>,
}

/// Partial metadata update; `None` leaves a field as is.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct MetaUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub status: Option<PageStatus>,
}

impl MetaUpdate {
    /// Apply onto `meta`, validating title and slug.
    ///
    /// # Errors
    ///
    /// `InvalidTitle` or `InvalidSlug`.
    pub fn apply(self, mut meta: PageMeta) -> Result<PageMeta, PageError> {
        if let Some(title) = self.title {
            meta.title = validate_title(&title)?;
        }
        if let Some(slug) = self.slug {
            meta.slug = validate_slug(&slug)?;
        }
        if let Some(seo_title) = self.seo_title {
            meta.seo_title = non_empty(seo_title);
        }
        if let Some(seo_description) = self.seo_description {
            meta.seo_description = non_empty(seo_description);
        }
        if let Some(status) = self.status {
            meta.status = status;
        }
        Ok(meta)
    }
}

/// A published page as served to visitors.
#[derive(Debug, Clone)]
pub struct PublishedPage {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub meta: PageMeta,
    pub document: PageDocument,
}

// =============================================================================
// PAGE STORE
// =============================================================================

/// Document-store access used by editing sessions.
#[async_trait]
pub trait PageStore: Send + Sync {
    /// Load a page owned by `owner_id`.
    async fn load(&self, page_id: Uuid, owner_id: Uuid) -> Result<Page, PageError>;

    /// Replace the page's content and metadata.
    async fn save(&self, request: &SaveRequest) -> Result<(), PageError>;
}

/// `PageStore` over the `landing_pages` table.
pub struct PgPageStore {
    pool: PgPool,
}

impl PgPageStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PageStore for PgPageStore {
    async fn load(&self, page_id: Uuid, owner_id: Uuid) -> Result<Page, PageError> {
        let row = sqlx::query(
            r"SELECT title, slug, seo_title, seo_description, status, content
              FROM landing_pages
              WHERE id = $1 AND owner_id = $2",
        )
        .bind(page_id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(PageError::NotFound(page_id))?;

        let content: serde_json::Value = row.get("content");
        Ok(Page {
            id: page_id,
            owner_id,
            meta: meta_from_row(&row),
            document: PageDocument::from_value(content)?,
        })
    }

    async fn save(&self, request: &SaveRequest) -> Result<(), PageError> {
        let result = sqlx::query(
            r"UPDATE landing_pages
              SET title = $3, slug = $4, seo_title = $5, seo_description = $6,
                  status = $7, content = $8, updated_at = now()
              WHERE id = $1 AND owner_id = $2",
        )
        .bind(request.page_id)
        .bind(request.owner_id)
        .bind(&request.meta.title)
        .bind(&request.meta.slug)
        .bind(&request.meta.seo_title)
        .bind(&request.meta.seo_description)
        .bind(request.meta.status.as_str())
        .bind(request.document.to_value())
        .execute(&self.pool)
        .await
        .map_err(|e| slug_conflict(e, &request.meta.slug))?;

        if result.rows_affected() == 0 {
            return Err(PageError::NotFound(request.page_id));
        }
        Ok(())
    }
}

// =============================================================================
// SLUGS / VALIDATION
// =============================================================================

/// Lowercase `a-z0-9` words joined by single dashes.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() { FALLBACK_SLUG.to_owned() } else { slug.to_owned() }
}

/// Accept an explicit slug only if it is already in canonical form.
///
/// # Errors
///
/// `InvalidSlug` when the input differs from its slugified form.
pub fn validate_slug(slug: &str) -> Result<String, PageError> {
    let trimmed = slug.trim();
    if trimmed.is_empty() || slugify(trimmed) != trimmed {
        return Err(PageError::InvalidSlug(slug.to_owned()));
    }
    Ok(trimmed.to_owned())
}

/// # Errors
///
/// `InvalidTitle` for blank or overlong titles.
pub fn validate_title(title: &str) -> Result<String, PageError> {
    let trimmed = title.trim();
    if trimmed.is_empty() || trimmed.chars().count() > MAX_TITLE_LEN {
        return Err(PageError::InvalidTitle);
    }
    Ok(trimmed.to_owned())
}

/// `base-suffix`, with `base` cut so the result is still a valid slug.
#[must_use]
pub fn suffixed_slug(base: &str, suffix: &str) -> String {
    let keep = MAX_SLUG_LEN.saturating_sub(suffix.len() + 1);
    let stem = base.get(..keep).unwrap_or(base).trim_end_matches('-');
    if stem.is_empty() { format!("{FALLBACK_SLUG}-{suffix}") } else { format!("{stem}-{suffix}") }
}

/// First of `base`, `base-2`, `base-3`, ... not in `taken`.
#[must_use]
pub fn next_free_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|s| s == base) {
        return base.to_owned();
    }
    (2u32..)
        .map(|n| suffixed_slug(base, &n.to_string()))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_owned())
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn conversion_rate(views: i64, leads: i64) -> f64 {
    if views <= 0 {
        return 0.0;
    }
    leads as f64 / views as f64 * 100.0
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_owned()) }
}

fn slug_conflict(err: sqlx::Error, slug: &str) -> PageError {
    match PageError::from(err) {
        PageError::SlugTaken(_) => PageError::SlugTaken(slug.to_owned()),
        other => other,
    }
}

async fn unique_slug(pool: &PgPool, base: &str) -> Result<String, PageError> {
    // Suffixes may cut into a long base, so match on a shorter stem.
    // Slugs never contain LIKE wildcards.
    let stem = base.get(..SLUG_STEM_LEN).unwrap_or(base);
    let taken: Vec<String> = sqlx::query_scalar(
        r"SELECT slug FROM landing_pages
          WHERE slug LIKE $1 || '%'",
    )
    .bind(stem)
    .fetch_all(pool)
    .await?;
    Ok(next_free_slug(base, &taken))
}

// =============================================================================
// CATALOG
// =============================================================================

const PAGE_COLUMNS: &str = r"
    p.id, p.owner_id, p.title, p.slug, p.seo_title, p.seo_description, p.status, p.views,
    (SELECT COUNT(*) FROM leads l WHERE l.landing_page_id = p.id) AS leads,
    (EXTRACT(EPOCH FROM p.created_at) * 1000)::BIGINT AS created_at_ms,
    (EXTRACT(EPOCH FROM p.updated_at) * 1000)::BIGINT AS updated_at_ms";

fn meta_from_row(row: &PgRow) -> PageMeta {
    let status: String = row.get("status");
    PageMeta {
        title: row.get("title"),
        slug: row.get("slug"),
        seo_title: row.get("seo_title"),
        seo_description: row.get("seo_description"),
        status: PageStatus::parse(&status).unwrap_or(PageStatus::Draft),
    }
}

fn page_row(row: &PgRow) -> PageRow {
    let meta = meta_from_row(row);
    PageRow {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: meta.title,
        slug: meta.slug,
        seo_title: meta.seo_title,
        seo_description: meta.seo_description,
        status: meta.status,
        views: row.get("views"),
        leads: row.get("leads"),
        created_at_ms: row.get("created_at_ms"),
        updated_at_ms: row.get("updated_at_ms"),
    }
}

async fn fetch_page_row(pool: &PgPool, page_id: Uuid, owner_id: Uuid) -> Result<PageRow, PageError> {
    let sql = format!("SELECT {PAGE_COLUMNS} FROM landing_pages p WHERE p.id = $1 AND p.owner_id = $2");
    let row = sqlx::query(&sql)
        .bind(page_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or(PageError::NotFound(page_id))?;
    Ok(page_row(&row))
}

/// Create a draft page starting with the default hero block.
///
/// # Errors
///
/// Validation errors, `SlugTaken` on a lost insert race, or database errors.
pub async fn create_page(
    pool: &PgPool,
    owner_id: Uuid,
    title: &str,
    slug: Option<&str>,
) -> Result<PageRow, PageError> {
    let title = validate_title(title)?;
    let base = match slug {
        Some(slug) => validate_slug(slug)?,
        None => slugify(&title),
    };
    let slug = unique_slug(pool, &base).await?;

    let page_id: Uuid = sqlx::query_scalar(
        r"INSERT INTO landing_pages (owner_id, title, slug, status, content)
          VALUES ($1, $2, $3, 'draft', $4)
          RETURNING id",
    )
    .bind(owner_id)
    .bind(&title)
    .bind(&slug)
    .bind(PageDocument::starter().to_value())
    .fetch_one(pool)
    .await
    .map_err(|e| slug_conflict(e, &slug))?;

    info!(%page_id, %owner_id, %slug, "landing page created");
    fetch_page_row(pool, page_id, owner_id).await
}

/// List an owner's pages, most recently updated first.
///
/// # Errors
///
/// Returns database errors.
pub async fn list_pages(pool: &PgPool, owner_id: Uuid, filter: &PageFilter) -> Result<Vec<PageRow>, PageError> {
    let sql = format!(
        r"SELECT {PAGE_COLUMNS}
          FROM landing_pages p
          WHERE p.owner_id = $1
            AND ($2::TEXT IS NULL OR p.title ILIKE '%' || $2 || '%')
            AND ($3::TEXT IS NULL OR p.status = $3)
          ORDER BY p.updated_at DESC"
    );
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(escape_like);
    let rows = sqlx::query(&sql)
        .bind(owner_id)
        .bind(search)
        .bind(filter.status.map(PageStatus::as_str))
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(page_row).collect())
}

fn escape_like(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

/// # Errors
///
/// `NotFound` when the page does not exist for this owner.
pub async fn get_page(pool: &PgPool, page_id: Uuid, owner_id: Uuid) -> Result<PageRow, PageError> {
    fetch_page_row(pool, page_id, owner_id).await
}

/// Apply a metadata update and return the new row.
///
/// # Errors
///
/// Validation errors, `SlugTaken`, `NotFound`, or database errors.
pub async fn update_meta(
    pool: &PgPool,
    page_id: Uuid,
    owner_id: Uuid,
    update: MetaUpdate,
) -> Result<PageRow, PageError> {
    let current = fetch_page_row(pool, page_id, owner_id).await?;
    let meta = update.apply(current.meta())?;

    sqlx::query(
        r"UPDATE landing_pages
          SET title = $3, slug = $4, seo_title = $5, seo_description = $6, status = $7,
              updated_at = now()
          WHERE id = $1 AND owner_id = $2",
    )
    .bind(page_id)
    .bind(owner_id)
    .bind(&meta.title)
    .bind(&meta.slug)
    .bind(&meta.seo_title)
    .bind(&meta.seo_description)
    .bind(meta.status.as_str())
    .execute(pool)
    .await
    .map_err(|e| slug_conflict(e, &meta.slug))?;

    fetch_page_row(pool, page_id, owner_id).await
}

/// Copy a page's content into a new draft titled `"<title> (Copy)"`.
///
/// # Errors
///
/// `NotFound` for the source page, or database errors.
pub async fn duplicate_page(pool: &PgPool, page_id: Uuid, owner_id: Uuid) -> Result<PageRow, PageError> {
    let source = sqlx::query("SELECT title, slug, seo_title, seo_description, content FROM landing_pages WHERE id = $1 AND owner_id = $2")
        .bind(page_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or(PageError::NotFound(page_id))?;

    let title: String = source.get("title");
    let title = copy_title(&title);
    let source_slug: String = source.get("slug");
    let slug = unique_slug(pool, &suffixed_slug(&source_slug, "copy")).await?;
    let content: serde_json::Value = source.get("content");

    let copy_id: Uuid = sqlx::query_scalar(
        r"INSERT INTO landing_pages (owner_id, title, slug, seo_title, seo_description, status, content)
          VALUES ($1, $2, $3, $4, $5, 'draft', $6)
          RETURNING id",
    )
    .bind(owner_id)
    .bind(&title)
    .bind(&slug)
    .bind(source.get::<Option<String>, _>("seo_title"))
    .bind(source.get::<Option<String>, _>("seo_description"))
    .bind(content)
    .fetch_one(pool)
    .await
    .map_err(|e| slug_conflict(e, &slug))?;

    info!(%page_id, %copy_id, "landing page duplicated");
    fetch_page_row(pool, copy_id, owner_id).await
}

/// `"<title> (Copy)"`, cut so the result stays a valid title.
#[must_use]
pub fn copy_title(title: &str) -> String {
    const SUFFIX: &str = " (Copy)";
    let keep = MAX_TITLE_LEN - SUFFIX.len();
    let base: String = title.chars().take(keep).collect();
    format!("{}{SUFFIX}", base.trim_end())
}

/// # Errors
///
/// `NotFound` when nothing was deleted.
pub async fn delete_page(pool: &PgPool, page_id: Uuid, owner_id: Uuid) -> Result<(), PageError> {
    let result = sqlx::query("DELETE FROM landing_pages WHERE id = $1 AND owner_id = $2")
        .bind(page_id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(PageError::NotFound(page_id));
    }
    info!(%page_id, "landing page deleted");
    Ok(())
}

// =============================================================================
// PUBLIC
// =============================================================================

/// Look up a published page by slug.
///
/// # Errors
///
/// `NotFound` (with a nil id) for unknown or unpublished slugs.
pub async fn find_published(pool: &PgPool, slug: &str) -> Result<PublishedPage, PageError> {
    let row = sqlx::query(
        r"SELECT id, owner_id, title, slug, seo_title, seo_description, status, content
          FROM landing_pages
          WHERE slug = $1 AND status = 'published'",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .ok_or(PageError::NotFound(Uuid::nil()))?;

    let content: serde_json::Value = row.get("content");
    Ok(PublishedPage {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        meta: meta_from_row(&row),
        document: PageDocument::from_value(content)?,
    })
}

/// Bump the view counter of a page.
///
/// # Errors
///
/// Returns database errors.
pub async fn record_view(pool: &PgPool, page_id: Uuid) -> Result<(), PageError> {
    sqlx::query("UPDATE landing_pages SET views = views + 1 WHERE id = $1")
        .bind(page_id)
        .execute(pool)
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
