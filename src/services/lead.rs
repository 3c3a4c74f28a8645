//! Lead service — capture from published pages and owner-side follow-up.
//!
//! DESIGN
//! ======
//! Visitors submit the contact block's form; `validate` turns the raw form
//! into a `NewLead` (trimmed, blank fields dropped, email normalized) before
//! anything touches the database. A lead needs a name and at least one way
//! to reach the person: a valid email or a phone number.
//!
//! Owner operations are scoped by `owner_id`; another owner's lead is
//! `NotFound`.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::services::email_auth::normalize_email;

const MAX_FIELD_LEN: usize = 200;
const MAX_MESSAGE_LEN: usize = 5000;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("name is required")]
    MissingName,
    #[error("invalid email address")]
    InvalidEmail,
    #[error("an email address or phone number is required")]
    MissingContact,
    #[error("{0} is too long")]
    TooLong(&'static str),
    #[error("note text is required")]
    EmptyNote,
    #[error("lead not found: {0}")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Converted,
    Lost,
}

impl LeadStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Qualified => "qualified",
            Self::Converted => "converted",
            Self::Lost => "lost",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Self::New),
            "contacted" => Some(Self::Contacted),
            "qualified" => Some(Self::Qualified),
            "converted" => Some(Self::Converted),
            "lost" => Some(Self::Lost),
            _ => None,
        }
    }
}

/// Raw contact form as posted by a visitor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LeadForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
}

/// A validated submission ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeadRow {
    pub id: Uuid,
    pub landing_page_id: Option<Uuid>,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub service: Option<String>,
    pub message: Option<String>,
    pub status: LeadStatus,
    pub created_at_ms: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteRow {
    pub id: Uuid,
    pub lead_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    pub created_at_ms: i64,
}

// =============================================================================
// VALIDATION
// =============================================================================

fn clean(value: Option<String>, field: &'static str, max: usize) -> Result<Option<String>, LeadError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > max {
        return Err(LeadError::TooLong(field));
    }
    Ok(Some(trimmed.to_owned()))
}

/// Phone numbers need at least seven digits; formatting is kept as typed.
fn is_plausible_phone(phone: &str) -> bool {
    phone.chars().filter(char::is_ascii_digit).count() >= 7
        && phone
            .chars()
            .all(|c| c.is_ascii_digit() || " +-().".contains(c))
}

/// # Errors
///
/// `MissingName`, `InvalidEmail`, `MissingContact`, or `TooLong`.
pub fn validate(form: LeadForm) -> Result<NewLead, LeadError> {
    let name = clean(form.name, "name", MAX_FIELD_LEN)?.ok_or(LeadError::MissingName)?;
    let email = match clean(form.email, "email", MAX_FIELD_LEN)? {
        Some(raw) => Some(normalize_email(&raw).ok_or(LeadError::InvalidEmail)?),
        None => None,
    };
    let phone = clean(form.phone, "phone", MAX_FIELD_LEN)?.filter(|p| is_plausible_phone(p));
    if email.is_none() && phone.is_none() {
        return Err(LeadError::MissingContact);
    }
    Ok(NewLead {
        name,
        email,
        phone,
        service: clean(form.service, "service", MAX_FIELD_LEN)?.filter(|s| s != "Select Service"),
        message: clean(form.message, "message", MAX_MESSAGE_LEN)?,
    })
}

// =============================================================================
// QUERIES
// =============================================================================

const LEAD_COLUMNS: &str = r"
    id, landing_page_id, name, email, phone, service, message, status,
    (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT AS created_at_ms";

fn lead_row(row: &PgRow) -> LeadRow {
    let status: String = row.get("status");
    LeadRow {
        id: row.get("id"),
        landing_page_id: row.get("landing_page_id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        service: row.get("service"),
        message: row.get("message"),
        status: LeadStatus::parse(&status).unwrap_or(LeadStatus::New),
        created_at_ms: row.get("created_at_ms"),
    }
}

/// Store a lead for `owner_id`, linked to `page_id` when it came from a
/// landing page (widget submissions have none).
///
/// # Errors
///
/// Returns database errors.
pub async fn capture(
    pool: &PgPool,
    page_id: Option<Uuid>,
    owner_id: Uuid,
    lead: &NewLead,
) -> Result<LeadRow, LeadError> {
    let sql = format!(
        r"INSERT INTO leads (owner_id, landing_page_id, name, email, phone, service, message, status)
          VALUES ($1, $2, $3, $4, $5, $6, $7, 'new')
          RETURNING {LEAD_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(owner_id)
        .bind(page_id)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.service)
        .bind(&lead.message)
        .fetch_one(pool)
        .await?;
    let row = lead_row(&row);
    info!(lead_id = %row.id, page_id = ?page_id, "lead captured");
    Ok(row)
}

/// Newest first, optionally filtered by status and/or page.
///
/// # Errors
///
/// Returns database errors.
pub async fn list_leads(
    pool: &PgPool,
    owner_id: Uuid,
    status: Option<LeadStatus>,
    page_id: Option<Uuid>,
) -> Result<Vec<LeadRow>, LeadError> {
    let sql = format!(
        r"SELECT {LEAD_COLUMNS}
          FROM leads
          WHERE owner_id = $1
            AND ($2::TEXT IS NULL OR status = $2)
            AND ($3::UUID IS NULL OR landing_page_id = $3)
          ORDER BY created_at DESC"
    );
    let rows = sqlx::query(&sql)
        .bind(owner_id)
        .bind(status.map(LeadStatus::as_str))
        .bind(page_id)
        .fetch_all(pool)
        .await?;
    Ok(rows.iter().map(lead_row).collect())
}

/// # Errors
///
/// `NotFound` or database errors.
pub async fn get_lead(pool: &PgPool, lead_id: Uuid, owner_id: Uuid) -> Result<LeadRow, LeadError> {
    let sql = format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = $1 AND owner_id = $2");
    let row = sqlx::query(&sql)
        .bind(lead_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or(LeadError::NotFound(lead_id))?;
    Ok(lead_row(&row))
}

/// # Errors
///
/// `NotFound` or database errors.
pub async fn update_status(
    pool: &PgPool,
    lead_id: Uuid,
    owner_id: Uuid,
    status: LeadStatus,
) -> Result<LeadRow, LeadError> {
    let sql = format!("UPDATE leads SET status = $3 WHERE id = $1 AND owner_id = $2 RETURNING {LEAD_COLUMNS}");
    let row = sqlx::query(&sql)
        .bind(lead_id)
        .bind(owner_id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .await?
        .ok_or(LeadError::NotFound(lead_id))?;
    info!(%lead_id, status = status.as_str(), "lead status updated");
    Ok(lead_row(&row))
}

fn note_row(row: &PgRow) -> NoteRow {
    NoteRow {
        id: row.get("id"),
        lead_id: row.get("lead_id"),
        author_id: row.get("author_id"),
        body: row.get("body"),
        created_at_ms: row.get("created_at_ms"),
    }
}

/// Notes on a lead, newest first.
///
/// # Errors
///
/// `NotFound` when the lead is not the owner's, or database errors.
pub async fn list_notes(pool: &PgPool, lead_id: Uuid, owner_id: Uuid) -> Result<Vec<NoteRow>, LeadError> {
    get_lead(pool, lead_id, owner_id).await?;
    let rows = sqlx::query(
        r"SELECT id, lead_id, author_id, body,
                 (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT AS created_at_ms
          FROM lead_notes
          WHERE lead_id = $1
          ORDER BY created_at DESC",
    )
    .bind(lead_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.iter().map(note_row).collect())
}

/// # Errors
///
/// `EmptyNote`, `TooLong`, `NotFound`, or database errors.
pub async fn add_note(pool: &PgPool, lead_id: Uuid, owner_id: Uuid, body: &str) -> Result<NoteRow, LeadError> {
    let body = clean(Some(body.to_owned()), "note", MAX_MESSAGE_LEN)?.ok_or(LeadError::EmptyNote)?;
    get_lead(pool, lead_id, owner_id).await?;
    let row = sqlx::query(
        r"INSERT INTO lead_notes (lead_id, author_id, body)
          VALUES ($1, $2, $3)
          RETURNING id, lead_id, author_id, body,
                    (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT AS created_at_ms",
    )
    .bind(lead_id)
    .bind(owner_id)
    .bind(&body)
    .fetch_one(pool)
    .await?;
    Ok(note_row(&row))
}

#[cfg(test)]
#[path = "lead_test.rs"]
mod tests;
