//! Automation workflow service — owner-defined "when X happens, do Y" rules.
//!
//! DESIGN
//! ======
//! A workflow is a trigger plus an ordered list of actions, each action a
//! `type` tag with a per-type `config` object. Actions are typed on the way
//! in so a stored workflow always deserializes; `conditions` are kept as the
//! client sent them (objects only). Definitions are stored, listed, paused
//! and deleted here. Nothing in this crate executes them.
//!
//! Owner operations are scoped by `owner_id`; another owner's workflow is
//! `NotFound`.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::services::lead::LeadStatus;

const MAX_NAME_LEN: usize = 120;
const MAX_TEXT_LEN: usize = 500;
const MAX_ACTIONS: usize = 20;
const MAX_CONDITIONS: usize = 20;
/// Hours; a month.
const MAX_DELAY_HOURS: u32 = 720;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("workflow name is required")]
    MissingName,
    #[error("{0} is too long")]
    TooLong(&'static str),
    #[error("too many actions (max {MAX_ACTIONS})")]
    TooManyActions,
    #[error("too many conditions (max {MAX_CONDITIONS})")]
    TooManyConditions,
    #[error("action {index}: {reason}")]
    InvalidAction { index: usize, reason: &'static str },
    #[error("condition {0} must be an object")]
    InvalidCondition(usize),
    #[error("workflow not found: {0}")]
    NotFound(Uuid),
    #[error("stored workflow is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowTrigger {
    NewLead,
    LeadStatusChange,
    AppointmentScheduled,
    QuoteRequested,
    TimeDelay,
}

impl WorkflowTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NewLead => "new_lead",
            Self::LeadStatusChange => "lead_status_change",
            Self::AppointmentScheduled => "appointment_scheduled",
            Self::QuoteRequested => "quote_requested",
            Self::TimeDelay => "time_delay",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new_lead" => Some(Self::NewLead),
            "lead_status_change" => Some(Self::LeadStatusChange),
            "appointment_scheduled" => Some(Self::AppointmentScheduled),
            "quote_requested" => Some(Self::QuoteRequested),
            "time_delay" => Some(Self::TimeDelay),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recipient {
    #[default]
    Lead,
    Team,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    #[default]
    Welcome,
    FollowUp,
    QuoteReady,
    AppointmentReminder,
    FeedbackRequest,
}

impl EmailTemplate {
    /// Subject used when the action does not set one.
    #[must_use]
    pub fn default_subject(self) -> &'static str {
        match self {
            Self::Welcome => "Thank you for your interest!",
            Self::FollowUp => "Following up on your request",
            Self::QuoteReady => "Your quote is ready!",
            Self::AppointmentReminder => "Reminder: Upcoming appointment",
            Self::FeedbackRequest => "How did we do?",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmsTemplate {
    #[default]
    WelcomeSms,
    AppointmentConfirmation,
    OnTheWay,
    QuoteReadySms,
}

impl SmsTemplate {
    /// Message body used when the action does not set one.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::WelcomeSms => "Thanks for your interest! We'll be in touch within 24 hours.",
            Self::AppointmentConfirmation => "Your appointment is confirmed for {date} at {time}.",
            Self::OnTheWay => "Our technician is on the way! ETA: {eta}",
            Self::QuoteReadySms => "Your quote is ready! Check your email or call us at {phone}.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailAction {
    #[serde(default)]
    pub recipient: Recipient,
    #[serde(default)]
    pub template: EmailTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Hours after the trigger.
    #[serde(default)]
    pub delay: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsAction {
    #[serde(default)]
    pub recipient: Recipient,
    #[serde(default)]
    pub template: SmsTemplate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default)]
    pub delay: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskAction {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Days after the trigger.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_in_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusAction {
    pub status: LeadStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceAction {
    pub sequence_id: String,
}

/// One step of a workflow, serialized as `{"type": ..., "config": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "snake_case")]
pub enum WorkflowAction {
    SendEmail(EmailAction),
    SendSms(SmsAction),
    CreateTask(TaskAction),
    UpdateLeadStatus(StatusAction),
    AddToSequence(SequenceAction),
}

/// Create body as posted by the owner.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowInput {
    pub name: String,
    pub trigger: WorkflowTrigger,
    #[serde(default)]
    pub conditions: Vec<serde_json::Value>,
    #[serde(default)]
    pub actions: Vec<WorkflowAction>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// A validated workflow ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkflow {
    pub name: String,
    pub trigger: WorkflowTrigger,
    pub conditions: Vec<serde_json::Value>,
    pub actions: Vec<WorkflowAction>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkflowRow {
    pub id: Uuid,
    pub name: String,
    pub trigger: WorkflowTrigger,
    pub conditions: Vec<serde_json::Value>,
    pub actions: Vec<WorkflowAction>,
    pub is_active: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

// =============================================================================
// VALIDATION
// =============================================================================

fn clean_text(value: Option<String>, field: &'static str) -> Result<Option<String>, WorkflowError> {
    let Some(value) = value else {
        return Ok(None);
    };
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_TEXT_LEN {
        return Err(WorkflowError::TooLong(field));
    }
    Ok(Some(trimmed.to_owned()))
}

fn check_delay(index: usize, hours: u32) -> Result<(), WorkflowError> {
    if hours > MAX_DELAY_HOURS {
        return Err(WorkflowError::InvalidAction { index, reason: "delay exceeds 720 hours" });
    }
    Ok(())
}

/// Trim free text, drop blanks, and check per-type requirements.
fn validate_action(index: usize, action: WorkflowAction) -> Result<WorkflowAction, WorkflowError> {
    let action = match action {
        WorkflowAction::SendEmail(mut email) => {
            check_delay(index, email.delay)?;
            email.subject = clean_text(email.subject, "subject")?;
            WorkflowAction::SendEmail(email)
        }
        WorkflowAction::SendSms(mut sms) => {
            check_delay(index, sms.delay)?;
            sms.message = clean_text(sms.message, "message")?;
            WorkflowAction::SendSms(sms)
        }
        WorkflowAction::CreateTask(task) => {
            let title = clean_text(Some(task.title), "task title")?
                .ok_or(WorkflowError::InvalidAction { index, reason: "task title is required" })?;
            WorkflowAction::CreateTask(TaskAction {
                title,
                assignee: clean_text(task.assignee, "assignee")?,
                description: clean_text(task.description, "task description")?,
                due_in_days: task.due_in_days,
            })
        }
        WorkflowAction::AddToSequence(seq) => {
            let sequence_id = clean_text(Some(seq.sequence_id), "sequence id")?
                .ok_or(WorkflowError::InvalidAction { index, reason: "sequence id is required" })?;
            WorkflowAction::AddToSequence(SequenceAction { sequence_id })
        }
        status @ WorkflowAction::UpdateLeadStatus(_) => status,
    };
    Ok(action)
}

/// # Errors
///
/// `MissingName`, `TooLong`, `TooManyActions`, `TooManyConditions`,
/// `InvalidAction`, or `InvalidCondition`.
pub fn validate(input: WorkflowInput) -> Result<NewWorkflow, WorkflowError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(WorkflowError::MissingName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(WorkflowError::TooLong("name"));
    }
    if input.actions.len() > MAX_ACTIONS {
        return Err(WorkflowError::TooManyActions);
    }
    if input.conditions.len() > MAX_CONDITIONS {
        return Err(WorkflowError::TooManyConditions);
    }
    if let Some(index) = input.conditions.iter().position(|c| !c.is_object()) {
        return Err(WorkflowError::InvalidCondition(index));
    }
    let actions = input
        .actions
        .into_iter()
        .enumerate()
        .map(|(index, action)| validate_action(index, action))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(NewWorkflow {
        name: name.to_owned(),
        trigger: input.trigger,
        conditions: input.conditions,
        actions,
        is_active: input.is_active.unwrap_or(true),
    })
}

// =============================================================================
// QUERIES
// =============================================================================

const WORKFLOW_COLUMNS: &str = r"
    id, name, trigger, conditions, actions, is_active,
    (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT AS created_at_ms,
    (EXTRACT(EPOCH FROM updated_at) * 1000)::BIGINT AS updated_at_ms";

fn workflow_row(row: &PgRow) -> Result<WorkflowRow, WorkflowError> {
    let trigger: String = row.get("trigger");
    let conditions: serde_json::Value = row.get("conditions");
    let actions: serde_json::Value = row.get("actions");
    Ok(WorkflowRow {
        id: row.get("id"),
        name: row.get("name"),
        trigger: WorkflowTrigger::parse(&trigger).unwrap_or(WorkflowTrigger::NewLead),
        conditions: serde_json::from_value(conditions)?,
        actions: serde_json::from_value(actions)?,
        is_active: row.get("is_active"),
        created_at_ms: row.get("created_at_ms"),
        updated_at_ms: row.get("updated_at_ms"),
    })
}

/// # Errors
///
/// Returns database or serialization errors.
pub async fn create_workflow(
    pool: &PgPool,
    owner_id: Uuid,
    workflow: &NewWorkflow,
) -> Result<WorkflowRow, WorkflowError> {
    let sql = format!(
        r"INSERT INTO automation_workflows (owner_id, name, trigger, conditions, actions, is_active)
          VALUES ($1, $2, $3, $4, $5, $6)
          RETURNING {WORKFLOW_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(owner_id)
        .bind(&workflow.name)
        .bind(workflow.trigger.as_str())
        .bind(serde_json::Value::Array(workflow.conditions.clone()))
        .bind(serde_json::to_value(&workflow.actions)?)
        .bind(workflow.is_active)
        .fetch_one(pool)
        .await?;
    let row = workflow_row(&row)?;
    info!(workflow_id = %row.id, trigger = row.trigger.as_str(), actions = row.actions.len(), "workflow created");
    Ok(row)
}

/// Newest first.
///
/// # Errors
///
/// Returns database errors, or `Malformed` for a row that no longer parses.
pub async fn list_workflows(pool: &PgPool, owner_id: Uuid) -> Result<Vec<WorkflowRow>, WorkflowError> {
    let sql = format!(
        r"SELECT {WORKFLOW_COLUMNS}
          FROM automation_workflows
          WHERE owner_id = $1
          ORDER BY created_at DESC"
    );
    let rows = sqlx::query(&sql).bind(owner_id).fetch_all(pool).await?;
    rows.iter().map(workflow_row).collect()
}

/// # Errors
///
/// `NotFound` or database errors.
pub async fn get_workflow(pool: &PgPool, workflow_id: Uuid, owner_id: Uuid) -> Result<WorkflowRow, WorkflowError> {
    let sql = format!("SELECT {WORKFLOW_COLUMNS} FROM automation_workflows WHERE id = $1 AND owner_id = $2");
    let row = sqlx::query(&sql)
        .bind(workflow_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or(WorkflowError::NotFound(workflow_id))?;
    workflow_row(&row)
}

/// Flip `is_active` and return the updated workflow.
///
/// # Errors
///
/// `NotFound` or database errors.
pub async fn toggle_workflow(pool: &PgPool, workflow_id: Uuid, owner_id: Uuid) -> Result<WorkflowRow, WorkflowError> {
    let sql = format!(
        r"UPDATE automation_workflows
          SET is_active = NOT is_active, updated_at = now()
          WHERE id = $1 AND owner_id = $2
          RETURNING {WORKFLOW_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(workflow_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or(WorkflowError::NotFound(workflow_id))?;
    let row = workflow_row(&row)?;
    info!(%workflow_id, is_active = row.is_active, "workflow toggled");
    Ok(row)
}

/// # Errors
///
/// `NotFound` or database errors.
pub async fn delete_workflow(pool: &PgPool, workflow_id: Uuid, owner_id: Uuid) -> Result<(), WorkflowError> {
    let result = sqlx::query("DELETE FROM automation_workflows WHERE id = $1 AND owner_id = $2")
        .bind(workflow_id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(WorkflowError::NotFound(workflow_id));
    }
    info!(%workflow_id, "workflow deleted");
    Ok(())
}

#[cfg(test)]
#[path = "workflow_test.rs"]
mod tests;
