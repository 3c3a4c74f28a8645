//! Lead capture widgets — embeddable contact forms for sites outside landkit.
//!
//! DESIGN
//! ======
//! A widget is a small form (chosen contact fields, colours, copy) plus a
//! display kind and a trigger. Owners manage widgets over the API; visitors
//! get them through an embed snippet that loads `/widget/{id}.js`. The
//! script is generated per request from the stored row and posts to
//! `/widget/{id}/leads`, which captures a lead like a page's contact block
//! (no landing page attached).
//!
//! Only active widgets are served. Styling values end up inside a `style`
//! attribute, so they are restricted to hex colours and plain lengths.

use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::builder::render::{Node, contact_input};

const MAX_NAME_LEN: usize = 120;
const MAX_COPY_LEN: usize = 500;
const MAX_TIME_DELAY_SECS: u32 = 600;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    #[error("widget name is required")]
    MissingName,
    #[error("{0} is required")]
    MissingCopy(&'static str),
    #[error("{0} is too long")]
    TooLong(&'static str),
    #[error("delay out of range for this trigger")]
    InvalidDelay,
    #[error("widget form must ask for a name")]
    MissingNameField,
    #[error("widget form must ask for an email or phone number")]
    MissingContactField,
    #[error("{0} must be a hex colour")]
    InvalidColor(&'static str),
    #[error("border radius must be a plain length")]
    InvalidRadius,
    #[error("widget not found: {0}")]
    NotFound(Uuid),
    #[error("stored widget is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetKind {
    #[default]
    Popup,
    Inline,
    SlideIn,
    StickyBar,
}

impl WidgetKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Popup => "popup",
            Self::Inline => "inline",
            Self::SlideIn => "slide-in",
            Self::StickyBar => "sticky-bar",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "popup" => Some(Self::Popup),
            "inline" => Some(Self::Inline),
            "slide-in" => Some(Self::SlideIn),
            "sticky-bar" => Some(Self::StickyBar),
            _ => None,
        }
    }

    fn position_style(self) -> &'static str {
        match self {
            Self::Popup => "position: fixed; top: 50%; left: 50%; transform: translate(-50%, -50%); z-index: 9999",
            Self::Inline => "",
            Self::SlideIn => "position: fixed; right: 16px; bottom: 16px; z-index: 9999",
            Self::StickyBar => "position: fixed; left: 0; right: 0; bottom: 0; z-index: 9999",
        }
    }
}

/// When the widget appears. `delay` is seconds for `Time` and a scroll
/// percentage for `Scroll`; the other triggers ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WidgetTrigger {
    #[default]
    Time,
    Scroll,
    ExitIntent,
    Immediate,
}

impl WidgetTrigger {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Time => "time",
            Self::Scroll => "scroll",
            Self::ExitIntent => "exit-intent",
            Self::Immediate => "immediate",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "time" => Some(Self::Time),
            "scroll" => Some(Self::Scroll),
            "exit-intent" => Some(Self::ExitIntent),
            "immediate" => Some(Self::Immediate),
            _ => None,
        }
    }
}

/// Form fields a widget can ask for; each maps onto a lead column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetField {
    Name,
    Email,
    Phone,
    Service,
    Message,
}

impl WidgetField {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Service => "service",
            Self::Message => "message",
        }
    }
}

fn default_fields() -> Vec<WidgetField> {
    vec![WidgetField::Name, WidgetField::Email, WidgetField::Phone, WidgetField::Service]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetStyling {
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub border_radius: String,
}

impl Default for WidgetStyling {
    fn default() -> Self {
        Self {
            primary_color: "#3b82f6".into(),
            background_color: "#ffffff".into(),
            text_color: "#1f2937".into(),
            border_radius: "8px".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetContent {
    pub headline: String,
    pub description: String,
    pub cta_text: String,
    pub thank_you_message: String,
}

impl Default for WidgetContent {
    fn default() -> Self {
        Self {
            headline: "Get Your Free Quote".into(),
            description: "Fill out this quick form and we'll get back to you within 24 hours".into(),
            cta_text: "Get Quote".into(),
            thank_you_message: "Thank you! We'll be in touch soon.".into(),
        }
    }
}

/// Create/replace body as posted by the owner. Omitted parts take the
/// starter defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetInput {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: WidgetKind,
    #[serde(default)]
    pub trigger: WidgetTrigger,
    #[serde(default = "default_delay")]
    pub delay: u32,
    #[serde(default = "default_fields")]
    pub fields: Vec<WidgetField>,
    #[serde(default)]
    pub styling: WidgetStyling,
    #[serde(default)]
    pub content: WidgetContent,
}

fn default_delay() -> u32 {
    5
}

/// A validated widget ready to insert or apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWidget {
    pub name: String,
    pub kind: WidgetKind,
    pub trigger: WidgetTrigger,
    pub delay: i32,
    pub fields: Vec<WidgetField>,
    pub styling: WidgetStyling,
    pub content: WidgetContent,
}

#[derive(Debug, Clone, Serialize)]
pub struct WidgetRow {
    pub id: Uuid,
    #[serde(skip)]
    pub owner_id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub trigger: WidgetTrigger,
    pub delay: i32,
    pub fields: Vec<WidgetField>,
    pub styling: WidgetStyling,
    pub content: WidgetContent,
    pub is_active: bool,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
}

// =============================================================================
// VALIDATION
// =============================================================================

fn is_hex_color(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

/// `0`, `8px`, `1.5rem`, `50%` and the like.
fn is_plain_length(value: &str) -> bool {
    let number = ["px", "rem", "em", "%"]
        .iter()
        .find_map(|unit| value.strip_suffix(unit))
        .unwrap_or(value);
    !number.is_empty()
        && number.len() <= 6
        && number.chars().all(|c| c.is_ascii_digit() || c == '.')
        && number.chars().filter(|c| *c == '.').count() <= 1
}

fn copy_text(value: &str, field: &'static str, required: bool) -> Result<String, WidgetError> {
    let trimmed = value.trim();
    if required && trimmed.is_empty() {
        return Err(WidgetError::MissingCopy(field));
    }
    if trimmed.chars().count() > MAX_COPY_LEN {
        return Err(WidgetError::TooLong(field));
    }
    Ok(trimmed.to_owned())
}

fn validate_styling(styling: WidgetStyling) -> Result<WidgetStyling, WidgetError> {
    let color = |value: String, field: &'static str| {
        let value = value.trim().to_ascii_lowercase();
        if is_hex_color(&value) { Ok(value) } else { Err(WidgetError::InvalidColor(field)) }
    };
    let border_radius = styling.border_radius.trim().to_owned();
    if !is_plain_length(&border_radius) {
        return Err(WidgetError::InvalidRadius);
    }
    Ok(WidgetStyling {
        primary_color: color(styling.primary_color, "primary colour")?,
        background_color: color(styling.background_color, "background colour")?,
        text_color: color(styling.text_color, "text colour")?,
        border_radius,
    })
}

/// # Errors
///
/// `MissingName`, `TooLong`, `MissingCopy`, `InvalidDelay`,
/// `MissingNameField`, `MissingContactField`, `InvalidColor`, or
/// `InvalidRadius`.
pub fn validate(input: WidgetInput) -> Result<NewWidget, WidgetError> {
    let name = input.name.trim();
    if name.is_empty() {
        return Err(WidgetError::MissingName);
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(WidgetError::TooLong("name"));
    }

    let delay = match input.trigger {
        WidgetTrigger::Time if input.delay > MAX_TIME_DELAY_SECS => return Err(WidgetError::InvalidDelay),
        WidgetTrigger::Scroll if input.delay > 100 => return Err(WidgetError::InvalidDelay),
        WidgetTrigger::Time | WidgetTrigger::Scroll => i32::try_from(input.delay).map_err(|_| WidgetError::InvalidDelay)?,
        WidgetTrigger::ExitIntent | WidgetTrigger::Immediate => 0,
    };

    let mut fields: Vec<WidgetField> = Vec::with_capacity(input.fields.len());
    for field in input.fields {
        if !fields.contains(&field) {
            fields.push(field);
        }
    }
    if !fields.contains(&WidgetField::Name) {
        return Err(WidgetError::MissingNameField);
    }
    if !fields.contains(&WidgetField::Email) && !fields.contains(&WidgetField::Phone) {
        return Err(WidgetError::MissingContactField);
    }

    let content = WidgetContent {
        headline: copy_text(&input.content.headline, "headline", true)?,
        description: copy_text(&input.content.description, "description", false)?,
        cta_text: copy_text(&input.content.cta_text, "button text", true)?,
        thank_you_message: copy_text(&input.content.thank_you_message, "thank-you message", true)?,
    };

    Ok(NewWidget {
        name: name.to_owned(),
        kind: input.kind,
        trigger: input.trigger,
        delay,
        fields,
        styling: validate_styling(input.styling)?,
        content,
    })
}

// =============================================================================
// EMBED
// =============================================================================

/// Snippet an owner pastes into their site. `origin` is the scheme and host
/// the widget is served from; empty gives a root-relative URL.
#[must_use]
pub fn embed_code(origin: &str, widget_id: Uuid) -> String {
    let origin = origin.trim_end_matches('/');
    format!("<script src=\"{origin}/widget/{widget_id}.js\" async></script>")
}

#[must_use]
pub fn lead_url(origin: &str, widget_id: Uuid) -> String {
    format!("{}/widget/{widget_id}/leads", origin.trim_end_matches('/'))
}

/// The widget's form markup.
#[must_use]
pub fn widget_markup(widget: &WidgetRow, origin: &str) -> Node {
    let styling = &widget.styling;
    let mut style = format!(
        "background-color: {}; color: {}; border-radius: {}; padding: 24px; max-width: 420px",
        styling.background_color, styling.text_color, styling.border_radius
    );
    let position = widget.kind.position_style();
    if !position.is_empty() {
        style = format!("{style}; {position}");
    }

    let mut body = vec![Node::el("h3").child(Node::text(widget.content.headline.clone()))];
    if !widget.content.description.is_empty() {
        body.push(Node::el("p").child(Node::text(widget.content.description.clone())));
    }
    let form = Node::el("form")
        .attr("method", "post")
        .attr("action", lead_url(origin, widget.id))
        .children(widget.fields.iter().map(|f| contact_input(f.as_str())))
        .child(
            Node::el("button")
                .attr("type", "submit")
                .attr(
                    "style",
                    format!(
                        "background-color: {}; color: #ffffff; border-radius: {}",
                        styling.primary_color, styling.border_radius
                    ),
                )
                .child(Node::text(widget.content.cta_text.clone())),
        );
    body.push(form);

    Node::el("div")
        .class(&format!("landkit-widget landkit-widget--{}", widget.kind.as_str()))
        .attr("data-widget-id", widget.id.to_string())
        .attr("style", style)
        .children(body)
}

/// JavaScript served at `/widget/{id}.js`: builds the form and shows it when
/// the trigger fires. Inline widgets mount where the script tag sits.
#[must_use]
pub fn widget_script(widget: &WidgetRow, origin: &str) -> String {
    let html = serde_json::Value::String(widget_markup(widget, origin).to_html());
    let mount = match widget.kind {
        WidgetKind::Inline => "s.parentNode.insertBefore(w, s);",
        WidgetKind::Popup | WidgetKind::SlideIn | WidgetKind::StickyBar => "document.body.appendChild(w);",
    };
    let arm = match widget.trigger {
        WidgetTrigger::Immediate => "show();".to_owned(),
        WidgetTrigger::Time => format!("setTimeout(show, {});", i64::from(widget.delay) * 1000),
        WidgetTrigger::Scroll => format!(
            "window.addEventListener(\"scroll\", function h() {{ var d = document.documentElement; \
             if ((window.scrollY + window.innerHeight) * 100 >= {} * d.scrollHeight) \
             {{ window.removeEventListener(\"scroll\", h); show(); }} }});",
            widget.delay
        ),
        WidgetTrigger::ExitIntent => "document.addEventListener(\"mouseout\", function h(e) { \
             if (!e.relatedTarget && e.clientY <= 0) { document.removeEventListener(\"mouseout\", h); show(); } });"
            .to_owned(),
    };
    format!(
        "(function () {{\n  var s = document.currentScript;\n  var t = document.createElement(\"div\");\n  \
         t.innerHTML = {html};\n  var w = t.firstChild;\n  var shown = false;\n  \
         function show() {{ if (shown) return; shown = true; {mount} }}\n  {arm}\n}})();\n"
    )
}

// =============================================================================
// QUERIES
// =============================================================================

const WIDGET_COLUMNS: &str = r"
    id, owner_id, name, kind, trigger, delay, fields, styling, content, is_active,
    (EXTRACT(EPOCH FROM created_at) * 1000)::BIGINT AS created_at_ms,
    (EXTRACT(EPOCH FROM updated_at) * 1000)::BIGINT AS updated_at_ms";

fn widget_row(row: &PgRow) -> Result<WidgetRow, WidgetError> {
    let kind: String = row.get("kind");
    let trigger: String = row.get("trigger");
    let fields: serde_json::Value = row.get("fields");
    let styling: serde_json::Value = row.get("styling");
    let content: serde_json::Value = row.get("content");
    Ok(WidgetRow {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        kind: WidgetKind::parse(&kind).unwrap_or_default(),
        trigger: WidgetTrigger::parse(&trigger).unwrap_or_default(),
        delay: row.get("delay"),
        fields: serde_json::from_value(fields)?,
        styling: serde_json::from_value(styling)?,
        content: serde_json::from_value(content)?,
        is_active: row.get("is_active"),
        created_at_ms: row.get("created_at_ms"),
        updated_at_ms: row.get("updated_at_ms"),
    })
}

/// New widgets start active.
///
/// # Errors
///
/// Returns database or serialization errors.
pub async fn create_widget(pool: &PgPool, owner_id: Uuid, widget: &NewWidget) -> Result<WidgetRow, WidgetError> {
    let sql = format!(
        r"INSERT INTO lead_capture_widgets (owner_id, name, kind, trigger, delay, fields, styling, content)
          VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
          RETURNING {WIDGET_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(owner_id)
        .bind(&widget.name)
        .bind(widget.kind.as_str())
        .bind(widget.trigger.as_str())
        .bind(widget.delay)
        .bind(serde_json::to_value(&widget.fields)?)
        .bind(serde_json::to_value(&widget.styling)?)
        .bind(serde_json::to_value(&widget.content)?)
        .fetch_one(pool)
        .await?;
    let row = widget_row(&row)?;
    info!(widget_id = %row.id, kind = row.kind.as_str(), "widget created");
    Ok(row)
}

/// Newest first.
///
/// # Errors
///
/// Returns database errors, or `Malformed` for a row that no longer parses.
pub async fn list_widgets(pool: &PgPool, owner_id: Uuid) -> Result<Vec<WidgetRow>, WidgetError> {
    let sql = format!(
        r"SELECT {WIDGET_COLUMNS}
          FROM lead_capture_widgets
          WHERE owner_id = $1
          ORDER BY created_at DESC"
    );
    let rows = sqlx::query(&sql).bind(owner_id).fetch_all(pool).await?;
    rows.iter().map(widget_row).collect()
}

/// # Errors
///
/// `NotFound` or database errors.
pub async fn get_widget(pool: &PgPool, widget_id: Uuid, owner_id: Uuid) -> Result<WidgetRow, WidgetError> {
    let sql = format!("SELECT {WIDGET_COLUMNS} FROM lead_capture_widgets WHERE id = $1 AND owner_id = $2");
    let row = sqlx::query(&sql)
        .bind(widget_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or(WidgetError::NotFound(widget_id))?;
    widget_row(&row)
}

/// Replace a widget's configuration; `is_active` is left alone.
///
/// # Errors
///
/// `NotFound` or database errors.
pub async fn update_widget(
    pool: &PgPool,
    widget_id: Uuid,
    owner_id: Uuid,
    widget: &NewWidget,
) -> Result<WidgetRow, WidgetError> {
    let sql = format!(
        r"UPDATE lead_capture_widgets
          SET name = $3, kind = $4, trigger = $5, delay = $6, fields = $7, styling = $8, content = $9,
              updated_at = now()
          WHERE id = $1 AND owner_id = $2
          RETURNING {WIDGET_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(widget_id)
        .bind(owner_id)
        .bind(&widget.name)
        .bind(widget.kind.as_str())
        .bind(widget.trigger.as_str())
        .bind(widget.delay)
        .bind(serde_json::to_value(&widget.fields)?)
        .bind(serde_json::to_value(&widget.styling)?)
        .bind(serde_json::to_value(&widget.content)?)
        .fetch_optional(pool)
        .await?
        .ok_or(WidgetError::NotFound(widget_id))?;
    info!(%widget_id, "widget updated");
    widget_row(&row)
}

/// Flip `is_active` and return the updated widget.
///
/// # Errors
///
/// `NotFound` or database errors.
pub async fn toggle_widget(pool: &PgPool, widget_id: Uuid, owner_id: Uuid) -> Result<WidgetRow, WidgetError> {
    let sql = format!(
        r"UPDATE lead_capture_widgets
          SET is_active = NOT is_active, updated_at = now()
          WHERE id = $1 AND owner_id = $2
          RETURNING {WIDGET_COLUMNS}"
    );
    let row = sqlx::query(&sql)
        .bind(widget_id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or(WidgetError::NotFound(widget_id))?;
    let row = widget_row(&row)?;
    info!(%widget_id, is_active = row.is_active, "widget toggled");
    Ok(row)
}

/// # Errors
///
/// `NotFound` or database errors.
pub async fn delete_widget(pool: &PgPool, widget_id: Uuid, owner_id: Uuid) -> Result<(), WidgetError> {
    let result = sqlx::query("DELETE FROM lead_capture_widgets WHERE id = $1 AND owner_id = $2")
        .bind(widget_id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(WidgetError::NotFound(widget_id));
    }
    info!(%widget_id, "widget deleted");
    Ok(())
}

/// Public lookup; paused widgets are `NotFound`.
///
/// # Errors
///
/// `NotFound` or database errors.
pub async fn find_active(pool: &PgPool, widget_id: Uuid) -> Result<WidgetRow, WidgetError> {
    let sql = format!("SELECT {WIDGET_COLUMNS} FROM lead_capture_widgets WHERE id = $1 AND is_active");
    let row = sqlx::query(&sql)
        .bind(widget_id)
        .fetch_optional(pool)
        .await?
        .ok_or(WidgetError::NotFound(widget_id))?;
    widget_row(&row)
}

#[cfg(test)]
#[path = "widget_test.rs"]
mod tests;
