//! Block type registry — the static catalog behind the component library.
//!
//! DESIGN
//! ======
//! Every block kind the builder knows about has one `BlockSchema` entry
//! describing its library card (name, icon, description) and its editable
//! fields. Defaults are expressed as `StaticValue` so the whole registry can
//! live in `static` memory and is never mutated at runtime. Kinds that are not
//! in the registry survive as `BlockKind::Unknown` so content authored by a
//! newer schema round-trips untouched.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::block::{Content, FieldValue, ListItem, Record, Scalar};

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("no schema for block type: {0}")]
    NoSchema(String),
    #[error("field {field} is not defined for block type {kind}")]
    UnknownField { kind: String, field: String },
    #[error("field {field} expects {expected}")]
    TypeMismatch { field: String, expected: &'static str },
    #[error("field {field} is not a list")]
    NotAList { field: String },
    #[error("index {index} out of range for field {field} (len {len})")]
    IndexOutOfRange { field: String, index: usize, len: usize },
}

// =============================================================================
// BLOCK KIND
// =============================================================================

/// Type tag of a block. Serialized as its lowercase tag string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockKind {
    Hero,
    Services,
    Testimonials,
    Contact,
    Features,
    Cta,
    /// A type tag this build does not know. Rendered as a placeholder and
    /// persisted verbatim.
    Unknown(String),
}

impl BlockKind {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hero => "hero",
            Self::Services => "services",
            Self::Testimonials => "testimonials",
            Self::Contact => "contact",
            Self::Features => "features",
            Self::Cta => "cta",
            Self::Unknown(tag) => tag,
        }
    }

    #[must_use]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "hero" => Self::Hero,
            "services" => Self::Services,
            "testimonials" => Self::Testimonials,
            "contact" => Self::Contact,
            "features" => Self::Features,
            "cta" => Self::Cta,
            other => Self::Unknown(other.to_owned()),
        }
    }

    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Schema for this kind, `None` for unknown kinds.
    #[must_use]
    pub fn schema(&self) -> Option<&'static BlockSchema> {
        let schema = match self {
            Self::Hero => &HERO,
            Self::Services => &SERVICES,
            Self::Testimonials => &TESTIMONIALS,
            Self::Contact => &CONTACT,
            Self::Features => &FEATURES,
            Self::Cta => &CTA,
            Self::Unknown(_) => return None,
        };
        Some(schema)
    }
}

impl From<String> for BlockKind {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<BlockKind> for String {
    fn from(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Unknown(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// SCHEMA TYPES
// =============================================================================

/// How a field is edited in the properties panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputKind {
    Text,
    MultilineText,
    Color,
    Number,
    /// List of plain strings.
    TextList,
    /// List of records, each with the given fields (scalar inputs only).
    Records(&'static [FieldSpec]),
}

impl InputKind {
    /// Wire name used in properties panel descriptors.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::MultilineText => "multiline",
            Self::Color => "color",
            Self::Number => "number",
            Self::TextList => "text_list",
            Self::Records(_) => "records",
        }
    }

    fn expected(self) -> &'static str {
        match self {
            Self::Text | Self::MultilineText => "a string",
            Self::Color => "a hex color",
            Self::Number => "a number",
            Self::TextList => "a list of strings",
            Self::Records(_) => "a list of records",
        }
    }

    /// Whether a record field of this input kind accepts `value`.
    #[must_use]
    pub fn accepts_scalar(self, value: &Scalar) -> bool {
        match (self, value) {
            (Self::Text | Self::MultilineText, Scalar::Text(_)) | (Self::Number, Scalar::Number(_)) => true,
            (Self::Color, Scalar::Text(s)) => is_hex_color(s),
            _ => false,
        }
    }

    /// Whether a top-level field of this input kind accepts `value`.
    #[must_use]
    pub fn accepts(self, value: &FieldValue) -> bool {
        match (self, value) {
            (Self::Text | Self::MultilineText, FieldValue::Text(_)) | (Self::Number, FieldValue::Number(_)) => true,
            (Self::Color, FieldValue::Text(s)) => is_hex_color(s),
            (Self::TextList, FieldValue::List(items)) => items.iter().all(|item| matches!(item, ListItem::Text(_))),
            (Self::Records(fields), FieldValue::List(items)) => items.iter().all(|item| match item {
                ListItem::Record(record) => record_matches(fields, record),
                ListItem::Text(_) => false,
            }),
            _ => false,
        }
    }
}

fn record_matches(fields: &[FieldSpec], record: &Record) -> bool {
    record.iter().all(|(key, value)| {
        fields
            .iter()
            .find(|f| f.key == key.as_str())
            .is_some_and(|f| f.input.accepts_scalar(value))
    })
}

/// `#rgb` or `#rrggbb`.
#[must_use]
pub fn is_hex_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

/// Compile-time default value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticValue {
    Text(&'static str),
    Number(i64),
    TextList(&'static [&'static str]),
    Records(&'static [&'static [(&'static str, StaticValue)]]),
}

impl StaticValue {
    #[must_use]
    pub fn to_value(self) -> FieldValue {
        match self {
            Self::Text(s) => FieldValue::Text(s.to_owned()),
            Self::Number(n) => FieldValue::Number(n.into()),
            Self::TextList(items) => {
                FieldValue::List(items.iter().map(|s| ListItem::Text((*s).to_owned())).collect())
            }
            Self::Records(records) => FieldValue::List(
                records
                    .iter()
                    .map(|pairs| ListItem::Record(static_record(pairs)))
                    .collect(),
            ),
        }
    }

    fn to_scalar(self) -> Scalar {
        match self {
            Self::Number(n) => Scalar::Number(n.into()),
            Self::Text(s) => Scalar::Text(s.to_owned()),
            Self::TextList(_) | Self::Records(_) => Scalar::Text(String::new()),
        }
    }
}

fn static_record(pairs: &[(&'static str, StaticValue)]) -> Record {
    pairs
        .iter()
        .map(|(key, value)| ((*key).to_owned(), value.to_scalar()))
        .collect()
}

/// One editable field of a block type (or of a record inside a list field).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub input: InputKind,
    pub default: StaticValue,
}

/// Static description of a block type.
#[derive(Debug)]
pub struct BlockSchema {
    pub kind: BlockKind,
    pub name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub fields: &'static [FieldSpec],
}

impl BlockSchema {
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Fresh content populated with every field's default.
    #[must_use]
    pub fn default_content(&self) -> Content {
        self.fields
            .iter()
            .map(|f| (f.key.to_owned(), f.default.to_value()))
            .collect()
    }

    /// Looks up `key` or reports it as undefined for this type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` when the type declares no such field.
    pub fn require_field(&self, key: &str) -> Result<&'static FieldSpec, SchemaError> {
        self.field(key).ok_or_else(|| SchemaError::UnknownField {
            kind: self.kind.as_str().to_owned(),
            field: key.to_owned(),
        })
    }

    /// Checks `value` against the declared input kind of `key`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` or `TypeMismatch`.
    pub fn check(&self, key: &str, value: &FieldValue) -> Result<(), SchemaError> {
        let spec = self.require_field(key)?;
        if spec.input.accepts(value) {
            Ok(())
        } else {
            Err(SchemaError::TypeMismatch { field: key.to_owned(), expected: spec.input.expected() })
        }
    }

    /// Bring `content` into this schema's shape: missing fields take their
    /// defaults, undefined fields are dropped, records gain missing keys.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` for the first field whose value has the wrong kind.
    pub fn normalize(&self, content: &Content) -> Result<Content, SchemaError> {
        let mut out = Content::new();
        for spec in self.fields {
            let value = match content.get(spec.key) {
                Some(value) => {
                    self.check(spec.key, value)?;
                    fill_record_defaults(spec.input, value.clone())
                }
                None => spec.default.to_value(),
            };
            out.insert(spec.key.to_owned(), value);
        }
        Ok(out)
    }
}

fn fill_record_defaults(input: InputKind, value: FieldValue) -> FieldValue {
    match (input, value) {
        (InputKind::Records(fields), FieldValue::List(items)) => FieldValue::List(
            items
                .into_iter()
                .map(|item| match item {
                    ListItem::Record(mut record) => {
                        for field in fields {
                            record
                                .entry(field.key.to_owned())
                                .or_insert_with(|| field.default.to_scalar());
                        }
                        ListItem::Record(record)
                    }
                    text @ ListItem::Text(_) => text,
                })
                .collect(),
        ),
        (_, value) => value,
    }
}

/// Template for a new element appended to a list field.
#[must_use]
pub fn item_template(input: InputKind) -> Option<ListItem> {
    match input {
        InputKind::TextList => Some(ListItem::Text(String::new())),
        InputKind::Records(fields) => Some(ListItem::Record(
            fields
                .iter()
                .map(|f| (f.key.to_owned(), f.default.to_scalar()))
                .collect(),
        )),
        _ => None,
    }
}

/// The full library, in display order.
pub fn library() -> impl Iterator<Item = &'static BlockSchema> {
    LIBRARY.iter().copied()
}

// =============================================================================
// REGISTRY
// =============================================================================

static LIBRARY: [&BlockSchema; 6] = [&HERO, &SERVICES, &TESTIMONIALS, &CONTACT, &FEATURES, &CTA];

const fn text(key: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec { key, label, input: InputKind::Text, default: StaticValue::Text(default) }
}

const fn multiline(key: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec { key, label, input: InputKind::MultilineText, default: StaticValue::Text(default) }
}

const fn color(key: &'static str, label: &'static str, default: &'static str) -> FieldSpec {
    FieldSpec { key, label, input: InputKind::Color, default: StaticValue::Text(default) }
}

const SERVICE_ITEM: &[FieldSpec] = &[
    text("name", "Service Name", ""),
    multiline("description", "Service Description", ""),
    text("icon", "Icon", "🔧"),
];

const TESTIMONIAL_ITEM: &[FieldSpec] = &[
    text("name", "Customer Name", ""),
    multiline("text", "Review", ""),
    FieldSpec { key: "rating", label: "Rating", input: InputKind::Number, default: StaticValue::Number(5) },
    text("location", "Location", ""),
];

const FEATURE_ITEM: &[FieldSpec] = &[
    text("title", "Feature Title", ""),
    multiline("description", "Feature Description", ""),
    text("icon", "Icon", "⭐"),
];

static HERO: BlockSchema = BlockSchema {
    kind: BlockKind::Hero,
    name: "Hero Section",
    icon: "🎯",
    description: "Main banner with headline and CTA",
    fields: &[
        text("headline", "Headline", "Professional Home Services"),
        multiline("subheadline", "Subheadline", "Get expert service from trusted professionals in your area"),
        text("ctaText", "Button Text", "Get Free Quote"),
        text("backgroundImage", "Background Image URL", ""),
        color("backgroundColor", "Background Color", "#1e40af"),
    ],
};

static SERVICES: BlockSchema = BlockSchema {
    kind: BlockKind::Services,
    name: "Services Grid",
    icon: "🔧",
    description: "Display your services in a grid layout",
    fields: &[
        text("title", "Section Title", "Our Services"),
        FieldSpec {
            key: "services",
            label: "Services",
            input: InputKind::Records(SERVICE_ITEM),
            default: StaticValue::Records(&[
                &[
                    ("name", StaticValue::Text("Emergency Repairs")),
                    ("description", StaticValue::Text("24/7 emergency service available")),
                    ("icon", StaticValue::Text("🚨")),
                ],
                &[
                    ("name", StaticValue::Text("Installation")),
                    ("description", StaticValue::Text("Professional installation services")),
                    ("icon", StaticValue::Text("🔧")),
                ],
                &[
                    ("name", StaticValue::Text("Maintenance")),
                    ("description", StaticValue::Text("Regular maintenance and checkups")),
                    ("icon", StaticValue::Text("⚙️")),
                ],
            ]),
        },
    ],
};

static TESTIMONIALS: BlockSchema = BlockSchema {
    kind: BlockKind::Testimonials,
    name: "Testimonials",
    icon: "💬",
    description: "Customer reviews and testimonials",
    fields: &[
        text("title", "Section Title", "What Our Customers Say"),
        FieldSpec {
            key: "testimonials",
            label: "Testimonials",
            input: InputKind::Records(TESTIMONIAL_ITEM),
            default: StaticValue::Records(&[&[
                ("name", StaticValue::Text("John Smith")),
                ("text", StaticValue::Text("Excellent service! Professional, reliable, and affordable.")),
                ("rating", StaticValue::Number(5)),
                ("location", StaticValue::Text("Local Customer")),
            ]]),
        },
    ],
};

static CONTACT: BlockSchema = BlockSchema {
    kind: BlockKind::Contact,
    name: "Contact Form",
    icon: "📞",
    description: "Lead capture form with contact details",
    fields: &[
        text("title", "Form Title", "Get Your Free Quote"),
        multiline(
            "subtitle",
            "Subtitle",
            "Fill out the form below and we'll get back to you within 24 hours",
        ),
        FieldSpec {
            key: "fields",
            label: "Form Fields",
            input: InputKind::TextList,
            default: StaticValue::TextList(&["name", "email", "phone", "service", "message"]),
        },
        text("ctaText", "Button Text", "Request Quote"),
    ],
};

static FEATURES: BlockSchema = BlockSchema {
    kind: BlockKind::Features,
    name: "Features List",
    icon: "⭐",
    description: "Highlight your key features and benefits",
    fields: &[
        text("title", "Section Title", "Why Choose Us"),
        FieldSpec {
            key: "features",
            label: "Features",
            input: InputKind::Records(FEATURE_ITEM),
            default: StaticValue::Records(&[
                &[
                    ("title", StaticValue::Text("Licensed & Insured")),
                    ("description", StaticValue::Text("Fully licensed and insured for your peace of mind")),
                    ("icon", StaticValue::Text("🛡️")),
                ],
                &[
                    ("title", StaticValue::Text("24/7 Service")),
                    ("description", StaticValue::Text("Emergency services available around the clock")),
                    ("icon", StaticValue::Text("🕐")),
                ],
                &[
                    ("title", StaticValue::Text("Free Estimates")),
                    ("description", StaticValue::Text("No obligation quotes for all services")),
                    ("icon", StaticValue::Text("💰")),
                ],
            ]),
        },
    ],
};

static CTA: BlockSchema = BlockSchema {
    kind: BlockKind::Cta,
    name: "Call to Action",
    icon: "📢",
    description: "Prominent call-to-action section",
    fields: &[
        text("headline", "Headline", "Ready to Get Started?"),
        multiline("subheadline", "Subheadline", "Contact us today for your free consultation"),
        text("ctaText", "Button Text", "Call Now"),
        text("phone", "Phone Number", "(555) 123-4567"),
        color("backgroundColor", "Background Color", "#059669"),
    ],
};

#[cfg(test)]
#[path = "schema_test.rs"]
mod tests;
