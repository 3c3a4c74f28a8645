//! Blocks and their content values.
//!
//! A block is `{ id, type, content }` on the wire. Content is a flat map of
//! field name to value; the value shapes mirror what the page builder stores
//! in the `components` array of a landing page document. Anything that does
//! not fit a known shape is kept as raw JSON (`FieldValue::Other`) so blocks of
//! unknown types survive a load/save cycle byte-for-byte.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::schema::{BlockKind, SchemaError};

/// Field name → value.
pub type Content = BTreeMap<String, FieldValue>;

/// One element of a record list (e.g. a single service or testimonial).
pub type Record = BTreeMap<String, Scalar>;

/// Leaf value inside a record.
///
/// Numbers keep their JSON representation, so an integer read from storage
/// is written back as the same integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Number(_) => None,
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => n.as_f64(),
            Self::Text(_) => None,
        }
    }
}

/// Element of a list-valued field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListItem {
    Text(String),
    Record(Record),
}

/// Value of a top-level content field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(serde_json::Number),
    Text(String),
    List(Vec<ListItem>),
    /// Raw JSON the builder has no typed shape for.
    Other(serde_json::Value),
}

impl FieldValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[ListItem]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A placed, typed content unit on a landing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Older documents stored this under `props`.
    #[serde(alias = "props", default)]
    pub content: Content,
}

impl Block {
    /// Build a block of a known kind with its schema defaults.
    ///
    /// # Errors
    ///
    /// Returns `NoSchema` for unknown kinds.
    pub fn with_defaults(id: impl Into<String>, kind: BlockKind) -> Result<Self, SchemaError> {
        let schema = kind
            .schema()
            .ok_or_else(|| SchemaError::NoSchema(kind.as_str().to_owned()))?;
        Ok(Self { id: id.into(), content: schema.default_content(), kind })
    }

    /// Text of a field, or `""` when absent or not text.
    #[must_use]
    pub fn text(&self, key: &str) -> &str {
        self.content
            .get(key)
            .and_then(FieldValue::as_text)
            .unwrap_or_default()
    }

    /// Items of a list field, empty when absent or not a list.
    #[must_use]
    pub fn items(&self, key: &str) -> &[ListItem] {
        self.content
            .get(key)
            .and_then(FieldValue::as_list)
            .unwrap_or_default()
    }

    /// Normalize content against this block's schema. Unknown kinds pass
    /// through unchanged.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` when a field holds a value of the wrong kind.
    pub fn normalized(&self) -> Result<Self, SchemaError> {
        match self.kind.schema() {
            Some(schema) => Ok(Self {
                id: self.id.clone(),
                kind: self.kind.clone(),
                content: schema.normalize(&self.content)?,
            }),
            None => Ok(self.clone()),
        }
    }
}

#[cfg(test)]
#[path = "block_test.rs"]
mod tests;
