//! Page document model.
//!
//! The `content` column of a landing page holds a JSON object whose
//! `components` array is the ordered block list. Other keys in that object
//! belong to other tools and are carried through untouched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::block::Block;
use super::schema::{BlockKind, SchemaError};

/// Id given to the block a brand-new page opens with.
pub const DEFAULT_HERO_ID: &str = "hero-1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageStatus {
    Draft,
    Published,
    Archived,
}

impl PageStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(Self::Draft),
            "published" => Some(Self::Published),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

/// Title, slug, SEO fields and publication status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub title: String,
    pub slug: String,
    pub seo_title: Option<String>,
    pub seo_description: Option<String>,
    pub status: PageStatus,
}

/// Stored shape of `landing_pages.content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    #[serde(default)]
    pub components: Vec<Block>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl PageDocument {
    /// Document a new page starts with: a single default hero.
    #[must_use]
    pub fn starter() -> Self {
        let hero = Block::with_defaults(DEFAULT_HERO_ID, BlockKind::Hero).ok();
        Self { components: hero.into_iter().collect(), extra: serde_json::Map::new() }
    }

    /// Parse a stored content value. A missing or null `components` key
    /// (or a null document) yields the starter hero.
    ///
    /// # Errors
    ///
    /// Returns a serde error if `components` is present but malformed.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        let has_components = value
            .get("components")
            .is_some_and(|c| !c.is_null());
        if !has_components {
            let mut doc = Self::starter();
            if let serde_json::Value::Object(mut map) = value {
                map.remove("components");
                doc.extra = map;
            }
            return Ok(doc);
        }
        serde_json::from_value(value)
    }

    #[must_use]
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::json!({ "components": [] }))
    }

    /// Copy with every known block normalized against its schema.
    ///
    /// # Errors
    ///
    /// Returns the first block's `SchemaError`.
    pub fn normalized(&self) -> Result<Self, SchemaError> {
        let components = self
            .components
            .iter()
            .map(Block::normalized)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { components, extra: self.extra.clone() })
    }
}

/// A landing page as loaded for editing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub meta: PageMeta,
    pub document: PageDocument,
}

#[cfg(test)]
#[path = "page_test.rs"]
mod tests;
