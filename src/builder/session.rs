//! Editing session state machine.
//!
//! DESIGN
//! ======
//! `Loading → Ready → Saving → Ready` on success, `Saving → Error` on
//! failure. `Error` behaves like `Ready`: edits are kept and another save may
//! be started. At most one save is in flight; `begin_save` hands out a
//! snapshot of the whole document and `finish_save` records the outcome.
//!
//! Every mutation bumps `revision`. The session has unsaved changes while
//! `revision != saved_revision`, which lets edits made during a save stay
//! dirty after that save lands.

use std::time::Instant;

use serde::Serialize;
use uuid::Uuid;

use super::block::{FieldValue, ListItem, Scalar};
use super::canvas::{Canvas, CanvasError};
use super::page::{Page, PageDocument, PageMeta};
use super::properties::{self, Panel};
use super::schema::{BlockKind, SchemaError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SaveState {
    Loading,
    Ready,
    Saving,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("editor is still loading")]
    Loading,
    #[error("editor already loaded")]
    AlreadyLoaded,
    #[error("a save is already in progress")]
    SaveInFlight,
    #[error("no save in progress")]
    NotSaving,
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Snapshot handed to the persistence layer for one save.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveRequest {
    pub page_id: Uuid,
    pub owner_id: Uuid,
    pub meta: PageMeta,
    pub document: PageDocument,
    pub revision: u64,
}

#[derive(Debug, Clone)]
pub struct EditorSession {
    page_id: Uuid,
    owner_id: Uuid,
    meta: Option<PageMeta>,
    /// Metadata as last loaded, saved, or written through the catalog.
    stored_meta: Option<PageMeta>,
    /// Metadata carried by the save in flight.
    saving_meta: Option<PageMeta>,
    extra: serde_json::Map<String, serde_json::Value>,
    canvas: Canvas,
    state: SaveState,
    revision: u64,
    saved_revision: u64,
    last_touched: Instant,
}

impl EditorSession {
    /// New session waiting for its page to load.
    #[must_use]
    pub fn loading(page_id: Uuid, owner_id: Uuid) -> Self {
        Self {
            page_id,
            owner_id,
            meta: None,
            stored_meta: None,
            saving_meta: None,
            extra: serde_json::Map::new(),
            canvas: Canvas::new(),
            state: SaveState::Loading,
            revision: 0,
            saved_revision: 0,
            last_touched: Instant::now(),
        }
    }

    /// Install the loaded page and become `Ready`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyLoaded` unless the session is `Loading`.
    pub fn finish_load(&mut self, page: Page) -> Result<(), SessionError> {
        if self.state != SaveState::Loading {
            return Err(SessionError::AlreadyLoaded);
        }
        self.stored_meta = Some(page.meta.clone());
        self.meta = Some(page.meta);
        self.extra = page.document.extra;
        self.canvas = Canvas::from_blocks(page.document.components);
        self.state = SaveState::Ready;
        self.touch();
        Ok(())
    }

    #[must_use]
    pub fn page_id(&self) -> Uuid {
        self.page_id
    }

    #[must_use]
    pub fn owner_id(&self) -> Uuid {
        self.owner_id
    }

    #[must_use]
    pub fn state(&self) -> &SaveState {
        &self.state
    }

    #[must_use]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[must_use]
    pub fn meta(&self) -> Option<&PageMeta> {
        self.meta.as_ref()
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.revision != self.saved_revision
    }

    #[must_use]
    pub fn is_saving(&self) -> bool {
        self.state == SaveState::Saving
    }

    #[must_use]
    pub fn idle_for(&self) -> std::time::Duration {
        self.last_touched.elapsed()
    }

    #[must_use]
    pub fn panel(&self) -> Panel {
        properties::panel(self.canvas.selected())
    }

    /// Current in-memory document (not normalized).
    #[must_use]
    pub fn document(&self) -> PageDocument {
        PageDocument { components: self.canvas.blocks().to_vec(), extra: self.extra.clone() }
    }

    fn touch(&mut self) {
        self.last_touched = Instant::now();
    }

    fn editable(&mut self) -> Result<(), SessionError> {
        if self.state == SaveState::Loading {
            return Err(SessionError::Loading);
        }
        self.touch();
        Ok(())
    }

    fn edited(&mut self) {
        self.revision += 1;
    }

    // -------------------------------------------------------------------------
    // Canvas operations
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Fails while loading or for kinds outside the library.
    pub fn add_block(&mut self, kind: BlockKind) -> Result<String, SessionError> {
        self.editable()?;
        let id = self.canvas.add(kind)?;
        self.edited();
        Ok(id)
    }

    /// # Errors
    ///
    /// Fails while loading or for out-of-range indices.
    pub fn move_block(&mut self, from: usize, to: usize) -> Result<(), SessionError> {
        self.editable()?;
        self.canvas.move_block(from, to)?;
        if from != to {
            self.edited();
        }
        Ok(())
    }

    /// Selection is view state and does not dirty the page.
    ///
    /// # Errors
    ///
    /// Fails while loading or when the id is not on the canvas.
    pub fn select(&mut self, id: Option<&str>) -> Result<(), SessionError> {
        self.editable()?;
        self.canvas.select(id)?;
        Ok(())
    }

    /// # Errors
    ///
    /// Fails while loading or when the id is not on the canvas.
    pub fn delete_block(&mut self, id: &str) -> Result<(), SessionError> {
        self.editable()?;
        self.canvas.delete(id)?;
        self.edited();
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Property edits
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Fails while loading, for unknown blocks, or on schema violations.
    pub fn set_field(&mut self, block_id: &str, key: &str, value: FieldValue) -> Result<(), SessionError> {
        self.editable()?;
        properties::set_field(self.canvas.get_mut(block_id)?, key, value)?;
        self.edited();
        Ok(())
    }

    /// # Errors
    ///
    /// Fails while loading, for unknown blocks, or on schema violations.
    pub fn set_item_field(
        &mut self,
        block_id: &str,
        key: &str,
        index: usize,
        item_key: Option<&str>,
        value: Scalar,
    ) -> Result<(), SessionError> {
        self.editable()?;
        properties::set_item_field(self.canvas.get_mut(block_id)?, key, index, item_key, value)?;
        self.edited();
        Ok(())
    }

    /// # Errors
    ///
    /// Fails while loading, for unknown blocks, or for non-list fields.
    pub fn append_item(&mut self, block_id: &str, key: &str) -> Result<usize, SessionError> {
        self.editable()?;
        let index = properties::append_item(self.canvas.get_mut(block_id)?, key)?;
        self.edited();
        Ok(index)
    }

    /// # Errors
    ///
    /// Fails while loading, for unknown blocks, non-list fields or bad indices.
    pub fn remove_item(&mut self, block_id: &str, key: &str, index: usize) -> Result<ListItem, SessionError> {
        self.editable()?;
        let removed = properties::remove_item(self.canvas.get_mut(block_id)?, key, index)?;
        self.edited();
        Ok(removed)
    }

    /// Replace page metadata wholesale.
    ///
    /// # Errors
    ///
    /// Fails while loading.
    pub fn set_meta(&mut self, meta: PageMeta) -> Result<(), SessionError> {
        self.editable()?;
        self.meta = Some(meta);
        self.edited();
        Ok(())
    }

    /// Take metadata that was already written elsewhere. Does not dirty the
    /// session. Fields staged with `set_meta` since the last load or save
    /// keep their staged value; every other field takes the incoming one.
    pub fn adopt_meta(&mut self, incoming: PageMeta) {
        if self.state == SaveState::Loading {
            return;
        }
        let merged = match (&self.stored_meta, &self.meta) {
            (Some(stored), Some(local)) => merge_meta(stored, local, &incoming),
            _ => incoming.clone(),
        };
        self.meta = Some(merged);
        self.stored_meta = Some(incoming);
    }

    // -------------------------------------------------------------------------
    // Save
    // -------------------------------------------------------------------------

    /// Start a save: validate the document against the block schemas and
    /// move to `Saving`.
    ///
    /// # Errors
    ///
    /// `Loading` or `SaveInFlight` when a save cannot start, `Schema` when a
    /// block fails validation (state is left unchanged).
    pub fn begin_save(&mut self) -> Result<SaveRequest, SessionError> {
        let meta = match (&self.state, &self.meta) {
            (SaveState::Loading, _) | (_, None) => return Err(SessionError::Loading),
            (SaveState::Saving, _) => return Err(SessionError::SaveInFlight),
            (SaveState::Ready | SaveState::Error(_), Some(meta)) => meta.clone(),
        };
        let document = self.document().normalized()?;
        self.saving_meta = Some(meta.clone());
        self.state = SaveState::Saving;
        self.touch();
        Ok(SaveRequest { page_id: self.page_id, owner_id: self.owner_id, meta, document, revision: self.revision })
    }

    /// Record the outcome of the save started with `revision`.
    ///
    /// # Errors
    ///
    /// Returns `NotSaving` if no save is in progress.
    pub fn finish_save(&mut self, revision: u64, outcome: Result<(), String>) -> Result<(), SessionError> {
        if self.state != SaveState::Saving {
            return Err(SessionError::NotSaving);
        }
        match outcome {
            Ok(()) => {
                self.saved_revision = revision;
                if let Some(meta) = self.saving_meta.take() {
                    self.stored_meta = Some(meta);
                }
                self.state = SaveState::Ready;
            }
            Err(message) => {
                self.saving_meta = None;
                self.state = SaveState::Error(message);
            }
        }
        self.touch();
        Ok(())
    }
}

/// Three-way merge: a field the session changed away from `stored` keeps
/// its local value.
fn merge_meta(stored: &PageMeta, local: &PageMeta, incoming: &PageMeta) -> PageMeta {
    fn pick<T: PartialEq + Clone>(stored: &T, local: &T, incoming: &T) -> T {
        if local == stored { incoming.clone() } else { local.clone() }
    }
    PageMeta {
        title: pick(&stored.title, &local.title, &incoming.title),
        slug: pick(&stored.slug, &local.slug, &incoming.slug),
        seo_title: pick(&stored.seo_title, &local.seo_title, &incoming.seo_title),
        seo_description: pick(&stored.seo_description, &local.seo_description, &incoming.seo_description),
        status: pick(&stored.status, &local.status, &incoming.status),
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
