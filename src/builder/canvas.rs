//! Canvas — the ordered block list and the current selection.
//!
//! DESIGN
//! ======
//! Order is the rendering order. Reordering is a single-element list move
//! (remove at `from`, insert at `to`), not a sort. Selection is at most one
//! block id and always refers to a block that is on the canvas.

use rand::Rng;

use super::block::Block;
use super::schema::{BlockKind, SchemaError};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CanvasError {
    #[error("block not found: {0}")]
    BlockNotFound(String),
    #[error("duplicate block id: {0}")]
    DuplicateId(String),
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Canvas {
    blocks: Vec<Block>,
    selected: Option<String>,
}

impl Canvas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvas over an already ordered block list. Later duplicates of an id
    /// are renamed so ids stay unique.
    #[must_use]
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let mut canvas = Self::new();
        for mut block in blocks {
            if canvas.contains(&block.id) {
                block.id = canvas.fresh_id(&block.kind);
            }
            canvas.blocks.push(block);
        }
        canvas
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.blocks.iter().any(|b| b.id == id)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// # Errors
    ///
    /// Returns `BlockNotFound` if no block has this id.
    pub fn get_mut(&mut self, id: &str) -> Result<&mut Block, CanvasError> {
        self.blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| CanvasError::BlockNotFound(id.to_owned()))
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Block> {
        self.selected.as_deref().and_then(|id| self.get(id))
    }

    #[must_use]
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Append a new block of `kind` with the kind's default content.
    /// Returns the new block's id.
    ///
    /// # Errors
    ///
    /// Returns `Schema(NoSchema)` for kinds outside the library.
    pub fn add(&mut self, kind: BlockKind) -> Result<String, CanvasError> {
        let id = self.fresh_id(&kind);
        let block = Block::with_defaults(id.clone(), kind)?;
        self.blocks.push(block);
        Ok(id)
    }

    /// Append an existing block.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if the id is already on the canvas.
    pub fn push(&mut self, block: Block) -> Result<(), CanvasError> {
        if self.contains(&block.id) {
            return Err(CanvasError::DuplicateId(block.id));
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Move the block at `from` so that it ends up at index `to`.
    ///
    /// # Errors
    ///
    /// Returns `IndexOutOfRange` if either index is past the end; the list
    /// is left untouched.
    pub fn move_block(&mut self, from: usize, to: usize) -> Result<(), CanvasError> {
        let len = self.blocks.len();
        for index in [from, to] {
            if index >= len {
                return Err(CanvasError::IndexOutOfRange { index, len });
            }
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        Ok(())
    }

    /// Position of a block in render order.
    #[must_use]
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    /// Select a block, or clear selection with `None`.
    ///
    /// # Errors
    ///
    /// Returns `BlockNotFound` if the id is not on the canvas.
    pub fn select(&mut self, id: Option<&str>) -> Result<(), CanvasError> {
        match id {
            Some(id) if !self.contains(id) => Err(CanvasError::BlockNotFound(id.to_owned())),
            Some(id) => {
                self.selected = Some(id.to_owned());
                Ok(())
            }
            None => {
                self.selected = None;
                Ok(())
            }
        }
    }

    /// Remove a block. Clears selection only if it was the selected block.
    ///
    /// # Errors
    ///
    /// Returns `BlockNotFound` if the id is not on the canvas.
    pub fn delete(&mut self, id: &str) -> Result<Block, CanvasError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| CanvasError::BlockNotFound(id.to_owned()))?;
        if self.selected.as_deref() == Some(id) {
            self.selected = None;
        }
        Ok(self.blocks.remove(index))
    }

    fn fresh_id(&self, kind: &BlockKind) -> String {
        let mut rng = rand::rng();
        loop {
            let suffix: u32 = rng.random();
            let id = format!("{}-{suffix:08x}", kind.as_str());
            if !self.contains(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
