//! Editor service — live editing sessions over the page store.
//!
//! DESIGN
//! ======
//! One `EditorSession` per page lives in `AppState::editors`. Opening a page
//! inserts a `Loading` session, loads the page with the lock released, then
//! installs it. Edits run synchronously under the write lock.
//!
//! Saving follows the same shape as every other write in this server:
//! snapshot under the lock, release it for the store write, re-acquire it to
//! record the outcome. `begin_save` puts the session in `Saving`, so a second
//! save on the same page is rejected instead of queued.
//!
//! ERROR HANDLING
//! ==============
//! A failed load removes the half-open session so the next open starts
//! clean. A failed save leaves the session in `Error` with every edit intact;
//! the caller can retry and the same document is written.

use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::builder::block::Block;
use crate::builder::page::{PageDocument, PageMeta};
use crate::builder::properties::Panel;
use crate::builder::session::{EditorSession, SaveState, SessionError};
use crate::services::page::PageError;
use crate::state::AppState;

const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("no editor open for page {0}")]
    NotOpen(Uuid),
    #[error("failed to load page: {0}")]
    LoadFailed(#[source] PageError),
    #[error("failed to save page: {0}")]
    SaveFailed(#[source] PageError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Client-facing view of one editing session.
#[derive(Debug, Clone, Serialize)]
pub struct EditorSnapshot {
    pub page_id: Uuid,
    pub meta: Option<PageMeta>,
    pub blocks: Vec<Block>,
    pub selected: Option<String>,
    pub save_state: SaveState,
    pub dirty: bool,
    pub revision: u64,
    pub panel: Panel,
}

impl EditorSnapshot {
    #[must_use]
    pub fn of(session: &EditorSession) -> Self {
        Self {
            page_id: session.page_id(),
            meta: session.meta().cloned(),
            blocks: session.canvas().blocks().to_vec(),
            selected: session.canvas().selected_id().map(str::to_owned),
            save_state: session.state().clone(),
            dirty: session.has_unsaved_changes(),
            revision: session.revision(),
            panel: session.panel(),
        }
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Open (or rejoin) the editor for a page.
///
/// # Errors
///
/// `LoadFailed` when the page cannot be loaded for this owner, or
/// `Session(Loading)` while another open of the same page is in progress.
pub async fn open(state: &AppState, page_id: Uuid, owner_id: Uuid) -> Result<EditorSnapshot, EditorError> {
    {
        let mut editors = state.editors.write().await;
        match editors.get(&page_id) {
            Some(session) if session.owner_id() != owner_id => {
                return Err(EditorError::LoadFailed(PageError::NotFound(page_id)));
            }
            Some(session) if *session.state() == SaveState::Loading => {
                return Err(SessionError::Loading.into());
            }
            Some(session) => return Ok(EditorSnapshot::of(session)),
            None => {
                editors.insert(page_id, EditorSession::loading(page_id, owner_id));
            }
        }
    }

    let loaded = state.pages.load(page_id, owner_id).await;

    let mut editors = state.editors.write().await;
    match loaded {
        Ok(page) => {
            let session = editors
                .entry(page_id)
                .or_insert_with(|| EditorSession::loading(page_id, owner_id));
            session.finish_load(page)?;
            info!(%page_id, blocks = session.canvas().len(), "editor opened");
            Ok(EditorSnapshot::of(session))
        }
        Err(e) => {
            editors.remove(&page_id);
            warn!(%page_id, error = %e, "editor load failed");
            Err(EditorError::LoadFailed(e))
        }
    }
}

/// Run `f` against the owner's open session for `page_id`.
///
/// # Errors
///
/// `NotOpen` when no session exists for this owner, or whatever `f` returns.
pub async fn with_session<T>(
    state: &AppState,
    page_id: Uuid,
    owner_id: Uuid,
    f: impl FnOnce(&mut EditorSession) -> Result<T, SessionError>,
) -> Result<T, EditorError> {
    let mut editors = state.editors.write().await;
    let session = editors
        .get_mut(&page_id)
        .filter(|s| s.owner_id() == owner_id)
        .ok_or(EditorError::NotOpen(page_id))?;
    f(session).map_err(|e| {
        warn!(%page_id, error = %e, "editor operation rejected");
        EditorError::Session(e)
    })
}

/// Apply an edit and return the resulting snapshot.
///
/// # Errors
///
/// Same as `with_session`.
pub async fn edit<T>(
    state: &AppState,
    page_id: Uuid,
    owner_id: Uuid,
    f: impl FnOnce(&mut EditorSession) -> Result<T, SessionError>,
) -> Result<(T, EditorSnapshot), EditorError> {
    with_session(state, page_id, owner_id, |session| {
        let out = f(session)?;
        Ok((out, EditorSnapshot::of(session)))
    })
    .await
}

/// # Errors
///
/// `NotOpen` when no session exists for this owner.
pub async fn snapshot(state: &AppState, page_id: Uuid, owner_id: Uuid) -> Result<EditorSnapshot, EditorError> {
    with_session(state, page_id, owner_id, |session| Ok(EditorSnapshot::of(session))).await
}

/// Write the whole document back to the store.
///
/// # Errors
///
/// `Session(SaveInFlight)` if a save is already running, `Session(Schema)`
/// if a block fails validation, `SaveFailed` if the store write fails.
pub async fn save(state: &AppState, page_id: Uuid, owner_id: Uuid) -> Result<EditorSnapshot, EditorError> {
    // PHASE: SNAPSHOT UNDER LOCK
    let request = with_session(state, page_id, owner_id, EditorSession::begin_save).await?;

    // PHASE: WRITE WITHOUT LOCK
    let outcome = state.pages.save(&request).await;

    // PHASE: RELOCK AND RECORD
    let mut editors = state.editors.write().await;
    let Some(session) = editors.get_mut(&page_id) else {
        // EDGE: the page was deleted while its save was running.
        return Err(match outcome {
            Ok(()) => EditorError::NotOpen(page_id),
            Err(e) => EditorError::SaveFailed(e),
        });
    };
    match outcome {
        Ok(()) => {
            session.finish_save(request.revision, Ok(()))?;
            info!(%page_id, revision = request.revision, blocks = request.document.components.len(), "page saved");
            Ok(EditorSnapshot::of(session))
        }
        Err(e) => {
            session.finish_save(request.revision, Err(e.to_string()))?;
            error!(%page_id, error = %e, "page save failed");
            Err(EditorError::SaveFailed(e))
        }
    }
}

/// Drop the session, discarding unsaved edits.
///
/// # Errors
///
/// `NotOpen`, or `Session(SaveInFlight)` while a save is running.
pub async fn close(state: &AppState, page_id: Uuid, owner_id: Uuid) -> Result<(), EditorError> {
    let mut editors = state.editors.write().await;
    let session = editors
        .get(&page_id)
        .filter(|s| s.owner_id() == owner_id)
        .ok_or(EditorError::NotOpen(page_id))?;
    if session.is_saving() {
        return Err(SessionError::SaveInFlight.into());
    }
    let discarded = session.has_unsaved_changes();
    editors.remove(&page_id);
    info!(%page_id, discarded, "editor closed");
    Ok(())
}

/// Forget any session for a page that no longer exists.
pub async fn forget(state: &AppState, page_id: Uuid) {
    if state.editors.write().await.remove(&page_id).is_some() {
        info!(%page_id, "editor dropped with its page");
    }
}

/// Mirror metadata written through the catalog into an open session.
pub async fn sync_meta(state: &AppState, page_id: Uuid, meta: PageMeta) {
    if let Some(session) = state.editors.write().await.get_mut(&page_id) {
        session.adopt_meta(meta);
    }
}

/// Document to preview: the live session's if one is open, else `None`.
pub async fn live_document(state: &AppState, page_id: Uuid, owner_id: Uuid) -> Option<(PageMeta, PageDocument)> {
    let editors = state.editors.read().await;
    let session = editors.get(&page_id).filter(|s| s.owner_id() == owner_id)?;
    Some((session.meta()?.clone(), session.document()))
}

// =============================================================================
// IDLE SWEEPER
// =============================================================================

/// Evict sessions idle for at least `idle` that have nothing to lose.
/// Returns how many were evicted.
pub async fn evict_idle(state: &AppState, idle: Duration) -> usize {
    let mut editors = state.editors.write().await;
    let before = editors.len();
    editors.retain(|page_id, session| {
        let evict = session.idle_for() >= idle && !session.has_unsaved_changes() && !session.is_saving();
        if evict {
            info!(%page_id, "idle editor evicted");
        }
        !evict
    });
    before - editors.len()
}

/// Spawn the background sweeper. Returns a handle for shutdown.
pub fn spawn_idle_sweeper(state: AppState, idle: Duration) -> JoinHandle<()> {
    let interval = (idle / 4).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);
    info!(idle_secs = idle.as_secs(), interval_secs = interval.as_secs(), "editor idle sweeper configured");
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(interval).await;
            let evicted = evict_idle(&state, idle).await;
            if evicted > 0 {
                info!(count = evicted, "idle editors evicted");
            }
        }
    })
}

#[cfg(test)]
#[path = "editor_test.rs"]
mod tests;
