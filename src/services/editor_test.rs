use super::*;
use crate::builder::block::FieldValue;
use crate::builder::page::PageStatus;
use crate::builder::schema::BlockKind;
use crate::state::test_helpers::{dummy_meta, seed_page, test_app_state};

// =============================================================================
// open / close
// =============================================================================

#[tokio::test]
async fn open_loads_page_into_ready_session() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);

    let snap = open(&state, page_id, owner_id).await.unwrap();
    assert_eq!(snap.save_state, SaveState::Ready);
    assert_eq!(snap.blocks.len(), 1);
    assert_eq!(snap.blocks[0].kind, BlockKind::Hero);
    assert!(!snap.dirty);
    assert_eq!(snap.meta.unwrap().slug, "plumbing-pros");
}

#[tokio::test]
async fn reopening_keeps_live_edits() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    open(&state, page_id, owner_id).await.unwrap();
    edit(&state, page_id, owner_id, |s| s.add_block(BlockKind::Cta)).await.unwrap();

    let snap = open(&state, page_id, owner_id).await.unwrap();
    assert_eq!(snap.blocks.len(), 2);
    assert!(snap.dirty);
}

#[tokio::test]
async fn open_missing_page_fails_and_leaves_nothing() {
    let (state, _store) = test_app_state();
    let page_id = Uuid::new_v4();
    let err = open(&state, page_id, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, EditorError::LoadFailed(PageError::NotFound(_))));
    assert!(state.editors.read().await.is_empty());
}

#[tokio::test]
async fn open_store_failure_is_load_failed() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    store.fail_loads.store(true, std::sync::atomic::Ordering::SeqCst);
    assert!(matches!(open(&state, page_id, owner_id).await, Err(EditorError::LoadFailed(_))));
    assert!(!state.editors.read().await.contains_key(&page_id));
}

#[tokio::test]
async fn other_owner_cannot_join_session() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    open(&state, page_id, owner_id).await.unwrap();

    let intruder = Uuid::new_v4();
    assert!(matches!(open(&state, page_id, intruder).await, Err(EditorError::LoadFailed(_))));
    assert!(matches!(snapshot(&state, page_id, intruder).await, Err(EditorError::NotOpen(_))));
}

#[tokio::test]
async fn open_while_loading_is_rejected() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    state
        .editors
        .write()
        .await
        .insert(page_id, EditorSession::loading(page_id, owner_id));
    assert!(matches!(
        open(&state, page_id, owner_id).await,
        Err(EditorError::Session(SessionError::Loading))
    ));
}

#[tokio::test]
async fn close_discards_unsaved_edits() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    open(&state, page_id, owner_id).await.unwrap();
    edit(&state, page_id, owner_id, |s| s.add_block(BlockKind::Features)).await.unwrap();

    close(&state, page_id, owner_id).await.unwrap();
    let snap = open(&state, page_id, owner_id).await.unwrap();
    assert_eq!(snap.blocks.len(), 1);
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn close_unknown_session_fails() {
    let (state, _) = test_app_state();
    assert!(matches!(
        close(&state, Uuid::new_v4(), Uuid::new_v4()).await,
        Err(EditorError::NotOpen(_))
    ));
}

// =============================================================================
// save
// =============================================================================

#[tokio::test]
async fn save_writes_document_and_clears_dirty() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    open(&state, page_id, owner_id).await.unwrap();
    let (id, _) = edit(&state, page_id, owner_id, |s| s.add_block(BlockKind::Services)).await.unwrap();
    edit(&state, page_id, owner_id, |s| s.move_block(1, 0)).await.unwrap();

    let snap = save(&state, page_id, owner_id).await.unwrap();
    assert!(!snap.dirty);
    assert_eq!(snap.save_state, SaveState::Ready);

    let stored = store.get(page_id).unwrap();
    let kinds: Vec<_> = stored.document.components.iter().map(|b| b.kind.as_str()).collect();
    assert_eq!(kinds, ["services", "hero"]);
    assert_eq!(stored.document.components[0].id, id);
}

#[tokio::test]
async fn failed_save_keeps_edits_and_retry_sends_same_document() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    open(&state, page_id, owner_id).await.unwrap();
    edit(&state, page_id, owner_id, |s| {
        s.set_field("hero-1", "headline", FieldValue::Text("Same-day repairs".into()))
    })
    .await
    .unwrap();

    store.set_fail_saves(true);
    let err = save(&state, page_id, owner_id).await.unwrap_err();
    assert!(matches!(err, EditorError::SaveFailed(_)));
    let first = store.last_saved.lock().unwrap().clone().unwrap();

    let snap = snapshot(&state, page_id, owner_id).await.unwrap();
    assert!(matches!(snap.save_state, SaveState::Error(_)));
    assert!(snap.dirty);
    assert_eq!(snap.blocks[0].text("headline"), "Same-day repairs");

    store.set_fail_saves(false);
    save(&state, page_id, owner_id).await.unwrap();
    let second = store.last_saved.lock().unwrap().clone().unwrap();
    assert_eq!(first.document, second.document);
    assert_eq!(store.get(page_id).unwrap().document.components[0].text("headline"), "Same-day repairs");
}

#[tokio::test]
async fn second_save_while_in_flight_is_rejected() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    open(&state, page_id, owner_id).await.unwrap();
    with_session(&state, page_id, owner_id, EditorSession::begin_save).await.unwrap();

    assert!(matches!(
        save(&state, page_id, owner_id).await,
        Err(EditorError::Session(SessionError::SaveInFlight))
    ));
    assert!(matches!(
        close(&state, page_id, owner_id).await,
        Err(EditorError::Session(SessionError::SaveInFlight))
    ));
    assert_eq!(store.save_count(), 0);
}

#[tokio::test]
async fn save_rejects_schema_violations_without_writing() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    let mut page = store.get(page_id).unwrap();
    page.document.components[0]
        .content
        .insert("backgroundColor".into(), FieldValue::Text("navy".into()));
    store.insert(page);

    open(&state, page_id, owner_id).await.unwrap();
    assert!(matches!(
        save(&state, page_id, owner_id).await,
        Err(EditorError::Session(SessionError::Schema(_)))
    ));
    assert_eq!(store.save_count(), 0);
    let snap = snapshot(&state, page_id, owner_id).await.unwrap();
    assert_eq!(snap.save_state, SaveState::Ready);
}

// =============================================================================
// meta / preview / sweeper
// =============================================================================

#[tokio::test]
async fn sync_meta_does_not_dirty() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    open(&state, page_id, owner_id).await.unwrap();

    let mut meta = dummy_meta("plumbing-pros");
    meta.status = PageStatus::Published;
    sync_meta(&state, page_id, meta).await;

    let snap = snapshot(&state, page_id, owner_id).await.unwrap();
    assert_eq!(snap.meta.unwrap().status, PageStatus::Published);
    assert!(!snap.dirty);
}

#[tokio::test]
async fn live_document_reflects_unsaved_edits() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    assert!(live_document(&state, page_id, owner_id).await.is_none());

    open(&state, page_id, owner_id).await.unwrap();
    edit(&state, page_id, owner_id, |s| s.add_block(BlockKind::Contact)).await.unwrap();
    let (_, document) = live_document(&state, page_id, owner_id).await.unwrap();
    assert_eq!(document.components.len(), 2);
    assert!(live_document(&state, page_id, Uuid::new_v4()).await.is_none());
}

#[tokio::test]
async fn evict_idle_spares_dirty_sessions() {
    let (state, store) = test_app_state();
    let (clean_id, clean_owner) = seed_page(&store);
    let (dirty_id, dirty_owner) = seed_page(&store);
    open(&state, clean_id, clean_owner).await.unwrap();
    open(&state, dirty_id, dirty_owner).await.unwrap();
    edit(&state, dirty_id, dirty_owner, |s| s.add_block(BlockKind::Cta)).await.unwrap();

    assert_eq!(evict_idle(&state, Duration::from_secs(3600)).await, 0);
    assert_eq!(evict_idle(&state, Duration::ZERO).await, 1);

    let editors = state.editors.read().await;
    assert!(!editors.contains_key(&clean_id));
    assert!(editors.contains_key(&dirty_id));
}

#[tokio::test]
async fn forget_drops_session() {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    open(&state, page_id, owner_id).await.unwrap();
    forget(&state, page_id).await;
    assert!(matches!(snapshot(&state, page_id, owner_id).await, Err(EditorError::NotOpen(_))));
}
