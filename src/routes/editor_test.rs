use super::*;
use crate::builder::page::PageStatus;
use crate::builder::session::SaveState;
use crate::services::page::PageError;
use crate::services::session::SessionUser;
use crate::state::test_helpers::{seed_page, test_app_state};

fn auth(owner_id: Uuid) -> AuthUser {
    AuthUser {
        user: SessionUser { id: owner_id, email: "owner@example.com".into(), name: "owner".into() },
        token: "test-token".into(),
    }
}

async fn opened() -> (AppState, std::sync::Arc<crate::state::test_helpers::MemoryPageStore>, Uuid, Uuid) {
    let (state, store) = test_app_state();
    let (page_id, owner_id) = seed_page(&store);
    open_editor(State(state.clone()), auth(owner_id), Path(page_id)).await.unwrap();
    (state, store, page_id, owner_id)
}

async fn add(state: &AppState, page_id: Uuid, owner_id: Uuid, kind: &str) -> Result<String, StatusCode> {
    let (status, Json(body)) = add_block(
        State(state.clone()),
        auth(owner_id),
        Path(page_id),
        Json(AddBlockBody { kind: kind.into() }),
    )
    .await?;
    assert_eq!(status, StatusCode::CREATED);
    Ok(body.block_id)
}

// =============================================================================
// error mapping
// =============================================================================

#[test]
fn session_state_conflicts_map_to_409() {
    for err in [SessionError::Loading, SessionError::SaveInFlight, SessionError::AlreadyLoaded, SessionError::NotSaving] {
        assert_eq!(session_error_to_status(&err), StatusCode::CONFLICT);
    }
}

#[test]
fn canvas_errors_map_by_kind() {
    assert_eq!(
        session_error_to_status(&SessionError::Canvas(CanvasError::BlockNotFound("x".into()))),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        session_error_to_status(&SessionError::Canvas(CanvasError::IndexOutOfRange { index: 4, len: 1 })),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        session_error_to_status(&SessionError::Canvas(CanvasError::Schema(SchemaError::NoSchema("map".into())))),
        StatusCode::UNPROCESSABLE_ENTITY
    );
}

#[test]
fn schema_errors_map_to_422_except_index() {
    let mismatch = SchemaError::TypeMismatch { field: "backgroundColor".into(), expected: "a hex color" };
    assert_eq!(schema_error_to_status(&mismatch), StatusCode::UNPROCESSABLE_ENTITY);
    let index = SchemaError::IndexOutOfRange { field: "services".into(), index: 9, len: 3 };
    assert_eq!(schema_error_to_status(&index), StatusCode::BAD_REQUEST);
}

#[test]
fn editor_errors_follow_page_errors() {
    assert_eq!(editor_error_to_status(EditorError::NotOpen(Uuid::nil())), StatusCode::NOT_FOUND);
    assert_eq!(
        editor_error_to_status(EditorError::LoadFailed(PageError::NotFound(Uuid::nil()))),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        editor_error_to_status(EditorError::SaveFailed(PageError::SlugTaken("home".into()))),
        StatusCode::CONFLICT
    );
    assert_eq!(
        editor_error_to_status(EditorError::SaveFailed(PageError::Database(sqlx::Error::PoolTimedOut))),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

// =============================================================================
// component library
// =============================================================================

#[tokio::test]
async fn block_types_lists_library_in_order() {
    let Json(cards) = block_types().await;
    let kinds: Vec<_> = cards.iter().map(|c| c.kind).collect();
    assert_eq!(kinds, ["hero", "services", "testimonials", "contact", "features", "cta"]);
    assert_eq!(cards[0].name, "Hero Section");
    assert!(cards[0].fields.iter().any(|f| f.key == "backgroundColor" && f.input == "color"));
    assert_eq!(
        cards[0].default_content.get("headline"),
        Some(&FieldValue::Text("Professional Home Services".into()))
    );
}

// =============================================================================
// session routes
// =============================================================================

#[tokio::test]
async fn open_unknown_page_is_not_found() {
    let (state, _) = test_app_state();
    let err = open_editor(State(state), auth(Uuid::new_v4()), Path(Uuid::new_v4())).await.unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn other_owner_sees_not_found() {
    let (state, _, page_id, _) = opened().await;
    let err = get_editor(State(state), auth(Uuid::new_v4()), Path(page_id)).await.unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn add_then_move_orders_canvas() {
    let (state, _, page_id, owner_id) = opened().await;
    add(&state, page_id, owner_id, "services").await.unwrap();

    let Json(snap) = move_block(
        State(state.clone()),
        auth(owner_id),
        Path(page_id),
        Json(MoveBlockBody { from: 1, to: 0 }),
    )
    .await
    .unwrap();
    let kinds: Vec<_> = snap.blocks.iter().map(|b| b.kind.as_str()).collect();
    assert_eq!(kinds, ["services", "hero"]);
    assert!(snap.dirty);
}

#[tokio::test]
async fn add_unknown_type_is_unprocessable() {
    let (state, _, page_id, owner_id) = opened().await;
    assert_eq!(add(&state, page_id, owner_id, "carousel").await.unwrap_err(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn move_out_of_range_is_bad_request() {
    let (state, _, page_id, owner_id) = opened().await;
    let err = move_block(State(state), auth(owner_id), Path(page_id), Json(MoveBlockBody { from: 0, to: 5 }))
        .await
        .unwrap_err();
    assert_eq!(err, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn select_then_delete_clears_selection() {
    let (state, _, page_id, owner_id) = opened().await;
    let Json(snap) = select_block(
        State(state.clone()),
        auth(owner_id),
        Path(page_id),
        Json(SelectBlockBody { block_id: Some("hero-1".into()) }),
    )
    .await
    .unwrap();
    assert_eq!(snap.selected.as_deref(), Some("hero-1"));

    let Json(snap) = delete_block(State(state), auth(owner_id), Path((page_id, "hero-1".into())))
        .await
        .unwrap();
    assert!(snap.blocks.is_empty());
    assert!(snap.selected.is_none());
}

#[tokio::test]
async fn set_field_updates_only_that_field() {
    let (state, _, page_id, owner_id) = opened().await;
    let Json(snap) = set_field(
        State(state),
        auth(owner_id),
        Path((page_id, "hero-1".into(), "headline".into())),
        Json(SetFieldBody { value: FieldValue::Text("Same-day repairs".into()) }),
    )
    .await
    .unwrap();
    assert_eq!(snap.blocks[0].text("headline"), "Same-day repairs");
    assert_eq!(snap.blocks[0].text("ctaText"), "Get Free Quote");
}

#[tokio::test]
async fn set_field_on_missing_block_is_not_found() {
    let (state, _, page_id, owner_id) = opened().await;
    let err = set_field(
        State(state),
        auth(owner_id),
        Path((page_id, "services-9".into(), "title".into())),
        Json(SetFieldBody { value: FieldValue::Text("x".into()) }),
    )
    .await
    .unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn set_undefined_field_is_unprocessable() {
    let (state, _, page_id, owner_id) = opened().await;
    let err = set_field(
        State(state),
        auth(owner_id),
        Path((page_id, "hero-1".into(), "videoUrl".into())),
        Json(SetFieldBody { value: FieldValue::Text("x".into()) }),
    )
    .await
    .unwrap_err();
    assert_eq!(err, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn list_items_append_edit_remove() {
    let (state, _, page_id, owner_id) = opened().await;
    let block_id = add(&state, page_id, owner_id, "testimonials").await.unwrap();

    let (status, Json(appended)) = append_item(
        State(state.clone()),
        auth(owner_id),
        Path((page_id, block_id.clone(), "testimonials".into())),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(appended.index, 1);

    set_item_field(
        State(state.clone()),
        auth(owner_id),
        Path((page_id, block_id.clone(), "testimonials".into(), 1)),
        Json(SetItemFieldBody { item_key: Some("name".into()), value: Scalar::Text("Maria".into()) }),
    )
    .await
    .unwrap();

    let Json(snap) = remove_item(State(state.clone()), auth(owner_id), Path((page_id, block_id.clone(), "testimonials".into(), 0)))
        .await
        .unwrap();
    let block = snap.blocks.iter().find(|b| b.id == block_id).unwrap();
    assert_eq!(block.items("testimonials").len(), 1);

    let err = remove_item(State(state), auth(owner_id), Path((page_id, block_id, "testimonials".into(), 3)))
        .await
        .unwrap_err();
    assert_eq!(err, StatusCode::BAD_REQUEST);
}

// =============================================================================
// meta / save / render
// =============================================================================

#[tokio::test]
async fn set_meta_stages_changes_until_save() {
    let (state, store, page_id, owner_id) = opened().await;
    let update = MetaUpdate { status: Some(PageStatus::Published), ..MetaUpdate::default() };
    let Json(snap) = set_meta(State(state.clone()), auth(owner_id), Path(page_id), Json(update)).await.unwrap();
    assert_eq!(snap.meta.unwrap().status, PageStatus::Published);
    assert!(snap.dirty);
    assert_eq!(store.get(page_id).unwrap().meta.status, PageStatus::Draft);

    save_editor(State(state), auth(owner_id), Path(page_id)).await.unwrap();
    assert_eq!(store.get(page_id).unwrap().meta.status, PageStatus::Published);
}

#[tokio::test]
async fn set_meta_rejects_bad_slug() {
    let (state, _, page_id, owner_id) = opened().await;
    let update = MetaUpdate { slug: Some("Not A Slug".into()), ..MetaUpdate::default() };
    let err = set_meta(State(state), auth(owner_id), Path(page_id), Json(update)).await.unwrap_err();
    assert_eq!(err, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn failed_save_is_500_and_keeps_edits() {
    let (state, store, page_id, owner_id) = opened().await;
    add(&state, page_id, owner_id, "cta").await.unwrap();
    store.set_fail_saves(true);

    let err = save_editor(State(state.clone()), auth(owner_id), Path(page_id)).await.unwrap_err();
    assert_eq!(err, StatusCode::INTERNAL_SERVER_ERROR);

    let Json(snap) = get_editor(State(state), auth(owner_id), Path(page_id)).await.unwrap();
    assert_eq!(snap.blocks.len(), 2);
    assert!(snap.dirty);
    assert!(matches!(snap.save_state, SaveState::Error(_)));
}

#[tokio::test]
async fn render_marks_selected_block() {
    let (state, _, page_id, owner_id) = opened().await;
    select_block(
        State(state.clone()),
        auth(owner_id),
        Path(page_id),
        Json(SelectBlockBody { block_id: Some("hero-1".into()) }),
    )
    .await
    .unwrap();

    let Html(html) = render_editor(State(state), auth(owner_id), Path(page_id)).await.unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("block block-selected"));
    assert!(html.contains("<title>Plumbing Pros</title>"));
}

#[tokio::test]
async fn close_then_get_is_not_found() {
    let (state, _, page_id, owner_id) = opened().await;
    let status = close_editor(State(state.clone()), auth(owner_id), Path(page_id)).await.unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    let err = get_editor(State(state), auth(owner_id), Path(page_id)).await.unwrap_err();
    assert_eq!(err, StatusCode::NOT_FOUND);
}
