use super::*;
use crate::builder::block::Record;
use crate::builder::schema::BlockKind;

fn hero(headline: &str, subheadline: &str) -> Block {
    let mut block = Block { id: "hero-1".into(), kind: BlockKind::Hero, content: Default::default() };
    block.content.insert("headline".into(), FieldValue::Text(headline.into()));
    block.content.insert("subheadline".into(), FieldValue::Text(subheadline.into()));
    block
}

fn record(item: &ListItem) -> &Record {
    match item {
        ListItem::Record(r) => r,
        ListItem::Text(_) => panic!("expected record"),
    }
}

// =============================================================================
// panel
// =============================================================================

#[test]
fn panel_empty_without_selection() {
    assert_eq!(panel(None), Panel::Empty);
}

#[test]
fn panel_unsupported_for_unknown_kind() {
    let block = Block { id: "x-1".into(), kind: BlockKind::Unknown("map".into()), content: Default::default() };
    assert_eq!(panel(Some(&block)), Panel::Unsupported { block_id: "x-1".into(), kind: "map".into() });
}

#[test]
fn panel_lists_one_input_per_schema_field() {
    let block = Block::with_defaults("hero-1", BlockKind::Hero).unwrap();
    let Panel::Fields { inputs, .. } = panel(Some(&block)) else {
        panic!("expected fields");
    };
    let keys: Vec<&str> = inputs.iter().map(|i| i.key).collect();
    assert_eq!(keys, ["headline", "subheadline", "ctaText", "backgroundImage", "backgroundColor"]);
    assert_eq!(inputs[1].input, "multiline");
    assert_eq!(inputs[4].input, "color");
}

#[test]
fn panel_expands_record_items() {
    let block = Block::with_defaults("s-1", BlockKind::Services).unwrap();
    let Panel::Fields { inputs, .. } = panel(Some(&block)) else {
        panic!("expected fields");
    };
    let services = inputs.iter().find(|i| i.key == "services").unwrap();
    assert_eq!(services.input, "records");
    assert_eq!(services.items.len(), 3);
    assert_eq!(services.items[0][0].key, "name");
    assert_eq!(services.items[0][0].value, Some(Scalar::Text("Emergency Repairs".into())));
}

#[test]
fn panel_input_value_none_for_missing_field() {
    let block = hero("A", "B");
    let Panel::Fields { inputs, .. } = panel(Some(&block)) else {
        panic!("expected fields");
    };
    assert!(inputs.iter().find(|i| i.key == "ctaText").unwrap().value.is_none());
}

// =============================================================================
// set_field
// =============================================================================

#[test]
fn editing_headline_keeps_subheadline() {
    let mut block = hero("A", "B");
    set_field(&mut block, "headline", FieldValue::Text("C".into())).unwrap();
    assert_eq!(block.content.len(), 2);
    assert_eq!(block.text("headline"), "C");
    assert_eq!(block.text("subheadline"), "B");
}

#[test]
fn set_field_rejects_undefined_key() {
    let mut block = hero("A", "B");
    let err = set_field(&mut block, "rating", FieldValue::Number(1.into())).unwrap_err();
    assert!(matches!(err, SchemaError::UnknownField { .. }));
    assert_eq!(block, hero("A", "B"));
}

#[test]
fn set_field_rejects_bad_color() {
    let mut block = Block::with_defaults("cta-1", BlockKind::Cta).unwrap();
    let before = block.clone();
    assert!(set_field(&mut block, "backgroundColor", FieldValue::Text("blue".into())).is_err());
    assert_eq!(block, before);
}

#[test]
fn set_field_on_unknown_kind_fails() {
    let mut block = Block { id: "x".into(), kind: BlockKind::Unknown("map".into()), content: Default::default() };
    let err = set_field(&mut block, "lat", FieldValue::Number(1.into())).unwrap_err();
    assert_eq!(err, SchemaError::NoSchema("map".into()));
}

// =============================================================================
// list edits
// =============================================================================

#[test]
fn set_item_field_edits_one_record_key() {
    let mut block = Block::with_defaults("s-1", BlockKind::Services).unwrap();
    set_item_field(&mut block, "services", 1, Some("name"), Scalar::Text("Install+".into())).unwrap();

    let items = block.items("services");
    assert_eq!(record(&items[1])["name"], Scalar::Text("Install+".into()));
    assert_eq!(
        record(&items[1])["description"],
        Scalar::Text("Professional installation services".into())
    );
    assert_eq!(record(&items[0])["name"], Scalar::Text("Emergency Repairs".into()));
    assert_eq!(block.text("title"), "Our Services");
}

#[test]
fn set_item_field_checks_scalar_kind() {
    let mut block = Block::with_defaults("t-1", BlockKind::Testimonials).unwrap();
    assert!(set_item_field(&mut block, "testimonials", 0, Some("rating"), Scalar::Number(4.into())).is_ok());
    let err = set_item_field(&mut block, "testimonials", 0, Some("rating"), Scalar::Text("x".into())).unwrap_err();
    assert!(matches!(err, SchemaError::TypeMismatch { .. }));
}

#[test]
fn set_item_field_out_of_range() {
    let mut block = Block::with_defaults("s-1", BlockKind::Services).unwrap();
    let err = set_item_field(&mut block, "services", 3, Some("name"), Scalar::Text("x".into())).unwrap_err();
    assert_eq!(err, SchemaError::IndexOutOfRange { field: "services".into(), index: 3, len: 3 });
}

#[test]
fn set_item_field_on_text_list() {
    let mut block = Block::with_defaults("c-1", BlockKind::Contact).unwrap();
    set_item_field(&mut block, "fields", 0, None, Scalar::Text("full_name".into())).unwrap();
    assert_eq!(block.items("fields")[0], ListItem::Text("full_name".into()));
    assert!(set_item_field(&mut block, "fields", 0, Some("x"), Scalar::Text("y".into())).is_err());
}

#[test]
fn set_item_field_on_scalar_field_fails() {
    let mut block = Block::with_defaults("h-1", BlockKind::Hero).unwrap();
    let err = set_item_field(&mut block, "headline", 0, None, Scalar::Text("x".into())).unwrap_err();
    assert_eq!(err, SchemaError::NotAList { field: "headline".into() });
}

#[test]
fn append_item_uses_template() {
    let mut block = Block::with_defaults("t-1", BlockKind::Testimonials).unwrap();
    let index = append_item(&mut block, "testimonials").unwrap();
    assert_eq!(index, 1);
    let items = block.items("testimonials");
    assert_eq!(items.len(), 2);
    assert_eq!(record(&items[1])["rating"], Scalar::Number(5.into()));
    assert_eq!(record(&items[0])["name"], Scalar::Text("John Smith".into()));
}

#[test]
fn append_item_to_missing_field_starts_from_default() {
    let mut block = Block { id: "f-1".into(), kind: BlockKind::Features, content: Default::default() };
    append_item(&mut block, "features").unwrap();
    assert_eq!(block.items("features").len(), 4);
}

#[test]
fn remove_item_by_index() {
    let mut block = Block::with_defaults("f-1", BlockKind::Features).unwrap();
    let removed = remove_item(&mut block, "features", 0).unwrap();
    assert_eq!(record(&removed)["title"], Scalar::Text("Licensed & Insured".into()));
    let titles: Vec<_> = block
        .items("features")
        .iter()
        .map(|i| record(i)["title"].clone())
        .collect();
    assert_eq!(titles, [Scalar::Text("24/7 Service".into()), Scalar::Text("Free Estimates".into())]);
}

#[test]
fn remove_item_out_of_range() {
    let mut block = Block::with_defaults("f-1", BlockKind::Features).unwrap();
    assert!(matches!(
        remove_item(&mut block, "features", 9),
        Err(SchemaError::IndexOutOfRange { index: 9, len: 3, .. })
    ));
}
