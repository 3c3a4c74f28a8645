use super::*;

fn published() -> RenderMode {
    RenderMode::Published { lead_action: "/p/plumbing/leads".into() }
}

#[test]
fn escape_covers_html_specials() {
    assert_eq!(escape(r#"<a href="x">Tom & 'Jerry'</a>"#), "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;");
}

#[test]
fn void_elements_have_no_closing_tag() {
    let html = Node::el("input").attr("type", "text").to_html();
    assert_eq!(html, r#"<input type="text">"#);
}

#[test]
fn hero_renders_headline_and_color() {
    let block = Block::with_defaults("hero-1", BlockKind::Hero).unwrap();
    let node = render_block(&block, false, &published());
    let text = node.text_content();
    assert!(text.contains("Professional Home Services"));
    assert!(text.contains("Get Free Quote"));
    assert!(node.to_html().contains("background-color: #1e40af"));
}

#[test]
fn user_text_is_escaped() {
    let mut block = Block::with_defaults("hero-1", BlockKind::Hero).unwrap();
    block.content.insert(
        "headline".into(),
        crate::builder::block::FieldValue::Text("<script>alert(1)</script>".into()),
    );
    let html = render_block(&block, false, &published()).to_html();
    assert!(!html.contains("<script>"));
    assert!(html.contains("&lt;script&gt;"));
}

#[test]
fn unknown_kind_renders_placeholder() {
    let block = Block { id: "g-1".into(), kind: BlockKind::Unknown("gallery".into()), content: Default::default() };
    let node = render_block(&block, false, &RenderMode::Editor);
    assert!(node.text_content().contains("Unknown component type: gallery"));
}

#[test]
fn editor_mode_marks_selection_and_controls() {
    let block = Block::with_defaults("cta-1", BlockKind::Cta).unwrap();
    let selected = render_block(&block, true, &RenderMode::Editor);
    assert_eq!(selected.get_attr("class"), Some("block block-selected"));
    let html = selected.to_html();
    assert!(html.contains(r#"data-action="edit""#));
    assert!(html.contains(r#"data-action="delete""#));

    let plain = render_block(&block, false, &RenderMode::Editor);
    assert_eq!(plain.get_attr("class"), Some("block"));
}

#[test]
fn published_mode_has_no_controls() {
    let block = Block::with_defaults("cta-1", BlockKind::Cta).unwrap();
    let html = render_block(&block, true, &published()).to_html();
    assert!(!html.contains("data-action"));
    assert!(!html.contains("block-selected"));
    assert!(html.contains(r#"href="tel:(555) 123-4567""#));
}

#[test]
fn contact_form_posts_to_lead_action() {
    let block = Block::with_defaults("contact-1", BlockKind::Contact).unwrap();
    let html = render_block(&block, false, &published()).to_html();
    assert!(html.contains(r#"action="/p/plumbing/leads""#));
    assert!(html.contains(r#"name="email""#));
    assert!(html.contains(r#"<textarea name="message""#));
    assert!(html.contains("Request Quote"));
}

#[test]
fn testimonials_render_star_rating() {
    let block = Block::with_defaults("t-1", BlockKind::Testimonials).unwrap();
    let text = render_block(&block, false, &published()).text_content();
    assert!(text.contains("⭐⭐⭐⭐⭐"));
    assert!(text.contains("John Smith"));
}

#[test]
fn stars_clamp_out_of_range() {
    assert_eq!(stars(9.0), "⭐⭐⭐⭐⭐");
    assert_eq!(stars(-1.0), "");
    assert_eq!(stars(3.7), "⭐⭐⭐");
}

#[test]
fn blocks_render_in_order() {
    let blocks = vec![
        Block::with_defaults("services-1", BlockKind::Services).unwrap(),
        Block::with_defaults("hero-1", BlockKind::Hero).unwrap(),
    ];
    let html = render_blocks(&blocks, None, &published()).to_html();
    let services = html.find("data-block-id=\"services-1\"").unwrap();
    let hero = html.find("data-block-id=\"hero-1\"").unwrap();
    assert!(services < hero);
}

#[test]
fn document_includes_title_and_description() {
    let blocks = vec![Block::with_defaults("hero-1", BlockKind::Hero).unwrap()];
    let head = Head { title: "Plumbing & Heating", description: Some("Fast repairs") };
    let html = render_document(head, &blocks, None, &published());
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("<title>Plumbing &amp; Heating</title>"));
    assert!(html.contains(r#"<meta name="description" content="Fast repairs">"#));
}
