//! Component renderer — block → node tree → HTML.
//!
//! DESIGN
//! ======
//! `render_block` is a pure function of `(block, is_selected, mode)`. Dispatch
//! is an exhaustive match over `BlockKind`; unknown kinds render a visible
//! placeholder instead of failing. Edit/delete affordances only carry the
//! block id in `data-action` attributes; handling them belongs to the caller.
//!
//! Text and attribute values are escaped when the tree is serialized, so
//! content fields can hold arbitrary user text.

use std::fmt::Write;

use super::block::{Block, ListItem, Record, Scalar};
use super::schema::BlockKind;

// =============================================================================
// NODE TREE
// =============================================================================

/// Minimal HTML tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element { tag: &'static str, attrs: Vec<(&'static str, String)>, children: Vec<Node> },
    Text(String),
}

const VOID_TAGS: &[&str] = &["input", "meta", "br", "img"];

impl Node {
    #[must_use]
    pub fn el(tag: &'static str) -> Self {
        Self::Element { tag, attrs: Vec::new(), children: Vec::new() }
    }

    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    #[must_use]
    pub fn attr(mut self, name: &'static str, value: impl Into<String>) -> Self {
        if let Self::Element { attrs, .. } = &mut self {
            attrs.push((name, value.into()));
        }
        self
    }

    #[must_use]
    pub fn class(self, value: &str) -> Self {
        self.attr("class", value)
    }

    #[must_use]
    pub fn child(mut self, node: Node) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(node);
        }
        self
    }

    #[must_use]
    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.extend(nodes);
        }
        self
    }

    /// Value of an attribute on this element.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        match self {
            Self::Element { attrs, .. } => attrs.iter().find(|(n, _)| *n == name).map(|(_, v)| v.as_str()),
            Self::Text(_) => None,
        }
    }

    /// Concatenated text content of this subtree.
    #[must_use]
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Self::Text(t) => out.push_str(t),
            Self::Element { children, .. } => children.iter().for_each(|c| c.collect_text(out)),
        }
    }

    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Self::Text(t) => out.push_str(&escape(t)),
            Self::Element { tag, attrs, children } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attrs {
                    let _ = write!(out, " {name}=\"{}\"", escape(value));
                }
                out.push('>');
                if VOID_TAGS.contains(tag) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }
}

#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

// =============================================================================
// RENDER
// =============================================================================

/// Where the page is being shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderMode {
    /// Inside the builder: selection ring plus edit/delete affordances.
    Editor,
    /// Public page; the contact form posts to `lead_action`.
    Published { lead_action: String },
}

/// Page-level metadata used for the document head.
#[derive(Debug, Clone, Copy)]
pub struct Head<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
}

/// Render one block.
#[must_use]
pub fn render_block(block: &Block, selected: bool, mode: &RenderMode) -> Node {
    let body = match &block.kind {
        BlockKind::Hero => hero(block),
        BlockKind::Services => services(block),
        BlockKind::Testimonials => testimonials(block),
        BlockKind::Contact => contact(block, mode),
        BlockKind::Features => features(block),
        BlockKind::Cta => cta(block),
        BlockKind::Unknown(tag) => Node::el("div")
            .class("block-unknown")
            .child(Node::text(format!("Unknown component type: {tag}"))),
    };

    let mut wrapper = Node::el("section")
        .attr("data-block-id", block.id.clone())
        .attr("data-block-type", block.kind.as_str());
    if *mode == RenderMode::Editor {
        wrapper = wrapper.class(if selected { "block block-selected" } else { "block" });
    } else {
        wrapper = wrapper.class("block");
    }
    wrapper = wrapper.child(body);

    if *mode == RenderMode::Editor {
        wrapper = wrapper.child(
            Node::el("div").class("block-controls").children([
                control("edit", "Edit", &block.id),
                control("delete", "Delete", &block.id),
            ]),
        );
    }
    wrapper
}

/// Render an ordered block list.
#[must_use]
pub fn render_blocks(blocks: &[Block], selected: Option<&str>, mode: &RenderMode) -> Node {
    Node::el("main").class("page").children(
        blocks
            .iter()
            .map(|b| render_block(b, selected == Some(b.id.as_str()), mode)),
    )
}

/// Render a complete HTML document.
#[must_use]
pub fn render_document(head: Head<'_>, blocks: &[Block], selected: Option<&str>, mode: &RenderMode) -> String {
    let mut head_node = Node::el("head")
        .child(Node::el("meta").attr("charset", "utf-8"))
        .child(
            Node::el("meta")
                .attr("name", "viewport")
                .attr("content", "width=device-width, initial-scale=1"),
        )
        .child(Node::el("title").child(Node::text(head.title)));
    if let Some(description) = head.description.filter(|d| !d.is_empty()) {
        head_node = head_node.child(
            Node::el("meta")
                .attr("name", "description")
                .attr("content", description),
        );
    }
    let html = Node::el("html")
        .attr("lang", "en")
        .child(head_node)
        .child(Node::el("body").child(render_blocks(blocks, selected, mode)));
    format!("<!DOCTYPE html>{}", html.to_html())
}

fn control(action: &'static str, title: &'static str, block_id: &str) -> Node {
    Node::el("button")
        .attr("type", "button")
        .attr("data-action", action)
        .attr("data-block-id", block_id)
        .attr("title", title)
        .child(Node::text(title))
}

fn heading(tag: &'static str, text: &str) -> Node {
    Node::el(tag).child(Node::text(text))
}

fn paragraph(text: &str) -> Node {
    Node::el("p").child(Node::text(text))
}

fn record_text<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).and_then(Scalar::as_text).unwrap_or_default()
}

fn records<'a>(block: &'a Block, key: &str) -> impl Iterator<Item = &'a Record> {
    block.items(key).iter().filter_map(|item| match item {
        ListItem::Record(record) => Some(record),
        ListItem::Text(_) => None,
    })
}

fn background_style(block: &Block) -> String {
    let mut style = format!("background-color: {}", block.text("backgroundColor"));
    let image = block.text("backgroundImage");
    if !image.is_empty() {
        let _ = write!(style, "; background-image: url('{}')", image.replace('\'', "%27"));
    }
    style
}

fn hero(block: &Block) -> Node {
    Node::el("div")
        .class("hero")
        .attr("style", background_style(block))
        .children([
            heading("h1", block.text("headline")),
            paragraph(block.text("subheadline")),
            Node::el("button").class("cta-button").child(Node::text(block.text("ctaText"))),
        ])
}

fn card_grid(block: &Block, list_key: &str, title_key: &str, class: &str) -> Node {
    Node::el("div").class(class).children([
        heading("h2", block.text("title")),
        Node::el("div").class("grid").children(records(block, list_key).map(|record| {
            Node::el("div").class("card").children([
                Node::el("div").class("icon").child(Node::text(record_text(record, "icon"))),
                heading("h3", record_text(record, title_key)),
                paragraph(record_text(record, "description")),
            ])
        })),
    ])
}

fn services(block: &Block) -> Node {
    card_grid(block, "services", "name", "services")
}

fn features(block: &Block) -> Node {
    card_grid(block, "features", "title", "features")
}

fn stars(rating: f64) -> String {
    // Ratings outside 0..=5 are clamped; fractional ratings round down.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let count = rating.clamp(0.0, 5.0).floor() as usize;
    "⭐".repeat(count)
}

fn testimonials(block: &Block) -> Node {
    Node::el("div").class("testimonials").children([
        heading("h2", block.text("title")),
        Node::el("div").class("quotes").children(records(block, "testimonials").map(|record| {
            let rating = record.get("rating").and_then(Scalar::as_number).unwrap_or(0.0);
            Node::el("blockquote").children([
                Node::el("div").class("rating").child(Node::text(stars(rating))),
                paragraph(&format!("\"{}\"", record_text(record, "text"))),
                Node::el("div").class("author").child(Node::text(record_text(record, "name"))),
                Node::el("div").class("location").child(Node::text(record_text(record, "location"))),
            ])
        })),
    ])
}

/// Form control for one contact field name.
pub(crate) fn contact_input(field: &str) -> Node {
    match field {
        "message" => Node::el("textarea")
            .attr("name", "message")
            .attr("rows", "4")
            .attr("placeholder", "Describe your project..."),
        "service" => Node::el("select").attr("name", "service").children(
            ["Select Service", "Plumbing", "HVAC", "Electrical"]
                .into_iter()
                .map(|o| Node::el("option").child(Node::text(o))),
        ),
        other => {
            let (kind, placeholder) = match other {
                "email" => ("email", "Email Address"),
                "phone" => ("tel", "Phone Number"),
                "name" => ("text", "Your Name"),
                _ => ("text", other),
            };
            Node::el("input")
                .attr("type", kind)
                .attr("name", other)
                .attr("placeholder", placeholder)
        }
    }
}

fn contact(block: &Block, mode: &RenderMode) -> Node {
    let mut form = Node::el("form").attr("method", "post");
    if let RenderMode::Published { lead_action } = mode {
        form = form.attr("action", lead_action.clone());
    }
    let inputs = block.items("fields").iter().filter_map(|item| match item {
        ListItem::Text(field) => Some(contact_input(field)),
        ListItem::Record(_) => None,
    });
    form = form.children(inputs).child(
        Node::el("button")
            .attr("type", "submit")
            .child(Node::text(block.text("ctaText"))),
    );

    Node::el("div")
        .class("contact")
        .children([heading("h2", block.text("title")), paragraph(block.text("subtitle")), form])
}

fn cta(block: &Block) -> Node {
    let phone = block.text("phone");
    Node::el("div")
        .class("cta")
        .attr("style", format!("background-color: {}", block.text("backgroundColor")))
        .children([
            heading("h2", block.text("headline")),
            paragraph(block.text("subheadline")),
            Node::el("button").class("cta-button").child(Node::text(block.text("ctaText"))),
            Node::el("a")
                .attr("href", format!("tel:{phone}"))
                .child(Node::text(phone)),
        ])
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
