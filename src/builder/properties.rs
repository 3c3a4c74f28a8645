//! Properties panel — form descriptors and in-place field edits.
//!
//! Every edit replaces exactly one field of the block's content map (a
//! shallow merge). List edits are index-addressed and rewrite only the
//! addressed element, or append/remove a single element.

use serde::Serialize;

use super::block::{Block, FieldValue, ListItem, Scalar};
use super::schema::{BlockSchema, FieldSpec, InputKind, SchemaError, item_template};

// =============================================================================
// DESCRIPTORS
// =============================================================================

/// Panel contents for the current selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Panel {
    /// Nothing selected.
    Empty,
    /// Selected block has no schema in this build.
    Unsupported { block_id: String, kind: String },
    Fields { block_id: String, kind: String, inputs: Vec<FieldInput> },
}

/// One input control bound to a content field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldInput {
    pub key: &'static str,
    pub label: &'static str,
    pub input: &'static str,
    pub value: Option<FieldValue>,
    /// Per-element sub-inputs for record lists.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<Vec<ItemInput>>,
}

/// Sub-input for one field of one record in a list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemInput {
    pub key: &'static str,
    pub label: &'static str,
    pub input: &'static str,
    pub value: Option<Scalar>,
}

/// Build the panel for the selected block (or none).
#[must_use]
pub fn panel(selected: Option<&Block>) -> Panel {
    let Some(block) = selected else {
        return Panel::Empty;
    };
    let Some(schema) = block.kind.schema() else {
        return Panel::Unsupported { block_id: block.id.clone(), kind: block.kind.as_str().to_owned() };
    };
    Panel::Fields {
        block_id: block.id.clone(),
        kind: block.kind.as_str().to_owned(),
        inputs: schema.fields.iter().map(|spec| field_input(spec, block)).collect(),
    }
}

fn field_input(spec: &'static FieldSpec, block: &Block) -> FieldInput {
    let value = block.content.get(spec.key).cloned();
    let items = match spec.input {
        InputKind::Records(fields) => block
            .items(spec.key)
            .iter()
            .map(|item| {
                fields
                    .iter()
                    .map(|f| ItemInput {
                        key: f.key,
                        label: f.label,
                        input: f.input.tag(),
                        value: match item {
                            ListItem::Record(record) => record.get(f.key).cloned(),
                            ListItem::Text(_) => None,
                        },
                    })
                    .collect()
            })
            .collect(),
        _ => Vec::new(),
    };
    FieldInput { key: spec.key, label: spec.label, input: spec.input.tag(), value, items }
}

// =============================================================================
// EDITS
// =============================================================================

fn schema_of(block: &Block) -> Result<&'static BlockSchema, SchemaError> {
    block
        .kind
        .schema()
        .ok_or_else(|| SchemaError::NoSchema(block.kind.as_str().to_owned()))
}

/// Replace one field, leaving siblings untouched.
///
/// # Errors
///
/// Rejects unknown kinds, undefined fields and values of the wrong kind.
pub fn set_field(block: &mut Block, key: &str, value: FieldValue) -> Result<(), SchemaError> {
    schema_of(block)?.check(key, &value)?;
    block.content.insert(key.to_owned(), value);
    Ok(())
}

/// Copy of a list field's items, seeded from the default when absent.
fn list_of(block: &Block, spec: &FieldSpec) -> Result<Vec<ListItem>, SchemaError> {
    if !matches!(spec.input, InputKind::TextList | InputKind::Records(_)) {
        return Err(SchemaError::NotAList { field: spec.key.to_owned() });
    }
    match block.content.get(spec.key) {
        Some(FieldValue::List(items)) => Ok(items.clone()),
        Some(_) => Err(SchemaError::NotAList { field: spec.key.to_owned() }),
        None => match spec.default.to_value() {
            FieldValue::List(items) => Ok(items),
            _ => Ok(Vec::new()),
        },
    }
}

fn check_index(field: &str, index: usize, len: usize) -> Result<(), SchemaError> {
    if index >= len {
        return Err(SchemaError::IndexOutOfRange { field: field.to_owned(), index, len });
    }
    Ok(())
}

/// Edit one element of a list field.
///
/// For record lists `item_key` names the record field to replace (other keys
/// of that record are kept). For text lists `item_key` must be `None` and the
/// element is replaced with `value`'s text.
///
/// # Errors
///
/// Rejects out-of-range indices and values that do not match the schema.
pub fn set_item_field(
    block: &mut Block,
    key: &str,
    index: usize,
    item_key: Option<&str>,
    value: Scalar,
) -> Result<(), SchemaError> {
    let spec = schema_of(block)?.require_field(key)?;
    let mut items = list_of(block, spec)?;
    check_index(key, index, items.len())?;

    let mismatch = |expected| SchemaError::TypeMismatch { field: key.to_owned(), expected };
    match (spec.input, item_key) {
        (InputKind::TextList, None) => {
            let Scalar::Text(text) = value else {
                return Err(mismatch("a string"));
            };
            items[index] = ListItem::Text(text);
        }
        (InputKind::Records(fields), Some(item_key)) => {
            let field = fields
                .iter()
                .find(|f| f.key == item_key)
                .ok_or_else(|| SchemaError::UnknownField { kind: key.to_owned(), field: item_key.to_owned() })?;
            if !field.input.accepts_scalar(&value) {
                return Err(SchemaError::TypeMismatch {
                    field: format!("{key}.{item_key}"),
                    expected: if field.input == InputKind::Number { "a number" } else { "a string" },
                });
            }
            let ListItem::Record(record) = &mut items[index] else {
                return Err(mismatch("a list of records"));
            };
            record.insert(item_key.to_owned(), value);
        }
        (InputKind::TextList, Some(_)) => return Err(mismatch("a plain string element")),
        _ => return Err(mismatch("a record field name")),
    }

    block.content.insert(key.to_owned(), FieldValue::List(items));
    Ok(())
}

/// Append a blank element (from the schema's item template). Returns the
/// new element's index.
///
/// # Errors
///
/// Rejects fields that are not lists.
pub fn append_item(block: &mut Block, key: &str) -> Result<usize, SchemaError> {
    let spec = schema_of(block)?.require_field(key)?;
    let mut items = list_of(block, spec)?;
    let template = item_template(spec.input).ok_or_else(|| SchemaError::NotAList { field: key.to_owned() })?;
    items.push(template);
    let index = items.len() - 1;
    block.content.insert(key.to_owned(), FieldValue::List(items));
    Ok(index)
}

/// Remove one element of a list field.
///
/// # Errors
///
/// Rejects fields that are not lists and out-of-range indices.
pub fn remove_item(block: &mut Block, key: &str, index: usize) -> Result<ListItem, SchemaError> {
    let spec = schema_of(block)?.require_field(key)?;
    let mut items = list_of(block, spec)?;
    check_index(key, index, items.len())?;
    let removed = items.remove(index);
    block.content.insert(key.to_owned(), FieldValue::List(items));
    Ok(removed)
}

#[cfg(test)]
#[path = "properties_test.rs"]
mod tests;
