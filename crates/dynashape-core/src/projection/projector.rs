//! Applies projection structs and single paths to schemas.
//!
//! Internally a projection either produces a schema (which may include
//! `undefined` when the value can be absent) or is structurally invalid
//! (`None`): a named selection into a list, or an index selection into an
//! object or record. Inside a union, invalid variants are dropped; anywhere
//! else an invalid child is simply omitted.

use dynashape_model::{Field, RecordKey, Schema};

use super::{ProjectionStruct, Selection};
use crate::expression::Segment;

/// Options threaded through every projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectOptions {
    /// Drop optionality that comes only from the schema declaring a field
    /// optional. Used for values known to exist after a write.
    pub make_required: bool,
    /// Treat list index access as possibly absent.
    pub strict_index_access: bool,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            make_required: false,
            strict_index_access: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Struct projection
// ---------------------------------------------------------------------------

/// Project an item schema down to the selected paths.
///
/// Returns `undefined` when nothing can be selected from any variant.
#[must_use]
pub fn project(schema: &Schema, projection: &ProjectionStruct, options: &ProjectOptions) -> Schema {
    project_node(schema, projection, options).unwrap_or(Schema::Undefined)
}

/// Apply one selection to a value schema. The result includes `undefined`
/// when the projected value may be absent.
#[must_use]
pub fn project_value(schema: &Schema, selection: &Selection, options: &ProjectOptions) -> Schema {
    select(schema, selection, options).unwrap_or(Schema::Undefined)
}

fn select(schema: &Schema, selection: &Selection, options: &ProjectOptions) -> Option<Schema> {
    match selection {
        Selection::All => Some(schema.clone()),
        Selection::Collapse => Some(collapse(schema)),
        Selection::Partial(sub) => project_node(schema, sub, options),
    }
}

fn project_node(
    schema: &Schema,
    node: &ProjectionStruct,
    options: &ProjectOptions,
) -> Option<Schema> {
    match schema {
        Schema::Union { variants } => {
            let projected: Vec<Schema> = variants
                .iter()
                .filter_map(|v| project_node(v, node, options))
                .collect();
            if projected.is_empty() {
                None
            } else {
                Some(Schema::union(projected))
            }
        }
        Schema::Object { fields } => {
            if node.fields.is_empty() {
                return None;
            }
            let out = fields
                .iter()
                .filter_map(|field| {
                    let selection = node.fields.get(&field.name)?;
                    let (value, may_be_absent) = select_child(&field.schema, selection, options)?;
                    Some(Field {
                        name: field.name.clone(),
                        schema: value,
                        optional: (field.optional && !options.make_required) || may_be_absent,
                    })
                })
                .collect();
            Some(Schema::object(out))
        }
        Schema::Record { key, value } => {
            if node.fields.is_empty() {
                return None;
            }
            let out = node
                .fields
                .iter()
                .filter(|(name, _)| accepts_key(*key, name))
                .filter_map(|(name, selection)| {
                    let (projected, may_be_absent) = select_child(value, selection, options)?;
                    Some(Field {
                        name: name.clone(),
                        schema: projected,
                        optional: !options.make_required || may_be_absent,
                    })
                })
                .collect();
            Some(Schema::object(out))
        }
        Schema::Array { element } => {
            if node.indices.is_empty() {
                return None;
            }
            let elements: Vec<Schema> = node
                .indices
                .values()
                .filter_map(|selection| select(element, selection, options))
                .map(|p| p.without_undefined())
                .filter(|p| !p.is_never())
                .collect();
            if elements.is_empty() {
                return Some(Schema::Undefined);
            }
            let projected = Schema::array(Schema::union(elements));
            Some(if options.strict_index_access {
                projected.or_undefined()
            } else {
                projected
            })
        }
        Schema::Tuple { elements, rest } => {
            if node.indices.is_empty() {
                return None;
            }
            let mut out = Vec::new();
            let mut collapsed = false;
            for (&idx, selection) in &node.indices {
                let position = match (elements.get(idx), rest) {
                    (Some(position), _) => position,
                    (None, Some(rest)) => {
                        collapsed = true;
                        rest.as_ref()
                    }
                    (None, None) => continue,
                };
                match select(position, selection, options) {
                    Some(p) if !p.without_undefined().is_never() => {
                        collapsed |= p.is_possibly_undefined();
                        out.push(p.without_undefined());
                    }
                    _ => collapsed = true,
                }
            }
            if out.is_empty() {
                Some(Schema::Undefined)
            } else if collapsed {
                Some(Schema::array(Schema::union(out)).or_undefined())
            } else {
                Some(Schema::tuple(out))
            }
        }
        _ => Some(Schema::Undefined),
    }
}

/// Project a named child. Returns the value without `undefined` and whether
/// the child may be missing from the result, or `None` if it never appears.
fn select_child(
    schema: &Schema,
    selection: &Selection,
    options: &ProjectOptions,
) -> Option<(Schema, bool)> {
    let value = select(schema, selection, options)?;
    let may_be_absent = value.is_possibly_undefined()
        || (matches!(selection, Selection::Partial(_)) && may_be_empty(&value));
    let value = value.without_undefined();
    if value.is_never() {
        None
    } else {
        Some((value, may_be_absent))
    }
}

/// A projected map with no required fields can come back empty, and the
/// store omits empty projected maps.
fn may_be_empty(schema: &Schema) -> bool {
    schema.members().iter().any(|m| match m {
        Schema::Object { fields } => fields.iter().all(|f| f.optional),
        _ => false,
    })
}

fn accepts_key(key: RecordKey, name: &str) -> bool {
    match key {
        RecordKey::String => true,
        RecordKey::Number => is_decimal_number(name),
    }
}

/// `-?digits[.digits][e[+-]digits]`, with digits on at least one side of
/// the point.
fn is_decimal_number(text: &str) -> bool {
    let digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let unsigned = text.strip_prefix('-').unwrap_or(text);
    let (mantissa, exponent) = match unsigned.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, Some(exponent)),
        None => (unsigned, None),
    };
    let (int, frac) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let exponent_ok = exponent.is_none_or(|e| {
        let e = e.strip_prefix(['+', '-']).unwrap_or(e);
        !e.is_empty() && digits(e)
    });
    !(int.is_empty() && frac.is_empty()) && digits(int) && digits(frac) && exponent_ok
}

/// A list that lost positions: `T[] | undefined` over every element type.
fn collapse(schema: &Schema) -> Schema {
    match schema {
        Schema::Union { variants } => Schema::union(variants.iter().map(collapse)),
        Schema::Array { element } => Schema::array(element.as_ref().clone()).or_undefined(),
        Schema::Tuple { elements, rest } => Schema::array(Schema::union(
            elements
                .iter()
                .cloned()
                .chain(rest.iter().map(|r| r.as_ref().clone())),
        ))
        .or_undefined(),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// Path projection
// ---------------------------------------------------------------------------

/// The schema of the value at one resolved path, `undefined` included when
/// the value may be absent.
#[must_use]
pub fn project_path(schema: &Schema, segments: &[Segment], options: &ProjectOptions) -> Schema {
    path_node(schema, segments, options).unwrap_or(Schema::Undefined)
}

fn path_node(schema: &Schema, segments: &[Segment], options: &ProjectOptions) -> Option<Schema> {
    let Some((first, rest)) = segments.split_first() else {
        return Some(schema.clone());
    };
    match (schema, first) {
        (Schema::Union { variants }, _) => {
            let projected: Vec<Schema> = variants
                .iter()
                .filter_map(|v| path_node(v, segments, options))
                .collect();
            if projected.is_empty() {
                None
            } else {
                Some(Schema::union(projected))
            }
        }
        (Schema::Object { fields }, Segment::Field(name) | Segment::Placeholder(name)) => {
            match fields.iter().find(|f| f.name == *name) {
                Some(field) => {
                    let value = path_node(&field.schema, rest, options)?;
                    Some(if field.optional && !options.make_required {
                        value.or_undefined()
                    } else {
                        value
                    })
                }
                None => Some(Schema::Undefined),
            }
        }
        (Schema::Record { key, value }, Segment::Field(name) | Segment::Placeholder(name)) => {
            if !accepts_key(*key, name) {
                return Some(Schema::Undefined);
            }
            let value = path_node(value, rest, options)?;
            Some(if options.make_required {
                value
            } else {
                value.or_undefined()
            })
        }
        (Schema::Array { element }, Segment::Index(_)) => {
            let value = path_node(element, rest, options)?;
            Some(if options.strict_index_access {
                value.or_undefined()
            } else {
                value
            })
        }
        (Schema::Tuple { elements, rest: tail }, Segment::Index(idx)) => {
            match (elements.get(*idx), tail) {
                (Some(element), _) => path_node(element, rest, options),
                (None, Some(tail)) => Some(path_node(tail, rest, options)?.or_undefined()),
                (None, None) => Some(Schema::Undefined),
            }
        }
        (Schema::Object { .. } | Schema::Record { .. }, Segment::Index(_))
        | (
            Schema::Array { .. } | Schema::Tuple { .. },
            Segment::Field(_) | Segment::Placeholder(_),
        ) => None,
        _ => Some(Schema::Undefined),
    }
}
