//! Update expression checking and return-value shapes.
//!
//! Every clause item is checked against the item schema, then the touched
//! paths are merged into two projection structs: one describing the old
//! values (`UPDATED_OLD`) and one the new values (`UPDATED_NEW`). Removing a
//! list position shifts the positions after it, so such removals select the
//! containing list as collapsed instead of the removed path.

use dynashape_model::{ReturnValue, Schema};

use crate::config::EngineConfig;
use crate::error::{PlaceholderKind, ShapeError};
use crate::expression::{
    AddAction, DeleteAction, DocumentPath, NameMap, Operand, Segment, SetAction, SetValue,
    UpdateExpr, ValueMap,
};
use crate::projection::{ProjectOptions, ProjectionStruct, project, project_path};

/// Result of checking an update expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateAnalysis {
    /// Every resolved path the expression touches, deduplicated, in clause order.
    pub touched: Vec<DocumentPath>,
    /// Shape of the `UPDATED_OLD` return value.
    pub updated_old: Schema,
    /// Shape of the `UPDATED_NEW` return value.
    pub updated_new: Schema,
}

impl UpdateAnalysis {
    /// Shape of the attributes returned for `return_value`, or `None` when
    /// nothing is returned.
    #[must_use]
    pub fn return_shape(&self, schema: &Schema, return_value: ReturnValue) -> Option<Schema> {
        match return_value {
            ReturnValue::None => None,
            ReturnValue::AllOld => Some(schema.clone().or_undefined()),
            ReturnValue::UpdatedOld => Some(self.updated_old.clone()),
            ReturnValue::AllNew => Some(schema.clone()),
            ReturnValue::UpdatedNew => Some(self.updated_new.clone()),
        }
    }
}

/// What a REMOVE item deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Removal {
    Field,
    ListPosition,
}

/// Where a REMOVE path lands in one schema variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    OptionalField,
    RequiredField,
    ListPosition,
}

struct Checker<'a> {
    schema: &'a Schema,
    names: &'a NameMap,
    values: &'a ValueMap,
    options: ProjectOptions,
}

impl Checker<'_> {
    fn value(&self, token: &str) -> Result<Schema, ShapeError> {
        self.values
            .get(token)
            .cloned()
            .ok_or_else(|| ShapeError::UndeclaredPlaceholder {
                placeholder: PlaceholderKind::Value,
                tokens: vec![token.to_owned()],
            })
    }

    fn at(&self, path: &DocumentPath) -> Schema {
        project_path(self.schema, &path.segments, &self.options)
    }

    // -----------------------------------------------------------------------
    // SET
    // -----------------------------------------------------------------------

    fn check_set(&self, action: &SetAction) -> Result<DocumentPath, ShapeError> {
        let path = action.path.resolve(self.names)?;
        let expected = self.at(&path).without_undefined();
        let found = self.eval(&action.value, &path, &expected)?;
        if expected.is_never() || !found.structurally_eq(&expected) {
            return Err(ShapeError::ShapeMismatch {
                clause: "SET",
                path: path.to_string(),
                expected: if expected.is_never() {
                    Schema::Undefined
                } else {
                    expected
                },
                found,
            });
        }
        Ok(path)
    }

    fn eval(
        &self,
        value: &SetValue,
        target: &DocumentPath,
        expected: &Schema,
    ) -> Result<Schema, ShapeError> {
        let mismatch = |expected: Schema, found: Schema| ShapeError::ShapeMismatch {
            clause: "SET",
            path: target.to_string(),
            expected,
            found,
        };

        match value {
            SetValue::Operand(Operand::Value(token)) => self.value(token),
            SetValue::Operand(Operand::Path(path)) => Ok(self.at(&path.resolve(self.names)?)),
            SetValue::Operand(Operand::Size(_)) => Ok(Schema::Number),
            SetValue::Arithmetic { left, right, .. } => {
                for term in [left, right] {
                    let schema = self.eval(term, target, expected)?;
                    if !schema.is_numeric() {
                        return Err(mismatch(Schema::Number, schema));
                    }
                }
                Ok(Schema::Number)
            }
            SetValue::IfNotExists(path, fallback) => {
                let existing = self.at(&path.resolve(self.names)?).without_undefined();
                let fallback = self.eval(fallback, target, expected)?;
                Ok(Schema::union([existing, fallback]))
            }
            SetValue::ListAppend(first, second) => {
                let first = self.eval(first, target, expected)?;
                let second = self.eval(second, target, expected)?;
                for list in [&first, &second] {
                    if !list.is_list() {
                        return Err(mismatch(expected.clone(), list.clone()));
                    }
                }
                Ok(append(&first, &second))
            }
        }
    }

    // -----------------------------------------------------------------------
    // REMOVE
    // -----------------------------------------------------------------------

    fn check_remove(&self, path: &DocumentPath) -> Result<(DocumentPath, Removal), ShapeError> {
        let path = path.resolve(self.names)?;
        let mut slots = Vec::new();
        removal_slots(self.schema, &path.segments, &mut slots);

        let invalid = |reason: &str| ShapeError::InvalidTarget {
            clause: "REMOVE",
            path: path.to_string(),
            reason: reason.to_owned(),
        };
        if slots.is_empty() {
            return Err(invalid("path is not declared by the schema"));
        }
        if slots.contains(&Slot::RequiredField) {
            return Err(invalid("field is required by the schema"));
        }
        let removal = if slots.contains(&Slot::ListPosition) {
            Removal::ListPosition
        } else {
            Removal::Field
        };
        Ok((path, removal))
    }

    // -----------------------------------------------------------------------
    // ADD / DELETE
    // -----------------------------------------------------------------------

    fn check_add(&self, action: &AddAction) -> Result<DocumentPath, ShapeError> {
        let path = action.path.resolve(self.names)?;
        let target = self.at(&path).without_undefined();
        let value = self.value(&action.value)?;

        let expected = if target.is_numeric() {
            if value.is_numeric() {
                return Ok(path);
            }
            Schema::Number
        } else if let Some(kind) = target.set_kind() {
            if value.set_kind() == Some(kind) {
                return Ok(path);
            }
            Schema::set(kind)
        } else {
            return Err(ShapeError::InvalidTarget {
                clause: "ADD",
                path: path.to_string(),
                reason: format!("requires a number or set field, found {target}"),
            });
        };
        Err(ShapeError::ShapeMismatch {
            clause: "ADD",
            path: path.to_string(),
            expected,
            found: value,
        })
    }

    fn check_delete(&self, action: &DeleteAction) -> Result<DocumentPath, ShapeError> {
        let path = action.path.resolve(self.names)?;
        let target = self.at(&path).without_undefined();
        let value = self.value(&action.value)?;

        let Some(kind) = target.set_kind() else {
            return Err(ShapeError::InvalidTarget {
                clause: "DELETE",
                path: path.to_string(),
                reason: format!("requires a set field, found {target}"),
            });
        };
        if value.set_kind() != Some(kind) {
            return Err(ShapeError::ShapeMismatch {
                clause: "DELETE",
                path: path.to_string(),
                expected: Schema::set(kind),
                found: value,
            });
        }
        Ok(path)
    }
}

/// `list_append` result: a tuple when both sides are fixed tuples, a
/// homogeneous array otherwise.
fn append(first: &Schema, second: &Schema) -> Schema {
    if let (
        Schema::Tuple {
            elements: a,
            rest: None,
        },
        Schema::Tuple {
            elements: b,
            rest: None,
        },
    ) = (first, second)
    {
        return Schema::tuple(a.iter().chain(b).cloned().collect());
    }

    let elements = [first, second]
        .into_iter()
        .flat_map(Schema::members)
        .flat_map(|member| match member {
            Schema::Array { element } => vec![element.as_ref().clone()],
            Schema::Tuple { elements, rest } => elements
                .iter()
                .cloned()
                .chain(rest.iter().map(|r| r.as_ref().clone()))
                .collect(),
            _ => Vec::new(),
        });
    Schema::array(Schema::union(elements))
}

fn removal_slots(schema: &Schema, segments: &[Segment], out: &mut Vec<Slot>) {
    let Some((first, rest)) = segments.split_first() else {
        return;
    };
    for member in schema.members() {
        match (member, first) {
            (Schema::Object { fields }, Segment::Field(name) | Segment::Placeholder(name)) => {
                let Some(field) = fields.iter().find(|f| f.name == *name) else {
                    continue;
                };
                if rest.is_empty() {
                    out.push(if field.optional {
                        Slot::OptionalField
                    } else {
                        Slot::RequiredField
                    });
                } else {
                    removal_slots(&field.schema, rest, out);
                }
            }
            (Schema::Record { value, .. }, Segment::Field(_) | Segment::Placeholder(_)) => {
                if rest.is_empty() {
                    out.push(Slot::OptionalField);
                } else {
                    removal_slots(value, rest, out);
                }
            }
            (Schema::Array { element }, Segment::Index(_)) => {
                if rest.is_empty() {
                    out.push(Slot::ListPosition);
                } else {
                    removal_slots(element, rest, out);
                }
            }
            (Schema::Tuple { elements, rest: tail }, Segment::Index(idx)) => {
                if rest.is_empty() {
                    out.push(Slot::ListPosition);
                } else if let Some(element) = elements.get(*idx) {
                    removal_slots(element, rest, out);
                } else if let Some(tail) = tail {
                    removal_slots(tail, rest, out);
                }
            }
            _ => {}
        }
    }
}

fn push_unique(paths: &mut Vec<DocumentPath>, path: &DocumentPath) {
    if !paths.contains(path) {
        paths.push(path.clone());
    }
}

/// Check an update expression against an item schema and compute the
/// shapes of its partial return values.
///
/// # Errors
///
/// Returns [`ShapeError::UndeclaredPlaceholder`] for unknown placeholders,
/// [`ShapeError::ShapeMismatch`] when a value does not fit its target, and
/// [`ShapeError::InvalidTarget`] when a clause cannot operate on its target.
pub fn analyze_update(
    schema: &Schema,
    update: &UpdateExpr,
    names: &NameMap,
    values: &ValueMap,
    config: &EngineConfig,
) -> Result<UpdateAnalysis, ShapeError> {
    let checker = Checker {
        schema,
        names,
        values,
        options: config.project_options(false),
    };

    let mut touched = Vec::new();
    let mut old = ProjectionStruct::default();
    let mut new = ProjectionStruct::default();

    for action in &update.set_actions {
        let path = checker.check_set(action)?;
        old.insert(&path.segments);
        new.insert(&path.segments);
        push_unique(&mut touched, &path);
    }
    for path in &update.remove_paths {
        let (path, removal) = checker.check_remove(path)?;
        match (removal, path.parent()) {
            (Removal::ListPosition, Some(list)) => {
                old.insert_collapsed(&list.segments);
                new.insert_collapsed(&list.segments);
            }
            _ => old.insert(&path.segments),
        }
        push_unique(&mut touched, &path);
    }
    for action in &update.add_actions {
        let path = checker.check_add(action)?;
        old.insert(&path.segments);
        new.insert(&path.segments);
        push_unique(&mut touched, &path);
    }
    for action in &update.delete_actions {
        let path = checker.check_delete(action)?;
        old.insert(&path.segments);
        new.insert(&path.segments);
        push_unique(&mut touched, &path);
    }

    let updated_old = if old.is_empty() {
        Schema::Undefined
    } else {
        project(schema, &old, &config.project_options(false)).or_undefined()
    };
    let updated_new = if new.is_empty() {
        Schema::Undefined
    } else {
        project(schema, &new, &config.project_options(true))
    };

    tracing::debug!(
        touched = touched.len(),
        set = update.set_actions.len(),
        remove = update.remove_paths.len(),
        add = update.add_actions.len(),
        delete = update.delete_actions.len(),
        "analyzed update expression"
    );

    Ok(UpdateAnalysis {
        touched,
        updated_old,
        updated_new,
    })
}
