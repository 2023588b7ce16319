//! Key condition extraction and schema-variant narrowing.
//!
//! A key condition is split into its top-level `AND` conjuncts, each of which
//! must constrain one top-level key attribute. The constraints then select
//! the item schema variants whose key fields could hold matching values.
//! Filter expressions narrow the same way, but only from the conjuncts that
//! are equality tests or `begins_with` calls; anything else is ignored.

use std::collections::BTreeMap;

use dynashape_model::{Field, IndexDefinition, KeyDefinition, ProjectionType, Schema};

use crate::error::{PlaceholderKind, ShapeError};
use crate::expression::{
    CompareOp, DocumentPath, Expr, FunctionName, LogicalOp, NameMap, Operand, Token, ValueMap,
    parse_condition_tokens, split_conditions, tokenize,
};

pub mod pattern;

pub use pattern::{can_begin_with, is_assignable, template_matches};

/// A constraint on one key attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyConstraint {
    /// `field = :v`
    Equals(Schema),
    /// `begins_with(field, :v)`
    BeginsWith(Schema),
    /// `field BETWEEN :lo AND :hi`
    Between(Schema, Schema),
    /// `field < :v` and friends, operator normalized to put the field first.
    Compare(CompareOp, Schema),
}

/// Per-field constraints parsed from a key condition expression.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyCondition {
    /// Constraints keyed by resolved field name.
    pub constraints: BTreeMap<String, KeyConstraint>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn lookup(values: &ValueMap, token: &str) -> Result<Schema, ShapeError> {
    values
        .get(token)
        .cloned()
        .ok_or_else(|| ShapeError::UndeclaredPlaceholder {
            placeholder: PlaceholderKind::Value,
            tokens: vec![token.to_owned()],
        })
}

fn top_level(path: &DocumentPath, names: &NameMap) -> Result<Option<String>, ShapeError> {
    Ok(path.resolve(names)?.as_top_level().map(ToOwned::to_owned))
}

/// Read one conjunct as a field constraint. `Ok(None)` means the conjunct is
/// not a simple constraint on a top-level attribute.
fn constraint(
    expr: &Expr,
    names: &NameMap,
    values: &ValueMap,
) -> Result<Option<(String, KeyConstraint)>, ShapeError> {
    let (path, built) = match expr {
        Expr::Compare { left, op, right } => {
            let (path, op, token) = match (left.as_ref(), right.as_ref()) {
                (Operand::Path(p), Operand::Value(v)) => (p, *op, v),
                (Operand::Value(v), Operand::Path(p)) => (p, op.flipped(), v),
                _ => return Ok(None),
            };
            let value = lookup(values, token)?;
            let built = match op {
                CompareOp::Eq => KeyConstraint::Equals(value),
                CompareOp::Ne => return Ok(None),
                other => KeyConstraint::Compare(other, value),
            };
            (path, built)
        }
        Expr::Between { value, low, high } => match (value.as_ref(), low.as_ref(), high.as_ref()) {
            (Operand::Path(p), Operand::Value(lo), Operand::Value(hi)) => (
                p,
                KeyConstraint::Between(lookup(values, lo)?, lookup(values, hi)?),
            ),
            _ => return Ok(None),
        },
        Expr::Function {
            name: FunctionName::BeginsWith,
            args,
        } => match args.as_slice() {
            [Operand::Path(p), Operand::Value(v)] => {
                (p, KeyConstraint::BeginsWith(lookup(values, v)?))
            }
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };
    Ok(top_level(path, names)?.map(|field| (field, built)))
}

/// Parse a tokenized key condition into per-field constraints.
///
/// # Errors
///
/// Returns a structural error for conjuncts that are not `=`, `<`, `<=`,
/// `>`, `>=`, `BETWEEN` or `begins_with` on a top-level attribute, and for
/// fields constrained twice.
pub fn extract_key_tokens(
    tokens: &[Token],
    names: &NameMap,
    values: &ValueMap,
) -> Result<KeyCondition, ShapeError> {
    let mut key = KeyCondition::default();
    for part in split_conditions(tokens)? {
        let expr = parse_condition_tokens(&part)?;
        let Some((field, built)) = constraint(&expr, names, values)? else {
            return Err(ShapeError::structural(
                "key conditions support only =, <, <=, >, >=, BETWEEN and begins_with \
                 on top-level key attributes",
            ));
        };
        if key.constraints.contains_key(&field) {
            return Err(ShapeError::structural(format!(
                "key attribute {field} is constrained more than once"
            )));
        }
        key.constraints.insert(field, built);
    }
    Ok(key)
}

/// Parse a key condition expression into per-field constraints.
///
/// # Errors
///
/// See [`extract_key_tokens`].
pub fn extract_key(
    expr: &str,
    names: &NameMap,
    values: &ValueMap,
) -> Result<KeyCondition, ShapeError> {
    extract_key_tokens(&tokenize(expr)?, names, values)
}

// ---------------------------------------------------------------------------
// Narrowing
// ---------------------------------------------------------------------------

/// Returns `true` if every member of `bound` could be compared with some
/// member of `field`. String literal bounds must be a possible prefix.
fn bound_matches(field: &Schema, bound: &Schema) -> bool {
    let field_members = field.members();
    bound.members().iter().all(|b| match b {
        Schema::StringLiteral { value } => can_begin_with(field, value),
        Schema::String | Schema::Template { .. } => field_members.iter().any(|m| m.is_stringish()),
        Schema::Number | Schema::NumberLiteral { .. } => {
            field_members.iter().any(|m| m.is_numeric())
        }
        Schema::Binary => field_members.iter().any(|m| matches!(m, Schema::Binary)),
        _ => false,
    })
}

fn satisfies(field: &Schema, constraint: &KeyConstraint) -> bool {
    match constraint {
        KeyConstraint::Equals(value) => is_assignable(value, field),
        KeyConstraint::BeginsWith(bound) | KeyConstraint::Compare(_, bound) => {
            bound_matches(field, bound)
        }
        KeyConstraint::Between(low, high) => bound_matches(field, low) && bound_matches(field, high),
    }
}

/// Keep the object variants declaring every constrained field with a
/// compatible schema. Constrained fields become required in the result.
fn keep_matching<'a>(
    schema: &Schema,
    constraints: impl Iterator<Item = (&'a str, &'a KeyConstraint)> + Clone,
) -> Vec<Schema> {
    schema
        .members()
        .into_iter()
        .filter_map(|member| {
            let Schema::Object { fields } = member else {
                return None;
            };
            let mut fields = fields.clone();
            for (name, constraint) in constraints.clone() {
                let field = fields.iter_mut().find(|f| f.name == name)?;
                if !satisfies(&field.schema, constraint) {
                    return None;
                }
                field.optional = false;
            }
            Some(Schema::object(fields))
        })
        .collect()
}

/// Narrow an item schema to the variants a key condition can return.
///
/// # Errors
///
/// Returns [`ShapeError::NoMatchingKey`] when a constrained field is not part
/// of `key_def`, when the partition key is not tested with `=`, or when no
/// variant matches.
pub fn narrow(
    schema: &Schema,
    key: &KeyCondition,
    key_def: &KeyDefinition,
) -> Result<Schema, ShapeError> {
    if let Some(field) = key.constraints.keys().find(|f| !key_def.contains(f)) {
        return Err(ShapeError::no_matching_key(format!(
            "{field} is not a key attribute"
        )));
    }
    if !matches!(
        key.constraints.get(&key_def.partition_key),
        Some(KeyConstraint::Equals(_))
    ) {
        return Err(ShapeError::no_matching_key(format!(
            "key condition must test partition key {} with =",
            key_def.partition_key
        )));
    }

    let kept = keep_matching(
        schema,
        key.constraints.iter().map(|(f, c)| (f.as_str(), c)),
    );
    tracing::debug!(
        constraints = key.constraints.len(),
        variants = schema.members().len(),
        kept = kept.len(),
        "narrowed schema by key condition"
    );
    if kept.is_empty() {
        return Err(ShapeError::no_matching_key(
            "no schema variant matches the key condition",
        ));
    }
    Ok(Schema::union(kept))
}

/// Keep only the variants that declare the index partition key; items
/// without it are absent from a sparse index.
#[must_use]
pub fn narrow_to_index(schema: &Schema, index_key: &KeyDefinition) -> Schema {
    Schema::union(schema.members().into_iter().filter_map(|member| {
        let Schema::Object { fields } = member else {
            return None;
        };
        let mut fields = fields.clone();
        for name in index_key.fields() {
            fields.iter_mut().find(|f| f.name == name)?.optional = false;
        }
        Some(Schema::object(fields))
    }))
}

/// Restrict each variant to the attributes an index projects.
#[must_use]
pub fn apply_index_projection(
    schema: &Schema,
    table_key: &KeyDefinition,
    index: &IndexDefinition,
) -> Schema {
    let projection = &index.projection;
    if projection.projection_type == ProjectionType::All {
        return schema.clone();
    }
    let index_key = KeyDefinition::from_key_schema(&index.key_schema);
    let keeps = |name: &str| {
        table_key.contains(name)
            || index_key.as_ref().is_some_and(|k| k.contains(name))
            || (projection.projection_type == ProjectionType::Include
                && projection.non_key_attributes.iter().any(|a| a == name))
    };
    Schema::union(schema.members().into_iter().map(|member| match member {
        Schema::Object { fields } => Schema::object(
            fields
                .iter()
                .filter(|f| keeps(&f.name))
                .cloned()
                .collect::<Vec<Field>>(),
        ),
        other => other.clone(),
    }))
}

fn collect_conjuncts<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
    match expr {
        Expr::Logical {
            op: LogicalOp::And,
            left,
            right,
        } => {
            collect_conjuncts(left, out);
            collect_conjuncts(right, out);
        }
        other => out.push(other),
    }
}

/// Narrow by the equality and `begins_with` conjuncts of a tokenized filter
/// expression.
///
/// # Errors
///
/// Returns a structural error for malformed filters and
/// [`ShapeError::NoMatchingKey`] when the filter rules out every variant.
pub fn narrow_by_filter(
    schema: &Schema,
    tokens: &[Token],
    names: &NameMap,
    values: &ValueMap,
) -> Result<Schema, ShapeError> {
    let filter = parse_condition_tokens(tokens)?;
    let mut conjuncts = Vec::new();
    collect_conjuncts(&filter, &mut conjuncts);
    let mut constraints = Vec::new();
    for expr in conjuncts {
        if let Some((field, built)) = constraint(expr, names, values)? {
            if matches!(
                built,
                KeyConstraint::Equals(_) | KeyConstraint::BeginsWith(_)
            ) {
                constraints.push((field, built));
            }
        }
    }
    if constraints.is_empty() {
        return Ok(schema.clone());
    }

    let kept = keep_matching(schema, constraints.iter().map(|(f, c)| (f.as_str(), c)));
    tracing::debug!(
        constraints = constraints.len(),
        kept = kept.len(),
        "narrowed schema by filter"
    );
    if kept.is_empty() {
        return Err(ShapeError::no_matching_key(
            "no schema variant matches the filter expression",
        ));
    }
    Ok(Schema::union(kept))
}
