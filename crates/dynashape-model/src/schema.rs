//! Structural schema describing the shape of an item or value.
//!
//! A [`Schema`] is a tree. Leaves are primitives (including literal and
//! template-literal string patterns) and opaque sets; interior nodes are
//! tuples, arrays, records, objects and unions. [`Schema::Undefined`] marks
//! absence and only appears in computed results (e.g. `number | undefined`).
//!
//! The JSON form is internally tagged by `type`:
//!
//! ```text
//! {"type": "object", "fields": [{"name": "pk", "schema": {"type": "string"}}]}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Structural description of a value's shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Schema {
    /// Any string.
    String,
    /// Any number.
    Number,
    /// Any binary blob.
    Binary,
    /// `true` or `false`.
    Boolean,
    /// The store's NULL value.
    Null,
    /// A single string value.
    StringLiteral {
        /// The exact string.
        value: String,
    },
    /// A single number value, string-encoded like the store's numbers.
    NumberLiteral {
        /// The exact number text.
        value: String,
    },
    /// A single boolean value.
    BooleanLiteral {
        /// The exact boolean.
        value: bool,
    },
    /// A template-literal string pattern such as `USER#${string}`.
    Template {
        /// Pattern parts in order.
        parts: Vec<TemplatePart>,
    },
    /// An opaque set of scalars.
    Set {
        /// The element type tag.
        element: SetKind,
    },
    /// A fixed ordered list, optionally followed by a homogeneous rest.
    Tuple {
        /// Fixed positions.
        elements: Vec<Schema>,
        /// Trailing rest element type, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rest: Option<Box<Schema>>,
    },
    /// A homogeneous list.
    Array {
        /// Element type.
        element: Box<Schema>,
    },
    /// A homogeneous map keyed by strings or numbers.
    Record {
        /// Key kind.
        key: RecordKey,
        /// Value type.
        value: Box<Schema>,
    },
    /// A map with declared fields.
    Object {
        /// Fields in declaration order.
        fields: Vec<Field>,
    },
    /// An undiscriminated union. An empty union has no possible value.
    Union {
        /// Union members.
        variants: Vec<Schema>,
    },
    /// Absence of a value.
    Undefined,
}

/// One part of a [`Schema::Template`] pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplatePart {
    /// Literal characters.
    Literal(String),
    /// `${string}`: any run of characters.
    String,
    /// `${number}`: a number's textual form.
    Number,
}

/// Element type tag of a [`Schema::Set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetKind {
    /// String set (`SS`).
    String,
    /// Number set (`NS`).
    Number,
    /// Binary set (`BS`).
    Binary,
}

impl SetKind {
    /// Returns the element type name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Binary => "binary",
        }
    }
}

/// Key kind of a [`Schema::Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKey {
    /// String-keyed.
    String,
    /// Number-keyed.
    Number,
}

/// A declared field of a [`Schema::Object`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Field value type.
    pub schema: Schema,
    /// Whether the field may be absent.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,
}

impl Field {
    /// A required field.
    #[must_use]
    pub fn required(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            optional: false,
        }
    }

    /// An optional field.
    #[must_use]
    pub fn optional(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            optional: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

impl Schema {
    /// `"value"`.
    #[must_use]
    pub fn string_literal(value: impl Into<String>) -> Self {
        Self::StringLiteral {
            value: value.into(),
        }
    }

    /// A number literal.
    #[must_use]
    pub fn number_literal(value: impl Into<String>) -> Self {
        Self::NumberLiteral {
            value: value.into(),
        }
    }

    /// `T[]`.
    #[must_use]
    pub fn array(element: Schema) -> Self {
        Self::Array {
            element: Box::new(element),
        }
    }

    /// `[A, B]`.
    #[must_use]
    pub fn tuple(elements: Vec<Schema>) -> Self {
        Self::Tuple {
            elements,
            rest: None,
        }
    }

    /// `[A, B, ...R[]]`.
    #[must_use]
    pub fn rest_tuple(elements: Vec<Schema>, rest: Schema) -> Self {
        Self::Tuple {
            elements,
            rest: Some(Box::new(rest)),
        }
    }

    /// `Record<K, V>`.
    #[must_use]
    pub fn record(key: RecordKey, value: Schema) -> Self {
        Self::Record {
            key,
            value: Box::new(value),
        }
    }

    /// An object from its fields.
    #[must_use]
    pub fn object(fields: Vec<Field>) -> Self {
        Self::Object { fields }
    }

    /// `Set<kind>`.
    #[must_use]
    pub fn set(element: SetKind) -> Self {
        Self::Set { element }
    }

    /// A template pattern.
    #[must_use]
    pub fn template(parts: Vec<TemplatePart>) -> Self {
        Self::Template { parts }
    }

    /// The empty union, which no value inhabits.
    #[must_use]
    pub fn never() -> Self {
        Self::Union {
            variants: Vec::new(),
        }
    }

    /// Build a union from members.
    ///
    /// Nested unions are flattened, duplicates (by structural equality) are
    /// dropped keeping first occurrence, literals are absorbed by their base
    /// type (`number | 0` is `number`), and a single member is returned
    /// unwrapped.
    #[must_use]
    pub fn union(members: impl IntoIterator<Item = Schema>) -> Self {
        let mut variants: Vec<Schema> = Vec::new();
        let mut seen: Vec<Schema> = Vec::new();
        for member in members {
            for flat in member.into_members() {
                let normalized = flat.normalized();
                if !seen.contains(&normalized) {
                    seen.push(normalized);
                    variants.push(flat);
                }
            }
        }
        let mut variants = absorb_literals(variants);
        if variants.len() == 1 {
            variants.pop().unwrap_or_else(Self::never)
        } else {
            Self::Union { variants }
        }
    }

    /// `self | undefined`.
    #[must_use]
    pub fn or_undefined(self) -> Self {
        Self::union([self, Self::Undefined])
    }
}

/// Drop literal members covered by a base type in the same union. Both
/// boolean literals together become `boolean`.
fn absorb_literals(variants: Vec<Schema>) -> Vec<Schema> {
    let has_string = variants.contains(&Schema::String);
    let has_number = variants.contains(&Schema::Number);
    let has_boolean = variants.contains(&Schema::Boolean);
    let both_booleans = variants.contains(&Schema::BooleanLiteral { value: true })
        && variants.contains(&Schema::BooleanLiteral { value: false });

    let mut boolean_placed = has_boolean;
    let mut out = Vec::with_capacity(variants.len());
    for variant in variants {
        match variant {
            Schema::StringLiteral { .. } | Schema::Template { .. } if has_string => {}
            Schema::NumberLiteral { .. } if has_number => {}
            Schema::BooleanLiteral { .. } if has_boolean => {}
            Schema::BooleanLiteral { .. } if both_booleans => {
                if !boolean_placed {
                    boolean_placed = true;
                    out.push(Schema::Boolean);
                }
            }
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl Schema {
    /// Flatten this schema into its union members (a non-union is its own
    /// single member; the empty union has none).
    #[must_use]
    pub fn into_members(self) -> Vec<Schema> {
        match self {
            Self::Union { variants } => variants.into_iter().flat_map(Self::into_members).collect(),
            other => vec![other],
        }
    }

    /// Borrowing variant of [`Schema::into_members`].
    #[must_use]
    pub fn members(&self) -> Vec<&Schema> {
        match self {
            Self::Union { variants } => variants.iter().flat_map(Self::members).collect(),
            other => vec![other],
        }
    }

    /// Returns `true` if no value inhabits this schema.
    #[must_use]
    pub fn is_never(&self) -> bool {
        self.members().is_empty()
    }

    /// Returns `true` if the value can be absent.
    #[must_use]
    pub fn is_possibly_undefined(&self) -> bool {
        self.members().iter().any(|m| matches!(m, Self::Undefined))
    }

    /// Returns `true` if the value is always absent.
    #[must_use]
    pub fn is_undefined(&self) -> bool {
        let members = self.members();
        !members.is_empty() && members.iter().all(|m| matches!(m, Self::Undefined))
    }

    /// This schema with `undefined` removed from its members.
    #[must_use]
    pub fn without_undefined(&self) -> Schema {
        Self::union(
            self.members()
                .into_iter()
                .filter(|m| !matches!(m, Self::Undefined))
                .cloned(),
        )
    }

    /// Returns `true` if every member is a number or number literal.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        let members = self.members();
        !members.is_empty()
            && members
                .iter()
                .all(|m| matches!(m, Self::Number | Self::NumberLiteral { .. }))
    }

    /// Returns `true` if every member is a string, string literal or template.
    #[must_use]
    pub fn is_stringish(&self) -> bool {
        let members = self.members();
        !members.is_empty()
            && members.iter().all(|m| {
                matches!(
                    m,
                    Self::String | Self::StringLiteral { .. } | Self::Template { .. }
                )
            })
    }

    /// Returns the common set element kind if every member is a set of it.
    #[must_use]
    pub fn set_kind(&self) -> Option<SetKind> {
        let members = self.members();
        let mut kind = None;
        for member in members {
            let Self::Set { element } = member else {
                return None;
            };
            match kind {
                None => kind = Some(*element),
                Some(k) if k == *element => {}
                Some(_) => return None,
            }
        }
        kind
    }

    /// Returns `true` if every member is an array or tuple.
    #[must_use]
    pub fn is_list(&self) -> bool {
        let members = self.members();
        !members.is_empty()
            && members
                .iter()
                .all(|m| matches!(m, Self::Array { .. } | Self::Tuple { .. }))
    }

    /// Look up a declared object field.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        match self {
            Self::Object { fields } => fields.iter().find(|f| f.name == name),
            _ => None,
        }
    }

    /// A canonical form used for structural comparison: unions flattened,
    /// deduplicated and sorted, object fields sorted by name.
    #[must_use]
    pub fn normalized(&self) -> Schema {
        match self {
            Self::Union { .. } => {
                let mut variants: Vec<Schema> =
                    self.members().into_iter().map(Self::normalized).collect();
                variants.sort();
                variants.dedup();
                let mut variants = absorb_literals(variants);
                variants.sort();
                if variants.len() == 1 {
                    variants.pop().unwrap_or_else(Self::never)
                } else {
                    Self::Union { variants }
                }
            }
            Self::Object { fields } => {
                let mut fields: Vec<Field> = fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.clone(),
                        schema: f.schema.normalized(),
                        optional: f.optional,
                    })
                    .collect();
                fields.sort_by(|a, b| a.name.cmp(&b.name));
                Self::Object { fields }
            }
            Self::Tuple { elements, rest } => Self::Tuple {
                elements: elements.iter().map(Self::normalized).collect(),
                rest: rest.as_ref().map(|r| Box::new(r.normalized())),
            },
            Self::Array { element } => Self::array(element.normalized()),
            Self::Record { key, value } => Self::record(*key, value.normalized()),
            other => other.clone(),
        }
    }

    /// Structural equality: equal after normalization.
    #[must_use]
    pub fn structurally_eq(&self, other: &Schema) -> bool {
        self.normalized() == other.normalized()
    }
}

// ---------------------------------------------------------------------------
// Display (TypeScript-like notation)
// ---------------------------------------------------------------------------

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Number => f.write_str("number"),
            Self::Binary => f.write_str("binary"),
            Self::Boolean => f.write_str("boolean"),
            Self::Null => f.write_str("null"),
            Self::StringLiteral { value } => write!(f, "{value:?}"),
            Self::NumberLiteral { value } => f.write_str(value),
            Self::BooleanLiteral { value } => write!(f, "{value}"),
            Self::Template { parts } => {
                f.write_str("`")?;
                for part in parts {
                    match part {
                        TemplatePart::Literal(s) => f.write_str(s)?,
                        TemplatePart::String => f.write_str("${string}")?,
                        TemplatePart::Number => f.write_str("${number}")?,
                    }
                }
                f.write_str("`")
            }
            Self::Set { element } => write!(f, "Set<{}>", element.as_str()),
            Self::Tuple { elements, rest } => {
                f.write_str("[")?;
                for (i, e) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{e}")?;
                }
                if let Some(rest) = rest {
                    if !elements.is_empty() {
                        f.write_str(", ")?;
                    }
                    write!(f, "...{}", ArrayElement(rest))?;
                    f.write_str("[]")?;
                }
                f.write_str("]")
            }
            Self::Array { element } => write!(f, "{}[]", ArrayElement(element)),
            Self::Record { key, value } => {
                let key = match key {
                    RecordKey::String => "string",
                    RecordKey::Number => "number",
                };
                write!(f, "Record<{key}, {value}>")
            }
            Self::Object { fields } => {
                if fields.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    let mark = if field.optional { "?" } else { "" };
                    write!(f, "{}{mark}: {}", field.name, field.schema)?;
                }
                f.write_str(" }")
            }
            Self::Union { variants } => {
                if variants.is_empty() {
                    return f.write_str("never");
                }
                for (i, v) in variants.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{v}")?;
                }
                Ok(())
            }
            Self::Undefined => f.write_str("undefined"),
        }
    }
}

/// Parenthesizes unions in array element position.
struct ArrayElement<'a>(&'a Schema);

impl fmt::Display for ArrayElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Schema::Union { variants } if variants.len() > 1 => write!(f, "({})", self.0),
            other => write!(f, "{other}"),
        }
    }
}
