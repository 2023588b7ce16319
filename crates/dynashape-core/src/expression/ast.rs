//! AST types for store expressions.
//!
//! Condition, filter and key-condition expressions parse to [`Expr`]; update
//! expressions parse to [`UpdateExpr`]; projection expressions parse to a
//! list of [`DocumentPath`]s. Paths are produced with placeholders intact and
//! resolved against the name map later with [`DocumentPath::resolve`].

use std::fmt;

use crate::error::{PlaceholderKind, ShapeError};

use super::NameMap;

// ---------------------------------------------------------------------------
// Document paths
// ---------------------------------------------------------------------------

/// A document path such as `a.#b[2].c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentPath {
    /// Segments in order. Never empty for a parsed path.
    pub segments: Vec<Segment>,
}

/// One step of a [`DocumentPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// A literal field name.
    Field(String),
    /// A list index.
    Index(usize),
    /// An unresolved `#name` placeholder, prefix included.
    Placeholder(String),
}

impl DocumentPath {
    /// Build a path from segments.
    #[must_use]
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// A single top-level field.
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::new(vec![Segment::Field(name.into())])
    }

    /// Substitute every placeholder segment with its declared field name.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::UndeclaredPlaceholder`] listing the first
    /// placeholder not present in `names`.
    pub fn resolve(&self, names: &NameMap) -> Result<Self, ShapeError> {
        let segments = self
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Placeholder(token) => names
                    .get(token)
                    .map(|name| Segment::Field(name.clone()))
                    .ok_or_else(|| ShapeError::UndeclaredPlaceholder {
                        placeholder: PlaceholderKind::Name,
                        tokens: vec![token.clone()],
                    }),
                other => Ok(other.clone()),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { segments })
    }

    /// The path without its last segment, or `None` for a single-segment path.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        match self.segments.split_last() {
            Some((_, rest)) if !rest.is_empty() => Some(Self::new(rest.to_vec())),
            _ => None,
        }
    }

    /// The last segment.
    #[must_use]
    pub fn last(&self) -> Option<&Segment> {
        self.segments.last()
    }

    /// Returns the field name if this path is a single top-level field.
    #[must_use]
    pub fn as_top_level(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [Segment::Field(name)] => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) | Segment::Placeholder(name) => {
                    if i > 0 {
                        f.write_str(".")?;
                    }
                    f.write_str(name)?;
                }
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Conditions
// ---------------------------------------------------------------------------

/// Expression AST node for condition, filter, and key-condition expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Comparison expression: `left op right`.
    Compare {
        /// Left-hand operand.
        left: Box<Operand>,
        /// Comparison operator.
        op: CompareOp,
        /// Right-hand operand.
        right: Box<Operand>,
    },
    /// Between expression: `value BETWEEN low AND high`.
    Between {
        /// Value to test.
        value: Box<Operand>,
        /// Lower bound (inclusive).
        low: Box<Operand>,
        /// Upper bound (inclusive).
        high: Box<Operand>,
    },
    /// In expression: `value IN (list...)`.
    In {
        /// Value to search for.
        value: Box<Operand>,
        /// Candidate values.
        list: Vec<Operand>,
    },
    /// Logical combination: `left AND right` or `left OR right`.
    Logical {
        /// Logical operator.
        op: LogicalOp,
        /// Left-hand expression.
        left: Box<Expr>,
        /// Right-hand expression.
        right: Box<Expr>,
    },
    /// Logical negation: `NOT expr`.
    Not(Box<Expr>),
    /// Function call: `function_name(args...)`.
    Function {
        /// Function name.
        name: FunctionName,
        /// Function arguments.
        args: Vec<Operand>,
    },
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl CompareOp {
    /// The operator with its operands swapped (`a < b` is `b > a`).
    #[must_use]
    pub fn flipped(self) -> Self {
        match self {
            Self::Lt => Self::Gt,
            Self::Le => Self::Ge,
            Self::Gt => Self::Lt,
            Self::Ge => Self::Le,
            other => other,
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => f.write_str("="),
            Self::Ne => f.write_str("<>"),
            Self::Lt => f.write_str("<"),
            Self::Le => f.write_str("<="),
            Self::Gt => f.write_str(">"),
            Self::Ge => f.write_str(">="),
        }
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// Logical AND.
    And,
    /// Logical OR.
    Or,
}

/// Built-in condition function names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionName {
    /// `attribute_exists(path)`
    AttributeExists,
    /// `attribute_not_exists(path)`
    AttributeNotExists,
    /// `attribute_type(path, type)`
    AttributeType,
    /// `begins_with(path, prefix)`
    BeginsWith,
    /// `contains(path, operand)`
    Contains,
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeExists => f.write_str("attribute_exists"),
            Self::AttributeNotExists => f.write_str("attribute_not_exists"),
            Self::AttributeType => f.write_str("attribute_type"),
            Self::BeginsWith => f.write_str("begins_with"),
            Self::Contains => f.write_str("contains"),
        }
    }
}

/// An operand in a condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    /// A document path reference.
    Path(DocumentPath),
    /// A `:value` placeholder, prefix included.
    Value(String),
    /// `size(operand)`.
    Size(Box<Operand>),
}

// ---------------------------------------------------------------------------
// Updates
// ---------------------------------------------------------------------------

/// Update expression AST containing all four clause kinds.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateExpr {
    /// SET actions.
    pub set_actions: Vec<SetAction>,
    /// REMOVE paths.
    pub remove_paths: Vec<DocumentPath>,
    /// ADD actions.
    pub add_actions: Vec<AddAction>,
    /// DELETE actions.
    pub delete_actions: Vec<DeleteAction>,
}

impl UpdateExpr {
    /// Returns `true` if no clause has any item.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set_actions.is_empty()
            && self.remove_paths.is_empty()
            && self.add_actions.is_empty()
            && self.delete_actions.is_empty()
    }
}

/// `path = value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetAction {
    /// Target path.
    pub path: DocumentPath,
    /// Value to assign.
    pub value: SetValue,
}

/// Arithmetic operators allowed in SET values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    /// `+`
    Plus,
    /// `-`
    Minus,
}

/// The right-hand side of a SET action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetValue {
    /// A plain value placeholder or path.
    Operand(Operand),
    /// `left + right` or `left - right`.
    Arithmetic {
        /// Operator.
        op: ArithmeticOp,
        /// Left-hand term.
        left: Box<SetValue>,
        /// Right-hand term.
        right: Box<SetValue>,
    },
    /// `if_not_exists(path, value)`.
    IfNotExists(DocumentPath, Box<SetValue>),
    /// `list_append(left, right)`.
    ListAppend(Box<SetValue>, Box<SetValue>),
}

/// `path :value` in an ADD clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddAction {
    /// Target path.
    pub path: DocumentPath,
    /// Value placeholder, prefix included.
    pub value: String,
}

/// `path :value` in a DELETE clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAction {
    /// Target path.
    pub path: DocumentPath,
    /// Value placeholder, prefix included.
    pub value: String,
}
