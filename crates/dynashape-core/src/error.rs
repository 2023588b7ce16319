//! Core error type for shape analysis.

use dynashape_model::{ErrorKind, Schema};

/// Errors produced while parsing expressions or checking them against a schema.
///
/// Every variant is a validation failure: the caller must not issue the
/// operation. Nothing here is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    /// An unexpected token was encountered.
    #[error("Invalid expression: expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected.
        expected: String,
        /// What was found.
        found: String,
    },
    /// Brackets, parentheses or separators do not balance.
    #[error("Invalid expression: {message}")]
    Structural {
        /// Explanation.
        message: String,
    },
    /// A placeholder is referenced but not declared in its map.
    #[error(
        "An expression attribute {placeholder} used in the expression is not defined: {}",
        tokens.join(", ")
    )]
    UndeclaredPlaceholder {
        /// Which map is missing the tokens.
        placeholder: PlaceholderKind,
        /// The undeclared tokens, sorted.
        tokens: Vec<String>,
    },
    /// A placeholder is declared in its map but never referenced.
    #[error(
        "Value provided in {} unused in expressions: keys: {{{}}}",
        placeholder.map_name(),
        tokens.join(", ")
    )]
    UnusedPlaceholder {
        /// Which map holds the unused tokens.
        placeholder: PlaceholderKind,
        /// The unused tokens, sorted.
        tokens: Vec<String>,
    },
    /// An update clause targets a path it cannot operate on.
    #[error("Invalid {clause} target {path}: {reason}")]
    InvalidTarget {
        /// Clause keyword (`REMOVE`, `ADD`, `DELETE`).
        clause: &'static str,
        /// The offending document path.
        path: String,
        /// Explanation.
        reason: String,
    },
    /// An update value does not fit the schema at its target.
    #[error("{clause} value for {path} does not match the schema: expected {expected}, found {found}")]
    ShapeMismatch {
        /// Clause keyword (`SET`, `ADD`, `DELETE`).
        clause: &'static str,
        /// The target document path.
        path: String,
        /// Schema at the target path.
        expected: Schema,
        /// Schema of the evaluated value.
        found: Schema,
    },
    /// A key or filter condition admits no schema variant.
    #[error("No possible result: {message}")]
    NoMatchingKey {
        /// Explanation.
        message: String,
    },
    /// A table definition or request parameter is unusable.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Explanation.
        message: String,
    },
}

/// The two placeholder maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKind {
    /// `#name` tokens.
    Name,
    /// `:value` tokens.
    Value,
}

impl PlaceholderKind {
    /// The store's request field holding this map.
    #[must_use]
    pub fn map_name(self) -> &'static str {
        match self {
            Self::Name => "ExpressionAttributeNames",
            Self::Value => "ExpressionAttributeValues",
        }
    }
}

impl std::fmt::Display for PlaceholderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Name => f.write_str("name"),
            Self::Value => f.write_str("value"),
        }
    }
}

impl ShapeError {
    /// Shorthand for [`ShapeError::Structural`].
    #[must_use]
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    /// Shorthand for [`ShapeError::NoMatchingKey`].
    #[must_use]
    pub fn no_matching_key(message: impl Into<String>) -> Self {
        Self::NoMatchingKey {
            message: message.into(),
        }
    }

    /// Shorthand for [`ShapeError::InvalidRequest`].
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnexpectedToken { .. } | Self::Structural { .. } => ErrorKind::StructuralParse,
            Self::UndeclaredPlaceholder { .. } | Self::UnusedPlaceholder { .. } => {
                ErrorKind::UnresolvedPlaceholder
            }
            Self::InvalidTarget { .. } => ErrorKind::InvalidTarget,
            Self::ShapeMismatch { .. } => ErrorKind::ShapeMismatch,
            Self::NoMatchingKey { .. } => ErrorKind::NoMatchingKey,
            Self::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }

    /// The message the store's `ValidationException` would carry, prefixed
    /// with the error code.
    #[must_use]
    pub fn to_validation_message(&self) -> String {
        format!("{}: {self}", self.kind())
    }
}
