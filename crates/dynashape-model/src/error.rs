//! Error classification for shape validation failures.
//!
//! Every engine error is a client-side validation failure raised before any
//! request is sent. The store reports the equivalent conditions as a
//! `ValidationException`, so [`ErrorKind::error_type`] maps there.

use std::fmt;

/// Category of a shape validation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Malformed brackets, parentheses or separators.
    StructuralParse,
    /// A placeholder is used without a declaration, or declared but unused.
    UnresolvedPlaceholder,
    /// An update clause targets a field of the wrong kind.
    InvalidTarget,
    /// A SET value does not match the schema at its target path.
    ShapeMismatch,
    /// A key or filter condition matches no schema variant.
    NoMatchingKey,
    /// A table definition or request parameter is unusable.
    InvalidRequest,
}

impl ErrorKind {
    /// Returns the short error code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StructuralParse => "StructuralParseError",
            Self::UnresolvedPlaceholder => "UnresolvedPlaceholderError",
            Self::InvalidTarget => "InvalidTargetError",
            Self::ShapeMismatch => "ShapeMismatchError",
            Self::NoMatchingKey => "NoMatchingKeyError",
            Self::InvalidRequest => "InvalidRequestError",
        }
    }

    /// Returns the fully-qualified type of the store error the same request
    /// would be rejected with.
    #[must_use]
    pub fn error_type(&self) -> &'static str {
        "com.amazon.coral.validate#ValidationException"
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
