//! Placeholder declaration checks across all expressions of one call.
//!
//! Usage is collected from tokens, not from parsed trees, so a placeholder
//! counts as used wherever it textually appears. Undeclared placeholders are
//! reported before unused ones; names before values.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PlaceholderKind, ShapeError};

use super::lexer::Token;
use super::{NameMap, ValueMap};

/// Placeholder tokens referenced by a set of expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsedPlaceholders {
    /// `#name` tokens.
    pub names: BTreeSet<String>,
    /// `:value` tokens.
    pub values: BTreeSet<String>,
}

impl UsedPlaceholders {
    /// Record the placeholders appearing in `tokens`.
    pub fn collect(&mut self, tokens: &[Token]) {
        for token in tokens {
            match token {
                Token::NamePlaceholder(t) => {
                    self.names.insert(t.clone());
                }
                Token::ValuePlaceholder(t) => {
                    self.values.insert(t.clone());
                }
                _ => {}
            }
        }
    }

    /// Check usage against the declared maps.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError::UndeclaredPlaceholder`] or
    /// [`ShapeError::UnusedPlaceholder`], each listing every offending token
    /// of one map in sorted order.
    pub fn validate(&self, names: &NameMap, values: &ValueMap) -> Result<(), ShapeError> {
        let missing_names = difference(&self.names, names);
        if !missing_names.is_empty() {
            return Err(ShapeError::UndeclaredPlaceholder {
                placeholder: PlaceholderKind::Name,
                tokens: missing_names,
            });
        }
        let missing_values = difference(&self.values, values);
        if !missing_values.is_empty() {
            return Err(ShapeError::UndeclaredPlaceholder {
                placeholder: PlaceholderKind::Value,
                tokens: missing_values,
            });
        }

        let unused_names = unused(names, &self.names);
        if !unused_names.is_empty() {
            return Err(ShapeError::UnusedPlaceholder {
                placeholder: PlaceholderKind::Name,
                tokens: unused_names,
            });
        }
        let unused_values = unused(values, &self.values);
        if !unused_values.is_empty() {
            return Err(ShapeError::UnusedPlaceholder {
                placeholder: PlaceholderKind::Value,
                tokens: unused_values,
            });
        }
        Ok(())
    }
}

fn difference<V>(used: &BTreeSet<String>, declared: &BTreeMap<String, V>) -> Vec<String> {
    used.iter()
        .filter(|t| !declared.contains_key(t.as_str()))
        .cloned()
        .collect()
}

fn unused<V>(declared: &BTreeMap<String, V>, used: &BTreeSet<String>) -> Vec<String> {
    declared
        .keys()
        .filter(|k| !used.contains(k.as_str()))
        .cloned()
        .collect()
}

/// Collect placeholders from every token stream and validate them in one pass.
///
/// # Errors
///
/// See [`UsedPlaceholders::validate`].
pub fn validate_placeholders<'a>(
    expressions: impl IntoIterator<Item = &'a [Token]>,
    names: &NameMap,
    values: &ValueMap,
) -> Result<(), ShapeError> {
    let mut used = UsedPlaceholders::default();
    for tokens in expressions {
        used.collect(tokens);
    }
    tracing::trace!(names = ?used.names, values = ?used.values, "collected placeholders");
    used.validate(names, values)
}

#[cfg(test)]
mod tests {
    use dynashape_model::{ErrorKind, Schema};

    use super::*;
    use crate::expression::lexer::tokenize;

    fn names(keys: &[&str]) -> NameMap {
        keys.iter()
            .map(|k| ((*k).to_owned(), k.trim_start_matches('#').to_owned()))
            .collect()
    }

    fn values(keys: &[&str]) -> ValueMap {
        keys.iter().map(|k| ((*k).to_owned(), Schema::String)).collect()
    }

    fn check(exprs: &[&str], n: &NameMap, v: &ValueMap) -> Result<(), ShapeError> {
        let streams: Vec<Vec<Token>> = exprs.iter().map(|e| tokenize(e).unwrap()).collect();
        validate_placeholders(streams.iter().map(Vec::as_slice), n, v)
    }

    #[test]
    fn test_should_accept_exact_usage_across_expressions() {
        let result = check(
            &["SET #a = :a", "attribute_exists(#b)"],
            &names(&["#a", "#b"]),
            &values(&[":a"]),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_should_report_all_unused_names_sorted() {
        let err = check(
            &["SET a = :a"],
            &names(&["#z", "#b"]),
            &values(&[":a"]),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ShapeError::UnusedPlaceholder {
                placeholder: PlaceholderKind::Name,
                tokens: vec!["#b".to_owned(), "#z".to_owned()],
            }
        );
    }

    #[test]
    fn test_should_report_undeclared_before_unused() {
        let err = check(&["SET #a = :missing"], &names(&["#a", "#extra"]), &values(&[]))
            .unwrap_err();
        assert!(matches!(
            err,
            ShapeError::UndeclaredPlaceholder {
                placeholder: PlaceholderKind::Value,
                ..
            }
        ));
        assert_eq!(err.kind(), ErrorKind::UnresolvedPlaceholder);
    }

    #[test]
    fn test_should_report_unused_values() {
        let err = check(&["REMOVE a"], &names(&[]), &values(&[":v"])).unwrap_err();
        assert!(err.to_string().contains("ExpressionAttributeValues"));
    }
}
