//! Structural splitting of token streams.
//!
//! Update expressions are split into clauses and clauses into items before
//! any item is parsed, and key conditions are split into their top-level
//! `AND` conjuncts. Separators only count at parenthesis depth zero, so
//! `list_append(a, :b)` stays one item. Unbalanced brackets and parentheses,
//! empty items and dangling separators are rejected here.

use std::fmt;

use crate::error::ShapeError;

use super::lexer::Token;

/// The four update clause keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseKeyword {
    /// `SET`
    Set,
    /// `REMOVE`
    Remove,
    /// `ADD`
    Add,
    /// `DELETE`
    Delete,
}

impl ClauseKeyword {
    fn from_token(token: &Token) -> Option<Self> {
        match token {
            Token::Set => Some(Self::Set),
            Token::Remove => Some(Self::Remove),
            Token::Add => Some(Self::Add),
            Token::Delete => Some(Self::Delete),
            _ => None,
        }
    }

    /// Returns the keyword as written.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Remove => "REMOVE",
            Self::Add => "ADD",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ClauseKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One update clause and its comma-separated items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    /// The clause keyword.
    pub keyword: ClauseKeyword,
    /// Token run of each item, without separators.
    pub items: Vec<Vec<Token>>,
}

/// Tracks bracket and parenthesis nesting across a token run.
#[derive(Debug, Default)]
struct Depth {
    parens: usize,
    brackets: usize,
}

impl Depth {
    fn track(&mut self, token: &Token) -> Result<(), ShapeError> {
        match token {
            Token::LParen => self.parens += 1,
            Token::LBracket => self.brackets += 1,
            Token::RParen => {
                self.parens = self
                    .parens
                    .checked_sub(1)
                    .ok_or_else(|| ShapeError::structural("unmatched ')'"))?;
            }
            Token::RBracket => {
                self.brackets = self
                    .brackets
                    .checked_sub(1)
                    .ok_or_else(|| ShapeError::structural("unmatched ']'"))?;
            }
            _ => {}
        }
        Ok(())
    }

    fn is_top(&self) -> bool {
        self.parens == 0 && self.brackets == 0
    }

    fn finish(&self) -> Result<(), ShapeError> {
        if self.parens > 0 {
            return Err(ShapeError::structural("unclosed '('"));
        }
        if self.brackets > 0 {
            return Err(ShapeError::structural("unclosed '['"));
        }
        Ok(())
    }
}

/// Close the item being collected for `clause`.
fn push_item(clause: &mut Clause, item: &mut Vec<Token>, at_end: bool) -> Result<(), ShapeError> {
    if item.is_empty() {
        let message = match (clause.items.is_empty(), at_end) {
            (true, true) => format!("{} clause has no items", clause.keyword),
            (false, true) => format!("trailing ',' in {} clause", clause.keyword),
            _ => format!("empty item in {} clause", clause.keyword),
        };
        return Err(ShapeError::structural(message));
    }
    clause.items.push(std::mem::take(item));
    Ok(())
}

/// Split an update expression's tokens into clauses.
///
/// Clause keywords may repeat; each occurrence yields its own [`Clause`].
///
/// # Errors
///
/// Returns a structural error for empty input, tokens before the first
/// keyword, unbalanced brackets or parentheses, and empty or dangling items.
pub fn split_clauses(tokens: &[Token]) -> Result<Vec<Clause>, ShapeError> {
    let mut clauses: Vec<Clause> = Vec::new();
    let mut item: Vec<Token> = Vec::new();
    let mut depth = Depth::default();

    for token in tokens.iter().filter(|t| **t != Token::Eof) {
        let keyword = if depth.is_top() {
            ClauseKeyword::from_token(token)
        } else {
            None
        };
        if let Some(keyword) = keyword {
            if let Some(current) = clauses.last_mut() {
                push_item(current, &mut item, true)?;
            }
            clauses.push(Clause {
                keyword,
                items: Vec::new(),
            });
            continue;
        }

        let Some(current) = clauses.last_mut() else {
            return Err(ShapeError::UnexpectedToken {
                expected: "SET, REMOVE, ADD, or DELETE".to_owned(),
                found: token.to_string(),
            });
        };

        if *token == Token::Comma && depth.is_top() {
            push_item(current, &mut item, false)?;
            continue;
        }
        depth.track(token)?;
        item.push(token.clone());
    }

    depth.finish()?;
    let Some(current) = clauses.last_mut() else {
        return Err(ShapeError::structural("empty update expression"));
    };
    push_item(current, &mut item, true)?;
    Ok(clauses)
}

/// Split a condition's tokens into its top-level `AND` conjuncts.
///
/// The `AND` that belongs to a top-level `BETWEEN` stays inside its part.
///
/// # Errors
///
/// Returns a structural error for empty input, unbalanced brackets or
/// parentheses, and dangling `AND`s.
pub fn split_conditions(tokens: &[Token]) -> Result<Vec<Vec<Token>>, ShapeError> {
    let mut parts: Vec<Vec<Token>> = Vec::new();
    let mut part: Vec<Token> = Vec::new();
    let mut depth = Depth::default();
    let mut open_betweens = 0usize;

    for token in tokens.iter().filter(|t| **t != Token::Eof) {
        if depth.is_top() {
            match token {
                Token::Between => open_betweens += 1,
                Token::And if open_betweens > 0 => open_betweens -= 1,
                Token::And => {
                    if part.is_empty() {
                        return Err(ShapeError::structural("dangling AND in condition"));
                    }
                    parts.push(std::mem::take(&mut part));
                    continue;
                }
                _ => {}
            }
        }
        depth.track(token)?;
        part.push(token.clone());
    }

    depth.finish()?;
    if part.is_empty() {
        let message = if parts.is_empty() {
            "empty condition"
        } else {
            "dangling AND in condition"
        };
        return Err(ShapeError::structural(message));
    }
    parts.push(part);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use dynashape_model::ErrorKind;

    use super::*;
    use crate::expression::lexer::tokenize;

    fn clauses(input: &str) -> Result<Vec<Clause>, ShapeError> {
        split_clauses(&tokenize(input).unwrap())
    }

    #[test]
    fn test_should_split_clauses_and_items() {
        let result = clauses("SET a = :a, b = list_append(b, :b) REMOVE c, d[1]").unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].keyword, ClauseKeyword::Set);
        assert_eq!(result[0].items.len(), 2);
        assert_eq!(result[1].keyword, ClauseKeyword::Remove);
        assert_eq!(result[1].items.len(), 2);
    }

    #[test]
    fn test_should_allow_repeated_keywords() {
        let result = clauses("SET a = :a SET b = :b").unwrap();
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|c| c.keyword == ClauseKeyword::Set));
    }

    #[test]
    fn test_should_reject_trailing_separator() {
        let err = clauses("SET a = :a,").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StructuralParse);
        assert!(err.to_string().contains("trailing ','"));
    }

    #[test]
    fn test_should_reject_empty_item() {
        let err = clauses("REMOVE a,,b").unwrap_err();
        assert!(err.to_string().contains("empty item in REMOVE clause"));
    }

    #[test]
    fn test_should_reject_keyword_without_items() {
        let err = clauses("SET a = :a REMOVE").unwrap_err();
        assert!(err.to_string().contains("REMOVE clause has no items"));
    }

    #[test]
    fn test_should_reject_unbalanced_brackets() {
        assert!(clauses("REMOVE a[1").is_err());
        assert!(clauses("REMOVE a]").is_err());
        assert!(clauses("SET a = list_append(a, :b").is_err());
        assert!(clauses("SET a = :b)").is_err());
    }

    #[test]
    fn test_should_reject_leading_tokens_and_empty_input() {
        assert!(clauses("a = :a").is_err());
        assert!(clauses("   ").is_err());
    }

    #[test]
    fn test_should_keep_between_and_together() {
        let tokens = tokenize("pk = :pk AND sk BETWEEN :lo AND :hi").unwrap();
        let parts = split_conditions(&tokens).unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].len(), 5);
    }

    #[test]
    fn test_should_not_split_inside_parentheses() {
        let tokens = tokenize("(a = :a AND b = :b) AND c = :c").unwrap();
        let parts = split_conditions(&tokens).unwrap();
        assert_eq!(parts.len(), 2);
    }

    #[test]
    fn test_should_reject_dangling_and() {
        let tokens = tokenize("a = :a AND").unwrap();
        assert!(split_conditions(&tokens).is_err());
        let tokens = tokenize("AND a = :a").unwrap();
        assert!(split_conditions(&tokens).is_err());
    }
}
