//! Recursive-descent parser over lexer tokens.
//!
//! Update expressions are first split into clauses and items by
//! [`split_clauses`](super::split::split_clauses); each item is then parsed
//! on its own so a bad item never bleeds into its neighbours.

use super::ast::{
    AddAction, ArithmeticOp, CompareOp, DeleteAction, DocumentPath, Expr, FunctionName,
    LogicalOp, Operand, Segment, SetAction, SetValue, UpdateExpr,
};
use super::lexer::{Token, tokenize};
use super::split::{ClauseKeyword, split_clauses};
use crate::error::ShapeError;

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens.get(self.pos).cloned().unwrap_or(Token::Eof);
        self.pos += 1;
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<Token, ShapeError> {
        let tok = self.advance();
        if std::mem::discriminant(&tok) == std::mem::discriminant(expected) {
            Ok(tok)
        } else {
            Err(ShapeError::UnexpectedToken {
                expected: expected.to_string(),
                found: tok.to_string(),
            })
        }
    }

    fn at_end(&self) -> bool {
        matches!(self.peek(), Token::Eof)
    }

    fn expect_end(&self) -> Result<(), ShapeError> {
        if self.at_end() {
            Ok(())
        } else {
            Err(ShapeError::UnexpectedToken {
                expected: "end of expression".to_owned(),
                found: self.peek().to_string(),
            })
        }
    }

    fn expect_value_placeholder(&mut self) -> Result<String, ShapeError> {
        match self.advance() {
            Token::ValuePlaceholder(token) => Ok(token),
            other => Err(ShapeError::UnexpectedToken {
                expected: "expression attribute value".to_owned(),
                found: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Conditions (precedence climbing: OR < AND < NOT < primary)
// ---------------------------------------------------------------------------

impl Parser<'_> {
    fn parse_or_expr(&mut self) -> Result<Expr, ShapeError> {
        let mut left = self.parse_and_expr()?;
        while matches!(self.peek(), Token::Or) {
            self.advance();
            let right = self.parse_and_expr()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_and_expr(&mut self) -> Result<Expr, ShapeError> {
        let mut left = self.parse_not_expr()?;
        while matches!(self.peek(), Token::And) {
            self.advance();
            let right = self.parse_not_expr()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_not_expr(&mut self) -> Result<Expr, ShapeError> {
        if matches!(self.peek(), Token::Not) {
            self.advance();
            let expr = self.parse_not_expr()?;
            return Ok(Expr::Not(Box::new(expr)));
        }
        self.parse_primary_expr()
    }

    fn parse_primary_expr(&mut self) -> Result<Expr, ShapeError> {
        if matches!(self.peek(), Token::LParen) {
            self.advance();
            let expr = self.parse_or_expr()?;
            self.expect(&Token::RParen)?;
            return Ok(expr);
        }

        if let Some(name) = self.peek_function_name() {
            return self.parse_function_expr(name);
        }

        let operand = self.parse_operand()?;
        self.parse_postfix_expr(operand)
    }

    fn peek_function_name(&self) -> Option<FunctionName> {
        match self.peek() {
            Token::AttributeExists => Some(FunctionName::AttributeExists),
            Token::AttributeNotExists => Some(FunctionName::AttributeNotExists),
            Token::AttributeType => Some(FunctionName::AttributeType),
            Token::BeginsWith => Some(FunctionName::BeginsWith),
            Token::Contains => Some(FunctionName::Contains),
            _ => None,
        }
    }

    fn parse_function_expr(&mut self, name: FunctionName) -> Result<Expr, ShapeError> {
        self.advance();
        self.expect(&Token::LParen)?;
        let args = self.parse_operand_list()?;
        self.expect(&Token::RParen)?;
        Ok(Expr::Function { name, args })
    }

    fn parse_operand_list(&mut self) -> Result<Vec<Operand>, ShapeError> {
        let mut list = vec![self.parse_operand()?];
        while matches!(self.peek(), Token::Comma) {
            self.advance();
            list.push(self.parse_operand()?);
        }
        Ok(list)
    }

    fn parse_postfix_expr(&mut self, left: Operand) -> Result<Expr, ShapeError> {
        match self.peek() {
            Token::Eq | Token::Ne | Token::Lt | Token::Le | Token::Gt | Token::Ge => {
                let op = self.parse_compare_op()?;
                let right = self.parse_operand()?;
                Ok(Expr::Compare {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                })
            }
            Token::Between => {
                self.advance();
                let low = self.parse_operand()?;
                self.expect(&Token::And)?;
                let high = self.parse_operand()?;
                Ok(Expr::Between {
                    value: Box::new(left),
                    low: Box::new(low),
                    high: Box::new(high),
                })
            }
            Token::In => {
                self.advance();
                self.expect(&Token::LParen)?;
                let list = self.parse_operand_list()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::In {
                    value: Box::new(left),
                    list,
                })
            }
            other => Err(ShapeError::UnexpectedToken {
                expected: "comparison operator, BETWEEN, or IN".to_owned(),
                found: other.to_string(),
            }),
        }
    }

    fn parse_compare_op(&mut self) -> Result<CompareOp, ShapeError> {
        match self.advance() {
            Token::Eq => Ok(CompareOp::Eq),
            Token::Ne => Ok(CompareOp::Ne),
            Token::Lt => Ok(CompareOp::Lt),
            Token::Le => Ok(CompareOp::Le),
            Token::Gt => Ok(CompareOp::Gt),
            Token::Ge => Ok(CompareOp::Ge),
            other => Err(ShapeError::UnexpectedToken {
                expected: "comparison operator".to_owned(),
                found: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Operands and paths
// ---------------------------------------------------------------------------

impl Parser<'_> {
    fn parse_operand(&mut self) -> Result<Operand, ShapeError> {
        match self.peek() {
            Token::ValuePlaceholder(_) => self.expect_value_placeholder().map(Operand::Value),
            Token::Size => {
                self.advance();
                self.expect(&Token::LParen)?;
                let inner = self.parse_operand()?;
                self.expect(&Token::RParen)?;
                Ok(Operand::Size(Box::new(inner)))
            }
            _ => self.parse_document_path().map(Operand::Path),
        }
    }

    fn parse_document_path(&mut self) -> Result<DocumentPath, ShapeError> {
        let mut segments = vec![self.parse_path_head()?];
        loop {
            match self.peek() {
                Token::Dot => {
                    self.advance();
                    segments.push(self.parse_path_head()?);
                }
                Token::LBracket => {
                    self.advance();
                    let idx = match self.advance() {
                        Token::Number(idx) => idx,
                        other => {
                            return Err(ShapeError::UnexpectedToken {
                                expected: "list index".to_owned(),
                                found: other.to_string(),
                            });
                        }
                    };
                    self.expect(&Token::RBracket)?;
                    segments.push(Segment::Index(idx));
                }
                _ => break,
            }
        }
        Ok(DocumentPath::new(segments))
    }

    fn parse_path_head(&mut self) -> Result<Segment, ShapeError> {
        match self.advance() {
            Token::Identifier(name) => Ok(Segment::Field(name)),
            Token::NamePlaceholder(token) => Ok(Segment::Placeholder(token)),
            other => Err(ShapeError::UnexpectedToken {
                expected: "attribute name or #name".to_owned(),
                found: other.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Update items
// ---------------------------------------------------------------------------

impl Parser<'_> {
    fn parse_set_action(&mut self) -> Result<SetAction, ShapeError> {
        let path = self.parse_document_path()?;
        self.expect(&Token::Eq)?;
        let value = self.parse_set_value()?;
        Ok(SetAction { path, value })
    }

    fn parse_set_value(&mut self) -> Result<SetValue, ShapeError> {
        let mut left = self.parse_set_term()?;
        loop {
            let op = match self.peek() {
                Token::Plus => ArithmeticOp::Plus,
                Token::Minus => ArithmeticOp::Minus,
                _ => break,
            };
            self.advance();
            let right = self.parse_set_term()?;
            left = SetValue::Arithmetic {
                op,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn parse_set_term(&mut self) -> Result<SetValue, ShapeError> {
        match self.peek() {
            Token::IfNotExists => {
                self.advance();
                self.expect(&Token::LParen)?;
                let path = self.parse_document_path()?;
                self.expect(&Token::Comma)?;
                let fallback = self.parse_set_value()?;
                self.expect(&Token::RParen)?;
                Ok(SetValue::IfNotExists(path, Box::new(fallback)))
            }
            Token::ListAppend => {
                self.advance();
                self.expect(&Token::LParen)?;
                let first = self.parse_set_value()?;
                self.expect(&Token::Comma)?;
                let second = self.parse_set_value()?;
                self.expect(&Token::RParen)?;
                Ok(SetValue::ListAppend(Box::new(first), Box::new(second)))
            }
            Token::ValuePlaceholder(_) => self
                .expect_value_placeholder()
                .map(|v| SetValue::Operand(Operand::Value(v))),
            Token::Identifier(_) | Token::NamePlaceholder(_) => self
                .parse_document_path()
                .map(|p| SetValue::Operand(Operand::Path(p))),
            other => Err(ShapeError::UnexpectedToken {
                expected: "path, value, if_not_exists or list_append".to_owned(),
                found: other.to_string(),
            }),
        }
    }

    fn parse_add_action(&mut self) -> Result<AddAction, ShapeError> {
        let path = self.parse_document_path()?;
        let value = self.expect_value_placeholder()?;
        Ok(AddAction { path, value })
    }

    fn parse_delete_action(&mut self) -> Result<DeleteAction, ShapeError> {
        let path = self.parse_document_path()?;
        let value = self.expect_value_placeholder()?;
        Ok(DeleteAction { path, value })
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a single document path such as `a.#b[0]`.
///
/// # Errors
///
/// Returns a structural error if `input` is not exactly one path.
pub fn parse_path(input: &str) -> Result<DocumentPath, ShapeError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(&tokens);
    let path = parser.parse_document_path()?;
    parser.expect_end()?;
    Ok(path)
}

/// Parse a condition, filter, or key-condition expression.
///
/// # Errors
///
/// Returns a structural error if the expression is syntactically invalid.
pub fn parse_condition(input: &str) -> Result<Expr, ShapeError> {
    parse_condition_tokens(&tokenize(input)?)
}

/// Parse an already tokenized condition, such as one part returned by
/// [`split_conditions`](super::split::split_conditions).
///
/// # Errors
///
/// Returns a structural error if the tokens do not form one condition.
pub fn parse_condition_tokens(tokens: &[Token]) -> Result<Expr, ShapeError> {
    let mut parser = Parser::new(tokens);
    let expr = parser.parse_or_expr()?;
    parser.expect_end()?;
    Ok(expr)
}

/// Parse an update expression (SET / REMOVE / ADD / DELETE).
///
/// # Errors
///
/// Returns a structural error if the clause structure or any item is invalid.
pub fn parse_update(input: &str) -> Result<UpdateExpr, ShapeError> {
    let tokens = tokenize(input)?;
    let mut update = UpdateExpr::default();

    for clause in split_clauses(&tokens)? {
        for item in &clause.items {
            let mut parser = Parser::new(item);
            match clause.keyword {
                ClauseKeyword::Set => update.set_actions.push(parser.parse_set_action()?),
                ClauseKeyword::Remove => update.remove_paths.push(parser.parse_document_path()?),
                ClauseKeyword::Add => update.add_actions.push(parser.parse_add_action()?),
                ClauseKeyword::Delete => update.delete_actions.push(parser.parse_delete_action()?),
            }
            parser.expect_end()?;
        }
    }

    Ok(update)
}

/// Parse a projection expression (comma-separated document paths).
///
/// # Errors
///
/// Returns a structural error if the expression is syntactically invalid.
pub fn parse_projection(input: &str) -> Result<Vec<DocumentPath>, ShapeError> {
    let tokens = tokenize(input)?;
    let mut parser = Parser::new(&tokens);
    let mut paths = vec![parser.parse_document_path()?];
    while matches!(parser.peek(), Token::Comma) {
        parser.advance();
        paths.push(parser.parse_document_path()?);
    }
    parser.expect_end()?;
    Ok(paths)
}
