//! Tokenizer shared by every expression kind.
//!
//! Placeholders are atomic: `#name` and `:value` each become one token that
//! keeps its prefix. Keywords and function names are matched
//! case-insensitively and only when they form a whole identifier, so
//! `settings` is a field name, not `SET` followed by `tings`.

use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::ShapeError;

/// Lexer token for store expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// A plain identifier (attribute name).
    Identifier(String),
    /// An expression attribute name placeholder, prefix included (`#name`).
    NamePlaceholder(String),
    /// An expression attribute value placeholder, prefix included (`:value`).
    ValuePlaceholder(String),
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `NOT`
    Not,
    /// `BETWEEN`
    Between,
    /// `IN`
    In,
    /// `SET`
    Set,
    /// `REMOVE`
    Remove,
    /// `ADD`
    Add,
    /// `DELETE`
    Delete,
    /// `attribute_exists`
    AttributeExists,
    /// `attribute_not_exists`
    AttributeNotExists,
    /// `attribute_type`
    AttributeType,
    /// `begins_with`
    BeginsWith,
    /// `contains`
    Contains,
    /// `size`
    Size,
    /// `if_not_exists`
    IfNotExists,
    /// `list_append`
    ListAppend,
    /// A non-negative integer (list index).
    Number(usize),
    /// End of input.
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identifier(s) => write!(f, "identifier '{s}'"),
            Self::NamePlaceholder(s) | Self::ValuePlaceholder(s) => f.write_str(s),
            Self::Eq => f.write_str("'='"),
            Self::Ne => f.write_str("'<>'"),
            Self::Lt => f.write_str("'<'"),
            Self::Le => f.write_str("'<='"),
            Self::Gt => f.write_str("'>'"),
            Self::Ge => f.write_str("'>='"),
            Self::Plus => f.write_str("'+'"),
            Self::Minus => f.write_str("'-'"),
            Self::Dot => f.write_str("'.'"),
            Self::Comma => f.write_str("','"),
            Self::LParen => f.write_str("'('"),
            Self::RParen => f.write_str("')'"),
            Self::LBracket => f.write_str("'['"),
            Self::RBracket => f.write_str("']'"),
            Self::And => f.write_str("AND"),
            Self::Or => f.write_str("OR"),
            Self::Not => f.write_str("NOT"),
            Self::Between => f.write_str("BETWEEN"),
            Self::In => f.write_str("IN"),
            Self::Set => f.write_str("SET"),
            Self::Remove => f.write_str("REMOVE"),
            Self::Add => f.write_str("ADD"),
            Self::Delete => f.write_str("DELETE"),
            Self::AttributeExists => f.write_str("attribute_exists"),
            Self::AttributeNotExists => f.write_str("attribute_not_exists"),
            Self::AttributeType => f.write_str("attribute_type"),
            Self::BeginsWith => f.write_str("begins_with"),
            Self::Contains => f.write_str("contains"),
            Self::Size => f.write_str("size"),
            Self::IfNotExists => f.write_str("if_not_exists"),
            Self::ListAppend => f.write_str("list_append"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Eof => f.write_str("EOF"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, ShapeError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok == Token::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        Ok(tokens)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
            self.chars.next();
        }
    }

    fn single(&mut self, tok: Token) -> Token {
        self.chars.next();
        tok
    }

    fn next_token(&mut self) -> Result<Token, ShapeError> {
        self.skip_whitespace();

        let Some(&ch) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        match ch {
            '#' => self.read_placeholder('#').map(Token::NamePlaceholder),
            ':' => self.read_placeholder(':').map(Token::ValuePlaceholder),
            '=' => Ok(self.single(Token::Eq)),
            '<' => Ok(self.read_lt_family()),
            '>' => Ok(self.read_gt_family()),
            '+' => Ok(self.single(Token::Plus)),
            '-' => Ok(self.single(Token::Minus)),
            '.' => Ok(self.single(Token::Dot)),
            ',' => Ok(self.single(Token::Comma)),
            '(' => Ok(self.single(Token::LParen)),
            ')' => Ok(self.single(Token::RParen)),
            '[' => Ok(self.single(Token::LBracket)),
            ']' => Ok(self.single(Token::RBracket)),
            c if c.is_ascii_digit() => self.read_number(),
            c if is_ident_start(c) => Ok(self.read_identifier_or_keyword()),
            _ => Err(ShapeError::UnexpectedToken {
                expected: "valid token".to_owned(),
                found: format!("'{ch}'"),
            }),
        }
    }

    fn read_placeholder(&mut self, prefix: char) -> Result<String, ShapeError> {
        self.chars.next();
        let name = self.read_ident_chars();
        if name.is_empty() {
            return Err(ShapeError::UnexpectedToken {
                expected: format!("placeholder name after '{prefix}'"),
                found: self
                    .chars
                    .peek()
                    .map_or_else(|| "EOF".to_owned(), |c| format!("'{c}'")),
            });
        }
        Ok(format!("{prefix}{name}"))
    }

    fn read_lt_family(&mut self) -> Token {
        self.chars.next();
        match self.chars.peek() {
            Some('=') => self.single(Token::Le),
            Some('>') => self.single(Token::Ne),
            _ => Token::Lt,
        }
    }

    fn read_gt_family(&mut self) -> Token {
        self.chars.next();
        if self.chars.peek() == Some(&'=') {
            self.single(Token::Ge)
        } else {
            Token::Gt
        }
    }

    fn read_number(&mut self) -> Result<Token, ShapeError> {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if !c.is_ascii_digit() {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        s.parse()
            .map(Token::Number)
            .map_err(|_| ShapeError::structural(format!("'{s}' is not a valid list index")))
    }

    fn read_ident_chars(&mut self) -> String {
        let mut s = String::new();
        while let Some(&c) = self.chars.peek() {
            if !is_ident_continue(c) {
                break;
            }
            s.push(c);
            self.chars.next();
        }
        s
    }

    fn read_identifier_or_keyword(&mut self) -> Token {
        let ident = self.read_ident_chars();
        match ident.to_ascii_lowercase().as_str() {
            "and" => Token::And,
            "or" => Token::Or,
            "not" => Token::Not,
            "between" => Token::Between,
            "in" => Token::In,
            "set" => Token::Set,
            "remove" => Token::Remove,
            "add" => Token::Add,
            "delete" => Token::Delete,
            "attribute_exists" => Token::AttributeExists,
            "attribute_not_exists" => Token::AttributeNotExists,
            "attribute_type" => Token::AttributeType,
            "begins_with" => Token::BeginsWith,
            "contains" => Token::Contains,
            "size" => Token::Size,
            "if_not_exists" => Token::IfNotExists,
            "list_append" => Token::ListAppend,
            _ => Token::Identifier(ident),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Tokenize an expression. The returned vector always ends with [`Token::Eof`].
///
/// # Errors
///
/// Returns a structural error for characters that cannot start a token,
/// bare `#`/`:` prefixes, and list indices that overflow.
pub fn tokenize(input: &str) -> Result<Vec<Token>, ShapeError> {
    Lexer::new(input).tokenize()
}
