//! Expression tokenizing, splitting, parsing and placeholder checks.

use std::collections::BTreeMap;

use dynashape_model::Schema;

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod placeholders;
pub mod split;

pub use ast::{
    AddAction, ArithmeticOp, CompareOp, DeleteAction, DocumentPath, Expr, FunctionName,
    LogicalOp, Operand, Segment, SetAction, SetValue, UpdateExpr,
};
pub use lexer::{Token, tokenize};
pub use parser::{parse_condition, parse_condition_tokens, parse_path, parse_projection, parse_update};
pub use placeholders::{UsedPlaceholders, validate_placeholders};
pub use split::{Clause, ClauseKeyword, split_clauses, split_conditions};

/// Declared `#name` placeholders and the field names they stand for.
pub type NameMap = BTreeMap<String, String>;

/// Declared `:value` placeholders and the schemas of their values.
pub type ValueMap = BTreeMap<String, Schema>;
