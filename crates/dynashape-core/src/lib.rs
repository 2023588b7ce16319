//! Shape engine for DynamoDB-style item operations.
//!
//! Given an item schema and the expressions of a request, the engine works
//! out, without touching a store, which shape of data the request reads or
//! writes. Expressions are tokenized and parsed in [`expression`], selected
//! paths are merged and applied to the schema in [`projection`], update
//! clauses are checked in [`update`], and key and filter conditions select
//! schema variants in [`key_condition`]. [`table::Table`] ties them
//! together per operation.
#![allow(clippy::doc_markdown, clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod expression;
pub mod key_condition;
pub mod projection;
pub mod table;
pub mod transaction;
pub mod update;

pub use config::EngineConfig;
pub use error::{PlaceholderKind, ShapeError};
pub use expression::{NameMap, ValueMap};
pub use key_condition::{KeyCondition, KeyConstraint, extract_key, narrow};
pub use projection::{ProjectOptions, ProjectionStruct, Selection, project, project_path};
pub use table::{
    DeleteItemRequest, GetItemRequest, PutItemRequest, QueryRequest, ScanRequest, Table,
    UpdateItemRequest, literal_values, widened_values,
};
pub use transaction::{CancellationReason, parse_cancellation_reasons};
pub use update::{UpdateAnalysis, analyze_update};
