//! dynashape - print the result shape of a DynamoDB-style request.
//!
//! Reads a table definition and a request, both JSON, and prints the shape
//! of what the request returns.
//!
//! # Usage
//!
//! ```text
//! dynashape table.json request.json
//! ```
//!
//! The request names its operation in an `Operation` field next to the
//! usual request parameters:
//!
//! ```text
//! {"Operation": "Query", "KeyConditionExpression": "pk = :pk", ...}
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `DYNASHAPE_STRICT_INDEX_ACCESS` | `true` | List index access may be absent |
//! | `DYNASHAPE_CACHE_RESULTS` | `true` | Memoize shapes per request |
//! | `LOG_LEVEL` | `warn` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::path::Path;

use anyhow::{Context, Result, bail};
use dynashape_core::{
    DeleteItemRequest, EngineConfig, GetItemRequest, PutItemRequest, QueryRequest, ScanRequest,
    ShapeError, Table, UpdateItemRequest,
};
use dynashape_model::{Schema, TableDefinition};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// A request tagged with the operation it belongs to.
#[derive(Debug, Deserialize)]
#[serde(tag = "Operation")]
enum Request {
    GetItem(GetItemRequest),
    PutItem(PutItemRequest),
    DeleteItem(DeleteItemRequest),
    UpdateItem(UpdateItemRequest),
    Query(QueryRequest),
    Scan(ScanRequest),
}

impl Request {
    fn operation(&self) -> &'static str {
        match self {
            Self::GetItem(_) => "GetItem",
            Self::PutItem(_) => "PutItem",
            Self::DeleteItem(_) => "DeleteItem",
            Self::UpdateItem(_) => "UpdateItem",
            Self::Query(_) => "Query",
            Self::Scan(_) => "Scan",
        }
    }

    fn shape(&self, table: &Table) -> Result<Option<Schema>, ShapeError> {
        match self {
            Self::GetItem(r) => table.get_item(r).map(Some),
            Self::PutItem(r) => table.put_item(r),
            Self::DeleteItem(r) => table.delete_item(r),
            Self::UpdateItem(r) => table.update_item(r),
            Self::Query(r) => table.query(r),
            Self::Scan(r) => table.scan(r),
        }
    }
}

/// What gets printed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Output {
    operation: &'static str,
    shape: Option<Schema>,
    #[serde(skip_serializing_if = "Option::is_none")]
    type_expression: Option<String>,
}

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

/// Read the log level from the environment.
fn log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let body = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&body).with_context(|| format!("failed to parse {}", path.display()))
}

fn run(table_path: &Path, request_path: &Path, config: EngineConfig) -> Result<Output> {
    let definition: TableDefinition = read_json(table_path)?;
    let request: Request = read_json(request_path)?;
    let table = match Table::new(definition, config) {
        Ok(table) => table,
        Err(err) => bail!(err.to_validation_message()),
    };

    let operation = request.operation();
    info!(table = %table.definition().table_name, operation, "computing result shape");
    let shape = match request.shape(&table) {
        Ok(shape) => shape,
        Err(err) => bail!(err.to_validation_message()),
    };
    Ok(Output {
        operation,
        type_expression: shape.as_ref().map(ToString::to_string),
        shape,
    })
}

fn main() -> Result<()> {
    init_tracing(&log_level())?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [table_path, request_path] = args.as_slice() else {
        bail!("usage: dynashape <table.json> <request.json>");
    };

    let output = run(
        Path::new(table_path),
        Path::new(request_path),
        EngineConfig::from_env(),
    )?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
