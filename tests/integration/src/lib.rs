//! End-to-end tests for the dynashape engine.
//!
//! Table definitions, requests and expected shapes are written as JSON
//! fixtures with `serde_json::json!` and go through the public API only.
//!
//! ```text
//! cargo test -p dynashape-integration
//! ```

use std::sync::Once;

use dynashape_core::{EngineConfig, Table};
use dynashape_model::Schema;
use serde::de::DeserializeOwned;

static INIT: Once = Once::new();

/// Initialize tracing (once).
fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Deserialize a fixture.
#[must_use]
pub fn from_json<T: DeserializeOwned>(value: serde_json::Value) -> T {
    serde_json::from_value(value).unwrap_or_else(|e| panic!("invalid fixture: {e}"))
}

/// A schema fixture.
#[must_use]
pub fn schema(value: serde_json::Value) -> Schema {
    from_json(value)
}

/// Bind a table definition fixture with the default configuration.
#[must_use]
pub fn table(definition: serde_json::Value) -> Table {
    table_with(definition, EngineConfig::default())
}

/// Bind a table definition fixture.
#[must_use]
pub fn table_with(definition: serde_json::Value, config: EngineConfig) -> Table {
    init_tracing();
    Table::new(from_json(definition), config).unwrap_or_else(|e| panic!("invalid table: {e}"))
}

mod test_projection;
mod test_query;
mod test_transaction;
mod test_update;
