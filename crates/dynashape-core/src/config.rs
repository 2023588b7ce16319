//! Engine configuration.

use std::env;

use crate::projection::ProjectOptions;

/// Shape engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Treat list index access as possibly absent (default: true).
    pub strict_index_access: bool,
    /// Memoize per-request results in each [`Table`](crate::table::Table) (default: true).
    pub cache_results: bool,
}

impl EngineConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            strict_index_access: env_bool("DYNASHAPE_STRICT_INDEX_ACCESS", true),
            cache_results: env_bool("DYNASHAPE_CACHE_RESULTS", true),
        }
    }

    /// Projector options derived from this configuration.
    #[must_use]
    pub fn project_options(&self, make_required: bool) -> ProjectOptions {
        ProjectOptions {
            make_required,
            strict_index_access: self.strict_index_access,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_index_access: true,
            cache_results: true,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key).map_or(default, |v| {
        matches!(v.as_str(), "1" | "true" | "yes" | "TRUE" | "YES")
    })
}
