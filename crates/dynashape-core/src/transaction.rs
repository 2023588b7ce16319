//! Cancellation reasons of a failed transactional write.
//!
//! A `TransactionCanceledException` message ends with one reason code per
//! transaction item, in request order:
//!
//! ```text
//! Transaction cancelled, please refer cancellation reasons for specific reasons [None, ConditionalCheckFailed]
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why one item of a transaction was cancelled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum CancellationReason {
    /// The item did not cause the cancellation.
    None,
    /// The item's condition expression evaluated to false.
    ConditionalCheckFailed,
    /// The item collection grew past its size limit.
    ItemCollectionSizeLimitExceeded,
    /// Another transaction was writing the same item.
    TransactionConflict,
    /// The table ran out of provisioned capacity.
    ProvisionedThroughputExceeded,
    /// The request was throttled.
    ThrottlingError,
    /// The item failed request validation.
    ValidationError,
    /// A code this crate does not know, kept verbatim.
    Unknown(String),
}

impl CancellationReason {
    /// Returns the reason code as it appears in the error message.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::None => "None",
            Self::ConditionalCheckFailed => "ConditionalCheckFailed",
            Self::ItemCollectionSizeLimitExceeded => "ItemCollectionSizeLimitExceeded",
            Self::TransactionConflict => "TransactionConflict",
            Self::ProvisionedThroughputExceeded => "ProvisionedThroughputExceeded",
            Self::ThrottlingError => "ThrottlingError",
            Self::ValidationError => "ValidationError",
            Self::Unknown(code) => code,
        }
    }

    /// Returns `true` if this item caused the cancellation.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::None)
    }
}

impl From<&str> for CancellationReason {
    fn from(code: &str) -> Self {
        match code {
            "None" => Self::None,
            "ConditionalCheckFailed" => Self::ConditionalCheckFailed,
            "ItemCollectionSizeLimitExceeded" => Self::ItemCollectionSizeLimitExceeded,
            "TransactionConflict" => Self::TransactionConflict,
            "ProvisionedThroughputExceeded" => Self::ProvisionedThroughputExceeded,
            "ThrottlingError" => Self::ThrottlingError,
            "ValidationError" => Self::ValidationError,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

impl fmt::Display for CancellationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse the bracketed reason list at the end of a cancellation message.
///
/// Returns an empty list when the message carries no bracketed list.
#[must_use]
pub fn parse_cancellation_reasons(message: &str) -> Vec<CancellationReason> {
    let Some(open) = message.rfind('[') else {
        return Vec::new();
    };
    let Some(len) = message[open..].find(']') else {
        return Vec::new();
    };
    let body = message[open + 1..open + len].trim();
    if body.is_empty() {
        return Vec::new();
    }
    body.split(',')
        .map(|code| CancellationReason::from(code.trim()))
        .collect()
}
