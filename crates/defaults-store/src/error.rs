use defaults_threading::CallError;
use thiserror::Error;

use crate::defaults::DatabaseError;

/// Errors that can occur when opening or synchronizing a settings store.
///
/// Per-key reads and writes never fail; a missing or mismatched value reads as the accessor's
/// default instead.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The store could not open a domain for the requested suite name.
    #[error("Domain '{name}' is unavailable: {reason}")]
    DomainUnavailable {
        /// The requested suite name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
    /// Failed to serialize a typed setting value
    #[error("Failed to serialize setting: {0}")]
    Json(#[from] serde_json::Error),
    /// A typed value serialized to JSON the store cannot hold, such as an array with `null`
    #[error("Setting '{key}' has no stored representation")]
    Unrepresentable {
        /// The key that was being written.
        key: &'static str,
    },
    /// Persistence operation failed
    #[error(transparent)]
    Database(#[from] DatabaseError),
    /// The store's serialization thread could not complete the call
    #[error(transparent)]
    Runner(#[from] CallError),
}
