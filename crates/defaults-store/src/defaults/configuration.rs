use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Name of the application domain when none is configured.
pub const DEFAULT_APPLICATION_DOMAIN: &str = "application";

/// Settings for the process-wide [`Defaults`](crate::Defaults) store. They are read once at
/// initialization.
///
/// Defaults to
///
/// ```
/// # use defaults_store::{DefaultsSettings, StorageConfiguration};
/// let settings = DefaultsSettings {
///     application_domain: "application".to_string(),
///     storage: StorageConfiguration::InMemory,
/// };
/// let default = DefaultsSettings::default();
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct DefaultsSettings {
    /// Domain used by [`Suite::Standard`](crate::Suite::Standard) stores. Named suites may not
    /// reuse it.
    pub application_domain: String,
    /// Where persistent domains are stored.
    pub storage: StorageConfiguration,
}

impl Default for DefaultsSettings {
    fn default() -> Self {
        Self {
            application_domain: DEFAULT_APPLICATION_DOMAIN.into(),
            storage: StorageConfiguration::InMemory,
        }
    }
}

/// Configuration for the database backing persistent domains.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StorageConfiguration {
    /// SQLite database file. Different users or applications should use different files.
    Sqlite {
        /// Path of the database file, created if missing.
        #[serde(rename = "filePath")]
        file_path: PathBuf,
    },
    /// SQLite database held in memory. Nothing survives the process.
    InMemory,
}
