#![doc = include_str!("../README.md")]

/// The contract of the key-value store a settings store delegates to.
pub mod backend;
pub mod defaults;

mod coercion;
mod error;
mod key;
mod locator;
mod store;
mod suite;
mod value;

pub use backend::DefaultsBackend;
pub use defaults::{Defaults, DefaultsSettings, StorageConfiguration};
pub use error::SettingsError;
pub use key::Key;
pub use store::SettingsStore;
pub use suite::{SearchList, Suite, GLOBAL_DOMAIN, REGISTRATION_DOMAIN};
pub use url::Url;
pub use value::{Dictionary, Value};
