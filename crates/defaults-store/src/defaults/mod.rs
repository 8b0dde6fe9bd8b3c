//! The process-wide store shipped with this crate.

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use defaults_threading::{CallError, SerialRunner};
use thiserror::Error;

use crate::{
    backend::DefaultsBackend,
    suite::{validate_suite_name, REGISTRATION_DOMAIN},
    Dictionary, SearchList, SettingsError, Suite, Value,
};

mod configuration;
mod sqlite;

pub use configuration::{DefaultsSettings, StorageConfiguration, DEFAULT_APPLICATION_DOMAIN};
use sqlite::SqliteDatabase;

#[allow(missing_docs)]
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error(transparent)]
    ThreadBoundRunner(#[from] CallError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Internal(#[from] rusqlite::Error),
}

#[derive(Default)]
struct Domains {
    persistent: HashMap<String, Dictionary>,
    volatile: HashMap<String, Dictionary>,
}

/// The key-value store shared by every [`SettingsStore`](crate::SettingsStore) in a process.
///
/// All domains are held in memory and served from there, so a write is visible to every store
/// in the process as soon as the call returns. Changes to persistent domains are then handed to
/// a dedicated persistence thread which writes them to SQLite in the order they were made.
///
/// Create one instance at startup with [`Defaults::initialize`] and pass it to every store that
/// needs it.
pub struct Defaults {
    application_domain: String,
    domains: RwLock<Domains>,
    database: SerialRunner<SqliteDatabase>,
}

impl std::fmt::Debug for Defaults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Defaults")
            .field("application_domain", &self.application_domain)
            .finish()
    }
}

impl Defaults {
    /// Open the configured database and load every persisted domain into memory.
    pub async fn initialize(settings: DefaultsSettings) -> Result<Arc<Self>, SettingsError> {
        let database = SqliteDatabase::open(&settings.storage)?;
        let database = SerialRunner::new("defaults-persistence", database)?;

        let persistent = database
            .run(|database| database.load_all())
            .await
            .map_err(DatabaseError::from)??;
        log::debug!(
            "Loaded {} persistent domains for '{}'",
            persistent.len(),
            settings.application_domain
        );

        Ok(Arc::new(Defaults {
            application_domain: settings.application_domain,
            domains: RwLock::new(Domains {
                persistent,
                volatile: HashMap::new(),
            }),
            database,
        }))
    }

    /// The domain used by [`Suite::Standard`] stores.
    pub fn application_domain(&self) -> &str {
        &self.application_domain
    }

    fn read(&self) -> RwLockReadGuard<'_, Domains> {
        self.domains.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Domains> {
        self.domains.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a write for the persistence thread. Callers hold the domains write lock so the
    /// queue order matches the order changes were applied in memory.
    fn persist<F>(&self, write: F)
    where
        F: FnOnce(&mut SqliteDatabase) -> Result<(), DatabaseError> + Send + 'static,
    {
        let submitted = self.database.submit(move |database| {
            let result = write(database);
            database.record(result);
        });
        if let Err(e) = submitted {
            log::warn!("Dropping defaults change, persistence is unavailable: {e}");
        }
    }
}

impl DefaultsBackend for Defaults {
    fn open_domain(&self, suite: &Suite) -> Result<SearchList, SettingsError> {
        match suite {
            Suite::Standard => Ok(SearchList::new(self.application_domain.clone())),
            Suite::Named(name) => {
                validate_suite_name(name, &self.application_domain).map_err(|reason| {
                    SettingsError::DomainUnavailable {
                        name: name.clone(),
                        reason,
                    }
                })?;
                Ok(SearchList::new(name.clone()))
            }
        }
    }

    fn object(&self, search_list: &SearchList, key: &str) -> Option<Value> {
        let domains = self.read();
        let value = search_list
            .persistent_domains()
            .filter_map(|name| domains.persistent.get(name))
            .chain(domains.volatile.get(REGISTRATION_DOMAIN))
            .find_map(|entries| entries.get(key))
            .cloned();
        value
    }

    fn set_object(&self, search_list: &SearchList, key: &str, value: Option<Value>) {
        let domain = search_list.domain().to_owned();
        let key = key.to_owned();
        let mut domains = self.write();

        match &value {
            Some(value) => {
                domains
                    .persistent
                    .entry(domain.clone())
                    .or_default()
                    .insert(key.clone(), value.clone());
            }
            None => {
                if let Some(entries) = domains.persistent.get_mut(&domain) {
                    entries.remove(&key);
                    if entries.is_empty() {
                        domains.persistent.remove(&domain);
                    }
                }
            }
        }

        self.persist(move |database| database.set_entry(&domain, &key, value.as_ref()));
    }

    fn dictionary_representation(&self, search_list: &SearchList) -> Dictionary {
        let domains = self.read();
        let layers = search_list
            .persistent_domains()
            .filter_map(|name| domains.persistent.get(name))
            .chain(domains.volatile.get(REGISTRATION_DOMAIN));

        let mut snapshot = Dictionary::new();
        for entries in layers {
            for (key, value) in entries {
                snapshot
                    .entry(key.clone())
                    .or_insert_with(|| value.clone());
            }
        }
        snapshot
    }

    fn register_defaults(&self, defaults: Dictionary) {
        self.write()
            .volatile
            .entry(REGISTRATION_DOMAIN.to_owned())
            .or_default()
            .extend(defaults);
    }

    fn volatile_domain_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.read().volatile.keys().cloned().collect();
        names.sort_unstable();
        names
    }

    fn volatile_domain(&self, name: &str) -> Dictionary {
        self.read().volatile.get(name).cloned().unwrap_or_default()
    }

    fn set_volatile_domain(&self, domain: Dictionary, name: &str) {
        self.write().volatile.insert(name.to_owned(), domain);
    }

    fn remove_volatile_domain(&self, name: &str) {
        self.write().volatile.remove(name);
    }

    fn persistent_domain(&self, name: &str) -> Option<Dictionary> {
        self.read().persistent.get(name).cloned()
    }

    fn set_persistent_domain(&self, domain: Dictionary, name: &str) {
        let name = name.to_owned();
        let mut domains = self.write();

        if domain.is_empty() {
            domains.persistent.remove(&name);
        } else {
            domains.persistent.insert(name.clone(), domain.clone());
        }

        self.persist(move |database| database.replace_domain(&name, &domain));
    }

    fn remove_persistent_domain(&self, name: &str) {
        let name = name.to_owned();
        let mut domains = self.write();

        domains.persistent.remove(&name);

        self.persist(move |database| database.remove_domain(&name));
    }

    fn synchronize(&self) -> Result<(), SettingsError> {
        let write_error = self
            .database
            .run_blocking(|database| database.take_write_error())
            .map_err(DatabaseError::from)?;
        match write_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
