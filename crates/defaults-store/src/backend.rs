use crate::{Dictionary, SearchList, SettingsError, Suite, Value};

/// This trait represents the key-value store a [`SettingsStore`](crate::SettingsStore) delegates
/// to. Implementations are shared by every store in the process and must synchronize
/// internally; a store only serializes the calls made through itself.
///
/// Reads consult the domains of a [`SearchList`] in order, then registered defaults. Writes go
/// to the search list's primary domain. Volatile domains live only in process memory;
/// persistent domains reach stable storage, possibly after the call returns.
///
/// [`Defaults`](crate::Defaults) is the implementation shipped with this crate.
pub trait DefaultsBackend: Send + Sync {
    /// Resolve `suite` to a fresh search list, or fail if no domain can be opened for it.
    fn open_domain(&self, suite: &Suite) -> Result<SearchList, SettingsError>;

    /// The first value stored under `key` along the search list, if any.
    fn object(&self, search_list: &SearchList, key: &str) -> Option<Value>;

    /// Store `value` under `key` in the primary domain. `None` removes the key.
    fn set_object(&self, search_list: &SearchList, key: &str, value: Option<Value>);

    /// A merged snapshot of the search list such that looking up any key in it matches
    /// [`DefaultsBackend::object`] at the time of the call.
    fn dictionary_representation(&self, search_list: &SearchList) -> Dictionary;

    /// Merge `defaults` into the registration domain, replacing values already registered
    /// under the same keys.
    fn register_defaults(&self, defaults: Dictionary);

    /// Names of all volatile domains, sorted.
    fn volatile_domain_names(&self) -> Vec<String>;

    /// Contents of a volatile domain, empty if it does not exist.
    fn volatile_domain(&self, name: &str) -> Dictionary;

    /// Replace the contents of a volatile domain.
    fn set_volatile_domain(&self, domain: Dictionary, name: &str);

    /// Remove a volatile domain.
    fn remove_volatile_domain(&self, name: &str);

    /// Contents of a persistent domain, `None` if it holds no values.
    fn persistent_domain(&self, name: &str) -> Option<Dictionary>;

    /// Replace the contents of a persistent domain.
    fn set_persistent_domain(&self, domain: Dictionary, name: &str);

    /// Remove a persistent domain and all of its values.
    fn remove_persistent_domain(&self, name: &str);

    /// Block until every write made so far has reached stable storage. Reports the most recent
    /// write failure since the previous call, if any.
    ///
    /// This blocks the calling thread and must not be called from within an async runtime;
    /// [`SettingsStore::synchronize`](crate::SettingsStore::synchronize) calls it from the
    /// store's own thread.
    fn synchronize(&self) -> Result<(), SettingsError>;
}
