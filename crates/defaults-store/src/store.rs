//! The serialized settings facade.

use std::sync::Arc;

use defaults_threading::SerialRunner;
use serde::{de::DeserializeOwned, Serialize};
use url::Url;

use crate::{
    backend::DefaultsBackend, locator, Dictionary, Key, SearchList, SettingsError, Suite, Value,
};

/// State owned by a store's runner thread.
struct DomainHandle {
    backend: Arc<dyn DefaultsBackend>,
    search_list: SearchList,
}

impl DomainHandle {
    fn object(&self, key: &str) -> Option<Value> {
        self.backend.object(&self.search_list, key)
    }

    fn set_object(&self, key: &str, value: Option<Value>) {
        self.backend.set_object(&self.search_list, key, value);
    }
}

/// Serialized access to one domain of a [`DefaultsBackend`].
///
/// Every operation is queued on a thread owned by the store and executed to completion,
/// including any coercion of the stored value, before the next one starts. Operations issued
/// through the same store (or any of its clones) therefore never interleave. Stores opened
/// separately on the same domain share the backend's data but not this queue.
///
/// Reads and writes never fail. A key that is missing or holds a value of the wrong shape reads
/// as the accessor's default; use [`SettingsStore::object`] to tell the two apart.
///
/// # Example
/// ```rust,no_run
/// use defaults_store::{Defaults, DefaultsSettings, SettingsStore, Suite};
///
/// # async fn example() -> Result<(), defaults_store::SettingsError> {
/// let defaults = Defaults::initialize(DefaultsSettings::default()).await?;
/// let store = SettingsStore::open(defaults, Suite::Named("group.example".into()))?;
///
/// store.set("greeting", "Hello, World!").await;
/// assert_eq!(store.string("greeting").await.as_deref(), Some("Hello, World!"));
/// assert_eq!(store.integer("missing").await, 0);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SettingsStore {
    runner: SerialRunner<DomainHandle>,
    domain: Arc<str>,
}

impl std::fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsStore")
            .field("domain", &self.domain)
            .finish()
    }
}

impl SettingsStore {
    /// Open a store on the domain selected by `suite`.
    ///
    /// [`Suite::Standard`] always succeeds. [`Suite::Named`] fails with
    /// [`SettingsError::DomainUnavailable`] when the backend cannot open a domain for the name.
    pub fn open(backend: Arc<dyn DefaultsBackend>, suite: Suite) -> Result<Self, SettingsError> {
        let search_list = backend.open_domain(&suite)?;
        let domain: Arc<str> = search_list.domain().into();

        let runner = SerialRunner::new(
            "settings-store",
            DomainHandle {
                backend,
                search_list,
            },
        )?;
        log::debug!("Opened settings store for domain '{domain}'");

        Ok(SettingsStore { runner, domain })
    }

    /// The primary domain this store reads and writes.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Run `function` on the store's thread. A call that cannot deliver its result is logged
    /// and reads as the default of its output type.
    async fn call<F, Output>(&self, function: F) -> Output
    where
        F: FnOnce(&mut DomainHandle) -> Output + Send + 'static,
        Output: Default + Send + 'static,
    {
        match self.runner.run(function).await {
            Ok(output) => output,
            Err(e) => {
                log::error!("Settings store call on '{}' failed: {e}", self.domain);
                Output::default()
            }
        }
    }

    async fn read<F, Output>(&self, key: &str, coerce: F) -> Output
    where
        F: FnOnce(Value) -> Output + Send + 'static,
        Output: Default + Send + 'static,
    {
        let key = key.to_owned();
        self.call(move |handle| handle.object(&key).map(coerce).unwrap_or_default())
            .await
    }

    // Generic accessors

    /// The stored value, without coercion. `None` if the key is unset everywhere in the search
    /// list.
    pub async fn object(&self, key: &str) -> Option<Value> {
        let key = key.to_owned();
        self.call(move |handle| handle.object(&key)).await
    }

    /// Store `value` under `key`, replacing any previous value and its type. `None` removes the
    /// key.
    ///
    /// The value is visible to every store in the process when this returns; it reaches stable
    /// storage afterwards.
    pub async fn set_object(&self, key: &str, value: Option<Value>) {
        let key = key.to_owned();
        self.call(move |handle| handle.set_object(&key, value)).await;
    }

    /// Store anything convertible into a [`Value`] under `key`.
    pub async fn set(&self, key: &str, value: impl Into<Value>) {
        self.set_object(key, Some(value.into())).await;
    }

    /// Equivalent to `set_object(key, None)`.
    pub async fn remove_object(&self, key: &str) {
        self.set_object(key, None).await;
    }

    // Typed accessors

    /// The value as a string. Numbers are converted to their text; other shapes are `None`.
    pub async fn string(&self, key: &str) -> Option<String> {
        self.read(key, |value| value.coerce_string()).await
    }

    /// The value if it is an array, otherwise `None`.
    pub async fn array(&self, key: &str) -> Option<Vec<Value>> {
        self.read(key, Value::into_array).await
    }

    /// The value if it is a dictionary, otherwise `None`.
    pub async fn dictionary(&self, key: &str) -> Option<Dictionary> {
        self.read(key, Value::into_dictionary).await
    }

    /// The value if it is a byte sequence, otherwise `None`.
    pub async fn data(&self, key: &str) -> Option<Vec<u8>> {
        self.read(key, Value::into_data).await
    }

    /// The value if it is an array containing only strings, otherwise `None`. Numbers are not
    /// converted.
    pub async fn string_array(&self, key: &str) -> Option<Vec<String>> {
        self.read(key, Value::into_string_array).await
    }

    /// The value as an integer, `0` if absent or not convertible.
    ///
    /// Numbers convert directly, booleans become `1` or `0` and strings are parsed.
    pub async fn integer(&self, key: &str) -> i64 {
        self.read(key, |value| value.coerce_integer()).await
    }

    /// The value as a single precision float, `0.0` if absent or not convertible. Booleans are
    /// not converted.
    pub async fn float(&self, key: &str) -> f32 {
        self.read(key, |value| value.coerce_float()).await
    }

    /// The value as a double precision float, `0.0` if absent or not convertible. Booleans are
    /// not converted.
    pub async fn double(&self, key: &str) -> f64 {
        self.read(key, |value| value.coerce_double()).await
    }

    /// The value as a boolean, `false` if absent or not convertible.
    ///
    /// Nonzero numbers are `true`; strings are `true` for `"YES"`, `"true"` or a nonzero integer.
    pub async fn bool(&self, key: &str) -> bool {
        self.read(key, |value| value.coerce_bool()).await
    }

    /// The value as a URL.
    ///
    /// A string is treated as a file path and converted to a file URL. A value written with
    /// [`SettingsStore::set_url`] is decoded. Anything else is `None`.
    pub async fn url(&self, key: &str) -> Option<Url> {
        self.read(key, |value| value.coerce_url()).await
    }

    /// Store an integer.
    pub async fn set_integer(&self, key: &str, value: i64) {
        self.set(key, value).await;
    }

    /// Store a single precision float.
    pub async fn set_float(&self, key: &str, value: f32) {
        self.set(key, value).await;
    }

    /// Store a double precision float.
    pub async fn set_double(&self, key: &str, value: f64) {
        self.set(key, value).await;
    }

    /// Store a boolean.
    pub async fn set_bool(&self, key: &str, value: bool) {
        self.set(key, value).await;
    }

    /// Store a URL in archived form, readable only through [`SettingsStore::url`]. `None`
    /// removes the key.
    pub async fn set_url(&self, key: &str, url: Option<&Url>) {
        self.set_object(key, url.map(locator::archive)).await;
    }

    // Typed keys

    /// Get a value using a type-safe key.
    ///
    /// Returns `None` if the key doesn't exist or if deserialization fails.
    /// Deserialization errors are logged but do not propagate.
    pub async fn value<T>(&self, key: Key<T>) -> Option<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let name = key.name();
        self.read(name, move |value| {
            match serde_json::from_value::<T>(value.into_json()) {
                Ok(value) => Some(value),
                Err(e) => {
                    log::warn!("Failed to deserialize setting '{name}': {e:?}");
                    None
                }
            }
        })
        .await
    }

    /// Set a value using a type-safe key. A value that serializes to `null` removes the key.
    ///
    /// Fails with [`SettingsError::Unrepresentable`], leaving the stored value untouched, when
    /// the JSON form contains `null` inside an array.
    pub async fn set_value<T: Serialize>(&self, key: Key<T>, value: T) -> Result<(), SettingsError> {
        let json_value = serde_json::to_value(&value)?;
        let value = match json_value {
            serde_json::Value::Null => None,
            json_value => Some(
                Value::from_json(json_value)
                    .ok_or(SettingsError::Unrepresentable { key: key.name() })?,
            ),
        };
        self.set_object(key.name(), value).await;
        Ok(())
    }

    /// Remove a value using a type-safe key.
    pub async fn remove_value<T>(&self, key: Key<T>) {
        self.remove_object(key.name()).await;
    }

    // Domain composition

    /// Register fallback values consulted after every domain in the search list.
    ///
    /// Registered defaults are shared by the whole process and are never persisted.
    pub async fn register_defaults(&self, defaults: Dictionary) {
        self.call(move |handle| handle.backend.register_defaults(defaults))
            .await;
    }

    /// Consult the domain `name` after this store's own domain and before the global domain.
    ///
    /// Reserved domain names, this store's own domain and suites already added are ignored.
    pub async fn add_suite(&self, name: &str) {
        let name = name.to_owned();
        self.call(move |handle| {
            if !handle.search_list.add_suite(&name) {
                log::warn!(
                    "Ignoring suite '{name}' for '{}': reserved, primary or already added",
                    handle.search_list.domain()
                );
            }
        })
        .await;
    }

    /// Stop consulting a suite added with [`SettingsStore::add_suite`].
    pub async fn remove_suite(&self, name: &str) {
        let name = name.to_owned();
        self.call(move |handle| {
            handle.search_list.remove_suite(&name);
        })
        .await;
    }

    /// Suites currently consulted after this store's own domain, in lookup order.
    pub async fn suites(&self) -> Vec<String> {
        self.call(|handle| handle.search_list.suites().to_vec())
            .await
    }

    /// A snapshot of every key visible through this store, such that looking up a key in it
    /// yields what [`SettingsStore::object`] returns at the time of the call.
    pub async fn dictionary_representation(&self) -> Dictionary {
        self.call(|handle| handle.backend.dictionary_representation(&handle.search_list))
            .await
    }

    // Whole domains

    /// Names of all volatile domains.
    pub async fn volatile_domain_names(&self) -> Vec<String> {
        self.call(|handle| handle.backend.volatile_domain_names())
            .await
    }

    /// Contents of the volatile domain `name`, empty if it does not exist.
    pub async fn volatile_domain(&self, name: &str) -> Dictionary {
        let name = name.to_owned();
        self.call(move |handle| handle.backend.volatile_domain(&name))
            .await
    }

    /// Replace the contents of the volatile domain `name`. Volatile domains are never persisted.
    pub async fn set_volatile_domain(&self, domain: Dictionary, name: &str) {
        let name = name.to_owned();
        self.call(move |handle| handle.backend.set_volatile_domain(domain, &name))
            .await;
    }

    /// Remove the volatile domain `name`.
    pub async fn remove_volatile_domain(&self, name: &str) {
        let name = name.to_owned();
        self.call(move |handle| handle.backend.remove_volatile_domain(&name))
            .await;
    }

    /// Contents of the persistent domain `name`, `None` if it holds no values.
    pub async fn persistent_domain(&self, name: &str) -> Option<Dictionary> {
        let name = name.to_owned();
        self.call(move |handle| handle.backend.persistent_domain(&name))
            .await
    }

    /// Replace every value in the persistent domain `name`. The change is persisted.
    pub async fn set_persistent_domain(&self, domain: Dictionary, name: &str) {
        let name = name.to_owned();
        self.call(move |handle| handle.backend.set_persistent_domain(domain, &name))
            .await;
    }

    /// Remove every value from the persistent domain `name`. The change is persisted.
    pub async fn remove_persistent_domain(&self, name: &str) {
        let name = name.to_owned();
        self.call(move |handle| handle.backend.remove_persistent_domain(&name))
            .await;
    }

    // Durability

    /// Wait until every change made before this call has reached stable storage.
    ///
    /// Returns the most recent persistence failure since the previous synchronize, if any.
    pub async fn synchronize(&self) -> Result<(), SettingsError> {
        self.runner
            .run(|handle| handle.backend.synchronize())
            .await?
    }
}
