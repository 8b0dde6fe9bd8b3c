//! Keys that carry the type of the setting stored under them.

use std::marker::PhantomData;

/// The name of a setting together with the Rust type it holds.
///
/// A typed key is read and written with [`SettingsStore::value`](crate::SettingsStore::value),
/// [`SettingsStore::set_value`](crate::SettingsStore::set_value) and
/// [`SettingsStore::remove_value`](crate::SettingsStore::remove_value). The value goes through
/// its JSON form and is stored as an ordinary [`Value`](crate::Value), so the untyped accessors
/// see it too: a struct reads back from [`SettingsStore::dictionary`](crate::SettingsStore::dictionary)
/// as a dictionary of its fields.
///
/// Keys are usually declared as constants with [`register_setting_key!`](crate::register_setting_key):
///
/// ```rust
/// use defaults_store::{register_setting_key, Key};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct WindowState {
///     width: u32,
///     maximized: bool,
/// }
///
/// register_setting_key!(pub const WINDOW: WindowState = "window_state");
///
/// // The same key written out by hand.
/// const WINDOW_BY_HAND: Key<WindowState> = Key::new("window_state");
/// assert_eq!(WINDOW.name(), WINDOW_BY_HAND.name());
/// ```
#[derive(Debug)]
pub struct Key<T> {
    name: &'static str,
    value_type: PhantomData<fn() -> T>,
}

impl<T> Key<T> {
    /// A key stored under `name`.
    pub const fn new(name: &'static str) -> Self {
        Key {
            name,
            value_type: PhantomData,
        }
    }

    /// The key name in the store.
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

// `T` is only a marker, so keys copy regardless of it.
impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

/// Declare a [`Key`](crate::Key) constant: `register_setting_key!(vis const NAME: Type = "name");`
#[macro_export]
macro_rules! register_setting_key {
    ($vis:vis const $name:ident: $ty:ty = $key:literal) => {
        $vis const $name: $crate::Key<$ty> = $crate::Key::new($key);
    };
}
