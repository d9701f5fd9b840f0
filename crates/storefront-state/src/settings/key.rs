//! Type-safe keys for settings storage.

use std::marker::PhantomData;

/// Register a type-safe settings key.
///
/// This macro is the primary way to create settings keys. It associates
/// a string key name with a value type at compile time.
///
/// # Example
/// ```rust
/// use storefront_state::register_setting_key;
///
/// register_setting_key!(pub const ACCESS_TOKEN: String = "access_token");
/// ```
#[macro_export]
macro_rules! register_setting_key {
    ($vis:vis const $name:ident: $ty:ty = $key:literal) => {
        $vis const $name: $crate::settings::Key<$ty> = $crate::settings::Key::new($key);
    };
}

/// Type-safe key for settings storage.
///
/// Associates a string key name with a value type at compile time,
/// preventing type mismatches while maintaining ergonomic usage.
///
/// Use the [`register_setting_key!`](crate::register_setting_key) macro to create keys.
#[derive(Debug)]
pub struct Key<T> {
    pub(crate) name: &'static str,
    _marker: PhantomData<fn() -> T>,
}

// Manual impls so that keys stay `Copy` regardless of the value type.
impl<T> Clone for Key<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Key<T> {}

impl<T> Key<T> {
    /// Create a new type-safe key with the given storage name.
    #[doc(hidden)]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    /// The storage name of this key.
    pub fn name(&self) -> &'static str {
        self.name
    }
}
