//! Key extraction shared by the sorted and hashed engines.
//!
//! Both engines store whole values (`T` for sets, `(K, V)` for maps) and
//! order or hash them by the part [`KeyOf`] selects.

/// Extracts the lookup key from a stored value.
pub trait KeyOf<T> {
    type Key;

    fn key(value: &T) -> &Self::Key;
}

/// The value is its own key (sets).
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T> KeyOf<T> for Identity {
    type Key = T;

    #[inline(always)]
    fn key(value: &T) -> &T {
        value
    }
}

/// The key is the first half of a `(K, V)` pair (maps).
#[derive(Debug, Clone, Copy, Default)]
pub struct MapKey;

impl<K, V> KeyOf<(K, V)> for MapKey {
    type Key = K;

    #[inline(always)]
    fn key(value: &(K, V)) -> &K {
        &value.0
    }
}
