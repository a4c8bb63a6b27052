//! Sorted-vector maps: [`FlatMap`] (unique keys) and [`FlatMultiMap`].
//!
//! Entries are `(K, V)` pairs kept in key order inside a storage backend, so
//! iteration is always sorted and lookups are binary searches. Aliases pick
//! the backend:
//!
//! | Alias | Storage | Beyond `N` entries |
//! |-------|---------|--------------------|
//! | [`SmallFlatMap<K, V, N>`] | `HybridStorage` | spills to the heap |
//! | [`StaticFlatMap<K, V, N>`] | `InlineStorage` | precondition failure (panic) |
//!
//! Lookups accept any `Q` the key [`Borrow`]s as, so a
//! `SmallFlatMap<String, _, N>` is searched with `&str`.

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::ops::{Index, Range};
use core::slice;

use super::flat_tree::{FlatTree, MapKey};
use crate::error::{CollectionError, Result, infallible};
use crate::storage::{HybridStorage, InlineStorage, IntoIter, Storage};
use crate::utils::alloc::Global;
use crate::utils::compare::{Compare, Natural};

/// An ordered map with unique keys stored in a sorted buffer.
pub struct FlatMap<S: Storage, C = Natural> {
    tree: FlatTree<S, MapKey, C>,
}

/// Inline-first flat map that spills to the heap.
pub type SmallFlatMap<K, V, const N: usize, C = Natural, A = Global> =
    FlatMap<HybridStorage<(K, V), N, A>, C>;

/// Fixed-capacity flat map that never allocates.
pub type StaticFlatMap<K, V, const N: usize, C = Natural> = FlatMap<InlineStorage<(K, V), N>, C>;

/// An ordered map allowing equivalent keys, stored in a sorted buffer.
pub struct FlatMultiMap<S: Storage, C = Natural> {
    tree: FlatTree<S, MapKey, C>,
}

pub type SmallFlatMultiMap<K, V, const N: usize, C = Natural, A = Global> =
    FlatMultiMap<HybridStorage<(K, V), N, A>, C>;

pub type StaticFlatMultiMap<K, V, const N: usize, C = Natural> =
    FlatMultiMap<InlineStorage<(K, V), N>, C>;

#[inline]
fn check_room<S: Storage>(storage: &S) {
    debug_assert!(
        S::GROWABLE || !storage.is_full(),
        "fixed capacity of {} elements exhausted",
        storage.capacity()
    );
}

macro_rules! flat_map_common {
    ($name:ident) => {
        impl<K, V, S, C> $name<S, C>
        where
            S: Storage<Item = (K, V)> + Default,
            C: Compare<K> + Default,
        {
            /// Creates an empty map. No allocation occurs.
            pub fn new() -> Self {
                Self {
                    tree: FlatTree::new(),
                }
            }
        }

        impl<K, V, S, C> $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
            /// Creates an empty map over `storage` ordered by `cmp`.
            ///
            /// # Panics
            /// Panics if `storage` is not empty.
            pub fn with_storage(storage: S, cmp: C) -> Self {
                assert!(storage.is_empty(), "storage must be empty");
                Self {
                    tree: FlatTree::with_parts(storage, cmp),
                }
            }

            #[inline]
            pub fn len(&self) -> usize {
                self.tree.len()
            }

            #[inline]
            pub fn is_empty(&self) -> bool {
                self.tree.is_empty()
            }

            #[inline]
            pub fn capacity(&self) -> usize {
                self.tree.capacity()
            }

            /// Entries that fit before the next growth (static maps: at all).
            #[inline]
            pub fn available(&self) -> usize {
                self.tree.available()
            }

            #[inline]
            pub fn is_full(&self) -> bool {
                self.tree.is_full()
            }

            /// `true` while the entries live in the inline slots.
            #[inline]
            pub fn is_inline(&self) -> bool {
                self.tree.is_inline()
            }

            pub fn comparator(&self) -> &C {
                self.tree.comparator()
            }

            pub fn clear(&mut self) {
                self.tree.clear();
            }

            pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
                self.tree.try_reserve(additional)
            }

            pub fn reserve(&mut self, additional: usize) {
                infallible(self.tree.try_reserve(additional))
            }

            pub fn shrink_to_fit(&mut self) {
                self.tree.shrink_to_fit();
            }

            /// Entries in key order.
            #[inline]
            pub fn as_slice(&self) -> &[(K, V)] {
                self.tree.as_slice()
            }

            pub fn iter(&self) -> Iter<'_, K, V> {
                Iter {
                    inner: self.tree.as_slice().iter(),
                }
            }

            pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
                IterMut {
                    inner: self.tree.as_mut_slice().iter_mut(),
                }
            }

            pub fn keys<'a>(&'a self) -> impl DoubleEndedIterator<Item = &'a K> + ExactSizeIterator
            where
                K: 'a,
                V: 'a,
            {
                self.tree.as_slice().iter().map(|(k, _)| k)
            }

            pub fn values<'a>(&'a self) -> impl DoubleEndedIterator<Item = &'a V> + ExactSizeIterator
            where
                K: 'a,
                V: 'a,
            {
                self.tree.as_slice().iter().map(|(_, v)| v)
            }

            pub fn values_mut<'a>(
                &'a mut self,
            ) -> impl DoubleEndedIterator<Item = &'a mut V> + ExactSizeIterator
            where
                K: 'a,
                V: 'a,
            {
                self.tree.as_mut_slice().iter_mut().map(|(_, v)| v)
            }

            pub fn first(&self) -> Option<(&K, &V)> {
                self.tree.as_slice().first().map(|(k, v)| (k, v))
            }

            pub fn last(&self) -> Option<(&K, &V)> {
                self.tree.as_slice().last().map(|(k, v)| (k, v))
            }

            /// The entry at sorted position `index`.
            pub fn get_index(&self, index: usize) -> Option<(&K, &V)> {
                self.tree.as_slice().get(index).map(|(k, v)| (k, v))
            }

            pub fn contains_key<Q>(&self, key: &Q) -> bool
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.find(key).is_some()
            }

            /// Sorted position of the first entry for `key`.
            pub fn index_of<Q>(&self, key: &Q) -> Option<usize>
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.find(key)
            }

            pub fn lower_bound<Q>(&self, key: &Q) -> usize
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.lower_bound(key)
            }

            pub fn upper_bound<Q>(&self, key: &Q) -> usize
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.upper_bound(key)
            }

            pub fn equal_range<Q>(&self, key: &Q) -> Range<usize>
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.equal_range(key)
            }

            pub fn count<Q>(&self, key: &Q) -> usize
            where
                K: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.count(key)
            }

            /// Removes and returns the entry at sorted position `index`.
            ///
            /// # Panics
            /// Panics if `index >= len`.
            pub fn remove_at(&mut self, index: usize) -> (K, V) {
                self.tree.remove_at(index)
            }

            /// Drops the entries at sorted positions `range`.
            pub fn remove_range(&mut self, range: Range<usize>) {
                self.tree.remove_range(range);
            }

            /// Keeps only the entries for which `f` returns `true`.
            pub fn retain<F>(&mut self, mut f: F)
            where
                F: FnMut(&K, &mut V) -> bool,
            {
                self.tree.retain(|(k, v)| f(k, v));
            }
        }

        impl<K, V, S, C> Clone for $name<S, C>
        where
            S: Storage<Item = (K, V)> + Clone,
            C: Clone,
        {
            fn clone(&self) -> Self {
                Self {
                    tree: self.tree.clone(),
                }
            }

            fn clone_from(&mut self, source: &Self) {
                self.tree.clone_from(&source.tree);
            }
        }

        impl<K, V, S, C> Default for $name<S, C>
        where
            S: Storage<Item = (K, V)> + Default,
            C: Compare<K> + Default,
        {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<K: fmt::Debug, V: fmt::Debug, S, C> fmt::Debug for $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_map().entries(self.iter()).finish()
            }
        }

        /// Element-wise and order-sensitive.
        impl<K: PartialEq, V: PartialEq, S, C> PartialEq for $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
            fn eq(&self, other: &Self) -> bool {
                self.as_slice() == other.as_slice()
            }
        }

        impl<K: Eq, V: Eq, S, C> Eq for $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
        }

        impl<K: PartialOrd, V: PartialOrd, S, C> PartialOrd for $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                self.as_slice().partial_cmp(other.as_slice())
            }
        }

        impl<K: Ord, V: Ord, S, C> Ord for $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
            fn cmp(&self, other: &Self) -> Ordering {
                self.as_slice().cmp(other.as_slice())
            }
        }

        impl<K: Hash, V: Hash, S, C> Hash for $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.as_slice().hash(state);
            }
        }

        impl<K, V, S, C> FromIterator<(K, V)> for $name<S, C>
        where
            S: Storage<Item = (K, V)> + Default,
            C: Compare<K> + Default,
        {
            fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
                let mut map = Self::new();
                map.extend(iter);
                map
            }
        }

        impl<K, V, S, C> IntoIterator for $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
            type Item = (K, V);
            type IntoIter = IntoIter<S>;

            fn into_iter(self) -> Self::IntoIter {
                self.tree.into_values()
            }
        }

        impl<'a, K: 'a, V: 'a, S, C> IntoIterator for &'a $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
            type Item = (&'a K, &'a V);
            type IntoIter = Iter<'a, K, V>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }

        impl<'a, K: 'a, V: 'a, S, C> IntoIterator for &'a mut $name<S, C>
        where
            S: Storage<Item = (K, V)>,
            C: Compare<K>,
        {
            type Item = (&'a K, &'a mut V);
            type IntoIter = IterMut<'a, K, V>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter_mut()
            }
        }
    };
}

flat_map_common!(FlatMap);
flat_map_common!(FlatMultiMap);

impl<K, V, S, C> FlatMap<S, C>
where
    S: Storage<Item = (K, V)>,
    C: Compare<K>,
{
    #[inline]
    fn value_at<'a>(&'a mut self, pos: usize) -> &'a mut V
    where
        K: 'a,
        V: 'a,
    {
        &mut self.tree.as_mut_slice()[pos].1
    }

    pub fn get<'a, Q>(&'a self, key: &Q) -> Option<&'a V>
    where
        K: Borrow<Q> + 'a,
        V: 'a,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let pos = self.tree.find(key)?;
        Some(&self.tree.as_slice()[pos].1)
    }

    pub fn get_mut<'a, Q>(&'a mut self, key: &Q) -> Option<&'a mut V>
    where
        K: Borrow<Q> + 'a,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let pos = self.tree.find(key)?;
        Some(self.value_at(pos))
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let pos = self.tree.find(key)?;
        let (k, v) = &self.tree.as_slice()[pos];
        Some((k, v))
    }

    /// Checked lookup: [`KeyNotFound`](CollectionError::KeyNotFound) if absent.
    pub fn at<'a, Q>(&'a self, key: &Q) -> Result<&'a V>
    where
        K: Borrow<Q> + 'a,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.get(key).ok_or(CollectionError::KeyNotFound)
    }

    pub fn at_mut<'a, Q>(&'a mut self, key: &Q) -> Result<&'a mut V>
    where
        K: Borrow<Q> + 'a,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.get_mut(key).ok_or(CollectionError::KeyNotFound)
    }

    /// Inserts `(key, value)` unless `key` is present.
    ///
    /// An existing value is **not** overwritten; the new pair is dropped.
    /// Returns the stored value and whether the insert happened.
    pub fn try_insert<'a>(&'a mut self, key: K, value: V) -> Result<(&'a mut V, bool)>
    where
        K: 'a,
    {
        let (pos, inserted) = self.tree.try_insert_unique((key, value))?;
        Ok((self.value_at(pos), inserted))
    }

    pub fn insert<'a>(&'a mut self, key: K, value: V) -> (&'a mut V, bool)
    where
        K: 'a,
    {
        if !self.contains_key(&key) {
            check_room(self.tree.storage());
        }
        infallible(self.try_insert(key, value))
    }

    /// Inserts `(key, value)`, overwriting the value of an existing key.
    ///
    /// Returns the stored value and `true` if the key was new.
    pub fn try_insert_or_assign<'a>(&'a mut self, key: K, value: V) -> Result<(&'a mut V, bool)>
    where
        K: 'a,
    {
        match self.tree.search(&key) {
            Ok(pos) => {
                let slot = self.value_at(pos);
                *slot = value;
                Ok((slot, false))
            }
            Err(pos) => {
                let pos = self.tree.try_emplace_at(pos, || (key, value))?;
                Ok((self.value_at(pos), true))
            }
        }
    }

    pub fn insert_or_assign<'a>(&'a mut self, key: K, value: V) -> (&'a mut V, bool)
    where
        K: 'a,
    {
        if !self.contains_key(&key) {
            check_room(self.tree.storage());
        }
        infallible(self.try_insert_or_assign(key, value))
    }

    /// Inserts `(key, make())` only if `key` is absent; `make` is not called otherwise.
    ///
    /// If `make` panics the map is unchanged.
    pub fn try_emplace<'a, F>(&'a mut self, key: K, make: F) -> Result<(&'a mut V, bool)>
    where
        K: 'a,
        F: FnOnce() -> V,
    {
        match self.tree.search(&key) {
            Ok(pos) => Ok((self.value_at(pos), false)),
            Err(pos) => {
                let pos = self.tree.try_emplace_at(pos, || (key, make()))?;
                Ok((self.value_at(pos), true))
            }
        }
    }

    pub fn emplace<'a, F>(&'a mut self, key: K, make: F) -> (&'a mut V, bool)
    where
        K: 'a,
        F: FnOnce() -> V,
    {
        if !self.contains_key(&key) {
            check_room(self.tree.storage());
        }
        infallible(self.try_emplace(key, make))
    }

    /// Returns the value for `key`, inserting `V::default()` first if absent.
    pub fn entry_or_default<'a>(&'a mut self, key: K) -> &'a mut V
    where
        K: 'a,
        V: Default,
    {
        self.emplace(key, V::default).0
    }

    /// Unique insert that tries the position next to `hint` before searching.
    ///
    /// Returns the sorted position of the new or existing entry.
    pub fn try_insert_hint(&mut self, hint: usize, key: K, value: V) -> Result<(usize, bool)> {
        self.tree.try_insert_unique_hint(hint, (key, value))
    }

    pub fn insert_hint(&mut self, hint: usize, key: K, value: V) -> (usize, bool) {
        infallible(self.try_insert_hint(hint, key, value))
    }

    /// Inserts at sorted position `index` without searching.
    ///
    /// The caller guarantees `index` is where `key` belongs and that `key` is
    /// not present. Debug builds check it.
    pub fn try_insert_exactly_at(&mut self, index: usize, key: K, value: V) -> Result<usize> {
        self.tree.try_insert_exactly_at(index, (key, value), true)
    }

    pub fn insert_exactly_at(&mut self, index: usize, key: K, value: V) -> usize {
        check_room(self.tree.storage());
        infallible(self.try_insert_exactly_at(index, key, value))
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.remove_unique(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.remove_unique(key)
    }

    /// Erases the entry for `key`; returns how many were erased (0 or 1).
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.erase_key_unique(key)
    }
}

impl<K, V, S, C> Extend<(K, V)> for FlatMap<S, C>
where
    S: Storage<Item = (K, V)>,
    C: Compare<K>,
{
    /// Keeps the first value seen for each key. Sorted input appends in O(1).
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let len = self.len();
            if !self.contains_key(&k) {
                check_room(self.tree.storage());
            }
            infallible(self.tree.try_insert_unique_hint(len, (k, v)));
        }
    }
}

impl<K, V, S, C, Q> Index<&Q> for FlatMap<S, C>
where
    S: Storage<Item = (K, V)>,
    K: Borrow<Q>,
    C: Compare<K> + Compare<Q>,
    Q: ?Sized,
{
    type Output = V;

    /// # Panics
    /// Panics if the key is not present.
    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(v) => v,
            None => panic!("no entry found for key"),
        }
    }
}

impl<K, V, S, C> FlatMultiMap<S, C>
where
    S: Storage<Item = (K, V)>,
    C: Compare<K>,
{
    /// Inserts after any entries with an equivalent key; returns the position.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<usize> {
        self.tree.try_insert_multi((key, value))
    }

    pub fn insert(&mut self, key: K, value: V) -> usize {
        check_room(self.tree.storage());
        infallible(self.try_insert(key, value))
    }

    /// Inserts at `hint` when that keeps the order, else after equivalent keys.
    pub fn insert_hint(&mut self, hint: usize, key: K, value: V) -> usize {
        check_room(self.tree.storage());
        infallible(self.tree.try_insert_multi_hint(hint, (key, value)))
    }

    /// Inserts at sorted position `index` without searching (debug-checked).
    pub fn insert_exactly_at(&mut self, index: usize, key: K, value: V) -> usize {
        check_room(self.tree.storage());
        infallible(self.tree.try_insert_exactly_at(index, (key, value), false))
    }

    /// The first value stored for `key`.
    pub fn get<'a, Q>(&'a self, key: &Q) -> Option<&'a V>
    where
        K: Borrow<Q> + 'a,
        V: 'a,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let pos = self.tree.find(key)?;
        Some(&self.tree.as_slice()[pos].1)
    }

    /// All entries for `key`, in insertion order.
    pub fn get_all<Q>(&self, key: &Q) -> &[(K, V)]
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        &self.tree.as_slice()[self.tree.equal_range(key)]
    }

    /// Erases every entry for `key`; returns how many were erased.
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.erase_key_multi(key)
    }
}

impl<K, V, S, C> Extend<(K, V)> for FlatMultiMap<S, C>
where
    S: Storage<Item = (K, V)>,
    C: Compare<K>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            let len = self.len();
            check_room(self.tree.storage());
            infallible(self.tree.try_insert_multi_hint(len, (k, v)));
        }
    }
}

/// Iterator over `(&K, &V)` in key order.
pub struct Iter<'a, K, V> {
    inner: slice::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (k, v))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Iterator over `(&K, &mut V)` in key order.
pub struct IterMut<'a, K, V> {
    inner: slice::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (&*k, v))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}
