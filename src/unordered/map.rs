//! Hash maps: [`UnorderedMap`] (unique keys) and [`UnorderedMultiMap`].
//!
//! Entries are `(K, V)` pairs stored in table nodes. Iteration order is
//! unspecified; entries with equal keys in a multimap are adjacent.

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::ops::Index;

use fnv::FnvBuildHasher;

use super::iter::{RawIntoIter, RawIter, RawIterMut};
use super::node_pool::NodeId;
use super::policy::{BucketPolicy, PowerOfTwo, StaticBuckets};
use super::table::HashTable;
use crate::error::{CollectionError, Result, infallible};
use crate::utils::alloc::{ContainerAlloc, Global};
use crate::utils::key_of::MapKey;

/// A hash map with unique keys.
pub struct UnorderedMap<K, V, P, const NB: usize, const NN: usize, S = FnvBuildHasher, A: ContainerAlloc = Global> {
    table: HashTable<(K, V), MapKey, P, NB, NN, S, A>,
}

/// `N` inline buckets and nodes, then growth on the heap.
pub type SmallUnorderedMap<K, V, const N: usize, S = FnvBuildHasher, A = Global> =
    UnorderedMap<K, V, PowerOfTwo, N, N, S, A>;

/// At most `CAP` entries spread over exactly `NB` buckets; never allocates.
pub type StaticUnorderedMap<K, V, const CAP: usize, const NB: usize, S = FnvBuildHasher> =
    UnorderedMap<K, V, StaticBuckets<NB>, NB, CAP, S, Global>;

/// Everything on the heap from the first insert.
pub type HeapUnorderedMap<K, V, S = FnvBuildHasher, A = Global> =
    UnorderedMap<K, V, PowerOfTwo, 0, 0, S, A>;

/// A hash map that keeps every inserted entry, equal keys included.
pub struct UnorderedMultiMap<K, V, P, const NB: usize, const NN: usize, S = FnvBuildHasher, A: ContainerAlloc = Global> {
    table: HashTable<(K, V), MapKey, P, NB, NN, S, A>,
}

pub type SmallUnorderedMultiMap<K, V, const N: usize, S = FnvBuildHasher, A = Global> =
    UnorderedMultiMap<K, V, PowerOfTwo, N, N, S, A>;

pub type StaticUnorderedMultiMap<K, V, const CAP: usize, const NB: usize, S = FnvBuildHasher> =
    UnorderedMultiMap<K, V, StaticBuckets<NB>, NB, CAP, S, Global>;

pub type HeapUnorderedMultiMap<K, V, S = FnvBuildHasher, A = Global> =
    UnorderedMultiMap<K, V, PowerOfTwo, 0, 0, S, A>;

pub type IntoIter<K, V, const NB: usize, const NN: usize, A = Global> = RawIntoIter<(K, V), NB, NN, A>;

macro_rules! unordered_map_common {
    ($name:ident) => {
        impl<K, V, P, const NB: usize, const NN: usize, S, A> $name<K, V, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            S: Default,
            A: ContainerAlloc + Default,
        {
            /// Creates an empty map. No allocation occurs.
            pub fn new() -> Self {
                Self::with_hasher_in(S::default(), A::default())
            }

            /// Creates a map with room for `capacity` entries.
            pub fn with_capacity(capacity: usize) -> Self {
                let mut map = Self::new();
                map.reserve(capacity);
                map
            }
        }

        impl<K, V, P, const NB: usize, const NN: usize, S, A> $name<K, V, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            A: ContainerAlloc,
        {
            pub fn with_hasher_in(hasher: S, alloc: A) -> Self {
                Self {
                    table: HashTable::with_hasher_in(hasher, alloc),
                }
            }

            super::table_capacity_api!();

            pub fn iter(&self) -> Iter<'_, K, V, NN, A> {
                Iter {
                    inner: self.table.iter(),
                }
            }

            pub fn iter_mut(&mut self) -> IterMut<'_, K, V, NN, A> {
                IterMut {
                    inner: self.table.iter_mut(),
                }
            }

            pub fn keys(&self) -> impl ExactSizeIterator<Item = &K> {
                self.iter().map(|(k, _)| k)
            }

            pub fn values(&self) -> impl ExactSizeIterator<Item = &V> {
                self.iter().map(|(_, v)| v)
            }

            pub fn values_mut(&mut self) -> impl ExactSizeIterator<Item = &mut V> {
                self.iter_mut().map(|(_, v)| v)
            }

            /// Entries chained in `bucket`.
            ///
            /// # Panics
            /// Panics if `bucket >= bucket_count()`.
            pub fn bucket_iter(&self, bucket: usize) -> impl Iterator<Item = (&K, &V)> {
                self.table.local_iter(bucket).map(|(k, v)| (k, v))
            }

            /// The entry behind a handle from [`find_id`](Self::find_id) or an insert.
            pub fn get_by_id(&self, id: NodeId) -> Option<(&K, &V)> {
                self.table.get_id(id).map(|(k, v)| (k, v))
            }

            pub fn get_by_id_mut(&mut self, id: NodeId) -> Option<(&K, &mut V)> {
                self.table.get_id_mut(id).map(|(k, v)| (&*k, v))
            }

            pub fn remove_by_id(&mut self, id: NodeId) -> Option<(K, V)> {
                self.table.remove_id(id)
            }

            /// Keeps only the entries for which `f` returns `true`.
            pub fn retain<F>(&mut self, mut f: F)
            where
                F: FnMut(&K, &mut V) -> bool,
            {
                self.table.retain(|(k, v)| f(&*k, v));
            }

            /// `true` if every entry sits in the bucket its key hashes to.
            pub fn is_partitioned(&self) -> bool {
                self.table.is_partitioned()
            }
        }

        impl<K, V, P, const NB: usize, const NN: usize, S, A> $name<K, V, P, NB, NN, S, A>
        where
            K: Hash + Eq,
            P: BucketPolicy,
            S: BuildHasher,
            A: ContainerAlloc,
        {
            pub fn contains_key<Q>(&self, key: &Q) -> bool
            where
                K: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.find(key).is_some()
            }

            /// Handle of the (first) entry for `key`.
            pub fn find_id<Q>(&self, key: &Q) -> Option<NodeId>
            where
                K: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.find(key)
            }

            /// The (first) value for `key`.
            pub fn get<Q>(&self, key: &Q) -> Option<&V>
            where
                K: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.get(key).map(|(_, v)| v)
            }

            pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
            where
                K: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.get_mut(key).map(|(_, v)| v)
            }

            pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
            where
                K: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.get(key).map(|(k, v)| (k, v))
            }

            /// Bucket that `key` hashes to.
            ///
            /// # Panics
            /// Panics if the map has no buckets yet.
            pub fn bucket<Q>(&self, key: &Q) -> usize
            where
                K: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.bucket(key)
            }
        }

        impl<K, V, P, const NB: usize, const NN: usize, S, A> Clone for $name<K, V, P, NB, NN, S, A>
        where
            K: Clone,
            V: Clone,
            S: Clone,
            A: ContainerAlloc,
        {
            fn clone(&self) -> Self {
                Self {
                    table: self.table.clone(),
                }
            }
        }

        impl<K, V, P, const NB: usize, const NN: usize, S, A> Default for $name<K, V, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            S: Default,
            A: ContainerAlloc + Default,
        {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<K, V, P, const NB: usize, const NN: usize, S, A> fmt::Debug for $name<K, V, P, NB, NN, S, A>
        where
            K: fmt::Debug,
            V: fmt::Debug,
            P: BucketPolicy,
            A: ContainerAlloc,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_map().entries(self.iter()).finish()
            }
        }

        impl<K, V, P, const NB: usize, const NN: usize, S, A> FromIterator<(K, V)>
            for $name<K, V, P, NB, NN, S, A>
        where
            K: Hash + Eq,
            P: BucketPolicy,
            S: BuildHasher + Default,
            A: ContainerAlloc + Default,
        {
            fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
                let mut map = Self::new();
                map.extend(iter);
                map
            }
        }

        impl<K, V, P, const NB: usize, const NN: usize, S, A> IntoIterator for $name<K, V, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            A: ContainerAlloc,
        {
            type Item = (K, V);
            type IntoIter = IntoIter<K, V, NB, NN, A>;

            fn into_iter(self) -> Self::IntoIter {
                self.table.into_values()
            }
        }

        impl<'a, K, V, P, const NB: usize, const NN: usize, S, A> IntoIterator
            for &'a $name<K, V, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            A: ContainerAlloc,
        {
            type Item = (&'a K, &'a V);
            type IntoIter = Iter<'a, K, V, NN, A>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }

        impl<'a, K, V, P, const NB: usize, const NN: usize, S, A> IntoIterator
            for &'a mut $name<K, V, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            A: ContainerAlloc,
        {
            type Item = (&'a K, &'a mut V);
            type IntoIter = IterMut<'a, K, V, NN, A>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter_mut()
            }
        }
    };
}

unordered_map_common!(UnorderedMap);
unordered_map_common!(UnorderedMultiMap);

impl<K, V, P, const NB: usize, const NN: usize, S, A> UnorderedMap<K, V, P, NB, NN, S, A>
where
    K: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    /// Checked lookup: [`KeyNotFound`](CollectionError::KeyNotFound) if absent.
    pub fn at<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(CollectionError::KeyNotFound)
    }

    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_mut(key).ok_or(CollectionError::KeyNotFound)
    }

    /// Inserts `(key, value)` unless `key` is present.
    ///
    /// An existing value is **not** overwritten; the new pair is dropped.
    /// Returns the stored value and whether the insert happened.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(&mut V, bool)> {
        let (id, inserted) = self.table.try_insert_unique((key, value))?;
        Ok((&mut self.table.value_mut(id).1, inserted))
    }

    pub fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        infallible(self.try_insert(key, value))
    }

    /// Inserts `(key, value)`, overwriting the value of an existing key.
    ///
    /// Returns the stored value and `true` if the key was new.
    pub fn try_insert_or_assign(&mut self, key: K, value: V) -> Result<(&mut V, bool)> {
        let hash = self.table.hash_key(&key);
        if let Some(id) = self.table.find_hashed(hash, &key) {
            let slot = &mut self.table.value_mut(id).1;
            *slot = value;
            return Ok((slot, false));
        }
        self.table.try_reserve(1)?;
        let id = self.table.link_new(hash, (key, value))?;
        Ok((&mut self.table.value_mut(id).1, true))
    }

    pub fn insert_or_assign(&mut self, key: K, value: V) -> (&mut V, bool) {
        infallible(self.try_insert_or_assign(key, value))
    }

    /// Inserts `(key, make())` only if `key` is absent; `make` is not called otherwise.
    ///
    /// If `make` panics the map is unchanged.
    pub fn try_emplace<F>(&mut self, key: K, make: F) -> Result<(&mut V, bool)>
    where
        F: FnOnce() -> V,
    {
        let hash = self.table.hash_key(&key);
        if let Some(id) = self.table.find_hashed(hash, &key) {
            return Ok((&mut self.table.value_mut(id).1, false));
        }
        self.table.try_reserve(1)?;
        let id = self.table.link_new(hash, (key, make()))?;
        Ok((&mut self.table.value_mut(id).1, true))
    }

    pub fn emplace<F>(&mut self, key: K, make: F) -> (&mut V, bool)
    where
        F: FnOnce() -> V,
    {
        infallible(self.try_emplace(key, make))
    }

    /// Returns the value for `key`, inserting `V::default()` first if absent.
    pub fn entry_or_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.emplace(key, V::default).0
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove_key(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove_key(key)
    }

    /// Erases the entry for `key`; returns how many were erased (0 or 1).
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.erase_key(key)
    }
}

impl<K, V, P, const NB: usize, const NN: usize, S, A> Extend<(K, V)> for UnorderedMap<K, V, P, NB, NN, S, A>
where
    K: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    /// Keeps the first value seen for each key.
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        if P::DYNAMIC {
            self.reserve(iter.size_hint().0);
        }
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V, P, const NB: usize, const NN: usize, S, A> Extend<(&'a K, &'a V)>
    for UnorderedMap<K, V, P, NB, NN, S, A>
where
    K: Hash + Eq + Copy,
    V: Copy,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    fn extend<I: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: I) {
        self.extend(iter.into_iter().map(|(k, v)| (*k, *v)));
    }
}

/// Maps are equal when they hold the same keys with equal values.
impl<K, V, P, const NB: usize, const NN: usize, S, A> PartialEq for UnorderedMap<K, V, P, NB, NN, S, A>
where
    K: Hash + Eq,
    V: PartialEq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, P, const NB: usize, const NN: usize, S, A> Eq for UnorderedMap<K, V, P, NB, NN, S, A>
where
    K: Hash + Eq,
    V: Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
}

impl<K, V, P, const NB: usize, const NN: usize, S, A, Q> Index<&Q> for UnorderedMap<K, V, P, NB, NN, S, A>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
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

impl<K, V, P, const NB: usize, const NN: usize, S, A> UnorderedMultiMap<K, V, P, NB, NN, S, A>
where
    K: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    /// Adds an entry after any entries with an equal key; returns its handle.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<NodeId> {
        self.table.try_insert_multi((key, value))
    }

    pub fn insert(&mut self, key: K, value: V) -> NodeId {
        infallible(self.try_insert(key, value))
    }

    /// All entries for `key`, in insertion order until the next rehash.
    pub fn equal_range<'a, Q>(&'a self, key: &'a Q) -> impl Iterator<Item = (&'a K, &'a V)> + 'a
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.equal_range(key).map(|(k, v)| (k, v))
    }

    /// All values for `key`.
    pub fn get_all<'a, Q>(&'a self, key: &'a Q) -> impl Iterator<Item = &'a V> + 'a
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.equal_range(key).map(|(_, v)| v)
    }

    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.count(key)
    }

    /// Removes the first entry for `key`.
    pub fn remove_one<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove_key(key).map(|(_, v)| v)
    }

    /// Erases every entry for `key`; returns how many were erased.
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.erase_key(key)
    }
}

impl<K, V, P, const NB: usize, const NN: usize, S, A> Extend<(K, V)>
    for UnorderedMultiMap<K, V, P, NB, NN, S, A>
where
    K: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        if P::DYNAMIC {
            self.reserve(iter.size_hint().0);
        }
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

/// Multimaps are equal when every `(key, value)` pair occurs equally often.
impl<K, V, P, const NB: usize, const NN: usize, S, A> PartialEq
    for UnorderedMultiMap<K, V, P, NB, NN, S, A>
where
    K: Hash + Eq,
    V: PartialEq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| {
                let mine = self.get_all(k).filter(|x| *x == v).count();
                let theirs = other.get_all(k).filter(|x| *x == v).count();
                mine == theirs
            })
    }
}

pub struct Iter<'a, K, V, const NN: usize, A: ContainerAlloc = Global> {
    inner: RawIter<'a, (K, V), NN, A>,
}

impl<'a, K, V, const NN: usize, A: ContainerAlloc> Iterator for Iter<'a, K, V, NN, A> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, const NN: usize, A: ContainerAlloc> ExactSizeIterator for Iter<'_, K, V, NN, A> {}
impl<K, V, const NN: usize, A: ContainerAlloc> FusedIterator for Iter<'_, K, V, NN, A> {}

impl<K, V, const NN: usize, A: ContainerAlloc> Clone for Iter<'_, K, V, NN, A> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct IterMut<'a, K, V, const NN: usize, A: ContainerAlloc = Global> {
    inner: RawIterMut<'a, (K, V), NN, A>,
}

impl<'a, K, V, const NN: usize, A: ContainerAlloc> Iterator for IterMut<'a, K, V, NN, A> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V, const NN: usize, A: ContainerAlloc> ExactSizeIterator for IterMut<'_, K, V, NN, A> {}
impl<K, V, const NN: usize, A: ContainerAlloc> FusedIterator for IterMut<'_, K, V, NN, A> {}
