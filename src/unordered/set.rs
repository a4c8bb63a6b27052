//! Hash sets: [`UnorderedSet`] (unique values) and [`UnorderedMultiSet`].

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;

use fnv::FnvBuildHasher;

use super::iter::{LocalIter, RawIntoIter, RawIter};
use super::node_pool::NodeId;
use super::policy::{BucketPolicy, PowerOfTwo, StaticBuckets};
use super::table::HashTable;
use crate::error::{Result, infallible};
use crate::sets::AnySet;
use crate::utils::alloc::{ContainerAlloc, Global};
use crate::utils::key_of::Identity;

/// A hash set with unique values.
pub struct UnorderedSet<T, P, const NB: usize, const NN: usize, S = FnvBuildHasher, A: ContainerAlloc = Global> {
    table: HashTable<T, Identity, P, NB, NN, S, A>,
}

pub type SmallUnorderedSet<T, const N: usize, S = FnvBuildHasher, A = Global> =
    UnorderedSet<T, PowerOfTwo, N, N, S, A>;

/// At most `CAP` values over exactly `NB` buckets; never allocates.
pub type StaticUnorderedSet<T, const CAP: usize, const NB: usize, S = FnvBuildHasher> =
    UnorderedSet<T, StaticBuckets<NB>, NB, CAP, S, Global>;

pub type HeapUnorderedSet<T, S = FnvBuildHasher, A = Global> = UnorderedSet<T, PowerOfTwo, 0, 0, S, A>;

/// A hash set that keeps duplicates, grouped together.
pub struct UnorderedMultiSet<T, P, const NB: usize, const NN: usize, S = FnvBuildHasher, A: ContainerAlloc = Global> {
    table: HashTable<T, Identity, P, NB, NN, S, A>,
}

pub type SmallUnorderedMultiSet<T, const N: usize, S = FnvBuildHasher, A = Global> =
    UnorderedMultiSet<T, PowerOfTwo, N, N, S, A>;

pub type StaticUnorderedMultiSet<T, const CAP: usize, const NB: usize, S = FnvBuildHasher> =
    UnorderedMultiSet<T, StaticBuckets<NB>, NB, CAP, S, Global>;

pub type HeapUnorderedMultiSet<T, S = FnvBuildHasher, A = Global> =
    UnorderedMultiSet<T, PowerOfTwo, 0, 0, S, A>;

pub type Iter<'a, T, const NN: usize, A = Global> = RawIter<'a, T, NN, A>;
pub type IntoIter<T, const NB: usize, const NN: usize, A = Global> = RawIntoIter<T, NB, NN, A>;

macro_rules! unordered_set_common {
    ($name:ident) => {
        impl<T, P, const NB: usize, const NN: usize, S, A> $name<T, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            S: Default,
            A: ContainerAlloc + Default,
        {
            pub fn new() -> Self {
                Self::with_hasher_in(S::default(), A::default())
            }

            pub fn with_capacity(capacity: usize) -> Self {
                let mut set = Self::new();
                set.reserve(capacity);
                set
            }
        }

        impl<T, P, const NB: usize, const NN: usize, S, A> $name<T, P, NB, NN, S, A>
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

            pub fn iter(&self) -> Iter<'_, T, NN, A> {
                self.table.iter()
            }

            /// Values chained in `bucket`.
            ///
            /// # Panics
            /// Panics if `bucket >= bucket_count()`.
            pub fn bucket_iter(&self, bucket: usize) -> LocalIter<'_, T, NN, A> {
                self.table.local_iter(bucket)
            }

            pub fn get_by_id(&self, id: NodeId) -> Option<&T> {
                self.table.get_id(id)
            }

            pub fn remove_by_id(&mut self, id: NodeId) -> Option<T> {
                self.table.remove_id(id)
            }

            pub fn retain<F>(&mut self, mut f: F)
            where
                F: FnMut(&T) -> bool,
            {
                self.table.retain(|v| f(v));
            }

            pub fn is_partitioned(&self) -> bool {
                self.table.is_partitioned()
            }
        }

        impl<T, P, const NB: usize, const NN: usize, S, A> $name<T, P, NB, NN, S, A>
        where
            T: Hash + Eq,
            P: BucketPolicy,
            S: BuildHasher,
            A: ContainerAlloc,
        {
            pub fn contains<Q>(&self, value: &Q) -> bool
            where
                T: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.find(value).is_some()
            }

            pub fn find_id<Q>(&self, value: &Q) -> Option<NodeId>
            where
                T: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.find(value)
            }

            /// The stored value equal to `value`.
            pub fn get<Q>(&self, value: &Q) -> Option<&T>
            where
                T: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.get(value)
            }

            /// # Panics
            /// Panics if the set has no buckets yet.
            pub fn bucket<Q>(&self, value: &Q) -> usize
            where
                T: Borrow<Q>,
                Q: Hash + Eq + ?Sized,
            {
                self.table.bucket(value)
            }

            /// Values of `self` that `other` lacks.
            pub fn difference<'a, O>(&'a self, other: &'a O) -> impl Iterator<Item = &'a T>
            where
                O: AnySet<T>,
            {
                self.iter().filter(move |v| !other.contains(v))
            }

            /// Values of `self` that `other` also holds.
            pub fn intersection<'a, O>(&'a self, other: &'a O) -> impl Iterator<Item = &'a T>
            where
                O: AnySet<T>,
            {
                self.iter().filter(move |v| other.contains(v))
            }

            pub fn is_disjoint<O>(&self, other: &O) -> bool
            where
                O: AnySet<T>,
            {
                self.iter().all(|v| !other.contains(v))
            }

            pub fn is_subset<O>(&self, other: &O) -> bool
            where
                O: AnySet<T>,
            {
                self.iter().all(|v| other.contains(v))
            }

            pub fn is_superset<'a, I>(&self, other: I) -> bool
            where
                T: 'a,
                I: IntoIterator<Item = &'a T>,
            {
                other.into_iter().all(|v| self.contains(v))
            }
        }

        impl<T, P, const NB: usize, const NN: usize, S, A> AnySet<T> for $name<T, P, NB, NN, S, A>
        where
            T: Hash + Eq,
            P: BucketPolicy,
            S: BuildHasher,
            A: ContainerAlloc,
        {
            fn contains(&self, value: &T) -> bool {
                self.table.find(value).is_some()
            }
        }

        impl<T, P, const NB: usize, const NN: usize, S, A> Clone for $name<T, P, NB, NN, S, A>
        where
            T: Clone,
            S: Clone,
            A: ContainerAlloc,
        {
            fn clone(&self) -> Self {
                Self {
                    table: self.table.clone(),
                }
            }
        }

        impl<T, P, const NB: usize, const NN: usize, S, A> Default for $name<T, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            S: Default,
            A: ContainerAlloc + Default,
        {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T, P, const NB: usize, const NN: usize, S, A> fmt::Debug for $name<T, P, NB, NN, S, A>
        where
            T: fmt::Debug,
            P: BucketPolicy,
            A: ContainerAlloc,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_set().entries(self.iter()).finish()
            }
        }

        impl<T, P, const NB: usize, const NN: usize, S, A> FromIterator<T> for $name<T, P, NB, NN, S, A>
        where
            T: Hash + Eq,
            P: BucketPolicy,
            S: BuildHasher + Default,
            A: ContainerAlloc + Default,
        {
            fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
                let mut set = Self::new();
                set.extend(iter);
                set
            }
        }

        impl<T, P, const NB: usize, const NN: usize, S, A> Extend<T> for $name<T, P, NB, NN, S, A>
        where
            T: Hash + Eq,
            P: BucketPolicy,
            S: BuildHasher,
            A: ContainerAlloc,
        {
            fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
                let iter = iter.into_iter();
                if P::DYNAMIC {
                    self.reserve(iter.size_hint().0);
                }
                for value in iter {
                    self.insert(value);
                }
            }
        }

        impl<T, P, const NB: usize, const NN: usize, S, A> IntoIterator for $name<T, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            A: ContainerAlloc,
        {
            type Item = T;
            type IntoIter = IntoIter<T, NB, NN, A>;

            fn into_iter(self) -> Self::IntoIter {
                self.table.into_values()
            }
        }

        impl<'a, T, P, const NB: usize, const NN: usize, S, A> IntoIterator for &'a $name<T, P, NB, NN, S, A>
        where
            P: BucketPolicy,
            A: ContainerAlloc,
        {
            type Item = &'a T;
            type IntoIter = Iter<'a, T, NN, A>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }
    };
}

unordered_set_common!(UnorderedSet);
unordered_set_common!(UnorderedMultiSet);

impl<T, P, const NB: usize, const NN: usize, S, A> UnorderedSet<T, P, NB, NN, S, A>
where
    T: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    /// Inserts `value` if absent; returns `true` if it was inserted.
    pub fn try_insert(&mut self, value: T) -> Result<bool> {
        self.table.try_insert_unique(value).map(|(_, inserted)| inserted)
    }

    pub fn insert(&mut self, value: T) -> bool {
        infallible(self.try_insert(value))
    }

    /// Like [`insert`](Self::insert), but also returns the handle of the
    /// stored (new or existing) value.
    pub fn insert_with_id(&mut self, value: T) -> (NodeId, bool) {
        infallible(self.table.try_insert_unique(value))
    }

    /// Inserts `value`, replacing and returning an equal stored value.
    pub fn replace(&mut self, value: T) -> Option<T> {
        let hash = self.table.hash_key(&value);
        if let Some(id) = self.table.find_hashed(hash, &value) {
            return Some(mem::replace(self.table.value_mut(id), value));
        }
        infallible(self.table.try_reserve(1).and_then(|()| self.table.link_new(hash, value)));
        None
    }

    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove_key(value)
    }

    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove_key(value).is_some()
    }

    /// Returns how many values were erased (0 or 1).
    pub fn erase<Q>(&mut self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.erase_key(value)
    }
}

/// Sets are equal when they hold the same values.
impl<T, P, const NB: usize, const NN: usize, S, A> PartialEq for UnorderedSet<T, P, NB, NN, S, A>
where
    T: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| other.contains(v))
    }
}

impl<T, P, const NB: usize, const NN: usize, S, A> Eq for UnorderedSet<T, P, NB, NN, S, A>
where
    T: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
}

impl<T, P, const NB: usize, const NN: usize, S, A> UnorderedMultiSet<T, P, NB, NN, S, A>
where
    T: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    /// Adds `value` after any equal values; returns its handle.
    pub fn try_insert(&mut self, value: T) -> Result<NodeId> {
        self.table.try_insert_multi(value)
    }

    pub fn insert(&mut self, value: T) -> NodeId {
        infallible(self.try_insert(value))
    }

    pub fn count<Q>(&self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.count(value)
    }

    pub fn equal_range<'a, Q>(&'a self, value: &'a Q) -> impl Iterator<Item = &'a T> + 'a
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.equal_range(value)
    }

    /// Removes one value equal to `value`.
    pub fn remove_one<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.remove_key(value)
    }

    /// Erases every value equal to `value`; returns how many were erased.
    pub fn erase<Q>(&mut self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.table.erase_key(value)
    }
}

/// Multisets are equal when every value occurs equally often.
impl<T, P, const NB: usize, const NN: usize, S, A> PartialEq for UnorderedMultiSet<T, P, NB, NN, S, A>
where
    T: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|v| self.count(v) == other.count(v))
    }
}

impl<T, P, const NB: usize, const NN: usize, S, A> Eq for UnorderedMultiSet<T, P, NB, NN, S, A>
where
    T: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
}
