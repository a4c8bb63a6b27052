//! Sorted-vector sets: [`FlatSet`] (unique values) and [`FlatMultiSet`].
//!
//! Thin wrappers over [`FlatTree`] with the value as its own key. Iteration is
//! sorted by the comparator; both ends are reachable (`iter().rev()`).

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::Range;
use core::slice;

use super::AnySet;
use crate::error::{Result, infallible};
use crate::maps::flat_tree::{FlatTree, Identity};
use crate::storage::{HybridStorage, InlineStorage, IntoIter, Storage};
use crate::utils::alloc::Global;
use crate::utils::compare::{Compare, Natural};

/// An ordered set stored in a sorted buffer.
pub struct FlatSet<S: Storage, C = Natural> {
    tree: FlatTree<S, Identity, C>,
}

pub type SmallFlatSet<T, const N: usize, C = Natural, A = Global> = FlatSet<HybridStorage<T, N, A>, C>;

pub type StaticFlatSet<T, const N: usize, C = Natural> = FlatSet<InlineStorage<T, N>, C>;

/// An ordered multiset stored in a sorted buffer.
pub struct FlatMultiSet<S: Storage, C = Natural> {
    tree: FlatTree<S, Identity, C>,
}

pub type SmallFlatMultiSet<T, const N: usize, C = Natural, A = Global> =
    FlatMultiSet<HybridStorage<T, N, A>, C>;

pub type StaticFlatMultiSet<T, const N: usize, C = Natural> = FlatMultiSet<InlineStorage<T, N>, C>;

#[inline]
fn check_room<S: Storage>(storage: &S) {
    debug_assert!(
        S::GROWABLE || !storage.is_full(),
        "fixed capacity of {} elements exhausted",
        storage.capacity()
    );
}

macro_rules! flat_set_common {
    ($name:ident) => {
        impl<T, S, C> $name<S, C>
        where
            S: Storage<Item = T> + Default,
            C: Compare<T> + Default,
        {
            /// Creates an empty set. No allocation occurs.
            pub fn new() -> Self {
                Self {
                    tree: FlatTree::new(),
                }
            }
        }

        impl<T, S, C> $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
            /// Creates an empty set over `storage` ordered by `cmp`.
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

            #[inline]
            pub fn available(&self) -> usize {
                self.tree.available()
            }

            #[inline]
            pub fn is_full(&self) -> bool {
                self.tree.is_full()
            }

            #[inline]
            pub fn is_inline(&self) -> bool {
                self.tree.is_inline()
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

            /// Values in sorted order.
            #[inline]
            pub fn as_slice(&self) -> &[T] {
                self.tree.as_slice()
            }

            pub fn iter(&self) -> slice::Iter<'_, T> {
                self.tree.as_slice().iter()
            }

            pub fn first(&self) -> Option<&T> {
                self.tree.as_slice().first()
            }

            pub fn last(&self) -> Option<&T> {
                self.tree.as_slice().last()
            }

            pub fn contains<Q>(&self, value: &Q) -> bool
            where
                T: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.find(value).is_some()
            }

            /// The first stored value equivalent to `value`.
            pub fn get<Q>(&self, value: &Q) -> Option<&T>
            where
                T: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.find(value).map(|pos| &self.tree.as_slice()[pos])
            }

            pub fn index_of<Q>(&self, value: &Q) -> Option<usize>
            where
                T: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.find(value)
            }

            pub fn lower_bound<Q>(&self, value: &Q) -> usize
            where
                T: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.lower_bound(value)
            }

            pub fn upper_bound<Q>(&self, value: &Q) -> usize
            where
                T: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.upper_bound(value)
            }

            pub fn equal_range<Q>(&self, value: &Q) -> Range<usize>
            where
                T: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.equal_range(value)
            }

            pub fn count<Q>(&self, value: &Q) -> usize
            where
                T: Borrow<Q>,
                C: Compare<Q>,
                Q: ?Sized,
            {
                self.tree.count(value)
            }

            /// Removes and returns the value at sorted position `index`.
            pub fn remove_at(&mut self, index: usize) -> T {
                self.tree.remove_at(index)
            }

            pub fn remove_range(&mut self, range: Range<usize>) {
                self.tree.remove_range(range);
            }

            pub fn retain<F>(&mut self, mut f: F)
            where
                F: FnMut(&T) -> bool,
            {
                self.tree.retain(|v| f(v));
            }

            /// Values of `self` that `other` lacks.
            pub fn difference<'a, O>(&'a self, other: &'a O) -> impl Iterator<Item = &'a T>
            where
                O: AnySet<T>,
                T: 'a,
            {
                self.iter().filter(move |v| !other.contains(v))
            }

            /// Values of `self` that `other` also holds.
            pub fn intersection<'a, O>(&'a self, other: &'a O) -> impl Iterator<Item = &'a T>
            where
                O: AnySet<T>,
                T: 'a,
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

        impl<T, S, C> AnySet<T> for $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
            fn contains(&self, value: &T) -> bool {
                self.tree.find(value).is_some()
            }
        }

        impl<T, S, C> Clone for $name<S, C>
        where
            S: Storage<Item = T> + Clone,
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

        impl<T, S, C> Default for $name<S, C>
        where
            S: Storage<Item = T> + Default,
            C: Compare<T> + Default,
        {
            fn default() -> Self {
                Self::new()
            }
        }

        impl<T: fmt::Debug, S, C> fmt::Debug for $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_set().entries(self.iter()).finish()
            }
        }

        impl<T: PartialEq, S, C> PartialEq for $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
            fn eq(&self, other: &Self) -> bool {
                self.as_slice() == other.as_slice()
            }
        }

        impl<T: Eq, S, C> Eq for $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
        }

        impl<T: PartialOrd, S, C> PartialOrd for $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                self.as_slice().partial_cmp(other.as_slice())
            }
        }

        impl<T: Ord, S, C> Ord for $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
            fn cmp(&self, other: &Self) -> Ordering {
                self.as_slice().cmp(other.as_slice())
            }
        }

        impl<T: Hash, S, C> Hash for $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.as_slice().hash(state);
            }
        }

        impl<T, S, C> FromIterator<T> for $name<S, C>
        where
            S: Storage<Item = T> + Default,
            C: Compare<T> + Default,
        {
            fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
                let mut set = Self::new();
                set.extend(iter);
                set
            }
        }

        impl<T, S, C> IntoIterator for $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
            type Item = T;
            type IntoIter = IntoIter<S>;

            fn into_iter(self) -> Self::IntoIter {
                self.tree.into_values()
            }
        }

        impl<'a, T: 'a, S, C> IntoIterator for &'a $name<S, C>
        where
            S: Storage<Item = T>,
            C: Compare<T>,
        {
            type Item = &'a T;
            type IntoIter = slice::Iter<'a, T>;

            fn into_iter(self) -> Self::IntoIter {
                self.iter()
            }
        }
    };
}

flat_set_common!(FlatSet);
flat_set_common!(FlatMultiSet);

impl<T, S, C> FlatSet<S, C>
where
    S: Storage<Item = T>,
    C: Compare<T>,
{
    /// Adds `value`; returns `true` if it was not already present.
    pub fn try_insert(&mut self, value: T) -> Result<bool> {
        Ok(self.tree.try_insert_unique(value)?.1)
    }

    pub fn insert(&mut self, value: T) -> bool {
        if !self.contains(&value) {
            check_room(self.tree.storage());
        }
        infallible(self.try_insert(value))
    }

    /// Unique insert that tries the position next to `hint` first.
    pub fn insert_hint(&mut self, hint: usize, value: T) -> (usize, bool) {
        infallible(self.tree.try_insert_unique_hint(hint, value))
    }

    /// Inserts at sorted position `index` without searching (debug-checked).
    pub fn insert_exactly_at(&mut self, index: usize, value: T) -> usize {
        check_room(self.tree.storage());
        infallible(self.tree.try_insert_exactly_at(index, value, true))
    }

    /// Adds `value`, replacing an equivalent stored value; returns the old one.
    pub fn replace(&mut self, value: T) -> Option<T> {
        match self.tree.search(&value) {
            Ok(pos) => Some(core::mem::replace(&mut self.tree.as_mut_slice()[pos], value)),
            Err(_) => {
                self.insert(value);
                None
            }
        }
    }

    /// Removes `value`; returns `true` if it was present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.erase_key_unique(value) == 1
    }

    /// Removes and returns the stored value equivalent to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.remove_unique(value)
    }

    /// Erases `value`; returns how many were erased (0 or 1).
    pub fn erase<Q>(&mut self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.erase_key_unique(value)
    }
}

impl<T, S, C> Extend<T> for FlatSet<S, C>
where
    S: Storage<Item = T>,
    C: Compare<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            let len = self.len();
            if !self.contains(&value) {
                check_room(self.tree.storage());
            }
            infallible(self.tree.try_insert_unique_hint(len, value));
        }
    }
}

impl<T, S, C> FlatMultiSet<S, C>
where
    S: Storage<Item = T>,
    C: Compare<T>,
{
    /// Adds `value` after any equivalent values; returns its position.
    pub fn try_insert(&mut self, value: T) -> Result<usize> {
        self.tree.try_insert_multi(value)
    }

    pub fn insert(&mut self, value: T) -> usize {
        check_room(self.tree.storage());
        infallible(self.try_insert(value))
    }

    pub fn insert_hint(&mut self, hint: usize, value: T) -> usize {
        check_room(self.tree.storage());
        infallible(self.tree.try_insert_multi_hint(hint, value))
    }

    pub fn insert_exactly_at(&mut self, index: usize, value: T) -> usize {
        check_room(self.tree.storage());
        infallible(self.tree.try_insert_exactly_at(index, value, false))
    }

    /// Erases every value equivalent to `value`; returns how many were erased.
    pub fn erase<Q>(&mut self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.erase_key_multi(value)
    }

    /// Removes one value equivalent to `value` (the first), if any.
    pub fn remove_one<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.tree.remove_unique(value)
    }
}

impl<T, S, C> Extend<T> for FlatMultiSet<S, C>
where
    S: Storage<Item = T>,
    C: Compare<T>,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            let len = self.len();
            check_room(self.tree.storage());
            infallible(self.tree.try_insert_multi_hint(len, value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn test_flat_set_basic_crud() {
        let mut set: SmallFlatSet<i32, 4> = SmallFlatSet::new();
        assert!(set.insert(3));
        assert!(set.insert(1));
        assert!(!set.insert(3));
        assert!(set.contains(&1));
        assert_eq!(set.as_slice(), &[1, 3]);
        assert!(set.remove(&1));
        assert!(!set.remove(&1));
        assert_eq!(set.erase(&42), 0);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_flat_set_spill_keeps_order() {
        let mut set: SmallFlatSet<i32, 2> = SmallFlatSet::new();
        for v in [5, 3, 9, 1] {
            set.insert(v);
        }
        assert!(!set.is_inline());
        assert_eq!(set.iter().rev().copied().collect::<Vec<_>>(), vec![9, 5, 3, 1]);
        assert_eq!(set.first(), Some(&1));
        assert_eq!(set.last(), Some(&9));
    }

    #[test]
    fn test_flat_set_heterogeneous_take_and_replace() {
        let mut set: SmallFlatSet<String, 4> = ["b", "a"].into_iter().map(String::from).collect();
        assert!(set.contains("a"));
        assert_eq!(set.take("a"), Some(String::from("a")));
        assert_eq!(set.replace(String::from("b")), Some(String::from("b")));
        assert_eq!(set.replace(String::from("c")), None);
        assert_eq!(format!("{:?}", set), r#"{"b", "c"}"#);
    }

    #[test]
    fn test_flat_set_static_capacity() {
        let mut set: StaticFlatSet<u8, 3> = StaticFlatSet::new();
        for v in [30, 10, 20] {
            set.insert(v);
        }
        assert!(set.is_full());
        assert!(set.try_insert(40).is_err());
        assert!(!set.insert(20));
        assert_eq!(set.as_slice(), &[10, 20, 30]);
    }

    #[test]
    fn test_flat_set_algebra_interop() {
        let set: SmallFlatSet<i32, 8> = [1, 2, 3, 4].into_iter().collect();
        let hs: HashSet<i32> = [3, 4, 5].into_iter().collect();
        let bs: BTreeSet<i32> = [1, 2, 3, 4, 5].into_iter().collect();
        let diff: Vec<i32> = set.difference(&hs).copied().collect();
        assert_eq!(diff, vec![1, 2]);
        let inter: Vec<i32> = set.intersection(&hs).copied().collect();
        assert_eq!(inter, vec![3, 4]);
        assert!(set.is_subset(&bs));
        assert!(!set.is_disjoint(&hs));
        assert!(set.is_superset(&[2, 3]));
        let other: SmallFlatSet<i32, 8> = [9].into_iter().collect();
        assert!(set.is_disjoint(&other));
    }

    #[test]
    fn test_flat_set_positional_operations() {
        let mut set: SmallFlatSet<i32, 8> = (0..6).collect();
        assert_eq!(set.insert_hint(6, 10), (6, true));
        assert_eq!(set.insert_exactly_at(6, 7), 6);
        assert_eq!(set.remove_at(0), 0);
        set.remove_range(0..2);
        assert_eq!(set.as_slice(), &[3, 4, 5, 7, 10]);
        set.retain(|v| v % 2 == 1);
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![3, 5, 7]);
    }

    #[test]
    fn test_flat_set_copy_equivalence() {
        let a: SmallFlatSet<i32, 2> = [4, 2, 8].into_iter().collect();
        let b = a.clone();
        assert_eq!(a, b);
        let mut c: SmallFlatSet<i32, 2> = SmallFlatSet::new();
        c.insert(100);
        c.clone_from(&a);
        assert_eq!(c, a);
    }

    #[test]
    fn test_flat_multiset_counts() {
        let mut set: SmallFlatMultiSet<i32, 4> = [2, 1, 2, 3, 2].into_iter().collect();
        assert_eq!(set.as_slice(), &[1, 2, 2, 2, 3]);
        assert_eq!(set.count(&2), 3);
        assert_eq!(set.equal_range(&2), 1..4);
        assert_eq!(set.remove_one(&2), Some(2));
        assert_eq!(set.erase(&2), 2);
        assert_eq!(set.erase(&2), 0);
        assert_eq!(set.insert(0), 0);
        assert_eq!(set.as_slice(), &[0, 1, 3]);
    }
}
