//! Contiguous vector over a pluggable storage backend.
//!
//! [`Vector<S>`] is the sequence face of a [`Storage`]. Two aliases cover the
//! usual cases:
//!
//! * [`SmallVec<T, N, A>`]: `N` inline slots, then a heap buffer from `A`.
//! * [`StaticVec<T, N>`]: exactly `N` inline slots, never allocates. Pushing
//!   past `N` is a precondition failure (panic); the `try_*` methods report
//!   [`CapacityExhausted`](crate::error::CollectionError::CapacityExhausted).
//!
//! Because it `Deref`s to `[T]`, all standard slice methods are available
//! without conversion.
//!
//! [`AnyVec`] is a slice-view trait implemented by `Vector`, `Vec`, slices
//! (`[T]`), and arrays (`[T; N]`) to enable generic comparison and extension
//! helpers.

use core::borrow::{Borrow, BorrowMut};
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops::{Deref, DerefMut, Index, IndexMut};
use core::slice;

use crate::error::{Result, infallible};
use crate::storage::{HybridStorage, InlineStorage, IntoIter, Storage};
use crate::utils::alloc::{ContainerAlloc, Global};

/// A trait generalizing any vector-like contiguous collection.
pub trait AnyVec<T> {
    fn as_slice(&self) -> &[T];

    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    fn contains(&self, x: &T) -> bool
    where
        T: PartialEq,
    {
        self.as_slice().contains(x)
    }

    fn iter(&self) -> slice::Iter<'_, T> {
        self.as_slice().iter()
    }
}

impl<T> AnyVec<T> for std::vec::Vec<T> {
    fn as_slice(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T> AnyVec<T> for [T] {
    fn as_slice(&self) -> &[T] {
        self
    }
}

impl<T, const N: usize> AnyVec<T> for [T; N] {
    fn as_slice(&self) -> &[T] {
        self.as_slice()
    }
}

impl<S: Storage> AnyVec<S::Item> for Vector<S> {
    fn as_slice(&self) -> &[S::Item] {
        self.buf.as_slice()
    }
}

/// A growable (or fixed) contiguous sequence backed by `S`.
pub struct Vector<S: Storage> {
    buf: S,
}

/// Inline-first vector that spills to `A`.
pub type SmallVec<T, const N: usize, A = Global> = Vector<HybridStorage<T, N, A>>;

/// Fixed-capacity vector that never allocates.
pub type StaticVec<T, const N: usize> = Vector<InlineStorage<T, N>>;

impl<S: Storage + Default> Vector<S> {
    pub fn new() -> Self {
        Self { buf: S::default() }
    }

    /// Builds a vector from a slice of clonable values.
    pub fn from_slice(values: &[S::Item]) -> Self
    where
        S::Item: Clone,
    {
        let mut v = Self::new();
        v.extend_from_slice(values);
        v
    }
}

impl<T, const N: usize, A: ContainerAlloc> Vector<HybridStorage<T, N, A>> {
    /// Creates an empty vector whose heap buffer (if ever needed) comes from `alloc`.
    pub fn new_in(alloc: A) -> Self {
        Self {
            buf: HybridStorage::new_in(alloc),
        }
    }

    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self> {
        Ok(Self {
            buf: HybridStorage::try_with_capacity_in(capacity, alloc)?,
        })
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        infallible(Self::try_with_capacity_in(capacity, alloc))
    }

    pub fn with_capacity(capacity: usize) -> Self
    where
        A: Default,
    {
        Self::with_capacity_in(capacity, A::default())
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        self.buf.allocator()
    }

    /// Moves every element out of `src` into `self`, replacing `self`'s contents.
    ///
    /// `src` is left empty. Heap buffers are adopted in O(1) when the
    /// allocators allow it.
    pub fn assign_take(&mut self, src: &mut Self) {
        self.buf.assign_take(&mut src.buf);
    }

    /// Exchanges the contents of two vectors, including mixed inline/heap pairs.
    pub fn swap(&mut self, other: &mut Self) {
        self.buf.swap(&mut other.buf);
    }
}

impl<S: Storage> Vector<S> {
    /// Wraps an existing storage backend.
    pub fn from_storage(buf: S) -> Self {
        Self { buf }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline(always)]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Elements that fit before the next growth (or, for static vectors, at all).
    #[inline]
    pub fn available(&self) -> usize {
        self.buf.available()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.buf.is_full()
    }

    /// `true` while the elements live in the inline slots.
    #[inline(always)]
    pub fn is_inline(&self) -> bool {
        self.buf.is_inline()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[S::Item] {
        self.buf.as_slice()
    }

    #[inline(always)]
    pub fn as_mut_slice(&mut self) -> &mut [S::Item] {
        self.buf.as_mut_slice()
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> Option<&S::Item> {
        self.as_slice().get(index)
    }

    #[inline(always)]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut S::Item> {
        self.as_mut_slice().get_mut(index)
    }

    #[inline]
    fn check_room(&self, additional: usize) {
        debug_assert!(
            S::GROWABLE || additional <= self.available(),
            "fixed capacity of {} elements exhausted",
            self.capacity()
        );
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.buf.try_reserve(additional)
    }

    pub fn reserve(&mut self, additional: usize) {
        self.check_room(additional);
        infallible(self.buf.try_reserve(additional))
    }

    pub fn try_reserve_exact(&mut self, additional: usize) -> Result<()> {
        self.buf.try_reserve_exact(additional)
    }

    pub fn reserve_exact(&mut self, additional: usize) {
        self.check_room(additional);
        infallible(self.buf.try_reserve_exact(additional))
    }

    #[inline]
    pub fn try_push(&mut self, item: S::Item) -> Result<()> {
        self.buf.try_push(item)
    }

    #[inline(always)]
    pub fn push(&mut self, item: S::Item) {
        self.check_room(1);
        infallible(self.buf.try_push(item))
    }

    #[inline(always)]
    pub fn pop(&mut self) -> Option<S::Item> {
        self.buf.pop()
    }

    pub fn try_insert(&mut self, index: usize, element: S::Item) -> Result<()> {
        self.buf.try_insert(index, element)
    }

    /// Inserts `element` at `index`, shifting the tail right.
    ///
    /// # Panics
    /// Panics if `index > len`, or if a static vector is full.
    pub fn insert(&mut self, index: usize, element: S::Item) {
        self.check_room(1);
        infallible(self.buf.try_insert(index, element))
    }

    /// Inserts every element of `iter` at `index`, keeping their order.
    ///
    /// Space for the whole run is opened up front. If the iterator panics the
    /// vector is restored to its previous contents; if it yields fewer
    /// elements than it promised, only those are kept.
    pub fn try_insert_many<I>(&mut self, index: usize, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = S::Item>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = iter.into_iter();
        let n = iter.len();
        let mut gap = self.buf.insert_space(index, n)?;
        for item in iter.take(n) {
            gap.push(item);
        }
        gap.commit();
        Ok(())
    }

    pub fn insert_many<I>(&mut self, index: usize, iter: I)
    where
        I: IntoIterator<Item = S::Item>,
        I::IntoIter: ExactSizeIterator,
    {
        infallible(self.try_insert_many(index, iter))
    }

    pub fn remove(&mut self, index: usize) -> S::Item {
        self.buf.remove(index)
    }

    pub fn swap_remove(&mut self, index: usize) -> S::Item {
        self.buf.swap_remove(index)
    }

    /// Drops the elements in `start..end`, shifting the tail left.
    pub fn remove_range(&mut self, start: usize, end: usize) {
        assert!(start <= end, "range start {start} is after end {end}");
        self.buf.erase_space(start, end - start);
    }

    pub fn truncate(&mut self, len: usize) {
        self.buf.truncate(len);
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&S::Item) -> bool,
    {
        self.buf.retain_mut(|x| f(x));
    }

    pub fn retain_mut<F>(&mut self, f: F)
    where
        F: FnMut(&mut S::Item) -> bool,
    {
        self.buf.retain_mut(f);
    }

    /// Releases spare heap capacity; returns to inline storage when the
    /// elements fit there.
    pub fn shrink_to_fit(&mut self) {
        self.buf.shrink_to_fit();
    }

    pub fn try_extend_from_slice(&mut self, other: &[S::Item]) -> Result<()>
    where
        S::Item: Clone,
    {
        self.buf.try_extend_from_slice(other)
    }

    pub fn extend_from_slice(&mut self, other: &[S::Item])
    where
        S::Item: Clone,
    {
        self.check_room(other.len());
        infallible(self.buf.try_extend_from_slice(other))
    }

    pub fn try_resize(&mut self, new_len: usize, value: S::Item) -> Result<()>
    where
        S::Item: Clone,
    {
        let len = self.len();
        if new_len > len {
            self.buf.try_extend_fill(new_len - len, &value)
        } else {
            self.buf.truncate(new_len);
            Ok(())
        }
    }

    pub fn resize(&mut self, new_len: usize, value: S::Item)
    where
        S::Item: Clone,
    {
        self.check_room(new_len.saturating_sub(self.len()));
        infallible(self.try_resize(new_len, value))
    }

    /// Gives up the vector, returning its storage backend.
    pub fn into_storage(self) -> S {
        self.buf
    }

    /// Copies the elements into a standard `Vec`.
    pub fn to_vec(&self) -> std::vec::Vec<S::Item>
    where
        S::Item: Clone,
    {
        self.as_slice().to_vec()
    }

    pub fn extend_from_any<V: AnyVec<S::Item> + ?Sized>(&mut self, other: &V)
    where
        S::Item: Clone,
    {
        self.extend_from_slice(other.as_slice());
    }

    pub fn eq_any<V: AnyVec<S::Item> + ?Sized>(&self, other: &V) -> bool
    where
        S::Item: PartialEq,
    {
        self.as_slice() == other.as_slice()
    }

    pub fn cmp_any<V: AnyVec<S::Item> + ?Sized>(&self, other: &V) -> Ordering
    where
        S::Item: Ord,
    {
        self.as_slice().cmp(other.as_slice())
    }

    pub fn starts_with_any<V: AnyVec<S::Item> + ?Sized>(&self, other: &V) -> bool
    where
        S::Item: PartialEq,
    {
        self.as_slice().starts_with(other.as_slice())
    }

    pub fn ends_with_any<V: AnyVec<S::Item> + ?Sized>(&self, other: &V) -> bool
    where
        S::Item: PartialEq,
    {
        self.as_slice().ends_with(other.as_slice())
    }

    pub fn contains_subsequence<V: AnyVec<S::Item> + ?Sized>(&self, other: &V) -> bool
    where
        S::Item: PartialEq,
    {
        let other_slice = other.as_slice();
        if other_slice.is_empty() {
            return true;
        }
        if other_slice.len() > self.len() {
            return false;
        }
        self.as_slice()
            .windows(other_slice.len())
            .any(|w| w == other_slice)
    }
}

impl<S: Storage> Deref for Vector<S> {
    type Target = [S::Item];
    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

impl<S: Storage> DerefMut for Vector<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.as_mut_slice()
    }
}

impl<S: Storage + Clone> Clone for Vector<S> {
    fn clone(&self) -> Self {
        Self {
            buf: self.buf.clone(),
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.buf.clone_from(&source.buf);
    }
}

impl<S: Storage> fmt::Debug for Vector<S>
where
    S::Item: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_slice(), f)
    }
}

impl<S: Storage + Default> Default for Vector<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S1: Storage, S2: Storage> PartialEq<Vector<S2>> for Vector<S1>
where
    S1::Item: PartialEq<S2::Item>,
{
    fn eq(&self, other: &Vector<S2>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<S: Storage> Eq for Vector<S> where S::Item: Eq {}

impl<S: Storage> PartialOrd for Vector<S>
where
    S::Item: PartialOrd,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.as_slice().partial_cmp(other.as_slice())
    }
}

impl<S: Storage> Ord for Vector<S>
where
    S::Item: Ord,
{
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl<S: Storage> Hash for Vector<S>
where
    S::Item: Hash,
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl<S: Storage> Extend<S::Item> for Vector<S> {
    fn extend<I: IntoIterator<Item = S::Item>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<S: Storage + Default> FromIterator<S::Item> for Vector<S> {
    fn from_iter<I: IntoIterator<Item = S::Item>>(iter: I) -> Self {
        let mut vec = Self::new();
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        if S::GROWABLE {
            vec.reserve(lower);
        }
        vec.extend(iter);
        vec
    }
}

impl<S: Storage> IntoIterator for Vector<S> {
    type Item = S::Item;
    type IntoIter = IntoIter<S>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.buf)
    }
}

impl<'a, S: Storage> IntoIterator for &'a Vector<S> {
    type Item = &'a S::Item;
    type IntoIter = slice::Iter<'a, S::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl<'a, S: Storage> IntoIterator for &'a mut Vector<S> {
    type Item = &'a mut S::Item;
    type IntoIter = slice::IterMut<'a, S::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_mut_slice().iter_mut()
    }
}

impl<S: Storage> AsRef<[S::Item]> for Vector<S> {
    fn as_ref(&self) -> &[S::Item] {
        self.as_slice()
    }
}

impl<S: Storage> AsMut<[S::Item]> for Vector<S> {
    fn as_mut(&mut self) -> &mut [S::Item] {
        self.as_mut_slice()
    }
}

impl<S: Storage> Borrow<[S::Item]> for Vector<S> {
    fn borrow(&self) -> &[S::Item] {
        self.as_slice()
    }
}

impl<S: Storage> BorrowMut<[S::Item]> for Vector<S> {
    fn borrow_mut(&mut self) -> &mut [S::Item] {
        self.as_mut_slice()
    }
}

impl<S: Storage> Index<usize> for Vector<S> {
    type Output = S::Item;
    #[inline(always)]
    fn index(&self, index: usize) -> &Self::Output {
        &self.as_slice()[index]
    }
}

impl<S: Storage> IndexMut<usize> for Vector<S> {
    #[inline(always)]
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.as_mut_slice()[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{CountingAlloc, Dropper};
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    #[test]
    fn test_vec_traits_borrow() {
        let mut v: SmallVec<i32, 4> = SmallVec::from_iter([1, 2, 3]);

        let b: &[i32] = v.borrow();
        assert_eq!(b, &[1, 2, 3]);

        let b_mut: &mut [i32] = v.borrow_mut();
        b_mut[0] = 10;
        assert_eq!(v.as_slice(), &[10, 2, 3]);
    }

    #[test]
    fn test_vec_inline_push_pop_basic() {
        let mut vec: SmallVec<i32, 4> = SmallVec::new();
        vec.push(1);
        vec.push(2);
        vec.push(3);
        assert!(vec.is_inline());
        assert_eq!(vec.len(), 3);
        assert_eq!(vec.available(), 1);
        assert_eq!(vec[0], 1);
        assert_eq!(vec.pop(), Some(3));
        assert_eq!(vec.len(), 2);
    }

    #[test]
    fn test_vec_spill_trigger_on_push() {
        let mut vec: SmallVec<i32, 2> = SmallVec::new();
        vec.push(1);
        vec.push(2);
        assert!(vec.is_inline());
        vec.push(3);
        assert!(!vec.is_inline());
        assert_eq!(vec.len(), 3);
        assert_eq!(vec[0], 1);
        assert_eq!(vec[2], 3);
        assert!(vec.capacity() >= 4);
    }

    #[test]
    fn test_vec_spill_trigger_on_insert() {
        let mut vec: SmallVec<i32, 2> = SmallVec::new();
        vec.push(1);
        vec.push(3);
        vec.insert(1, 2);
        assert!(!vec.is_inline());
        assert_eq!(vec.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn test_vec_inline_insert_remove_swap() {
        let mut vec: SmallVec<i32, 4> = SmallVec::from_iter([10, 20, 30]);
        vec.insert(1, 15);
        assert_eq!(vec[1], 15);
        let removed = vec.remove(2);
        assert_eq!(removed, 20);
        assert_eq!(vec.as_slice(), &[10, 15, 30]);
        vec.push(40);
        let swapped = vec.swap_remove(0);
        assert_eq!(swapped, 10);
        assert_eq!(vec.as_slice(), &[40, 15, 30]);
    }

    #[test]
    fn test_vec_any_storage_retain() {
        let mut vec: SmallVec<i32, 8> = SmallVec::from_iter(0..10);
        assert!(!vec.is_inline());
        vec.retain(|&x| x % 2 == 0);
        assert_eq!(vec.as_slice(), &[0, 2, 4, 6, 8]);
        let mut vec_inline: SmallVec<i32, 8> = SmallVec::from_iter(0..6);
        assert!(vec_inline.is_inline());
        vec_inline.retain_mut(|x| {
            *x *= 10;
            *x % 20 != 0
        });
        assert_eq!(vec_inline.as_slice(), &[10, 30, 50]);
    }

    #[test]
    fn test_vec_any_storage_resize_clone() {
        let mut vec: SmallVec<i32, 4> = SmallVec::new();
        vec.resize(2, 0);
        assert!(vec.is_inline());
        let vec2 = vec.clone();
        assert_eq!(vec, vec2);
        vec.resize(10, 5);
        assert!(!vec.is_inline());
        assert_eq!(vec.len(), 10);
        assert_eq!(vec[9], 5);
        vec.resize(1, 0);
        assert_eq!(vec.as_slice(), &[0]);
    }

    #[test]
    fn test_vec_traits_into_iter_basic() {
        let vec: SmallVec<i32, 4> = SmallVec::from_iter([1, 2, 3]);
        let collected: Vec<i32> = vec.into_iter().map(|x| x * 2).collect();
        assert_eq!(collected, vec![2, 4, 6]);
        let mut vec: SmallVec<i32, 4> = SmallVec::from_iter([1, 2, 3]);
        for x in &mut vec {
            *x += 1;
        }
        assert_eq!((&vec).into_iter().sum::<i32>(), 9);
    }

    #[test]
    fn test_vec_any_storage_drop_behavior() {
        let counter = Rc::new(Cell::new(0));
        {
            let mut vec: SmallVec<Dropper, 2> = SmallVec::new();
            vec.push(Dropper(counter.clone()));
            vec.push(Dropper(counter.clone()));
        }
        assert_eq!(counter.get(), 2);
        counter.set(0);
        {
            let mut vec: SmallVec<Dropper, 2> = SmallVec::new();
            vec.push(Dropper(counter.clone()));
            vec.push(Dropper(counter.clone()));
            vec.push(Dropper(counter.clone()));
        }
        assert_eq!(counter.get(), 3);
        counter.set(0);
        {
            let vec: SmallVec<Dropper, 2> = (0..4).map(|_| Dropper(counter.clone())).collect();
            let mut it = vec.into_iter();
            drop(it.next());
            assert_eq!(counter.get(), 1);
        }
        assert_eq!(counter.get(), 4);
    }

    #[test]
    fn test_vec_traits_anyvec_inspection() {
        let sv: SmallVec<i32, 4> = SmallVec::from_iter([10, 20, 30]);
        assert_eq!(sv.len(), 3);
        assert!(!sv.is_empty());
        assert_eq!(sv.as_slice().first(), Some(&10));
        assert_eq!(sv.get(1), Some(&20));
        let sum: i32 = sv.iter().sum();
        assert_eq!(sum, 60);
    }

    #[test]
    fn test_vec_traits_interop_comparison() {
        let sv: SmallVec<i32, 4> = SmallVec::from_iter([1, 2, 3]);
        let std_vec = vec![1, 2, 3];
        assert!(sv.eq_any(&std_vec));
        assert_eq!(sv.cmp_any(&std_vec), Ordering::Equal);
        let arr = [1, 2, 4];
        assert!(!sv.eq_any(&arr));
        assert_eq!(sv.cmp_any(&arr), Ordering::Less);
    }

    #[test]
    fn test_vec_traits_interop_searching() {
        let sv: SmallVec<i32, 8> = SmallVec::from_iter([1, 2, 3, 4, 5]);
        assert!(sv.starts_with_any(&vec![1, 2]));
        assert!(sv.ends_with_any(&[4, 5]));
        assert!(sv.contains_subsequence(&vec![3, 4]));
        assert!(!sv.contains_subsequence(&[3, 5]));
    }

    #[test]
    fn test_vec_any_storage_with_capacity() {
        let v: SmallVec<i32, 4> = SmallVec::with_capacity(2);
        assert!(v.is_inline());
        let v2: SmallVec<i32, 4> = SmallVec::with_capacity(10);
        assert!(!v2.is_inline());
        assert!(v2.capacity() >= 10);
    }

    #[test]
    fn test_vec_any_storage_shrink_to_fit() {
        let mut v: SmallVec<i32, 4> = SmallVec::with_capacity(10);
        v.extend([1, 2, 3, 4, 5]);
        v.shrink_to_fit();
        assert_eq!(v.capacity(), 5);
        v.pop();
        v.shrink_to_fit();
        assert!(v.is_inline());
        assert_eq!(v.capacity(), 4);
        assert_eq!(v.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_vec_any_storage_extend_from_slice() {
        let mut v: SmallVec<i32, 4> = SmallVec::new();
        v.extend_from_slice(&[1, 2]);
        assert!(v.is_inline());
        assert_eq!(v.as_slice(), &[1, 2]);
        v.extend_from_slice(&[3, 4, 5]);
        assert!(!v.is_inline());
        assert_eq!(v.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_vec_any_storage_clear_and_empty() {
        let mut v: SmallVec<i32, 4> = SmallVec::from_iter([1, 2, 3, 4, 5]);
        assert!(!v.is_inline());
        v.clear();
        assert!(v.is_empty());
        let mut v_inline: SmallVec<i32, 4> = SmallVec::from_iter([1, 2]);
        v_inline.clear();
        assert!(v_inline.is_empty());
    }

    #[test]
    fn test_vec_traits_partial_eq_cross_storage() {
        let v1: SmallVec<i32, 4> = SmallVec::from_iter([1, 2, 3]);
        let v2: SmallVec<i32, 2> = SmallVec::from_iter([1, 2, 3]);
        let v3: StaticVec<i32, 3> = StaticVec::from_iter([1, 2, 3]);
        assert!(v1.is_inline());
        assert!(!v2.is_inline());
        assert_eq!(v1, v2);
        assert_eq!(v2, v3);
    }

    #[test]
    fn test_vec_any_storage_as_mut_and_deref_mut() {
        let mut v: SmallVec<i32, 4> = SmallVec::from_iter([1, 2, 3]);
        v[0] = 10;
        assert_eq!(v[0], 10);
        v.as_mut_slice()[1] = 20;
        assert_eq!(v[1], 20);
        v.sort_unstable_by(|a, b| b.cmp(a));
        assert_eq!(v.as_slice(), &[20, 10, 3]);
    }

    #[test]
    fn test_vec_insert_many_in_middle() {
        let mut v: SmallVec<i32, 4> = SmallVec::from_iter([1, 5]);
        v.insert_many(1, [2, 3, 4]);
        assert_eq!(v.as_slice(), &[1, 2, 3, 4, 5]);
        v.remove_range(1, 4);
        assert_eq!(v.as_slice(), &[1, 5]);
    }

    #[test]
    fn test_vec_insert_many_panicking_iterator_restores() {
        let mut v: SmallVec<String, 4> = SmallVec::from_iter(["a", "d"].map(String::from));
        let result = catch_unwind(AssertUnwindSafe(|| {
            v.insert_many(
                1,
                (0..2).map(|i| {
                    if i == 1 {
                        panic!("source failed");
                    }
                    String::from("b")
                }),
            );
        }));
        assert!(result.is_err());
        assert_eq!(v.as_slice(), &["a", "d"]);
    }

    #[test]
    fn test_vec_static_fill_to_capacity() {
        let mut v: StaticVec<u8, 3> = StaticVec::new();
        v.push(1);
        v.push(2);
        v.push(3);
        assert!(v.is_full());
        assert_eq!(v.available(), 0);
        assert!(v.try_push(4).is_err());
        assert_eq!(v.as_slice(), &[1, 2, 3]);
    }

    #[test]
    #[should_panic(expected = "fixed capacity of 2 elements exhausted")]
    fn test_vec_static_push_past_capacity_panics() {
        let mut v: StaticVec<u8, 2> = StaticVec::new();
        v.extend([1, 2, 3]);
    }

    #[test]
    fn test_vec_assign_take_and_swap() {
        let alloc: CountingAlloc = CountingAlloc::new(7);
        let mut a: SmallVec<i32, 2, _> = SmallVec::new_in(alloc.clone());
        a.extend([1, 2, 3, 4]);
        let mut b: SmallVec<i32, 2, _> = SmallVec::new_in(alloc.clone());
        b.push(9);
        b.swap(&mut a);
        assert_eq!(a.as_slice(), &[9]);
        assert_eq!(b.as_slice(), &[1, 2, 3, 4]);
        a.assign_take(&mut b);
        assert_eq!(a.as_slice(), &[1, 2, 3, 4]);
        assert!(b.is_empty());
        assert_eq!(a.allocator().id, 7);
        drop(a);
        drop(b);
        assert_eq!(alloc.live_bytes(), 0);
    }

    #[test]
    fn test_vec_clone_from_reuses_capacity() {
        let src: SmallVec<i32, 2> = SmallVec::from_iter(0..6);
        let mut dst: SmallVec<i32, 2> = SmallVec::with_capacity(16);
        dst.clone_from(&src);
        assert_eq!(dst.capacity(), 16);
        assert_eq!(dst, src);
    }

    #[test]
    fn test_vec_ordering_and_hash() {
        use std::collections::hash_map::DefaultHasher;
        let a: SmallVec<i32, 2> = SmallVec::from_slice(&[1, 2]);
        let b: SmallVec<i32, 2> = SmallVec::from_slice(&[1, 3]);
        assert!(a < b);
        let hash = |v: &SmallVec<i32, 2>| {
            let mut h = DefaultHasher::new();
            v.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&a), hash(&a.clone()));
        assert_eq!(format!("{:?}", a), "[1, 2]");
    }
}
