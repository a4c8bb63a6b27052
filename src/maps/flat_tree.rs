//! Sorted-vector engine behind the flat maps and sets.
//!
//! [`FlatTree`] keeps its values in a [`Storage`] buffer sorted by the key
//! that [`KeyOf`] extracts, ordered by a [`Compare`] comparator. All lookups
//! are binary searches that report positions (indices); the facades turn
//! those into references.
//!
//! # Architecture & Pseudocode
//!
//! ## Unique insert
//! ```text
//! 1. pos = lower_bound(key(value))
//! 2. If pos < len and !(key < key(buf[pos])): return (pos, false)
//! 3. gap = buf.insert_space(pos, 1)      // may grow; failure leaves buf untouched
//! 4. gap.push(value); gap.commit()
//! 5. return (pos, true)
//! ```
//!
//! ## Hint validation (unique)
//! ```text
//! Case A  hint == len or value < key(hint):
//!           hint == 0 or key(hint-1) < value  -> insert at hint
//!           key(hint-1) == value              -> existing at hint-1
//!           otherwise                         -> full search
//! Case B  key(hint) == value                  -> existing at hint
//! Case C  key(hint) < value:
//!           hint+1 == len or value < key(hint+1) -> insert at hint+1
//!           otherwise                            -> full search
//! ```

use core::borrow::Borrow;
use core::marker::PhantomData;
use core::ops::Range;

use crate::error::Result;
use crate::storage::{IntoIter, Storage};
use crate::utils::compare::Compare;
pub use crate::utils::key_of::{Identity, KeyOf, MapKey};

/// A sorted sequence over storage `S`, keyed by `X`, ordered by `C`.
pub struct FlatTree<S: Storage, X, C> {
    buf: S,
    cmp: C,
    _key: PhantomData<X>,
}

impl<S, X, C> FlatTree<S, X, C>
where
    S: Storage,
    X: KeyOf<S::Item>,
    C: Compare<X::Key>,
{
    pub fn with_parts(buf: S, cmp: C) -> Self {
        Self {
            buf,
            cmp,
            _key: PhantomData,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.buf.available()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.buf.is_full()
    }

    #[inline]
    pub fn is_inline(&self) -> bool {
        self.buf.is_inline()
    }

    #[inline(always)]
    pub fn as_slice(&self) -> &[S::Item] {
        self.buf.as_slice()
    }

    /// Mutable view of the values.
    ///
    /// Callers must not change the keys' relative order.
    #[inline(always)]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [S::Item] {
        self.buf.as_mut_slice()
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    pub(crate) fn storage(&self) -> &S {
        &self.buf
    }

    pub(crate) fn storage_mut(&mut self) -> &mut S {
        &mut self.buf
    }

    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        self.buf.try_reserve(additional)
    }

    pub fn shrink_to_fit(&mut self) {
        self.buf.shrink_to_fit();
    }

    pub fn clear(&mut self) {
        self.buf.clear();
    }

    #[inline(always)]
    fn key_at(&self, pos: usize) -> &X::Key {
        X::key(&self.buf.as_slice()[pos])
    }

    /// First position whose key is not less than `key`.
    pub fn lower_bound<Q>(&self, key: &Q) -> usize
    where
        X::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.buf
            .as_slice()
            .partition_point(|v| self.cmp.less(X::key(v).borrow(), key))
    }

    /// First position whose key is greater than `key`.
    pub fn upper_bound<Q>(&self, key: &Q) -> usize
    where
        X::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.buf
            .as_slice()
            .partition_point(|v| !self.cmp.less(key, X::key(v).borrow()))
    }

    /// Positions of all values whose key is equivalent to `key`.
    pub fn equal_range<Q>(&self, key: &Q) -> Range<usize>
    where
        X::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let lo = self.lower_bound(key);
        let slice = &self.buf.as_slice()[lo..];
        let hi = lo + slice.partition_point(|v| !self.cmp.less(key, X::key(v).borrow()));
        lo..hi
    }

    /// Position of the first value equivalent to `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<usize>
    where
        X::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let pos = self.lower_bound(key);
        if pos < self.len() && !self.cmp.less(key, self.key_at(pos).borrow()) {
            Some(pos)
        } else {
            None
        }
    }

    pub fn count<Q>(&self, key: &Q) -> usize
    where
        X::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        self.equal_range(key).len()
    }

    /// Where `key` is (`Ok`) or would be inserted (`Err`) in a unique tree.
    pub fn search<Q>(&self, key: &Q) -> core::result::Result<usize, usize>
    where
        X::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let pos = self.lower_bound(key);
        if pos < self.len() && !self.cmp.less(key, self.key_at(pos).borrow()) {
            Ok(pos)
        } else {
            Err(pos)
        }
    }

    /// Builds a value in a freshly opened slot at `pos`.
    ///
    /// If `make` panics the tree is left exactly as it was.
    pub(crate) fn try_emplace_at<F>(&mut self, pos: usize, make: F) -> Result<usize>
    where
        F: FnOnce() -> S::Item,
    {
        let mut gap = self.buf.insert_space(pos, 1)?;
        gap.push(make());
        Ok(gap.commit())
    }

    /// Inserts `value` unless an equivalent key is present.
    ///
    /// Returns the position of the new or existing value and whether it was inserted.
    pub fn try_insert_unique(&mut self, value: S::Item) -> Result<(usize, bool)> {
        match self.search(X::key(&value)) {
            Ok(pos) => Ok((pos, false)),
            Err(pos) => Ok((self.try_emplace_at(pos, || value)?, true)),
        }
    }

    /// Inserts `value` after every equivalent key.
    pub fn try_insert_multi(&mut self, value: S::Item) -> Result<usize> {
        let pos = self.upper_bound(X::key(&value));
        self.try_emplace_at(pos, || value)
    }

    /// Resolves a unique-insert position from a caller-supplied hint.
    ///
    /// Returns `Ok(pos)` for an existing equivalent key, `Err(pos)` for the
    /// insertion point.
    fn hinted_position(&self, hint: usize, key: &X::Key) -> core::result::Result<usize, usize> {
        let len = self.len();
        let hint = hint.min(len);
        if hint == len || self.cmp.less(key, self.key_at(hint)) {
            if hint == 0 {
                return Err(0);
            }
            let prev = self.key_at(hint - 1);
            if self.cmp.less(prev, key) {
                return Err(hint);
            }
            if !self.cmp.less(key, prev) {
                return Ok(hint - 1);
            }
        } else if !self.cmp.less(self.key_at(hint), key) {
            return Ok(hint);
        } else if hint + 1 == len || self.cmp.less(key, self.key_at(hint + 1)) {
            return Err(hint + 1);
        }
        self.search(key)
    }

    /// Unique insert that first tries the slot next to `hint`.
    pub fn try_insert_unique_hint(&mut self, hint: usize, value: S::Item) -> Result<(usize, bool)> {
        match self.hinted_position(hint, X::key(&value)) {
            Ok(pos) => Ok((pos, false)),
            Err(pos) => Ok((self.try_emplace_at(pos, || value)?, true)),
        }
    }

    /// Multi insert at `hint` when that keeps the order, else after the
    /// equivalent keys.
    pub fn try_insert_multi_hint(&mut self, hint: usize, value: S::Item) -> Result<usize> {
        let len = self.len();
        let hint = hint.min(len);
        let key = X::key(&value);
        let fits_after_prev = hint == 0 || !self.cmp.less(key, self.key_at(hint - 1));
        let fits_before_next = hint == len || !self.cmp.less(self.key_at(hint), key);
        let pos = if fits_after_prev && fits_before_next {
            hint
        } else {
            self.upper_bound(key)
        };
        self.try_emplace_at(pos, || value)
    }

    /// Inserts `value` at `pos` without searching.
    ///
    /// # Panics
    /// Debug builds panic if `pos` would break the ordering (or, with
    /// `unique`, duplicate a neighbour's key).
    pub fn try_insert_exactly_at(&mut self, pos: usize, value: S::Item, unique: bool) -> Result<usize> {
        debug_assert!(pos <= self.len(), "position {pos} out of bounds");
        debug_assert!(
            self.fits_at(pos, X::key(&value), unique),
            "insert_exactly_at: position {pos} breaks the sort order"
        );
        self.try_emplace_at(pos, || value)
    }

    fn fits_at(&self, pos: usize, key: &X::Key, unique: bool) -> bool {
        let after_prev = pos == 0 || {
            let prev = self.key_at(pos - 1);
            if unique {
                self.cmp.less(prev, key)
            } else {
                !self.cmp.less(key, prev)
            }
        };
        let before_next = pos == self.len() || {
            let next = self.key_at(pos);
            if unique {
                self.cmp.less(key, next)
            } else {
                !self.cmp.less(next, key)
            }
        };
        after_prev && before_next
    }

    /// Removes the value at `pos`.
    ///
    /// # Panics
    /// Panics if `pos >= len`.
    pub fn remove_at(&mut self, pos: usize) -> S::Item {
        self.buf.remove(pos)
    }

    /// Drops the values in `range`.
    pub fn remove_range(&mut self, range: Range<usize>) {
        assert!(
            range.start <= range.end,
            "range start {} is after end {}",
            range.start,
            range.end
        );
        self.buf.erase_space(range.start, range.end - range.start);
    }

    /// Removes the value equivalent to `key`, if any.
    pub fn remove_unique<Q>(&mut self, key: &Q) -> Option<S::Item>
    where
        X::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let pos = self.find(key)?;
        Some(self.buf.remove(pos))
    }

    /// Erases the value equivalent to `key`; returns the number erased (0 or 1).
    pub fn erase_key_unique<Q>(&mut self, key: &Q) -> usize
    where
        X::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        match self.find(key) {
            Some(pos) => {
                self.buf.erase_space(pos, 1);
                1
            }
            None => 0,
        }
    }

    /// Erases every value equivalent to `key`; returns the number erased.
    pub fn erase_key_multi<Q>(&mut self, key: &Q) -> usize
    where
        X::Key: Borrow<Q>,
        C: Compare<Q>,
        Q: ?Sized,
    {
        let range = self.equal_range(key);
        let n = range.len();
        self.buf.erase_space(range.start, n);
        n
    }

    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&mut S::Item) -> bool,
    {
        self.buf.retain_mut(f);
    }

    /// Gives up the tree, yielding its values in order.
    pub fn into_values(self) -> IntoIter<S> {
        IntoIter::new(self.buf)
    }

    /// `true` if every adjacent pair is ordered (strictly, with `unique`).
    pub fn is_sorted(&self, unique: bool) -> bool {
        self.buf.as_slice().windows(2).all(|w| {
            let (a, b) = (X::key(&w[0]), X::key(&w[1]));
            if unique {
                self.cmp.less(a, b)
            } else {
                !self.cmp.less(b, a)
            }
        })
    }
}

impl<S, X, C> FlatTree<S, X, C>
where
    S: Storage + Default,
    X: KeyOf<S::Item>,
    C: Compare<X::Key> + Default,
{
    pub fn new() -> Self {
        Self::with_parts(S::default(), C::default())
    }
}

impl<S, X, C> Clone for FlatTree<S, X, C>
where
    S: Storage + Clone,
    C: Clone,
{
    fn clone(&self) -> Self {
        Self {
            buf: self.buf.clone(),
            cmp: self.cmp.clone(),
            _key: PhantomData,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        self.buf.clone_from(&source.buf);
        self.cmp.clone_from(&source.cmp);
    }
}
