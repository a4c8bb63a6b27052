//! Storage backends and the buffer operations shared by every container.
//!
//! A [`Storage`] is a contiguous buffer with a length and a capacity. Two
//! backends exist:
//!
//! * [`InlineStorage<T, N>`](inline::InlineStorage): exactly `N` slots inside
//!   the object; asking for more is a precondition failure.
//! * [`HybridStorage<T, N, A>`](hybrid::HybridStorage): `N` inline slots, then
//!   a heap buffer from allocator `A` once they run out.
//!
//! Everything else (gap opening, erasing, retain, extension) is written once
//! here as provided methods, so containers only depend on the trait.
//!
//! # Exception safety
//! * Growth allocates the new buffer before touching the old one; relocation
//!   is a bitwise move and cannot fail, so a failed growth leaves the buffer
//!   exactly as it was.
//! * [`insert_space`](Storage::insert_space) hands out a [`Gap`] guard. If the
//!   code filling the gap panics (or the guard is dropped uncommitted), the
//!   partially written values are destroyed and the tail is moved back.
//! * While a multi-step operation is in flight the recorded length only
//!   covers values that are certainly live, so a panic can leak values but
//!   never drop one twice.

pub mod hybrid;
pub mod inline;

use core::mem;
use core::ptr;
use core::slice;

use crate::error::{CollectionError, Result};
use crate::utils::memory::{destroy_range, uninitialized_clone, uninitialized_fill};

pub use hybrid::HybridStorage;
pub use inline::InlineStorage;

/// Upper bound on the inline footprint of any container, in bytes.
///
/// Inline storage lives wherever the container lives (often the stack); the
/// constructors refuse to compile when `N` slots of `T` would exceed this.
pub const MAX_INLINE_BYTES: usize = 16 * 1024;

/// Heap capacity multiplier applied when a buffer must grow.
pub const GROWTH_FACTOR: usize = 2;

/// Smallest heap buffer ever allocated by growth.
pub const MIN_HEAP_CAPACITY: usize = 4;

/// A contiguous element buffer.
///
/// # Safety
/// Implementors guarantee that `as_ptr()`/`as_mut_ptr()` address at least
/// `capacity()` properly aligned slots, that the first `len()` of them hold
/// live values, and that successful `try_grow*` calls preserve those values
/// (in order) while raising the capacity to at least the requested amount.
pub unsafe trait Storage {
    type Item;

    /// `false` for fixed-capacity backends.
    const GROWABLE: bool;

    fn len(&self) -> usize;

    /// # Safety
    /// The first `len` slots must hold live values and `len <= capacity()`.
    unsafe fn set_len(&mut self, len: usize);

    fn capacity(&self) -> usize;

    /// Number of slots available without touching the heap.
    fn inline_capacity(&self) -> usize;

    /// `true` while the elements live in the inline slots.
    fn is_inline(&self) -> bool;

    fn as_ptr(&self) -> *const Self::Item;

    fn as_mut_ptr(&mut self) -> *mut Self::Item;

    /// Raises capacity to at least `min_capacity`, applying the growth policy.
    fn try_grow(&mut self, min_capacity: usize) -> Result<()>;

    /// Raises capacity to at least `min_capacity` without over-allocating.
    fn try_grow_exact(&mut self, min_capacity: usize) -> Result<()>;

    /// Releases spare capacity. See the backend for the exact policy.
    fn shrink_to_fit(&mut self);

    // --- provided operations ---

    #[inline(always)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots left before the next growth.
    #[inline]
    fn available(&self) -> usize {
        self.capacity() - self.len()
    }

    #[inline]
    fn is_full(&self) -> bool {
        self.len() == self.capacity()
    }

    #[inline(always)]
    fn as_slice(&self) -> &[Self::Item] {
        unsafe { slice::from_raw_parts(self.as_ptr(), self.len()) }
    }

    #[inline(always)]
    fn as_mut_slice(&mut self) -> &mut [Self::Item] {
        let len = self.len();
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr(), len) }
    }

    /// Ensures room for `additional` more elements.
    fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let needed = self
            .len()
            .checked_add(additional)
            .ok_or(CollectionError::capacity_overflow(usize::MAX))?;
        if needed > self.capacity() {
            self.try_grow(needed)
        } else {
            Ok(())
        }
    }

    /// Ensures room for exactly `additional` more elements.
    fn try_reserve_exact(&mut self, additional: usize) -> Result<()> {
        let needed = self
            .len()
            .checked_add(additional)
            .ok_or(CollectionError::capacity_overflow(usize::MAX))?;
        if needed > self.capacity() {
            self.try_grow_exact(needed)
        } else {
            Ok(())
        }
    }

    /// Appends `value`, growing first if needed.
    #[inline]
    fn try_push(&mut self, value: Self::Item) -> Result<()> {
        let len = self.len();
        if len == self.capacity() {
            self.try_grow(len + 1)?;
        }
        unsafe {
            ptr::write(self.as_mut_ptr().add(len), value);
            self.set_len(len + 1);
        }
        Ok(())
    }

    #[inline]
    fn pop(&mut self) -> Option<Self::Item> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        unsafe {
            self.set_len(len - 1);
            Some(ptr::read(self.as_ptr().add(len - 1)))
        }
    }

    /// Opens `n` uninitialized slots at `pos`, growing first if needed.
    ///
    /// Fails (with the buffer untouched) only if growth fails.
    ///
    /// # Panics
    /// Panics if `pos > len()`.
    fn insert_space(&mut self, pos: usize, n: usize) -> Result<Gap<'_, Self>>
    where
        Self: Sized,
    {
        let len = self.len();
        assert!(pos <= len, "insertion index {pos} out of bounds (len {len})");
        self.try_reserve(n)?;
        let tail = len - pos;
        unsafe {
            let base = self.as_mut_ptr();
            ptr::copy(base.add(pos), base.add(pos + n), tail);
            // Only the prefix is certainly live until the gap is committed.
            self.set_len(pos);
        }
        Ok(Gap {
            storage: self,
            pos,
            width: n,
            filled: 0,
            tail,
        })
    }

    /// Inserts one value at `pos`, shifting the tail right.
    fn try_insert(&mut self, pos: usize, value: Self::Item) -> Result<()>
    where
        Self: Sized,
    {
        let mut gap = self.insert_space(pos, 1)?;
        gap.push(value);
        gap.commit();
        Ok(())
    }

    /// Drops the `n` values at `pos..pos + n` and closes the hole. Never reallocates.
    ///
    /// # Panics
    /// Panics if the range is out of bounds.
    fn erase_space(&mut self, pos: usize, n: usize) {
        let len = self.len();
        assert!(
            pos <= len && n <= len - pos,
            "erase range {pos}..{} out of bounds (len {len})",
            pos.saturating_add(n)
        );
        unsafe {
            self.set_len(pos);
            let base = self.as_mut_ptr();
            destroy_range(base.add(pos), n);
            ptr::copy(base.add(pos + n), base.add(pos), len - pos - n);
            self.set_len(len - n);
        }
    }

    /// Removes and returns the value at `pos`, shifting the tail left.
    fn remove(&mut self, pos: usize) -> Self::Item {
        let len = self.len();
        assert!(pos < len, "removal index {pos} out of bounds (len {len})");
        unsafe {
            let base = self.as_mut_ptr();
            let value = ptr::read(base.add(pos));
            ptr::copy(base.add(pos + 1), base.add(pos), len - pos - 1);
            self.set_len(len - 1);
            value
        }
    }

    /// Removes the value at `pos`, moving the last element into its place.
    fn swap_remove(&mut self, pos: usize) -> Self::Item {
        let len = self.len();
        assert!(pos < len, "removal index {pos} out of bounds (len {len})");
        unsafe {
            let base = self.as_mut_ptr();
            let value = ptr::read(base.add(pos));
            ptr::copy(base.add(len - 1), base.add(pos), 1);
            self.set_len(len - 1);
            value
        }
    }

    fn truncate(&mut self, new_len: usize) {
        let len = self.len();
        if new_len < len {
            unsafe {
                self.set_len(new_len);
                destroy_range(self.as_mut_ptr().add(new_len), len - new_len);
            }
        }
    }

    #[inline]
    fn clear(&mut self) {
        self.truncate(0);
    }

    /// Keeps only the values for which `keep` returns `true`, preserving order.
    fn retain_mut<F>(&mut self, mut keep: F)
    where
        Self: Sized,
        F: FnMut(&mut Self::Item) -> bool,
    {
        struct Compactor<'a, S: Storage> {
            storage: &'a mut S,
            processed: usize,
            deleted: usize,
            original: usize,
        }

        impl<S: Storage> Drop for Compactor<'_, S> {
            fn drop(&mut self) {
                unsafe {
                    if self.deleted > 0 {
                        let base = self.storage.as_mut_ptr();
                        ptr::copy(
                            base.add(self.processed),
                            base.add(self.processed - self.deleted),
                            self.original - self.processed,
                        );
                    }
                    self.storage.set_len(self.original - self.deleted);
                }
            }
        }

        let original = self.len();
        unsafe { self.set_len(0) };
        let mut c = Compactor {
            storage: self,
            processed: 0,
            deleted: 0,
            original,
        };
        while c.processed < original {
            unsafe {
                let cur = c.storage.as_mut_ptr().add(c.processed);
                if !keep(&mut *cur) {
                    c.processed += 1;
                    c.deleted += 1;
                    ptr::drop_in_place(cur);
                    continue;
                }
                if c.deleted > 0 {
                    ptr::copy_nonoverlapping(cur, cur.sub(c.deleted), 1);
                }
                c.processed += 1;
            }
        }
    }

    /// Appends every value of `iter`.
    ///
    /// If growth fails part way the values appended so far stay.
    fn try_extend<I>(&mut self, iter: I) -> Result<()>
    where
        I: IntoIterator<Item = Self::Item>,
    {
        let iter = iter.into_iter();
        let (lower, _) = iter.size_hint();
        self.try_reserve(lower)?;
        for value in iter {
            self.try_push(value)?;
        }
        Ok(())
    }

    /// Appends clones of `src`.
    fn try_extend_from_slice(&mut self, src: &[Self::Item]) -> Result<()>
    where
        Self::Item: Clone,
    {
        self.try_reserve(src.len())?;
        let len = self.len();
        unsafe {
            uninitialized_clone(src, self.as_mut_ptr().add(len));
            self.set_len(len + src.len());
        }
        Ok(())
    }

    /// Appends `n` clones of `value`.
    fn try_extend_fill(&mut self, n: usize, value: &Self::Item) -> Result<()>
    where
        Self::Item: Clone,
    {
        self.try_reserve(n)?;
        let len = self.len();
        unsafe {
            uninitialized_fill(self.as_mut_ptr().add(len), n, value);
            self.set_len(len + n);
        }
        Ok(())
    }
}

/// A run of uninitialized slots opened by [`Storage::insert_space`].
///
/// Fill it front to back with [`push`](Gap::push), then [`commit`](Gap::commit).
/// Slots left unfilled at commit time are closed. Dropping the guard without
/// committing rolls the buffer back to its state before `insert_space`.
pub struct Gap<'a, S: Storage> {
    storage: &'a mut S,
    pos: usize,
    width: usize,
    filled: usize,
    tail: usize,
}

impl<S: Storage> Gap<'_, S> {
    /// Index of the first slot of the gap.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Slots still waiting for a value.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.width - self.filled
    }

    /// Writes the next slot.
    ///
    /// # Panics
    /// Panics if the gap is already full.
    #[inline]
    pub fn push(&mut self, value: S::Item) {
        assert!(self.filled < self.width, "gap already filled");
        unsafe {
            ptr::write(
                self.storage.as_mut_ptr().add(self.pos + self.filled),
                value,
            );
        }
        self.filled += 1;
    }

    /// Makes the filled slots part of the buffer and returns the gap position.
    pub fn commit(self) -> usize {
        let pos = self.pos;
        unsafe {
            let base = self.storage.as_mut_ptr();
            if self.filled < self.width {
                ptr::copy(
                    base.add(pos + self.width),
                    base.add(pos + self.filled),
                    self.tail,
                );
            }
            self.storage.set_len(pos + self.filled + self.tail);
        }
        mem::forget(self);
        pos
    }
}

impl<S: Storage> Drop for Gap<'_, S> {
    fn drop(&mut self) {
        unsafe {
            let base = self.storage.as_mut_ptr();
            destroy_range(base.add(self.pos), self.filled);
            ptr::copy(base.add(self.pos + self.width), base.add(self.pos), self.tail);
            self.storage.set_len(self.pos + self.tail);
        }
    }
}

/// Owning iterator over the values of a storage backend.
pub struct IntoIter<S: Storage> {
    storage: S,
    front: usize,
    back: usize,
}

impl<S: Storage> IntoIter<S> {
    pub(crate) fn new(mut storage: S) -> Self {
        let back = storage.len();
        // The iterator owns the values from here on.
        unsafe { storage.set_len(0) };
        Self {
            storage,
            front: 0,
            back,
        }
    }

    /// The values not yet yielded.
    pub fn as_slice(&self) -> &[S::Item] {
        unsafe {
            slice::from_raw_parts(self.storage.as_ptr().add(self.front), self.back - self.front)
        }
    }
}

impl<S: Storage> Iterator for IntoIter<S> {
    type Item = S::Item;

    #[inline]
    fn next(&mut self) -> Option<S::Item> {
        if self.front == self.back {
            return None;
        }
        let value = unsafe { ptr::read(self.storage.as_ptr().add(self.front)) };
        self.front += 1;
        Some(value)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.back - self.front;
        (n, Some(n))
    }
}

impl<S: Storage> DoubleEndedIterator for IntoIter<S> {
    #[inline]
    fn next_back(&mut self) -> Option<S::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { ptr::read(self.storage.as_ptr().add(self.back)) })
    }
}

impl<S: Storage> ExactSizeIterator for IntoIter<S> {}

impl<S: Storage> Drop for IntoIter<S> {
    fn drop(&mut self) {
        unsafe {
            destroy_range(
                self.storage.as_mut_ptr().add(self.front),
                self.back - self.front,
            );
        }
    }
}
