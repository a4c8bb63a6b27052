//! Inline-first storage that spills to an allocator.
//!
//! [`HybridStorage<T, N, A>`] keeps up to `N` values in a `[MaybeUninit<T>; N]`
//! array inside the object. The first time more room is needed it allocates
//! a heap buffer from `A`, relocates the values and stays in heap mode from
//! then on; only [`shrink_to_fit`](Storage::shrink_to_fit) brings it back.
//!
//! # Growth policy
//! ```text
//! grow(min):
//!     if min <= capacity: done
//!     new_cap = max(min, capacity * GROWTH_FACTOR, MIN_HEAP_CAPACITY)
//!     new = alloc(new_cap)              // failure: nothing changed
//!     relocate len values old -> new   // bitwise, cannot fail
//!     free old if it was a heap buffer // inline slots are just abandoned
//! ```
//!
//! # Shrink policy
//! `shrink_to_fit` returns to inline mode whenever `len <= N`; otherwise it
//! reallocates to exactly `len` (keeping the old buffer if that allocation
//! fails).

use core::fmt;
use core::mem::{self, ManuallyDrop, MaybeUninit};
use core::ptr::{self, NonNull};

use super::{GROWTH_FACTOR, IntoIter, MAX_INLINE_BYTES, MIN_HEAP_CAPACITY, Storage};
use crate::error::{Result, infallible};
use crate::utils::alloc::{ContainerAlloc, Global};
use crate::utils::memory::{allocate, deallocate, destroy_range, uninitialized_move};

/// Storage union; `on_heap` says which field is active.
union Data<T, const N: usize> {
    inline: ManuallyDrop<[MaybeUninit<T>; N]>,
    heap: NonNull<T>,
}

/// A buffer with `N` inline slots and an allocator-backed overflow.
pub struct HybridStorage<T, const N: usize, A: ContainerAlloc = Global> {
    len: usize,
    /// `N` in inline mode, the heap buffer size otherwise.
    capacity: usize,
    on_heap: bool,
    data: Data<T, N>,
    alloc: A,
}

unsafe impl<T: Send, const N: usize, A: ContainerAlloc + Send> Send for HybridStorage<T, N, A> {}
unsafe impl<T: Sync, const N: usize, A: ContainerAlloc + Sync> Sync for HybridStorage<T, N, A> {}

impl<T, const N: usize, A: ContainerAlloc + Default> HybridStorage<T, N, A> {
    /// Creates an empty buffer in inline mode.
    pub fn new() -> Self {
        Self::new_in(A::default())
    }
}

impl<T, const N: usize, A: ContainerAlloc + Default> Default for HybridStorage<T, N, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize, A: ContainerAlloc> HybridStorage<T, N, A> {
    const IS_ZST: bool = mem::size_of::<T>() == 0;

    /// Creates an empty buffer in inline mode that will spill into `alloc`.
    pub fn new_in(alloc: A) -> Self {
        const {
            assert!(
                mem::size_of::<[MaybeUninit<T>; N]>() <= MAX_INLINE_BYTES,
                "inline storage exceeds MAX_INLINE_BYTES; reduce N or box the element type"
            );
        }
        Self {
            len: 0,
            capacity: N,
            on_heap: false,
            data: Data {
                inline: ManuallyDrop::new([const { MaybeUninit::uninit() }; N]),
            },
            alloc,
        }
    }

    /// Creates a buffer that can hold `capacity` values without growing.
    ///
    /// Stays inline when `capacity <= N`.
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self> {
        let mut storage = Self::new_in(alloc);
        storage.try_grow_exact(capacity)?;
        Ok(storage)
    }

    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        infallible(Self::try_with_capacity_in(capacity, alloc))
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.alloc
    }

    #[inline(always)]
    fn ptr(&self) -> *const T {
        unsafe {
            if self.on_heap {
                self.data.heap.as_ptr()
            } else {
                (*self.data.inline).as_ptr() as *const T
            }
        }
    }

    #[inline(always)]
    fn mut_ptr(&mut self) -> *mut T {
        unsafe {
            if self.on_heap {
                self.data.heap.as_ptr()
            } else {
                (*self.data.inline).as_mut_ptr() as *mut T
            }
        }
    }

    /// Moves the values into a fresh heap buffer of `new_cap` slots.
    ///
    /// `new_cap` must exceed `N` and be at least `len`.
    #[inline(never)]
    fn relocate_to_heap(&mut self, new_cap: usize) -> Result<()> {
        debug_assert!(new_cap > N && new_cap >= self.len);
        let new_ptr = allocate::<T, A>(&self.alloc, new_cap)?;
        unsafe {
            uninitialized_move(self.ptr(), new_ptr.as_ptr(), self.len);
            if self.on_heap {
                deallocate(&self.alloc, self.data.heap, self.capacity);
            } else {
                log::trace!(
                    "spilling {} x {} to the heap (capacity {} -> {})",
                    self.len,
                    core::any::type_name::<T>(),
                    N,
                    new_cap
                );
            }
        }
        self.data.heap = new_ptr;
        self.on_heap = true;
        self.capacity = new_cap;
        Ok(())
    }

    /// Frees the heap buffer of an empty heap-mode storage and returns to inline mode.
    fn release_heap(&mut self) {
        debug_assert_eq!(self.len, 0);
        if self.on_heap {
            unsafe { deallocate(&self.alloc, self.data.heap, self.capacity) };
            self.on_heap = false;
            self.capacity = N;
        }
    }

    /// Moves all values out of `src`, leaving it empty and inline.
    ///
    /// When the allocators are interchangeable (equal, or propagating on move
    /// assignment) a heap buffer is adopted in O(1); otherwise the values are
    /// relocated into memory from `self`'s allocator and `src`'s buffer is freed.
    pub fn assign_take(&mut self, src: &mut Self) {
        self.clear();
        let propagate = A::PROPAGATION.on_move_assign;
        if propagate || self.alloc.is_equal(&src.alloc) {
            if src.on_heap {
                self.release_heap();
                self.data.heap = unsafe { src.data.heap };
                self.capacity = src.capacity;
                self.on_heap = true;
                self.len = src.len;
                src.on_heap = false;
                src.capacity = N;
                src.len = 0;
            } else {
                if propagate {
                    self.release_heap();
                }
                // `src.len <= N <= self.capacity`: no allocation needed.
                unsafe {
                    uninitialized_move(src.ptr(), self.mut_ptr(), src.len);
                }
                self.len = src.len;
                src.len = 0;
            }
            if propagate {
                self.alloc = src.alloc.clone();
            }
        } else {
            infallible(self.try_grow_exact(src.len));
            unsafe {
                uninitialized_move(src.ptr(), self.mut_ptr(), src.len);
            }
            self.len = src.len;
            src.len = 0;
            src.release_heap();
        }
    }

    /// Exchanges contents with `other`.
    ///
    /// Propagating or equal allocators swap buffers directly. Otherwise each
    /// side keeps its allocator and the values are relocated across.
    pub fn swap(&mut self, other: &mut Self) {
        if A::PROPAGATION.on_swap {
            mem::swap(self, other);
        } else if self.alloc.is_equal(&other.alloc) {
            mem::swap(&mut self.len, &mut other.len);
            mem::swap(&mut self.capacity, &mut other.capacity);
            mem::swap(&mut self.on_heap, &mut other.on_heap);
            mem::swap(&mut self.data, &mut other.data);
        } else {
            let mut parked = Self::new_in(self.alloc.clone());
            parked.assign_take(self);
            self.assign_take(other);
            other.assign_take(&mut parked);
        }
    }

    /// Clones the values into a new storage drawing from `alloc`.
    pub fn clone_in(&self, alloc: A) -> Self
    where
        T: Clone,
    {
        let mut out = Self::new_in(alloc);
        infallible(out.try_grow_exact(self.len));
        infallible(out.try_extend_from_slice(self.as_slice()));
        out
    }

    /// Consumes the storage, yielding its values in order.
    pub fn into_values(self) -> IntoIter<Self> {
        IntoIter::new(self)
    }
}

unsafe impl<T, const N: usize, A: ContainerAlloc> Storage for HybridStorage<T, N, A> {
    type Item = T;
    const GROWABLE: bool = true;

    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = len;
    }

    #[inline(always)]
    fn capacity(&self) -> usize {
        if Self::IS_ZST { usize::MAX } else { self.capacity }
    }

    #[inline(always)]
    fn inline_capacity(&self) -> usize {
        N
    }

    #[inline(always)]
    fn is_inline(&self) -> bool {
        !self.on_heap
    }

    #[inline(always)]
    fn as_ptr(&self) -> *const T {
        self.ptr()
    }

    #[inline(always)]
    fn as_mut_ptr(&mut self) -> *mut T {
        self.mut_ptr()
    }

    fn try_grow(&mut self, min_capacity: usize) -> Result<()> {
        if min_capacity <= self.capacity() {
            return Ok(());
        }
        let new_cap = min_capacity
            .max(self.capacity.saturating_mul(GROWTH_FACTOR))
            .max(MIN_HEAP_CAPACITY);
        self.relocate_to_heap(new_cap)
    }

    fn try_grow_exact(&mut self, min_capacity: usize) -> Result<()> {
        if min_capacity <= self.capacity() {
            return Ok(());
        }
        self.relocate_to_heap(min_capacity)
    }

    fn shrink_to_fit(&mut self) {
        if !self.on_heap || Self::IS_ZST {
            return;
        }
        if self.len <= N {
            let heap = unsafe { self.data.heap };
            let cap = self.capacity;
            unsafe {
                let inline = ptr::addr_of_mut!(self.data.inline) as *mut T;
                uninitialized_move(heap.as_ptr(), inline, self.len);
                deallocate(&self.alloc, heap, cap);
            }
            self.on_heap = false;
            self.capacity = N;
            log::trace!(
                "returned {} x {} to inline storage",
                self.len,
                core::any::type_name::<T>()
            );
        } else if self.capacity > self.len {
            // Failure to shrink is not an error: keep the larger buffer.
            let _ = self.relocate_to_heap(self.len);
        }
    }
}

impl<T, const N: usize, A: ContainerAlloc> Drop for HybridStorage<T, N, A> {
    fn drop(&mut self) {
        unsafe {
            destroy_range(self.mut_ptr(), self.len);
            if self.on_heap {
                deallocate(&self.alloc, self.data.heap, self.capacity);
            }
        }
    }
}

impl<T: Clone, const N: usize, A: ContainerAlloc> Clone for HybridStorage<T, N, A> {
    fn clone(&self) -> Self {
        self.clone_in(self.alloc.select_on_clone())
    }

    /// Reuses the existing buffer when it is large enough; adopts the source
    /// allocator first when it propagates on clone.
    fn clone_from(&mut self, src: &Self) {
        if A::PROPAGATION.on_clone && !self.alloc.is_equal(&src.alloc) {
            *self = src.clone_in(src.alloc.clone());
            return;
        }
        if A::PROPAGATION.on_clone {
            self.alloc = src.alloc.clone();
        }
        self.truncate(src.len);
        let common = self.len;
        self.as_mut_slice().clone_from_slice(&src.as_slice()[..common]);
        infallible(self.try_reserve_exact(src.len - common));
        infallible(self.try_extend_from_slice(&src.as_slice()[common..]));
    }
}

impl<T: fmt::Debug, const N: usize, A: ContainerAlloc> fmt::Debug for HybridStorage<T, N, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectionError;
    use crate::utils::testing::{CloneBomb, CountingAlloc, Dropper};
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    fn with_values<const N: usize, A: ContainerAlloc>(
        alloc: A,
        values: impl IntoIterator<Item = i32>,
    ) -> HybridStorage<i32, N, A> {
        let mut s = HybridStorage::new_in(alloc);
        s.try_extend(values).unwrap();
        s
    }

    #[test]
    fn test_hybrid_spill_on_fifth_element() {
        let mut s: HybridStorage<i32, 4> = HybridStorage::new();
        for i in 0..4 {
            s.try_push(i).unwrap();
        }
        assert!(s.is_inline());
        assert_eq!(s.capacity(), 4);
        s.try_push(4).unwrap();
        assert!(!s.is_inline());
        assert!(s.capacity() >= 5);
        assert_eq!(s.capacity(), 8);
        assert_eq!(s.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_hybrid_single_transition_and_growth_factor() {
        let mut s: HybridStorage<u64, 2> = HybridStorage::new();
        let mut transitions = 0;
        let mut caps = vec![s.capacity()];
        for i in 0..40 {
            let was_inline = s.is_inline();
            s.try_push(i).unwrap();
            if was_inline && !s.is_inline() {
                transitions += 1;
            }
            if *caps.last().unwrap() != s.capacity() {
                caps.push(s.capacity());
            }
        }
        assert_eq!(transitions, 1);
        assert_eq!(caps, vec![2, 4, 8, 16, 32, 64]);
        assert!(s.as_slice().iter().copied().eq(0..40));
    }

    #[test]
    fn test_hybrid_shrink_returns_inline_when_it_fits() {
        let mut s: HybridStorage<i32, 4> = HybridStorage::new();
        s.try_extend(0..5).unwrap();
        s.erase_space(0, 1);
        assert_eq!(s.len(), 4);
        s.shrink_to_fit();
        assert!(s.is_inline());
        assert_eq!(s.capacity(), 4);
        assert_eq!(s.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_hybrid_shrink_to_exact_on_heap() {
        let alloc: CountingAlloc = CountingAlloc::new(0);
        let mut s: HybridStorage<i32, 2, _> = HybridStorage::new_in(alloc.clone());
        for i in 0..9 {
            s.try_push(i).unwrap();
        }
        assert_eq!(s.capacity(), 16);
        s.shrink_to_fit();
        assert_eq!(s.capacity(), 9);
        assert!(!s.is_inline());
        assert_eq!(alloc.live_bytes(), 9 * 4);
        drop(s);
        assert_eq!(alloc.live_bytes(), 0);
    }

    #[test]
    fn test_hybrid_failed_growth_leaves_buffer_untouched() {
        let alloc: CountingAlloc = CountingAlloc::new(0);
        let mut s = with_values::<2, _>(alloc.clone(), [7, 8]);
        alloc.fail_after(0);
        let err = s.try_push(9).unwrap_err();
        assert!(matches!(err, CollectionError::AllocFailed { .. }));
        assert!(s.is_inline());
        assert_eq!(s.as_slice(), &[7, 8]);
        let err = s.insert_space(0, 1).err().unwrap();
        assert!(err.is_alloc_failure());
        assert_eq!(s.as_slice(), &[7, 8]);
    }

    #[test]
    fn test_hybrid_clone_all_mode_combinations() {
        // inline source -> inline clone, no allocation
        let alloc: CountingAlloc = CountingAlloc::new(0);
        let small = with_values::<4, _>(alloc.clone(), 0..3);
        let copy = small.clone();
        assert!(copy.is_inline());
        assert_eq!(alloc.allocations(), 0);
        assert_eq!(copy.as_slice(), small.as_slice());

        // heap source -> exact heap clone
        let big = with_values::<4, _>(alloc.clone(), 0..6);
        let copy = big.clone();
        assert!(!copy.is_inline());
        assert_eq!(copy.capacity(), 6);
        assert_eq!(copy.as_slice(), big.as_slice());

        // heap source shrunk below N -> clone fits inline
        let mut shrunk = big.clone();
        shrunk.truncate(2);
        let copy = shrunk.clone();
        assert!(copy.is_inline());

        // clone_from into a heap destination with enough room reuses it
        let mut dest = with_values::<4, _>(alloc.clone(), 0..10);
        let before = alloc.allocations();
        dest.clone_from(&big);
        assert_eq!(alloc.allocations(), before);
        assert_eq!(dest.as_slice(), big.as_slice());

        // clone_from into an inline destination that is too small allocates once
        let mut dest = with_values::<4, _>(alloc.clone(), 0..1);
        dest.clone_from(&big);
        assert!(!dest.is_inline());
        assert_eq!(dest.as_slice(), big.as_slice());
    }

    #[test]
    fn test_hybrid_clone_panic_leaks_nothing() {
        let budget = Rc::new(Cell::new(usize::MAX));
        let drops = Rc::new(Cell::new(0));
        let alloc: CountingAlloc = CountingAlloc::new(0);
        let mut s: HybridStorage<CloneBomb, 2, _> = HybridStorage::new_in(alloc.clone());
        for value in 0..6 {
            s.try_push(CloneBomb {
                value,
                budget: budget.clone(),
                drops: drops.clone(),
            })
            .unwrap();
        }
        let live_before = alloc.live_bytes();
        budget.set(4);
        let result = catch_unwind(AssertUnwindSafe(|| s.clone()));
        assert!(result.is_err());
        assert_eq!(drops.get(), 4);
        assert_eq!(alloc.live_bytes(), live_before);
        assert_eq!(s.len(), 6);
    }

    #[test]
    fn test_hybrid_assign_take_steals_heap_buffer() {
        let alloc: CountingAlloc = CountingAlloc::new(1);
        let mut src = with_values::<2, _>(alloc.clone(), 0..5);
        let mut dst = with_values::<2, _>(alloc.clone(), [42]);
        let allocations = alloc.allocations();
        dst.assign_take(&mut src);
        assert_eq!(alloc.allocations(), allocations);
        assert_eq!(dst.as_slice(), &[0, 1, 2, 3, 4]);
        assert!(src.is_empty());
        assert!(src.is_inline());
    }

    #[test]
    fn test_hybrid_assign_take_unequal_allocators_moves_elements() {
        let a: CountingAlloc = CountingAlloc::new(1);
        let b: CountingAlloc = CountingAlloc::new(2);
        let mut src = with_values::<2, _>(b.clone(), 0..5);
        let mut dst: HybridStorage<i32, 2, _> = HybridStorage::new_in(a.clone());
        dst.assign_take(&mut src);
        assert_eq!(dst.as_slice(), &[0, 1, 2, 3, 4]);
        assert_eq!(dst.allocator().id, 1);
        assert_eq!(b.live_bytes(), 0);
        assert_eq!(a.live_bytes(), 5 * 4);
    }

    #[test]
    fn test_hybrid_assign_take_propagating_adopts_allocator() {
        let a: CountingAlloc<true> = CountingAlloc::new(1);
        let b: CountingAlloc<true> = CountingAlloc::new(2);
        let mut src = with_values::<2, _>(b.clone(), 0..5);
        let mut dst = with_values::<2, _>(a.clone(), 0..3);
        dst.assign_take(&mut src);
        assert_eq!(dst.allocator().id, 2);
        assert_eq!(a.live_bytes(), 0);
        assert_eq!(dst.as_slice(), &[0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_hybrid_swap_mixed_modes() {
        let mut inline: HybridStorage<String, 2> = HybridStorage::new();
        inline.try_push("a".into()).unwrap();
        let mut heap: HybridStorage<String, 2> = HybridStorage::new();
        heap.try_extend(["x", "y", "z"].map(String::from)).unwrap();
        inline.swap(&mut heap);
        assert!(!inline.is_inline());
        assert!(heap.is_inline());
        assert_eq!(inline.as_slice(), &["x", "y", "z"]);
        assert_eq!(heap.as_slice(), &["a"]);
    }

    #[test]
    fn test_hybrid_swap_unequal_allocators_keeps_them() {
        let a: CountingAlloc = CountingAlloc::new(1);
        let b: CountingAlloc = CountingAlloc::new(2);
        let mut left = with_values::<2, _>(a.clone(), 0..4);
        let mut right = with_values::<2, _>(b.clone(), [9]);
        left.swap(&mut right);
        assert_eq!(left.as_slice(), &[9]);
        assert_eq!(right.as_slice(), &[0, 1, 2, 3]);
        assert_eq!(left.allocator().id, 1);
        assert_eq!(right.allocator().id, 2);
        drop(left);
        drop(right);
        assert_eq!(a.live_bytes(), 0);
        assert_eq!(b.live_bytes(), 0);
    }

    #[test]
    fn test_hybrid_drop_counts() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut s: HybridStorage<Dropper, 2> = HybridStorage::new();
            for _ in 0..3 {
                s.try_push(Dropper(drops.clone())).unwrap();
            }
            s.shrink_to_fit();
        }
        assert_eq!(drops.get(), 3);
    }

    #[test]
    fn test_hybrid_zero_sized_never_allocates() {
        let alloc: CountingAlloc = CountingAlloc::new(0);
        let mut s: HybridStorage<(), 0, _> = HybridStorage::new_in(alloc.clone());
        for _ in 0..100 {
            s.try_push(()).unwrap();
        }
        assert_eq!(s.len(), 100);
        assert_eq!(alloc.allocations(), 0);
    }

    #[test]
    fn test_hybrid_with_capacity() {
        let s: HybridStorage<i32, 4> = HybridStorage::with_capacity_in(3, Global);
        assert!(s.is_inline());
        let s: HybridStorage<i32, 4> = HybridStorage::with_capacity_in(10, Global);
        assert!(!s.is_inline());
        assert_eq!(s.capacity(), 10);
        assert_eq!(format!("{:?}", s), "[]");
    }
}
