//! Allocator-aware memory primitives.
//!
//! Typed allocate/deallocate plus the construct/destroy family every buffer in
//! the crate is built from. The `uninitialized_*` constructors write into raw
//! memory and, if an element constructor panics part way, destroy exactly the
//! elements they already built before the panic continues.

use core::mem;
use core::ptr::{self, NonNull};

use crate::error::{CollectionError, Result};
use crate::utils::alloc::{Allocator, Layout};

/// Layout of an array of `n` values of `T`.
#[inline]
pub fn array_layout<T>(n: usize) -> Result<Layout> {
    Layout::array::<T>(n).map_err(|_| CollectionError::capacity_overflow(n))
}

/// Allocates uninitialized room for `n` values of `T`.
///
/// Zero-sized requests (zero `n` or zero-sized `T`) never reach the allocator
/// and return a dangling, well-aligned pointer.
pub fn allocate<T, A: Allocator + ?Sized>(alloc: &A, n: usize) -> Result<NonNull<T>> {
    let layout = array_layout::<T>(n)?;
    if layout.size() == 0 {
        return Ok(NonNull::dangling());
    }
    match alloc.allocate(layout) {
        Ok(block) => Ok(block.cast()),
        Err(_) => {
            log::debug!(
                "allocation of {} x {} failed ({} bytes)",
                n,
                core::any::type_name::<T>(),
                layout.size()
            );
            Err(CollectionError::alloc_failed(layout))
        }
    }
}

/// Releases memory obtained from [`allocate`].
///
/// # Safety
/// `ptr` must come from `allocate::<T, _>(alloc, n)` with an allocator that
/// [`is_equal`](crate::utils::alloc::ContainerAlloc::is_equal) to `alloc`, and
/// the same `n`. Live values in the block are not dropped.
pub unsafe fn deallocate<T, A: Allocator + ?Sized>(alloc: &A, ptr: NonNull<T>, n: usize) {
    let size = mem::size_of::<T>() * n;
    if size == 0 {
        return;
    }
    // SAFETY: the same layout was valid when the block was allocated.
    unsafe {
        let layout = Layout::from_size_align_unchecked(size, mem::align_of::<T>());
        alloc.deallocate(ptr.cast(), layout);
    }
}

/// Writes `value` into uninitialized memory.
///
/// # Safety
/// `dst` must be valid for writes and properly aligned.
#[inline(always)]
pub unsafe fn construct_at<T>(dst: *mut T, value: T) {
    unsafe { ptr::write(dst, value) }
}

/// Drops the value at `p` in place.
///
/// # Safety
/// `p` must point to a live value that is not used afterwards.
#[inline(always)]
pub unsafe fn destroy_at<T>(p: *mut T) {
    unsafe { ptr::drop_in_place(p) }
}

/// Drops `n` consecutive values starting at `first`.
///
/// # Safety
/// All `n` values must be live and not used afterwards.
#[inline]
pub unsafe fn destroy_range<T>(first: *mut T, n: usize) {
    if mem::needs_drop::<T>() && n > 0 {
        unsafe { ptr::drop_in_place(ptr::slice_from_raw_parts_mut(first, n)) }
    }
}

/// Tracks a run of values being constructed at `base`.
///
/// Dropping the guard destroys the `initialized` prefix; [`finish`](Self::finish)
/// disarms it once the run is complete.
pub struct InitGuard<T> {
    base: *mut T,
    initialized: usize,
}

impl<T> InitGuard<T> {
    /// Starts an empty run at `base`.
    pub fn new(base: *mut T) -> Self {
        Self {
            base,
            initialized: 0,
        }
    }

    /// Constructs the next value of the run.
    ///
    /// # Safety
    /// The slot after the initialized prefix must be valid for writes.
    #[inline(always)]
    pub unsafe fn push(&mut self, value: T) {
        unsafe { construct_at(self.base.add(self.initialized), value) };
        self.initialized += 1;
    }

    /// Number of values constructed so far.
    pub fn initialized(&self) -> usize {
        self.initialized
    }

    /// Hands ownership of the constructed values to the caller.
    pub fn finish(self) -> usize {
        let n = self.initialized;
        mem::forget(self);
        n
    }
}

impl<T> Drop for InitGuard<T> {
    fn drop(&mut self) {
        // SAFETY: exactly `initialized` values were written at `base`.
        unsafe { destroy_range(self.base, self.initialized) }
    }
}

/// Clones `value` into `n` uninitialized slots at `dst`.
///
/// # Safety
/// `dst` must be valid for `n` writes. On panic the slots are uninitialized again.
pub unsafe fn uninitialized_fill<T: Clone>(dst: *mut T, n: usize, value: &T) {
    let mut guard = InitGuard::new(dst);
    for _ in 0..n {
        unsafe { guard.push(value.clone()) };
    }
    guard.finish();
}

/// Clones `src` into uninitialized memory at `dst`.
///
/// # Safety
/// `dst` must be valid for `src.len()` writes and must not overlap `src`.
pub unsafe fn uninitialized_clone<T: Clone>(src: &[T], dst: *mut T) {
    let mut guard = InitGuard::new(dst);
    for item in src {
        unsafe { guard.push(item.clone()) };
    }
    guard.finish();
}

/// Constructs `n` values produced by `f(index)` at `dst`.
///
/// # Safety
/// `dst` must be valid for `n` writes. On panic the slots are uninitialized again.
pub unsafe fn uninitialized_construct<T, F>(dst: *mut T, n: usize, mut f: F)
where
    F: FnMut(usize) -> T,
{
    let mut guard = InitGuard::new(dst);
    for i in 0..n {
        unsafe { guard.push(f(i)) };
    }
    guard.finish();
}

/// Relocates `n` values from `src` to uninitialized `dst`.
///
/// After the call the source slots are logically uninitialized. Relocation is a
/// bitwise copy and cannot fail part way.
///
/// # Safety
/// `src` must hold `n` live values, `dst` must be valid for `n` writes, and the
/// two ranges must not overlap.
#[inline]
pub unsafe fn uninitialized_move<T>(src: *const T, dst: *mut T, n: usize) {
    unsafe { ptr::copy_nonoverlapping(src, dst, n) }
}
