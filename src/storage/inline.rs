//! Fixed-capacity storage that never allocates.
//!
//! [`InlineStorage<T, N>`] holds at most `N` values in a `[MaybeUninit<T>; N]`
//! array. Growth beyond `N` fails with
//! [`CapacityExhausted`](crate::error::CollectionError::CapacityExhausted);
//! containers built on it treat that as a precondition violation.

use core::fmt;
use core::mem::{self, MaybeUninit};

use super::{IntoIter, MAX_INLINE_BYTES, Storage};
use crate::error::{CollectionError, Result, infallible};
use crate::utils::memory::destroy_range;

pub struct InlineStorage<T, const N: usize> {
    len: usize,
    buf: [MaybeUninit<T>; N],
}

impl<T, const N: usize> InlineStorage<T, N> {
    /// Creates an empty buffer.
    pub const fn new() -> Self {
        const {
            assert!(
                mem::size_of::<[MaybeUninit<T>; N]>() <= MAX_INLINE_BYTES,
                "inline storage exceeds MAX_INLINE_BYTES; reduce N"
            );
        }
        Self {
            len: 0,
            buf: [const { MaybeUninit::uninit() }; N],
        }
    }

    /// Consumes the storage, yielding its values in order.
    pub fn into_values(self) -> IntoIter<Self> {
        IntoIter::new(self)
    }

    #[inline]
    fn check_capacity(min_capacity: usize) -> Result<()> {
        if min_capacity <= N {
            Ok(())
        } else {
            Err(CollectionError::capacity_exhausted(N))
        }
    }
}

unsafe impl<T, const N: usize> Storage for InlineStorage<T, N> {
    type Item = T;
    const GROWABLE: bool = false;

    #[inline(always)]
    fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= N);
        self.len = len;
    }

    #[inline(always)]
    fn capacity(&self) -> usize {
        N
    }

    #[inline(always)]
    fn inline_capacity(&self) -> usize {
        N
    }

    #[inline(always)]
    fn is_inline(&self) -> bool {
        true
    }

    #[inline(always)]
    fn as_ptr(&self) -> *const T {
        self.buf.as_ptr() as *const T
    }

    #[inline(always)]
    fn as_mut_ptr(&mut self) -> *mut T {
        self.buf.as_mut_ptr() as *mut T
    }

    fn try_grow(&mut self, min_capacity: usize) -> Result<()> {
        Self::check_capacity(min_capacity)
    }

    fn try_grow_exact(&mut self, min_capacity: usize) -> Result<()> {
        Self::check_capacity(min_capacity)
    }

    fn shrink_to_fit(&mut self) {}
}

impl<T, const N: usize> Default for InlineStorage<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Drop for InlineStorage<T, N> {
    fn drop(&mut self) {
        unsafe { destroy_range(self.as_mut_ptr(), self.len) }
    }
}

impl<T: Clone, const N: usize> Clone for InlineStorage<T, N> {
    fn clone(&self) -> Self {
        let mut out = Self::new();
        // `self.len <= N`, so this cannot run out of room.
        infallible(out.try_extend_from_slice(self.as_slice()));
        out
    }

    fn clone_from(&mut self, src: &Self) {
        self.truncate(src.len);
        let common = self.len;
        self.as_mut_slice().clone_from_slice(&src.as_slice()[..common]);
        infallible(self.try_extend_from_slice(&src.as_slice()[common..]));
    }
}

impl<T: fmt::Debug, const N: usize> fmt::Debug for InlineStorage<T, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::Dropper;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_inline_fills_to_capacity_then_refuses() {
        let mut s: InlineStorage<i32, 3> = InlineStorage::new();
        for i in 0..3 {
            s.try_push(i).unwrap();
        }
        assert!(s.is_full());
        assert_eq!(s.available(), 0);
        assert_eq!(
            s.try_push(3),
            Err(CollectionError::CapacityExhausted { capacity: 3 })
        );
        assert!(s.insert_space(0, 1).is_err());
        assert_eq!(s.as_slice(), &[0, 1, 2]);
    }

    #[test]
    fn test_inline_shrink_is_noop() {
        let mut s: InlineStorage<u8, 8> = InlineStorage::new();
        s.try_push(1).unwrap();
        s.shrink_to_fit();
        assert_eq!(s.capacity(), 8);
        assert!(s.is_inline());
    }

    #[test]
    fn test_inline_clone_and_clone_from() {
        let mut a: InlineStorage<String, 4> = InlineStorage::new();
        a.try_extend(["x", "y", "z"].map(String::from)).unwrap();
        let b = a.clone();
        assert_eq!(b.as_slice(), a.as_slice());
        let mut c: InlineStorage<String, 4> = InlineStorage::new();
        c.try_push("old".into()).unwrap();
        c.clone_from(&a);
        assert_eq!(format!("{:?}", c), r#"["x", "y", "z"]"#);
    }

    #[test]
    fn test_inline_drops_live_values_only() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut s: InlineStorage<Dropper, 4> = InlineStorage::new();
            s.try_push(Dropper(drops.clone())).unwrap();
            s.try_push(Dropper(drops.clone())).unwrap();
            drop(s.pop());
            assert_eq!(drops.get(), 1);
        }
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn test_inline_into_values() {
        let mut s: InlineStorage<i32, 4> = InlineStorage::new();
        s.try_extend([3, 1, 2]).unwrap();
        let collected: Vec<i32> = s.into_values().rev().collect();
        assert_eq!(collected, vec![2, 1, 3]);
    }
}
