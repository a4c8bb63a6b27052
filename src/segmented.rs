//! Algorithms over sequences stored in several contiguous segments.
//!
//! A [`Segments`] implementor is logically one sequence but physically a list
//! of blocks (a slice is the degenerate one-block case; the hash table's node
//! pool is a list of growth chunks). Positions are [`SegmentedPos`] pairs of
//! segment index and offset inside it.
//!
//! The algorithms split a half-open range `[first, last)` into one chunk per
//! segment it touches (partial first and last chunks, whole interior ones,
//! empty segments skipped) and run the single-block primitive from
//! [`utils::memory`](crate::utils::memory) on each chunk. The
//! `uninitialized_*` variants track how far construction got across segments;
//! if an element constructor panics, everything built so far in every
//! segment is destroyed before the panic continues.

use core::mem;
use core::slice;

use crate::utils::memory;

/// A position inside a segmented sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SegmentedPos {
    pub segment: usize,
    pub offset: usize,
}

impl SegmentedPos {
    pub const fn new(segment: usize, offset: usize) -> Self {
        Self { segment, offset }
    }
}

/// Physical shape of a sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentLayout {
    /// One block; positions are plain indices in segment 0.
    Contiguous,
    /// Several blocks.
    Segmented,
}

/// A sequence made of contiguous segments.
///
/// `segment_ptr(i)` must address `segment_len(i)` properly aligned slots.
/// Whether those slots hold live values is up to the caller of each
/// algorithm: the plain algorithms need live values, the `uninitialized_*`
/// ones need dead slots.
pub trait Segments {
    type Item;

    fn segment_count(&self) -> usize;

    fn segment_len(&self, segment: usize) -> usize;

    fn segment_ptr(&mut self, segment: usize) -> *mut Self::Item;

    fn layout(&self) -> SegmentLayout {
        if self.segment_count() <= 1 {
            SegmentLayout::Contiguous
        } else {
            SegmentLayout::Segmented
        }
    }

    /// Total slots across all segments.
    fn total_len(&self) -> usize {
        (0..self.segment_count()).map(|s| self.segment_len(s)).sum()
    }

    /// Maps a flat index to a position.
    ///
    /// `index == total_len()` resolves to the end position
    /// `(segment_count(), 0)`.
    ///
    /// # Panics
    /// Panics if `index > total_len()`.
    fn resolve(&self, index: usize) -> SegmentedPos {
        if self.layout() == SegmentLayout::Contiguous {
            let len = if self.segment_count() == 0 { 0 } else { self.segment_len(0) };
            assert!(index <= len, "index {index} out of bounds (len {len})");
            return if index == len {
                SegmentedPos::new(self.segment_count(), 0)
            } else {
                SegmentedPos::new(0, index)
            };
        }
        let mut rest = index;
        for segment in 0..self.segment_count() {
            let len = self.segment_len(segment);
            if rest < len {
                return SegmentedPos::new(segment, rest);
            }
            rest -= len;
        }
        assert!(rest == 0, "index {index} out of bounds");
        SegmentedPos::new(self.segment_count(), 0)
    }

    /// Maps a position back to its flat index.
    fn flat_index(&self, pos: SegmentedPos) -> usize {
        (0..pos.segment.min(self.segment_count()))
            .map(|s| self.segment_len(s))
            .sum::<usize>()
            + pos.offset
    }
}

impl<T> Segments for [T] {
    type Item = T;

    #[inline]
    fn segment_count(&self) -> usize {
        1
    }

    #[inline]
    fn segment_len(&self, _segment: usize) -> usize {
        self.len()
    }

    #[inline]
    fn segment_ptr(&mut self, _segment: usize) -> *mut T {
        self.as_mut_ptr()
    }
}

/// Bounds of the chunk of `[first, last)` that lies in `segment`.
#[inline]
fn chunk<S: Segments + ?Sized>(
    seq: &S,
    segment: usize,
    first: SegmentedPos,
    last: SegmentedPos,
) -> (usize, usize) {
    let start = if segment == first.segment { first.offset } else { 0 };
    let end = if segment == last.segment {
        last.offset
    } else {
        seq.segment_len(segment)
    };
    (start, end.max(start))
}

/// Segments touched by `[first, last)`.
#[inline]
fn touched<S: Segments + ?Sized>(
    seq: &S,
    first: SegmentedPos,
    last: SegmentedPos,
) -> core::ops::Range<usize> {
    debug_assert!(first <= last, "segmented range is reversed");
    first.segment..last.segment.saturating_add(1).min(seq.segment_count())
}

/// Assigns a clone of `value` to every element of `[first, last)`.
pub fn fill<S>(seq: &mut S, first: SegmentedPos, last: SegmentedPos, value: &S::Item)
where
    S: Segments + ?Sized,
    S::Item: Clone,
{
    for segment in touched(seq, first, last) {
        let (start, end) = chunk(seq, segment, first, last);
        if start == end {
            continue;
        }
        let base = seq.segment_ptr(segment);
        let block = unsafe { slice::from_raw_parts_mut(base.add(start), end - start) };
        for slot in block {
            slot.clone_from(value);
        }
    }
}

/// Moves `[first, last)` onto the live elements starting at `dest`, leaving
/// `Default` values behind, and returns the position after the last element
/// written.
///
/// Elements are processed front to back, so `dest` may precede `first` in
/// an overlapping range (a left shift).
///
/// # Panics
/// Panics if the destination runs past the end of the sequence.
pub fn move_range<S>(
    seq: &mut S,
    first: SegmentedPos,
    last: SegmentedPos,
    mut dest: SegmentedPos,
) -> SegmentedPos
where
    S: Segments + ?Sized,
    S::Item: Default,
{
    let count = seq.segment_count();
    for segment in touched(seq, first, last) {
        let (start, end) = chunk(seq, segment, first, last);
        let src_base = seq.segment_ptr(segment);
        let mut offset = start;
        while offset < end {
            while dest.offset >= seq.segment_len(dest.segment) {
                dest = SegmentedPos::new(dest.segment + 1, 0);
                assert!(dest.segment < count, "move destination out of bounds");
            }
            let room = seq.segment_len(dest.segment) - dest.offset;
            let n = room.min(end - offset);
            let dst_base = seq.segment_ptr(dest.segment);
            for i in 0..n {
                unsafe {
                    let value = mem::take(&mut *src_base.add(offset + i));
                    *dst_base.add(dest.offset + i) = value;
                }
            }
            offset += n;
            dest.offset += n;
        }
    }
    dest
}

/// Destroys the construction run `[first, cursor)` unless disarmed.
struct ConstructGuard<'a, S: Segments + ?Sized> {
    seq: &'a mut S,
    first: SegmentedPos,
    cursor: SegmentedPos,
}

impl<S: Segments + ?Sized> ConstructGuard<'_, S> {
    fn finish(self) {
        mem::forget(self);
    }
}

impl<S: Segments + ?Sized> Drop for ConstructGuard<'_, S> {
    fn drop(&mut self) {
        unsafe { destroy(&mut *self.seq, self.first, self.cursor) }
    }
}

/// Clones `value` into every slot of `[first, last)`.
///
/// # Safety
/// The slots must be uninitialized. On panic they are uninitialized again.
pub unsafe fn uninitialized_fill<S>(
    seq: &mut S,
    first: SegmentedPos,
    last: SegmentedPos,
    value: &S::Item,
) where
    S: Segments + ?Sized,
    S::Item: Clone,
{
    let segments = touched(seq, first, last);
    let mut guard = ConstructGuard {
        seq,
        first,
        cursor: first,
    };
    for segment in segments {
        let (start, end) = chunk(&*guard.seq, segment, first, last);
        let base = guard.seq.segment_ptr(segment);
        unsafe { memory::uninitialized_fill(base.add(start), end - start, value) };
        guard.cursor = SegmentedPos::new(segment, end);
    }
    guard.finish();
}

/// Constructs `f(pos)` in every slot of `[first, last)`, front to back.
///
/// # Safety
/// The slots must be uninitialized. On panic they are uninitialized again.
pub unsafe fn uninitialized_construct<S, F>(
    seq: &mut S,
    first: SegmentedPos,
    last: SegmentedPos,
    mut f: F,
) where
    S: Segments + ?Sized,
    F: FnMut(SegmentedPos) -> S::Item,
{
    let segments = touched(seq, first, last);
    let mut guard = ConstructGuard {
        seq,
        first,
        cursor: first,
    };
    for segment in segments {
        let (start, end) = chunk(&*guard.seq, segment, first, last);
        let base = guard.seq.segment_ptr(segment);
        unsafe {
            memory::uninitialized_construct(base.add(start), end - start, |i| {
                f(SegmentedPos::new(segment, start + i))
            });
        }
        guard.cursor = SegmentedPos::new(segment, end);
    }
    guard.finish();
}

/// Drops every element of `[first, last)` in place.
///
/// # Safety
/// Every slot in the range must hold a live value that is not used afterwards.
pub unsafe fn destroy<S>(seq: &mut S, first: SegmentedPos, last: SegmentedPos)
where
    S: Segments + ?Sized,
{
    for segment in touched(seq, first, last) {
        let (start, end) = chunk(seq, segment, first, last);
        let base = seq.segment_ptr(segment);
        unsafe { memory::destroy_range(base.add(start), end - start) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::{CloneBomb, Dropper};
    use core::mem::MaybeUninit;
    use std::cell::Cell;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    /// Raw blocks of uneven length, the shape of a chunked pool.
    struct RawChunks<T> {
        blocks: Vec<Box<[MaybeUninit<T>]>>,
    }

    impl<T> RawChunks<T> {
        fn new(lens: &[usize]) -> Self {
            Self {
                blocks: lens
                    .iter()
                    .map(|&n| (0..n).map(|_| MaybeUninit::uninit()).collect())
                    .collect(),
            }
        }

        unsafe fn read(&self, pos: SegmentedPos) -> &T {
            unsafe { self.blocks[pos.segment][pos.offset].assume_init_ref() }
        }
    }

    impl<T> Segments for RawChunks<T> {
        type Item = T;

        fn segment_count(&self) -> usize {
            self.blocks.len()
        }

        fn segment_len(&self, segment: usize) -> usize {
            self.blocks[segment].len()
        }

        fn segment_ptr(&mut self, segment: usize) -> *mut T {
            self.blocks[segment].as_mut_ptr() as *mut T
        }
    }

    /// Borrowed live blocks.
    struct Blocks<'a, T>(Vec<&'a mut [T]>);

    impl<T> Segments for Blocks<'_, T> {
        type Item = T;

        fn segment_count(&self) -> usize {
            self.0.len()
        }

        fn segment_len(&self, segment: usize) -> usize {
            self.0[segment].len()
        }

        fn segment_ptr(&mut self, segment: usize) -> *mut T {
            self.0[segment].as_mut_ptr()
        }
    }

    #[test]
    fn test_segmented_resolve_skips_empty_segments() {
        let seq = RawChunks::<u8>::new(&[2, 0, 3]);
        assert_eq!(seq.layout(), SegmentLayout::Segmented);
        assert_eq!(seq.resolve(0), SegmentedPos::new(0, 0));
        assert_eq!(seq.resolve(2), SegmentedPos::new(2, 0));
        assert_eq!(seq.resolve(4), SegmentedPos::new(2, 2));
        assert_eq!(seq.resolve(5), SegmentedPos::new(3, 0));
        assert_eq!(seq.flat_index(SegmentedPos::new(2, 2)), 4);
        let flat = [1, 2, 3];
        assert_eq!(flat[..].layout(), SegmentLayout::Contiguous);
        assert_eq!(flat[..].resolve(3), SegmentedPos::new(1, 0));
    }

    #[test]
    fn test_segmented_fill_partial_first_and_last() {
        let mut a = [0; 3];
        let mut b = [0; 2];
        let mut c = [0; 4];
        {
            let mut seq = Blocks(vec![&mut a[..], &mut b[..], &mut c[..]]);
            let first = seq.resolve(1);
            let last = seq.resolve(7);
            fill(&mut seq, first, last, &9);
        }
        assert_eq!(a, [0, 9, 9]);
        assert_eq!(b, [9, 9]);
        assert_eq!(c, [9, 9, 0, 0]);
    }

    #[test]
    fn test_segmented_move_composes_destination() {
        let mut a = [1, 2, 3];
        let mut b = [4, 5];
        let mut c = [6, 7, 8];
        let end;
        {
            let mut seq = Blocks(vec![&mut a[..], &mut b[..], &mut c[..]]);
            let first = seq.resolve(2);
            let last = seq.resolve(8);
            end = move_range(&mut seq, first, last, SegmentedPos::new(0, 0));
            assert_eq!(seq.flat_index(end), 6);
        }
        assert_eq!(end, SegmentedPos::new(2, 1));
        assert_eq!(a, [3, 4, 5]);
        assert_eq!(b, [6, 7]);
        assert_eq!(c, [8, 0, 0]);
    }

    #[test]
    fn test_segmented_uninitialized_construct_spans_segments() {
        let mut seq = RawChunks::<String>::new(&[2, 0, 3, 1]);
        let last = seq.resolve(6);
        unsafe {
            uninitialized_construct(&mut seq, SegmentedPos::new(0, 0), last, |pos| {
                format!("{}.{}", pos.segment, pos.offset)
            });
            assert_eq!(seq.read(SegmentedPos::new(2, 1)), "2.1");
            assert_eq!(seq.read(SegmentedPos::new(3, 0)), "3.0");
            destroy(&mut seq, SegmentedPos::new(0, 0), last);
        }
    }

    #[test]
    fn test_segmented_uninitialized_fill_rolls_back_across_segments() {
        let budget = Rc::new(Cell::new(usize::MAX));
        let drops = Rc::new(Cell::new(0));
        let template = CloneBomb {
            value: 1,
            budget: budget.clone(),
            drops: drops.clone(),
        };
        let mut seq = RawChunks::<CloneBomb>::new(&[2, 2, 2]);
        let last = seq.resolve(6);
        // two full segments plus one element of the third
        budget.set(5);
        let result = catch_unwind(AssertUnwindSafe(|| unsafe {
            uninitialized_fill(&mut seq, SegmentedPos::new(0, 0), last, &template);
        }));
        assert!(result.is_err());
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn test_segmented_construct_panic_destroys_only_built() {
        let drops = Rc::new(Cell::new(0));
        let mut seq = RawChunks::<Dropper>::new(&[1, 3]);
        let result = catch_unwind(AssertUnwindSafe(|| unsafe {
            let last = seq.resolve(4);
            uninitialized_construct(&mut seq, SegmentedPos::new(0, 0), last, |pos| {
                if pos == SegmentedPos::new(1, 2) {
                    panic!("constructor failed");
                }
                Dropper(drops.clone())
            });
        }));
        assert!(result.is_err());
        assert_eq!(drops.get(), 3);
    }
}
