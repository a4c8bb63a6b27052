//! Chunked node storage for the hash tables.
//!
//! Nodes live in a list of blocks that never move once allocated: an inline
//! block of `NN` nodes inside the pool, then heap chunks whose lengths double
//! (`base, 2*base, 4*base, ...` with `base = max(NN, 4)`). A node is named by
//! its flat index ([`NodeId`]), so handles and chain links stay valid across
//! rehash and pool growth, and even when the whole table is moved.
//!
//! ```text
//! index:   0 .. NN | NN .. NN+base | NN+base .. NN+3*base | ...
//! segment: inline  | chunk 0       | chunk 1              | ...
//! ```
//!
//! Slots below the high-water mark hold an initialized [`Node`] whose value
//! slot may be empty (on the free list). The pool exposes itself as a
//! [`Segments`] sequence, which is how clone and drop walk the blocks.

use core::mem::MaybeUninit;
use core::ptr::{self, NonNull};

use crate::error::{CollectionError, Result, infallible};
use crate::segmented::{self, SegmentedPos, Segments};
use crate::storage::{HybridStorage, MAX_INLINE_BYTES, Storage};
use crate::utils::alloc::ContainerAlloc;
use crate::utils::memory::{allocate, construct_at, deallocate};
use crate::utils::slot::Slot;

/// Smallest heap chunk, in nodes.
pub const MIN_CHUNK_NODES: usize = 4;

/// Stable handle to an element of an unordered container.
///
/// A handle stays valid until its element is removed; after that it may be
/// reused by a later insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) const NONE: NodeId = NodeId(u32::MAX);

    #[inline(always)]
    pub(crate) fn is_none(self) -> bool {
        self == Self::NONE
    }

    #[inline(always)]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A chained table entry.
#[derive(Clone)]
pub(crate) struct Node<T> {
    pub hash: u64,
    pub next: NodeId,
    pub slot: Slot<T>,
}

impl<T> Node<T> {
    /// # Panics
    /// Debug builds panic on a node that sits on the free list.
    #[inline(always)]
    pub fn value(&self) -> &T {
        // SAFETY: only linked nodes are read through here, and linked nodes are live.
        unsafe { self.slot.get_unchecked() }
    }

    #[inline(always)]
    pub fn value_mut(&mut self) -> &mut T {
        unsafe { self.slot.get_unchecked_mut() }
    }
}

pub(crate) struct NodePool<T, const NN: usize, A: ContainerAlloc> {
    inline: [MaybeUninit<Node<T>>; NN],
    chunks: HybridStorage<NonNull<Node<T>>, 4, A>,
    /// Slots `[0, high)` hold initialized nodes.
    high: usize,
    free: NodeId,
    live: usize,
}

unsafe impl<T: Send, const NN: usize, A: ContainerAlloc + Send> Send for NodePool<T, NN, A> {}
unsafe impl<T: Sync, const NN: usize, A: ContainerAlloc + Sync> Sync for NodePool<T, NN, A> {}

impl<T, const NN: usize, A: ContainerAlloc> NodePool<T, NN, A> {
    const BASE: usize = if NN > MIN_CHUNK_NODES { NN } else { MIN_CHUNK_NODES };

    pub fn new_in(alloc: A) -> Self {
        const {
            assert!(
                core::mem::size_of::<[MaybeUninit<Node<T>>; NN]>() <= MAX_INLINE_BYTES,
                "inline node block exceeds MAX_INLINE_BYTES; reduce the node count"
            );
        }
        Self {
            inline: [const { MaybeUninit::uninit() }; NN],
            chunks: HybridStorage::new_in(alloc),
            high: 0,
            free: NodeId::NONE,
            live: 0,
        }
    }

    /// Live values.
    #[inline]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Node slots currently backed by memory.
    #[inline]
    pub fn capacity(&self) -> usize {
        NN + Self::BASE * ((1usize << self.chunks.len()) - 1)
    }

    /// Segment and offset of flat index `idx`.
    #[inline]
    fn locate(idx: usize) -> (usize, usize) {
        if idx < NN {
            return (0, idx);
        }
        let j = idx - NN;
        let q = j / Self::BASE + 1;
        let k = (usize::BITS - 1 - q.leading_zeros()) as usize;
        (k + 1, j - Self::BASE * ((1 << k) - 1))
    }

    #[inline]
    fn slot_ptr(&self, idx: usize) -> *const Node<T> {
        let (segment, offset) = Self::locate(idx);
        unsafe {
            if segment == 0 {
                (self.inline.as_ptr() as *const Node<T>).add(offset)
            } else {
                self.chunks.as_slice()[segment - 1].as_ptr().add(offset)
            }
        }
    }

    #[inline]
    fn slot_mut_ptr(&mut self, idx: usize) -> *mut Node<T> {
        let (segment, offset) = Self::locate(idx);
        unsafe {
            if segment == 0 {
                (self.inline.as_mut_ptr() as *mut Node<T>).add(offset)
            } else {
                self.chunks.as_slice()[segment - 1].as_ptr().add(offset)
            }
        }
    }

    /// Node pointer for iterators that hand out several `&mut` at once.
    ///
    /// # Safety
    /// `pool` must be valid and `id` below the high-water mark.
    #[inline]
    pub unsafe fn node_raw(pool: *mut Self, id: NodeId) -> *mut Node<T> {
        let (segment, offset) = Self::locate(id.index());
        unsafe {
            if segment == 0 {
                (ptr::addr_of_mut!((*pool).inline) as *mut Node<T>).add(offset)
            } else {
                (*pool).chunks.as_slice()[segment - 1].as_ptr().add(offset)
            }
        }
    }

    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node<T> {
        assert!(id.index() < self.high, "node handle out of range");
        unsafe { &*self.slot_ptr(id.index()) }
    }

    #[inline(always)]
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        assert!(id.index() < self.high, "node handle out of range");
        unsafe { &mut *self.slot_mut_ptr(id.index()) }
    }

    /// The value behind `id`, if that slot is live.
    pub fn get(&self, id: NodeId) -> Option<&Node<T>> {
        if id.index() < self.high && self.node(id).slot.is_live() {
            Some(self.node(id))
        } else {
            None
        }
    }

    fn try_add_chunk(&mut self) -> Result<()> {
        let k = self.chunks.len();
        let len = 1usize
            .checked_shl(k as u32)
            .and_then(|m| m.checked_mul(Self::BASE))
            .ok_or(CollectionError::capacity_overflow(usize::MAX))?;
        let new_capacity = self
            .capacity()
            .checked_add(len)
            .filter(|&c| c < u32::MAX as usize)
            .ok_or(CollectionError::capacity_overflow(self.capacity().saturating_add(len)))?;
        self.chunks.try_reserve(1)?;
        let block = allocate::<Node<T>, _>(self.chunks.allocator(), len)?;
        // cannot fail: room was reserved above
        if let Err(err) = self.chunks.try_push(block) {
            unsafe { deallocate(self.chunks.allocator(), block, len) };
            return Err(err);
        }
        log::trace!(
            "node pool grew by chunk {} ({} nodes, capacity {})",
            k,
            len,
            new_capacity
        );
        Ok(())
    }

    /// Makes room for `additional` more live values, adding chunks if `growable`.
    pub fn try_reserve(&mut self, additional: usize, growable: bool) -> Result<()> {
        let needed = self
            .live
            .checked_add(additional)
            .ok_or(CollectionError::capacity_overflow(usize::MAX))?;
        while self.capacity() < needed {
            if !growable {
                return Err(CollectionError::capacity_exhausted(NN));
            }
            self.try_add_chunk()?;
        }
        Ok(())
    }

    /// Stores `value` in a free node. Never grows; reserve first.
    pub fn try_insert(&mut self, hash: u64, value: T) -> Result<NodeId> {
        let id = if !self.free.is_none() {
            let id = self.free;
            let node = self.node_mut(id);
            let next_free = node.next;
            node.hash = hash;
            node.next = NodeId::NONE;
            node.slot.put(value);
            self.free = next_free;
            id
        } else if self.high < self.capacity() {
            let idx = self.high;
            unsafe {
                construct_at(
                    self.slot_mut_ptr(idx),
                    Node {
                        hash,
                        next: NodeId::NONE,
                        slot: Slot::new(value),
                    },
                );
            }
            self.high += 1;
            NodeId(idx as u32)
        } else {
            return Err(CollectionError::capacity_exhausted(self.capacity()));
        };
        self.live += 1;
        Ok(id)
    }

    /// Moves the value out of `id` and puts the node on the free list.
    pub fn remove(&mut self, id: NodeId) -> Option<T> {
        let free = self.free;
        let node = self.node_mut(id);
        let value = node.slot.take()?;
        node.next = free;
        self.free = id;
        self.live -= 1;
        Some(value)
    }

    /// Drops every value; chunks are kept for reuse.
    pub fn clear(&mut self) {
        let end = self.resolve(self.high);
        self.high = 0;
        self.free = NodeId::NONE;
        self.live = 0;
        unsafe { segmented::destroy(self, SegmentedPos::default(), end) };
    }
}

impl<T, const NN: usize, A: ContainerAlloc> Segments for NodePool<T, NN, A> {
    type Item = Node<T>;

    #[inline]
    fn segment_count(&self) -> usize {
        1 + self.chunks.len()
    }

    #[inline]
    fn segment_len(&self, segment: usize) -> usize {
        if segment == 0 { NN } else { Self::BASE << (segment - 1) }
    }

    fn segment_ptr(&mut self, segment: usize) -> *mut Node<T> {
        if segment == 0 {
            self.inline.as_mut_ptr() as *mut Node<T>
        } else {
            self.chunks.as_slice()[segment - 1].as_ptr()
        }
    }
}

impl<T, const NN: usize, A: ContainerAlloc> Drop for NodePool<T, NN, A> {
    fn drop(&mut self) {
        self.clear();
        for (k, block) in self.chunks.as_slice().iter().enumerate() {
            unsafe { deallocate(self.chunks.allocator(), *block, Self::BASE << k) };
        }
    }
}

/// Clones node for node into the same block layout, so every [`NodeId`]
/// (and every chain link) means the same element in the copy.
impl<T: Clone, const NN: usize, A: ContainerAlloc> Clone for NodePool<T, NN, A> {
    fn clone(&self) -> Self {
        let mut out = Self::new_in(self.chunks.allocator().select_on_clone());
        while out.chunks.len() < self.chunks.len() {
            infallible(out.try_add_chunk());
        }
        let end = out.resolve(self.high);
        let mut next = 0;
        unsafe {
            segmented::uninitialized_construct(&mut out, SegmentedPos::default(), end, |_| {
                let node = self.node(NodeId(next as u32)).clone();
                next += 1;
                node
            });
        }
        out.high = self.high;
        out.free = self.free;
        out.live = self.live;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::alloc::Global;
    use crate::utils::testing::{CountingAlloc, Dropper};
    use std::cell::Cell;
    use std::rc::Rc;

    type Pool<T, const NN: usize> = NodePool<T, NN, Global>;

    #[test]
    fn test_node_pool_locate_chunks() {
        // base 4: inline 0..2, chunk0 2..6, chunk1 6..14
        assert_eq!(Pool::<u8, 2>::locate(1), (0, 1));
        assert_eq!(Pool::<u8, 2>::locate(2), (1, 0));
        assert_eq!(Pool::<u8, 2>::locate(5), (1, 3));
        assert_eq!(Pool::<u8, 2>::locate(6), (2, 0));
        assert_eq!(Pool::<u8, 2>::locate(13), (2, 7));
        assert_eq!(Pool::<u8, 2>::locate(14), (3, 0));
        // base = NN when NN is larger
        assert_eq!(Pool::<u8, 8>::locate(16), (2, 0));
    }

    #[test]
    fn test_node_pool_grows_in_doubling_chunks() {
        let mut pool: Pool<String, 2> = NodePool::new_in(Global);
        assert_eq!(pool.capacity(), 2);
        let mut ids = Vec::new();
        for i in 0..10 {
            pool.try_reserve(1, true).unwrap();
            ids.push(pool.try_insert(i as u64, i.to_string()).unwrap());
        }
        assert_eq!(pool.capacity(), 2 + 4 + 8);
        assert_eq!(pool.segment_count(), 3);
        for (i, id) in ids.iter().enumerate() {
            assert_eq!(pool.node(*id).value(), &i.to_string());
            assert_eq!(pool.node(*id).hash, i as u64);
        }
    }

    #[test]
    fn test_node_pool_free_list_reuse() {
        let mut pool: Pool<i32, 4> = NodePool::new_in(Global);
        let a = pool.try_insert(0, 1).unwrap();
        let b = pool.try_insert(0, 2).unwrap();
        assert_eq!(pool.remove(a), Some(1));
        assert_eq!(pool.remove(a), None);
        assert!(pool.get(a).is_none());
        let c = pool.try_insert(0, 3).unwrap();
        assert_eq!(c, a);
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.get(b).map(|n| *n.value()), Some(2));
    }

    #[test]
    fn test_node_pool_static_exhaustion() {
        let mut pool: Pool<i32, 2> = NodePool::new_in(Global);
        pool.try_insert(0, 1).unwrap();
        pool.try_insert(0, 2).unwrap();
        assert_eq!(
            pool.try_reserve(1, false),
            Err(CollectionError::capacity_exhausted(2))
        );
        assert!(pool.try_insert(0, 3).is_err());
        assert_eq!(pool.capacity(), 2);
    }

    #[test]
    fn test_node_pool_clone_keeps_ids() {
        let mut pool: Pool<String, 1> = NodePool::new_in(Global);
        let mut ids = Vec::new();
        for i in 0..7 {
            pool.try_reserve(1, true).unwrap();
            ids.push(pool.try_insert(0, format!("v{i}")).unwrap());
        }
        pool.remove(ids[3]);
        let copy = pool.clone();
        assert_eq!(copy.len(), 6);
        assert!(copy.get(ids[3]).is_none());
        for &i in &[0, 1, 2, 4, 5, 6] {
            assert_eq!(copy.node(ids[i]).value(), &format!("v{i}"));
        }
    }

    #[test]
    fn test_node_pool_drop_releases_everything() {
        let drops = Rc::new(Cell::new(0));
        let alloc: CountingAlloc = CountingAlloc::new(0);
        {
            let mut pool: NodePool<Dropper, 2, &CountingAlloc> = NodePool::new_in(&alloc);
            for _ in 0..9 {
                pool.try_reserve(1, true).unwrap();
                pool.try_insert(0, Dropper(drops.clone())).unwrap();
            }
            let first = NodeId(0);
            drop(pool.remove(first));
            assert_eq!(drops.get(), 1);
            assert!(alloc.live_bytes() > 0);
        }
        assert_eq!(drops.get(), 9);
        assert_eq!(alloc.live_bytes(), 0);
    }

    #[test]
    fn test_node_pool_clear_keeps_chunks() {
        let mut pool: Pool<i32, 2> = NodePool::new_in(Global);
        for i in 0..5 {
            pool.try_reserve(1, true).unwrap();
            pool.try_insert(0, i).unwrap();
        }
        let capacity = pool.capacity();
        pool.clear();
        assert_eq!(pool.len(), 0);
        assert_eq!(pool.capacity(), capacity);
        assert_eq!(pool.try_insert(0, 9).unwrap(), NodeId(0));
    }
}
