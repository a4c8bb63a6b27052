//! Table iterators.
//!
//! The global iterators walk bucket 0's chain, then bucket 1's, and so on;
//! [`LocalIter`] walks a single chain. Order is unspecified but stable
//! between mutations, and elements with equal keys come out together.

use core::iter::FusedIterator;
use core::marker::PhantomData;

use super::node_pool::{NodeId, NodePool};
use crate::storage::{HybridStorage, Storage};
use crate::utils::alloc::ContainerAlloc;

pub struct RawIter<'a, T, const NN: usize, A: ContainerAlloc> {
    buckets: &'a [NodeId],
    nodes: &'a NodePool<T, NN, A>,
    bucket: usize,
    cur: NodeId,
    remaining: usize,
}

impl<'a, T, const NN: usize, A: ContainerAlloc> RawIter<'a, T, NN, A> {
    pub(crate) fn new(buckets: &'a [NodeId], nodes: &'a NodePool<T, NN, A>) -> Self {
        Self {
            buckets,
            nodes,
            bucket: 0,
            cur: NodeId::NONE,
            remaining: nodes.len(),
        }
    }

    /// Like `next`, but also yields the element's handle.
    pub fn next_with_id(&mut self) -> Option<(NodeId, &'a T)> {
        while self.cur.is_none() {
            let head = *self.buckets.get(self.bucket)?;
            self.bucket += 1;
            self.cur = head;
        }
        let id = self.cur;
        let nodes = self.nodes;
        let node = nodes.node(id);
        self.cur = node.next;
        self.remaining -= 1;
        Some((id, node.value()))
    }
}

impl<'a, T, const NN: usize, A: ContainerAlloc> Iterator for RawIter<'a, T, NN, A> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<&'a T> {
        self.next_with_id().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, const NN: usize, A: ContainerAlloc> ExactSizeIterator for RawIter<'_, T, NN, A> {}
impl<T, const NN: usize, A: ContainerAlloc> FusedIterator for RawIter<'_, T, NN, A> {}

impl<T, const NN: usize, A: ContainerAlloc> Clone for RawIter<'_, T, NN, A> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets,
            nodes: self.nodes,
            bucket: self.bucket,
            cur: self.cur,
            remaining: self.remaining,
        }
    }
}

pub struct RawIterMut<'a, T, const NN: usize, A: ContainerAlloc> {
    buckets: &'a [NodeId],
    nodes: *mut NodePool<T, NN, A>,
    bucket: usize,
    cur: NodeId,
    remaining: usize,
    _marker: PhantomData<&'a mut T>,
}

impl<'a, T, const NN: usize, A: ContainerAlloc> RawIterMut<'a, T, NN, A> {
    pub(crate) fn new(buckets: &'a [NodeId], nodes: &'a mut NodePool<T, NN, A>) -> Self {
        Self {
            buckets,
            remaining: nodes.len(),
            nodes,
            bucket: 0,
            cur: NodeId::NONE,
            _marker: PhantomData,
        }
    }
}

impl<'a, T, const NN: usize, A: ContainerAlloc> Iterator for RawIterMut<'a, T, NN, A> {
    type Item = &'a mut T;

    fn next(&mut self) -> Option<&'a mut T> {
        while self.cur.is_none() {
            let head = *self.buckets.get(self.bucket)?;
            self.bucket += 1;
            self.cur = head;
        }
        // SAFETY: every chained node is live and yielded at most once.
        let node = unsafe { &mut *NodePool::node_raw(self.nodes, self.cur) };
        self.cur = node.next;
        self.remaining -= 1;
        Some(node.value_mut())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T, const NN: usize, A: ContainerAlloc> ExactSizeIterator for RawIterMut<'_, T, NN, A> {}
impl<T, const NN: usize, A: ContainerAlloc> FusedIterator for RawIterMut<'_, T, NN, A> {}

/// Values of one bucket.
pub struct LocalIter<'a, T, const NN: usize, A: ContainerAlloc> {
    nodes: &'a NodePool<T, NN, A>,
    cur: NodeId,
}

impl<'a, T, const NN: usize, A: ContainerAlloc> LocalIter<'a, T, NN, A> {
    pub(crate) fn new(nodes: &'a NodePool<T, NN, A>, head: NodeId) -> Self {
        Self { nodes, cur: head }
    }
}

impl<'a, T, const NN: usize, A: ContainerAlloc> Iterator for LocalIter<'a, T, NN, A> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.cur.is_none() {
            return None;
        }
        let nodes = self.nodes;
        let node = nodes.node(self.cur);
        self.cur = node.next;
        Some(node.value())
    }
}

impl<T, const NN: usize, A: ContainerAlloc> FusedIterator for LocalIter<'_, T, NN, A> {}

/// Owning iterator; elements not yet yielded are dropped with it.
pub struct RawIntoIter<T, const NB: usize, const NN: usize, A: ContainerAlloc> {
    buckets: HybridStorage<NodeId, NB, A>,
    nodes: NodePool<T, NN, A>,
    bucket: usize,
    cur: NodeId,
}

impl<T, const NB: usize, const NN: usize, A: ContainerAlloc> RawIntoIter<T, NB, NN, A> {
    pub(crate) fn new(buckets: HybridStorage<NodeId, NB, A>, nodes: NodePool<T, NN, A>) -> Self {
        Self {
            buckets,
            nodes,
            bucket: 0,
            cur: NodeId::NONE,
        }
    }
}

impl<T, const NB: usize, const NN: usize, A: ContainerAlloc> Iterator for RawIntoIter<T, NB, NN, A> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        while self.cur.is_none() {
            let head = *self.buckets.as_slice().get(self.bucket)?;
            self.bucket += 1;
            self.cur = head;
        }
        let id = self.cur;
        self.cur = self.nodes.node(id).next;
        self.nodes.remove(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.nodes.len(), Some(self.nodes.len()))
    }
}

impl<T, const NB: usize, const NN: usize, A: ContainerAlloc> ExactSizeIterator
    for RawIntoIter<T, NB, NN, A>
{
}

impl<T, const NB: usize, const NN: usize, A: ContainerAlloc> FusedIterator
    for RawIntoIter<T, NB, NN, A>
{
}
