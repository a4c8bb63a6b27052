//! Separate-chaining hash table behind every unordered container.
//!
//! [`HashTable`] keeps two buffers:
//! * a bucket array (`HybridStorage<NodeId, NB, A>`): one chain head per bucket,
//!   inline while the count fits in `NB`.
//! * a [`NodePool`] of `NN` inline nodes plus doubling heap chunks. Each node
//!   caches its key's hash and links to the next node of its chain.
//!
//! Values never move once stored; rehash only rewrites links.
//!
//! # Architecture & Pseudocode
//!
//! ## Unique insert
//! ```text
//! 1. h = hash(key(value)); walk chain[index(h)]
//! 2. equal key found                     -> (that node, false)
//! 3. reserve(1):
//!      dynamic: if len+1 > buckets * max_load_factor
//!                   rehash(max(2 * buckets, ceil((len+1) / mlf)))
//!               add a node chunk if the pool is full
//!      static:  pool full                -> CapacityExhausted
//! 4. node = pool.insert(h, value); push node at the head of its chain
//! ```
//!
//! ## Multi insert
//! Same, except step 2 is skipped and the node is linked right after the last
//! node of an existing run of equal keys, so equal keys stay adjacent.
//!
//! ## Rehash(n)
//! ```text
//! n = policy.bucket_count_for(max(n, ceil(len / mlf)))
//! fresh = [NONE; n]                      // failure: nothing changed
//! for each chain, for each node: push node onto fresh[index(node.hash, n)]
//! buckets = fresh
//! ```
//! Runs of equal keys stay adjacent across a rehash; their internal order
//! may flip.
//!
//! ## Erase
//! Walk the chain for the predecessor, splice the node out, free its slot.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::iter;
use core::marker::PhantomData;

use super::iter::{LocalIter, RawIntoIter, RawIter, RawIterMut};
use super::node_pool::{NodeId, NodePool};
use super::policy::BucketPolicy;
use crate::error::{CollectionError, Result, infallible};
use crate::storage::{HybridStorage, Storage};
use crate::utils::alloc::{ContainerAlloc, Global};
use crate::utils::key_of::KeyOf;

/// Load factor a new table starts with.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

/// A chained hash table storing `T`, keyed by `X`, bucketed by `P`, with `NB`
/// inline bucket heads and `NN` inline nodes.
pub struct HashTable<T, X, P, const NB: usize, const NN: usize, S, A: ContainerAlloc = Global> {
    buckets: HybridStorage<NodeId, NB, A>,
    nodes: NodePool<T, NN, A>,
    max_load_factor: f32,
    hasher: S,
    _marker: PhantomData<(X, P)>,
}

impl<T, X, P, const NB: usize, const NN: usize, S, A> HashTable<T, X, P, NB, NN, S, A>
where
    X: KeyOf<T>,
    P: BucketPolicy,
    A: ContainerAlloc,
{
    /// Creates an empty table. A static table gets its `NB` buckets up front;
    /// a dynamic one starts with the largest valid count that fits inline
    /// (possibly none, in which case the first insert creates the array).
    pub fn with_hasher_in(hasher: S, alloc: A) -> Self {
        let mut table = Self {
            buckets: HybridStorage::new_in(alloc.clone()),
            nodes: NodePool::new_in(alloc),
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            hasher,
            _marker: PhantomData,
        };
        let initial = match P::bucket_count_for(NB) {
            Some(count) if count <= NB => count,
            _ => 0,
        };
        // fits inline: no allocation happens here
        infallible(table.buckets.try_extend_fill(initial, &NodeId::NONE));
        table
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements storable before the node pool must grow.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// `true` while the bucket array lives inside the table.
    #[inline]
    pub fn buckets_inline(&self) -> bool {
        self.buckets.is_inline()
    }

    pub fn load_factor(&self) -> f32 {
        match self.bucket_count() {
            0 => 0.0,
            count => self.len() as f32 / count as f32,
        }
    }

    #[inline]
    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Sets the load factor that triggers growth. Takes effect on the next
    /// insert or reserve; static tables never rehash.
    ///
    /// # Panics
    /// Panics unless `mlf` is finite and positive.
    pub fn set_max_load_factor(&mut self, mlf: f32) {
        assert!(mlf.is_finite() && mlf > 0.0, "max load factor must be positive");
        self.max_load_factor = mlf;
    }

    #[inline]
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        self.buckets.allocator()
    }

    #[inline(always)]
    fn bucket_index(&self, hash: u64) -> usize {
        P::index(hash, self.bucket_count())
    }

    /// Buckets needed to hold `len` elements under the max load factor.
    fn buckets_needed(&self, len: usize) -> Result<usize> {
        let needed = (len as f64 / self.max_load_factor as f64).ceil();
        if needed >= usize::MAX as f64 {
            return Err(CollectionError::capacity_overflow(len));
        }
        Ok(needed as usize)
    }

    /// Moves every node onto a fresh array of exactly `count` buckets.
    fn relink(&mut self, count: usize) -> Result<()> {
        let mut fresh: HybridStorage<NodeId, NB, A> =
            HybridStorage::try_with_capacity_in(count, self.buckets.allocator().clone())?;
        fresh.try_extend_fill(count, &NodeId::NONE)?;
        let heads = fresh.as_mut_slice();
        for &head in self.buckets.as_slice() {
            let mut cur = head;
            while !cur.is_none() {
                let node = self.nodes.node_mut(cur);
                let next = node.next;
                let slot = &mut heads[P::index(node.hash, count)];
                node.next = *slot;
                *slot = cur;
                cur = next;
            }
        }
        log::trace!(
            "rehash: {} -> {} buckets for {} elements",
            self.bucket_count(),
            count,
            self.len()
        );
        self.buckets = fresh;
        Ok(())
    }

    /// Rebuilds the bucket array with at least `min_buckets` buckets (and at
    /// least enough for the current size). No-op for static tables.
    pub fn try_rehash(&mut self, min_buckets: usize) -> Result<()> {
        if !P::DYNAMIC {
            return Ok(());
        }
        let min = min_buckets.max(self.buckets_needed(self.len())?);
        let count = P::bucket_count_for(min).ok_or(CollectionError::capacity_overflow(min))?;
        if count == self.bucket_count() {
            return Ok(());
        }
        self.relink(count)
    }

    /// Makes room for `additional` more elements without further rehash or
    /// node allocation.
    pub fn try_reserve(&mut self, additional: usize) -> Result<()> {
        let target = self
            .len()
            .checked_add(additional)
            .ok_or(CollectionError::capacity_overflow(usize::MAX))?;
        if P::DYNAMIC {
            let needed = self.buckets_needed(target)?;
            if needed > self.bucket_count() {
                let grown = needed.max(self.bucket_count().saturating_mul(2));
                let count =
                    P::bucket_count_for(grown).ok_or(CollectionError::capacity_overflow(grown))?;
                self.relink(count)?;
            }
        }
        self.nodes.try_reserve(additional, P::DYNAMIC)
    }

    /// Head of the chain in `bucket`.
    ///
    /// # Panics
    /// Panics if `bucket >= bucket_count()`.
    #[inline]
    pub(crate) fn head(&self, bucket: usize) -> NodeId {
        self.buckets.as_slice()[bucket]
    }

    pub fn bucket_size(&self, bucket: usize) -> usize {
        self.local_iter(bucket).count()
    }

    /// Values chained in `bucket`.
    ///
    /// # Panics
    /// Panics if `bucket >= bucket_count()`.
    pub fn local_iter(&self, bucket: usize) -> LocalIter<'_, T, NN, A> {
        LocalIter::new(&self.nodes, self.head(bucket))
    }

    pub fn iter(&self) -> RawIter<'_, T, NN, A> {
        RawIter::new(self.buckets.as_slice(), &self.nodes)
    }

    pub fn iter_mut(&mut self) -> RawIterMut<'_, T, NN, A> {
        RawIterMut::new(self.buckets.as_slice(), &mut self.nodes)
    }

    pub fn into_values(self) -> RawIntoIter<T, NB, NN, A> {
        RawIntoIter::new(self.buckets, self.nodes)
    }

    /// Value of a node known to be linked.
    #[inline]
    pub(crate) fn value_mut(&mut self, id: NodeId) -> &mut T {
        self.nodes.node_mut(id).value_mut()
    }

    /// The live value behind `id`.
    pub fn get_id(&self, id: NodeId) -> Option<&T> {
        self.nodes.get(id).map(|node| node.value())
    }

    pub fn get_id_mut(&mut self, id: NodeId) -> Option<&mut T> {
        if self.nodes.get(id).is_some() {
            Some(self.nodes.node_mut(id).value_mut())
        } else {
            None
        }
    }

    /// Splices `id` out of its chain.
    fn unlink(&mut self, id: NodeId) {
        let (hash, next) = {
            let node = self.nodes.node(id);
            (node.hash, node.next)
        };
        let bucket = self.bucket_index(hash);
        let head = self.head(bucket);
        if head == id {
            self.buckets.as_mut_slice()[bucket] = next;
            return;
        }
        let mut cur = head;
        while !cur.is_none() {
            let node = self.nodes.node_mut(cur);
            if node.next == id {
                node.next = next;
                return;
            }
            cur = node.next;
        }
    }

    /// Removes the element behind `id`; `None` if `id` is not live.
    pub fn remove_id(&mut self, id: NodeId) -> Option<T> {
        self.nodes.get(id)?;
        self.unlink(id);
        self.nodes.remove(id)
    }

    /// Links a stored node into its chain head.
    fn link_front(&mut self, id: NodeId) {
        let bucket = self.bucket_index(self.nodes.node(id).hash);
        let head = self.head(bucket);
        self.nodes.node_mut(id).next = head;
        self.buckets.as_mut_slice()[bucket] = id;
    }

    /// Stores `value` (hash precomputed) at the head of its chain. The caller
    /// has checked uniqueness if it matters and reserved room.
    pub(crate) fn link_new(&mut self, hash: u64, value: T) -> Result<NodeId> {
        let id = self.nodes.try_insert(hash, value)?;
        self.link_front(id);
        Ok(id)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        for head in self.buckets.as_mut_slice() {
            *head = NodeId::NONE;
        }
    }

    /// Keeps only the values for which `keep` returns `true`.
    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&mut T) -> bool,
    {
        for bucket in 0..self.bucket_count() {
            let mut prev = NodeId::NONE;
            let mut cur = self.head(bucket);
            while !cur.is_none() {
                let node = self.nodes.node_mut(cur);
                let next = node.next;
                if keep(node.value_mut()) {
                    prev = cur;
                } else {
                    if prev.is_none() {
                        self.buckets.as_mut_slice()[bucket] = next;
                    } else {
                        self.nodes.node_mut(prev).next = next;
                    }
                    drop(self.nodes.remove(cur));
                }
                cur = next;
            }
        }
    }

    /// `true` if every live node sits in the chain its hash selects.
    pub fn is_partitioned(&self) -> bool {
        let mut seen = 0;
        for bucket in 0..self.bucket_count() {
            for id in self.chain(bucket) {
                if self.bucket_index(self.nodes.node(id).hash) != bucket {
                    return false;
                }
                seen += 1;
            }
        }
        seen == self.len()
    }

    /// Node handles chained in `bucket`.
    pub(crate) fn chain(&self, bucket: usize) -> impl Iterator<Item = NodeId> + '_ {
        let mut cur = self.head(bucket);
        iter::from_fn(move || {
            if cur.is_none() {
                return None;
            }
            let id = cur;
            cur = self.nodes.node(id).next;
            Some(id)
        })
    }
}

impl<T, X, P, const NB: usize, const NN: usize, S, A> HashTable<T, X, P, NB, NN, S, A>
where
    X: KeyOf<T>,
    X::Key: Hash + Eq,
    P: BucketPolicy,
    S: BuildHasher,
    A: ContainerAlloc,
{
    #[inline]
    pub fn hash_key<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        self.hasher.hash_one(key)
    }

    /// First node of the chain for `hash` whose key equals `key`.
    pub(crate) fn find_hashed<Q>(&self, hash: u64, key: &Q) -> Option<NodeId>
    where
        X::Key: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        if self.bucket_count() == 0 {
            return None;
        }
        let mut cur = self.head(self.bucket_index(hash));
        while !cur.is_none() {
            let node = self.nodes.node(cur);
            if node.hash == hash && X::key(node.value()).borrow() == key {
                return Some(cur);
            }
            cur = node.next;
        }
        None
    }

    pub fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_hashed(self.hash_key(key), key)
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).map(|id| self.nodes.node(id).value())
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut T>
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.find(key)?;
        Some(self.nodes.node_mut(id).value_mut())
    }

    /// Bucket that `key` hashes to.
    ///
    /// # Panics
    /// Panics if the table has no buckets yet.
    pub fn bucket<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        assert!(self.bucket_count() > 0, "table has no buckets");
        self.bucket_index(self.hash_key(key))
    }

    /// Inserts `value` unless an equal key is present.
    pub fn try_insert_unique(&mut self, value: T) -> Result<(NodeId, bool)> {
        let hash = self.hash_key(X::key(&value));
        if let Some(id) = self.find_hashed(hash, X::key(&value)) {
            return Ok((id, false));
        }
        self.try_reserve(1)?;
        Ok((self.link_new(hash, value)?, true))
    }

    /// Inserts `value` after any elements with an equal key.
    pub fn try_insert_multi(&mut self, value: T) -> Result<NodeId> {
        let hash = self.hash_key(X::key(&value));
        self.try_reserve(1)?;
        let last = self.find_hashed(hash, X::key(&value)).map(|first| {
            let mut last = first;
            let mut cur = self.nodes.node(first).next;
            while !cur.is_none() {
                let node = self.nodes.node(cur);
                if node.hash != hash || X::key(node.value()) != X::key(&value) {
                    break;
                }
                last = cur;
                cur = node.next;
            }
            last
        });
        let id = self.nodes.try_insert(hash, value)?;
        match last {
            Some(last) => {
                let after = self.nodes.node(last).next;
                self.nodes.node_mut(id).next = after;
                self.nodes.node_mut(last).next = id;
            }
            None => self.link_front(id),
        }
        Ok(id)
    }

    /// Removes the first element with key `key`.
    pub fn remove_key<Q>(&mut self, key: &Q) -> Option<T>
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let id = self.find(key)?;
        self.remove_id(id)
    }

    /// Removes every element with key `key`; returns how many were removed.
    pub fn erase_key<Q>(&mut self, key: &Q) -> usize
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        let mut erased = 0;
        let mut cur = self.find_hashed(hash, key).unwrap_or(NodeId::NONE);
        while !cur.is_none() {
            let node = self.nodes.node(cur);
            if node.hash != hash || X::key(node.value()).borrow() != key {
                break;
            }
            let next = node.next;
            drop(self.remove_id(cur));
            erased += 1;
            cur = next;
        }
        erased
    }

    /// The run of elements whose key equals `key` (adjacent in their chain).
    pub fn equal_range<'a, Q>(&'a self, key: &'a Q) -> impl Iterator<Item = &'a T> + 'a
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_key(key);
        let mut cur = self.find_hashed(hash, key).unwrap_or(NodeId::NONE);
        iter::from_fn(move || {
            if cur.is_none() {
                return None;
            }
            let node = self.nodes.node(cur);
            if node.hash != hash || X::key(node.value()).borrow() != key {
                cur = NodeId::NONE;
                return None;
            }
            cur = node.next;
            Some(node.value())
        })
    }

    pub fn count<Q>(&self, key: &Q) -> usize
    where
        X::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.equal_range(key).count()
    }
}

impl<T, X, P, const NB: usize, const NN: usize, S, A> Clone for HashTable<T, X, P, NB, NN, S, A>
where
    T: Clone,
    S: Clone,
    A: ContainerAlloc,
{
    /// Copies node for node; handles into the source name the same elements
    /// in the copy.
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            nodes: self.nodes.clone(),
            max_load_factor: self.max_load_factor,
            hasher: self.hasher.clone(),
            _marker: PhantomData,
        }
    }
}
