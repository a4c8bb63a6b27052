//! Hash containers: [`UnorderedMap`], [`UnorderedMultiMap`], [`UnorderedSet`]
//! and [`UnorderedMultiSet`], all thin facades over [`table::HashTable`].
//!
//! Every facade is generic over the bucket policy `P`, the inline bucket
//! count `NB`, the inline node count `NN`, the hasher `S` (FNV by default)
//! and the allocator `A`. Three aliases cover the common shapes:
//!
//! | Alias                    | Buckets                   | Nodes                  |
//! |--------------------------|---------------------------|------------------------|
//! | `SmallUnordered*<.., N>` | `N` inline, grows (pow2)  | `N` inline, then chunks |
//! | `StaticUnordered*<.., CAP, NB>` | exactly `NB`, inline | exactly `CAP`, inline |
//! | `HeapUnordered*`         | heap, grows (pow2)        | heap chunks            |
//!
//! Elements are addressed by stable [`NodeId`] handles as well as by key.

/// Capacity, bucket and load-factor methods every facade forwards to its
/// `table` field. Expands inside an `impl` block bounded by
/// `P: BucketPolicy, A: ContainerAlloc`.
macro_rules! table_capacity_api {
    () => {
        #[inline]
        pub fn len(&self) -> usize {
            self.table.len()
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.table.is_empty()
        }

        /// Elements storable before the node pool grows (the hard limit for
        /// static containers).
        #[inline]
        pub fn capacity(&self) -> usize {
            self.table.capacity()
        }

        #[inline]
        pub fn available(&self) -> usize {
            self.table.capacity() - self.table.len()
        }

        /// `true` when the next new element needs more node storage.
        #[inline]
        pub fn is_full(&self) -> bool {
            self.table.len() == self.table.capacity()
        }

        #[inline]
        pub fn bucket_count(&self) -> usize {
            self.table.bucket_count()
        }

        /// Number of elements chained in `bucket`.
        ///
        /// # Panics
        /// Panics if `bucket >= bucket_count()`.
        pub fn bucket_size(&self, bucket: usize) -> usize {
            self.table.bucket_size(bucket)
        }

        pub fn load_factor(&self) -> f32 {
            self.table.load_factor()
        }

        pub fn max_load_factor(&self) -> f32 {
            self.table.max_load_factor()
        }

        /// See [`HashTable::set_max_load_factor`](crate::unordered::table::HashTable::set_max_load_factor).
        pub fn set_max_load_factor(&mut self, mlf: f32) {
            self.table.set_max_load_factor(mlf);
        }

        pub fn try_rehash(&mut self, min_buckets: usize) -> crate::error::Result<()> {
            self.table.try_rehash(min_buckets)
        }

        /// Rebuilds the bucket array with at least `min_buckets` buckets.
        /// Static containers keep their bucket count.
        pub fn rehash(&mut self, min_buckets: usize) {
            crate::error::infallible(self.table.try_rehash(min_buckets))
        }

        pub fn try_reserve(&mut self, additional: usize) -> crate::error::Result<()> {
            self.table.try_reserve(additional)
        }

        pub fn reserve(&mut self, additional: usize) {
            crate::error::infallible(self.table.try_reserve(additional))
        }

        pub fn clear(&mut self) {
            self.table.clear();
        }

        pub fn hasher(&self) -> &S {
            self.table.hasher()
        }

        pub fn allocator(&self) -> &A {
            self.table.allocator()
        }
    };
}

pub(crate) use table_capacity_api;

pub mod iter;
pub mod map;
pub(crate) mod node_pool;
pub mod policy;
pub mod set;
pub mod table;

pub use map::{
    HeapUnorderedMap, HeapUnorderedMultiMap, SmallUnorderedMap, SmallUnorderedMultiMap,
    StaticUnorderedMap, StaticUnorderedMultiMap, UnorderedMap, UnorderedMultiMap,
};
pub use node_pool::NodeId;
pub use policy::{BucketPolicy, Fixed, PowerOfTwo, Prime, StaticBuckets};
pub use set::{
    HeapUnorderedMultiSet, HeapUnorderedSet, SmallUnorderedMultiSet, SmallUnorderedSet,
    StaticUnorderedMultiSet, StaticUnorderedSet, UnorderedMultiSet, UnorderedSet,
};
pub use table::DEFAULT_MAX_LOAD_FACTOR;
