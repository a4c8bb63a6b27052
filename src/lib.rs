//! # Static Collections
//!
//! Containers that keep a fixed amount of storage inline and either spill to
//! the heap when it runs out (`Small*`) or refuse to grow at all (`Static*`).
//!
//! The crate is layered:
//!
//! * **Storage:** [`HybridStorage`] (inline, then heap) and [`InlineStorage`]
//!   (inline only) implement the [`Storage`] trait, which owns the unsafe
//!   bookkeeping every container builds on.
//! * **Vectors:** [`SmallVec`] and [`StaticVec`].
//! * **Flat containers** (feature `flat`): sorted maps and sets backed by one
//!   contiguous buffer, with binary-search lookup.
//! * **Unordered containers** (feature `unordered`): chained hash maps and
//!   sets over a node pool with stable [`NodeId`] handles, FNV hashing by
//!   default and pluggable bucket policies.
//!
//! ## Key Features
//!
//! * **No allocation until needed:** inline capacity is used first; `Static*`
//!   variants never touch the heap.
//! * **Fallible everywhere:** every growing operation has a `try_*` form
//!   returning [`CollectionError`]. The plain forms panic with the error's message.
//! * **Stateful allocators:** any [`Allocator`](utils::alloc::Allocator) can back
//!   the heap part; [`ContainerAlloc`](utils::alloc::ContainerAlloc) says how it
//!   propagates on clone, swap and move-assign.
//! * **Compile-time safety:** inline buffers larger than 16KB are rejected at build time.
//!
//! ## Examples
//!
//! ### SmallVec
//!
//! ```rust
//! use static_collections::SmallVec;
//!
//! let mut v: SmallVec<i32, 4> = SmallVec::new();
//! for i in 0..4 {
//!     v.push(i);
//! }
//! assert!(v.is_inline());
//!
//! // The fifth element moves everything to the heap.
//! v.push(4);
//! assert!(!v.is_inline());
//! assert_eq!(v.as_slice(), &[0, 1, 2, 3, 4]);
//! ```
//!
//! ### StaticVec
//!
//! ```rust
//! use static_collections::{CollectionError, StaticVec};
//!
//! let mut v: StaticVec<u8, 2> = StaticVec::new();
//! v.push(1);
//! v.push(2);
//! assert_eq!(v.try_push(3), Err(CollectionError::CapacityExhausted { capacity: 2 }));
//! ```
//!
//! ### Flat map
//!
//! ```rust
//! use static_collections::SmallFlatMap;
//!
//! let mut map: SmallFlatMap<&str, i32, 4> = SmallFlatMap::new();
//! map.insert("b", 2);
//! map.insert("a", 1);
//!
//! let keys: Vec<&str> = map.iter().map(|(k, _)| *k).collect();
//! assert_eq!(keys, ["a", "b"]);
//! assert_eq!(map["a"], 1);
//! ```
//!
//! ### Unordered set
//!
//! ```rust
//! use static_collections::StaticUnorderedSet;
//!
//! // At most 8 values in 4 buckets, all inline.
//! let mut set: StaticUnorderedSet<u32, 8, 4> = StaticUnorderedSet::new();
//! assert!(set.insert(7));
//! assert!(!set.insert(7));
//! assert!(set.contains(&7));
//! assert_eq!(set.bucket_count(), 4);
//! ```

// --- Module Declarations ---

pub mod error;
pub mod segmented;
pub mod sets;
pub mod storage;
pub mod utils;
pub mod vecs;

#[cfg(feature = "flat")]
pub mod maps;

#[cfg(feature = "unordered")]
pub mod unordered;

// --- Re-exports ---

pub use error::{CollectionError, Result};
pub use sets::AnySet;
pub use storage::{HybridStorage, InlineStorage, Storage};
pub use vecs::{AnyVec, SmallVec, StaticVec, Vector};

#[cfg(feature = "flat")]
pub use maps::{
    FlatMap, FlatMultiMap, SmallFlatMap, SmallFlatMultiMap, StaticFlatMap, StaticFlatMultiMap,
};
#[cfg(feature = "flat")]
pub use sets::{
    FlatMultiSet, FlatSet, SmallFlatMultiSet, SmallFlatSet, StaticFlatMultiSet, StaticFlatSet,
};

#[cfg(feature = "unordered")]
pub use unordered::{
    HeapUnorderedMap, HeapUnorderedMultiMap, HeapUnorderedMultiSet, HeapUnorderedSet, NodeId,
    SmallUnorderedMap, SmallUnorderedMultiMap, SmallUnorderedMultiSet, SmallUnorderedSet,
    StaticUnorderedMap, StaticUnorderedMultiMap, StaticUnorderedMultiSet, StaticUnorderedSet,
    UnorderedMap, UnorderedMultiMap, UnorderedMultiSet, UnorderedSet,
};
