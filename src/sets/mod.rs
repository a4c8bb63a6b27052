//! Sorted sets and the [`AnySet`] interoperability trait.

use std::collections::{BTreeSet, HashSet};
use std::hash::{BuildHasher, Hash};

#[cfg(feature = "flat")]
pub mod flat_set;

#[cfg(feature = "flat")]
pub use flat_set::{
    FlatMultiSet, FlatSet, SmallFlatMultiSet, SmallFlatSet, StaticFlatMultiSet, StaticFlatSet,
};

// ==================================================================================
// The Interoperability Trait
// ==================================================================================

/// A collection that answers membership queries.
///
/// Set algebra on the crate's sets (`difference`, `intersection`, `is_subset`,
/// `is_disjoint`) takes any `AnySet`, so a flat set can be compared against a
/// standard `HashSet` or `BTreeSet` (or an unordered set) without converting either side.
pub trait AnySet<T> {
    /// Returns `true` if the collection contains the value.
    fn contains(&self, value: &T) -> bool;
}

impl<T, S> AnySet<T> for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn contains(&self, value: &T) -> bool {
        HashSet::contains(self, value)
    }
}

impl<T: Ord> AnySet<T> for BTreeSet<T> {
    fn contains(&self, value: &T) -> bool {
        BTreeSet::contains(self, value)
    }
}
