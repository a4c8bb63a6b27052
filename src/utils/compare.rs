//! Comparators for the sorted (flat) containers.
//!
//! A comparator is a value implementing [`Compare<Q>`] for every key shape it
//! can order. Lookups take any `Q` the stored key [`Borrow`](core::borrow::Borrow)s
//! as, so a comparator that is generic over `Q` is transparent: a
//! `FlatMap<String, _>` can be searched with a `&str` without building a
//! temporary `String`.

use core::cmp::Ordering;

/// A strict weak ordering over `Q`.
pub trait Compare<Q: ?Sized> {
    fn compare(&self, a: &Q, b: &Q) -> Ordering;

    #[inline]
    fn less(&self, a: &Q, b: &Q) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// Ascending order by [`Ord`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Natural;

impl<Q: Ord + ?Sized> Compare<Q> for Natural {
    #[inline(always)]
    fn compare(&self, a: &Q, b: &Q) -> Ordering {
        a.cmp(b)
    }
}

/// Descending order by [`Ord`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Reverse;

impl<Q: Ord + ?Sized> Compare<Q> for Reverse {
    #[inline(always)]
    fn compare(&self, a: &Q, b: &Q) -> Ordering {
        b.cmp(a)
    }
}

/// Adapts a closure into a comparator for a single key type.
#[derive(Clone, Copy)]
pub struct CompareBy<F>(pub F);

impl<Q: ?Sized, F> Compare<Q> for CompareBy<F>
where
    F: Fn(&Q, &Q) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &Q, b: &Q) -> Ordering {
        (self.0)(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_natural_and_reverse() {
        assert!(Natural.less(&1, &2));
        assert!(Reverse.less(&2, &1));
        assert_eq!(Compare::<str>::compare(&Natural, "a", "b"), Ordering::Less);
    }

    #[test]
    fn test_compare_by_closure() {
        let by_len = CompareBy(|a: &str, b: &str| a.len().cmp(&b.len()));
        assert!(by_len.less("zz", "aaa"));
    }
}
