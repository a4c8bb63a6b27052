//! Bucket-count policies.
//!
//! A policy is a pair of pure functions: which bucket counts are allowed
//! (`bucket_count_for`) and how a hash picks a bucket (`index`). Dynamic
//! tables grow through the policy; a static table is pinned to its const
//! bucket count, and its index function is chosen at compile time from the
//! shape of that count.
//!
//! | Policy              | Counts              | Index              |
//! |---------------------|---------------------|--------------------|
//! | [`PowerOfTwo`]      | next power of two   | `hash & (count-1)` |
//! | [`Prime`]           | next prime          | `hash % count`     |
//! | [`Fixed`]           | any non-zero count  | `hash % count`     |
//! | [`StaticBuckets<N>`]| exactly `N`         | mask if `N` is a power of two, else modulo |

/// Maps hashes to buckets and decides which bucket counts are valid.
pub trait BucketPolicy {
    /// `false` for a fixed bucket array that never rehashes.
    const DYNAMIC: bool;

    /// The smallest valid bucket count of at least `min`, or `None` if it
    /// does not fit in `usize`.
    fn bucket_count_for(min: usize) -> Option<usize>;

    /// Bucket of `hash` in a table of `count` buckets (`count > 0`).
    fn index(hash: u64, count: usize) -> usize;
}

/// Shape of a bucket count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketKind {
    PowerOfTwo,
    Prime,
    Arbitrary,
}

impl BucketKind {
    pub const fn classify(count: usize) -> Self {
        if count.is_power_of_two() {
            BucketKind::PowerOfTwo
        } else if is_prime(count) {
            BucketKind::Prime
        } else {
            BucketKind::Arbitrary
        }
    }
}

pub const fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let mut i = 5;
    while i <= n / i {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

/// Smallest prime `>= n`.
pub fn next_prime(n: usize) -> Option<usize> {
    let mut candidate = n.max(2);
    if candidate > 2 && candidate % 2 == 0 {
        candidate = candidate.checked_add(1)?;
    }
    while !is_prime(candidate) {
        candidate = candidate.checked_add(2)?;
    }
    Some(candidate)
}

/// Growable table with power-of-two bucket counts (the default).
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerOfTwo;

impl BucketPolicy for PowerOfTwo {
    const DYNAMIC: bool = true;

    #[inline]
    fn bucket_count_for(min: usize) -> Option<usize> {
        min.max(1).checked_next_power_of_two()
    }

    #[inline(always)]
    fn index(hash: u64, count: usize) -> usize {
        debug_assert!(count.is_power_of_two());
        (hash as usize) & (count - 1)
    }
}

/// Growable table with prime bucket counts; tolerates weak hashes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Prime;

impl BucketPolicy for Prime {
    const DYNAMIC: bool = true;

    fn bucket_count_for(min: usize) -> Option<usize> {
        next_prime(min)
    }

    #[inline(always)]
    fn index(hash: u64, count: usize) -> usize {
        (hash % count as u64) as usize
    }
}

/// Growable table that takes bucket counts as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fixed;

impl BucketPolicy for Fixed {
    const DYNAMIC: bool = true;

    #[inline]
    fn bucket_count_for(min: usize) -> Option<usize> {
        Some(min.max(1))
    }

    #[inline(always)]
    fn index(hash: u64, count: usize) -> usize {
        (hash % count as u64) as usize
    }
}

/// Exactly `NB` buckets, never rehashed.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticBuckets<const NB: usize>;

impl<const NB: usize> StaticBuckets<NB> {
    pub const KIND: BucketKind = {
        assert!(NB > 0, "a static table needs at least one bucket");
        BucketKind::classify(NB)
    };
}

impl<const NB: usize> BucketPolicy for StaticBuckets<NB> {
    const DYNAMIC: bool = false;

    #[inline(always)]
    fn bucket_count_for(_min: usize) -> Option<usize> {
        Some(NB)
    }

    #[inline(always)]
    fn index(hash: u64, _count: usize) -> usize {
        match Self::KIND {
            BucketKind::PowerOfTwo => (hash as usize) & (NB - 1),
            BucketKind::Prime | BucketKind::Arbitrary => (hash % NB as u64) as usize,
        }
    }
}
