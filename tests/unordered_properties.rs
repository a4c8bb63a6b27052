#![cfg(feature = "unordered")]

use proptest::prelude::*;
use std::collections::HashMap;
use std::hash::{BuildHasherDefault, Hasher};
use static_collections::{
    CollectionError, HeapUnorderedSet, SmallUnorderedMap, SmallUnorderedMultiMap,
    SmallUnorderedMultiSet, SmallUnorderedSet, StaticUnorderedSet,
};

/// Hashes an integer key to itself, so bucket placement is predictable.
#[derive(Default)]
struct IdentityState(u64);

impl Hasher for IdentityState {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | u64::from(b);
        }
    }

    fn write_u32(&mut self, n: u32) {
        self.0 = u64::from(n);
    }
}

type Identity = BuildHasherDefault<IdentityState>;

proptest! {
    #[test]
    fn test_unordered_map_hash_partition(keys in prop::collection::vec(any::<u32>(), 0..300)) {
        let mut map: SmallUnorderedMap<u32, u32, 8> = SmallUnorderedMap::new();
        for k in &keys {
            map.insert_or_assign(*k, k ^ 1);
        }
        for k in keys.iter().step_by(3) {
            map.erase(k);
        }
        prop_assert!(map.load_factor() <= map.max_load_factor());
        for (k, _) in map.iter() {
            let home = map.bucket(k);
            prop_assert_eq!(map.bucket_iter(home).filter(|(x, _)| *x == k).count(), 1);
            let total: usize = (0..map.bucket_count())
                .map(|b| map.bucket_iter(b).filter(|(x, _)| *x == k).count())
                .sum();
            prop_assert_eq!(total, 1);
        }
    }

    #[test]
    fn test_unordered_map_growth_matches_model(pairs in prop::collection::vec((any::<u16>(), any::<u32>()), 0..400)) {
        let mut map: SmallUnorderedMap<u16, u32, 4> = SmallUnorderedMap::new();
        let mut model = HashMap::new();
        for (k, v) in &pairs {
            map.insert_or_assign(*k, *v);
            model.insert(*k, *v);
        }
        prop_assert_eq!(map.len(), model.len());
        prop_assert!(map.len() <= map.capacity());
        for (k, v) in &model {
            prop_assert_eq!(map.get(k), Some(v));
        }
        let rebuilt: HashMap<u16, u32> = map.into_iter().collect();
        prop_assert_eq!(rebuilt, model);
    }

    #[test]
    fn test_unordered_set_erase_missing_is_noop(values in prop::collection::vec(0u32..1000, 0..100)) {
        let mut set: SmallUnorderedSet<u32, 4> = values.iter().copied().collect();
        let len = set.len();
        let before: Vec<u32> = set.iter().copied().collect();
        prop_assert_eq!(set.erase(&5000), 0);
        prop_assert_eq!(set.len(), len);
        let after: Vec<u32> = set.iter().copied().collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn test_unordered_containers_clone_equal(values in prop::collection::vec(0u8..32, 0..80)) {
        let set: HeapUnorderedSet<u8> = values.iter().copied().collect();
        prop_assert_eq!(&set.clone(), &set);

        let multi: SmallUnorderedMultiSet<u8, 4> = values.iter().copied().collect();
        let copy = multi.clone();
        prop_assert_eq!(&copy, &multi);
        for v in 0u8..32 {
            prop_assert_eq!(copy.count(&v), values.iter().filter(|x| **x == v).count());
        }
    }

    #[test]
    fn test_unordered_multimap_matches_model(pairs in prop::collection::vec((0u8..16, any::<i32>()), 0..200)) {
        let mut map: SmallUnorderedMultiMap<u8, i32, 4> = SmallUnorderedMultiMap::new();
        let mut model: HashMap<u8, Vec<i32>> = HashMap::new();
        for (k, v) in &pairs {
            map.insert(*k, *v);
            model.entry(*k).or_default().push(*v);
        }
        prop_assert_eq!(map.len(), pairs.len());
        for (k, expected) in &mut model {
            let mut got: Vec<i32> = map.get_all(k).copied().collect();
            got.sort();
            expected.sort();
            prop_assert_eq!(&got, expected);
        }
        prop_assert!(map.is_partitioned());
    }

    #[test]
    fn test_static_unordered_set_capacity_bound(values in prop::collection::vec(any::<u32>(), 0..128)) {
        let mut set: StaticUnorderedSet<u32, 64, 8, Identity> = StaticUnorderedSet::new();
        for v in values {
            let present = set.contains(&v);
            match set.try_insert(v) {
                Ok(inserted) => prop_assert_eq!(inserted, !present),
                Err(err) => {
                    prop_assert_eq!(err, CollectionError::CapacityExhausted { capacity: 64 });
                    prop_assert!(set.is_full());
                }
            }
            prop_assert!(set.len() <= set.capacity());
            prop_assert_eq!(set.bucket_count(), 8);
        }
        for b in 0..8 {
            prop_assert!(set.bucket_iter(b).all(|v| (*v % 8) as usize == b));
        }
    }
}

#[test]
fn test_static_unordered_set_collisions_share_bucket() {
    let mut set: StaticUnorderedSet<u32, 8, 8, Identity> = StaticUnorderedSet::new();
    for v in [1, 9, 17] {
        assert!(set.insert(v));
    }
    assert_eq!(set.bucket_size(1), 3);
    assert!(set.contains(&1) && set.contains(&9) && set.contains(&17));
    assert_eq!(set.bucket_count(), 8);
}
