pub mod flat_map;
pub mod flat_tree;

pub use flat_map::{
    FlatMap, FlatMultiMap, SmallFlatMap, SmallFlatMultiMap, StaticFlatMap, StaticFlatMultiMap,
};
