pub mod vector;

pub use vector::{AnyVec, SmallVec, StaticVec, Vector};
