pub mod alloc;
pub mod compare;
pub mod key_of;
pub mod memory;
pub mod slot;
#[cfg(test)]
pub(crate) mod testing;
