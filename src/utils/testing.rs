//! Test-only allocator and element types.

use core::cell::Cell;
use core::hash::{BuildHasher, Hasher};
use core::ptr::NonNull;
use std::rc::Rc;

use crate::utils::alloc::{AllocError, Allocator, ContainerAlloc, Global, Layout, Propagation};

#[derive(Debug, Default)]
pub(crate) struct AllocStats {
    pub allocations: Cell<usize>,
    pub deallocations: Cell<usize>,
    pub live_bytes: Cell<usize>,
    /// Number of further allocations that succeed before every request fails.
    pub fail_after: Cell<Option<usize>>,
}

/// Stateful allocator: instances with different `id`s cannot free each other's memory.
#[derive(Debug, Clone)]
pub(crate) struct CountingAlloc<const PROPAGATE: bool = false> {
    pub id: u32,
    pub stats: Rc<AllocStats>,
}

impl<const PROPAGATE: bool> CountingAlloc<PROPAGATE> {
    pub fn new(id: u32) -> Self {
        Self {
            id,
            stats: Rc::new(AllocStats::default()),
        }
    }

    pub fn allocations(&self) -> usize {
        self.stats.allocations.get()
    }

    pub fn live_bytes(&self) -> usize {
        self.stats.live_bytes.get()
    }

    pub fn fail_after(&self, n: usize) {
        self.stats.fail_after.set(Some(n));
    }
}

unsafe impl<const PROPAGATE: bool> Allocator for CountingAlloc<PROPAGATE> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
        if let Some(left) = self.stats.fail_after.get() {
            if left == 0 {
                return Err(AllocError);
            }
            self.stats.fail_after.set(Some(left - 1));
        }
        let block = Global.allocate(layout)?;
        self.stats.allocations.set(self.stats.allocations.get() + 1);
        self.stats
            .live_bytes
            .set(self.stats.live_bytes.get() + layout.size());
        Ok(block)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        self.stats.deallocations.set(self.stats.deallocations.get() + 1);
        self.stats
            .live_bytes
            .set(self.stats.live_bytes.get() - layout.size());
        unsafe { Global.deallocate(ptr, layout) }
    }
}

impl<const PROPAGATE: bool> ContainerAlloc for CountingAlloc<PROPAGATE> {
    const PROPAGATION: Propagation = if PROPAGATE {
        Propagation::ALWAYS
    } else {
        Propagation::NEVER
    };

    fn is_equal(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Counts how many times values are dropped.
#[derive(Debug)]
pub(crate) struct Dropper(pub Rc<Cell<usize>>);

impl Drop for Dropper {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

impl Clone for Dropper {
    fn clone(&self) -> Self {
        Dropper(self.0.clone())
    }
}

/// Panics on the clone that brings the shared budget to zero.
#[derive(Debug)]
pub(crate) struct CloneBomb {
    pub value: i32,
    pub budget: Rc<Cell<usize>>,
    pub drops: Rc<Cell<usize>>,
}

impl Clone for CloneBomb {
    fn clone(&self) -> Self {
        let left = self.budget.get();
        if left == 0 {
            panic!("clone budget exhausted");
        }
        self.budget.set(left - 1);
        CloneBomb {
            value: self.value,
            budget: self.budget.clone(),
            drops: self.drops.clone(),
        }
    }
}

impl Drop for CloneBomb {
    fn drop(&mut self) {
        self.drops.set(self.drops.get() + 1);
    }
}

/// Hashes integers to themselves, so bucket placement is predictable.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct IdentityHasher;

#[derive(Debug, Default)]
pub(crate) struct IdentityState(u64);

impl Hasher for IdentityState {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 = (self.0 << 8) | b as u64;
        }
    }

    fn write_u64(&mut self, n: u64) {
        self.0 = n;
    }

    fn write_u32(&mut self, n: u32) {
        self.0 = n as u64;
    }

    fn write_i32(&mut self, n: i32) {
        self.0 = n as u64;
    }

    fn write_usize(&mut self, n: usize) {
        self.0 = n as u64;
    }
}

impl BuildHasher for IdentityHasher {
    type Hasher = IdentityState;

    fn build_hasher(&self) -> IdentityState {
        IdentityState::default()
    }
}

#[test]
fn test_alloc_borrowed_compares_by_identity() {
    let a: CountingAlloc = CountingAlloc::new(1);
    let b: CountingAlloc = CountingAlloc::new(1);
    let ra = &a;
    assert!(ra.is_equal(&&a));
    assert!(!ra.is_equal(&&b));
    assert_eq!(<&CountingAlloc as ContainerAlloc>::PROPAGATION, Propagation::NEVER);
}
