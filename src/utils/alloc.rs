//! The allocator collaborator.
//!
//! Containers are generic over any [`allocator_api2`] allocator that also
//! implements [`ContainerAlloc`]. The extra trait carries what the raw
//! `Allocator` interface cannot: whether two instances can free each other's
//! memory, and whether the allocator follows its elements when a container is
//! cloned into, move-assigned or swapped.

pub use allocator_api2::alloc::{AllocError, Allocator, Global, Layout};

/// Which container operations carry the allocator along with the elements.
///
/// When a flag is `false` and the two allocators are not
/// [equal](ContainerAlloc::is_equal), the container keeps its own allocator
/// and transfers elements one by one instead of adopting the other buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Propagation {
    /// `clone_from` adopts the source's allocator.
    pub on_clone: bool,
    /// `assign_take` adopts the source's allocator.
    pub on_move_assign: bool,
    /// `swap` exchanges allocators.
    pub on_swap: bool,
}

impl Propagation {
    /// The allocator always travels with the elements.
    pub const ALWAYS: Propagation = Propagation {
        on_clone: true,
        on_move_assign: true,
        on_swap: true,
    };

    /// The allocator stays with the container instance.
    pub const NEVER: Propagation = Propagation {
        on_clone: false,
        on_move_assign: false,
        on_swap: false,
    };
}

/// An [`Allocator`] usable as a container's storage provider.
pub trait ContainerAlloc: Allocator + Clone {
    /// Propagation behaviour for this allocator type.
    const PROPAGATION: Propagation = Propagation::ALWAYS;

    /// Returns `true` if memory allocated by `self` may be freed by `other` and vice versa.
    fn is_equal(&self, other: &Self) -> bool;

    /// The allocator a freshly cloned container should use.
    fn select_on_clone(&self) -> Self {
        self.clone()
    }
}

impl ContainerAlloc for Global {
    #[inline(always)]
    fn is_equal(&self, _other: &Self) -> bool {
        true
    }
}

/// Borrowed allocators (arenas) compare by identity and never propagate:
/// a container keeps drawing from the arena it was created with.
impl<A: Allocator> ContainerAlloc for &A {
    const PROPAGATION: Propagation = Propagation::NEVER;

    #[inline]
    fn is_equal(&self, other: &Self) -> bool {
        core::ptr::eq(*self, *other)
    }
}
