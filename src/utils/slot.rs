//! A storage cell for at most one value.
//!
//! `Slot<T>` keeps a possibly-uninitialized `T` together with an explicit
//! liveness flag, so the cell can sit in a free list without a value and still
//! be dropped or cloned correctly.

use core::fmt;
use core::mem::MaybeUninit;

pub struct Slot<T> {
    live: bool,
    value: MaybeUninit<T>,
}

impl<T> Slot<T> {
    /// An empty slot.
    #[inline]
    pub const fn empty() -> Self {
        Self {
            live: false,
            value: MaybeUninit::uninit(),
        }
    }

    /// A slot holding `value`.
    #[inline]
    pub const fn new(value: T) -> Self {
        Self {
            live: true,
            value: MaybeUninit::new(value),
        }
    }

    #[inline(always)]
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Stores `value` in an empty slot.
    ///
    /// # Panics
    /// Debug builds panic if the slot already holds a value.
    #[inline]
    pub fn put(&mut self, value: T) {
        debug_assert!(!self.live, "slot already occupied");
        self.value.write(value);
        self.live = true;
    }

    /// Moves the value out, leaving the slot empty.
    #[inline]
    pub fn take(&mut self) -> Option<T> {
        if self.live {
            self.live = false;
            // SAFETY: `live` guarded the value and is now cleared.
            Some(unsafe { self.value.assume_init_read() })
        } else {
            None
        }
    }

    #[inline]
    pub fn get(&self) -> Option<&T> {
        if self.live {
            Some(unsafe { self.value.assume_init_ref() })
        } else {
            None
        }
    }

    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        if self.live {
            Some(unsafe { self.value.assume_init_mut() })
        } else {
            None
        }
    }

    /// # Safety
    /// The slot must be live.
    #[inline(always)]
    pub unsafe fn get_unchecked(&self) -> &T {
        debug_assert!(self.live);
        unsafe { self.value.assume_init_ref() }
    }

    /// # Safety
    /// The slot must be live.
    #[inline(always)]
    pub unsafe fn get_unchecked_mut(&mut self) -> &mut T {
        debug_assert!(self.live);
        unsafe { self.value.assume_init_mut() }
    }

    /// Drops the value, if any.
    #[inline]
    pub fn clear(&mut self) {
        drop(self.take());
    }
}

impl<T> Drop for Slot<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone> Clone for Slot<T> {
    fn clone(&self) -> Self {
        match self.get() {
            Some(value) => Slot::new(value.clone()),
            None => Slot::empty(),
        }
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: fmt::Debug> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => f.debug_tuple("Slot").field(value).finish(),
            None => f.write_str("Slot(<empty>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::testing::Dropper;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_slot_put_take_cycle() {
        let mut slot = Slot::empty();
        assert!(!slot.is_live());
        slot.put(String::from("a"));
        assert_eq!(slot.get().map(String::as_str), Some("a"));
        assert_eq!(slot.take(), Some(String::from("a")));
        assert_eq!(slot.take(), None);
        slot.put(String::from("b"));
        slot.get_mut().unwrap().push('!');
        assert_eq!(format!("{:?}", slot), "Slot(\"b!\")");
    }

    #[test]
    fn test_slot_drops_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut live = Slot::new(Dropper(drops.clone()));
            let copy = live.clone();
            let _empty: Slot<Dropper> = Slot::empty();
            live.clear();
            assert_eq!(drops.get(), 1);
            drop(copy);
            assert_eq!(drops.get(), 2);
        }
        assert_eq!(drops.get(), 2);
    }
}
