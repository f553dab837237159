//! Volatile cell for descriptor memory shared with the prefetcher.

use core::cell::UnsafeCell;

/// A word the prefetcher reads and writes behind the CPU's back.
///
/// Every access is a single volatile load or store.
#[repr(transparent)]
pub(crate) struct VolatileCell<T: Copy> {
    value: UnsafeCell<T>,
}

// Safety: accesses are single aligned volatile word loads and stores, and
// list mutation goes through `&mut DescriptorPool`.
unsafe impl<T: Copy> Sync for VolatileCell<T> {}

impl<T: Copy> VolatileCell<T> {
    #[inline(always)]
    pub(crate) const fn new(value: T) -> Self {
        Self {
            value: UnsafeCell::new(value),
        }
    }

    #[inline(always)]
    pub(crate) fn get(&self) -> T {
        // SAFETY: the pointer comes from a live `UnsafeCell`
        unsafe { core::ptr::read_volatile(self.value.get()) }
    }

    #[inline(always)]
    pub(crate) fn set(&self, value: T) {
        // SAFETY: the pointer comes from a live `UnsafeCell`
        unsafe { core::ptr::write_volatile(self.value.get(), value) }
    }
}
