//! Synchronization primitives for ISR-safe access.
//!
//! Two kinds of exclusion are used by the drivers:
//! - [`CriticalSectionCell`] holds state the interrupt handler reads
//!   (callback and control template); every access masks interrupts.
//! - [`RegsLock`] serializes task-level callers over a device's register
//!   sequences and is never taken from interrupt context.

use core::cell::RefCell;
use core::ops::{Deref, DerefMut};

use critical_section::Mutex;

/// Cell providing interior mutability with critical section protection.
///
/// Combines `critical_section::Mutex` with `RefCell` for safe mutable access
/// from both normal code and interrupt handlers.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Execute a closure with exclusive mutable access.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut value = self.inner.borrow_ref_mut(cs);
            f(&mut value)
        })
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .map(|mut value| f(&mut value))
        })
    }

    /// Execute a closure with immutable access.
    #[inline]
    pub fn with_ref<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        critical_section::with(|cs| {
            let value = self.inner.borrow_ref(cs);
            f(&value)
        })
    }
}

impl<T: Copy> CriticalSectionCell<T> {
    /// Copy the value out
    #[inline]
    pub fn get(&self) -> T {
        self.with_ref(|value| *value)
    }

    /// Replace the value
    #[inline]
    pub fn set(&self, value: T) {
        self.with(|slot| *slot = value);
    }
}

// SAFETY: CriticalSectionCell uses critical sections to protect all access.
unsafe impl<T> Sync for CriticalSectionCell<T> {}

// =============================================================================
// Register Lock
// =============================================================================

/// Task-level lock over a device's register sequences.
///
/// Acquisition spins until the holder drops its [`RegsGuard`], so every exit
/// path of a driver operation releases the lock.
pub struct RegsLock<T> {
    inner: spin::Mutex<T>,
}

impl<T> RegsLock<T> {
    /// Create an unlocked lock (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: spin::Mutex::new(value),
        }
    }

    /// Block until the lock is free, then take it
    #[inline]
    pub fn acquire(&self) -> RegsGuard<'_, T> {
        RegsGuard {
            inner: self.inner.lock(),
        }
    }

    /// Take the lock if it is free
    #[inline]
    pub fn try_acquire(&self) -> Option<RegsGuard<'_, T>> {
        self.inner.try_lock().map(|inner| RegsGuard { inner })
    }

    /// Check if some caller currently holds the lock
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.inner.is_locked()
    }
}

/// Held [`RegsLock`]; releases on drop.
pub struct RegsGuard<'a, T> {
    inner: spin::MutexGuard<'a, T>,
}

impl<T> Deref for RegsGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner
    }
}

impl<T> DerefMut for RegsGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_get_and_set() {
        let cell = CriticalSectionCell::new(3u32);
        cell.set(7);
        assert_eq!(cell.get(), 7);
        assert_eq!(cell.with(|v| core::mem::replace(v, 1)), 7);
        assert_eq!(cell.with_ref(|v| *v), 1);
    }

    #[test]
    fn cell_try_with_reports_nested_borrow() {
        let cell = CriticalSectionCell::new(0u8);
        let nested = cell.with(|_| cell.try_with(|v| *v));
        assert!(nested.is_none());
        assert_eq!(cell.try_with(|v| *v), Some(0));
    }

    #[test]
    fn lock_released_on_guard_drop() {
        let lock = RegsLock::new(0u32);
        {
            let mut guard = lock.acquire();
            *guard += 1;
            assert!(lock.is_locked());
            assert!(lock.try_acquire().is_none());
        }
        assert!(!lock.is_locked());
        assert_eq!(*lock.acquire(), 1);
    }
}
