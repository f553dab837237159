//! Completion callbacks.
//!
//! A callback is any `Sync` object implementing [`Callback`]; its own fields
//! play the role of the opaque user context. Closures and `fn` items work
//! through the blanket impl.
//!
//! Callbacks run from interrupt context inside a critical section, so they
//! must be short and must not call blocking driver operations (the register
//! lock is never taken from interrupt context and would spin forever if a
//! task held it).

use crate::sync::CriticalSectionCell;

/// Handler invoked with a status snapshot when a device interrupts.
pub trait Callback<S>: Sync {
    /// Called from the interrupt handler with interrupts masked
    fn call(&self, status: S);
}

impl<S, F> Callback<S> for F
where
    F: Fn(S) + Sync,
{
    fn call(&self, status: S) {
        self(status);
    }
}

/// Callback registration read by the interrupt handler.
pub struct Registration<S: Copy + 'static> {
    /// Registered handler, if any
    pub handler: Option<&'static dyn Callback<S>>,
    /// Control template bits applied when arming transfers
    pub control: u32,
}

impl<S: Copy + 'static> Clone for Registration<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Copy + 'static> Copy for Registration<S> {}

/// ISR-readable callback slot.
pub struct CallbackSlot<S: Copy + 'static> {
    inner: CriticalSectionCell<Registration<S>>,
}

impl<S: Copy + 'static> CallbackSlot<S> {
    /// Empty slot (polling mode)
    pub const fn new() -> Self {
        Self {
            inner: CriticalSectionCell::new(Registration {
                handler: None,
                control: 0,
            }),
        }
    }

    /// Replace the handler and control template
    pub fn register(&self, handler: Option<&'static dyn Callback<S>>, control: u32) {
        self.inner.set(Registration { handler, control });
    }

    /// Snapshot of the current registration
    pub fn get(&self) -> Registration<S> {
        self.inner.get()
    }

    /// Check whether a handler is registered
    pub fn is_registered(&self) -> bool {
        self.get().handler.is_some()
    }

    /// Invoke the handler, if any, inside a critical section.
    ///
    /// The registration is copied out first, so the handler may re-register.
    /// Returns whether a handler ran.
    pub fn invoke_masked(&self, status: S) -> bool {
        match self.get().handler {
            Some(handler) => {
                critical_section::with(|_cs| handler.call(status));
                true
            }
            None => false,
        }
    }
}

impl<S: Copy + 'static> Default for CallbackSlot<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    static LAST: AtomicU32 = AtomicU32::new(0);

    fn record(status: u32) {
        LAST.store(status, Ordering::SeqCst);
    }

    static RECORD: fn(u32) = record;

    #[test]
    fn empty_slot_invokes_nothing() {
        let slot: CallbackSlot<u32> = CallbackSlot::new();
        assert!(!slot.is_registered());
        assert!(!slot.invoke_masked(1));
    }

    #[test]
    fn registered_fn_receives_status() {
        let slot: CallbackSlot<u32> = CallbackSlot::new();
        slot.register(Some(&RECORD), 0x14);

        assert!(slot.is_registered());
        assert_eq!(slot.get().control, 0x14);
        assert!(slot.invoke_masked(0xAB));
        assert_eq!(LAST.load(Ordering::SeqCst), 0xAB);
    }

    #[test]
    fn register_none_reverts_to_polling() {
        let slot: CallbackSlot<u32> = CallbackSlot::new();
        slot.register(Some(&RECORD), 0);
        slot.register(None, 0);
        assert!(!slot.is_registered());
    }
}
