//! Synchronization Support
//!
//! - [`CriticalSectionCell`] - ISR-safe interior mutability
//! - [`RegsLock`] / [`RegsGuard`] - task-level register lock with RAII release
//!
//! The `critical-section` implementation is provided by the target's HAL or
//! runtime crate (host tests use its `std` implementation).

mod primitives;

pub use primitives::{CriticalSectionCell, RegsGuard, RegsLock};
