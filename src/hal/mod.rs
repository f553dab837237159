//! Hardware Abstraction Layer
//!
//! Collaborator seams the drivers consume rather than own.
//!
//! # Modules
//!
//! - [`interrupt`]: Interrupt controller trait and init hook
//! - [`poll`]: Bounded polling with an explicit backoff policy
//! - [`registry`]: Name-keyed device registry
//!
//! # Delay Integration
//!
//! All waits use `embedded_hal::delay::DelayNs` directly.
//! Pass any delay implementation from your HAL.

pub mod interrupt;
pub mod poll;
pub mod registry;

// Re-export commonly used types
pub use interrupt::{InterruptController, IrqLine, NoController, init_interrupt_controller};
pub use poll::{Poll, PollBudget, Poller, poll_until};
pub use registry::{DeviceRegistry, Named};
