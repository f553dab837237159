//! Memory-mapped response port
//!
//! Reading the error/status word pops the response FIFO, so it must be read
//! after the byte count.

use super::{RegisterBus, reg_ro};

/// Actual bytes transferred
pub const ACTUAL_BYTES_OFFSET: usize = 0x00;
/// Error bits and early termination (reading pops the entry)
pub const ERROR_STATUS_OFFSET: usize = 0x04;

/// Error field
pub const ERROR_MASK: u32 = 0xFF;
/// Transfer ended early
pub const EARLY_TERMINATION: u32 = 1 << 8;

/// Response port bound to a register bus.
pub struct ResponsePort<'a, R: RegisterBus> {
    bus: &'a R,
    base: usize,
}

impl<'a, R: RegisterBus> ResponsePort<'a, R> {
    /// Bind the port at `base`
    #[inline(always)]
    pub const fn new(bus: &'a R, base: usize) -> Self {
        Self { bus, base }
    }

    reg_ro!(actual_bytes, ACTUAL_BYTES_OFFSET, "actual bytes transferred");
    reg_ro!(pop_error_status, ERROR_STATUS_OFFSET, "error status and pop the entry");
}
