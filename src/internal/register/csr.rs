//! Dispatcher control/status register (CSR) block

use super::{RegisterBus, reg_ro, reg_rw};

// =============================================================================
// Register Offsets
// =============================================================================

/// Status register (IRQ bit is write-one-to-clear)
pub const STATUS_OFFSET: usize = 0x00;
/// Control register
pub const CONTROL_OFFSET: usize = 0x04;
/// Read and write command queue fill levels
pub const DESCRIPTOR_FILL_LEVEL_OFFSET: usize = 0x08;
/// Response queue fill level
pub const RESPONSE_FILL_LEVEL_OFFSET: usize = 0x0C;
/// Last read and write sequence numbers
pub const SEQUENCE_NUMBER_OFFSET: usize = 0x10;

// =============================================================================
// Bit Definitions
// =============================================================================

/// Status register bits
pub mod status {
    /// Dispatcher is processing a descriptor
    pub const BUSY: u32 = 1 << 0;
    /// Descriptor buffer is empty
    pub const DESCRIPTOR_BUFFER_EMPTY: u32 = 1 << 1;
    /// Descriptor buffer is full
    pub const DESCRIPTOR_BUFFER_FULL: u32 = 1 << 2;
    /// Response buffer is empty
    pub const RESPONSE_BUFFER_EMPTY: u32 = 1 << 3;
    /// Response buffer is full
    pub const RESPONSE_BUFFER_FULL: u32 = 1 << 4;
    /// Dispatcher is stopped
    pub const STOP_STATE: u32 = 1 << 5;
    /// Dispatcher is in reset
    pub const RESET_STATE: u32 = 1 << 6;
    /// Stopped because a master reported an error
    pub const STOPPED_ON_ERROR: u32 = 1 << 7;
    /// Stopped because of early termination
    pub const STOPPED_ON_EARLY_TERMINATION: u32 = 1 << 8;
    /// Interrupt pending (write 1 to clear)
    pub const IRQ: u32 = 1 << 9;

    /// Every defined status bit
    pub const ALL: u32 = 0x3FF;

    /// Conditions that end a synchronous wait without a normal completion
    pub const HALT_MASK: u32 =
        STOPPED_ON_ERROR | STOPPED_ON_EARLY_TERMINATION | STOP_STATE | RESET_STATE;
}

/// Control register bits
pub mod control {
    /// Stop the dispatcher
    pub const STOP: u32 = 1 << 0;
    /// Reset the dispatcher and both masters
    pub const RESET: u32 = 1 << 1;
    /// Stop when a master reports an error
    pub const STOP_ON_ERROR: u32 = 1 << 2;
    /// Stop on early termination
    pub const STOP_ON_EARLY_TERMINATION: u32 = 1 << 3;
    /// Global interrupt enable
    pub const GLOBAL_INTERRUPT_ENABLE: u32 = 1 << 4;
    /// Stop issuing queued descriptors to the masters
    pub const STOP_DESCRIPTORS: u32 = 1 << 5;
}

/// Descriptor fill level fields
pub mod fill_level {
    /// Read command queue fill level
    pub const READ_MASK: u32 = 0x0000_FFFF;
    /// Read fill level shift
    pub const READ_SHIFT: u32 = 0;
    /// Write command queue fill level
    pub const WRITE_MASK: u32 = 0xFFFF_0000;
    /// Write fill level shift
    pub const WRITE_SHIFT: u32 = 16;
    /// Response queue fill level
    pub const RESPONSE_MASK: u32 = 0x0000_FFFF;
}

/// Sequence number fields
pub mod sequence {
    /// Read sequence number
    pub const READ_MASK: u32 = 0x0000_FFFF;
    /// Write sequence number
    pub const WRITE_MASK: u32 = 0xFFFF_0000;
    /// Write sequence shift
    pub const WRITE_SHIFT: u32 = 16;
}

// =============================================================================
// Block View
// =============================================================================

/// Dispatcher CSR block bound to a register bus.
pub struct CsrBlock<'a, R: RegisterBus> {
    bus: &'a R,
    base: usize,
}

impl<'a, R: RegisterBus> CsrBlock<'a, R> {
    /// Bind the block at `base`
    #[inline(always)]
    pub const fn new(bus: &'a R, base: usize) -> Self {
        Self { bus, base }
    }

    reg_rw!(status, set_status, STATUS_OFFSET, "status register");
    reg_rw!(control, set_control, CONTROL_OFFSET, "control register");
    reg_ro!(descriptor_fill_level, DESCRIPTOR_FILL_LEVEL_OFFSET, "descriptor fill level register");
    reg_ro!(response_fill_level, RESPONSE_FILL_LEVEL_OFFSET, "response fill level register");
    reg_ro!(sequence_number, SEQUENCE_NUMBER_OFFSET, "sequence number register");

    /// Clear the pending interrupt flag
    #[inline(always)]
    pub fn clear_irq(&self) {
        self.set_status(status::IRQ);
    }

    /// Read `(read, write)` command queue fill levels
    #[inline]
    pub fn fill_levels(&self) -> (u16, u16) {
        let raw = self.descriptor_fill_level();
        (
            ((raw & fill_level::READ_MASK) >> fill_level::READ_SHIFT) as u16,
            ((raw & fill_level::WRITE_MASK) >> fill_level::WRITE_SHIFT) as u16,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockRegisters;

    #[test]
    fn halt_mask_excludes_busy_and_irq() {
        assert_eq!(status::HALT_MASK & status::BUSY, 0);
        assert_eq!(status::HALT_MASK & status::IRQ, 0);
    }

    #[test]
    fn fill_levels_split_read_and_write() {
        let regs = MockRegisters::new();
        regs.set(0x1000 + DESCRIPTOR_FILL_LEVEL_OFFSET, (3 << 16) | 7);
        let csr = CsrBlock::new(&regs, 0x1000);
        assert_eq!(csr.fill_levels(), (7, 3));
    }
}
