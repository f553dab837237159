//! Descriptor prefetcher CSR block

use super::{RegisterBus, reg_bit_ops, reg_rw, reg_wo};

// =============================================================================
// Register Offsets
// =============================================================================

/// Control register
pub const CONTROL_OFFSET: usize = 0x00;
/// Next descriptor pointer, low word
pub const NEXT_DESCRIPTOR_LOW_OFFSET: usize = 0x04;
/// Next descriptor pointer, high word
pub const NEXT_DESCRIPTOR_HIGH_OFFSET: usize = 0x08;
/// Descriptor polling frequency (clock cycles)
pub const POLL_FREQUENCY_OFFSET: usize = 0x0C;
/// Status register
pub const STATUS_OFFSET: usize = 0x10;

// =============================================================================
// Bit Definitions
// =============================================================================

/// Control register bits
pub mod control {
    /// Walk the descriptor list
    pub const RUN: u32 = 1 << 0;
    /// Poll a hardware-released descriptor until software hands it back
    pub const DESC_POLL_EN: u32 = 1 << 1;
    /// Global interrupt enable
    pub const GLOBAL_INTR_EN: u32 = 1 << 2;
    /// Loop on the list instead of halting at the last descriptor
    pub const PARK_MODE: u32 = 1 << 3;
    /// Reset the prefetcher (self-clearing)
    pub const RESET: u32 = 1 << 4;
}

/// Status register bits
pub mod status {
    /// Interrupt pending (write 1 to clear)
    pub const IRQ: u32 = 1 << 0;
}

// =============================================================================
// Block View
// =============================================================================

/// Prefetcher CSR block bound to a register bus.
pub struct PrefetcherBlock<'a, R: RegisterBus> {
    bus: &'a R,
    base: usize,
}

impl<'a, R: RegisterBus> PrefetcherBlock<'a, R> {
    /// Bind the block at `base`
    #[inline(always)]
    pub const fn new(bus: &'a R, base: usize) -> Self {
        Self { bus, base }
    }

    reg_rw!(control, set_control, CONTROL_OFFSET, "prefetcher control register");
    reg_rw!(poll_frequency, set_poll_frequency, POLL_FREQUENCY_OFFSET, "descriptor poll frequency");
    reg_wo!(set_status, STATUS_OFFSET, "prefetcher status register");
    reg_wo!(set_next_low, NEXT_DESCRIPTOR_LOW_OFFSET, "next descriptor pointer low word");
    reg_wo!(set_next_high, NEXT_DESCRIPTOR_HIGH_OFFSET, "next descriptor pointer high word");
    reg_bit_ops!(
        enable_interrupts,
        disable_interrupts,
        CONTROL_OFFSET,
        control::GLOBAL_INTR_EN,
        "prefetcher global interrupt",
        "Enable",
        "Disable"
    );

    /// Check whether the run bit is set
    #[inline(always)]
    pub fn is_running(&self) -> bool {
        self.control() & control::RUN != 0
    }

    /// Clear the pending interrupt flag
    #[inline(always)]
    pub fn clear_irq(&self) {
        self.set_status(status::IRQ);
    }

    /// Write the 64-bit list address into the next descriptor pointer pair
    #[inline]
    pub fn set_next_descriptor(&self, addr: u64) {
        self.set_next_low(addr as u32);
        self.set_next_high((addr >> 32) as u32);
    }
}
