//! Descriptor-queue port and descriptor control word
//!
//! Writing the control word last commits the descriptor; the dispatcher
//! latches all previously written fields when it sees the go bit.

use super::RegisterBus;

// =============================================================================
// Standard Layout
// =============================================================================

/// Standard descriptor port offsets
pub mod standard {
    /// Read (source) address
    pub const READ_ADDRESS_OFFSET: usize = 0x00;
    /// Write (destination) address
    pub const WRITE_ADDRESS_OFFSET: usize = 0x04;
    /// Transfer length in bytes
    pub const LENGTH_OFFSET: usize = 0x08;
    /// Control word (commits the descriptor)
    pub const CONTROL_OFFSET: usize = 0x0C;
}

// =============================================================================
// Extended Layout
// =============================================================================

/// Extended descriptor port offsets
pub mod extended {
    /// Read address, low word
    pub const READ_ADDRESS_LOW_OFFSET: usize = 0x00;
    /// Write address, low word
    pub const WRITE_ADDRESS_LOW_OFFSET: usize = 0x04;
    /// Transfer length in bytes
    pub const LENGTH_OFFSET: usize = 0x08;
    /// Sequence number, read burst, write burst
    pub const SEQUENCE_BURST_OFFSET: usize = 0x0C;
    /// Read stride, write stride
    pub const STRIDE_OFFSET: usize = 0x10;
    /// Read address, high word
    pub const READ_ADDRESS_HIGH_OFFSET: usize = 0x14;
    /// Write address, high word
    pub const WRITE_ADDRESS_HIGH_OFFSET: usize = 0x18;
    /// Control word (commits the descriptor)
    pub const CONTROL_OFFSET: usize = 0x1C;

    /// Sequence number field
    pub const SEQUENCE_MASK: u32 = 0x0000_FFFF;
    /// Read burst count shift
    pub const READ_BURST_SHIFT: u32 = 16;
    /// Write burst count shift
    pub const WRITE_BURST_SHIFT: u32 = 24;
    /// Write stride shift
    pub const WRITE_STRIDE_SHIFT: u32 = 16;
}

// =============================================================================
// Control Word
// =============================================================================

/// Descriptor control word bits (shared by every descriptor layout)
pub mod control {
    /// Transmit channel field
    pub const TRANSMIT_CHANNEL_MASK: u32 = 0xFF;
    /// Emit start-of-packet on the streaming source
    pub const GENERATE_SOP: u32 = 1 << 8;
    /// Emit end-of-packet on the streaming source
    pub const GENERATE_EOP: u32 = 1 << 9;
    /// Park the read master on this descriptor
    pub const PARK_READS: u32 = 1 << 10;
    /// Park the write master on this descriptor
    pub const PARK_WRITES: u32 = 1 << 11;
    /// End the transfer on end-of-packet from the streaming sink
    pub const END_ON_EOP: u32 = 1 << 12;
    /// Interrupt on transfer complete
    pub const TRANSFER_COMPLETE_IRQ: u32 = 1 << 14;
    /// Interrupt on early termination
    pub const EARLY_TERMINATION_IRQ: u32 = 1 << 15;
    /// Error interrupt mask field
    pub const ERROR_IRQ_MASK: u32 = 0xFF << 16;
    /// Error interrupt mask shift
    pub const ERROR_IRQ_SHIFT: u32 = 16;
    /// Report completion early
    pub const EARLY_DONE_ENABLE: u32 = 1 << 24;
    /// Prefetcher descriptor is owned by hardware
    pub const OWNED_BY_HW: u32 = 1 << 30;
    /// Commit the descriptor
    pub const GO: u32 = 1 << 31;
}

// =============================================================================
// Block View
// =============================================================================

/// Descriptor-queue port bound to a register bus.
pub struct DescriptorPort<'a, R: RegisterBus> {
    bus: &'a R,
    base: usize,
}

impl<'a, R: RegisterBus> DescriptorPort<'a, R> {
    /// Bind the port at `base`
    #[inline(always)]
    pub const fn new(bus: &'a R, base: usize) -> Self {
        Self { bus, base }
    }

    /// Write one field of the port
    #[inline(always)]
    pub fn write(&self, offset: usize, value: u32) {
        self.bus.write32(self.base + offset, value);
    }
}
