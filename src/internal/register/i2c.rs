//! Avalon I2C master register block

use super::{RegisterBus, reg_bit_ops, reg_ro, reg_rw, reg_wo};

// =============================================================================
// Register Offsets
// =============================================================================

/// Transfer command FIFO
pub const TFR_CMD_OFFSET: usize = 0x00;
/// Receive data FIFO
pub const RX_DATA_OFFSET: usize = 0x04;
/// Control register
pub const CTRL_OFFSET: usize = 0x08;
/// Interrupt status enable register
pub const ISER_OFFSET: usize = 0x0C;
/// Interrupt status register
pub const ISR_OFFSET: usize = 0x10;
/// Status register
pub const STATUS_OFFSET: usize = 0x14;
/// Transfer command FIFO level
pub const TFR_CMD_FIFO_LVL_OFFSET: usize = 0x18;
/// Receive data FIFO level
pub const RX_DATA_FIFO_LVL_OFFSET: usize = 0x1C;
/// SCL low count
pub const SCL_LOW_OFFSET: usize = 0x20;
/// SCL high count
pub const SCL_HIGH_OFFSET: usize = 0x24;
/// SDA hold count
pub const SDA_HOLD_OFFSET: usize = 0x28;

// =============================================================================
// Bit Definitions
// =============================================================================

/// Transfer command bits
pub mod tfr_cmd {
    /// Issue a (repeated) start before this byte
    pub const STA: u32 = 1 << 9;
    /// Issue a stop after this byte
    pub const STO: u32 = 1 << 8;
    /// Data / address byte
    pub const DATA_MASK: u32 = 0xFF;
}

/// Control register bits
pub mod ctrl {
    /// Core enable
    pub const EN: u32 = 1 << 0;
    /// Bus speed (1 = fast)
    pub const BUS_SPEED: u32 = 1 << 1;
    /// Bus speed shift
    pub const BUS_SPEED_SHIFT: u32 = 1;
    /// Transfer command FIFO threshold field
    pub const TCT_MASK: u32 = 0b11 << 2;
    /// Transfer command FIFO threshold shift
    pub const TCT_SHIFT: u32 = 2;
    /// RX FIFO threshold field
    pub const RCT_MASK: u32 = 0b11 << 4;
    /// RX FIFO threshold shift
    pub const RCT_SHIFT: u32 = 4;
}

/// Interrupt status bits (ISR and ISER share the layout)
pub mod isr {
    /// Command FIFO below threshold
    pub const TX_READY: u32 = 1 << 0;
    /// RX FIFO above threshold
    pub const RX_READY: u32 = 1 << 1;
    /// NACK detected (write 1 to clear)
    pub const NACK_DET: u32 = 1 << 2;
    /// Arbitration lost (write 1 to clear)
    pub const ARBLOST_DET: u32 = 1 << 3;
    /// RX FIFO overflow (write 1 to clear)
    pub const RX_OVER: u32 = 1 << 4;

    /// Every interrupt source
    pub const ALL: u32 = TX_READY | RX_READY | NACK_DET | ARBLOST_DET | RX_OVER;
    /// Sources that latch and need clearing
    pub const ALL_CLEARABLE: u32 = NACK_DET | ARBLOST_DET | RX_OVER;
}

/// Status register bits
pub mod status {
    /// Core is driving a transaction
    pub const CORE_STATUS: u32 = 1 << 0;
}

// =============================================================================
// Block View
// =============================================================================

/// Avalon I2C register block bound to a register bus.
pub struct I2cBlock<'a, R: RegisterBus> {
    bus: &'a R,
    base: usize,
}

impl<'a, R: RegisterBus> I2cBlock<'a, R> {
    /// Bind the block at `base`
    #[inline(always)]
    pub const fn new(bus: &'a R, base: usize) -> Self {
        Self { bus, base }
    }

    reg_wo!(push_command, TFR_CMD_OFFSET, "transfer command FIFO");
    reg_ro!(pop_rx_data, RX_DATA_OFFSET, "receive data FIFO");
    reg_ro!(ctrl, CTRL_OFFSET, "control register");
    reg_rw!(iser, set_iser, ISER_OFFSET, "interrupt status enable register");
    reg_rw!(isr, set_isr, ISR_OFFSET, "interrupt status register");
    reg_ro!(status, STATUS_OFFSET, "status register");
    reg_ro!(tfr_cmd_fifo_level, TFR_CMD_FIFO_LVL_OFFSET, "transfer command FIFO level");
    reg_ro!(rx_fifo_level, RX_DATA_FIFO_LVL_OFFSET, "receive FIFO level");
    reg_rw!(scl_low, set_scl_low, SCL_LOW_OFFSET, "SCL low count");
    reg_rw!(scl_high, set_scl_high, SCL_HIGH_OFFSET, "SCL high count");
    reg_rw!(sda_hold, set_sda_hold, SDA_HOLD_OFFSET, "SDA hold count");
    reg_bit_ops!(enable_core, disable_core, CTRL_OFFSET, ctrl::EN, "the I2C core", "Enable", "Disable");

    /// Update a control register field
    #[inline]
    pub fn modify_ctrl(&self, data: u32, mask: u32) {
        self.bus.modify32(self.base + CTRL_OFFSET, data, mask);
    }
}
