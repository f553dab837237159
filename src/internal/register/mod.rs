//! Memory-mapped register access for the msgdma and Avalon I2C cores
//!
//! All hardware access goes through the [`RegisterBus`] trait so the drivers
//! can run against [`Mmio`] on the target and against a recording mock on
//! the host. Each register block gets a small view type (`CsrBlock`,
//! `PrefetcherBlock`, ...) binding a bus to a base address.

pub mod csr;
pub mod descriptor;
pub mod i2c;
pub mod prefetcher;
pub mod response;

// =============================================================================
// Register Bus
// =============================================================================

/// Ordered, uncached 32-bit register access.
///
/// Addresses are absolute (base + offset). Accesses never fail.
pub trait RegisterBus {
    /// Read a 32-bit register
    fn read32(&self, addr: usize) -> u32;

    /// Write a 32-bit register
    fn write32(&self, addr: usize, value: u32);

    /// Read-modify-write: replace the bits selected by `mask` with `data`
    #[inline]
    fn modify32(&self, addr: usize, data: u32, mask: u32) {
        let value = self.read32(addr);
        self.write32(addr, (value & !mask) | (data & mask));
    }

    /// Set bits in a register (read-modify-write)
    #[inline]
    fn set_bits(&self, addr: usize, bits: u32) {
        self.modify32(addr, bits, bits);
    }

    /// Clear bits in a register (read-modify-write)
    #[inline]
    fn clear_bits(&self, addr: usize, bits: u32) {
        self.modify32(addr, 0, bits);
    }
}

impl<T: RegisterBus + ?Sized> RegisterBus for &T {
    #[inline]
    fn read32(&self, addr: usize) -> u32 {
        (**self).read32(addr)
    }

    #[inline]
    fn write32(&self, addr: usize, value: u32) {
        (**self).write32(addr, value);
    }
}

/// Volatile memory-mapped register bus.
#[derive(Debug, Clone, Copy)]
pub struct Mmio {
    _private: (),
}

impl Mmio {
    /// Create a volatile register bus.
    ///
    /// # Safety
    /// Every base address later handed to a driver using this bus must point
    /// at the corresponding, properly aligned hardware register block.
    pub const unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl RegisterBus for Mmio {
    #[inline(always)]
    fn read32(&self, addr: usize) -> u32 {
        // SAFETY: Mmio::new requires callers to supply valid register addresses
        unsafe { core::ptr::read_volatile(addr as *const u32) }
    }

    #[inline(always)]
    fn write32(&self, addr: usize, value: u32) {
        // SAFETY: Mmio::new requires callers to supply valid register addresses
        unsafe { core::ptr::write_volatile(addr as *mut u32, value) }
    }
}

// =============================================================================
// Register Access Macros
// =============================================================================

/// Generate read/write accessor methods on a register block view.
///
/// The view must have `bus: &R` and `base: usize` fields.
///
/// # Example
/// ```ignore
/// impl<R: RegisterBus> CsrBlock<'_, R> {
///     reg_rw!(control, set_control, CONTROL_OFFSET, "control register");
/// }
/// ```
macro_rules! reg_rw {
    ($read_fn:ident, $write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.bus.read32(self.base + $offset)
        }

        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            self.bus.write32(self.base + $offset, value);
        }
    };
}

/// Generate a read-only accessor method on a register block view.
macro_rules! reg_ro {
    ($read_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn(&self) -> u32 {
            self.bus.read32(self.base + $offset)
        }
    };
}

/// Generate a write-only accessor method on a register block view.
macro_rules! reg_wo {
    ($write_fn:ident, $offset:expr, $doc:expr) => {
        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(&self, value: u32) {
            self.bus.write32(self.base + $offset, value);
        }
    };
}

/// Generate set/clear bit operation methods on a register block view.
macro_rules! reg_bit_ops {
    ($set_fn:ident, $clear_fn:ident, $offset:expr, $bit:expr, $what:expr, $set_verb:expr, $clear_verb:expr) => {
        #[doc = concat!($set_verb, " ", $what)]
        #[inline(always)]
        pub fn $set_fn(&self) {
            self.bus.set_bits(self.base + $offset, $bit);
        }

        #[doc = concat!($clear_verb, " ", $what)]
        #[inline(always)]
        pub fn $clear_fn(&self) {
            self.bus.clear_bits(self.base + $offset, $bit);
        }
    };
}

pub(crate) use reg_bit_ops;
pub(crate) use reg_ro;
pub(crate) use reg_rw;
pub(crate) use reg_wo;

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::MockRegisters;

    #[test]
    fn modify_replaces_only_masked_bits() {
        let regs = MockRegisters::new();
        regs.set(0x10, 0xFFFF_0000);
        regs.modify32(0x10, 0x0000_00A5, 0x0000_00FF);
        assert_eq!(regs.get(0x10), 0xFFFF_00A5);
    }

    #[test]
    fn set_and_clear_bits() {
        let regs = MockRegisters::new();
        regs.set_bits(0x4, 1 << 3);
        assert_eq!(regs.get(0x4), 1 << 3);
        regs.clear_bits(0x4, 1 << 3);
        assert_eq!(regs.get(0x4), 0);
    }

    #[test]
    fn reference_forwards_to_bus() {
        let regs = MockRegisters::new();
        let by_ref = &regs;
        by_ref.write32(0x8, 7);
        assert_eq!(by_ref.read32(0x8), 7);
        assert_eq!(regs.writes(), std::vec![(0x8, 7)]);
    }
}
