//! Dispatcher status snapshots.
//!
//! [`DispatcherStatus`] is parsed from the CSR status register and is what
//! completion callbacks and [`Error::Halted`](crate::Error::Halted) carry.

use crate::internal::register::csr::status;
use crate::internal::register::response;

// =============================================================================
// Dispatcher Status
// =============================================================================

/// Status flags parsed from the dispatcher status register.
///
/// # Example
///
/// ```ignore
/// let status = dma.status();
/// if status.is_halted() {
///     // stopped on error, early termination, stop or reset
/// }
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatcherStatus {
    /// Dispatcher is processing a descriptor
    pub busy: bool,
    /// Descriptor buffer is empty
    pub descriptor_buffer_empty: bool,
    /// Descriptor buffer is full
    pub descriptor_buffer_full: bool,
    /// Response buffer is empty
    pub response_buffer_empty: bool,
    /// Response buffer is full
    pub response_buffer_full: bool,
    /// Dispatcher is stopped
    pub stop_state: bool,
    /// Dispatcher is in reset
    pub reset_state: bool,
    /// Stopped because a master reported an error
    pub stopped_on_error: bool,
    /// Stopped on early termination
    pub stopped_on_early_termination: bool,
    /// Interrupt pending
    pub irq: bool,
}

impl DispatcherStatus {
    /// Create from a raw status register value
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self {
            busy: raw & status::BUSY != 0,
            descriptor_buffer_empty: raw & status::DESCRIPTOR_BUFFER_EMPTY != 0,
            descriptor_buffer_full: raw & status::DESCRIPTOR_BUFFER_FULL != 0,
            response_buffer_empty: raw & status::RESPONSE_BUFFER_EMPTY != 0,
            response_buffer_full: raw & status::RESPONSE_BUFFER_FULL != 0,
            stop_state: raw & status::STOP_STATE != 0,
            reset_state: raw & status::RESET_STATE != 0,
            stopped_on_error: raw & status::STOPPED_ON_ERROR != 0,
            stopped_on_early_termination: raw & status::STOPPED_ON_EARLY_TERMINATION != 0,
            irq: raw & status::IRQ != 0,
        }
    }

    /// Convert back to the raw register layout
    #[inline]
    pub const fn to_raw(&self) -> u32 {
        let mut raw = 0;
        if self.busy {
            raw |= status::BUSY;
        }
        if self.descriptor_buffer_empty {
            raw |= status::DESCRIPTOR_BUFFER_EMPTY;
        }
        if self.descriptor_buffer_full {
            raw |= status::DESCRIPTOR_BUFFER_FULL;
        }
        if self.response_buffer_empty {
            raw |= status::RESPONSE_BUFFER_EMPTY;
        }
        if self.response_buffer_full {
            raw |= status::RESPONSE_BUFFER_FULL;
        }
        if self.stop_state {
            raw |= status::STOP_STATE;
        }
        if self.reset_state {
            raw |= status::RESET_STATE;
        }
        if self.stopped_on_error {
            raw |= status::STOPPED_ON_ERROR;
        }
        if self.stopped_on_early_termination {
            raw |= status::STOPPED_ON_EARLY_TERMINATION;
        }
        if self.irq {
            raw |= status::IRQ;
        }
        raw
    }

    /// Check for any condition that stops descriptor processing
    #[inline]
    pub const fn is_halted(&self) -> bool {
        self.stopped_on_error || self.stopped_on_early_termination || self.stop_state || self.reset_state
    }
}

// =============================================================================
// Queue Levels
// =============================================================================

/// Command queue occupancy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FillLevels {
    /// Read command queue entries
    pub read: u16,
    /// Write command queue entries
    pub write: u16,
}

impl FillLevels {
    /// Check whether either queue has reached `depth`
    #[inline]
    pub const fn is_full(&self, depth: u32) -> bool {
        self.read as u32 >= depth || self.write as u32 >= depth
    }
}

/// Sequence numbers of the descriptors last processed by each master.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequenceNumbers {
    /// Read master
    pub read: u16,
    /// Write master
    pub write: u16,
}

// =============================================================================
// Response
// =============================================================================

/// One entry popped from a memory-mapped response port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Response {
    /// Bytes actually transferred
    pub actual_bytes: u32,
    /// Error bits reported by the write master
    pub error: u8,
    /// Transfer ended on early termination
    pub early_termination: bool,
}

impl Response {
    /// Build from the two response port words
    #[inline]
    pub const fn from_raw(actual_bytes: u32, error_status: u32) -> Self {
        Self {
            actual_bytes,
            error: (error_status & response::ERROR_MASK) as u8,
            early_termination: error_status & response::EARLY_TERMINATION != 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_round_trip_preserves_status_bits() {
        let raw = status::BUSY | status::STOPPED_ON_ERROR | status::IRQ;
        let parsed = DispatcherStatus::from_raw(raw);
        assert!(parsed.busy);
        assert!(parsed.stopped_on_error);
        assert!(parsed.irq);
        assert!(!parsed.reset_state);
        assert_eq!(parsed.to_raw(), raw);
    }

    #[test]
    fn halted_conditions() {
        assert!(!DispatcherStatus::from_raw(status::BUSY).is_halted());
        assert!(DispatcherStatus::from_raw(status::STOP_STATE).is_halted());
        assert!(DispatcherStatus::from_raw(status::RESET_STATE).is_halted());
        assert!(DispatcherStatus::from_raw(status::STOPPED_ON_EARLY_TERMINATION).is_halted());
    }

    #[test]
    fn fill_levels_full_on_either_side() {
        assert!(!FillLevels { read: 3, write: 3 }.is_full(4));
        assert!(FillLevels { read: 4, write: 0 }.is_full(4));
        assert!(FillLevels { read: 0, write: 4 }.is_full(4));
    }

    #[test]
    fn response_decodes_error_and_early_termination() {
        let r = Response::from_raw(128, 0x1_05);
        assert_eq!(r.actual_bytes, 128);
        assert_eq!(r.error, 0x05);
        assert!(r.early_termination);
    }
}
