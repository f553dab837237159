//! Transfer descriptors and their builders.
//!
//! Descriptors are plain values: the constructors validate a transfer
//! request against the engine's [`Capabilities`] and return a descriptor
//! with the go bit set, and submission copies the fields into the hardware
//! queue. Nothing here touches registers until a descriptor is written to a
//! [`DescriptorPort`].
//!
//! | Shape | Standard | Extended |
//! |-------|----------|----------|
//! | memory → memory | [`StandardDescriptor::mm_to_mm`] | [`ExtendedDescriptor::mm_to_mm`] |
//! | memory → stream | [`StandardDescriptor::mm_to_st`] | [`ExtendedDescriptor::mm_to_st`] |
//! | stream → memory | [`StandardDescriptor::st_to_mm`] | [`ExtendedDescriptor::st_to_mm`] |

use crate::driver::config::Capabilities;
use crate::error::{Error, Result};
use crate::internal::register::RegisterBus;
use crate::internal::register::descriptor::{DescriptorPort, control, extended, standard};

// =============================================================================
// Control Word
// =============================================================================

/// Descriptor control flags.
///
/// The go bit is managed by the constructors; the ownership bit is managed
/// by the prefetcher pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DescriptorControl(u32);

impl DescriptorControl {
    /// No flags set
    pub const fn new() -> Self {
        Self(0)
    }

    /// Wrap a raw control word
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw control word
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Streaming channel number
    pub const fn with_channel(self, channel: u8) -> Self {
        Self((self.0 & !control::TRANSMIT_CHANNEL_MASK) | channel as u32)
    }

    /// Generate start-of-packet
    pub const fn with_sop(self) -> Self {
        Self(self.0 | control::GENERATE_SOP)
    }

    /// Generate end-of-packet
    pub const fn with_eop(self) -> Self {
        Self(self.0 | control::GENERATE_EOP)
    }

    /// Park the read master
    pub const fn with_park_reads(self) -> Self {
        Self(self.0 | control::PARK_READS)
    }

    /// Park the write master
    pub const fn with_park_writes(self) -> Self {
        Self(self.0 | control::PARK_WRITES)
    }

    /// End on end-of-packet from the sink
    pub const fn with_end_on_eop(self) -> Self {
        Self(self.0 | control::END_ON_EOP)
    }

    /// Interrupt when the transfer completes
    pub const fn with_transfer_complete_irq(self) -> Self {
        Self(self.0 | control::TRANSFER_COMPLETE_IRQ)
    }

    /// Interrupt on early termination
    pub const fn with_early_termination_irq(self) -> Self {
        Self(self.0 | control::EARLY_TERMINATION_IRQ)
    }

    /// Interrupt on the selected master error bits
    pub const fn with_error_irq_mask(self, mask: u8) -> Self {
        Self((self.0 & !control::ERROR_IRQ_MASK) | ((mask as u32) << control::ERROR_IRQ_SHIFT))
    }

    /// Report completion early
    pub const fn with_early_done(self) -> Self {
        Self(self.0 | control::EARLY_DONE_ENABLE)
    }

    /// Check whether the go bit is set
    pub const fn is_committed(self) -> bool {
        self.0 & control::GO != 0
    }

    /// Check whether the hardware-ownership bit is set
    pub const fn is_hardware_owned(self) -> bool {
        self.0 & control::OWNED_BY_HW != 0
    }

    /// Go bit set, ownership left to the prefetcher pool
    pub(crate) const fn committed(self) -> Self {
        Self(self.0 | control::GO)
    }
}

// =============================================================================
// Validation
// =============================================================================

fn check_length(caps: &Capabilities, length: u32) -> Result<()> {
    if length > caps.max_transfer_length {
        #[cfg(feature = "defmt")]
        defmt::debug!("length {} exceeds max {}", length, caps.max_transfer_length);
        return Err(Error::BadArgument);
    }
    Ok(())
}

fn check_kind(caps: &Capabilities, extended: bool) -> Result<()> {
    if caps.enhanced_features != extended {
        return Err(Error::BadArgument);
    }
    Ok(())
}

// =============================================================================
// Standard Descriptor
// =============================================================================

/// Standard format descriptor (32-bit addresses).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StandardDescriptor {
    read_address: u32,
    write_address: u32,
    length: u32,
    control: DescriptorControl,
}

impl StandardDescriptor {
    fn build(
        caps: &Capabilities,
        read_address: u32,
        write_address: u32,
        length: u32,
        control: DescriptorControl,
    ) -> Result<Self> {
        check_length(caps, length)?;
        check_kind(caps, false)?;
        Ok(Self {
            read_address,
            write_address,
            length,
            control: control.committed(),
        })
    }

    /// Memory to memory transfer
    pub fn mm_to_mm(
        caps: &Capabilities,
        read_address: u32,
        write_address: u32,
        length: u32,
        control: DescriptorControl,
    ) -> Result<Self> {
        Self::build(caps, read_address, write_address, length, control)
    }

    /// Memory to stream transfer
    pub fn mm_to_st(
        caps: &Capabilities,
        read_address: u32,
        length: u32,
        control: DescriptorControl,
    ) -> Result<Self> {
        Self::build(caps, read_address, 0, length, control)
    }

    /// Stream to memory transfer
    pub fn st_to_mm(
        caps: &Capabilities,
        write_address: u32,
        length: u32,
        control: DescriptorControl,
    ) -> Result<Self> {
        Self::build(caps, 0, write_address, length, control)
    }

    /// Source address
    pub const fn read_address(&self) -> u32 {
        self.read_address
    }

    /// Destination address
    pub const fn write_address(&self) -> u32 {
        self.write_address
    }

    /// Length in bytes
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Control word
    pub const fn control(&self) -> DescriptorControl {
        self.control
    }

    /// Copy the fields into the queue port, control word last
    pub(crate) fn write_to<R: RegisterBus>(&self, port: &DescriptorPort<'_, R>) {
        port.write(standard::READ_ADDRESS_OFFSET, self.read_address);
        port.write(standard::WRITE_ADDRESS_OFFSET, self.write_address);
        port.write(standard::LENGTH_OFFSET, self.length);
        port.write(standard::CONTROL_OFFSET, self.control.bits());
    }
}

// =============================================================================
// Extended Descriptor
// =============================================================================

/// Sequence, burst and stride settings of an extended descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtendedParams {
    /// Sequence number reported back by the dispatcher
    pub sequence_number: u16,
    /// Read master burst count (0 selects the core default)
    pub read_burst: u8,
    /// Write master burst count (0 selects the core default)
    pub write_burst: u8,
    /// Read address stride
    pub read_stride: u16,
    /// Write address stride
    pub write_stride: u16,
}

impl ExtendedParams {
    /// Zero sequence, default bursts, unit strides
    pub const fn new() -> Self {
        Self {
            sequence_number: 0,
            read_burst: 0,
            write_burst: 0,
            read_stride: 1,
            write_stride: 1,
        }
    }

    /// Set the sequence number
    pub const fn with_sequence_number(mut self, sequence: u16) -> Self {
        self.sequence_number = sequence;
        self
    }

    /// Set both burst counts
    pub const fn with_bursts(mut self, read: u8, write: u8) -> Self {
        self.read_burst = read;
        self.write_burst = write;
        self
    }

    /// Set both strides
    pub const fn with_strides(mut self, read: u16, write: u16) -> Self {
        self.read_stride = read;
        self.write_stride = write;
        self
    }
}

impl Default for ExtendedParams {
    fn default() -> Self {
        Self::new()
    }
}

/// Extended format descriptor (64-bit addresses, sequence, burst, stride).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ExtendedDescriptor {
    read_address: u64,
    write_address: u64,
    length: u32,
    params: ExtendedParams,
    control: DescriptorControl,
}

impl ExtendedDescriptor {
    fn build(
        caps: &Capabilities,
        read_address: u64,
        write_address: u64,
        length: u32,
        control: DescriptorControl,
        params: ExtendedParams,
    ) -> Result<Self> {
        check_length(caps, length)?;
        if u32::from(params.read_stride) > caps.max_stride
            || u32::from(params.write_stride) > caps.max_stride
        {
            return Err(Error::BadArgument);
        }
        let params = if caps.programmable_burst {
            if u32::from(params.read_burst) > caps.max_burst_count
                || u32::from(params.write_burst) > caps.max_burst_count
            {
                return Err(Error::BadArgument);
            }
            params
        } else {
            // Fixed-burst cores use their built-in burst count
            params.with_bursts(0, 0)
        };
        check_kind(caps, true)?;
        Ok(Self {
            read_address,
            write_address,
            length,
            params,
            control: control.committed(),
        })
    }

    /// Memory to memory transfer
    pub fn mm_to_mm(
        caps: &Capabilities,
        read_address: u64,
        write_address: u64,
        length: u32,
        control: DescriptorControl,
        params: ExtendedParams,
    ) -> Result<Self> {
        Self::build(caps, read_address, write_address, length, control, params)
    }

    /// Memory to stream transfer; write-side burst and stride are zeroed
    pub fn mm_to_st(
        caps: &Capabilities,
        read_address: u64,
        length: u32,
        control: DescriptorControl,
        params: ExtendedParams,
    ) -> Result<Self> {
        let params = ExtendedParams {
            write_burst: 0,
            write_stride: 0,
            ..params
        };
        Self::build(caps, read_address, 0, length, control, params)
    }

    /// Stream to memory transfer; read-side burst and stride are zeroed
    pub fn st_to_mm(
        caps: &Capabilities,
        write_address: u64,
        length: u32,
        control: DescriptorControl,
        params: ExtendedParams,
    ) -> Result<Self> {
        let params = ExtendedParams {
            read_burst: 0,
            read_stride: 0,
            ..params
        };
        Self::build(caps, 0, write_address, length, control, params)
    }

    /// Source address
    pub const fn read_address(&self) -> u64 {
        self.read_address
    }

    /// Destination address
    pub const fn write_address(&self) -> u64 {
        self.write_address
    }

    /// Length in bytes
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Sequence, burst and stride settings
    pub const fn params(&self) -> ExtendedParams {
        self.params
    }

    /// Control word
    pub const fn control(&self) -> DescriptorControl {
        self.control
    }

    /// Packed sequence number / read burst / write burst word
    pub(crate) const fn sequence_burst_word(&self) -> u32 {
        (self.params.sequence_number as u32 & extended::SEQUENCE_MASK)
            | ((self.params.read_burst as u32) << extended::READ_BURST_SHIFT)
            | ((self.params.write_burst as u32) << extended::WRITE_BURST_SHIFT)
    }

    /// Packed read stride / write stride word
    pub(crate) const fn stride_word(&self) -> u32 {
        self.params.read_stride as u32
            | ((self.params.write_stride as u32) << extended::WRITE_STRIDE_SHIFT)
    }

    /// Copy the fields into the queue port, control word last
    pub(crate) fn write_to<R: RegisterBus>(&self, port: &DescriptorPort<'_, R>) {
        port.write(extended::READ_ADDRESS_LOW_OFFSET, self.read_address as u32);
        port.write(extended::WRITE_ADDRESS_LOW_OFFSET, self.write_address as u32);
        port.write(extended::LENGTH_OFFSET, self.length);
        port.write(extended::SEQUENCE_BURST_OFFSET, self.sequence_burst_word());
        port.write(extended::STRIDE_OFFSET, self.stride_word());
        port.write(extended::READ_ADDRESS_HIGH_OFFSET, (self.read_address >> 32) as u32);
        port.write(extended::WRITE_ADDRESS_HIGH_OFFSET, (self.write_address >> 32) as u32);
        port.write(extended::CONTROL_OFFSET, self.control.bits());
    }
}

// =============================================================================
// Submission Argument
// =============================================================================

/// A descriptor of either format, as accepted by submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descriptor<'a> {
    /// Standard format
    Standard(&'a StandardDescriptor),
    /// Extended format
    Extended(&'a ExtendedDescriptor),
}

impl<'a> From<&'a StandardDescriptor> for Descriptor<'a> {
    fn from(desc: &'a StandardDescriptor) -> Self {
        Descriptor::Standard(desc)
    }
}

impl<'a> From<&'a ExtendedDescriptor> for Descriptor<'a> {
    fn from(desc: &'a ExtendedDescriptor) -> Self {
        Descriptor::Extended(desc)
    }
}

impl<'a> Descriptor<'a> {
    /// Split into the (standard, extended) pair taken by the queue writer
    pub(crate) const fn split(self) -> (Option<&'a StandardDescriptor>, Option<&'a ExtendedDescriptor>) {
        match self {
            Descriptor::Standard(d) => (Some(d), None),
            Descriptor::Extended(d) => (None, Some(d)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
