//! Configuration types for the msgdma driver.
//!
//! A [`MsgDmaConfig`] describes one engine instance as generated for the
//! hardware design: where its register blocks live and which options the
//! core was built with. Construct it with [`MsgDmaConfig::new`] and the
//! `with_*` builder methods; [`MsgDma::init`](crate::MsgDma::init) validates
//! it before touching hardware.

use crate::error::{ConfigError, ConfigResult};
use crate::hal::interrupt::IrqLine;

// =============================================================================
// Device State
// =============================================================================

/// Device lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Created, registers not yet normalized
    #[default]
    Uninitialized,
    /// Reset and registered, ready for transfers
    Ready,
}

// =============================================================================
// Response Port
// =============================================================================

/// How the core reports per-descriptor responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResponsePort {
    /// Responses are read from a memory-mapped port
    MemoryMapped,
    /// Responses leave the core on a streaming interface
    Streaming,
    /// No response port
    #[default]
    Disabled,
}

// =============================================================================
// Register Map
// =============================================================================

/// Base addresses of the engine's register blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMap {
    /// Dispatcher control/status block
    pub csr: usize,
    /// Descriptor-queue port
    pub descriptor: usize,
    /// Memory-mapped response port
    pub response: Option<usize>,
    /// Descriptor prefetcher block
    pub prefetcher: Option<usize>,
}

impl RegisterMap {
    /// Map with the two mandatory blocks
    pub const fn new(csr: usize, descriptor: usize) -> Self {
        Self {
            csr,
            descriptor,
            response: None,
            prefetcher: None,
        }
    }

    /// Set the response port base
    pub const fn with_response(mut self, base: usize) -> Self {
        self.response = Some(base);
        self
    }

    /// Set the prefetcher block base
    pub const fn with_prefetcher(mut self, base: usize) -> Self {
        self.prefetcher = Some(base);
        self
    }
}

// =============================================================================
// Capabilities
// =============================================================================

/// Options the engine was built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capabilities {
    /// Descriptor FIFO depth per command queue
    pub descriptor_fifo_depth: u32,
    /// Response FIFO depth
    pub response_fifo_depth: u32,
    /// Largest transfer length in bytes
    pub max_transfer_length: u32,
    /// Largest burst count
    pub max_burst_count: u32,
    /// Largest stride
    pub max_stride: u32,
    /// Extended descriptor format
    pub enhanced_features: bool,
    /// Burst count is programmable per descriptor
    pub programmable_burst: bool,
    /// Descriptor prefetcher present
    pub prefetcher: bool,
    /// Response reporting mode
    pub response_port: ResponsePort,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::new()
    }
}

impl Capabilities {
    /// Defaults of a freshly instantiated core
    pub const fn new() -> Self {
        Self {
            descriptor_fifo_depth: 128,
            response_fifo_depth: 256,
            max_transfer_length: 1024,
            max_burst_count: 2,
            max_stride: 1,
            enhanced_features: false,
            programmable_burst: false,
            prefetcher: false,
            response_port: ResponsePort::Disabled,
        }
    }
}

// =============================================================================
// Device Configuration
// =============================================================================

/// Complete description of one engine instance.
///
/// # Example
///
/// ```ignore
/// let config = MsgDmaConfig::new(
///         "/dev/msgdma_0",
///         RegisterMap::new(0x0010_0000, 0x0010_0020),
///     )
///     .with_irq(IrqLine::new(0, 2))
///     .with_max_transfer_length(4096)
///     .with_descriptor_fifo_depth(32);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MsgDmaConfig {
    /// Instance name used by the device registry
    pub name: &'static str,
    /// Register block bases
    pub regs: RegisterMap,
    /// Build options
    pub caps: Capabilities,
    /// Interrupt line
    pub irq: IrqLine,
}

impl MsgDmaConfig {
    /// Configuration with default capabilities on line 0 of controller 0
    pub const fn new(name: &'static str, regs: RegisterMap) -> Self {
        Self {
            name,
            regs,
            caps: Capabilities::new(),
            irq: IrqLine::new(0, 0),
        }
    }

    /// Set the interrupt line
    pub const fn with_irq(mut self, irq: IrqLine) -> Self {
        self.irq = irq;
        self
    }

    /// Replace all capabilities
    pub const fn with_capabilities(mut self, caps: Capabilities) -> Self {
        self.caps = caps;
        self
    }

    /// Set descriptor FIFO depth
    pub const fn with_descriptor_fifo_depth(mut self, depth: u32) -> Self {
        self.caps.descriptor_fifo_depth = depth;
        self
    }

    /// Set response FIFO depth
    pub const fn with_response_fifo_depth(mut self, depth: u32) -> Self {
        self.caps.response_fifo_depth = depth;
        self
    }

    /// Set the largest transfer length
    pub const fn with_max_transfer_length(mut self, bytes: u32) -> Self {
        self.caps.max_transfer_length = bytes;
        self
    }

    /// Set the largest burst count
    pub const fn with_max_burst_count(mut self, count: u32) -> Self {
        self.caps.max_burst_count = count;
        self
    }

    /// Set the largest stride
    pub const fn with_max_stride(mut self, stride: u32) -> Self {
        self.caps.max_stride = stride;
        self
    }

    /// Select the extended descriptor format
    pub const fn with_enhanced_features(mut self, enabled: bool) -> Self {
        self.caps.enhanced_features = enabled;
        self
    }

    /// Enable per-descriptor burst counts
    pub const fn with_programmable_burst(mut self, enabled: bool) -> Self {
        self.caps.programmable_burst = enabled;
        self
    }

    /// Enable the descriptor prefetcher at `base`
    pub const fn with_prefetcher(mut self, base: usize) -> Self {
        self.caps.prefetcher = true;
        self.regs.prefetcher = Some(base);
        self
    }

    /// Set the response port mode
    pub const fn with_response_port(mut self, mode: ResponsePort) -> Self {
        self.caps.response_port = mode;
        self
    }

    /// Check the configuration is consistent
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.caps.descriptor_fifo_depth == 0 || self.caps.max_transfer_length == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        if self.caps.prefetcher && self.regs.prefetcher.is_none() {
            return Err(ConfigError::MissingRegion);
        }
        if matches!(self.caps.response_port, ResponsePort::MemoryMapped) {
            if self.regs.response.is_none() {
                return Err(ConfigError::MissingRegion);
            }
            if self.caps.response_fifo_depth == 0 {
                return Err(ConfigError::InvalidConfig);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGS: RegisterMap = RegisterMap::new(0x1000, 0x1020);

    #[test]
    fn default_config_is_valid() {
        let config = MsgDmaConfig::new("dma", REGS);
        assert_eq!(config.validate(), Ok(()));
        assert!(!config.caps.prefetcher);
        assert_eq!(config.caps.response_port, ResponsePort::Disabled);
    }

    #[test]
    fn builder_sets_fields() {
        let config = MsgDmaConfig::new("dma", REGS)
            .with_irq(IrqLine::new(1, 5))
            .with_max_transfer_length(256)
            .with_max_stride(8)
            .with_enhanced_features(true)
            .with_prefetcher(0x1040);

        assert_eq!(config.irq, IrqLine::new(1, 5));
        assert_eq!(config.caps.max_transfer_length, 256);
        assert_eq!(config.caps.max_stride, 8);
        assert!(config.caps.enhanced_features);
        assert_eq!(config.regs.prefetcher, Some(0x1040));
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn zero_depth_rejected() {
        let config = MsgDmaConfig::new("dma", REGS).with_descriptor_fifo_depth(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidConfig));
    }

    #[test]
    fn prefetcher_flag_without_base_rejected() {
        let caps = Capabilities {
            prefetcher: true,
            ..Capabilities::new()
        };
        let config = MsgDmaConfig::new("dma", REGS).with_capabilities(caps);
        assert_eq!(config.validate(), Err(ConfigError::MissingRegion));
    }

    #[test]
    fn memory_mapped_response_needs_base() {
        let config =
            MsgDmaConfig::new("dma", REGS).with_response_port(ResponsePort::MemoryMapped);
        assert_eq!(config.validate(), Err(ConfigError::MissingRegion));

        let config = MsgDmaConfig::new("dma", REGS.with_response(0x1030))
            .with_response_port(ResponsePort::MemoryMapped);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn memory_mapped_response_needs_fifo_depth() {
        let config = MsgDmaConfig::new("dma", REGS.with_response(0x1030))
            .with_response_port(ResponsePort::MemoryMapped)
            .with_response_fifo_depth(0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidConfig));

        // Depth only matters when the response port is readable
        let config = MsgDmaConfig::new("dma", REGS).with_response_fifo_depth(0);
        assert_eq!(config.validate(), Ok(()));
    }
}
