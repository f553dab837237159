//! Device drivers for the msgdma engine and the Avalon I2C master.
//!
//! - [`config`] - Instance configuration, capabilities, lifecycle state
//! - [`descriptor`] - Validated standard and extended descriptors
//! - [`status`] - Typed views of dispatcher status and FIFO levels
//! - [`callback`] - Interrupt callbacks and the ISR-readable slot
//! - [`msgdma`] - The dispatcher driver
//! - [`prefetcher`] - Linked descriptor pools for the prefetcher
//! - [`i2c`] - The Avalon I2C master driver
//!
//! # Example
//!
//! ```ignore
//! use altera_msgdma::driver::{MsgDmaConfig, RegisterMap};
//!
//! let config = MsgDmaConfig::new("/dev/msgdma_0", RegisterMap::new(0x4000_0000, 0x4000_0020))
//!     .with_descriptor_fifo_depth(8)
//!     .with_max_transfer_length(0x10_0000);
//! ```

pub mod callback;
pub mod config;
pub mod descriptor;
pub mod i2c;
pub mod msgdma;
pub mod prefetcher;
pub mod status;

pub use callback::{Callback, CallbackSlot, Registration};
pub use config::{Capabilities, MsgDmaConfig, RegisterMap, ResponsePort, State};
pub use descriptor::{
    Descriptor, DescriptorControl, ExtendedDescriptor, ExtendedParams, StandardDescriptor,
};
pub use i2c::{
    AddressMode, AvalonI2c, I2cConfig, I2cRegistry, MasterConfig, RxFifoThreshold, SpeedMode,
    TfrCmdFifoThreshold,
};
pub use msgdma::{MsgDma, MsgDmaRegistry};
pub use prefetcher::{
    DescriptorList, DescriptorPool, PrefetcherDescriptor, PrefetcherExtendedDescriptor,
    PrefetcherStandardDescriptor, SlotId, Walk,
};
pub use status::{DispatcherStatus, FillLevels, Response, SequenceNumbers};
