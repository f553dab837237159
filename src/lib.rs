//! Altera msgdma Driver
//!
//! A `no_std`, `no_alloc` driver for the Altera/Intel modular scatter-gather
//! DMA (msgdma) engine, with an Avalon I2C master driver built on the same
//! foundations.
//!
//! # Architecture
//!
//! 1. **Drivers** ([`driver`]): [`MsgDma`] submits validated descriptors to
//!    the dispatcher or arms the prefetcher with a linked descriptor pool;
//!    [`AvalonI2c`] runs polled master transfers.
//! 2. **HAL Layer** ([`hal`]): interrupt controller seam, bounded polling,
//!    name-keyed device registry.
//! 3. **Sync** ([`sync`]): the register lock and ISR-shared cells.
//!
//! Register access goes through the [`RegisterBus`] trait. [`Mmio`] is the
//! volatile implementation for real hardware.
//!
//! # Features
//!
//! - `defmt`: defmt formatting for public types and driver log output
//!
//! # Example
//!
//! ```ignore
//! use altera_msgdma::{Descriptor, DescriptorControl, MsgDma, MsgDmaConfig, Mmio, RegisterMap};
//! use altera_msgdma::hal::DeviceRegistry;
//!
//! static DMA: StaticCell<MsgDma<Mmio, Delay>> = StaticCell::new();
//!
//! let config = MsgDmaConfig::new("/dev/msgdma_0", RegisterMap::new(0x4000_0000, 0x4000_0020))
//!     .with_descriptor_fifo_depth(8)
//!     .with_max_transfer_length(0x10_0000);
//! let dma = DMA.init(MsgDma::new(unsafe { Mmio::new() }, delay, config));
//!
//! let mut registry: DeviceRegistry<'_, _, 4> = DeviceRegistry::new();
//! dma.init(&mut registry, &mut intc)?;
//!
//! let desc = StandardDescriptor::mm_to_mm(dma.capabilities(), src, dst, 4096, DescriptorControl::new())?;
//! dma.submit_sync(&desc)?;
//! ```
//!
//! # Concurrency
//!
//! Each device serializes task-level register sequences with a spin lock and
//! masks interrupts around the short sequences its interrupt handler also
//! touches. Interrupt handlers never take the lock. See [`driver::msgdma`].

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod error;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::callback::Callback;
pub use driver::config::{Capabilities, MsgDmaConfig, RegisterMap, ResponsePort, State};
pub use driver::descriptor::{
    Descriptor, DescriptorControl, ExtendedDescriptor, ExtendedParams, StandardDescriptor,
};
pub use driver::i2c::{AddressMode, AvalonI2c, I2cConfig, MasterConfig, SpeedMode};
pub use driver::msgdma::MsgDma;
pub use driver::prefetcher::{
    DescriptorList, DescriptorPool, PrefetcherExtendedDescriptor, PrefetcherStandardDescriptor,
    SlotId,
};
pub use driver::status::{DispatcherStatus, FillLevels, Response, SequenceNumbers};
pub use error::{ConfigError, ConfigResult, Error, Result};
pub use internal::register::{Mmio, RegisterBus};

/// Register bit definitions for callers composing control templates and
/// interrupt masks.
///
/// Control bits the driver manages itself (stop, global interrupt enable,
/// stop on error) are overridden when a transfer is armed.
pub mod bits {
    /// Dispatcher control register bits
    pub use crate::internal::register::csr::control as csr_control;
    /// Dispatcher status register bits
    pub use crate::internal::register::csr::status as csr_status;
    /// Descriptor control word bits
    pub use crate::internal::register::descriptor::control as descriptor_control;
    /// I2C interrupt status bits
    pub use crate::internal::register::i2c::isr as i2c_isr;
}
