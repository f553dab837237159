//! Modular scatter-gather DMA engine driver.
//!
//! [`MsgDma`] owns one engine instance: its configuration, the register bus
//! it talks through, a register lock (which also guards the delay provider
//! used by bounded waits) and the ISR-readable callback slot.
//!
//! Transfers are submitted either to the dispatcher's descriptor queue
//! ([`MsgDma::submit_async`], [`MsgDma::submit_sync`]) or as a circular list
//! walked by the prefetcher ([`MsgDma::start_prefetcher`]).
//!
//! # Interrupt mode vs polling mode
//!
//! With a callback registered, async submissions arm the engine's global
//! interrupt and [`MsgDma::on_interrupt`] must be wired to the engine's
//! interrupt line. Without one, the global interrupt stays off and completion
//! is observed by polling [`MsgDma::status`]. Sync submissions always run
//! with the global interrupt off.
//!
//! # Concurrency
//!
//! Submissions from different tasks serialize on the register lock. The
//! interrupt handler never takes the lock; it masks only its own handler
//! with a critical section around the callback.

use embedded_hal::delay::DelayNs;

use crate::driver::callback::{Callback, CallbackSlot};
use crate::driver::config::{Capabilities, MsgDmaConfig, ResponsePort, State};
use crate::driver::descriptor::{Descriptor, ExtendedDescriptor, StandardDescriptor};
use crate::driver::prefetcher::{DescriptorList, DescriptorPool, PrefetcherDescriptor};
use crate::driver::status::{DispatcherStatus, FillLevels, Response, SequenceNumbers};
use crate::error::{ConfigError, Error, Result};
use crate::hal::interrupt::{InterruptController, connect_line};
use crate::hal::poll::{PollBudget, poll_until};
use crate::hal::registry::{DeviceRegistry, Named};
use crate::internal::constants::{
    DEFAULT_PREFETCHER_POLL_FREQUENCY, DESCRIPTOR_WRITE_RETRIES, DMA_POLL_SLEEP_US, RESET_POLLS,
    SYNC_COMPLETION_POLLS,
};
use crate::internal::register::RegisterBus;
use crate::internal::register::csr::{self, CsrBlock, control, status};
use crate::internal::register::descriptor::DescriptorPort;
use crate::internal::register::prefetcher::{self, PrefetcherBlock};
use crate::internal::register::response::ResponsePort as ResponseBlock;
use crate::sync::{CriticalSectionCell, RegsLock};

/// Registry of msgdma instances
pub type MsgDmaRegistry<'d, R, D, const N: usize> = DeviceRegistry<'d, MsgDma<R, D>, N>;

/// How a queued submission waits for its transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Completion {
    /// Return once the descriptor is queued
    Async,
    /// Busy-wait until the engine goes idle
    Sync,
}

const fn dma_budget(iterations: u32) -> PollBudget {
    PollBudget::new(iterations).with_sleep_us(DMA_POLL_SLEEP_US)
}

/// Dispatcher control word that starts the engine with the callback's
/// template bits.
///
/// The global interrupt is enabled only when `interrupts` is set.
const fn run_control(template: u32, interrupts: bool) -> u32 {
    let base = (template | control::STOP_ON_ERROR) & !control::STOP_DESCRIPTORS;
    if interrupts {
        base | control::GLOBAL_INTERRUPT_ENABLE
    } else {
        base & !control::GLOBAL_INTERRUPT_ENABLE
    }
}

// =============================================================================
// Device Instance
// =============================================================================

/// One msgdma engine instance.
///
/// # Type Parameters
///
/// * `R` - Register bus ([`Mmio`](crate::Mmio) on hardware)
/// * `D` - Delay provider for bounded waits
///
/// # Example
///
/// ```ignore
/// static DMA: StaticCell<MsgDma<Mmio, Delay>> = StaticCell::new();
/// let dma = DMA.init(MsgDma::new(unsafe { Mmio::new() }, delay, config));
///
/// let mut registry: MsgDmaRegistry<'_, Mmio, Delay, 4> = DeviceRegistry::new();
/// dma.init(&mut registry, &mut intc)?;
///
/// let desc = StandardDescriptor::mm_to_mm(dma.capabilities(), src, dst, 512, DescriptorControl::new())?;
/// dma.submit_sync(&desc)?;
/// ```
pub struct MsgDma<R: RegisterBus, D: DelayNs> {
    config: MsgDmaConfig,
    bus: R,
    regs_lock: RegsLock<D>,
    callback: CallbackSlot<DispatcherStatus>,
    state: CriticalSectionCell<State>,
}

impl<R: RegisterBus, D: DelayNs> MsgDma<R, D> {
    /// Create an uninitialized instance
    pub const fn new(bus: R, delay: D, config: MsgDmaConfig) -> Self {
        Self {
            config,
            bus,
            regs_lock: RegsLock::new(delay),
            callback: CallbackSlot::new(),
            state: CriticalSectionCell::new(State::Uninitialized),
        }
    }

    /// Instance configuration
    pub const fn config(&self) -> &MsgDmaConfig {
        &self.config
    }

    /// Build options, as needed by the descriptor constructors
    pub const fn capabilities(&self) -> &Capabilities {
        &self.config.caps
    }

    /// Register bus the instance talks through
    pub const fn registers(&self) -> &R {
        &self.bus
    }

    /// Lifecycle state
    pub fn state(&self) -> State {
        self.state.get()
    }

    /// Check if a task currently holds the register lock
    pub fn is_locked(&self) -> bool {
        self.regs_lock.is_locked()
    }

    fn csr(&self) -> CsrBlock<'_, R> {
        CsrBlock::new(&self.bus, self.config.regs.csr)
    }

    fn descriptor_port(&self) -> DescriptorPort<'_, R> {
        DescriptorPort::new(&self.bus, self.config.regs.descriptor)
    }

    fn prefetcher(&self) -> Option<PrefetcherBlock<'_, R>> {
        if !self.config.caps.prefetcher {
            return None;
        }
        self.config
            .regs
            .prefetcher
            .map(|base| PrefetcherBlock::new(&self.bus, base))
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Bring the engine to a known idle state and make it discoverable.
    ///
    /// Resets the prefetcher (if present) and the dispatcher, leaves the
    /// dispatcher with descriptor issue stopped and the global interrupt
    /// off, clears all status bits, connects the interrupt line and adds the
    /// instance to `registry`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::AlreadyInitialized`] on a second call
    /// - [`ConfigError::InvalidConfig`] / [`ConfigError::MissingRegion`] from
    ///   configuration validation
    /// - [`ConfigError::ResetFailed`] if a reset bit never clears
    /// - [`ConfigError::IrqRegistration`] if the line cannot be connected
    /// - registry errors from [`DeviceRegistry::register`]
    pub fn init<'d, C, const N: usize>(
        &'d self,
        registry: &mut DeviceRegistry<'d, Self, N>,
        irq: &mut C,
    ) -> Result<()>
    where
        C: InterruptController,
    {
        if self.state.get() != State::Uninitialized {
            return Err(ConfigError::AlreadyInitialized.into());
        }
        self.config.validate()?;
        registry.check_available(self.config.name)?;

        #[cfg(feature = "defmt")]
        defmt::info!("{}: resetting engine", self.config.name);

        {
            let mut delay = self.regs_lock.acquire();
            self.reset(&mut *delay)?;
        }

        connect_line(irq, self.config.irq)?;
        registry.register(self)?;
        self.state.set(State::Ready);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "{}: ready (depth {}, max length {})",
            self.config.name,
            self.config.caps.descriptor_fifo_depth,
            self.config.caps.max_transfer_length
        );
        Ok(())
    }

    fn reset(&self, delay: &mut D) -> Result<()> {
        let reset_failed = |_| Error::Config(ConfigError::ResetFailed);

        if let Some(pf) = self.prefetcher() {
            pf.set_control(prefetcher::control::RESET);
            poll_until(dma_budget(RESET_POLLS), delay, || {
                (pf.control() & prefetcher::control::RESET == 0).then_some(())
            })
            .map_err(reset_failed)?;
            pf.clear_irq();
        }

        let csr = self.csr();
        csr.set_control(control::RESET);
        poll_until(dma_budget(RESET_POLLS), delay, || {
            (csr.status() & status::RESET_STATE == 0).then_some(())
        })
        .map_err(reset_failed)?;

        let ctl = csr.control() & !(control::GLOBAL_INTERRUPT_ENABLE | control::RESET);
        csr.set_control(ctl | control::STOP_DESCRIPTORS);
        csr.set_status(status::ALL);

        if let Some(pf) = self.prefetcher() {
            pf.disable_interrupts();
            pf.clear_irq();
        }
        Ok(())
    }

    // =========================================================================
    // Callback
    // =========================================================================

    /// Register (or with `None`, remove) the completion callback.
    ///
    /// `control` holds dispatcher control bits OR-ed into the run word of
    /// every later submission, e.g. [`csr::control::STOP_ON_EARLY_TERMINATION`].
    /// The stop-descriptors and global-interrupt bits are always managed by
    /// the driver.
    pub fn register_callback(
        &self,
        callback: Option<&'static dyn Callback<DispatcherStatus>>,
        control: u32,
    ) {
        self.callback.register(callback, control);
    }

    // =========================================================================
    // Queued Submission
    // =========================================================================

    /// Queue a descriptor and return without waiting for the transfer.
    ///
    /// # Errors
    ///
    /// - [`Error::OutOfSpace`] if either command queue is full (nothing is
    ///   written)
    /// - [`Error::BadArgument`] if the descriptor format does not match the
    ///   engine
    /// - [`Error::Timeout`] if the descriptor buffer never drains
    pub fn submit_async<'a>(&self, descriptor: impl Into<Descriptor<'a>>) -> Result<()> {
        let (standard, extended) = descriptor.into().split();
        self.descriptor_transfer(standard, extended, Completion::Async)
    }

    /// Queue a descriptor and busy-wait until the engine is idle.
    ///
    /// The global interrupt stays off for the whole call, even with a
    /// callback registered.
    ///
    /// # Errors
    ///
    /// As [`MsgDma::submit_async`], plus:
    ///
    /// - [`Error::Halted`] with the raw status if the engine stopped on an
    ///   error, an early termination, a stop or a reset
    /// - [`Error::Timeout`] if it is still busy after the wait budget; descriptor
    ///   issue is left stopped
    pub fn submit_sync<'a>(&self, descriptor: impl Into<Descriptor<'a>>) -> Result<()> {
        let (standard, extended) = descriptor.into().split();
        self.descriptor_transfer(standard, extended, Completion::Sync)
    }

    /// Shared queue writer. Exactly one of `standard` / `extended` is given.
    pub(crate) fn descriptor_transfer(
        &self,
        standard: Option<&StandardDescriptor>,
        extended: Option<&ExtendedDescriptor>,
        mode: Completion,
    ) -> Result<()> {
        if standard.is_some() == extended.is_some() {
            return Err(Error::PermissionDenied);
        }
        if extended.is_some() != self.config.caps.enhanced_features {
            return Err(Error::BadArgument);
        }

        let csr = self.csr();
        let (read, write) = csr.fill_levels();
        if (FillLevels { read, write }).is_full(self.config.caps.descriptor_fifo_depth) {
            #[cfg(feature = "defmt")]
            defmt::debug!("{}: command queues full ({}/{})", self.config.name, read, write);
            return Err(Error::OutOfSpace);
        }

        let mut delay = self.regs_lock.acquire();

        critical_section::with(|_| {
            csr.set_control(control::STOP_DESCRIPTORS);
            csr.clear_irq();
        });

        let port = self.descriptor_port();
        poll_until(dma_budget(DESCRIPTOR_WRITE_RETRIES), &mut *delay, || {
            if csr.status() & status::DESCRIPTOR_BUFFER_FULL != 0 {
                return None;
            }
            match (standard, extended) {
                (Some(desc), _) => desc.write_to(&port),
                (_, Some(desc)) => desc.write_to(&port),
                (None, None) => {}
            }
            Some(())
        })
        .inspect_err(|_| {
            #[cfg(feature = "defmt")]
            defmt::warn!("{}: descriptor buffer stayed full", self.config.name);
        })?;

        let registration = self.callback.get();
        let interrupts = mode == Completion::Async && registration.handler.is_some();
        let run = run_control(registration.control, interrupts);
        critical_section::with(|_| csr.set_control(run));

        if mode == Completion::Async {
            return Ok(());
        }

        let outcome = poll_until(dma_budget(SYNC_COMPLETION_POLLS), &mut *delay, || {
            let raw = csr.status();
            if raw & status::HALT_MASK != 0 {
                Some(Err(Error::Halted(DispatcherStatus::from_raw(raw))))
            } else if raw & status::BUSY == 0 && raw & status::DESCRIPTOR_BUFFER_EMPTY != 0 {
                Some(Ok(()))
            } else {
                None
            }
        })
        .and_then(|result| result);

        critical_section::with(|_| {
            csr.set_control(control::STOP_DESCRIPTORS);
            if outcome.is_ok() {
                csr.clear_irq();
            }
        });

        #[cfg(feature = "defmt")]
        if let Err(err) = &outcome {
            defmt::warn!("{}: sync transfer failed: {}", self.config.name, err);
        }
        outcome
    }

    // =========================================================================
    // Interrupt Handling
    // =========================================================================

    /// Interrupt service routine body.
    ///
    /// Masks the engine's interrupt, clears the pending flag, hands a status
    /// snapshot to the callback (if any) inside a critical section, then
    /// unmasks. In prefetcher mode the prefetcher's own interrupt enable and
    /// flag are used, and the dispatcher flag is cleared as well.
    pub fn on_interrupt(&self) {
        let csr = self.csr();

        match self.prefetcher() {
            Some(pf) => {
                pf.disable_interrupts();
                pf.clear_irq();
                let snapshot = csr.status();
                csr.clear_irq();
                self.callback.invoke_masked(DispatcherStatus::from_raw(snapshot));
                pf.enable_interrupts();
            }
            None => {
                csr.set_control(csr.control() & !control::GLOBAL_INTERRUPT_ENABLE);
                let snapshot = csr.status();
                csr.clear_irq();
                self.callback.invoke_masked(DispatcherStatus::from_raw(snapshot));
                csr.set_control(csr.control() | control::GLOBAL_INTERRUPT_ENABLE);
            }
        }
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Dispatcher status snapshot
    pub fn status(&self) -> DispatcherStatus {
        DispatcherStatus::from_raw(self.csr().status())
    }

    /// Read and write command queue fill levels
    pub fn fill_levels(&self) -> FillLevels {
        let (read, write) = self.csr().fill_levels();
        FillLevels { read, write }
    }

    /// Response queue fill level
    pub fn response_fill_level(&self) -> u16 {
        (self.csr().response_fill_level() & csr::fill_level::RESPONSE_MASK) as u16
    }

    /// Sequence numbers last processed by each master
    pub fn sequence_numbers(&self) -> SequenceNumbers {
        let raw = self.csr().sequence_number();
        SequenceNumbers {
            read: (raw & csr::sequence::READ_MASK) as u16,
            write: ((raw & csr::sequence::WRITE_MASK) >> csr::sequence::WRITE_SHIFT) as u16,
        }
    }

    /// Pop one entry from the memory-mapped response port.
    ///
    /// Returns `None` when the response queue is empty. Fails with
    /// [`Error::BadArgument`] unless the engine was built with a memory-mapped
    /// response port.
    pub fn read_response(&self) -> Result<Option<Response>> {
        let base = match (self.config.caps.response_port, self.config.regs.response) {
            (ResponsePort::MemoryMapped, Some(base)) => base,
            _ => return Err(Error::BadArgument),
        };

        let _guard = self.regs_lock.acquire();
        if self.response_fill_level() == 0 {
            return Ok(None);
        }
        let port = ResponseBlock::new(&self.bus, base);
        let actual_bytes = port.actual_bytes();
        // Reading the error word pops the entry
        let error_status = port.pop_error_status();
        Ok(Some(Response::from_raw(actual_bytes, error_status)))
    }

    // =========================================================================
    // Prefetcher
    // =========================================================================

    /// Check whether the prefetcher is walking a list
    pub fn is_prefetcher_running(&self) -> bool {
        self.prefetcher().is_some_and(|pf| pf.is_running())
    }

    /// Arm the prefetcher on the list rooted at `list_address`.
    ///
    /// Every node must already be hardware-owned. `park_mode` loops over the
    /// list forever; `poll` makes the prefetcher re-read a released
    /// descriptor until software hands it back (the poll frequency falls back
    /// to a default if unset).
    ///
    /// # Errors
    ///
    /// - [`ConfigError::PrefetcherDisabled`] without a prefetcher
    /// - [`Error::Busy`] if the prefetcher is already running; no register
    ///   is written
    pub fn start_prefetcher(&self, list_address: u64, park_mode: bool, poll: bool) -> Result<()> {
        let pf = self.prefetcher().ok_or(ConfigError::PrefetcherDisabled)?;

        let mut pf_ctl = pf.control();
        if pf_ctl & prefetcher::control::RUN != 0 {
            return Err(Error::Busy);
        }

        let _guard = self.regs_lock.acquire();
        let csr = self.csr();

        critical_section::with(|_| {
            csr.set_control(control::STOP_DESCRIPTORS);
            csr.set_status(csr.status());
        });

        let registration = self.callback.get();
        let interrupts = registration.handler.is_some();
        let run = run_control(registration.control, interrupts);
        if interrupts {
            pf_ctl |= prefetcher::control::GLOBAL_INTR_EN;
        } else {
            pf_ctl &= !prefetcher::control::GLOBAL_INTR_EN;
        }
        critical_section::with(|_| {
            csr.set_control(run);
            pf.set_control(pf_ctl);
        });

        pf.set_next_descriptor(list_address);

        if park_mode {
            pf_ctl |= prefetcher::control::PARK_MODE;
        } else {
            pf_ctl &= !prefetcher::control::PARK_MODE;
        }
        if poll {
            pf_ctl |= prefetcher::control::DESC_POLL_EN;
            if pf.poll_frequency() == 0 {
                pf.set_poll_frequency(DEFAULT_PREFETCHER_POLL_FREQUENCY);
            }
        } else {
            pf_ctl &= !prefetcher::control::DESC_POLL_EN;
        }

        pf.set_control(pf_ctl | prefetcher::control::RUN);

        #[cfg(feature = "defmt")]
        defmt::debug!("{}: prefetcher started at {:#x}", self.config.name, list_address);
        Ok(())
    }

    /// Hand every node of `list` to hardware and arm the prefetcher on it.
    ///
    /// # Errors
    ///
    /// As [`MsgDma::start_prefetcher`], plus [`Error::BadArgument`] for an
    /// empty list. Nothing is marked while the prefetcher is running.
    pub fn start_prefetcher_with_list<P, const N: usize>(
        &self,
        pool: &DescriptorPool<P, N>,
        list: &DescriptorList,
        park_mode: bool,
        poll: bool,
    ) -> Result<()>
    where
        P: PrefetcherDescriptor,
    {
        if self.prefetcher().is_none() {
            return Err(ConfigError::PrefetcherDisabled.into());
        }
        if self.is_prefetcher_running() {
            return Err(Error::Busy);
        }
        let address = pool.list_address(list).ok_or(Error::BadArgument)?;
        pool.mark_hardware_owned(list)?;
        self.start_prefetcher(address, park_mode, poll)
    }
}

impl<R: RegisterBus, D: DelayNs> Named for MsgDma<R, D> {
    fn name(&self) -> &str {
        self.config.name
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
