//! Avalon I2C master driver.
//!
//! Polled master transfers over the Avalon I2C core's transfer-command FIFO,
//! with the same device shape as the msgdma driver: a name-keyed registry
//! entry, a register lock that also guards the delay provider, and an
//! ISR-readable callback slot.
//!
//! Primitives ([`AvalonI2c::master_transmit`], [`AvalonI2c::master_receive`])
//! report `NotAcknowledged`, `ArbitrationLost` and `Busy` to the caller. The
//! `master_tx` / `master_rx` / `master_tx_rx` wrappers retry those three
//! within a bounded budget.
//!
//! The driver also implements [`embedded_hal::i2c::I2c`] for 7-bit
//! addresses.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorType, I2c, Operation, SevenBitAddress};

use crate::driver::callback::{Callback, CallbackSlot};
use crate::driver::config::State;
use crate::error::{ConfigError, ConfigResult, Error, Result};
use crate::hal::interrupt::{InterruptController, IrqLine, connect_line};
use crate::hal::poll::{PollBudget, poll_until};
use crate::hal::registry::{DeviceRegistry, Named};
use crate::internal::constants::{
    I2C_DIFF_LCNT_HCNT, I2C_FS_MAX_HZ, I2C_POLL_SLEEP_US, I2C_POLLS_PER_BYTE,
    I2C_SLEEP_THRESHOLD, I2C_SS_MAX_HZ, I2C_SS_MIN_HZ, I2C_TEN_BIT_ADDRESS_MASK,
    I2C_TRANSFER_RETRIES,
};
use crate::internal::register::RegisterBus;
use crate::internal::register::i2c::{I2cBlock, ctrl, isr, status, tfr_cmd};
use crate::sync::{CriticalSectionCell, RegsLock};

/// Registry of I2C master instances
pub type I2cRegistry<'d, R, D, const N: usize> = DeviceRegistry<'d, AvalonI2c<R, D>, N>;

// =============================================================================
// Configuration
// =============================================================================

/// Target address width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressMode {
    /// 7-bit addressing
    #[default]
    SevenBit,
    /// 10-bit addressing
    TenBit,
}

/// Bus speed mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedMode {
    /// Up to 100 kHz
    #[default]
    Standard,
    /// Up to 400 kHz
    Fast,
}

/// Receive FIFO threshold for the RX_READY condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxFifoThreshold {
    /// One entry
    OneEntry = 0,
    /// One quarter full
    QuarterFull = 1,
    /// Half full
    HalfFull = 2,
    /// Full
    Full = 3,
}

/// Transfer command FIFO threshold for the TX_READY condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TfrCmdFifoThreshold {
    /// Empty
    Empty = 0,
    /// One quarter full
    QuarterFull = 1,
    /// Half full
    HalfFull = 2,
    /// At least one free entry
    NotFull = 3,
}

impl RxFifoThreshold {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::OneEntry,
            1 => Self::QuarterFull,
            2 => Self::HalfFull,
            _ => Self::Full,
        }
    }
}

impl TfrCmdFifoThreshold {
    const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0 => Self::Empty,
            1 => Self::QuarterFull,
            2 => Self::HalfFull,
            _ => Self::NotFull,
        }
    }
}

/// Master-mode timing and addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MasterConfig {
    /// Target address width
    pub addr_mode: AddressMode,
    /// Bus speed mode
    pub speed_mode: SpeedMode,
    /// SCL high period, in interface clock cycles
    pub scl_hcnt: u16,
    /// SCL low period, in interface clock cycles
    pub scl_lcnt: u16,
    /// SDA hold time, in interface clock cycles
    pub sda_cnt: u16,
}

/// Static description of one I2C core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct I2cConfig {
    /// Instance name used by the device registry
    pub name: &'static str,
    /// Register block base
    pub base: usize,
    /// Interrupt line
    pub irq: IrqLine,
    /// Interface clock in Hz
    pub clock_hz: u32,
    /// Transfer command FIFO depth
    pub cmd_fifo_depth: u32,
    /// Receive FIFO depth
    pub rx_fifo_depth: u32,
}

impl I2cConfig {
    /// Configuration with 4-entry FIFOs on line 0 of controller 0
    pub const fn new(name: &'static str, base: usize, clock_hz: u32) -> Self {
        Self {
            name,
            base,
            irq: IrqLine::new(0, 0),
            clock_hz,
            cmd_fifo_depth: 4,
            rx_fifo_depth: 4,
        }
    }

    /// Set the interrupt line
    pub const fn with_irq(mut self, irq: IrqLine) -> Self {
        self.irq = irq;
        self
    }

    /// Set both FIFO depths
    pub const fn with_fifo_depths(mut self, cmd: u32, rx: u32) -> Self {
        self.cmd_fifo_depth = cmd;
        self.rx_fifo_depth = rx;
        self
    }

    /// Check the configuration is consistent
    pub const fn validate(&self) -> ConfigResult<()> {
        if self.clock_hz == 0 || self.cmd_fifo_depth == 0 || self.rx_fifo_depth == 0 {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

/// Default bus speed applied by init
const DEFAULT_SPEED_HZ: u32 = 100_000;

const fn i2c_budget(iterations: u32) -> PollBudget {
    PollBudget::new(iterations)
        .with_sleep_threshold(I2C_SLEEP_THRESHOLD)
        .with_sleep_us(I2C_POLL_SLEEP_US)
}

// =============================================================================
// Locked State
// =============================================================================

struct Master<D> {
    delay: D,
    target: u16,
    addr_mode: AddressMode,
}

/// How a transfer segment is framed on the bus
#[derive(Debug, Clone, Copy)]
struct Segment {
    /// Issue a repeated start before the address
    restart: bool,
    /// Issue a stop after the last byte
    stop: bool,
    /// Send the target address first
    address: bool,
}

impl Segment {
    const fn new(restart: bool, stop: bool) -> Self {
        Self {
            restart,
            stop,
            address: true,
        }
    }
}

// =============================================================================
// Device Instance
// =============================================================================

/// One Avalon I2C master.
///
/// # Example
///
/// ```ignore
/// let i2c = I2C.init(AvalonI2c::new(unsafe { Mmio::new() }, delay, I2cConfig::new("/dev/i2c_0", 0x0020_0000, 50_000_000)));
/// i2c.init(&mut registry, &mut intc)?;
///
/// i2c.target_set(0x50);
/// i2c.master_tx_rx(&[0x00, 0x10], &mut buf)?;
/// ```
pub struct AvalonI2c<R: RegisterBus, D: DelayNs> {
    config: I2cConfig,
    bus: R,
    master: RegsLock<Master<D>>,
    callback: CallbackSlot<u32>,
    state: CriticalSectionCell<State>,
}

impl<R: RegisterBus, D: DelayNs> AvalonI2c<R, D> {
    /// Create an uninitialized instance
    pub const fn new(bus: R, delay: D, config: I2cConfig) -> Self {
        Self {
            config,
            bus,
            master: RegsLock::new(Master {
                delay,
                target: 0,
                addr_mode: AddressMode::SevenBit,
            }),
            callback: CallbackSlot::new(),
            state: CriticalSectionCell::new(State::Uninitialized),
        }
    }

    /// Instance configuration
    pub const fn config(&self) -> &I2cConfig {
        &self.config
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
        self.master.is_locked()
    }

    fn block(&self) -> I2cBlock<'_, R> {
        I2cBlock::new(&self.bus, self.config.base)
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Put the core in a known state and make it discoverable.
    ///
    /// Disables the core and every interrupt, clears latched conditions,
    /// sets the FIFO thresholds to "not full" / "full", applies 7-bit
    /// addressing at 100 kHz, connects the interrupt line and registers.
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

        let mut timing = MasterConfig::default();
        self.set_speed(&mut timing, DEFAULT_SPEED_HZ)?;
        {
            let mut master = self.master.acquire();
            let blk = self.block();
            blk.disable_core();
            blk.set_iser(0);
            blk.set_isr(isr::ALL_CLEARABLE);
            self.apply_thresholds(TfrCmdFifoThreshold::NotFull, RxFifoThreshold::Full);
            self.apply_config(&mut master, &timing);
        }

        connect_line(irq, self.config.irq)?;
        registry.register(self)?;
        self.state.set(State::Ready);

        #[cfg(feature = "defmt")]
        defmt::info!("{}: ready at {} Hz", self.config.name, DEFAULT_SPEED_HZ);
        Ok(())
    }

    // =========================================================================
    // Core Control
    // =========================================================================

    /// Enable the core; [`Error::Busy`] if it already is
    pub fn enable(&self) -> Result<()> {
        let _master = self.master.acquire();
        let blk = self.block();
        if blk.ctrl() & ctrl::EN != 0 {
            return Err(Error::Busy);
        }
        blk.enable_core();
        Ok(())
    }

    /// Disable the core
    pub fn disable(&self) {
        let _master = self.master.acquire();
        self.block().disable_core();
    }

    /// Check whether the core is driving a transaction
    pub fn is_busy(&self) -> bool {
        self.block().status() & status::CORE_STATUS != 0
    }

    // =========================================================================
    // Master Configuration
    // =========================================================================

    /// Apply timing, speed mode and address mode
    pub fn master_config_set(&self, cfg: &MasterConfig) {
        let mut master = self.master.acquire();
        self.apply_config(&mut master, cfg);
    }

    /// Current timing, speed mode and address mode
    pub fn master_config_get(&self) -> MasterConfig {
        let master = self.master.acquire();
        let blk = self.block();
        let speed_mode = if blk.ctrl() & ctrl::BUS_SPEED != 0 {
            SpeedMode::Fast
        } else {
            SpeedMode::Standard
        };
        MasterConfig {
            addr_mode: master.addr_mode,
            speed_mode,
            scl_hcnt: blk.scl_high() as u16,
            scl_lcnt: blk.scl_low() as u16,
            sda_cnt: blk.sda_hold() as u16,
        }
    }

    /// Fill in the SCL counts, SDA hold and speed mode of `cfg` for `hz`.
    ///
    /// Fails with [`Error::OutOfRange`] outside 1 Hz..=400 kHz, or when the
    /// interface clock is too slow to generate `hz`; `cfg` is then unchanged.
    /// The result is applied with [`AvalonI2c::master_config_set`].
    pub fn set_speed(&self, cfg: &mut MasterConfig, hz: u32) -> Result<()> {
        if !(I2C_SS_MIN_HZ..=I2C_FS_MAX_HZ).contains(&hz) {
            return Err(Error::OutOfRange);
        }

        let half = self.config.clock_hz / (hz << 1);
        if half <= I2C_DIFF_LCNT_HCNT {
            return Err(Error::OutOfRange);
        }
        let hcnt = half + I2C_DIFF_LCNT_HCNT;
        let lcnt = half - I2C_DIFF_LCNT_HCNT;
        if hcnt > u32::from(u16::MAX) {
            return Err(Error::OutOfRange);
        }

        cfg.speed_mode = if hz > I2C_SS_MAX_HZ {
            SpeedMode::Fast
        } else {
            SpeedMode::Standard
        };
        cfg.scl_hcnt = hcnt as u16;
        cfg.scl_lcnt = lcnt as u16;
        cfg.sda_cnt = (lcnt - lcnt / 2) as u16;
        Ok(())
    }

    /// SCL frequency described by `cfg`; [`Error::BadArgument`] if a count is zero
    pub fn speed(&self, cfg: &MasterConfig) -> Result<u32> {
        if cfg.scl_lcnt == 0 || cfg.scl_hcnt == 0 {
            return Err(Error::BadArgument);
        }
        Ok(self.config.clock_hz / (u32::from(cfg.scl_hcnt) + u32::from(cfg.scl_lcnt)))
    }

    /// Set the target address used by the master primitives
    pub fn target_set(&self, address: u16) {
        self.master.acquire().target = address;
    }

    /// Current target address
    pub fn target_get(&self) -> u16 {
        self.master.acquire().target
    }

    fn apply_config(&self, master: &mut Master<D>, cfg: &MasterConfig) {
        let blk = self.block();
        let speed = match cfg.speed_mode {
            SpeedMode::Standard => 0,
            SpeedMode::Fast => 1,
        };
        blk.modify_ctrl(speed << ctrl::BUS_SPEED_SHIFT, ctrl::BUS_SPEED);
        blk.set_scl_low(u32::from(cfg.scl_lcnt));
        blk.set_scl_high(u32::from(cfg.scl_hcnt));
        blk.set_sda_hold(u32::from(cfg.sda_cnt));
        master.addr_mode = cfg.addr_mode;
    }

    // =========================================================================
    // FIFO Thresholds
    // =========================================================================

    /// Set the transfer command FIFO threshold
    pub fn set_tfr_cmd_fifo_threshold(&self, threshold: TfrCmdFifoThreshold) {
        let _master = self.master.acquire();
        self.block()
            .modify_ctrl((threshold as u32) << ctrl::TCT_SHIFT, ctrl::TCT_MASK);
    }

    /// Transfer command FIFO threshold
    pub fn tfr_cmd_fifo_threshold(&self) -> TfrCmdFifoThreshold {
        TfrCmdFifoThreshold::from_bits((self.block().ctrl() & ctrl::TCT_MASK) >> ctrl::TCT_SHIFT)
    }

    /// Set the receive FIFO threshold
    pub fn set_rx_fifo_threshold(&self, threshold: RxFifoThreshold) {
        let _master = self.master.acquire();
        self.block()
            .modify_ctrl((threshold as u32) << ctrl::RCT_SHIFT, ctrl::RCT_MASK);
    }

    /// Receive FIFO threshold
    pub fn rx_fifo_threshold(&self) -> RxFifoThreshold {
        RxFifoThreshold::from_bits((self.block().ctrl() & ctrl::RCT_MASK) >> ctrl::RCT_SHIFT)
    }

    /// Free entries in the transfer command FIFO
    pub fn tfr_cmd_fifo_space(&self) -> u32 {
        self.config
            .cmd_fifo_depth
            .saturating_sub(self.block().tfr_cmd_fifo_level())
    }

    fn apply_thresholds(&self, cmd: TfrCmdFifoThreshold, rx: RxFifoThreshold) {
        self.block().modify_ctrl(
            ((cmd as u32) << ctrl::TCT_SHIFT) | ((rx as u32) << ctrl::RCT_SHIFT),
            ctrl::TCT_MASK | ctrl::RCT_MASK,
        );
    }

    // =========================================================================
    // Command Primitives
    // =========================================================================

    /// Queue one command byte once the command FIFO has room.
    ///
    /// Latched NACK / arbitration-lost conditions are reported before and
    /// after the write.
    pub fn cmd_write(&self, byte: u8, restart: bool, stop: bool) -> Result<()> {
        let mut master = self.master.acquire();
        self.write_command(&mut master, byte, restart, stop)
    }

    /// Send the target address with the read/write bit
    pub fn send_address(&self, read: bool, restart: bool) -> Result<()> {
        let mut master = self.master.acquire();
        self.write_address(&mut master, read, restart, false)
    }

    fn bus_errors(&self) -> Result<()> {
        let raw = self.block().isr();
        if raw & isr::ARBLOST_DET != 0 {
            return Err(Error::ArbitrationLost);
        }
        if raw & isr::NACK_DET != 0 {
            return Err(Error::NotAcknowledged);
        }
        Ok(())
    }

    fn write_command(&self, master: &mut Master<D>, byte: u8, restart: bool, stop: bool) -> Result<()> {
        self.bus_errors()?;

        let blk = self.block();
        poll_until(i2c_budget(I2C_POLLS_PER_BYTE), &mut master.delay, || {
            (blk.isr() & isr::TX_READY != 0).then_some(())
        })?;

        let mut cmd = u32::from(byte) & tfr_cmd::DATA_MASK;
        if restart {
            cmd |= tfr_cmd::STA;
        }
        if stop {
            cmd |= tfr_cmd::STO;
        }
        blk.push_command(cmd);

        self.bus_errors()
    }

    fn write_address(&self, master: &mut Master<D>, read: bool, restart: bool, stop: bool) -> Result<()> {
        let rw = u32::from(read);
        let target = u32::from(master.target);
        match master.addr_mode {
            AddressMode::TenBit => {
                let high = (((target | I2C_TEN_BIT_ADDRESS_MASK) >> 7) & 0xFE) | rw;
                self.write_command(master, high as u8, restart, false)?;
                self.write_command(master, target as u8, false, stop)
            }
            AddressMode::SevenBit => {
                let byte = ((target << 1) & 0xFE) | rw;
                self.write_command(master, byte as u8, restart, stop)
            }
        }
    }

    fn wait_idle(&self, master: &mut Master<D>, bytes: usize) -> Result<()> {
        let blk = self.block();
        let polls = I2C_POLLS_PER_BYTE.saturating_mul(bytes.max(1) as u32);
        poll_until(i2c_budget(polls), &mut master.delay, || {
            (blk.status() & status::CORE_STATUS == 0).then_some(())
        })
    }

    /// A fresh start on a core that is already enabled belongs to another
    /// transaction and fails with [`Error::Busy`] before touching the core.
    fn begin_segment(&self, seg: Segment) -> Result<()> {
        let blk = self.block();
        if !seg.restart {
            if seg.address && blk.ctrl() & ctrl::EN != 0 {
                return Err(Error::Busy);
            }
            blk.enable_core();
        }
        blk.set_iser(blk.iser() & !isr::ALL);
        Ok(())
    }

    /// Error and stop handling shared by both directions
    fn end_segment(&self, master: &mut Master<D>, result: Result<()>, seg: Segment, bytes: usize) -> Result<()> {
        let blk = self.block();
        let result = self.bus_errors().and(result);
        match result {
            Err(_err) => {
                #[cfg(feature = "defmt")]
                defmt::debug!("{}: transfer to {:#x} failed: {}", self.config.name, master.target, _err);
                // The core issues the stop itself after a NACK
                if let Err(_idle) = self.wait_idle(master, bytes) {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("{}: core still busy after failed transfer: {}", self.config.name, _idle);
                }
                blk.set_isr(isr::ALL_CLEARABLE);
                blk.disable_core();
            }
            Ok(()) if seg.stop => blk.disable_core(),
            Ok(()) => {}
        }
        result
    }

    fn write_segment(&self, master: &mut Master<D>, data: &[u8], seg: Segment) -> Result<()> {
        self.begin_segment(seg)?;

        let mut result = Ok(());
        if seg.address {
            result = self.write_address(master, false, seg.restart, data.is_empty() && seg.stop);
        }
        for (i, byte) in data.iter().enumerate() {
            if result.is_err() {
                break;
            }
            let last = i + 1 == data.len();
            result = self.write_command(master, *byte, false, last && seg.stop);
        }
        if result.is_ok() && seg.stop {
            result = self.wait_idle(master, data.len());
        }

        self.end_segment(master, result, seg, data.len())
    }

    fn read_segment(&self, master: &mut Master<D>, buffer: &mut [u8], seg: Segment) -> Result<()> {
        self.begin_segment(seg)?;
        let blk = self.block();
        let len = buffer.len();
        let depth = self.config.rx_fifo_depth as usize;
        let mut received = 0;

        let drain = |buffer: &mut [u8], received: &mut usize| {
            while *received < len && blk.rx_fifo_level() > 0 {
                buffer[*received] = blk.pop_rx_data() as u8;
                *received += 1;
            }
        };

        let mut result = Ok(());
        if seg.address {
            result = self.write_address(master, true, seg.restart, len == 0 && seg.stop);
        }
        for i in 0..len {
            if result.is_ok() && i.saturating_sub(received) >= depth {
                // Each outstanding read command owns one receive FIFO entry
                result = poll_until(i2c_budget(I2C_POLLS_PER_BYTE), &mut master.delay, || {
                    drain(buffer, &mut received);
                    (i.saturating_sub(received) < depth).then_some(())
                });
            }
            if result.is_err() {
                break;
            }
            let last = i + 1 == len;
            result = self.write_command(master, 0, false, last && seg.stop);
            drain(buffer, &mut received);
        }
        if result.is_ok() {
            let polls = I2C_POLLS_PER_BYTE.saturating_mul(len.max(1) as u32);
            result = poll_until(i2c_budget(polls), &mut master.delay, || {
                drain(buffer, &mut received);
                (received >= len).then_some(())
            });
        }
        if result.is_ok() && seg.stop {
            result = self.wait_idle(master, len);
        }

        self.end_segment(master, result, seg, len)
    }

    // =========================================================================
    // Master Transfers
    // =========================================================================

    /// Write `data` to the target.
    ///
    /// Sends a start (or a repeated start with `restart`), the address and
    /// the bytes, and a stop after the last byte if `stop` is set. A zero
    /// length transfer does nothing. No retries.
    pub fn master_transmit(&self, data: &[u8], restart: bool, stop: bool) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let mut master = self.master.acquire();
        self.write_segment(&mut master, data, Segment::new(restart, stop))
    }

    /// Read `buffer.len()` bytes from the target. No retries.
    pub fn master_receive(&self, buffer: &mut [u8], restart: bool, stop: bool) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        let mut master = self.master.acquire();
        self.read_segment(&mut master, buffer, Segment::new(restart, stop))
    }

    /// Complete write transaction, retried on NACK, arbitration loss or busy
    pub fn master_tx(&self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        let mut master = self.master.acquire();
        self.with_retries(&mut master, |dev, master| {
            dev.write_segment(master, data, Segment::new(false, true))
        })
    }

    /// Complete read transaction, retried on NACK, arbitration loss or busy
    pub fn master_rx(&self, buffer: &mut [u8]) -> Result<()> {
        if buffer.is_empty() {
            return Ok(());
        }
        let mut master = self.master.acquire();
        self.with_retries(&mut master, |dev, master| {
            dev.read_segment(master, buffer, Segment::new(false, true))
        })
    }

    /// Write then read with a repeated start in between, retried as a whole
    pub fn master_tx_rx(&self, tx: &[u8], rx: &mut [u8]) -> Result<()> {
        let mut master = self.master.acquire();
        self.with_retries(&mut master, |dev, master| {
            if !tx.is_empty() {
                dev.write_segment(master, tx, Segment::new(false, false))?;
            }
            if !rx.is_empty() {
                dev.read_segment(master, rx, Segment::new(!tx.is_empty(), true))?;
            }
            Ok(())
        })
    }

    fn with_retries<F>(&self, master: &mut Master<D>, mut attempt: F) -> Result<()>
    where
        F: FnMut(&Self, &mut Master<D>) -> Result<()>,
    {
        let mut remaining = I2C_TRANSFER_RETRIES;
        loop {
            let result = attempt(self, master);
            if !matches!(
                result,
                Err(Error::NotAcknowledged | Error::ArbitrationLost | Error::Busy)
            ) {
                return result;
            }

            remaining -= 1;
            if remaining == 0 {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}: giving up on {:#x}", self.config.name, master.target);
                return result;
            }
            if remaining < I2C_SLEEP_THRESHOLD {
                master.delay.delay_us(I2C_POLL_SLEEP_US);
            }
        }
    }

    // =========================================================================
    // Interrupts
    // =========================================================================

    /// Register (or with `None`, remove) the interrupt callback.
    ///
    /// With a callback, the `enable_mask` sources are enabled. The callback
    /// receives the enabled-and-pending status and must re-enable the
    /// sources it still wants.
    pub fn register_callback(&self, callback: Option<&'static dyn Callback<u32>>, enable_mask: u32) {
        self.callback.register(callback, enable_mask);
        if callback.is_some() {
            self.int_enable(enable_mask);
        } else {
            self.int_disable(isr::ALL);
        }
    }

    /// Pending conditions that are also enabled
    pub fn int_status(&self) -> u32 {
        let blk = self.block();
        blk.isr() & blk.iser()
    }

    /// Pending conditions regardless of enables
    pub fn int_raw_status(&self) -> u32 {
        self.block().isr()
    }

    /// Clear latched conditions in `mask`
    pub fn int_clear(&self, mask: u32) {
        self.block().set_isr(mask & isr::ALL_CLEARABLE);
    }

    /// Enable the sources in `mask`
    pub fn int_enable(&self, mask: u32) {
        let blk = self.block();
        critical_section::with(|_| blk.set_iser(blk.iser() | (mask & isr::ALL)));
    }

    /// Disable the sources in `mask`
    pub fn int_disable(&self, mask: u32) {
        let blk = self.block();
        critical_section::with(|_| blk.set_iser(blk.iser() & !mask));
    }

    /// Enabled sources
    pub fn enabled_ints(&self) -> u32 {
        self.block().iser()
    }

    /// Interrupt service routine body.
    ///
    /// Disables every source, clears latched conditions and hands the status
    /// snapshot to the callback inside a critical section.
    pub fn on_interrupt(&self) {
        let snapshot = self.int_status();
        let blk = self.block();
        blk.set_iser(0);
        blk.set_isr(isr::ALL_CLEARABLE);
        self.callback.invoke_masked(snapshot);
    }
}

impl<R: RegisterBus, D: DelayNs> Named for AvalonI2c<R, D> {
    fn name(&self) -> &str {
        self.config.name
    }
}

// =============================================================================
// embedded-hal
// =============================================================================

impl<R: RegisterBus, D: DelayNs> ErrorType for AvalonI2c<R, D> {
    type Error = Error;
}

impl<R: RegisterBus, D: DelayNs> I2c<SevenBitAddress> for AvalonI2c<R, D> {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<()> {
        let mut master = self.master.acquire();
        let saved = (master.target, master.addr_mode);
        master.target = u16::from(address);
        master.addr_mode = AddressMode::SevenBit;

        let count = operations.len();
        let mut prev_read = None;
        let mut result = Ok(());
        for (i, op) in operations.iter_mut().enumerate() {
            let last = i + 1 == count;
            let read = matches!(op, Operation::Read(_));
            let address = prev_read != Some(read);
            let seg = Segment {
                restart: i > 0 && address,
                stop: last,
                address,
            };
            result = match op {
                Operation::Write(data) => self.write_segment(&mut master, data, seg),
                Operation::Read(buffer) => self.read_segment(&mut master, buffer, seg),
            };
            if result.is_err() {
                break;
            }
            prev_read = Some(read);
        }

        (master.target, master.addr_mode) = saved;
        result
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
