//! Testing utilities and mock implementations
//!
//! This module provides mock implementations for testing the drivers on the
//! host without hardware access.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::{Cell, RefCell};
use core::sync::atomic::{AtomicU32, Ordering};
use std::boxed::Box;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::vec::Vec;

use crate::driver::callback::Callback;
use crate::driver::status::DispatcherStatus;
use crate::error::{Error, Result};
use crate::hal::interrupt::{InterruptController, IrqLine};
use crate::internal::register::RegisterBus;

// =============================================================================
// Mock Register Bus
// =============================================================================

/// Mock register file for testing drivers without hardware
///
/// Unwritten registers read as zero. Beyond plain storage it can model:
/// - scripted reads: a queue of values returned (in order) before the
///   stored value, for status registers that change over time
/// - write-one-to-clear bits: writing 1 clears the bit, other bits in the
///   register are read-only
/// - self-clearing bits: stored as 0 regardless of the written value
///
/// # Example
///
/// ```ignore
/// let regs = MockRegisters::new();
/// regs.script_reads(STATUS, &[BUSY, BUSY, 0]);
/// regs.write_one_to_clear(STATUS, IRQ);
/// ```
#[derive(Debug, Default)]
pub struct MockRegisters {
    values: RefCell<HashMap<usize, u32>>,
    scripted: RefCell<HashMap<usize, VecDeque<u32>>>,
    w1c: RefCell<HashMap<usize, u32>>,
    self_clearing: RefCell<HashMap<usize, u32>>,
    write_log: RefCell<Vec<(usize, u32)>>,
    read_log: RefCell<Vec<usize>>,
}

impl MockRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the stored value without logging a write
    pub fn set(&self, addr: usize, value: u32) {
        self.values.borrow_mut().insert(addr, value);
    }

    /// Current stored value (ignores scripted reads)
    pub fn get(&self, addr: usize) -> u32 {
        self.values.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Queue values returned by the next reads of `addr`
    pub fn script_reads(&self, addr: usize, values: &[u32]) {
        self.scripted
            .borrow_mut()
            .entry(addr)
            .or_default()
            .extend(values.iter().copied());
    }

    /// Treat the `mask` bits of `addr` as write-one-to-clear
    pub fn write_one_to_clear(&self, addr: usize, mask: u32) {
        self.w1c.borrow_mut().insert(addr, mask);
    }

    /// Bits of `addr` that hardware clears right after they are written
    pub fn self_clearing(&self, addr: usize, mask: u32) {
        self.self_clearing.borrow_mut().insert(addr, mask);
    }

    /// All writes in order
    pub fn writes(&self) -> Vec<(usize, u32)> {
        self.write_log.borrow().clone()
    }

    /// Values written to one address, in order
    pub fn writes_to(&self, addr: usize) -> Vec<u32> {
        self.write_log
            .borrow()
            .iter()
            .filter(|(a, _)| *a == addr)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Last value written to `addr`
    pub fn last_write(&self, addr: usize) -> Option<u32> {
        self.writes_to(addr).last().copied()
    }

    /// Number of reads of `addr`
    pub fn reads_of(&self, addr: usize) -> usize {
        self.read_log.borrow().iter().filter(|a| **a == addr).count()
    }

    /// Forget logged reads and writes
    pub fn clear_log(&self) {
        self.write_log.borrow_mut().clear();
        self.read_log.borrow_mut().clear();
    }
}

impl RegisterBus for MockRegisters {
    fn read32(&self, addr: usize) -> u32 {
        self.read_log.borrow_mut().push(addr);
        if let Some(queue) = self.scripted.borrow_mut().get_mut(&addr) {
            if let Some(value) = queue.pop_front() {
                return value;
            }
        }
        self.get(addr)
    }

    fn write32(&self, addr: usize, value: u32) {
        self.write_log.borrow_mut().push((addr, value));

        let stored = match self.w1c.borrow().get(&addr) {
            Some(mask) => self.get(addr) & !(value & mask),
            None => value,
        };
        let self_clearing = self.self_clearing.borrow().get(&addr).copied().unwrap_or(0);
        self.set(addr, stored & !self_clearing);
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay that accumulates requested time instead of sleeping
///
/// Clones share their counters, so a test can keep a sleeps while the driver
/// owns the delay.
#[derive(Debug, Default, Clone)]
pub struct MockDelay {
    total_ns: Rc<Cell<u64>>,
    calls: Rc<Cell<u32>>,
}

impl MockDelay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        self.total_ns.get()
    }

    /// Total microseconds that were "delayed"
    pub fn total_us(&self) -> u64 {
        self.total_ns() / 1_000
    }

    /// Number of delay requests
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    /// Reset the counters
    pub fn reset(&self) {
        self.total_ns.set(0);
        self.calls.set(0);
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns.set(self.total_ns.get() + u64::from(ns));
        self.calls.set(self.calls.get() + 1);
    }

    fn delay_us(&mut self, us: u32) {
        self.delay_ns(us.saturating_mul(1_000));
    }
}

// =============================================================================
// Mock Interrupt Controller
// =============================================================================

/// Interrupt controller recording connected and enabled lines
#[derive(Debug, Default)]
pub struct MockInterruptController {
    connected: Vec<IrqLine>,
    enabled: Vec<IrqLine>,
    init_calls: u32,
    fail_connect: bool,
}

impl MockInterruptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later `connect` fail
    pub fn fail_connect(&mut self, fail: bool) {
        self.fail_connect = fail;
    }

    pub fn connected(&self) -> &[IrqLine] {
        &self.connected
    }

    pub fn is_enabled(&self, line: IrqLine) -> bool {
        self.enabled.contains(&line)
    }

    pub fn init_calls(&self) -> u32 {
        self.init_calls
    }
}

impl InterruptController for MockInterruptController {
    fn init(&mut self) {
        self.init_calls += 1;
    }

    fn connect(&mut self, line: IrqLine) -> Result<()> {
        if self.fail_connect {
            return Err(Error::Generic);
        }
        self.connected.push(line);
        self.enabled.push(line);
        Ok(())
    }

    fn enable(&mut self, line: IrqLine) {
        if !self.enabled.contains(&line) {
            self.enabled.push(line);
        }
    }

    fn disable(&mut self, line: IrqLine) {
        self.enabled.retain(|l| *l != line);
    }
}

// =============================================================================
// Recording Callback
// =============================================================================

/// Callback counting invocations and keeping the last raw status
#[derive(Debug, Default)]
pub struct RecordingCallback {
    calls: AtomicU32,
    last: AtomicU32,
}

impl RecordingCallback {
    pub const fn new() -> Self {
        Self {
            calls: AtomicU32::new(0),
            last: AtomicU32::new(0),
        }
    }

    /// A fresh callback with `'static` lifetime, one per test
    pub fn leaked() -> &'static Self {
        Box::leak(Box::new(Self::new()))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_raw(&self) -> u32 {
        self.last.load(Ordering::SeqCst)
    }

    fn record(&self, raw: u32) {
        self.last.store(raw, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl Callback<DispatcherStatus> for RecordingCallback {
    fn call(&self, status: DispatcherStatus) {
        self.record(status.to_raw());
    }
}

impl Callback<u32> for RecordingCallback {
    fn call(&self, status: u32) {
        self.record(status);
    }
}

// =============================================================================
// Self Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::delay::DelayNs;

    #[test]
    fn mock_registers_scripted_reads_then_stored() {
        let regs = MockRegisters::new();
        regs.set(0x0, 9);
        regs.script_reads(0x0, &[1, 2]);
        assert_eq!(regs.read32(0x0), 1);
        assert_eq!(regs.read32(0x0), 2);
        assert_eq!(regs.read32(0x0), 9);
        assert_eq!(regs.reads_of(0x0), 3);
    }

    #[test]
    fn mock_registers_write_one_to_clear() {
        let regs = MockRegisters::new();
        regs.write_one_to_clear(0x0, 1 << 9);
        regs.set(0x0, (1 << 9) | 1);
        regs.write32(0x0, 1 << 9);
        assert_eq!(regs.get(0x0), 1);
        regs.write32(0x0, 1);
        assert_eq!(regs.get(0x0), 1);
    }

    #[test]
    fn mock_registers_self_clearing() {
        let regs = MockRegisters::new();
        regs.self_clearing(0x4, 1 << 4);
        regs.write32(0x4, (1 << 4) | 1);
        assert_eq!(regs.get(0x4), 1);
        assert_eq!(regs.last_write(0x4), Some((1 << 4) | 1));
    }

    #[test]
    fn mock_delay_clones_share_counters() {
        let mut delay = MockDelay::new();
        let sleeps = delay.clone();
        delay.delay_us(3);
        delay.delay_ns(500);
        assert_eq!(sleeps.calls(), 2);
        assert_eq!(sleeps.total_ns(), 3_500);
    }
}
