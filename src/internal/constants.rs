//! Centralized Constants
//!
//! Retry budgets, poll thresholds and timing defaults shared by the msgdma
//! and Avalon I2C drivers. Register bit definitions live with their
//! register blocks in `register/`.

// =============================================================================
// msgdma Timing
// =============================================================================

/// Poll iterations allowed for writing a descriptor into a full queue
pub const DESCRIPTOR_WRITE_RETRIES: u32 = 5_000;

/// Poll iterations allowed for a synchronous completion
pub const SYNC_COMPLETION_POLLS: u32 = 5_000;

/// Poll iterations allowed for the dispatcher or prefetcher reset to finish
pub const RESET_POLLS: u32 = 10_000;

/// Sleep between msgdma polls in microseconds
pub const DMA_POLL_SLEEP_US: u32 = 1;

/// Prefetcher descriptor poll frequency used when polling is requested and
/// the hardware register is zero
pub const DEFAULT_PREFETCHER_POLL_FREQUENCY: u32 = 0xFF;

// =============================================================================
// I2C Timing
// =============================================================================

/// Poll iterations per byte for I2C FIFO and idle waits
pub const I2C_POLLS_PER_BYTE: u32 = 10_000;

/// Remaining-budget threshold below which I2C polls start sleeping
pub const I2C_SLEEP_THRESHOLD: u32 = 10;

/// Sleep between late I2C polls in microseconds
pub const I2C_POLL_SLEEP_US: u32 = 10_000;

/// Attempts made by the retrying I2C transfer wrappers
pub const I2C_TRANSFER_RETRIES: u32 = 10_000;

// =============================================================================
// I2C Bus Speed
// =============================================================================

/// Lowest supported SCL frequency
pub const I2C_SS_MIN_HZ: u32 = 1;

/// Highest standard-mode SCL frequency; fast mode is selected above it
pub const I2C_SS_MAX_HZ: u32 = 100_000;

/// Highest supported SCL frequency
pub const I2C_FS_MAX_HZ: u32 = 400_000;

/// Offset applied between SCL high and low counts
pub const I2C_DIFF_LCNT_HCNT: u32 = 60;

/// First byte pattern for 10-bit addressing
pub const I2C_TEN_BIT_ADDRESS_MASK: u32 = 0x7800;
