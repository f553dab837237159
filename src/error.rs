//! Error types for the msgdma and Avalon I2C drivers
//!
//! Errors are organized in two layers:
//! - [`ConfigError`]: Initialization, configuration and registration failures
//! - [`Error`]: The transfer status taxonomy returned by every driver call
//!
//! Every [`Error`] maps to the vendor's negative status code through
//! [`Error::code`], so callers porting code that compares against numeric
//! status values can keep doing so.

use crate::driver::status::DispatcherStatus;

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and initialization errors
///
/// These errors occur during device setup, reset, or registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Device already initialized
    AlreadyInitialized,
    /// Invalid configuration parameter
    InvalidConfig,
    /// A register block required by the configuration has no base address
    MissingRegion,
    /// Dispatcher or prefetcher reset did not complete in time
    ResetFailed,
    /// Device registry has no free slot
    RegistryFull,
    /// A device with the same name is already registered
    DuplicateName,
    /// The interrupt controller refused the line
    IrqRegistration,
    /// Operation requires the descriptor prefetcher, which is not configured
    PrefetcherDisabled,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::AlreadyInitialized => "already initialized",
            ConfigError::InvalidConfig => "invalid configuration",
            ConfigError::MissingRegion => "missing register region",
            ConfigError::ResetFailed => "reset failed",
            ConfigError::RegistryFull => "device registry full",
            ConfigError::DuplicateName => "duplicate device name",
            ConfigError::IrqRegistration => "interrupt registration failed",
            ConfigError::PrefetcherDisabled => "prefetcher not configured",
        }
    }
}

// =============================================================================
// Status Taxonomy
// =============================================================================

/// Transfer status returned by driver operations.
///
/// Success is `Ok(..)`; every variant here is a failure outcome.
///
/// ```ignore
/// match dma.submit_sync(Descriptor::Standard(&desc)) {
///     Ok(()) => {}
///     Err(Error::Halted(status)) if status.stopped_on_error => { /* inspect */ }
///     Err(Error::Timeout) => { /* engine left with descriptors stopped */ }
///     Err(e) => return Err(e),
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Unspecified failure
    Generic,
    /// A bounded wait exceeded its budget
    Timeout,
    /// Malformed caller input
    BadArgument,
    /// Parameter outside the supported range
    OutOfRange,
    /// Target did not acknowledge (I2C)
    NotAcknowledged,
    /// Bus arbitration was lost (I2C)
    ArbitrationLost,
    /// Resource is busy
    Busy,
    /// Hardware descriptor queue is full
    OutOfSpace,
    /// Conflicting descriptor arguments
    PermissionDenied,
    /// Dispatcher stopped, reset or hit an error during a synchronous transfer
    Halted(DispatcherStatus),
    /// Configuration error
    Config(ConfigError),
}

impl Error {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::Generic => "error",
            Error::Timeout => "operation timed out",
            Error::BadArgument => "bad argument",
            Error::OutOfRange => "argument out of range",
            Error::NotAcknowledged => "not acknowledged",
            Error::ArbitrationLost => "arbitration lost",
            Error::Busy => "busy",
            Error::OutOfSpace => "descriptor queue full",
            Error::PermissionDenied => "illegal descriptor combination",
            Error::Halted(_) => "dispatcher halted",
            Error::Config(e) => e.as_str(),
        }
    }

    /// Vendor numeric status code.
    ///
    /// Failures are negative, except [`Error::Halted`] which carries the
    /// raw dispatcher status bits unchanged.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Error::Generic | Error::Config(_) => -1,
            Error::Timeout => -2,
            Error::BadArgument => -3,
            Error::OutOfRange => -4,
            Error::NotAcknowledged => -5,
            Error::ArbitrationLost => -6,
            Error::Busy => -7,
            Error::OutOfSpace => -28,
            Error::PermissionDenied => -13,
            Error::Halted(status) => status.to_raw() as i32,
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Halted(status) => write!(f, "dispatcher halted: {:#06x}", status.to_raw()),
            e => f.write_str(e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
        match self {
            Error::NotAcknowledged => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Unknown),
            Error::ArbitrationLost => ErrorKind::ArbitrationLoss,
            _ => ErrorKind::Other,
        }
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;

    use super::*;
    use crate::internal::register::csr::status;

    // =========================================================================
    // ConfigError Tests
    // =========================================================================

    #[test]
    fn config_error_as_str_non_empty() {
        let variants = [
            ConfigError::AlreadyInitialized,
            ConfigError::InvalidConfig,
            ConfigError::MissingRegion,
            ConfigError::ResetFailed,
            ConfigError::RegistryFull,
            ConfigError::DuplicateName,
            ConfigError::IrqRegistration,
            ConfigError::PrefetcherDisabled,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "ConfigError::{variant:?} has empty string");
        }
    }

    #[test]
    fn config_error_display() {
        assert_eq!(format!("{}", ConfigError::DuplicateName), "duplicate device name");
    }

    // =========================================================================
    // Status Code Tests
    // =========================================================================

    #[test]
    fn codes_follow_vendor_convention() {
        assert_eq!(Error::Generic.code(), -1);
        assert_eq!(Error::Timeout.code(), -2);
        assert_eq!(Error::BadArgument.code(), -3);
        assert_eq!(Error::OutOfRange.code(), -4);
        assert_eq!(Error::NotAcknowledged.code(), -5);
        assert_eq!(Error::ArbitrationLost.code(), -6);
        assert_eq!(Error::Busy.code(), -7);
    }

    #[test]
    fn failure_codes_are_negative() {
        let variants = [
            Error::Generic,
            Error::Timeout,
            Error::BadArgument,
            Error::OutOfRange,
            Error::NotAcknowledged,
            Error::ArbitrationLost,
            Error::Busy,
            Error::OutOfSpace,
            Error::PermissionDenied,
            Error::Config(ConfigError::ResetFailed),
        ];

        for variant in variants {
            assert!(variant.code() < 0, "{variant:?} has non-negative code");
        }
    }

    #[test]
    fn halted_code_is_raw_status() {
        let raw = status::STOPPED_ON_ERROR | status::STOP_STATE;
        let err = Error::Halted(DispatcherStatus::from_raw(raw));
        assert_eq!(err.code(), raw as i32);
    }

    #[test]
    fn error_from_config_error() {
        let err: Error = ConfigError::MissingRegion.into();
        assert_eq!(err, Error::Config(ConfigError::MissingRegion));
    }

    #[test]
    fn error_display() {
        assert_eq!(format!("{}", Error::OutOfSpace), "descriptor queue full");
        let display = format!("{}", Error::Config(ConfigError::ResetFailed));
        assert!(display.contains("config"));
        assert!(display.contains("reset"));
    }

    #[test]
    fn i2c_error_kinds() {
        use embedded_hal::i2c::{Error as _, ErrorKind};

        assert_eq!(Error::ArbitrationLost.kind(), ErrorKind::ArbitrationLoss);
        assert!(matches!(Error::NotAcknowledged.kind(), ErrorKind::NoAcknowledge(_)));
        assert_eq!(Error::Timeout.kind(), ErrorKind::Other);
    }
}
