//! Interrupt controller seam
//!
//! The drivers never install vectors themselves. [`InterruptController`]
//! connects and unmasks a line once at device init; the application's vector
//! (or its HAL's handler macro) then calls the device's `on_interrupt`.

use crate::error::{ConfigError, Result};

/// An interrupt line on a specific controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqLine {
    /// Interrupt controller identifier
    pub controller: u32,
    /// Line number on that controller
    pub line: u32,
}

impl IrqLine {
    /// Line `line` on controller `controller`
    pub const fn new(controller: u32, line: u32) -> Self {
        Self { controller, line }
    }
}

/// Platform interrupt controller.
pub trait InterruptController {
    /// SoC-specific controller bring-up
    fn init(&mut self) {}

    /// Route `line` to the device's handler and unmask it
    fn connect(&mut self, line: IrqLine) -> Result<()>;

    /// Unmask a line
    fn enable(&mut self, line: IrqLine);

    /// Mask a line
    fn disable(&mut self, line: IrqLine);
}

/// Controller for systems that poll only or wire vectors statically.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoController;

impl InterruptController for NoController {
    fn connect(&mut self, _line: IrqLine) -> Result<()> {
        Ok(())
    }

    fn enable(&mut self, _line: IrqLine) {}

    fn disable(&mut self, _line: IrqLine) {}
}

/// Architecture interrupt-controller init hook.
///
/// Delegates to the SoC controller when one is configured, otherwise does
/// nothing.
pub fn init_interrupt_controller<C: InterruptController>(controller: Option<&mut C>) {
    if let Some(controller) = controller {
        #[cfg(feature = "defmt")]
        defmt::debug!("initializing interrupt controller");
        controller.init();
    }
}

/// Connect `line`, mapping any controller failure to a registration error
pub(crate) fn connect_line<C: InterruptController>(controller: &mut C, line: IrqLine) -> Result<()> {
    controller
        .connect(line)
        .map_err(|_| ConfigError::IrqRegistration.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::MockInterruptController;

    #[test]
    fn init_hook_delegates_when_configured() {
        let mut ctrl = MockInterruptController::new();
        init_interrupt_controller(Some(&mut ctrl));
        assert_eq!(ctrl.init_calls(), 1);
    }

    #[test]
    fn init_hook_without_controller_is_noop() {
        init_interrupt_controller::<MockInterruptController>(None);
    }

    #[test]
    fn connect_failure_maps_to_registration_error() {
        let mut ctrl = MockInterruptController::new();
        ctrl.fail_connect(true);
        let result = connect_line(&mut ctrl, IrqLine::new(0, 3));
        assert_eq!(result, Err(Error::Config(ConfigError::IrqRegistration)));
    }

    #[test]
    fn no_controller_accepts_any_line() {
        let mut ctrl = NoController;
        assert!(ctrl.connect(IrqLine::new(1, 31)).is_ok());
    }
}
