//! Name-keyed device registry
//!
//! Each driver's `init` registers the device here and `open` looks it up by
//! name later. The registry is an ordinary value owned by the application
//! (typically one per driver type, created before the first `init`), so
//! there is no hidden global list.

use crate::error::{ConfigError, Error, Result};

/// A device that can be looked up by name.
pub trait Named {
    /// Device instance name
    fn name(&self) -> &str;
}

/// Fixed-capacity registry of `N` device references.
pub struct DeviceRegistry<'d, T, const N: usize> {
    entries: [Option<&'d T>; N],
    len: usize,
}

impl<'d, T: Named, const N: usize> DeviceRegistry<'d, T, N> {
    /// Create an empty registry (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            entries: [None; N],
            len: 0,
        }
    }

    /// Number of registered devices
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Check if no device is registered
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Add a device.
    ///
    /// Fails with [`ConfigError::DuplicateName`] if the name is taken and
    /// [`ConfigError::RegistryFull`] if all slots are used.
    pub fn register(&mut self, device: &'d T) -> Result<()> {
        self.check_available(device.name())?;
        self.entries[self.len] = Some(device);
        self.len += 1;
        Ok(())
    }

    /// Check that a device called `name` could be registered now.
    ///
    /// Same errors as [`register`](Self::register), without adding anything.
    pub fn check_available(&self, name: &str) -> Result<()> {
        if self.find_by_name(name).is_some() {
            return Err(ConfigError::DuplicateName.into());
        }
        if self.len >= N {
            return Err(ConfigError::RegistryFull.into());
        }
        Ok(())
    }

    /// Look up a device by name
    pub fn find_by_name(&self, name: &str) -> Option<&'d T> {
        self.iter().find(|dev| dev.name() == name)
    }

    /// Open a device by name, failing with [`Error::BadArgument`] if absent
    pub fn open(&self, name: &str) -> Result<&'d T> {
        self.find_by_name(name).ok_or(Error::BadArgument)
    }

    /// Iterate over registered devices in registration order
    pub fn iter(&self) -> impl Iterator<Item = &'d T> + '_ {
        self.entries[..self.len].iter().filter_map(|entry| *entry)
    }
}

impl<T: Named, const N: usize> Default for DeviceRegistry<'_, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Dev(&'static str);

    impl Named for Dev {
        fn name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn register_and_find() {
        let a = Dev("/dev/msgdma_0");
        let b = Dev("/dev/msgdma_1");
        let mut registry: DeviceRegistry<'_, Dev, 4> = DeviceRegistry::new();

        registry.register(&a).unwrap();
        registry.register(&b).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(core::ptr::eq(registry.find_by_name("/dev/msgdma_1").unwrap(), &b));
        assert!(registry.find_by_name("/dev/msgdma_2").is_none());
    }

    #[test]
    fn open_missing_is_bad_argument() {
        let registry: DeviceRegistry<'_, Dev, 1> = DeviceRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.open("i2c_0").err(), Some(Error::BadArgument));
    }

    #[test]
    fn duplicate_name_rejected() {
        let a = Dev("dma");
        let b = Dev("dma");
        let mut registry: DeviceRegistry<'_, Dev, 4> = DeviceRegistry::new();
        registry.register(&a).unwrap();
        assert_eq!(
            registry.register(&b),
            Err(Error::Config(ConfigError::DuplicateName))
        );
    }

    #[test]
    fn full_registry_rejected() {
        let a = Dev("a");
        let b = Dev("b");
        let mut registry: DeviceRegistry<'_, Dev, 1> = DeviceRegistry::new();
        registry.register(&a).unwrap();
        assert_eq!(
            registry.register(&b),
            Err(Error::Config(ConfigError::RegistryFull))
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn check_available_leaves_registry_unchanged() {
        let a = Dev("a");
        let mut registry: DeviceRegistry<'_, Dev, 2> = DeviceRegistry::new();
        assert_eq!(registry.check_available("a"), Ok(()));
        assert!(registry.is_empty());

        registry.register(&a).unwrap();
        assert_eq!(
            registry.check_available("a"),
            Err(Error::Config(ConfigError::DuplicateName))
        );
        assert_eq!(registry.check_available("b"), Ok(()));

        let full: DeviceRegistry<'_, Dev, 0> = DeviceRegistry::new();
        assert_eq!(
            full.check_available("a"),
            Err(Error::Config(ConfigError::RegistryFull))
        );
    }
}
