//! Device property lookup used when templating a profile for a discovered
//! device. The store only consumes the trait; the platform helper that
//! talks to the Bluetooth stack lives with the daemon.

use anyhow::Result;

/// Bluetooth major device class bit for computers.
pub const COMPUTER_DEVICE_CLASS: u32 = 0x100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceProperties {
    /// Bluetooth class-of-device bits.
    pub class: u32,
    /// Human-readable device name; may be empty.
    pub name: String,
}

pub trait DeviceOracle {
    /// Looks up the properties of the device behind `address`.
    ///
    /// # Errors
    ///
    /// Returns an error when the device cannot be queried; callers fall back
    /// to empty properties.
    fn device_properties(&self, address: &str) -> Result<DeviceProperties>;
}
