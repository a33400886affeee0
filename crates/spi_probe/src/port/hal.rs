use crate::config::{BusSettings, DeviceAddress};
use crate::error::ProbeError;

/// Kernel-side SPI device that has been acquired for exclusive use.
pub trait SpiPort {
    /// Apply clock speed, mode and word size to the open device
    fn configure(&mut self, settings: &BusSettings) -> Result<(), ProbeError>;

    /// Transfer data over SPI (simultaneous read/write)
    ///
    /// `read_buffer` and `write_buffer` have the same length.
    fn transfer(&mut self, read_buffer: &mut [u8], write_buffer: &[u8]) -> Result<(), ProbeError>;

    /// Release the device. Called exactly once per port.
    fn close(&mut self) {}
}

/// Source of SPI ports, one per device node.
pub trait SpiBackend {
    type Port: SpiPort;

    /// Acquire the device at `address`
    fn open(&mut self, address: DeviceAddress) -> Result<Self::Port, ProbeError>;
}
