pub mod mock_impl {
    use super::super::hal::{SpiBackend, SpiPort};
    use crate::config::{BusSettings, DeviceAddress, SpiMode};
    use crate::error::ProbeError;
    use log::debug;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex};

    /// Operation observed by a mock port, in call order.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum MockEvent {
        Open(DeviceAddress),
        Configure(BusSettings),
        Transfer { written: Vec<u8>, read: Vec<u8> },
        Close(DeviceAddress),
    }

    /// Failure the mock injects instead of behaving like a healthy device.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MockFault {
        /// The device node does not exist
        Missing,
        /// Another process holds the node exclusively
        Busy,
        PermissionDenied,
        /// Every transfer fails as if the bus timed out
        BusFault,
    }

    type Journal = Arc<Mutex<Vec<MockEvent>>>;

    fn record(journal: &Journal, event: MockEvent) {
        if let Ok(mut events) = journal.lock() {
            events.push(event);
        }
    }

    /// In-memory stand-in for the spidev driver exposing a single device node
    #[derive(Debug, Clone)]
    pub struct MockBackend {
        address: DeviceAddress,
        response: Vec<u8>,
        fault: Option<MockFault>,
        max_clock_speed_hz: u32,
        supported_modes: Vec<SpiMode>,
        max_bits_per_word: u8,
        held: Arc<AtomicBool>,
        journal: Journal,
    }

    impl Default for MockBackend {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockBackend {
        /// Device at 0.0 answering every clocked byte with 0x00
        pub fn new() -> Self {
            MockBackend {
                address: DeviceAddress::new(0, 0),
                response: vec![0x00],
                fault: None,
                max_clock_speed_hz: 125_000_000,
                supported_modes: vec![SpiMode::Mode0, SpiMode::Mode1, SpiMode::Mode2, SpiMode::Mode3],
                max_bits_per_word: 32,
                held: Arc::new(AtomicBool::new(false)),
                journal: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn with_device(mut self, address: DeviceAddress) -> Self {
            self.address = address;
            self
        }

        /// Bytes the peripheral shifts back, repeated as needed
        pub fn with_response(mut self, response: &[u8]) -> Self {
            self.response = response.to_vec();
            self
        }

        pub fn with_fault(mut self, fault: MockFault) -> Self {
            self.fault = Some(fault);
            self
        }

        pub fn with_max_clock_speed(mut self, hz: u32) -> Self {
            self.max_clock_speed_hz = hz;
            self
        }

        pub fn with_supported_modes(mut self, modes: &[SpiMode]) -> Self {
            self.supported_modes = modes.to_vec();
            self
        }

        pub fn with_max_bits_per_word(mut self, bits: u8) -> Self {
            self.max_bits_per_word = bits;
            self
        }

        /// Everything observed so far, across all ports opened from this backend
        pub fn journal(&self) -> Vec<MockEvent> {
            self.journal.lock().map(|events| events.clone()).unwrap_or_default()
        }

        /// Whether a port opened from this backend is still holding the device
        pub fn is_held(&self) -> bool {
            self.held.load(Ordering::SeqCst)
        }
    }

    impl SpiBackend for MockBackend {
        type Port = MockSpi;

        fn open(&mut self, address: DeviceAddress) -> Result<MockSpi, ProbeError> {
            let path = address.device_path();
            match self.fault {
                Some(MockFault::Missing) => {
                    return Err(ProbeError::DeviceUnavailable(format!("{}: No such file or directory", path)))
                }
                Some(MockFault::Busy) => {
                    return Err(ProbeError::DeviceUnavailable(format!("{}: Device or resource busy", path)))
                }
                Some(MockFault::PermissionDenied) => {
                    return Err(ProbeError::PermissionDenied(format!("{}: Permission denied", path)))
                }
                _ => {}
            }
            if address != self.address {
                return Err(ProbeError::DeviceUnavailable(format!("{}: No such file or directory", path)));
            }
            if self.held.swap(true, Ordering::SeqCst) {
                return Err(ProbeError::DeviceUnavailable(format!("{}: Device or resource busy", path)));
            }

            debug!("Opened mock SPI device {}", path);
            record(&self.journal, MockEvent::Open(address));
            Ok(MockSpi {
                address,
                response: self.response.clone(),
                position: 0,
                bus_fault: self.fault == Some(MockFault::BusFault),
                max_clock_speed_hz: self.max_clock_speed_hz,
                supported_modes: self.supported_modes.clone(),
                max_bits_per_word: self.max_bits_per_word,
                held: Some(self.held.clone()),
                journal: self.journal.clone(),
            })
        }
    }

    /// Mock implementation of SPI port
    pub struct MockSpi {
        address: DeviceAddress,
        response: Vec<u8>,
        position: usize,
        bus_fault: bool,
        max_clock_speed_hz: u32,
        supported_modes: Vec<SpiMode>,
        max_bits_per_word: u8,
        held: Option<Arc<AtomicBool>>,
        journal: Journal,
    }

    impl MockSpi {
        fn release(&mut self) -> bool {
            match self.held.take() {
                Some(held) => {
                    held.store(false, Ordering::SeqCst);
                    true
                }
                None => false,
            }
        }

        fn next_byte(&mut self) -> u8 {
            if self.response.is_empty() {
                return 0;
            }
            let byte = self.response[self.position % self.response.len()];
            self.position += 1;
            byte
        }
    }

    impl SpiPort for MockSpi {
        fn configure(&mut self, settings: &BusSettings) -> Result<(), ProbeError> {
            if self.held.is_none() {
                return Err(ProbeError::Closed);
            }
            if !self.supported_modes.contains(&settings.mode) {
                return Err(ProbeError::UnsupportedConfiguration(format!(
                    "set SPI mode: {:?} not supported",
                    settings.mode
                )));
            }
            if settings.bits_per_word > self.max_bits_per_word {
                return Err(ProbeError::UnsupportedConfiguration(format!(
                    "set bits per word: {} not supported",
                    settings.bits_per_word
                )));
            }
            if settings.clock_speed_hz > self.max_clock_speed_hz {
                return Err(ProbeError::UnsupportedConfiguration(format!(
                    "set SPI speed: {} Hz exceeds {} Hz",
                    settings.clock_speed_hz, self.max_clock_speed_hz
                )));
            }
            record(&self.journal, MockEvent::Configure(*settings));
            Ok(())
        }

        fn transfer(&mut self, read_buffer: &mut [u8], write_buffer: &[u8]) -> Result<(), ProbeError> {
            if self.held.is_none() {
                return Err(ProbeError::Closed);
            }
            if self.bus_fault {
                return Err(ProbeError::Io("SPI transfer failed: Connection timed out".to_string()));
            }
            for slot in read_buffer.iter_mut() {
                *slot = self.next_byte();
            }
            record(
                &self.journal,
                MockEvent::Transfer {
                    written: write_buffer.to_vec(),
                    read: read_buffer.to_vec(),
                },
            );
            Ok(())
        }

        fn close(&mut self) {
            if self.release() {
                debug!("Closed mock SPI device {}", self.address.device_path());
                record(&self.journal, MockEvent::Close(self.address));
            }
        }
    }

    impl Drop for MockSpi {
        fn drop(&mut self) {
            self.release();
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn settings() -> BusSettings {
            BusSettings::new(32_000_000, 0, 8).unwrap()
        }

        #[test]
        fn test_device_is_exclusive_until_closed() {
            let mut backend = MockBackend::new();
            let mut first = backend.open(DeviceAddress::new(0, 0)).unwrap();
            assert!(matches!(
                backend.open(DeviceAddress::new(0, 0)),
                Err(ProbeError::DeviceUnavailable(_))
            ));

            first.close();
            assert!(!backend.is_held());
            assert!(backend.open(DeviceAddress::new(0, 0)).is_ok());
        }

        #[test]
        fn test_dropping_port_releases_device() {
            let mut backend = MockBackend::new();
            {
                let _port = backend.open(DeviceAddress::new(0, 0)).unwrap();
                assert!(backend.is_held());
            }
            assert!(!backend.is_held());
        }

        #[test]
        fn test_response_bytes_cycle() {
            let mut backend = MockBackend::new().with_response(&[1, 2]);
            let mut port = backend.open(DeviceAddress::new(0, 0)).unwrap();
            port.configure(&settings()).unwrap();

            let mut read = [0u8; 3];
            port.transfer(&mut read, &[0, 0, 0]).unwrap();
            assert_eq!(read, [1, 2, 1]);
        }

        #[test]
        fn test_speed_above_limit_rejected() {
            let mut backend = MockBackend::new().with_max_clock_speed(16_000_000);
            let mut port = backend.open(DeviceAddress::new(0, 0)).unwrap();
            assert!(matches!(
                port.configure(&settings()),
                Err(ProbeError::UnsupportedConfiguration(_))
            ));
        }

        #[test]
        fn test_closed_port_refuses_transfer() {
            let mut backend = MockBackend::new();
            let mut port = backend.open(DeviceAddress::new(0, 0)).unwrap();
            port.close();
            let mut read = [0u8; 1];
            assert_eq!(port.transfer(&mut read, &[0]), Err(ProbeError::Closed));
        }

        #[test]
        fn test_close_recorded_once() {
            let mut backend = MockBackend::new();
            let mut port = backend.open(DeviceAddress::new(0, 0)).unwrap();
            port.close();
            port.close();
            let closes = backend
                .journal()
                .iter()
                .filter(|e| matches!(e, MockEvent::Close(_)))
                .count();
            assert_eq!(closes, 1);
        }
    }
}
