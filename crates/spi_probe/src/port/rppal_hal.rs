#[cfg(feature = "pi-hardware")]
pub mod rppal_impl {
    use super::super::hal::{SpiBackend, SpiPort};
    use crate::config::{BusSettings, DeviceAddress, SpiMode};
    use crate::error::ProbeError;
    use log::{debug, info};
    use rppal::spi::{self, Bus, Mode, SlaveSelect, Spi};

    // rppal sets mode and clock while opening; configure() overrides both.
    const OPEN_CLOCK_SPEED_HZ: u32 = 1_000_000;

    /// Opens spidev character devices through rppal
    #[derive(Debug, Default)]
    pub struct RppalBackend;

    impl RppalBackend {
        pub fn new() -> Self {
            RppalBackend
        }
    }

    impl SpiBackend for RppalBackend {
        type Port = RppalSpi;

        fn open(&mut self, address: DeviceAddress) -> Result<RppalSpi, ProbeError> {
            let path = address.device_path();
            let bus = bus_for(address.bus).ok_or_else(|| {
                ProbeError::DeviceUnavailable(format!("{}: no such SPI bus", path))
            })?;
            let slave_select = slave_select_for(address.chip_select).ok_or_else(|| {
                ProbeError::DeviceUnavailable(format!("{}: no such chip select", path))
            })?;

            debug!("Opening SPI device {}", path);
            let spi = Spi::new(bus, slave_select, OPEN_CLOCK_SPEED_HZ, Mode::Mode0)
                .map_err(|e| match e {
                    spi::Error::Io(io) => ProbeError::from_open_error(&io, &path),
                    other => ProbeError::UnsupportedConfiguration(format!("{}: {}", path, other)),
                })?;
            info!("Opened SPI device {}", path);

            Ok(RppalSpi {
                spi: Some(spi),
                address,
            })
        }
    }

    /// SPI implementation using rppal
    pub struct RppalSpi {
        spi: Option<Spi>,
        address: DeviceAddress,
    }

    impl RppalSpi {
        fn spi(&self) -> Result<&Spi, ProbeError> {
            self.spi.as_ref().ok_or(ProbeError::Closed)
        }
    }

    impl SpiPort for RppalSpi {
        fn configure(&mut self, settings: &BusSettings) -> Result<(), ProbeError> {
            let spi = self.spi()?;
            spi.set_mode(mode_for(settings.mode))
                .map_err(|e| configure_error(e, "set SPI mode"))?;
            spi.set_bits_per_word(settings.bits_per_word)
                .map_err(|e| configure_error(e, "set bits per word"))?;
            spi.set_clock_speed(settings.clock_speed_hz)
                .map_err(|e| configure_error(e, "set SPI speed"))?;
            Ok(())
        }

        fn transfer(&mut self, read_buffer: &mut [u8], write_buffer: &[u8]) -> Result<(), ProbeError> {
            let spi = self.spi()?;
            let transferred = spi
                .transfer(read_buffer, write_buffer)
                .map_err(|e| ProbeError::Io(format!("SPI transfer failed: {}", e)))?;
            if transferred != write_buffer.len() {
                return Err(ProbeError::Io(format!(
                    "short SPI transfer: {} of {} bytes",
                    transferred,
                    write_buffer.len()
                )));
            }
            Ok(())
        }

        fn close(&mut self) {
            if self.spi.take().is_some() {
                debug!("Closed SPI device {}", self.address.device_path());
            }
        }
    }

    fn configure_error(err: spi::Error, context: &str) -> ProbeError {
        match err {
            spi::Error::Io(io) => ProbeError::from_configure_error(&io, context),
            other => ProbeError::UnsupportedConfiguration(format!("{}: {}", context, other)),
        }
    }

    fn mode_for(mode: SpiMode) -> Mode {
        match mode {
            SpiMode::Mode0 => Mode::Mode0,
            SpiMode::Mode1 => Mode::Mode1,
            SpiMode::Mode2 => Mode::Mode2,
            SpiMode::Mode3 => Mode::Mode3,
        }
    }

    fn bus_for(bus: u8) -> Option<Bus> {
        match bus {
            0 => Some(Bus::Spi0),
            1 => Some(Bus::Spi1),
            2 => Some(Bus::Spi2),
            3 => Some(Bus::Spi3),
            4 => Some(Bus::Spi4),
            5 => Some(Bus::Spi5),
            6 => Some(Bus::Spi6),
            _ => None,
        }
    }

    fn slave_select_for(chip_select: u8) -> Option<SlaveSelect> {
        match chip_select {
            0 => Some(SlaveSelect::Ss0),
            1 => Some(SlaveSelect::Ss1),
            2 => Some(SlaveSelect::Ss2),
            3 => Some(SlaveSelect::Ss3),
            4 => Some(SlaveSelect::Ss4),
            5 => Some(SlaveSelect::Ss5),
            6 => Some(SlaveSelect::Ss6),
            7 => Some(SlaveSelect::Ss7),
            8 => Some(SlaveSelect::Ss8),
            9 => Some(SlaveSelect::Ss9),
            10 => Some(SlaveSelect::Ss10),
            11 => Some(SlaveSelect::Ss11),
            12 => Some(SlaveSelect::Ss12),
            13 => Some(SlaveSelect::Ss13),
            14 => Some(SlaveSelect::Ss14),
            15 => Some(SlaveSelect::Ss15),
            _ => None,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn unknown_bus_is_device_unavailable() {
            let mut backend = RppalBackend::new();
            let result = backend.open(DeviceAddress::new(42, 0));
            assert!(matches!(result, Err(ProbeError::DeviceUnavailable(_))));
        }

        #[test]
        fn unknown_chip_select_is_device_unavailable() {
            let mut backend = RppalBackend::new();
            let result = backend.open(DeviceAddress::new(0, 200));
            assert!(matches!(result, Err(ProbeError::DeviceUnavailable(_))));
        }

        #[test]
        fn modes_map_one_to_one() {
            assert_eq!(mode_for(SpiMode::Mode0), Mode::Mode0);
            assert_eq!(mode_for(SpiMode::Mode3), Mode::Mode3);
        }
    }
}
