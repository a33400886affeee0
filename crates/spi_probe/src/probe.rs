//! One-shot SPI byte probe: clock out a dummy byte, report what comes back.

use std::io::Write;

use log::{error, info};

use crate::config::ProbeConfig;
use crate::error::ProbeError;
use crate::handle::SpiHandle;
use crate::port::SpiBackend;

pub const PROGRESS_MESSAGE: &str = "Reading 1 byte from SPI...";

/// Reads a single byte from the configured device.
pub struct SpiByteProber<B: SpiBackend> {
    backend: B,
    config: ProbeConfig,
}

impl<B: SpiBackend> SpiByteProber<B> {
    pub fn new(backend: B, config: ProbeConfig) -> Self {
        Self { backend, config }
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run the probe, writing the progress and result lines to `out`.
    ///
    /// Nothing is written if the device cannot be opened or configured. The
    /// device is released on every exit path.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<u8, ProbeError> {
        self.probe(out).map_err(|e| {
            error!("SPI probe on {} failed: {}", self.config.address().device_path(), e);
            e
        })
    }

    fn probe<W: Write>(&mut self, out: &mut W) -> Result<u8, ProbeError> {
        let settings = self.config.bus_settings()?;
        let mut handle = SpiHandle::open(&mut self.backend, self.config.address())?;
        handle.configure(&settings)?;
        info!(
            "Probing {} at {} Hz, mode {}",
            handle.address().device_path(),
            settings.clock_speed_hz,
            u8::from(settings.mode)
        );

        writeln!(out, "{}", PROGRESS_MESSAGE)?;
        let received = handle.transfer_full_duplex(&[self.config.dummy_byte])?;
        let byte = received.first().copied().ok_or_else(|| {
            ProbeError::Io("transfer returned no data".to_string())
        })?;
        writeln!(out, "Received byte: {}", byte)?;

        handle.close();
        Ok(byte)
    }
}
