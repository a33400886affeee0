//! Scoped ownership of an acquired SPI device.
//!
//! A handle walks `Open -> Configured -> TransferComplete -> Closed`. The
//! underlying port is released when the handle is closed or dropped, so an
//! error anywhere after `open` never leaves the device acquired.

use log::{debug, warn};

use crate::config::{BusSettings, DeviceAddress};
use crate::error::ProbeError;
use crate::port::{SpiBackend, SpiPort};

/// Lifecycle state of an [`SpiHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Open,
    Configured,
    TransferComplete,
    Closed,
}

pub struct SpiHandle<P: SpiPort> {
    port: Option<P>,
    address: DeviceAddress,
    state: HandleState,
}

impl<P: SpiPort> SpiHandle<P> {
    /// Acquire exclusive access to the device at `address`.
    pub fn open<B>(backend: &mut B, address: DeviceAddress) -> Result<Self, ProbeError>
    where
        B: SpiBackend<Port = P>,
    {
        let port = backend.open(address)?;
        debug!("SPI handle {} open", address);
        Ok(SpiHandle {
            port: Some(port),
            address,
            state: HandleState::Open,
        })
    }

    pub fn address(&self) -> DeviceAddress {
        self.address
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// Set clock frequency, mode and word size.
    pub fn configure(&mut self, settings: &BusSettings) -> Result<(), ProbeError> {
        match self.state {
            HandleState::Closed => return Err(ProbeError::Closed),
            HandleState::Configured | HandleState::TransferComplete => {
                return Err(ProbeError::AlreadyConfigured)
            }
            HandleState::Open => {}
        }
        let port = self.port.as_mut().ok_or(ProbeError::Closed)?;
        port.configure(settings)?;
        debug!(
            "SPI handle {} configured: {} Hz, {:?}, {} bits per word",
            self.address, settings.clock_speed_hz, settings.mode, settings.bits_per_word
        );
        self.state = HandleState::Configured;
        Ok(())
    }

    /// Clock out `out` while capturing the same number of bytes from the peripheral.
    ///
    /// Only one transfer is allowed per handle.
    pub fn transfer_full_duplex(&mut self, out: &[u8]) -> Result<Vec<u8>, ProbeError> {
        match self.state {
            HandleState::Closed => return Err(ProbeError::Closed),
            HandleState::Open => return Err(ProbeError::NotConfigured),
            HandleState::TransferComplete => return Err(ProbeError::TransferComplete),
            HandleState::Configured => {}
        }
        let port = self.port.as_mut().ok_or(ProbeError::Closed)?;

        let mut received = vec![0u8; out.len()];
        if !out.is_empty() {
            port.transfer(&mut received, out)?;
        }
        self.state = HandleState::TransferComplete;
        Ok(received)
    }

    /// Release the device. Closing an already-closed handle does nothing.
    pub fn close(&mut self) {
        if let Some(mut port) = self.port.take() {
            port.close();
            debug!("SPI handle {} closed", self.address);
        }
        self.state = HandleState::Closed;
    }
}

impl<P: SpiPort> Drop for SpiHandle<P> {
    fn drop(&mut self) {
        if self.port.is_some() {
            warn!("SPI handle {} dropped while {:?}; releasing", self.address, self.state);
            self.close();
        }
    }
}
