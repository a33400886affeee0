//! Probe configuration: which device to open and how to clock it.

use std::fmt;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::ProbeError;

/// Location of an SPI device node, `/dev/spidev<bus>.<chip_select>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceAddress {
    pub bus: u8,
    pub chip_select: u8,
}

impl DeviceAddress {
    pub fn new(bus: u8, chip_select: u8) -> Self {
        Self { bus, chip_select }
    }

    /// Path of the spidev character device for this address.
    pub fn device_path(&self) -> String {
        format!("/dev/spidev{}", self)
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.bus, self.chip_select)
    }
}

/// SPI clock polarity/phase combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpiMode {
    /// CPOL=0, CPHA=0
    Mode0,
    /// CPOL=0, CPHA=1
    Mode1,
    /// CPOL=1, CPHA=0
    Mode2,
    /// CPOL=1, CPHA=1
    Mode3,
}

impl SpiMode {
    /// Clock idles high when true.
    pub fn polarity(&self) -> bool {
        matches!(self, SpiMode::Mode2 | SpiMode::Mode3)
    }

    /// Data sampled on the trailing clock edge when true.
    pub fn phase(&self) -> bool {
        matches!(self, SpiMode::Mode1 | SpiMode::Mode3)
    }
}

impl TryFrom<u8> for SpiMode {
    type Error = ProbeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SpiMode::Mode0),
            1 => Ok(SpiMode::Mode1),
            2 => Ok(SpiMode::Mode2),
            3 => Ok(SpiMode::Mode3),
            other => Err(ProbeError::UnsupportedConfiguration(format!(
                "SPI mode {} (expected 0-3)",
                other
            ))),
        }
    }
}

impl From<SpiMode> for u8 {
    fn from(mode: SpiMode) -> u8 {
        match mode {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        }
    }
}

/// Validated settings handed to a port's `configure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusSettings {
    pub clock_speed_hz: u32,
    pub mode: SpiMode,
    pub bits_per_word: u8,
}

impl BusSettings {
    /// Validate raw settings. Zero clock speeds and zero-width words are
    /// rejected here; everything else is left for the driver to judge.
    pub fn new(clock_speed_hz: u32, mode: u8, bits_per_word: u8) -> Result<Self, ProbeError> {
        let mode = SpiMode::try_from(mode)?;
        if clock_speed_hz == 0 {
            return Err(ProbeError::UnsupportedConfiguration(
                "clock speed must be non-zero".to_string(),
            ));
        }
        if bits_per_word == 0 {
            return Err(ProbeError::UnsupportedConfiguration(
                "bits per word must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            clock_speed_hz,
            mode,
            bits_per_word,
        })
    }
}

/// Configuration for a single probe run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProbeConfig {
    /// SPI bus number
    #[serde(default = "default_bus")]
    pub bus: u8,
    /// SPI chip select on that bus
    #[serde(default = "default_chip_select")]
    pub chip_select: u8,
    /// Clock frequency in Hz
    #[serde(default = "default_clock_speed_hz")]
    pub clock_speed_hz: u32,
    /// SPI mode (0-3)
    #[serde(default = "default_mode")]
    pub mode: u8,
    #[serde(default = "default_bits_per_word")]
    pub bits_per_word: u8,
    /// Byte clocked out to trigger the peripheral's reply
    #[serde(default = "default_dummy_byte")]
    pub dummy_byte: u8,
}

fn default_bus() -> u8 { 0 }
fn default_chip_select() -> u8 { 0 }
fn default_clock_speed_hz() -> u32 { 32_000_000 }
fn default_mode() -> u8 { 0 }
fn default_bits_per_word() -> u8 { 8 }
fn default_dummy_byte() -> u8 { 0x00 }

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            bus: default_bus(),
            chip_select: default_chip_select(),
            clock_speed_hz: default_clock_speed_hz(),
            mode: default_mode(),
            bits_per_word: default_bits_per_word(),
            dummy_byte: default_dummy_byte(),
        }
    }
}

impl ProbeConfig {
    pub fn address(&self) -> DeviceAddress {
        DeviceAddress::new(self.bus, self.chip_select)
    }

    pub fn bus_settings(&self) -> Result<BusSettings, ProbeError> {
        BusSettings::new(self.clock_speed_hz, self.mode, self.bits_per_word)
    }
}

/// Load a probe configuration from a JSON file. Missing fields take their defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ProbeConfig, ProbeError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        ProbeError::Config(format!(
            "could not read configuration file '{}': {}",
            path.display(),
            e
        ))
    })?;

    let config: ProbeConfig = serde_json::from_str(&contents).map_err(|e| {
        ProbeError::Config(format!(
            "could not parse configuration file '{}': {}",
            path.display(),
            e
        ))
    })?;

    info!("Loaded configuration from {}", path.display());
    Ok(config)
}
