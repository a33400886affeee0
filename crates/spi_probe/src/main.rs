use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use clap::Parser;
use log::info;
use spi_probe::raw::MockBackend;
use spi_probe::{load_config, ProbeConfig, ProbeError, SpiByteProber};

#[derive(Parser, Debug)]
#[command(author, version, about = "Read one byte from an SPI device", long_about = None)]
struct Args {
    /// JSON configuration file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// SPI bus number
    #[arg(long)]
    bus: Option<u8>,

    /// Chip select on the bus
    #[arg(long)]
    chip_select: Option<u8>,

    /// Clock speed in Hz
    #[arg(long)]
    speed: Option<u32>,

    /// SPI mode (0-3)
    #[arg(long)]
    mode: Option<u8>,

    #[arg(long)]
    bits_per_word: Option<u8>,

    /// Byte clocked out during the read (decimal or 0x-prefixed hex)
    #[arg(long, value_parser = parse_byte)]
    dummy_byte: Option<u8>,

    /// Run against a simulated device that answers with this byte
    #[arg(long, value_parser = parse_byte)]
    mock: Option<u8>,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse::<u8>(),
    };
    parsed.map_err(|e| format!("invalid byte '{}': {}", s, e))
}

impl Args {
    fn probe_config(&self) -> Result<ProbeConfig, ProbeError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ProbeConfig::default(),
        };
        if let Some(bus) = self.bus {
            config.bus = bus;
        }
        if let Some(chip_select) = self.chip_select {
            config.chip_select = chip_select;
        }
        if let Some(speed) = self.speed {
            config.clock_speed_hz = speed;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(bits) = self.bits_per_word {
            config.bits_per_word = bits;
        }
        if let Some(dummy) = self.dummy_byte {
            config.dummy_byte = dummy;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let args = Args::parse();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(&args, &mut out)?;
    out.flush()?;
    Ok(())
}

fn run<W: Write>(args: &Args, out: &mut W) -> Result<(), ProbeError> {
    let config = args.probe_config()?;
    match args.mock {
        Some(byte) => {
            info!("Using mock SPI device answering 0x{:02X}", byte);
            let backend = MockBackend::new()
                .with_device(config.address())
                .with_response(&[byte]);
            SpiByteProber::new(backend, config).run(out)?;
            Ok(())
        }
        None => run_hardware(config, out),
    }
}

#[cfg(feature = "pi-hardware")]
fn run_hardware<W: Write>(config: ProbeConfig, out: &mut W) -> Result<(), ProbeError> {
    use spi_probe::raw::RppalBackend;

    SpiByteProber::new(RppalBackend::new(), config).run(out)?;
    Ok(())
}

#[cfg(not(feature = "pi-hardware"))]
fn run_hardware<W: Write>(config: ProbeConfig, _out: &mut W) -> Result<(), ProbeError> {
    Err(ProbeError::DeviceUnavailable(format!(
        "{}: built without the pi-hardware feature; use --mock",
        config.address().device_path()
    )))
}
