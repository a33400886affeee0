pub mod config;
pub mod error;
pub mod handle;
pub mod port;
pub mod probe;

// Re-export the main types that users need
pub use config::{load_config, BusSettings, DeviceAddress, ProbeConfig, SpiMode};
pub use error::ProbeError;
pub use handle::{HandleState, SpiHandle};
pub use probe::{SpiByteProber, PROGRESS_MESSAGE};

// Optionally expose lower-level access through a raw module
pub mod raw {
    pub use crate::port::*;
}
