pub mod hal;
pub mod mock_hal;
pub mod rppal_hal;

pub use self::hal::{SpiBackend, SpiPort};
pub use self::mock_hal::mock_impl::{MockBackend, MockEvent, MockFault, MockSpi};
#[cfg(feature = "pi-hardware")]
pub use self::rppal_hal::rppal_impl::{RppalBackend, RppalSpi};
