use spi_probe::raw::{MockBackend, MockEvent, MockFault};
use spi_probe::{DeviceAddress, ProbeConfig, ProbeError, SpiByteProber, SpiMode};

fn run(backend: MockBackend, config: ProbeConfig) -> (Result<u8, ProbeError>, String, MockBackend) {
    let mut prober = SpiByteProber::new(backend, config);
    let mut out = Vec::new();
    let result = prober.run(&mut out);
    let backend = prober.backend().clone();
    (result, String::from_utf8(out).expect("output is utf-8"), backend)
}

#[test]
fn reads_one_byte_and_prints_two_lines() {
    let (result, output, backend) = run(MockBackend::new().with_response(&[0x42]), ProbeConfig::default());

    assert_eq!(result, Ok(0x42));
    assert_eq!(output, "Reading 1 byte from SPI...\nReceived byte: 66\n");
    assert!(!backend.is_held());
}

#[test]
fn missing_device_fails_without_output() {
    let (result, output, backend) = run(MockBackend::new().with_fault(MockFault::Missing), ProbeConfig::default());

    assert!(matches!(result, Err(ProbeError::DeviceUnavailable(_))));
    assert!(output.is_empty());
    assert!(backend.journal().is_empty());
}

#[test]
fn wrong_address_is_device_unavailable() {
    let config = ProbeConfig { bus: 1, ..Default::default() };
    let (result, output, _) = run(MockBackend::new(), config);

    assert!(matches!(result, Err(ProbeError::DeviceUnavailable(_))));
    assert!(output.is_empty());
}

#[test]
fn busy_device_is_device_unavailable() {
    let (result, _, _) = run(MockBackend::new().with_fault(MockFault::Busy), ProbeConfig::default());
    assert!(matches!(result, Err(ProbeError::DeviceUnavailable(_))));
}

#[test]
fn permission_denied_is_reported() {
    let (result, output, _) = run(
        MockBackend::new().with_fault(MockFault::PermissionDenied),
        ProbeConfig::default(),
    );
    assert!(matches!(result, Err(ProbeError::PermissionDenied(_))));
    assert!(output.is_empty());
}

#[test]
fn rejected_speed_fails_before_transfer() {
    let (result, output, backend) = run(
        MockBackend::new().with_max_clock_speed(16_000_000),
        ProbeConfig::default(),
    );

    assert!(matches!(result, Err(ProbeError::UnsupportedConfiguration(_))));
    assert!(output.is_empty());
    let journal = backend.journal();
    assert!(journal.iter().all(|e| !matches!(e, MockEvent::Transfer { .. })));
    assert_eq!(journal.last(), Some(&MockEvent::Close(DeviceAddress::new(0, 0))));
    assert!(!backend.is_held());
}

#[test]
fn rejected_mode_fails_before_transfer() {
    let config = ProbeConfig { mode: 2, ..Default::default() };
    let (result, output, backend) = run(
        MockBackend::new().with_supported_modes(&[SpiMode::Mode0]),
        config,
    );

    assert!(matches!(result, Err(ProbeError::UnsupportedConfiguration(_))));
    assert!(output.is_empty());
    assert!(!backend.is_held());
}

#[test]
fn rejected_word_size_fails_before_transfer() {
    let config = ProbeConfig { bits_per_word: 16, ..Default::default() };
    let (result, output, backend) = run(MockBackend::new().with_max_bits_per_word(8), config);

    assert!(matches!(result, Err(ProbeError::UnsupportedConfiguration(_))));
    assert!(output.is_empty());
    assert!(backend.journal().iter().all(|e| !matches!(e, MockEvent::Transfer { .. })));
    assert!(!backend.is_held());
}

#[test]
fn bus_fault_surfaces_as_io_error() {
    let (result, output, backend) = run(MockBackend::new().with_fault(MockFault::BusFault), ProbeConfig::default());

    assert!(matches!(result, Err(ProbeError::Io(_))));
    assert_eq!(output, "Reading 1 byte from SPI...\n");
    assert!(!backend.is_held());
}

#[test]
fn every_byte_value_is_reported_in_decimal() {
    for value in [0u8, 1, 0x7F, 0x80, 0xFF] {
        let (result, output, _) = run(MockBackend::new().with_response(&[value]), ProbeConfig::default());
        assert_eq!(result, Ok(value));
        assert_eq!(output.lines().nth(1), Some(format!("Received byte: {}", value).as_str()));
    }
}

#[test]
fn non_default_device_can_be_probed() {
    let address = DeviceAddress::new(1, 2);
    let config = ProbeConfig {
        bus: 1,
        chip_select: 2,
        clock_speed_hz: 1_000_000,
        mode: 3,
        ..Default::default()
    };
    let (result, _, backend) = run(MockBackend::new().with_device(address).with_response(&[9]), config);

    assert_eq!(result, Ok(9));
    assert_eq!(backend.journal().first(), Some(&MockEvent::Open(address)));
}
