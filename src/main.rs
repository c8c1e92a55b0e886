//! ESP32 BLE provisioning firmware binary.

/// Device name - set via PROV_DEVICE_NAME environment variable at compile time.
#[cfg(feature = "esp32")]
const DEVICE_NAME: Option<&str> = option_env!("PROV_DEVICE_NAME");

#[cfg(feature = "esp32")]
fn main() {
    // Link ESP-IDF patches (must be first!)
    esp_idf_svc::sys::link_patches();

    use esp32_wifi_prov_ble::{BleScheme, NimbleTransport, ProvSession, ProvSettings};
    use std::sync::Arc;
    use std::time::Duration;

    // Initialize ESP-IDF logger for log crate integration
    esp_idf_svc::log::EspLogger::initialize_default();

    log::info!("=== BLE provisioning starting ===");

    let settings = match DEVICE_NAME {
        Some(name) if !name.is_empty() => ProvSettings::with_device_name(name),
        _ => ProvSettings::default(),
    };

    // Echo handler until a protocol layer is attached
    let handler = Arc::new(|endpoint: &str, request: &[u8]| {
        log::info!("{}: {} byte request", endpoint, request.len());
        request.to_vec()
    });

    let mut session = ProvSession::new(BleScheme::new(NimbleTransport::new(handler)));
    if let Err(e) = session.configure(&settings) {
        log::error!("Failed to build provisioning config: {}", e);
        return;
    }
    if let Err(e) = session.start() {
        log::error!("Failed to start provisioning: {}", e);
        return;
    }

    log::info!(
        "Advertising as {:?} (WiFi mode: {})",
        settings.device_name,
        session.wifi_mode()
    );

    loop {
        std::thread::sleep(Duration::from_secs(2));
    }
}

#[cfg(not(feature = "esp32"))]
fn main() {
    println!("This binary requires the 'esp32' feature.");
    println!("Use 'cargo run --bin prov-demo' to run the host demo.");
}
