//! Host provisioning demo.
//!
//! Runs a full provisioning session lifecycle against the host transport and
//! prints what the device would advertise.
//!
//! # Usage
//!
//! ```bash
//! PROV_DEVICE_NAME="PROV_KITCHEN" cargo run --bin prov-demo
//! PROV_SETTINGS=prov.json cargo run --bin prov-demo
//! ```

use esp32_wifi_prov_ble::{BleScheme, HostTransport, ProvSession, ProvSettings};
use log::{error, info};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("=== BLE provisioning demo ===");

    let settings = match ProvSettings::from_env() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load settings: {}", e);
            std::process::exit(1);
        }
    };

    let mut session = ProvSession::new(BleScheme::new(HostTransport::new()));
    if let Err(e) = session.configure(&settings) {
        error!("Failed to build provisioning config: {}", e);
        std::process::exit(1);
    }
    if let Err(e) = session.start() {
        error!("Failed to start provisioning: {}", e);
        std::process::exit(1);
    }

    if let Some(service) = session.scheme().transport().advertised() {
        println!("Device name:  {}", service.device_name);
        println!("Service UUID: {}", service.service_uuid);
        println!("WiFi mode:    {}", session.wifi_mode());
        for characteristic in &service.characteristics {
            println!("  {:<14} {}", characteristic.name, characteristic.uuid);
        }
    }

    if let Err(e) = session.finish() {
        error!("Failed to stop provisioning: {}", e);
        std::process::exit(1);
    }
}
