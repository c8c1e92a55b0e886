//! BLE provisioning scheme for ESP32 WiFi provisioning.
//!
//! This library contains the configuration lifecycle and endpoint registry a
//! provisioning manager uses to drive a BLE transport. Everything except the
//! NimBLE transport is platform-independent and tested on the host.

pub mod config;
pub mod scheme;
pub mod session;
pub mod transport;

// Re-export commonly used items
pub use config::{BleProvConfig, NameUuid, ProvSettings, ServiceUuid, DEFAULT_SERVICE_UUID};
pub use scheme::{BleScheme, ProvError, ProvScheme, WifiMode};
pub use session::ProvSession;
pub use transport::{BleTransport, HostTransport, TransportError};

#[cfg(feature = "esp32")]
pub use transport::NimbleTransport;
