//! Provisioning configuration.
//!
//! # Components
//!
//! - [`ble`] - BLE scheme configuration and endpoint registry (host-testable)
//! - [`uuid`] - 128-bit service UUIDs
//! - [`settings`] - serde-backed settings loaded from JSON or the environment

mod ble;
mod settings;
mod uuid;

pub use ble::{BleProvConfig, DeviceName, NameUuid, ENDPOINT_SLOT_SIZE, MAX_BLE_DEVNAME_LEN};
pub use settings::{
    EndpointSetting, ProvSettings, SettingsError, DEFAULT_DEVICE_NAME, DEFAULT_ENDPOINTS,
    ENV_DEVICE_NAME, ENV_SETTINGS_PATH,
};
pub use uuid::{ServiceUuid, UuidParseError, DEFAULT_SERVICE_UUID, UUID_LEN};
