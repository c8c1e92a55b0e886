//! BLE transport abstraction.
//!
//! The transport is what actually runs a provisioning session on the radio:
//! it advertises the device name and service UUID and exposes one GATT
//! characteristic per endpoint. It works on:
//! - **ESP32** (`esp32` feature): [`NimbleTransport`] on the NimBLE stack
//! - **Host**: [`HostTransport`], which records what it would advertise
//!
//! Both read the finished [`BleProvConfig`] once in `start` and copy what
//! they need; later changes to the configuration are not observed.
//!
//! The GATT service is registered with the stack on the first `start` and
//! stays registered for the life of the transport. `stop` only halts
//! advertising, so a later `start` must serve the same service; a different
//! one is refused.
//!
//! Legacy advertising packets carry at most [`LEGACY_ADV_PAYLOAD_LEN`] bytes.
//! The service UUID goes in the advertisement and the device name in the
//! scan response, so both fit even with a maximum-length name.

mod host;
#[cfg(feature = "esp32")]
mod nimble;

pub use host::HostTransport;
#[cfg(feature = "esp32")]
pub use nimble::{NimbleTransport, RequestHandler};

use crate::config::{BleProvConfig, ServiceUuid, UUID_LEN};
use std::fmt;

/// Payload bytes in one legacy advertising or scan response packet.
pub const LEGACY_ADV_PAYLOAD_LEN: usize = 31;

/// Length and type bytes that prefix every advertising data structure.
const AD_HEADER_LEN: usize = 2;

/// Flags structure: header plus one flags byte.
const AD_FLAGS_LEN: usize = AD_HEADER_LEN + 1;

/// A BLE service that serves a provisioning configuration.
pub trait BleTransport {
    /// Start advertising and serving `config`.
    fn start(&mut self, config: &BleProvConfig) -> Result<(), TransportError>;

    /// Stop a running session.
    fn stop(&mut self) -> Result<(), TransportError>;

    /// Check if a session is running.
    fn is_running(&self) -> bool;
}

/// One GATT characteristic backing an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Characteristic {
    /// Endpoint name, reported in the characteristic's user description.
    pub name: String,
    /// Full 128-bit characteristic UUID.
    pub uuid: ServiceUuid,
}

/// What a transport advertises for one session.
///
/// Built from a configuration at start time; this is the transport's own
/// copy and does not borrow the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisedService {
    pub device_name: String,
    pub service_uuid: ServiceUuid,
    /// Characteristics in endpoint registration order.
    pub characteristics: Vec<Characteristic>,
}

impl AdvertisedService {
    pub fn from_config(config: &BleProvConfig) -> Self {
        Self {
            device_name: config.device_name().to_string(),
            service_uuid: *config.service_uuid(),
            characteristics: config
                .endpoints()
                .iter()
                .map(|ep| Characteristic {
                    name: ep.name.clone(),
                    uuid: config.characteristic_uuid(ep.uuid),
                })
                .collect(),
        }
    }

    /// Bytes of advertising data: flags plus the complete 128-bit service
    /// UUID list.
    pub fn advertisement_len(&self) -> usize {
        AD_FLAGS_LEN + AD_HEADER_LEN + UUID_LEN
    }

    /// Bytes of scan response data: the complete local name.
    pub fn scan_response_len(&self) -> usize {
        AD_HEADER_LEN + self.device_name.len()
    }

    /// Check that advertisement and scan response each fit a legacy packet.
    pub fn check_payload_len(&self) -> Result<(), TransportError> {
        for (what, len) in [
            ("advertisement", self.advertisement_len()),
            ("scan response", self.scan_response_len()),
        ] {
            if len > LEGACY_ADV_PAYLOAD_LEN {
                return Err(TransportError::Ble(format!(
                    "{} is {} bytes, limit {}",
                    what, len, LEGACY_ADV_PAYLOAD_LEN
                )));
            }
        }
        Ok(())
    }

    /// Characteristic for the first endpoint named `name`.
    pub fn characteristic(&self, name: &str) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.name == name)
    }
}

/// Errors from the BLE transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The BLE stack reported an error.
    Ble(String),
    /// `start` called while a session is running.
    AlreadyRunning,
    /// `stop` called without a running session.
    NotRunning,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ble(msg) => write!(f, "BLE error: {}", msg),
            Self::AlreadyRunning => write!(f, "transport already running"),
            Self::NotRunning => write!(f, "transport not running"),
        }
    }
}

impl std::error::Error for TransportError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_BLE_DEVNAME_LEN;

    #[test]
    fn test_advertised_service_from_config() {
        let mut config = BleProvConfig::new();
        config.set_device_name("PROV_AB");
        config.add_endpoint("prov-session", 0xff51).unwrap();
        config.add_endpoint("proto-ver", 0xff53).unwrap();

        let service = AdvertisedService::from_config(&config);
        assert_eq!(service.device_name, "PROV_AB");
        assert_eq!(service.service_uuid, *config.service_uuid());
        assert_eq!(service.characteristics.len(), 2);
        assert_eq!(
            service
                .characteristic("proto-ver")
                .unwrap()
                .uuid
                .to_string(),
            "0000ff53-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_advertised_service_is_a_copy() {
        let mut config = BleProvConfig::new();
        config.add_endpoint("prov-session", 0xff51).unwrap();
        let service = AdvertisedService::from_config(&config);

        config.add_endpoint("prov-config", 0xff52).unwrap();
        config.set_device_name("changed");

        assert_eq!(service.characteristics.len(), 1);
        assert_eq!(service.device_name, "");
    }

    #[test]
    fn test_max_length_name_fits_scan_response() {
        let mut config = BleProvConfig::new();
        config.set_device_name(&"N".repeat(MAX_BLE_DEVNAME_LEN));
        let service = AdvertisedService::from_config(&config);

        assert_eq!(service.advertisement_len(), 21);
        assert_eq!(service.scan_response_len(), LEGACY_ADV_PAYLOAD_LEN);
        assert!(service.check_payload_len().is_ok());
        // Name and UUID together would not fit one packet.
        assert!(service.advertisement_len() + service.scan_response_len() > LEGACY_ADV_PAYLOAD_LEN);
    }

    #[test]
    fn test_oversized_scan_response_rejected() {
        let mut service = AdvertisedService::from_config(&BleProvConfig::new());
        service.device_name = "N".repeat(LEGACY_ADV_PAYLOAD_LEN);
        assert!(matches!(
            service.check_payload_len(),
            Err(TransportError::Ble(_))
        ));
    }

    #[test]
    fn test_transport_error_display() {
        assert_eq!(
            TransportError::Ble("oops".into()).to_string(),
            "BLE error: oops"
        );
        assert_eq!(
            TransportError::NotRunning.to_string(),
            "transport not running"
        );
    }
}
