//! Provisioning scheme abstraction.
//!
//! A provisioning scheme binds the generic provisioning manager to one
//! transport. The manager only ever talks to a [`ProvScheme`]; it creates a
//! configuration, fills it in, hands it to `prov_start`, and deletes it after
//! `prov_stop`.
//!
//! # Example
//!
//! ```
//! use esp32_wifi_prov_ble::scheme::{BleScheme, ProvScheme, WifiMode};
//! use esp32_wifi_prov_ble::transport::HostTransport;
//!
//! let mut scheme = BleScheme::new(HostTransport::new());
//! let mut config = scheme.new_config().unwrap();
//! scheme.set_config_service(&mut config, "PROV_1A2B3C", None).unwrap();
//! scheme.set_config_endpoint(&mut config, "prov-session", 0xff51).unwrap();
//!
//! scheme.prov_start(Some(&config)).unwrap();
//! assert_eq!(scheme.wifi_mode(), WifiMode::Sta);
//! scheme.prov_stop().unwrap();
//! scheme.delete_config(config);
//! ```

mod ble;

pub use ble::BleScheme;

use crate::config::ServiceUuid;
use crate::transport::TransportError;
use std::fmt;

/// WiFi radio mode a scheme needs while provisioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiMode {
    /// Station only.
    Sta,
    /// Soft access point only.
    Ap,
    /// Station and soft access point together.
    ApSta,
}

impl WifiMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sta => "sta",
            Self::Ap => "ap",
            Self::ApSta => "apsta",
        }
    }
}

impl fmt::Display for WifiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(feature = "esp32")]
impl From<WifiMode> for esp_idf_sys::wifi_mode_t {
    fn from(mode: WifiMode) -> Self {
        match mode {
            WifiMode::Sta => esp_idf_sys::wifi_mode_t_WIFI_MODE_STA,
            WifiMode::Ap => esp_idf_sys::wifi_mode_t_WIFI_MODE_AP,
            WifiMode::ApSta => esp_idf_sys::wifi_mode_t_WIFI_MODE_APSTA,
        }
    }
}

/// Lifecycle callbacks a provisioning transport provides to the manager.
///
/// Calls against one configuration are never concurrent: the manager owns
/// the configuration and sequences create, setters, start, stop and delete.
pub trait ProvScheme {
    /// Transport-specific configuration.
    type Config;

    /// Start the transport with a finished configuration.
    ///
    /// `None` stands for a missing configuration handle and yields
    /// [`ProvError::InvalidArg`]. The configuration must not change until
    /// [`prov_stop`](Self::prov_stop).
    fn prov_start(&mut self, config: Option<&Self::Config>) -> Result<(), ProvError>;

    /// Stop the transport started by `prov_start`.
    fn prov_stop(&mut self) -> Result<(), ProvError>;

    /// Create a configuration with the scheme's default identity.
    fn new_config(&self) -> Result<Self::Config, ProvError>;

    /// Release a configuration and everything it owns.
    ///
    /// Takes the configuration by value, so it cannot be deleted twice.
    fn delete_config(&self, config: Self::Config);

    /// Set the service name and key.
    fn set_config_service(
        &self,
        config: &mut Self::Config,
        service_name: &str,
        service_key: Option<&str>,
    ) -> Result<(), ProvError>;

    /// Replace the service UUID advertised for this configuration.
    fn set_config_service_uuid(
        &self,
        config: &mut Self::Config,
        uuid: ServiceUuid,
    ) -> Result<(), ProvError>;

    /// Register a named endpoint under a 16-bit UUID.
    fn set_config_endpoint(
        &self,
        config: &mut Self::Config,
        endpoint_name: &str,
        uuid: u16,
    ) -> Result<(), ProvError>;

    /// WiFi mode to run while this scheme is provisioning.
    fn wifi_mode(&self) -> WifiMode;
}

/// Errors reported by provisioning schemes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvError {
    /// Missing configuration handle or call out of sequence.
    InvalidArg,
    /// Allocation failed; the configuration is unchanged.
    NoMem,
    /// The transport refused to start.
    TransportStart(TransportError),
    /// The transport failed to stop.
    TransportStop(TransportError),
}

impl fmt::Display for ProvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArg => write!(f, "invalid argument"),
            Self::NoMem => write!(f, "out of memory"),
            Self::TransportStart(e) => write!(f, "transport start failed: {}", e),
            Self::TransportStop(e) => write!(f, "transport stop failed: {}", e),
        }
    }
}

impl std::error::Error for ProvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TransportStart(e) | Self::TransportStop(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_wifi_mode_as_str() {
        assert_eq!(WifiMode::Sta.as_str(), "sta");
        assert_eq!(WifiMode::Ap.to_string(), "ap");
        assert_eq!(WifiMode::ApSta.to_string(), "apsta");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ProvError::NoMem.to_string(), "out of memory");
        assert_eq!(ProvError::InvalidArg.to_string(), "invalid argument");
        assert_eq!(
            ProvError::TransportStart(TransportError::AlreadyRunning).to_string(),
            "transport start failed: transport already running"
        );
    }

    #[test]
    fn test_error_source_chains_transport() {
        let err = ProvError::TransportStart(TransportError::Ble("no host".into()));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "BLE error: no host");
        assert!(ProvError::NoMem.source().is_none());
    }
}
