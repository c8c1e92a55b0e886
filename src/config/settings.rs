//! Provisioning settings.
//!
//! Settings describe what a provisioning session should advertise. They are
//! read from a JSON file named by `PROV_SETTINGS`, or built from defaults
//! with the device name taken from `PROV_DEVICE_NAME`.
//!
//! ```json
//! {
//!   "device_name": "PROV_KITCHEN",
//!   "service_key": null,
//!   "service_uuid": "021a9004-0382-4aea-bff4-6b3f1c5adfb4",
//!   "endpoints": [
//!     { "name": "prov-session", "uuid": 65361 },
//!     { "name": "prov-config", "uuid": 65362 }
//!   ]
//! }
//! ```

use super::uuid::{ServiceUuid, UuidParseError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;
use zeroize::Zeroize;

/// Environment variable holding the settings file path.
pub const ENV_SETTINGS_PATH: &str = "PROV_SETTINGS";

/// Environment variable overriding the default device name.
pub const ENV_DEVICE_NAME: &str = "PROV_DEVICE_NAME";

/// Device name used when none is configured.
pub const DEFAULT_DEVICE_NAME: &str = "PROV_ESP32";

/// Endpoints a WiFi provisioning manager registers, in registration order.
pub const DEFAULT_ENDPOINTS: &[(&str, u16)] = &[
    ("prov-ctrl", 0xff4f),
    ("prov-scan", 0xff50),
    ("prov-session", 0xff51),
    ("prov-config", 0xff52),
    ("proto-ver", 0xff53),
];

/// One endpoint entry in the settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSetting {
    pub name: String,
    pub uuid: u16,
}

/// Settings for a provisioning session.
///
/// Missing fields in a settings file take their defaults. The service key is
/// zeroized on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvSettings {
    /// Advertised device name. Truncated by the BLE scheme if too long.
    #[serde(default = "default_device_name")]
    pub device_name: String,
    /// Service key. The BLE scheme accepts but does not use it.
    #[serde(default)]
    pub service_key: Option<String>,
    /// Service UUID in canonical text form; `None` keeps the default.
    #[serde(default)]
    pub service_uuid: Option<String>,
    /// Endpoints to register, in order.
    #[serde(default = "default_endpoints")]
    pub endpoints: Vec<EndpointSetting>,
}

fn default_device_name() -> String {
    DEFAULT_DEVICE_NAME.to_string()
}

fn default_endpoints() -> Vec<EndpointSetting> {
    DEFAULT_ENDPOINTS
        .iter()
        .map(|(name, uuid)| EndpointSetting {
            name: (*name).to_string(),
            uuid: *uuid,
        })
        .collect()
}

impl ProvSettings {
    /// Default settings with the given device name.
    pub fn with_device_name(name: impl Into<String>) -> Self {
        let mut settings = Self::default();
        settings.device_name = name.into();
        settings
    }

    /// Parse settings from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        // Surface a bad UUID at load time rather than at session start.
        settings.parsed_service_uuid()?;
        Ok(settings)
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load settings from the environment.
    ///
    /// Uses the file named by `PROV_SETTINGS` if set, otherwise the defaults.
    /// `PROV_DEVICE_NAME` overrides the device name in either case.
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut settings = match std::env::var(ENV_SETTINGS_PATH) {
            Ok(path) => {
                log::info!("Loading provisioning settings from {}", path);
                Self::load(Path::new(&path))?
            }
            Err(_) => Self::default(),
        };
        if let Ok(name) = std::env::var(ENV_DEVICE_NAME) {
            settings.device_name = name;
        }
        Ok(settings)
    }

    /// The configured service UUID, if any.
    pub fn parsed_service_uuid(&self) -> Result<Option<ServiceUuid>, SettingsError> {
        self.service_uuid
            .as_deref()
            .map(str::parse::<ServiceUuid>)
            .transpose()
            .map_err(SettingsError::InvalidUuid)
    }
}

impl Default for ProvSettings {
    fn default() -> Self {
        Self {
            device_name: default_device_name(),
            service_key: None,
            service_uuid: None,
            endpoints: default_endpoints(),
        }
    }
}

impl fmt::Debug for ProvSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvSettings")
            .field("device_name", &self.device_name)
            .field("service_key", &self.service_key.as_ref().map(|_| "<redacted>"))
            .field("service_uuid", &self.service_uuid)
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl Drop for ProvSettings {
    fn drop(&mut self) {
        if let Some(key) = self.service_key.as_mut() {
            key.zeroize();
        }
    }
}

/// Errors from loading settings.
#[derive(Debug)]
pub enum SettingsError {
    /// Settings file could not be read.
    Io(io::Error),
    /// Settings file is not valid JSON for [`ProvSettings`].
    Json(serde_json::Error),
    /// `service_uuid` is not a valid UUID.
    InvalidUuid(UuidParseError),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "failed to read settings: {}", e),
            Self::Json(e) => write!(f, "invalid settings JSON: {}", e),
            Self::InvalidUuid(e) => write!(f, "invalid service UUID: {}", e),
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::InvalidUuid(e) => Some(e),
        }
    }
}

impl From<io::Error> for SettingsError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SERVICE_UUID;

    #[test]
    fn test_defaults() {
        let settings = ProvSettings::default();
        assert_eq!(settings.device_name, DEFAULT_DEVICE_NAME);
        assert_eq!(settings.service_key, None);
        assert_eq!(settings.parsed_service_uuid().unwrap(), None);
        assert_eq!(settings.endpoints.len(), DEFAULT_ENDPOINTS.len());
        assert_eq!(settings.endpoints[2].name, "prov-session");
        assert_eq!(settings.endpoints[2].uuid, 0xff51);
    }

    #[test]
    fn test_with_device_name() {
        let settings = ProvSettings::with_device_name("PROV_TEST");
        assert_eq!(settings.device_name, "PROV_TEST");
        assert_eq!(settings.endpoints.len(), DEFAULT_ENDPOINTS.len());
    }

    #[test]
    fn test_from_json_full() {
        let json = r#"{
            "device_name": "PROV_KITCHEN",
            "service_key": "abcd1234",
            "service_uuid": "0000ffff-0000-1000-8000-00805f9b34fb",
            "endpoints": [{ "name": "custom-data", "uuid": 65364 }]
        }"#;
        let settings = ProvSettings::from_json(json).unwrap();
        assert_eq!(settings.device_name, "PROV_KITCHEN");
        assert_eq!(settings.service_key.as_deref(), Some("abcd1234"));
        assert_eq!(
            settings.parsed_service_uuid().unwrap(),
            Some(DEFAULT_SERVICE_UUID)
        );
        assert_eq!(
            settings.endpoints,
            vec![EndpointSetting {
                name: "custom-data".to_string(),
                uuid: 0xff54
            }]
        );
    }

    #[test]
    fn test_from_json_missing_fields_use_defaults() {
        let settings = ProvSettings::from_json(r#"{ "device_name": "PROV_X" }"#).unwrap();
        assert_eq!(settings.device_name, "PROV_X");
        assert_eq!(settings.endpoints.len(), DEFAULT_ENDPOINTS.len());
    }

    #[test]
    fn test_from_json_bad_uuid() {
        let result = ProvSettings::from_json(r#"{ "service_uuid": "not-a-uuid" }"#);
        assert!(matches!(result, Err(SettingsError::InvalidUuid(_))));
    }

    #[test]
    fn test_from_json_malformed() {
        let result = ProvSettings::from_json("{ device_name: ");
        assert!(matches!(result, Err(SettingsError::Json(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = ProvSettings::load(Path::new("/nonexistent/prov-settings.json"));
        assert!(matches!(result, Err(SettingsError::Io(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let mut settings = ProvSettings::default();
        settings.service_key = Some("hunter22".to_string());
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("hunter22"));
        assert!(debug.contains("<redacted>"));
    }
}
