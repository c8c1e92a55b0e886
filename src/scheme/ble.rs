//! BLE provisioning scheme.
//!
//! Adapts a [`BleTransport`] to the [`ProvScheme`] interface. The scheme
//! keeps the radio in station mode: BLE carries the provisioning session
//! while the WiFi station is free to try the credentials it receives.

use super::{ProvError, ProvScheme, WifiMode};
use crate::config::{BleProvConfig, ServiceUuid};
use crate::transport::BleTransport;
use log::{debug, error, info};

/// Provisioning over BLE.
pub struct BleScheme<T> {
    transport: T,
    /// Replaces the default service UUID in new configurations.
    service_uuid: Option<ServiceUuid>,
    /// Heap budget applied to new configurations.
    heap_budget: Option<usize>,
}

impl<T: BleTransport> BleScheme<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            service_uuid: None,
            heap_budget: None,
        }
    }

    /// Advertise `uuid` instead of the default service UUID.
    pub fn with_service_uuid(mut self, uuid: ServiceUuid) -> Self {
        self.service_uuid = Some(uuid);
        self
    }

    /// Bound the heap each new configuration's endpoint table may use.
    pub fn with_heap_budget(mut self, bytes: usize) -> Self {
        self.heap_budget = Some(bytes);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}

impl<T: BleTransport> ProvScheme for BleScheme<T> {
    type Config = BleProvConfig;

    fn prov_start(&mut self, config: Option<&BleProvConfig>) -> Result<(), ProvError> {
        let config = config.ok_or(ProvError::InvalidArg)?;

        self.transport.start(config).map_err(|e| {
            error!("Failed to start BLE provisioning service: {}", e);
            ProvError::TransportStart(e)
        })?;

        info!(
            "BLE provisioning started as {:?} ({} endpoints)",
            config.device_name(),
            config.endpoint_count()
        );
        Ok(())
    }

    fn prov_stop(&mut self) -> Result<(), ProvError> {
        self.transport.stop().map_err(ProvError::TransportStop)?;
        info!("BLE provisioning stopped");
        Ok(())
    }

    fn new_config(&self) -> Result<BleProvConfig, ProvError> {
        let mut config = match self.heap_budget {
            Some(budget) => BleProvConfig::with_heap_budget(budget),
            None => BleProvConfig::new(),
        };
        if let Some(uuid) = self.service_uuid {
            config.set_service_uuid(uuid);
        }
        Ok(config)
    }

    fn delete_config(&self, config: BleProvConfig) {
        drop(config);
    }

    /// Copies `service_name` into the device name, truncating if needed.
    ///
    /// `service_key` is accepted for interface compatibility but is not stored:
    /// the BLE configuration has nowhere to put it and nothing here forwards
    /// it to the transport.
    fn set_config_service(
        &self,
        config: &mut BleProvConfig,
        service_name: &str,
        service_key: Option<&str>,
    ) -> Result<(), ProvError> {
        config.set_device_name(service_name);
        if service_key.is_some() {
            debug!("BLE scheme ignores the service key");
        }
        Ok(())
    }

    fn set_config_service_uuid(
        &self,
        config: &mut BleProvConfig,
        uuid: ServiceUuid,
    ) -> Result<(), ProvError> {
        config.set_service_uuid(uuid);
        Ok(())
    }

    fn set_config_endpoint(
        &self,
        config: &mut BleProvConfig,
        endpoint_name: &str,
        uuid: u16,
    ) -> Result<(), ProvError> {
        config.add_endpoint(endpoint_name, uuid)
    }

    fn wifi_mode(&self) -> WifiMode {
        WifiMode::Sta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_SERVICE_UUID, ENDPOINT_SLOT_SIZE, MAX_BLE_DEVNAME_LEN};
    use crate::transport::{HostTransport, TransportError};

    fn scheme() -> BleScheme<HostTransport> {
        BleScheme::new(HostTransport::new())
    }

    // ==================== Config Lifecycle Tests ====================

    #[test]
    fn test_new_config_defaults() {
        let config = scheme().new_config().unwrap();
        assert_eq!(*config.service_uuid(), DEFAULT_SERVICE_UUID);
        assert_eq!(config.device_name(), "");
        assert_eq!(config.endpoint_count(), 0);
    }

    #[test]
    fn test_new_config_custom_uuid() {
        let uuid: ServiceUuid = "021a9004-0382-4aea-bff4-6b3f1c5adfb4".parse().unwrap();
        let config = scheme().with_service_uuid(uuid).new_config().unwrap();
        assert_eq!(*config.service_uuid(), uuid);
    }

    #[test]
    fn test_set_config_service_uuid_overrides_default() {
        let scheme = scheme();
        let uuid: ServiceUuid = "021a9004-0382-4aea-bff4-6b3f1c5adfb4".parse().unwrap();
        let mut config = scheme.new_config().unwrap();
        scheme.set_config_service_uuid(&mut config, uuid).unwrap();
        assert_eq!(*config.service_uuid(), uuid);
        assert_eq!(
            config.characteristic_uuid(0xff51).to_string(),
            "021aff51-0382-4aea-bff4-6b3f1c5adfb4"
        );
    }

    #[test]
    fn test_delete_config_empty() {
        let scheme = scheme();
        let config = scheme.new_config().unwrap();
        scheme.delete_config(config);
    }

    #[test]
    fn test_delete_after_partial_build() {
        let budget = "alpha".len() + ENDPOINT_SLOT_SIZE;
        let scheme = scheme().with_heap_budget(budget);
        let mut config = scheme.new_config().unwrap();

        scheme.set_config_endpoint(&mut config, "alpha", 1).unwrap();
        let result = scheme.set_config_endpoint(&mut config, "beta", 2);

        assert_eq!(result, Err(ProvError::NoMem));
        assert_eq!(config.endpoint_count(), 1);
        assert_eq!(config.endpoints()[0].name, "alpha");
        scheme.delete_config(config);
    }

    // ==================== Service Tests ====================

    #[test]
    fn test_set_config_service_truncates() {
        let scheme = scheme();
        let mut config = scheme.new_config().unwrap();
        let long_name = "X".repeat(200);
        scheme
            .set_config_service(&mut config, &long_name, None)
            .unwrap();
        assert_eq!(config.device_name().len(), MAX_BLE_DEVNAME_LEN);
    }

    #[test]
    fn test_service_key_not_stored() {
        let scheme = scheme();
        let mut with_key = scheme.new_config().unwrap();
        let mut without_key = scheme.new_config().unwrap();
        scheme
            .set_config_service(&mut with_key, "PROV_1", Some("abcd1234"))
            .unwrap();
        scheme
            .set_config_service(&mut without_key, "PROV_1", None)
            .unwrap();

        assert_eq!(format!("{:?}", with_key), format!("{:?}", without_key));
    }

    // ==================== Start/Stop Tests ====================

    #[test]
    fn test_start_without_config() {
        let mut scheme = scheme();
        assert_eq!(scheme.prov_start(None), Err(ProvError::InvalidArg));
        assert!(!scheme.transport().is_running());
    }

    #[test]
    fn test_start_stop() {
        let mut scheme = scheme();
        let mut config = scheme.new_config().unwrap();
        scheme
            .set_config_service(&mut config, "PROV_1", None)
            .unwrap();
        scheme
            .set_config_endpoint(&mut config, "prov-session", 0xff51)
            .unwrap();

        scheme.prov_start(Some(&config)).unwrap();
        let service = scheme.transport().advertised().unwrap();
        assert_eq!(service.device_name, "PROV_1");
        assert_eq!(service.characteristics.len(), 1);

        scheme.prov_stop().unwrap();
        assert!(scheme.transport().advertised().is_none());
        scheme.delete_config(config);
    }

    #[test]
    fn test_start_failure_propagated() {
        let mut scheme = BleScheme::new(HostTransport::with_attribute_limit(1));
        let mut config = scheme.new_config().unwrap();
        scheme.set_config_endpoint(&mut config, "a", 1).unwrap();
        scheme.set_config_endpoint(&mut config, "b", 2).unwrap();

        let result = scheme.prov_start(Some(&config));
        assert!(matches!(
            result,
            Err(ProvError::TransportStart(TransportError::Ble(_)))
        ));
        // Config is still intact and deletable.
        assert_eq!(config.endpoint_count(), 2);
        scheme.delete_config(config);
    }

    #[test]
    fn test_stop_without_start() {
        let mut scheme = scheme();
        assert_eq!(
            scheme.prov_stop(),
            Err(ProvError::TransportStop(TransportError::NotRunning))
        );
    }

    #[test]
    fn test_wifi_mode_is_station() {
        assert_eq!(scheme().wifi_mode(), WifiMode::Sta);
    }
}
