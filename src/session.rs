//! Provisioning session driver.
//!
//! [`ProvSession`] plays the manager's part against one scheme: it builds the
//! configuration from [`ProvSettings`], starts and stops the transport, and
//! releases the configuration when done. It holds at most one configuration
//! and one running transport at a time.
//!
//! # Example
//!
//! ```
//! use esp32_wifi_prov_ble::config::ProvSettings;
//! use esp32_wifi_prov_ble::scheme::BleScheme;
//! use esp32_wifi_prov_ble::session::ProvSession;
//! use esp32_wifi_prov_ble::transport::HostTransport;
//!
//! let mut session = ProvSession::new(BleScheme::new(HostTransport::new()));
//! session.configure(&ProvSettings::with_device_name("PROV_DEMO")).unwrap();
//! session.start().unwrap();
//! assert!(session.is_running());
//! session.finish().unwrap();
//! ```

use crate::config::ProvSettings;
use crate::scheme::{ProvError, ProvScheme, WifiMode};
use crate::transport::TransportError;
use log::{debug, warn};

/// Drives one provisioning scheme through its lifecycle.
pub struct ProvSession<S: ProvScheme> {
    scheme: S,
    config: Option<S::Config>,
    running: bool,
}

impl<S: ProvScheme> ProvSession<S> {
    pub fn new(scheme: S) -> Self {
        Self {
            scheme,
            config: None,
            running: false,
        }
    }

    /// Build a configuration from `settings`, replacing any previous one.
    ///
    /// The service UUID from `settings`, if any, replaces the scheme default.
    /// Endpoints are registered in order. If any step fails, the partially
    /// built configuration is deleted and the previous one is kept.
    ///
    /// Fails with [`ProvError::InvalidArg`] while running, since the live
    /// configuration must not change until `stop`, or when the settings
    /// carry an unparseable service UUID.
    pub fn configure(&mut self, settings: &ProvSettings) -> Result<(), ProvError> {
        if self.running {
            warn!("Cannot reconfigure while provisioning is running");
            return Err(ProvError::InvalidArg);
        }

        let mut config = self.scheme.new_config()?;
        if let Err(e) = self.fill_config(&mut config, settings) {
            warn!("Provisioning config build failed: {}", e);
            self.scheme.delete_config(config);
            return Err(e);
        }

        if let Some(old) = self.config.replace(config) {
            self.scheme.delete_config(old);
        }
        Ok(())
    }

    fn fill_config(
        &self,
        config: &mut S::Config,
        settings: &ProvSettings,
    ) -> Result<(), ProvError> {
        self.scheme.set_config_service(
            config,
            &settings.device_name,
            settings.service_key.as_deref(),
        )?;
        let service_uuid = settings.parsed_service_uuid().map_err(|e| {
            warn!("Rejecting provisioning settings: {}", e);
            ProvError::InvalidArg
        })?;
        if let Some(uuid) = service_uuid {
            self.scheme.set_config_service_uuid(config, uuid)?;
        }
        for endpoint in &settings.endpoints {
            self.scheme
                .set_config_endpoint(config, &endpoint.name, endpoint.uuid)?;
        }
        debug!("Configured {} endpoint(s)", settings.endpoints.len());
        Ok(())
    }

    /// Start the transport with the current configuration.
    ///
    /// Fails with [`ProvError::InvalidArg`] if nothing has been configured.
    pub fn start(&mut self) -> Result<(), ProvError> {
        if self.running {
            return Err(ProvError::TransportStart(TransportError::AlreadyRunning));
        }
        self.scheme.prov_start(self.config.as_ref())?;
        self.running = true;
        Ok(())
    }

    /// Stop the running transport.
    pub fn stop(&mut self) -> Result<(), ProvError> {
        if !self.running {
            return Err(ProvError::TransportStop(TransportError::NotRunning));
        }
        self.scheme.prov_stop()?;
        self.running = false;
        Ok(())
    }

    /// Stop if running and delete the configuration.
    ///
    /// The configuration is released even if stopping fails; the stop error
    /// is returned.
    pub fn finish(mut self) -> Result<(), ProvError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<(), ProvError> {
        let result = if self.running { self.stop() } else { Ok(()) };
        if let Some(config) = self.config.take() {
            self.scheme.delete_config(config);
        }
        result
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Current configuration.
    pub fn config(&self) -> Option<&S::Config> {
        self.config.as_ref()
    }

    /// Mutable access to the configuration, only while stopped.
    pub fn config_mut(&mut self) -> Option<&mut S::Config> {
        if self.running {
            return None;
        }
        self.config.as_mut()
    }

    pub fn scheme(&self) -> &S {
        &self.scheme
    }

    pub fn wifi_mode(&self) -> WifiMode {
        self.scheme.wifi_mode()
    }
}

impl<S: ProvScheme> Drop for ProvSession<S> {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Provisioning session shutdown failed: {}", e);
        }
    }
}
