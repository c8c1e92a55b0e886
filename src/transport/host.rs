//! Host transport.
//!
//! No radio: `start` validates the configuration the way the BLE stack would
//! and records the service it would advertise. Like the stack, it keeps the
//! first registered service across `stop` and refuses to serve a different
//! one later. Used by host builds and tests.

use super::{AdvertisedService, BleTransport, TransportError};
use crate::config::BleProvConfig;
use log::{debug, info};

/// Attributes NimBLE is typically configured for per GATT service.
pub const DEFAULT_ATTRIBUTE_LIMIT: usize = 16;

/// Host-side stand-in for the BLE transport.
#[derive(Debug)]
pub struct HostTransport {
    /// Maximum characteristics per service.
    attribute_limit: usize,
    /// Service registered by the first successful `start`.
    registered: Option<AdvertisedService>,
    running: bool,
    sessions_started: usize,
}

impl HostTransport {
    pub fn new() -> Self {
        Self::with_attribute_limit(DEFAULT_ATTRIBUTE_LIMIT)
    }

    /// Refuse to start sessions with more than `limit` endpoints.
    pub fn with_attribute_limit(limit: usize) -> Self {
        Self {
            attribute_limit: limit,
            registered: None,
            running: false,
            sessions_started: 0,
        }
    }

    /// The service being advertised, if running.
    pub fn advertised(&self) -> Option<&AdvertisedService> {
        self.registered.as_ref().filter(|_| self.running)
    }

    /// The registered service, which outlives `stop`.
    pub fn registered(&self) -> Option<&AdvertisedService> {
        self.registered.as_ref()
    }

    /// Number of successful `start` calls.
    pub fn sessions_started(&self) -> usize {
        self.sessions_started
    }
}

impl Default for HostTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl BleTransport for HostTransport {
    fn start(&mut self, config: &BleProvConfig) -> Result<(), TransportError> {
        if self.running {
            return Err(TransportError::AlreadyRunning);
        }

        let service = AdvertisedService::from_config(config);
        match &self.registered {
            Some(registered) if *registered != service => {
                return Err(TransportError::Ble(format!(
                    "GATT service {} already registered with a different layout",
                    registered.service_uuid
                )));
            }
            Some(_) => debug!("Service already registered, restarting advertising"),
            None => {
                if service.characteristics.len() > self.attribute_limit {
                    return Err(TransportError::Ble(format!(
                        "{} endpoints exceed attribute limit of {}",
                        service.characteristics.len(),
                        self.attribute_limit
                    )));
                }
                service.check_payload_len()?;
                for characteristic in &service.characteristics {
                    info!("  {} -> {}", characteristic.name, characteristic.uuid);
                }
                self.registered = Some(service);
            }
        }

        if let Some(service) = &self.registered {
            info!(
                "Advertising {:?} with service {}",
                service.device_name, service.service_uuid
            );
        }
        self.running = true;
        self.sessions_started += 1;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        if !self.running {
            return Err(TransportError::NotRunning);
        }
        self.running = false;
        info!("Stopped advertising");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
