//! NimBLE transport for ESP32.
//!
//! Registers one GATT service for the session with a READ|WRITE
//! characteristic per endpoint. Each characteristic carries a user
//! description descriptor (0x2901) holding the endpoint name so clients can
//! map UUIDs back to endpoints.
//!
//! # GATT Service Structure
//!
//! ```text
//! Service: <service UUID>
//! ├── prov-ctrl    (Read, Write) - 0000ff4f-...
//! ├── prov-scan    (Read, Write) - 0000ff50-...
//! ├── prov-session (Read, Write) - 0000ff51-...
//! ├── prov-config  (Read, Write) - 0000ff52-...
//! └── proto-ver    (Read, Write) - 0000ff53-...
//! ```
//!
//! A write to a characteristic is passed to the [`RequestHandler`] with the
//! endpoint name; the handler's response is what the next read returns.
//! Encoding and decoding of those payloads is the handler's business.
//!
//! NimBLE keeps registered services until the stack is deinitialized, so the
//! service is created once. `stop` halts advertising only; restarting with
//! the same configuration re-advertises, a different one is refused.
//!
//! The advertisement carries the service UUID and the scan response carries
//! the device name. Both would not fit one 31-byte legacy packet.

use super::{AdvertisedService, BleTransport, TransportError};
use crate::config::BleProvConfig;
use esp32_nimble::utilities::BleUuid;
use esp32_nimble::{BLEAdvertisementData, BLEDevice, DescriptorProperties, NimbleProperties};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex};

/// GATT Characteristic User Description descriptor.
const USER_DESCRIPTION_UUID: BleUuid = BleUuid::Uuid16(0x2901);

/// Handles one request on an endpoint and returns the response payload.
pub type RequestHandler = Arc<dyn Fn(&str, &[u8]) -> Vec<u8> + Send + Sync>;

/// BLE transport on the ESP32 NimBLE stack.
pub struct NimbleTransport {
    handler: RequestHandler,
    /// Service registered with the GATT server by the first `start`.
    registered: Option<AdvertisedService>,
    running: bool,
}

impl NimbleTransport {
    pub fn new(handler: RequestHandler) -> Self {
        Self {
            handler,
            registered: None,
            running: false,
        }
    }
}

fn ble_error(context: &str, e: impl std::fmt::Debug) -> TransportError {
    TransportError::Ble(format!("{}: {:?}", context, e))
}

impl NimbleTransport {
    /// Create the GATT service and one characteristic per endpoint.
    fn register(&self, device: &mut BLEDevice, service: &AdvertisedService) {
        let service_uuid = BleUuid::from_uuid128(*service.service_uuid.as_le_bytes());
        let gatt = device.get_server().create_service(service_uuid);

        for endpoint in &service.characteristics {
            let characteristic = gatt.lock().create_characteristic(
                BleUuid::from_uuid128(*endpoint.uuid.as_le_bytes()),
                NimbleProperties::READ | NimbleProperties::WRITE,
            );
            characteristic
                .lock()
                .create_descriptor(USER_DESCRIPTION_UUID, DescriptorProperties::READ)
                .lock()
                .set_value(endpoint.name.as_bytes());

            let response = Arc::new(Mutex::new(Vec::<u8>::new()));

            let read_response = response.clone();
            characteristic.lock().on_read(move |attr, _conn| {
                match read_response.lock() {
                    Ok(data) => {
                        attr.set_value(&data);
                    }
                    Err(e) => warn!("Response buffer poisoned: {}", e),
                }
            });

            let handler = self.handler.clone();
            let name = endpoint.name.clone();
            characteristic.lock().on_write(move |args| {
                let request = args.recv_data();
                debug!("Request on {}: {} bytes", name, request.len());
                let reply = handler(&name, request);
                match response.lock() {
                    Ok(mut data) => *data = reply,
                    Err(e) => warn!("Response buffer poisoned: {}", e),
                }
            });
        }
        debug!(
            "Registered GATT service {} with {} characteristic(s)",
            service.service_uuid,
            service.characteristics.len()
        );
    }
}

impl BleTransport for NimbleTransport {
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
            None => service.check_payload_len()?,
        }

        let device = BLEDevice::take();
        if self.registered.is_none() {
            BLEDevice::set_device_name(&service.device_name)
                .map_err(|e| ble_error("set device name", e))?;
            self.register(device, &service);
            self.registered = Some(service.clone());
        }

        let service_uuid = BleUuid::from_uuid128(*service.service_uuid.as_le_bytes());
        let advertising = device.get_advertising();
        advertising
            .lock()
            .scan_response(true)
            .set_data(BLEAdvertisementData::new().add_service_uuid(service_uuid))
            .map_err(|e| ble_error("set advertisement data", e))?;
        advertising
            .lock()
            .set_scan_response_data(BLEAdvertisementData::new().name(&service.device_name))
            .map_err(|e| ble_error("set scan response data", e))?;
        advertising
            .lock()
            .start()
            .map_err(|e| ble_error("start advertising", e))?;

        info!(
            "NimBLE advertising {:?} on {}",
            service.device_name, service.service_uuid
        );
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), TransportError> {
        if !self.running {
            return Err(TransportError::NotRunning);
        }
        BLEDevice::take()
            .get_advertising()
            .lock()
            .stop()
            .map_err(|e| ble_error("stop advertising", e))?;
        self.running = false;
        info!("NimBLE advertising stopped");
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
