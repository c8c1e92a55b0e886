//! BLE provisioning configuration and endpoint registry.
//!
//! [`BleProvConfig`] is what the BLE scheme hands to the transport: the
//! advertised device name, the 128-bit service UUID and the ordered table of
//! endpoint names with their 16-bit UUIDs.
//!
//! # Example
//!
//! ```
//! use esp32_wifi_prov_ble::config::{BleProvConfig, DEFAULT_SERVICE_UUID};
//!
//! let mut config = BleProvConfig::new();
//! config.set_device_name("PROV_1A2B3C");
//! config.add_endpoint("prov-session", 0xff51).unwrap();
//! config.add_endpoint("prov-config", 0xff52).unwrap();
//!
//! assert_eq!(config.device_name(), "PROV_1A2B3C");
//! assert_eq!(*config.service_uuid(), DEFAULT_SERVICE_UUID);
//! assert_eq!(config.lookup("prov-config"), Some(0xff52));
//! ```

use super::uuid::{ServiceUuid, DEFAULT_SERVICE_UUID};
use crate::scheme::ProvError;
use log::{debug, warn};
use std::fmt;
use std::mem::size_of;

/// Maximum advertised device name length in bytes.
///
/// The transport's native field is one byte larger to hold a terminator.
pub const MAX_BLE_DEVNAME_LEN: usize = 29;

/// Heap charged for one endpoint table slot.
pub const ENDPOINT_SLOT_SIZE: usize = size_of::<NameUuid>();

/// Fixed-capacity device name.
///
/// Writes never fail: input longer than [`MAX_BLE_DEVNAME_LEN`] is cut at the
/// last UTF-8 character boundary that fits.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DeviceName {
    buf: [u8; MAX_BLE_DEVNAME_LEN],
    len: usize,
}

impl DeviceName {
    /// Empty name.
    pub const fn empty() -> Self {
        Self {
            buf: [0; MAX_BLE_DEVNAME_LEN],
            len: 0,
        }
    }

    /// Replace the stored name, truncating silently.
    ///
    /// Returns `true` if the input was truncated.
    pub fn set(&mut self, name: &str) -> bool {
        let end = truncation_point(name, MAX_BLE_DEVNAME_LEN);
        self.buf = [0; MAX_BLE_DEVNAME_LEN];
        self.buf[..end].copy_from_slice(&name.as_bytes()[..end]);
        self.len = end;
        end < name.len()
    }

    /// The stored name.
    pub fn as_str(&self) -> &str {
        // Only whole characters are ever copied in.
        std::str::from_utf8(&self.buf[..self.len]).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for DeviceName {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceName({:?})", self.as_str())
    }
}

impl fmt::Display for DeviceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Largest index `<= max` that falls on a character boundary of `s`.
fn truncation_point(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// One endpoint: an owned name and the 16-bit UUID the transport exposes it on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameUuid {
    /// Endpoint name, owned by the configuration.
    pub name: String,
    /// 16-bit UUID. Not validated.
    pub uuid: u16,
}

/// Configuration for one BLE provisioning session.
///
/// Owned exclusively by the caller from creation until it is dropped. The
/// endpoint table only grows; a failed [`add_endpoint`](Self::add_endpoint)
/// leaves the table exactly as it was.
pub struct BleProvConfig {
    device_name: DeviceName,
    service_uuid: ServiceUuid,
    endpoints: Vec<NameUuid>,
    /// Upper bound on bytes the endpoint table may own.
    heap_budget: Option<usize>,
    /// Bytes currently charged against `heap_budget`.
    heap_used: usize,
}

impl BleProvConfig {
    /// Create a configuration with the default service UUID, an empty device
    /// name and no endpoints.
    ///
    /// Nothing is allocated until the first endpoint is added.
    pub fn new() -> Self {
        Self {
            device_name: DeviceName::empty(),
            service_uuid: DEFAULT_SERVICE_UUID,
            endpoints: Vec::new(),
            heap_budget: None,
            heap_used: 0,
        }
    }

    /// Create a configuration whose endpoint table may own at most
    /// `budget` bytes.
    ///
    /// Each name is charged its byte length and each table slot
    /// [`ENDPOINT_SLOT_SIZE`]. Going over budget fails exactly like an
    /// allocation failure.
    pub fn with_heap_budget(budget: usize) -> Self {
        let mut config = Self::new();
        config.heap_budget = Some(budget);
        config
    }

    /// Set the advertised device name.
    ///
    /// Names longer than [`MAX_BLE_DEVNAME_LEN`] bytes are truncated without
    /// error; callers that need the full name must check its length first.
    pub fn set_device_name(&mut self, name: &str) {
        if self.device_name.set(name) {
            debug!(
                "Device name truncated from {} to {} bytes",
                name.len(),
                self.device_name.len()
            );
        }
    }

    /// Overwrite the service UUID.
    pub fn set_service_uuid(&mut self, uuid: ServiceUuid) {
        self.service_uuid = uuid;
    }

    /// Append an endpoint to the table.
    ///
    /// The name is copied into storage owned by this configuration. Duplicate
    /// names are allowed and produce separate entries.
    ///
    /// Returns [`ProvError::NoMem`] if the name copy or the table growth
    /// cannot be allocated. On error the table is unchanged.
    pub fn add_endpoint(&mut self, name: &str, uuid: u16) -> Result<(), ProvError> {
        let owned = self.duplicate_name(name)?;
        // `owned` is dropped here if growth fails.
        self.grow_by_one(owned.len())?;

        self.heap_used += owned.len() + ENDPOINT_SLOT_SIZE;
        self.endpoints.push(NameUuid { name: owned, uuid });
        debug!("Registered endpoint {:?} -> 0x{:04x}", name, uuid);
        Ok(())
    }

    fn duplicate_name(&self, name: &str) -> Result<String, ProvError> {
        self.charge(name.len())?;

        let mut owned = String::new();
        owned.try_reserve_exact(name.len()).map_err(|e| {
            warn!("Failed to copy endpoint name {:?}: {}", name, e);
            ProvError::NoMem
        })?;
        owned.push_str(name);
        Ok(owned)
    }

    fn grow_by_one(&mut self, pending_name_len: usize) -> Result<(), ProvError> {
        self.charge(pending_name_len + ENDPOINT_SLOT_SIZE)?;

        self.endpoints.try_reserve_exact(1).map_err(|e| {
            warn!("Failed to grow endpoint table: {}", e);
            ProvError::NoMem
        })
    }

    /// Check that `extra` more bytes fit in the heap budget.
    fn charge(&self, extra: usize) -> Result<(), ProvError> {
        let Some(budget) = self.heap_budget else {
            return Ok(());
        };
        match self.heap_used.checked_add(extra) {
            Some(total) if total <= budget => Ok(()),
            _ => {
                warn!(
                    "Endpoint table over heap budget: {} + {} > {} bytes",
                    self.heap_used, extra, budget
                );
                Err(ProvError::NoMem)
            }
        }
    }

    /// Advertised device name.
    pub fn device_name(&self) -> &str {
        self.device_name.as_str()
    }

    /// Service UUID (LSB first).
    pub fn service_uuid(&self) -> &ServiceUuid {
        &self.service_uuid
    }

    /// Registered endpoints, in registration order.
    pub fn endpoints(&self) -> &[NameUuid] {
        &self.endpoints
    }

    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// UUID of the first endpoint registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.endpoints
            .iter()
            .find(|ep| ep.name == name)
            .map(|ep| ep.uuid)
    }

    /// 128-bit characteristic UUID for a 16-bit endpoint UUID.
    pub fn characteristic_uuid(&self, uuid: u16) -> ServiceUuid {
        self.service_uuid.with_short_uuid(uuid)
    }

    /// Bytes charged against the heap budget so far.
    pub fn heap_used(&self) -> usize {
        self.heap_used
    }

    /// Allocated table capacity, in slots.
    pub fn endpoint_capacity(&self) -> usize {
        self.endpoints.capacity()
    }
}

impl Default for BleProvConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BleProvConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BleProvConfig")
            .field("device_name", &self.device_name.as_str())
            .field("service_uuid", &format_args!("{}", self.service_uuid))
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl Drop for BleProvConfig {
    fn drop(&mut self) {
        debug!(
            "Releasing BLE config with {} endpoint(s)",
            self.endpoints.len()
        );
    }
}
