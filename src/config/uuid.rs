//! 128-bit BLE service UUIDs.
//!
//! The BLE stack consumes UUIDs least-significant byte first, so that is the
//! storage order here. The canonical text form (`8-4-4-4-12` hex groups) is
//! written most-significant byte first.
//!
//! # Example
//!
//! ```
//! use esp32_wifi_prov_ble::config::{ServiceUuid, DEFAULT_SERVICE_UUID};
//!
//! let uuid: ServiceUuid = "0000ffff-0000-1000-8000-00805f9b34fb".parse().unwrap();
//! assert_eq!(uuid, DEFAULT_SERVICE_UUID);
//! assert_eq!(uuid.as_le_bytes()[0], 0xfb);
//! ```

use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Length of a 128-bit UUID in bytes.
pub const UUID_LEN: usize = 16;

/// Byte offset (LSB order) where a 16-bit endpoint UUID is written into the
/// service UUID to form a characteristic UUID.
const SHORT_UUID_OFFSET: usize = 12;

/// Default provisioning service UUID: `0000ffff-0000-1000-8000-00805f9b34fb`.
pub const DEFAULT_SERVICE_UUID: ServiceUuid = ServiceUuid::from_le_bytes([
    0xfb, 0x34, 0x9b, 0x5f, 0x80, 0x00, 0x00, 0x80, //
    0x00, 0x10, 0x00, 0x00, 0xff, 0xff, 0x00, 0x00,
]);

/// A 128-bit UUID stored least-significant byte first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceUuid([u8; UUID_LEN]);

impl ServiceUuid {
    /// Create a UUID from bytes in BLE (LSB first) order.
    pub const fn from_le_bytes(bytes: [u8; UUID_LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes in BLE (LSB first) order.
    pub const fn as_le_bytes(&self) -> &[u8; UUID_LEN] {
        &self.0
    }

    /// Derive a UUID by writing a 16-bit value into bytes 12..14.
    ///
    /// This is how per-endpoint characteristic UUIDs are built from the
    /// service UUID: `0000ffff-...` with `0xff51` becomes `0000ff51-...`.
    pub const fn with_short_uuid(&self, short: u16) -> Self {
        let mut bytes = self.0;
        let le = short.to_le_bytes();
        bytes[SHORT_UUID_OFFSET] = le[0];
        bytes[SHORT_UUID_OFFSET + 1] = le[1];
        Self(bytes)
    }
}

impl Default for ServiceUuid {
    fn default() -> Self {
        DEFAULT_SERVICE_UUID
    }
}

impl From<Uuid> for ServiceUuid {
    fn from(uuid: Uuid) -> Self {
        Self(uuid.as_u128().to_le_bytes())
    }
}

impl From<ServiceUuid> for Uuid {
    fn from(uuid: ServiceUuid) -> Self {
        // Not `from_bytes_le`: that is the mixed-endian GUID layout.
        Uuid::from_u128(u128::from_le_bytes(uuid.0))
    }
}

impl fmt::Display for ServiceUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Uuid::from(*self).hyphenated())
    }
}

impl FromStr for ServiceUuid {
    type Err = UuidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Uuid::parse_str(s)?.into())
    }
}

/// Error from parsing a UUID string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UuidParseError(uuid::Error);

impl fmt::Display for UuidParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for UuidParseError {}

impl From<uuid::Error> for UuidParseError {
    fn from(e: uuid::Error) -> Self {
        Self(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formats_canonically() {
        assert_eq!(
            DEFAULT_SERVICE_UUID.to_string(),
            "0000ffff-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_parse_is_lsb_first() {
        let uuid: ServiceUuid = "12345678-9abc-def0-1122-334455667788".parse().unwrap();
        assert_eq!(uuid.as_le_bytes()[0], 0x88);
        assert_eq!(uuid.as_le_bytes()[15], 0x12);
        assert_eq!(uuid.to_string(), "12345678-9abc-def0-1122-334455667788");
    }

    #[test]
    fn test_parse_accepts_uppercase_simple_form() {
        let uuid: ServiceUuid = "0000FFFF00001000800000805F9B34FB".parse().unwrap();
        assert_eq!(uuid, DEFAULT_SERVICE_UUID);
    }

    #[test]
    fn test_parse_rejects_bad_length() {
        assert!("0000ffff-0000".parse::<ServiceUuid>().is_err());
    }

    #[test]
    fn test_parse_rejects_bad_digit() {
        assert!("0000fffg-0000-1000-8000-00805f9b34fb"
            .parse::<ServiceUuid>()
            .is_err());
    }

    #[test]
    fn test_parse_rejects_misplaced_dashes() {
        assert!("-0000ffff0000--1000800000805f9b34fb---"
            .parse::<ServiceUuid>()
            .is_err());
        assert!("0000ffff0-000-1000-8000-00805f9b34fb"
            .parse::<ServiceUuid>()
            .is_err());
    }

    #[test]
    fn test_parse_rejects_surrounding_whitespace() {
        assert!(" 0000ffff-0000-1000-8000-00805f9b34fb"
            .parse::<ServiceUuid>()
            .is_err());
    }

    #[test]
    fn test_uuid_conversion_is_big_endian_text() {
        let uuid = Uuid::from(DEFAULT_SERVICE_UUID);
        assert_eq!(uuid.as_u128(), 0x0000ffff_0000_1000_8000_00805f9b34fb);
        assert_eq!(ServiceUuid::from(uuid), DEFAULT_SERVICE_UUID);
    }

    #[test]
    fn test_with_short_uuid() {
        let derived = DEFAULT_SERVICE_UUID.with_short_uuid(0xff51);
        assert_eq!(derived.to_string(), "0000ff51-0000-1000-8000-00805f9b34fb");
        // Source is untouched.
        assert_eq!(
            DEFAULT_SERVICE_UUID.to_string(),
            "0000ffff-0000-1000-8000-00805f9b34fb"
        );
    }
}
