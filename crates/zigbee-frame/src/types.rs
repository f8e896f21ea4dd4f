//! Network address types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::FrameError;

/// Size of a long (IEEE) address in bytes.
pub const ADDR_LONG_SIZE: usize = 8;
/// Size of a short (network) address in bytes.
pub const ADDR_SHORT_SIZE: usize = 2;

/// A 64-bit long address, stored in wire (big-endian) order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address64(pub [u8; ADDR_LONG_SIZE]);

impl Address64 {
    /// Broadcast long address.
    pub const BROADCAST: Address64 = Address64([0, 0, 0, 0, 0, 0, 0xFF, 0xFF]);

    /// Create a new address from bytes.
    pub fn new(bytes: [u8; ADDR_LONG_SIZE]) -> Self {
        Address64(bytes)
    }

    /// Create from a slice. Returns None if slice is wrong length.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == ADDR_LONG_SIZE {
            let mut bytes = [0u8; ADDR_LONG_SIZE];
            bytes.copy_from_slice(slice);
            Some(Address64(bytes))
        } else {
            None
        }
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ADDR_LONG_SIZE] {
        &self.0
    }

    /// Bytes in little-endian (reversed) order, as AlertMe payloads carry them.
    pub fn to_le_bytes(&self) -> [u8; ADDR_LONG_SIZE] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }

    /// Build from little-endian (reversed) bytes.
    pub fn from_le_bytes(mut bytes: [u8; ADDR_LONG_SIZE]) -> Self {
        bytes.reverse();
        Address64(bytes)
    }
}

/// Renders as colon-separated lowercase hex octets, e.g. `00:0d:6f:00:01:72:f7:1b`.
impl fmt::Display for Address64 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for Address64 {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let compact: String = s.split(':').collect();
        if compact.len() != ADDR_LONG_SIZE * 2 {
            return Err(FrameError::invalid_address(format!(
                "long address must have 8 octets: '{}'",
                s
            )));
        }
        let bytes = hex::decode(&compact)
            .map_err(|e| FrameError::invalid_address(format!("'{}': {}", s, e)))?;
        Address64::from_slice(&bytes)
            .ok_or_else(|| FrameError::invalid_address(format!("'{}'", s)))
    }
}

impl Serialize for Address64 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 16-bit short address, stored in wire (big-endian) order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address16(pub [u8; ADDR_SHORT_SIZE]);

impl Address16 {
    /// "Unknown" short address used when only the long address is known.
    pub const UNKNOWN: Address16 = Address16([0xFF, 0xFE]);

    /// Create a new address from bytes.
    pub fn new(bytes: [u8; ADDR_SHORT_SIZE]) -> Self {
        Address16(bytes)
    }

    /// Create from a slice. Returns None if slice is wrong length.
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() == ADDR_SHORT_SIZE {
            Some(Address16([slice[0], slice[1]]))
        } else {
            None
        }
    }

    /// Get the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; ADDR_SHORT_SIZE] {
        &self.0
    }

    /// Bytes in little-endian (reversed) order.
    pub fn to_le_bytes(&self) -> [u8; ADDR_SHORT_SIZE] {
        [self.0[1], self.0[0]]
    }

    /// Build from little-endian (reversed) bytes.
    pub fn from_le_bytes(bytes: [u8; ADDR_SHORT_SIZE]) -> Self {
        Address16([bytes[1], bytes[0]])
    }
}

impl fmt::Display for Address16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl FromStr for Address16 {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.trim_start_matches("0x");
        if digits.len() != ADDR_SHORT_SIZE * 2 {
            return Err(FrameError::invalid_address(format!(
                "short address must have 4 hex digits: '{}'",
                s
            )));
        }
        let bytes = hex::decode(digits)
            .map_err(|e| FrameError::invalid_address(format!("'{}': {}", s, e)))?;
        Address16::from_slice(&bytes)
            .ok_or_else(|| FrameError::invalid_address(format!("'{}'", s)))
    }
}

impl Serialize for Address16 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address16 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
