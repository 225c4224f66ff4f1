//! Ciphertext handles, principals, and ciphertext kinds.
//!
//! A [`Handle`] is an opaque 32-byte reference to an encrypted value held by
//! the coprocessor host. The leading 30 bytes are a BLAKE3 digest over the
//! domain-separated creation preimage; byte 30 carries the ciphertext kind
//! and byte 31 the handle-format version. Handles are unique per
//! encryption or operation result and say nothing about the plaintext.
//!
//! A [`Principal`] is a 20-byte account address: either a contract that
//! operates on handles or a user that decrypts them.

use std::fmt;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Size of a ciphertext handle in bytes.
pub const HANDLE_SIZE: usize = 32;

/// Size of a principal address in bytes.
pub const PRINCIPAL_SIZE: usize = 20;

/// Current handle-format version, stamped into byte 31 of every handle.
pub const HANDLE_VERSION: u8 = 1;

// =============================================================================
// Ciphertext kinds
// =============================================================================

/// The plaintext type backing a ciphertext handle.
///
/// The discriminant is the type byte stamped into byte 30 of the handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CiphertextKind {
    /// Encrypted boolean, stored as 0 or 1.
    Bool = 0,
    /// Encrypted 8-bit unsigned integer.
    Uint8 = 2,
    /// Encrypted 16-bit unsigned integer.
    Uint16 = 3,
    /// Encrypted 32-bit unsigned integer.
    Uint32 = 4,
    /// Encrypted 64-bit unsigned integer.
    Uint64 = 5,
    /// Encrypted 128-bit unsigned integer.
    Uint128 = 6,
}

impl CiphertextKind {
    /// Parses a kind from its handle type byte.
    #[must_use]
    pub const fn from_type_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Bool),
            2 => Some(Self::Uint8),
            3 => Some(Self::Uint16),
            4 => Some(Self::Uint32),
            5 => Some(Self::Uint64),
            6 => Some(Self::Uint128),
            _ => None,
        }
    }

    /// Returns the type byte stamped into handles of this kind.
    #[must_use]
    pub const fn type_byte(self) -> u8 {
        self as u8
    }

    /// Returns the plaintext bit width of this kind.
    #[must_use]
    pub const fn bit_width(self) -> u32 {
        match self {
            Self::Bool => 1,
            Self::Uint8 => 8,
            Self::Uint16 => 16,
            Self::Uint32 => 32,
            Self::Uint64 => 64,
            Self::Uint128 => 128,
        }
    }

    /// Returns the mask that truncates a plaintext to this kind's width.
    #[must_use]
    pub const fn mask(self) -> u128 {
        match self {
            Self::Uint128 => u128::MAX,
            _ => (1u128 << self.bit_width()) - 1,
        }
    }

    /// Returns `true` for the integer kinds (everything but `Bool`).
    #[must_use]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::Bool)
    }
}

impl fmt::Display for CiphertextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "ebool",
            Self::Uint8 => "euint8",
            Self::Uint16 => "euint16",
            Self::Uint32 => "euint32",
            Self::Uint64 => "euint64",
            Self::Uint128 => "euint128",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// Handle
// =============================================================================

/// Opaque reference to an encrypted value held by the coprocessor host.
///
/// Handles serialize as `0x`-prefixed hex strings. Two handles are equal
/// only if they reference the same encryption or operation result; nothing
/// about the plaintext can be recovered from the handle bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle([u8; HANDLE_SIZE]);

impl Handle {
    /// Builds a handle from a creation digest, stamping kind and version
    /// into the trailing bytes.
    #[must_use]
    pub(crate) fn from_digest(mut digest: [u8; HANDLE_SIZE], kind: CiphertextKind) -> Self {
        digest[30] = kind.type_byte();
        digest[31] = HANDLE_VERSION;
        Self(digest)
    }

    /// Returns the raw handle bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; HANDLE_SIZE] {
        &self.0
    }

    /// Returns the ciphertext kind stamped into the handle, if the type
    /// byte is recognized.
    ///
    /// The registry record is authoritative; this is a wire-level hint.
    #[must_use]
    pub const fn kind(&self) -> Option<CiphertextKind> {
        CiphertextKind::from_type_byte(self.0[30])
    }

    /// Returns the handle-format version stamped into the handle.
    #[must_use]
    pub const fn version(&self) -> u8 {
        self.0[31]
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle(0x{})", hex::encode(self.0))
    }
}

impl Serialize for Handle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for Handle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(stripped).map_err(DeError::custom)?;
        let array: [u8; HANDLE_SIZE] = bytes
            .try_into()
            .map_err(|_| DeError::custom("handle must be 32 bytes"))?;
        Ok(Self(array))
    }
}

// =============================================================================
// Principal
// =============================================================================

/// A 20-byte account address: a contract or a user.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Principal([u8; PRINCIPAL_SIZE]);

impl Principal {
    /// The all-zero address. Never a valid caller or grantee.
    pub const ZERO: Self = Self([0u8; PRINCIPAL_SIZE]);

    /// Builds a principal from raw address bytes.
    #[must_use]
    pub const fn new(bytes: [u8; PRINCIPAL_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derives a stable principal from a human-readable label.
    ///
    /// Intended for examples and tests, where addresses are named rather
    /// than generated by key material.
    #[must_use]
    pub fn from_label(label: &str) -> Self {
        let digest = blake3::hash(label.as_bytes());
        let mut bytes = [0u8; PRINCIPAL_SIZE];
        bytes.copy_from_slice(&digest.as_bytes()[..PRINCIPAL_SIZE]);
        Self(bytes)
    }

    /// Returns the raw address bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; PRINCIPAL_SIZE] {
        &self.0
    }

    /// Returns `true` for the all-zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; PRINCIPAL_SIZE]
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal(0x{})", hex::encode(self.0))
    }
}

impl Serialize for Principal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for Principal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let stripped = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(stripped).map_err(DeError::custom)?;
        let array: [u8; PRINCIPAL_SIZE] = bytes
            .try_into()
            .map_err(|_| DeError::custom("principal must be 20 bytes"))?;
        Ok(Self(array))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_stamps_kind_and_version() {
        let handle = Handle::from_digest([0xAB; 32], CiphertextKind::Uint64);
        assert_eq!(handle.kind(), Some(CiphertextKind::Uint64));
        assert_eq!(handle.version(), HANDLE_VERSION);
        assert_eq!(handle.as_bytes()[..30], [0xAB; 30]);
    }

    #[test]
    fn unknown_type_byte_yields_no_kind() {
        let mut digest = [0u8; 32];
        digest[30] = 0xFF;
        let raw = Handle(digest);
        assert_eq!(raw.kind(), None);
    }

    #[test]
    fn kind_masks_match_widths() {
        assert_eq!(CiphertextKind::Bool.mask(), 1);
        assert_eq!(CiphertextKind::Uint8.mask(), 0xFF);
        assert_eq!(CiphertextKind::Uint64.mask(), u128::from(u64::MAX));
        assert_eq!(CiphertextKind::Uint128.mask(), u128::MAX);
    }

    #[test]
    fn handle_serializes_as_hex_string() {
        let handle = Handle::from_digest([0x11; 32], CiphertextKind::Uint32);
        let json = serde_json::to_string(&handle).expect("serialize");
        assert!(json.starts_with("\"0x11"));
        let back: Handle = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, handle);
    }

    #[test]
    fn principal_rejects_wrong_length() {
        let err = serde_json::from_str::<Principal>("\"0x1234\"");
        assert!(err.is_err());
    }

    #[test]
    fn labeled_principals_are_stable_and_distinct() {
        let alice = Principal::from_label("alice");
        assert_eq!(alice, Principal::from_label("alice"));
        assert_ne!(alice, Principal::from_label("bob"));
        assert!(!alice.is_zero());
        assert!(Principal::ZERO.is_zero());
    }
}
