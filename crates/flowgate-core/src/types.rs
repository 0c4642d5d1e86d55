//! Strong type definitions for Flowgate.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 20-byte account or component address.
///
/// Freshly instantiated components get their address from
/// [`Address::derive`], which hashes the deployer and an instantiation
/// salt. Two derivations with the same inputs yield the same address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// Derive a fresh component address from a deployer and salt.
    pub fn derive(deployer: &Address, salt: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"flowgate-addr-v0:");
        hasher.update(&deployer.0);
        hasher.update(b":");
        hasher.update(&salt.to_le_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest.as_bytes()[..20]);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Generate a random address.
    pub fn random() -> Self {
        Self(rand::random())
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 20 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 20];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    /// The zero address (sentinel).
    pub const ZERO: Self = Self([0u8; 20]);
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// Identifier of a streaming asset.
///
/// Tokens are addressed entities in the host, so this wraps [`Address`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub Address);

impl TokenId {
    /// Create from an address.
    pub const fn from_address(address: Address) -> Self {
        Self(address)
    }

    /// The underlying address.
    pub const fn address(&self) -> &Address {
        &self.0
    }
}

impl fmt::Debug for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TokenId({})", &self.0.to_hex()[..12])
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A flow rate in tokens per second.
///
/// Unsigned: negative rates are unrepresentable. A flow whose rate is
/// zero is semantically deleted.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct FlowRate(pub u128);

impl FlowRate {
    /// The zero rate.
    pub const ZERO: Self = Self(0);

    /// Create a new flow rate.
    pub const fn new(rate: u128) -> Self {
        Self(rate)
    }

    /// The raw tokens-per-second value.
    pub const fn get(&self) -> u128 {
        self.0
    }

    /// Whether this rate is zero.
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checked addition of two rates.
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Saturating subtraction of two rates.
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    /// The amount streamed over `secs` seconds, if it fits.
    pub fn checked_amount(self, secs: u64) -> Option<u128> {
        self.0.checked_mul(secs as u128)
    }
}

impl fmt::Debug for FlowRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FlowRate({})", self.0)
    }
}

impl fmt::Display for FlowRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u128> for FlowRate {
    fn from(rate: u128) -> Self {
        Self(rate)
    }
}
