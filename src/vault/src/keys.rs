//! Application key material for field encryption
//!
//! The key is provisioned by the deployment environment, parsed once at
//! process start and handed to the cipher. It is never rotated here.

use crate::error::{Result, VaultError};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;
use std::fmt;
use std::str::FromStr;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Prefix accepted on configured keys, e.g. `base64:q1w2...`
pub const KEY_PREFIX: &str = "base64:";

/// 256-bit symmetric key, zeroized on drop
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey([u8; VaultKey::LEN]);

impl VaultKey {
    /// Key length in bytes
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Generate a random key (for provisioning and tests)
    pub fn generate() -> Self {
        let mut bytes = [0u8; Self::LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse a configured key: base64 of exactly 32 bytes, optionally
    /// prefixed with `base64:`
    pub fn parse(encoded: &str) -> Result<Self> {
        let trimmed = encoded.trim();
        let body = trimmed.strip_prefix(KEY_PREFIX).unwrap_or(trimmed);
        if body.is_empty() {
            return Err(VaultError::InvalidKey("key is empty".to_string()));
        }

        let mut decoded = STANDARD
            .decode(body)
            .map_err(|e| VaultError::InvalidKey(format!("key is not valid base64: {}", e)))?;

        if decoded.len() != Self::LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(VaultError::InvalidKey(format!(
                "key must be {} bytes, got {}",
                Self::LEN,
                len
            )));
        }

        let mut bytes = [0u8; Self::LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(bytes))
    }

    /// Encode in the configuration format accepted by [`VaultKey::parse`]
    pub fn to_config_string(&self) -> String {
        format!("{}{}", KEY_PREFIX, STANDARD.encode(self.0))
    }

    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }
}

impl FromStr for VaultKey {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_prefix() {
        let key = VaultKey::generate();
        let parsed = VaultKey::parse(&key.to_config_string()).unwrap();
        assert_eq!(parsed.as_bytes(), key.as_bytes());
    }

    #[test]
    fn test_parse_without_prefix() {
        let encoded = STANDARD.encode([7u8; 32]);
        let parsed: VaultKey = encoded.parse().unwrap();
        assert_eq!(parsed.as_bytes(), &[7u8; 32]);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let encoded = STANDARD.encode([1u8; 16]);
        let err = VaultKey::parse(&encoded).unwrap_err();
        assert!(matches!(err, VaultError::InvalidKey(_)));
        assert!(err.to_string().contains("32 bytes"));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(VaultKey::parse("base64:not*base64").is_err());
        assert!(VaultKey::parse("").is_err());
        assert!(VaultKey::parse("base64:").is_err());
    }

    #[test]
    fn test_debug_redacts_material() {
        let key = VaultKey::from_bytes([0xAB; 32]);
        let debug = format!("{:?}", key);
        assert_eq!(debug, "VaultKey(<redacted>)");
    }

    #[test]
    fn test_generated_keys_differ() {
        assert_ne!(VaultKey::generate().as_bytes(), VaultKey::generate().as_bytes());
    }
}
