//! Authenticated field encryption
//!
//! Each secret field is sealed on its own with AES-256-GCM under a fresh
//! random 96-bit nonce, so equal plaintexts never produce equal ciphertexts.
//!
//! Stored format: `base64( nonce (12 bytes) | ciphertext + tag (16 bytes) )`

use crate::error::{Result, VaultError};
use crate::keys::VaultKey;
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::RngCore;

/// AES-GCM nonce length in bytes
pub const NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length in bytes
pub const TAG_LEN: usize = 16;

/// Process-wide cipher used at the vault read/write boundary
pub trait FieldCipher: Send + Sync {
    /// Seal a plaintext value into its stored form
    fn encrypt(&self, plaintext: &str) -> Result<String>;

    /// Open a stored value; fails with [`VaultError::Decryption`] on tampering
    /// or key mismatch
    fn decrypt(&self, ciphertext: &str) -> Result<String>;
}

/// AES-256-GCM field cipher keyed by the application key
pub struct AesGcmCipher {
    cipher: Aes256Gcm,
}

impl AesGcmCipher {
    pub fn new(key: &VaultKey) -> Self {
        Self {
            cipher: Aes256Gcm::new(key.as_bytes().into()),
        }
    }

    fn generate_nonce() -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);
        nonce
    }
}

impl FieldCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String> {
        let nonce = Self::generate_nonce();

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| VaultError::Encryption(format!("AES-256-GCM encryption failed: {}", e)))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String> {
        let data = STANDARD
            .decode(ciphertext)
            .map_err(|e| VaultError::Decryption(format!("ciphertext is not valid base64: {}", e)))?;

        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(VaultError::Decryption(format!(
                "ciphertext too short: {} bytes",
                data.len()
            )));
        }

        let (nonce, sealed) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| VaultError::Decryption("integrity check failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| VaultError::Decryption("plaintext is not valid UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cipher() -> AesGcmCipher {
        AesGcmCipher::new(&VaultKey::generate())
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = cipher();
        let sealed = cipher.encrypt("p@ss1").unwrap();

        assert_ne!(sealed, "p@ss1");
        assert_eq!(cipher.decrypt(&sealed).unwrap(), "p@ss1");
    }

    #[test]
    fn test_ciphertext_layout() {
        let cipher = cipher();
        let sealed = cipher.encrypt("alice").unwrap();
        let raw = STANDARD.decode(sealed).unwrap();

        assert_eq!(raw.len(), NONCE_LEN + "alice".len() + TAG_LEN);
    }

    #[test]
    fn test_wrong_key_fails_decryption() {
        let sealed = cipher().encrypt("work account").unwrap();
        let err = cipher().decrypt(&sealed).unwrap_err();

        assert!(matches!(err, VaultError::Decryption(_)));
    }

    #[test]
    fn test_tampered_ciphertext_detected() {
        let cipher = cipher();
        let mut raw = STANDARD.decode(cipher.encrypt("alice").unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;

        let err = cipher.decrypt(&STANDARD.encode(raw)).unwrap_err();
        assert!(matches!(err, VaultError::Decryption(_)));
    }

    #[test]
    fn test_truncated_ciphertext_rejected() {
        let cipher = cipher();
        let err = cipher.decrypt(&STANDARD.encode([0u8; 8])).unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_non_base64_rejected() {
        let err = cipher().decrypt("%%%not-base64%%%").unwrap_err();
        assert!(matches!(err, VaultError::Decryption(_)));
    }

    proptest! {
        #[test]
        fn prop_roundtrip(plaintext in ".*") {
            let cipher = cipher();
            let sealed = cipher.encrypt(&plaintext).unwrap();
            prop_assert_eq!(cipher.decrypt(&sealed).unwrap(), plaintext);
        }

        #[test]
        fn prop_same_plaintext_never_same_ciphertext(plaintext in ".*") {
            let cipher = cipher();
            let first = cipher.encrypt(&plaintext).unwrap();
            let second = cipher.encrypt(&plaintext).unwrap();
            prop_assert_ne!(first, second);
        }
    }
}
