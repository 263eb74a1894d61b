//! Encryption of saved conversations.
//!
//! Sealed values are `base64(nonce || ciphertext)` under ChaCha20-Poly1305
//! with a fresh random nonce per value.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use secrecy::SecretString;

use crate::error::{ConfigError, StoreError};

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Symmetric key used to seal candidate data at rest.
#[derive(Clone)]
pub struct SealingKey {
    cipher: ChaCha20Poly1305,
}

impl std::fmt::Debug for SealingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SealingKey([REDACTED])")
    }
}

impl SealingKey {
    /// A new random key, with its base64 form for saving elsewhere.
    pub fn generate() -> (Self, SecretString) {
        let key = ChaCha20Poly1305::generate_key(&mut OsRng);
        let encoded = SecretString::from(BASE64_STANDARD.encode(key));
        (
            Self {
                cipher: ChaCha20Poly1305::new(&key),
            },
            encoded,
        )
    }

    /// Parse a base64-encoded 32-byte key.
    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "TALENT_SCOUT_ENCRYPTION_KEY".to_string(),
            message,
        };
        let bytes = BASE64_STANDARD
            .decode(encoded.trim())
            .map_err(|e| invalid(format!("not valid base64: {e}")))?;
        if bytes.len() != KEY_LEN {
            return Err(invalid(format!(
                "expected {KEY_LEN} bytes, got {}",
                bytes.len()
            )));
        }
        let cipher = ChaCha20Poly1305::new_from_slice(&bytes)
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self { cipher })
    }

    pub fn seal(&self, plaintext: &[u8]) -> Result<String, StoreError> {
        let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| StoreError::Crypto("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(BASE64_STANDARD.encode(sealed))
    }

    /// Decrypt a value produced by `seal`. Fails on a wrong key or tampered data.
    pub fn open(&self, sealed: &str) -> Result<Vec<u8>, StoreError> {
        let bytes = BASE64_STANDARD
            .decode(sealed)
            .map_err(|e| StoreError::Crypto(format!("sealed data is not base64: {e}")))?;
        if bytes.len() <= NONCE_LEN {
            return Err(StoreError::Crypto("sealed data is truncated".to_string()));
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| {
                StoreError::Crypto("decryption failed: wrong key or corrupted data".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn seal_and_open() {
        let (key, _) = SealingKey::generate();
        let sealed = key.seal(b"asha@example.com").unwrap();
        assert!(!sealed.contains("asha"));
        assert_eq!(key.open(&sealed).unwrap(), b"asha@example.com");
    }

    #[test]
    fn same_plaintext_seals_differently() {
        let (key, _) = SealingKey::generate();
        assert_ne!(key.seal(b"Asha Rao").unwrap(), key.seal(b"Asha Rao").unwrap());
    }

    #[test]
    fn encoded_key_reopens_sealed_data() {
        let (key, encoded) = SealingKey::generate();
        let sealed = key.seal(b"+91 98765 43210").unwrap();
        let restored = SealingKey::from_base64(encoded.expose_secret()).unwrap();
        assert_eq!(restored.open(&sealed).unwrap(), b"+91 98765 43210");
    }

    #[test]
    fn wrong_key_fails_to_open() {
        let (key, _) = SealingKey::generate();
        let (other, _) = SealingKey::generate();
        let sealed = key.seal(b"secret").unwrap();
        assert!(matches!(other.open(&sealed), Err(StoreError::Crypto(_))));
        assert!(matches!(key.open("AAAA"), Err(StoreError::Crypto(_))));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(SealingKey::from_base64("not base64!").is_err());
        assert!(SealingKey::from_base64(&BASE64_STANDARD.encode([0u8; 16])).is_err());
        assert!(SealingKey::from_base64(&BASE64_STANDARD.encode([7u8; 32])).is_ok());
    }

    #[test]
    fn debug_does_not_print_key() {
        let (key, _) = SealingKey::generate();
        assert_eq!(format!("{key:?}"), "SealingKey([REDACTED])");
    }
}
