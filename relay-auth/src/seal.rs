//! AES-256-GCM sealing of access tokens before they leave the process.
//!
//! Sealed values are `base64(nonce || ciphertext)` so they fit a text column.
//! The key is a 32-byte value supplied as 64 hex characters.

use std::fmt;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::{rngs::OsRng, RngCore};

use crate::error::{config_error, storage_error, ConfigErrorKind, Error, StorageErrorKind};

/// 12-byte nonce size for AES-GCM
const NONCE_SIZE: usize = 12;

/// Seals and opens secrets with a key parsed once at startup.
#[derive(Clone)]
pub struct TokenSealer {
    cipher: Aes256Gcm,
}

impl TokenSealer {
    /// Parse a hex-encoded 32-byte key.
    pub fn from_hex_key(key_hex: &str) -> Result<Self, Error> {
        let bytes = hex::decode(key_hex.trim()).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: crate::ErrorKind::Config(ConfigErrorKind::InvalidEncryptionKey),
        })?;
        if bytes.len() != 32 {
            return Err(config_error(
                ConfigErrorKind::InvalidEncryptionKey,
                "Encryption key must be 32 bytes (64 hex characters)",
            ));
        }

        let cipher = Aes256Gcm::new_from_slice(&bytes).map_err(|_| {
            config_error(
                ConfigErrorKind::InvalidEncryptionKey,
                "Encryption key rejected by cipher",
            )
        })?;

        Ok(Self { cipher })
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn seal(&self, plaintext: &str) -> Result<String, Error> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| storage_error(StorageErrorKind::EncryptionFailed, "AES-GCM encryption failed"))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// Decrypt a value produced by [`TokenSealer::seal`].
    pub fn open(&self, sealed: &str) -> Result<String, Error> {
        let decryption_failed =
            |message: &str| storage_error(StorageErrorKind::DecryptionFailed, message);

        let combined = BASE64
            .decode(sealed)
            .map_err(|_| decryption_failed("Sealed value is not valid base64"))?;

        if combined.len() < NONCE_SIZE {
            return Err(decryption_failed("Sealed value is shorter than its nonce"));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| decryption_failed("Authentication tag mismatch"))?;

        String::from_utf8(plaintext).map_err(|_| decryption_failed("Sealed value is not UTF-8"))
    }
}

impl fmt::Debug for TokenSealer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSealer([REDACTED])")
    }
}
