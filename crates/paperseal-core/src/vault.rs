//! Paper encryption and decryption
//!
//! A question paper is encrypted exactly once, at creation time, with
//! ChaCha20-Poly1305 under a random 256-bit key. The sealed form (ciphertext
//! plus nonce) is the only persisted representation; decryption failure is
//! surfaced as `AuthenticationFailed` so callers can tell tampering apart
//! from an unmet release precondition.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Error, Result};

/// Size of the paper key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of the nonce in bytes (96 bits for ChaCha20-Poly1305)
pub const NONCE_SIZE: usize = 12;

/// Symmetric key protecting one paper (zeroized on drop)
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct PaperKey([u8; KEY_SIZE]);

impl PaperKey {
    /// Generate a fresh random key from the OS RNG
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Rebuild a key from reconstructed secret bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(Error::Crypto(format!(
                "paper key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for PaperKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PaperKey([REDACTED])")
    }
}

/// Encrypted paper content: ciphertext (with auth tag) plus nonce
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedPaper {
    /// Encrypted question set, auth tag included
    #[serde(with = "base64_bytes_vec")]
    pub ciphertext: Vec<u8>,

    /// Nonce used for this (single) encryption
    #[serde(with = "base64_bytes_12")]
    pub nonce: [u8; NONCE_SIZE],
}

/// Encrypt plaintext under `key` with a fresh random nonce
pub fn encrypt(plaintext: &[u8], key: &PaperKey) -> Result<SealedPaper> {
    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| Error::Crypto(format!("failed to create cipher: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from(nonce_bytes);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| Error::Crypto(format!("encryption failed: {}", e)))?;

    Ok(SealedPaper {
        ciphertext,
        nonce: nonce_bytes,
    })
}

/// Decrypt a sealed paper, verifying the auth tag
pub fn decrypt(sealed: &SealedPaper, key: &PaperKey) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new_from_slice(key.as_bytes())
        .map_err(|e| Error::Crypto(format!("failed to create cipher: {}", e)))?;

    let nonce = Nonce::from(sealed.nonce);

    cipher
        .decrypt(&nonce, sealed.ciphertext.as_slice())
        .map_err(|_| Error::AuthenticationFailed)
}

// =============================================================================
// Serde helpers for byte fields
// =============================================================================

mod base64_bytes_12 {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8; 12], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 12], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)?;
        bytes
            .try_into()
            .map_err(|_| serde::de::Error::custom("Invalid length"))
    }
}

mod base64_bytes_vec {
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        base64::engine::general_purpose::STANDARD
            .decode(&s)
            .map_err(serde::de::Error::custom)
    }
}
