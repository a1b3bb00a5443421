//! AES-256-GCM authenticated encryption.
//!
//! Every call to [`encrypt`] draws a fresh random 96-bit nonce, so callers
//! never supply one. The authentication tag is returned detached from the
//! ciphertext and is verified before any plaintext is released.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce, Tag};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, SecretError};

pub const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key. Zeroed on drop, never printed.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Wrap existing key material. Must be exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_SIZE] = bytes.try_into().map_err(|_| {
            SecretError::Validation(format!(
                "symmetric key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self { bytes })
    }

    /// Parse a hex-encoded key.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let mut decoded = hex::decode(hex_key.trim())
            .map_err(|e| SecretError::Validation(format!("key is not valid hex: {e}")))?;
        let key = Self::from_bytes(&decoded);
        decoded.zeroize();
        key
    }

    /// Hex encoding of the key material.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }

    /// Derive a purpose-bound subkey via HKDF-SHA256.
    pub fn derive(&self, info: &[u8]) -> Result<Self> {
        let hk = Hkdf::<Sha256>::new(None, &self.bytes);
        let mut okm = [0u8; KEY_SIZE];
        hk.expand(info, &mut okm)
            .map_err(|e| SecretError::EncryptionFailed(format!("key derivation failed: {e}")))?;
        Ok(Self { bytes: okm })
    }

    fn cipher(&self) -> Aes256Gcm {
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&self.bytes))
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey([REDACTED])")
    }
}

/// Ciphertext plus the nonce and detached tag needed to open it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherBundle {
    pub ciphertext: Vec<u8>,
    pub nonce: [u8; NONCE_SIZE],
    pub auth_tag: [u8; TAG_SIZE],
}

impl CipherBundle {
    /// Decrypt this bundle with `key`.
    pub fn open(&self, key: &SymmetricKey) -> Result<String> {
        decrypt(&self.ciphertext, key, &self.nonce, &self.auth_tag)
    }

    /// Base64 form suitable for JSON transport or storage.
    pub fn encode(&self) -> EncodedBundle {
        EncodedBundle {
            ciphertext: STANDARD.encode(&self.ciphertext),
            nonce: STANDARD.encode(self.nonce),
            auth_tag: STANDARD.encode(self.auth_tag),
        }
    }
}

/// Base64-encoded [`CipherBundle`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedBundle {
    pub ciphertext: String,
    pub nonce: String,
    pub auth_tag: String,
}

impl EncodedBundle {
    /// Decode back into raw bytes, checking nonce and tag lengths.
    pub fn decode(&self) -> Result<CipherBundle> {
        let ciphertext = decode_field("ciphertext", &self.ciphertext)?;
        let nonce = decode_field("nonce", &self.nonce)?;
        let auth_tag = decode_field("auth_tag", &self.auth_tag)?;

        Ok(CipherBundle {
            ciphertext,
            nonce: fixed_len("nonce", &nonce)?,
            auth_tag: fixed_len("auth_tag", &auth_tag)?,
        })
    }
}

fn decode_field(field: &str, value: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(value)
        .map_err(|e| SecretError::Validation(format!("{field} is not valid base64: {e}")))
}

fn fixed_len<const N: usize>(field: &str, bytes: &[u8]) -> Result<[u8; N]> {
    bytes.try_into().map_err(|_| {
        SecretError::Validation(format!("{field} must be {N} bytes, got {}", bytes.len()))
    })
}

/// Generate a new random 256-bit key.
pub fn generate_key() -> SymmetricKey {
    SymmetricKey::generate()
}

/// Encrypt `plaintext` under `key` with a fresh random nonce.
pub fn encrypt(plaintext: &str, key: &SymmetricKey) -> Result<CipherBundle> {
    let mut nonce = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce);

    let mut buffer = plaintext.as_bytes().to_vec();
    let tag = key
        .cipher()
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
        .map_err(|e| SecretError::EncryptionFailed(e.to_string()))?;

    let mut auth_tag = [0u8; TAG_SIZE];
    auth_tag.copy_from_slice(tag.as_slice());

    Ok(CipherBundle {
        ciphertext: buffer,
        nonce,
        auth_tag,
    })
}

/// Verify and decrypt.
///
/// Any mismatch between ciphertext, key, nonce and tag is reported as
/// [`SecretError::AuthenticationFailed`]; no plaintext is returned in that
/// case. Malformed nonce or tag lengths are validation errors.
pub fn decrypt(ciphertext: &[u8], key: &SymmetricKey, nonce: &[u8], auth_tag: &[u8]) -> Result<String> {
    if nonce.len() != NONCE_SIZE {
        return Err(SecretError::Validation(format!(
            "nonce must be {NONCE_SIZE} bytes, got {}",
            nonce.len()
        )));
    }
    if auth_tag.len() != TAG_SIZE {
        return Err(SecretError::Validation(format!(
            "authentication tag must be {TAG_SIZE} bytes, got {}",
            auth_tag.len()
        )));
    }

    let mut buffer = ciphertext.to_vec();
    if key
        .cipher()
        .decrypt_in_place_detached(
            Nonce::from_slice(nonce),
            b"",
            &mut buffer,
            Tag::from_slice(auth_tag),
        )
        .is_err()
    {
        buffer.zeroize();
        return Err(SecretError::AuthenticationFailed);
    }

    String::from_utf8(buffer).map_err(|e| {
        let mut bytes = e.into_bytes();
        bytes.zeroize();
        SecretError::Validation("decrypted payload is not valid UTF-8".to_string())
    })
}
