//! Cryptographic primitives for Chainseal.
//!
//! Wraps Blake3 hashing and ChaCha20-Poly1305 encryption with strong types.
//! The key lives in a [`CryptoContext`] built once at startup and passed by
//! reference to every component that seals or opens chunks.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::{CoreError, KeyError};

/// Length of the symmetric key in bytes.
pub const KEY_LEN: usize = 32;

/// Length of a chunk IV (ChaCha20-Poly1305 nonce) in bytes.
pub const IV_LEN: usize = 12;

/// A 32-byte Blake3 hash of a chunk's canonical payload.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkHash(pub [u8; 32]);

impl ChunkHash {
    /// Compute the Blake3 hash of the given data.
    pub fn hash(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ChunkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for ChunkHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for ChunkHash {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for ChunkHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChunkHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A 96-bit initialization vector, generated fresh for every chunk.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ChunkIv(pub [u8; IV_LEN]);

impl ChunkIv {
    /// Generate a new random IV.
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; IV_LEN]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; IV_LEN] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        Self::try_from(bytes.as_slice()).map_err(|_| hex::FromHexError::InvalidStringLength)
    }
}

impl fmt::Debug for ChunkIv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkIv({})", self.to_hex())
    }
}

impl TryFrom<&[u8]> for ChunkIv {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; IV_LEN] = slice.try_into()?;
        Ok(Self(arr))
    }
}

impl Serialize for ChunkIv {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ChunkIv {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// A 256-bit symmetric key for ChaCha20-Poly1305.
///
/// `Debug` never prints key material.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// Generate a new random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Create from a slice, rejecting anything but exactly 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        let arr: [u8; KEY_LEN] = bytes.try_into().map_err(|_| KeyError::InvalidLength {
            expected: KEY_LEN,
            got: bytes.len(),
        })?;
        Ok(Self(arr))
    }

    /// Parse from a 64-character hex string.
    pub fn from_hex(s: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(s.trim()).map_err(|_| KeyError::InvalidEncoding)?;
        Self::from_slice(&bytes)
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(<redacted>)")
    }
}

/// The process-wide crypto handle.
///
/// Built once from configuration and shared read-only by the chain
/// builder, the reader and the verifier.
#[derive(Clone, Debug)]
pub struct CryptoContext {
    key: EncryptionKey,
}

impl CryptoContext {
    /// Create a context around a loaded key.
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }

    /// Encrypt a payload under a fresh random IV.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<(ChunkIv, Vec<u8>), CoreError> {
        let cipher = ChaCha20Poly1305::new_from_slice(self.key.as_bytes())
            .map_err(|e| CoreError::EncryptionError(e.to_string()))?;

        let iv = ChunkIv::generate();
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(iv.as_bytes()), plaintext)
            .map_err(|e| CoreError::EncryptionError(e.to_string()))?;

        Ok((iv, ciphertext))
    }

    /// Decrypt and authenticate a payload.
    pub fn decrypt(&self, iv: &ChunkIv, ciphertext: &[u8]) -> Result<Vec<u8>, CoreError> {
        let cipher = ChaCha20Poly1305::new_from_slice(self.key.as_bytes())
            .map_err(|e| CoreError::DecryptionError(e.to_string()))?;

        cipher
            .decrypt(Nonce::from_slice(iv.as_bytes()), ciphertext)
            .map_err(|e| CoreError::DecryptionError(e.to_string()))
    }
}
