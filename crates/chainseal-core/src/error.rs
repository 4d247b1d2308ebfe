//! Error types for Chainseal Core.

use thiserror::Error;

/// Low-level errors from encoding and the cipher.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),

    #[error("encryption error: {0}")]
    EncryptionError(String),

    #[error("decryption error: {0}")]
    DecryptionError(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Errors returned by [`Document::finalize`](crate::Document::finalize).
#[derive(Debug, Error)]
pub enum FinalizeError {
    /// The draft has no items to seal.
    #[error("document has no items to finalize")]
    EmptyDocument,

    /// The document was already sealed. Finalization is one-shot.
    #[error("document is already finalized")]
    AlreadyFinalized,

    /// Part count must be at least 1.
    #[error("invalid part count: {0}")]
    InvalidPartCount(usize),

    /// Chain building failed; the draft is left untouched.
    #[error("sealing failed: {0}")]
    Seal(#[from] CoreError),
}

/// Errors returned by [`read`](crate::read).
#[derive(Debug, Error)]
pub enum ReadError {
    /// Only finalized documents can be read.
    #[error("document is not finalized")]
    NotFinalized,

    /// A chunk did not decrypt (wrong key or corrupted ciphertext).
    #[error("decryption failed for chunk {index}")]
    Decryption { index: usize },

    /// A chunk decrypted but its payload could not be decoded.
    #[error("malformed payload in chunk {index}: {reason}")]
    MalformedPayload { index: usize, reason: String },
}

/// Errors raised when rebuilding a sealed document from stored parts.
#[derive(Debug, Error)]
pub enum RestoreError {
    #[error("a sealed document needs at least one chunk")]
    NoChunks,
}

/// A stored chunk field that does not fit the typed [`Chunk`](crate::Chunk).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkFieldError {
    #[error("index {0} is out of range")]
    Index(i64),

    #[error("prevHash {0:?} is neither GENESIS nor a lowercase 64-char hex hash")]
    PrevHash(String),

    #[error("hash is {0} bytes, expected 32")]
    HashLength(usize),

    #[error("iv is {0} bytes, expected 12")]
    IvLength(usize),
}

/// Errors parsing a symmetric key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("key is not valid hex")]
    InvalidEncoding,

    #[error("key must be {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },
}
