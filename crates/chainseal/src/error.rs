//! Error types for the Chainseal facade.

use chainseal_core::{DocumentId, FinalizeError, KeyError, ReadError};
use chainseal_store::StoreError;
use thiserror::Error;

/// Startup configuration errors. Any of these is fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The key variable is not set.
    #[error("missing encryption key: set {0}")]
    MissingKey(&'static str),

    /// The key is not hex.
    #[error("encryption key in {0} is not valid hex")]
    InvalidKeyEncoding(&'static str),

    /// The key decodes to the wrong number of bytes.
    #[error("encryption key in {var} must be {expected} bytes, got {got}")]
    InvalidKeyLength {
        var: &'static str,
        expected: usize,
        got: usize,
    },

    /// Part count is not a positive integer.
    #[error("invalid part count {value:?} in {var}: must be an integer >= 1")]
    InvalidPartCount { var: &'static str, value: String },
}

impl ConfigError {
    pub(crate) fn from_key_error(var: &'static str, err: KeyError) -> Self {
        match err {
            KeyError::InvalidEncoding => ConfigError::InvalidKeyEncoding(var),
            KeyError::InvalidLength { expected, got } => {
                ConfigError::InvalidKeyLength { var, expected, got }
            }
        }
    }
}

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum SealError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Finalization precondition or sealing failure.
    #[error("finalize error: {0}")]
    Finalize(#[from] FinalizeError),

    /// Reading a sealed document failed.
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// No draft or sealed chain with this id.
    #[error("document not found: {0}")]
    DocumentNotFound(DocumentId),

    /// The access-control collaborator denied the read.
    #[error("not authorized to read document {0}")]
    NotAuthorized(DocumentId),
}

/// Result type for vault operations.
pub type Result<T> = std::result::Result<T, SealError>;
