//! Startup configuration.
//!
//! The key is loaded once and validated eagerly so a bad deployment fails
//! before the first document is sealed.

use std::fmt;
use std::num::NonZeroUsize;

use chainseal_core::{CryptoContext, EncryptionKey};

use crate::error::ConfigError;

/// Environment variable holding the hex-encoded 32-byte key.
pub const KEY_VAR: &str = "CHAINSEAL_KEY";

/// Environment variable holding the default part count.
pub const PART_COUNT_VAR: &str = "CHAINSEAL_PART_COUNT";

/// Part count used when none is configured.
pub const DEFAULT_PART_COUNT: usize = 5;

/// Sealing configuration.
#[derive(Clone)]
pub struct SealConfig {
    /// Process-wide symmetric key.
    pub key: EncryptionKey,
    /// Default number of segments per document.
    pub part_count: NonZeroUsize,
}

impl SealConfig {
    /// Build a config from an explicit key with the default part count.
    pub fn new(key: EncryptionKey) -> Self {
        Self {
            key,
            part_count: default_part_count(),
        }
    }

    /// Override the default part count.
    pub fn with_part_count(mut self, part_count: NonZeroUsize) -> Self {
        self.part_count = part_count;
        self
    }

    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_key = lookup(KEY_VAR)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::MissingKey(KEY_VAR))?;
        let key = EncryptionKey::from_hex(&raw_key)
            .map_err(|e| ConfigError::from_key_error(KEY_VAR, e))?;

        let part_count = match lookup(PART_COUNT_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<NonZeroUsize>()
                .map_err(|_| ConfigError::InvalidPartCount {
                    var: PART_COUNT_VAR,
                    value: raw.clone(),
                })?,
            None => default_part_count(),
        };

        tracing::debug!(part_count = part_count.get(), "loaded seal configuration");
        Ok(Self { key, part_count })
    }

    /// Build the crypto context shared by every sealing operation.
    pub fn crypto_context(&self) -> CryptoContext {
        CryptoContext::new(self.key.clone())
    }
}

impl fmt::Debug for SealConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SealConfig")
            .field("key", &self.key)
            .field("part_count", &self.part_count)
            .finish()
    }
}

fn default_part_count() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_PART_COUNT).unwrap_or(NonZeroUsize::MIN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const HEX_KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_loads_key_and_default_part_count() {
        let config = SealConfig::from_lookup(lookup(&[(KEY_VAR, HEX_KEY)])).unwrap();
        assert_eq!(config.key.as_bytes()[31], 0x1f);
        assert_eq!(config.part_count.get(), DEFAULT_PART_COUNT);
    }

    #[test]
    fn test_part_count_override() {
        let config =
            SealConfig::from_lookup(lookup(&[(KEY_VAR, HEX_KEY), (PART_COUNT_VAR, " 3 ")])).unwrap();
        assert_eq!(config.part_count.get(), 3);
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let err = SealConfig::from_lookup(lookup(&[])).unwrap_err();
        assert_eq!(err, ConfigError::MissingKey(KEY_VAR));

        let err = SealConfig::from_lookup(lookup(&[(KEY_VAR, "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingKey(KEY_VAR));
    }

    #[test]
    fn test_wrong_key_length() {
        let err = SealConfig::from_lookup(lookup(&[(KEY_VAR, "abcd")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidKeyLength {
                var: KEY_VAR,
                expected: 32,
                got: 2
            }
        );
    }

    #[test]
    fn test_non_hex_key() {
        let err = SealConfig::from_lookup(lookup(&[(KEY_VAR, "zz")])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidKeyEncoding(KEY_VAR));
    }

    #[test]
    fn test_zero_part_count_rejected() {
        let err =
            SealConfig::from_lookup(lookup(&[(KEY_VAR, HEX_KEY), (PART_COUNT_VAR, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPartCount { .. }));
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = SealConfig::from_lookup(lookup(&[(KEY_VAR, HEX_KEY)])).unwrap();
        let debug = format!("{:?}", config);
        assert!(!debug.contains(HEX_KEY));
        assert!(debug.contains("redacted"));
    }
}
