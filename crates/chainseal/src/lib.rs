//! # Chainseal
//!
//! Write-once sealing of structured documents into encrypted, hash-linked
//! chunk chains, with per-chunk tamper localization.
//!
//! ## Overview
//!
//! - **Draft**: a mutable, ordered list of items owned by its author
//! - **Finalize**: one-shot partition, hash-chain and encrypt; never reversed
//! - **Read**: decrypt and reassemble for a caller the access-control
//!   collaborator has already authorized
//! - **Verify**: recompute linkage and content hashes for every chunk and
//!   report exactly which ones were tampered with
//!
//! ## Usage
//!
//! ```rust,no_run
//! use chainseal::{AccessDecision, Question, SealConfig, Vault};
//! use chainseal::store::SqliteStore;
//!
//! async fn example() -> chainseal::Result<()> {
//!     // Fails fast on a missing or malformed key
//!     let config = SealConfig::from_env()?;
//!     let vault: Vault<_> = Vault::new(&config, SqliteStore::open("chainseal.db")?);
//!
//!     let id = vault
//!         .create_draft_with([Question::new("2 + 2?", ["3", "4"], 1)])
//!         .await;
//!     vault.finalize_default(&id).await?;
//!
//!     let report = vault.verify(&id).await?;
//!     assert!(report.is_valid());
//!
//!     let items = vault.read(&id, AccessDecision::Allowed).await?;
//!     assert_eq!(items.len(), 1);
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `chainseal::core` - Pure sealing, reading and verification
//! - `chainseal::store` - Chunk storage and SQLite

pub mod config;
pub mod error;
pub mod vault;

// Re-export component crates
pub use chainseal_core as core;
pub use chainseal_store as store;

pub use config::{SealConfig, DEFAULT_PART_COUNT, KEY_VAR, PART_COUNT_VAR};
pub use error::{ConfigError, Result, SealError};
pub use vault::{AccessDecision, Vault};

// Re-export commonly used core types
pub use chainseal_core::{
    read, verify, Chunk, ChunkHash, CryptoContext, Document, DocumentId, DocumentStatus,
    DraftDocument, EncryptionKey, FailureReason, FinalizeError, FinalizedDocument, PrevHash,
    Question, ReadError, Verdict, VerificationReport,
};
